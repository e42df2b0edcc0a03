//! Test helpers for integration tests
//!
//! Provides a gateway process on an ephemeral port, WebSocket clients, and
//! HTTP helpers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dawn_cache::MemoryPubSub;
use dawn_common::{AppConfig, JwtService};
use dawn_core::ParticipantId;
use dawn_db::MemoryChatStore;
use dawn_gateway::server::serve;
use dawn_gateway::{create_app, Backends, GatewayState};
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long a client waits for the next frame
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Gateway process serving on localhost
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: GatewayState,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a standalone gateway
    pub async fn start() -> Result<Self> {
        Self::start_on(Arc::new(MemoryChatStore::new()), MemoryPubSub::new()).await
    }

    /// Start a gateway over a store and pub/sub hub other processes may share
    pub async fn start_on(store: Arc<MemoryChatStore>, hub: MemoryPubSub) -> Result<Self> {
        let config = test_config()?;
        let state = Backends::in_memory(store, hub, &config.realtime)
            .into_state(JwtService::new(&config.jwt.secret), config.realtime.clone())
            .await;

        let app = create_app(state.clone(), &config);
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        // Runs until the test's runtime shuts down
        let handle = tokio::spawn(async move {
            let _ = serve(listener, app, std::future::pending::<()>()).await;
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            state,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Gateway URL, optionally carrying the token in the query string
    pub fn ws_url(&self, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("ws://{}/gateway?token={token}", self.addr),
            None => format!("ws://{}/gateway", self.addr),
        }
    }

    /// Handshake token for a participant
    pub fn token(&self, participant_id: i64, name: Option<&str>) -> Result<String> {
        Ok(self
            .state
            .jwt()
            .issue(ParticipantId::new(participant_id), name, 300)?)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Open a connection and consume its `ready` frame
    pub async fn connect(&self, participant_id: i64) -> Result<WsClient> {
        let name = format!("Trainer {participant_id}");
        let (client, ready) = self.connect_as(participant_id, &name).await?;
        if ready["participant_id"] != participant_id {
            bail!("ready frame for the wrong participant: {ready}");
        }
        Ok(client)
    }

    /// Connect with a token carrying `name`; returns the `ready` payload too
    pub async fn connect_as(&self, participant_id: i64, name: &str) -> Result<(WsClient, Value)> {
        let token = self.token(participant_id, Some(name))?;
        let (stream, _) = connect_async(self.ws_url(Some(token.as_str()))).await?;
        let mut client = WsClient { stream };
        let ready = client.expect("ready").await?;
        Ok((client, ready))
    }
}

/// A connected WebSocket client
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Send one JSON frame
    pub async fn send(&mut self, frame: Value) -> Result<()> {
        self.stream.send(Message::Text(frame.to_string())).await?;
        Ok(())
    }

    /// Next text frame as `(event, data)`, or `None` if nothing arrives in time
    pub async fn recv(&mut self, wait: Duration) -> Result<Option<(String, Value)>> {
        loop {
            let next = match tokio::time::timeout(wait, self.stream.next()).await {
                Ok(next) => next,
                Err(_) => return Ok(None),
            };

            match next {
                Some(Ok(Message::Text(text))) => {
                    let mut frame: Value = serde_json::from_str(&text)?;
                    let event = frame["event"].as_str().context("frame without event")?.to_string();
                    return Ok(Some((event, frame["data"].take())));
                }
                Some(Ok(Message::Close(_))) | None => bail!("connection closed"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// Wait for the named event, skipping any others
    pub async fn expect(&mut self, event: &str) -> Result<Value> {
        loop {
            match self.recv(RECV_TIMEOUT).await? {
                Some((name, data)) if name == event => return Ok(data),
                Some(_) => continue,
                None => bail!("timed out waiting for {event}"),
            }
        }
    }

    /// Collect everything that arrives within `wait`
    pub async fn drain(&mut self, wait: Duration) -> Result<Vec<(String, Value)>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.recv(wait).await? {
            frames.push(frame);
        }
        Ok(frames)
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}

/// Configuration for test gateways; typing indicators lapse quickly
pub fn test_config() -> Result<AppConfig> {
    let config = AppConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some("integration-secret".to_string()),
        "APP_ENV" => Some("test".to_string()),
        "CHAT_TYPING_TTL_MS" => Some("200".to_string()),
        _ => None,
    })?;
    Ok(config)
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(response.json().await?)
}
