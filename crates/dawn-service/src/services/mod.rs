//! Application services
//!
//! Each service borrows a [`ServiceContext`] and is cheap to construct per call.

pub mod context;
pub mod dm;
pub mod error;
pub mod message;
pub mod profile;
pub mod room;

pub use context::{ServiceContext, ServiceContextBuilder};
pub use dm::{DmRequestOutcome, DmService};
pub use error::{ServiceError, ServiceResult};
pub use message::MessageService;
pub use profile::ProfileService;
pub use room::RoomService;
