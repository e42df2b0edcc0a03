//! # dawn-db
//!
//! Persistence layer implementing the dawn-core store traits.
//!
//! - PostgreSQL repositories built on SQLx (runtime-checked queries)
//! - Database models and entity mappers
//! - Connection pool and embedded schema migrations
//! - [`MemoryChatStore`], a process-local store used when no database is configured
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dawn_db::{create_pool, run_migrations, PgRoomRepository, PoolConfig};
//!
//! async fn example(url: &str) -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&PoolConfig::new(url)).await?;
//!     run_migrations(&pool).await?;
//!     let rooms = PgRoomRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::MemoryChatStore;
pub use pool::{create_pool, run_migrations, PgPool, PoolConfig};
pub use repositories::{
    PgDmRequestRepository, PgMemberRepository, PgMessageRepository, PgProfileRepository,
    PgRoomRepository,
};
