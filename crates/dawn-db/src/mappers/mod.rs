//! Entity to model mappers
//!
//! Conversions between domain entities (dawn-core) and database models.
//! - `From<Model> for Entity`: Convert database rows to domain objects
//! - `*Insert` structs: Flatten entity data for binding into statements

mod dm_request;
mod member;
mod message;
mod profile;
mod room;

pub use message::MessageInsert;
