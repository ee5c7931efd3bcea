//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the write paths
//!
//! Wire-facing structs serialize in camelCase to match the live-event
//! payload format the clients consume.

pub mod conversation;
pub mod message;
pub mod product;
pub mod user;
