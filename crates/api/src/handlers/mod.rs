//! HTTP request handlers, grouped by resource.

pub mod conversation;
pub mod message;
pub mod presence;
