//! Request-scoped middleware and extractors.

pub mod auth;
