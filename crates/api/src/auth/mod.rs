//! Token validation for the authenticated principal.
//!
//! The login/refresh flow itself lives in an external identity service;
//! this module only validates the bearer tokens it issues and extracts
//! the stable user id every conversation operation keys on.

pub mod jwt;
