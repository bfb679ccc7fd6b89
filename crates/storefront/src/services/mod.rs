//! Services for the identity/session core.

pub mod admin;
pub mod auth;
pub mod github;
pub mod session;
pub mod token;
