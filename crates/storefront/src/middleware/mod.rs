//! Request middleware and extractors.

pub mod auth;
pub mod session;

pub use auth::{AuthContext, Bearer, RedirectIfAuthenticated, RequirePasswordAccount, RequireSession};
pub use session::create_session_layer;
