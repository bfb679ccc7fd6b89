//! Domain models for the storefront identity core.

pub mod session;
pub mod user;

pub use session::{CurrentUser, USER_DATA_COOKIE, UserData, session_keys};
pub use user::{NewUser, OAUTH_PASSWORD_SENTINEL, UserPatch, UserRecord};
