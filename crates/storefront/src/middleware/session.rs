//! Server-side session layer.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "mercadito.sid";

/// Build the session layer: opaque-ID cookie against a server-side store,
/// expiring on inactivity.
///
/// The cookie is `HttpOnly` always and `Secure` when the public base URL is
/// HTTPS.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(
            config.session_ttl_secs,
        )))
        .with_http_only(true)
        .with_secure(config.base_url.starts_with("https://"))
}
