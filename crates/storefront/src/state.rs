//! Shared application state.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::services::admin::AdminManager;
use crate::services::auth::AuthService;
use crate::services::github::{GitHubClient, GitHubError};
use crate::services::token::TokenService;
use crate::store::UserStore;

/// Application state shared across all request handlers.
///
/// Cheap to clone; all fields live behind a single `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn UserStore>,
    auth: AuthService,
    tokens: TokenService,
    github: Option<GitHubClient>,
}

impl AppState {
    /// Wire up services around a credential store.
    ///
    /// # Errors
    ///
    /// Fails only if the OAuth HTTP client cannot be built.
    pub fn new(
        config: StorefrontConfig,
        store: Arc<dyn UserStore>,
    ) -> Result<Self, GitHubError> {
        // Timer cancellation is routed through the auth service, so the
        // manager lives inside it.
        let admin = Arc::new(AdminManager::from_config(&config));
        let auth = AuthService::new(Arc::clone(&store), admin);
        let tokens = TokenService::with_ttl(&config.token_secret, config.token_ttl_secs);
        let github = config
            .github
            .clone()
            .map(GitHubClient::new)
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                auth,
                tokens,
                github,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// The OAuth client, if the GitHub login path is configured.
    #[must_use]
    pub fn github(&self) -> Option<&GitHubClient> {
        self.inner.github.as_ref()
    }
}
