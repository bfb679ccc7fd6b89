//! GitHub OAuth delegation.
//!
//! Implements the authorization-code flow against GitHub and reconciles the
//! returned profile into a local identity record. OAuth accounts carry an
//! unverifiable password sentinel, so delegated identities can never be
//! taken over through the password login path.

use std::sync::Arc;

use rand::Rng;
use rand::distr::Alphanumeric;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use mercadito_core::{Email, Provenance, Role};

use crate::config::GitHubConfig;
use crate::error::AppError;
use crate::models::{NewUser, OAUTH_PASSWORD_SENTINEL, UserRecord};
use crate::store::{StoreError, UserStore};

const AUTHORIZE_ENDPOINT: &str = "https://github.com/login/oauth/authorize";
const TOKEN_ENDPOINT: &str = "https://github.com/login/oauth/access_token";
const USER_ENDPOINT: &str = "https://api.github.com/user";

/// Placeholder for profile attributes GitHub does not supply.
const PROFILE_PLACEHOLDER: &str = "a";

/// Errors from the OAuth flow.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// GitHub answered the code exchange without an access token.
    #[error("code exchange rejected: {0}")]
    Exchange(String),

    /// The profile could not be mapped to a local record.
    #[error("unusable profile: {0}")]
    InvalidProfile(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<GitHubError> for AppError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::Store(err) => Self::Store(err),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// The subset of the GitHub user profile this flow consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubProfile {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    error_description: Option<String>,
}

/// Client for the GitHub authorization-code flow.
pub struct GitHubClient {
    http: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubClient {
    /// # Errors
    ///
    /// Fails only if the underlying HTTP client cannot be built.
    pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mercadito-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    /// Generate a fresh CSRF state value for one authorization round-trip.
    #[must_use]
    pub fn generate_state() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect()
    }

    /// The GitHub authorization URL the browser is redirected to.
    #[must_use]
    pub fn authorize_url(&self, state: &str) -> String {
        let mut url = url::Url::parse(AUTHORIZE_ENDPOINT)
            .unwrap_or_else(|_| unreachable!("static endpoint URL"));
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.callback_url)
            .append_pair("scope", "user:email")
            .append_pair("state", state);
        url.into()
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// [`GitHubError::Exchange`] when GitHub refuses the code.
    pub async fn exchange_code(&self, code: &str) -> Result<String, GitHubError> {
        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.expose_secret()),
                ("code", code),
                ("redirect_uri", self.config.callback_url.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<AccessTokenResponse>()
            .await?;

        response.access_token.ok_or_else(|| {
            GitHubError::Exchange(
                response
                    .error_description
                    .unwrap_or_else(|| "no access token in response".to_string()),
            )
        })
    }

    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// HTTP failures and non-2xx responses.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GitHubProfile, GitHubError> {
        Ok(self
            .http
            .get(USER_ENDPOINT)
            .header(ACCEPT, "application/vnd.github+json")
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .send()
            .await?
            .error_for_status()?
            .json::<GitHubProfile>()
            .await?)
    }

    /// Find the local account for a GitHub profile, creating it on first
    /// login.
    ///
    /// Matching is by email. An existing account keeps all of its stored
    /// attributes; the profile only seeds brand-new records.
    ///
    /// # Errors
    ///
    /// [`GitHubError::InvalidProfile`] when no usable email can be derived,
    /// otherwise store failures.
    pub async fn reconcile(
        &self,
        store: &Arc<dyn UserStore>,
        profile: &GitHubProfile,
    ) -> Result<UserRecord, GitHubError> {
        let new_user = map_profile(profile)?;

        if let Some(existing) = store.find_by_email(&new_user.email).await? {
            tracing::info!(user_id = %existing.id, "github login matched existing account");
            return Ok(existing);
        }

        let record = match store.create(new_user).await {
            Ok(record) => record,
            // Concurrent first logins for the same profile race on create.
            Err(StoreError::Conflict(_)) => {
                let email = map_profile(profile)?.email;
                store.find_by_email(&email).await?.ok_or_else(|| {
                    GitHubError::Store(StoreError::Unavailable(
                        "record vanished during reconciliation".to_string(),
                    ))
                })?
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(user_id = %record.id, "github login created account");
        Ok(record)
    }
}

/// Map a GitHub profile onto a new local record.
///
/// The display name is split on whitespace into first and last name;
/// missing pieces get a placeholder. Profiles without a public email fall
/// back to GitHub's noreply address convention so the record still has a
/// unique, well-formed email.
fn map_profile(profile: &GitHubProfile) -> Result<NewUser, GitHubError> {
    let mut names = profile
        .name
        .as_deref()
        .unwrap_or_default()
        .split_whitespace();
    let first_name = names.next().unwrap_or(PROFILE_PLACEHOLDER).to_string();
    let last_name = names.next().unwrap_or(PROFILE_PLACEHOLDER).to_string();

    let email_raw = profile.email.clone().unwrap_or_else(|| {
        format!("{}@users.noreply.github.com", profile.login)
    });
    let email = Email::parse(&email_raw)
        .map_err(|err| GitHubError::InvalidProfile(err.to_string()))?;

    Ok(NewUser {
        first_name,
        last_name,
        email,
        age: 0,
        password: OAUTH_PASSWORD_SENTINEL.to_string(),
        role: Role::User,
        phone: None,
        provenance: Provenance::OAuth,
    })
}
