//! Authentication extractors.
//!
//! [`AuthContext`] is the per-request view of authentication state: the
//! server session is the authoritative part, the `userData` cookie a
//! client-editable capability hint that is read but never re-verified.
//! Route guards are thin extractors over it.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use tower_sessions::Session;

use mercadito_core::Provenance;

use crate::error::AppError;
use crate::models::{CurrentUser, USER_DATA_COOKIE, UserData, UserRecord, session_keys};
use crate::services::token::Claims;
use crate::state::AppState;

/// Snapshot of everything a request carries about who is asking.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Whether the server session has seen a login.
    pub logged: bool,
    /// The session's authoritative user identity, if any.
    pub current_user: Option<CurrentUser>,
    /// The decoded `userData` cookie, if present and parseable.
    /// Non-authoritative.
    pub user_data: Option<UserData>,
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(format!("session layer missing: {msg}")))?;
        let jar = CookieJar::from_headers(&parts.headers);

        let logged = session
            .get::<bool>(session_keys::LOGGED)
            .await
            .unwrap_or_default()
            .unwrap_or(false);
        let current_user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .unwrap_or_default();

        let user_data = jar.get(USER_DATA_COOKIE).and_then(|cookie| {
            let decoded = urlencoding::decode(cookie.value()).ok()?;
            serde_json::from_str::<UserData>(&decoded).ok()
        });

        Ok(Self {
            logged,
            current_user,
            user_data,
        })
    }
}

/// Guard for logged-in-only pages. Rejects to the login page.
///
/// A presence gate, not an authorization decision: it requires both the
/// server session flag and the attribute cookie, and verifies neither
/// against the store.
#[derive(Debug, Clone)]
pub struct RequireSession(pub AuthContext);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = AuthContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        if !ctx.logged || ctx.user_data.is_none() {
            return Err(Redirect::to("/login").into_response());
        }
        Ok(Self(ctx))
    }
}

/// Guard for anonymous-only pages (login, register). Rejects to the home
/// page when a session already exists.
#[derive(Debug, Clone)]
pub struct RedirectIfAuthenticated;

impl<S> FromRequestParts<S> for RedirectIfAuthenticated
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = AuthContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        if ctx.logged {
            return Err(Redirect::to("/").into_response());
        }
        Ok(Self)
    }
}

/// Guard for pages reserved to password-provenance accounts.
///
/// Looks the session identity up in the store; OAuth accounts are bounced
/// to their profile page, stale sessions back to login.
#[derive(Debug, Clone)]
pub struct RequirePasswordAccount(pub UserRecord);

impl FromRequestParts<AppState> for RequirePasswordAccount {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireSession(ctx) = RequireSession::from_request_parts(parts, state).await?;

        let Some(current) = ctx.current_user else {
            return Err(Redirect::to("/login").into_response());
        };

        let record = state
            .store()
            .find_by_email(&current.email)
            .await
            .map_err(|err| AppError::Store(err).into_response())?;

        // The account may have been deleted (or expired) since login.
        let Some(record) = record else {
            return Err(Redirect::to("/login").into_response());
        };

        if record.provenance == Provenance::OAuth {
            return Err(Redirect::to("/profile").into_response());
        }

        Ok(Self(record))
    }
}

/// Bearer token guard for the stateless API surface.
///
/// Carries the verified claims; missing or bad tokens reject with the
/// token error contract (401).
#[derive(Debug, Clone)]
pub struct Bearer(pub Claims);

impl FromRequestParts<AppState> for Bearer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let claims = state.tokens().verify_bearer(header)?;
        Ok(Self(claims))
    }
}
