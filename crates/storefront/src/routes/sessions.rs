//! Session and identity routes.
//!
//! The POST surface of the identity core: password login/registration,
//! logout, the OAuth delegation round-trip, and the token-protected profile
//! and deletion operations.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;

use mercadito_core::Email;

use crate::error::AppError;
use crate::middleware::{AuthContext, Bearer};
use crate::models::{UserPatch, session_keys};
use crate::services::auth::{AuthError, RegisterInput};
use crate::services::github::GitHubClient;
use crate::services::session::{clear, establish};
use crate::services::token::TokenError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/github", get(github_authorize))
        .route("/githubcallback", get(github_callback))
        .route("/githubToken", post(github_token))
        .route("/profile", post(update_profile))
        .route("/delete", get(delete_account))
}

// Request bodies use optional fields so that absent values render the
// missing-fields message instead of a framework rejection.

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

async fn login(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let (Some(email), Some(password)) = (body.email, body.password) else {
        return Err(AuthError::MissingFields.into());
    };

    let user = state.auth().login(&email, &password).await?;
    let (jar, token) = establish(&session, jar, state.tokens(), &user).await?;

    Ok((
        jar,
        Json(json!({
            "status": "success",
            "message": format!("Bienvenido {}", user.display_name()),
            "token": token,
        })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    age: Option<i32>,
    phone: Option<String>,
    password: Option<String>,
    confirmed_password: Option<String>,
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (
        Some(first_name),
        Some(last_name),
        Some(email),
        Some(age),
        Some(password),
        Some(confirmed_password),
    ) = (
        body.first_name,
        body.last_name,
        body.email,
        body.age,
        body.password,
        body.confirmed_password,
    )
    else {
        return Err(AuthError::MissingFields.into());
    };

    let email = Email::parse(&email)
        .map_err(|_| AppError::bad_request("El correo electrónico no es válido"))?;

    let user = state
        .auth()
        .register(RegisterInput {
            first_name,
            last_name,
            email,
            age,
            phone: body.phone,
            password,
            password_confirm: confirmed_password,
        })
        .await?;

    Ok(Json(json!({
        "status": "success",
        "payload": format!("El usuario {} se ha creado correctamente", user.display_name()),
    })))
}

async fn logout(session: Session, jar: CookieJar) -> impl IntoResponse {
    let jar = clear(&session, jar).await;
    (jar, Redirect::to("/login"))
}

async fn github_authorize(State(state): State<AppState>, session: Session) -> Redirect {
    let Some(github) = state.github() else {
        tracing::warn!("github login requested but oauth is not configured");
        return Redirect::to("/login");
    };

    let csrf = GitHubClient::generate_state();
    if let Err(err) = session
        .insert(session_keys::OAUTH_STATE, csrf.clone())
        .await
    {
        tracing::error!(error = %err, "failed to persist oauth state");
        return Redirect::to("/login");
    }

    Redirect::to(&github.authorize_url(&csrf))
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
}

/// Provider failures and CSRF mismatches all land back on the login page;
/// the details stay in the logs.
async fn github_callback(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    match finish_github_login(&state, &session, jar, params).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(error = %err, "github callback failed");
            Redirect::to("/login").into_response()
        }
    }
}

async fn finish_github_login(
    state: &AppState,
    session: &Session,
    jar: CookieJar,
    params: CallbackParams,
) -> Result<Response, AppError> {
    let github = state
        .github()
        .ok_or_else(|| AppError::Internal("oauth is not configured".to_string()))?;
    let (Some(code), Some(returned_state)) = (params.code, params.state) else {
        return Err(AppError::bad_request("missing code or state"));
    };

    // One-time CSRF state, removed as it is checked.
    let stored_state: Option<String> = session
        .remove(session_keys::OAUTH_STATE)
        .await
        .map_err(|err| AppError::Internal(err.to_string()))?;
    if stored_state.as_deref() != Some(returned_state.as_str()) {
        return Err(AppError::unauthorized("oauth state mismatch"));
    }

    let access_token = github.exchange_code(&code).await?;
    let profile = github.fetch_profile(&access_token).await?;
    let user = github.reconcile(state.store(), &profile).await?;

    let (jar, token) = establish(session, jar, state.tokens(), &user).await?;
    Ok((jar, Redirect::to(&format!("/profile?token={token}"))).into_response())
}

#[derive(Debug, Deserialize)]
struct TokenEcho {
    token: Option<String>,
}

async fn github_token(
    Query(query): Query<TokenEcho>,
) -> Result<impl IntoResponse, AppError> {
    let token = query.token.ok_or(TokenError::Missing)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Bienvenido",
            "token": token,
        })),
    ))
}

#[derive(Debug, Deserialize)]
struct ProfileUpdateRequest {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

/// Token-protected profile update. The account is resolved through the
/// attribute cookie's id when present, falling back to the token subject;
/// the stored password digest is never touched.
async fn update_profile(
    State(state): State<AppState>,
    Bearer(claims): Bearer,
    ctx: AuthContext,
    session: Session,
    jar: CookieJar,
    Json(body): Json<ProfileUpdateRequest>,
) -> Result<Response, AppError> {
    let (Some(first_name), Some(last_name), Some(email)) =
        (body.first_name, body.last_name, body.email)
    else {
        return Err(AuthError::MissingFields.into());
    };

    let email = Email::parse(&email)
        .map_err(|_| AppError::bad_request("El correo electrónico no es válido"))?;

    let id = ctx
        .user_data
        .as_ref()
        .and_then(|data| data.id)
        .unwrap_or(claims.sub);
    let record = state
        .store()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::from(AuthError::UserNotFound))?;

    let updated = state
        .auth()
        .update_profile(
            &record.email,
            UserPatch {
                first_name: Some(first_name),
                last_name: Some(last_name),
                email: Some(email),
                phone: body.phone,
            },
        )
        .await?;

    // Re-establish so the cookie and token reflect the new attributes.
    let (jar, token) = establish(&session, jar, state.tokens(), &updated).await?;

    Ok((
        jar,
        Json(json!({
            "status": "success",
            "message": format!("Bienvenido {}", updated.display_name()),
            "token": token,
        })),
    )
        .into_response())
}

/// Token-protected account deletion. The email comes from the attribute
/// cookie when present, falling back to the token claims; any pending
/// reserved-admin expiry timer for the email is cancelled by the service.
async fn delete_account(
    State(state): State<AppState>,
    Bearer(claims): Bearer,
    ctx: AuthContext,
    session: Session,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let email = match ctx.user_data.and_then(|data| data.email) {
        Some(email) => email,
        None => Email::parse(&claims.email)
            .map_err(|err| AppError::Internal(format!("bad email in token claims: {err}")))?,
    };

    let deleted = state.auth().delete_account(&email).await?;
    let jar = clear(&session, jar).await;

    Ok((
        jar,
        Json(json!({
            "status": "success",
            "payload": format!("El usuario {} se ha eliminado correctamente", deleted.email),
        })),
    )
        .into_response())
}
