//! Login session establishment and teardown.
//!
//! Centralizes the three artifacts every successful login produces: the
//! server-side session entries, and the client-visible `userData` attribute
//! cookie. Bearer tokens are issued separately by the token service; this
//! module owns everything cookie- and session-shaped.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use tower_sessions::Session;

use mercadito_core::Provenance;

use crate::error::AppError;
use crate::models::{CurrentUser, USER_DATA_COOKIE, UserData, UserRecord, session_keys};
use crate::services::token::TokenService;

/// Attribute cookie lifetime after an admin login.
pub const ADMIN_COOKIE_MAX_AGE_SECS: i64 = 60;

/// Attribute cookie lifetime after an ordinary password login.
pub const USER_COOKIE_MAX_AGE_SECS: i64 = 900;

/// Record a successful login: session entries, attribute cookie, bearer
/// token. Single convergence point for the password and OAuth paths.
///
/// The cookie value is the URL-encoded JSON snapshot for the record's
/// variant. Admin snapshots live 60 seconds, password-user snapshots 15
/// minutes, OAuth snapshots for the browser session.
///
/// # Errors
///
/// Session store and token issuance failures surface as internal errors.
pub async fn establish(
    session: &Session,
    jar: CookieJar,
    tokens: &TokenService,
    user: &UserRecord,
) -> Result<(CookieJar, String), AppError> {
    session
        .insert(session_keys::LOGGED, true)
        .await
        .map_err(session_error)?;
    session
        .insert(session_keys::CURRENT_USER, CurrentUser::from(user))
        .await
        .map_err(session_error)?;

    let token = tokens.issue(user)?;
    Ok((jar.add(user_data_cookie(user)?), token))
}

/// Tear down the session and clear the attribute cookie.
///
/// Session destruction failures are logged, never propagated: the logout
/// response must clear the client state regardless.
pub async fn clear(session: &Session, jar: CookieJar) -> CookieJar {
    if let Err(err) = session.flush().await {
        tracing::error!(error = %err, "failed to destroy session on logout");
    }
    jar.remove(Cookie::build(USER_DATA_COOKIE).path("/"))
}

/// Build the `userData` cookie for a record.
///
/// # Errors
///
/// Serialization failures surface as internal errors.
pub fn user_data_cookie(user: &UserRecord) -> Result<Cookie<'static>, AppError> {
    let snapshot = UserData::for_record(user);
    let json = serde_json::to_string(&snapshot)
        .map_err(|err| AppError::Internal(err.to_string()))?;
    // RFC 6265 forbids commas and quotes in cookie values.
    let encoded = urlencoding::encode(&json).into_owned();

    let mut builder = Cookie::build((USER_DATA_COOKIE, encoded)).path("/");
    builder = if user.role.is_admin() {
        builder.max_age(time::Duration::seconds(ADMIN_COOKIE_MAX_AGE_SECS))
    } else if user.provenance == Provenance::OAuth {
        // Session cookie: no explicit expiry.
        builder
    } else {
        builder.max_age(time::Duration::seconds(USER_COOKIE_MAX_AGE_SECS))
    };

    Ok(builder.build())
}

fn session_error(err: tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session store failure: {err}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::response::IntoResponse;
    use chrono::Utc;
    use mercadito_core::{Email, Role, UserId};
    use tower_sessions::MemoryStore;

    use super::*;

    fn record(role: Role, provenance: Provenance) -> UserRecord {
        UserRecord {
            id: UserId::new(7),
            first_name: "Ana".to_string(),
            last_name: "Diaz".to_string(),
            email: Email::parse("ana@gmail.com").unwrap(),
            age: 30,
            password: "digest".to_string(),
            role,
            phone: None,
            provenance,
            created_at: Utc::now(),
        }
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[test]
    fn test_user_cookie_max_age() {
        let cookie = user_data_cookie(&record(Role::User, Provenance::Password)).unwrap();
        assert_eq!(cookie.name(), USER_DATA_COOKIE);
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::seconds(USER_COOKIE_MAX_AGE_SECS))
        );
    }

    #[test]
    fn test_admin_cookie_max_age_is_short() {
        let cookie = user_data_cookie(&record(Role::Admin, Provenance::Password)).unwrap();
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::seconds(ADMIN_COOKIE_MAX_AGE_SECS))
        );
    }

    #[test]
    fn test_oauth_cookie_is_session_scoped() {
        let cookie = user_data_cookie(&record(Role::User, Provenance::OAuth)).unwrap();
        assert!(cookie.max_age().is_none());
    }

    #[test]
    fn test_cookie_value_is_url_encoded_json() {
        let cookie = user_data_cookie(&record(Role::User, Provenance::Password)).unwrap();
        let decoded = urlencoding::decode(cookie.value()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&decoded).unwrap();
        assert_eq!(value["first_name"], "Ana");
        assert_eq!(value["role"], "user");
        assert_eq!(value["email"], "ana@gmail.com");
    }

    fn tokens() -> TokenService {
        TokenService::new(&secrecy::SecretString::from(
            "test-signing-secret-0123456789abcdef",
        ))
    }

    #[tokio::test]
    async fn test_establish_sets_session_entries_and_issues_token() {
        let session = session();
        let tokens = tokens();
        let (jar, token) = establish(
            &session,
            CookieJar::new(),
            &tokens,
            &record(Role::User, Provenance::Password),
        )
        .await
        .unwrap();

        assert!(jar.get(USER_DATA_COOKIE).is_some());
        assert!(tokens.verify(&token).is_ok());
        let logged: Option<bool> = session.get(session_keys::LOGGED).await.unwrap();
        assert_eq!(logged, Some(true));
        let current: Option<CurrentUser> =
            session.get(session_keys::CURRENT_USER).await.unwrap();
        assert_eq!(current.unwrap().id, UserId::new(7));
    }

    #[tokio::test]
    async fn test_establish_is_repeatable() {
        let session = session();
        let tokens = tokens();
        let user = record(Role::User, Provenance::Password);

        let (jar, first) = establish(&session, CookieJar::new(), &tokens, &user)
            .await
            .unwrap();
        let (_, second) = establish(&session, jar, &tokens, &user).await.unwrap();

        assert!(tokens.verify(&first).is_ok());
        assert!(tokens.verify(&second).is_ok());
    }

    #[tokio::test]
    async fn test_clear_removes_cookie_and_session() {
        let session = session();
        let (jar, _) = establish(
            &session,
            CookieJar::new(),
            &tokens(),
            &record(Role::User, Provenance::Password),
        )
        .await
        .unwrap();

        let jar = clear(&session, jar).await;
        // The jar's delta carries a removal cookie (empty value, expired);
        // it only shows up once the jar is rendered into response headers.
        let response = (jar, ()).into_response();
        let removal_sent = response
            .headers()
            .get_all(axum::http::header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|cookie| cookie.starts_with(&format!("{USER_DATA_COOKIE}=;")));
        assert!(removal_sent);

        let logged: Option<bool> = session.get(session_keys::LOGGED).await.unwrap();
        assert_eq!(logged, None);
    }
}
