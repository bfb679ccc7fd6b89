//! Guarded view routes.
//!
//! Minimal HTML placeholders behind the session guards; the storefront's
//! real templates are rendered elsewhere. What matters here is the guard
//! behavior, not the markup.

use axum::Router;
use axum::response::Html;
use axum::routing::get;

use crate::middleware::{RedirectIfAuthenticated, RequirePasswordAccount, RequireSession};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login_page))
        .route("/register", get(register_page))
        .route("/profile", get(profile_page))
}

/// Home page: logged-in, password-provenance accounts only.
async fn home(RequirePasswordAccount(user): RequirePasswordAccount) -> Html<String> {
    Html(format!(
        "<h1>Mercadito</h1><p>Hola, {}.</p>",
        user.first_name
    ))
}

async fn login_page(_: RedirectIfAuthenticated) -> Html<&'static str> {
    Html("<h1>Iniciar sesi\u{f3}n</h1>")
}

async fn register_page(_: RedirectIfAuthenticated) -> Html<&'static str> {
    Html("<h1>Registro</h1>")
}

async fn profile_page(RequireSession(ctx): RequireSession) -> Html<String> {
    let name = ctx
        .user_data
        .map_or_else(|| "usuario".to_string(), |data| data.first_name);
    Html(format!("<h1>Perfil</h1><p>{name}</p>"))
}
