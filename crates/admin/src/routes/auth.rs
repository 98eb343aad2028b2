//! Authentication route handlers for admin.
//!
//! Credentials are checked by the backend; only users it reports with the
//! admin role get a console session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::Email;

use crate::backend::BackendError;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::{LOGIN_PATH, login_redirect, safe_next};
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::page::PageContext;
use crate::routes::{done, fail, reject};
use crate::state::AppState;

/// Shown when valid credentials belong to a non-admin.
pub const NOT_AN_ADMIN_MESSAGE: &str = "This account does not have admin access.";

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    /// Where to go after signing in.
    pub next: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// GET /auth/login
#[instrument(skip_all)]
async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    page: PageContext,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref()).to_string();
    if admin.is_some() {
        return page.redirect(&next).await;
    }
    LoginTemplate { page, next }.into_response()
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// POST /auth/login
#[instrument(skip(state, session, form), fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = safe_next(form.next.as_deref()).to_string();
    let retry = login_redirect(&next);

    let Ok(email) = Email::parse(&form.email) else {
        return Ok(reject(&session, "Please enter a valid email address.", &retry).await);
    };
    if form.password.is_empty() {
        return Ok(reject(&session, "Please enter your password.", &retry).await);
    }

    let login = match state.backend().login(&email, &form.password).await {
        Ok(login) => login,
        Err(BackendError::Unauthorized) => {
            return Ok(reject(&session, "Invalid email or password.", &retry).await);
        }
        Err(e) => return Ok(fail(&session, &e, &retry).await),
    };

    let Some(admin) = CurrentAdmin::from_login(login.user, login.token) else {
        tracing::warn!("Non-admin attempted console login");
        return Ok(reject(&session, NOT_AN_ADMIN_MESSAGE, &retry).await);
    };

    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    tracing::info!(admin_id = %admin.id, "Admin logged in");

    Ok(done(&session, &format!("Signed in as {}.", admin.name), &next).await)
}

/// POST /auth/logout
#[instrument(skip_all)]
async fn logout(session: Session) -> Result<Response, AppError> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(done(&session, "You have been logged out.", LOGIN_PATH).await)
}
