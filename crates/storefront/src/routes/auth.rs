//! Authentication route handlers.
//!
//! Credentials go straight to the backend; on success the returned bearer
//! token is kept in the session alongside the user.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::checkout::{OTP_LENGTH, OtpCode};
use shopfront_core::Email;

use crate::backend::{BackendError, RegisterRequest};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::flash;
use crate::middleware::auth::{login_redirect, safe_next};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::page::PageContext;
use crate::routes::{done, fail, reject};
use crate::state::AppState;

/// Minimum password length accepted by the forms.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Check a new password and its confirmation.
fn check_new_password(password: &str, confirm: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 8 characters.");
    }
    if password != confirm {
        return Err("Passwords do not match.");
    }
    Ok(())
}

// =============================================================================
// Login
// =============================================================================

/// Query parameters for the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub next: String,
}

/// Display login page.
#[instrument(skip(page, user))]
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    page: PageContext,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref()).to_string();
    if user.is_some() {
        return page.redirect(&next).await;
    }
    LoginTemplate { page, next }.into_response()
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
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

    match state.backend().login(&email, &form.password).await {
        Ok(login) => {
            let user = CurrentUser::new(login.user, login.token);
            set_current_user(&session, &user).await?;
            set_sentry_user(&user.id, Some(user.email.as_str()));
            tracing::info!(user_id = %user.id, "Customer logged in");

            let greeting = format!("Welcome back, {}!", user.first_name());
            Ok(done(&session, &greeting, &next).await)
        }
        // A 401 here means bad credentials, not an expired login.
        Err(BackendError::Unauthorized) => {
            Ok(reject(&session, "Invalid email or password.", &retry).await)
        }
        Err(e) => Ok(fail(&session, &e, &retry).await),
    }
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Response, AppError> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(done(&session, "You have been logged out.", "/").await)
}

// =============================================================================
// Registration
// =============================================================================

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub min_password_length: usize,
}

/// Display registration page.
#[instrument(skip(page))]
pub async fn register_page(page: PageContext) -> RegisterTemplate {
    RegisterTemplate {
        page,
        min_password_length: MIN_PASSWORD_LENGTH,
    }
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub password: String,
    pub password_confirm: String,
}

/// Handle registration form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    const BACK: &str = "/auth/register";

    let name = form.name.trim();
    if name.is_empty() {
        return reject(&session, "Please enter your name.", BACK).await;
    }
    let Ok(email) = Email::parse(&form.email) else {
        return reject(&session, "Please enter a valid email address.", BACK).await;
    };
    if let Err(message) = check_new_password(&form.password, &form.password_confirm) {
        return reject(&session, message, BACK).await;
    }

    let request = RegisterRequest {
        name,
        email: email.as_str(),
        password: &form.password,
        phone: Some(form.phone.trim()).filter(|p| !p.is_empty()),
    };
    match state.backend().register(&request).await {
        Ok(()) => {
            tracing::info!("Customer registered");
            done(&session, "Account created. Please log in.", "/auth/login").await
        }
        Err(e) => fail(&session, &e, BACK).await,
    }
}

// =============================================================================
// Password reset
// =============================================================================

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub page: PageContext,
}

/// Display the forgot password page.
#[instrument(skip(page))]
pub async fn forgot_password_page(page: PageContext) -> ForgotPasswordTemplate {
    ForgotPasswordTemplate { page }
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Ask the backend to email a reset code.
#[instrument(skip(state, session, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response, AppError> {
    const BACK: &str = "/auth/forgot-password";

    let Ok(email) = Email::parse(&form.email) else {
        return Ok(reject(&session, "Please enter a valid email address.", BACK).await);
    };

    if let Err(e) = state.backend().forgot_password(&email).await {
        return Ok(fail(&session, &e, BACK).await);
    }

    session
        .insert(session_keys::RESET_EMAIL, email.as_str())
        .await?;
    flash::info(
        &session,
        format!("We sent a {OTP_LENGTH}-digit code to {email}."),
    )
    .await;
    Ok(Redirect::to("/auth/reset-password").into_response())
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub page: PageContext,
    pub email: String,
    pub otp_length: usize,
    pub min_password_length: usize,
}

async fn reset_email(session: &Session) -> Option<Email> {
    session
        .get::<String>(session_keys::RESET_EMAIL)
        .await
        .ok()
        .flatten()
        .and_then(|e| Email::parse(&e).ok())
}

/// Display the reset password page.
///
/// Only reachable after a code was requested in this session.
#[instrument(skip(page, session))]
pub async fn reset_password_page(page: PageContext, session: Session) -> Response {
    let Some(email) = reset_email(&session).await else {
        return page.redirect("/auth/forgot-password").await;
    };

    ResetPasswordTemplate {
        page,
        email: email.into_inner(),
        otp_length: OTP_LENGTH,
        min_password_length: MIN_PASSWORD_LENGTH,
    }
    .into_response()
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub otp: String,
    pub password: String,
    pub password_confirm: String,
}

/// Set a new password with the emailed code.
#[instrument(skip(state, session, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    const BACK: &str = "/auth/reset-password";

    let Some(email) = reset_email(&session).await else {
        return Ok(Redirect::to("/auth/forgot-password").into_response());
    };
    let code = match OtpCode::parse(form.otp.trim()) {
        Ok(code) => code,
        Err(e) => return Ok(reject(&session, &e.to_string(), BACK).await),
    };
    if let Err(message) = check_new_password(&form.password, &form.password_confirm) {
        return Ok(reject(&session, message, BACK).await);
    }

    match state
        .backend()
        .reset_password(&email, code.as_str(), &form.password)
        .await
    {
        Ok(()) => {
            session.remove::<String>(session_keys::RESET_EMAIL).await?;
            Ok(done(
                &session,
                "Your password has been reset. Please log in.",
                "/auth/login",
            )
            .await)
        }
        Err(e) => Ok(fail(&session, &e, BACK).await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_password_rules() {
        assert_eq!(check_new_password("short", "short"), Err("Password must be at least 8 characters."));
        assert_eq!(check_new_password("longenough", "longenougH"), Err("Passwords do not match."));
        assert_eq!(check_new_password("longenough", "longenough"), Ok(()));
    }
}
