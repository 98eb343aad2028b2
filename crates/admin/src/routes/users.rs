//! User management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::listing::{ADMIN_PAGE_SIZE, ListQuery, Page};
use shopfront_core::{Email, User, UserId, UserRole};

use crate::backend::{BackendError, UserInput};
use crate::components::{FilterOption, Pager, TableFilter};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::page::PageContext;
use crate::routes::{
    ConfirmDeleteTemplate, DeleteForm, done, fail, list_or_toast, load_failed, reject,
};
use crate::state::AppState;

const LIST_PATH: &str = "/users";

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const SELF_DELETE_MESSAGE: &str = "You cannot delete your own account.";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(LIST_PATH, get(index).post(create))
        .route("/users/new", get(new))
        .route("/users/{id}", post(update))
        .route("/users/{id}/edit", get(edit))
        .route("/users/{id}/delete", get(confirm_delete).post(delete))
}

fn user_url(id: &UserId, suffix: &str) -> String {
    format!("/users/{}{suffix}", urlencoding::encode(id.as_str()))
}

const ROLES: [UserRole; 2] = [UserRole::Customer, UserRole::Admin];

// =============================================================================
// Table
// =============================================================================

#[derive(Debug, Clone)]
pub struct UserRow {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub is_admin: bool,
    pub joined: String,
    pub is_self: bool,
    pub edit_url: String,
    pub delete_url: String,
}

impl UserRow {
    fn new(user: User, admin: &CurrentAdmin) -> Self {
        Self {
            is_admin: user.is_admin(),
            is_self: user.id == admin.id,
            role: user.role.to_string(),
            joined: user
                .created_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            edit_url: user_url(&user.id, "/edit"),
            delete_url: user_url(&user.id, "/delete"),
            name: user.name,
            email: user.email.into_inner(),
            phone: user.phone.unwrap_or_default(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub page: PageContext,
    pub users: Vec<UserRow>,
    pub filters: Vec<TableFilter>,
    pub pager: Pager,
}

/// GET /users
#[instrument(skip_all)]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    mut page: PageContext,
    Query(query): Query<ListQuery>,
) -> Response {
    let users = match list_or_toast(
        &session,
        &mut page,
        state.backend().list_users(&admin.token).await,
    )
    .await
    {
        Ok(items) => items,
        Err(redirect) => return redirect,
    };

    let matching = query.user_filter().apply(users);
    let rows = Page::paginate(matching, query.page(), ADMIN_PAGE_SIZE)
        .map(|u| UserRow::new(u, &admin));

    let role_options = ROLES
        .iter()
        .map(|r| {
            let value = r.to_string();
            FilterOption::new(&value, &capitalize(&value))
        })
        .collect();

    UsersIndexTemplate {
        pager: Pager::new(&rows, LIST_PATH, &query),
        users: rows.items,
        filters: vec![
            TableFilter::text("q", "Search", "Name or email", query.q.as_deref()),
            TableFilter::select("role", "Role", role_options, query.role.as_deref()),
        ],
        page,
    }
    .into_response()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

// =============================================================================
// Form
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct UserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl From<&User> for UserForm {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.to_string(),
            phone: user.phone.clone().unwrap_or_default(),
            role: user.role.to_string(),
            ..Self::default()
        }
    }
}

impl UserForm {
    /// Build the request body. A password is required when `creating`;
    /// on update a blank one keeps the current password.
    ///
    /// # Errors
    ///
    /// Returns the messages to show above the form.
    pub fn to_input(&self, creating: bool) -> Result<UserInput, Vec<String>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("Name is required".to_string());
        }
        let email = Email::parse(&self.email)
            .map_err(|e| errors.push(e.to_string()))
            .ok();
        let role = self
            .role
            .parse::<UserRole>()
            .map_err(|_| errors.push("Choose a role".to_string()))
            .ok();

        let password = Some(self.password.as_str()).filter(|p| !p.is_empty());
        match password {
            None if creating => errors.push("Password is required".to_string()),
            Some(p) if p.chars().count() < MIN_PASSWORD_LENGTH => errors.push(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )),
            Some(p) if p != self.password_confirm => {
                errors.push("Passwords do not match".to_string());
            }
            _ => {}
        }

        match (email, role) {
            (Some(email), Some(role)) if errors.is_empty() => Ok(UserInput {
                name: name.to_string(),
                email,
                phone: Some(self.phone.trim().to_string()).filter(|p| !p.is_empty()),
                role,
                password: password.map(String::from),
            }),
            _ => Err(errors),
        }
    }

    /// The form without the password fields, for re-rendering.
    #[must_use]
    fn without_passwords(mut self) -> Self {
        self.password.clear();
        self.password_confirm.clear();
        self
    }
}

#[derive(Debug, Clone)]
pub struct RoleChoice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "users/form.html")]
pub struct UserFormTemplate {
    pub page: PageContext,
    pub heading: String,
    pub action: String,
    pub creating: bool,
    pub form: UserForm,
    pub roles: Vec<RoleChoice>,
    pub min_password_length: usize,
    pub errors: Vec<String>,
}

impl UserFormTemplate {
    fn new(
        page: PageContext,
        heading: String,
        action: String,
        creating: bool,
        form: UserForm,
        errors: Vec<String>,
    ) -> Self {
        let current = if form.role.is_empty() {
            UserRole::default().to_string()
        } else {
            form.role.clone()
        };
        Self {
            page,
            heading,
            action,
            creating,
            roles: ROLES
                .iter()
                .map(|r| {
                    let value = r.to_string();
                    RoleChoice {
                        label: capitalize(&value),
                        selected: value == current,
                        value,
                    }
                })
                .collect(),
            form: form.without_passwords(),
            min_password_length: MIN_PASSWORD_LENGTH,
            errors,
        }
    }
}

/// GET /users/new
#[instrument(skip_all)]
async fn new(RequireAdminAuth(_admin): RequireAdminAuth, page: PageContext) -> Response {
    UserFormTemplate::new(
        page,
        "New user".to_string(),
        LIST_PATH.to_string(),
        true,
        UserForm::default(),
        Vec::new(),
    )
    .into_response()
}

/// Look a user up in the list; the backend has no single-user endpoint.
async fn find_user(
    state: &AppState,
    admin: &CurrentAdmin,
    id: &UserId,
) -> Result<User, BackendError> {
    state
        .backend()
        .list_users(&admin.token)
        .await?
        .into_iter()
        .find(|u| &u.id == id)
        .ok_or_else(|| BackendError::NotFound("User not found".to_string()))
}

/// GET /users/{id}/edit
#[instrument(skip_all, fields(user_id = %id))]
async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = UserId::new(id);
    let user = match find_user(&state, &admin, &id).await {
        Ok(user) => user,
        Err(BackendError::NotFound(_)) => return Err(AppError::NotFound(format!("user {id}"))),
        Err(e) => return Ok(fail(&session, &e, LIST_PATH).await),
    };

    Ok(UserFormTemplate::new(
        page,
        format!("Edit {}", user.name),
        user_url(&id, ""),
        false,
        UserForm::from(&user),
        Vec::new(),
    )
    .into_response())
}

fn render_invalid(
    page: PageContext,
    heading: String,
    action: String,
    creating: bool,
    form: UserForm,
    errors: Vec<String>,
) -> Response {
    tracing::debug!(?errors, "User form rejected");
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        UserFormTemplate::new(page, heading, action, creating, form, errors),
    )
        .into_response()
}

/// POST /users
#[instrument(skip_all)]
async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<UserForm>,
) -> Response {
    let input = match form.to_input(true) {
        Ok(input) => input,
        Err(errors) => {
            return render_invalid(
                page,
                "New user".to_string(),
                LIST_PATH.to_string(),
                true,
                form,
                errors,
            );
        }
    };

    match state.backend().create_user(&admin.token, &input).await {
        Ok(()) => {
            tracing::info!(role = %input.role, "User created");
            done(&session, &format!("Created {}.", input.name), LIST_PATH).await
        }
        Err(e) => fail(&session, &e, "/users/new").await,
    }
}

/// POST /users/{id}
#[instrument(skip_all, fields(user_id = %id))]
async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Path(id): Path<String>,
    Form(form): Form<UserForm>,
) -> Response {
    let id = UserId::new(id);
    let input = match form.to_input(false) {
        Ok(input) => input,
        Err(errors) => {
            let heading = format!("Edit {}", form.name);
            return render_invalid(page, heading, user_url(&id, ""), false, form, errors);
        }
    };
    if id == admin.id && input.role != UserRole::Admin {
        return reject(&session, "You cannot remove your own admin role.", &user_url(&id, "/edit"))
            .await;
    }

    match state.backend().update_user(&admin.token, &id, &input).await {
        Ok(()) => {
            tracing::info!(user_id = %id, "User updated");
            done(&session, &format!("Saved {}.", input.name), LIST_PATH).await
        }
        Err(e) => fail(&session, &e, &user_url(&id, "/edit")).await,
    }
}

// =============================================================================
// Delete
// =============================================================================

/// GET /users/{id}/delete
#[instrument(skip_all, fields(user_id = %id))]
async fn confirm_delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    mut page: PageContext,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = UserId::new(id);
    if id == admin.id {
        return Ok(reject(&session, SELF_DELETE_MESSAGE, LIST_PATH).await);
    }
    let user = match find_user(&state, &admin, &id).await {
        Ok(user) => user,
        Err(BackendError::NotFound(_)) => return Err(AppError::NotFound(format!("user {id}"))),
        Err(e) => {
            if let Some(redirect) = load_failed(&session, &mut page, &e).await {
                return Ok(redirect);
            }
            return Ok(page.redirect(LIST_PATH).await);
        }
    };

    Ok(ConfirmDeleteTemplate {
        page,
        kind: "user",
        subject: format!("{} <{}>", user.name, user.email),
        warning: user
            .is_admin()
            .then(|| "This user is an admin and will lose console access.".to_string()),
        action: user_url(&id, "/delete"),
        cancel_url: LIST_PATH.to_string(),
    }
    .into_response())
}

/// POST /users/{id}/delete
#[instrument(skip_all, fields(user_id = %id))]
async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    let id = UserId::new(id);
    if !form.confirmed() {
        return reject(&session, "Deletion was not confirmed.", LIST_PATH).await;
    }
    if id == admin.id {
        return reject(&session, SELF_DELETE_MESSAGE, LIST_PATH).await;
    }

    match state.backend().delete_user(&admin.token, &id).await {
        Ok(()) => {
            tracing::info!(user_id = %id, "User deleted");
            done(&session, "User deleted.", LIST_PATH).await
        }
        Err(e) => fail(&session, &e, LIST_PATH).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(password: &str, confirm: &str) -> UserForm {
        UserForm {
            name: "Ada".to_string(),
            email: "ada@shop.test".to_string(),
            phone: " ".to_string(),
            role: "admin".to_string(),
            password: password.to_string(),
            password_confirm: confirm.to_string(),
        }
    }

    #[test]
    fn test_create_requires_password() {
        let errors = form("", "").to_input(true).unwrap_err();
        assert_eq!(errors, vec!["Password is required"]);

        let input = form("correct horse", "correct horse").to_input(true).unwrap();
        assert_eq!(input.role, UserRole::Admin);
        assert_eq!(input.phone, None);
        assert_eq!(input.password.as_deref(), Some("correct horse"));
    }

    #[test]
    fn test_update_keeps_password_when_blank() {
        let input = form("", "").to_input(false).unwrap();
        assert_eq!(input.password, None);
    }

    #[test]
    fn test_password_rules() {
        assert_eq!(
            form("short", "short").to_input(false).unwrap_err(),
            vec!["Password must be at least 8 characters"]
        );
        assert_eq!(
            form("long enough", "different").to_input(true).unwrap_err(),
            vec!["Passwords do not match"]
        );
    }

    #[test]
    fn test_bad_email_and_role_are_collected() {
        let mut bad = form("", "");
        bad.email = "nope".to_string();
        bad.role = "owner".to_string();
        bad.name = " ".to_string();
        let errors = bad.to_input(false).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], "Name is required");
        assert_eq!(errors[2], "Choose a role");
    }

    #[test]
    fn test_rerender_drops_passwords() {
        let cleared = form("secret123", "secret123").without_passwords();
        assert!(cleared.password.is_empty() && cleared.password_confirm.is_empty());
        assert_eq!(cleared.name, "Ada");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("admin"), "Admin");
        assert_eq!(capitalize(""), "");
    }
}
