//! Account route handlers: profile and saved addresses.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{Address, AddressId, AddressInput};

use crate::backend::{BackendError, ProfileUpdate};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, session_keys};
use crate::page::PageContext;
use crate::routes::{done, fail, reject, session_expired};
use crate::state::AppState;

// =============================================================================
// Profile
// =============================================================================

/// Profile display data for templates.
#[derive(Clone)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub member_since: Option<String>,
}

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub page: PageContext,
    pub profile: ProfileView,
}

/// Display the profile.
#[instrument(skip(state, page, session, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    mut page: PageContext,
    session: Session,
) -> Response {
    let profile = match state.backend().get_profile(&user.token).await {
        Ok(profile) => ProfileView {
            name: profile.name,
            email: profile.email.to_string(),
            phone: profile.phone.unwrap_or_default(),
            member_since: profile.created_at.map(|d| d.format("%B %Y").to_string()),
        },
        Err(BackendError::Unauthorized) => return session_expired(&session).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch profile");
            page.push_error(e.user_message());
            ProfileView {
                name: user.name.clone(),
                email: user.email.to_string(),
                phone: String::new(),
                member_since: None,
            }
        }
    };

    AccountIndexTemplate { profile, page }.into_response()
}

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// Update name and phone.
#[instrument(skip(state, session, user, form))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Ok(reject(&session, "Name is required.", "/account").await);
    }
    let phone = Some(form.phone.trim()).filter(|p| !p.is_empty());

    let update = ProfileUpdate { name, phone };
    match state.backend().update_profile(&user.token, &update).await {
        Ok(()) => {
            // Keep the header greeting in step with the new name.
            let refreshed = CurrentUser {
                name: name.to_string(),
                ..user
            };
            session
                .insert(session_keys::CURRENT_USER, &refreshed)
                .await?;
            Ok(done(&session, "Profile updated.", "/account").await)
        }
        Err(e) => Ok(fail(&session, &e, "/account").await),
    }
}

// =============================================================================
// Addresses
// =============================================================================

/// Saved address display data for templates.
#[derive(Clone)]
pub struct AddressView {
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub summary: String,
    pub is_default: bool,
    pub edit_url: String,
    pub delete_url: String,
}

impl From<&Address> for AddressView {
    fn from(address: &Address) -> Self {
        let id = urlencoding::encode(address.id.as_str()).into_owned();
        Self {
            id: address.id.to_string(),
            full_name: address.full_name.clone(),
            phone: address.phone.clone(),
            summary: address.one_line(),
            is_default: address.is_default,
            edit_url: format!("/account/addresses/{id}/edit"),
            delete_url: format!("/account/addresses/{id}/delete"),
        }
    }
}

/// Address form values, echoed back into the form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddressForm {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: Option<String>,
}

impl AddressForm {
    /// Whether the default checkbox is ticked.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.is_default.is_some()
    }

    /// Validate into a backend body, naming the first missing field.
    fn to_input(&self) -> Result<AddressInput, &'static str> {
        let required = [
            (&self.full_name, "Full name"),
            (&self.phone, "Phone"),
            (&self.line1, "Address line 1"),
            (&self.city, "City"),
            (&self.state, "State"),
            (&self.postal_code, "Postal code"),
            (&self.country, "Country"),
        ];
        if let Some((_, label)) = required.iter().find(|(value, _)| value.trim().is_empty()) {
            return Err(*label);
        }

        Ok(AddressInput {
            full_name: self.full_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            line1: self.line1.trim().to_string(),
            line2: Some(self.line2.trim())
                .filter(|l| !l.is_empty())
                .map(String::from),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
            is_default: self.is_default(),
        })
    }
}

impl From<&Address> for AddressForm {
    fn from(address: &Address) -> Self {
        let input = AddressInput::from(address);
        Self {
            full_name: input.full_name,
            phone: input.phone,
            line1: input.line1,
            line2: input.line2.unwrap_or_default(),
            city: input.city,
            state: input.state,
            postal_code: input.postal_code,
            country: input.country,
            is_default: input.is_default.then(|| "on".to_string()),
        }
    }
}

/// Address list template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub page: PageContext,
    pub addresses: Vec<AddressView>,
}

/// New or edit address form template.
#[derive(Template, WebTemplate)]
#[template(path = "account/address_form.html")]
pub struct AddressFormTemplate {
    pub page: PageContext,
    pub heading: &'static str,
    pub action: String,
    pub form: AddressForm,
}

/// Confirm-before-delete template.
#[derive(Template, WebTemplate)]
#[template(path = "account/address_delete.html")]
pub struct AddressDeleteTemplate {
    pub page: PageContext,
    pub address: AddressView,
}

/// Fetch one saved address, or the response to send instead.
///
/// The backend has no single-address endpoint, so this searches the list.
async fn find_address(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    id: &AddressId,
) -> Result<Address, Response> {
    match state.backend().list_addresses(&user.token).await {
        Ok(addresses) => addresses
            .into_iter()
            .find(|a| &a.id == id)
            .ok_or_else(|| AppError::NotFound("address".to_string()).into_response()),
        Err(BackendError::Unauthorized) => Err(session_expired(session).await),
        Err(e) => Err(AppError::from(e).into_response()),
    }
}

/// Display saved addresses.
#[instrument(skip(state, page, session, user))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    mut page: PageContext,
    session: Session,
) -> Response {
    let addresses = match state.backend().list_addresses(&user.token).await {
        Ok(addresses) => addresses,
        Err(BackendError::Unauthorized) => return session_expired(&session).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch addresses");
            page.push_error(e.user_message());
            Vec::new()
        }
    };

    AddressesTemplate {
        addresses: addresses.iter().map(AddressView::from).collect(),
        page,
    }
    .into_response()
}

/// Display the new address form.
#[instrument(skip(page, _user))]
pub async fn new_address(
    RequireAuth(_user): RequireAuth,
    page: PageContext,
) -> AddressFormTemplate {
    AddressFormTemplate {
        page,
        heading: "Add address",
        action: "/account/addresses".to_string(),
        form: AddressForm::default(),
    }
}

/// Create an address.
#[instrument(skip(state, session, user, form))]
pub async fn create_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddressForm>,
) -> Response {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(field) => {
            let message = format!("{field} is required.");
            return reject(&session, &message, "/account/addresses/new").await;
        }
    };

    match state.backend().create_address(&user.token, &input).await {
        Ok(()) => done(&session, "Address saved.", "/account/addresses").await,
        Err(e) => fail(&session, &e, "/account/addresses/new").await,
    }
}

/// Display the edit address form.
#[instrument(skip(state, page, session, user), fields(address_id = %id))]
pub async fn edit_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let address = match find_address(&state, &session, &user, &AddressId::new(id)).await {
        Ok(address) => address,
        Err(response) => return response,
    };

    AddressFormTemplate {
        page,
        heading: "Edit address",
        action: format!("/account/addresses/{}", urlencoding::encode(address.id.as_str())),
        form: AddressForm::from(&address),
    }
    .into_response()
}

/// Update an address.
#[instrument(skip(state, session, user, form), fields(address_id = %id))]
pub async fn update_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Form(form): Form<AddressForm>,
) -> Response {
    let address_id = AddressId::new(id);
    let edit_url = format!(
        "/account/addresses/{}/edit",
        urlencoding::encode(address_id.as_str())
    );
    let input = match form.to_input() {
        Ok(input) => input,
        Err(field) => {
            let message = format!("{field} is required.");
            return reject(&session, &message, &edit_url).await;
        }
    };

    match state
        .backend()
        .update_address(&user.token, &address_id, &input)
        .await
    {
        Ok(()) => done(&session, "Address updated.", "/account/addresses").await,
        Err(e) => fail(&session, &e, &edit_url).await,
    }
}

/// Ask for confirmation before deleting an address.
#[instrument(skip(state, page, session, user), fields(address_id = %id))]
pub async fn confirm_delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let address = match find_address(&state, &session, &user, &AddressId::new(id)).await {
        Ok(address) => address,
        Err(response) => return response,
    };

    AddressDeleteTemplate {
        address: AddressView::from(&address),
        page,
    }
    .into_response()
}

/// Delete form data; `confirm` is only sent by the confirm button.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteForm {
    pub confirm: Option<String>,
}

impl DeleteForm {
    #[must_use]
    pub fn confirmed(&self) -> bool {
        self.confirm.as_deref() == Some("yes")
    }
}

/// Delete an address once confirmed; otherwise nothing is sent.
#[instrument(skip(state, session, user, form), fields(address_id = %id))]
pub async fn delete_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    if !form.confirmed() {
        return axum::response::Redirect::to("/account/addresses").into_response();
    }

    match state
        .backend()
        .delete_address(&user.token, &AddressId::new(id))
        .await
    {
        Ok(()) => done(&session, "Address deleted.", "/account/addresses").await,
        Err(e) => fail(&session, &e, "/account/addresses").await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> AddressForm {
        AddressForm {
            full_name: " Asha Rao ".to_string(),
            phone: "9876543210".to_string(),
            line1: "12 MG Road".to_string(),
            line2: "  ".to_string(),
            city: "Pune".to_string(),
            state: "MH".to_string(),
            postal_code: "411001".to_string(),
            country: "India".to_string(),
            is_default: Some("on".to_string()),
        }
    }

    #[test]
    fn test_address_form_trims_and_drops_blank_line2() {
        let input = filled().to_input();
        let input = input.as_ref().map_err(|e| *e);
        assert_eq!(input.map(|i| i.full_name.as_str()), Ok("Asha Rao"));
        assert_eq!(input.map(|i| i.line2.clone()), Ok(None));
        assert_eq!(input.map(|i| i.is_default), Ok(true));
    }

    #[test]
    fn test_address_form_names_first_missing_field() {
        let form = AddressForm {
            city: String::new(),
            postal_code: String::new(),
            ..filled()
        };
        assert_eq!(form.to_input().err(), Some("City"));
    }

    #[test]
    fn test_delete_requires_explicit_confirm() {
        assert!(!DeleteForm::default().confirmed());
        assert!(
            !DeleteForm {
                confirm: Some("no".to_string())
            }
            .confirmed()
        );
        assert!(
            DeleteForm {
                confirm: Some("yes".to_string())
            }
            .confirmed()
        );
    }
}
