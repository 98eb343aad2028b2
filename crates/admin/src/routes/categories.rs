//! Category management.
//!
//! A category carries the attribute definitions that product forms filed
//! under it must satisfy. Each definition is one form row of
//! `attr_name`, `attr_kind`, `attr_options` (comma separated) and
//! `attr_required`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::listing::{ADMIN_PAGE_SIZE, ListQuery, Page};
use shopfront_core::{AttributeDefinition, AttributeKind, Category, CategoryId};

use crate::backend::{BackendError, CategoryInput};
use crate::components::{Pager, TableFilter};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::page::PageContext;
use crate::routes::{
    ConfirmDeleteTemplate, DeleteForm, Fields, done, fail, list_or_toast, reject,
};
use crate::state::AppState;

const LIST_PATH: &str = "/categories";

const SPARE_ATTRIBUTE_ROWS: usize = 3;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(LIST_PATH, get(index).post(create))
        .route("/categories/new", get(new))
        .route("/categories/{id}", post(update))
        .route("/categories/{id}/edit", get(edit))
        .route("/categories/{id}/delete", get(confirm_delete).post(delete))
}

fn category_url(id: &CategoryId, suffix: &str) -> String {
    format!("/categories/{}{suffix}", urlencoding::encode(id.as_str()))
}

// =============================================================================
// Table
// =============================================================================

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub name: String,
    pub description: String,
    /// e.g. "Fabric (select, required), Weight (number)"
    pub attributes: String,
    pub edit_url: String,
    pub delete_url: String,
}

impl From<Category> for CategoryRow {
    fn from(category: Category) -> Self {
        let attributes = category
            .attributes
            .iter()
            .map(|a| {
                if a.required {
                    format!("{} ({}, required)", a.name, a.kind)
                } else {
                    format!("{} ({})", a.name, a.kind)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            edit_url: category_url(&category.id, "/edit"),
            delete_url: category_url(&category.id, "/delete"),
            name: category.name,
            description: category.description.unwrap_or_default(),
            attributes,
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryRow>,
    pub filters: Vec<TableFilter>,
    pub pager: Pager,
}

/// GET /categories
#[instrument(skip_all)]
async fn index(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    mut page: PageContext,
    Query(query): Query<ListQuery>,
) -> Response {
    let categories = match list_or_toast(
        &session,
        &mut page,
        state.backend().list_categories().await,
    )
    .await
    {
        Ok(items) => items,
        Err(redirect) => return redirect,
    };

    let matching = query.category_filter().apply(categories);
    let rows = Page::paginate(matching, query.page(), ADMIN_PAGE_SIZE).map(CategoryRow::from);

    CategoriesIndexTemplate {
        pager: Pager::new(&rows, LIST_PATH, &query),
        categories: rows.items,
        filters: vec![TableFilter::text(
            "q",
            "Search",
            "Category name",
            query.q.as_deref(),
        )],
        page,
    }
    .into_response()
}

// =============================================================================
// Form
// =============================================================================

/// One attribute definition row as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionRow {
    pub name: String,
    pub kind: String,
    pub options: String,
    pub required: bool,
}

impl DefinitionRow {
    #[must_use]
    pub fn kind_is(&self, kind: &str) -> bool {
        let current = if self.kind.is_empty() { AttributeKind::Text.as_str() } else { &self.kind };
        current == kind
    }

    fn is_blank(&self) -> bool {
        self.name.is_empty() && self.options.is_empty()
    }
}

impl From<&AttributeDefinition> for DefinitionRow {
    fn from(def: &AttributeDefinition) -> Self {
        Self {
            name: def.name.clone(),
            kind: def.kind.as_str().to_string(),
            options: def.options.join(", "),
            required: def.required,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryForm {
    pub name: String,
    pub description: String,
    pub definitions: Vec<DefinitionRow>,
}

impl From<&Category> for CategoryForm {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone().unwrap_or_default(),
            definitions: category.attributes.iter().map(DefinitionRow::from).collect(),
        }
    }
}

impl CategoryForm {
    /// Read a submitted body; rows with neither a name nor options are
    /// dropped.
    #[must_use]
    pub fn from_fields(fields: &Fields<'_>) -> Self {
        let names = fields.all("attr_name");
        let kinds = fields.all("attr_kind");
        let options = fields.all("attr_options");
        let required = fields.all("attr_required");

        let definitions = names
            .iter()
            .enumerate()
            .map(|(i, name)| DefinitionRow {
                name: name.trim().to_string(),
                kind: kinds.get(i).map(|k| k.trim().to_string()).unwrap_or_default(),
                options: options.get(i).map(|o| o.trim().to_string()).unwrap_or_default(),
                required: required.get(i).is_some_and(|r| *r == "yes"),
            })
            .filter(|row| !row.is_blank())
            .collect();

        Self {
            name: fields.get("name").trim().to_string(),
            description: fields.get("description").trim().to_string(),
            definitions,
        }
    }

    /// Rows to render, with blank ones for new attributes.
    #[must_use]
    pub fn definition_rows(&self) -> Vec<DefinitionRow> {
        let mut rows = self.definitions.clone();
        rows.extend((0..SPARE_ATTRIBUTE_ROWS).map(|_| DefinitionRow::default()));
        rows
    }

    /// Build the request body.
    ///
    /// # Errors
    ///
    /// Returns the messages to show above the form.
    pub fn to_input(&self) -> Result<CategoryInput, Vec<String>> {
        let mut errors = Vec::new();
        if self.name.is_empty() {
            errors.push("Name is required".to_string());
        }

        let mut attributes: Vec<AttributeDefinition> = Vec::with_capacity(self.definitions.len());
        for row in &self.definitions {
            if row.name.is_empty() {
                errors.push("Every attribute needs a name".to_string());
                continue;
            }
            let kind = if row.kind.is_empty() {
                AttributeKind::Text
            } else {
                match row.kind.parse::<AttributeKind>() {
                    Ok(kind) => kind,
                    Err(e) => {
                        errors.push(e);
                        continue;
                    }
                }
            };
            let options: Vec<String> = row
                .options
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
            if kind == AttributeKind::Select && options.is_empty() {
                errors.push(format!("{} needs at least one option", row.name));
            }
            if attributes.iter().any(|a| a.name.eq_ignore_ascii_case(&row.name)) {
                errors.push(format!("{} is listed more than once", row.name));
                continue;
            }
            attributes.push(AttributeDefinition {
                name: row.name.clone(),
                kind,
                options: if kind == AttributeKind::Select { options } else { Vec::new() },
                required: row.required,
            });
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(CategoryInput {
            name: self.name.clone(),
            description: Some(self.description.clone()).filter(|d| !d.is_empty()),
            attributes,
        })
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub page: PageContext,
    pub heading: String,
    pub action: String,
    pub form: CategoryForm,
    pub rows: Vec<DefinitionRow>,
    pub kinds: [&'static str; 3],
    pub errors: Vec<String>,
}

impl CategoryFormTemplate {
    fn new(
        page: PageContext,
        heading: String,
        action: String,
        form: CategoryForm,
        errors: Vec<String>,
    ) -> Self {
        Self {
            page,
            heading,
            action,
            rows: form.definition_rows(),
            form,
            kinds: [
                AttributeKind::Text.as_str(),
                AttributeKind::Number.as_str(),
                AttributeKind::Select.as_str(),
            ],
            errors,
        }
    }
}

/// GET /categories/new
#[instrument(skip_all)]
async fn new(RequireAdminAuth(_admin): RequireAdminAuth, page: PageContext) -> Response {
    CategoryFormTemplate::new(
        page,
        "New category".to_string(),
        LIST_PATH.to_string(),
        CategoryForm::default(),
        Vec::new(),
    )
    .into_response()
}

/// GET /categories/{id}/edit
#[instrument(skip_all, fields(category_id = %id))]
async fn edit(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = CategoryId::new(id);
    let category = match state.backend().get_category(&id).await {
        Ok(category) => category,
        Err(BackendError::NotFound(_)) => {
            return Err(AppError::NotFound(format!("category {id}")));
        }
        Err(e) => return Ok(fail(&session, &e, LIST_PATH).await),
    };

    Ok(CategoryFormTemplate::new(
        page,
        format!("Edit {}", category.name),
        category_url(&id, ""),
        CategoryForm::from(&category),
        Vec::new(),
    )
    .into_response())
}

fn render_invalid(
    page: PageContext,
    heading: String,
    action: String,
    form: CategoryForm,
    errors: Vec<String>,
) -> Response {
    tracing::debug!(?errors, "Category form rejected");
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        CategoryFormTemplate::new(page, heading, action, form, errors),
    )
        .into_response()
}

/// POST /categories
#[instrument(skip_all)]
async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(raw): Form<Vec<(String, String)>>,
) -> Response {
    let form = CategoryForm::from_fields(&Fields(&raw));
    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => {
            return render_invalid(
                page,
                "New category".to_string(),
                LIST_PATH.to_string(),
                form,
                errors,
            );
        }
    };

    match state.backend().create_category(&admin.token, &input).await {
        Ok(()) => {
            tracing::info!(name = %input.name, "Category created");
            done(&session, &format!("Created {}.", input.name), LIST_PATH).await
        }
        Err(e) => fail(&session, &e, "/categories/new").await,
    }
}

/// POST /categories/{id}
#[instrument(skip_all, fields(category_id = %id))]
async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Path(id): Path<String>,
    Form(raw): Form<Vec<(String, String)>>,
) -> Response {
    let id = CategoryId::new(id);
    let form = CategoryForm::from_fields(&Fields(&raw));
    let input = match form.to_input() {
        Ok(input) => input,
        Err(errors) => {
            let heading = format!("Edit {}", form.name);
            return render_invalid(page, heading, category_url(&id, ""), form, errors);
        }
    };

    match state.backend().update_category(&admin.token, &id, &input).await {
        Ok(()) => {
            tracing::info!(category_id = %id, "Category updated");
            done(&session, &format!("Saved {}.", input.name), LIST_PATH).await
        }
        Err(e) => fail(&session, &e, &category_url(&id, "/edit")).await,
    }
}

// =============================================================================
// Delete
// =============================================================================

/// GET /categories/{id}/delete
#[instrument(skip_all, fields(category_id = %id))]
async fn confirm_delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = CategoryId::new(id);
    let (category, products) = tokio::join!(
        state.backend().get_category(&id),
        state.backend().list_products(),
    );
    let category = match category {
        Ok(category) => category,
        Err(BackendError::NotFound(_)) => {
            return Err(AppError::NotFound(format!("category {id}")));
        }
        Err(e) => return Ok(fail(&session, &e, LIST_PATH).await),
    };

    // The count is advisory; a failed product fetch just drops the warning.
    let filed = products.map_or(0, |products| {
        products
            .iter()
            .filter(|p| p.category_id.as_ref() == Some(&id))
            .count()
    });

    Ok(ConfirmDeleteTemplate {
        page,
        kind: "category",
        subject: category.name,
        warning: (filed > 0).then(|| format!("{filed} products are filed under this category.")),
        action: category_url(&id, "/delete"),
        cancel_url: LIST_PATH.to_string(),
    }
    .into_response())
}

/// POST /categories/{id}/delete
#[instrument(skip_all, fields(category_id = %id))]
async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    let id = CategoryId::new(id);
    if !form.confirmed() {
        return reject(&session, "Deletion was not confirmed.", LIST_PATH).await;
    }

    match state.backend().delete_category(&admin.token, &id).await {
        Ok(()) => {
            tracing::info!(category_id = %id, "Category deleted");
            done(&session, "Category deleted.", LIST_PATH).await
        }
        Err(e) => fail(&session, &e, LIST_PATH).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn row(name: &str, kind: &str, options: &str, required: &str) -> [(&'static str, String); 4] {
        [
            ("attr_name", name.to_string()),
            ("attr_kind", kind.to_string()),
            ("attr_options", options.to_string()),
            ("attr_required", required.to_string()),
        ]
    }

    fn body(name: &str, rows: &[[(&'static str, String); 4]]) -> Vec<(String, String)> {
        let mut raw = pairs(&[("name", name), ("description", "")]);
        for r in rows {
            raw.extend(r.iter().map(|(k, v)| ((*k).to_string(), v.clone())));
        }
        raw
    }

    #[test]
    fn test_form_builds_definitions() {
        let raw = body(
            "Clothing",
            &[
                row("Fabric", "select", "Cotton, Linen,", "yes"),
                row("Weight", "number", "ignored", "no"),
                row("", "text", "", "no"),
            ],
        );
        let input = CategoryForm::from_fields(&Fields(&raw)).to_input().unwrap();

        assert_eq!(input.name, "Clothing");
        assert_eq!(input.description, None);
        assert_eq!(input.attributes.len(), 2);
        assert_eq!(input.attributes[0].kind, AttributeKind::Select);
        assert_eq!(input.attributes[0].options, vec!["Cotton", "Linen"]);
        assert!(input.attributes[0].required);
        assert!(input.attributes[1].options.is_empty());
        assert!(!input.attributes[1].required);
    }

    #[test]
    fn test_form_errors() {
        let raw = body(
            "",
            &[
                row("Fabric", "select", "", "no"),
                row("fabric", "text", "", "no"),
                row("", "select", "A, B", "no"),
            ],
        );
        let errors = CategoryForm::from_fields(&Fields(&raw))
            .to_input()
            .unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Name is required",
                "Fabric needs at least one option",
                "fabric is listed more than once",
                "Every attribute needs a name",
            ]
        );
    }

    #[test]
    fn test_existing_category_round_trips() {
        let category: Category = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "Clothing",
            "description": "Things to wear",
            "attributes": [{"name": "Fabric", "type": "select", "options": ["Cotton"], "required": true}]
        }))
        .unwrap();
        let input = CategoryForm::from(&category).to_input().unwrap();
        assert_eq!(input.description.as_deref(), Some("Things to wear"));
        assert_eq!(input.attributes, category.attributes);
    }

    #[test]
    fn test_row_summary() {
        let category: Category = serde_json::from_value(serde_json::json!({
            "id": "c1",
            "name": "Clothing",
            "attributes": [
                {"name": "Fabric", "type": "select", "options": ["Cotton"], "required": true},
                {"name": "Weight", "type": "number"}
            ]
        }))
        .unwrap();
        let row = CategoryRow::from(category);
        assert_eq!(row.attributes, "Fabric (select, required), Weight (number)");
        assert_eq!(row.edit_url, "/categories/c1/edit");
    }
}
