//! Product management: table, create/edit form, confirmed delete.
//!
//! The form is validated with [`ProductDraft::validate`] before any write is
//! sent. A draft that fails is re-rendered with the entered values and the
//! list of problems, and the backend never sees it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::listing::{ADMIN_PAGE_SIZE, ListQuery, Page};
use shopfront_core::product_draft::{DraftError, ProductDraft};
use shopfront_core::{
    AttributeKind, Category, CategoryId, Product, ProductAttribute, ProductId, Variant,
};

use crate::backend::BackendError;
use crate::components::{FilterOption, Pager, TableFilter};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::page::PageContext;
use crate::routes::{ConfirmDeleteTemplate, DeleteForm, Fields, done, fail, list_or_toast, reject};
use crate::state::AppState;

const LIST_PATH: &str = "/products";

/// Blank variant rows offered under the filled ones.
const SPARE_VARIANT_ROWS: usize = 3;

/// Blank free-form attribute rows offered when no category is chosen.
const SPARE_ATTRIBUTE_ROWS: usize = 2;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(LIST_PATH, get(index).post(create))
        .route("/products/new", get(new))
        .route("/products/{id}", axum::routing::post(update))
        .route("/products/{id}/edit", get(edit))
        .route(
            "/products/{id}/delete",
            get(confirm_delete).post(delete),
        )
}

fn product_url(id: &ProductId, suffix: &str) -> String {
    format!("/products/{}{suffix}", urlencoding::encode(id.as_str()))
}

// =============================================================================
// Table
// =============================================================================

#[derive(Debug, Clone)]
pub struct ProductRow {
    pub name: String,
    pub category: String,
    pub price: String,
    pub stock: u32,
    pub sizes: String,
    pub in_stock: bool,
    pub edit_url: String,
    pub delete_url: String,
}

impl ProductRow {
    fn new(product: &Product, categories: &[Category], state: &AppState) -> Self {
        let category = product
            .category_name
            .clone()
            .or_else(|| {
                product.category_id.as_ref().and_then(|id| {
                    categories
                        .iter()
                        .find(|c| &c.id == id)
                        .map(|c| c.name.clone())
                })
            })
            .unwrap_or_default();
        let sizes = product
            .variants
            .iter()
            .map(|v| format!("{} ({})", v.size, v.stock))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            name: product.name.clone(),
            category,
            price: state.money(product.price),
            stock: product.stock,
            sizes,
            in_stock: product.in_stock(),
            edit_url: product_url(&product.id, "/edit"),
            delete_url: product_url(&product.id, "/delete"),
        }
    }
}

fn category_filter_options(categories: &[Category]) -> Vec<FilterOption> {
    categories
        .iter()
        .map(|c| FilterOption::new(c.id.as_str(), &c.name))
        .collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductRow>,
    pub filters: Vec<TableFilter>,
    pub pager: Pager,
}

/// GET /products
#[instrument(skip_all)]
async fn index(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    mut page: PageContext,
    Query(query): Query<ListQuery>,
) -> Response {
    let (products, categories) = tokio::join!(
        state.backend().list_products(),
        state.backend().list_categories(),
    );
    let products = match list_or_toast(&session, &mut page, products).await {
        Ok(items) => items,
        Err(redirect) => return redirect,
    };
    let categories = match list_or_toast(&session, &mut page, categories).await {
        Ok(items) => items,
        Err(redirect) => return redirect,
    };

    let matching = query.product_filter().apply(products);
    let rows = Page::paginate(matching, query.page(), ADMIN_PAGE_SIZE)
        .map(|p| ProductRow::new(&p, &categories, &state));

    let filter_bar = vec![
        TableFilter::text("q", "Search", "Name or description", query.q.as_deref()),
        TableFilter::select(
            "category",
            "Category",
            category_filter_options(&categories),
            query.category.as_deref(),
        ),
        TableFilter::select(
            "stock",
            "Stock",
            vec![
                FilterOption::new("in_stock", "In stock"),
                FilterOption::new("out_of_stock", "Out of stock"),
            ],
            query.stock.as_deref(),
        ),
    ];

    ProductsIndexTemplate {
        pager: Pager::new(&rows, LIST_PATH, &query),
        products: rows.items,
        filters: filter_bar,
        page,
    }
    .into_response()
}

// =============================================================================
// Form
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantRow {
    pub size: String,
    pub stock: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionChoice {
    pub value: String,
    pub selected: bool,
}

/// One attribute input. `defined` rows come from the category and show as
/// a labelled field; the rest are free name/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRow {
    pub name: String,
    pub value: String,
    pub kind: AttributeKind,
    pub options: Vec<OptionChoice>,
    pub required: bool,
    pub defined: bool,
}

impl AttributeRow {
    fn free(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_select(&self) -> bool {
        self.defined && self.kind == AttributeKind::Select
    }

    #[must_use]
    pub fn is_number(&self) -> bool {
        self.defined && self.kind == AttributeKind::Number
    }
}

/// Product form values exactly as entered, so a rejected form can be shown
/// again without losing anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub category_id: String,
    /// One URL per line.
    pub images: String,
    pub variants: Vec<VariantRow>,
    pub attributes: Vec<AttributeRow>,
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            stock: product.stock.to_string(),
            category_id: product
                .category_id
                .as_ref()
                .map(|id| id.as_str().to_string())
                .unwrap_or_default(),
            images: product.images.join("\n"),
            variants: product
                .variants
                .iter()
                .map(|v| VariantRow {
                    size: v.size.clone(),
                    stock: v.stock.to_string(),
                })
                .collect(),
            attributes: product
                .attributes
                .iter()
                .map(|a| AttributeRow::free(&a.name, &a.value))
                .collect(),
        }
    }
}

impl ProductForm {
    /// Read a submitted form body.
    ///
    /// Rows are matched up by position: `variant_size`/`variant_stock` and
    /// `attr_name`/`attr_value` are always submitted in pairs.
    #[must_use]
    pub fn from_fields(fields: &Fields<'_>) -> Self {
        let variants = fields
            .all("variant_size")
            .into_iter()
            .zip(fields.all("variant_stock"))
            .map(|(size, stock)| VariantRow {
                size: size.trim().to_string(),
                stock: stock.trim().to_string(),
            })
            .filter(|row| !row.size.is_empty() || !row.stock.is_empty())
            .collect();
        let attributes = fields
            .all("attr_name")
            .into_iter()
            .zip(fields.all("attr_value"))
            .map(|(name, value)| AttributeRow::free(name.trim(), value.trim()))
            .filter(|row| !row.name.is_empty())
            .collect();

        Self {
            name: fields.get("name").trim().to_string(),
            description: fields.get("description").trim().to_string(),
            price: fields.get("price").trim().to_string(),
            stock: fields.get("stock").trim().to_string(),
            category_id: fields.get("category_id").trim().to_string(),
            images: fields.get("images").trim().to_string(),
            variants,
            attributes,
        }
    }

    #[must_use]
    pub fn category_id(&self) -> Option<CategoryId> {
        Some(self.category_id.as_str())
            .filter(|id| !id.is_empty())
            .map(CategoryId::new)
    }

    /// Lay the attribute rows out for `category`: one labelled row per
    /// definition (keeping any value already entered), then whatever else
    /// was entered.
    pub fn arrange_attributes(&mut self, category: Option<&Category>) {
        let mut entered = std::mem::take(&mut self.attributes);
        let mut rows = Vec::new();

        if let Some(category) = category {
            for def in &category.attributes {
                let value = entered
                    .iter()
                    .position(|row| row.name.eq_ignore_ascii_case(&def.name))
                    .map(|i| entered.remove(i).value)
                    .unwrap_or_default();
                rows.push(AttributeRow {
                    name: def.name.clone(),
                    options: def
                        .options
                        .iter()
                        .map(|o| OptionChoice {
                            value: o.clone(),
                            selected: *o == value,
                        })
                        .collect(),
                    value,
                    kind: def.kind,
                    required: def.required,
                    defined: true,
                });
            }
        }

        rows.extend(entered.into_iter().filter(|row| !row.value.is_empty()));
        if category.is_none_or(|c| c.attributes.is_empty()) {
            rows.extend((0..SPARE_ATTRIBUTE_ROWS).map(|_| AttributeRow::default()));
        }
        self.attributes = rows;
    }

    /// Variant rows plus blank ones for adding sizes.
    #[must_use]
    pub fn variant_rows(&self) -> Vec<VariantRow> {
        let mut rows = self.variants.clone();
        rows.extend((0..SPARE_VARIANT_ROWS).map(|_| VariantRow::default()));
        rows
    }

    /// Convert to a draft, reporting fields that are not numbers.
    ///
    /// # Errors
    ///
    /// Returns every parse problem found.
    pub fn to_draft(&self) -> Result<ProductDraft, Vec<DraftError>> {
        let mut errors = Vec::new();

        let price = self.price.parse::<Decimal>().unwrap_or_else(|_| {
            errors.push(DraftError::InvalidPrice);
            Decimal::ZERO
        });
        let stock = self.stock.parse::<u32>().unwrap_or_else(|_| {
            errors.push(DraftError::InvalidStock);
            0
        });

        let mut variants = Vec::with_capacity(self.variants.len());
        for row in &self.variants {
            match row.stock.parse::<u32>() {
                Ok(stock) => variants.push(Variant {
                    size: row.size.clone(),
                    stock,
                }),
                Err(_) => errors.push(DraftError::InvalidVariantStock(row.size.clone())),
            }
        }

        let attributes = self
            .attributes
            .iter()
            .filter(|row| !row.name.is_empty() && !row.value.is_empty())
            .map(|row| ProductAttribute {
                name: row.name.clone(),
                value: row.value.clone(),
            })
            .collect();

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ProductDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            price,
            stock,
            category_id: self.category_id(),
            images: self
                .images
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            variants,
            attributes,
        })
    }

    /// Parse and validate against `category`.
    ///
    /// # Errors
    ///
    /// Returns the messages to show above the form.
    pub fn validate(&self, category: Option<&Category>) -> Result<ProductDraft, Vec<String>> {
        let to_messages = |errors: Vec<DraftError>| -> Vec<String> {
            errors.iter().map(ToString::to_string).collect()
        };
        let draft = self.to_draft().map_err(to_messages)?;
        draft.validate(category).map_err(to_messages)?;
        Ok(draft)
    }
}

#[derive(Debug, Clone)]
pub struct CategoryChoice {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub page: PageContext,
    pub heading: String,
    /// Where the form posts.
    pub action: String,
    /// Where the category chooser reloads the form.
    pub reload_url: String,
    pub form: ProductForm,
    pub variant_rows: Vec<VariantRow>,
    pub categories: Vec<CategoryChoice>,
    pub category_name: Option<String>,
    pub errors: Vec<String>,
}

impl ProductFormTemplate {
    fn new(
        page: PageContext,
        heading: String,
        action: String,
        reload_url: String,
        mut form: ProductForm,
        categories: &[Category],
        errors: Vec<String>,
    ) -> Self {
        let category = categories.iter().find(|c| c.id.as_str() == form.category_id);
        form.arrange_attributes(category);
        Self {
            page,
            heading,
            action,
            reload_url,
            variant_rows: form.variant_rows(),
            categories: categories
                .iter()
                .map(|c| CategoryChoice {
                    id: c.id.as_str().to_string(),
                    name: c.name.clone(),
                    selected: c.id.as_str() == form.category_id,
                })
                .collect(),
            category_name: category.map(|c| c.name.clone()),
            form,
            errors,
        }
    }
}

/// `?category=` on the form pages switches which attributes are shown.
#[derive(Debug, Default, Deserialize)]
pub struct FormQuery {
    pub category: Option<String>,
}

/// GET /products/new
#[instrument(skip_all)]
async fn new(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    mut page: PageContext,
    Query(query): Query<FormQuery>,
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

    let form = ProductForm {
        category_id: query.category.unwrap_or_default(),
        ..ProductForm::default()
    };
    ProductFormTemplate::new(
        page,
        "New product".to_string(),
        LIST_PATH.to_string(),
        "/products/new".to_string(),
        form,
        &categories,
        Vec::new(),
    )
    .into_response()
}

/// GET /products/{id}/edit
#[instrument(skip_all, fields(product_id = %id))]
async fn edit(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    mut page: PageContext,
    Path(id): Path<String>,
    Query(query): Query<FormQuery>,
) -> Result<Response, AppError> {
    let id = ProductId::new(id);
    let (product, categories) = tokio::join!(
        state.backend().get_product(&id),
        state.backend().list_categories(),
    );
    let product = match product {
        Ok(product) => product,
        Err(BackendError::NotFound(_)) => return Err(AppError::NotFound(format!("product {id}"))),
        Err(e) => return Ok(fail(&session, &e, LIST_PATH).await),
    };
    let categories = match list_or_toast(&session, &mut page, categories).await {
        Ok(items) => items,
        Err(redirect) => return Ok(redirect),
    };

    let mut form = ProductForm::from(&product);
    if let Some(category) = query.category {
        form.category_id = category;
    }
    Ok(ProductFormTemplate::new(
        page,
        format!("Edit {}", product.name),
        product_url(&id, ""),
        product_url(&id, "/edit"),
        form,
        &categories,
        Vec::new(),
    )
    .into_response())
}

/// Validate a submitted form; on failure, the page to send back instead.
async fn checked_draft(
    state: &AppState,
    session: &Session,
    mut page: PageContext,
    form: ProductForm,
    heading: String,
    action: String,
    reload_url: String,
) -> Result<ProductDraft, Response> {
    let categories = match list_or_toast(session, &mut page, state.backend().list_categories().await)
        .await
    {
        Ok(items) => items,
        Err(redirect) => return Err(redirect),
    };
    let category = form
        .category_id()
        .and_then(|id| categories.iter().find(|c| c.id == id));

    if form.category_id().is_some() && category.is_none() {
        let errors = vec!["The selected category no longer exists.".to_string()];
        return Err(render_invalid(page, heading, action, reload_url, form, &categories, errors));
    }

    match form.validate(category) {
        Ok(draft) => Ok(draft),
        Err(errors) => {
            tracing::debug!(?errors, "Product form rejected");
            Err(render_invalid(page, heading, action, reload_url, form, &categories, errors))
        }
    }
}

fn render_invalid(
    page: PageContext,
    heading: String,
    action: String,
    reload_url: String,
    form: ProductForm,
    categories: &[Category],
    errors: Vec<String>,
) -> Response {
    let template =
        ProductFormTemplate::new(page, heading, action, reload_url, form, categories, errors);
    (StatusCode::UNPROCESSABLE_ENTITY, template).into_response()
}

/// POST /products
#[instrument(skip_all)]
async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(raw): Form<Vec<(String, String)>>,
) -> Response {
    let form = ProductForm::from_fields(&Fields(&raw));
    let draft = match checked_draft(
        &state,
        &session,
        page,
        form,
        "New product".to_string(),
        LIST_PATH.to_string(),
        "/products/new".to_string(),
    )
    .await
    {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    match state.backend().create_product(&admin.token, &draft).await {
        Ok(()) => {
            tracing::info!(name = %draft.name, "Product created");
            done(&session, &format!("Created {}.", draft.name), LIST_PATH).await
        }
        Err(e) => fail(&session, &e, "/products/new").await,
    }
}

/// POST /products/{id}
#[instrument(skip_all, fields(product_id = %id))]
async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Path(id): Path<String>,
    Form(raw): Form<Vec<(String, String)>>,
) -> Response {
    let id = ProductId::new(id);
    let edit_url = product_url(&id, "/edit");
    let form = ProductForm::from_fields(&Fields(&raw));
    let heading = format!("Edit {}", form.name);
    let draft = match checked_draft(
        &state,
        &session,
        page,
        form,
        heading,
        product_url(&id, ""),
        edit_url.clone(),
    )
    .await
    {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    match state.backend().update_product(&admin.token, &id, &draft).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product updated");
            done(&session, &format!("Saved {}.", draft.name), LIST_PATH).await
        }
        Err(e) => fail(&session, &e, &edit_url).await,
    }
}

// =============================================================================
// Delete
// =============================================================================

/// GET /products/{id}/delete
#[instrument(skip_all, fields(product_id = %id))]
async fn confirm_delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = ProductId::new(id);
    let product = match state.backend().get_product(&id).await {
        Ok(product) => product,
        Err(BackendError::NotFound(_)) => return Err(AppError::NotFound(format!("product {id}"))),
        Err(e) => return Ok(fail(&session, &e, LIST_PATH).await),
    };

    Ok(ConfirmDeleteTemplate {
        page,
        kind: "product",
        subject: product.name,
        warning: (product.stock > 0)
            .then(|| format!("{} units are still in stock.", product.stock)),
        action: product_url(&id, "/delete"),
        cancel_url: LIST_PATH.to_string(),
    }
    .into_response())
}

/// POST /products/{id}/delete
#[instrument(skip_all, fields(product_id = %id))]
async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    let id = ProductId::new(id);
    if !form.confirmed() {
        return reject(&session, "Deletion was not confirmed.", LIST_PATH).await;
    }

    match state.backend().delete_product(&admin.token, &id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            done(&session, "Product deleted.", LIST_PATH).await
        }
        Err(e) => fail(&session, &e, LIST_PATH).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn clothing() -> Category {
        serde_json::from_value(json!({
            "id": "c1",
            "name": "Clothing",
            "attributes": [
                {"name": "Fabric", "type": "select", "options": ["Cotton", "Linen"], "required": true},
                {"name": "Weight", "type": "number"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_from_fields_pairs_rows_and_drops_blank_ones() {
        let raw = pairs(&[
            ("name", " Tee "),
            ("price", "499"),
            ("stock", "5"),
            ("variant_size", "S"),
            ("variant_stock", "2"),
            ("variant_size", ""),
            ("variant_stock", ""),
            ("variant_size", "M"),
            ("variant_stock", "3"),
            ("attr_name", "Fabric"),
            ("attr_value", "Cotton"),
            ("attr_name", ""),
            ("attr_value", ""),
        ]);
        let form = ProductForm::from_fields(&Fields(&raw));
        assert_eq!(form.name, "Tee");
        assert_eq!(form.variants.len(), 2);
        assert_eq!(form.attributes.len(), 1);

        let draft = form.validate(Some(&clothing())).unwrap();
        assert_eq!(draft.variant_stock_total(), 5);
        assert_eq!(draft.attribute("fabric"), Some("Cotton"));
    }

    #[test]
    fn test_variant_stock_mismatch_is_reported() {
        let raw = pairs(&[
            ("name", "Tee"),
            ("price", "499"),
            ("stock", "10"),
            ("variant_size", "S"),
            ("variant_stock", "2"),
        ]);
        let errors = ProductForm::from_fields(&Fields(&raw))
            .validate(None)
            .unwrap_err();
        assert_eq!(
            errors,
            vec!["Variant stock adds up to 2 but product stock is 10".to_string()]
        );
    }

    #[test]
    fn test_unparseable_numbers_are_reported_together() {
        let raw = pairs(&[
            ("name", "Tee"),
            ("price", "cheap"),
            ("stock", "-1"),
            ("variant_size", "L"),
            ("variant_stock", "lots"),
        ]);
        let errors = ProductForm::from_fields(&Fields(&raw)).to_draft().unwrap_err();
        assert_eq!(
            errors,
            vec![
                DraftError::InvalidPrice,
                DraftError::InvalidStock,
                DraftError::InvalidVariantStock("L".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_errors_become_form_messages() {
        let raw = pairs(&[("name", "Tee"), ("price", "cheap"), ("stock", "3")]);
        let errors = ProductForm::from_fields(&Fields(&raw))
            .validate(None)
            .unwrap_err();
        assert_eq!(errors, vec![DraftError::InvalidPrice.to_string()]);
    }

    #[test]
    fn test_images_one_per_line() {
        let form = ProductForm {
            name: "Lamp".to_string(),
            price: "10".to_string(),
            stock: "1".to_string(),
            images: "https://cdn.test/a.jpg\n\n  https://cdn.test/b.jpg  ".to_string(),
            ..ProductForm::default()
        };
        let draft = form.to_draft().unwrap();
        assert_eq!(
            draft.images,
            vec!["https://cdn.test/a.jpg", "https://cdn.test/b.jpg"]
        );
    }

    #[test]
    fn test_arrange_attributes_follows_category() {
        let mut form = ProductForm {
            attributes: vec![
                AttributeRow::free("fabric", "Linen"),
                AttributeRow::free("Origin", "India"),
            ],
            ..ProductForm::default()
        };
        form.arrange_attributes(Some(&clothing()));

        let names: Vec<&str> = form.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Fabric", "Weight", "Origin"]);
        let fabric = &form.attributes[0];
        assert!(fabric.is_select() && fabric.required);
        assert_eq!(fabric.value, "Linen");
        assert!(fabric.options.iter().any(|o| o.value == "Linen" && o.selected));
        assert!(form.attributes[1].is_number());
        assert!(!form.attributes[2].defined);
    }

    #[test]
    fn test_uncategorised_form_offers_blank_attribute_rows() {
        let mut form = ProductForm::default();
        form.arrange_attributes(None);
        assert_eq!(form.attributes.len(), SPARE_ATTRIBUTE_ROWS);
        assert_eq!(form.variant_rows().len(), SPARE_VARIANT_ROWS);
    }

    #[test]
    fn test_product_round_trips_into_form() {
        let product: Product = serde_json::from_value(json!({
            "id": "p1", "name": "Tee", "price": "12.50", "stock": 3, "category_id": "c1",
            "variants": [{"size": "S", "stock": 3}],
            "attributes": [{"name": "Fabric", "value": "Cotton"}]
        }))
        .unwrap();
        let form = ProductForm::from(&product);
        let draft = form.validate(Some(&clothing())).unwrap();
        assert_eq!(draft, ProductDraft::from(&product));
    }
}
