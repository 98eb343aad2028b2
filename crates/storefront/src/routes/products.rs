//! Product listing, detail and review handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::listing::{ListQuery, Page, STOREFRONT_PAGE_SIZE};
use shopfront_core::{Category, Product, ProductId};

use crate::backend::BackendError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::page::PageContext;
use crate::routes::{done, fail, reject};
use crate::state::AppState;

// =============================================================================
// View types
// =============================================================================

/// Product tile shown in grids.
#[derive(Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub in_stock: bool,
    pub rating: Option<String>,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, state: &AppState) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: state.money(product.price),
            image: product.primary_image().map(String::from),
            category: product.category_name.clone(),
            in_stock: product.in_stock(),
            rating: product.average_rating.map(|r| format!("{r:.1}")),
        }
    }
}

/// Category option in the filter form.
#[derive(Clone)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// One size in the picker.
#[derive(Clone)]
pub struct SizeView {
    pub size: String,
    pub stock: u32,
    pub available: bool,
}

#[derive(Clone)]
pub struct AttributeView {
    pub name: String,
    pub value: String,
}

#[derive(Clone)]
pub struct ReviewView {
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
    pub date: Option<String>,
}

/// Everything the product page shows.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: Option<String>,
    pub images: Vec<String>,
    pub stock: u32,
    pub in_stock: bool,
    pub sizes: Vec<SizeView>,
    pub attributes: Vec<AttributeView>,
    pub rating: Option<String>,
    pub reviews: Vec<ReviewView>,
}

impl ProductDetailView {
    fn new(product: &Product, state: &AppState) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: state.money(product.price),
            category: product.category_name.clone(),
            images: product.images.clone(),
            stock: product.stock,
            in_stock: product.in_stock(),
            sizes: product
                .variants
                .iter()
                .map(|v| SizeView {
                    size: v.size.clone(),
                    stock: v.stock,
                    available: v.stock > 0,
                })
                .collect(),
            attributes: product
                .attributes
                .iter()
                .map(|a| AttributeView {
                    name: a.name.clone(),
                    value: a.value.clone(),
                })
                .collect(),
            rating: product.average_rating.map(|r| format!("{r:.1}")),
            reviews: product
                .reviews
                .iter()
                .map(|r| ReviewView {
                    user_name: r.user_name.clone(),
                    rating: r.rating,
                    comment: r.comment.clone(),
                    date: r.created_at.map(|d| d.format("%b %-d, %Y").to_string()),
                })
                .collect(),
        }
    }

    /// Whether the size picker is shown.
    #[must_use]
    pub fn has_sizes(&self) -> bool {
        !self.sizes.is_empty()
    }
}

/// Current filter values echoed back into the form.
#[derive(Clone, Default)]
pub struct FilterForm {
    pub q: String,
    pub min_price: String,
    pub max_price: String,
    pub attribute: String,
    pub value: String,
}

impl From<&ListQuery> for FilterForm {
    fn from(query: &ListQuery) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            q: text(&query.q),
            min_price: text(&query.min_price),
            max_price: text(&query.max_price),
            attribute: text(&query.attribute),
            value: text(&query.value),
        }
    }
}

/// Listing URL for another page with the same filters.
#[must_use]
pub fn page_url(base: &str, query: &ListQuery, page: usize) -> String {
    let params = [
        ("q", &query.q),
        ("category", &query.category),
        ("min_price", &query.min_price),
        ("max_price", &query.max_price),
        ("attribute", &query.attribute),
        ("value", &query.value),
        ("stock", &query.stock),
        ("role", &query.role),
    ];
    let mut url = format!("{base}?page={page}");
    for (key, value) in params {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
    }
    url
}

/// Pager links under a listing.
#[derive(Clone)]
pub struct Pager {
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl Pager {
    #[must_use]
    pub fn new<T>(page: &Page<T>, base: &str, query: &ListQuery) -> Self {
        Self {
            page: page.page,
            total_pages: page.total_pages,
            total_items: page.total_items,
            prev_url: page
                .has_prev()
                .then(|| page_url(base, query, page.prev_page())),
            next_url: page
                .has_next()
                .then(|| page_url(base, query, page.next_page())),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCard>,
    pub categories: Vec<CategoryOption>,
    pub form: FilterForm,
    pub filtered: bool,
    pub pager: Pager,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductDetailView,
    pub signed_in: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the product listing with filters applied in-process.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    mut page: PageContext,
    Query(query): Query<ListQuery>,
) -> ProductsIndexTemplate {
    let backend = state.backend();
    let (products, categories) = tokio::join!(backend.list_products(), backend.list_categories());

    let products = products.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to fetch products");
        page.push_error(e.user_message());
        Vec::new()
    });
    let categories: Vec<Category> = categories.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch categories");
        Vec::new()
    });

    let filter = query.product_filter();
    let listing = Page::paginate(filter.apply(products), query.page(), STOREFRONT_PAGE_SIZE);
    let pager = Pager::new(&listing, "/products", &query);
    let selected = filter.category.as_ref().map(ToString::to_string);

    ProductsIndexTemplate {
        form: FilterForm::from(&query),
        filtered: filter.is_active(),
        categories: categories
            .iter()
            .map(|c| CategoryOption {
                id: c.id.to_string(),
                name: c.name.clone(),
                selected: selected.as_deref() == Some(c.id.as_str()),
            })
            .collect(),
        products: listing.items.iter().map(|p| ProductCard::new(p, &state)).collect(),
        pager,
        page,
    }
}

/// Display a product with its sizes and reviews.
#[instrument(skip(state, page), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(id): Path<String>,
) -> Result<ProductShowTemplate> {
    let product = match state.backend().get_product(&ProductId::new(id)).await {
        Ok(product) => product,
        Err(BackendError::NotFound(_)) => {
            return Err(AppError::NotFound("product".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(ProductShowTemplate {
        product: ProductDetailView::new(&product, &state),
        signed_in: page.user.is_some(),
        page,
    })
}

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: String,
    pub comment: String,
}

/// Parse a 1-5 star rating.
fn parse_rating(input: &str) -> Option<u8> {
    input
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|r| (1..=5).contains(r))
}

/// Post a review for a product.
#[instrument(skip(state, session, user, form), fields(product_id = %id))]
pub async fn submit_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Response {
    let product_id = ProductId::new(id);
    let back = format!("/products/{}#reviews", urlencoding::encode(product_id.as_str()));

    let Some(rating) = parse_rating(&form.rating) else {
        return reject(&session, "Please choose a rating from 1 to 5.", &back).await;
    };
    let comment = form.comment.trim();
    if comment.is_empty() {
        return reject(&session, "Please write a comment.", &back).await;
    }

    match state
        .backend()
        .submit_review(&user.token, &product_id, rating, comment)
        .await
    {
        Ok(()) => done(&session, "Thanks for your review!", &back).await,
        Err(e) => fail(&session, &e, &back).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rating_bounds() {
        assert_eq!(parse_rating("1"), Some(1));
        assert_eq!(parse_rating(" 5 "), Some(5));
        assert_eq!(parse_rating("0"), None);
        assert_eq!(parse_rating("6"), None);
        assert_eq!(parse_rating("four"), None);
    }

    #[test]
    fn test_page_url_keeps_filters() {
        let query = ListQuery {
            q: Some("linen shirt".to_string()),
            category: Some("c1".to_string()),
            min_price: Some(String::new()),
            ..ListQuery::default()
        };
        assert_eq!(
            page_url("/products", &query, 3),
            "/products?page=3&q=linen%20shirt&category=c1"
        );
    }
}
