//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::filters;
use crate::page::PageContext;
use crate::routes::products::ProductCard;
use crate::state::AppState;

/// Number of products featured on the home page.
const FEATURED_COUNT: usize = 8;

/// Category link in the home page strip.
#[derive(Clone)]
pub struct CategoryLink {
    pub name: String,
    pub url: String,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub featured: Vec<ProductCard>,
    pub categories: Vec<CategoryLink>,
}

/// Display the home page.
///
/// Featured products are the best-rated in-stock ones.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, mut page: PageContext) -> HomeTemplate {
    let backend = state.backend();
    let (products, categories) = tokio::join!(backend.list_products(), backend.list_categories());

    let mut products = products.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to fetch products for home page");
        page.push_error(e.user_message());
        Vec::new()
    });
    products.retain(shopfront_core::Product::in_stock);
    products.sort_by(|a, b| {
        b.average_rating
            .unwrap_or(0.0)
            .total_cmp(&a.average_rating.unwrap_or(0.0))
    });

    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch categories for home page");
        Vec::new()
    });

    HomeTemplate {
        featured: products
            .iter()
            .take(FEATURED_COUNT)
            .map(|p| ProductCard::new(p, &state))
            .collect(),
        categories: categories
            .iter()
            .map(|c| CategoryLink {
                name: c.name.clone(),
                url: format!("/products?category={}", urlencoding::encode(c.id.as_str())),
            })
            .collect(),
        page,
    }
}
