//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{Category, Product, User};

use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::page::PageContext;
use crate::routes::list_or_toast;
use crate::state::AppState;

/// Products at or below this stock are listed on the dashboard.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// How many low-stock products the dashboard lists.
const LOW_STOCK_LIMIT: usize = 10;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// Headline counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardMetrics {
    pub products: usize,
    pub out_of_stock: usize,
    pub categories: usize,
    pub customers: usize,
    pub admins: usize,
}

impl DashboardMetrics {
    #[must_use]
    pub fn new(products: &[Product], categories: &[Category], users: &[User]) -> Self {
        let admins = users.iter().filter(|u| u.is_admin()).count();
        Self {
            products: products.len(),
            out_of_stock: products.iter().filter(|p| !p.in_stock()).count(),
            categories: categories.len(),
            customers: users.len() - admins,
            admins,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LowStockRow {
    pub name: String,
    pub stock: u32,
    pub edit_url: String,
}

/// Products running low, emptiest first.
#[must_use]
pub fn low_stock(products: &[Product]) -> Vec<LowStockRow> {
    let mut low: Vec<&Product> = products
        .iter()
        .filter(|p| p.stock <= LOW_STOCK_THRESHOLD)
        .collect();
    low.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));
    low.into_iter()
        .take(LOW_STOCK_LIMIT)
        .map(|p| LowStockRow {
            name: p.name.clone(),
            stock: p.stock,
            edit_url: format!("/products/{}/edit", urlencoding::encode(p.id.as_str())),
        })
        .collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub metrics: DashboardMetrics,
    pub low_stock: Vec<LowStockRow>,
    pub low_stock_threshold: u32,
}

/// GET /
#[instrument(skip_all)]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    mut page: PageContext,
) -> Response {
    let backend = state.backend();
    let (products, categories, users) = tokio::join!(
        backend.list_products(),
        backend.list_categories(),
        backend.list_users(&admin.token),
    );

    let products = match list_or_toast(&session, &mut page, products).await {
        Ok(items) => items,
        Err(redirect) => return redirect,
    };
    let categories = match list_or_toast(&session, &mut page, categories).await {
        Ok(items) => items,
        Err(redirect) => return redirect,
    };
    let users = match list_or_toast(&session, &mut page, users).await {
        Ok(items) => items,
        Err(redirect) => return redirect,
    };

    DashboardTemplate {
        metrics: DashboardMetrics::new(&products, &categories, &users),
        low_stock: low_stock(&products),
        low_stock_threshold: LOW_STOCK_THRESHOLD,
        page,
    }
    .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn products() -> Vec<Product> {
        serde_json::from_value(json!([
            {"id": "p1", "name": "Lamp", "price": "20", "stock": 3},
            {"id": "p2", "name": "Shirt", "price": "10", "stock": 0},
            {"id": "p3", "name": "Desk", "price": "99", "stock": 40}
        ]))
        .unwrap()
    }

    #[test]
    fn test_metrics_split_users_by_role() {
        let users: Vec<User> = serde_json::from_value(json!([
            {"id": "u1", "name": "A", "email": "a@shop.test", "role": "admin"},
            {"id": "u2", "name": "B", "email": "b@shop.test"},
            {"id": "u3", "name": "C", "email": "c@shop.test"}
        ]))
        .unwrap();
        let metrics = DashboardMetrics::new(&products(), &[], &users);
        assert_eq!(metrics.products, 3);
        assert_eq!(metrics.out_of_stock, 1);
        assert_eq!(metrics.admins, 1);
        assert_eq!(metrics.customers, 2);
    }

    #[test]
    fn test_low_stock_sorted_emptiest_first() {
        let rows = low_stock(&products());
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Shirt", "Lamp"]);
        assert_eq!(rows[0].edit_url, "/products/p2/edit");
    }
}
