//! Cart route handlers.
//!
//! The cart lives in the backend, keyed by the signed-in customer.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{Cart, Product, ProductId};

use crate::backend::BackendError;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::page::PageContext;
use crate::routes::{done, fail, reject, session_expired};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_url: String,
    pub name: String,
    pub size: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image: Option<String>,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, state: &AppState) -> Self {
        Self {
            items: cart
                .items
                .iter()
                .map(|item| CartItemView {
                    product_url: format!(
                        "/products/{}",
                        urlencoding::encode(item.product_id.as_str())
                    ),
                    name: item.name.clone(),
                    size: item.size.clone(),
                    quantity: item.quantity,
                    price: state.money(item.price),
                    line_price: state.money(item.line_total()),
                    image: item.image.clone(),
                })
                .collect(),
            subtotal: state.money(cart.subtotal()),
            item_count: cart.item_count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Display cart page.
#[instrument(skip(state, page, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    session: Session,
) -> Result<Response, AppError> {
    let cart = match state.backend().get_cart(&user.token).await {
        Ok(cart) => cart,
        Err(BackendError::Unauthorized) => return Ok(session_expired(&session).await),
        Err(e) => return Err(e.into()),
    };

    Ok(CartShowTemplate {
        cart: CartView::new(&cart, &state),
        page,
    }
    .into_response())
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<String>,
    pub size: Option<String>,
}

/// Why an add-to-cart request was refused before reaching the backend.
#[derive(Debug, PartialEq, Eq)]
enum LineProblem {
    BadQuantity,
    SizeRequired,
    UnknownSize,
    NotEnoughStock(u32),
}

impl LineProblem {
    fn message(&self) -> String {
        match self {
            Self::BadQuantity => "Quantity must be at least 1.".to_string(),
            Self::SizeRequired => "Please choose a size.".to_string(),
            Self::UnknownSize => "That size is not available.".to_string(),
            Self::NotEnoughStock(0) => "Sorry, this item is out of stock.".to_string(),
            Self::NotEnoughStock(n) => format!("Only {n} left in stock."),
        }
    }
}

/// Check a requested line against the product as last fetched.
fn check_line(product: &Product, quantity: u32, size: Option<&str>) -> Result<(), LineProblem> {
    if quantity == 0 {
        return Err(LineProblem::BadQuantity);
    }
    if product.has_variants() {
        let Some(size) = size else {
            return Err(LineProblem::SizeRequired);
        };
        if product.variant(size).is_none() {
            return Err(LineProblem::UnknownSize);
        }
    }
    let available = product.available(size);
    if quantity > available {
        return Err(LineProblem::NotEnoughStock(available));
    }
    Ok(())
}

fn parse_quantity(input: Option<&str>) -> Option<u32> {
    match input.map(str::trim).filter(|q| !q.is_empty()) {
        None => Some(1),
        Some(q) => q.parse().ok(),
    }
}

/// Add item to cart.
///
/// A size is required when the product is sold in sizes; the quantity must
/// be at least one.
#[instrument(skip(state, session, user))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id);
    let back = format!("/products/{}", urlencoding::encode(product_id.as_str()));
    let size = form.size.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let Some(quantity) = parse_quantity(form.quantity.as_deref()) else {
        return reject(&session, &LineProblem::BadQuantity.message(), &back).await;
    };

    let product = match state.backend().get_product(&product_id).await {
        Ok(product) => product,
        Err(e) => return fail(&session, &e, &back).await,
    };
    if let Err(problem) = check_line(&product, quantity, size) {
        return reject(&session, &problem.message(), &back).await;
    }

    match state
        .backend()
        .add_to_cart(&user.token, &product_id, quantity, size)
        .await
    {
        Ok(()) => {
            crate::error::add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("product_id", product_id.as_str())]),
            );
            let message = format!("Added {} to your cart.", product.name);
            done(&session, &message, "/cart").await
        }
        Err(e) => fail(&session, &e, &back).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product(variants: serde_json::Value, stock: u32) -> Product {
        serde_json::from_value(json!({
            "id": "p1",
            "name": "Tee",
            "price": "10.00",
            "stock": stock,
            "variants": variants,
        }))
        .unwrap()
    }

    #[test]
    fn test_size_required_for_variant_products() {
        let tee = product(json!([{"size": "S", "stock": 2}, {"size": "M", "stock": 0}]), 2);
        assert_eq!(check_line(&tee, 1, None), Err(LineProblem::SizeRequired));
        assert_eq!(check_line(&tee, 1, Some("XL")), Err(LineProblem::UnknownSize));
        assert_eq!(check_line(&tee, 1, Some("M")), Err(LineProblem::NotEnoughStock(0)));
        assert_eq!(check_line(&tee, 2, Some("S")), Ok(()));
    }

    #[test]
    fn test_quantity_must_be_positive() {
        let mug = product(json!([]), 5);
        assert_eq!(check_line(&mug, 0, None), Err(LineProblem::BadQuantity));
        assert_eq!(check_line(&mug, 6, None), Err(LineProblem::NotEnoughStock(5)));
        assert_eq!(check_line(&mug, 5, None), Ok(()));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(None), Some(1));
        assert_eq!(parse_quantity(Some("")), Some(1));
        assert_eq!(parse_quantity(Some("3")), Some(3));
        assert_eq!(parse_quantity(Some("-1")), None);
        assert_eq!(parse_quantity(Some("two")), None);
    }
}
