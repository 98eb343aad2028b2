//! Order history and confirmation handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{Order, OrderId, OrderStatus};

use crate::backend::BackendError;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::page::PageContext;
use crate::routes::session_expired;
use crate::state::AppState;

#[derive(Clone)]
pub struct OrderLineView {
    pub name: String,
    pub size: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub id: String,
    pub url: String,
    pub status: &'static str,
    pub status_class: &'static str,
    pub total: String,
    pub item_count: u32,
    pub items: Vec<OrderLineView>,
    pub address: Option<String>,
    pub payment: Option<&'static str>,
    pub placed_on: Option<String>,
}

const fn status_class(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending | OrderStatus::Processing => "badge--pending",
        OrderStatus::Shipped => "badge--shipped",
        OrderStatus::Delivered => "badge--done",
        OrderStatus::Cancelled => "badge--cancelled",
    }
}

impl OrderView {
    #[must_use]
    pub fn new(order: &Order, state: &AppState) -> Self {
        Self {
            id: order.id.to_string(),
            url: format!("/account/orders/{}", urlencoding::encode(order.id.as_str())),
            status: order.status.label(),
            status_class: status_class(order.status),
            total: state.money(order.total),
            item_count: order.items.iter().map(|i| i.quantity).sum(),
            items: order
                .items
                .iter()
                .map(|i| OrderLineView {
                    name: i.name.clone(),
                    size: i.size.clone(),
                    quantity: i.quantity,
                    price: state.money(i.price),
                    line_price: state.money(i.line_total()),
                })
                .collect(),
            address: order.address.as_ref().map(shopfront_core::Address::one_line),
            payment: order.payment_method.map(shopfront_core::PaymentMethod::label),
            placed_on: order
                .created_at
                .map(|d| d.format("%b %-d, %Y").to_string()),
        }
    }
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderView>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: PageContext,
    pub order: OrderView,
}

/// Order placed template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/confirmation.html")]
pub struct ConfirmationTemplate {
    pub page: PageContext,
    pub order: OrderView,
}

/// Fetch an order, or the response to send instead.
async fn fetch_order(
    state: &AppState,
    session: &Session,
    token: &shopfront_core::AccessToken,
    id: String,
) -> Result<Order, Response> {
    match state.backend().get_order(token, &OrderId::new(id)).await {
        Ok(order) => Ok(order),
        Err(BackendError::Unauthorized) => Err(session_expired(session).await),
        Err(BackendError::NotFound(_)) => {
            Err(AppError::NotFound("order".to_string()).into_response())
        }
        Err(e) => Err(AppError::from(e).into_response()),
    }
}

/// Display order history, newest first.
#[instrument(skip(state, page, session, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    mut page: PageContext,
    session: Session,
) -> Response {
    let mut orders = match state.backend().list_orders(&user.token).await {
        Ok(orders) => orders,
        Err(BackendError::Unauthorized) => return session_expired(&session).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch orders");
            page.push_error(e.user_message());
            Vec::new()
        }
    };
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    OrdersIndexTemplate {
        orders: orders.iter().map(|o| OrderView::new(o, &state)).collect(),
        page,
    }
    .into_response()
}

/// Display one order.
#[instrument(skip(state, page, session, user), fields(order_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let order = match fetch_order(&state, &session, &user.token, id).await {
        Ok(order) => order,
        Err(response) => return response,
    };

    OrderShowTemplate {
        order: OrderView::new(&order, &state),
        page,
    }
    .into_response()
}

/// Display the confirmation for a just-placed order.
#[instrument(skip(state, page, session, user), fields(order_id = %id))]
pub async fn confirmation(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let order = match fetch_order(&state, &session, &user.token, id).await {
        Ok(order) => order,
        Err(response) => return response,
    };

    ConfirmationTemplate {
        order: OrderView::new(&order, &state),
        page,
    }
    .into_response()
}
