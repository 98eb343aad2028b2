//! Cart and order endpoints, and the checkout gateway built on them.

use reqwest::Method;
use serde::Serialize;
use shopfront_core::checkout::{GatewayError, OrderGateway, OtpCode};
use shopfront_core::{
    AccessToken, AddressId, Cart, Order, OrderId, PaymentMethod, ProductId,
};
use tracing::instrument;

use super::{BackendClient, BackendError, segment};

#[derive(Serialize)]
struct AddToCartRequest<'a> {
    product_id: &'a ProductId,
    quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<&'a str>,
}

#[derive(Serialize)]
struct VerifyOtpRequest<'a> {
    otp: &'a str,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceOrderRequest {
    pub address_id: AddressId,
    pub payment_method: PaymentMethod,
}

impl BackendClient {
    // =========================================================================
    // Cart
    // =========================================================================

    /// The signed-in user's cart (`GET /cart`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &AccessToken) -> Result<Cart, BackendError> {
        self.fetch(self.request(Method::GET, "cart", Some(token))?)
            .await
    }

    /// Add a product to the cart (`POST /cart`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the line (e.g. out of stock).
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        token: &AccessToken,
        product_id: &ProductId,
        quantity: u32,
        size: Option<&str>,
    ) -> Result<(), BackendError> {
        let builder = self
            .request(Method::POST, "cart", Some(token))?
            .json(&AddToCartRequest {
                product_id,
                quantity,
                size,
            });
        self.send(builder).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Issue a checkout code to the customer (`POST /orders/generate-otp`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot issue a code.
    #[instrument(skip(self, token))]
    pub async fn generate_order_otp(&self, token: &AccessToken) -> Result<(), BackendError> {
        let builder = self
            .request(Method::POST, "orders/generate-otp", Some(token))?
            .json(&serde_json::json!({}));
        self.send(builder).await
    }

    /// Check a checkout code (`POST /orders/verify-otp`).
    ///
    /// # Errors
    ///
    /// Returns an error carrying the backend's message for a wrong code.
    #[instrument(skip(self, token, code))]
    pub async fn verify_order_otp(
        &self,
        token: &AccessToken,
        code: &OtpCode,
    ) -> Result<(), BackendError> {
        let builder = self
            .request(Method::POST, "orders/verify-otp", Some(token))?
            .json(&VerifyOtpRequest {
                otp: code.as_str(),
            });
        self.send(builder).await
    }

    /// Place the order for the current cart (`POST /orders`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the order.
    #[instrument(skip(self, token, request), fields(address_id = %request.address_id))]
    pub async fn place_order(
        &self,
        token: &AccessToken,
        request: &PlaceOrderRequest,
    ) -> Result<Order, BackendError> {
        let builder = self
            .request(Method::POST, "orders", Some(token))?
            .json(request);
        self.fetch(builder).await
    }

    /// Order history (`GET /orders`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, token))]
    pub async fn list_orders(&self, token: &AccessToken) -> Result<Vec<Order>, BackendError> {
        self.fetch(self.request(Method::GET, "orders", Some(token))?)
            .await
    }

    /// One order (`GET /orders/{id}`).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids, or an error if the request fails.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &AccessToken, id: &OrderId) -> Result<Order, BackendError> {
        let path = format!("orders/{}", segment(id.as_str()));
        self.fetch(self.request(Method::GET, &path, Some(token))?)
            .await
    }
}

/// The verify and place calls of one customer's checkout.
pub struct CheckoutGateway<'a> {
    client: &'a BackendClient,
    token: &'a AccessToken,
    order: PlaceOrderRequest,
}

impl<'a> CheckoutGateway<'a> {
    #[must_use]
    pub const fn new(
        client: &'a BackendClient,
        token: &'a AccessToken,
        order: PlaceOrderRequest,
    ) -> Self {
        Self {
            client,
            token,
            order,
        }
    }
}

fn gateway_error(err: &BackendError) -> GatewayError {
    match err {
        BackendError::Unauthorized => GatewayError::session_expired(),
        other => {
            if other.is_server_fault() {
                tracing::error!(error = %other, "Checkout call failed");
            }
            GatewayError::new(other.user_message())
        }
    }
}

impl OrderGateway for CheckoutGateway<'_> {
    async fn verify_otp(&self, code: &OtpCode) -> Result<(), GatewayError> {
        self.client
            .verify_order_otp(self.token, code)
            .await
            .map_err(|e| gateway_error(&e))
    }

    async fn place_order(&self) -> Result<OrderId, GatewayError> {
        self.client
            .place_order(self.token, &self.order)
            .await
            .map(|order| order.id)
            .map_err(|e| gateway_error(&e))
    }
}
