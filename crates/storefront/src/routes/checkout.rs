//! Checkout route handlers.
//!
//! Checkout is confirmed with a one-time code sent by the backend. The
//! chosen address, payment method and the code window live in the session;
//! the verify-then-place sequence is driven by [`OtpCheckout::submit`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::checkout::{
    CheckoutError, CheckoutPhase, OTP_LENGTH, OtpCheckout, format_mmss,
};
use shopfront_core::{AddressId, OrderId, PaymentMethod};

use crate::backend::{BackendError, CheckoutGateway, PlaceOrderRequest};
use crate::error::AppError;
use crate::filters;
use crate::flash;
use crate::middleware::RequireAuth;
use crate::models::{CheckoutSession, session_keys};
use crate::page::PageContext;
use crate::routes::cart::CartView;
use crate::routes::{fail, reject, session_expired};
use crate::state::AppState;

// =============================================================================
// Session helpers
// =============================================================================

async fn load_checkout(session: &Session) -> Option<CheckoutSession> {
    session
        .get::<CheckoutSession>(session_keys::CHECKOUT)
        .await
        .ok()
        .flatten()
}

async fn save_checkout(
    session: &Session,
    checkout: &CheckoutSession,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CHECKOUT, checkout).await
}

/// A code issued less than a minute ago is still the one to use.
///
/// Re-posting the checkout form inside that minute changes the delivery
/// details but must not issue a new code ahead of the resend lock.
fn code_still_fresh(otp: &OtpCheckout, now: DateTime<Utc>) -> bool {
    *otp.phase() == CheckoutPhase::EnterOtp && otp.resend_available_in(now) > 0
}

fn confirmation_url(order_id: &OrderId) -> String {
    format!(
        "/orders/{}/confirmation",
        urlencoding::encode(order_id.as_str())
    )
}

// =============================================================================
// View types
// =============================================================================

/// Address choice on the checkout page.
#[derive(Clone)]
pub struct AddressOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

/// Payment method choice on the checkout page.
#[derive(Clone)]
pub struct PaymentOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Countdown state rendered into the verify page.
///
/// The browser timer starts from these values; the server re-checks the
/// window on every submission.
#[derive(Clone)]
pub struct CountdownView {
    pub remaining_secs: i64,
    pub remaining_label: String,
    pub expired: bool,
    pub can_resend: bool,
    pub resend_in_secs: i64,
}

impl CountdownView {
    fn new(otp: &OtpCheckout, now: DateTime<Utc>) -> Self {
        let countdown = otp.countdown(now);
        Self {
            remaining_secs: countdown.remaining_secs,
            remaining_label: format_mmss(countdown.remaining_secs),
            expired: countdown.expired,
            can_resend: countdown.can_resend,
            resend_in_secs: countdown.resend_in_secs,
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub addresses: Vec<AddressOption>,
    pub payment_methods: Vec<PaymentOption>,
}

/// OTP entry page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/verify.html")]
pub struct VerifyTemplate {
    pub page: PageContext,
    pub countdown: CountdownView,
    pub otp_length: usize,
    pub payment_label: &'static str,
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout page: address and payment method.
#[instrument(skip(state, page, session, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    mut page: PageContext,
    session: Session,
) -> Result<Response, AppError> {
    let backend = state.backend();
    let (cart, addresses) = tokio::join!(
        backend.get_cart(&user.token),
        backend.list_addresses(&user.token)
    );

    let cart = match cart {
        Ok(cart) => cart,
        Err(BackendError::Unauthorized) => return Ok(session_expired(&session).await),
        Err(e) => return Err(e.into()),
    };
    if cart.is_empty() {
        page.push_info("Your cart is empty.");
        return Ok(page.redirect("/cart").await);
    }

    let addresses = match addresses {
        Ok(addresses) => addresses,
        Err(BackendError::Unauthorized) => return Ok(session_expired(&session).await),
        Err(e) => return Err(e.into()),
    };
    if addresses.is_empty() {
        page.push_info("Add a delivery address to continue.");
        return Ok(page.redirect("/account/addresses/new").await);
    }

    let previous = load_checkout(&session).await;
    let chosen_address = previous.as_ref().map(|c| c.address_id.clone()).or_else(|| {
        addresses
            .iter()
            .find(|a| a.is_default)
            .or_else(|| addresses.first())
            .map(|a| a.id.clone())
    });
    let chosen_payment = previous.map_or_else(PaymentMethod::default, |c| c.payment_method);

    Ok(CheckoutTemplate {
        cart: CartView::new(&cart, &state),
        addresses: addresses
            .iter()
            .map(|a| AddressOption {
                id: a.id.to_string(),
                label: format!("{}, {}", a.full_name, a.one_line()),
                selected: chosen_address.as_ref() == Some(&a.id),
            })
            .collect(),
        payment_methods: PaymentMethod::ALL
            .iter()
            .map(|m| PaymentOption {
                value: m.as_str(),
                label: m.label(),
                selected: *m == chosen_payment,
            })
            .collect(),
        page,
    }
    .into_response())
}

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub address_id: Option<String>,
    pub payment_method: Option<String>,
}

/// Start checkout: have the backend send a code and open the window.
#[instrument(skip(state, session, user, form))]
pub async fn start(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    let Some(address_id) = form
        .address_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(AddressId::new)
    else {
        return Ok(reject(&session, "Please choose a delivery address.", "/checkout").await);
    };
    let Some(payment_method) = form
        .payment_method
        .as_deref()
        .and_then(|m| m.parse::<PaymentMethod>().ok())
    else {
        return Ok(reject(&session, "Please choose a payment method.", "/checkout").await);
    };

    match state.backend().get_cart(&user.token).await {
        Ok(cart) if cart.is_empty() => {
            return Ok(reject(&session, "Your cart is empty.", "/cart").await);
        }
        Ok(_) => {}
        Err(e) => return Ok(fail(&session, &e, "/checkout").await),
    }

    let now = state.now();
    if let Some(mut current) = load_checkout(&session).await
        && code_still_fresh(&current.otp, now)
    {
        current.address_id = address_id;
        current.payment_method = payment_method;
        save_checkout(&session, &current).await?;
        flash::info(
            &session,
            "Delivery details updated. Enter the code we already sent.",
        )
        .await;
        return Ok(Redirect::to("/checkout/verify").into_response());
    }

    if let Err(e) = state.backend().generate_order_otp(&user.token).await {
        return Ok(fail(&session, &e, "/checkout").await);
    }

    let checkout = CheckoutSession {
        address_id,
        payment_method,
        otp: OtpCheckout::start(now),
    };
    save_checkout(&session, &checkout).await?;
    crate::error::add_breadcrumb("checkout", "Checkout code issued", None);

    flash::info(
        &session,
        format!("We sent a {OTP_LENGTH}-digit code to confirm your order."),
    )
    .await;
    Ok(Redirect::to("/checkout/verify").into_response())
}

/// Display the code entry page with its countdown.
#[instrument(skip(state, page, session, _user))]
pub async fn verify_page(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    mut page: PageContext,
    session: Session,
) -> Response {
    let Some(checkout) = load_checkout(&session).await else {
        return page.redirect("/checkout").await;
    };
    if let CheckoutPhase::Confirmed(order_id) = checkout.otp.phase() {
        return page.redirect(&confirmation_url(order_id)).await;
    }

    let countdown = CountdownView::new(&checkout.otp, state.now());
    if countdown.expired {
        page.push_info("Your code has expired. Request a new one to continue.");
    }

    VerifyTemplate {
        countdown,
        otp_length: OTP_LENGTH,
        payment_label: checkout.payment_method.label(),
        error: checkout.otp.last_error().map(String::from),
        page,
    }
    .into_response()
}

/// Code entry form data.
#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    #[serde(default)]
    pub otp: String,
}

/// Verify the code and, only once it is accepted, place the order.
#[instrument(skip(state, session, user, form))]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<VerifyForm>,
) -> Result<Response, AppError> {
    let Some(mut checkout) = load_checkout(&session).await else {
        let message = "Your checkout has expired. Please start again.";
        return Ok(reject(&session, message, "/checkout").await);
    };

    let gateway = CheckoutGateway::new(
        state.backend(),
        &user.token,
        PlaceOrderRequest {
            address_id: checkout.address_id.clone(),
            payment_method: checkout.payment_method,
        },
    );

    match checkout.otp.submit(&form.otp, state.now(), &gateway).await {
        Ok(order_id) => {
            // The order exists now; a stale checkout entry only costs a redirect later.
            if let Err(e) = session
                .remove::<CheckoutSession>(session_keys::CHECKOUT)
                .await
            {
                tracing::error!(error = %e, order_id = %order_id, "Failed to clear checkout session");
            }
            tracing::info!(order_id = %order_id, "Order placed");
            crate::error::add_breadcrumb(
                "checkout",
                "Order placed",
                Some(&[("order_id", order_id.as_str())]),
            );
            flash::success(&session, "Your order has been placed!").await;
            Ok(Redirect::to(&confirmation_url(&order_id)).into_response())
        }
        Err(CheckoutError::SessionExpired) => Ok(session_expired(&session).await),
        Err(CheckoutError::AlreadyConfirmed) => match checkout.otp.phase() {
            CheckoutPhase::Confirmed(order_id) => {
                Ok(Redirect::to(&confirmation_url(order_id)).into_response())
            }
            _ => Ok(Redirect::to("/account/orders").into_response()),
        },
        Err(e) => {
            tracing::debug!(error = %e, "Checkout submission refused");
            save_checkout(&session, &checkout).await?;
            Ok(reject(&session, &e.to_string(), "/checkout/verify").await)
        }
    }
}

/// Issue a fresh code and restart the window.
#[instrument(skip(state, session, user))]
pub async fn resend(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Response, AppError> {
    let Some(mut checkout) = load_checkout(&session).await else {
        return Ok(Redirect::to("/checkout").into_response());
    };

    if let Err(e) = checkout.otp.ensure_can_resend(state.now()) {
        return Ok(reject(&session, &e.to_string(), "/checkout/verify").await);
    }

    if let Err(e) = state.backend().generate_order_otp(&user.token).await {
        return Ok(fail(&session, &e, "/checkout/verify").await);
    }

    checkout.otp.restart(state.now());
    save_checkout(&session, &checkout).await?;

    flash::info(&session, "A new code has been sent.").await;
    Ok(Redirect::to("/checkout/verify").into_response())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_countdown_view_for_fresh_window() {
        let now = Utc::now();
        let view = CountdownView::new(&OtpCheckout::start(now), now);
        assert!(!view.expired);
        assert!(!view.can_resend);
        assert!(view.remaining_secs > 590);
        assert!(view.remaining_label.starts_with("09:") || view.remaining_label == "10:00");
    }

    #[test]
    fn test_countdown_view_for_closed_window() {
        let now = Utc::now();
        let view = CountdownView::new(&OtpCheckout::start(now - Duration::seconds(700)), now);
        assert!(view.expired);
        assert!(view.can_resend);
        assert_eq!(view.remaining_label, "00:00");
    }

    #[test]
    fn test_code_stays_fresh_until_resend_unlocks() {
        let issued = Utc::now();
        let otp = OtpCheckout::start(issued);
        assert!(code_still_fresh(&otp, issued + Duration::seconds(5)));
        assert!(!code_still_fresh(&otp, issued + Duration::seconds(60)));
        assert!(!code_still_fresh(&otp, issued + Duration::seconds(700)));
    }

    #[test]
    fn test_confirmation_url_escapes_id() {
        assert_eq!(
            confirmation_url(&OrderId::new("o/1")),
            "/orders/o%2F1/confirmation"
        );
    }
}
