//! OTP-confirmed checkout.
//!
//! Placing an order is a two-step exchange with the backend: the customer
//! receives a 6-digit code, submits it for verification, and only after the
//! backend accepts it is the order placed. The whole exchange must finish
//! within a 600 second window; a new code may be requested once 60 seconds
//! of that window have elapsed.
//!
//! ```text
//!            submit(6 digits, window open)
//! EnterOtp ─────────────────────────────────▶ Verifying
//!    ▲                                           │ ok
//!    │ verify failed / place failed              ▼
//!    └──────────────────────────────────── PlacingOrder
//!                                                │ ok
//!                                                ▼
//!                                         Confirmed(order)
//! ```
//!
//! Time is always passed in, so the machine is deterministic under test.
//! The backend calls go through [`OrderGateway`].

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::OrderId;

/// Number of digits in a one-time code.
pub const OTP_LENGTH: usize = 6;

/// Seconds a code stays valid.
pub const OTP_WINDOW_SECS: i64 = 600;

/// Seconds that must elapse before another code can be requested.
pub const RESEND_AFTER_SECS: i64 = 60;

/// Why a checkout step was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Please enter the {OTP_LENGTH}-digit code")]
    InvalidCode,

    #[error("The code has expired. Please request a new one")]
    Expired,

    #[error("You can request a new code in {wait_secs} seconds")]
    ResendTooSoon { wait_secs: i64 },

    #[error("Your order is already being processed")]
    InProgress,

    #[error("This order has already been placed")]
    AlreadyConfirmed,

    /// The backend no longer accepts the customer's login.
    #[error("Your session has expired. Please log in again")]
    SessionExpired,

    /// The backend rejected the code.
    #[error("{0}")]
    Verification(String),

    /// The code was accepted but the order could not be placed.
    #[error("{0}")]
    Placement(String),
}

/// A syntactically valid one-time code: exactly six ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OtpCode(String);

impl OtpCode {
    /// Parse user input.
    ///
    /// No trimming or normalization is done; `" 123456"` is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidCode`] unless the input is exactly six
    /// ASCII digits.
    pub fn parse(input: &str) -> Result<Self, CheckoutError> {
        if input.len() == OTP_LENGTH && input.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(input.to_owned()))
        } else {
            Err(CheckoutError::InvalidCode)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Failure reported by an [`OrderGateway`], already phrased for the customer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GatewayError {
    pub message: String,
    /// The backend rejected the customer's credentials.
    pub session_expired: bool,
}

impl GatewayError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_expired: false,
        }
    }

    #[must_use]
    pub fn session_expired() -> Self {
        Self {
            message: CheckoutError::SessionExpired.to_string(),
            session_expired: true,
        }
    }

    fn into_checkout_error(self, wrap: fn(String) -> CheckoutError) -> CheckoutError {
        if self.session_expired {
            CheckoutError::SessionExpired
        } else {
            wrap(self.message)
        }
    }
}

/// The two backend calls that finish a checkout.
///
/// Implementations carry whatever the calls need (auth token, chosen
/// address, payment method).
pub trait OrderGateway {
    /// Ask the backend to verify the code.
    fn verify_otp(&self, code: &OtpCode) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Place the order. Only called after a successful verification.
    fn place_order(&self) -> impl Future<Output = Result<OrderId, GatewayError>> + Send;
}

/// Where a checkout currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "order_id", rename_all = "snake_case")]
pub enum CheckoutPhase {
    EnterOtp,
    Verifying,
    PlacingOrder,
    Confirmed(OrderId),
}

/// Countdown figures for rendering the OTP page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub remaining_secs: i64,
    pub expired: bool,
    pub can_resend: bool,
    pub resend_in_secs: i64,
}

/// State of one OTP checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpCheckout {
    issued_at: DateTime<Utc>,
    phase: CheckoutPhase,
    last_error: Option<String>,
}

impl OtpCheckout {
    /// Start a checkout for a code the backend issued at `now`.
    #[must_use]
    pub const fn start(now: DateTime<Utc>) -> Self {
        Self {
            issued_at: now,
            phase: CheckoutPhase::EnterOtp,
            last_error: None,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> &CheckoutPhase {
        &self.phase
    }

    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Message from the most recent failed step, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.issued_at).num_seconds().max(0)
    }

    /// Seconds left in the window, never negative.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (OTP_WINDOW_SECS - self.elapsed_secs(now)).max(0)
    }

    /// The window has run out.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_secs(now) == 0
    }

    /// Seconds until a new code may be requested.
    #[must_use]
    pub fn resend_available_in(&self, now: DateTime<Utc>) -> i64 {
        (RESEND_AFTER_SECS - self.elapsed_secs(now)).max(0)
    }

    /// A new code may be requested.
    #[must_use]
    pub fn can_resend(&self, now: DateTime<Utc>) -> bool {
        self.phase == CheckoutPhase::EnterOtp && self.resend_available_in(now) == 0
    }

    /// Figures for the OTP page.
    #[must_use]
    pub fn countdown(&self, now: DateTime<Utc>) -> Countdown {
        Countdown {
            remaining_secs: self.remaining_secs(now),
            expired: self.is_expired(now),
            can_resend: self.can_resend(now),
            resend_in_secs: self.resend_available_in(now),
        }
    }

    /// Check that a resend is allowed right now.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::ResendTooSoon`] inside the first 60 seconds,
    /// or a phase error while a submission is underway or done.
    pub fn ensure_can_resend(&self, now: DateTime<Utc>) -> Result<(), CheckoutError> {
        self.ensure_editable()?;
        let wait_secs = self.resend_available_in(now);
        if wait_secs > 0 {
            return Err(CheckoutError::ResendTooSoon { wait_secs });
        }
        Ok(())
    }

    /// A new code was issued at `now`: reset the window and clear errors.
    pub fn restart(&mut self, now: DateTime<Utc>) {
        self.issued_at = now;
        self.phase = CheckoutPhase::EnterOtp;
        self.last_error = None;
    }

    const fn ensure_editable(&self) -> Result<(), CheckoutError> {
        match self.phase {
            CheckoutPhase::EnterOtp => Ok(()),
            CheckoutPhase::Verifying | CheckoutPhase::PlacingOrder => {
                Err(CheckoutError::InProgress)
            }
            CheckoutPhase::Confirmed(_) => Err(CheckoutError::AlreadyConfirmed),
        }
    }

    /// Accept a submission and move to `Verifying`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Expired`] once the window has closed,
    /// [`CheckoutError::InvalidCode`] unless the input is six digits, or a
    /// phase error when not waiting for input. State is unchanged on error
    /// apart from the recorded message.
    pub fn begin_verification(
        &mut self,
        input: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpCode, CheckoutError> {
        self.ensure_editable()?;
        if self.is_expired(now) {
            self.last_error = Some(CheckoutError::Expired.to_string());
            return Err(CheckoutError::Expired);
        }
        let code = OtpCode::parse(input)?;
        self.phase = CheckoutPhase::Verifying;
        self.last_error = None;
        Ok(code)
    }

    /// The backend accepted the code.
    pub fn verification_succeeded(&mut self) {
        if self.phase == CheckoutPhase::Verifying {
            self.phase = CheckoutPhase::PlacingOrder;
        }
    }

    /// The backend rejected the code; back to input, window still running.
    pub fn verification_failed(&mut self, message: impl Into<String>) {
        self.phase = CheckoutPhase::EnterOtp;
        self.last_error = Some(message.into());
    }

    /// The order exists.
    pub fn order_placed(&mut self, order_id: OrderId) {
        self.phase = CheckoutPhase::Confirmed(order_id);
        self.last_error = None;
    }

    /// Placement failed after a good code; back to input.
    pub fn order_failed(&mut self, message: impl Into<String>) {
        self.phase = CheckoutPhase::EnterOtp;
        self.last_error = Some(message.into());
    }

    /// Verify `input` and, only if that succeeds, place the order.
    ///
    /// # Errors
    ///
    /// Returns the first refusal: local validation, then verification, then
    /// placement. A failed verification never reaches `place_order`.
    pub async fn submit<G>(
        &mut self,
        input: &str,
        now: DateTime<Utc>,
        gateway: &G,
    ) -> Result<OrderId, CheckoutError>
    where
        G: OrderGateway + Sync,
    {
        let code = self.begin_verification(input, now)?;

        if let Err(e) = gateway.verify_otp(&code).await {
            self.verification_failed(e.message.clone());
            return Err(e.into_checkout_error(CheckoutError::Verification));
        }
        self.verification_succeeded();

        match gateway.place_order().await {
            Ok(order_id) => {
                self.order_placed(order_id.clone());
                Ok(order_id)
            }
            Err(e) => {
                self.order_failed(e.message.clone());
                Err(e.into_checkout_error(CheckoutError::Placement))
            }
        }
    }
}

/// `mm:ss` rendering of a second count.
#[must_use]
pub fn format_mmss(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use chrono::{Duration, TimeZone};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(secs)
    }

    /// Records every backend call in order.
    struct FakeGateway {
        verify: Result<(), GatewayError>,
        place: Result<OrderId, GatewayError>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeGateway {
        fn new(verify: Result<(), GatewayError>, place: Result<OrderId, GatewayError>) -> Self {
            Self {
                verify,
                place,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl OrderGateway for FakeGateway {
        async fn verify_otp(&self, _code: &OtpCode) -> Result<(), GatewayError> {
            self.calls.lock().unwrap().push("verify");
            self.verify.clone()
        }

        async fn place_order(&self) -> Result<OrderId, GatewayError> {
            self.calls.lock().unwrap().push("place");
            self.place.clone()
        }
    }

    #[test]
    fn test_otp_code_requires_exactly_six_digits() {
        assert!(OtpCode::parse("123456").is_ok());
        for bad in ["", "12345", "1234567", "12a456", " 123456", "123 456", "１２３４５６"] {
            assert_eq!(OtpCode::parse(bad), Err(CheckoutError::InvalidCode), "{bad:?}");
        }
    }

    #[test]
    fn test_countdown_runs_down_to_zero_and_expires() {
        let checkout = OtpCheckout::start(t0());
        assert_eq!(checkout.remaining_secs(t0()), 600);
        assert_eq!(checkout.remaining_secs(at(599)), 1);
        assert!(!checkout.is_expired(at(599)));
        assert_eq!(checkout.remaining_secs(at(600)), 0);
        assert!(checkout.is_expired(at(600)));
        assert_eq!(checkout.remaining_secs(at(10_000)), 0);
    }

    #[test]
    fn test_clock_before_issue_counts_as_zero_elapsed() {
        let checkout = OtpCheckout::start(t0());
        assert_eq!(checkout.remaining_secs(at(-30)), 600);
    }

    #[test]
    fn test_submission_rejected_after_expiry_even_with_valid_code() {
        let mut checkout = OtpCheckout::start(t0());
        let err = checkout.begin_verification("123456", at(600)).unwrap_err();
        assert_eq!(err, CheckoutError::Expired);
        assert_eq!(checkout.phase(), &CheckoutPhase::EnterOtp);
        assert!(checkout.last_error().is_some());
    }

    #[test]
    fn test_submission_rejected_for_bad_code() {
        let mut checkout = OtpCheckout::start(t0());
        assert_eq!(
            checkout.begin_verification("12345", at(5)),
            Err(CheckoutError::InvalidCode)
        );
        assert_eq!(checkout.phase(), &CheckoutPhase::EnterOtp);
    }

    #[test]
    fn test_resend_locked_for_first_minute() {
        let checkout = OtpCheckout::start(t0());
        assert!(!checkout.can_resend(at(59)));
        assert_eq!(
            checkout.ensure_can_resend(at(45)),
            Err(CheckoutError::ResendTooSoon { wait_secs: 15 })
        );
        assert!(checkout.can_resend(at(60)));
        assert!(checkout.ensure_can_resend(at(60)).is_ok());
        assert!(checkout.can_resend(at(900)));
    }

    #[test]
    fn test_restart_resets_window_and_resend_lock() {
        let mut checkout = OtpCheckout::start(t0());
        checkout.verification_failed("Invalid OTP");
        checkout.restart(at(120));

        assert_eq!(checkout.remaining_secs(at(120)), 600);
        assert!(!checkout.can_resend(at(150)));
        assert_eq!(checkout.last_error(), None);
    }

    #[test]
    fn test_countdown_view() {
        let checkout = OtpCheckout::start(t0());
        let view = checkout.countdown(at(30));
        assert_eq!(
            view,
            Countdown {
                remaining_secs: 570,
                expired: false,
                can_resend: false,
                resend_in_secs: 30,
            }
        );
    }

    #[tokio::test]
    async fn test_submit_verifies_then_places() {
        let gateway = FakeGateway::new(Ok(()), Ok(OrderId::new("o-77")));
        let mut checkout = OtpCheckout::start(t0());

        let order_id = checkout.submit("246810", at(20), &gateway).await.unwrap();

        assert_eq!(order_id.as_str(), "o-77");
        assert_eq!(gateway.calls(), vec!["verify", "place"]);
        assert_eq!(
            checkout.phase(),
            &CheckoutPhase::Confirmed(OrderId::new("o-77"))
        );
    }

    #[tokio::test]
    async fn test_failed_verification_never_places_order() {
        let gateway = FakeGateway::new(
            Err(GatewayError::new("Invalid OTP")),
            Ok(OrderId::new("never")),
        );
        let mut checkout = OtpCheckout::start(t0());

        let err = checkout.submit("111111", at(20), &gateway).await.unwrap_err();

        assert_eq!(err, CheckoutError::Verification("Invalid OTP".to_string()));
        assert_eq!(gateway.calls(), vec!["verify"]);
        assert_eq!(checkout.phase(), &CheckoutPhase::EnterOtp);
        assert_eq!(checkout.last_error(), Some("Invalid OTP"));
        // window keeps running from the original issue time
        assert_eq!(checkout.remaining_secs(at(20)), 580);
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_calls() {
        let gateway = FakeGateway::new(Ok(()), Ok(OrderId::new("o")));
        let mut checkout = OtpCheckout::start(t0());

        assert_eq!(
            checkout.submit("12-456", at(1), &gateway).await,
            Err(CheckoutError::InvalidCode)
        );
        assert_eq!(
            checkout.submit("123456", at(601), &gateway).await,
            Err(CheckoutError::Expired)
        );
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_placement_failure_returns_to_input() {
        let gateway = FakeGateway::new(Ok(()), Err(GatewayError::new("Out of stock")));
        let mut checkout = OtpCheckout::start(t0());

        let err = checkout.submit("123456", at(1), &gateway).await.unwrap_err();

        assert_eq!(err, CheckoutError::Placement("Out of stock".to_string()));
        assert_eq!(checkout.phase(), &CheckoutPhase::EnterOtp);
    }

    #[tokio::test]
    async fn test_expired_login_is_reported_separately() {
        let gateway = FakeGateway::new(Err(GatewayError::session_expired()), Ok(OrderId::new("o")));
        let mut checkout = OtpCheckout::start(t0());

        let err = checkout.submit("123456", at(1), &gateway).await.unwrap_err();

        assert_eq!(err, CheckoutError::SessionExpired);
        assert_eq!(gateway.calls(), vec!["verify"]);
    }

    #[tokio::test]
    async fn test_confirmed_checkout_refuses_resubmission() {
        let gateway = FakeGateway::new(Ok(()), Ok(OrderId::new("o-1")));
        let mut checkout = OtpCheckout::start(t0());
        checkout.submit("123456", at(1), &gateway).await.unwrap();

        assert_eq!(
            checkout.submit("123456", at(2), &gateway).await,
            Err(CheckoutError::AlreadyConfirmed)
        );
        assert_eq!(
            checkout.ensure_can_resend(at(100)),
            Err(CheckoutError::AlreadyConfirmed)
        );
    }

    #[test]
    fn test_phase_serializes_for_session_storage() {
        let mut checkout = OtpCheckout::start(t0());
        checkout.order_placed(OrderId::new("o-9"));
        let json = serde_json::to_value(&checkout).unwrap();
        assert_eq!(json["phase"]["phase"], "confirmed");
        assert_eq!(json["phase"]["order_id"], "o-9");

        let back: OtpCheckout = serde_json::from_value(json).unwrap();
        assert_eq!(back, checkout);
    }

    #[test]
    fn test_format_mmss() {
        assert_eq!(format_mmss(600), "10:00");
        assert_eq!(format_mmss(61), "01:01");
        assert_eq!(format_mmss(-4), "00:00");
    }
}
