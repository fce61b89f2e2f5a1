//! Checkout: cart + shipping form -> submitted order.
//!
//! One-shot conversion with three gates, in order: a single-submission
//! guard (repeated clicks cannot issue two concurrent orders), local
//! validation of the shipping form (no network on a bad form), and a
//! defensive empty-cart check. Only then does the order go to the backend.
//!
//! The payload carries product identity and quantity only - never the
//! prices captured in the cart. Pricing at order time is the backend's
//! trust boundary. On success the cart is cleared and the order id
//! surfaced; on rejection the cart is left untouched so the user can
//! retry.

use std::sync::atomic::{AtomicBool, Ordering};

use rust_decimal::{Decimal, dec};
use thiserror::Error;
use tracing::instrument;

use aura_core::{Email, EmailError, OrderId, OrderStatus, Price};

use crate::api::types::{NewOrder, NewOrderItem};
use crate::api::{ApiError, OrderGateway};
use crate::cart::CartManager;
use crate::store::{KeyValueStore, StoreError};

/// Orders at or above this subtotal ship free.
const FREE_SHIPPING_THRESHOLD: Decimal = dec!(999);
/// Flat shipping fee below the threshold.
const SHIPPING_FEE: Decimal = dec!(99);

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A required shipping field is empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The email field is not a valid address.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The cart has no lines to order.
    #[error("cart is empty")]
    EmptyCart,

    /// Another submission is still in flight.
    #[error("an order submission is already in progress")]
    SubmissionInFlight,

    /// The backend rejected or the transport failed the submission. A
    /// rejection's `detail` message passes through verbatim.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Clearing the cart after a placed order failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// The shipping form as filled in by the user.
#[derive(Debug, Clone, Default)]
pub struct ShippingForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl ShippingForm {
    /// Check that every required field is present and the email is
    /// well-formed. Purely local; never touches the network.
    ///
    /// # Errors
    ///
    /// Returns the first missing field, or an email parse error.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
        ] {
            if value.trim().is_empty() {
                return Err(CheckoutError::MissingField(field));
            }
        }

        Email::parse(self.email.trim())?;
        Ok(())
    }

    /// Render the form as the single shipping-address string the backend
    /// stores with the order.
    #[must_use]
    pub fn format_address(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}, {} - {}",
            self.name.trim(),
            self.phone.trim(),
            self.address.trim(),
            self.city.trim(),
            self.state.trim(),
            self.postal_code.trim()
        )
    }
}

/// Shipping fee for a cart subtotal: free at or above the threshold,
/// otherwise a flat fee. Display-only - the backend prices the order.
#[must_use]
pub fn shipping_fee(subtotal: &Price) -> Price {
    if subtotal.amount >= FREE_SHIPPING_THRESHOLD {
        Price::zero(subtotal.currency_code)
    } else {
        Price::new(SHIPPING_FEE, subtotal.currency_code)
    }
}

/// Subtotal plus shipping fee.
#[must_use]
pub fn order_total(subtotal: &Price) -> Price {
    *subtotal + shipping_fee(subtotal)
}

/// What the UI needs from a placed order.
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub order_id: OrderId,
    pub status: OrderStatus,
    /// Total the backend actually charged.
    pub total_amount: Decimal,
}

/// Owner of the checkout flow.
#[derive(Debug)]
pub struct CheckoutCoordinator<G> {
    gateway: G,
    in_flight: AtomicBool,
}

/// Releases the in-flight flag on every exit path, including a submission
/// future dropped by a caller that stopped waiting.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<G: OrderGateway> CheckoutCoordinator<G> {
    /// Create a coordinator with no submission in flight.
    pub const fn new(gateway: G) -> Self {
        Self {
            gateway,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently outstanding. The UI disables the
    /// place-order action while this is true.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<InFlightGuard<'_>, CheckoutError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CheckoutError::SubmissionInFlight);
        }
        Ok(InFlightGuard(&self.in_flight))
    }

    /// Submit the cart as an order.
    ///
    /// On success the cart is cleared (memory and durable store) and a
    /// [`Confirmation`] returned. On any failure the cart is untouched.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any network call, a verbatim
    /// backend rejection, or a transport error.
    #[instrument(skip(self, token, cart, form), fields(items = cart.lines().len()))]
    pub async fn submit<S: KeyValueStore>(
        &self,
        token: &str,
        cart: &mut CartManager<S>,
        form: &ShippingForm,
    ) -> Result<Confirmation, CheckoutError> {
        let _guard = self.begin()?;

        form.validate()?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order = NewOrder {
            items: cart
                .lines()
                .iter()
                .map(|line| NewOrderItem {
                    product_id: line.product.id,
                    quantity: line.quantity,
                })
                .collect(),
            shipping_address: form.format_address(),
        };

        match self.gateway.create_order(token, &order).await {
            Ok(placed) => {
                cart.clear()?;
                tracing::info!(order_id = %placed.id, "Order placed");
                Ok(Confirmation {
                    order_id: placed.id,
                    status: placed.status,
                    total_amount: placed.total_amount,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Order submission failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::AtomicU32;
    use std::task::{Context, Poll, Waker};

    use chrono::Utc;
    use rust_decimal::dec;

    use aura_core::{CurrencyCode, ProductId, UserId};

    use crate::api::types::Order;
    use crate::cart::ProductRef;
    use crate::store::{MemoryStore, SharedStore, keys};

    /// How the fake backend answers `POST /orders`.
    #[derive(Clone, Copy)]
    enum OrderBehavior {
        Accept,
        RejectStock,
        Hang,
    }

    struct FakeGateway {
        behavior: OrderBehavior,
        calls: AtomicU32,
    }

    impl FakeGateway {
        const fn new(behavior: OrderBehavior) -> Self {
            Self {
                behavior,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl OrderGateway for &FakeGateway {
        async fn create_order(&self, _token: &str, order: &NewOrder) -> Result<Order, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                OrderBehavior::Accept => Ok(Order {
                    id: OrderId::new(42),
                    user_id: UserId::new(1),
                    total_amount: dec!(1500),
                    status: OrderStatus::Pending,
                    shipping_address: Some(order.shipping_address.clone()),
                    created_at: Utc::now(),
                    items: Vec::new(),
                }),
                OrderBehavior::RejectStock => Err(ApiError::Rejected(
                    "Insufficient stock for product 'Classic Tee'. Available: 1".to_string(),
                )),
                OrderBehavior::Hang => std::future::pending().await,
            }
        }
    }

    fn filled_form() -> ShippingForm {
        ShippingForm {
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            address: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            postal_code: "560001".to_string(),
        }
    }

    fn tee(id: i32) -> ProductRef {
        ProductRef {
            id: ProductId::new(id),
            name: format!("T-shirt#{id}"),
            price: Price::new(dec!(500), CurrencyCode::INR),
            size: "M".to_string(),
            color: "black".to_string(),
            image_url: None,
        }
    }

    fn cart_with_items() -> CartManager<SharedStore<MemoryStore>> {
        let mut cart = CartManager::load(SharedStore::new(MemoryStore::new())).unwrap();
        cart.add_item(tee(1), 2).unwrap();
        cart.add_item(tee(2), 1).unwrap();
        cart
    }

    fn poll_once<F: Future>(fut: Pin<&mut F>) -> Poll<F::Output> {
        let mut cx = Context::from_waker(Waker::noop());
        fut.poll(&mut cx)
    }

    // =========================================================================
    // Form validation
    // =========================================================================

    #[test]
    fn test_validate_reports_first_missing_field() {
        let mut form = filled_form();
        form.phone = "  ".to_string();

        let err = form.validate().unwrap_err();
        assert!(matches!(err, CheckoutError::MissingField("phone")));
    }

    #[test]
    fn test_validate_rejects_malformed_email() {
        let mut form = filled_form();
        form.email = "not-an-email".to_string();

        let err = form.validate().unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidEmail(_)));
    }

    #[test]
    fn test_format_address() {
        assert_eq!(
            filled_form().format_address(),
            "Asha Rao\n9876543210\n12 MG Road\nBengaluru, Karnataka - 560001"
        );
    }

    // =========================================================================
    // Shipping fee
    // =========================================================================

    #[test]
    fn test_shipping_fee_below_threshold() {
        let subtotal = Price::new(dec!(998), CurrencyCode::INR);
        assert_eq!(shipping_fee(&subtotal).amount, dec!(99));
        assert_eq!(order_total(&subtotal).amount, dec!(1097));
    }

    #[test]
    fn test_shipping_free_at_threshold() {
        let subtotal = Price::new(dec!(999), CurrencyCode::INR);
        assert_eq!(shipping_fee(&subtotal).amount, Decimal::ZERO);
        assert_eq!(order_total(&subtotal).amount, dec!(999));
    }

    // =========================================================================
    // Submission
    // =========================================================================

    #[tokio::test]
    async fn test_empty_cart_rejected_before_any_network_call() {
        let gateway = FakeGateway::new(OrderBehavior::Accept);
        let coordinator = CheckoutCoordinator::new(&gateway);
        let mut cart = CartManager::load(MemoryStore::new()).unwrap();

        let err = coordinator
            .submit("tok", &mut cart, &filled_form())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_form_rejected_before_any_network_call() {
        let gateway = FakeGateway::new(OrderBehavior::Accept);
        let coordinator = CheckoutCoordinator::new(&gateway);
        let mut cart = cart_with_items();
        let mut form = filled_form();
        form.city = String::new();

        let err = coordinator.submit("tok", &mut cart, &form).await.unwrap_err();

        assert!(matches!(err, CheckoutError::MissingField("city")));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        // The guard was released by the early return
        assert!(!coordinator.in_flight());
    }

    #[tokio::test]
    async fn test_successful_submit_clears_cart_and_surfaces_order_id() {
        let gateway = FakeGateway::new(OrderBehavior::Accept);
        let coordinator = CheckoutCoordinator::new(&gateway);
        let mut cart = cart_with_items();

        let confirmation = coordinator
            .submit("tok", &mut cart, &filled_form())
            .await
            .unwrap();

        assert_eq!(confirmation.order_id, OrderId::new(42));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert!(cart.is_empty());
        assert!(!coordinator.in_flight());
    }

    #[tokio::test]
    async fn test_successful_submit_erases_persisted_cart() {
        let gateway = FakeGateway::new(OrderBehavior::Accept);
        let coordinator = CheckoutCoordinator::new(&gateway);

        let store = SharedStore::new(MemoryStore::new());
        let mut cart = CartManager::load(store.clone()).unwrap();
        cart.add_item(tee(1), 1).unwrap();
        assert!(store.get(keys::CART_LINES).unwrap().is_some());

        coordinator
            .submit("tok", &mut cart, &filled_form())
            .await
            .unwrap();

        assert!(store.get(keys::CART_LINES).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejection_preserves_cart_and_message() {
        let gateway = FakeGateway::new(OrderBehavior::RejectStock);
        let coordinator = CheckoutCoordinator::new(&gateway);
        let mut cart = cart_with_items();
        let lines_before = cart.lines().to_vec();

        let err = coordinator
            .submit("tok", &mut cart, &filled_form())
            .await
            .unwrap_err();

        // The backend's detail message passes through verbatim
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 'Classic Tee'. Available: 1"
        );
        assert_eq!(cart.lines(), lines_before.as_slice());
        assert!(!coordinator.in_flight());
    }

    #[test]
    fn test_second_submit_rejected_while_first_in_flight() {
        let gateway = FakeGateway::new(OrderBehavior::Hang);
        let coordinator = CheckoutCoordinator::new(&gateway);
        let mut cart_a = cart_with_items();
        let mut cart_b = cart_with_items();
        let form = filled_form();

        let mut first = Box::pin(coordinator.submit("tok", &mut cart_a, &form));
        assert!(poll_once(first.as_mut()).is_pending());
        assert!(coordinator.in_flight());

        let mut second = Box::pin(coordinator.submit("tok", &mut cart_b, &form));
        match poll_once(second.as_mut()) {
            Poll::Ready(Err(CheckoutError::SubmissionInFlight)) => {}
            other => panic!("expected SubmissionInFlight, got {other:?}"),
        }
        drop(second);

        // Dropping the hung submission releases the guard
        drop(first);
        assert!(!coordinator.in_flight());
    }
}
