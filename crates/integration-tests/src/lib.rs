//! Integration test support for the Aura storefront client.
//!
//! Provides [`FakeBackend`], an in-process stand-in for the catalog API
//! that implements the client's gateway traits. The suite in `tests/`
//! drives the real state containers (session, cart, checkout) against it,
//! so the full flows run hermetically - no server, no network.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use rust_decimal::{Decimal, dec};

use aura_client::api::types::{
    DevLoginRequest, NewOrder, Order, Product, ProviderLoginRequest, SessionGrant, UserProfile,
};
use aura_client::api::{ApiError, AuthGateway, OrderGateway};
use aura_core::{OrderId, OrderItemId, OrderStatus, ProductId, Role, UserId};

/// In-process catalog backend.
///
/// Tokens minted by its logins are remembered and honored until revoked;
/// orders are priced from its own catalog, never from what the client
/// thinks prices are.
pub struct FakeBackend {
    dev_mode: bool,
    catalog: Vec<Product>,
    valid_tokens: Mutex<HashSet<String>>,
    orders: Mutex<Vec<Order>>,
    next_token: AtomicU32,
    /// Set to make the next order submissions fail with this message.
    rejection: Mutex<Option<String>>,
    /// How many order submissions reached the backend.
    pub order_calls: AtomicU32,
}

impl FakeBackend {
    /// A backend with dev mode on and a small apparel catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dev_mode: true,
            catalog: vec![
                product(1, "Classic Tee", dec!(499), "t-shirt", "M", "black"),
                product(2, "Classic Tee", dec!(499), "t-shirt", "L", "black"),
                product(3, "Zip Hoodie", dec!(1299), "hoodie", "M", "grey"),
            ],
            valid_tokens: Mutex::new(HashSet::new()),
            orders: Mutex::new(Vec::new()),
            next_token: AtomicU32::new(1),
            rejection: Mutex::new(None),
            order_calls: AtomicU32::new(0),
        }
    }

    /// Same backend with the development flag off.
    #[must_use]
    pub fn with_dev_mode_off() -> Self {
        Self {
            dev_mode: false,
            ..Self::new()
        }
    }

    /// Look up a catalog product.
    #[must_use]
    pub fn product(&self, id: i32) -> &Product {
        self.catalog
            .iter()
            .find(|p| p.id == ProductId::new(id))
            .expect("unknown catalog product in test")
    }

    /// Invalidate every outstanding token, as an expiry sweep would.
    pub fn revoke_all_tokens(&self) {
        self.lock(&self.valid_tokens).clear();
    }

    /// Make order submissions fail with a business rejection.
    pub fn reject_orders_with(&self, detail: &str) {
        *self.lock(&self.rejection) = Some(detail.to_string());
    }

    /// Orders the backend has accepted.
    #[must_use]
    pub fn placed_orders(&self) -> Vec<Order> {
        self.lock(&self.orders).clone()
    }

    fn mint_grant(&self, name: &str, email: &str, role: Role) -> SessionGrant {
        let token = format!("tok-{}", self.next_token.fetch_add(1, Ordering::SeqCst));
        self.lock(&self.valid_tokens).insert(token.clone());

        SessionGrant {
            access_token: token,
            token_type: "bearer".to_string(),
            user: UserProfile {
                id: UserId::new(1),
                email: email.to_string(),
                name: name.to_string(),
                picture: None,
                role,
                created_at: Utc::now(),
            },
        }
    }

    fn check_token(&self, token: &str) -> Result<(), ApiError> {
        if self.lock(&self.valid_tokens).contains(token) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized("Could not validate credentials".to_string()))
        }
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthGateway for &FakeBackend {
    async fn dev_mode(&self) -> Result<bool, ApiError> {
        Ok(self.dev_mode)
    }

    async fn login_with_provider(
        &self,
        _request: &ProviderLoginRequest,
    ) -> Result<SessionGrant, ApiError> {
        Ok(self.mint_grant("Provider User", "user@example.com", Role::User))
    }

    async fn login_as_developer(
        &self,
        request: &DevLoginRequest,
    ) -> Result<SessionGrant, ApiError> {
        if !self.dev_mode {
            return Err(ApiError::Rejected(
                "Dev login is only available in development mode".to_string(),
            ));
        }
        let role = if request.is_admin { Role::Admin } else { Role::User };
        Ok(self.mint_grant(&request.name, &request.email, role))
    }

    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.check_token(token)?;
        Ok(UserProfile {
            id: UserId::new(1),
            email: "user@example.com".to_string(),
            name: "Provider User".to_string(),
            picture: None,
            role: Role::User,
            created_at: Utc::now(),
        })
    }
}

impl OrderGateway for &FakeBackend {
    async fn create_order(&self, token: &str, order: &NewOrder) -> Result<Order, ApiError> {
        self.order_calls.fetch_add(1, Ordering::SeqCst);
        self.check_token(token)?;

        if let Some(detail) = self.lock(&self.rejection).clone() {
            return Err(ApiError::Rejected(detail));
        }

        if order.items.is_empty() {
            return Err(ApiError::Rejected(
                "Order must have at least one item".to_string(),
            ));
        }

        // Price the order from the backend's own catalog
        let mut total = Decimal::ZERO;
        let mut items = Vec::new();
        for (index, line) in order.items.iter().enumerate() {
            let product = self
                .catalog
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Product with ID {} not found", line.product_id))
                })?;

            total += product.price * Decimal::from(line.quantity);
            items.push(aura_client::api::types::OrderItem {
                id: OrderItemId::new(i32::try_from(index).unwrap_or(0) + 1),
                product_id: product.id,
                quantity: line.quantity,
                price: product.price,
                product: product.clone(),
            });
        }

        let placed = {
            let mut orders = self.lock(&self.orders);
            let placed = Order {
                id: OrderId::new(i32::try_from(orders.len()).unwrap_or(0) + 1),
                user_id: UserId::new(1),
                total_amount: total,
                status: OrderStatus::Pending,
                shipping_address: Some(order.shipping_address.clone()),
                created_at: Utc::now(),
                items,
            };
            orders.push(placed.clone());
            placed
        };

        Ok(placed)
    }
}

fn product(
    id: i32,
    name: &str,
    price: Decimal,
    category: &str,
    size: &str,
    color: &str,
) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: None,
        price,
        stock: 25,
        category: category.to_string(),
        color: color.to_string(),
        size: size.to_string(),
        image_url: None,
        created_at: Utc::now(),
        available_sizes: None,
        available_colors: None,
    }
}
