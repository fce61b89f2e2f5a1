//! Wire types for the catalog API.
//!
//! These structs mirror the backend's JSON schemas exactly; domain-side
//! shapes (cart lines, price snapshots) are built from them at the point of
//! use. Prices travel as bare JSON numbers, hence the `serde::float`
//! annotations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use aura_core::{OrderId, OrderItemId, OrderStatus, ProductId, Role, UserId};

// =============================================================================
// Auth
// =============================================================================

/// Profile of an authenticated user, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub name: String,
    /// Avatar URL from the identity provider, if any.
    pub picture: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A granted session: bearer token plus the profile it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionGrant {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
}

/// Request body for the provider login exchange.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderLoginRequest {
    /// The identity provider's ID token, passed through opaquely.
    pub token: String,
}

/// Request body for the developer login shortcut.
#[derive(Debug, Clone, Serialize)]
pub struct DevLoginRequest {
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl Default for DevLoginRequest {
    fn default() -> Self {
        Self {
            name: "Dev User".to_string(),
            email: "dev@aurafashions.com".to_string(),
            is_admin: false,
        }
    }
}

/// Response of the dev-mode check.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DevModeStatus {
    pub dev_mode: bool,
}

// =============================================================================
// Products
// =============================================================================

/// A catalog product. Each entry is a single size/color variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
    pub color: String,
    pub size: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Sizes available across sibling variants (grouped listings only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_sizes: Option<Vec<String>>,
    /// Colors available across sibling variants (grouped listings only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_colors: Option<Vec<String>>,
}

/// Query parameters for the product listing endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ProductQuery {
    /// Whether this query selects the unfiltered default listing.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.category.is_none()
            && self.color.is_none()
            && self.size.is_none()
            && self.grouped.is_none()
            && self.skip.is_none()
            && self.limit.is_none()
    }
}

// =============================================================================
// Orders
// =============================================================================

/// One line of an order submission: product identity and quantity only.
/// Prices are never sent; the backend prices the order from its own catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// An order submission.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub items: Vec<NewOrderItem>,
    pub shipping_address: String,
}

/// A line of a placed order, as returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price the backend charged at order time.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub product: Product,
}

/// A placed order.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_product_deserializes_float_price() {
        let json = r#"{
            "id": 1,
            "name": "Classic Tee",
            "description": null,
            "price": 499.0,
            "stock": 12,
            "category": "t-shirt",
            "color": "black",
            "size": "M",
            "image_url": null,
            "created_at": "2026-01-15T10:00:00Z"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.price, dec!(499));
        assert!(product.available_sizes.is_none());
    }

    #[test]
    fn test_session_grant_roundtrip() {
        let json = r#"{
            "access_token": "abc123",
            "token_type": "bearer",
            "user": {
                "id": 7,
                "email": "dev@aurafashions.com",
                "name": "Dev User",
                "picture": null,
                "role": "admin",
                "created_at": "2026-01-15T10:00:00Z"
            }
        }"#;
        let grant: SessionGrant = serde_json::from_str(json).unwrap();
        assert_eq!(grant.access_token, "abc123");
        assert!(grant.user.role.is_admin());
    }

    #[test]
    fn test_new_order_serializes_identity_only() {
        let order = NewOrder {
            items: vec![NewOrderItem {
                product_id: ProductId::new(3),
                quantity: 2,
            }],
            shipping_address: "A\nB".to_string(),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["items"][0]["product_id"], 3);
        assert_eq!(json["items"][0]["quantity"], 2);
        assert!(json["items"][0].get("price").is_none());
    }

    #[test]
    fn test_default_query_is_default() {
        assert!(ProductQuery::default().is_default());
        let query = ProductQuery {
            category: Some("hoodie".to_string()),
            ..ProductQuery::default()
        };
        assert!(!query.is_default());
    }
}
