//! Cart state management.
//!
//! The cart is a unique-keyed collection of lines. Two lines are the same
//! logical entry when they share an identity key - `(product id, size,
//! color)` - and the manager never lets two lines with the same key
//! coexist: adding an existing key merges quantities in place.
//!
//! All operations are synchronous; no network calls happen here. Every
//! mutation persists the new state before returning, so the durable store
//! and memory can never disagree after a crash. Totals are derived on every
//! read, never cached.

use serde::{Deserialize, Serialize};

use aura_core::{CurrencyCode, Price, ProductId};

use crate::api::types::Product;
use crate::store::{KeyValueStore, StoreError, keys};

/// Immutable snapshot of a product at the moment it entered the cart.
///
/// The price is captured here and never re-fetched; live catalog changes do
/// not flow into existing cart lines. The backend reprices at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub size: String,
    pub color: String,
    pub image_url: Option<String>,
}

impl ProductRef {
    /// Snapshot a catalog product, attaching the configured currency to its
    /// bare price.
    #[must_use]
    pub fn snapshot(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: Price::new(product.price, currency),
            size: product.size.clone(),
            color: product.color.clone(),
            image_url: product.image_url.clone(),
        }
    }
}

/// One cart entry: a product snapshot and how many of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: ProductRef,
    pub quantity: u32,
}

impl CartLine {
    /// Whether this line matches the given identity key.
    fn matches(&self, id: ProductId, size: &str, color: &str) -> bool {
        self.product.id == id && self.product.size == size && self.product.color == color
    }

    /// Price of this line: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// Owner of the cart's line collection and derived aggregates.
#[derive(Debug)]
pub struct CartManager<S> {
    store: S,
    lines: Vec<CartLine>,
}

impl<S: KeyValueStore> CartManager<S> {
    /// Hydrate the cart from the durable store.
    ///
    /// A corrupt persisted document is logged and treated as an empty cart;
    /// the next mutation replaces it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store itself cannot be read.
    pub fn load(store: S) -> Result<Self, StoreError> {
        let lines = match store.get_json::<Vec<CartLine>>(keys::CART_LINES) {
            Ok(lines) => lines.unwrap_or_default(),
            Err(StoreError::Serialize(e)) => {
                tracing::warn!(error = %e, "Corrupt cart document, starting empty");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Self { store, lines })
    }

    /// Add a product to the cart.
    ///
    /// If a line with the same identity key exists, its quantity grows by
    /// `quantity`; otherwise a new line is appended, preserving arrival
    /// order. A non-positive quantity is clamped to 1.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the new state fails.
    pub fn add_item(&mut self, product: ProductRef, quantity: u32) -> Result<(), StoreError> {
        let quantity = quantity.max(1);

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.matches(product.id, &product.size, &product.color))
        {
            line.quantity += quantity;
            tracing::debug!(product_id = %product.id, quantity = line.quantity, "Merged cart line");
        } else {
            tracing::debug!(product_id = %product.id, quantity, "Added cart line");
            self.lines.push(CartLine { product, quantity });
        }

        self.persist()
    }

    /// Replace the quantity of the line with the given identity key.
    ///
    /// A quantity of zero or less removes the line, exactly like
    /// [`remove_item`](Self::remove_item). An absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the new state fails.
    pub fn update_quantity(
        &mut self,
        id: ProductId,
        size: &str,
        color: &str,
        quantity: i64,
    ) -> Result<(), StoreError> {
        if quantity <= 0 {
            return self.remove_item(id, size, color);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        match self
            .lines
            .iter_mut()
            .find(|line| line.matches(id, size, color))
        {
            Some(line) if line.quantity != quantity => {
                line.quantity = quantity;
                self.persist()
            }
            _ => Ok(()),
        }
    }

    /// Remove the line with the given identity key. Absent keys are a
    /// no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the new state fails.
    pub fn remove_item(
        &mut self,
        id: ProductId,
        size: &str,
        color: &str,
    ) -> Result<(), StoreError> {
        let before = self.lines.len();
        self.lines.retain(|line| !line.matches(id, size, color));

        if self.lines.len() == before {
            return Ok(());
        }
        self.persist()
    }

    /// Empty the cart and erase its persisted state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.lines.clear();
        self.store.remove(keys::CART_LINES)
    }

    /// The cart lines, in arrival order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of `price × quantity` over all lines, recomputed on every call.
    #[must_use]
    pub fn total(&self) -> Price {
        let currency = self
            .lines
            .first()
            .map_or_else(CurrencyCode::default, |line| line.product.price.currency_code);

        self.lines
            .iter()
            .fold(Price::zero(currency), |sum, line| sum + line.line_total())
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.store.set_json(keys::CART_LINES, &self.lines)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::{Decimal, dec};

    use crate::store::{MemoryStore, SharedStore};

    fn tee(id: i32, size: &str, color: &str, rupees: Decimal) -> ProductRef {
        ProductRef {
            id: ProductId::new(id),
            name: format!("T-shirt#{id}"),
            price: Price::new(rupees, CurrencyCode::INR),
            size: size.to_string(),
            color: color.to_string(),
            image_url: None,
        }
    }

    fn empty_cart() -> CartManager<MemoryStore> {
        CartManager::load(MemoryStore::new()).unwrap()
    }

    #[test]
    fn test_add_same_key_merges() {
        let mut cart = empty_cart();
        cart.add_item(tee(1, "M", "black", dec!(500)), 2).unwrap();
        cart.add_item(tee(1, "M", "black", dec!(500)), 3).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_add_distinct_keys_preserves_order() {
        let mut cart = empty_cart();
        cart.add_item(tee(1, "M", "black", dec!(500)), 1).unwrap();
        cart.add_item(tee(1, "L", "black", dec!(500)), 1).unwrap();
        cart.add_item(tee(2, "M", "black", dec!(750)), 1).unwrap();

        let sizes: Vec<_> = cart
            .lines()
            .iter()
            .map(|l| (l.product.id.as_i32(), l.product.size.as_str()))
            .collect();
        assert_eq!(sizes, vec![(1, "M"), (1, "L"), (2, "M")]);
    }

    #[test]
    fn test_add_clamps_zero_quantity() {
        let mut cart = empty_cart();
        cart.add_item(tee(1, "M", "black", dec!(500)), 0).unwrap();

        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn test_update_to_zero_removes() {
        let mut cart = empty_cart();
        cart.add_item(tee(1, "M", "black", dec!(500)), 2).unwrap();
        cart.update_quantity(ProductId::new(1), "M", "black", 0)
            .unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.total().amount, Decimal::ZERO);
    }

    #[test]
    fn test_update_to_negative_removes() {
        let mut cart = empty_cart();
        cart.add_item(tee(1, "M", "black", dec!(500)), 2).unwrap();
        cart.update_quantity(ProductId::new(1), "M", "black", -1)
            .unwrap();

        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_replaces_quantity() {
        let mut cart = empty_cart();
        cart.add_item(tee(1, "M", "black", dec!(500)), 2).unwrap();
        cart.update_quantity(ProductId::new(1), "M", "black", 7)
            .unwrap();

        assert_eq!(cart.lines()[0].quantity, 7);
    }

    #[test]
    fn test_update_absent_key_is_noop() {
        let mut cart = empty_cart();
        cart.add_item(tee(1, "M", "black", dec!(500)), 2).unwrap();
        cart.update_quantity(ProductId::new(9), "M", "black", 3)
            .unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_remove_absent_key_is_noop() {
        let mut cart = empty_cart();
        cart.add_item(tee(1, "M", "black", dec!(500)), 2).unwrap();
        let before = cart.lines().to_vec();

        cart.remove_item(ProductId::new(1), "XL", "black").unwrap();
        assert_eq!(cart.lines(), before.as_slice());
    }

    #[test]
    fn test_merge_then_clear_scenario() {
        // Cart has {T-shirt#1, M, black, qty 2 @ ₹500}; adding one more of
        // the same key yields a single line of 3 totalling ₹1500; updating
        // to 0 empties the cart.
        let mut cart = empty_cart();
        cart.add_item(tee(1, "M", "black", dec!(500)), 2).unwrap();
        cart.add_item(tee(1, "M", "black", dec!(500)), 1).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.total().amount, dec!(1500));
        assert_eq!(cart.item_count(), 3);

        cart.update_quantity(ProductId::new(1), "M", "black", 0)
            .unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total().amount, Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_clear_erases_persisted_state() {
        let mut store = SharedStore::new(MemoryStore::new());
        let mut cart = CartManager::load(store.clone()).unwrap();

        cart.add_item(tee(1, "M", "black", dec!(500)), 2).unwrap();
        assert!(store.get(keys::CART_LINES).unwrap().is_some());

        cart.clear().unwrap();
        assert!(store.get(keys::CART_LINES).unwrap().is_none());
    }

    #[test]
    fn test_persist_reload_roundtrip() {
        let store = SharedStore::new(MemoryStore::new());

        let mut cart = CartManager::load(store.clone()).unwrap();
        cart.add_item(tee(1, "M", "black", dec!(500)), 2).unwrap();
        cart.add_item(tee(2, "L", "white", dec!(750)), 1).unwrap();
        let saved = cart.lines().to_vec();
        drop(cart);

        let reloaded = CartManager::load(store).unwrap();
        assert_eq!(reloaded.lines(), saved.as_slice());
        assert_eq!(reloaded.total().amount, dec!(1750));
    }

    #[test]
    fn test_corrupt_persisted_cart_starts_empty() {
        let mut store = MemoryStore::new();
        store.set(keys::CART_LINES, "{ definitely not lines").unwrap();

        let cart = CartManager::load(store).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_invariant_after_random_operations() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(7);
        let mut cart = empty_cart();

        let pool = [
            tee(1, "M", "black", dec!(500)),
            tee(1, "L", "black", dec!(500)),
            tee(2, "M", "white", dec!(750)),
            tee(3, "S", "black", dec!(299)),
        ];

        for _ in 0..200 {
            let product = &pool[rng.random_range(0..pool.len())];
            match rng.random_range(0..3) {
                0 => cart
                    .add_item(product.clone(), rng.random_range(1..4))
                    .unwrap(),
                1 => cart
                    .update_quantity(
                        product.id,
                        &product.size,
                        &product.color,
                        rng.random_range(-1..5),
                    )
                    .unwrap(),
                _ => cart
                    .remove_item(product.id, &product.size, &product.color)
                    .unwrap(),
            }

            // Unique identity keys
            let mut keys: Vec<_> = cart
                .lines()
                .iter()
                .map(|l| (l.product.id, l.product.size.clone(), l.product.color.clone()))
                .collect();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), cart.lines().len());

            // Derived aggregates match a fresh fold over the lines
            let expected_total: Decimal = cart
                .lines()
                .iter()
                .map(|l| l.product.price.amount * Decimal::from(l.quantity))
                .sum();
            assert_eq!(cart.total().amount, expected_total);

            let expected_count: u32 = cart.lines().iter().map(|l| l.quantity).sum();
            assert_eq!(cart.item_count(), expected_count);

            // Every line quantity stays >= 1
            assert!(cart.lines().iter().all(|l| l.quantity >= 1));
        }
    }
}
