//! Shopping cart model.
//!
//! [`Cart`] is the pure state behind the client's cart store: an ordered list
//! of line items plus a derived total. Line items are keyed by
//! `(id, kind)` so a product and a deal that happen to share an ID stay on
//! separate lines.
//!
//! The total is never adjusted incrementally. Every mutation recomputes it
//! as `Σ price × quantity`, so edits to items can't drift away from the
//! displayed amount. Arithmetic is checked: a change whose total would not
//! fit in a [`Decimal`] is refused with [`CartError`] and leaves the cart as
//! it was.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::define_id;
use crate::types::{DealId, Price, ProductId};

define_id!(CartItemId);

/// Errors from cart mutations. The cart is unchanged when one is returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The requested quantity doesn't fit a line item.
    #[error("quantity {0} is too large")]
    QuantityTooLarge(i64),
    /// The cart total would exceed the largest representable amount.
    #[error("cart total is too large")]
    TotalOverflow,
}

/// What a line item refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Product,
    Deal,
}

/// An item offered to the cart, before it has a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub id: CartItemId,
    pub name: String,
    pub price: Price,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    /// Cross-reference to the deal when the line was added from a deal card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<DealId>,
}

impl NewCartItem {
    /// A product line.
    #[must_use]
    pub fn product(id: impl Into<String>, name: impl Into<String>, price: Price) -> Self {
        let id = id.into();
        Self {
            product_id: Some(ProductId::new(id.clone())),
            id: CartItemId::new(id),
            name: name.into(),
            price,
            kind: ItemKind::Product,
            image: None,
            deal_id: None,
        }
    }

    /// A deal line.
    #[must_use]
    pub fn deal(id: impl Into<String>, name: impl Into<String>, price: Price) -> Self {
        let id = id.into();
        Self {
            deal_id: Some(DealId::new(id.clone())),
            id: CartItemId::new(id),
            name: name.into(),
            price,
            kind: ItemKind::Deal,
            image: None,
            product_id: None,
        }
    }

    /// Attach an image URL.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub name: String,
    pub price: Price,
    /// Always at least 1 for a line present in a [`Cart`].
    pub quantity: u32,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<DealId>,
}

impl CartItem {
    fn from_new(item: NewCartItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
            quantity: 1,
            kind: item.kind,
            image: item.image,
            product_id: item.product_id,
            deal_id: item.deal_id,
        }
    }

    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.times(self.quantity)
    }

    fn checked_line_total(&self) -> Option<Decimal> {
        self.price.checked_times(self.quantity)
    }

    fn matches(&self, id: &CartItemId, kind: ItemKind) -> bool {
        self.id == *id && self.kind == kind
    }
}

/// The pending order basket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    total: Decimal,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines (not the number of lines).
    #[must_use]
    pub fn count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Add one unit of `item`.
    ///
    /// Bumps the quantity of the existing `(id, kind)` line if there is one,
    /// otherwise appends a new line with quantity 1.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityTooLarge`] if the line is already at
    /// `u32::MAX` units and [`CartError::TotalOverflow`] if the total
    /// wouldn't fit.
    pub fn add(&mut self, item: NewCartItem) -> Result<(), CartError> {
        let mut items = self.items.clone();
        if let Some(existing) = items
            .iter_mut()
            .find(|line| line.matches(&item.id, item.kind))
        {
            existing.quantity = existing
                .quantity
                .checked_add(1)
                .ok_or(CartError::QuantityTooLarge(i64::from(u32::MAX) + 1))?;
        } else {
            items.push(CartItem::from_new(item));
        }
        self.commit(items)
    }

    /// Remove every line with this id, whatever its kind.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove(&mut self, id: &CartItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.id != *id);
        // Dropping lines only lowers a total that already fit.
        self.total = checked_total(&self.items).unwrap_or(self.total);
        self.items.len() != before
    }

    /// Set the quantity of every line with this id.
    ///
    /// A quantity below 1 removes the lines instead.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityTooLarge`] for a quantity beyond
    /// `u32::MAX` and [`CartError::TotalOverflow`] if the new total
    /// wouldn't fit.
    pub fn update_quantity(&mut self, id: &CartItemId, quantity: i64) -> Result<(), CartError> {
        if quantity < 1 {
            self.remove(id);
            return Ok(());
        }

        let quantity =
            u32::try_from(quantity).map_err(|_| CartError::QuantityTooLarge(quantity))?;
        let mut items = self.items.clone();
        for line in items.iter_mut().filter(|line| line.id == *id) {
            line.quantity = quantity;
        }
        self.commit(items)
    }

    /// Drop all lines.
    pub fn clear(&mut self) {
        self.items.clear();
        self.total = Decimal::ZERO;
    }

    /// Repair a cart read back from storage.
    ///
    /// Drops lines whose quantity is 0, and any line that would push the
    /// total past what a `Decimal` holds, then recomputes the total. A
    /// stale or hand-edited stored total is never trusted.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let mut total = Decimal::ZERO;
        self.items.retain(|line| {
            if line.quantity < 1 {
                return false;
            }
            match line
                .checked_line_total()
                .and_then(|amount| total.checked_add(amount))
            {
                Some(next) => {
                    total = next;
                    true
                }
                None => false,
            }
        });
        self.total = total;
        self
    }

    fn commit(&mut self, items: Vec<CartItem>) -> Result<(), CartError> {
        let total = checked_total(&items).ok_or(CartError::TotalOverflow)?;
        self.items = items;
        self.total = total;
        Ok(())
    }
}

fn checked_total(items: &[CartItem]) -> Option<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |total, line| {
        total.checked_add(line.checked_line_total()?)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn price(minor: i64) -> Price {
        Price::from_minor(minor).unwrap()
    }

    fn pizza() -> NewCartItem {
        NewCartItem::product("p1", "Pizza", price(500))
    }

    fn id(s: &str) -> CartItemId {
        CartItemId::new(s)
    }

    #[test]
    fn test_add_to_empty_cart() {
        let mut cart = Cart::new();
        cart.add(pizza()).unwrap();

        assert_eq!(cart.items().len(), 1);
        let line = &cart.items()[0];
        assert_eq!(line.id, id("p1"));
        assert_eq!(line.quantity, 1);
        assert_eq!(cart.total(), Decimal::new(5, 0));
    }

    #[test]
    fn test_duplicate_add_increments_quantity() {
        let mut cart = Cart::new();
        cart.add(pizza()).unwrap();
        cart.add(pizza()).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.total(), Decimal::new(10, 0));
    }

    #[test]
    fn test_same_id_different_kind_are_separate_lines() {
        let mut cart = Cart::new();
        cart.add(pizza()).unwrap();
        cart.add(NewCartItem::deal("p1", "Pizza Deal", price(800))).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.count(), 2);
        assert_eq!(cart.total(), Decimal::new(13, 0));
    }

    #[test]
    fn test_update_quantity_below_one_removes() {
        let mut cart = Cart::new();
        cart.add(pizza()).unwrap();
        cart.add(pizza()).unwrap();
        cart.update_quantity(&id("p1"), 0).unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_update_quantity_sets_value() {
        let mut cart = Cart::new();
        cart.add(pizza()).unwrap();
        cart.add(NewCartItem::product("p2", "Chips", price(250))).unwrap();
        cart.update_quantity(&id("p2"), 4).unwrap();

        assert_eq!(cart.count(), 5);
        assert_eq!(cart.total(), Decimal::new(15, 0));
    }

    #[test]
    fn test_remove_drops_every_kind_with_that_id() {
        let mut cart = Cart::new();
        cart.add(pizza()).unwrap();
        cart.add(NewCartItem::deal("p1", "Pizza Deal", price(800))).unwrap();
        cart.add(NewCartItem::product("p2", "Chips", price(250))).unwrap();

        assert!(cart.remove(&id("p1")));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total(), Decimal::new(250, 2));
        assert!(!cart.remove(&id("missing")));
    }

    #[test]
    fn test_count_sums_quantities() {
        let mut cart = Cart::new();
        cart.add(pizza()).unwrap();
        cart.add(pizza()).unwrap();
        cart.add(NewCartItem::product("p2", "Chips", price(250))).unwrap();
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(pizza()).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_stored_shape() {
        let mut cart = Cart::new();
        cart.add(NewCartItem::deal("d1", "Family Feast", price(1999)).with_image("/img/d1.png"))
            .unwrap();
        let json = serde_json::to_value(&cart).unwrap();

        assert_eq!(json["total"], serde_json::json!(19.99));
        assert_eq!(json["items"][0]["type"], "deal");
        assert_eq!(json["items"][0]["dealId"], "d1");
        assert_eq!(json["items"][0]["quantity"], 1);
    }

    #[test]
    fn test_normalized_repairs_stored_total_and_zero_quantities() {
        let stored = r#"{
            "items": [
                {"id": "p1", "name": "Pizza", "price": 5, "quantity": 2, "type": "product"},
                {"id": "p2", "name": "Chips", "price": 2.5, "quantity": 0, "type": "product"}
            ],
            "total": 999
        }"#;
        let cart: Cart = serde_json::from_str(stored).unwrap();
        let cart = cart.normalized();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total(), Decimal::new(10, 0));
    }

    #[test]
    fn test_overflowing_quantity_is_rejected() {
        let huge = Price::new(Decimal::from_i128_with_scale(10_i128.pow(20), 0)).unwrap();
        let mut cart = Cart::new();
        cart.add(NewCartItem::product("p1", "Gold Pizza", huge)).unwrap();
        cart.add(pizza()).unwrap();
        let before = cart.clone();

        assert_eq!(
            cart.update_quantity(&id("p1"), i64::MAX),
            Err(CartError::QuantityTooLarge(i64::MAX))
        );
        assert_eq!(
            cart.update_quantity(&id("p1"), i64::from(u32::MAX)),
            Err(CartError::TotalOverflow)
        );
        assert_eq!(cart, before);

        let expected: Decimal = cart.items().iter().map(CartItem::line_total).sum();
        assert_eq!(cart.total(), expected);
    }

    #[test]
    fn test_normalized_drops_lines_that_overflow() {
        let stored = r#"{
            "items": [
                {"id": "p1", "name": "Pizza", "price": 5, "quantity": 2, "type": "product"},
                {"id": "p2", "name": "Gold", "price": 1e20, "quantity": 4294967295, "type": "product"}
            ],
            "total": 10
        }"#;
        let cart: Cart = serde_json::from_str(stored).unwrap();
        let cart = cart.normalized();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total(), Decimal::new(10, 0));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add { id: u8, deal: bool, minor: i64 },
        Remove { id: u8 },
        Update { id: u8, quantity: i64 },
        Clear,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0u8..5, any::<bool>(), 0i64..5_000)
                .prop_map(|(id, deal, minor)| Op::Add { id, deal, minor }),
            1 => (0u8..5).prop_map(|id| Op::Remove { id }),
            2 => (0u8..5, -3i64..10).prop_map(|(id, quantity)| Op::Update { id, quantity }),
            1 => Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn prop_total_matches_lines(ops in prop::collection::vec(op(), 0..40)) {
            let mut cart = Cart::new();
            for op in ops {
                match op {
                    Op::Add { id, deal, minor } => {
                        let name = format!("item-{id}");
                        let item = if deal {
                            NewCartItem::deal(id.to_string(), name, price(minor))
                        } else {
                            NewCartItem::product(id.to_string(), name, price(minor))
                        };
                        cart.add(item).unwrap();
                    }
                    Op::Remove { id } => {
                        cart.remove(&CartItemId::new(id.to_string()));
                    }
                    Op::Update { id, quantity } => {
                        let id = CartItemId::new(id.to_string());
                        cart.update_quantity(&id, quantity).unwrap();
                        if quantity < 1 {
                            prop_assert!(cart.items().iter().all(|line| line.id != id));
                        }
                    }
                    Op::Clear => cart.clear(),
                }

                let expected: Decimal = cart
                    .items()
                    .iter()
                    .map(|line| line.price.amount() * Decimal::from(line.quantity))
                    .sum();
                prop_assert_eq!(cart.total(), expected);
                prop_assert!(cart.items().iter().all(|line| line.quantity >= 1));
            }
        }
    }
}
