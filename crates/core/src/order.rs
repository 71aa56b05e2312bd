//! Order schemas and checkout payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartItem, ItemKind};
use crate::types::{DealId, OrderId, OrderStatus, PaymentMethod, Price, ProductId, Role};

/// Address recorded for orders taken at the counter.
pub const WALK_IN_ADDRESS: &str = "Walk-in Order";

/// Product reference on a stored order line; populated when the backend
/// joins the product, `null` if the product has since been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderProductRef {
    Id(ProductId),
    Populated(Box<OrderProductSummary>),
}

impl OrderProductRef {
    /// ID of the referenced product.
    #[must_use]
    pub fn id(&self) -> &ProductId {
        match self {
            Self::Id(id) => id,
            Self::Populated(summary) => &summary.id,
        }
    }
}

/// The subset of a product joined onto order lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProductSummary {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<OrderProductRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<DealId>,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
}

impl OrderItem {
    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.times(self.quantity)
    }
}

impl From<&CartItem> for OrderItem {
    fn from(line: &CartItem) -> Self {
        let (product_id, deal_id) = match line.kind {
            ItemKind::Product => (
                Some(OrderProductRef::Id(
                    line.product_id
                        .clone()
                        .unwrap_or_else(|| ProductId::new(line.id.as_str())),
                )),
                None,
            ),
            ItemKind::Deal => (
                None,
                Some(
                    line.deal_id
                        .clone()
                        .unwrap_or_else(|| DealId::new(line.id.as_str())),
                ),
            ),
        };

        Self {
            product_id,
            deal_id,
            name: line.name.clone(),
            price: line.price,
            quantity: line.quantity,
        }
    }
}

/// An order as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    /// Human-facing receipt number (`ORD-123456`), when one was assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Case-insensitive match on the order's IDs, used by order search boxes.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.id.as_str().to_lowercase().contains(&query)
            || self
                .order_id
                .as_deref()
                .is_some_and(|receipt| receipt.to_lowercase().contains(&query))
    }
}

/// Sort orders newest first.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Checkout payload for `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub order_id: String,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub address: String,
    pub payment_method: PaymentMethod,
    pub placed_by: String,
    pub role: Role,
}

impl NewOrder {
    /// Build an order from the cart's current lines and total.
    #[must_use]
    pub fn from_cart(
        cart: &Cart,
        order_id: String,
        address: String,
        placed_by: String,
        role: Role,
    ) -> Self {
        Self {
            order_id,
            items: cart.items().iter().map(OrderItem::from).collect(),
            total_amount: cart.total(),
            address,
            payment_method: PaymentMethod::Cash,
            placed_by,
            role,
        }
    }
}

/// Headline numbers for the dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderStats {
    pub orders: usize,
    pub revenue: Decimal,
}

impl OrderStats {
    /// Count orders and sum their totals.
    #[must_use]
    pub fn from_orders(orders: &[Order]) -> Self {
        Self {
            orders: orders.len(),
            revenue: orders.iter().map(|o| o.total_amount).sum(),
        }
    }
}
