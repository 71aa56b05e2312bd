//! Checkout: turn the cart into an order.

use rand::Rng;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument};

use foodpoint_core::order::WALK_IN_ADDRESS;
use foodpoint_core::{NewOrder, Role};

use crate::api::{ApiClient, ApiError};
use crate::cart::CartStore;
use crate::session::SessionStore;
use crate::telemetry;

/// `placedBy` when the session has no usable name.
const DEFAULT_PLACED_BY: &str = "Cashier";

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// A delivery order is missing required customer details.
    #[error("missing delivery details: {}", .0.join(", "))]
    MissingDetails(Vec<&'static str>),

    /// The backend refused the order. The cart is left untouched.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Customer details for a delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryDetails {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
}

impl DeliveryDetails {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("zip code", &self.zip_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// How the order leaves the restaurant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderType {
    /// Taken at the counter.
    WalkIn,
    Delivery(DeliveryDetails),
}

/// What was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Client-generated receipt number (`ORD-NNNNNN`).
    pub order_id: String,
    pub total: Decimal,
    pub units: u64,
    /// The backend's acknowledgement message, if any.
    pub message: Option<String>,
}

/// Submits the cart as an order on behalf of the signed-in user.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    api: ApiClient,
    session: SessionStore,
    cart: CartStore,
}

impl CheckoutService {
    #[must_use]
    pub const fn new(api: ApiClient, session: SessionStore, cart: CartStore) -> Self {
        Self { api, session, cart }
    }

    /// Build the order payload for the current cart without sending it.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::EmptyCart` if the cart has no lines
    /// - `CheckoutError::MissingDetails` for a delivery order with blank fields
    pub fn build_order(&self, order_type: &OrderType) -> Result<NewOrder, CheckoutError> {
        let cart = self.cart.cart();
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let address = match order_type {
            OrderType::WalkIn => WALK_IN_ADDRESS.to_string(),
            OrderType::Delivery(details) => {
                let missing = details.missing_fields();
                if !missing.is_empty() {
                    return Err(CheckoutError::MissingDetails(missing));
                }
                details.address.trim().to_string()
            }
        };

        let placed_by = self
            .session
            .user()
            .map(|user| user.name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PLACED_BY.to_string());
        let role = self.session.role().unwrap_or(Role::Guest);

        Ok(NewOrder::from_cart(
            &cart,
            generate_order_id(),
            address,
            placed_by,
            role,
        ))
    }

    /// Submit the cart. Clears it on success; leaves it intact on failure.
    ///
    /// # Errors
    ///
    /// See [`build_order`](Self::build_order); also `CheckoutError::Api` if
    /// the backend refuses the order.
    #[instrument(skip(self, order_type))]
    pub async fn submit(&self, order_type: &OrderType) -> Result<Receipt, CheckoutError> {
        let order = self.build_order(order_type)?;
        let units = order.items.iter().map(|item| u64::from(item.quantity)).sum();

        let ack = self.api.create_order(&order).await?;

        self.cart.clear_cart();
        telemetry::add_breadcrumb(
            "checkout",
            "Order placed",
            Some(&[("order_id", order.order_id.as_str())]),
        );
        info!(order_id = %order.order_id, total = %order.total_amount, units, "Order placed");

        Ok(Receipt {
            order_id: order.order_id,
            total: order.total_amount,
            units,
            message: ack.message,
        })
    }
}

/// Receipt number shown to the customer: `ORD-` and six random digits.
#[must_use]
pub fn generate_order_id() -> String {
    let digits: u32 = rand::rng().random_range(100_000..1_000_000);
    format!("ORD-{digits}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use foodpoint_core::{NewCartItem, Price};

    use super::*;
    use crate::api::Anonymous;
    use crate::storage::{DurableStorage, MemoryStorage, keys};

    fn service(storage: &Arc<MemoryStorage>) -> CheckoutService {
        let api = ApiClient::new(
            url::Url::parse("http://127.0.0.1:9/").unwrap(),
            Duration::from_millis(200),
            Arc::new(Anonymous),
        )
        .unwrap();
        let session = SessionStore::new(storage.clone());
        session.initialize();
        let cart = CartStore::load(storage.clone());
        CheckoutService::new(api, session, cart)
    }

    #[test]
    fn test_order_id_format() {
        for _ in 0..100 {
            let id = generate_order_id();
            let digits = id.strip_prefix("ORD-").unwrap();
            assert_eq!(digits.len(), 6);
            assert!(digits.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        let checkout = service(&storage);
        assert!(matches!(
            checkout.build_order(&OrderType::WalkIn),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_delivery_requires_details() {
        let storage = Arc::new(MemoryStorage::new());
        let checkout = service(&storage);
        checkout
            .cart
            .add_to_cart(NewCartItem::product("p1", "Pizza", Price::from_minor(500).unwrap()))
            .unwrap();

        let details = DeliveryDetails {
            name: "Ali".to_string(),
            address: "1 High St".to_string(),
            ..DeliveryDetails::default()
        };
        let err = checkout
            .build_order(&OrderType::Delivery(details))
            .unwrap_err();
        assert_eq!(err.to_string(), "missing delivery details: phone, city, zip code");
    }

    #[test]
    fn test_walk_in_order_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        let checkout = service(&storage);
        checkout
            .cart
            .add_to_cart(NewCartItem::product("p1", "Pizza", Price::from_minor(500).unwrap()))
            .unwrap();
        checkout
            .cart
            .add_to_cart(NewCartItem::product("p1", "Pizza", Price::from_minor(500).unwrap()))
            .unwrap();

        let order = checkout.build_order(&OrderType::WalkIn).unwrap();
        assert_eq!(order.address, WALK_IN_ADDRESS);
        assert_eq!(order.placed_by, DEFAULT_PLACED_BY);
        assert_eq!(order.role, Role::Guest);
        assert_eq!(order.total_amount, Decimal::new(10, 0));
        assert!(order.order_id.starts_with("ORD-"));
    }

    #[test]
    fn test_order_is_placed_by_signed_in_user() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::TOKEN, "t1").unwrap();
        storage.set(keys::ROLE, "cashier").unwrap();
        storage
            .set(
                keys::USER,
                r#"{"id":"u1","email":"till@foodpoint.test","name":"Till One","role":"cashier"}"#,
            )
            .unwrap();

        let checkout = service(&storage);
        checkout
            .cart
            .add_to_cart(NewCartItem::deal("d1", "Feast", Price::from_minor(1999).unwrap()))
            .unwrap();

        let order = checkout.build_order(&OrderType::WalkIn).unwrap();
        assert_eq!(order.placed_by, "Till One");
        assert_eq!(order.role, Role::Cashier);
        assert_eq!(order.items[0].deal_id.as_ref().unwrap().as_str(), "d1");
    }
}
