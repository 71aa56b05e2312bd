//! Order endpoints.

use tracing::instrument;

use foodpoint_core::order::sort_newest_first;
use foodpoint_core::{NewOrder, Order, OrderId, OrderStats};

use super::{Ack, ApiClient, ApiError};

impl ApiClient {
    /// List orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body isn't an order list.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let mut orders: Vec<Order> = self.get("orders").await?;
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with 404 if the order doesn't exist.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.get(&format!("orders/{id}")).await
    }

    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend refuses the order.
    #[instrument(skip(self, order), fields(order_id = %order.order_id, items = order.items.len()))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<Ack, ApiError> {
        self.post("orders", order).await
    }

    /// Order count and revenue across every order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the order list can't be fetched.
    #[instrument(skip(self))]
    pub async fn order_stats(&self) -> Result<OrderStats, ApiError> {
        let orders: Vec<Order> = self.get("orders").await?;
        Ok(OrderStats::from_orders(&orders))
    }
}
