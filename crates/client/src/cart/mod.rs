//! Cart store: the pending order basket.
//!
//! Wraps the pure [`Cart`] model with persistence and change notification.
//! Every mutation is applied in memory, written to durable storage under
//! [`keys::CART`], and published on a `watch` channel, all under one lock so
//! concurrent callers observe each other's effects in order.
//!
//! A mutation the cart refuses (see [`CartError`]) is neither persisted nor
//! published.
//!
//! Storage is best-effort. A cart that can't be read at startup is an empty
//! cart; a write that fails is logged and the in-memory cart stays
//! authoritative.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use foodpoint_core::{Cart, CartError, CartItemId, NewCartItem};

use crate::storage::{DurableStorage, keys};
use crate::telemetry;

/// Persistent, observable cart.
///
/// Cheap to clone; clones share the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    storage: Arc<dyn DurableStorage>,
    cart: Mutex<Cart>,
    changes: watch::Sender<Cart>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &*self.lock())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Rehydrate the cart from `storage`.
    #[instrument(skip(storage))]
    pub fn load(storage: Arc<dyn DurableStorage>) -> Self {
        let cart = read_cart(storage.as_ref());
        debug!(lines = cart.items().len(), total = %cart.total(), "Cart loaded");

        let (changes, _) = watch::channel(cart.clone());
        Self {
            inner: Arc::new(CartStoreInner {
                storage,
                cart: Mutex::new(cart),
                changes,
            }),
        }
    }

    /// Add one unit of `item`, merging with an existing `(id, kind)` line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the cart can't hold another unit.
    pub fn add_to_cart(&self, item: NewCartItem) -> Result<(), CartError> {
        telemetry::add_breadcrumb(
            "cart",
            "Added item",
            Some(&[("item_id", item.id.as_str())]),
        );
        self.try_mutate(|cart| cart.add(item))
    }

    /// Remove every line with this id. Returns `true` if anything was removed.
    pub fn remove_from_cart(&self, id: &CartItemId) -> bool {
        telemetry::add_breadcrumb("cart", "Removed item", Some(&[("item_id", id.as_str())]));
        self.mutate(|cart| cart.remove(id))
    }

    /// Set the quantity of every line with this id; below 1 removes them.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the quantity or resulting total is out of
    /// range. The cart is left as it was.
    pub fn update_quantity(&self, id: &CartItemId, quantity: i64) -> Result<(), CartError> {
        self.try_mutate(|cart| cart.update_quantity(id, quantity))
    }

    /// Empty the cart.
    pub fn clear_cart(&self) {
        telemetry::add_breadcrumb("cart", "Cleared cart", None);
        self.mutate(Cart::clear);
    }

    /// Units across all lines.
    #[must_use]
    pub fn cart_count(&self) -> u64 {
        self.lock().count()
    }

    /// Snapshot of the cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.lock().clone()
    }

    /// Cart total.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lock().total()
    }

    /// Watch cart changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.changes.subscribe()
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut Cart) -> R) -> R {
        let mut cart = self.lock();
        let result = apply(&mut cart);
        self.persist(&cart);
        self.inner.changes.send_replace(cart.clone());
        result
    }

    fn try_mutate(
        &self,
        apply: impl FnOnce(&mut Cart) -> Result<(), CartError>,
    ) -> Result<(), CartError> {
        let mut cart = self.lock();
        if let Err(e) = apply(&mut cart) {
            warn!(error = %e, "Cart change refused");
            return Err(e);
        }
        self.persist(&cart);
        self.inner.changes.send_replace(cart.clone());
        Ok(())
    }

    fn persist(&self, cart: &Cart) {
        let written = serde_json::to_string(cart)
            .map_err(crate::storage::StorageError::from)
            .and_then(|encoded| self.inner.storage.set(keys::CART, &encoded));

        if let Err(e) = written {
            warn!(error = %e, "Failed to persist cart, keeping in-memory copy");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        self.inner
            .cart
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_cart(storage: &dyn DurableStorage) -> Cart {
    let raw = match storage.get(keys::CART) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Cart::new(),
        Err(e) => {
            warn!(error = %e, "Failed to read stored cart, starting empty");
            return Cart::new();
        }
    };

    match serde_json::from_str::<Cart>(&raw) {
        Ok(cart) => cart.normalized(),
        Err(e) => {
            warn!(error = %e, "Stored cart is unreadable, starting empty");
            Cart::new()
        }
    }
}
