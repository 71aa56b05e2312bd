//! Menu catalog: the latest products and deals, refreshed on an interval.
//!
//! # Refresh policy
//!
//! A refresh fetches products and deals concurrently and replaces the
//! snapshot only when both succeed. Refreshes are single-flight: a call
//! made while another is outstanding returns [`RefreshOutcome::Skipped`]
//! without issuing requests, so a slow backend never accumulates
//! overlapping polls. Refreshes are also skipped while nobody is signed in.
//!
//! [`MenuCatalog::spawn_polling`] drives `refresh` from a fixed-interval
//! timer. Ticks missed while a refresh runs are skipped rather than
//! replayed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use foodpoint_core::menu::{categories, merge_menu};
use foodpoint_core::{Deal, MenuItem, Product};

use crate::api::{ApiClient, ApiError};

/// Latest catalog data.
#[derive(Debug, Clone, Default)]
pub struct MenuSnapshot {
    pub products: Vec<Product>,
    pub deals: Vec<Deal>,
    /// When the data was last replaced.
    pub refreshed_at: Option<Instant>,
    /// Message from the most recent failed refresh, cleared on success.
    pub error: Option<String>,
}

impl MenuSnapshot {
    /// Customer menu: active deals first, then products.
    #[must_use]
    pub fn items(&self) -> Vec<MenuItem> {
        merge_menu(&self.deals, &self.products)
    }

    /// Product categories for filter chips.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        categories(&self.products)
    }
}

/// Why a refresh didn't run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another refresh is still outstanding.
    InFlight,
    /// No session token to sign the requests with.
    SignedOut,
}

/// Result of [`MenuCatalog::refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed { products: usize, deals: usize },
    Skipped(SkipReason),
}

/// Shared, observable menu catalog.
#[derive(Clone)]
pub struct MenuCatalog {
    inner: Arc<MenuCatalogInner>,
}

struct MenuCatalogInner {
    api: ApiClient,
    snapshot: watch::Sender<MenuSnapshot>,
    in_flight: AtomicBool,
}

impl std::fmt::Debug for MenuCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.inner.snapshot.borrow();
        f.debug_struct("MenuCatalog")
            .field("products", &snapshot.products.len())
            .field("deals", &snapshot.deals.len())
            .field("in_flight", &self.inner.in_flight.load(Ordering::Relaxed))
            .finish()
    }
}

/// Clears the in-flight flag when a refresh ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl MenuCatalog {
    /// Create an empty catalog backed by `api`.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let (snapshot, _) = watch::channel(MenuSnapshot::default());
        Self {
            inner: Arc::new(MenuCatalogInner {
                api,
                snapshot,
                in_flight: AtomicBool::new(false),
            }),
        }
    }

    /// Fetch products and deals and replace the snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first `ApiError` from either request. The previous
    /// snapshot is kept and its `error` field set.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<RefreshOutcome, ApiError> {
        if !self.inner.api.has_credentials() {
            debug!("Skipping menu refresh, no session");
            return Ok(RefreshOutcome::Skipped(SkipReason::SignedOut));
        }

        let Some(_guard) = InFlightGuard::acquire(&self.inner.in_flight) else {
            debug!("Skipping menu refresh, previous one still running");
            return Ok(RefreshOutcome::Skipped(SkipReason::InFlight));
        };

        let api = &self.inner.api;
        match futures::future::try_join(api.list_products(), api.list_deals()).await {
            Ok((products, deals)) => {
                let outcome = RefreshOutcome::Refreshed {
                    products: products.len(),
                    deals: deals.len(),
                };
                self.inner.snapshot.send_replace(MenuSnapshot {
                    products,
                    deals,
                    refreshed_at: Some(Instant::now()),
                    error: None,
                });
                debug!(?outcome, "Menu refreshed");
                Ok(outcome)
            }
            Err(e) => {
                self.inner
                    .snapshot
                    .send_modify(|snapshot| snapshot.error = Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Refresh every `period` on a background task until the handle is
    /// stopped or dropped. Failures are logged and polling continues.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use = "dropping the handle stops polling"]
    pub fn spawn_polling(&self, period: Duration) -> PollHandle {
        let catalog = self.clone();
        info!(period_secs = period.as_secs_f64(), "Starting menu polling");

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if let Err(e) = catalog.refresh().await {
                    warn!(error = %e, "Menu refresh failed");
                }
            }
        });

        PollHandle { task }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> MenuSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Merged menu view of the current snapshot.
    #[must_use]
    pub fn items(&self) -> Vec<MenuItem> {
        self.inner.snapshot.borrow().items()
    }

    /// Watch snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MenuSnapshot> {
        self.inner.snapshot.subscribe()
    }
}

/// Handle to a polling task. Dropping it stops the task.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop polling. A refresh in progress is abandoned.
    pub fn stop(self) {
        drop(self);
    }

    /// Whether the task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
