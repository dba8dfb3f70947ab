//! # Billing Session
//!
//! Owns the cart for one register and drives every side effect around it.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_item / set_quantity / remove_item / clear / set_customer / ...    │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  CartLedger mutation (sync, checked against CatalogCache)              │
//! │        │ Err ──► CartError, nothing else happens                       │
//! │        ▼                                                                │
//! │  snapshot taken ──► SnapshotStore::save / clear   (best effort)        │
//! │        │              failure: warn! + last_persistence_error           │
//! │        ▼                                                                │
//! │  PricingResult returned                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submission State Machine
//! ```text
//!   Idle ──submit()──► Submitting ──┬──► Success   (cart + snapshot cleared)
//!     ▲                             └──► Failed    (cart untouched)
//!     └──────────── next successful mutation ◄─────────┘
//! ```
//!
//! Methods take `&mut self`, so two mutations can never interleave and the
//! snapshot written for mutation N is always the state after N.

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tracing::{debug, info, warn};
use uuid::Uuid;

use masala_client::{BillGateway, ClientError, CreateBillRequest, MenuSource};
use masala_core::error::CartResult;
use masala_core::validation::validate_customer;
use masala_core::{
    Bill, CartLedger, CatalogCache, CustomerDetails, DiscountSpec, PaymentMethod,
    PendingOrder, PricingResult, TaxRate,
};
use masala_db::SnapshotStore;

use crate::error::SubmitError;

/// Where the submission state machine currently sits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Submitting,
    Success,
    Failed,
}

/// Result of the one-time pending-order restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// A previous cart was loaded; the operator should confirm or clear it.
    Restored { lines: usize },
    /// Nothing saved.
    NothingToRestore,
    /// The store could not be read; the session starts empty.
    Unavailable { reason: String },
    /// Restore already ran for this session.
    AlreadyAttempted,
}

/// Retry schedule for catalog refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    /// Give up after this much total time. `None` means a single attempt.
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(5),
            max_elapsed: Some(Duration::from_secs(30)),
        }
    }
}

impl RetryPolicy {
    /// One attempt, no waiting.
    pub fn none() -> Self {
        Self {
            initial_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            max_elapsed: None,
        }
    }

    fn create_backoff(&self) -> Option<ExponentialBackoff> {
        self.max_elapsed.map(|max_elapsed| ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            multiplier: 2.0,
            max_elapsed_time: Some(max_elapsed),
            ..Default::default()
        })
    }
}

/// Idempotency key and the exact order it was issued for. Any edit to the
/// order makes the key stale.
#[derive(Debug, Clone)]
struct IssuedKey {
    key: String,
    order: PendingOrder,
}

/// The register's billing session.
pub struct BillingSession {
    ledger: CartLedger,
    catalog: CatalogCache,
    tax_rate: TaxRate,

    menu: Arc<dyn MenuSource>,
    bills: Arc<dyn BillGateway>,
    store: Arc<dyn SnapshotStore>,
    retry: RetryPolicy,

    phase: SubmissionPhase,
    submission_key: Option<IssuedKey>,
    restore_attempted: bool,
    last_persistence_error: Option<String>,
}

impl BillingSession {
    pub fn new(
        menu: Arc<dyn MenuSource>,
        bills: Arc<dyn BillGateway>,
        store: Arc<dyn SnapshotStore>,
        tax_rate: TaxRate,
    ) -> Self {
        Self {
            ledger: CartLedger::new(),
            catalog: CatalogCache::new(),
            tax_rate,
            menu,
            bills,
            store,
            retry: RetryPolicy::default(),
            phase: SubmissionPhase::Idle,
            submission_key: None,
            restore_attempted: false,
            last_persistence_error: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    pub fn ledger(&self) -> &CartLedger {
        &self.ledger
    }

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    /// Current totals for display. Advisory only; the server's bill wins.
    pub fn pricing(&self) -> PricingResult {
        self.ledger.pricing(self.tax_rate)
    }

    /// Last snapshot write failure, cleared by the next successful write.
    pub fn last_persistence_error(&self) -> Option<&str> {
        self.last_persistence_error.as_deref()
    }

    pub fn submission_key(&self) -> Option<&str> {
        self.submission_key.as_ref().map(|issued| issued.key.as_str())
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Loads the pending order saved by a previous run. Runs at most once.
    pub async fn restore(&mut self) -> RestoreOutcome {
        if self.restore_attempted {
            return RestoreOutcome::AlreadyAttempted;
        }
        self.restore_attempted = true;

        match self.store.load().await {
            Ok(Some(order)) if !order.is_empty() => {
                let lines = self.ledger.restore(order);
                if lines == 0 {
                    return RestoreOutcome::NothingToRestore;
                }
                info!(lines, "Previous cart restored");
                RestoreOutcome::Restored { lines }
            }
            Ok(_) => RestoreOutcome::NothingToRestore,
            Err(e) => {
                warn!(error = %e, "Could not read pending order");
                RestoreOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Fetches the menu, retrying transient failures with exponential backoff.
    ///
    /// On failure the previous catalog stays in place and the error is
    /// returned so the caller can show a stale-catalog warning.
    pub async fn refresh_catalog(&mut self) -> Result<usize, ClientError> {
        let mut backoff = self.retry.create_backoff();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.menu.fetch_menu().await {
                Ok(items) => {
                    let count = self.catalog.replace(items);
                    info!(items = count, attempt, "Catalog refreshed");
                    return Ok(count);
                }
                Err(e) if e.is_transient() => {
                    let wait = backoff.as_mut().and_then(|b| b.next_backoff());
                    match wait {
                        Some(duration) => {
                            debug!(?duration, attempt, error = %e, "Catalog fetch failed, retrying");
                            tokio::time::sleep(duration).await;
                        }
                        None => {
                            warn!(
                                attempt,
                                cached = self.catalog.len(),
                                error = %e,
                                "Catalog refresh failed, keeping last-known catalog"
                            );
                            return Err(e);
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Catalog refresh rejected, keeping last-known catalog");
                    return Err(e);
                }
            }
        }
    }

    // =========================================================================
    // Cart Mutations
    // =========================================================================

    /// Adds one of `item_id`.
    pub async fn add_item(&mut self, item_id: &str) -> CartResult<PricingResult> {
        let quantity = self.ledger.add(&self.catalog, item_id)?;
        debug!(item_id, quantity, "Item added");
        Ok(self.after_mutation().await)
    }

    /// Sets the quantity of `item_id`; zero or less removes the line.
    pub async fn set_quantity(&mut self, item_id: &str, quantity: i64) -> CartResult<PricingResult> {
        self.ledger.set_quantity(&self.catalog, item_id, quantity)?;
        debug!(item_id, quantity, "Quantity set");
        Ok(self.after_mutation().await)
    }

    /// Removes `item_id`. Absent lines are not an error.
    pub async fn remove_item(&mut self, item_id: &str) -> PricingResult {
        if self.ledger.remove(item_id) {
            debug!(item_id, "Item removed");
            self.after_mutation().await
        } else {
            self.pricing()
        }
    }

    /// Empties the cart and resets customer fields, discount and payment.
    pub async fn clear(&mut self) -> PricingResult {
        self.ledger.clear();
        self.submission_key = None;
        debug!("Cart cleared");
        self.after_mutation().await
    }

    pub async fn set_customer(&mut self, customer: CustomerDetails) -> PricingResult {
        self.ledger.set_customer(customer);
        self.after_mutation().await
    }

    pub async fn set_discount(&mut self, discount: DiscountSpec) -> PricingResult {
        self.ledger.set_discount(discount);
        debug!(discount = ?self.ledger.discount(), "Discount set");
        self.after_mutation().await
    }

    pub async fn set_payment_method(&mut self, method: PaymentMethod) -> PricingResult {
        self.ledger.set_payment_method(method);
        self.after_mutation().await
    }

    /// Treats an interrupted submission as failed so the cart can be
    /// submitted again. Only call this once the bill list shows no bill for
    /// the cart.
    pub fn reset_interrupted_submission(&mut self) {
        if self.phase == SubmissionPhase::Submitting {
            warn!("Interrupted submission reset by operator");
            self.phase = SubmissionPhase::Failed;
        }
    }

    async fn after_mutation(&mut self) -> PricingResult {
        if self.phase != SubmissionPhase::Submitting {
            self.phase = SubmissionPhase::Idle;
        }
        self.persist().await;
        self.pricing()
    }

    /// Mirrors the ledger into the snapshot store. Never fails the caller.
    async fn persist(&mut self) {
        let result = if self.ledger.is_empty() {
            self.store.clear().await
        } else {
            let snapshot = self.ledger.snapshot();
            self.store.save(&snapshot).await
        };

        match result {
            Ok(()) => self.last_persistence_error = None,
            Err(e) => {
                warn!(error = %e, "Failed to persist pending order");
                self.last_persistence_error = Some(e.to_string());
            }
        }
    }

    // =========================================================================
    // Bill Submission
    // =========================================================================

    /// Submits the cart as a bill.
    ///
    /// On success the cart and snapshot are cleared and the server's bill is
    /// returned as-is. On any error the cart is left untouched. Never retries.
    pub async fn submit(&mut self) -> Result<Bill, SubmitError> {
        if self.phase == SubmissionPhase::Submitting {
            return Err(SubmitError::SubmissionInProgress);
        }
        if self.ledger.is_empty() {
            return Err(SubmitError::EmptyCart);
        }
        validate_customer(self.ledger.customer())?;

        self.revalidate_stock().await?;

        let pricing = self.pricing();
        let request = CreateBillRequest::new(
            self.ledger.lines(),
            self.ledger.customer(),
            pricing.discount_amount,
            self.ledger.payment_method(),
        );
        let key = self.key_for(self.ledger.snapshot());

        info!(
            lines = request.items.len(),
            total = %pricing.total,
            idempotency_key = %key,
            "Submitting bill"
        );
        self.phase = SubmissionPhase::Submitting;

        match self.bills.create_bill(&request, &key).await {
            Ok(bill) => {
                if bill.total != pricing.total {
                    warn!(
                        bill_number = %bill.bill_number,
                        client_total = %pricing.total,
                        server_total = %bill.total,
                        client_tax = %pricing.tax,
                        server_tax = %bill.tax,
                        "Server total differs from client total"
                    );
                }

                self.ledger.clear();
                self.submission_key = None;
                self.discard_billed_snapshot(&bill.bill_number).await;
                self.phase = SubmissionPhase::Success;

                info!(bill_number = %bill.bill_number, total = %bill.total, "Bill created");
                Ok(bill)
            }
            Err(e) => {
                self.phase = SubmissionPhase::Failed;
                warn!(error = %e, transient = e.is_transient(), "Bill submission failed");
                Err(SubmitError::from(e))
            }
        }
    }

    /// Reuses the key while the order is unchanged, so a retry of the same
    /// cart can be deduplicated server side. An edited order gets a new key.
    fn key_for(&mut self, order: PendingOrder) -> String {
        match &self.submission_key {
            Some(issued) if issued.order == order => issued.key.clone(),
            _ => {
                let key = Uuid::new_v4().to_string();
                self.submission_key = Some(IssuedKey {
                    key: key.clone(),
                    order,
                });
                key
            }
        }
    }

    /// Deletes the snapshot of a cart that has just been billed. Tried twice;
    /// a leftover snapshot would be restored on the next start as if unbilled.
    async fn discard_billed_snapshot(&mut self, bill_number: &str) {
        let mut result = self.store.clear().await;
        if result.is_err() {
            result = self.store.clear().await;
        }

        match result {
            Ok(()) => self.last_persistence_error = None,
            Err(e) => {
                warn!(bill_number, error = %e, "Billed cart is still saved locally");
                self.last_persistence_error = Some(format!(
                    "bill {} was created but its saved cart could not be deleted ({}); \
                     clear it if it is restored",
                    bill_number, e
                ));
            }
        }
    }

    /// Checks the cart against a fresh catalog when one can be fetched.
    async fn revalidate_stock(&mut self) -> Result<(), SubmitError> {
        match self.menu.fetch_menu().await {
            Ok(items) => {
                self.catalog.replace(items);
                let shortfalls = self.ledger.validate_stock(&self.catalog);
                if shortfalls.is_empty() {
                    Ok(())
                } else {
                    warn!(items = shortfalls.len(), "Cart exceeds current stock");
                    Err(SubmitError::StockChanged(shortfalls))
                }
            }
            Err(e) => {
                warn!(error = %e, "Stock re-check skipped, using last-known catalog");
                Ok(())
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
