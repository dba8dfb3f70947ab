//! Traits the register depends on instead of the concrete HTTP client.
//!
//! [`ApiClient`](crate::http::ApiClient) implements all three; tests supply
//! in-memory fakes.

use async_trait::async_trait;
use masala_core::{Bill, CatalogItem};

use crate::dto::{CreateBillRequest, PrintResponse, PrinterConfig, PrinterStatus};
use crate::error::ClientResult;

/// Source of the sellable menu (`GET /menu?available=true`).
#[async_trait]
pub trait MenuSource: Send + Sync {
    async fn fetch_menu(&self) -> ClientResult<Vec<CatalogItem>>;
}

/// Bill creation (`POST /bills`).
#[async_trait]
pub trait BillGateway: Send + Sync {
    /// Creates a bill. `idempotency_key` is the same for every attempt at
    /// the same cart so the server can drop duplicates.
    async fn create_bill(
        &self,
        request: &CreateBillRequest,
        idempotency_key: &str,
    ) -> ClientResult<Bill>;
}

/// Hardware printing through the print service.
#[async_trait]
pub trait PrinterGateway: Send + Sync {
    async fn printer_status(&self) -> ClientResult<PrinterStatus>;

    async fn print_bill(&self, bill_id: &str, config: &PrinterConfig) -> ClientResult<PrintResponse>;
}
