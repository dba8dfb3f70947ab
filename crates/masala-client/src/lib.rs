//! # masala-client: REST Boundary for Masala POS
//!
//! The menu catalog, bill records and printer service all live behind the
//! restaurant's REST API. This crate is the only place that talks to it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apps/register                                                          │
//! │    BillingSession ──► MenuSource, BillGateway                           │
//! │    PrintDispatcher ─► PrinterGateway                                    │
//! │                │                                                        │
//! │  ┌─────────────▼───────────────────────────────────────────────────┐   │
//! │  │                masala-client (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   gateway.rs   traits the register depends on                  │   │
//! │  │   http.rs      ApiClient: reqwest implementation               │   │
//! │  │   dto.rs       request/response envelopes                      │   │
//! │  │   error.rs     Transient / Rejected / InvalidResponse          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                │ HTTPS, Bearer token, explicit timeout                  │
//! │                ▼                                                        │
//! │         Restaurant REST API                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod gateway;
pub mod http;

pub use dto::{
    BillLineRequest, CreateBillRequest, PrintResponse, PrinterConfig, PrinterInfo, PrinterState,
    PrinterStatus,
};
pub use error::{ClientError, ClientResult};
pub use gateway::{BillGateway, MenuSource, PrinterGateway};
pub use http::{ApiClient, ClientConfig};
