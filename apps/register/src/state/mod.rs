//! # State Module
//!
//! ```text
//! state/
//! ├── mod.rs       ◄─── RegisterState (what commands operate on)
//! ├── config.rs    ◄─── RegisterConfig (register.toml + MASALA_* env)
//! └── session.rs   ◄─── BillingSession (cart, catalog, submission)
//! ```

pub mod config;
pub mod session;

pub use config::RegisterConfig;
pub use session::{BillingSession, RestoreOutcome, RetryPolicy, SubmissionPhase};

use masala_core::Bill;

use crate::print::PrintDispatcher;

/// Everything a command can touch.
pub struct RegisterState {
    pub session: BillingSession,
    pub printer: PrintDispatcher,
    /// The most recent bill, kept for reprinting.
    pub last_bill: Option<Bill>,
}

impl RegisterState {
    pub fn new(session: BillingSession, printer: PrintDispatcher) -> Self {
        Self {
            session,
            printer,
            last_bill: None,
        }
    }
}
