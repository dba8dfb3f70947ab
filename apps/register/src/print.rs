//! # Print Dispatcher
//!
//! Sends a confirmed bill to a hardware printer, falling back to a printable
//! HTML document the operator prints by hand.
//!
//! ## Print Attempt Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. PrinterGateway::printer_status()                                    │
//! │        │ error / offline / no printers ───────────────┐                 │
//! │        ▼                                              │                 │
//! │  2. print_bill(bill.id, default printer)              │                 │
//! │        │ error / success=false ───────────────────────┤                 │
//! │        ▼                                              ▼                 │
//! │  PrintOutcome::Printed              3. Receipt::render_html()           │
//! │                                        PrintSink::dispatch()            │
//! │                                        PrintOutcome::Fallback           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One attempt per request. Nothing is retried silently.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use masala_client::{PrinterConfig, PrinterGateway};
use masala_core::{Bill, BusinessInfo, Receipt};

use crate::error::PrintError;

/// Manual output path for receipts the printer service could not take.
///
/// `dispatch` may block; the dispatcher runs it on the blocking pool.
pub trait PrintSink: Send + Sync {
    /// Hands the receipt over and returns where the operator can find it.
    fn dispatch(&self, receipt: &Receipt) -> Result<String, PrintError>;
}

/// Writes `<billNumber>.html` into a directory. Opening the file in a
/// browser triggers the print dialog.
#[derive(Debug, Clone)]
pub struct HtmlFileSink {
    dir: PathBuf,
}

impl HtmlFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn file_name(receipt: &Receipt) -> String {
        let stem = if receipt.bill_number.trim().is_empty() {
            &receipt.bill_id
        } else {
            &receipt.bill_number
        };
        let safe: String = stem
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if safe.is_empty() {
            "receipt.html".to_string()
        } else {
            format!("{}.html", safe)
        }
    }
}

impl PrintSink for HtmlFileSink {
    fn dispatch(&self, receipt: &Receipt) -> Result<String, PrintError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(Self::file_name(receipt));
        std::fs::write(&path, receipt.render_html())?;
        Ok(path.display().to_string())
    }
}

/// How a print request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintOutcome {
    /// The print service accepted the job.
    Printed { printer: String },
    /// Hardware printing was not possible; the receipt is at `location`.
    Fallback { reason: String, location: String },
}

/// Drives one print request per bill.
pub struct PrintDispatcher {
    printer: Arc<dyn PrinterGateway>,
    sink: Arc<dyn PrintSink>,
    business: BusinessInfo,
    paper_width: usize,
}

impl PrintDispatcher {
    pub fn new(
        printer: Arc<dyn PrinterGateway>,
        sink: Arc<dyn PrintSink>,
        business: BusinessInfo,
        paper_width: usize,
    ) -> Self {
        Self {
            printer,
            sink,
            business,
            paper_width,
        }
    }

    pub fn receipt(&self, bill: &Bill) -> Receipt {
        Receipt::from_bill(bill, &self.business)
    }

    /// Monospace preview at the configured paper width.
    pub fn preview(&self, bill: &Bill) -> String {
        self.receipt(bill).render_text(self.paper_width)
    }

    /// Prints `bill`. Errors only if the fallback itself cannot be written.
    pub async fn print(&self, bill: &Bill) -> Result<PrintOutcome, PrintError> {
        let reason = match self.try_hardware(bill).await {
            Ok(printer) => {
                info!(bill_number = %bill.bill_number, printer = %printer, "Receipt printed");
                return Ok(PrintOutcome::Printed { printer });
            }
            Err(reason) => reason,
        };

        warn!(bill_number = %bill.bill_number, reason = %reason, "Falling back to manual print");
        let sink = Arc::clone(&self.sink);
        let receipt = self.receipt(bill);
        let location = tokio::task::spawn_blocking(move || sink.dispatch(&receipt))
            .await
            .map_err(|e| PrintError::Io(std::io::Error::other(e)))??;
        Ok(PrintOutcome::Fallback { reason, location })
    }

    /// Returns the printer name on success, the fallback reason otherwise.
    async fn try_hardware(&self, bill: &Bill) -> Result<String, String> {
        let status = self
            .printer
            .printer_status()
            .await
            .map_err(|e| format!("printer status unavailable: {}", e))?;

        if !status.is_available() {
            return Err(format!("no printer online (status: {:?})", status.status));
        }
        let printer = status
            .preferred_printer()
            .map(|p| p.name.clone())
            .ok_or_else(|| "no printer listed".to_string())?;

        let config = PrinterConfig {
            printer_name: printer.clone(),
            paper_width: self.paper_width,
        };
        let response = self
            .printer
            .print_bill(&bill.id, &config)
            .await
            .map_err(|e| format!("print request failed: {}", e))?;

        if response.success {
            Ok(printer)
        } else {
            Err(response
                .message
                .unwrap_or_else(|| "printer refused the job".to_string()))
        }
    }
}
