//! # Register Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartError (masala-core)   ──┐                                          │
//! │  SubmitError (session)     ──┤                                          │
//! │  ClientError (catalog)     ──┼──► CommandError { code, message } ──►    │
//! │  PrintError (dispatcher)   ──┘          operator sees                   │
//! │                                         "[INSUFFICIENT_STOCK] Only 3    │
//! │                                          Naan in stock, requested 5"    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `SubmitError` keeps "retry is safe" (`TransientFailure`) apart from
//! "fix your input" (`ValidationRejected`, `InvalidInput`).

use serde::Serialize;
use thiserror::Error;

use masala_client::ClientError;
use masala_core::{CartError, StockShortfall, ValidationError};

// =============================================================================
// Submission
// =============================================================================

/// Why a bill submission did not produce a bill.
///
/// In every case the cart is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Nothing to bill. Raised before any network call.
    #[error("Cart is empty")]
    EmptyCart,

    /// A previous submission has not finished.
    #[error("A bill submission is already in progress")]
    SubmissionInProgress,

    /// Customer fields failed local checks.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// A fresh catalog shows less stock than the cart holds.
    #[error("Stock changed for {} item(s)", .0.len())]
    StockChanged(Vec<StockShortfall>),

    /// The server refused the bill.
    #[error("Bill rejected ({status}): {message}")]
    ValidationRejected { status: u16, message: String },

    /// Network, timeout or server failure. Safe to retry.
    #[error("Bill submission failed, retry is safe: {0}")]
    TransientFailure(String),

    /// The server answered but the bill could not be read. The bill may
    /// exist; check before retrying.
    #[error("Bill response could not be read: {0}")]
    InvalidResponse(String),

    /// The API client is misconfigured.
    #[error("Client configuration error: {0}")]
    InvalidConfig(String),
}

impl SubmitError {
    /// True if resubmitting the same cart is safe.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmitError::TransientFailure(_))
    }
}

impl From<ClientError> for SubmitError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transient { message } => SubmitError::TransientFailure(message),
            ClientError::Rejected { status, message } => {
                SubmitError::ValidationRejected { status, message }
            }
            ClientError::InvalidResponse(message) => SubmitError::InvalidResponse(message),
            ClientError::InvalidConfig(message) => SubmitError::InvalidConfig(message),
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Printing
// =============================================================================

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("Failed to write receipt: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Command Surface
// =============================================================================

/// Error shown to the operator for a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Menu item not in the catalog
    NotFound,

    /// Input could not be parsed or failed validation
    ValidationError,

    /// Command not recognized
    UnknownCommand,

    /// Cart rule violated (unavailable item, cart full, quantity cap)
    CartError,

    /// Stock ceiling reached
    InsufficientStock,

    /// Submit with no lines
    EmptyCart,

    /// Submit while another submission is pending
    SubmissionInProgress,

    /// Server refused the request
    Rejected,

    /// Network or server failure, retry is safe
    Transient,

    /// Server reply could not be read
    InvalidResponse,

    /// Receipt could not be produced
    PrintError,

    Internal,
}

impl CommandError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CommandError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CommandError::new(ErrorCode::ValidationError, message)
    }

    pub fn unknown(command: &str) -> Self {
        CommandError::new(
            ErrorCode::UnknownCommand,
            format!("Unknown command '{}'. Type 'help' for a list.", command),
        )
    }
}

impl From<CartError> for CommandError {
    fn from(err: CartError) -> Self {
        let code = match &err {
            _ if err.is_stock_error() => ErrorCode::InsufficientStock,
            CartError::ItemNotFound(_) => ErrorCode::NotFound,
            CartError::QuantityTooLarge { .. } => ErrorCode::ValidationError,
            _ => ErrorCode::CartError,
        };
        CommandError::new(code, err.to_string())
    }
}

impl From<SubmitError> for CommandError {
    fn from(err: SubmitError) -> Self {
        let code = match &err {
            SubmitError::EmptyCart => ErrorCode::EmptyCart,
            SubmitError::SubmissionInProgress => ErrorCode::SubmissionInProgress,
            SubmitError::InvalidInput(_) => ErrorCode::ValidationError,
            SubmitError::StockChanged(_) => ErrorCode::InsufficientStock,
            SubmitError::ValidationRejected { .. } => ErrorCode::Rejected,
            SubmitError::TransientFailure(_) => ErrorCode::Transient,
            SubmitError::InvalidResponse(_) => ErrorCode::InvalidResponse,
            SubmitError::InvalidConfig(_) => ErrorCode::Internal,
        };

        let message = match &err {
            SubmitError::StockChanged(shortfalls) => {
                let detail: Vec<String> = shortfalls
                    .iter()
                    .map(|s| format!("{} ({} in stock, {} in cart)", s.name, s.available, s.requested))
                    .collect();
                format!("{}: {}", err, detail.join(", "))
            }
            _ => err.to_string(),
        };

        CommandError::new(code, message)
    }
}

impl From<ClientError> for CommandError {
    fn from(err: ClientError) -> Self {
        let code = match &err {
            ClientError::Transient { .. } => ErrorCode::Transient,
            ClientError::Rejected { .. } => ErrorCode::Rejected,
            ClientError::InvalidResponse(_) => ErrorCode::InvalidResponse,
            ClientError::InvalidConfig(_) => ErrorCode::Internal,
        };
        CommandError::new(code, err.to_string())
    }
}

impl From<PrintError> for CommandError {
    fn from(err: PrintError) -> Self {
        tracing::error!("Receipt output failed: {}", err);
        CommandError::new(ErrorCode::PrintError, err.to_string())
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = serde_json::to_value(self.code)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{:?}", self.code));
        write!(f, "[{}] {}", code, self.message)
    }
}

impl std::error::Error for CommandError {}
