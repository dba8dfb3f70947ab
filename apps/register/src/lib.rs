//! # Masala Register
//!
//! Billing register for Masala POS: builds orders against the live menu,
//! submits bills, and prints receipts.
//!
//! ## Module Organization
//! ```text
//! masala_register/
//! ├── lib.rs          ◄─── You are here (startup & command loop)
//! ├── state/
//! │   ├── mod.rs      ◄─── RegisterState
//! │   ├── config.rs   ◄─── RegisterConfig
//! │   └── session.rs  ◄─── BillingSession
//! ├── commands.rs     ◄─── Command parsing and execution
//! ├── print.rs        ◄─── PrintDispatcher, PrintSink
//! └── error.rs        ◄─── SubmitError, CommandError
//! ```

pub mod commands;
pub mod error;
pub mod print;
pub mod state;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use masala_client::ApiClient;
use masala_db::{Database, DbConfig};

use commands::{execute, Command, Reply};
use print::{HtmlFileSink, PrintDispatcher};
use state::{BillingSession, RegisterConfig, RegisterState, RestoreOutcome, RetryPolicy};

/// Runs the register until `quit` or end of input.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Open SQLite (WAL, migrations) ──► PendingOrderRepository            │
/// │  2. Build ApiClient (base URL, token, timeout)                          │
/// │  3. BillingSession::restore()    ──► "previous cart restored"           │
/// │  4. refresh_catalog() with backoff ──► stale-catalog warning on failure │
/// │  5. Read commands from stdin                                            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(config: RegisterConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = config.database_path();
    info!(?db_path, "Database path determined");
    let db = Database::new(DbConfig::new(db_path)).await?;
    if !db.health_check().await {
        warn!("Database health check failed");
    }

    let api = Arc::new(ApiClient::new(&config.client_config())?);
    info!(base_url = %api.base_url(), "API client ready");

    let pending = db.pending_orders();
    if let Ok(Some(saved_at)) = pending.updated_at().await {
        info!(%saved_at, "Found saved cart");
    }

    let mut session = BillingSession::new(
        api.clone(),
        api.clone(),
        Arc::new(pending),
        config.tax_rate(),
    )
    .with_retry_policy(retry_policy(&config));

    match session.restore().await {
        RestoreOutcome::Restored { lines } => println!(
            "Previous cart restored ({} lines). Type 'cart' to review or 'clear' to discard.",
            lines
        ),
        RestoreOutcome::Unavailable { reason } => {
            println!("Warning: saved cart could not be read ({})", reason)
        }
        RestoreOutcome::NothingToRestore | RestoreOutcome::AlreadyAttempted => {}
    }

    match session.refresh_catalog().await {
        Ok(count) => println!("Menu loaded: {} items", count),
        Err(e) => println!("Warning: menu unavailable ({}). Type 'refresh' to retry.", e),
    }

    let printer = PrintDispatcher::new(
        api,
        Arc::new(HtmlFileSink::new(config.receipt_dir())),
        config.business.clone(),
        config.receipt.paper_width,
    );
    let mut state = RegisterState::new(session, printer);

    println!("Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match execute(&mut state, command).await {
            Ok(Reply::Text(text)) => println!("{}", text),
            Ok(Reply::Quit) => break,
            Err(e) => println!("{}", e),
        }
    }

    info!("Register shutting down");
    db.close().await;
    Ok(())
}

fn retry_policy(config: &RegisterConfig) -> RetryPolicy {
    if config.api.catalog_retry_secs == 0 {
        return RetryPolicy::none();
    }
    RetryPolicy {
        initial_interval: Duration::from_millis(config.api.catalog_initial_backoff_ms),
        max_interval: Duration::from_secs(5),
        max_elapsed: Some(Duration::from_secs(config.api.catalog_retry_secs)),
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=masala=trace` - Show trace for masala crates only
/// - Default: `info,masala=debug,sqlx=warn`
///
/// Logs go to stderr so they do not interleave with command output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,masala=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_from_config() {
        let mut config = RegisterConfig::default();
        let policy = retry_policy(&config);
        assert_eq!(policy.initial_interval, Duration::from_millis(500));
        assert_eq!(policy.max_elapsed, Some(Duration::from_secs(30)));

        config.api.catalog_retry_secs = 0;
        assert_eq!(retry_policy(&config), RetryPolicy::none());
    }
}
