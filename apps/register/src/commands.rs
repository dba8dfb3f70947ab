//! # Register Commands
//!
//! Line-oriented command surface over [`RegisterState`].
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│  Submit  │────►│  Bill +  │       │
//! │  │  Cart    │     │          │     │          │     │  Receipt │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                   add / qty / rm     submit           print             │
//! │                   name / phone /       │                                │
//! │                   table / discount     │ failure: cart kept, retry      │
//! │                   pay                  ▼                                │
//! │                        │            (In Cart)                           │
//! │                        ▼                                                │
//! │                      clear ─────────────────────────► (Empty Cart)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use masala_core::{CustomerDetails, DiscountSpec, Money, PaymentMethod, PricingResult};

use crate::error::CommandError;
use crate::print::PrintOutcome;
use crate::state::RegisterState;

/// Menus older than this get a hint to run `refresh`.
const MENU_STALE_AFTER: Duration = Duration::from_secs(15 * 60);

pub const HELP: &str = "\
Commands:
  menu                    list sellable items
  refresh                 reload the menu from the server
  cart                    show the cart and totals
  add <item-id>           add one of an item
  qty <item-id> <n>       set quantity (0 removes)
  rm <item-id>            remove an item
  clear                   empty the cart and customer fields
  name <text>             customer name
  phone <text>            customer phone
  table <text>            table number
  discount <n>%           percentage discount
  discount <amount>       flat discount in rupees
  discount none           remove discount
  pay cash|card|upi       payment method
  submit                  create the bill
  print                   print the last bill
  reset-submit            unblock after an interrupted submission
  quit                    exit";

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Menu,
    Refresh,
    Cart,
    Add { item_id: String },
    SetQuantity { item_id: String, quantity: i64 },
    Remove { item_id: String },
    Clear,
    CustomerName(String),
    CustomerPhone(String),
    TableNumber(String),
    Discount(DiscountSpec),
    Payment(PaymentMethod),
    Submit,
    Print,
    ResetSubmission,
    Quit,
}

/// What to show after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

impl Command {
    /// Parses one input line. Blank lines give `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "menu" => Command::Menu,
            "refresh" => Command::Refresh,
            "cart" => Command::Cart,
            "add" => Command::Add {
                item_id: required(rest, "add <item-id>")?.to_string(),
            },
            "qty" => {
                let mut parts = rest.split_whitespace();
                let (item_id, quantity) = match (parts.next(), parts.next(), parts.next()) {
                    (Some(id), Some(n), None) => (id, n),
                    _ => return Err(CommandError::validation("Usage: qty <item-id> <n>")),
                };
                let quantity = quantity.parse::<i64>().map_err(|_| {
                    CommandError::validation(format!("Quantity must be a whole number: {}", quantity))
                })?;
                Command::SetQuantity {
                    item_id: item_id.to_string(),
                    quantity,
                }
            }
            "rm" | "remove" => Command::Remove {
                item_id: required(rest, "rm <item-id>")?.to_string(),
            },
            "clear" => Command::Clear,
            "name" => Command::CustomerName(rest.to_string()),
            "phone" => Command::CustomerPhone(rest.to_string()),
            "table" => Command::TableNumber(rest.to_string()),
            "discount" => Command::Discount(parse_discount(required(rest, "discount <n>%|<amount>|none")?)?),
            "pay" => Command::Payment(
                PaymentMethod::from_str(required(rest, "pay cash|card|upi")?)
                    .map_err(CommandError::validation)?,
            ),
            "submit" => Command::Submit,
            "print" => Command::Print,
            "reset-submit" => Command::ResetSubmission,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::unknown(other)),
        };

        Ok(Some(command))
    }
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::validation(format!("Usage: {}", usage)))
    } else {
        Ok(rest)
    }
}

/// `10%` → percentage, `50` / `49.50` → amount, `none` → no discount.
fn parse_discount(raw: &str) -> Result<DiscountSpec, CommandError> {
    if raw.eq_ignore_ascii_case("none") {
        return Ok(DiscountSpec::none());
    }

    if let Some(pct) = raw.strip_suffix('%') {
        let value: f64 = pct
            .trim()
            .parse()
            .map_err(|_| CommandError::validation(format!("Invalid percentage: {}", raw)))?;
        if !value.is_finite() || value < 0.0 {
            return Err(CommandError::validation("Percentage must be 0 or more"));
        }
        return Ok(DiscountSpec::percentage_bps((value.min(100.0) * 100.0).round() as u32));
    }

    let amount = Money::from_str(raw).map_err(CommandError::validation)?;
    if amount.is_negative() {
        return Err(CommandError::validation("Discount cannot be negative"));
    }
    Ok(DiscountSpec::amount(amount))
}

// =============================================================================
// Execution
// =============================================================================

/// Runs one command against the register.
pub async fn execute(state: &mut RegisterState, command: Command) -> Result<Reply, CommandError> {
    debug!(?command, "execute command");

    let text = match command {
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Reply::Quit),

        Command::Menu => render_menu(state),
        Command::Refresh => {
            let count = state.session.refresh_catalog().await?;
            format!("Menu refreshed: {} items", count)
        }
        Command::Cart => render_cart(state),

        Command::Add { item_id } => {
            state.session.add_item(&item_id).await?;
            cart_update(state)
        }
        Command::SetQuantity { item_id, quantity } => {
            state.session.set_quantity(&item_id, quantity).await?;
            cart_update(state)
        }
        Command::Remove { item_id } => {
            state.session.remove_item(&item_id).await;
            cart_update(state)
        }
        Command::Clear => {
            state.session.clear().await;
            with_persistence_warning(state, "Cart cleared".to_string())
        }

        Command::CustomerName(name) => {
            let mut customer = state.session.ledger().customer().clone();
            customer.customer_name = name;
            update_customer(state, customer).await
        }
        Command::CustomerPhone(phone) => {
            let mut customer = state.session.ledger().customer().clone();
            customer.customer_phone = phone;
            update_customer(state, customer).await
        }
        Command::TableNumber(table) => {
            let mut customer = state.session.ledger().customer().clone();
            customer.table_number = table;
            update_customer(state, customer).await
        }
        Command::Discount(discount) => {
            state.session.set_discount(discount).await;
            cart_update(state)
        }
        Command::Payment(method) => {
            state.session.set_payment_method(method).await;
            with_persistence_warning(state, format!("Payment method: {}", method.label()))
        }

        Command::Submit => {
            let bill = state.session.submit().await?;
            let text = format!(
                "Bill {} created. Total {}\n\n{}\nType 'print' to print the receipt.",
                bill.bill_number,
                bill.total,
                state.printer.preview(&bill)
            );
            state.last_bill = Some(bill);
            with_persistence_warning(state, text)
        }
        Command::Print => {
            let bill = state
                .last_bill
                .as_ref()
                .ok_or_else(|| CommandError::validation("No bill to print yet"))?;
            match state.printer.print(bill).await? {
                PrintOutcome::Printed { printer } => format!("Sent to printer '{}'", printer),
                PrintOutcome::Fallback { reason, location } => format!(
                    "Printer unavailable ({}).\nReceipt saved to {}; open it to print.",
                    reason, location
                ),
            }
        }
        Command::ResetSubmission => {
            state.session.reset_interrupted_submission();
            "Submission reset. Check the bill list before submitting again.".to_string()
        }
    };

    Ok(Reply::Text(text))
}

async fn update_customer(state: &mut RegisterState, customer: CustomerDetails) -> String {
    state.session.set_customer(customer).await;
    let c = state.session.ledger().customer();
    with_persistence_warning(
        state,
        format!(
            "Customer: {} | Phone: {} | Table: {}",
            or_dash(&c.customer_name),
            or_dash(&c.customer_phone),
            or_dash(&c.table_number)
        ),
    )
}

fn cart_update(state: &RegisterState) -> String {
    with_persistence_warning(state, render_cart(state))
}

fn with_persistence_warning(state: &RegisterState, mut text: String) -> String {
    if let Some(err) = state.session.last_persistence_error() {
        text.push_str(&format!("\nWarning: cart not saved locally ({})", err));
    }
    text
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

// =============================================================================
// Rendering
// =============================================================================

fn render_menu(state: &RegisterState) -> String {
    let catalog = state.session.catalog();
    let mut out = String::new();

    for item in catalog.sellable() {
        out.push_str(&format!(
            "{:<16} {:<24} {:>10} {:>5} left\n",
            item.id,
            item.name,
            item.price.to_string(),
            item.stock
        ));
    }

    if out.is_empty() {
        return "No sellable items. Try 'refresh'.".to_string();
    }
    if let Some(at) = catalog.refreshed_at() {
        out.push_str(&format!("(menu as of {})", at.format("%H:%M:%S UTC")));
    }
    if catalog.is_stale(Utc::now(), MENU_STALE_AFTER) {
        out.push_str("\nStock figures may be out of date. Try 'refresh'.");
    }
    out
}

/// Cart lines plus the totals block.
pub fn render_cart(state: &RegisterState) -> String {
    let ledger = state.session.ledger();
    if ledger.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut out = String::new();
    for line in ledger.lines() {
        out.push_str(&format!(
            "{:<24} {:>3} x {:>9} = {:>10}\n",
            line.name,
            line.quantity,
            line.unit_price.to_string(),
            line.line_total().to_string()
        ));
    }
    out.push_str(&render_totals(
        &state.session.pricing(),
        state.session.tax_rate().percentage(),
    ));
    out.push_str(&format!(
        "\nItems: {}  Payment: {}",
        ledger.total_quantity(),
        ledger.payment_method().label()
    ));
    out
}

fn render_totals(pricing: &PricingResult, tax_percent: f64) -> String {
    format!(
        "Subtotal {:>16}\nTax ({}%) {:>15}\nDiscount {:>16}\nTOTAL    {:>16}",
        pricing.subtotal.to_string(),
        tax_percent,
        pricing.tax.to_string(),
        format!("-{}", pricing.discount_amount),
        pricing.total.to_string()
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
