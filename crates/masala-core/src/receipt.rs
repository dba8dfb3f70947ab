//! # Receipt Module
//!
//! Builds a fixed-layout receipt from a confirmed [`Bill`] and renders it as
//! monospace text or as a standalone printable HTML page.
//!
//! ## Layout
//! ```text
//! ┌────────────────────────────────────────┐
//! │             MASALA HOUSE               │  business header
//! │        12 MG Road, Bengaluru           │
//! │   Phone: 080-4000 1234  GSTIN: ...     │
//! │────────────────────────────────────────│
//! │ Bill No: B-1001                        │  bill number, timestamp
//! │ Date: 01/03/2024 18:00                 │
//! │ Customer: Asha    Table: 4             │  customer / table
//! │────────────────────────────────────────│
//! │ Item             Qty    Rate    Amount │  itemized lines
//! │ Butter Chicken     2  280.00    560.00 │
//! │────────────────────────────────────────│
//! │ Subtotal                       ₹560.00 │  totals block
//! │ Tax                            ₹100.80 │
//! │ Discount                       -₹56.00 │
//! │ TOTAL                          ₹604.80 │
//! │ Payment: Cash                          │
//! │────────────────────────────────────────│
//! │        Thank you! Visit again.         │  footer
//! └────────────────────────────────────────┘
//! ```
//!
//! Exact spacing is presentation; the fields above are always present.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Bill, PaymentMethod};

/// Narrowest supported paper, in characters (58 mm roll).
pub const MIN_PAPER_WIDTH: usize = 32;
/// Widest supported paper, in characters.
pub const MAX_PAPER_WIDTH: usize = 80;

const QTY_COL: usize = 4;
const RATE_COL: usize = 9;
const AMOUNT_COL: usize = 10;

// =============================================================================
// Business Info
// =============================================================================

/// Header and footer content printed on every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessInfo {
    pub name: String,
    pub address_lines: Vec<String>,
    pub phone: String,
    /// GSTIN or other tax registration number.
    pub tax_id: String,
    pub footer: String,
    pub currency_symbol: String,
    /// Offset applied to bill timestamps, in minutes east of UTC (IST = 330).
    pub utc_offset_minutes: i32,
}

impl Default for BusinessInfo {
    fn default() -> Self {
        Self {
            name: "Masala House".to_string(),
            address_lines: Vec::new(),
            phone: String::new(),
            tax_id: String::new(),
            footer: "Thank you! Visit again.".to_string(),
            currency_symbol: "₹".to_string(),
            utc_offset_minutes: 330,
        }
    }
}

impl BusinessInfo {
    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    fn currency(&self, amount: Money) -> String {
        let sign = if amount.is_negative() { "-" } else { "" };
        let magnitude = Money::from_paise(amount.paise().abs());
        format!("{}{}{}", sign, self.currency_symbol, magnitude.format_plain())
    }
}

// =============================================================================
// Receipt Document
// =============================================================================

/// One itemized row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// A receipt ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub business: BusinessInfo,
    pub bill_id: String,
    pub bill_number: String,
    pub issued_at: DateTime<FixedOffset>,
    pub customer_name: String,
    pub customer_phone: String,
    pub table_number: String,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
}

impl Receipt {
    /// Builds a receipt from the server's bill. Amounts are copied as the
    /// server reported them, never recomputed.
    pub fn from_bill(bill: &Bill, business: &BusinessInfo) -> Self {
        let lines = bill
            .items
            .iter()
            .map(|item| ReceiptLine {
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.price,
                line_total: item.line_total(),
            })
            .collect();

        Self {
            business: business.clone(),
            bill_id: bill.id.clone(),
            bill_number: bill.bill_number.clone(),
            issued_at: bill.created_at.with_timezone(&business.offset()),
            customer_name: bill.customer_name.trim().to_string(),
            customer_phone: bill.customer_phone.trim().to_string(),
            table_number: bill.table_number.trim().to_string(),
            lines,
            subtotal: bill.subtotal,
            tax: bill.tax,
            discount: bill.discount,
            total: bill.total,
            payment_method: bill.payment_method,
        }
    }

    /// Timestamp as printed (`01/03/2024 18:00`).
    pub fn timestamp(&self) -> String {
        self.issued_at.format("%d/%m/%Y %H:%M").to_string()
    }

    fn totals(&self) -> [(&'static str, String); 4] {
        let b = &self.business;
        [
            ("Subtotal", b.currency(self.subtotal)),
            ("Tax", b.currency(self.tax)),
            ("Discount", format!("-{}", b.currency(self.discount))),
            ("TOTAL", b.currency(self.total)),
        ]
    }

    // =========================================================================
    // Text Rendering
    // =========================================================================

    /// Renders a fixed-width receipt for monospace output. `width` is clamped
    /// to 32..=80 characters.
    pub fn render_text(&self, width: usize) -> String {
        let width = width.clamp(MIN_PAPER_WIDTH, MAX_PAPER_WIDTH);
        let rule = "-".repeat(width);
        let mut out: Vec<String> = Vec::new();

        for line in wrap(&self.business.name.to_uppercase(), width) {
            out.push(center(&line, width));
        }
        for address in &self.business.address_lines {
            for line in wrap(address, width) {
                out.push(center(&line, width));
            }
        }
        if !self.business.phone.is_empty() {
            out.push(center(&format!("Phone: {}", self.business.phone), width));
        }
        if !self.business.tax_id.is_empty() {
            out.push(center(&format!("GSTIN: {}", self.business.tax_id), width));
        }

        out.push(rule.clone());
        out.push(format!("Bill No: {}", self.bill_number));
        out.push(format!("Date: {}", self.timestamp()));
        if !self.customer_name.is_empty() {
            out.push(format!("Customer: {}", self.customer_name));
        }
        if !self.customer_phone.is_empty() {
            out.push(format!("Phone: {}", self.customer_phone));
        }
        if !self.table_number.is_empty() {
            out.push(format!("Table: {}", self.table_number));
        }

        out.push(rule.clone());
        let name_col = width - QTY_COL - RATE_COL - AMOUNT_COL;
        out.push(item_row("Item", "Qty", "Rate", "Amount", name_col));
        for line in &self.lines {
            let mut name_rows = wrap(&line.name, name_col - 1).into_iter();
            let first = name_rows.next().unwrap_or_default();
            out.push(item_row(
                &first,
                &line.quantity.to_string(),
                &line.unit_price.format_plain(),
                &line.line_total.format_plain(),
                name_col,
            ));
            out.extend(name_rows);
        }

        out.push(rule.clone());
        for (label, value) in self.totals() {
            out.push(two_col(label, &value, width));
        }
        out.push(format!("Payment: {}", self.payment_method.label()));

        if !self.business.footer.is_empty() {
            out.push(rule);
            for line in wrap(&self.business.footer, width) {
                out.push(center(&line, width));
            }
        }

        let mut text = out
            .iter()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n");
        text.push('\n');
        text
    }

    // =========================================================================
    // HTML Rendering
    // =========================================================================

    /// Renders a standalone printable HTML page that opens the print dialog
    /// on load. All bill and business text is escaped.
    pub fn render_html(&self) -> String {
        let b = &self.business;
        let mut body = String::new();

        body.push_str(&format!("<div class=\"center title\">{}</div>", esc(&b.name)));
        for address in &b.address_lines {
            body.push_str(&format!("<div class=\"center\">{}</div>", esc(address)));
        }
        if !b.phone.is_empty() {
            body.push_str(&format!("<div class=\"center\">Phone: {}</div>", esc(&b.phone)));
        }
        if !b.tax_id.is_empty() {
            body.push_str(&format!("<div class=\"center\">GSTIN: {}</div>", esc(&b.tax_id)));
        }

        body.push_str("<div class=\"section\">");
        body.push_str(&html_line("Bill No", &self.bill_number));
        body.push_str(&html_line("Date", &self.timestamp()));
        if !self.customer_name.is_empty() {
            body.push_str(&html_line("Customer", &self.customer_name));
        }
        if !self.customer_phone.is_empty() {
            body.push_str(&html_line("Phone", &self.customer_phone));
        }
        if !self.table_number.is_empty() {
            body.push_str(&html_line("Table", &self.table_number));
        }
        body.push_str("</div>");

        body.push_str(
            "<div class=\"section\"><table><thead><tr><th>Item</th><th>Qty</th>\
             <th>Rate</th><th>Amount</th></tr></thead><tbody>",
        );
        for line in &self.lines {
            body.push_str(&format!(
                "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>\
                 <td class=\"num\">{}</td></tr>",
                esc(&line.name),
                line.quantity,
                line.unit_price.format_plain(),
                line.line_total.format_plain()
            ));
        }
        body.push_str("</tbody></table></div>");

        body.push_str("<div class=\"section\">");
        for (label, value) in self.totals() {
            if label == "TOTAL" {
                body.push_str(&format!(
                    "<div class=\"line\"><strong>{}</strong><strong>{}</strong></div>",
                    label,
                    esc(&value)
                ));
            } else {
                body.push_str(&html_line(label, &value));
            }
        }
        body.push_str(&html_line("Payment", self.payment_method.label()));
        body.push_str("</div>");

        if !b.footer.is_empty() {
            body.push_str(&format!(
                "<div class=\"section center note\">{}</div>",
                esc(&b.footer)
            ));
        }

        html_shell(&format!("Receipt {}", self.bill_number), &body)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn esc(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn html_line(label: &str, value: &str) -> String {
    format!(
        "<div class=\"line\"><span>{}</span><span>{}</span></div>",
        esc(label),
        esc(value)
    )
}

fn item_row(name: &str, qty: &str, rate: &str, amount: &str, name_col: usize) -> String {
    format!(
        "{:<nw$}{:>qw$}{:>rw$}{:>aw$}",
        name,
        qty,
        rate,
        amount,
        nw = name_col,
        qw = QTY_COL,
        rw = RATE_COL,
        aw = AMOUNT_COL
    )
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((width - len) / 2), text)
}

fn two_col(left: &str, right: &str, width: usize) -> String {
    let used = left.chars().count() + right.chars().count();
    let gap = width.saturating_sub(used).max(1);
    format!("{}{}{}", left, " ".repeat(gap), right)
}

/// Word-wraps `text`; words longer than a full row are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(8);
    let mut out = Vec::new();
    let mut line = String::new();
    let tokens = text.split_whitespace().flat_map(|word| {
        let chars: Vec<char> = word.chars().collect();
        chars
            .chunks(width)
            .map(|chunk| chunk.iter().collect::<String>())
            .collect::<Vec<_>>()
    });
    for token in tokens {
        if line.is_empty() {
            line.push_str(&token);
            continue;
        }
        if line.chars().count() + 1 + token.chars().count() > width {
            out.push(std::mem::take(&mut line));
            line.push_str(&token);
        } else {
            line.push(' ');
            line.push_str(&token);
        }
    }
    if !line.is_empty() {
        out.push(line);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

fn html_shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1.0"/>
<title>{}</title>
<style>
body {{ font-family: ui-monospace, SFMono-Regular, Menlo, monospace; margin: 0 auto; padding: 12px; max-width: 320px; color: #111; }}
.title {{ font-size: 14px; font-weight: bold; text-transform: uppercase; }}
.line {{ display: flex; justify-content: space-between; gap: 8px; font-size: 11px; }}
.section {{ margin-top: 8px; border-top: 1px dashed #111; padding-top: 6px; }}
table {{ width: 100%; border-collapse: collapse; font-size: 11px; }}
th {{ text-align: left; border-bottom: 1px solid #111; }}
.num {{ text-align: right; }}
.note {{ color: #666; font-size: 10px; }}
.center {{ text-align: center; }}
@media print {{ body {{ padding: 0; }} }}
</style>
</head>
<body onload="window.print()">{}</body>
</html>"#,
        esc(title),
        body
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BillItem, BillStatus};
    use chrono::TimeZone;

    fn bill() -> Bill {
        Bill {
            id: "66aa01".to_string(),
            bill_number: "B-1001".to_string(),
            items: vec![
                BillItem {
                    menu_item: Some("m1".to_string()),
                    name: "Butter Chicken".to_string(),
                    quantity: 2,
                    price: Money::from_paise(28_000),
                    total: Some(Money::from_paise(56_000)),
                },
                BillItem {
                    menu_item: Some("m2".to_string()),
                    name: "Garlic Naan <Large>".to_string(),
                    quantity: 3,
                    price: Money::from_paise(6_000),
                    total: None,
                },
            ],
            subtotal: Money::from_paise(74_000),
            tax: Money::from_paise(13_320),
            discount: Money::from_paise(7_400),
            total: Money::from_paise(79_920),
            payment_method: PaymentMethod::Upi,
            customer_name: "Asha".to_string(),
            customer_phone: "9876543210".to_string(),
            table_number: "4".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            status: BillStatus::Paid,
        }
    }

    fn business() -> BusinessInfo {
        BusinessInfo {
            name: "Masala House".to_string(),
            address_lines: vec!["12 MG Road, Bengaluru".to_string()],
            phone: "080-4000 1234".to_string(),
            tax_id: "29ABCDE1234F1Z5".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_bill_copies_server_amounts() {
        let receipt = Receipt::from_bill(&bill(), &business());

        assert_eq!(receipt.bill_number, "B-1001");
        assert_eq!(receipt.total, Money::from_paise(79_920));
        assert_eq!(receipt.lines[1].line_total, Money::from_paise(18_000));
        // 12:30 UTC is 18:00 IST
        assert_eq!(receipt.timestamp(), "01/03/2024 18:00");
    }

    #[test]
    fn test_text_contains_mandatory_fields() {
        let text = Receipt::from_bill(&bill(), &business()).render_text(40);

        for expected in [
            "MASALA HOUSE",
            "12 MG Road, Bengaluru",
            "Bill No: B-1001",
            "Date: 01/03/2024 18:00",
            "Customer: Asha",
            "Table: 4",
            "Butter Chicken",
            "280.00",
            "560.00",
            "₹740.00",
            "₹133.20",
            "-₹74.00",
            "₹799.20",
            "Payment: UPI",
            "Thank you! Visit again.",
        ] {
            assert!(text.contains(expected), "missing {:?} in\n{}", expected, text);
        }
    }

    #[test]
    fn test_text_respects_width() {
        let text = Receipt::from_bill(&bill(), &business()).render_text(32);
        for line in text.lines() {
            assert!(line.chars().count() <= 32, "too wide: {:?}", line);
        }

        // Out-of-range widths are clamped
        let narrow = Receipt::from_bill(&bill(), &business()).render_text(5);
        assert!(narrow.lines().any(|l| l.chars().count() == MIN_PAPER_WIDTH));
        assert!(narrow.lines().all(|l| l.chars().count() <= MIN_PAPER_WIDTH));
    }

    #[test]
    fn test_text_omits_empty_customer_fields() {
        let mut walk_in = bill();
        walk_in.customer_name.clear();
        walk_in.customer_phone.clear();
        walk_in.table_number = "  ".to_string();

        let text = Receipt::from_bill(&walk_in, &business()).render_text(40);
        assert!(!text.contains("Customer:"));
        assert!(!text.contains("Table:"));
    }

    #[test]
    fn test_html_is_printable_and_escaped() {
        let mut info = business();
        info.name = "Tom & Jerry's".to_string();
        let html = Receipt::from_bill(&bill(), &info).render_html();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("window.print()"));
        assert!(html.contains("Tom &amp; Jerry&#39;s"));
        assert!(html.contains("Garlic Naan &lt;Large&gt;"));
        assert!(!html.contains("<Large>"));
        assert!(html.contains("B-1001"));
        assert!(html.contains("₹799.20"));
    }

    #[test]
    fn test_custom_currency_symbol() {
        let mut info = business();
        info.currency_symbol = "Rs.".to_string();
        let text = Receipt::from_bill(&bill(), &info).render_text(40);
        assert!(text.contains("Rs.799.20"));
        assert!(text.contains("-Rs.74.00"));
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("Paneer Butter Masala Special", 12), vec!["Paneer", "Butter", "Masala", "Special"]);
        assert_eq!(wrap("", 12), vec![String::new()]);
        assert_eq!(wrap("Hyderabadi", 8), vec!["Hyderaba", "di"]);
    }
}
