//! Request and response shapes for the REST API.
//!
//! Domain records ([`CatalogItem`], [`Bill`]) come from masala-core; this
//! module only adds the envelopes and the request bodies around them.

use masala_core::money::{self, Money};
use masala_core::{Bill, CartLine, CatalogItem, CustomerDetails, PaymentMethod};
use serde::{Deserialize, Serialize};

// =============================================================================
// Envelopes
// =============================================================================

/// `{ "data": ... }` wrapper used by every success response.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// `{ "message": ... }` body of an error response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).filter(|m| !m.trim().is_empty())
    }
}

pub type MenuResponse = DataEnvelope<Vec<CatalogItem>>;
pub type BillResponse = DataEnvelope<Bill>;

// =============================================================================
// Bill Submission
// =============================================================================

/// One line of a bill submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillLineRequest {
    pub menu_item_id: String,
    pub quantity: i64,
}

/// Body of `POST /bills`.
///
/// The server recomputes tax and total; only the discount amount the client
/// computed is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillRequest {
    pub customer_name: String,
    pub customer_phone: String,
    pub table_number: String,
    pub items: Vec<BillLineRequest>,
    #[serde(with = "money::rupees")]
    pub discount: Money,
    pub payment_method: PaymentMethod,
}

impl CreateBillRequest {
    pub fn new(
        lines: &[CartLine],
        customer: &CustomerDetails,
        discount: Money,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            customer_name: customer.customer_name.trim().to_string(),
            customer_phone: customer.customer_phone.trim().to_string(),
            table_number: customer.table_number.trim().to_string(),
            items: lines
                .iter()
                .map(|line| BillLineRequest {
                    menu_item_id: line.item_id.clone(),
                    quantity: line.quantity,
                })
                .collect(),
            discount,
            payment_method,
        }
    }
}

// =============================================================================
// Printer Service
// =============================================================================

/// Printer service state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterState {
    Online,
    #[default]
    Offline,
    Checking,
    #[serde(other)]
    Unknown,
}

/// A printer known to the print service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterInfo {
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Response of `GET /printer/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterStatus {
    #[serde(default)]
    pub status: PrinterState,
    #[serde(default)]
    pub printers: Vec<PrinterInfo>,
}

impl PrinterStatus {
    /// True if the service is online with at least one printer.
    pub fn is_available(&self) -> bool {
        self.status == PrinterState::Online && !self.printers.is_empty()
    }

    /// The default printer, or the first listed one.
    pub fn preferred_printer(&self) -> Option<&PrinterInfo> {
        self.printers
            .iter()
            .find(|p| p.is_default)
            .or_else(|| self.printers.first())
    }
}

/// Which printer to use and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterConfig {
    pub printer_name: String,
    /// Characters per line of the receipt paper.
    pub paper_width: usize,
}

/// Body of `POST /printer/print/:billId`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest<'a> {
    pub printer_config: &'a PrinterConfig,
}

/// Response of `POST /printer/print/:billId`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PrintResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bill_request_shape() {
        let lines = vec![CartLine {
            item_id: "m1".to_string(),
            name: "Butter Chicken".to_string(),
            unit_price: Money::from_paise(28_000),
            quantity: 2,
        }];
        let customer = CustomerDetails {
            customer_name: " Asha ".to_string(),
            customer_phone: String::new(),
            table_number: "4".to_string(),
        };

        let request =
            CreateBillRequest::new(&lines, &customer, Money::from_paise(5_600), PaymentMethod::Upi);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "customerName": "Asha",
                "customerPhone": "",
                "tableNumber": "4",
                "items": [{"menuItemId": "m1", "quantity": 2}],
                "discount": 56.0,
                "paymentMethod": "upi"
            })
        );
    }

    #[test]
    fn test_menu_envelope() {
        let menu: MenuResponse = serde_json::from_value(json!({
            "data": [{"_id": "m1", "name": "Dal Makhani", "price": 220, "stock": 8}]
        }))
        .unwrap();
        assert_eq!(menu.data.len(), 1);
        assert_eq!(menu.data[0].id, "m1");
    }

    #[test]
    fn test_printer_status() {
        let status: PrinterStatus = serde_json::from_value(json!({
            "status": "online",
            "printers": [{"name": "Kitchen"}, {"name": "Counter", "isDefault": true}]
        }))
        .unwrap();
        assert!(status.is_available());
        assert_eq!(status.preferred_printer().unwrap().name, "Counter");

        let offline: PrinterStatus = serde_json::from_value(json!({"status": "offline"})).unwrap();
        assert!(!offline.is_available());

        let odd: PrinterStatus =
            serde_json::from_value(json!({"status": "paper-jam", "printers": []})).unwrap();
        assert_eq!(odd.status, PrinterState::Unknown);
    }

    #[test]
    fn test_error_body_message() {
        let body: ErrorBody = serde_json::from_value(json!({"message": "Invalid table"})).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Invalid table"));

        let body: ErrorBody = serde_json::from_value(json!({"error": "Unauthorized"})).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Unauthorized"));

        assert!(ErrorBody::default().into_message().is_none());
    }
}
