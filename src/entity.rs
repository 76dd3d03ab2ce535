//! Ledger entities and the trait every persisted record implements.

use crate::money::Money;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Textual format of invoice dates.
pub const DATE_FORMAT: &str = "%m-%d-%Y";

/// Trait implemented by every record kept in a persisted collection.
///
/// # Example
///
/// ```
/// use retail_ledger::entity::{Customer, CustomerId, Record};
///
/// let customer = Customer::new(CustomerId::new("42"), "555-0100", "Ada", "ada@example.com");
/// assert_eq!(customer.record_key(), CustomerId::new("42"));
/// assert_eq!(Customer::record_kind(), "customer");
/// ```
pub trait Record: Clone {
    /// Type of the record's identifier.
    type Key: fmt::Display + Clone + Eq;

    /// Return the record's identifier.
    fn record_key(&self) -> Self::Key;

    /// Short name of the record type, used in log lines.
    fn record_kind() -> &'static str;

    /// Header line written at the top of the persisted file.
    fn header() -> &'static str;
}

// ============================================================================
// Identifiers
// ============================================================================

/// Stable identifier of a customer: a short numeric string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        CustomerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a finalized invoice, e.g. `INV-48213907`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(String);

impl InvoiceId {
    pub fn new(id: impl Into<String>) -> Self {
        InvoiceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Customer
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub phone: String,
    pub name: String,
    pub email: String,
    pub points: u32,
}

impl Customer {
    /// Create a customer with a zero loyalty balance.
    pub fn new(
        id: CustomerId,
        phone: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Customer {
            id,
            phone: phone.into(),
            name: name.into(),
            email: email.into(),
            points: 0,
        }
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.points = points;
        self
    }
}

impl Record for Customer {
    type Key = CustomerId;

    fn record_key(&self) -> Self::Key {
        self.id.clone()
    }

    fn record_kind() -> &'static str {
        "customer"
    }

    fn header() -> &'static str {
        "CustomerID,Phone,Name,Email,LoyaltyPoints"
    }
}

// ============================================================================
// Invoice
// ============================================================================

/// A finalized invoice. Immutable once created: there is no edit operation,
/// corrections are made by issuing a new invoice.
///
/// `total` is the net amount after any loyalty discount; the discount itself
/// is not persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: InvoiceId,
    /// May dangle once the customer has been removed.
    pub customer_ref: CustomerId,
    pub date: NaiveDate,
    pub sub_total: Money,
    pub tax: Money,
    pub total: Money,
}

impl Invoice {
    /// Date rendered as `MM-DD-YYYY`.
    pub fn date_text(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

impl Record for Invoice {
    type Key = InvoiceId;

    fn record_key(&self) -> Self::Key {
        self.invoice_id.clone()
    }

    fn record_kind() -> &'static str {
        "invoice"
    }

    fn header() -> &'static str {
        "InvoiceNumber,CustomerID,Date,Subtotal,Tax,Total"
    }
}

/// Parse an `MM-DD-YYYY` date.
pub fn parse_date(raw: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| crate::Error::InvalidDate(raw.to_string()))
}

// ============================================================================
// Inventory item
// ============================================================================

/// Inventory record read by the catalog when pricing invoice lines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub unit_cost: Money,
    pub sale_price: Money,
    /// Signed: unchecked stock deduction may drive it below zero.
    pub on_hand: i64,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>, unit_cost: Money, sale_price: Money, on_hand: i64) -> Self {
        InventoryItem {
            name: name.into(),
            unit_cost,
            sale_price,
            on_hand,
        }
    }
}

impl Record for InventoryItem {
    type Key = String;

    fn record_key(&self) -> Self::Key {
        self.name.clone()
    }

    fn record_kind() -> &'static str {
        "inventory"
    }

    fn header() -> &'static str {
        "Item,CostPrice,SalePrice,Quantity"
    }
}
