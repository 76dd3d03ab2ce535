//! Comma-delimited record codec.
//!
//! Every persisted entity is a single line of comma-separated fields:
//!
//! ```text
//! customer   id,phone,name,email,points        (legacy: phone,name,email,points)
//! invoice    invoiceId,customerRef,date,subTotal,tax,total
//! inventory  name,unitCost,salePrice,onHand
//! ```
//!
//! Free-text fields have commas replaced with semicolons before encoding.
//! The escape is one-directional: decoding never restores commas.
//!
//! Decoding is lossy by policy. A line with fewer fields than the smallest
//! known shape decodes to `None` and is skipped by the caller; numeric fields
//! that do not parse default to zero. Neither case fails the surrounding load.
//!
//! There is no schema-version marker. Customer shapes are told apart by
//! field count, and the invoice customer column is resolved against the
//! loaded customers (see [`resolve_customer_ref`]).
//!
//! # Example
//!
//! ```rust
//! use retail_ledger::codec::{DecodedCustomer, LineCodec};
//! use retail_ledger::entity::{Customer, CustomerId};
//!
//! let customer = Customer::new(CustomerId::new("7"), "555-0100", "Doe, Jane", "jd@example.com")
//!     .with_points(12);
//! let line = customer.encode();
//! assert_eq!(line, "7,555-0100,Doe; Jane,jd@example.com,12");
//!
//! match Customer::decode(&line) {
//!     Some(DecodedCustomer::Current(decoded)) => assert_eq!(decoded.name, "Doe; Jane"),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use crate::entity::{Customer, CustomerId, InventoryItem, Invoice, InvoiceId, DATE_FORMAT};
use crate::money::Money;
use chrono::NaiveDate;

/// Field separator of every persisted line.
pub const FIELD_SEPARATOR: char = ',';

/// Replacement written in place of a separator found in free text.
pub const ESCAPE_REPLACEMENT: char = ';';

/// Field count of the legacy customer shape (no id column).
pub const LEGACY_CUSTOMER_FIELDS: usize = 4;

/// Field count of the current customer shape.
pub const CUSTOMER_FIELDS: usize = 5;

/// Minimum field count of an invoice line.
pub const INVOICE_FIELDS: usize = 6;

/// Minimum field count of an inventory line.
pub const INVENTORY_FIELDS: usize = 4;

/// Encode/decode a record to and from one persisted line.
pub trait LineCodec: Sized {
    /// What a line decodes into before any collection-level fix-ups.
    type Decoded;

    /// Encode the record as a single line without a trailing newline.
    fn encode(&self) -> String;

    /// Decode a line. `None` means the line is malformed and must be skipped.
    fn decode(line: &str) -> Option<Self::Decoded>;
}

/// Replace separators in free text so the field count survives a round trip.
pub fn escape(text: &str) -> String {
    text.replace(FIELD_SEPARATOR, &ESCAPE_REPLACEMENT.to_string())
}

/// Split a line into fields, keeping empty trailing fields.
pub fn split_fields(line: &str) -> Vec<&str> {
    line.split(FIELD_SEPARATOR).collect()
}

/// Parse a loyalty balance, clamping into `u32` and defaulting to zero.
pub fn parse_points(raw: &str) -> u32 {
    match raw.trim().parse::<i64>() {
        Ok(value) => value.clamp(0, u32::MAX as i64) as u32,
        Err(_) => {
            warn!("Non-numeric points value '{}' defaulted to 0", raw);
            0
        }
    }
}

/// Parse a stock quantity, defaulting to zero.
pub fn parse_quantity(raw: &str) -> i64 {
    raw.trim().parse::<i64>().unwrap_or_else(|_| {
        warn!("Non-numeric quantity '{}' defaulted to 0", raw);
        0
    })
}

// ============================================================================
// Customer
// ============================================================================

/// A decoded customer line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedCustomer {
    /// Current shape; the id is taken verbatim from the first column.
    Current(Customer),
    /// Legacy shape without an id; one must be generated at load time.
    Legacy {
        phone: String,
        name: String,
        email: String,
        points: u32,
    },
}

impl DecodedCustomer {
    /// Finish decoding, using `id` only for the legacy shape.
    pub fn into_customer(self, id: CustomerId) -> Customer {
        match self {
            DecodedCustomer::Current(customer) => customer,
            DecodedCustomer::Legacy {
                phone,
                name,
                email,
                points,
            } => Customer {
                id,
                phone,
                name,
                email,
                points,
            },
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, DecodedCustomer::Legacy { .. })
    }
}

impl LineCodec for Customer {
    type Decoded = DecodedCustomer;

    fn encode(&self) -> String {
        format!(
            "{},{},{},{},{}",
            escape(self.id.as_str()),
            escape(&self.phone),
            escape(&self.name),
            escape(&self.email),
            self.points
        )
    }

    fn decode(line: &str) -> Option<DecodedCustomer> {
        let fields = split_fields(line);
        match fields.len() {
            LEGACY_CUSTOMER_FIELDS => Some(DecodedCustomer::Legacy {
                phone: fields[0].to_string(),
                name: fields[1].to_string(),
                email: fields[2].to_string(),
                points: parse_points(fields[3]),
            }),
            n if n >= CUSTOMER_FIELDS => Some(DecodedCustomer::Current(Customer {
                id: CustomerId::new(fields[0]),
                phone: fields[1].to_string(),
                name: fields[2].to_string(),
                email: fields[3].to_string(),
                points: parse_points(fields[4]),
            })),
            _ => None,
        }
    }
}

// ============================================================================
// Invoice
// ============================================================================

/// Lookups needed to resolve the invoice customer column.
pub trait CustomerLookup {
    /// Exact id match.
    fn customer_by_id(&self, id: &str) -> Option<&Customer>;

    /// Case-insensitive phone match.
    fn customer_by_phone(&self, phone: &str) -> Option<&Customer>;
}

/// How an invoice customer token was resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CustomerRef {
    /// The token is a live customer id.
    ById(CustomerId),
    /// The token is a legacy phone number of a live customer.
    ByPhone(CustomerId),
    /// Nothing matched; the raw token is kept as a dangling reference.
    Dangling(CustomerId),
}

impl CustomerRef {
    pub fn customer_id(&self) -> &CustomerId {
        match self {
            CustomerRef::ById(id) | CustomerRef::ByPhone(id) | CustomerRef::Dangling(id) => id,
        }
    }

    pub fn into_customer_id(self) -> CustomerId {
        match self {
            CustomerRef::ById(id) | CustomerRef::ByPhone(id) | CustomerRef::Dangling(id) => id,
        }
    }
}

/// Resolve an invoice customer token: id first, then phone, else keep the
/// raw token.
pub fn resolve_customer_ref<L: CustomerLookup + ?Sized>(token: &str, lookup: &L) -> CustomerRef {
    let token = token.trim();
    if let Some(customer) = lookup.customer_by_id(token) {
        return CustomerRef::ById(customer.id.clone());
    }
    if let Some(customer) = lookup.customer_by_phone(token) {
        return CustomerRef::ByPhone(customer.id.clone());
    }
    CustomerRef::Dangling(CustomerId::new(token))
}

/// A decoded invoice line whose customer column is not yet resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawInvoice {
    pub invoice_id: InvoiceId,
    pub customer_token: String,
    pub date: NaiveDate,
    pub sub_total: Money,
    pub tax: Money,
    pub total: Money,
}

impl RawInvoice {
    /// Resolve the customer column against the loaded customers.
    pub fn resolve<L: CustomerLookup + ?Sized>(self, lookup: &L) -> (Invoice, CustomerRef) {
        let customer_ref = resolve_customer_ref(&self.customer_token, lookup);
        let invoice = Invoice {
            invoice_id: self.invoice_id,
            customer_ref: customer_ref.customer_id().clone(),
            date: self.date,
            sub_total: self.sub_total,
            tax: self.tax,
            total: self.total,
        };
        (invoice, customer_ref)
    }
}

impl LineCodec for Invoice {
    type Decoded = RawInvoice;

    fn encode(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            escape(self.invoice_id.as_str()),
            escape(self.customer_ref.as_str()),
            self.date_text(),
            self.sub_total,
            self.tax,
            self.total
        )
    }

    fn decode(line: &str) -> Option<RawInvoice> {
        let fields = split_fields(line);
        if fields.len() < INVOICE_FIELDS {
            return None;
        }

        let date = match NaiveDate::parse_from_str(fields[2].trim(), DATE_FORMAT) {
            Ok(date) => date,
            Err(_) => {
                warn!(
                    "Invoice '{}' has malformed date '{}', skipping line",
                    fields[0], fields[2]
                );
                return None;
            }
        };

        Some(RawInvoice {
            invoice_id: InvoiceId::new(fields[0]),
            customer_token: fields[1].trim().to_string(),
            date,
            sub_total: Money::parse_or_zero(fields[3]),
            tax: Money::parse_or_zero(fields[4]),
            total: Money::parse_or_zero(fields[5]),
        })
    }
}

// ============================================================================
// Inventory
// ============================================================================

impl LineCodec for InventoryItem {
    type Decoded = InventoryItem;

    fn encode(&self) -> String {
        format!(
            "{},{},{},{}",
            escape(&self.name),
            self.unit_cost,
            self.sale_price,
            self.on_hand
        )
    }

    fn decode(line: &str) -> Option<InventoryItem> {
        let fields = split_fields(line);
        if fields.len() < INVENTORY_FIELDS {
            return None;
        }
        Some(InventoryItem {
            name: fields[0].to_string(),
            unit_cost: Money::parse_or_zero(fields[1]),
            sale_price: Money::parse_or_zero(fields[2]),
            on_hand: parse_quantity(fields[3]),
        })
    }
}
