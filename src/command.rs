//! Shell requests as a closed set of commands.
//!
//! A presentation shell turns user input into a [`LedgerCommand`] and hands
//! it to [`crate::LedgerService::dispatch`], which answers with a
//! [`LedgerReply`]. Every ledger operation has exactly one variant, so a
//! shell cannot ask for something the core does not do.
//!
//! ```
//! use retail_ledger::command::{LedgerCommand, LedgerReply};
//! use retail_ledger::store::InMemoryStore;
//! use retail_ledger::LedgerService;
//!
//! # fn main() -> retail_ledger::Result<()> {
//! let mut service = LedgerService::new(InMemoryStore::new());
//! let reply = service.dispatch(LedgerCommand::CreateCustomer {
//!     phone: "555-0100".to_string(),
//!     name: "Ada".to_string(),
//!     email: "ada@example.com".to_string(),
//! })?;
//! assert!(matches!(reply, LedgerReply::Customer(_)));
//! # Ok(())
//! # }
//! ```

use crate::entity::{Customer, CustomerId, Invoice};
use crate::gateway::LoadReport;
use crate::ledger::{InvoiceView, Quote, Receipt, Redemption};
use crate::money::Money;
use crate::registry::CustomerEdit;
use rust_decimal::Decimal;
use std::fmt;

/// One requested invoice line, priced from the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineRequest {
    pub item: String,
    pub quantity: i64,
}

impl LineRequest {
    pub fn new(item: impl Into<String>, quantity: i64) -> Self {
        LineRequest {
            item: item.into(),
            quantity,
        }
    }
}

/// An invoice as the shell collected it: a `MM-DD-YYYY` date and lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvoiceRequest {
    pub date: String,
    pub lines: Vec<LineRequest>,
}

/// A request from the presentation shell.
#[derive(Clone, Debug)]
pub enum LedgerCommand {
    CreateCustomer {
        phone: String,
        name: String,
        email: String,
    },
    EditCustomer {
        id: CustomerId,
        edit: CustomerEdit,
    },
    RemoveCustomer {
        id: CustomerId,
    },
    ListCustomers,
    AdjustLoyaltyPoints {
        id: CustomerId,
        delta: i64,
    },
    QuoteInvoice(InvoiceRequest),
    /// Redeem points against a total outside of finalize.
    ApplyLoyaltyDiscount {
        id: CustomerId,
        total: Money,
        points: u32,
    },
    FinalizeInvoice {
        customer: CustomerId,
        request: InvoiceRequest,
        redeem_points: u32,
        /// Take the quantities out of stock after finalizing.
        deduct_stock: bool,
    },
    ListInvoices,
    SetTaxRate {
        rate: Decimal,
    },
    LoadAll,
    SaveAll,
}

impl LedgerCommand {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerCommand::CreateCustomer { .. } => "create_customer",
            LedgerCommand::EditCustomer { .. } => "edit_customer",
            LedgerCommand::RemoveCustomer { .. } => "remove_customer",
            LedgerCommand::ListCustomers => "list_customers",
            LedgerCommand::AdjustLoyaltyPoints { .. } => "adjust_loyalty_points",
            LedgerCommand::QuoteInvoice(_) => "quote_invoice",
            LedgerCommand::ApplyLoyaltyDiscount { .. } => "apply_loyalty_discount",
            LedgerCommand::FinalizeInvoice { .. } => "finalize_invoice",
            LedgerCommand::ListInvoices => "list_invoices",
            LedgerCommand::SetTaxRate { .. } => "set_tax_rate",
            LedgerCommand::LoadAll => "load_all",
            LedgerCommand::SaveAll => "save_all",
        }
    }

    /// Whether the command changes in-memory state.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            LedgerCommand::ListCustomers
                | LedgerCommand::QuoteInvoice(_)
                | LedgerCommand::ListInvoices
                | LedgerCommand::SaveAll
        )
    }
}

impl fmt::Display for LedgerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An invoice joined to its customer, owned so it can leave the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvoiceSummary {
    pub invoice: Invoice,
    pub customer_name: String,
    pub customer_phone: String,
    pub dangling: bool,
}

impl From<InvoiceView<'_>> for InvoiceSummary {
    fn from(view: InvoiceView<'_>) -> Self {
        InvoiceSummary {
            invoice: view.invoice.clone(),
            customer_name: view.customer_name().to_string(),
            customer_phone: view.customer_phone().to_string(),
            dangling: view.is_dangling(),
        }
    }
}

/// The answer to a [`LedgerCommand`].
#[derive(Clone, Debug, PartialEq)]
pub enum LedgerReply {
    Customer(Customer),
    Customers(Vec<Customer>),
    Removed(Customer),
    Points(u32),
    Quote(Quote),
    Redemption(Redemption),
    Receipt(Receipt),
    Invoices(Vec<InvoiceSummary>),
    TaxRate(Decimal),
    Loaded(LoadReport),
    Saved,
}
