//! # retail-ledger
//!
//! The record-keeping core of a small retail operation: customers with
//! loyalty-point balances, invoices priced against an inventory catalog, and
//! the comma-delimited files they persist to.
//!
//! ## Features
//!
//! - **Exact money:** fixed-point [`Money`], so `100.00 × 6.5 %` is `6.50`
//! - **Loyalty points:** redemption against a total and accrual on the net
//! - **Legacy files:** old customer lines without ids and invoices that
//!   reference customers by phone load without a schema marker
//! - **Lossy-tolerant loading:** malformed lines are dropped and logged,
//!   never fatal
//! - **Collision-free ids:** generated ids are guaranteed unique within the
//!   live collection
//! - **Pluggable storage:** CSV files on disk or in memory via [`store::RecordStore`]
//!
//! ## Quick Start
//!
//! ```
//! use retail_ledger::command::{InvoiceRequest, LineRequest};
//! use retail_ledger::entity::InventoryItem;
//! use retail_ledger::{LedgerConfig, LedgerService, Money};
//!
//! # fn main() -> retail_ledger::Result<()> {
//! let dir = std::env::temp_dir().join("retail-ledger-doc");
//! let config = LedgerConfig::default().with_data_dir(&dir);
//! let mut service = LedgerService::open(&config)?;
//! service.load_all();
//!
//! service.upsert_item(InventoryItem::new("Eggs", Money::from_cents(150), Money::from_cents(400), 48));
//! let ada = service.create_customer("555-0100", "Ada", "ada@example.com")?.id;
//!
//! let draft = service.open_invoice(&InvoiceRequest {
//!     date: "05-01-2024".to_string(),
//!     lines: vec![LineRequest::new("Eggs", 12)],
//! })?;
//! println!("{:?}", service.quote_invoice(&draft)?);
//!
//! let receipt = service.finalize_invoice(&ada, &draft, 0, true)?;
//! println!("{} earned {} points", receipt.invoice.invoice_id, receipt.points_earned);
//!
//! service.save_all()?;
//! # std::fs::remove_dir_all(&dir).ok();
//! # Ok(())
//! # }
//! ```
//!
//! ## Persisted format
//!
//! ```text
//! customers.csv   CustomerID,Phone,Name,Email,LoyaltyPoints
//! invoices.csv    InvoiceNumber,CustomerID,Date,Subtotal,Tax,Total
//! inventory.csv   Item,CostPrice,SalePrice,Quantity
//! ```
//!
//! Commas in free text are stored as semicolons. Dates are `MM-DD-YYYY`.

#[macro_use]
extern crate log;

pub mod catalog;
pub mod codec;
pub mod command;
pub mod config;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod key;
pub mod ledger;
pub mod money;
pub mod observability;
pub mod registry;
pub mod service;
pub mod store;

// Re-exports for convenience
pub use catalog::{Catalog, InMemoryCatalog};
pub use codec::LineCodec;
pub use command::{LedgerCommand, LedgerReply};
pub use config::LedgerConfig;
pub use entity::{Customer, CustomerId, InventoryItem, Invoice, InvoiceId, Record};
pub use error::{Error, Result};
pub use gateway::{LoadReport, PersistenceGateway};
pub use ledger::{InvoiceDraft, InvoiceLedger, Receipt};
pub use money::Money;
pub use registry::CustomerRegistry;
pub use service::LedgerService;
pub use store::RecordStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
