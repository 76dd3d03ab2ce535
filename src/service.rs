//! High-level ledger service: the API surface a presentation shell calls.
//!
//! [`LedgerService`] owns the whole session state (customers, invoices,
//! inventory) together with the gateway that persists it. Nothing is global;
//! two services over two stores never see each other.

use crate::catalog::{Catalog, InMemoryCatalog};
use crate::command::{InvoiceRequest, InvoiceSummary, LedgerCommand, LedgerReply};
use crate::config::LedgerConfig;
use crate::entity::{parse_date, Customer, CustomerId, InventoryItem, Invoice};
use crate::error::{Error, Result};
use crate::gateway::{LoadReport, PersistenceGateway};
use crate::key::{IdGenerator, IdSpace};
use crate::ledger::{InvoiceDraft, InvoiceLedger, InvoiceView, Quote, Receipt, Redemption};
use crate::money::Money;
use crate::observability::{LedgerMetrics, LogMetrics};
use crate::registry::{CustomerEdit, CustomerRegistry};
use crate::store::{FileStore, RecordStore};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Placeholder contact details of a walk-in customer.
pub const WALK_IN_CONTACT: &str = "N/A";

/// Who an invoice is for, as resolved from what the shell typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvoiceCustomer {
    /// An existing customer matched by name.
    Registered(CustomerId),
    /// A customer account created on the spot.
    Created(CustomerId),
    /// A one-off customer that is never added to the registry. Invoices
    /// issued to it are dangling from the start.
    WalkIn(Customer),
}

/// The ledger for one session.
///
/// # Example
///
/// ```
/// use retail_ledger::command::{InvoiceRequest, LineRequest};
/// use retail_ledger::entity::InventoryItem;
/// use retail_ledger::money::Money;
/// use retail_ledger::store::InMemoryStore;
/// use retail_ledger::LedgerService;
///
/// # fn main() -> retail_ledger::Result<()> {
/// let mut service = LedgerService::new(InMemoryStore::new());
/// service.upsert_item(InventoryItem::new("Hay", Money::from_cents(500), Money::from_cents(2000), 10));
///
/// let ada = service.create_customer("555-0100", "Ada", "ada@example.com")?.id;
/// let draft = service.open_invoice(&InvoiceRequest {
///     date: "05-01-2024".to_string(),
///     lines: vec![LineRequest::new("Hay", 5)],
/// })?;
/// let receipt = service.finalize_invoice(&ada, &draft, 0, true)?;
///
/// assert_eq!(receipt.invoice.total.format_currency(), "$106.50");
/// assert_eq!(receipt.points_balance, 10);
/// service.save_all()?;
/// # Ok(())
/// # }
/// ```
pub struct LedgerService<S: RecordStore> {
    registry: CustomerRegistry,
    ledger: InvoiceLedger,
    catalog: InMemoryCatalog,
    gateway: PersistenceGateway<S>,
    metrics: Arc<dyn LedgerMetrics>,
}

impl LedgerService<FileStore> {
    /// Service over CSV files in `config.data_dir`. Nothing is loaded yet.
    pub fn open(config: &LedgerConfig) -> Result<Self> {
        Self::with_config(FileStore::new(&config.data_dir), config)
    }
}

impl<S: RecordStore> LedgerService<S> {
    /// Service with default settings.
    pub fn new(store: S) -> Self {
        let metrics: Arc<dyn LedgerMetrics> = Arc::new(LogMetrics);
        LedgerService {
            registry: CustomerRegistry::new(),
            ledger: InvoiceLedger::new(),
            catalog: InMemoryCatalog::new(),
            gateway: PersistenceGateway::new(store).with_metrics(metrics.clone()),
            metrics,
        }
    }

    /// Service with validated settings.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if the config does not validate
    pub fn with_config(store: S, config: &LedgerConfig) -> Result<Self> {
        config.validate()?;

        let generator = |space: IdSpace, salt: u64| {
            let ids = match config.id_seed {
                Some(seed) => IdGenerator::with_seed(space, seed ^ salt),
                None => IdGenerator::new(space),
            };
            ids.with_attempts(config.id_attempts)
        };

        let mut ledger = InvoiceLedger::with_generator(generator(IdSpace::INVOICE, 1))
            .with_point_value(config.point_value)
            .with_accrual_unit(config.accrual_unit);
        ledger.set_tax_rate(config.tax_rate)?;

        let metrics: Arc<dyn LedgerMetrics> = Arc::new(LogMetrics);
        Ok(LedgerService {
            registry: CustomerRegistry::with_generator(generator(IdSpace::CUSTOMER, 0)),
            ledger,
            catalog: InMemoryCatalog::new(),
            gateway: PersistenceGateway::new(store)
                .with_files(config.record_files())
                .with_metrics(metrics.clone()),
            metrics,
        })
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn LedgerMetrics>) -> Self {
        self.gateway = self.gateway.with_metrics(metrics.clone());
        self.metrics = metrics;
        self
    }

    pub fn registry(&self) -> &CustomerRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &InvoiceLedger {
        &self.ledger
    }

    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        self.gateway.store()
    }

    // ========================================================================
    // Customers
    // ========================================================================

    /// # Errors
    ///
    /// - `Error::DuplicatePhone` if the phone is taken
    /// - `Error::IdSpaceExhausted` if no customer id is free
    pub fn create_customer(&mut self, phone: &str, name: &str, email: &str) -> Result<Customer> {
        self.registry.create(phone, name, email).cloned()
    }

    pub fn edit_customer(&mut self, id: &CustomerId, edit: CustomerEdit) -> Result<Customer> {
        self.registry.edit(id, edit).cloned()
    }

    /// Remove a customer. Their invoices stay and list as unknown.
    ///
    /// # Errors
    /// Returns `Error::CustomerNotFound` if the id is not live
    pub fn remove_customer(&mut self, id: &CustomerId) -> Result<Customer> {
        self.registry
            .remove(id)
            .ok_or_else(|| Error::CustomerNotFound(id.to_string()))
    }

    pub fn list_customers(&self) -> &[Customer] {
        self.registry.list()
    }

    pub fn find_customer(&self, id: &CustomerId) -> Option<&Customer> {
        self.registry.find_by_id(id)
    }

    pub fn find_customer_by_phone(&self, phone: &str) -> Option<&Customer> {
        self.registry.find_by_phone(phone)
    }

    pub fn find_customer_by_name(&self, name: &str) -> Option<&Customer> {
        self.registry.find_by_name(name)
    }

    /// Add a signed number of points, flooring at zero.
    pub fn adjust_loyalty_points(&mut self, id: &CustomerId, delta: i64) -> Result<u32> {
        self.registry.adjust_points(id, delta)
    }

    /// Replace a balance outright.
    pub fn set_loyalty_points(&mut self, id: &CustomerId, points: u32) -> Result<u32> {
        self.registry.set_points(id, points)
    }

    /// Work out who an invoice is for.
    ///
    /// A name match wins. Otherwise, with a phone, a new account is created;
    /// without one the invoice goes to a walk-in customer that is never
    /// registered.
    ///
    /// # Errors
    /// Returns `Error::DuplicatePhone` if the phone belongs to another customer
    pub fn resolve_invoice_customer(
        &mut self,
        name: &str,
        phone: Option<&str>,
        email: &str,
    ) -> Result<InvoiceCustomer> {
        if let Some(customer) = self.registry.find_by_name(name.trim()) {
            return Ok(InvoiceCustomer::Registered(customer.id.clone()));
        }

        match phone.map(str::trim).filter(|p| !p.is_empty()) {
            Some(phone) => {
                let customer = self.registry.create(phone, name, email)?;
                Ok(InvoiceCustomer::Created(customer.id.clone()))
            }
            None => {
                let id = self.registry.generate_id()?;
                self.registry.retire_id(&id);
                debug!("Walk-in customer '{}' assigned {}", name, id);
                Ok(InvoiceCustomer::WalkIn(Customer::new(
                    id,
                    WALK_IN_CONTACT,
                    crate::codec::escape(name.trim()),
                    WALK_IN_CONTACT,
                )))
            }
        }
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    /// Add or replace an inventory item.
    pub fn upsert_item(&mut self, item: InventoryItem) {
        self.catalog.insert(item);
    }

    // ========================================================================
    // Invoices
    // ========================================================================

    /// Build an open invoice, pricing and stock-checking every line.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidDate` if the date is not `MM-DD-YYYY`
    /// - any error of [`InvoiceDraft::add_line`]
    pub fn open_invoice(&self, request: &InvoiceRequest) -> Result<InvoiceDraft> {
        let mut draft = InvoiceDraft::new(parse_date(&request.date)?);
        for line in &request.lines {
            draft.add_line(&self.catalog, &line.item, line.quantity)?;
        }
        Ok(draft)
    }

    /// Price a draft at the current tax rate.
    ///
    /// # Errors
    /// Returns `Error::AmountOverflow` if the draft's totals do not fit
    pub fn quote_invoice(&self, draft: &InvoiceDraft) -> Result<Quote> {
        self.ledger.quote(&draft.priced())
    }

    /// Redeem points against `total`, deducting them from the customer.
    pub fn apply_loyalty_discount(
        &mut self,
        id: &CustomerId,
        total: Money,
        requested: u32,
    ) -> Result<Redemption> {
        let customer = self
            .registry
            .find_by_id_mut(id)
            .ok_or_else(|| Error::CustomerNotFound(id.to_string()))?;
        Ok(self.ledger.apply_loyalty_discount(customer, total, requested))
    }

    /// Most points `id` could redeem against `total`.
    pub fn max_redeemable(&self, id: &CustomerId, total: Money) -> Result<u32> {
        let customer = self
            .registry
            .find_by_id(id)
            .ok_or_else(|| Error::CustomerNotFound(id.to_string()))?;
        Ok(self.ledger.max_redeemable(customer, total))
    }

    /// Finalize a draft for a registered customer.
    ///
    /// With `deduct_stock` the draft's quantities are then taken out of the
    /// catalog, unchecked.
    pub fn finalize_invoice(
        &mut self,
        id: &CustomerId,
        draft: &InvoiceDraft,
        redeem_points: u32,
        deduct_stock: bool,
    ) -> Result<Receipt> {
        let customer = self
            .registry
            .find_by_id_mut(id)
            .ok_or_else(|| Error::CustomerNotFound(id.to_string()))?;
        let receipt = self.ledger.finalize(customer, draft, redeem_points)?;
        self.after_finalize(draft, &receipt, deduct_stock)?;
        Ok(receipt)
    }

    /// Finalize a draft for a resolved invoice customer. Walk-in customers
    /// have no points to redeem and keep none they earn.
    pub fn finalize_for(
        &mut self,
        customer: InvoiceCustomer,
        draft: &InvoiceDraft,
        redeem_points: u32,
        deduct_stock: bool,
    ) -> Result<Receipt> {
        match customer {
            InvoiceCustomer::Registered(id) | InvoiceCustomer::Created(id) => {
                self.finalize_invoice(&id, draft, redeem_points, deduct_stock)
            }
            InvoiceCustomer::WalkIn(mut walk_in) => {
                let receipt = self.ledger.finalize(&mut walk_in, draft, 0)?;
                self.after_finalize(draft, &receipt, deduct_stock)?;
                Ok(receipt)
            }
        }
    }

    fn after_finalize(&mut self, draft: &InvoiceDraft, receipt: &Receipt, deduct_stock: bool) -> Result<()> {
        self.metrics.record_invoice(receipt);
        if deduct_stock {
            InvoiceLedger::deduct_stock(draft, &mut self.catalog)?;
        }
        Ok(())
    }

    /// Take a finalized draft's quantities out of stock, if that was not
    /// done at finalize time.
    pub fn deduct_stock(&mut self, draft: &InvoiceDraft) -> Result<()> {
        InvoiceLedger::deduct_stock(draft, &mut self.catalog)
    }

    /// Stock on hand for an item.
    pub fn on_hand(&self, item: &str) -> Result<i64> {
        self.catalog.on_hand(item)
    }

    /// All invoices in creation order, joined to their customers.
    pub fn list_invoices(&self) -> Vec<InvoiceView<'_>> {
        self.ledger.views(&self.registry)
    }

    pub fn invoices_for(&self, id: &CustomerId) -> Vec<&Invoice> {
        self.ledger.find_by_customer(id)
    }

    pub fn tax_rate(&self) -> Decimal {
        self.ledger.tax_rate()
    }

    /// Set the tax rate as a fraction in `[0, 1]`.
    pub fn set_tax_rate(&mut self, rate: Decimal) -> Result<()> {
        self.ledger.set_tax_rate(rate)
    }

    /// Set the tax rate from a percentage in `[0, 100]`.
    pub fn set_tax_rate_percent(&mut self, percent: Decimal) -> Result<()> {
        self.set_tax_rate(percent / Decimal::ONE_HUNDRED)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Replace all in-memory state with what the store holds.
    ///
    /// Every customer id an invoice refers to is retired, so a dangling
    /// reference never attaches to a customer created later.
    pub fn load_all(&mut self) -> LoadReport {
        let report = self
            .gateway
            .load_all(&mut self.registry, &mut self.ledger, &mut self.catalog);
        for invoice in self.ledger.all() {
            self.registry.retire_id(&invoice.customer_ref);
        }
        report
    }

    /// # Errors
    /// Returns the first `Error::Storage` hit; the other files are still written
    pub fn save_all(&mut self) -> Result<()> {
        self.gateway
            .save_all(&self.registry, &self.ledger, &self.catalog)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Execute a shell command.
    pub fn dispatch(&mut self, command: LedgerCommand) -> Result<LedgerReply> {
        debug!(
            "Dispatching {} ({})",
            command,
            if command.is_mutating() { "mutating" } else { "read-only" }
        );
        match command {
            LedgerCommand::CreateCustomer { phone, name, email } => self
                .create_customer(&phone, &name, &email)
                .map(LedgerReply::Customer),
            LedgerCommand::EditCustomer { id, edit } => {
                self.edit_customer(&id, edit).map(LedgerReply::Customer)
            }
            LedgerCommand::RemoveCustomer { id } => {
                self.remove_customer(&id).map(LedgerReply::Removed)
            }
            LedgerCommand::ListCustomers => Ok(LedgerReply::Customers(self.list_customers().to_vec())),
            LedgerCommand::AdjustLoyaltyPoints { id, delta } => self
                .adjust_loyalty_points(&id, delta)
                .map(LedgerReply::Points),
            LedgerCommand::QuoteInvoice(request) => {
                let draft = self.open_invoice(&request)?;
                self.quote_invoice(&draft).map(LedgerReply::Quote)
            }
            LedgerCommand::ApplyLoyaltyDiscount { id, total, points } => self
                .apply_loyalty_discount(&id, total, points)
                .map(LedgerReply::Redemption),
            LedgerCommand::FinalizeInvoice {
                customer,
                request,
                redeem_points,
                deduct_stock,
            } => {
                let draft = self.open_invoice(&request)?;
                self.finalize_invoice(&customer, &draft, redeem_points, deduct_stock)
                    .map(LedgerReply::Receipt)
            }
            LedgerCommand::ListInvoices => Ok(LedgerReply::Invoices(
                self.list_invoices()
                    .into_iter()
                    .map(InvoiceSummary::from)
                    .collect(),
            )),
            LedgerCommand::SetTaxRate { rate } => {
                self.set_tax_rate(rate)?;
                Ok(LedgerReply::TaxRate(rate))
            }
            LedgerCommand::LoadAll => Ok(LedgerReply::Loaded(self.load_all())),
            LedgerCommand::SaveAll => self.save_all().map(|()| LedgerReply::Saved),
        }
    }
}
