//! Persistence gateway: whole-collection load and save per entity type.
//!
//! Loading never fails. An absent file is an empty collection, an unreadable
//! file is an empty collection plus a warning, and malformed lines are
//! dropped one by one. Saving replaces each file wholesale and reports
//! storage errors to the caller.
//!
//! Customers must be loaded before invoices: an invoice's customer column is
//! resolved against the freshly loaded registry (id first, then legacy
//! phone), and whatever still does not match is kept as a dangling reference.

use crate::catalog::InMemoryCatalog;
use crate::codec::{CustomerRef, LineCodec};
use crate::entity::{Customer, Invoice, InventoryItem, Record};
use crate::error::Result;
use crate::ledger::InvoiceLedger;
use crate::observability::{LedgerMetrics, LogMetrics};
use crate::registry::CustomerRegistry;
use crate::store::{data_lines, RecordStore};
use std::sync::Arc;
use std::time::Instant;

/// Names of the record files, one per entity type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordFiles {
    pub customers: String,
    pub invoices: String,
    pub inventory: String,
}

impl Default for RecordFiles {
    fn default() -> Self {
        RecordFiles {
            customers: "customers.csv".to_string(),
            invoices: "invoices.csv".to_string(),
            inventory: "inventory.csv".to_string(),
        }
    }
}

/// Outcome of loading one record file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileReport {
    /// Records added to the collection.
    pub loaded: usize,
    /// Malformed lines skipped.
    pub dropped: usize,
    /// Records in an older shape (customers without id, invoices
    /// referencing a phone).
    pub legacy: usize,
    /// Invoices whose customer matched nothing.
    pub dangling: usize,
    /// The file did not exist.
    pub absent: bool,
    /// The file existed but could not be read.
    pub failed: bool,
}

/// Outcome of [`PersistenceGateway::load_all`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub customers: FileReport,
    pub invoices: FileReport,
    pub inventory: FileReport,
}

impl LoadReport {
    /// Malformed lines skipped across all files.
    pub fn dropped(&self) -> usize {
        self.customers.dropped + self.invoices.dropped + self.inventory.dropped
    }
}

/// Moves collections between memory and a [`RecordStore`].
pub struct PersistenceGateway<S: RecordStore> {
    store: S,
    files: RecordFiles,
    metrics: Arc<dyn LedgerMetrics>,
}

impl<S: RecordStore> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        PersistenceGateway {
            store,
            files: RecordFiles::default(),
            metrics: Arc::new(LogMetrics),
        }
    }

    pub fn with_files(mut self, files: RecordFiles) -> Self {
        self.files = files;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn LedgerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn files(&self) -> &RecordFiles {
        &self.files
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// Replace the registry's contents with the customer file.
    pub fn load_customers(&self, registry: &mut CustomerRegistry) -> FileReport {
        let start = Instant::now();
        registry.clear();
        let (lines, mut report) = self.read_records::<Customer>(&self.files.customers);

        let mut batch = Vec::with_capacity(lines.len());
        for line in &lines {
            match Customer::decode(line) {
                Some(decoded) => batch.push(decoded),
                None => self.drop_line::<Customer>(line, &mut report),
            }
        }

        let count = batch.len();
        match registry.insert_loaded(batch) {
            Ok(legacy) => {
                report.loaded = count;
                report.legacy = legacy;
            }
            Err(e) => {
                self.metrics
                    .record_error(Customer::record_kind(), &e.to_string());
                report.loaded = registry.len();
                report.dropped += count - registry.len();
            }
        }

        self.metrics
            .record_load(Customer::record_kind(), &report, start.elapsed());
        report
    }

    /// Replace the ledger's invoices with the invoice file, resolving each
    /// customer column against `registry`.
    pub fn load_invoices(&self, ledger: &mut InvoiceLedger, registry: &CustomerRegistry) -> FileReport {
        let start = Instant::now();
        ledger.clear();
        let (lines, mut report) = self.read_records::<Invoice>(&self.files.invoices);

        for line in &lines {
            let Some(raw) = Invoice::decode(line) else {
                self.drop_line::<Invoice>(line, &mut report);
                continue;
            };

            let (invoice, customer_ref) = raw.resolve(registry);
            match &customer_ref {
                CustomerRef::ById(_) => {}
                CustomerRef::ByPhone(_) => report.legacy += 1,
                CustomerRef::Dangling(token) => {
                    self.metrics.record_dangling(&invoice.invoice_id, token);
                    report.dangling += 1;
                }
            }
            ledger.insert_loaded(invoice);
            report.loaded += 1;
        }

        self.metrics
            .record_load(Invoice::record_kind(), &report, start.elapsed());
        report
    }

    /// Replace the catalog's contents with the inventory file.
    pub fn load_inventory(&self, catalog: &mut InMemoryCatalog) -> FileReport {
        let start = Instant::now();
        catalog.clear();
        let (lines, mut report) = self.read_records::<InventoryItem>(&self.files.inventory);

        for line in &lines {
            match InventoryItem::decode(line) {
                Some(item) => {
                    catalog.insert(item);
                    report.loaded += 1;
                }
                None => self.drop_line::<InventoryItem>(line, &mut report),
            }
        }

        self.metrics
            .record_load(InventoryItem::record_kind(), &report, start.elapsed());
        report
    }

    /// Load every collection, customers first.
    pub fn load_all(
        &self,
        registry: &mut CustomerRegistry,
        ledger: &mut InvoiceLedger,
        catalog: &mut InMemoryCatalog,
    ) -> LoadReport {
        let customers = self.load_customers(registry);
        let invoices = self.load_invoices(ledger, registry);
        let inventory = self.load_inventory(catalog);
        LoadReport {
            customers,
            invoices,
            inventory,
        }
    }

    fn read_records<R: Record>(&self, file: &str) -> (Vec<String>, FileReport) {
        let mut report = FileReport::default();
        match self.store.read_lines(file) {
            Ok(Some(lines)) => (data_lines(lines, R::header()), report),
            Ok(None) => {
                debug!("No {} file '{}', starting empty", R::record_kind(), file);
                report.absent = true;
                (Vec::new(), report)
            }
            Err(e) => {
                self.metrics.record_error(R::record_kind(), &e.to_string());
                report.failed = true;
                (Vec::new(), report)
            }
        }
    }

    fn drop_line<R: Record>(&self, line: &str, report: &mut FileReport) {
        self.metrics.record_dropped_line(R::record_kind(), line);
        report.dropped += 1;
    }

    // ========================================================================
    // Save
    // ========================================================================

    /// # Errors
    /// Returns `Error::Storage` if the file cannot be written
    pub fn save_customers(&mut self, registry: &CustomerRegistry) -> Result<()> {
        let file = self.files.customers.clone();
        self.save_records(&file, registry.list())
    }

    /// # Errors
    /// Returns `Error::Storage` if the file cannot be written
    pub fn save_invoices(&mut self, ledger: &InvoiceLedger) -> Result<()> {
        let file = self.files.invoices.clone();
        self.save_records(&file, ledger.all())
    }

    /// # Errors
    /// Returns `Error::Storage` if the file cannot be written
    pub fn save_inventory(&mut self, catalog: &InMemoryCatalog) -> Result<()> {
        let file = self.files.inventory.clone();
        self.save_records(&file, catalog.items())
    }

    /// Save every collection.
    ///
    /// Each file is attempted even if an earlier one fails.
    ///
    /// # Errors
    /// Returns the first storage error encountered
    pub fn save_all(
        &mut self,
        registry: &CustomerRegistry,
        ledger: &InvoiceLedger,
        catalog: &InMemoryCatalog,
    ) -> Result<()> {
        let customers = self.save_customers(registry);
        let invoices = self.save_invoices(ledger);
        let inventory = self.save_inventory(catalog);
        customers.and(invoices).and(inventory)
    }

    fn save_records<R: Record + LineCodec>(&mut self, file: &str, records: &[R]) -> Result<()> {
        let start = Instant::now();
        let lines: Vec<String> = records.iter().map(|record| record.encode()).collect();

        match self.store.write_lines(file, R::header(), &lines) {
            Ok(()) => {
                self.metrics
                    .record_save(R::record_kind(), lines.len(), start.elapsed());
                Ok(())
            }
            Err(e) => {
                self.metrics.record_error(R::record_kind(), &e.to_string());
                Err(e)
            }
        }
    }
}
