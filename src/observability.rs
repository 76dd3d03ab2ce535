//! Observability hooks for ledger operations.
//!
//! The core never fails on bad persisted data; it recovers and moves on.
//! [`LedgerMetrics`] is where those recoveries (and routine loads, saves and
//! finalized invoices) become visible.
//!
//! Default methods log through the `log` crate, so [`LogMetrics`] needs no
//! code at all. Implement the trait to feed your own monitoring:
//!
//! ```
//! use retail_ledger::observability::LedgerMetrics;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct DroppedLines(AtomicUsize);
//!
//! impl LedgerMetrics for DroppedLines {
//!     fn record_dropped_line(&self, _kind: &str, _line: &str) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//! ```
//!
//! [`NoOpMetrics`] silences everything, including the default log lines.

use crate::entity::{CustomerId, InvoiceId};
use crate::gateway::FileReport;
use crate::ledger::Receipt;
use std::time::Duration;

/// Hooks for ledger lifecycle events.
pub trait LedgerMetrics: Send + Sync {
    /// A record file was loaded.
    fn record_load(&self, kind: &str, report: &FileReport, duration: Duration) {
        debug!(
            "LOAD {}: {} loaded, {} dropped, {} legacy in {:?}",
            kind, report.loaded, report.dropped, report.legacy, duration
        );
    }

    /// A persisted line could not be decoded and was skipped.
    fn record_dropped_line(&self, kind: &str, line: &str) {
        warn!("Dropped malformed {} line: {}", kind, line);
    }

    /// A loaded invoice references no live customer.
    fn record_dangling(&self, invoice_id: &InvoiceId, customer_ref: &CustomerId) {
        warn!(
            "Invoice {} references unknown customer '{}'",
            invoice_id, customer_ref
        );
    }

    /// A record file was written.
    fn record_save(&self, kind: &str, records: usize, duration: Duration) {
        debug!("SAVE {}: {} records in {:?}", kind, records, duration);
    }

    /// Record an error.
    fn record_error(&self, kind: &str, error: &str) {
        warn!("ERROR for {}: {}", kind, error);
    }

    /// An invoice was finalized.
    fn record_invoice(&self, receipt: &Receipt) {
        debug!(
            "INVOICE {}: total {}, {} points redeemed, {} earned",
            receipt.invoice.invoice_id,
            receipt.invoice.total.format_currency(),
            receipt.redemption.points_used,
            receipt.points_earned
        );
    }
}

/// Default metrics implementation: everything goes to the `log` facade.
#[derive(Clone, Debug, Default)]
pub struct LogMetrics;

impl LedgerMetrics for LogMetrics {}

/// Metrics implementation that records nothing.
#[derive(Clone, Debug, Default)]
pub struct NoOpMetrics;

impl LedgerMetrics for NoOpMetrics {
    fn record_load(&self, _kind: &str, _report: &FileReport, _duration: Duration) {}
    fn record_dropped_line(&self, _kind: &str, _line: &str) {}
    fn record_dangling(&self, _invoice_id: &InvoiceId, _customer_ref: &CustomerId) {}
    fn record_save(&self, _kind: &str, _records: usize, _duration: Duration) {}
    fn record_error(&self, _kind: &str, _error: &str) {}
    fn record_invoice(&self, _receipt: &Receipt) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_are_object_safe() {
        let all: Vec<Box<dyn LedgerMetrics>> = vec![Box::new(LogMetrics), Box::new(NoOpMetrics)];
        for metrics in &all {
            metrics.record_dropped_line("customer", "garbage");
            metrics.record_save("customer", 0, Duration::from_millis(1));
            metrics.record_load("invoice", &FileReport::default(), Duration::ZERO);
        }
    }
}
