//! Performance benchmarks for retail-ledger
//!
//! This benchmark suite measures:
//! - Record codec encode/decode per entity type
//! - Id generation as the customer collection grows
//! - Whole-collection load and save through the in-memory store
//! - Invoice finalize (quote + redemption + accrual)
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use retail_ledger::config::LedgerConfig;
use retail_ledger::key::{IdGenerator, IdSpace};
use retail_ledger::ledger::InvoiceDraft;
use retail_ledger::observability::NoOpMetrics;
use retail_ledger::store::InMemoryStore;
use retail_ledger::{
    Customer, CustomerId, CustomerRegistry, InventoryItem, Invoice, InvoiceId, InvoiceLedger,
    LedgerService, LineCodec, Money,
};
use std::hint::black_box;
use std::sync::Arc;

// ============================================================================
// Benchmark Fixtures
// ============================================================================

fn sample_customer() -> Customer {
    Customer::new(
        CustomerId::new("48213"),
        "555-0100",
        "Ada Lovelace",
        "ada@example.com",
    )
    .with_points(1234)
}

fn sample_invoice() -> Invoice {
    Invoice {
        invoice_id: InvoiceId::new("INV-12345678"),
        customer_ref: CustomerId::new("48213"),
        date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        sub_total: Money::from_cents(10000),
        tax: Money::from_cents(650),
        total: Money::from_cents(10650),
    }
}

fn populated_service(customers: usize) -> LedgerService<InMemoryStore> {
    let config = LedgerConfig::default().with_id_seed(1);
    let mut svc = LedgerService::with_config(InMemoryStore::new(), &config)
        .unwrap()
        .with_metrics(Arc::new(NoOpMetrics));
    svc.upsert_item(InventoryItem::new("Hay", Money::from_cents(500), Money::from_cents(2000), i64::MAX / 2));

    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    for i in 0..customers {
        let id = svc.create_customer(&format!("555-{:05}", i), "Customer", "c@example.com").unwrap().id;
        let mut draft = InvoiceDraft::new(date);
        draft.add_line(svc.catalog(), "Hay", 2).unwrap();
        svc.finalize_invoice(&id, &draft, 0, false).unwrap();
    }
    svc
}

// ============================================================================
// Group 1: Codec Benchmarks
// ============================================================================

fn codec_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let customer = sample_customer();
    let customer_line = customer.encode();
    let invoice = sample_invoice();
    let invoice_line = invoice.encode();
    let legacy_line = "555-0100,Ada Lovelace,ada@example.com,1234";

    group.bench_function("encode_customer", |b| b.iter(|| black_box(&customer).encode()));
    group.bench_function("decode_customer", |b| {
        b.iter(|| Customer::decode(black_box(&customer_line)))
    });
    group.bench_function("decode_legacy_customer", |b| {
        b.iter(|| Customer::decode(black_box(legacy_line)))
    });
    group.bench_function("encode_invoice", |b| b.iter(|| black_box(&invoice).encode()));
    group.bench_function("decode_invoice", |b| {
        b.iter(|| Invoice::decode(black_box(&invoice_line)))
    });

    group.finish();
}

// ============================================================================
// Group 2: Id Generation Benchmarks
// ============================================================================

fn id_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("id_generation");

    for size in [10usize, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("customer_id", size), size, |b, &size| {
            let mut registry =
                CustomerRegistry::with_generator(IdGenerator::with_seed(IdSpace::CUSTOMER, 7));
            for i in 0..size {
                registry.create(&format!("p{}", i), "n", "").unwrap();
            }
            b.iter(|| registry.generate_id().unwrap());
        });
    }

    group.finish();
}

// ============================================================================
// Group 3: Persistence Benchmarks
// ============================================================================

fn persistence_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistence");

    for size in [100usize, 1_000].iter() {
        group
            .throughput(Throughput::Elements(*size as u64 * 2))
            .bench_with_input(BenchmarkId::new("save_all", size), size, |b, &size| {
                let mut svc = populated_service(size);
                b.iter(|| svc.save_all().unwrap());
            });

        group
            .throughput(Throughput::Elements(*size as u64 * 2))
            .bench_with_input(BenchmarkId::new("load_all", size), size, |b, &size| {
                let mut svc = populated_service(size);
                svc.save_all().unwrap();
                b.iter(|| black_box(svc.load_all()));
            });
    }

    group.finish();
}

// ============================================================================
// Group 4: Invoice Benchmarks
// ============================================================================

fn invoice_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("invoice");

    group.bench_function("finalize", |b| {
        let catalog = [InventoryItem::new("Hay", Money::from_cents(500), Money::from_cents(2000), 1_000)]
            .into_iter()
            .collect::<retail_ledger::InMemoryCatalog>();
        let mut draft = InvoiceDraft::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        draft.add_line(&catalog, "Hay", 5).unwrap();

        let mut ledger = InvoiceLedger::with_generator(IdGenerator::with_seed(IdSpace::INVOICE, 3));
        let mut customer = sample_customer();
        b.iter(|| {
            if ledger.len() >= 10_000 {
                ledger.clear();
            }
            ledger.finalize(&mut customer, black_box(&draft), 5).unwrap()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    codec_benchmarks,
    id_benchmarks,
    persistence_benchmarks,
    invoice_benchmarks
);
criterion_main!(benches);
