//! Property-based tests for the record codec and ledger arithmetic.
//!
//! # Properties Tested
//!
//! 1. **Roundtrip Property**: decode(encode(x)) == x for comma-free text
//! 2. **Escape Property**: commas in free text never change the field count
//! 3. **Floor Property**: point adjustments never go below zero
//! 4. **Uniqueness Property**: generated ids never collide with live ids
//! 5. **Quote Property**: total == sub_total + tax, exactly

use chrono::NaiveDate;
use proptest::prelude::*;
use retail_ledger::codec::{DecodedCustomer, CUSTOMER_FIELDS};
use retail_ledger::key::{IdGenerator, IdSpace};
use retail_ledger::ledger::quote;
use retail_ledger::registry::apply_delta;
use retail_ledger::{Customer, CustomerId, CustomerRegistry, Invoice, InvoiceId, LineCodec, Money};
use rust_decimal::Decimal;
use std::collections::HashSet;

// ============================================================================
// Strategies
// ============================================================================

fn free_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 @.;'-]{0,24}"
}

fn money() -> impl Strategy<Value = Money> {
    (0i64..100_000_000).prop_map(Money::from_cents)
}

fn date() -> impl Strategy<Value = NaiveDate> {
    (1990i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default())
}

prop_compose! {
    fn customer()(
        id in 0u32..100_000,
        phone in "[0-9-]{1,12}",
        name in free_text(),
        email in free_text(),
        points in any::<u32>(),
    ) -> Customer {
        Customer::new(CustomerId::new(id.to_string()), phone, name, email).with_points(points)
    }
}

prop_compose! {
    fn invoice()(
        n in 0u32..100_000_000,
        customer in 0u32..100_000,
        date in date(),
        sub_total in money(),
        tax in money(),
        total in money(),
    ) -> Invoice {
        Invoice {
            invoice_id: InvoiceId::new(format!("INV-{}", n)),
            customer_ref: CustomerId::new(customer.to_string()),
            date,
            sub_total,
            tax,
            total,
        }
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_customer_roundtrip(customer in customer()) {
        let decoded = Customer::decode(&customer.encode());
        prop_assert_eq!(decoded, Some(DecodedCustomer::Current(customer)));
    }

    #[test]
    fn prop_invoice_roundtrip(invoice in invoice()) {
        let raw = Invoice::decode(&invoice.encode()).unwrap();
        prop_assert_eq!(raw.invoice_id, invoice.invoice_id);
        prop_assert_eq!(raw.customer_token, invoice.customer_ref.as_str());
        prop_assert_eq!(raw.date, invoice.date);
        prop_assert_eq!(raw.sub_total, invoice.sub_total);
        prop_assert_eq!(raw.tax, invoice.tax);
        prop_assert_eq!(raw.total, invoice.total);
    }

    #[test]
    fn prop_commas_are_escaped(name in "[a-z, ]{0,20}", email in "[a-z,@.]{0,20}") {
        let customer = Customer::new(
            CustomerId::new("1"),
            "555",
            name.replace(',', ";"),
            email.replace(',', ";"),
        );
        let mut raw = customer.clone();
        raw.name = name;
        raw.email = email;

        let line = raw.encode();
        prop_assert_eq!(line.split(',').count(), CUSTOMER_FIELDS);
        prop_assert_eq!(Customer::decode(&line), Some(DecodedCustomer::Current(customer)));
    }

    #[test]
    fn prop_points_never_negative(start in any::<u32>(), delta in any::<i64>()) {
        let after = apply_delta(start, delta);
        if delta <= -(start as i64) {
            prop_assert_eq!(after, 0);
        } else if delta < 0 {
            prop_assert!(after < start);
        } else {
            prop_assert!(after >= start);
        }
    }

    #[test]
    fn prop_quote_total_is_exact(
        lines in prop::collection::vec((money(), 1i64..1000), 1..8),
        rate_bp in 0u32..=10_000,
    ) {
        let rate = Decimal::new(rate_bp as i64, 4);
        let q = quote(&lines, rate).unwrap();
        prop_assert_eq!(q.total, q.sub_total.checked_add(q.tax).unwrap());
        prop_assert_eq!(q.tax, q.sub_total.checked_mul(rate).unwrap());
    }

    #[test]
    fn prop_generated_ids_are_unique(seed in any::<u64>(), count in 1usize..300) {
        let mut registry = CustomerRegistry::with_generator(
            IdGenerator::with_seed(IdSpace::CUSTOMER, seed),
        );
        for i in 0..count {
            registry.create(&format!("p{}", i), "n", "").unwrap();
        }
        let ids: HashSet<_> = registry.list().iter().map(|c| c.id.clone()).collect();
        prop_assert_eq!(ids.len(), count);
    }

    #[test]
    fn prop_small_space_fills_completely(seed in any::<u64>()) {
        let space = IdSpace { prefix: "X", width: 2 };
        let mut ids = IdGenerator::with_seed(space, seed).with_attempts(3);
        let mut taken = HashSet::new();
        for _ in 0..100 {
            let id = ids.generate(|c| taken.contains(c)).unwrap();
            prop_assert!(taken.insert(id));
        }
        prop_assert!(ids.generate(|c| taken.contains(c)).is_err());
    }
}

// ============================================================================
// Quickcheck
// ============================================================================

quickcheck::quickcheck! {
    fn qc_adjust_matches_saturating_math(start: u32, delta: i32) -> bool {
        let expected = (start as i64 + delta as i64).max(0) as u32;
        apply_delta(start, delta as i64) == expected
    }
}
