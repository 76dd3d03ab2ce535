//! Invoice ledger: pricing, loyalty redemption and accrual, and the
//! collection of finalized invoices.
//!
//! An invoice is either *open* ([`InvoiceDraft`]: lines accumulating, no id)
//! or *finalized* ([`Invoice`]: id assigned, appended to the ledger, never
//! edited again). There is no paid/unpaid status and no cancellation;
//! dropping a draft is the only way to abandon an invoice.
//!
//! # Example
//!
//! ```
//! use retail_ledger::catalog::InMemoryCatalog;
//! use retail_ledger::entity::{Customer, CustomerId, InventoryItem};
//! use retail_ledger::ledger::{InvoiceDraft, InvoiceLedger};
//! use retail_ledger::money::Money;
//! use chrono::NaiveDate;
//!
//! # fn main() -> retail_ledger::Result<()> {
//! let catalog: InMemoryCatalog = vec![
//!     InventoryItem::new("Feed", Money::from_cents(1200), Money::from_cents(2500), 10),
//! ]
//! .into_iter()
//! .collect();
//!
//! let mut customer = Customer::new(CustomerId::new("1"), "555", "Ada", "");
//! let mut ledger = InvoiceLedger::new();
//!
//! let mut draft = InvoiceDraft::new(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
//! draft.add_line(&catalog, "Feed", 4)?;
//!
//! let receipt = ledger.finalize(&mut customer, &draft, 0)?;
//! assert_eq!(receipt.invoice.sub_total, Money::from_cents(10000));
//! assert_eq!(receipt.invoice.total, Money::from_cents(10650));
//! assert_eq!(customer.points, 10);
//! # Ok(())
//! # }
//! ```

use crate::catalog::Catalog;
use crate::entity::{Customer, CustomerId, Invoice, InvoiceId};
use crate::error::{Error, Result};
use crate::key::{IdGenerator, IdSpace};
use crate::money::Money;
use crate::registry::CustomerRegistry;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Default tax rate: 6.5 %.
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(65, 0, 0, false, 3);

/// Monetary value of one loyalty point: $0.10.
pub const DEFAULT_POINT_VALUE: Money = Money::new(Decimal::from_parts(10, 0, 0, false, 2));

/// Spend per accrued loyalty point: one point per $10 of net total.
pub const DEFAULT_ACCRUAL_UNIT: Money = Money::new(Decimal::from_parts(10, 0, 0, false, 0));

/// One priced line of an invoice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvoiceLine {
    pub item: String,
    pub unit_price: Money,
    pub quantity: i64,
}

fn line_amount(item: &str, unit_price: Money, quantity: i64) -> Result<Money> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| Error::AmountOverflow(format!("{} x {} of '{}'", quantity, unit_price, item)))
}

/// Subtotal, tax and gross total of a set of lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quote {
    pub sub_total: Money,
    pub tax: Money,
    pub total: Money,
}

/// Price `(unit price, quantity)` pairs at `tax_rate`.
///
/// `sub_total = Σ price·qty`, `tax = sub_total · tax_rate`,
/// `total = sub_total + tax`.
///
/// # Errors
/// Returns `Error::AmountOverflow` if any step leaves the fixed-point range
pub fn quote(lines: &[(Money, i64)], tax_rate: Decimal) -> Result<Quote> {
    let mut sub_total = Money::ZERO;
    for (price, qty) in lines {
        let amount = price
            .checked_mul(Decimal::from(*qty))
            .ok_or_else(|| Error::AmountOverflow(format!("line {} x {}", qty, price)))?;
        sub_total = sub_total
            .checked_add(amount)
            .ok_or_else(|| Error::AmountOverflow("invoice subtotal".to_string()))?;
    }
    let tax = sub_total
        .checked_mul(tax_rate)
        .ok_or_else(|| Error::AmountOverflow("invoice tax".to_string()))?;
    let total = sub_total
        .checked_add(tax)
        .ok_or_else(|| Error::AmountOverflow("invoice total".to_string()))?;
    Ok(Quote {
        sub_total,
        tax,
        total,
    })
}

/// Outcome of redeeming loyalty points against a total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Redemption {
    pub discount: Money,
    pub points_used: u32,
    pub new_total: Money,
}

impl Redemption {
    pub fn none(total: Money) -> Self {
        Redemption {
            discount: Money::ZERO,
            points_used: 0,
            new_total: total,
        }
    }
}

/// An open invoice: lines accumulate here until it is finalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvoiceDraft {
    date: NaiveDate,
    lines: Vec<InvoiceLine>,
}

impl InvoiceDraft {
    pub fn new(date: NaiveDate) -> Self {
        InvoiceDraft {
            date,
            lines: Vec::new(),
        }
    }

    /// Price a line from the catalog and add it.
    ///
    /// Quantity must be positive and, together with quantities of the same
    /// item already on this draft, must not exceed the stock on hand. This
    /// is the only point where stock is checked.
    ///
    /// The draft must also stay priceable: tax rates are capped at 1, so a
    /// draft that quotes at rate 1 quotes at any rate.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidQuantity` for zero or negative quantities
    /// - `Error::ItemNotFound` if the catalog lacks the item
    /// - `Error::InsufficientStock` if stock on hand is too low
    /// - `Error::AmountOverflow` if the line or the draft's totals overflow
    pub fn add_line<C: Catalog + ?Sized>(
        &mut self,
        catalog: &C,
        item: &str,
        quantity: i64,
    ) -> Result<&InvoiceLine> {
        if quantity <= 0 {
            return Err(Error::InvalidQuantity {
                item: item.to_string(),
                quantity,
            });
        }

        let unit_price = catalog.price(item)?;
        let on_hand = catalog.on_hand(item)?;
        let requested = self.quantity_of(item).saturating_add(quantity);
        if requested > on_hand {
            return Err(Error::InsufficientStock {
                item: item.to_string(),
                requested,
                on_hand,
            });
        }

        line_amount(item, unit_price, quantity)?;
        let mut priced = self.priced();
        priced.push((unit_price, quantity));
        quote(&priced, Decimal::ONE)?;

        let index = self.lines.len();
        self.lines.push(InvoiceLine {
            item: item.to_string(),
            unit_price,
            quantity,
        });
        Ok(&self.lines[index])
    }

    /// Total quantity of `item` across this draft's lines.
    pub fn quantity_of(&self, item: &str) -> i64 {
        self.lines
            .iter()
            .filter(|line| line.item == item)
            .map(|line| line.quantity)
            .sum()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `(unit price, quantity)` pairs for [`quote`].
    pub fn priced(&self) -> Vec<(Money, i64)> {
        self.lines
            .iter()
            .map(|line| (line.unit_price, line.quantity))
            .collect()
    }
}

/// Everything the shell needs to report a finalized invoice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub invoice: Invoice,
    pub redemption: Redemption,
    pub points_earned: u32,
    pub points_balance: u32,
}

/// An invoice joined to its customer for display.
#[derive(Clone, Copy, Debug)]
pub struct InvoiceView<'a> {
    pub invoice: &'a Invoice,
    pub customer: Option<&'a Customer>,
}

impl InvoiceView<'_> {
    pub fn customer_name(&self) -> &str {
        self.customer.map_or("(unknown)", |c| c.name.as_str())
    }

    pub fn customer_phone(&self) -> &str {
        self.customer.map_or("(unlinked)", |c| c.phone.as_str())
    }

    pub fn is_dangling(&self) -> bool {
        self.customer.is_none()
    }
}

/// The collection of finalized invoices plus the pricing parameters.
///
/// The tax rate is process-wide and read when an invoice is priced, so a
/// change only affects invoices created afterwards.
#[derive(Debug)]
pub struct InvoiceLedger {
    invoices: Vec<Invoice>,
    tax_rate: Decimal,
    point_value: Money,
    accrual_unit: Money,
    ids: IdGenerator,
}

impl InvoiceLedger {
    pub fn new() -> Self {
        Self::with_generator(IdGenerator::new(IdSpace::INVOICE))
    }

    pub fn with_generator(ids: IdGenerator) -> Self {
        InvoiceLedger {
            invoices: Vec::new(),
            tax_rate: DEFAULT_TAX_RATE,
            point_value: DEFAULT_POINT_VALUE,
            accrual_unit: DEFAULT_ACCRUAL_UNIT,
            ids,
        }
    }

    pub fn with_point_value(mut self, point_value: Money) -> Self {
        self.point_value = point_value;
        self
    }

    pub fn with_accrual_unit(mut self, accrual_unit: Money) -> Self {
        self.accrual_unit = accrual_unit;
        self
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// Replace the process-wide tax rate.
    ///
    /// # Errors
    /// Returns `Error::InvalidTaxRate` for rates outside `[0, 1]`
    pub fn set_tax_rate(&mut self, rate: Decimal) -> Result<()> {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(Error::InvalidTaxRate(format!(
                "{} is outside [0, 1]",
                rate
            )));
        }
        debug!("Tax rate changed {} -> {}", self.tax_rate, rate);
        self.tax_rate = rate;
        Ok(())
    }

    pub fn point_value(&self) -> Money {
        self.point_value
    }

    /// Price lines at the current tax rate.
    pub fn quote(&self, lines: &[(Money, i64)]) -> Result<Quote> {
        quote(lines, self.tax_rate)
    }

    /// Largest number of points redeemable against `total` by `customer`.
    pub fn max_redeemable(&self, customer: &Customer, total: Money) -> u32 {
        if total.is_negative() || self.point_value == Money::ZERO {
            return 0;
        }
        // A balance worth more than any representable amount is capped by
        // the total anyway.
        let cap = self
            .point_value
            .checked_mul(Decimal::from(customer.points))
            .map_or(total, |balance_value| balance_value.min(total));
        cap.floor_div(self.point_value).min(customer.points)
    }

    /// Redeem up to `requested` points against `total`.
    ///
    /// The request is clamped to the customer's balance and to the number of
    /// points whose value fits in `total`. Used points are deducted from the
    /// customer immediately and are not refunded by anything in the core.
    pub fn apply_loyalty_discount(
        &self,
        customer: &mut Customer,
        total: Money,
        requested: u32,
    ) -> Redemption {
        let points_used = requested.min(self.max_redeemable(customer, total));
        let discount = match self.point_value.checked_mul(Decimal::from(points_used)) {
            Some(discount) if points_used > 0 => discount,
            _ => return Redemption::none(total),
        };
        customer.points -= points_used;
        debug!(
            "Customer {} redeemed {} points for {}",
            customer.id,
            points_used,
            discount.format_currency()
        );
        Redemption {
            discount,
            points_used,
            new_total: total - discount,
        }
    }

    /// Turn a draft into an invoice for `customer`.
    ///
    /// Assigns a fresh id, prices the lines at the current tax rate, redeems
    /// up to `redeemed_points`, appends the invoice and credits the customer
    /// one point per accrual unit of the net total. Stock is not touched;
    /// see [`InvoiceLedger::deduct_stock`].
    ///
    /// # Errors
    ///
    /// - `Error::EmptyInvoice` if the draft has no lines
    /// - `Error::AmountOverflow` if the draft cannot be priced
    /// - `Error::IdSpaceExhausted` if no invoice id is free
    pub fn finalize(
        &mut self,
        customer: &mut Customer,
        draft: &InvoiceDraft,
        redeemed_points: u32,
    ) -> Result<Receipt> {
        if draft.is_empty() {
            return Err(Error::EmptyInvoice);
        }

        let quote = self.quote(&draft.priced())?;
        let invoice_id = self.generate_id()?;
        let redemption = self.apply_loyalty_discount(customer, quote.total, redeemed_points);

        let invoice = Invoice {
            invoice_id,
            customer_ref: customer.id.clone(),
            date: draft.date(),
            sub_total: quote.sub_total,
            tax: quote.tax,
            total: redemption.new_total,
        };

        let points_earned = redemption.new_total.floor_div(self.accrual_unit);
        customer.points = customer.points.saturating_add(points_earned);

        debug!(
            "Finalized {} for customer {}: total {}, {} points earned",
            invoice.invoice_id, customer.id, invoice.total, points_earned
        );
        self.invoices.push(invoice.clone());

        Ok(Receipt {
            invoice,
            redemption,
            points_earned,
            points_balance: customer.points,
        })
    }

    /// Take the draft's quantities out of the catalog.
    ///
    /// An explicit, optional step after finalize. It does not re-check
    /// stock, so on-hand quantities may go negative.
    pub fn deduct_stock<C: Catalog + ?Sized>(draft: &InvoiceDraft, catalog: &mut C) -> Result<()> {
        for line in draft.lines() {
            catalog.deduct(&line.item, line.quantity)?;
        }
        Ok(())
    }

    /// Generate an invoice id not used by any invoice in the ledger.
    pub fn generate_id(&mut self) -> Result<InvoiceId> {
        let invoices = &self.invoices;
        self.ids
            .generate(|candidate| invoices.iter().any(|i| i.invoice_id.as_str() == candidate))
            .map(InvoiceId::new)
    }

    /// Append an invoice read from storage.
    pub fn insert_loaded(&mut self, invoice: Invoice) {
        self.invoices.push(invoice);
    }

    pub fn find_by_customer(&self, customer_id: &CustomerId) -> Vec<&Invoice> {
        self.invoices
            .iter()
            .filter(|invoice| &invoice.customer_ref == customer_id)
            .collect()
    }

    /// All invoices in insertion (and therefore chronological) order.
    pub fn all(&self) -> &[Invoice] {
        &self.invoices
    }

    /// All invoices joined to their customers; dangling references yield
    /// views without a customer.
    pub fn views<'a>(&'a self, registry: &'a CustomerRegistry) -> Vec<InvoiceView<'a>> {
        self.invoices
            .iter()
            .map(|invoice| InvoiceView {
                invoice,
                customer: registry.find_by_id(&invoice.customer_ref),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }

    pub fn clear(&mut self) {
        self.invoices.clear();
    }
}

impl Default for InvoiceLedger {
    fn default() -> Self {
        Self::new()
    }
}
