//! Catalog collaborator: the inventory the ledger prices invoice lines from.
//!
//! The ledger only needs three things from inventory: an item's sale price,
//! its quantity on hand, and a way to take stock out once an invoice has been
//! issued. The [`Catalog`] trait captures exactly that, so the shell can back
//! it with whatever inventory store it keeps.
//!
//! [`InMemoryCatalog`] is the default implementation, populated from the
//! persisted inventory file by the gateway or directly in tests.

use crate::entity::InventoryItem;
use crate::error::{Error, Result};
use crate::money::Money;

/// Inventory lookups and stock movement used by the ledger.
pub trait Catalog {
    /// Look up an item by name.
    fn item(&self, name: &str) -> Option<&InventoryItem>;

    /// Sale price of an item.
    ///
    /// # Errors
    /// Returns `Error::ItemNotFound` if the catalog has no such item
    fn price(&self, name: &str) -> Result<Money> {
        self.item(name)
            .map(|item| item.sale_price)
            .ok_or_else(|| Error::ItemNotFound(name.to_string()))
    }

    /// Quantity on hand.
    ///
    /// # Errors
    /// Returns `Error::ItemNotFound` if the catalog has no such item
    fn on_hand(&self, name: &str) -> Result<i64> {
        self.item(name)
            .map(|item| item.on_hand)
            .ok_or_else(|| Error::ItemNotFound(name.to_string()))
    }

    /// Remove `quantity` units from stock without checking availability.
    ///
    /// The result may be negative; sufficiency is checked when lines are
    /// added to an invoice, not here.
    ///
    /// # Errors
    /// Returns `Error::ItemNotFound` if the catalog has no such item
    fn deduct(&mut self, name: &str, quantity: i64) -> Result<i64>;
}

/// Inventory held in memory, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    items: Vec<InventoryItem>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        InMemoryCatalog { items: Vec::new() }
    }

    /// Insert an item, replacing any item with the same name.
    pub fn insert(&mut self, item: InventoryItem) {
        match self.items.iter_mut().find(|existing| existing.name == item.name) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl FromIterator<InventoryItem> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = InventoryItem>>(iter: I) -> Self {
        let mut catalog = InMemoryCatalog::new();
        for item in iter {
            catalog.insert(item);
        }
        catalog
    }
}

impl Catalog for InMemoryCatalog {
    fn item(&self, name: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.name == name)
    }

    fn deduct(&mut self, name: &str, quantity: i64) -> Result<i64> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.name == name)
            .ok_or_else(|| Error::ItemNotFound(name.to_string()))?;
        item.on_hand = item.on_hand.saturating_sub(quantity);
        if item.on_hand < 0 {
            warn!("Stock for '{}' is now negative: {}", name, item.on_hand);
        }
        Ok(item.on_hand)
    }
}
