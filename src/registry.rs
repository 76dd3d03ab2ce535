//! Customer registry: the in-memory customer collection.

use crate::codec::{escape, CustomerLookup, DecodedCustomer};
use crate::entity::{Customer, CustomerId};
use crate::error::{Error, Result};
use crate::key::{IdGenerator, IdSpace};
use std::collections::HashSet;

/// Field changes for [`CustomerRegistry::edit`]. `None` keeps the current value.
#[derive(Clone, Debug, Default)]
pub struct CustomerEdit {
    pub phone: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub points: Option<u32>,
}

impl CustomerEdit {
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn points(mut self, points: u32) -> Self {
        self.points = Some(points);
        self
    }
}

/// In-memory collection of customers, in insertion order.
///
/// Phone numbers are unique case-insensitively. Ids are generated once at
/// creation and never change, and are never handed out again once retired:
/// removed customers, walk-in customers and ids invoices still refer to.
#[derive(Debug)]
pub struct CustomerRegistry {
    customers: Vec<Customer>,
    retired: HashSet<String>,
    ids: IdGenerator,
}

impl CustomerRegistry {
    pub fn new() -> Self {
        Self::with_generator(IdGenerator::new(IdSpace::CUSTOMER))
    }

    pub fn with_generator(ids: IdGenerator) -> Self {
        CustomerRegistry {
            customers: Vec::new(),
            retired: HashSet::new(),
            ids,
        }
    }

    /// Register a new customer with a zero balance.
    ///
    /// Free-text input is trimmed and commas are replaced with semicolons.
    ///
    /// # Errors
    ///
    /// - `Error::DuplicatePhone` if any customer already has this phone
    /// - `Error::IdSpaceExhausted` if no customer id is free
    pub fn create(&mut self, phone: &str, name: &str, email: &str) -> Result<&Customer> {
        let phone = clean(phone);
        if self.find_by_phone(&phone).is_some() {
            return Err(Error::DuplicatePhone(phone));
        }

        let id = self.generate_id()?;
        debug!("Registered customer {} ({})", id, phone);
        let index = self.customers.len();
        self.customers
            .push(Customer::new(id, phone, clean(name), clean(email)));
        Ok(&self.customers[index])
    }

    /// Add customers decoded from storage, in file order. Returns how many
    /// legacy lines were given fresh ids.
    ///
    /// Generated ids avoid live ids and ids carried by any line of the same
    /// batch. Duplicate ids or phones within the batch are kept as-is: the
    /// store is reproduced, not repaired.
    pub fn insert_loaded(&mut self, batch: Vec<DecodedCustomer>) -> Result<usize> {
        let reserved: HashSet<String> = batch
            .iter()
            .filter_map(|decoded| match decoded {
                DecodedCustomer::Current(customer) => Some(customer.id.as_str().to_string()),
                DecodedCustomer::Legacy { .. } => None,
            })
            .collect();

        let mut generated = 0;
        for decoded in batch {
            let id = if decoded.is_legacy() {
                generated += 1;
                self.generate_id_avoiding(&reserved)?
            } else {
                CustomerId::new("")
            };
            self.customers.push(decoded.into_customer(id));
        }
        Ok(generated)
    }

    /// Generate an id not used by any live customer nor retired.
    pub fn generate_id(&mut self) -> Result<CustomerId> {
        self.generate_id_avoiding(&HashSet::new())
    }

    fn generate_id_avoiding(&mut self, reserved: &HashSet<String>) -> Result<CustomerId> {
        let customers = &self.customers;
        let retired = &self.retired;
        self.ids
            .generate(|candidate| {
                reserved.contains(candidate)
                    || retired.contains(candidate)
                    || customers.iter().any(|c| c.id.as_str() == candidate)
            })
            .map(CustomerId::new)
    }

    /// Keep `id` out of future generation, e.g. because an invoice refers
    /// to it.
    pub fn retire_id(&mut self, id: &CustomerId) {
        if self.retired.insert(id.as_str().to_string()) {
            debug!("Customer id {} retired", id);
        }
    }

    pub fn is_retired(&self, id: &CustomerId) -> bool {
        self.retired.contains(id.as_str())
    }

    pub fn find_by_phone(&self, phone: &str) -> Option<&Customer> {
        self.customers
            .iter()
            .find(|c| c.phone.to_lowercase() == phone.to_lowercase())
    }

    pub fn find_by_id(&self, id: &CustomerId) -> Option<&Customer> {
        self.customers.iter().find(|c| &c.id == id)
    }

    /// First customer whose name matches case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Option<&Customer> {
        self.customers
            .iter()
            .find(|c| c.name.to_lowercase() == name.to_lowercase())
    }

    pub fn find_by_id_mut(&mut self, id: &CustomerId) -> Option<&mut Customer> {
        self.customers.iter_mut().find(|c| &c.id == id)
    }

    /// Add `delta` points, flooring the balance at zero. Returns the new
    /// balance.
    pub fn adjust_points(&mut self, id: &CustomerId, delta: i64) -> Result<u32> {
        let customer = self
            .find_by_id_mut(id)
            .ok_or_else(|| Error::CustomerNotFound(id.to_string()))?;
        customer.points = apply_delta(customer.points, delta);
        debug!("Customer {} points adjusted by {} -> {}", id, delta, customer.points);
        Ok(customer.points)
    }

    /// Replace the balance outright.
    pub fn set_points(&mut self, id: &CustomerId, points: u32) -> Result<u32> {
        let customer = self
            .find_by_id_mut(id)
            .ok_or_else(|| Error::CustomerNotFound(id.to_string()))?;
        customer.points = points;
        Ok(points)
    }

    /// Apply field changes to a customer.
    ///
    /// # Errors
    ///
    /// - `Error::CustomerNotFound` if the id is not live
    /// - `Error::DuplicatePhone` if the new phone belongs to another customer
    pub fn edit(&mut self, id: &CustomerId, edit: CustomerEdit) -> Result<&Customer> {
        if self.find_by_id(id).is_none() {
            return Err(Error::CustomerNotFound(id.to_string()));
        }

        let phone = edit.phone.as_deref().map(clean);
        if let Some(phone) = &phone {
            if let Some(other) = self.find_by_phone(phone) {
                if &other.id != id {
                    return Err(Error::DuplicatePhone(phone.clone()));
                }
            }
        }

        let customer = self
            .find_by_id_mut(id)
            .ok_or_else(|| Error::CustomerNotFound(id.to_string()))?;
        if let Some(phone) = phone {
            customer.phone = phone;
        }
        if let Some(name) = edit.name {
            customer.name = clean(&name);
        }
        if let Some(email) = edit.email {
            customer.email = clean(&email);
        }
        if let Some(points) = edit.points {
            customer.points = points;
        }
        Ok(customer)
    }

    /// Remove a customer. Invoices referencing it are left dangling and
    /// the id is retired.
    pub fn remove(&mut self, id: &CustomerId) -> Option<Customer> {
        let index = self.customers.iter().position(|c| &c.id == id)?;
        debug!("Removed customer {}", id);
        self.retire_id(id);
        Some(self.customers.remove(index))
    }

    pub fn list(&self) -> &[Customer] {
        &self.customers
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    /// Drop every customer and every retired id.
    pub fn clear(&mut self) {
        self.customers.clear();
        self.retired.clear();
    }
}

impl Default for CustomerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomerLookup for CustomerRegistry {
    fn customer_by_id(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id.as_str() == id)
    }

    fn customer_by_phone(&self, phone: &str) -> Option<&Customer> {
        self.find_by_phone(phone)
    }
}

/// Add a signed delta to a balance, flooring at zero.
pub fn apply_delta(points: u32, delta: i64) -> u32 {
    (points as i64)
        .saturating_add(delta)
        .clamp(0, u32::MAX as i64) as u32
}

fn clean(text: &str) -> String {
    escape(text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CustomerRegistry {
        CustomerRegistry::with_generator(IdGenerator::with_seed(IdSpace::CUSTOMER, 11))
    }

    #[test]
    fn test_create_and_find() {
        let mut reg = registry();
        let id = reg.create("555-0100", "Ada Lovelace", "ada@example.com").unwrap().id.clone();

        assert_eq!(reg.find_by_id(&id).unwrap().name, "Ada Lovelace");
        assert_eq!(reg.find_by_phone("555-0100").unwrap().id, id);
        assert_eq!(reg.find_by_name("ada lovelace").unwrap().id, id);
        assert!(reg.find_by_name("Ada").is_none());
    }

    #[test]
    fn test_duplicate_phone_is_case_insensitive() {
        let mut reg = registry();
        reg.create("abc-1", "One", "").unwrap();
        let err = reg.create("ABC-1", "Two", "").unwrap_err();
        assert_eq!(err, Error::DuplicatePhone("ABC-1".to_string()));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_create_sanitizes_free_text() {
        let mut reg = registry();
        let customer = reg.create(" 555 ", "Doe, Jane ", "x,y@z").unwrap();
        assert_eq!(customer.phone, "555");
        assert_eq!(customer.name, "Doe; Jane");
        assert_eq!(customer.email, "x;y@z");
    }

    #[test]
    fn test_ids_are_unique() {
        let mut reg = registry();
        for i in 0..500 {
            reg.create(&format!("555-{}", i), "Someone", "").unwrap();
        }
        let mut ids: Vec<_> = reg.list().iter().map(|c| c.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_adjust_points_floors_at_zero() {
        let mut reg = registry();
        let id = reg.create("1", "A", "").unwrap().id.clone();
        assert_eq!(reg.adjust_points(&id, 25).unwrap(), 25);
        assert_eq!(reg.adjust_points(&id, -1_000_000_000).unwrap(), 0);
        assert_eq!(reg.adjust_points(&id, i64::MIN).unwrap(), 0);
    }

    #[test]
    fn test_adjust_points_unknown_customer() {
        let mut reg = registry();
        let err = reg.adjust_points(&CustomerId::new("404"), 1).unwrap_err();
        assert!(matches!(err, Error::CustomerNotFound(_)));
    }

    #[test]
    fn test_edit_rejects_phone_of_other_customer() {
        let mut reg = registry();
        reg.create("111", "A", "").unwrap();
        let b = reg.create("222", "B", "").unwrap().id.clone();

        let err = reg.edit(&b, CustomerEdit::default().phone("111")).unwrap_err();
        assert!(matches!(err, Error::DuplicatePhone(_)));

        // Keeping one's own phone (any case) is fine.
        let edited = reg
            .edit(&b, CustomerEdit::default().phone("222").name("Bea").points(9))
            .unwrap();
        assert_eq!(edited.name, "Bea");
        assert_eq!(edited.points, 9);
    }

    #[test]
    fn test_remove() {
        let mut reg = registry();
        let id = reg.create("1", "A", "").unwrap().id.clone();
        assert!(reg.remove(&id).is_some());
        assert!(reg.remove(&id).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_insert_loaded_generates_id_for_legacy() {
        let mut reg = registry();
        let legacy = DecodedCustomer::Legacy {
            phone: "555".to_string(),
            name: "Old".to_string(),
            email: String::new(),
            points: 3,
        };
        assert_eq!(reg.insert_loaded(vec![legacy]).unwrap(), 1);
        let customer = &reg.list()[0];
        assert!(!customer.id.as_str().is_empty());
        assert_eq!(customer.points, 3);
    }

    #[test]
    fn test_legacy_ids_avoid_ids_later_in_batch() {
        let tiny = IdSpace {
            prefix: "",
            width: 1,
        };
        let mut reg = CustomerRegistry::with_generator(IdGenerator::with_seed(tiny, 2));

        let mut batch = vec![DecodedCustomer::Legacy {
            phone: "old".to_string(),
            name: "Old".to_string(),
            email: String::new(),
            points: 0,
        }];
        for n in 0..9 {
            let id = CustomerId::new(n.to_string());
            batch.push(DecodedCustomer::Current(Customer::new(id, n.to_string(), "N", "")));
        }

        reg.insert_loaded(batch).unwrap();
        assert_eq!(reg.list()[0].id.as_str(), "9");
        assert_eq!(reg.len(), 10);
    }

    #[test]
    fn test_retired_ids_are_not_reissued() {
        let tiny = IdSpace {
            prefix: "",
            width: 1,
        };
        let mut reg = CustomerRegistry::with_generator(IdGenerator::with_seed(tiny, 5));
        for n in 0..9 {
            reg.create(&n.to_string(), "N", "").unwrap();
        }
        let removed = reg.list()[0].id.clone();
        reg.remove(&removed).unwrap();
        assert!(reg.is_retired(&removed));

        // The last free id goes to an invoice reference; the removed id
        // stays off limits, so the space is full.
        let referenced = reg.generate_id().unwrap();
        assert_ne!(referenced, removed);
        reg.retire_id(&referenced);
        assert_eq!(
            reg.create("late", "Late", "").unwrap_err(),
            Error::IdSpaceExhausted {
                prefix: "",
                width: 1
            }
        );

        reg.clear();
        assert!(!reg.is_retired(&removed));
    }
}
