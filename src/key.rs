//! Identifier generation for customers and invoices.
//!
//! Identifiers are short decimal numbers drawn at random from a fixed-width
//! space and checked against the live collection. After a bounded number of
//! random draws the generator falls back to a linear scan of the space, so a
//! returned identifier is always free; the only failure is a completely full
//! space.

use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default number of random draws before falling back to a scan.
pub const DEFAULT_ATTEMPTS: u32 = 1000;

/// A fixed-width decimal identifier space with an optional prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdSpace {
    pub prefix: &'static str,
    pub width: u32,
}

impl IdSpace {
    /// Customer ids: bare numbers below 100000.
    pub const CUSTOMER: IdSpace = IdSpace {
        prefix: "",
        width: 5,
    };

    /// Invoice ids: `INV-` followed by a number below 10^8.
    pub const INVOICE: IdSpace = IdSpace {
        prefix: "INV-",
        width: 8,
    };

    /// Number of distinct identifiers in the space.
    pub fn capacity(&self) -> u64 {
        10u64.pow(self.width)
    }

    /// Render the `n`th identifier. Numbers are not zero-padded.
    pub fn render(&self, n: u64) -> String {
        format!("{}{}", self.prefix, n)
    }
}

/// Collision-free identifier generator.
///
/// # Example
///
/// ```
/// use retail_ledger::key::{IdGenerator, IdSpace};
///
/// let mut ids = IdGenerator::with_seed(IdSpace::INVOICE, 7);
/// let id = ids.generate(|candidate| candidate == "INV-0").unwrap();
/// assert!(id.starts_with("INV-"));
/// ```
#[derive(Debug)]
pub struct IdGenerator {
    space: IdSpace,
    attempts: u32,
    rng: StdRng,
}

impl IdGenerator {
    pub fn new(space: IdSpace) -> Self {
        IdGenerator {
            space,
            attempts: DEFAULT_ATTEMPTS,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic generator for tests and reproducible runs.
    pub fn with_seed(space: IdSpace, seed: u64) -> Self {
        IdGenerator {
            space,
            attempts: DEFAULT_ATTEMPTS,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn space(&self) -> IdSpace {
        self.space
    }

    /// Produce an identifier for which `exists` returns false.
    ///
    /// # Errors
    ///
    /// Returns `Error::IdSpaceExhausted` only when every identifier in the
    /// space is taken.
    pub fn generate<F>(&mut self, exists: F) -> Result<String>
    where
        F: Fn(&str) -> bool,
    {
        let capacity = self.space.capacity();

        for _ in 0..self.attempts {
            let candidate = self.space.render(self.rng.random_range(0..capacity));
            if !exists(&candidate) {
                return Ok(candidate);
            }
        }

        warn!(
            "{} random draws collided in '{}' space, scanning for a free id",
            self.attempts, self.space.prefix
        );

        let start = time_offset() % capacity;
        (0..capacity)
            .map(|step| self.space.render((start + step) % capacity))
            .find(|candidate| !exists(candidate))
            .ok_or(Error::IdSpaceExhausted {
                prefix: self.space.prefix,
                width: self.space.width,
            })
    }
}

fn time_offset() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64 + d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const TINY: IdSpace = IdSpace {
        prefix: "T-",
        width: 1,
    };

    #[test]
    fn test_render() {
        assert_eq!(IdSpace::CUSTOMER.render(42), "42");
        assert_eq!(IdSpace::INVOICE.render(42), "INV-42");
        assert_eq!(IdSpace::INVOICE.capacity(), 100_000_000);
    }

    #[test]
    fn test_generated_ids_within_space() {
        let mut ids = IdGenerator::with_seed(IdSpace::CUSTOMER, 1);
        for _ in 0..100 {
            let id = ids.generate(|_| false).unwrap();
            let n: u64 = id.parse().unwrap();
            assert!(n < 100_000);
        }
    }

    #[test]
    fn test_generate_avoids_taken_ids() {
        let mut ids = IdGenerator::with_seed(TINY, 3);
        let mut taken = HashSet::new();
        for _ in 0..10 {
            let id = ids.generate(|c| taken.contains(c)).unwrap();
            assert!(taken.insert(id));
        }
        assert_eq!(taken.len(), 10);
    }

    #[test]
    fn test_scan_fallback_finds_last_free_id() {
        // No random draws at all: the scan alone must find the gap.
        let mut ids = IdGenerator::with_seed(TINY, 9).with_attempts(0);
        let id = ids.generate(|c| c != "T-7").unwrap();
        assert_eq!(id, "T-7");
    }

    #[test]
    fn test_exhausted_space_is_an_error() {
        let mut ids = IdGenerator::with_seed(TINY, 5).with_attempts(10);
        let result = ids.generate(|_| true);
        assert_eq!(
            result,
            Err(Error::IdSpaceExhausted {
                prefix: "T-",
                width: 1
            })
        );
    }
}
