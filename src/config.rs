//! Ledger configuration.
//!
//! Every field has a default, so a JSON config file only needs the keys it
//! changes:
//!
//! ```
//! use retail_ledger::config::LedgerConfig;
//!
//! let config = LedgerConfig::from_json_str(r#"{ "data_dir": "/var/lib/farm", "tax_rate": "0.07" }"#).unwrap();
//! assert_eq!(config.customers_file, "customers.csv");
//! assert_eq!(config.tax_rate.to_string(), "0.07");
//! ```

use crate::error::{Error, Result};
use crate::gateway::RecordFiles;
use crate::key::DEFAULT_ATTEMPTS;
use crate::ledger::{DEFAULT_ACCRUAL_UNIT, DEFAULT_POINT_VALUE, DEFAULT_TAX_RATE};
use crate::money::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for a [`crate::LedgerService`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Directory holding the record files.
    pub data_dir: PathBuf,
    pub customers_file: String,
    pub invoices_file: String,
    pub inventory_file: String,

    /// Process-wide tax rate as a fraction (`0.065` is 6.5 %).
    pub tax_rate: Decimal,

    /// Monetary value of one loyalty point.
    pub point_value: Money,

    /// Net spend that earns one loyalty point.
    pub accrual_unit: Money,

    /// Random draws per id before falling back to a scan.
    pub id_attempts: u32,

    /// Seed for id generation. `None` seeds from the OS; set it only for
    /// reproducible runs.
    pub id_seed: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let files = RecordFiles::default();
        LedgerConfig {
            data_dir: PathBuf::from("."),
            customers_file: files.customers,
            invoices_file: files.invoices,
            inventory_file: files.inventory,
            tax_rate: DEFAULT_TAX_RATE,
            point_value: DEFAULT_POINT_VALUE,
            accrual_unit: DEFAULT_ACCRUAL_UNIT,
            id_attempts: DEFAULT_ATTEMPTS,
            id_seed: None,
        }
    }
}

impl LedgerConfig {
    pub fn with_data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = rate;
        self
    }

    pub fn with_point_value(mut self, value: Money) -> Self {
        self.point_value = value;
        self
    }

    pub fn with_accrual_unit(mut self, unit: Money) -> Self {
        self.accrual_unit = unit;
        self
    }

    pub fn with_id_attempts(mut self, attempts: u32) -> Self {
        self.id_attempts = attempts;
        self
    }

    /// Fix the id generator seed.
    ///
    /// # Example
    ///
    /// ```
    /// use retail_ledger::config::LedgerConfig;
    ///
    /// let config = LedgerConfig::default().with_id_seed(42);
    /// assert_eq!(config.id_seed, Some(42));
    /// ```
    pub fn with_id_seed(mut self, seed: u64) -> Self {
        self.id_seed = Some(seed);
        self
    }

    pub fn with_record_files(mut self, files: RecordFiles) -> Self {
        self.customers_file = files.customers;
        self.invoices_file = files.invoices;
        self.inventory_file = files.inventory;
        self
    }

    pub fn record_files(&self) -> RecordFiles {
        RecordFiles {
            customers: self.customers_file.clone(),
            invoices: self.invoices_file.clone(),
            inventory: self.inventory_file.clone(),
        }
    }

    /// Check the settings for consistency.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` describing the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE {
            return Err(Error::ConfigError(format!(
                "tax_rate {} is outside [0, 1]",
                self.tax_rate
            )));
        }
        if self.point_value.is_negative() {
            return Err(Error::ConfigError(format!(
                "point_value {} must not be negative",
                self.point_value
            )));
        }
        if self.accrual_unit <= Money::ZERO {
            return Err(Error::ConfigError(format!(
                "accrual_unit {} must be positive",
                self.accrual_unit
            )));
        }

        let files = [&self.customers_file, &self.invoices_file, &self.inventory_file];
        if files.iter().any(|name| name.trim().is_empty()) {
            return Err(Error::ConfigError("record file names must not be empty".to_string()));
        }
        if files[0] == files[1] || files[0] == files[2] || files[1] == files[2] {
            return Err(Error::ConfigError("record file names must be distinct".to_string()));
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_json_str(&json)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.tax_rate, Decimal::from_str("0.065").unwrap());
        assert_eq!(config.point_value, Money::from_cents(10));
        assert_eq!(config.accrual_unit, Money::from_cents(1000));
        assert_eq!(config.id_attempts, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = LedgerConfig::default()
            .with_data_dir("/tmp/ledger")
            .with_tax_rate(Decimal::from_str("0.08").unwrap())
            .with_id_attempts(5);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/ledger"));
        assert_eq!(config.id_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_percent_tax_rate() {
        let config = LedgerConfig::default().with_tax_rate(Decimal::from(7));
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_bad_units_and_files() {
        let zero_unit = LedgerConfig::default().with_accrual_unit(Money::ZERO);
        assert!(zero_unit.validate().is_err());

        let clash = LedgerConfig::default().with_record_files(RecordFiles {
            customers: "a.csv".to_string(),
            invoices: "a.csv".to_string(),
            inventory: "b.csv".to_string(),
        });
        assert!(clash.validate().is_err());
    }

    #[test]
    fn test_json_partial_and_invalid() {
        let config = LedgerConfig::from_json_str(r#"{ "id_seed": 7, "point_value": "0.05" }"#).unwrap();
        assert_eq!(config.id_seed, Some(7));
        assert_eq!(config.point_value, Money::from_cents(5));
        assert_eq!(config.invoices_file, "invoices.csv");

        assert!(matches!(
            LedgerConfig::from_json_str("{ not json"),
            Err(Error::ConfigError(_))
        ));
        assert!(matches!(
            LedgerConfig::from_json_str(r#"{ "tax_rate": "1.5" }"#),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let written = LedgerConfig::default().with_data_dir(dir.path()).with_id_seed(3);
        fs::write(&path, serde_json::to_string_pretty(&written).unwrap()).unwrap();

        assert_eq!(LedgerConfig::from_json_file(&path).unwrap(), written);
        assert!(LedgerConfig::from_json_file(dir.path().join("missing.json")).is_err());
    }
}
