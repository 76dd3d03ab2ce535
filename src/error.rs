//! Error types for the ledger core.

use std::fmt;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the ledger core.
///
/// Nothing in the core is fatal. Validation errors are returned to the caller
/// synchronously; parse problems inside persisted files are recovered locally
/// and never surface here; storage errors are only returned from explicit
/// save operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Another customer already uses this phone number (case-insensitive).
    DuplicatePhone(String),

    /// No live customer matches the given id.
    CustomerNotFound(String),

    /// An invoice line asked for zero or a negative quantity.
    InvalidQuantity {
        /// Catalog item name
        item: String,
        /// Requested quantity
        quantity: i64,
    },

    /// An invoice line asked for more than the catalog has on hand.
    ///
    /// Checked when the line is added to an open invoice, never again at
    /// finalize time.
    InsufficientStock {
        /// Catalog item name
        item: String,
        /// Requested quantity
        requested: i64,
        /// Quantity on hand when the line was checked
        on_hand: i64,
    },

    /// The catalog has no item with this name.
    ItemNotFound(String),

    /// A date did not match the `MM-DD-YYYY` format.
    InvalidDate(String),

    /// A tax rate outside `[0, 1]` or otherwise unusable.
    InvalidTaxRate(String),

    /// Finalize was requested for an invoice with no lines.
    EmptyInvoice,

    /// An invoice amount does not fit in the fixed-point range.
    ///
    /// Raised while pricing; catalog prices are loaded leniently and can be
    /// large enough that a line or a total overflows.
    AmountOverflow(String),

    /// Every identifier in the space is already taken.
    ///
    /// Only reachable once the live collection holds `10^width` entities.
    IdSpaceExhausted {
        /// Identifier prefix (empty for customers)
        prefix: &'static str,
        /// Number of decimal digits in the space
        width: u32,
    },

    /// A value could not be decoded where decoding is mandatory
    /// (configuration, explicit user input).
    Decode(String),

    /// The backing store could not be read or written.
    Storage(String),

    /// Configuration is missing or invalid.
    ConfigError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicatePhone(phone) => {
                write!(f, "A customer with phone '{}' already exists", phone)
            }
            Error::CustomerNotFound(id) => write!(f, "Customer not found: {}", id),
            Error::InvalidQuantity { item, quantity } => {
                write!(
                    f,
                    "Invalid quantity {} for '{}': must be > 0",
                    quantity, item
                )
            }
            Error::InsufficientStock {
                item,
                requested,
                on_hand,
            } => write!(
                f,
                "Not enough stock for '{}': requested {}, on hand {}",
                item, requested, on_hand
            ),
            Error::ItemNotFound(item) => write!(f, "Inventory item not found: {}", item),
            Error::InvalidDate(date) => {
                write!(f, "Invalid date '{}': expected MM-DD-YYYY", date)
            }
            Error::InvalidTaxRate(msg) => write!(f, "Invalid tax rate: {}", msg),
            Error::EmptyInvoice => write!(f, "Invoice has no line items"),
            Error::AmountOverflow(what) => write!(f, "Amount overflow: {}", what),
            Error::IdSpaceExhausted { prefix, width } => write!(
                f,
                "Identifier space exhausted: prefix '{}', {} digits",
                prefix, width
            ),
            Error::Decode(msg) => write!(f, "Decode error: {}", msg),
            Error::Storage(msg) => write!(f, "Storage error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::Storage(e.to_string())
        } else {
            Error::ConfigError(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DuplicatePhone("555-0100".to_string());
        assert_eq!(
            err.to_string(),
            "A customer with phone '555-0100' already exists"
        );
    }

    #[test]
    fn test_insufficient_stock_display() {
        let err = Error::InsufficientStock {
            item: "Hay bale".to_string(),
            requested: 12,
            on_hand: 4,
        };
        assert_eq!(
            err.to_string(),
            "Not enough stock for 'Hay bale': requested 12, on hand 4"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
