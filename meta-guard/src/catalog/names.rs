//! Validation of catalog object names.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{MetaError, Result};

/// Maximum length of a schema, table or column name in bytes.
pub const MAX_NAME_LENGTH: usize = 255;

/// Checks that a name can be stored in the catalog.
///
/// Names may contain any printable characters, including spaces and quotes
/// (they come straight from DDL or file headers), but must not be blank,
/// must not exceed [`MAX_NAME_LENGTH`] and must not contain control
/// characters.
///
/// # Examples
///
/// ```rust
/// use meta_guard::catalog::validate_name;
///
/// assert!(validate_name("customer_id").is_ok());
/// assert!(validate_name("Order Date").is_ok());
/// assert!(validate_name("   ").is_err());
/// assert!(validate_name("bad\u{0}name").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(MetaError::invalid_argument(
            "catalog names cannot be empty or whitespace-only",
        ));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(MetaError::invalid_argument(format!(
            "catalog name too long (max {MAX_NAME_LENGTH} bytes)"
        )));
    }

    static CONTROL_CHARS: Lazy<Regex> = Lazy::new(|| {
        // This regex is compile-time constant and known to be valid
        #[allow(clippy::expect_used)]
        Regex::new(r"\p{Cc}").expect("Hard-coded regex pattern should be valid")
    });

    if CONTROL_CHARS.is_match(name) {
        return Err(MetaError::invalid_argument(format!(
            "catalog name {name:?} contains control characters"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["id", "customer_id", "Order Date", "\"quoted\"", "naïve"] {
            assert!(validate_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name(" \t").is_err());
        assert!(validate_name("line\nbreak").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }
}
