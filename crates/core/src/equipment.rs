//! Equipment category constants and validation.

use crate::error::CoreError;

pub const CATEGORY_DIAGNOSTIC: &str = "diagnostic";
pub const CATEGORY_MONITORING: &str = "monitoring";
pub const CATEGORY_LIFE_SUPPORT: &str = "life_support";
pub const CATEGORY_SURGICAL: &str = "surgical";
pub const CATEGORY_LABORATORY: &str = "laboratory";
pub const CATEGORY_OTHER: &str = "other";

/// All valid equipment categories. Must match the `CHECK` constraint on
/// `equipment.category`.
pub const VALID_CATEGORIES: &[&str] = &[
    CATEGORY_DIAGNOSTIC,
    CATEGORY_MONITORING,
    CATEGORY_LIFE_SUPPORT,
    CATEGORY_SURGICAL,
    CATEGORY_LABORATORY,
    CATEGORY_OTHER,
];

/// Maximum length of a serial number.
pub const MAX_SERIAL_NUMBER_LENGTH: usize = 100;

pub fn validate_category(category: &str) -> Result<(), CoreError> {
    if VALID_CATEGORIES.contains(&category) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid category '{category}'. Must be one of: {}",
            VALID_CATEGORIES.join(", ")
        )))
    }
}

/// Serial numbers are printed on labels; reject blanks and embedded whitespace.
pub fn validate_serial_number(serial: &str) -> Result<(), CoreError> {
    if serial.is_empty() || serial.len() > MAX_SERIAL_NUMBER_LENGTH {
        return Err(CoreError::Validation(format!(
            "Serial number must be 1-{MAX_SERIAL_NUMBER_LENGTH} characters"
        )));
    }
    if serial.chars().any(char::is_whitespace) {
        return Err(CoreError::Validation(format!(
            "Serial number '{serial}' must not contain whitespace"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories_accepted() {
        for category in VALID_CATEGORIES {
            assert!(validate_category(category).is_ok());
        }
    }

    #[test]
    fn test_unknown_category_rejected() {
        let err = validate_category("kitchen").unwrap_err();
        assert!(err.to_string().contains("life_support"));
    }

    #[test]
    fn test_serial_number_rules() {
        assert!(validate_serial_number("VENT-0042").is_ok());
        assert!(validate_serial_number("").is_err());
        assert!(validate_serial_number("VENT 0042").is_err());
        assert!(validate_serial_number(&"x".repeat(101)).is_err());
    }
}
