use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Customer Number - shared business key
// ============================================================================
//
// Owned by the Customer service, but embedded in every account number, so
// both services parse it the same way.
//
// ============================================================================

pub const CUSTOMER_NUMBER_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid customer_number '{0}': must be exactly 7 digits")]
pub struct InvalidCustomerNumber(pub String);

/// Exactly 7 ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerNumber(String);

impl CustomerNumber {
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidCustomerNumber> {
        let value = value.into();
        if value.len() != CUSTOMER_NUMBER_LEN || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidCustomerNumber(value));
        }
        Ok(Self(value))
    }

    /// Builds a customer number from a sequence value, zero padded.
    pub fn from_sequence(sequence: u32) -> Result<Self, InvalidCustomerNumber> {
        Self::parse(format!("{:07}", sequence))
    }

    /// Caller guarantees `value` is already 7 ASCII digits.
    pub(crate) fn from_checked_digits(value: &str) -> Self {
        debug_assert!(value.len() == CUSTOMER_NUMBER_LEN && value.bytes().all(|b| b.is_ascii_digit()));
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CustomerNumber {
    type Error = InvalidCustomerNumber;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CustomerNumber> for String {
    fn from(value: CustomerNumber) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_customer_number() {
        let number = CustomerNumber::parse("1234567").unwrap();
        assert_eq!(number.as_str(), "1234567");
        assert_eq!(number.to_string(), "1234567");
    }

    #[test]
    fn test_rejects_wrong_length_and_non_digits() {
        assert!(CustomerNumber::parse("123456").is_err());
        assert!(CustomerNumber::parse("12345678").is_err());
        assert!(CustomerNumber::parse("12a4567").is_err());
        assert!(CustomerNumber::parse("").is_err());
        // Non-ASCII digits are rejected even when they are numeric
        assert!(CustomerNumber::parse("١٢٣٤٥٦٧").is_err());
    }

    #[test]
    fn test_from_sequence_pads() {
        assert_eq!(CustomerNumber::from_sequence(42).unwrap().as_str(), "0000042");
        assert!(CustomerNumber::from_sequence(10_000_000).is_err());
    }

    #[test]
    fn test_serde_validates() {
        let ok: CustomerNumber = serde_json::from_str("\"7654321\"").unwrap();
        assert_eq!(ok.as_str(), "7654321");
        assert!(serde_json::from_str::<CustomerNumber>("\"76\"").is_err());
    }
}
