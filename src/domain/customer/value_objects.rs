use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::CustomerError;

// ============================================================================
// Customer Value Objects
// ============================================================================

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_ADDRESS_LEN: usize = 500;
pub const NATIONAL_ID_LEN: usize = 12;

/// Full customer name, trimmed, at most 255 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerName(String);

impl CustomerName {
    pub fn parse(value: &str) -> Result<Self, CustomerError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CustomerError::InvalidCustomerName {
                value: value.to_string(),
                reason: "cannot be empty".into(),
            });
        }
        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(CustomerError::InvalidCustomerName {
                value: value.to_string(),
                reason: format!("cannot exceed {} characters", MAX_NAME_LEN),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First whitespace-separated word.
    pub fn first_name(&self) -> &str {
        self.0.split_whitespace().next().unwrap_or("")
    }

    /// Everything after the first word, single-space joined.
    pub fn last_name(&self) -> String {
        self.0.split_whitespace().skip(1).collect::<Vec<_>>().join(" ")
    }

    /// Case-insensitive substring match used by name search.
    pub fn matches(&self, fragment: &str) -> bool {
        self.0.to_lowercase().contains(&fragment.trim().to_lowercase())
    }
}

impl fmt::Display for CustomerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CustomerName {
    type Error = CustomerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CustomerName> for String {
    fn from(value: CustomerName) -> Self {
        value.0
    }
}

/// Postal address, trimmed, at most 500 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(value: &str) -> Result<Self, CustomerError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CustomerError::InvalidAddress {
                value: value.to_string(),
                reason: "cannot be empty".into(),
            });
        }
        if trimmed.chars().count() > MAX_ADDRESS_LEN {
            return Err(CustomerError::InvalidAddress {
                value: value.to_string(),
                reason: format!("cannot exceed {} characters", MAX_ADDRESS_LEN),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = CustomerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

/// 12 ASCII digits, the first being the nationality code (1-4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NationalId(String);

impl NationalId {
    pub fn parse(value: &str) -> Result<Self, CustomerError> {
        let invalid = |reason: &str| CustomerError::InvalidNationalId {
            value: value.to_string(),
            reason: reason.to_string(),
        };
        if value.len() != NATIONAL_ID_LEN {
            return Err(invalid("must be exactly 12 digits"));
        }
        if !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("must contain only digits"));
        }
        if !matches!(value.as_bytes()[0], b'1'..=b'4') {
            return Err(invalid("must start with nationality code (1-4)"));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn nationality_code(&self) -> &str {
        &self.0[..1]
    }

    pub fn identification_number(&self) -> &str {
        &self.0[1..]
    }
}

impl fmt::Display for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NationalId {
    type Error = CustomerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NationalId> for String {
    fn from(value: NationalId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerType {
    Retail,
    Corporate,
    Investment,
}

impl CustomerType {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomerType::Retail => "RETAIL",
            CustomerType::Corporate => "CORPORATE",
            CustomerType::Investment => "INVESTMENT",
        }
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerType {
    type Err = CustomerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RETAIL" => Ok(CustomerType::Retail),
            "CORPORATE" => Ok(CustomerType::Corporate),
            "INVESTMENT" => Ok(CustomerType::Investment),
            _ => Err(CustomerError::InvalidCustomerType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_name_is_trimmed_and_split() {
        let name = CustomerName::parse("  Ada   King Lovelace ").unwrap();
        assert_eq!(name.as_str(), "Ada   King Lovelace");
        assert_eq!(name.first_name(), "Ada");
        assert_eq!(name.last_name(), "King Lovelace");

        let single = CustomerName::parse("Plato").unwrap();
        assert_eq!(single.last_name(), "");
    }

    #[test]
    fn test_name_rejects_blank_and_long() {
        assert!(CustomerName::parse("   ").is_err());
        assert!(CustomerName::parse(&"x".repeat(256)).is_err());
        assert!(CustomerName::parse(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn test_name_search_is_case_insensitive() {
        let name = CustomerName::parse("Grace Hopper").unwrap();
        assert!(name.matches("hop"));
        assert!(name.matches(" GRACE "));
        assert!(!name.matches("turing"));
    }

    #[test]
    fn test_address_limits() {
        assert_eq!(Address::parse(" 1 Main St ").unwrap().as_str(), "1 Main St");
        assert!(Address::parse("").is_err());
        assert!(Address::parse(&"a".repeat(501)).is_err());
    }

    #[test]
    fn test_national_id_rules() {
        let id = NationalId::parse("289012345678").unwrap();
        assert_eq!(id.nationality_code(), "2");
        assert_eq!(id.identification_number(), "89012345678");

        assert!(NationalId::parse("589012345678").is_err());
        assert!(NationalId::parse("089012345678").is_err());
        assert!(NationalId::parse("28901234567").is_err());
        assert!(NationalId::parse("28901234567x").is_err());
    }

    #[test]
    fn test_customer_type_parsing() {
        assert_eq!("retail".parse::<CustomerType>().unwrap(), CustomerType::Retail);
        assert_eq!(" Corporate ".parse::<CustomerType>().unwrap(), CustomerType::Corporate);
        assert!(matches!("vip".parse::<CustomerType>(), Err(CustomerError::InvalidCustomerType(_))));
    }

    #[test]
    fn test_value_objects_deserialize_through_validation() {
        assert!(serde_json::from_str::<NationalId>("\"999999999999\"").is_err());
        let name: CustomerName = serde_json::from_str("\" Alan Turing \"").unwrap();
        assert_eq!(name.as_str(), "Alan Turing");
    }

    proptest! {
        #[test]
        fn prop_valid_national_ids_parse(first in 1u8..=4, rest in "[0-9]{11}") {
            let raw = format!("{}{}", first, rest);
            let id = NationalId::parse(&raw).unwrap();
            prop_assert_eq!(format!("{}{}", id.nationality_code(), id.identification_number()), raw);
        }
    }
}
