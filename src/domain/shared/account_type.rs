use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Saving,
    Investment,
    Salary,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid account type '{0}': must be one of SAVING, INVESTMENT, SALARY")]
pub struct InvalidAccountType(pub String);

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Saving => "SAVING",
            AccountType::Investment => "INVESTMENT",
            AccountType::Salary => "SALARY",
        }
    }

    pub fn is_salary(self) -> bool {
        self == AccountType::Salary
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = InvalidAccountType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SAVING" => Ok(AccountType::Saving),
            "INVESTMENT" => Ok(AccountType::Investment),
            "SALARY" => Ok(AccountType::Salary),
            _ => Err(InvalidAccountType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_type() {
        assert_eq!("salary".parse::<AccountType>().unwrap(), AccountType::Salary);
        assert_eq!(" Saving ".parse::<AccountType>().unwrap(), AccountType::Saving);
        assert!("CHECKING".parse::<AccountType>().is_err());
        assert!(AccountType::Salary.is_salary());
        assert!(!AccountType::Investment.is_salary());
    }
}
