use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::shared::{CustomerNumber, CUSTOMER_NUMBER_LEN};

// ============================================================================
// Account Value Objects
// ============================================================================

pub const ACCOUNT_NUMBER_LEN: usize = 10;
pub const SERIAL_LEN: usize = ACCOUNT_NUMBER_LEN - CUSTOMER_NUMBER_LEN;
pub const BALANCE_SCALE: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid account_number '{0}': must be exactly 10 digits starting with customer number")]
pub struct InvalidAccountNumber(pub String);

/// 3-digit suffix of an account number, `001` for the first account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Serial(u16);

impl Serial {
    pub fn new(value: u16) -> Option<Self> {
        (1..=999).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

impl FromStr for Serial {
    type Err = InvalidAccountNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != SERIAL_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidAccountNumber(s.to_string()));
        }
        s.parse::<u16>()
            .ok()
            .and_then(Serial::new)
            .ok_or_else(|| InvalidAccountNumber(s.to_string()))
    }
}

/// Exactly 10 ASCII digits: 7-digit customer number followed by a 3-digit serial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidAccountNumber> {
        let value = value.into();
        if value.len() != ACCOUNT_NUMBER_LEN || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidAccountNumber(value));
        }
        Ok(Self(value))
    }

    pub fn compose(customer_number: &CustomerNumber, serial: Serial) -> Self {
        Self(format!("{}{}", customer_number, serial))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 7 digits.
    pub fn customer_number_str(&self) -> &str {
        &self.0[..CUSTOMER_NUMBER_LEN]
    }

    /// Last 3 digits.
    pub fn serial_number(&self) -> &str {
        &self.0[CUSTOMER_NUMBER_LEN..]
    }

    pub fn customer_number(&self) -> CustomerNumber {
        // Length and digits were checked on construction
        CustomerNumber::from_checked_digits(self.customer_number_str())
    }

    /// `None` only for the `000` suffix, which the allocator never hands out.
    pub fn serial(&self) -> Option<Serial> {
        self.serial_number().parse().ok()
    }

    pub fn belongs_to(&self, customer_number: &CustomerNumber) -> bool {
        self.customer_number_str() == customer_number.as_str()
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = InvalidAccountNumber;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AccountNumber> for String {
    fn from(value: AccountNumber) -> Self {
        value.0
    }
}

// ============================================================================
// Balance
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    #[error("Balance cannot be negative: {0}")]
    Negative(Decimal),
    #[error("Invalid amount '{0}': not a decimal number")]
    Unparseable(String),
    #[error("Balance arithmetic overflowed")]
    Overflow,
}

/// Non-negative monetary quantity, always exactly 3 fractional digits,
/// rounded half-up on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Balance(Decimal);

impl Balance {
    pub fn new(value: Decimal) -> Result<Self, BalanceError> {
        if value < Decimal::ZERO {
            return Err(BalanceError::Negative(value));
        }
        let mut rounded = value.round_dp_with_strategy(BALANCE_SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(BALANCE_SCALE);
        rounded.set_sign_positive(true);
        Ok(Self(rounded))
    }

    pub fn parse(value: &str) -> Result<Self, BalanceError> {
        let decimal = Decimal::from_str(value.trim())
            .map_err(|_| BalanceError::Unparseable(value.to_string()))?;
        Self::new(decimal)
    }

    pub fn zero() -> Self {
        Self(Decimal::new(0, BALANCE_SCALE))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn checked_add(&self, other: &Balance) -> Result<Balance, BalanceError> {
        let sum = self.0.checked_add(other.0).ok_or(BalanceError::Overflow)?;
        Balance::new(sum)
    }

    /// Fails instead of clamping when the result would be negative.
    pub fn checked_sub(&self, other: &Balance) -> Result<Balance, BalanceError> {
        let difference = self.0.checked_sub(other.0).ok_or(BalanceError::Overflow)?;
        Balance::new(difference)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Balance {
    type Error = BalanceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Balance::new(value)
    }
}

impl From<Balance> for Decimal {
    fn from(value: Balance) -> Self {
        value.0
    }
}

impl FromStr for Balance {
    type Err = BalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Balance::parse(s)
    }
}
