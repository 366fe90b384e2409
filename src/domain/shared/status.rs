use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Lifecycle Status - the 5-state machine shared by accounts and customers
// ============================================================================
//
//   PENDING(0) ──► ACTIVE(1) ◄──► SUSPENDED(2)
//                     ▲
//                     └────────► FROZEN(3)
//
//   any non-CLOSED ──► CLOSED(4)   (terminal)
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    Pending,
    Active,
    Suspended,
    Frozen,
    Closed,
}

pub type AccountStatus = LifecycleStatus;
pub type CustomerStatus = LifecycleStatus;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusParseError {
    #[error("Invalid status code: {0}")]
    UnknownCode(i16),
    #[error("Invalid status: {0}")]
    UnknownName(String),
}

impl LifecycleStatus {
    pub const ALL: [LifecycleStatus; 5] = [
        LifecycleStatus::Pending,
        LifecycleStatus::Active,
        LifecycleStatus::Suspended,
        LifecycleStatus::Frozen,
        LifecycleStatus::Closed,
    ];

    /// Persisted integer code.
    pub fn code(self) -> i16 {
        match self {
            LifecycleStatus::Pending => 0,
            LifecycleStatus::Active => 1,
            LifecycleStatus::Suspended => 2,
            LifecycleStatus::Frozen => 3,
            LifecycleStatus::Closed => 4,
        }
    }

    pub fn from_code(code: i16) -> Result<Self, StatusParseError> {
        Self::ALL
            .into_iter()
            .find(|s| s.code() == code)
            .ok_or(StatusParseError::UnknownCode(code))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleStatus::Pending => "PENDING",
            LifecycleStatus::Active => "ACTIVE",
            LifecycleStatus::Suspended => "SUSPENDED",
            LifecycleStatus::Frozen => "FROZEN",
            LifecycleStatus::Closed => "CLOSED",
        }
    }

    pub fn is_active(self) -> bool {
        self == LifecycleStatus::Active
    }

    pub fn is_closed(self) -> bool {
        self == LifecycleStatus::Closed
    }

    /// Only ACTIVE accounts accept credit/debit.
    pub fn allows_transactions(self) -> bool {
        self.is_active()
    }

    /// Only ACTIVE customers may change name, address or type.
    pub fn allows_operations(self) -> bool {
        self.is_active()
    }

    pub fn can_transition_to(self, target: LifecycleStatus) -> bool {
        use LifecycleStatus::*;
        match (self, target) {
            (Closed, _) => false,
            (_, Closed) => true,
            (Pending, Active) => true,
            (Active, Suspended) | (Suspended, Active) => true,
            (Active, Frozen) | (Frozen, Active) => true,
            _ => false,
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| StatusParseError::UnknownName(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleStatus::*;

    #[test]
    fn test_codes_round_trip() {
        for status in LifecycleStatus::ALL {
            assert_eq!(LifecycleStatus::from_code(status.code()).unwrap(), status);
        }
        assert_eq!(Pending.code(), 0);
        assert_eq!(Closed.code(), 4);
        assert!(matches!(
            LifecycleStatus::from_code(5),
            Err(StatusParseError::UnknownCode(5))
        ));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(" frozen ".parse::<LifecycleStatus>().unwrap(), Frozen);
        assert!("DORMANT".parse::<LifecycleStatus>().is_err());
    }

    #[test]
    fn test_allowed_transitions() {
        assert!(Pending.can_transition_to(Active));
        assert!(Active.can_transition_to(Suspended));
        assert!(Suspended.can_transition_to(Active));
        assert!(Active.can_transition_to(Frozen));
        assert!(Frozen.can_transition_to(Active));
        for status in [Pending, Active, Suspended, Frozen] {
            assert!(status.can_transition_to(Closed), "{status} -> CLOSED");
        }
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!Pending.can_transition_to(Suspended));
        assert!(!Pending.can_transition_to(Frozen));
        assert!(!Suspended.can_transition_to(Frozen));
        assert!(!Frozen.can_transition_to(Suspended));
        assert!(!Active.can_transition_to(Pending));
        assert!(!Active.can_transition_to(Active));
        for status in LifecycleStatus::ALL {
            assert!(!Closed.can_transition_to(status));
        }
    }

    #[test]
    fn test_only_active_allows_transactions() {
        for status in LifecycleStatus::ALL {
            assert_eq!(status.allows_transactions(), status == Active);
        }
    }
}
