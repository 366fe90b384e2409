use crate::domain::shared::AccountStatus;

use super::value_objects::Balance;

// ============================================================================
// Account Domain Commands
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum AccountCommand {
    Credit {
        amount: Balance,
        description: Option<String>,
    },
    Debit {
        amount: Balance,
        description: Option<String>,
    },
    /// Move to `target`; a CLOSED target is handled as `Close`.
    ChangeStatus {
        target: AccountStatus,
        reason: Option<String>,
    },
    Close {
        reason: Option<String>,
    },
}

impl AccountCommand {
    pub fn name(&self) -> &'static str {
        match self {
            AccountCommand::Credit { .. } => "credit",
            AccountCommand::Debit { .. } => "debit",
            AccountCommand::ChangeStatus { .. } => "change_status",
            AccountCommand::Close { .. } => "close",
        }
    }
}
