use crate::domain::shared::CustomerStatus;

use super::value_objects::{Address, CustomerName, CustomerType};

// ============================================================================
// Customer Domain Commands
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum CustomerCommand {
    /// Absent fields are left untouched.
    UpdateDetails {
        name: Option<CustomerName>,
        address: Option<Address>,
        customer_type: Option<CustomerType>,
    },
    ChangeStatus {
        target: CustomerStatus,
        reason: Option<String>,
    },
}
