use crate::domain::shared::{CustomerNumber, CustomerStatus, ErrorKind, InvalidCustomerNumber, StatusParseError};
use crate::utils::IsTransient;

// ============================================================================
// Customer Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CustomerError {
    // Not found
    #[error("Customer with number '{0}' not found")]
    CustomerNotFound(CustomerNumber),

    // Conflict
    #[error("Customer with national ID '{0}' already exists")]
    CustomerAlreadyExists(String),

    #[error("Customer with number '{0}' already exists")]
    CustomerNumberAlreadyExists(CustomerNumber),

    #[error("Customer '{customer_number}' was modified concurrently (expected version {expected}, found {actual})")]
    ConcurrentModification {
        customer_number: CustomerNumber,
        expected: i64,
        actual: i64,
    },

    // Invalid state
    #[error("Customer '{customer_number}' cannot transition from '{from}' to '{to}'")]
    InvalidStatusTransition {
        customer_number: CustomerNumber,
        from: CustomerStatus,
        to: CustomerStatus,
    },

    #[error("Cannot perform '{operation}' on customer '{customer_number}' in state '{status}'")]
    CannotPerformOperation {
        operation: &'static str,
        customer_number: CustomerNumber,
        status: CustomerStatus,
    },

    // Invalid data
    #[error("Invalid national ID '{value}': {reason}")]
    InvalidNationalId { value: String, reason: String },

    #[error(transparent)]
    InvalidCustomerNumber(#[from] InvalidCustomerNumber),

    #[error("Invalid customer name '{value}': {reason}")]
    InvalidCustomerName { value: String, reason: String },

    #[error("Invalid address '{value}': {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("Invalid customer type '{0}': must be RETAIL, CORPORATE, or INVESTMENT")]
    InvalidCustomerType(String),

    #[error(transparent)]
    InvalidStatus(#[from] StatusParseError),

    #[error("Required field '{0}' is missing")]
    MissingRequiredField(&'static str),

    #[error("At least one field must be provided for update")]
    NoUpdateFieldsProvided,

    // Unavailable
    #[error("Cannot load account summary for customer '{customer_number}': {reason}")]
    AccountSummaryUnavailable {
        customer_number: CustomerNumber,
        reason: String,
    },

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl CustomerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CustomerError::CustomerNotFound(_) => ErrorKind::NotFound,

            CustomerError::CustomerAlreadyExists(_)
            | CustomerError::CustomerNumberAlreadyExists(_)
            | CustomerError::ConcurrentModification { .. } => ErrorKind::Conflict,

            CustomerError::InvalidStatusTransition { .. } | CustomerError::CannotPerformOperation { .. } => {
                ErrorKind::InvalidState
            }

            CustomerError::InvalidNationalId { .. }
            | CustomerError::InvalidCustomerNumber(_)
            | CustomerError::InvalidCustomerName { .. }
            | CustomerError::InvalidAddress { .. }
            | CustomerError::InvalidCustomerType(_)
            | CustomerError::InvalidStatus(_)
            | CustomerError::MissingRequiredField(_)
            | CustomerError::NoUpdateFieldsProvided => ErrorKind::InvalidData,

            CustomerError::AccountSummaryUnavailable { .. } | CustomerError::Storage(_) => ErrorKind::Unavailable,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CustomerError::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            CustomerError::CustomerAlreadyExists(_) => "CUSTOMER_ALREADY_EXISTS",
            CustomerError::CustomerNumberAlreadyExists(_) => "CUSTOMER_NUMBER_ALREADY_EXISTS",
            CustomerError::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            CustomerError::InvalidStatusTransition { .. } | CustomerError::CannotPerformOperation { .. } => {
                "INVALID_CUSTOMER_STATE"
            }
            CustomerError::InvalidNationalId { .. }
            | CustomerError::MissingRequiredField(_)
            | CustomerError::NoUpdateFieldsProvided => "VALIDATION_ERROR",
            CustomerError::InvalidCustomerNumber(_)
            | CustomerError::InvalidCustomerName { .. }
            | CustomerError::InvalidAddress { .. }
            | CustomerError::InvalidCustomerType(_)
            | CustomerError::InvalidStatus(_) => "INVALID_CUSTOMER_DATA",
            CustomerError::AccountSummaryUnavailable { .. } => "ACCOUNT_SERVICE_UNAVAILABLE",
            CustomerError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl IsTransient for CustomerError {
    fn is_transient(&self) -> bool {
        matches!(self, CustomerError::ConcurrentModification { .. })
    }
}
