use thiserror::Error;

/// Rejected filter input. Everything here is the caller's fault, so these
/// surface as 400s rather than store failures.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Unknown collection: {0}")]
    InvalidCollection(String),

    #[error("Invalid field name: {0}")]
    InvalidField(String),

    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid operator data: {0}")]
    InvalidOperatorData(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),
}

impl FilterError {
    /// Field the error refers to, when there is one
    pub fn field(&self) -> Option<&str> {
        match self {
            FilterError::InvalidField(field) => Some(field),
            FilterError::InvalidLimit(_) => Some("limit"),
            FilterError::InvalidOffset(_) => Some("offset"),
            _ => None,
        }
    }
}
