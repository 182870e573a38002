use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FilterError {
    #[error("Unknown filter parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid value '{value}' for {param}: expected {expected}")]
    InvalidValue {
        param: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Filter parameter {0} may only be given once")]
    Repeated(&'static str),

    #[error("createdBy conflicts with mine=true")]
    ConflictingOwner,
}

impl FilterError {
    /// Query parameter the error refers to.
    pub fn param(&self) -> &str {
        match self {
            FilterError::UnknownParameter(param) => param,
            FilterError::InvalidValue { param, .. } => param,
            FilterError::Repeated(param) => param,
            FilterError::ConflictingOwner => "createdBy",
        }
    }
}
