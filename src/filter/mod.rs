pub mod contract_filter;
pub mod error;

pub use contract_filter::{ContractFilter, SqlParam, SqlWhere};
pub use error::FilterError;
