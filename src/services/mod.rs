pub mod accounts;
pub mod contracts;

pub use accounts::{AccountError, AccountService, LoginRequest, SignupRequest};
pub use contracts::{ContractError, ContractService};
