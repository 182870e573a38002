pub mod contract;
pub mod user;
pub mod validation;

pub use contract::{Contract, ContractPatch, ContractStatus};
pub use user::{NewUser, Role, User};
pub use validation::{FieldError, ValidationErrors};
