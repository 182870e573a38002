pub mod cookie;
pub mod denylist;
pub mod password;
pub mod token;

pub use denylist::TokenDenylist;
pub use password::{hash_password, verify_password, PasswordError, MIN_PASSWORD_LENGTH};
pub use token::{Claims, IssuedToken, TokenError, TokenIssuer};
