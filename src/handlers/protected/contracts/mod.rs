// handlers/protected/contracts/mod.rs - Contract listing endpoints
//
// GET/POST /api/v1/contracts and GET/PUT/DELETE /api/v1/contracts/:id.
// Create and update take multipart forms handled by the upload intake.

use serde::Serialize;

use crate::models::Contract;

pub mod create;
pub mod list;
pub mod record;

pub use create::create;
pub use list::list;
pub use record::{delete, get, update};

#[derive(Debug, Serialize)]
pub struct ContractBody {
    pub contract: Contract,
}
