pub mod contracts;
pub mod manager;
pub mod memory;
pub mod users;

use sqlx::PgPool;

pub use contracts::ContractRepository;
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use users::UserRepository;

/// PostgreSQL-backed store implementing every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
