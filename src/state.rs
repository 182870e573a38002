use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::{TokenDenylist, TokenIssuer};
use crate::chat::{ChatBackend, ChatService, GeminiBackend};
use crate::config::AppConfig;
use crate::database::{ContractRepository, MemoryStore, PgStore, UserRepository};
use crate::services::{AccountService, ContractService};
use crate::uploads::UploadIntake;

/// Shared handles passed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: AccountService,
    pub contracts: ContractService,
    pub tokens: TokenIssuer,
    pub denylist: TokenDenylist,
    pub uploads: UploadIntake,
    pub chat: ChatService,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        contracts: Arc<dyn ContractRepository>,
    ) -> anyhow::Result<Self> {
        let tokens = TokenIssuer::from_config(&config.security)?;
        let backend = GeminiBackend::from_config(&config.chat)?.map(|b| Arc::new(b) as Arc<dyn ChatBackend>);

        Ok(Self {
            accounts: AccountService::new(users),
            contracts: ContractService::new(contracts),
            tokens,
            denylist: TokenDenylist::new(),
            uploads: UploadIntake::new(&config.uploads),
            chat: ChatService::new(backend, config.chat.max_history),
            config: Arc::new(config),
        })
    }

    pub fn postgres(config: AppConfig, pool: PgPool) -> anyhow::Result<Self> {
        let store = Arc::new(PgStore::new(pool));
        Self::new(config, store.clone(), store)
    }

    pub fn in_memory(config: AppConfig) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store)
    }

    /// Replaces the assistant backend chosen from configuration.
    pub fn with_chat_backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.chat = ChatService::new(Some(backend), self.config.chat.max_history);
        self
    }
}
