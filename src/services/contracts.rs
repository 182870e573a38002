use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::database::{ContractRepository, DatabaseError};
use crate::filter::ContractFilter;
use crate::models::{Contract, ContractPatch, ValidationErrors};

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Contract not found")]
    NotFound,

    #[error("You do not have permission to modify this contract")]
    NotOwner,

    #[error("database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for ContractError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(_) => ContractError::NotFound,
            other => ContractError::Database(other),
        }
    }
}

impl From<ValidationErrors> for ContractError {
    fn from(errors: ValidationErrors) -> Self {
        ContractError::Validation(errors)
    }
}

/// Listing operations: validation, ownership and persistence.
#[derive(Clone)]
pub struct ContractService {
    repo: Arc<dyn ContractRepository>,
}

impl ContractService {
    pub fn new(repo: Arc<dyn ContractRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, filter: &ContractFilter) -> Result<Vec<Contract>, ContractError> {
        Ok(self.repo.list(filter).await?)
    }

    pub async fn create(&self, patch: ContractPatch, owner: Uuid) -> Result<Contract, ContractError> {
        let contract = patch.into_contract(owner, Utc::now())?;
        let stored = self.repo.insert(contract).await?;
        tracing::info!("contract {} created by {}", stored.id, owner);
        Ok(stored)
    }

    /// Ids that do not parse are treated like ids that do not exist.
    pub async fn get_by_id(&self, id: &str) -> Result<Contract, ContractError> {
        let id = parse_id(id)?;
        self.repo.find_by_id(id).await?.ok_or(ContractError::NotFound)
    }

    /// Fetches a listing the caller is allowed to change.
    pub async fn get_owned(&self, id: &str, caller: Uuid) -> Result<Contract, ContractError> {
        let contract = self.get_by_id(id).await?;
        if contract.created_by != caller {
            tracing::warn!("user {} attempted to modify contract {} owned by {}", caller, contract.id, contract.created_by);
            return Err(ContractError::NotOwner);
        }
        Ok(contract)
    }

    pub async fn update_by_id(&self, id: &str, patch: ContractPatch, caller: Uuid) -> Result<Contract, ContractError> {
        let mut contract = self.get_owned(id, caller).await?;
        patch.apply(&mut contract, Utc::now())?;
        let stored = self.repo.update(contract).await?;
        tracing::info!("contract {} updated", stored.id);
        Ok(stored)
    }

    pub async fn delete_by_id(&self, id: &str, caller: Uuid) -> Result<(), ContractError> {
        let contract = self.get_owned(id, caller).await?;
        if !self.repo.delete(contract.id).await? {
            return Err(ContractError::NotFound);
        }
        tracing::info!("contract {} deleted", contract.id);
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), ContractError> {
        Ok(self.repo.ping().await?)
    }
}

fn parse_id(raw: &str) -> Result<Uuid, ContractError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ContractError::NotFound)
}
