use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::users::EMAIL_TAKEN;
use super::{ContractRepository, DatabaseError, UserRepository};
use crate::filter::ContractFilter;
use crate::models::{Contract, NewUser, User};

/// Process-local store for `--memory` runs and integration tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    // Insertion order; listing reverses it.
    contracts: Arc<RwLock<Vec<Contract>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(DatabaseError::Conflict(EMAIL_TAKEN.to_string()));
        }
        let user = user.into_user(Uuid::new_v4(), Utc::now());
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl ContractRepository for MemoryStore {
    async fn list(&self, filter: &ContractFilter) -> Result<Vec<Contract>, DatabaseError> {
        let contracts = self.contracts.read().await;
        let mut matching: Vec<Contract> = contracts.iter().rev().filter(|c| filter.matches(c)).cloned().collect();
        // Stable: equal timestamps keep newest-inserted first.
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn insert(&self, contract: Contract) -> Result<Contract, DatabaseError> {
        let mut contracts = self.contracts.write().await;
        if contracts.iter().any(|c| c.id == contract.id) {
            return Err(DatabaseError::Conflict("Contract already exists".to_string()));
        }
        contracts.push(contract.clone());
        Ok(contract)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contract>, DatabaseError> {
        Ok(self.contracts.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn update(&self, contract: Contract) -> Result<Contract, DatabaseError> {
        let mut contracts = self.contracts.write().await;
        let slot = contracts
            .iter_mut()
            .find(|c| c.id == contract.id)
            .ok_or_else(|| DatabaseError::NotFound("Contract not found".to_string()))?;

        let mut updated = contract;
        updated.created_by = slot.created_by;
        updated.created_at = slot.created_at;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut contracts = self.contracts.write().await;
        let before = contracts.len();
        contracts.retain(|c| c.id != id);
        Ok(contracts.len() < before)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContractPatch, Role};
    use chrono::Duration;
    use std::collections::BTreeMap;

    fn contract(owner: Uuid, crop: &str, state: &str, price: &str) -> Contract {
        let fields: BTreeMap<String, String> = [
            ("cropName", crop),
            ("cropCategory", "Cereals"),
            ("quantity", "100"),
            ("expectedYieldDate", "2025-03-01"),
            ("address", "Ward 4"),
            ("state", state),
            ("district", "Ludhiana"),
            ("village", "Khanna"),
            ("pinCode", "141401"),
            ("farmArea", "2"),
            ("expectedPrice", price),
            ("minPrice", "1"),
            ("paymentMode", "UPI"),
            ("preferredBuyerType", "Retailer"),
            ("contractDuration", "3 months"),
            ("deliveryResponsibility", "Buyer"),
            ("deliveryLocation", "Farm gate"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        ContractPatch::from_fields(&fields)
            .with_files(None, Some("uploads/1-id.pdf".into()), None)
            .into_contract(owner, Utc::now())
            .unwrap()
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Gurpreet".into(),
            email: email.into(),
            role: Role::Farmer,
            password_hash: "$argon2id$hash".into(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let user = UserRepository::create(&store, new_user("g@farm.in")).await.unwrap();
        assert_eq!(store.find_by_email("g@farm.in").await.unwrap().map(|u| u.id), Some(user.id));
        assert!(matches!(
            UserRepository::create(&store, new_user("g@farm.in")).await,
            Err(DatabaseError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_filtered() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();

        let mut older = contract(owner, "Wheat", "Punjab", "2000");
        older.created_at = Utc::now() - Duration::hours(1);
        store.insert(older.clone()).await.unwrap();
        let newer = store.insert(contract(owner, "Basmati Rice", "Haryana", "3500")).await.unwrap();

        let all = store.list(&ContractFilter::default()).await.unwrap();
        assert_eq!(all.iter().map(|c| c.id).collect::<Vec<_>>(), vec![newer.id, older.id]);

        let pairs = vec![("search".to_string(), "rice".to_string()), ("minPrice".to_string(), "3000".to_string())];
        let filter = ContractFilter::from_pairs(&pairs, owner).unwrap();
        let found = store.list(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, newer.id);

        let pairs = vec![("state".to_string(), "Punjab".to_string()), ("state".to_string(), "Haryana".to_string())];
        let filter = ContractFilter::from_pairs(&pairs, owner).unwrap();
        assert_eq!(store.list(&filter).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_preserves_owner_and_delete_reports_absence() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let stored = store.insert(contract(owner, "Maize", "Bihar", "1800")).await.unwrap();

        let mut changed = stored.clone();
        changed.created_by = Uuid::new_v4();
        changed.expected_price = 1900.0;
        let updated = store.update(changed).await.unwrap();
        assert_eq!(updated.created_by, owner);
        assert_eq!(updated.expected_price, 1900.0);

        assert!(store.delete(stored.id).await.unwrap());
        assert!(!store.delete(stored.id).await.unwrap());
        assert!(matches!(store.update(stored).await, Err(DatabaseError::NotFound(_))));
    }
}
