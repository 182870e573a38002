use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Token ids revoked by logout, kept until the token would expire anyway.
#[derive(Clone, Default)]
pub struct TokenDenylist {
    revoked: Arc<RwLock<HashMap<Uuid, i64>>>,
}

impl TokenDenylist {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn revoke(&self, jti: Uuid, expires_at: i64) {
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp > now);
        if expires_at > now {
            revoked.insert(jti, expires_at);
        }
    }

    pub async fn is_revoked(&self, jti: Uuid) -> bool {
        self.revoked.read().await.contains_key(&jti)
    }

    pub async fn len(&self) -> usize {
        self.revoked.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn revoked_ids_are_reported() {
        let denylist = TokenDenylist::new();
        let jti = Uuid::new_v4();
        assert!(!denylist.is_revoked(jti).await);

        denylist.revoke(jti, Utc::now().timestamp() + 60).await;
        assert!(denylist.is_revoked(jti).await);
        assert!(!denylist.is_revoked(Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn expired_entries_are_pruned() {
        let denylist = TokenDenylist::new();
        let now = Utc::now().timestamp();

        denylist.revoke(Uuid::new_v4(), now - 10).await;
        assert_eq!(denylist.len().await, 0);

        denylist.revoke(Uuid::new_v4(), now + 60).await;
        assert_eq!(denylist.len().await, 1);
    }
}
