//! First-user-becomes-admin bootstrap.
//!
//! Observing an empty `users` collection is not enough on its own: two
//! registrations racing on an empty collection would both see it empty. The
//! admin role therefore also requires winning a single marker document, which
//! the store creates at most once (`create` fails on an existing key).

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use storegate_auth::Role;
use storegate_core::UserId;

use crate::document_store::{DocumentStore, DocumentStoreError};
use crate::users::UserRepository;

pub const SYSTEM_COLLECTION: &str = "_system";
pub const ADMIN_BOOTSTRAP_KEY: &str = "admin_bootstrap";

#[derive(Clone)]
pub struct AdminBootstrap {
    store: Arc<dyn DocumentStore>,
}

impl AdminBootstrap {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Role for a brand-new profile: `admin` for the single winner of the
    /// bootstrap claim on an empty collection, `user` for everyone else.
    pub async fn role_for_new_profile(
        &self,
        users: &UserRepository,
        uid: &UserId,
    ) -> Result<Role, DocumentStoreError> {
        if !users.is_empty().await? {
            return Ok(Role::User);
        }

        let mut marker = serde_json::Map::new();
        marker.insert("uid".to_string(), json!(uid.as_str()));
        marker.insert("claimed_at".to_string(), serde_json::to_value(Utc::now())?);

        match self
            .store
            .create(SYSTEM_COLLECTION, ADMIN_BOOTSTRAP_KEY, marker)
            .await
        {
            Ok(()) => {
                tracing::info!(uid = %uid, "bootstrap admin claimed");
                Ok(Role::Admin)
            }
            Err(DocumentStoreError::AlreadyExists) => {
                tracing::warn!(uid = %uid, "bootstrap admin already claimed; assigning user role");
                Ok(Role::User)
            }
            Err(e) => Err(e),
        }
    }

    /// Hand back a claim won by `uid` whose profile was never written, so the
    /// next profile created can still become admin. Returns whether a marker
    /// was removed; another claimant's marker is left alone.
    pub async fn release(&self, uid: &UserId) -> Result<bool, DocumentStoreError> {
        if self.claimant().await?.as_ref() != Some(uid) {
            return Ok(false);
        }
        match self.store.delete(SYSTEM_COLLECTION, ADMIN_BOOTSTRAP_KEY).await {
            Ok(()) => {
                tracing::info!(uid = %uid, "bootstrap admin claim released");
                Ok(true)
            }
            Err(DocumentStoreError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Identifier that won the bootstrap claim, if any.
    pub async fn claimant(&self) -> Result<Option<UserId>, DocumentStoreError> {
        let marker = self.store.get(SYSTEM_COLLECTION, ADMIN_BOOTSTRAP_KEY).await?;
        Ok(marker
            .as_ref()
            .and_then(|doc| doc.get("uid"))
            .and_then(Value::as_str)
            .and_then(|raw| UserId::parse(raw).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_store::InMemoryDocumentStore;
    use crate::users::NewProfile;

    fn uid(raw: &str) -> UserId {
        UserId::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn only_one_claim_on_empty_collection_wins() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let users = UserRepository::new(store.clone());
        let bootstrap = AdminBootstrap::new(store);

        // Both registrations observe an empty collection.
        let first = bootstrap.role_for_new_profile(&users, &uid("a")).await.unwrap();
        let second = bootstrap.role_for_new_profile(&users, &uid("b")).await.unwrap();

        assert_eq!(first, Role::Admin);
        assert_eq!(second, Role::User);
        assert_eq!(bootstrap.claimant().await.unwrap(), Some(uid("a")));
    }

    #[tokio::test]
    async fn released_claim_can_be_won_again() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let users = UserRepository::new(store.clone());
        let bootstrap = AdminBootstrap::new(store);

        assert_eq!(bootstrap.role_for_new_profile(&users, &uid("a")).await.unwrap(), Role::Admin);
        assert!(!bootstrap.release(&uid("b")).await.unwrap());
        assert_eq!(bootstrap.claimant().await.unwrap(), Some(uid("a")));

        assert!(bootstrap.release(&uid("a")).await.unwrap());
        assert_eq!(bootstrap.claimant().await.unwrap(), None);
        assert_eq!(bootstrap.role_for_new_profile(&users, &uid("b")).await.unwrap(), Role::Admin);
    }

    #[tokio::test]
    async fn concurrent_claims_yield_exactly_one_admin() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let users = UserRepository::new(store.clone());
        let bootstrap = AdminBootstrap::new(store);

        let mut handles = Vec::new();
        for i in 0..8 {
            let users = users.clone();
            let bootstrap = bootstrap.clone();
            handles.push(tokio::spawn(async move {
                bootstrap
                    .role_for_new_profile(&users, &uid(&format!("u{i}")))
                    .await
                    .unwrap()
            }));
        }

        let mut admins = 0;
        for handle in handles {
            if handle.await.unwrap() == Role::Admin {
                admins += 1;
            }
        }
        assert_eq!(admins, 1);
    }

    #[tokio::test]
    async fn populated_collection_never_claims() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let users = UserRepository::new(store.clone());
        let bootstrap = AdminBootstrap::new(store);

        users
            .create(NewProfile {
                uid: uid("existing"),
                email: "e@example.com".to_string(),
                name: "E".to_string(),
                role: Role::User,
                location: String::new(),
                experience: String::new(),
                email_verified: false,
                last_login_at: None,
            })
            .await
            .unwrap();

        let role = bootstrap.role_for_new_profile(&users, &uid("new")).await.unwrap();
        assert_eq!(role, Role::User);
        assert_eq!(bootstrap.claimant().await.unwrap(), None);
    }
}
