//! User profile repository over the `users` collection.
//!
//! Profiles are keyed by the identity provider's account identifier and add
//! the gateway-owned fields (role, location, experience) on top of it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use storegate_auth::Role;
use storegate_core::UserId;

use crate::document_store::{Document, DocumentStore, DocumentStoreError};

pub const USERS_COLLECTION: &str = "users";

/// Stored user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: UserId,
    /// Mirror of the identity's email; the provider stays authoritative.
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Profile fields supplied by the caller; timestamps are assigned on create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub uid: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub location: String,
    pub experience: String,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Partial update: only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl ProfileChanges {
    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Default::default()
        }
    }

    pub fn last_login(at: DateTime<Utc>) -> Self {
        Self {
            last_login_at: Some(at),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Public-safe projection of a profile returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicProfile {
    pub uid: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub location: String,
    pub experience: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&UserProfile> for PublicProfile {
    fn from(p: &UserProfile) -> Self {
        Self {
            uid: p.uid.clone(),
            email: p.email.clone(),
            name: p.name.clone(),
            role: p.role,
            location: p.location.clone(),
            experience: p.experience.clone(),
            email_verified: p.email_verified,
            created_at: p.created_at,
            updated_at: p.updated_at,
            last_login_at: p.last_login_at,
        }
    }
}

fn to_document<T: Serialize>(value: &T) -> Result<Document, DocumentStoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(DocumentStoreError::Serialization(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

fn from_document(doc: Document) -> Result<UserProfile, DocumentStoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// CRUD over user profiles.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Write a new profile with server-assigned timestamps.
    ///
    /// Fails with `AlreadyExists` if the key is taken; callers that want
    /// idempotent creation check first.
    pub async fn create(&self, new: NewProfile) -> Result<UserProfile, DocumentStoreError> {
        let now = Utc::now();
        let profile = UserProfile {
            uid: new.uid,
            email: new.email,
            name: new.name,
            role: new.role,
            location: new.location,
            experience: new.experience,
            email_verified: new.email_verified,
            created_at: now,
            updated_at: now,
            last_login_at: new.last_login_at,
        };

        self.store
            .create(USERS_COLLECTION, profile.uid.as_str(), to_document(&profile)?)
            .await?;
        Ok(profile)
    }

    pub async fn get_by_id(&self, uid: &UserId) -> Result<UserProfile, DocumentStoreError> {
        self.find(uid).await?.ok_or(DocumentStoreError::NotFound)
    }

    /// Like [`Self::get_by_id`] but absence is `Ok(None)`.
    pub async fn find(&self, uid: &UserId) -> Result<Option<UserProfile>, DocumentStoreError> {
        self.store
            .get(USERS_COLLECTION, uid.as_str())
            .await?
            .map(from_document)
            .transpose()
    }

    /// Equality lookup on email. `Ok(None)` means no match; `Err` means the
    /// lookup itself failed.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserProfile>, DocumentStoreError> {
        let hits = self
            .store
            .find_by_field(USERS_COLLECTION, "email", &json!(email))
            .await?;
        hits.into_iter()
            .next()
            .map(|(_, doc)| from_document(doc))
            .transpose()
    }

    pub async fn list(&self) -> Result<Vec<UserProfile>, DocumentStoreError> {
        self.store
            .list(USERS_COLLECTION)
            .await?
            .into_iter()
            .map(|(_, doc)| from_document(doc))
            .collect()
    }

    pub async fn is_empty(&self) -> Result<bool, DocumentStoreError> {
        self.store.is_empty(USERS_COLLECTION).await
    }

    /// Merge `changes` and refresh `updated_at`; `NotFound` if absent.
    pub async fn update(
        &self,
        uid: &UserId,
        changes: ProfileChanges,
    ) -> Result<UserProfile, DocumentStoreError> {
        let mut fields = to_document(&changes)?;
        fields.insert("updated_at".to_string(), serde_json::to_value(Utc::now())?);

        let merged = self
            .store
            .update(USERS_COLLECTION, uid.as_str(), fields)
            .await?;
        from_document(merged)
    }

    pub async fn touch_last_login(&self, uid: &UserId) -> Result<UserProfile, DocumentStoreError> {
        self.update(uid, ProfileChanges::last_login(Utc::now())).await
    }

    /// Remove a profile; `NotFound` if absent (no "already deleted" distinction).
    pub async fn delete(&self, uid: &UserId) -> Result<(), DocumentStoreError> {
        self.store.delete(USERS_COLLECTION, uid.as_str()).await
    }
}
