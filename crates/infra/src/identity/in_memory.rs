use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use storegate_auth::validation::{is_valid_email, MIN_PASSWORD_LEN};
use storegate_auth::Identity;
use storegate_core::UserId;

use super::r#trait::{IdentityError, IdentityProvider};

/// Consecutive failed sign-ins before an email is throttled.
pub const MAX_FAILED_SIGN_INS: u32 = 5;

#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password_hash: String,
    disabled: bool,
    failed_sign_ins: u32,
}

/// In-memory identity provider for tests/dev.
///
/// Mirrors the managed provider's observable behavior: duplicate emails,
/// weak passwords, disabled accounts and throttling after repeated failures.
/// Reset emails are recorded instead of sent.
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    // Keyed by lowercase email.
    accounts: RwLock<HashMap<String, Account>>,
    reset_outbox: Mutex<Vec<String>>,
    reject_display_names: AtomicBool,
    latency: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

fn unavailable() -> IdentityError {
    IdentityError::Unavailable("lock poisoned".to_string())
}

fn hasher() -> Result<Argon2<'static>, IdentityError> {
    // Cheap parameters: this provider only ever holds test credentials.
    let params = Params::new(1024, 1, 1, None).map_err(|e| IdentityError::Other(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn hash_password(password: &str) -> Result<String, IdentityError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| IdentityError::Other(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| IdentityError::Other(e.to_string()))?;
    let phc = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| IdentityError::Other(e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    match (PasswordHash::new(hash), hasher()) {
        (Ok(parsed), Ok(argon2)) => argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
        _ => false,
    }
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of provider operations invoked so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Emails a password reset was dispatched to, oldest first.
    pub fn reset_emails(&self) -> Vec<String> {
        self.reset_outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }

    pub fn set_disabled(&self, email: &str, disabled: bool) -> bool {
        let Ok(mut accounts) = self.accounts.write() else {
            return false;
        };
        match accounts.get_mut(&email.to_lowercase()) {
            Some(account) => {
                account.disabled = disabled;
                true
            }
            None => false,
        }
    }

    /// Make every display-name update fail (advisory-path testing).
    pub fn reject_display_names(&self, reject: bool) {
        self.reject_display_names.store(reject, Ordering::SeqCst);
    }

    /// Delay every subsequent call (timeout testing).
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut guard) = self.latency.lock() {
            *guard = latency;
        }
    }

    async fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.latency.lock().ok().and_then(|guard| *guard);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        self.record_call().await;

        if !is_valid_email(email) {
            return Err(IdentityError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::WeakPassword);
        }

        let password_hash = hash_password(password)?;
        let mut accounts = self.accounts.write().map_err(|_| unavailable())?;
        let key = email.to_lowercase();
        if accounts.contains_key(&key) {
            return Err(IdentityError::EmailAlreadyInUse);
        }

        let uid = UserId::parse(Uuid::now_v7().simple().to_string())
            .map_err(|e| IdentityError::Other(e.to_string()))?;
        let identity = Identity {
            uid,
            email: email.to_string(),
            display_name: None,
            email_verified: false,
            created_at: Utc::now(),
            last_sign_in_at: None,
        };

        accounts.insert(
            key,
            Account {
                identity: identity.clone(),
                password_hash,
                disabled: false,
                failed_sign_ins: 0,
            },
        );
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        self.record_call().await;

        let mut accounts = self.accounts.write().map_err(|_| unavailable())?;
        let account = accounts
            .get_mut(&email.to_lowercase())
            .ok_or(IdentityError::UserNotFound)?;

        if account.disabled {
            return Err(IdentityError::UserDisabled);
        }
        if account.failed_sign_ins >= MAX_FAILED_SIGN_INS {
            return Err(IdentityError::TooManyRequests);
        }
        if !verify_password(&account.password_hash, password) {
            account.failed_sign_ins += 1;
            return Err(IdentityError::WrongPassword);
        }

        account.failed_sign_ins = 0;
        account.identity.last_sign_in_at = Some(Utc::now());
        Ok(account.identity.clone())
    }

    async fn sign_out(&self, _uid: &UserId) -> Result<(), IdentityError> {
        self.record_call().await;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        self.record_call().await;

        let accounts = self.accounts.read().map_err(|_| unavailable())?;
        if !accounts.contains_key(&email.to_lowercase()) {
            return Err(IdentityError::UserNotFound);
        }
        drop(accounts);

        self.reset_outbox
            .lock()
            .map_err(|_| unavailable())?
            .push(email.to_string());
        Ok(())
    }

    async fn update_display_name(&self, uid: &UserId, name: &str) -> Result<Identity, IdentityError> {
        self.record_call().await;

        if self.reject_display_names.load(Ordering::SeqCst) {
            return Err(IdentityError::Other("display name update rejected".to_string()));
        }

        let mut accounts = self.accounts.write().map_err(|_| unavailable())?;
        let account = accounts
            .values_mut()
            .find(|a| &a.identity.uid == uid)
            .ok_or(IdentityError::UserNotFound)?;
        account.identity.display_name = Some(name.to_string());
        Ok(account.identity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let idp = InMemoryIdentityProvider::new();
        idp.create_account("ana@example.com", "secret1").await.unwrap();

        let err = idp.create_account("ANA@example.com", "secret2").await.unwrap_err();
        assert_eq!(err, IdentityError::EmailAlreadyInUse);
    }

    #[tokio::test]
    async fn sign_in_checks_password_and_records_sign_in() {
        let idp = InMemoryIdentityProvider::new();
        let created = idp.create_account("ana@example.com", "secret1").await.unwrap();

        assert_eq!(
            idp.sign_in("ana@example.com", "wrong-pass").await,
            Err(IdentityError::WrongPassword)
        );
        assert_eq!(
            idp.sign_in("bob@example.com", "secret1").await,
            Err(IdentityError::UserNotFound)
        );

        let signed_in = idp.sign_in("ana@example.com", "secret1").await.unwrap();
        assert_eq!(signed_in.uid, created.uid);
        assert!(signed_in.last_sign_in_at.is_some());
    }

    #[tokio::test]
    async fn repeated_failures_throttle_the_account() {
        let idp = InMemoryIdentityProvider::new();
        idp.create_account("ana@example.com", "secret1").await.unwrap();

        for _ in 0..MAX_FAILED_SIGN_INS {
            let _ = idp.sign_in("ana@example.com", "bad-pass").await;
        }
        assert_eq!(
            idp.sign_in("ana@example.com", "secret1").await,
            Err(IdentityError::TooManyRequests)
        );
    }

    #[tokio::test]
    async fn disabled_accounts_cannot_sign_in() {
        let idp = InMemoryIdentityProvider::new();
        idp.create_account("ana@example.com", "secret1").await.unwrap();
        assert!(idp.set_disabled("ana@example.com", true));

        assert_eq!(
            idp.sign_in("ana@example.com", "secret1").await,
            Err(IdentityError::UserDisabled)
        );
    }

    #[tokio::test]
    async fn reset_emails_are_recorded_for_known_accounts_only() {
        let idp = InMemoryIdentityProvider::new();
        idp.create_account("ana@example.com", "secret1").await.unwrap();

        idp.send_password_reset("ana@example.com").await.unwrap();
        assert_eq!(
            idp.send_password_reset("ghost@example.com").await,
            Err(IdentityError::UserNotFound)
        );
        assert_eq!(idp.reset_emails(), vec!["ana@example.com".to_string()]);
    }
}
