//! Authentication workflow: registration, login, logout, password reset.
//!
//! The only component that talks to both the identity provider and the user
//! repository, and therefore the one that keeps them consistent:
//! - input is validated before any external call;
//! - provider errors are translated into [`AuthError`];
//! - an existing profile's role is never overwritten by register/login;
//! - the first profile ever created becomes `admin` (see [`AdminBootstrap`]).

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use storegate_auth::policy::ensure_can_create_with_role;
use storegate_auth::validation::{
    validate_login, validate_new_account, validate_registration, validate_reset,
};
use storegate_auth::{Advisory, AuthError, Identity, Outcome, Principal, Role, SessionTokenService};
use storegate_core::UserId;

use crate::bootstrap::AdminBootstrap;
use crate::document_store::DocumentStoreError;
use crate::identity::{IdentityError, IdentityProvider};
use crate::users::{NewProfile, PublicProfile, UserProfile, UserRepository};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetPasswordInput {
    pub email: Option<String>,
}

/// Admin-side account creation (identity + profile in one step).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAccountInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub experience: String,
}

/// A freshly issued session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub user: PublicProfile,
}

/// How to pick the role when a profile has to be created.
#[derive(Debug, Clone, Copy)]
enum NewProfileRole {
    Bootstrap,
    Fixed(Role),
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn translate_create(err: IdentityError) -> AuthError {
    match err {
        IdentityError::EmailAlreadyInUse => AuthError::EmailAlreadyRegistered,
        IdentityError::WeakPassword => AuthError::WeakPassword,
        IdentityError::InvalidEmail => AuthError::InvalidEmail,
        other => translate_common(other),
    }
}

fn translate_sign_in(err: IdentityError) -> AuthError {
    match err {
        IdentityError::UserNotFound
        | IdentityError::WrongPassword
        | IdentityError::InvalidCredential => AuthError::InvalidCredentials,
        IdentityError::UserDisabled => AuthError::AccountDisabled,
        other => translate_common(other),
    }
}

fn translate_reset(err: IdentityError) -> AuthError {
    match err {
        IdentityError::UserNotFound => AuthError::NoSuchUser,
        IdentityError::InvalidEmail => AuthError::InvalidEmail,
        other => translate_common(other),
    }
}

fn translate_common(err: IdentityError) -> AuthError {
    match err {
        IdentityError::TooManyRequests => AuthError::RateLimited,
        IdentityError::UserDisabled => AuthError::AccountDisabled,
        IdentityError::Unavailable(msg) => AuthError::AdapterUnavailable(msg),
        other => AuthError::Internal(format!("identity provider: {}", other.code())),
    }
}

#[derive(Clone)]
pub struct AuthWorkflow {
    identity: Arc<dyn IdentityProvider>,
    users: UserRepository,
    bootstrap: AdminBootstrap,
    tokens: Arc<SessionTokenService>,
}

impl AuthWorkflow {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        users: UserRepository,
        bootstrap: AdminBootstrap,
        tokens: Arc<SessionTokenService>,
    ) -> Self {
        Self {
            identity,
            users,
            bootstrap,
            tokens,
        }
    }

    pub fn tokens(&self) -> &SessionTokenService {
        &self.tokens
    }

    /// Validate -> create identity -> display name (advisory) -> bootstrap
    /// role -> upsert profile -> issue token.
    pub async fn register(&self, input: RegisterInput) -> Result<Outcome<AuthSession>, AuthError> {
        validate_registration(input.email.as_deref(), input.password.as_deref())?;
        let email = input.email.as_deref().unwrap_or_default().trim();
        let password = input.password.as_deref().unwrap_or_default();

        let identity = self
            .identity
            .create_account(email, password)
            .await
            .map_err(|e| {
                tracing::info!(code = e.code(), "identity creation rejected");
                translate_create(e)
            })?;

        let mut advisories = Vec::new();
        let identity = self
            .apply_display_name(identity, non_blank(input.name.as_deref()), &mut advisories)
            .await;

        let profile = self
            .ensure_profile(&identity, NewProfileRole::Bootstrap, &mut advisories)
            .await?;
        let token = self.tokens.issue(&identity, profile.role)?;

        tracing::info!(uid = %identity.uid, role = %profile.role, "account registered");
        Ok(Outcome::with_advisories(
            AuthSession {
                token,
                user: PublicProfile::from(&profile),
            },
            advisories,
        ))
    }

    /// Provider sign-in -> role from the existing profile (else `user`) ->
    /// upsert profile -> issue token.
    pub async fn login(&self, input: LoginInput) -> Result<Outcome<AuthSession>, AuthError> {
        validate_login(input.email.as_deref(), input.password.as_deref())?;
        let email = input.email.as_deref().unwrap_or_default().trim();
        let password = input.password.as_deref().unwrap_or_default();

        let identity = self.identity.sign_in(email, password).await.map_err(|e| {
            tracing::info!(code = e.code(), "sign-in rejected");
            translate_sign_in(e)
        })?;

        let mut advisories = Vec::new();
        let profile = self
            .ensure_profile(&identity, NewProfileRole::Fixed(Role::User), &mut advisories)
            .await?;
        let token = self.tokens.issue(&identity, profile.role)?;

        tracing::info!(uid = %identity.uid, role = %profile.role, "login succeeded");
        Ok(Outcome::with_advisories(
            AuthSession {
                token,
                user: PublicProfile::from(&profile),
            },
            advisories,
        ))
    }

    /// Provider sign-out. Tokens stay valid until they expire.
    pub async fn logout(&self, uid: &UserId) -> Result<(), AuthError> {
        self.identity
            .sign_out(uid)
            .await
            .map_err(translate_common)?;
        tracing::info!(uid = %uid, "logout");
        Ok(())
    }

    pub async fn reset_password(&self, input: ResetPasswordInput) -> Result<(), AuthError> {
        validate_reset(input.email.as_deref())?;
        let email = input.email.as_deref().unwrap_or_default().trim();

        self.identity
            .send_password_reset(email)
            .await
            .map_err(translate_reset)?;
        tracing::info!("password reset email dispatched");
        Ok(())
    }

    /// Admin-side creation of an account with an explicit role.
    pub async fn create_account(
        &self,
        actor: &Principal,
        input: CreateAccountInput,
    ) -> Result<Outcome<PublicProfile>, AuthError> {
        validate_new_account(
            input.email.as_deref(),
            input.password.as_deref(),
            input.name.as_deref(),
        )?;
        let role = match non_blank(input.role.as_deref()) {
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|e| AuthError::Validation(vec![e.to_string()]))?,
            None => Role::User,
        };
        ensure_can_create_with_role(actor, role)?;

        let email = input.email.as_deref().unwrap_or_default().trim();
        let password = input.password.as_deref().unwrap_or_default();
        let name = input.name.as_deref().unwrap_or_default().trim();

        let identity = self
            .identity
            .create_account(email, password)
            .await
            .map_err(translate_create)?;

        let mut advisories = Vec::new();
        let identity = self
            .apply_display_name(identity, Some(name), &mut advisories)
            .await;

        let profile = self
            .users
            .create(NewProfile {
                uid: identity.uid.clone(),
                email: identity.email.clone(),
                name: name.to_string(),
                role,
                location: input.location,
                experience: input.experience,
                email_verified: identity.email_verified,
                last_login_at: None,
            })
            .await?;

        tracing::info!(actor = %actor.user_id, uid = %profile.uid, role = %role, "account created by admin");
        Ok(Outcome::with_advisories(PublicProfile::from(&profile), advisories))
    }

    pub async fn profile(&self, uid: &UserId) -> Result<PublicProfile, AuthError> {
        let profile = self.users.get_by_id(uid).await?;
        Ok(PublicProfile::from(&profile))
    }

    async fn apply_display_name(
        &self,
        identity: Identity,
        name: Option<&str>,
        advisories: &mut Vec<Advisory>,
    ) -> Identity {
        let Some(name) = name else {
            return identity;
        };

        match self.identity.update_display_name(&identity.uid, name).await {
            Ok(updated) => updated,
            Err(e) => {
                let advisory = Advisory::DisplayNameNotSet {
                    uid: identity.uid.clone(),
                    reason: e.to_string(),
                };
                advisories.push(advisory);
                Identity {
                    display_name: Some(name.to_string()),
                    ..identity
                }
            }
        }
    }

    /// Create the profile if missing, otherwise only refresh its last login.
    /// The role of an existing profile is never touched here.
    async fn ensure_profile(
        &self,
        identity: &Identity,
        new_role: NewProfileRole,
        advisories: &mut Vec<Advisory>,
    ) -> Result<UserProfile, AuthError> {
        if let Some(existing) = self.users.find(&identity.uid).await? {
            return Ok(self.refresh_last_login(existing, advisories).await);
        }

        let role = match new_role {
            NewProfileRole::Bootstrap => {
                self.bootstrap
                    .role_for_new_profile(&self.users, &identity.uid)
                    .await?
            }
            NewProfileRole::Fixed(role) => role,
        };

        let created = self
            .users
            .create(NewProfile {
                uid: identity.uid.clone(),
                email: identity.email.clone(),
                name: identity.name_or_email_prefix(),
                role,
                location: String::new(),
                experience: String::new(),
                email_verified: identity.email_verified,
                last_login_at: Some(Utc::now()),
            })
            .await;

        match created {
            Ok(profile) => Ok(profile),
            // Lost a race with a concurrent login for the same account.
            Err(DocumentStoreError::AlreadyExists) => {
                let existing = self.users.get_by_id(&identity.uid).await?;
                Ok(self.refresh_last_login(existing, advisories).await)
            }
            Err(e) => {
                if role.is_admin() && matches!(new_role, NewProfileRole::Bootstrap) {
                    self.release_bootstrap_claim(&identity.uid).await;
                }
                Err(e.into())
            }
        }
    }

    /// The request is failing anyway, so a release failure is only logged.
    async fn release_bootstrap_claim(&self, uid: &UserId) {
        if let Err(e) = self.bootstrap.release(uid).await {
            let advisory = Advisory::BootstrapClaimNotReleased {
                uid: uid.clone(),
                reason: e.to_string(),
            };
            Outcome::with_advisories((), vec![advisory]).log_advisories();
        }
    }

    async fn refresh_last_login(
        &self,
        existing: UserProfile,
        advisories: &mut Vec<Advisory>,
    ) -> UserProfile {
        match self.users.touch_last_login(&existing.uid).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                let advisory = Advisory::LastLoginNotRefreshed {
                    uid: existing.uid.clone(),
                    reason: e.to_string(),
                };
                advisories.push(advisory);
                existing
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::document_store::{Document, DocumentStore, InMemoryDocumentStore};
    use crate::identity::InMemoryIdentityProvider;
    use crate::users::USERS_COLLECTION;

    /// Fails the next `create` into `users` once, delegating everything else.
    struct FlakyUsersStore {
        inner: InMemoryDocumentStore,
        fail_next_user_create: AtomicBool,
    }

    #[async_trait]
    impl DocumentStore for FlakyUsersStore {
        async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, DocumentStoreError> {
            self.inner.get(collection, key).await
        }

        async fn create(&self, collection: &str, key: &str, doc: Document) -> Result<(), DocumentStoreError> {
            if collection == USERS_COLLECTION && self.fail_next_user_create.swap(false, Ordering::SeqCst) {
                return Err(DocumentStoreError::Unavailable("transient".to_string()));
            }
            self.inner.create(collection, key, doc).await
        }

        async fn set(&self, collection: &str, key: &str, doc: Document) -> Result<(), DocumentStoreError> {
            self.inner.set(collection, key, doc).await
        }

        async fn update(
            &self,
            collection: &str,
            key: &str,
            fields: Document,
        ) -> Result<Document, DocumentStoreError> {
            self.inner.update(collection, key, fields).await
        }

        async fn delete(&self, collection: &str, key: &str) -> Result<(), DocumentStoreError> {
            self.inner.delete(collection, key).await
        }

        async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, DocumentStoreError> {
            self.inner.list(collection).await
        }

        async fn find_by_field(
            &self,
            collection: &str,
            field: &str,
            value: &Value,
        ) -> Result<Vec<(String, Document)>, DocumentStoreError> {
            self.inner.find_by_field(collection, field, value).await
        }
    }

    struct Fixture {
        workflow: AuthWorkflow,
        provider: Arc<InMemoryIdentityProvider>,
        store: Arc<InMemoryDocumentStore>,
        users: UserRepository,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryDocumentStore::new());
        let provider = Arc::new(InMemoryIdentityProvider::new());
        let users = UserRepository::new(store.clone());
        let workflow = AuthWorkflow::new(
            provider.clone(),
            users.clone(),
            AdminBootstrap::new(store.clone()),
            Arc::new(SessionTokenService::with_default_lifetime("workflow-test-secret")),
        );
        Fixture {
            workflow,
            provider,
            store,
            users,
        }
    }

    fn register_input(email: &str, name: Option<&str>) -> RegisterInput {
        RegisterInput {
            email: Some(email.to_string()),
            password: Some("secret123".to_string()),
            name: name.map(str::to_string),
        }
    }

    fn login_input(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn first_registration_is_admin_then_user() {
        let fx = fixture();

        let first = fx
            .workflow
            .register(register_input("a@x.io", Some("A")))
            .await
            .unwrap();
        let second = fx
            .workflow
            .register(register_input("b@x.io", Some("B")))
            .await
            .unwrap();

        assert_eq!(first.value.user.role, Role::Admin);
        assert_eq!(second.value.user.role, Role::User);
        assert!(first.is_clean());
    }

    #[tokio::test]
    async fn register_token_round_trips_to_the_returned_user() {
        let fx = fixture();

        let session = fx
            .workflow
            .register(register_input("alice@example.com", Some("Alice")))
            .await
            .unwrap()
            .value;
        let claims = fx.workflow.tokens().verify(&session.token).unwrap();

        assert_eq!(claims.sub, session.user.uid);
        assert_eq!(claims.email, session.user.email);
        assert_eq!(claims.role, session.user.role);
        assert_eq!(claims.name, "Alice");
    }

    #[tokio::test]
    async fn invalid_registration_makes_no_external_calls() {
        let fx = fixture();

        let err = fx
            .workflow
            .register(RegisterInput {
                email: Some("not-an-email".to_string()),
                password: Some("123".to_string()),
                name: None,
            })
            .await
            .unwrap_err();

        match err {
            AuthError::Validation(details) => assert_eq!(details.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(fx.provider.calls(), 0);
        assert!(fx.users.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let fx = fixture();
        fx.workflow
            .register(register_input("dup@x.io", None))
            .await
            .unwrap();

        let err = fx
            .workflow
            .register(register_input("dup@x.io", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailAlreadyRegistered));
    }

    #[tokio::test]
    async fn display_name_failure_is_advisory() {
        let fx = fixture();
        fx.provider.reject_display_names(true);

        let outcome = fx
            .workflow
            .register(register_input("n@x.io", Some("Nia")))
            .await
            .unwrap();

        assert!(matches!(
            outcome.advisories.as_slice(),
            [Advisory::DisplayNameNotSet { .. }]
        ));
        assert_eq!(outcome.value.user.name, "Nia");
        fx.workflow.tokens().verify(&outcome.value.token).unwrap();
    }

    #[tokio::test]
    async fn login_keeps_the_stored_role() {
        let fx = fixture();
        let admin = fx
            .workflow
            .register(register_input("root@x.io", Some("Root")))
            .await
            .unwrap()
            .value;
        assert_eq!(admin.user.role, Role::Admin);

        let session = fx
            .workflow
            .login(login_input("root@x.io", "secret123"))
            .await
            .unwrap()
            .value;
        let claims = fx.workflow.tokens().verify(&session.token).unwrap();

        assert_eq!(claims.role, Role::Admin);
        assert!(session.user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn login_creates_missing_profile_with_user_role() {
        let fx = fixture();
        // Provider-only identity: account exists, profile does not.
        fx.provider
            .create_account("orphan@x.io", "secret123")
            .await
            .unwrap();

        let session = fx
            .workflow
            .login(login_input("orphan@x.io", "secret123"))
            .await
            .unwrap()
            .value;

        assert_eq!(session.user.role, Role::User);
        assert_eq!(session.user.name, "orphan");
        assert!(fx.users.find(&session.user.uid).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn login_failures_map_to_taxonomy() {
        let fx = fixture();
        fx.workflow
            .register(register_input("c@x.io", None))
            .await
            .unwrap();

        let wrong = fx
            .workflow
            .login(login_input("c@x.io", "wrong-password"))
            .await
            .unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));

        let unknown = fx
            .workflow
            .login(login_input("ghost@x.io", "secret123"))
            .await
            .unwrap_err();
        assert!(matches!(unknown, AuthError::InvalidCredentials));

        fx.provider.set_disabled("c@x.io", true);
        let disabled = fx
            .workflow
            .login(login_input("c@x.io", "secret123"))
            .await
            .unwrap_err();
        assert!(matches!(disabled, AuthError::AccountDisabled));
    }

    #[tokio::test]
    async fn repeated_failures_are_rate_limited() {
        let fx = fixture();
        fx.workflow
            .register(register_input("r@x.io", None))
            .await
            .unwrap();

        for _ in 0..crate::identity::in_memory::MAX_FAILED_SIGN_INS {
            let _ = fx.workflow.login(login_input("r@x.io", "nope-nope")).await;
        }
        let err = fx
            .workflow
            .login(login_input("r@x.io", "secret123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RateLimited));
    }

    #[tokio::test]
    async fn reset_password_for_unknown_account_is_no_such_user() {
        let fx = fixture();
        fx.workflow
            .register(register_input("known@x.io", None))
            .await
            .unwrap();

        fx.workflow
            .reset_password(ResetPasswordInput {
                email: Some("known@x.io".to_string()),
            })
            .await
            .unwrap();
        let err = fx
            .workflow
            .reset_password(ResetPasswordInput {
                email: Some("unknown@x.io".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::NoSuchUser));
        assert_eq!(fx.provider.reset_emails(), vec!["known@x.io".to_string()]);
    }

    #[tokio::test]
    async fn store_outage_during_login_is_unavailable() {
        let fx = fixture();
        fx.workflow
            .register(register_input("o@x.io", None))
            .await
            .unwrap();
        fx.store.set_unavailable(true);

        let err = fx
            .workflow
            .login(login_input("o@x.io", "secret123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AdapterUnavailable(_)));
    }

    #[tokio::test]
    async fn create_account_honours_role_policy() {
        let fx = fixture();
        let admin = fx
            .workflow
            .register(register_input("boss@x.io", Some("Boss")))
            .await
            .unwrap()
            .value;
        let admin = Principal::new(admin.user.uid, Role::Admin);
        let member = Principal::new(UserId::parse("member").unwrap(), Role::User);

        let request = CreateAccountInput {
            email: Some("mod@x.io".to_string()),
            password: Some("secret123".to_string()),
            name: Some("Mod".to_string()),
            role: Some("Moderator".to_string()),
            ..Default::default()
        };

        let denied = fx
            .workflow
            .create_account(&member, CreateAccountInput {
                role: Some("admin".to_string()),
                ..request.clone()
            })
            .await
            .unwrap_err();
        assert!(matches!(denied, AuthError::Forbidden(_)));

        let created = fx.workflow.create_account(&admin, request).await.unwrap().value;
        assert_eq!(created.role, Role::Moderator);
        assert!(created.last_login_at.is_none());

        let unknown_role = fx
            .workflow
            .create_account(&admin, CreateAccountInput {
                email: Some("x@x.io".to_string()),
                password: Some("secret123".to_string()),
                name: Some("X".to_string()),
                role: Some("superuser".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(unknown_role, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn failed_first_profile_write_does_not_burn_the_admin_claim() {
        let store = Arc::new(FlakyUsersStore {
            inner: InMemoryDocumentStore::new(),
            fail_next_user_create: AtomicBool::new(true),
        });
        let users = UserRepository::new(store.clone());
        let bootstrap = AdminBootstrap::new(store.clone());
        let workflow = AuthWorkflow::new(
            Arc::new(InMemoryIdentityProvider::new()),
            users.clone(),
            bootstrap.clone(),
            Arc::new(SessionTokenService::with_default_lifetime("workflow-test-secret")),
        );

        let err = workflow
            .register(register_input("first@x.io", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AdapterUnavailable(_)));
        assert!(users.is_empty().await.unwrap());
        assert_eq!(bootstrap.claimant().await.unwrap(), None);

        let next = workflow
            .register(register_input("second@x.io", None))
            .await
            .unwrap()
            .value;
        assert_eq!(next.user.role, Role::Admin);
    }
}
