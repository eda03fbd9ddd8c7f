//! End-to-end tests for the auth pipeline over the bounded adapters.
//!
//! Workflow -> BoundedIdentityProvider/BoundedStore -> in-memory adapters.
//!
//! Verifies:
//! - Concurrent first registrations produce exactly one admin
//! - Slow adapters surface as `AdapterUnavailable`, never as auth decisions
//! - Re-login never rewrites a role set by an admin

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use storegate_auth::{AuthError, Role, SessionTokenService};

    use crate::bootstrap::AdminBootstrap;
    use crate::deadline::{BoundedIdentityProvider, BoundedStore};
    use crate::document_store::{DocumentStore, InMemoryDocumentStore};
    use crate::identity::{IdentityProvider, InMemoryIdentityProvider};
    use crate::users::{ProfileChanges, UserRepository};
    use crate::workflow::{AuthWorkflow, LoginInput, RegisterInput};

    const LIMIT: Duration = Duration::from_millis(200);

    struct Pipeline {
        workflow: AuthWorkflow,
        raw_store: Arc<InMemoryDocumentStore>,
        raw_identity: Arc<InMemoryIdentityProvider>,
        users: UserRepository,
    }

    fn pipeline() -> Pipeline {
        let raw_store = Arc::new(InMemoryDocumentStore::new());
        let raw_identity = Arc::new(InMemoryIdentityProvider::new());

        let store: Arc<dyn DocumentStore> = Arc::new(BoundedStore::new(raw_store.clone(), LIMIT));
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(BoundedIdentityProvider::new(raw_identity.clone(), LIMIT));
        let users = UserRepository::new(store.clone());

        let workflow = AuthWorkflow::new(
            identity,
            users.clone(),
            AdminBootstrap::new(store),
            Arc::new(SessionTokenService::with_default_lifetime("pipeline-secret")),
        );
        Pipeline {
            workflow,
            raw_store,
            raw_identity,
            users,
        }
    }

    fn register(email: &str) -> RegisterInput {
        RegisterInput {
            email: Some(email.to_string()),
            password: Some("secret123".to_string()),
            name: None,
        }
    }

    #[tokio::test]
    async fn concurrent_first_registrations_yield_one_admin() {
        let p = pipeline();

        let mut handles = Vec::new();
        for i in 0..8 {
            let workflow = p.workflow.clone();
            handles.push(tokio::spawn(async move {
                workflow.register(register(&format!("racer{i}@x.io"))).await
            }));
        }

        let mut admins = 0;
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            if outcome.value.user.role == Role::Admin {
                admins += 1;
            }
        }

        assert_eq!(admins, 1);
        assert_eq!(p.users.list().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn slow_store_surfaces_as_unavailable() {
        let p = pipeline();
        p.raw_store.set_latency(Some(LIMIT * 5));

        let err = p.workflow.register(register("slow@x.io")).await.unwrap_err();
        assert!(matches!(err, AuthError::AdapterUnavailable(_)));
    }

    #[tokio::test]
    async fn slow_identity_provider_surfaces_as_unavailable() {
        let p = pipeline();
        p.workflow.register(register("slowid@x.io")).await.unwrap();
        p.raw_identity.set_latency(Some(LIMIT * 5));

        let err = p
            .workflow
            .login(LoginInput {
                email: Some("slowid@x.io".to_string()),
                password: Some("secret123".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AdapterUnavailable(_)));

        let err = p.workflow.register(register("late@x.io")).await.unwrap_err();
        assert!(matches!(err, AuthError::AdapterUnavailable(_)));
    }

    #[tokio::test]
    async fn relogin_keeps_role_granted_by_admin() {
        let p = pipeline();
        p.workflow.register(register("first@x.io")).await.unwrap();
        let member = p
            .workflow
            .register(register("member@x.io"))
            .await
            .unwrap()
            .value;
        assert_eq!(member.user.role, Role::User);

        p.users
            .update(&member.user.uid, ProfileChanges::role(Role::Moderator))
            .await
            .unwrap();

        let session = p
            .workflow
            .login(LoginInput {
                email: Some("member@x.io".to_string()),
                password: Some("secret123".to_string()),
            })
            .await
            .unwrap()
            .value;
        let claims = p.workflow.tokens().verify(&session.token).unwrap();
        assert_eq!(claims.role, Role::Moderator);
    }
}
