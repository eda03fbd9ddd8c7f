//! Service wiring: adapters, repositories and the auth workflow.

use std::sync::Arc;

use storegate_auth::SessionTokenService;
use storegate_infra::{
    AdminBootstrap, AuthWorkflow, BoundedIdentityProvider, BoundedStore, DocumentStore,
    GatewayConfig, IdentityProvider, InMemoryDocumentStore, InMemoryIdentityProvider,
    ProductCatalog, UserRepository,
};

#[derive(Clone)]
pub struct AppServices {
    pub workflow: AuthWorkflow,
    pub users: UserRepository,
    pub catalog: ProductCatalog,
    pub tokens: Arc<SessionTokenService>,
}

impl AppServices {
    /// Wire services over the given adapters. Every adapter call is bounded by
    /// `config.adapter_timeout`.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        config: &GatewayConfig,
    ) -> Self {
        let store: Arc<dyn DocumentStore> =
            Arc::new(BoundedStore::new(store, config.adapter_timeout));
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(BoundedIdentityProvider::new(identity, config.adapter_timeout));

        let tokens = Arc::new(SessionTokenService::new(
            config.jwt_secret.as_bytes(),
            config.token_lifetime,
        ));
        let users = UserRepository::new(store.clone());
        let workflow = AuthWorkflow::new(
            identity,
            users.clone(),
            AdminBootstrap::new(store.clone()),
            tokens.clone(),
        );

        Self {
            workflow,
            users,
            catalog: ProductCatalog::new(store),
            tokens,
        }
    }

    /// In-memory adapters; state lives only as long as the process.
    pub fn in_memory(config: &GatewayConfig) -> Self {
        Self::new(
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(InMemoryIdentityProvider::new()),
            config,
        )
    }
}
