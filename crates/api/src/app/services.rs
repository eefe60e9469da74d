//! Service wiring: stores, password verifier and token codec.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use pbac_auth::{TokenCodec, User};
use pbac_infra::{
    AppConfig, Argon2PasswordVerifier, AuthService, InMemorySessionStore, InMemoryUserStore,
    PostgresSessionStore, PostgresUserStore, UserStore, db, seed,
};

/// Everything the router and the authentication pipeline need.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub auth: AuthService,
}

impl AppServices {
    pub fn new(auth: AuthService) -> Self {
        Self { auth }
    }

    /// In-memory stores pre-populated with `users` (dev/test).
    pub fn in_memory(codec: TokenCodec, users: impl IntoIterator<Item = User>) -> Self {
        let auth = AuthService::new(
            Arc::new(InMemoryUserStore::with_users(users)),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(Argon2PasswordVerifier::new()),
            codec,
        );
        Self::new(auth)
    }

    /// Wire stores from configuration: Postgres when `database_url` is set,
    /// in-memory otherwise. Seeds the admin account when configured.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let codec = config.token_codec().context("invalid jwt configuration")?;
        let hasher = Argon2PasswordVerifier::new();

        let services = match &config.database_url {
            Some(url) => {
                let pool = db::connect(url, config.database_max_connections)
                    .await
                    .context("failed to connect to postgres")?;
                info!("using postgres stores");
                Self::new(AuthService::new(
                    Arc::new(PostgresUserStore::new(pool.clone())),
                    Arc::new(PostgresSessionStore::new(pool)),
                    Arc::new(hasher.clone()),
                    codec,
                ))
            }
            None => {
                info!("DATABASE_URL not set; using in-memory stores");
                Self::in_memory(codec, Vec::<User>::new())
            }
        };

        if let Some(password) = &config.seed.admin_password {
            let users: &dyn UserStore = services.auth.users().as_ref();
            seed::seed_admin(users, &hasher, password)
                .await
                .context("failed to seed admin account")?;
        }

        Ok(services)
    }
}
