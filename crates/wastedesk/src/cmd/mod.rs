//! Command implementations for the Wastedesk CLI

pub mod keygen;
pub mod seed;
pub mod serve;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use wastedesk_auth::{
    AuthService, Database, PermissionStore, SeedReport, SigningKeys, SqliteCredentialStore,
    SqlitePermissionStore, TokenService, bootstrap_admin,
};
use wastedesk_config::{AuthConfig, Config, JwtAlgorithm};

/// Load configuration and apply `WASTEDESK_*` environment overrides
///
/// An explicit path must exist. Without one, `configs/config.toml` and
/// `config.toml` are tried before falling back to defaults.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                return Err(anyhow::anyhow!(
                    "config file not found: {}",
                    path.display()
                ));
            }
            Config::from_file(&path).context("failed to load configuration")?
        }
        None => {
            let default_paths = [
                PathBuf::from("configs/config.toml"),
                PathBuf::from("config.toml"),
            ];

            let mut loaded = None;
            for path in &default_paths {
                if path.exists() {
                    info!(config = %path.display(), "using config file");
                    loaded = Some(Config::from_file(path).context("failed to load configuration")?);
                    break;
                }
            }

            loaded.unwrap_or_else(|| {
                info!("no config file found, using defaults");
                Config::default()
            })
        }
    };

    config
        .with_env_overrides()
        .context("invalid environment override")
}

/// Signing keys for the configured algorithm
pub fn load_signing_keys(auth: &AuthConfig) -> Result<SigningKeys> {
    match auth.algorithm {
        JwtAlgorithm::Hs256 => {
            let secret = auth
                .hmac_secret_bytes()
                .context("auth.hmac_secret is required for hs256")?;
            Ok(SigningKeys::hs256(secret))
        }
        JwtAlgorithm::Es256 => SigningKeys::es256_from_files(
            &auth.private_key_path,
            &auth.public_key_path,
        )
        .with_context(|| {
            format!(
                "failed to load signing keys (run `wastedesk keygen --out {}`)",
                auth.private_key_path
                    .parent()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| ".".to_string())
            )
        }),
    }
}

/// Opened database with seeded permissions and the bootstrap admin
pub struct Storage {
    pub database: Database,
    pub credentials: Arc<SqliteCredentialStore>,
    pub permissions: Arc<SqlitePermissionStore>,
    pub seed: SeedReport,
    pub admin_created: bool,
}

/// Storage plus a ready auth service
pub struct Backend {
    pub database: Database,
    pub auth: AuthService,
    pub seed: SeedReport,
    pub admin_created: bool,
}

/// Open the database, seed canonical permissions, bootstrap the admin
///
/// Never touches signing keys.
pub async fn init_storage(config: &Config) -> Result<Storage> {
    let database = Database::open(&config.database.path, config.database.max_connections)
        .await
        .context("failed to open database")?;

    let credentials = Arc::new(SqliteCredentialStore::new(database.pool().clone()));
    let permissions = Arc::new(SqlitePermissionStore::new(database.pool().clone()));

    let seed = permissions
        .ensure_canonical_permissions()
        .await
        .context("failed to seed permissions")?;

    let admin_created = match config.bootstrap.admin_credentials() {
        Some((email, password)) => {
            bootstrap_admin(credentials.as_ref(), permissions.as_ref(), email, password)
                .await
                .context("failed to bootstrap admin")?
        }
        None => false,
    };

    Ok(Storage {
        database,
        credentials,
        permissions,
        seed,
        admin_created,
    })
}

/// Load signing keys, then [`init_storage`] and wire the auth service
pub async fn init_backend(config: &Config) -> Result<Backend> {
    let keys = load_signing_keys(&config.auth)?;
    let tokens = Arc::new(TokenService::new(keys, config.auth.issuer.clone()));

    let storage = init_storage(config).await?;
    let auth = AuthService::new(storage.credentials, storage.permissions, tokens);

    Ok(Backend {
        database: storage.database,
        auth,
        seed: storage.seed,
        admin_created: storage.admin_created,
    })
}
