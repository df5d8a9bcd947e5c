//! Seed command - Create canonical permissions and roles, then exit

use std::path::PathBuf;

use anyhow::Result;

use super::{init_storage, load_config};

/// Run the seed command
pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let storage = init_storage(&config).await?;

    let seed = storage.seed;
    println!("permissions created: {}", seed.permissions_created);
    println!("roles created:       {}", seed.roles_created);
    println!("grants created:      {}", seed.grants_created);
    match config.bootstrap.admin_email.as_deref() {
        Some(email) if storage.admin_created => println!("admin created:       {}", email),
        Some(email) => println!("admin present:       {}", email),
        None => println!("admin:               (not configured)"),
    }

    storage.database.close().await;
    Ok(())
}
