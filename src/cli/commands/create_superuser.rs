//! Create superuser command handler

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, SeaOrmAuthService};

pub async fn cmd_create_superuser(
    config: &Config,
    email: &str,
    password: &str,
    name: &str,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let auth = SeaOrmAuthService::new(store, config.security.clone());

    let user = auth.create_superuser(email, password, name).await?;

    println!("Superuser created");
    println!("  ID:    {}", user.id);
    println!("  Email: {}", user.email);

    Ok(())
}
