use anyhow::Context;

use crate::auth::password;
use crate::config::Config;
use crate::db::Store;

pub async fn cmd_api_user_add(
    config: &Config,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_url).await?;

    if store.api_users().get_by_username(username).await?.is_some() {
        println!("Api user '{username}' already exists.");
        return Ok(());
    }

    let hash = password::hash_password_blocking(password.to_string(), config.security.clone())
        .await
        .context("Failed to hash api user password")?;
    let id = store.api_users().create(username, hash).await?;

    println!("✓ Added api user {username} (ID: {id}).");
    Ok(())
}

pub async fn cmd_api_user_remove(config: &Config, username: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_url).await?;

    if store.api_users().delete_by_username(username).await? {
        println!("✓ Removed api user {username}.");
    } else {
        println!("Api user '{username}' not found.");
    }

    Ok(())
}
