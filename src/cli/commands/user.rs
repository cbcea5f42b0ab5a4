use crate::config::Config;
use crate::db::Store;
use crate::entities::users::Role;

pub async fn cmd_set_role(config: &Config, username: &str, role: Role) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_url).await?;

    if store.set_user_role(username, role).await? {
        let label = match role {
            Role::Admin => "admin",
            Role::User => "user",
        };
        println!("✓ {username} is now {label}.");
    } else {
        println!("User '{username}' not found.");
    }

    Ok(())
}
