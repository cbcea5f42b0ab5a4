use anyhow::{Context, Result};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction,
    IntoActiveModel, Statement, TransactionTrait,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::users::Role;
use crate::entities::{flights_meta, users_meta};
use crate::models::meta::MetaValue;

pub mod migrator;
pub mod record;
pub mod repositories;

use repositories::api_user::ApiUserRepository;
use repositories::flight::FlightRepository;
use repositories::meta::{MetaRepository, MetaTable};
use repositories::user::UserRepository;

pub type UserMetaRepository<'a, C> = MetaRepository<'a, users_meta::Entity, C>;
pub type FlightMetaRepository<'a, C> = MetaRepository<'a, flights_meta::Entity, C>;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file {path_str}"))?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt)
            .await
            .context("Failed to connect to database")?;

        migrator::Migrator::up(&conn, None)
            .await
            .context("Failed to apply migrations")?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Start a transaction. Repositories built on it stage their writes
    /// until the caller commits.
    pub async fn begin(&self) -> Result<DatabaseTransaction> {
        self.conn
            .begin()
            .await
            .context("Failed to begin transaction")
    }

    // ========================================================================
    // Repositories on the pooled connection (autocommit)
    // ========================================================================

    #[must_use]
    pub const fn users(&self) -> UserRepository<'_, DatabaseConnection> {
        UserRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn api_users(&self) -> ApiUserRepository<'_, DatabaseConnection> {
        ApiUserRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn flights(&self) -> FlightRepository<'_, DatabaseConnection> {
        FlightRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn user_meta(&self) -> UserMetaRepository<'_, DatabaseConnection> {
        MetaRepository::new(&self.conn)
    }

    #[must_use]
    pub const fn flight_meta(&self) -> FlightMetaRepository<'_, DatabaseConnection> {
        MetaRepository::new(&self.conn)
    }

    // ========================================================================
    // Multi-statement operations (single transaction)
    // ========================================================================

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        let txn = self.begin().await?;
        let deleted = UserRepository::new(&txn).delete(id).await?;
        txn.commit().await.context("Failed to commit user delete")?;
        Ok(deleted)
    }

    pub async fn delete_flight(&self, id: i32) -> Result<bool> {
        let txn = self.begin().await?;
        let deleted = FlightRepository::new(&txn).delete(id).await?;
        txn.commit()
            .await
            .context("Failed to commit flight delete")?;
        Ok(deleted)
    }

    /// Write every entry of `values` for one owner and commit once.
    pub async fn set_meta_values<E>(
        &self,
        owner_id: i32,
        values: Vec<(String, Option<MetaValue>)>,
    ) -> Result<()>
    where
        E: MetaTable,
        E::Model: IntoActiveModel<E::Row>,
    {
        let txn = self.begin().await?;
        {
            let repo = MetaRepository::<E, _>::new(&txn);
            for (key, value) in &values {
                repo.set_meta(owner_id, key, value.as_ref()).await?;
            }
        }
        txn.commit().await.context("Failed to commit meta update")?;
        Ok(())
    }

    pub async fn set_user_role(&self, username: &str, role: Role) -> Result<bool> {
        self.users().set_role(username, role).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::flight::{NewDataPoint, PageRequest};
    use crate::models::user::NewUser;
    use serde_json::json;

    async fn test_store() -> (Store, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!("brink-store-{}.db", uuid::Uuid::new_v4()));
        let store = Store::new(&format!("sqlite:{}", path.display()))
            .await
            .unwrap();
        (store, path)
    }

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            first_name: None,
            last_name: None,
        }
    }

    fn point(timestamp: i64) -> NewDataPoint {
        NewDataPoint {
            timestamp,
            coordinate_x: 1.5,
            coordinate_y: -2.25,
            pressure: 1013,
            temperature: 21,
            altitude: 350,
        }
    }

    fn meta(value: serde_json::Value) -> Option<MetaValue> {
        MetaValue::from_json(value)
    }

    #[tokio::test]
    async fn meta_set_get_round_trips() {
        let (store, path) = test_store().await;
        let user = store.users().create(new_user("kite"), "hash".into()).await.unwrap();
        let repo = store.user_meta();

        let nested = meta(json!({"gear": ["vario", "radio"], "rating": 4.5}));
        repo.set_meta(user.id, "kit", nested.as_ref()).await.unwrap();

        assert_eq!(repo.get_meta(user.id, "kit").await.unwrap(), nested);
        assert_eq!(repo.get_meta(user.id, "missing").await.unwrap(), None);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn meta_set_overwrites_and_delete_is_idempotent() {
        let (store, path) = test_store().await;
        let flight = store.flights().create().await.unwrap();
        let repo = store.flight_meta();

        repo.set_meta(flight.id, "color", meta(json!("red")).as_ref()).await.unwrap();
        repo.set_meta(flight.id, "color", meta(json!("blue")).as_ref()).await.unwrap();

        assert_eq!(repo.list_meta_keys(flight.id).await.unwrap(), vec!["color"]);
        assert_eq!(
            repo.get_meta(flight.id, "color").await.unwrap(),
            meta(json!("blue"))
        );

        repo.set_meta(flight.id, "color", None).await.unwrap();
        assert!(repo.find_meta_by_key(flight.id, "color").await.unwrap().is_some());
        assert_eq!(repo.get_meta(flight.id, "color").await.unwrap(), None);

        repo.delete_meta(flight.id, "color").await.unwrap();
        repo.delete_meta(flight.id, "color").await.unwrap();
        assert!(repo.list_meta_keys(flight.id).await.unwrap().is_empty());

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn set_meta_values_commits_all_keys() {
        let (store, path) = test_store().await;
        let user = store.users().create(new_user("glide"), "hash".into()).await.unwrap();

        store
            .set_meta_values::<users_meta::Entity>(
                user.id,
                vec![
                    ("a".to_string(), meta(json!(1))),
                    ("b".to_string(), meta(json!(true))),
                    ("c".to_string(), None),
                ],
            )
            .await
            .unwrap();

        let values = store
            .user_meta()
            .get_meta_many(user.id, &["a".to_string(), "c".to_string(), "zzz".to_string()])
            .await
            .unwrap();

        assert_eq!(values.len(), 2);
        assert_eq!(values["a"], meta(json!(1)));
        assert_eq!(values["c"], None);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn deleting_a_flight_cascades() {
        let (store, path) = test_store().await;
        let flight = store.flights().create().await.unwrap();
        store.flights().add_data_point(flight.id, point(1)).await.unwrap();
        store
            .flight_meta()
            .set_meta(flight.id, "pilot", meta(json!("amelia")).as_ref())
            .await
            .unwrap();

        assert!(store.delete_flight(flight.id).await.unwrap());
        assert!(store.flights().get(flight.id).await.unwrap().is_none());
        assert!(store.flight_meta().list_meta_keys(flight.id).await.unwrap().is_empty());

        let page = store
            .flights()
            .data_page(flight.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);

        assert!(!store.delete_flight(flight.id).await.unwrap());

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn data_pages_are_time_ordered() {
        let (store, path) = test_store().await;
        let flight = store.flights().create().await.unwrap();
        for ts in [30, 10, 20, 50, 40] {
            store.flights().add_data_point(flight.id, point(ts)).await.unwrap();
        }

        let first = store
            .flights()
            .data_page(flight.id, PageRequest::new(Some(1), Some(2)))
            .await
            .unwrap();
        assert_eq!(first.total, 5);
        assert_eq!(first.pages, 3);
        let stamps: Vec<i64> = first.items.iter().map(|p| p.timestamp).collect();
        assert_eq!(stamps, vec![10, 20]);

        let beyond = store
            .flights()
            .data_page(flight.id, PageRequest::new(Some(9), Some(2)))
            .await
            .unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 5);
        assert_eq!(beyond.page, 9);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn username_and_email_checks_skip_self() {
        let (store, path) = test_store().await;
        let user = store.users().create(new_user("kite"), "hash".into()).await.unwrap();

        assert!(store.users().username_taken("kite", None).await.unwrap());
        assert!(!store.users().username_taken("kite", Some(user.id)).await.unwrap());
        assert!(store.users().email_taken("kite@example.com", None).await.unwrap());
        assert!(!store.users().email_taken("other@example.com", None).await.unwrap());

        assert!(store.set_user_role("kite", Role::Admin).await.unwrap());
        assert!(store.users().get(user.id).await.unwrap().unwrap().is_admin());
        assert!(!store.set_user_role("nobody", Role::Admin).await.unwrap());

        assert!(store.delete_user(user.id).await.unwrap());
        assert!(store.users().get(user.id).await.unwrap().is_none());

        let _ = std::fs::remove_file(path);
    }
}
