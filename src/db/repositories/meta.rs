//! Key/value metadata attached to users and flights.
//!
//! Both meta tables share one shape (owner id, key, JSON text value), so a
//! single repository serves them through the [`MetaTable`] description.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder,
};

use crate::models::meta::MetaValue;

/// Column layout of a meta table keyed by `(owner, key)`.
pub trait MetaTable: EntityTrait {
    type Row: ActiveModelTrait<Entity = Self> + Send + 'static;

    const OWNER: Self::Column;
    const KEY: Self::Column;
    const VALUE: Self::Column;

    fn row(owner_id: i32, key: &str, value: Option<String>, created: String) -> Self::Row;

    fn key_of(model: &Self::Model) -> &str;

    fn value_of(model: &Self::Model) -> Option<&str>;
}

pub struct MetaRepository<'a, E, C> {
    db: &'a C,
    table: PhantomData<E>,
}

impl<'a, E, C> MetaRepository<'a, E, C>
where
    E: MetaTable,
    E::Model: IntoActiveModel<E::Row>,
    C: ConnectionTrait,
{
    #[must_use]
    pub const fn new(db: &'a C) -> Self {
        Self {
            db,
            table: PhantomData,
        }
    }

    pub async fn find_meta_by_key(&self, owner_id: i32, key: &str) -> Result<Option<E::Model>> {
        E::find()
            .filter(E::OWNER.eq(owner_id))
            .filter(E::KEY.eq(key))
            .one(self.db)
            .await
            .context("Failed to query meta by key")
    }

    /// Decoded value for `key`, `None` when the key is absent or cleared.
    pub async fn get_meta(&self, owner_id: i32, key: &str) -> Result<Option<MetaValue>> {
        let Some(row) = self.find_meta_by_key(owner_id, key).await? else {
            return Ok(None);
        };

        decode(E::value_of(&row))
    }

    /// Insert or overwrite a single key. `None` stores NULL.
    pub async fn set_meta(&self, owner_id: i32, key: &str, value: Option<&MetaValue>) -> Result<()> {
        let encoded = value
            .map(MetaValue::encode)
            .transpose()
            .context("Failed to encode meta value")?;

        let row = E::row(owner_id, key, encoded, chrono::Utc::now().to_rfc3339());

        E::insert(row)
            .on_conflict(
                OnConflict::columns([E::OWNER, E::KEY])
                    .update_column(E::VALUE)
                    .to_owned(),
            )
            .exec_without_returning(self.db)
            .await
            .with_context(|| format!("Failed to store meta key {key}"))?;

        Ok(())
    }

    /// Remove a key. Missing keys are not an error.
    pub async fn delete_meta(&self, owner_id: i32, key: &str) -> Result<()> {
        E::delete_many()
            .filter(E::OWNER.eq(owner_id))
            .filter(E::KEY.eq(key))
            .exec(self.db)
            .await
            .with_context(|| format!("Failed to delete meta key {key}"))?;

        Ok(())
    }

    pub async fn list_meta_keys(&self, owner_id: i32) -> Result<Vec<String>> {
        let rows = E::find()
            .filter(E::OWNER.eq(owner_id))
            .order_by_asc(E::KEY)
            .all(self.db)
            .await
            .context("Failed to list meta keys")?;

        Ok(rows.iter().map(|r| E::key_of(r).to_string()).collect())
    }

    /// Values for the requested keys that exist. Cleared keys map to `None`.
    pub async fn get_meta_many(
        &self,
        owner_id: i32,
        keys: &[String],
    ) -> Result<BTreeMap<String, Option<MetaValue>>> {
        if keys.is_empty() {
            return Ok(BTreeMap::new());
        }

        let rows = E::find()
            .filter(E::OWNER.eq(owner_id))
            .filter(E::KEY.is_in(keys.iter().map(String::as_str)))
            .all(self.db)
            .await
            .context("Failed to read meta values")?;

        rows.iter()
            .map(|r| Ok((E::key_of(r).to_string(), decode(E::value_of(r))?)))
            .collect()
    }
}

fn decode(raw: Option<&str>) -> Result<Option<MetaValue>> {
    raw.map_or(Ok(None), |raw| {
        MetaValue::decode(raw).context("Stored meta value is not valid JSON")
    })
}
