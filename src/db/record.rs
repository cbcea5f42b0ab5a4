//! Entity-agnostic persistence helpers shared by the repositories.

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, EntityName, EntityTrait, IdenStatic,
    IntoActiveModel, Iterable, PrimaryKeyTrait,
};
use serde_json::{Map, Value};

/// Fetch a row by primary key. `None` is the not-found signal.
pub async fn load<E, C>(db: &C, id: i32) -> Result<Option<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    E::find_by_id(id)
        .one(db)
        .await
        .with_context(|| format!("Failed to load {} {id}", E::default().table_name()))
}

/// Insert a new row or update an existing one, depending on whether the
/// primary key is set.
pub async fn save<'a, A, C>(db: &'a C, model: A) -> Result<A>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + 'a,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    model
        .save(db)
        .await
        .with_context(|| format!("Failed to save {}", A::Entity::default().table_name()))
}

/// Remove a row by primary key. Returns whether anything was deleted.
pub async fn delete<E, C>(db: &C, id: i32) -> Result<bool>
where
    E: EntityTrait,
    C: ConnectionTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    let result = E::delete_by_id(id)
        .exec(db)
        .await
        .with_context(|| format!("Failed to delete {} {id}", E::default().table_name()))?;

    Ok(result.rows_affected > 0)
}

/// Keep only the payload keys that are columns of `E`, minus `exclude`.
/// Unknown keys are dropped silently.
#[must_use]
pub fn filter_params<E: EntityTrait>(payload: &Map<String, Value>, exclude: &[&str]) -> Map<String, Value> {
    E::Column::iter()
        .map(|column| column.as_str().to_owned())
        .filter(|name| !exclude.contains(&name.as_str()))
        .filter_map(|name| payload.get(&name).cloned().map(|v| (name, v)))
        .collect()
}
