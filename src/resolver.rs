//! Lookup-or-create for the shared reference rows (country, genre, actor,
//! language) that movies point at.
//!
//! Rows are keyed by a natural key backed by a unique index. Creation runs
//! inside a savepoint: when a concurrent request inserted the same key first,
//! the unique violation is rolled back and the existing row is looked up.

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::debug;

use crate::{
    countries,
    entities::{actor, country, genre, language},
    error::{AppError, AppResult},
};

pub trait Reference: EntityTrait {
    type Active: ActiveModelTrait<Entity = Self> + ActiveModelBehavior + Send;

    const KIND: &'static str;

    fn key_column() -> Self::Column;

    fn create(key: &str) -> Self::Active;
}

impl Reference for country::Entity {
    type Active = country::ActiveModel;

    const KIND: &'static str = "country";

    fn key_column() -> Self::Column {
        country::Column::Code
    }

    fn create(key: &str) -> Self::Active {
        country::ActiveModel {
            code: Set(key.to_string()),
            name: Set(countries::display_name(key).map(str::to_string)),
            ..Default::default()
        }
    }
}

impl Reference for genre::Entity {
    type Active = genre::ActiveModel;

    const KIND: &'static str = "genre";

    fn key_column() -> Self::Column {
        genre::Column::Name
    }

    fn create(key: &str) -> Self::Active {
        genre::ActiveModel { name: Set(key.to_string()), ..Default::default() }
    }
}

impl Reference for actor::Entity {
    type Active = actor::ActiveModel;

    const KIND: &'static str = "actor";

    fn key_column() -> Self::Column {
        actor::Column::Name
    }

    fn create(key: &str) -> Self::Active {
        actor::ActiveModel { name: Set(key.to_string()), ..Default::default() }
    }
}

impl Reference for language::Entity {
    type Active = language::ActiveModel;

    const KIND: &'static str = "language";

    fn key_column() -> Self::Column {
        language::Column::Name
    }

    fn create(key: &str) -> Self::Active {
        language::ActiveModel { name: Set(key.to_string()), ..Default::default() }
    }
}

pub async fn find<E, C>(conn: &C, key: &str) -> AppResult<Option<E::Model>>
where
    E: Reference,
    C: ConnectionTrait,
{
    Ok(E::find().filter(E::key_column().eq(key)).one(conn).await?)
}

/// Returns the row for `key`, inserting it first when absent.
pub async fn lookup_or_create<E, C>(conn: &C, key: &str) -> AppResult<E::Model>
where
    E: Reference,
    E::Model: IntoActiveModel<E::Active>,
    C: ConnectionTrait + TransactionTrait,
{
    if let Some(existing) = find::<E, _>(conn, key).await? {
        return Ok(existing);
    }
    insert_or_find::<E, _>(conn, key).await
}

/// Inserts the row for `key`; a unique violation means another writer got
/// there first, so the savepoint is rolled back and their row returned.
async fn insert_or_find<E, C>(conn: &C, key: &str) -> AppResult<E::Model>
where
    E: Reference,
    E::Model: IntoActiveModel<E::Active>,
    C: ConnectionTrait + TransactionTrait,
{
    let savepoint = conn.begin().await?;
    match E::create(key).insert(&savepoint).await {
        Ok(created) => {
            savepoint.commit().await?;
            debug!(kind = E::KIND, key = %key, "created reference row");
            Ok(created)
        },
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            savepoint.rollback().await?;
            debug!(kind = E::KIND, key = %key, "lost insert race, reusing existing row");
            find::<E, _>(conn, key).await?.ok_or_else(|| {
                AppError::Storage(anyhow::anyhow!(
                    "{} '{key}' rejected as duplicate but not found",
                    E::KIND
                ))
            })
        },
        Err(err) => Err(err.into()),
    }
}

/// Resolves every key in order, one row per key.
pub async fn lookup_or_create_all<E, C>(conn: &C, keys: &[String]) -> AppResult<Vec<E::Model>>
where
    E: Reference,
    E::Model: IntoActiveModel<E::Active>,
    C: ConnectionTrait + TransactionTrait,
{
    let mut out = Vec::with_capacity(keys.len());
    for key in keys {
        out.push(lookup_or_create::<E, _>(conn, key).await?);
    }
    Ok(out)
}

pub async fn list_all<E, C>(conn: &C) -> AppResult<Vec<E::Model>>
where
    E: Reference,
    C: ConnectionTrait,
{
    Ok(E::find().order_by_asc(E::key_column()).all(conn).await?)
}
