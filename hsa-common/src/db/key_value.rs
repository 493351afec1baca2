//! Named JSON documents in the `key_value_store` table

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;

/// Read the raw value stored under `name`
pub async fn get_value(pool: &SqlitePool, name: &str) -> Result<Option<String>> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM key_value_store WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?;
    Ok(value)
}

/// Insert or overwrite the value stored under `name`
pub async fn put_value(pool: &SqlitePool, name: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO key_value_store (name, value, updated_at) VALUES (?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(name)
    .bind(value)
    .bind(crate::time::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

/// Remove the value stored under `name`; returns whether a row existed
pub async fn delete_value(pool: &SqlitePool, name: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM key_value_store WHERE name = ?")
        .bind(name)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Deserialize the JSON document stored under `name`
pub async fn get_json<T: DeserializeOwned>(pool: &SqlitePool, name: &str) -> Result<Option<T>> {
    match get_value(pool, name).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| Error::Internal(format!("Failed to deserialize '{}': {}", name, e))),
        None => Ok(None),
    }
}

/// Serialize `value` as JSON and store it under `name`
pub async fn put_json<T: Serialize>(pool: &SqlitePool, name: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| Error::Internal(format!("Failed to serialize '{}': {}", name, e)))?;
    put_value(pool, name, &raw).await
}
