use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::{
    domain::{Bouquet, ShortId},
    record::SCHEMA_VERSION,
};

/// Persistence seam used by the API layer.
#[async_trait]
pub trait BouquetStore: Send + Sync {
    /// Single-row insert. Fails if the short id is already taken.
    async fn insert_bouquet(&self, short_id: &ShortId, bouquet: &Bouquet) -> Result<()>;

    /// Raw stored record, reassembled as JSON and not yet normalized.
    async fn find_bouquet_record(&self, short_id: &ShortId) -> Result<Option<Value>>;

    async fn health_check(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory database sees its own empty schema.
        let max_connections = if database_url.starts_with("sqlite::memory:") {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Stores a record exported from an older deployment verbatim. Field
    /// variants are kept so that migration happens on read like any row.
    pub async fn import_raw_record(&self, short_id: &ShortId, record: &Value) -> Result<()> {
        let document = serde_json::to_string(record).context("failed to encode legacy record")?;
        sqlx::query("INSERT INTO bouquets (short_id, legacy_document) VALUES (?, ?)")
            .bind(short_id.as_str())
            .bind(document)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to import legacy bouquet {short_id}"))?;
        debug!(%short_id, "imported legacy bouquet record");
        Ok(())
    }

    pub async fn count_bouquets(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bouquets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl BouquetStore for Storage {
    async fn insert_bouquet(&self, short_id: &ShortId, bouquet: &Bouquet) -> Result<()> {
        let timestamp = bouquet.created_at.unwrap_or_else(Utc::now);
        sqlx::query(
            "INSERT INTO bouquets
                (short_id, schema_version, mode, flowers, letter, timestamp, greenery, flower_order)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(short_id.as_str())
        .bind(SCHEMA_VERSION)
        .bind(&bouquet.mode)
        .bind(serde_json::to_string(&bouquet.flowers)?)
        .bind(serde_json::to_string(&bouquet.letter)?)
        .bind(timestamp.to_rfc3339())
        .bind(bouquet.greenery)
        .bind(serde_json::to_string(&bouquet.flower_order)?)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to insert bouquet {short_id}"))?;
        debug!(%short_id, flowers = bouquet.total_flowers(), "stored bouquet");
        Ok(())
    }

    async fn find_bouquet_record(&self, short_id: &ShortId) -> Result<Option<Value>> {
        let row = sqlx::query(
            "SELECT short_id, schema_version, mode, flowers, letter, timestamp, greenery,
                    flower_order, legacy_document
             FROM bouquets
             WHERE short_id = ?",
        )
        .bind(short_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load bouquet {short_id}"))?;

        row.map(|row| reassemble_record(&row)).transpose()
    }

    async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}

fn reassemble_record(row: &SqliteRow) -> Result<Value> {
    let short_id: String = row.try_get("short_id")?;

    if let Some(document) = row.try_get::<Option<String>, _>("legacy_document")? {
        let mut record = serde_json::from_str::<Value>(&document).unwrap_or(Value::String(document));
        if let Some(object) = record.as_object_mut() {
            object
                .entry("short_id")
                .or_insert_with(|| Value::String(short_id));
        }
        return Ok(record);
    }

    let mut record = Map::new();
    record.insert("short_id".into(), Value::String(short_id));
    if let Some(version) = row.try_get::<Option<i64>, _>("schema_version")? {
        record.insert("schema_version".into(), Value::from(version));
    }
    if let Some(mode) = row.try_get::<Option<String>, _>("mode")? {
        record.insert("mode".into(), Value::String(mode));
    }
    if let Some(greenery) = row.try_get::<Option<i64>, _>("greenery")? {
        record.insert("greenery".into(), Value::from(greenery));
    }
    if let Some(timestamp) = row.try_get::<Option<String>, _>("timestamp")? {
        record.insert("timestamp".into(), Value::String(timestamp));
    }
    for column in ["flowers", "letter", "flower_order"] {
        if let Some(text) = row.try_get::<Option<String>, _>(column)? {
            record.insert(column.into(), json_column(text));
        }
    }
    Ok(Value::Object(record))
}

/// JSON columns that fail to parse are handed on as raw text; deciding
/// whether that is fatal is the normalizer's job.
fn json_column(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
