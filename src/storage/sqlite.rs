use crate::datamodel::{DEFAULT_COLUMNS, Row, sanitize_columns};
use crate::storage::{StorageError, StorageInstance, TableSnapshot};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row as _;
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

// SQLite implementation
#[derive(Debug)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(connection_string)
            .context("Failed to create sqlite connection options")?
            // Create the database file if it doesn't exist
            .create_if_missing(true)
            // The WAL mode is the sqlx default, make sure it stays that way
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            // Set a busy timeout of 5 seconds
            .busy_timeout(Duration::from_secs(5));

        // An in-memory database exists per connection. A pool with more than
        // one connection would see more than one database.
        let pool_options = if connection_string.contains(":memory:") {
            sqlx::sqlite::SqlitePoolOptions::new().max_connections(1)
        } else {
            sqlx::sqlite::SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .context("Failed to create sqlite pool")?;

        Ok(Self { pool })
    }

    fn default_columns_json() -> Result<String> {
        serde_json::to_string(&DEFAULT_COLUMNS.to_vec())
            .context("Failed to serialise default columns")
    }
}

#[async_trait]
impl StorageInstance for SqliteStorage {
    async fn create_or_migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS table_meta (
                id INTEGER PRIMARY KEY,
                columns TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create table_meta")?;

        // seq preserves creation order even when created_at timestamps tie.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS table_rows (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create table_rows")?;

        sqlx::query(
            r#"
            INSERT INTO table_meta (id, columns)
            SELECT 1, ?
            WHERE NOT EXISTS (SELECT 1 FROM table_meta WHERE id = 1)
            "#,
        )
        .bind(Self::default_columns_json()?)
        .execute(&self.pool)
        .await
        .context("Failed to seed default columns")?;

        Ok(())
    }

    async fn fetch_table(&self) -> Result<TableSnapshot> {
        let meta = sqlx::query("SELECT columns FROM table_meta WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Database)?;

        let stored_columns: Vec<String> = match &meta {
            Some(record) => {
                let raw: String = record.get("columns");
                serde_json::from_str(&raw).map_err(|e| {
                    StorageError::invalid_data_format(e.to_string(), "table_meta.columns")
                })?
            }
            None => vec![],
        };

        let mut columns = sanitize_columns(&stored_columns);
        if columns.is_empty() {
            columns = DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect();
        }

        // Heal the stored record when a legacy import left placeholder or
        // empty names behind.
        if columns != stored_columns {
            let columns_json =
                serde_json::to_string(&columns).context("Failed to serialise columns")?;
            sqlx::query(
                r#"
                INSERT INTO table_meta (id, columns, updated_at)
                VALUES (1, ?, datetime('now'))
                ON CONFLICT (id) DO UPDATE SET
                    columns = excluded.columns,
                    updated_at = datetime('now')
                "#,
            )
            .bind(columns_json)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Database)?;
        }

        let row_records =
            sqlx::query("SELECT id, data FROM table_rows ORDER BY created_at ASC, seq ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::Database)?;

        let mut rows = Vec::with_capacity(row_records.len());
        for record in row_records {
            let id: String = record.get("id");
            let raw: String = record.get("data");
            let data: BTreeMap<String, String> = serde_json::from_str(&raw).map_err(|e| {
                StorageError::invalid_data_format(e.to_string(), format!("table_rows.data id={id}"))
            })?;
            rows.push(Row { id, data });
        }

        Ok(TableSnapshot { columns, rows })
    }

    async fn replace_table(&self, columns: &[String], rows: &[Row]) -> Result<()> {
        let columns_json =
            serde_json::to_string(columns).context("Failed to serialise columns")?;

        let mut transaction = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO table_meta (id, columns, updated_at)
            VALUES (1, ?, datetime('now'))
            ON CONFLICT (id) DO UPDATE SET
                columns = excluded.columns,
                updated_at = datetime('now')
            "#,
        )
        .bind(columns_json)
        .execute(&mut *transaction)
        .await?;

        sqlx::query("DELETE FROM table_rows")
            .execute(&mut *transaction)
            .await?;

        for row in rows {
            let restricted = row.restrict_to_columns(columns);
            let data_json =
                serde_json::to_string(&restricted).context("Failed to serialise row data")?;
            sqlx::query("INSERT INTO table_rows (id, data) VALUES (?, ?)")
                .bind(&row.id)
                .bind(data_json)
                .execute(&mut *transaction)
                .await?;
        }

        transaction.commit().await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("SQLite health check failed")?;
        Ok(())
    }
}
