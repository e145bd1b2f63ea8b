use crate::datamodel::{DEFAULT_COLUMNS, Row, sanitize_columns};
use crate::storage::{StorageError, StorageInstance, TableSnapshot};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row as _;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::BTreeMap;
use std::time::Duration;

// PostgreSQL implementation
#[derive(Debug)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(5))
            .connect(connection_string)
            .await
            .context("Failed to create postgres pool")?;

        Ok(Self { pool })
    }

    fn default_columns_json() -> Result<serde_json::Value> {
        serde_json::to_value(DEFAULT_COLUMNS.to_vec())
            .context("Failed to serialise default columns")
    }
}

#[async_trait]
impl StorageInstance for PostgresStorage {
    async fn create_or_migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS table_meta (
                id BIGINT PRIMARY KEY,
                columns JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create table_meta")?;

        // seq preserves creation order even when created_at timestamps tie,
        // which always happens for rows inserted in one transaction.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS table_rows (
                seq BIGSERIAL PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create table_rows")?;

        sqlx::query(
            r#"
            INSERT INTO table_meta (id, columns)
            VALUES (1, $1)
            ON CONFLICT (id) DO NOTHING
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
                let raw: serde_json::Value = record.get("columns");
                serde_json::from_value(raw).map_err(|e| {
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
                serde_json::to_value(&columns).context("Failed to serialise columns")?;
            sqlx::query(
                r#"
                INSERT INTO table_meta (id, columns, updated_at)
                VALUES (1, $1, NOW())
                ON CONFLICT (id) DO UPDATE SET
                    columns = EXCLUDED.columns,
                    updated_at = NOW()
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
            let raw: serde_json::Value = record.get("data");
            let data: BTreeMap<String, String> = serde_json::from_value(raw).map_err(|e| {
                StorageError::invalid_data_format(e.to_string(), format!("table_rows.data id={id}"))
            })?;
            rows.push(Row { id, data });
        }

        Ok(TableSnapshot { columns, rows })
    }

    async fn replace_table(&self, columns: &[String], rows: &[Row]) -> Result<()> {
        let columns_json =
            serde_json::to_value(columns).context("Failed to serialise columns")?;

        let mut transaction = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO table_meta (id, columns, updated_at)
            VALUES (1, $1, NOW())
            ON CONFLICT (id) DO UPDATE SET
                columns = EXCLUDED.columns,
                updated_at = NOW()
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
                serde_json::to_value(&restricted).context("Failed to serialise row data")?;
            sqlx::query("INSERT INTO table_rows (id, data) VALUES ($1, $2)")
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
            .context("PostgreSQL health check failed")?;
        Ok(())
    }
}
