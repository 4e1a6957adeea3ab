//! SQLite row store over `tokio-rusqlite`.

use std::path::Path;

use async_trait::async_trait;
use tokio_rusqlite::Connection;

use super::{PendingRow, RowStore};
use crate::types::IngestError;

/// Row store backed by a single SQLite database file.
///
/// Table and column names arrive from request payloads, so they are validated
/// as plain identifiers and double-quoted before being interpolated into SQL;
/// id and embedding values are always bound parameters.
#[derive(Clone)]
pub struct SqliteRowStore {
    conn: Connection,
}

impl SqliteRowStore {
    /// Opens (or creates) the database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let conn = Connection::open(path)
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))?;
        Ok(Self { conn })
    }

    /// Opens an in-memory database. Useful for tests and demos.
    pub async fn open_in_memory() -> Result<Self, IngestError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))?;
        Ok(Self { conn })
    }

    /// Underlying connection, for operations outside the [`RowStore`]
    /// contract (schema setup, seeding, ad-hoc queries).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Validates `name` as a bare SQL identifier and returns it double-quoted.
fn quote_identifier(name: &str) -> Result<String, IngestError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(format!("\"{name}\""))
    } else {
        Err(IngestError::Storage(format!(
            "invalid identifier '{name}'"
        )))
    }
}

#[async_trait]
impl RowStore for SqliteRowStore {
    async fn select_missing_embeddings(
        &self,
        table: &str,
        ids: &[String],
        content_column: &str,
        embedding_column: &str,
    ) -> Result<Vec<PendingRow>, IngestError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let table = quote_identifier(table)?;
        let content = quote_identifier(content_column)?;
        let embedding = quote_identifier(embedding_column)?;

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, {content} FROM {table} \
             WHERE id IN ({placeholders}) AND {embedding} IS NULL"
        );
        let ids = ids.to_vec();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql).map_err(tokio_rusqlite::Error::Rusqlite)?;
                let rows = stmt
                    .query_map(tokio_rusqlite::params_from_iter(ids.iter()), |row| {
                        Ok(PendingRow {
                            id: row.get(0)?,
                            content: row.get(1)?,
                        })
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }
                Ok(results)
            })
            .await
            .map_err(|err| IngestError::StoreRead(err.to_string()))
    }

    async fn write_embedding(
        &self,
        table: &str,
        id: &str,
        embedding_column: &str,
        embedding_json: &str,
    ) -> Result<(), IngestError> {
        let quoted_table = quote_identifier(table).map_err(|err| IngestError::StoreWrite {
            id: id.to_string(),
            reason: err.to_string(),
        })?;
        let quoted_column =
            quote_identifier(embedding_column).map_err(|err| IngestError::StoreWrite {
                id: id.to_string(),
                reason: err.to_string(),
            })?;

        let sql = format!("UPDATE {quoted_table} SET {quoted_column} = ? WHERE id = ?");
        let embedding_json = embedding_json.to_string();
        let row_id = id.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(&sql, (&embedding_json, &row_id))
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await
            .map(|_| ())
            .map_err(|err| IngestError::StoreWrite {
                id: id.to_string(),
                reason: err.to_string(),
            })
    }
}
