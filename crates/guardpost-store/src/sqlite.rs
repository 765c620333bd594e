use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

use crate::{
    batch::{BatchOp, WriteBatch, MAX_BATCH_OPS},
    document::{Document, DocumentEvent},
    error::{Result, StoreError},
    store::DocumentStore,
};

/// Initialise the documents table. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS documents (
            collection  TEXT NOT NULL,
            id          TEXT NOT NULL,
            data        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        );
        CREATE INDEX IF NOT EXISTS idx_documents_collection
            ON documents(collection);",
    )
}

/// SQLite-backed [`DocumentStore`]: one row per document, JSON payload in a
/// text column, one transaction per batch.
///
/// Server timestamps are a single `Utc::now()` taken inside `apply`, so
/// every stamped field in one batch carries the same instant regardless of
/// how long the batch took to build.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    /// If set, brand-new documents are forwarded here after their batch
    /// commits. `try_send` — a slow consumer never stalls a writer.
    created_tx: Option<mpsc::Sender<DocumentEvent>>,
}

impl SqliteStore {
    pub fn new(conn: Connection, created_tx: Option<mpsc::Sender<DocumentEvent>>) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            created_tx,
        })
    }

    /// Fresh in-memory store — used by the test suites.
    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?, None)
    }

    pub fn with_events(mut self, created_tx: mpsc::Sender<DocumentEvent>) -> Self {
        self.created_tx = Some(created_tx);
        self
    }
}

/// Convert a JSON filter value to a SQL parameter that compares correctly
/// against `json_extract` output (strings stay text, bools become 0/1).
fn sql_param(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    match value {
        Value::String(s) => Sql::Text(s.clone()),
        Value::Bool(b) => Sql::Integer(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Sql::Integer(i)
            } else {
                Sql::Real(n.as_f64().unwrap_or_default())
            }
        }
        Value::Null => Sql::Null,
        other => Sql::Text(other.to_string()),
    }
}

/// Append `AND json_extract(data, '$.field') = ?N` per filter.
///
/// Field names are engine-internal constants, never external input, so
/// interpolating them into the statement is safe.
fn append_filters<'a>(
    sql: &mut String,
    params: &mut Vec<rusqlite::types::Value>,
    filters: impl Iterator<Item = (&'a str, &'a Value)>,
) {
    for (field, value) in filters {
        params.push(sql_param(value));
        sql.push_str(&format!(
            " AND json_extract(data, '$.{}') = ?{}",
            field,
            params.len()
        ));
    }
}

fn select_documents(
    conn: &Connection,
    collection: &str,
    filters: &[(&str, Value)],
    limit: Option<u32>,
) -> Result<Vec<Document>> {
    let mut sql = String::from("SELECT id, data FROM documents WHERE collection = ?1");
    let mut params: Vec<rusqlite::types::Value> =
        vec![rusqlite::types::Value::Text(collection.to_string())];
    append_filters(&mut sql, &mut params, filters.iter().map(|(f, v)| (*f, v)));
    if let Some(n) = limit {
        sql.push_str(&format!(" LIMIT {n}"));
    }

    let mut stmt = conn.prepare(&sql)?;
    let docs = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .filter_map(|r| r.ok())
        .filter_map(|(id, text)| match serde_json::from_str(&text) {
            Ok(data) => Some(Document { id, data }),
            Err(e) => {
                warn!(collection, id, "skipping undeserializable document: {e}");
                None
            }
        })
        .collect();
    Ok(docs)
}

fn apply_tx(conn: &mut Connection, batch: WriteBatch) -> Result<Vec<DocumentEvent>> {
    let tx = conn.transaction()?;

    for pre in &batch.preconditions {
        let mut sql = String::from("SELECT 1 FROM documents WHERE collection = ?1");
        let mut params: Vec<rusqlite::types::Value> =
            vec![rusqlite::types::Value::Text(pre.collection.clone())];
        append_filters(
            &mut sql,
            &mut params,
            pre.filters.iter().map(|(f, v)| (f.as_str(), v)),
        );
        sql.push_str(" LIMIT 1");

        let matched = tx
            .query_row(&sql, rusqlite::params_from_iter(params), |_| Ok(()))
            .optional()?
            .is_some();
        if matched {
            return Err(StoreError::PreconditionFailed {
                collection: pre.collection.clone(),
            });
        }
    }

    // One instant per batch — the store's clock, not the builder's.
    let server_now = Utc::now().to_rfc3339();
    let mut created = Vec::new();

    for op in batch.ops {
        match op {
            BatchOp::Set {
                collection,
                id,
                mut data,
                stamp_fields,
            } => {
                let obj = data.as_object_mut().ok_or_else(|| StoreError::NotAnObject {
                    collection: collection.clone(),
                    id: id.clone(),
                })?;
                for field in stamp_fields {
                    obj.insert(field.to_string(), Value::String(server_now.clone()));
                }

                let existed = tx
                    .query_row(
                        "SELECT 1 FROM documents WHERE collection = ?1 AND id = ?2",
                        rusqlite::params![collection, id],
                        |_| Ok(()),
                    )
                    .optional()?
                    .is_some();

                let text = serde_json::to_string(&data)?;
                tx.execute(
                    "INSERT INTO documents (collection, id, data, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?4)
                     ON CONFLICT(collection, id) DO UPDATE SET
                       data = excluded.data, updated_at = excluded.updated_at",
                    rusqlite::params![collection, id, text, server_now],
                )?;

                if !existed {
                    created.push(DocumentEvent {
                        collection,
                        id,
                        data,
                    });
                }
            }

            BatchOp::Update {
                collection,
                id,
                fields,
                stamp_fields,
            } => {
                let text: Option<String> = tx
                    .query_row(
                        "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                        rusqlite::params![collection, id],
                        |row| row.get(0),
                    )
                    .optional()?;
                let Some(text) = text else {
                    return Err(StoreError::MissingDocument { collection, id });
                };

                let mut doc: Value = serde_json::from_str(&text)?;
                let obj = doc.as_object_mut().ok_or_else(|| StoreError::NotAnObject {
                    collection: collection.clone(),
                    id: id.clone(),
                })?;
                let Value::Object(patch) = fields else {
                    return Err(StoreError::NotAnObject { collection, id });
                };
                for (key, value) in patch {
                    obj.insert(key, value);
                }
                for field in stamp_fields {
                    obj.insert(field.to_string(), Value::String(server_now.clone()));
                }

                let updated = serde_json::to_string(&doc)?;
                tx.execute(
                    "UPDATE documents SET data = ?3, updated_at = ?4
                     WHERE collection = ?1 AND id = ?2",
                    rusqlite::params![collection, id, updated, server_now],
                )?;
            }

            BatchOp::Delete { collection, id } => {
                tx.execute(
                    "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                    rusqlite::params![collection, id],
                )?;
            }
        }
    }

    tx.commit()?;
    Ok(created)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let conn = self.conn.lock().unwrap();
        select_documents(&conn, collection, &[], None)
    }

    async fn query(&self, collection: &str, filters: &[(&str, Value)]) -> Result<Vec<Document>> {
        let conn = self.conn.lock().unwrap();
        select_documents(&conn, collection, filters, None)
    }

    async fn find_first(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
    ) -> Result<Option<Document>> {
        let conn = self.conn.lock().unwrap();
        Ok(select_documents(&conn, collection, filters, Some(1))?.pop())
    }

    async fn apply(&self, batch: WriteBatch) -> Result<()> {
        if batch.len() > MAX_BATCH_OPS {
            return Err(StoreError::BatchTooLarge { size: batch.len() });
        }
        if batch.is_empty() && batch.preconditions.is_empty() {
            return Ok(());
        }

        let events = {
            let mut conn = self.conn.lock().unwrap();
            apply_tx(&mut conn, batch)?
        };

        if let Some(tx) = &self.created_tx {
            for event in events {
                if tx.try_send(event).is_err() {
                    warn!("document creation event dropped — channel full or closed");
                }
            }
        }
        Ok(())
    }
}
