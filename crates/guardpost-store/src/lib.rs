//! `guardpost-store` — the document-database seam.
//!
//! Collections hold schemaless JSON documents; the engine reads them with
//! equality queries and mutates them exclusively through atomic
//! [`WriteBatch`]es (all operations commit together or not at all). The
//! bundled adapter is [`sqlite::SqliteStore`] — one `documents` table,
//! one transaction per batch — but every component talks to the
//! [`DocumentStore`] trait, so tests and alternative backends plug in
//! without touching engine code.

pub mod batch;
pub mod document;
pub mod error;
pub mod models;
pub mod sqlite;
pub mod store;

pub use batch::{BatchOp, WriteBatch, MAX_BATCH_OPS};
pub use document::{collections, Document, DocumentEvent};
pub use error::{Result, StoreError};
pub use sqlite::SqliteStore;
pub use store::DocumentStore;
