use serde_json::Value;
use uuid::Uuid;

/// Hard ceiling on primitive operations per atomic commit. Mirrors the
/// per-batch limit of the production document store; anything larger must
/// be chunked by the caller.
pub const MAX_BATCH_OPS: usize = 500;

/// A single primitive operation inside a [`WriteBatch`].
///
/// `stamp_fields` name document fields the store overwrites with its own
/// clock at commit time — server-timestamp semantics, so concurrent writers
/// never disagree because of process clock skew.
#[derive(Debug, Clone)]
pub enum BatchOp {
    /// Upsert the full document.
    Set {
        collection: String,
        id: String,
        data: Value,
        stamp_fields: Vec<&'static str>,
    },
    /// Merge `fields` into an existing document. Fails the batch when the
    /// document is missing.
    Update {
        collection: String,
        id: String,
        fields: Value,
        stamp_fields: Vec<&'static str>,
    },
    /// Remove a document. Deleting an absent document is a no-op.
    Delete { collection: String, id: String },
}

/// A guard evaluated inside the commit transaction: if any document in
/// `collection` matches all equality `filters`, the batch fails with
/// [`StoreError::PreconditionFailed`](crate::StoreError::PreconditionFailed)
/// and none of its operations apply.
#[derive(Debug, Clone)]
pub struct Precondition {
    pub collection: String,
    pub filters: Vec<(String, Value)>,
}

/// An all-or-nothing set of writes. Build it up, then hand it to
/// [`DocumentStore::apply`](crate::DocumentStore::apply); partial
/// application is impossible by construction.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub(crate) ops: Vec<BatchOp>,
    pub(crate) preconditions: Vec<Precondition>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert with a caller-chosen id.
    pub fn set(&mut self, collection: &str, id: &str, data: Value) {
        self.set_stamped(collection, id, data, &[]);
    }

    pub fn set_stamped(
        &mut self,
        collection: &str,
        id: &str,
        data: Value,
        stamp_fields: &[&'static str],
    ) {
        self.ops.push(BatchOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
            stamp_fields: stamp_fields.to_vec(),
        });
    }

    /// Insert a new document under a generated v4 UUID. Returns the id.
    pub fn create_stamped(
        &mut self,
        collection: &str,
        data: Value,
        stamp_fields: &[&'static str],
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.set_stamped(collection, &id, data, stamp_fields);
        id
    }

    pub fn update(&mut self, collection: &str, id: &str, fields: Value) {
        self.update_stamped(collection, id, fields, &[]);
    }

    pub fn update_stamped(
        &mut self,
        collection: &str,
        id: &str,
        fields: Value,
        stamp_fields: &[&'static str],
    ) {
        self.ops.push(BatchOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
            stamp_fields: stamp_fields.to_vec(),
        });
    }

    pub fn delete(&mut self, collection: &str, id: &str) {
        self.ops.push(BatchOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    }

    /// Add a duplication guard (see [`Precondition`]). Guards are checked
    /// before any operation runs and cost no ops against the ceiling.
    pub fn require_no_match(&mut self, collection: &str, filters: &[(&str, Value)]) {
        self.preconditions.push(Precondition {
            collection: collection.to_string(),
            filters: filters
                .iter()
                .map(|(field, value)| (field.to_string(), value.clone()))
                .collect(),
        });
    }

    /// Number of primitive operations queued.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
