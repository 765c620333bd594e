use serde_json::Value;

/// Names of the collections this engine reads and writes. Shared constants
/// so a typo can't silently split a collection in two.
pub mod collections {
    pub const ACCOUNTS: &str = "Accounts";
    pub const SCHEDULES: &str = "Schedules";
    pub const ENDED_SCHEDULES: &str = "EndedSchedules";
    pub const WEEKLY_SCHEDULES: &str = "WeeklySchedules";
    pub const MONTHLY_SCHEDULES: &str = "MonthlySchedules";
    pub const CHECKPOINTS: &str = "Checkpoints";
}

/// One stored document: its id within the collection plus the JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// String field accessor; `None` when absent or not a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }
}

/// Emitted by a store after a committed batch created a brand-new document.
/// This is the feed the account-created notification listens on.
#[derive(Debug, Clone)]
pub struct DocumentEvent {
    pub collection: String,
    pub id: String,
    pub data: Value,
}
