use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::document::Document;

/// Computed guard duty state, stored as `"On Duty"` / `"Off Duty"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DutyStatus {
    #[serde(rename = "On Duty")]
    OnDuty,
    #[serde(rename = "Off Duty")]
    OffDuty,
}

impl std::fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DutyStatus::OnDuty => write!(f, "On Duty"),
            DutyStatus::OffDuty => write!(f, "Off Duty"),
        }
    }
}

/// Which schedule category produced a record or a guard's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleKind::Daily => write!(f, "daily"),
            ScheduleKind::Weekly => write!(f, "weekly"),
            ScheduleKind::Monthly => write!(f, "monthly"),
        }
    }
}

/// An `Accounts` document. Only the fields this engine touches; everything
/// else rides along untyped in the raw document.
///
/// The optional identity fields exist solely for the account-created email.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuardAccount {
    #[serde(default)]
    pub guard_id: String,
    #[serde(default)]
    pub role: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub sex: Option<String>,
    pub account_status: Option<String>,
    pub status: Option<String>,
    pub initial_password: Option<String>,
}

impl GuardAccount {
    pub fn parse(doc: &Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc.data.clone())
    }

    /// Display name for the email: `name`, else "first last", else a
    /// generic fallback.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.trim().to_string();
        }
        let joined = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let joined = joined.trim();
        if joined.is_empty() {
            "Security Guard".to_string()
        } else {
            joined.to_string()
        }
    }
}

/// A `Schedules` document — one guard, one date, one duty window.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleRecord {
    #[serde(default)]
    pub guard_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub duty: bool,
    /// Raw checkpoint id list. Items are usually strings but the store does
    /// not enforce it, so consumers validate per item.
    #[serde(default)]
    pub checkpoints: Vec<Value>,
    pub schedule_type: Option<String>,
    pub parent_weekly_schedule_id: Option<String>,
    pub parent_monthly_schedule_id: Option<String>,
}

impl ScheduleRecord {
    pub fn parse(doc: &Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc.data.clone())
    }
}

/// A recurring template (`WeeklySchedules`). `week_start_date` anchors the
/// inclusive 7-day range the template covers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeeklyTemplate {
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub guard_ids: Vec<String>,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub checkpoints: Vec<Value>,
    #[serde(default)]
    pub week_start_date: String,
}

impl WeeklyTemplate {
    pub fn parse(doc: &Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc.data.clone())
    }
}

/// A recurring template (`MonthlySchedules`). `month_year` is `"YYYY-MM"`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthlyTemplate {
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub guard_ids: Vec<String>,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub checkpoints: Vec<Value>,
    #[serde(default)]
    pub month_year: String,
}

impl MonthlyTemplate {
    pub fn parse(doc: &Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc.data.clone())
    }
}

/// The stored checkpoint status string meaning "awaiting today's scan".
pub const CHECKPOINT_UNSCANNED: &str = "Not Yet Scanned";

/// The reset form of a `Checkpoints` document, applied both by the daily
/// reset and after a schedule is archived. Field names are the stored
/// (camelCase) ones.
pub fn checkpoint_baseline() -> Value {
    json!({
        "status": CHECKPOINT_UNSCANNED,
        "lastScannedAt": null,
        "remarks": null,
        "lastScannedById": null,
        "lastScannedByName": null,
        "lastScannedBy": null,
    })
}
