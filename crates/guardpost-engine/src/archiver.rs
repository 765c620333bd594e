use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use guardpost_core::LocalMoment;
use guardpost_store::{
    collections,
    models::{checkpoint_baseline, ScheduleRecord},
    Document, DocumentStore, WriteBatch,
};
use guardpost_triggers::{TaskError, TriggerTask};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::duty_window::DutyWindow;
use crate::error::Result;

/// Schedules moved per batch. Each move is a create + delete pair, so this
/// stays at 400 primitive ops — comfortably under the store's 500-op
/// ceiling.
const MOVE_CHUNK: usize = 200;
/// Checkpoint reset updates per sub-batch.
const CHECKPOINT_CHUNK: usize = 400;

/// Moves fully ended schedules into `EndedSchedules` and resets the
/// checkpoints they reference to the unscanned baseline.
///
/// Two anchors matter: today's same-day windows end today, and yesterday's
/// overnight windows end today once "now" crosses their end time. Anything
/// else (yesterday's same-day leftovers, today's still-running overnights)
/// is left for a later pass.
pub struct ScheduleArchiver {
    store: Arc<dyn DocumentStore>,
}

impl ScheduleArchiver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn archive(&self, moment: LocalMoment) -> Result<()> {
        let today_filter = [("date", json!(moment.date_str()))];
        let yesterday_filter = [("date", json!(moment.yesterday_str()))];
        let (today_docs, yesterday_docs) = tokio::join!(
            self.store.query(collections::SCHEDULES, &today_filter),
            self.store.query(collections::SCHEDULES, &yesterday_filter),
        );

        let mut ended: Vec<Document> = Vec::new();
        for (docs, from_yesterday) in [(today_docs?, false), (yesterday_docs?, true)] {
            for doc in docs {
                if self.schedule_has_ended(&doc, from_yesterday, moment.minute_of_day) {
                    ended.push(doc);
                }
            }
        }

        if ended.is_empty() {
            info!("no ended schedules to archive at this time");
            return Ok(());
        }

        for chunk in ended.chunks(MOVE_CHUNK) {
            let mut batch = WriteBatch::new();
            for doc in chunk {
                batch.set_stamped(
                    collections::ENDED_SCHEDULES,
                    &doc.id,
                    archived_copy(&doc.data),
                    &["ended_at"],
                );
                batch.delete(collections::SCHEDULES, &doc.id);
            }
            self.store.apply(batch).await?;

            // Only after the move is durable: baseline the checkpoints the
            // archived schedules referenced.
            for doc in chunk {
                self.reset_schedule_checkpoints(doc).await?;
            }
        }

        info!(count = ended.len(), "moved ended schedules to archive");
        Ok(())
    }

    fn schedule_has_ended(&self, doc: &Document, from_yesterday: bool, now: u32) -> bool {
        let schedule = match ScheduleRecord::parse(doc) {
            Ok(s) => s,
            Err(e) => {
                warn!(schedule = %doc.id, "skipping undeserializable schedule: {e}");
                return false;
            }
        };
        let Some(window) = DutyWindow::parse(&schedule.start_time, &schedule.end_time) else {
            // Malformed window — leave the record alone.
            return false;
        };
        if from_yesterday {
            window.ended_overnight(now)
        } else {
            window.ended_same_day(now)
        }
    }

    async fn reset_schedule_checkpoints(&self, doc: &Document) -> Result<()> {
        let Ok(schedule) = ScheduleRecord::parse(doc) else {
            return Ok(());
        };
        if schedule.checkpoints.is_empty() {
            return Ok(());
        }

        let ids: Vec<&str> = schedule
            .checkpoints
            .iter()
            .filter_map(|raw| match raw.as_str().map(str::trim) {
                Some(id) if !id.is_empty() => Some(id),
                _ => {
                    warn!(
                        schedule = %doc.id,
                        value = %raw,
                        "skipping invalid checkpoint id during reset"
                    );
                    None
                }
            })
            .collect();

        for chunk in ids.chunks(CHECKPOINT_CHUNK) {
            let mut batch = WriteBatch::new();
            for id in chunk {
                batch.update(collections::CHECKPOINTS, id, checkpoint_baseline());
            }
            self.store.apply(batch).await?;
        }

        info!(
            schedule = %doc.id,
            count = ids.len(),
            "reset checkpoints for ended schedule"
        );
        Ok(())
    }
}

/// The archived form: every original field, provenance tag, and a
/// `schedule_type` that always reads back ("daily" when the source record
/// had none).
fn archived_copy(data: &Value) -> Value {
    let mut copy = data.clone();
    if let Some(obj) = copy.as_object_mut() {
        obj.insert(
            "source_collection".to_string(),
            json!(collections::SCHEDULES),
        );
        let missing_type = obj
            .get("schedule_type")
            .map_or(true, |v| v.is_null() || v.as_str() == Some(""));
        if missing_type {
            obj.insert("schedule_type".to_string(), json!("daily"));
        }
    }
    copy
}

#[async_trait]
impl TriggerTask for ScheduleArchiver {
    async fn run(&self, now: DateTime<FixedOffset>) -> std::result::Result<(), TaskError> {
        self.archive(LocalMoment::from_datetime(now))
            .await
            .map_err(Into::into)
    }
}
