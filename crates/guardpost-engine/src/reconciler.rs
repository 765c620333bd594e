use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use guardpost_core::LocalMoment;
use guardpost_store::{
    collections,
    models::{DutyStatus, GuardAccount, ScheduleRecord},
    DocumentStore, WriteBatch,
};
use guardpost_triggers::{TaskError, TriggerTask};
use serde_json::json;
use tracing::{info, warn};

use crate::duty_window::DutyWindow;
use crate::error::Result;

/// Recomputes every security guard's duty status from today's schedules
/// and writes the whole roster back in one atomic batch.
///
/// Guards without an active window are explicitly written Off Duty rather
/// than skipped, so a crashed previous run self-heals on the next tick.
pub struct DutyStatusReconciler {
    store: Arc<dyn DocumentStore>,
}

#[derive(Clone)]
struct ComputedStatus {
    status: DutyStatus,
    schedule_type: Option<String>,
}

impl DutyStatusReconciler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn reconcile(&self, moment: LocalMoment) -> Result<()> {
        let accounts = self
            .store
            .query(collections::ACCOUNTS, &[("role", json!("Security"))])
            .await?;

        // Roster of (document id, guard id); everyone defaults to Off Duty.
        let mut roster: Vec<(String, String)> = Vec::with_capacity(accounts.len());
        let mut computed: HashMap<String, ComputedStatus> = HashMap::new();
        for doc in &accounts {
            let account = match GuardAccount::parse(doc) {
                Ok(a) => a,
                Err(e) => {
                    warn!(account = %doc.id, "skipping undeserializable account: {e}");
                    continue;
                }
            };
            if account.guard_id.is_empty() {
                continue;
            }
            computed.insert(
                account.guard_id.clone(),
                ComputedStatus {
                    status: DutyStatus::OffDuty,
                    schedule_type: None,
                },
            );
            roster.push((doc.id.clone(), account.guard_id));
        }

        let schedules = self
            .store
            .query(collections::SCHEDULES, &[("date", json!(moment.date_str()))])
            .await?;

        for doc in &schedules {
            let schedule = match ScheduleRecord::parse(doc) {
                Ok(s) => s,
                Err(e) => {
                    warn!(schedule = %doc.id, "skipping undeserializable schedule: {e}");
                    continue;
                }
            };
            let Some(window) = DutyWindow::parse(&schedule.start_time, &schedule.end_time) else {
                warn!(
                    schedule = %doc.id,
                    start = %schedule.start_time,
                    end = %schedule.end_time,
                    "skipping schedule with malformed time window"
                );
                continue;
            };
            if schedule.guard_id.is_empty() {
                continue;
            }
            if window.covers(moment.minute_of_day) {
                // Last writer among today's schedules wins; iteration order
                // is the store's and is not guaranteed.
                computed.insert(
                    schedule.guard_id.clone(),
                    ComputedStatus {
                        status: DutyStatus::OnDuty,
                        schedule_type: Some(
                            schedule.schedule_type.unwrap_or_else(|| "daily".to_string()),
                        ),
                    },
                );
            }
        }

        if roster.is_empty() {
            info!("no security accounts to reconcile");
            return Ok(());
        }

        let mut batch = WriteBatch::new();
        let mut on_duty = 0usize;
        for (doc_id, guard_id) in &roster {
            let entry = computed.get(guard_id).cloned().unwrap_or(ComputedStatus {
                status: DutyStatus::OffDuty,
                schedule_type: None,
            });
            if entry.status == DutyStatus::OnDuty {
                on_duty += 1;
            }
            batch.update_stamped(
                collections::ACCOUNTS,
                doc_id,
                json!({
                    "status": entry.status,
                    "schedule_type": entry.schedule_type,
                }),
                &["last_status_update"],
            );
        }
        self.store.apply(batch).await?;

        info!(
            guards = roster.len(),
            on_duty,
            date = %moment.date_str(),
            "duty statuses reconciled"
        );
        Ok(())
    }
}

#[async_trait]
impl TriggerTask for DutyStatusReconciler {
    async fn run(&self, now: DateTime<FixedOffset>) -> std::result::Result<(), TaskError> {
        self.reconcile(LocalMoment::from_datetime(now))
            .await
            .map_err(Into::into)
    }
}
