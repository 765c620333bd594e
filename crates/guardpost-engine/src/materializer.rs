use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use guardpost_core::LocalMoment;
use guardpost_store::{
    collections,
    models::{MonthlyTemplate, ScheduleKind, WeeklyTemplate},
    DocumentStore, StoreError, WriteBatch,
};
use guardpost_triggers::{TaskError, TriggerTask};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Expands active weekly and monthly templates into today's concrete
/// schedule records.
///
/// The duplication guard is transactional: each template's batch carries a
/// no-match precondition on (date, parent id), evaluated inside the commit,
/// so two overlapping runs cannot both materialize the same template.
pub struct RecurringMaterializer {
    store: Arc<dyn DocumentStore>,
}

impl RecurringMaterializer {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn materialize_today(&self, moment: LocalMoment) -> Result<()> {
        let today = moment.date_str();
        info!(date = %today, "managing recurring schedules");

        let weekly = self
            .store
            .query(collections::WEEKLY_SCHEDULES, &[("is_active", json!(true))])
            .await?;
        for doc in weekly {
            let template = match WeeklyTemplate::parse(&doc) {
                Ok(t) => t,
                Err(e) => {
                    warn!(template = %doc.id, "skipping undeserializable weekly template: {e}");
                    continue;
                }
            };
            let Ok(week_start) = NaiveDate::parse_from_str(&template.week_start_date, "%Y-%m-%d")
            else {
                warn!(
                    template = %doc.id,
                    week_start_date = %template.week_start_date,
                    "skipping weekly template with unparseable start date"
                );
                continue;
            };
            let week_end = week_start + Duration::days(6);
            if moment.date < week_start || moment.date > week_end {
                continue;
            }

            self.materialize_template(
                &doc.id,
                &template.guard_ids,
                &template.start_time,
                &template.end_time,
                &template.checkpoints,
                "parent_weekly_schedule_id",
                ScheduleKind::Weekly,
                &today,
            )
            .await?;
        }

        let monthly = self
            .store
            .query(collections::MONTHLY_SCHEDULES, &[("is_active", json!(true))])
            .await?;
        for doc in monthly {
            let template = match MonthlyTemplate::parse(&doc) {
                Ok(t) => t,
                Err(e) => {
                    warn!(template = %doc.id, "skipping undeserializable monthly template: {e}");
                    continue;
                }
            };
            if template.month_year != moment.month_str() {
                continue;
            }

            self.materialize_template(
                &doc.id,
                &template.guard_ids,
                &template.start_time,
                &template.end_time,
                &template.checkpoints,
                "parent_monthly_schedule_id",
                ScheduleKind::Monthly,
                &today,
            )
            .await?;
        }

        info!("recurring schedule management completed");
        Ok(())
    }

    /// Check-and-create for one template, atomic with the duplication
    /// guard. A lost race (or an earlier run today) surfaces as
    /// `PreconditionFailed` and is simply skipped; real store errors abort
    /// the remaining templates for this run — each template's write is
    /// independent, so whatever already committed stays committed.
    #[allow(clippy::too_many_arguments)]
    async fn materialize_template(
        &self,
        template_id: &str,
        guard_ids: &[String],
        start_time: &str,
        end_time: &str,
        checkpoints: &[Value],
        parent_field: &str,
        kind: ScheduleKind,
        today: &str,
    ) -> Result<()> {
        if guard_ids.is_empty() {
            return Ok(());
        }

        let mut batch = WriteBatch::new();
        batch.require_no_match(
            collections::SCHEDULES,
            &[("date", json!(today)), (parent_field, json!(template_id))],
        );
        for guard_id in guard_ids {
            let mut data = json!({
                "guard_id": guard_id,
                "date": today,
                "start_time": start_time,
                "end_time": end_time,
                "duty": true,
                "checkpoints": checkpoints,
                "schedule_type": kind,
            });
            data[parent_field] = json!(template_id);
            batch.create_stamped(collections::SCHEDULES, data, &["created_at"]);
        }

        match self.store.apply(batch).await {
            Ok(()) => {
                info!(
                    template = template_id,
                    kind = %kind,
                    date = today,
                    guards = guard_ids.len(),
                    "materialized recurring schedule"
                );
                Ok(())
            }
            Err(StoreError::PreconditionFailed { .. }) => {
                debug!(
                    template = template_id,
                    date = today,
                    "daily schedules already exist — skipping"
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl TriggerTask for RecurringMaterializer {
    async fn run(&self, now: DateTime<FixedOffset>) -> std::result::Result<(), TaskError> {
        self.materialize_today(LocalMoment::from_datetime(now))
            .await
            .map_err(Into::into)
    }
}
