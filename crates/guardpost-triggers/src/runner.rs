use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use guardpost_core::Zone;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::cadence::Cadence;

/// Boxed error any task may return; the runner only logs it.
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// One schedulable entry point. `run` receives the zone-local "now" the
/// runner observed at fire time and must be idempotent — invocations can be
/// retried, dropped on timeout, or overlap with a neighboring trigger's
/// work on the shared collections.
#[async_trait]
pub trait TriggerTask: Send + Sync {
    async fn run(&self, now: DateTime<FixedOffset>) -> Result<(), TaskError>;
}

/// Scheduling contract for a registered task.
#[derive(Debug, Clone)]
pub struct TriggerSpec {
    pub name: &'static str,
    pub cadence: Cadence,
    /// Wall-clock budget per invocation; an overrun is abandoned and the
    /// next fire re-derives state from scratch.
    pub timeout: Duration,
}

struct Entry {
    spec: TriggerSpec,
    task: Arc<dyn TriggerTask>,
    next_fire: Option<DateTime<FixedOffset>>,
}

/// Drives all registered triggers off a one-second poll loop, the same way
/// an external cron host would: fire when due, bound with the timeout,
/// log failures, reschedule.
pub struct TriggerRunner {
    zone: Zone,
    entries: Vec<Entry>,
}

impl TriggerRunner {
    pub fn new(zone: Zone) -> Self {
        Self {
            zone,
            entries: Vec::new(),
        }
    }

    pub fn register(&mut self, spec: TriggerSpec, task: Arc<dyn TriggerTask>) {
        let next_fire = spec.cadence.next_fire(self.zone.now());
        match next_fire {
            Some(at) => info!(trigger = spec.name, next_fire = %at, "trigger registered"),
            None => warn!(trigger = spec.name, "trigger registered but will never fire"),
        }
        self.entries.push(Entry {
            spec,
            task,
            next_fire,
        });
    }

    /// Main loop. Polls every second until `shutdown` broadcasts `true`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(triggers = self.entries.len(), "trigger runner started");

        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("trigger runner shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Fire every trigger whose next-fire instant has arrived. Tasks run
    /// sequentially; a single trigger therefore never overlaps itself.
    async fn tick(&mut self) {
        for entry in &mut self.entries {
            let now = self.zone.now();
            let Some(due) = entry.next_fire else { continue };
            if now < due {
                continue;
            }

            debug!(trigger = entry.spec.name, "firing trigger");
            match tokio::time::timeout(entry.spec.timeout, entry.task.run(now)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    // The next scheduled fire is the retry.
                    error!(trigger = entry.spec.name, "trigger run failed: {e}");
                }
                Err(_) => {
                    error!(
                        trigger = entry.spec.name,
                        timeout_secs = entry.spec.timeout.as_secs(),
                        "trigger run exceeded its timeout budget — abandoned"
                    );
                }
            }

            entry.next_fire = entry.spec.cadence.next_fire(self.zone.now());
        }
    }
}
