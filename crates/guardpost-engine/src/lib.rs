//! `guardpost-engine` — schedule-to-duty-status reconciliation and
//! lifecycle components.
//!
//! Five independent tasks share the same collections and compose only
//! through them:
//!
//! | Component | Cadence | Job |
//! |---|---|---|
//! | [`DutyStatusReconciler`] | every few minutes | derive every guard's On/Off Duty state from today's schedule windows and write the full roster back atomically |
//! | [`ScheduleArchiver`] | every few minutes | move ended schedules (today's same-day, yesterday's overnight) to `EndedSchedules` and reset their checkpoints |
//! | [`RecurringMaterializer`] | daily | expand active weekly/monthly templates into today's schedule records, guarded against duplicates |
//! | [`CheckpointResetter`] | daily | reset every checkpoint to its unscanned baseline |
//! | [`AccountNotifier`] | on account creation | email credentials to newly provisioned guards |
//!
//! Every task recomputes desired state from a fresh snapshot plus "now" —
//! there is no incremental bookkeeping to corrupt, so retries, overlaps and
//! abandoned runs all converge at the next successful invocation.

pub mod archiver;
pub mod checkpoint_reset;
pub mod duty_window;
pub mod error;
pub mod materializer;
pub mod notify;
pub mod reconciler;

pub use archiver::ScheduleArchiver;
pub use checkpoint_reset::CheckpointResetter;
pub use duty_window::DutyWindow;
pub use error::{EngineError, Result};
pub use materializer::RecurringMaterializer;
pub use notify::AccountNotifier;
pub use reconciler::DutyStatusReconciler;
