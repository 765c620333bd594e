//! `guardpost-triggers` — cadence-driven invocation of the lifecycle tasks.
//!
//! Each entry point registers a [`TriggerSpec`] (name, cadence, timeout
//! budget) plus a [`TriggerTask`]. The [`TriggerRunner`] polls every second
//! and fires whatever is due, bounding each invocation with its timeout.
//! A failed or timed-out run is logged and simply retried at the next
//! scheduled fire — every task recomputes from scratch, so dropped runs
//! only delay convergence.

pub mod cadence;
pub mod runner;

pub use cadence::Cadence;
pub use runner::{TaskError, TriggerRunner, TriggerSpec, TriggerTask};
