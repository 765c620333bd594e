//! `guardpost-core` — configuration, shared error type and the zone clock.
//!
//! Everything else in the workspace builds on this crate. It carries no
//! persistence or scheduling logic of its own.

pub mod clock;
pub mod config;
pub mod error;

pub use clock::{LocalMoment, Zone};
pub use config::GuardpostConfig;
pub use error::{GuardpostError, Result};
