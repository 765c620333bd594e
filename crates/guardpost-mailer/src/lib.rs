//! `guardpost-mailer` — the outbound-mail capability boundary.
//!
//! Actual delivery is an external concern; this crate owns everything up to
//! that line: resolving the `MAIL_*` configuration (the capability is
//! disabled unless both user and password are set), composing the
//! guard-account email, and the [`Mailer`] trait the engine sends through.

pub mod compose;
pub mod error;
pub mod mailer;

pub use compose::compose_account_email;
pub use error::MailError;
pub use mailer::{resolve, LogMailer, MailSettings, Mailer, MailerHandle, MemoryMailer, OutgoingEmail};
