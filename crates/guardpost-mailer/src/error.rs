use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    /// The capability is not configured (no MAIL_USER + MAIL_PASS).
    #[error("Mail capability disabled: {0}")]
    Disabled(String),

    /// The underlying delivery mechanism failed.
    #[error("Mail transport error: {0}")]
    Transport(String),
}
