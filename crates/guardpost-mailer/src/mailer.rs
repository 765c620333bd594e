use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use guardpost_core::config::MailConfig;
use tracing::{info, warn};

use crate::error::MailError;

/// One outbound message, ready for whatever transport is wired in.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Delivery seam. Implementations must be `Send + Sync` so a single
/// instance can serve every notification task.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Transport settings resolved from config. `host`/`port`/`secure` are
/// carried through for whichever delivery integration is attached; the
/// engine itself only needs `from`.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub from: String,
    pub service: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub secure: bool,
}

fn parse_bool(value: &str) -> Option<bool> {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    Some(matches!(normalized.as_str(), "true" | "1" | "yes" | "y"))
}

fn parse_port(value: &str) -> Option<u16> {
    value.trim().parse::<u16>().ok().filter(|p| *p > 0)
}

/// Resolve the mail capability from config. `None` means disabled — user
/// and password were not both provided — and is logged once here; callers
/// skip notification rather than retrying.
pub fn resolve(config: &MailConfig) -> Option<MailSettings> {
    if config.user.is_empty() || config.pass.is_empty() {
        warn!(
            "Mail configuration not found. Guard account emails will be skipped \
             until MAIL_USER and MAIL_PASS are set."
        );
        return None;
    }

    let from = if !config.from.is_empty() {
        config.from.clone()
    } else {
        config.user.clone()
    };

    Some(MailSettings {
        from,
        service: if config.service.is_empty() {
            "gmail".to_string()
        } else {
            config.service.clone()
        },
        host: (!config.host.is_empty()).then(|| config.host.clone()),
        port: parse_port(&config.port),
        secure: parse_bool(&config.secure).unwrap_or(false),
    })
}

/// The resolved capability as the engine sees it: either a transport plus
/// the from-address, or nothing.
#[derive(Clone)]
pub enum MailerHandle {
    Disabled,
    Enabled {
        from: String,
        transport: Arc<dyn Mailer>,
    },
}

impl MailerHandle {
    /// Wire `transport` behind the resolved settings, or `Disabled` when
    /// the configuration does not enable mail.
    pub fn from_settings(settings: Option<MailSettings>, transport: Arc<dyn Mailer>) -> Self {
        match settings {
            Some(s) => MailerHandle::Enabled {
                from: s.from,
                transport,
            },
            None => MailerHandle::Disabled,
        }
    }
}

/// Stand-in transport for deployments without a delivery integration:
/// records the attempt in the log and reports success. The real transport
/// lives outside this repository and replaces this at wiring time.
#[derive(Debug, Clone)]
pub struct LogMailer {
    settings: MailSettings,
}

impl LogMailer {
    pub fn new(settings: MailSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            service = %self.settings.service,
            "outbound email handed to transport"
        );
        Ok(())
    }
}

/// Test double: captures every sent email, optionally failing each send.
#[derive(Default)]
pub struct MemoryMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: bool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("simulated failure".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
