use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default cadences and timeout budgets for the timed triggers. These match
/// the production schedule the engine was sized for; override via config.
pub const DEFAULT_STATUS_CADENCE_MINS: u32 = 5;
pub const DEFAULT_ARCHIVE_CADENCE_MINS: u32 = 5;
pub const DEFAULT_STATUS_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_ARCHIVE_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_DAILY_TIMEOUT_SECS: u64 = 300;

/// Top-level config (guardpost.toml + GUARDPOST_* env overrides; the
/// `[mail]` section additionally accepts bare MAIL_* variables).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GuardpostConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub triggers: TriggersConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Engine-wide settings shared by every trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// UTC offset all "today"/"now" computations are anchored to.
    /// Never fall back to the host's local zone.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggersConfig {
    /// Minutes between duty-status reconciliation runs.
    #[serde(default = "default_status_cadence")]
    pub status_cadence_mins: u32,
    /// Minutes between schedule-archiver runs.
    #[serde(default = "default_archive_cadence")]
    pub archive_cadence_mins: u32,
    /// Local "HH:MM" at which the daily triggers (materializer, checkpoint
    /// reset) fire.
    #[serde(default = "default_daily_at")]
    pub daily_at: String,
}

impl Default for TriggersConfig {
    fn default() -> Self {
        Self {
            status_cadence_mins: default_status_cadence(),
            archive_cadence_mins: default_archive_cadence(),
            daily_at: default_daily_at(),
        }
    }
}

/// Mail capability parameters. All strings so they can come straight from
/// env; `port` and `secure` are parsed leniently at resolution time.
/// The capability is enabled only when both `user` and `pass` are set.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MailConfig {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub secure: String,
}

impl GuardpostConfig {
    /// Load config: explicit path > GUARDPOST_CONFIG env > ./guardpost.toml.
    ///
    /// Missing file is fine — every field has a default, and env overrides
    /// still apply.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var("GUARDPOST_CONFIG").ok())
            .unwrap_or_else(|| "guardpost.toml".to_string());

        let config: GuardpostConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("GUARDPOST_").split("__"))
            .merge(Env::prefixed("MAIL_").map(|key| {
                format!("mail.{}", key.as_str().to_lowercase()).into()
            }))
            .extract()
            .map_err(|e| crate::error::GuardpostError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_db_path() -> String {
    "guardpost.db".to_string()
}

fn default_utc_offset() -> String {
    // Asia/Manila — the deployment this engine was written for. No DST.
    "+08:00".to_string()
}

fn default_status_cadence() -> u32 {
    DEFAULT_STATUS_CADENCE_MINS
}

fn default_archive_cadence() -> u32 {
    DEFAULT_ARCHIVE_CADENCE_MINS
}

fn default_daily_at() -> String {
    "00:00".to_string()
}
