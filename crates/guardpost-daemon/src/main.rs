use std::sync::Arc;
use std::time::Duration;

use guardpost_core::{
    config::{
        GuardpostConfig, DEFAULT_ARCHIVE_TIMEOUT_SECS, DEFAULT_DAILY_TIMEOUT_SECS,
        DEFAULT_STATUS_TIMEOUT_SECS,
    },
    Zone,
};
use guardpost_engine::{
    AccountNotifier, CheckpointResetter, DutyStatusReconciler, RecurringMaterializer,
    ScheduleArchiver,
};
use guardpost_mailer::{resolve, LogMailer, MailerHandle};
use guardpost_store::{DocumentEvent, DocumentStore, SqliteStore};
use guardpost_triggers::{Cadence, TriggerRunner, TriggerSpec};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guardpost=info".into()),
        )
        .init();

    // load config: GUARDPOST_CONFIG env > ./guardpost.toml, env overrides on top
    let config = GuardpostConfig::load(None).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        GuardpostConfig::default()
    });

    let zone = Zone::parse(&config.engine.utc_offset)?;
    info!(offset = %config.engine.utc_offset, "engine zone configured");

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");
    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    // Created-document channel: store → account notifier task
    let (created_tx, mut created_rx) = tokio::sync::mpsc::channel::<DocumentEvent>(256);
    let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::new(db, Some(created_tx))?);

    // mail capability — disabled unless MAIL_USER and MAIL_PASS are set
    let mail = match resolve(&config.mail) {
        Some(settings) => {
            info!(from = %settings.from, service = %settings.service, "mail capability enabled");
            let transport = Arc::new(LogMailer::new(settings.clone()));
            MailerHandle::from_settings(Some(settings), transport)
        }
        None => MailerHandle::Disabled,
    };

    let notifier = AccountNotifier::new(mail);
    tokio::spawn(async move {
        while let Some(event) = created_rx.recv().await {
            notifier.handle_created(&event).await;
        }
    });

    let mut runner = TriggerRunner::new(zone);
    runner.register(
        TriggerSpec {
            name: "duty-status-reconciler",
            cadence: Cadence::EveryMinutes(config.triggers.status_cadence_mins),
            timeout: Duration::from_secs(DEFAULT_STATUS_TIMEOUT_SECS),
        },
        Arc::new(DutyStatusReconciler::new(store.clone())),
    );
    runner.register(
        TriggerSpec {
            name: "schedule-archiver",
            cadence: Cadence::EveryMinutes(config.triggers.archive_cadence_mins),
            timeout: Duration::from_secs(DEFAULT_ARCHIVE_TIMEOUT_SECS),
        },
        Arc::new(ScheduleArchiver::new(store.clone())),
    );

    let daily = Cadence::parse_daily(&config.triggers.daily_at).unwrap_or_else(|| {
        warn!(
            daily_at = %config.triggers.daily_at,
            "unparseable triggers.daily_at — falling back to midnight"
        );
        Cadence::DailyAt { hour: 0, minute: 0 }
    });
    runner.register(
        TriggerSpec {
            name: "recurring-materializer",
            cadence: daily,
            timeout: Duration::from_secs(DEFAULT_DAILY_TIMEOUT_SECS),
        },
        Arc::new(RecurringMaterializer::new(store.clone())),
    );
    runner.register(
        TriggerSpec {
            name: "checkpoint-reset",
            cadence: daily,
            timeout: Duration::from_secs(DEFAULT_DAILY_TIMEOUT_SECS),
        },
        Arc::new(CheckpointResetter::new(store.clone())),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let runner_task = tokio::spawn(async move { runner.run(shutdown_rx).await });

    info!("guardpost daemon running — Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("shutdown requested");
    let _ = shutdown_tx.send(true);
    let _ = runner_task.await;
    Ok(())
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
