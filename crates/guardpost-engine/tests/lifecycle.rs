// End-to-end lifecycle coverage against a real (in-memory) store:
// reconciliation, archiving, materialization and the daily reset, plus the
// scenario walking a guard through a full duty day.

use std::sync::Arc;

use chrono::NaiveDate;
use guardpost_core::LocalMoment;
use guardpost_engine::{
    CheckpointResetter, DutyStatusReconciler, RecurringMaterializer, ScheduleArchiver,
};
use guardpost_store::{collections, DocumentStore, SqliteStore, WriteBatch};
use serde_json::{json, Value};

fn store() -> Arc<dyn DocumentStore> {
    Arc::new(SqliteStore::open_in_memory().expect("in-memory store"))
}

fn moment(date: &str, hour: u32, minute: u32) -> LocalMoment {
    LocalMoment {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("test date"),
        minute_of_day: hour * 60 + minute,
    }
}

async fn seed(store: &Arc<dyn DocumentStore>, collection: &str, id: &str, data: Value) {
    let mut batch = WriteBatch::new();
    batch.set(collection, id, data);
    store.apply(batch).await.expect("seed");
}

async fn seed_guard(store: &Arc<dyn DocumentStore>, id: &str, guard_id: &str) {
    seed(
        store,
        collections::ACCOUNTS,
        id,
        json!({"role": "Security", "guard_id": guard_id, "status": "Off Duty"}),
    )
    .await;
}

async fn account_by_guard(store: &Arc<dyn DocumentStore>, guard_id: &str) -> Value {
    store
        .find_first(collections::ACCOUNTS, &[("guard_id", json!(guard_id))])
        .await
        .expect("query account")
        .expect("account exists")
        .data
}

// --- duty status reconciliation -----------------------------------------

#[tokio::test]
async fn reconciler_marks_covered_guard_on_duty_and_rest_off() {
    let store = store();
    seed_guard(&store, "a1", "G-1").await;
    seed_guard(&store, "a2", "G-2").await;
    seed(
        &store,
        collections::SCHEDULES,
        "s1",
        json!({"guard_id": "G-1", "date": "2025-03-14", "start_time": "09:00", "end_time": "17:00"}),
    )
    .await;

    let reconciler = DutyStatusReconciler::new(store.clone());
    reconciler
        .reconcile(moment("2025-03-14", 15, 0))
        .await
        .unwrap();

    let on = account_by_guard(&store, "G-1").await;
    assert_eq!(on["status"], json!("On Duty"));
    assert_eq!(on["schedule_type"], json!("daily"));
    assert!(on["last_status_update"].is_string());

    // No schedule — written back Off Duty, not skipped.
    let off = account_by_guard(&store, "G-2").await;
    assert_eq!(off["status"], json!("Off Duty"));
    assert_eq!(off["schedule_type"], json!(null));
    assert!(off["last_status_update"].is_string());
}

#[tokio::test]
async fn reconciler_self_heals_stale_on_duty_state() {
    let store = store();
    seed(
        &store,
        collections::ACCOUNTS,
        "a1",
        json!({"role": "Security", "guard_id": "G-1", "status": "On Duty", "schedule_type": "daily"}),
    )
    .await;

    DutyStatusReconciler::new(store.clone())
        .reconcile(moment("2025-03-14", 12, 0))
        .await
        .unwrap();

    let account = account_by_guard(&store, "G-1").await;
    assert_eq!(account["status"], json!("Off Duty"));
    assert_eq!(account["schedule_type"], json!(null));
}

#[tokio::test]
async fn reconciler_is_idempotent() {
    let store = store();
    seed_guard(&store, "a1", "G-1").await;
    seed(
        &store,
        collections::SCHEDULES,
        "s1",
        json!({"guard_id": "G-1", "date": "2025-03-14", "start_time": "09:00", "end_time": "17:00", "schedule_type": "weekly"}),
    )
    .await;

    let reconciler = DutyStatusReconciler::new(store.clone());
    let at = moment("2025-03-14", 10, 0);
    reconciler.reconcile(at).await.unwrap();
    let first = account_by_guard(&store, "G-1").await;

    reconciler.reconcile(at).await.unwrap();
    let second = account_by_guard(&store, "G-1").await;

    assert_eq!(first["status"], second["status"]);
    assert_eq!(first["schedule_type"], second["schedule_type"]);
    assert_eq!(second["schedule_type"], json!("weekly"));
}

#[tokio::test]
async fn reconciler_honors_overnight_windows_dated_today() {
    let store = store();
    seed_guard(&store, "a1", "G-1").await;
    seed(
        &store,
        collections::SCHEDULES,
        "s1",
        json!({"guard_id": "G-1", "date": "2025-03-14", "start_time": "22:00", "end_time": "06:00"}),
    )
    .await;

    let reconciler = DutyStatusReconciler::new(store.clone());
    reconciler
        .reconcile(moment("2025-03-14", 23, 0))
        .await
        .unwrap();
    assert_eq!(account_by_guard(&store, "G-1").await["status"], json!("On Duty"));

    reconciler
        .reconcile(moment("2025-03-14", 11, 40))
        .await
        .unwrap();
    assert_eq!(account_by_guard(&store, "G-1").await["status"], json!("Off Duty"));
}

#[tokio::test]
async fn reconciler_skips_malformed_windows_without_failing() {
    let store = store();
    seed_guard(&store, "a1", "G-1").await;
    seed(
        &store,
        collections::SCHEDULES,
        "bad",
        json!({"guard_id": "G-1", "date": "2025-03-14", "start_time": "morning", "end_time": "17:00"}),
    )
    .await;

    DutyStatusReconciler::new(store.clone())
        .reconcile(moment("2025-03-14", 12, 0))
        .await
        .unwrap();
    assert_eq!(account_by_guard(&store, "G-1").await["status"], json!("Off Duty"));
}

// --- archiving -----------------------------------------------------------

#[tokio::test]
async fn archiver_round_trips_ended_schedule_and_resets_checkpoints() {
    let store = store();
    seed(
        &store,
        collections::CHECKPOINTS,
        "cp-1",
        json!({
            "status": "Scanned",
            "lastScannedAt": "2025-03-14T16:00:00+08:00",
            "remarks": "all clear",
            "lastScannedById": "G-1",
            "lastScannedByName": "Ana",
            "lastScannedBy": "G-1",
        }),
    )
    .await;
    seed(
        &store,
        collections::SCHEDULES,
        "s1",
        json!({
            "guard_id": "G-1",
            "date": "2025-03-14",
            "start_time": "09:00",
            "end_time": "17:00",
            "duty": true,
            "checkpoints": ["cp-1"],
        }),
    )
    .await;

    ScheduleArchiver::new(store.clone())
        .archive(moment("2025-03-14", 17, 30))
        .await
        .unwrap();

    // Gone from the active collection…
    assert!(store
        .find_first(collections::SCHEDULES, &[("guard_id", json!("G-1"))])
        .await
        .unwrap()
        .is_none());

    // …and fully present in the archive.
    let archived = store
        .find_first(collections::ENDED_SCHEDULES, &[("guard_id", json!("G-1"))])
        .await
        .unwrap()
        .expect("archived copy");
    assert_eq!(archived.id, "s1");
    assert_eq!(archived.data["date"], json!("2025-03-14"));
    assert_eq!(archived.data["start_time"], json!("09:00"));
    assert_eq!(archived.data["end_time"], json!("17:00"));
    assert_eq!(archived.data["checkpoints"], json!(["cp-1"]));
    assert_eq!(archived.data["source_collection"], json!("Schedules"));
    assert_eq!(archived.data["schedule_type"], json!("daily"));
    assert!(archived.data["ended_at"].is_string());

    // Checkpoint back to baseline.
    let cp = store
        .find_first(collections::CHECKPOINTS, &[("status", json!("Not Yet Scanned"))])
        .await
        .unwrap()
        .expect("reset checkpoint");
    assert_eq!(cp.id, "cp-1");
    assert!(cp.data["lastScannedAt"].is_null());
    assert!(cp.data["remarks"].is_null());
    assert!(cp.data["lastScannedById"].is_null());
    assert!(cp.data["lastScannedByName"].is_null());
    assert!(cp.data["lastScannedBy"].is_null());
}

#[tokio::test]
async fn archiver_matches_only_the_two_ended_shapes() {
    let store = store();
    // Still running today — stays.
    seed(
        &store,
        collections::SCHEDULES,
        "active",
        json!({"guard_id": "G-1", "date": "2025-03-14", "start_time": "09:00", "end_time": "17:00"}),
    )
    .await;
    // Today's overnight shift, not yet at its end — stays.
    seed(
        &store,
        collections::SCHEDULES,
        "tonight",
        json!({"guard_id": "G-2", "date": "2025-03-14", "start_time": "22:00", "end_time": "06:00"}),
    )
    .await;
    // Yesterday's overnight shift whose end has passed — goes.
    seed(
        &store,
        collections::SCHEDULES,
        "last-night",
        json!({"guard_id": "G-3", "date": "2025-03-13", "start_time": "22:00", "end_time": "06:00", "schedule_type": "weekly"}),
    )
    .await;

    ScheduleArchiver::new(store.clone())
        .archive(moment("2025-03-14", 12, 0))
        .await
        .unwrap();

    let remaining = store.list(collections::SCHEDULES).await.unwrap();
    let mut ids: Vec<&str> = remaining.iter().map(|d| d.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["active", "tonight"]);

    let archived = store.list(collections::ENDED_SCHEDULES).await.unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].id, "last-night");
    // Provenance keeps the original recurring type.
    assert_eq!(archived[0].data["schedule_type"], json!("weekly"));
}

#[tokio::test]
async fn archiver_is_a_noop_on_empty_collections() {
    let store = store();
    ScheduleArchiver::new(store.clone())
        .archive(moment("2025-03-14", 12, 0))
        .await
        .unwrap();
    assert!(store.list(collections::ENDED_SCHEDULES).await.unwrap().is_empty());
}

#[tokio::test]
async fn archiver_skips_invalid_checkpoint_ids() {
    let store = store();
    seed(
        &store,
        collections::CHECKPOINTS,
        "cp-ok",
        json!({"status": "Scanned"}),
    )
    .await;
    seed(
        &store,
        collections::SCHEDULES,
        "s1",
        json!({
            "guard_id": "G-1",
            "date": "2025-03-14",
            "start_time": "09:00",
            "end_time": "10:00",
            "checkpoints": ["cp-ok", "", 42],
        }),
    )
    .await;

    ScheduleArchiver::new(store.clone())
        .archive(moment("2025-03-14", 10, 5))
        .await
        .unwrap();

    let cp = store
        .find_first(collections::CHECKPOINTS, &[("status", json!("Not Yet Scanned"))])
        .await
        .unwrap()
        .expect("valid id still reset");
    assert_eq!(cp.id, "cp-ok");
}

// --- recurring materialization -------------------------------------------

#[tokio::test]
async fn weekly_template_materializes_exactly_once() {
    let store = store();
    seed(
        &store,
        collections::WEEKLY_SCHEDULES,
        "w1",
        json!({
            "is_active": true,
            "guard_ids": ["G-1", "G-2"],
            "start_time": "08:00",
            "end_time": "16:00",
            "checkpoints": ["cp-1"],
            "week_start_date": "2025-03-10",
        }),
    )
    .await;

    let materializer = RecurringMaterializer::new(store.clone());
    let today = moment("2025-03-14", 0, 0);
    materializer.materialize_today(today).await.unwrap();

    let created = store
        .query(
            collections::SCHEDULES,
            &[("parent_weekly_schedule_id", json!("w1"))],
        )
        .await
        .unwrap();
    assert_eq!(created.len(), 2);
    for doc in &created {
        assert_eq!(doc.data["date"], json!("2025-03-14"));
        assert_eq!(doc.data["start_time"], json!("08:00"));
        assert_eq!(doc.data["end_time"], json!("16:00"));
        assert_eq!(doc.data["duty"], json!(true));
        assert_eq!(doc.data["schedule_type"], json!("weekly"));
        assert_eq!(doc.data["checkpoints"], json!(["cp-1"]));
        assert!(doc.data["created_at"].is_string());
    }

    // Second run same day: the duplication guard holds.
    materializer.materialize_today(today).await.unwrap();
    let after = store
        .query(
            collections::SCHEDULES,
            &[("parent_weekly_schedule_id", json!("w1"))],
        )
        .await
        .unwrap();
    assert_eq!(after.len(), 2);
}

#[tokio::test]
async fn weekly_template_outside_range_or_inactive_is_skipped() {
    let store = store();
    seed(
        &store,
        collections::WEEKLY_SCHEDULES,
        "past",
        json!({
            "is_active": true,
            "guard_ids": ["G-1"],
            "start_time": "08:00",
            "end_time": "16:00",
            "week_start_date": "2025-02-01",
        }),
    )
    .await;
    seed(
        &store,
        collections::WEEKLY_SCHEDULES,
        "inactive",
        json!({
            "is_active": false,
            "guard_ids": ["G-1"],
            "start_time": "08:00",
            "end_time": "16:00",
            "week_start_date": "2025-03-10",
        }),
    )
    .await;

    RecurringMaterializer::new(store.clone())
        .materialize_today(moment("2025-03-14", 0, 0))
        .await
        .unwrap();
    assert!(store.list(collections::SCHEDULES).await.unwrap().is_empty());
}

#[tokio::test]
async fn monthly_template_materializes_for_matching_month() {
    let store = store();
    seed(
        &store,
        collections::MONTHLY_SCHEDULES,
        "m1",
        json!({
            "is_active": true,
            "guard_ids": ["G-9"],
            "start_time": "20:00",
            "end_time": "04:00",
            "month_year": "2025-03",
        }),
    )
    .await;
    seed(
        &store,
        collections::MONTHLY_SCHEDULES,
        "m2",
        json!({
            "is_active": true,
            "guard_ids": ["G-9"],
            "start_time": "20:00",
            "end_time": "04:00",
            "month_year": "2025-04",
        }),
    )
    .await;

    let materializer = RecurringMaterializer::new(store.clone());
    let today = moment("2025-03-14", 0, 0);
    materializer.materialize_today(today).await.unwrap();
    materializer.materialize_today(today).await.unwrap();

    let created = store.list(collections::SCHEDULES).await.unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].data["parent_monthly_schedule_id"], json!("m1"));
    assert_eq!(created[0].data["schedule_type"], json!("monthly"));
}

// --- daily checkpoint reset ----------------------------------------------

#[tokio::test]
async fn resetter_baselines_every_checkpoint() {
    let store = store();
    for i in 0..3 {
        seed(
            &store,
            collections::CHECKPOINTS,
            &format!("cp-{i}"),
            json!({"status": "Scanned", "remarks": "seen", "lastScannedBy": "G-1"}),
        )
        .await;
    }

    CheckpointResetter::new(store.clone()).reset_all().await.unwrap();

    let all = store.list(collections::CHECKPOINTS).await.unwrap();
    assert_eq!(all.len(), 3);
    for cp in all {
        assert_eq!(cp.data["status"], json!("Not Yet Scanned"));
        assert!(cp.data["remarks"].is_null());
        assert!(cp.data["lastScannedBy"].is_null());
    }
}

#[tokio::test]
async fn resetter_is_a_noop_on_empty_collection() {
    let store = store();
    CheckpointResetter::new(store.clone()).reset_all().await.unwrap();
    assert!(store.list(collections::CHECKPOINTS).await.unwrap().is_empty());
}

// --- full-day scenario ----------------------------------------------------

#[tokio::test]
async fn guard_day_runs_on_duty_then_archive_then_off_duty() {
    let store = store();
    seed_guard(&store, "a1", "G-1").await;
    seed(
        &store,
        collections::CHECKPOINTS,
        "cp-1",
        json!({"status": "Scanned", "lastScannedBy": "G-1"}),
    )
    .await;
    seed(
        &store,
        collections::SCHEDULES,
        "s1",
        json!({
            "guard_id": "G-1",
            "date": "2025-03-14",
            "start_time": "09:00",
            "end_time": "17:00",
            "checkpoints": ["cp-1"],
        }),
    )
    .await;

    let reconciler = DutyStatusReconciler::new(store.clone());
    let archiver = ScheduleArchiver::new(store.clone());

    // 15:00 — window covers now.
    reconciler.reconcile(moment("2025-03-14", 15, 0)).await.unwrap();
    let account = account_by_guard(&store, "G-1").await;
    assert_eq!(account["status"], json!("On Duty"));
    assert_eq!(account["schedule_type"], json!("daily"));

    // 17:30 — the shift has ended; archive and reset its checkpoint.
    archiver.archive(moment("2025-03-14", 17, 30)).await.unwrap();
    assert!(store.list(collections::SCHEDULES).await.unwrap().is_empty());
    assert_eq!(store.list(collections::ENDED_SCHEDULES).await.unwrap().len(), 1);

    // 17:35 — no active schedule remains; the guard drops back Off Duty.
    reconciler.reconcile(moment("2025-03-14", 17, 35)).await.unwrap();
    let account = account_by_guard(&store, "G-1").await;
    assert_eq!(account["status"], json!("Off Duty"));
    assert_eq!(account["schedule_type"], json!(null));
}
