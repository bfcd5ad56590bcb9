//! Integration tests for the compliance repositories.
//!
//! Exercises alert deduplication, compare-and-set transitions, cleaning log
//! persistence inside a locked transaction, and recipient resolution against
//! a real database.

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use cleantrack_core::alert::OpenOutcome;
use cleantrack_core::cleaning::ValidationStatus;
use cleantrack_core::roles::Role;
use cleantrack_core::types::{DbId, Timestamp};
use cleantrack_db::models::alert::{AlertFilter, CreateAlert};
use cleantrack_db::models::cleaning_log::NewCleaningLog;
use cleantrack_db::models::equipment::{CreateEquipment, Equipment};
use cleantrack_db::models::facility::CreateFacility;
use cleantrack_db::models::token_issuance::CreateTokenIssuance;
use cleantrack_db::models::user::CreateUser;
use cleantrack_db::repositories::{
    AlertRepo, CleaningLogRepo, EquipmentRepo, FacilityRepo, TokenIssuanceRepo, UserRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
}

async fn seed_facility(pool: &PgPool, name: &str) -> DbId {
    FacilityRepo::create(
        pool,
        &CreateFacility {
            name: name.to_string(),
            address: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_equipment(pool: &PgPool, facility_id: DbId, serial: &str) -> Equipment {
    EquipmentRepo::create(
        pool,
        &CreateEquipment {
            facility_id,
            name: format!("Monitor {serial}"),
            serial_number: serial.to_string(),
            category: Some("monitoring".to_string()),
            location: Some("ICU".to_string()),
            description: None,
            cleaning_frequency_hours: Some(24),
        },
    )
    .await
    .unwrap()
}

async fn seed_user(pool: &PgPool, email: &str, role: Role) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            full_name: email.to_string(),
            role,
        },
    )
    .await
    .unwrap()
    .id
}

fn overdue_alert(equipment_id: DbId) -> CreateAlert {
    CreateAlert {
        equipment_id,
        alert_type: "overdue".to_string(),
        severity: "high".to_string(),
        title: "Overdue Cleaning".to_string(),
        message: "Overdue".to_string(),
        suggested_action: None,
        due_by: None,
        related_cleaning_log_id: None,
    }
}

fn cleaning_at(equipment_id: DbId, completed_at: Timestamp) -> NewCleaningLog {
    NewCleaningLog {
        equipment_id,
        performed_by: None,
        started_at: completed_at - Duration::minutes(15),
        completed_at,
        duration_minutes: 15,
        source: "manual".to_string(),
        notes: None,
        evidence_url: None,
        chemicals_used: serde_json::json!(["quaternary ammonium"]),
        steps_completed: serde_json::json!([]),
        contact_time_met: true,
        all_steps_completed: true,
        issues_found: None,
        is_compliant: true,
        validation_status: "pending".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_open_twice_returns_existing_alert(pool: PgPool) {
    let facility = seed_facility(&pool, "North").await;
    let eq = seed_equipment(&pool, facility, "SN-1").await;

    let first = AlertRepo::open_if_absent(&pool, &overdue_alert(eq.id)).await.unwrap();
    let second = AlertRepo::open_if_absent(&pool, &overdue_alert(eq.id)).await.unwrap();

    assert!(first.is_created());
    assert_matches!(&second, OpenOutcome::AlreadyOpen(a) if a.id == first.alert().id);

    let all = AlertRepo::list(&pool, &AlertFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_opens_create_one_row(pool: PgPool) {
    let facility = seed_facility(&pool, "North").await;
    let eq = seed_equipment(&pool, facility, "SN-1").await;
    let input = overdue_alert(eq.id);

    let (a, b, c) = tokio::join!(
        AlertRepo::open_if_absent(&pool, &input),
        AlertRepo::open_if_absent(&pool, &input),
        AlertRepo::open_if_absent(&pool, &input),
    );
    let outcomes = [a.unwrap(), b.unwrap(), c.unwrap()];

    assert_eq!(outcomes.iter().filter(|o| o.is_created()).count(), 1);
    let ids: Vec<DbId> = outcomes.iter().map(|o| o.alert().id).collect();
    assert!(ids.iter().all(|id| *id == ids[0]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_different_types_open_independently(pool: PgPool) {
    let facility = seed_facility(&pool, "North").await;
    let eq = seed_equipment(&pool, facility, "SN-1").await;

    let mut due_soon = overdue_alert(eq.id);
    due_soon.alert_type = "due_soon".to_string();

    assert!(AlertRepo::open_if_absent(&pool, &overdue_alert(eq.id)).await.unwrap().is_created());
    assert!(AlertRepo::open_if_absent(&pool, &due_soon).await.unwrap().is_created());
    assert_eq!(AlertRepo::list_open_for_equipment(&pool, eq.id).await.unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_resolved_alert_allows_new_open(pool: PgPool) {
    let facility = seed_facility(&pool, "North").await;
    let eq = seed_equipment(&pool, facility, "SN-1").await;

    let first = AlertRepo::open_if_absent(&pool, &overdue_alert(eq.id))
        .await
        .unwrap()
        .into_alert();
    let resolved = AlertRepo::resolve(&pool, first.id, None, Some("cleaned"), t0())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.status, "resolved");
    assert_eq!(resolved.resolution_notes.as_deref(), Some("cleaned"));

    let again = AlertRepo::open_if_absent(&pool, &overdue_alert(eq.id)).await.unwrap();
    assert!(again.is_created());
    assert_ne!(again.alert().id, first.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_acknowledge_is_compare_and_set(pool: PgPool) {
    let facility = seed_facility(&pool, "North").await;
    let eq = seed_equipment(&pool, facility, "SN-1").await;
    let manager = seed_user(&pool, "m@example.com", Role::Manager).await;
    let alert = AlertRepo::open_if_absent(&pool, &overdue_alert(eq.id))
        .await
        .unwrap()
        .into_alert();

    let acked = AlertRepo::acknowledge(&pool, alert.id, manager, t0()).await.unwrap();
    assert_matches!(acked, Some(a) if a.status == "acknowledged" && a.acknowledged_by == Some(manager));

    assert!(AlertRepo::acknowledge(&pool, alert.id, manager, t0()).await.unwrap().is_none());
    assert!(AlertRepo::dismiss(&pool, alert.id, manager, t0()).await.unwrap().is_none());

    // Acknowledged alerts can still be resolved.
    assert!(AlertRepo::resolve(&pool, alert.id, Some(manager), None, t0())
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_closed_alerts_reject_every_action(pool: PgPool) {
    let facility = seed_facility(&pool, "North").await;
    let eq = seed_equipment(&pool, facility, "SN-1").await;
    let manager = seed_user(&pool, "m@example.com", Role::Manager).await;

    let dismissed = AlertRepo::open_if_absent(&pool, &overdue_alert(eq.id))
        .await
        .unwrap()
        .into_alert();
    let closed = AlertRepo::dismiss(&pool, dismissed.id, manager, t0()).await.unwrap();
    assert_matches!(closed, Some(a) if a.status == "dismissed");

    let resolved = AlertRepo::open_if_absent(&pool, &overdue_alert(eq.id))
        .await
        .unwrap()
        .into_alert();
    assert!(AlertRepo::resolve(&pool, resolved.id, None, Some("cleaned"), t0())
        .await
        .unwrap()
        .is_some());

    for id in [dismissed.id, resolved.id] {
        assert!(AlertRepo::acknowledge(&pool, id, manager, t0()).await.unwrap().is_none());
        assert!(AlertRepo::resolve(&pool, id, Some(manager), None, t0()).await.unwrap().is_none());
        assert!(AlertRepo::dismiss(&pool, id, manager, t0()).await.unwrap().is_none());
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_by_status(pool: PgPool) {
    let facility = seed_facility(&pool, "North").await;
    let a = seed_equipment(&pool, facility, "SN-1").await;
    let b = seed_equipment(&pool, facility, "SN-2").await;
    let admin = seed_user(&pool, "a@example.com", Role::Admin).await;

    let first = AlertRepo::open_if_absent(&pool, &overdue_alert(a.id)).await.unwrap().into_alert();
    AlertRepo::open_if_absent(&pool, &overdue_alert(b.id)).await.unwrap();
    AlertRepo::dismiss(&pool, first.id, admin, t0()).await.unwrap();

    let active = AlertRepo::list(
        &pool,
        &AlertFilter {
            status: Some("active".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].equipment_id, b.id);

    let for_a = AlertRepo::list(
        &pool,
        &AlertFilter {
            equipment_id: Some(a.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(for_a.len(), 1);
    assert_eq!(for_a[0].status, "dismissed");
}

// ---------------------------------------------------------------------------
// Cleaning logs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cleaning_insert_updates_equipment_in_transaction(pool: PgPool) {
    let facility = seed_facility(&pool, "North").await;
    let eq = seed_equipment(&pool, facility, "SN-1").await;

    let mut tx = pool.begin().await.unwrap();
    let locked = EquipmentRepo::find_for_update(&mut tx, eq.id).await.unwrap().unwrap();
    assert_eq!(locked.last_cleaned_at, None);
    assert_eq!(
        CleaningLogRepo::latest_completed_at(&mut tx, eq.id).await.unwrap(),
        None
    );

    let log = CleaningLogRepo::insert(&mut tx, &cleaning_at(eq.id, t0())).await.unwrap();
    EquipmentRepo::set_last_cleaned(&mut tx, eq.id, Some(t0())).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(log.validation_status, "pending");
    assert_eq!(log.chemicals_used, serde_json::json!(["quaternary ammonium"]));

    let reloaded = EquipmentRepo::find_by_id(&pool, eq.id).await.unwrap().unwrap();
    assert_eq!(reloaded.last_cleaned_at, Some(t0()));

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(
        CleaningLogRepo::latest_completed_at(&mut conn, eq.id).await.unwrap(),
        Some(t0())
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rolled_back_cleaning_leaves_no_trace(pool: PgPool) {
    let facility = seed_facility(&pool, "North").await;
    let eq = seed_equipment(&pool, facility, "SN-1").await;

    let mut tx = pool.begin().await.unwrap();
    CleaningLogRepo::insert(&mut tx, &cleaning_at(eq.id, t0())).await.unwrap();
    EquipmentRepo::set_last_cleaned(&mut tx, eq.id, Some(t0())).await.unwrap();
    tx.rollback().await.unwrap();

    assert!(CleaningLogRepo::list_for_equipment(&pool, eq.id, None).await.unwrap().is_empty());
    let reloaded = EquipmentRepo::find_by_id(&pool, eq.id).await.unwrap().unwrap();
    assert_eq!(reloaded.last_cleaned_at, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_completed_before_started_violates_check(pool: PgPool) {
    let facility = seed_facility(&pool, "North").await;
    let eq = seed_equipment(&pool, facility, "SN-1").await;

    let mut bad = cleaning_at(eq.id, t0());
    bad.started_at = t0() + Duration::minutes(1);

    let mut conn = pool.acquire().await.unwrap();
    let err = CleaningLogRepo::insert(&mut conn, &bad).await.unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23514"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_validation_update_is_compare_and_set(pool: PgPool) {
    let facility = seed_facility(&pool, "North").await;
    let eq = seed_equipment(&pool, facility, "SN-1").await;
    let reviewer = seed_user(&pool, "r@example.com", Role::Manager).await;

    let mut conn = pool.acquire().await.unwrap();
    let log = CleaningLogRepo::insert(&mut conn, &cleaning_at(eq.id, t0())).await.unwrap();

    let rejected = CleaningLogRepo::set_validation(
        &mut conn,
        log.id,
        ValidationStatus::Pending,
        ValidationStatus::Rejected,
        reviewer,
        t0(),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(rejected.validation_status, "rejected");
    assert_eq!(rejected.validated_by, Some(reviewer));

    let stale = CleaningLogRepo::set_validation(
        &mut conn,
        log.id,
        ValidationStatus::Pending,
        ValidationStatus::Approved,
        reviewer,
        t0(),
    )
    .await
    .unwrap();
    assert!(stale.is_none());

    assert_eq!(
        CleaningLogRepo::latest_accepted_completed_at(&mut conn, eq.id).await.unwrap(),
        None
    );
    assert_eq!(
        CleaningLogRepo::latest_completed_at(&mut conn, eq.id).await.unwrap(),
        Some(t0())
    );
}

// ---------------------------------------------------------------------------
// Equipment and tokens
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_serial_number_is_unique_violation(pool: PgPool) {
    let facility = seed_facility(&pool, "North").await;
    seed_equipment(&pool, facility, "SN-1").await;

    let err = EquipmentRepo::create(
        &pool,
        &CreateEquipment {
            facility_id: facility,
            name: "Copy".to_string(),
            serial_number: "SN-1".to_string(),
            category: None,
            location: None,
            description: None,
            cleaning_frequency_hours: None,
        },
    )
    .await
    .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.constraint() == Some("uq_equipment_serial_number"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_public_token_is_unique_across_equipment(pool: PgPool) {
    let facility = seed_facility(&pool, "North").await;
    let a = seed_equipment(&pool, facility, "SN-1").await;
    let b = seed_equipment(&pool, facility, "SN-2").await;

    let updated = EquipmentRepo::set_public_token(&pool, a.id, "1:2:abc", t0())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.public_token.as_deref(), Some("1:2:abc"));
    assert_eq!(updated.token_created_at, Some(t0()));

    let err = EquipmentRepo::set_public_token(&pool, b.id, "1:2:abc", t0())
        .await
        .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.constraint() == Some("uq_equipment_public_token"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_token_issuance_tracks_access_and_use(pool: PgPool) {
    let facility = seed_facility(&pool, "North").await;
    let eq = seed_equipment(&pool, facility, "SN-1").await;

    TokenIssuanceRepo::create(
        &pool,
        &CreateTokenIssuance {
            equipment_id: eq.id,
            token: "tok".to_string(),
            issued_by: None,
            policy: "temporary".to_string(),
            ttl_minutes: 5,
            expires_at: t0() + Duration::minutes(5),
            issued_from_ip: Some("10.0.0.7".to_string()),
        },
    )
    .await
    .unwrap();

    TokenIssuanceRepo::record_access(&pool, "tok").await.unwrap();
    TokenIssuanceRepo::record_access(&pool, "tok").await.unwrap();
    let mut conn = pool.acquire().await.unwrap();
    TokenIssuanceRepo::mark_used(&mut conn, "tok", t0()).await.unwrap();
    TokenIssuanceRepo::mark_used(&mut conn, "tok", t0() + Duration::minutes(1)).await.unwrap();

    let history = TokenIssuanceRepo::list_for_equipment(&pool, eq.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].times_accessed, 2);
    assert!(history[0].was_used);
    assert_eq!(history[0].used_at, Some(t0()));
}

// ---------------------------------------------------------------------------
// Recipients
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_recipients_are_admins_and_facility_managers(pool: PgPool) {
    let north = seed_facility(&pool, "North").await;
    let south = seed_facility(&pool, "South").await;

    let admin = seed_user(&pool, "admin@example.com", Role::Admin).await;
    let north_mgr = seed_user(&pool, "north@example.com", Role::Manager).await;
    let south_mgr = seed_user(&pool, "south@example.com", Role::Manager).await;
    let tech = seed_user(&pool, "tech@example.com", Role::Technician).await;
    let retired = seed_user(&pool, "old@example.com", Role::Admin).await;

    FacilityRepo::add_manager(&pool, north, north_mgr).await.unwrap();
    FacilityRepo::add_manager(&pool, north, north_mgr).await.unwrap();
    FacilityRepo::add_manager(&pool, north, tech).await.unwrap();
    FacilityRepo::add_manager(&pool, south, south_mgr).await.unwrap();
    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(retired)
        .execute(&pool)
        .await
        .unwrap();

    let ids: Vec<DbId> = UserRepo::alert_recipients(&pool, north)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![admin, north_mgr]);
}
