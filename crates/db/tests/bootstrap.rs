use sqlx::PgPool;

/// Connect, migrate, and verify every table exists and starts empty.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    cleantrack_db::health_check(&pool).await.unwrap();

    let tables = [
        "facilities",
        "users",
        "facility_managers",
        "equipment",
        "token_issuances",
        "cleaning_logs",
        "compliance_alerts",
    ];

    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// The open-alert partial index must exist; deduplication depends on it.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_open_alert_index_present(pool: PgPool) {
    let row: (String,) = sqlx::query_as(
        "SELECT indexdef FROM pg_indexes
         WHERE tablename = 'compliance_alerts' AND indexname = 'uq_compliance_alerts_open_per_type'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(row.0.contains("UNIQUE"));
    assert!(row.0.contains("WHERE"));
}
