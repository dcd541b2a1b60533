use sqlx::PgPool;

/// Connect, migrate, verify schema.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    eventhub_db::health_check(&pool).await.unwrap();

    for table in ["users", "events", "event_attendees", "bookings"] {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// Every table with an `updated_at` column has the trigger attached.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_updated_at_triggers(pool: PgPool) {
    let triggers: Vec<(String,)> = sqlx::query_as(
        "SELECT event_object_table::text FROM information_schema.triggers
         WHERE trigger_name LIKE 'trg_%_updated_at'
         ORDER BY event_object_table",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    let tables: Vec<_> = triggers.into_iter().map(|(t,)| t).collect();
    assert!(tables.contains(&"users".to_string()));
    assert!(tables.contains(&"events".to_string()));
}
