//! Integration tests for `UserRepo`.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use eventhub_core::listing::{FieldKind, FieldSpec, ListQuery};
use eventhub_db::models::event::{CreateEvent, Location};
use eventhub_db::models::user::{CreateUser, UpdateUser, User};
use eventhub_db::repositories::{EventRepo, UserRepo};
use sqlx::PgPool;

fn new_user(name: &str) -> CreateUser {
    CreateUser {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        password_hash: "$argon2id$test".to_string(),
        role: "user".to_string(),
        photo: None,
    }
}

async fn create_event(pool: &PgPool, creator: &User, max: i32) -> i64 {
    EventRepo::create(
        pool,
        &CreateEvent {
            title: "Meetup".to_string(),
            description: None,
            date: Utc::now() + Duration::days(7),
            max_participants: max,
            location: Location {
                address: "1 Main St".to_string(),
                city: None,
                country: None,
            },
            photo: None,
            price: None,
            created_by: creator.id,
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_applies_defaults(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("Alice")).await.unwrap();
    assert_eq!(user.photo, "default.jpg");
    assert_eq!(user.role, "user");
    assert!(user.active);
    assert!(user.password_changed_at.is_none());

    let found = UserRepo::find_by_email(&pool, "alice@example.com")
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_email_is_unique_violation(pool: PgPool) {
    UserRepo::create(&pool, &new_user("Bob")).await.unwrap();
    let err = UserRepo::create(&pool, &new_user("Bob")).await.unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.code().as_deref(), Some("23505"));
    assert_eq!(db_err.constraint(), Some("uq_users_email"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_role_is_check_violation(pool: PgPool) {
    let mut input = new_user("Carol");
    input.role = "root".to_string();
    let err = UserRepo::create(&pool, &input).await.unwrap_err();
    assert_eq!(
        err.as_database_error().and_then(|e| e.code()).as_deref(),
        Some("23514")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn partial_update_keeps_other_fields(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("Dave")).await.unwrap();
    let updated = UserRepo::update(
        &pool,
        user.id,
        &UpdateUser {
            name: Some("David".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(updated.name, "David");
    assert_eq!(updated.email, user.email);
    assert!(updated.updated_at >= user.updated_at);

    let missing = UserRepo::update(&pool, 999_999, &UpdateUser::default())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn password_update_stamps_change_time(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("Erin")).await.unwrap();
    let issued_before = Utc::now().timestamp() - 60;

    let updated = UserRepo::update_password(&pool, user.id, "$argon2id$new")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.password_hash, "$argon2id$new");
    assert!(updated.changed_password_after(issued_before));
    assert!(!updated.changed_password_after(Utc::now().timestamp() + 1));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reset_token_is_single_use(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("Frank")).await.unwrap();
    UserRepo::set_reset_token(&pool, user.id, "hash-1", Utc::now() + Duration::minutes(10))
        .await
        .unwrap();

    let consumed = UserRepo::consume_reset_token(&pool, "hash-1", "$argon2id$reset")
        .await
        .unwrap();
    assert_matches!(consumed, Some(u) if u.id == user.id && u.password_reset_token.is_none());

    let again = UserRepo::consume_reset_token(&pool, "hash-1", "$argon2id$other")
        .await
        .unwrap();
    assert!(again.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_reset_token_is_rejected(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("Grace")).await.unwrap();
    UserRepo::set_reset_token(&pool, user.id, "hash-2", Utc::now() - Duration::minutes(1))
        .await
        .unwrap();

    let consumed = UserRepo::consume_reset_token(&pool, "hash-2", "$argon2id$reset")
        .await
        .unwrap();
    assert!(consumed.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deactivate_keeps_row(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("Heidi")).await.unwrap();
    assert!(UserRepo::deactivate(&pool, user.id).await.unwrap());
    assert!(!UserRepo::deactivate(&pool, 999_999).await.unwrap());

    let found = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert!(!found.active);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn hard_delete_releases_attendee_slots(pool: PgPool) {
    let admin = UserRepo::create(&pool, &new_user("Admin")).await.unwrap();
    let user = UserRepo::create(&pool, &new_user("Ivan")).await.unwrap();
    let event_id = create_event(&pool, &admin, 2).await;

    EventRepo::attend(&pool, event_id, user.id)
        .await
        .unwrap()
        .unwrap();

    let deleted = UserRepo::delete(&pool, user.id).await.unwrap();
    assert_matches!(deleted, Some(u) if u.id == user.id);

    let event = EventRepo::find_by_id(&pool, event_id).await.unwrap().unwrap();
    assert_eq!(event.attendee_count, 0);
    assert!(event.attendees.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_racing_rsvp_keeps_counts_consistent(pool: PgPool) {
    let admin = UserRepo::create(&pool, &new_user("Admin")).await.unwrap();
    let user = UserRepo::create(&pool, &new_user("Mona")).await.unwrap();
    let joined = create_event(&pool, &admin, 3).await;
    let open = create_event(&pool, &admin, 3).await;
    EventRepo::attend(&pool, joined, user.id).await.unwrap().unwrap();

    let (deleted, unattended, attended) = tokio::join!(
        UserRepo::delete(&pool, user.id),
        EventRepo::unattend(&pool, joined, user.id),
        EventRepo::attend(&pool, open, user.id),
    );
    assert_matches!(deleted, Ok(Some(_)));
    // Either side may win; neither may corrupt the count.
    let _ = (unattended, attended);

    for event_id in [joined, open] {
        let event = EventRepo::find_by_id(&pool, event_id).await.unwrap().unwrap();
        assert_eq!(event.attendee_count, 0, "event {event_id}");
        assert!(event.attendees.is_empty());
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refused_delete_keeps_attendance(pool: PgPool) {
    let admin = UserRepo::create(&pool, &new_user("Nina")).await.unwrap();
    let event_id = create_event(&pool, &admin, 2).await;
    EventRepo::attend(&pool, event_id, admin.id).await.unwrap().unwrap();

    assert!(UserRepo::delete(&pool, admin.id).await.is_err());

    let event = EventRepo::find_by_id(&pool, event_id).await.unwrap().unwrap();
    assert_eq!(event.attendee_count, 1);
    assert_eq!(event.attendees, vec![admin.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_missing_user_is_none(pool: PgPool) {
    assert!(UserRepo::delete(&pool, 999_999).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_event_creator_is_restricted(pool: PgPool) {
    let admin = UserRepo::create(&pool, &new_user("Judy")).await.unwrap();
    create_event(&pool, &admin, 1).await;

    let err = UserRepo::delete(&pool, admin.id).await.unwrap_err();
    assert_eq!(
        err.as_database_error().and_then(|e| e.code()).as_deref(),
        Some("23503")
    );
    assert!(UserRepo::find_by_id(&pool, admin.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_on_active_flag(pool: PgPool) {
    const SPECS: &[FieldSpec] = &[
        FieldSpec::new("id", FieldKind::Integer),
        FieldSpec::new("active", FieldKind::Boolean),
        FieldSpec::new("created_at", FieldKind::Timestamp),
    ];

    let a = UserRepo::create(&pool, &new_user("Kim")).await.unwrap();
    let b = UserRepo::create(&pool, &new_user("Lee")).await.unwrap();
    UserRepo::deactivate(&pool, b.id).await.unwrap();

    let query = ListQuery::from_pairs([("active".to_string(), "true".to_string())])
        .unwrap()
        .resolve(SPECS)
        .unwrap();
    let users = UserRepo::list(&pool, &query).await.unwrap();
    let ids: Vec<_> = users.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![a.id]);
}
