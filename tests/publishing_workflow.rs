//! Integration tests for the scheduled-publishing workflow: the publication
//! service, the cascading publish transaction, and the scheduler tick. Each
//! test runs against an isolated, freshly migrated database.

use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use catalog_core::models::{
    ContentType, Lesson, NewLesson, NewProgram, NewTerm, Program, Term,
};
use catalog_core::publishing::{
    LessonPublicationService, ProgramPublicationService, PublicationError,
    PublishingScheduler, PublishingSchedulerConfig,
};
use catalog_core::state_machine::PublishStatus;

async fn create_program(pool: &PgPool, title: &str) -> Program {
    Program::create(
        pool,
        NewProgram {
            title: title.to_string(),
            description: None,
            language_primary: "en".to_string(),
            languages_available: vec!["en".to_string()],
            topic_ids: vec![],
        },
    )
    .await
    .unwrap()
}

async fn create_term(pool: &PgPool, program_id: Uuid, term_number: i32) -> Term {
    Term::create(
        pool,
        NewTerm {
            program_id,
            term_number,
            title: None,
        },
    )
    .await
    .unwrap()
}

async fn create_lesson(pool: &PgPool, term_id: Uuid, lesson_number: i32) -> Lesson {
    Lesson::create(
        pool,
        NewLesson {
            term_id,
            lesson_number,
            title: format!("Lesson {lesson_number}"),
            content_type: ContentType::Article,
            duration_ms: None,
            is_paid: false,
            content_language_primary: "en".to_string(),
            content_languages_available: vec!["en".to_string()],
            content_urls_by_language: json!({"en": "https://cdn.example.com/lesson.html"}),
            subtitle_languages: vec![],
            subtitle_urls_by_language: None,
        },
    )
    .await
    .unwrap()
}

/// Seed a lesson directly into `scheduled` with an arbitrary publish time,
/// bypassing the service's future-time validation.
async fn force_schedule(pool: &PgPool, lesson_id: Uuid, publish_at: chrono::DateTime<Utc>) {
    Lesson::apply_status(
        pool,
        lesson_id,
        PublishStatus::Scheduled,
        Some(publish_at),
        None,
    )
    .await
    .unwrap()
    .unwrap();
}

async fn scheduled_due_lesson(pool: &PgPool, title: &str) -> (Program, Lesson) {
    let program = create_program(pool, title).await;
    let term = create_term(pool, program.id, 1).await;
    let lesson = create_lesson(pool, term.id, 1).await;
    force_schedule(pool, lesson.id, Utc::now() - Duration::minutes(5)).await;
    (program, lesson)
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_due_lesson_publishes_and_cascades_program(pool: PgPool) {
    let (program, lesson) = scheduled_due_lesson(&pool, "Algebra I").await;
    assert_eq!(program.status, "draft");

    let scheduler = PublishingScheduler::new(pool.clone(), PublishingSchedulerConfig::default());
    let outcome = scheduler.run_tick(Utc::now()).await.unwrap();

    assert_eq!(outcome.due, 1);
    assert_eq!(outcome.published, 1);
    assert_eq!(outcome.failed, 0);

    let lesson = Lesson::find_by_id(&pool, lesson.id).await.unwrap().unwrap();
    assert_eq!(lesson.status, "published");
    assert!(lesson.published_at.is_some());

    let program = Program::find_by_id(&pool, program.id).await.unwrap().unwrap();
    assert_eq!(program.status, "published");
    assert!(program.published_at.is_some());
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_future_lesson_is_not_due(pool: PgPool) {
    let program = create_program(&pool, "Algebra I").await;
    let term = create_term(&pool, program.id, 1).await;
    let lesson = create_lesson(&pool, term.id, 1).await;
    force_schedule(&pool, lesson.id, Utc::now() + Duration::minutes(5)).await;

    let service = LessonPublicationService::new(pool.clone());
    let due = service.find_due(Utc::now()).await.unwrap();
    assert!(due.is_empty());

    let scheduler = PublishingScheduler::new(pool.clone(), PublishingSchedulerConfig::default());
    let outcome = scheduler.run_tick(Utc::now()).await.unwrap();
    assert_eq!(outcome.due, 0);

    let lesson = Lesson::find_by_id(&pool, lesson.id).await.unwrap().unwrap();
    assert_eq!(lesson.status, "scheduled");
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_publish_transaction_is_idempotent(pool: PgPool) {
    let (_, lesson) = scheduled_due_lesson(&pool, "Algebra I").await;

    let service = LessonPublicationService::new(pool.clone());

    let first = service.publish_due_lesson(lesson.id).await.unwrap();
    assert_eq!(first.lesson.status, "published");
    let published_at = first.lesson.published_at.unwrap();
    let program_published_at = first.program.published_at.unwrap();

    let second = service.publish_due_lesson(lesson.id).await.unwrap();
    assert_eq!(second.lesson.status, "published");
    assert_eq!(second.lesson.published_at.unwrap(), published_at);
    assert_eq!(second.program.published_at.unwrap(), program_published_at);
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_already_published_program_keeps_published_at(pool: PgPool) {
    let (program, first_lesson) = scheduled_due_lesson(&pool, "Algebra I").await;

    let service = LessonPublicationService::new(pool.clone());
    service.publish_due_lesson(first_lesson.id).await.unwrap();

    let program_after_first = Program::find_by_id(&pool, program.id).await.unwrap().unwrap();
    let original_published_at = program_after_first.published_at.unwrap();

    // A second lesson in the same program becomes due and publishes.
    let term = Term::list_for_program(&pool, program.id).await.unwrap().remove(0);
    let second_lesson = create_lesson(&pool, term.id, 2).await;
    force_schedule(&pool, second_lesson.id, Utc::now() - Duration::minutes(1)).await;
    service.publish_due_lesson(second_lesson.id).await.unwrap();

    let program_after_second = Program::find_by_id(&pool, program.id).await.unwrap().unwrap();
    assert_eq!(program_after_second.status, "published");
    assert_eq!(program_after_second.published_at.unwrap(), original_published_at);
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_per_lesson_failure_does_not_block_the_batch(pool: PgPool) {
    // Lessons 1 and 3 live in a healthy program; lesson 2's program carries a
    // status the state machine cannot parse, so its publish fails.
    let (_, healthy_one) = scheduled_due_lesson(&pool, "Algebra I").await;
    let (broken_program, broken_lesson) = scheduled_due_lesson(&pool, "Geometry").await;
    let (_, healthy_two) = scheduled_due_lesson(&pool, "Calculus").await;

    sqlx::query("UPDATE catalog_programs SET status = 'limbo' WHERE id = $1")
        .bind(broken_program.id)
        .execute(&pool)
        .await
        .unwrap();

    let scheduler = PublishingScheduler::new(pool.clone(), PublishingSchedulerConfig::default());
    let outcome = scheduler.run_tick(Utc::now()).await.unwrap();

    assert_eq!(outcome.due, 3);
    assert_eq!(outcome.published, 2);
    assert_eq!(outcome.failed, 1);

    for id in [healthy_one.id, healthy_two.id] {
        let lesson = Lesson::find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(lesson.status, "published");
    }

    // The failed lesson stays scheduled for the next tick.
    let lesson = Lesson::find_by_id(&pool, broken_lesson.id).await.unwrap().unwrap();
    assert_eq!(lesson.status, "scheduled");
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_concurrent_publish_attempts_converge(pool: PgPool) {
    let (_, lesson) = scheduled_due_lesson(&pool, "Algebra I").await;

    let service = LessonPublicationService::new(pool.clone());
    let (first, second) = tokio::join!(
        service.publish_due_lesson(lesson.id),
        service.publish_due_lesson(lesson.id),
    );

    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(first.lesson.status, "published");
    assert_eq!(second.lesson.status, "published");
    // Exactly one attempt wrote `published_at`; both observe the same value.
    assert_eq!(first.lesson.published_at, second.lesson.published_at);
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_publish_now_skips_scheduling_and_parent(pool: PgPool) {
    let program = create_program(&pool, "Algebra I").await;
    let term = create_term(&pool, program.id, 1).await;
    let lesson = create_lesson(&pool, term.id, 1).await;

    let service = LessonPublicationService::new(pool.clone());
    let published = service.publish_now(lesson.id).await.unwrap();
    assert_eq!(published.status, "published");
    assert!(published.published_at.is_some());

    // The direct path never cascades; only the scheduler-driven transaction
    // promotes programs.
    let program = Program::find_by_id(&pool, program.id).await.unwrap().unwrap();
    assert_eq!(program.status, "draft");
    assert!(program.published_at.is_none());
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_published_at_is_write_once(pool: PgPool) {
    let program = create_program(&pool, "Algebra I").await;
    let term = create_term(&pool, program.id, 1).await;
    let lesson = create_lesson(&pool, term.id, 1).await;

    let service = LessonPublicationService::new(pool.clone());
    let published = service.publish_now(lesson.id).await.unwrap();
    let published_at = published.published_at.unwrap();

    let archived = service.archive(lesson.id).await.unwrap();
    assert_eq!(archived.status, "archived");
    assert_eq!(archived.published_at.unwrap(), published_at);

    // Archived is terminal: a later publish attempt fails and changes nothing.
    let err = service.publish_now(lesson.id).await.unwrap_err();
    assert!(matches!(err, PublicationError::InvalidTransition { .. }));

    let lesson = Lesson::find_by_id(&pool, lesson.id).await.unwrap().unwrap();
    assert_eq!(lesson.status, "archived");
    assert_eq!(lesson.published_at.unwrap(), published_at);
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_schedule_requires_future_time(pool: PgPool) {
    let program = create_program(&pool, "Algebra I").await;
    let term = create_term(&pool, program.id, 1).await;
    let lesson = create_lesson(&pool, term.id, 1).await;

    let service = LessonPublicationService::new(pool.clone());
    let err = service
        .schedule(lesson.id, Utc::now() - Duration::minutes(1))
        .await
        .unwrap_err();
    assert!(matches!(err, PublicationError::ValidationFailed(_)));

    let lesson = Lesson::find_by_id(&pool, lesson.id).await.unwrap().unwrap();
    assert_eq!(lesson.status, "draft");
    assert!(lesson.publish_at.is_none());
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_rescheduling_replaces_publish_time(pool: PgPool) {
    let program = create_program(&pool, "Algebra I").await;
    let term = create_term(&pool, program.id, 1).await;
    let lesson = create_lesson(&pool, term.id, 1).await;

    let service = LessonPublicationService::new(pool.clone());
    let first_time = Utc::now() + Duration::hours(1);
    service.schedule(lesson.id, first_time).await.unwrap();

    let second_time = Utc::now() + Duration::hours(2);
    let rescheduled = service.schedule(lesson.id, second_time).await.unwrap();
    assert_eq!(rescheduled.status, "scheduled");
    assert_eq!(
        rescheduled.publish_at.unwrap().timestamp_micros(),
        second_time.timestamp_micros()
    );
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_illegal_transition_leaves_status_unchanged(pool: PgPool) {
    let program = create_program(&pool, "Algebra I").await;
    let term = create_term(&pool, program.id, 1).await;
    let lesson = create_lesson(&pool, term.id, 1).await;

    let service = LessonPublicationService::new(pool.clone());
    service.publish_now(lesson.id).await.unwrap();

    // A published lesson cannot be scheduled.
    let err = service
        .schedule(lesson.id, Utc::now() + Duration::hours(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PublicationError::InvalidTransition {
            from: PublishStatus::Published,
            to: PublishStatus::Scheduled,
        }
    ));

    let lesson = Lesson::find_by_id(&pool, lesson.id).await.unwrap().unwrap();
    assert_eq!(lesson.status, "published");
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_operations_on_missing_lesson_fail_with_not_found(pool: PgPool) {
    let service = LessonPublicationService::new(pool.clone());
    let missing = Uuid::new_v4();

    for result in [
        service.publish_now(missing).await,
        service.schedule(missing, Utc::now() + Duration::hours(1)).await,
        service.archive(missing).await,
        service.publish_due_lesson(missing).await.map(|ctx| ctx.lesson),
    ] {
        match result {
            Err(PublicationError::NotFound { entity, id }) => {
                assert_eq!(entity, "lesson");
                assert_eq!(id, missing);
            }
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_program_direct_publish_and_archive(pool: PgPool) {
    let program = create_program(&pool, "Algebra I").await;

    let service = ProgramPublicationService::new(pool.clone());
    let published = service.publish_now(program.id).await.unwrap();
    assert_eq!(published.status, "published");
    let published_at = published.published_at.unwrap();

    let archived = service.archive(program.id).await.unwrap();
    assert_eq!(archived.status, "archived");
    assert_eq!(archived.published_at.unwrap(), published_at);

    let err = service.publish_now(program.id).await.unwrap_err();
    assert!(matches!(err, PublicationError::InvalidTransition { .. }));
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_empty_tick_is_a_quiet_no_op(pool: PgPool) {
    let scheduler = PublishingScheduler::new(pool.clone(), PublishingSchedulerConfig::default());
    let outcome = scheduler.run_tick(Utc::now()).await.unwrap();
    assert_eq!(outcome, Default::default());
}

#[sqlx::test(migrator = "catalog_core::database::MIGRATOR")]
async fn test_scheduler_handle_starts_and_stops(pool: PgPool) {
    let scheduler = PublishingScheduler::new(pool.clone(), PublishingSchedulerConfig::default());
    assert!(!scheduler.is_running().await);

    scheduler.start().await;
    assert!(scheduler.is_running().await);

    // Starting again is a warned no-op, not a second loop.
    scheduler.start().await;
    assert!(scheduler.is_running().await);

    scheduler.stop().await;
    assert!(!scheduler.is_running().await);
}
