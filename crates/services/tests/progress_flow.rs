use std::sync::Arc;

use chrono::Duration;
use lesson_core::model::{LessonId, LessonProgressPatch, LessonStatus, SectionUpdate, UserKey};
use lesson_core::time::fixed_now;
use services::{AppServices, Clock, ProgressService};
use storage::repository::Storage;

#[tokio::test]
async fn sqlite_backed_lesson_flow() {
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_services_flow?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
    )
    .await
    .expect("services");
    let progress = services.progress();
    let user = UserKey::normalize(Some("learner-1"));

    progress.open_lesson(&user, "lesson-greetings").await.unwrap();
    progress
        .record_correct_answer(&user, "lesson-greetings", "hello")
        .await
        .unwrap();
    progress
        .update_section_progress(
            &user,
            "lesson-greetings",
            SectionUpdate {
                current_section_id: Some("practice".into()),
                completed_sections: Some(vec!["intro".into()]),
                is_replay: false,
            },
        )
        .await
        .unwrap();
    progress
        .complete_lesson(&user, "lesson-greetings")
        .await
        .unwrap();

    let record = progress
        .get_lesson_progress(&user, "lesson-greetings")
        .await
        .unwrap();
    assert_eq!(record.status(), LessonStatus::Completed);
    assert_eq!(record.correct_count(), 1);
    assert_eq!(record.current_section_id(), Some("practice"));
    assert!(record.completed_sections().contains("intro"));

    let summary = progress.get_progress_summary(&user).await.unwrap();
    assert_eq!(summary.completed_lessons(), 1);
    assert_eq!(summary.remaining_lessons(), 2);
    assert_eq!(summary.percentage(), 33);
}

#[tokio::test]
async fn later_write_wins_and_reopening_clears_completion() {
    let storage = Storage::in_memory();
    let services = AppServices::from_storage(&storage, Clock::fixed(fixed_now()))
        .await
        .unwrap();
    let user = UserKey::normalize(Some("learner-2"));
    let progress = services.progress();

    progress.complete_lesson(&user, "lesson-numbers").await.unwrap();

    let later = Clock::fixed(fixed_now() + Duration::hours(1));
    let reopened = ProgressService::from_storage(later, &storage)
        .save_lesson_progress(
            &user,
            "lesson-numbers",
            LessonProgressPatch {
                status: Some(LessonStatus::InProgress),
                ..LessonProgressPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(reopened.status(), LessonStatus::InProgress);
    assert_eq!(reopened.completed_at(), None);
    assert_eq!(
        reopened.updated_at(),
        Some(fixed_now() + Duration::hours(1))
    );

    let all = progress.get_all_lesson_progress(&user).await.unwrap();
    assert_eq!(
        all[&LessonId::new("lesson-numbers").unwrap()].status(),
        LessonStatus::InProgress
    );
    let summary = progress.get_progress_summary(&user).await.unwrap();
    assert_eq!(summary.completed_lessons(), 0);
}

#[tokio::test]
async fn anonymous_and_named_users_are_isolated() {
    let storage = Storage::in_memory();
    let services = AppServices::from_storage(&storage, Clock::fixed(fixed_now()))
        .await
        .unwrap();
    let progress: Arc<ProgressService> = services.progress();

    progress
        .complete_lesson(&UserKey::normalize(None), "lesson-vocabulary")
        .await
        .unwrap();

    let named = progress
        .get_progress_summary(&UserKey::normalize(Some("learner-3")))
        .await
        .unwrap();
    assert_eq!(named.completed_lessons(), 0);

    let guest = progress
        .get_progress_summary(&UserKey::anonymous())
        .await
        .unwrap();
    assert_eq!(guest.completed_lessons(), 1);
}
