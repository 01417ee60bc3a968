use std::sync::Arc;

use lesson_core::model::{Lesson, LessonId, LessonProgressRecord, LessonStatus, UserKey};
use services::AudioCue;
use storage::repository::{LessonRepository, ProgressRepository, Storage, StorageError};

use super::test_harness::{ViewKind, setup_view_harness, setup_view_harness_with_progress_repo};

struct FailingProgressRepo;

#[async_trait::async_trait]
impl ProgressRepository for FailingProgressRepo {
    async fn get_record(
        &self,
        _user: &UserKey,
        _lesson_id: &LessonId,
    ) -> Result<Option<LessonProgressRecord>, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn list_records(&self, _user: &UserKey) -> Result<Vec<LessonProgressRecord>, StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }

    async fn upsert_record(
        &self,
        _user: &UserKey,
        _record: &LessonProgressRecord,
    ) -> Result<(), StorageError> {
        Err(StorageError::Connection("fail".to_string()))
    }
}

async fn failing_harness(view: ViewKind) -> super::test_harness::ViewHarness {
    setup_view_harness_with_progress_repo(view, Storage::in_memory(), Arc::new(FailingProgressRepo))
        .await
}

#[tokio::test(flavor = "current_thread")]
async fn dashboard_renders_empty_summary() {
    let mut harness = setup_view_harness(ViewKind::Dashboard).await;
    harness.settle().await;
    let html = harness.render();

    assert!(html.contains("Progress Summary"), "missing heading in {html}");
    assert!(html.contains("0 / 3 lessons completed"), "missing count in {html}");
    assert!(html.contains("3 lessons remaining"), "missing remaining in {html}");
    assert!(html.contains("0% complete"), "missing percentage in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn dashboard_counts_completed_lessons_without_chart() {
    let mut harness = setup_view_harness(ViewKind::Dashboard).await;
    harness
        .progress
        .complete_lesson(&harness.user, "lesson-greetings")
        .await
        .unwrap();
    harness.settle().await;
    let html = harness.render();

    assert!(html.contains("1 / 3 lessons completed"), "missing count in {html}");
    assert!(html.contains("2 lessons remaining"), "missing remaining in {html}");
    assert!(html.contains("33% complete"), "missing percentage in {html}");
    assert!(!html.contains("Analytics"), "unexpected analytics label in {html}");
    assert!(!html.contains("<canvas"), "unexpected chart in {html}");
    assert!(!html.contains("<svg"), "unexpected chart in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn dashboard_renders_seven_of_ten() {
    let storage = Storage::in_memory();
    for n in 1..=10_u32 {
        let id = LessonId::new(format!("lesson-{n:02}")).unwrap();
        let lesson = Lesson::new(id, format!("Lesson {n}"), n).unwrap();
        storage.lessons.upsert_lesson(&lesson).await.unwrap();
    }
    let progress_repo = Arc::clone(&storage.progress);
    let mut harness =
        setup_view_harness_with_progress_repo(ViewKind::Dashboard, storage, progress_repo).await;
    for n in 1..=7 {
        harness
            .progress
            .complete_lesson(&harness.user, &format!("lesson-{n:02}"))
            .await
            .unwrap();
    }
    harness.settle().await;
    let html = harness.render();

    assert!(html.contains("7 / 10 lessons completed"), "missing count in {html}");
    assert!(html.contains("3 lessons remaining"), "missing remaining in {html}");
    assert!(html.contains("70% complete"), "missing percentage in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn dashboard_renders_error_state() {
    let mut harness = failing_harness(ViewKind::Dashboard).await;
    harness.settle().await;
    let html = harness.render();

    assert!(
        html.contains("Unable to load progress summary."),
        "missing error in {html}"
    );
    assert!(html.contains("Retry"), "missing retry in {html}");
    assert!(!html.contains("lessons completed"), "unexpected numbers in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn completion_view_completes_and_announces() {
    let mut harness = setup_view_harness(ViewKind::Completion("lesson-numbers".into())).await;
    harness.settle().await;
    let html = harness.render();

    assert!(
        html.contains("Success! Well done, lesson complete."),
        "missing success in {html}"
    );
    assert!(!html.contains("Save"), "unexpected save control in {html}");

    let record = harness
        .storage
        .progress
        .get_record(&harness.user, &LessonId::new("lesson-numbers").unwrap())
        .await
        .unwrap()
        .expect("completion persisted");
    assert_eq!(record.status(), LessonStatus::Completed);

    let cues = harness.playback_log.cues.lock().unwrap().clone();
    assert_eq!(cues, [AudioCue::LessonComplete]);
    let spoken = harness.playback_log.spoken.lock().unwrap().clone();
    assert_eq!(spoken.len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn completion_view_shows_retry_on_failure() {
    let mut harness = failing_harness(ViewKind::Completion("lesson-numbers".into())).await;
    harness.settle().await;
    let html = harness.render();

    assert!(html.contains("Something went wrong"), "missing error in {html}");
    assert!(html.contains("Retry"), "missing retry in {html}");
    assert!(!html.contains("Success!"), "unexpected success in {html}");
    assert!(harness.playback_log.cues.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn completion_view_rejects_malformed_lesson_id() {
    let mut harness = setup_view_harness(ViewKind::Completion("no such lesson".into())).await;
    harness.settle().await;
    let html = harness.render();

    assert!(
        html.contains("That lesson could not be found."),
        "missing validation message in {html}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn history_lists_completed_titles_read_only() {
    let mut harness = setup_view_harness(ViewKind::History).await;
    harness
        .progress
        .complete_lesson(&harness.user, "lesson-vocabulary")
        .await
        .unwrap();
    harness.settle().await;
    let html = harness.render();

    assert!(html.contains("Learning History"), "missing heading in {html}");
    assert!(html.contains("Basic Words"), "missing title in {html}");
    assert!(html.contains("2023-11-14"), "missing date in {html}");
    assert!(!html.contains("<button"), "unexpected control in {html}");
    assert!(!html.contains("<input"), "unexpected control in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn lessons_view_links_unfinished_lessons() {
    let mut harness = setup_view_harness(ViewKind::Lessons).await;
    harness
        .progress
        .complete_lesson(&harness.user, "lesson-greetings")
        .await
        .unwrap();
    harness.settle().await;
    let html = harness.render();

    assert!(html.contains("Greetings"), "missing lesson in {html}");
    assert!(html.contains("Completed"), "missing status in {html}");
    assert_eq!(html.matches("Finish lesson").count(), 2, "links in {html}");
}
