mod ids;
mod lesson;
mod progress;
mod summary;

pub use ids::{
    ANONYMOUS_USER, LessonId, LessonIdError, MAX_LESSON_ID_LEN, StepId, UserIdentity, UserKey,
    normalize_user_id,
};
pub use lesson::{Lesson, LessonError, default_catalog};
pub use progress::{
    LessonProgressPatch, LessonProgressRecord, LessonStatus, ProgressError, SectionUpdate,
};
pub use summary::{
    CompletedLesson, ProgressSummary, SummaryError, completion_history, rounded_percentage,
};
