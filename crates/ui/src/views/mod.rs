mod completion;
mod dashboard;
mod history;
mod lessons;
mod state;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use completion::LessonCompletionView;
pub use dashboard::ProgressDashboard;
pub use history::LearningHistoryView;
pub use lessons::LessonsView;
pub use state::{ViewError, ViewState, view_state_from_resource};
