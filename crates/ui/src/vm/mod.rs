mod progress_vm;
mod time_fmt;

pub use progress_vm::{
    HistoryEntryVm, LessonRowVm, SummaryVm, map_history_entries, map_lesson_rows,
};
pub use time_fmt::format_date;
