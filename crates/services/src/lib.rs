#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod playback;
pub mod progress;

pub use lesson_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, HttpStoreError, ProgressServiceError};
pub use playback::{AudioCue, AudioPlayer, Playback, Silent, SpeechPlayer};
pub use progress::{Ack, CorrectAnswer, HttpProgressStore, ProgressService};
