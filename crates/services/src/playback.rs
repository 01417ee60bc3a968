//! Speech and sound effects, injected rather than reached for globally.

use std::sync::Arc;

/// Text shown and spoken when a lesson is finished.
pub const COMPLETION_MESSAGE: &str = "Success! Well done, lesson complete.";

/// Short sound effects played during a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AudioCue {
    LessonComplete,
}

/// Reads text aloud. Fire-and-forget: failures are the player's concern.
pub trait SpeechPlayer: Send + Sync {
    fn speak(&self, text: &str);
}

pub trait AudioPlayer: Send + Sync {
    fn play(&self, cue: AudioCue);
}

/// No-op player for headless runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl SpeechPlayer for Silent {
    fn speak(&self, text: &str) {
        tracing::trace!(text, "speech muted");
    }
}

impl AudioPlayer for Silent {
    fn play(&self, cue: AudioCue) {
        tracing::trace!(?cue, "audio muted");
    }
}

/// The capabilities a lesson flow may use to give feedback.
#[derive(Clone)]
pub struct Playback {
    speech: Arc<dyn SpeechPlayer>,
    audio: Arc<dyn AudioPlayer>,
}

impl Playback {
    #[must_use]
    pub fn new(speech: Arc<dyn SpeechPlayer>, audio: Arc<dyn AudioPlayer>) -> Self {
        Self { speech, audio }
    }

    #[must_use]
    pub fn silent() -> Self {
        Self::new(Arc::new(Silent), Arc::new(Silent))
    }

    /// Celebrate a finished lesson: completion chime, then the spoken message.
    pub fn announce_completion(&self) {
        self.audio.play(AudioCue::LessonComplete);
        self.speech.speak(COMPLETION_MESSAGE);
    }
}

impl Default for Playback {
    fn default() -> Self {
        Self::silent()
    }
}
