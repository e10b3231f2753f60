//! Speech input and output behind small platform traits.
//!
//! Recognition, clip playback and on-device synthesis are supplied by the
//! host (a terminal, a browser bridge, test fakes). Remote synthesis goes
//! through the backend.

mod io;

pub use io::{Playback, PlaybackSource, SpeechIo};

use tokio::sync::{mpsc, oneshot};

use crate::error::SpeechError;

/// One recognised phrase; interim phrases may still change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSegment {
    pub text: String,
    pub is_final: bool,
}

impl RecognitionSegment {
    #[must_use]
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }

    #[must_use]
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }
}

/// Every segment recognised so far in the current listening session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecognitionEvent {
    pub segments: Vec<RecognitionSegment>,
}

impl RecognitionEvent {
    #[must_use]
    pub fn new(segments: Vec<RecognitionSegment>) -> Self {
        Self { segments }
    }

    /// Final segments joined by spaces, then the interim tail, trimmed.
    #[must_use]
    pub fn transcript(&self) -> String {
        let mut finals = String::new();
        let mut interim = String::new();
        for segment in &self.segments {
            if segment.is_final {
                finals.push_str(&segment.text);
                finals.push(' ');
            } else {
                interim.push_str(&segment.text);
            }
        }
        finals.push_str(&interim);
        finals.trim().to_string()
    }
}

/// Resolves when playback ends or is stopped.
pub type PlaybackDone = oneshot::Receiver<()>;

/// Continuous speech recognition with interim results.
pub trait Recognizer: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Begin listening; every recognition result is sent to `events`.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Recognition` if the microphone cannot start.
    fn start(&self, events: mpsc::UnboundedSender<RecognitionEvent>) -> Result<(), SpeechError>;

    fn stop(&self);
}

/// Plays encoded audio clips.
pub trait AudioOutput: Send + Sync {
    /// # Errors
    ///
    /// Returns `SpeechError::Playback` if the clip cannot be played.
    fn play(&self, audio: Vec<u8>) -> Result<PlaybackDone, SpeechError>;

    fn stop(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP 47 tag such as `en-IN`.
    pub lang: String,
}

/// The platform's built-in text-to-speech.
pub trait NativeSynthesizer: Send + Sync {
    fn voices(&self) -> Vec<Voice>;

    /// # Errors
    ///
    /// Returns `SpeechError::Synthesis` if nothing can be spoken.
    fn speak(&self, text: &str, voice: Option<&Voice>) -> Result<PlaybackDone, SpeechError>;

    fn cancel(&self);
}
