//! Scriptable speech adapters for tests and headless runs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, oneshot};

use crate::error::SpeechError;
use crate::speech::{
    AudioOutput, NativeSynthesizer, PlaybackDone, RecognitionEvent, RecognitionSegment,
    Recognizer, Voice,
};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Recognizer whose results are pushed by the test.
#[derive(Debug)]
pub struct ScriptedRecognizer {
    supported: AtomicBool,
    events: Mutex<Option<mpsc::UnboundedSender<RecognitionEvent>>>,
    starts: AtomicUsize,
}

impl ScriptedRecognizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            supported: AtomicBool::new(true),
            events: Mutex::new(None),
            starts: AtomicUsize::new(0),
        }
    }

    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::SeqCst);
    }

    /// Deliver a recognition result; dropped when not listening.
    pub fn emit(&self, event: RecognitionEvent) {
        if let Some(events) = locked(&self.events).as_ref() {
            let _ = events.send(event);
        }
    }

    /// Shorthand for a single interim segment.
    pub fn say(&self, text: &str) {
        self.emit(RecognitionEvent::new(vec![RecognitionSegment::interim(text)]));
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        locked(&self.events).is_some()
    }

    #[must_use]
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer for ScriptedRecognizer {
    fn is_supported(&self) -> bool {
        self.supported.load(Ordering::SeqCst)
    }

    fn start(&self, events: mpsc::UnboundedSender<RecognitionEvent>) -> Result<(), SpeechError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        *locked(&self.events) = Some(events);
        Ok(())
    }

    fn stop(&self) {
        locked(&self.events).take();
    }
}

/// Audio sink that never makes a sound; playback lasts until `finish` or
/// `stop`.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    current: Mutex<Option<oneshot::Sender<()>>>,
    clips: AtomicUsize,
    stops: AtomicUsize,
    fail_next: AtomicBool,
}

impl RecordingAudio {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// End the current clip as if it had played to the end.
    pub fn finish(&self) {
        if let Some(done) = locked(&self.current).take() {
            let _ = done.send(());
        }
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        locked(&self.current).is_some()
    }

    #[must_use]
    pub fn clips_played(&self) -> usize {
        self.clips.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl AudioOutput for RecordingAudio {
    fn play(&self, _audio: Vec<u8>) -> Result<PlaybackDone, SpeechError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SpeechError::Playback("decoder rejected clip".into()));
        }
        let (tx, rx) = oneshot::channel();
        *locked(&self.current) = Some(tx);
        self.clips.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        locked(&self.current).take();
    }
}

/// Native synthesizer that records what it was asked to say.
#[derive(Debug, Default)]
pub struct RecordingSynthesizer {
    voices: Vec<Voice>,
    spoken: Mutex<Vec<(String, Option<String>)>>,
    current: Mutex<Option<oneshot::Sender<()>>>,
}

impl RecordingSynthesizer {
    #[must_use]
    pub fn with_voices(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            ..Self::default()
        }
    }

    /// Text spoken so far, with the chosen voice name.
    #[must_use]
    pub fn spoken(&self) -> Vec<(String, Option<String>)> {
        locked(&self.spoken).clone()
    }

    pub fn finish(&self) {
        if let Some(done) = locked(&self.current).take() {
            let _ = done.send(());
        }
    }

    #[must_use]
    pub fn is_speaking(&self) -> bool {
        locked(&self.current).is_some()
    }
}

impl NativeSynthesizer for RecordingSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&self, text: &str, voice: Option<&Voice>) -> Result<PlaybackDone, SpeechError> {
        locked(&self.spoken).push((text.to_string(), voice.map(|v| v.name.clone())));
        let (tx, rx) = oneshot::channel();
        *locked(&self.current) = Some(tx);
        Ok(rx)
    }

    fn cancel(&self) {
        locked(&self.current).take();
    }
}
