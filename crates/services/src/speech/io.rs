use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use backend::SpeechSynthesisApi;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{AudioOutput, NativeSynthesizer, PlaybackDone, Recognizer};
use crate::error::SpeechError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSource {
    Remote,
    Native,
    /// Nothing to say.
    Silent,
}

/// Handle to an utterance that is playing.
#[derive(Debug)]
pub struct Playback {
    source: PlaybackSource,
    done: Option<PlaybackDone>,
}

impl Playback {
    fn silent() -> Self {
        Self {
            source: PlaybackSource::Silent,
            done: None,
        }
    }

    #[must_use]
    pub fn source(&self) -> PlaybackSource {
        self.source
    }

    /// Wait until playback ends, whether it ran out or was stopped.
    pub async fn finished(self) {
        if let Some(done) = self.done {
            let _ = done.await;
        }
    }
}

/// Listening and speaking for the voice assistant.
///
/// `speak` prefers the remote voice and falls back to the platform
/// synthesizer when the remote call fails or yields nothing playable.
pub struct SpeechIo {
    recognizer: Arc<dyn Recognizer>,
    remote: Arc<dyn SpeechSynthesisApi>,
    audio: Arc<dyn AudioOutput>,
    native: Arc<dyn NativeSynthesizer>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SpeechIo {
    #[must_use]
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        remote: Arc<dyn SpeechSynthesisApi>,
        audio: Arc<dyn AudioOutput>,
        native: Arc<dyn NativeSynthesizer>,
    ) -> Self {
        Self {
            recognizer,
            remote,
            audio,
            native,
            listener: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.recognizer.is_supported()
    }

    fn listener(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start continuous recognition and send the cumulative transcript to
    /// `sink` after every recognition event. Empty transcripts are skipped.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Unsupported` when the platform has no
    /// recognizer, or the recognizer's own start error.
    pub fn start_listening(&self, sink: mpsc::UnboundedSender<String>) -> Result<(), SpeechError> {
        if !self.recognizer.is_supported() {
            return Err(SpeechError::Unsupported);
        }
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.recognizer.start(tx)?;

        let forward = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let transcript = event.transcript();
                if transcript.is_empty() {
                    continue;
                }
                if sink.send(transcript).is_err() {
                    break;
                }
            }
        });
        if let Some(previous) = self.listener().replace(forward) {
            previous.abort();
        }
        Ok(())
    }

    pub fn stop_listening(&self) {
        self.recognizer.stop();
        if let Some(forward) = self.listener().take() {
            forward.abort();
        }
    }

    /// Speak `text`, interrupting anything already playing.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Synthesis` only when both the remote voice and
    /// the native fallback fail.
    pub async fn speak(&self, text: &str) -> Result<Playback, SpeechError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Playback::silent());
        }
        self.stop_speaking();

        match self.play_remote(text).await {
            Ok(done) => {
                return Ok(Playback {
                    source: PlaybackSource::Remote,
                    done: Some(done),
                });
            }
            Err(reason) => warn!(%reason, "switching to native voice"),
        }

        let voices = self.native.voices();
        let voice = voices.iter().find(|voice| voice.lang.contains("en"));
        debug!(voice = voice.map(|v| v.name.as_str()), "native synthesis");
        let done = self.native.speak(text, voice)?;
        Ok(Playback {
            source: PlaybackSource::Native,
            done: Some(done),
        })
    }

    async fn play_remote(&self, text: &str) -> Result<PlaybackDone, String> {
        let audio = self
            .remote
            .synthesize(text)
            .await
            .map_err(|err| err.to_string())?;
        if audio.is_empty() {
            return Err("remote voice returned no audio".into());
        }
        self.audio.play(audio).map_err(|err| err.to_string())
    }

    /// Silence both outputs. Safe to call with nothing playing.
    pub fn stop_speaking(&self) {
        self.audio.stop();
        self.native.cancel();
    }
}

impl Drop for SpeechIo {
    fn drop(&mut self) {
        self.stop_listening();
        self.stop_speaking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingAudio, RecordingSynthesizer, ScriptedRecognizer};
    use backend::{Failure, InMemoryBackend, Operation};
    use crate::speech::{RecognitionEvent, RecognitionSegment, Voice};

    struct Rig {
        backend: InMemoryBackend,
        recognizer: Arc<ScriptedRecognizer>,
        audio: Arc<RecordingAudio>,
        native: Arc<RecordingSynthesizer>,
        speech: SpeechIo,
    }

    fn rig() -> Rig {
        let backend = InMemoryBackend::new();
        let recognizer = Arc::new(ScriptedRecognizer::new());
        let audio = Arc::new(RecordingAudio::new());
        let native = Arc::new(RecordingSynthesizer::with_voices(vec![
            Voice {
                name: "Amelie".into(),
                lang: "fr-FR".into(),
            },
            Voice {
                name: "Ravi".into(),
                lang: "en-IN".into(),
            },
        ]));
        let speech = SpeechIo::new(
            recognizer.clone(),
            Arc::new(backend.clone()),
            audio.clone(),
            native.clone(),
        );
        Rig {
            backend,
            recognizer,
            audio,
            native,
            speech,
        }
    }

    #[tokio::test]
    async fn remote_voice_is_preferred() {
        let rig = rig();
        let playback = rig.speech.speak("Nice work").await.unwrap();

        assert_eq!(playback.source(), PlaybackSource::Remote);
        assert_eq!(rig.backend.synthesized(), vec!["Nice work".to_string()]);
        assert_eq!(rig.audio.clips_played(), 1);
        assert!(rig.native.spoken().is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_an_english_native_voice() {
        let rig = rig();
        rig.backend.fail(Operation::Synthesize, Failure::Unavailable);
        let playback = rig.speech.speak("Nice work").await.unwrap();

        assert_eq!(playback.source(), PlaybackSource::Native);
        assert_eq!(
            rig.native.spoken(),
            vec![("Nice work".to_string(), Some("Ravi".to_string()))]
        );
    }

    #[tokio::test]
    async fn empty_audio_and_playback_errors_fall_back() {
        let rig = rig();
        rig.backend.set_audio(Vec::new());
        let playback = rig.speech.speak("one").await.unwrap();
        assert_eq!(playback.source(), PlaybackSource::Native);

        rig.backend.set_audio(vec![1, 2, 3]);
        rig.audio.fail_next();
        let playback = rig.speech.speak("two").await.unwrap();
        assert_eq!(playback.source(), PlaybackSource::Native);
        assert_eq!(rig.native.spoken().len(), 2);
    }

    #[tokio::test]
    async fn stop_speaking_is_idempotent() {
        let rig = rig();
        rig.speech.stop_speaking();
        rig.speech.stop_speaking();

        let playback = rig.speech.speak("hello").await.unwrap();
        rig.speech.stop_speaking();
        playback.finished().await;
        assert!(rig.audio.stops() >= 3);
    }

    #[tokio::test]
    async fn unsupported_recognition_is_reported() {
        let rig = rig();
        rig.recognizer.set_supported(false);
        let (tx, _rx) = mpsc::unbounded_channel();
        assert_eq!(
            rig.speech.start_listening(tx),
            Err(SpeechError::Unsupported)
        );
    }

    #[tokio::test]
    async fn forwards_cumulative_transcripts() {
        let rig = rig();
        let (tx, mut rx) = mpsc::unbounded_channel();
        rig.speech.start_listening(tx).unwrap();

        rig.recognizer.emit(RecognitionEvent::new(vec![RecognitionSegment::interim("")]));
        rig.recognizer.emit(RecognitionEvent::new(vec![
            RecognitionSegment::final_text("what"),
            RecognitionSegment::interim("topics"),
        ]));

        assert_eq!(rx.recv().await.as_deref(), Some("what topics"));
        rig.speech.stop_listening();
        assert!(!rig.recognizer.is_listening());
    }
}
