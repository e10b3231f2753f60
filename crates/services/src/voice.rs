use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use backend::{CoachClient, CoachRequest};
use studymate_core::model::{AssistantMode, ConversationHistory, ConversationTurn, UserId};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::VoiceError;
use crate::speech::SpeechIo;
use crate::timer::DelayedTask;

/// Utterances this short (after trimming) are treated as noise.
const MIN_UTTERANCE_CHARS: usize = 3;

/// Hands-free conversation with the study coach.
///
/// Listens until the user pauses, sends what was heard together with the
/// recent conversation, speaks the reply and goes back to idle. Dropping the
/// assistant stops it.
pub struct VoiceAssistant {
    inner: Arc<Inner>,
}

struct Inner {
    speech: Arc<SpeechIo>,
    coach: Arc<dyn CoachClient>,
    silence: Duration,
    mode: watch::Sender<AssistantMode>,
    state: Mutex<VoiceState>,
}

#[derive(Default)]
struct VoiceState {
    /// Bumped on every start and stop; work from an older epoch is ignored.
    epoch: u64,
    in_flight: bool,
    history: ConversationHistory,
    silence_timer: Option<DelayedTask>,
    transcripts: Option<JoinHandle<()>>,
    request: Option<JoinHandle<()>>,
    last_error: Option<String>,
}

impl VoiceAssistant {
    #[must_use]
    pub fn new(speech: Arc<SpeechIo>, coach: Arc<dyn CoachClient>, silence: Duration) -> Self {
        let (mode, _rx) = watch::channel(AssistantMode::Idle);
        Self {
            inner: Arc::new(Inner {
                speech,
                coach,
                silence,
                mode,
                state: Mutex::new(VoiceState::default()),
            }),
        }
    }

    #[must_use]
    pub fn mode(&self) -> AssistantMode {
        *self.inner.mode.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AssistantMode> {
        self.inner.mode.subscribe()
    }

    #[must_use]
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.inner.state().history.to_vec()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.inner.state().last_error.clone()
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.inner.state().in_flight
    }

    /// Start listening on behalf of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `VoiceError::MissingUserId` without changing mode when the id
    /// is blank, or `VoiceError::Speech` (mode becomes `Error`) when the
    /// platform cannot listen.
    pub fn start(&self, user_id: &str) -> Result<(), VoiceError> {
        let user_id = match UserId::new(user_id) {
            Ok(id) => id,
            Err(err) => {
                error!("no user id provided; assistant not started");
                return Err(err.into());
            }
        };

        let epoch = self.inner.reset();
        let (tx, rx) = mpsc::unbounded_channel();
        if let Err(err) = self.inner.speech.start_listening(tx) {
            warn!(error = %err, "cannot start listening");
            self.inner.fail(epoch, err.to_string());
            return Err(err.into());
        }
        self.inner.set_mode(epoch, AssistantMode::Listening);

        let inner = Arc::clone(&self.inner);
        let pump = tokio::spawn(async move { inner.pump_transcripts(epoch, user_id, rx).await });
        let mut state = self.inner.state();
        if state.epoch == epoch {
            state.transcripts = Some(pump);
        } else {
            pump.abort();
        }
        Ok(())
    }

    /// Cancel everything and return to idle. Safe in any mode.
    pub fn stop(&self) {
        self.inner.reset();
    }
}

impl Drop for VoiceAssistant {
    fn drop(&mut self) {
        self.inner.reset();
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, VoiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invalidate in-flight work, silence every output and go idle.
    /// Returns the new epoch.
    fn reset(&self) -> u64 {
        let (epoch, timer, transcripts, request) = {
            let mut state = self.state();
            state.epoch += 1;
            state.in_flight = false;
            self.mode.send_replace(AssistantMode::Idle);
            (
                state.epoch,
                state.silence_timer.take(),
                state.transcripts.take(),
                state.request.take(),
            )
        };
        drop(timer);
        if let Some(task) = transcripts {
            task.abort();
        }
        if let Some(task) = request {
            task.abort();
        }
        self.speech.stop_listening();
        self.speech.stop_speaking();
        epoch
    }

    fn set_mode(&self, epoch: u64, mode: AssistantMode) {
        let state = self.state();
        if state.epoch == epoch {
            self.mode.send_replace(mode);
        }
    }

    fn fail(&self, epoch: u64, message: String) {
        let mut state = self.state();
        if state.epoch == epoch {
            state.last_error = Some(message);
            self.mode.send_replace(AssistantMode::Error);
        }
    }

    /// Restart the silence timer on every transcript update.
    async fn pump_transcripts(
        self: Arc<Self>,
        epoch: u64,
        user_id: UserId,
        mut transcripts: mpsc::UnboundedReceiver<String>,
    ) {
        while let Some(text) = transcripts.recv().await {
            let mut state = self.state();
            if state.epoch != epoch {
                break;
            }
            let inner = Arc::clone(&self);
            let user_id = user_id.clone();
            state.silence_timer = Some(DelayedTask::spawn(self.silence, async move {
                inner.on_silence(epoch, user_id, text);
            }));
        }
    }

    fn on_silence(self: Arc<Self>, epoch: u64, user_id: UserId, text: String) {
        let text = text.trim().to_string();
        {
            let mut state = self.state();
            if state.epoch != epoch || state.in_flight {
                return;
            }
            if text.chars().count() < MIN_UTTERANCE_CHARS {
                debug!(%text, "ignoring short utterance");
                return;
            }
            state.in_flight = true;
        }
        self.speech.stop_listening();
        info!(chars = text.chars().count(), "submitting utterance to coach");

        let inner = Arc::clone(&self);
        let request = tokio::spawn(async move { inner.process_request(epoch, user_id, text).await });
        let mut state = self.state();
        if state.epoch == epoch {
            state.request = Some(request);
        } else {
            request.abort();
        }
    }

    async fn process_request(self: Arc<Self>, epoch: u64, user_id: UserId, text: String) {
        self.set_mode(epoch, AssistantMode::Thinking);
        let history = self.state().history.to_vec();
        let request = CoachRequest::new(user_id, text.clone(), history);

        if let Err(err) = self.converse(epoch, &text, &request).await {
            error!(error = %err, "assistant error");
            self.fail(epoch, err.to_string());
        }

        let mut state = self.state();
        if state.epoch == epoch {
            state.in_flight = false;
        }
    }

    async fn converse(
        &self,
        epoch: u64,
        text: &str,
        request: &CoachRequest,
    ) -> Result<(), VoiceError> {
        let reply = self.coach.coach(request).await?;
        {
            let mut state = self.state();
            if state.epoch != epoch {
                return Ok(());
            }
            state.history.record_exchange(text, reply.clone());
        }
        self.set_mode(epoch, AssistantMode::Speaking);
        let playback = self.speech.speak(&reply).await?;
        // A stop that landed while the clip was being fetched has already
        // silenced the outputs; anything started after it must go too.
        if self.state().epoch != epoch {
            self.speech.stop_speaking();
            return Ok(());
        }
        playback.finished().await;
        self.set_mode(epoch, AssistantMode::Idle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingAudio, RecordingSynthesizer, ScriptedRecognizer};
    use backend::{InMemoryBackend, Operation};

    fn assistant(backend: &InMemoryBackend) -> VoiceAssistant {
        let speech = SpeechIo::new(
            Arc::new(ScriptedRecognizer::new()),
            Arc::new(backend.clone()),
            Arc::new(RecordingAudio::new()),
            Arc::new(RecordingSynthesizer::default()),
        );
        VoiceAssistant::new(
            Arc::new(speech),
            Arc::new(backend.clone()),
            Duration::from_millis(1500),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn second_silence_firing_is_latched_out() {
        let backend = InMemoryBackend::new();
        backend.set_coach_delay(Some(Duration::from_secs(5)));
        let assistant = assistant(&backend);
        assistant.start("user_1").unwrap();
        let epoch = assistant.inner.state().epoch;
        let user = UserId::new("user_1").unwrap();

        Arc::clone(&assistant.inner).on_silence(epoch, user.clone(), "what topics".into());
        Arc::clone(&assistant.inner).on_silence(epoch, user, "what topics".into());
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(backend.calls(Operation::Coach), 1);
        assert!(assistant.is_in_flight());
        assert_eq!(assistant.mode(), AssistantMode::Thinking);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_epoch_firings_are_ignored() {
        let backend = InMemoryBackend::new();
        let assistant = assistant(&backend);
        assistant.start("user_1").unwrap();
        let stale = assistant.inner.state().epoch;
        assistant.stop();

        let user = UserId::new("user_1").unwrap();
        Arc::clone(&assistant.inner).on_silence(stale, user, "what topics".into());
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(backend.calls(Operation::Coach), 0);
        assert_eq!(assistant.mode(), AssistantMode::Idle);
    }
}
