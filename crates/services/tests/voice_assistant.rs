use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use backend::{BackendError, Failure, InMemoryBackend, Operation, SpeechSynthesisApi};
use services::testing::{RecordingAudio, RecordingSynthesizer, ScriptedRecognizer};
use services::speech::Voice;
use services::{SpeechError, SpeechIo, VoiceAssistant, VoiceError};
use studymate_core::model::{AssistantMode, ConversationTurn};

const SILENCE: Duration = Duration::from_millis(1500);

struct Rig {
    backend: InMemoryBackend,
    recognizer: Arc<ScriptedRecognizer>,
    audio: Arc<RecordingAudio>,
    native: Arc<RecordingSynthesizer>,
    assistant: VoiceAssistant,
}

fn rig() -> Rig {
    let backend = InMemoryBackend::new();
    let recognizer = Arc::new(ScriptedRecognizer::new());
    let audio = Arc::new(RecordingAudio::new());
    let native = Arc::new(RecordingSynthesizer::with_voices(vec![Voice {
        name: "Samantha".into(),
        lang: "en-US".into(),
    }]));
    let speech = SpeechIo::new(
        recognizer.clone(),
        Arc::new(backend.clone()),
        audio.clone(),
        native.clone(),
    );
    let assistant = VoiceAssistant::new(Arc::new(speech), Arc::new(backend.clone()), SILENCE);
    Rig {
        backend,
        recognizer,
        audio,
        native,
        assistant,
    }
}

async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn submits_after_a_full_pause_only() {
    let rig = rig();
    rig.assistant.start("user_1").unwrap();
    assert_eq!(rig.assistant.mode(), AssistantMode::Listening);

    rig.recognizer.say("what should I revise");
    wait(1499).await;
    assert_eq!(rig.backend.calls(Operation::Coach), 0);
    assert_eq!(rig.assistant.mode(), AssistantMode::Listening);

    wait(2).await;
    assert_eq!(rig.backend.calls(Operation::Coach), 1);
    assert_eq!(rig.assistant.mode(), AssistantMode::Speaking);
    assert!(!rig.recognizer.is_listening());

    let request = &rig.backend.coach_requests()[0];
    assert_eq!(request.message, "what should I revise");
    assert_eq!(request.user_id.as_str(), "user_1");
    assert_eq!(request.mode, "coach");
    assert!(request.history.is_empty());

    rig.audio.finish();
    settle().await;
    assert_eq!(rig.assistant.mode(), AssistantMode::Idle);
    assert!(!rig.assistant.is_in_flight());
    assert_eq!(
        rig.assistant.history(),
        vec![
            ConversationTurn::user("what should I revise"),
            ConversationTurn::assistant("Let's keep going."),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn new_words_restart_the_silence_timer() {
    let rig = rig();
    rig.assistant.start("user_1").unwrap();

    rig.recognizer.say("what");
    wait(1000).await;
    rig.recognizer.say("what should I study");
    wait(1000).await;
    assert_eq!(rig.backend.calls(Operation::Coach), 0);

    wait(600).await;
    assert_eq!(rig.backend.calls(Operation::Coach), 1);
    assert_eq!(rig.backend.coach_requests()[0].message, "what should I study");
}

#[tokio::test(start_paused = true)]
async fn short_utterances_are_ignored() {
    let rig = rig();
    rig.assistant.start("user_1").unwrap();

    rig.recognizer.say(" hi ");
    wait(3000).await;

    assert_eq!(rig.backend.calls(Operation::Coach), 0);
    assert_eq!(rig.assistant.mode(), AssistantMode::Listening);
}

#[tokio::test(start_paused = true)]
async fn only_one_request_runs_at_a_time() {
    let rig = rig();
    rig.backend.set_coach_delay(Some(Duration::from_secs(5)));
    rig.assistant.start("user_1").unwrap();

    rig.recognizer.say("explain osmosis");
    wait(1600).await;
    assert_eq!(rig.assistant.mode(), AssistantMode::Thinking);
    assert!(rig.assistant.is_in_flight());

    rig.recognizer.say("and diffusion too");
    wait(2000).await;
    assert_eq!(rig.backend.calls(Operation::Coach), 1);

    wait(5000).await;
    assert_eq!(rig.assistant.mode(), AssistantMode::Speaking);
    assert_eq!(rig.backend.calls(Operation::Coach), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_while_thinking_discards_the_reply() {
    let rig = rig();
    rig.backend.set_coach_delay(Some(Duration::from_secs(5)));
    rig.assistant.start("user_1").unwrap();

    rig.recognizer.say("quiz me on enzymes");
    wait(1600).await;
    assert_eq!(rig.assistant.mode(), AssistantMode::Thinking);

    rig.assistant.stop();
    wait(10_000).await;

    assert_eq!(rig.assistant.mode(), AssistantMode::Idle);
    assert!(!rig.assistant.is_in_flight());
    assert!(rig.assistant.history().is_empty());
    assert_eq!(rig.audio.clips_played(), 0);
}

#[tokio::test(start_paused = true)]
async fn stop_while_speaking_silences_playback() {
    let rig = rig();
    rig.assistant.start("user_1").unwrap();
    rig.recognizer.say("summarise chapter two");
    wait(1600).await;
    assert_eq!(rig.assistant.mode(), AssistantMode::Speaking);
    assert!(rig.audio.is_playing());

    rig.assistant.stop();
    wait(10_000).await;

    assert_eq!(rig.assistant.mode(), AssistantMode::Idle);
    assert!(!rig.audio.is_playing());
    assert!(!rig.recognizer.is_listening());
}

#[tokio::test(start_paused = true)]
async fn history_keeps_the_last_ten_turns() {
    let rig = rig();
    for i in 0..6 {
        rig.backend.push_coach_reply(format!("answer {i}"));
        rig.assistant.start("user_1").unwrap();
        rig.recognizer.say(&format!("question {i}"));
        wait(1600).await;
        rig.audio.finish();
        settle().await;
        assert_eq!(rig.assistant.mode(), AssistantMode::Idle);
    }

    let history = rig.assistant.history();
    assert_eq!(history.len(), 10);
    assert_eq!(history[0], ConversationTurn::user("question 1"));
    assert_eq!(history[9], ConversationTurn::assistant("answer 5"));

    let last_request = rig.backend.coach_requests().pop().unwrap();
    assert_eq!(last_request.history.len(), 10);
    assert_eq!(last_request.history[0], ConversationTurn::user("question 0"));
}

#[tokio::test(start_paused = true)]
async fn blank_user_id_does_not_start() {
    let rig = rig();

    let err = rig.assistant.start("   ").unwrap_err();

    assert!(matches!(err, VoiceError::MissingUserId(_)));
    assert_eq!(rig.assistant.mode(), AssistantMode::Idle);
    assert_eq!(rig.recognizer.starts(), 0);
}

#[tokio::test(start_paused = true)]
async fn unsupported_platform_reports_an_error() {
    let rig = rig();
    rig.recognizer.set_supported(false);

    let err = rig.assistant.start("user_1").unwrap_err();

    assert!(matches!(err, VoiceError::Speech(SpeechError::Unsupported)));
    assert_eq!(rig.assistant.mode(), AssistantMode::Error);
    assert!(rig.assistant.last_error().is_some());
}

#[tokio::test(start_paused = true)]
async fn coach_failure_moves_to_error_and_allows_restart() {
    let rig = rig();
    rig.backend.fail(Operation::Coach, Failure::RateLimited);
    rig.assistant.start("user_1").unwrap();

    rig.recognizer.say("what is a ribosome");
    wait(1600).await;
    assert_eq!(rig.assistant.mode(), AssistantMode::Error);
    assert!(!rig.assistant.is_in_flight());
    assert!(rig.assistant.history().is_empty());

    rig.backend.clear_failure(Operation::Coach);
    rig.assistant.start("user_1").unwrap();
    assert_eq!(rig.assistant.mode(), AssistantMode::Listening);
    assert_eq!(rig.recognizer.starts(), 2);
}

#[tokio::test(start_paused = true)]
async fn reply_uses_native_voice_when_remote_fails() {
    let rig = rig();
    rig.backend.fail(Operation::Synthesize, Failure::Unavailable);
    rig.assistant.start("user_1").unwrap();

    rig.recognizer.say("give me a tip");
    wait(1600).await;
    assert_eq!(rig.assistant.mode(), AssistantMode::Speaking);
    assert_eq!(
        rig.native.spoken(),
        vec![("Let's keep going.".to_string(), Some("Samantha".to_string()))]
    );

    rig.native.finish();
    settle().await;
    assert_eq!(rig.assistant.mode(), AssistantMode::Idle);
}

/// Remote voice that holds its worker thread while synthesizing, so a stop
/// can arrive between the request and the start of playback.
#[derive(Default)]
struct SlowVoice {
    started: AtomicBool,
}

#[async_trait]
impl SpeechSynthesisApi for SlowVoice {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, BackendError> {
        self.started.store(true, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(300));
        Ok(vec![0x49, 0x44, 0x33])
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_during_synthesis_leaves_nothing_playing() {
    let backend = InMemoryBackend::new();
    let recognizer = Arc::new(ScriptedRecognizer::new());
    let audio = Arc::new(RecordingAudio::new());
    let voice = Arc::new(SlowVoice::default());
    let speech = SpeechIo::new(
        recognizer.clone(),
        voice.clone(),
        audio.clone(),
        Arc::new(RecordingSynthesizer::default()),
    );
    let assistant = VoiceAssistant::new(
        Arc::new(speech),
        Arc::new(backend),
        Duration::from_millis(20),
    );

    assistant.start("user_1").unwrap();
    recognizer.say("tell me about cells");
    for _ in 0..400 {
        if voice.started.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(voice.started.load(Ordering::SeqCst));

    assistant.stop();
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(assistant.mode(), AssistantMode::Idle);
    assert!(!audio.is_playing());
}
