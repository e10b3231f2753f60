use std::sync::Arc;

use services::AppServices;
use services::speech::{RecognitionEvent, RecognitionSegment};
use services::testing::ScriptedRecognizer;
use studymate_core::model::{AssistantMode, Role};

use super::CommandResult;
use crate::console::{ConsoleAudio, ConsoleSynthesizer, Prompt};

/// Talk to the study coach by typing. Lines typed while listening build up
/// one utterance; a pause sends it. `/stop` pauses, `/start` resumes and
/// `/quit` leaves.
pub async fn coach(services: &AppServices) -> CommandResult {
    let recognizer = Arc::new(ScriptedRecognizer::new());
    let assistant = services.voice_assistant(
        recognizer.clone(),
        Arc::new(ConsoleAudio),
        Arc::new(ConsoleSynthesizer),
    );
    let user_id = services.user_id().as_str().to_string();
    let mut modes = assistant.subscribe();
    let mut prompt = Prompt::new();
    let mut heard = String::new();
    let mut paused = false;
    let mut shown_history = Vec::new();

    println!("Voice coach. Type what you would say, then pause to send it.");
    assistant.start(&user_id)?;

    loop {
        tokio::select! {
            line = prompt.line() => {
                let Some(line) = line? else { break };
                match line.as_str() {
                    "/quit" => break,
                    "/stop" => {
                        paused = true;
                        assistant.stop();
                    }
                    "/start" => {
                        paused = false;
                        if let Err(err) = assistant.start(&user_id) {
                            println!("! {err}");
                        }
                    }
                    "" => {}
                    text => {
                        if !heard.is_empty() {
                            heard.push(' ');
                        }
                        heard.push_str(text);
                        recognizer.emit(RecognitionEvent::new(vec![
                            RecognitionSegment::interim(heard.clone()),
                        ]));
                    }
                }
            }
            changed = modes.changed() => {
                if changed.is_err() {
                    break;
                }
                let mode = *modes.borrow_and_update();
                if mode != AssistantMode::Listening {
                    heard.clear();
                }
                if matches!(mode, AssistantMode::Speaking | AssistantMode::Idle) {
                    let history = assistant.history();
                    if history != shown_history {
                        if let Some(reply) = history.last().filter(|turn| turn.role == Role::Assistant) {
                            println!("coach: {}", reply.content);
                        }
                        shown_history = history;
                    }
                }
                match mode {
                    AssistantMode::Listening => println!("(listening)"),
                    AssistantMode::Thinking => println!("(thinking)"),
                    AssistantMode::Speaking => {}
                    AssistantMode::Error => {
                        let reason = assistant.last_error().unwrap_or_default();
                        println!("! assistant error: {reason}  (type /start to retry)");
                    }
                    AssistantMode::Idle if paused => println!("(paused)"),
                    AssistantMode::Idle => {
                        if assistant.start(&user_id).is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }

    assistant.stop();
    Ok(())
}
