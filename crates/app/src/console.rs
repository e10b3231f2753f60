//! Terminal stand-ins for the speech devices, plus line input.

use std::io::{self, Write};

use services::SpeechError;
use services::speech::{AudioOutput, NativeSynthesizer, PlaybackDone, Voice};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::oneshot;

fn finished() -> PlaybackDone {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(());
    rx
}

/// A terminal cannot play audio clips; it acknowledges them instead.
pub struct ConsoleAudio;

impl AudioOutput for ConsoleAudio {
    fn play(&self, audio: Vec<u8>) -> Result<PlaybackDone, SpeechError> {
        println!("  (voice reply, {} bytes of audio)", audio.len());
        Ok(finished())
    }

    fn stop(&self) {}
}

/// Prints what a native voice would say.
pub struct ConsoleSynthesizer;

impl NativeSynthesizer for ConsoleSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        vec![Voice {
            name: "terminal".into(),
            lang: "en".into(),
        }]
    }

    fn speak(&self, text: &str, _voice: Option<&Voice>) -> Result<PlaybackDone, SpeechError> {
        println!("  coach says: {text}");
        Ok(finished())
    }

    fn cancel(&self) {}
}

/// Line-oriented stdin reader.
pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Next input line, trimmed. `None` at end of input.
    pub async fn line(&mut self) -> io::Result<Option<String>> {
        Ok(self.lines.next_line().await?.map(|line| line.trim().to_string()))
    }

    /// Print `question` and wait for an answer.
    pub async fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        print!("{question} ");
        io::stdout().flush()?;
        self.line().await
    }
}
