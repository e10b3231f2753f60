//! Live ingestion progress pushed by the backend while an upload is processed.
//!
//! The channel is best effort. Nothing here reports errors to the caller;
//! failures are logged and the feed simply stops updating.

use std::sync::Arc;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// One progress update from the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub current: u32,
    pub total: u32,
    pub status: String,
    pub percentage: u8,
}

impl UploadProgress {
    /// Decode one socket frame, clamping the percentage to 0..=100.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the frame is not a progress message.
    pub fn from_frame(frame: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Raw {
            current: u32,
            total: u32,
            #[serde(default)]
            status: String,
            percentage: i64,
        }
        let raw: Raw = serde_json::from_str(frame)?;
        let percentage = u8::try_from(raw.percentage.clamp(0, 100)).unwrap_or(100);
        Ok(Self {
            current: raw.current,
            total: raw.total,
            status: raw.status,
            percentage,
        })
    }
}

/// Latest progress, observable by any number of readers.
#[derive(Clone, Debug)]
pub struct ProgressFeed {
    tx: Arc<watch::Sender<Option<UploadProgress>>>,
}

impl ProgressFeed {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<UploadProgress>> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn latest(&self) -> Option<UploadProgress> {
        self.tx.borrow().clone()
    }

    pub fn publish(&self, progress: UploadProgress) {
        self.tx.send_replace(Some(progress));
    }

    pub fn reset(&self) {
        self.tx.send_replace(None);
    }
}

impl Default for ProgressFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Background reader of the progress socket. Dropping it closes the socket.
#[derive(Debug)]
pub struct ProgressSubscription {
    task: JoinHandle<()>,
}

impl ProgressSubscription {
    /// Open `url` in a background task and publish every update to `feed`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn connect(url: String, feed: ProgressFeed) -> Self {
        let task = tokio::spawn(async move {
            let (mut socket, _) = match connect_async(url.as_str()).await {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(%url, error = %err, "progress channel unavailable");
                    return;
                }
            };
            debug!(%url, "progress channel connected");
            while let Some(frame) = socket.next().await {
                match frame {
                    Ok(Message::Text(text)) => match UploadProgress::from_frame(&text) {
                        Ok(progress) => feed.publish(progress),
                        Err(err) => warn!(error = %err, "ignoring malformed progress frame"),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "progress channel closed with error");
                        break;
                    }
                }
            }
        });
        Self { task }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_decode_and_clamp() {
        let progress =
            UploadProgress::from_frame(r#"{"current":3,"total":4,"status":"Embedding","percentage":75}"#)
                .unwrap();
        assert_eq!(progress.percentage, 75);
        assert_eq!(progress.status, "Embedding");

        let over = UploadProgress::from_frame(r#"{"current":5,"total":4,"percentage":125}"#).unwrap();
        assert_eq!(over.percentage, 100);

        assert!(UploadProgress::from_frame("ping").is_err());
    }

    #[test]
    fn feed_keeps_the_latest_update() {
        let feed = ProgressFeed::new();
        let rx = feed.subscribe();
        assert!(feed.latest().is_none());

        feed.publish(UploadProgress {
            current: 1,
            total: 2,
            status: "Chunking".into(),
            percentage: 50,
        });
        assert_eq!(rx.borrow().as_ref().map(|p| p.percentage), Some(50));

        feed.reset();
        assert!(feed.latest().is_none());
    }

    #[tokio::test]
    async fn unreachable_socket_finishes_quietly() {
        let feed = ProgressFeed::new();
        let subscription = ProgressSubscription::connect("ws://127.0.0.1:9/ws/user_1".into(), feed.clone());
        for _ in 0..100 {
            if subscription.is_finished() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(subscription.is_finished());
        assert!(feed.latest().is_none());
    }
}
