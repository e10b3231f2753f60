use std::sync::{Arc, Mutex, PoisonError};

use studymate_core::model::PracticeLink;
use tokio::task::JoinHandle;

/// Steps of the quiz wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WizardStep {
    #[default]
    Upload,
    Configure,
    Active,
    Results,
}

impl WizardStep {
    /// 1-based position shown in the step indicator.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            WizardStep::Upload => 1,
            WizardStep::Configure => 2,
            WizardStep::Active => 3,
            WizardStep::Results => 4,
        }
    }
}

/// A blocking alert the front end must show before continuing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    UploadFailed,
    NoRelevantInfo,
    DailyLimitReached,
    GenerationFailed,
    LibraryUnavailable,
}

impl Notice {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Notice::UploadFailed => "Failed to upload PDF. Please try again.",
            Notice::NoRelevantInfo => "The AI couldn't find relevant info for this topic.",
            Notice::DailyLimitReached => "Daily limit reached. Please try again tomorrow.",
            Notice::GenerationFailed => "Error generating quiz.",
            Notice::LibraryUnavailable => "Could not load your library.",
        }
    }
}

/// A practice request handed over by navigation, consumed at most once.
///
/// Clones share the slot, so a controller that is rebuilt with the same
/// navigation state does not start the quiz again.
#[derive(Clone, Debug, Default)]
pub struct PendingPractice {
    slot: Arc<Mutex<Option<PracticeLink>>>,
}

impl PendingPractice {
    #[must_use]
    pub fn new(link: Option<PracticeLink>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(link)),
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Take the request; later calls return `None`.
    #[must_use]
    pub fn take(&self) -> Option<PracticeLink> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Background save of a submitted quiz.
///
/// The score is final before this exists. Waiting is only useful for
/// front ends that want to report the save; dropping it lets the save
/// finish on its own.
#[derive(Debug)]
pub struct PendingSave {
    handle: JoinHandle<bool>,
}

impl PendingSave {
    pub(crate) fn new(handle: JoinHandle<bool>) -> Self {
        Self { handle }
    }

    /// `true` if the result reached the backend.
    pub async fn saved(self) -> bool {
        self.handle.await.unwrap_or(false)
    }
}
