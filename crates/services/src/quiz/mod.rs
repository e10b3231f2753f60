//! The quiz wizard: upload, configure, take the quiz, review results.

mod controller;
mod state;

pub use controller::QuizSessionController;
pub use state::{Notice, PendingPractice, PendingSave, WizardStep};
