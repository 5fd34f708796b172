//! Step controllers for the purchase funnel.
//!
//! Each step owns its local state and hands a value object to the next one on
//! advance. Nothing flows backwards: a step never reads or writes state that
//! belongs to a later step.

pub mod catalog;
pub mod checkout;
pub mod confirmation;
pub mod handoff;
pub mod quiz;
pub mod upsell;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use catalog::{CatalogHeadline, CatalogStep, CatalogSummary};
pub use checkout::{CheckoutError, CheckoutStep, SubmissionState, SubmissionTicket};
pub use confirmation::{ConfirmationStep, DELIVERY_WINDOW_DAYS};
pub use handoff::{CatalogHandoff, ConfirmationHandoff, QuizHandoff, UpsellHandoff};
pub use quiz::{OptionPrompt, QuestionPrompt, QuizStep};
pub use upsell::UpsellStep;

use crate::domain::quiz::QuizField;

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepError {
    #[error("quiz is incomplete; unanswered: {missing:?}")]
    QuizIncomplete { missing: Vec<QuizField> },
    #[error("select at least one product before continuing")]
    EmptyProductSelection,
}
