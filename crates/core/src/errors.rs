use thiserror::Error;

use crate::flows::FunnelTransitionError;
use crate::lifecycle::ScopeError;
use crate::referral::ReferralError;
use crate::steps::checkout::CheckoutError;
use crate::steps::StepError;
use crate::submission::SubmissionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    FunnelTransition(#[from] FunnelTransitionError),
    #[error(transparent)]
    Step(#[from] StepError),
    #[error("checkout form is missing required fields: {missing_fields:?}")]
    MissingCheckoutFields { missing_fields: Vec<String> },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Referral(#[from] ReferralError),
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<CheckoutError> for ApplicationError {
    fn from(value: CheckoutError) -> Self {
        match value {
            CheckoutError::EmptyOrder => {
                Self::Domain(DomainError::Step(StepError::EmptyProductSelection))
            }
            CheckoutError::Validation { missing_fields } => {
                Self::Domain(DomainError::MissingCheckoutFields { missing_fields })
            }
            CheckoutError::Submission(error) => Self::Submission(error),
            CheckoutError::Scope(error) => Self::Scope(error),
            other @ (CheckoutError::AlreadySubmitting { .. }
            | CheckoutError::AlreadySubmitted { .. }
            | CheckoutError::StaleSubmission { .. }) => {
                Self::Domain(DomainError::InvariantViolation(other.to_string()))
            }
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "Some details are missing or invalid. Check them and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "We couldn't reach the payment service. Your selections are saved; please retry."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }

    /// Whether the shopper can simply try the same action again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Submission(_) | Self::Referral(ReferralError::Dispatch(_)))
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let unassigned = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id: unassigned }
            }
            ApplicationError::Referral(ReferralError::InvalidRecipient) => Self::BadRequest {
                message: ReferralError::InvalidRecipient.to_string(),
                correlation_id: unassigned,
            },
            ApplicationError::Submission(error) => {
                Self::ServiceUnavailable { message: error.to_string(), correlation_id: unassigned }
            }
            ApplicationError::Referral(error) => {
                Self::ServiceUnavailable { message: error.to_string(), correlation_id: unassigned }
            }
            ApplicationError::Scope(error) => {
                Self::Internal { message: error.to_string(), correlation_id: unassigned }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: unassigned }
            }
        }
    }
}
