use thiserror::Error;
use tracing::debug;

use crate::audit::{AuditContext, AuditSink, FunnelRecord};
use crate::flows::states::{FunnelAction, FunnelContext, FunnelEvent, FunnelStep, TransitionOutcome};

pub trait FunnelDefinition {
    fn initial_step(&self) -> FunnelStep;
    fn transition(
        &self,
        current: FunnelStep,
        event: &FunnelEvent,
        context: &FunnelContext,
    ) -> Result<TransitionOutcome, FunnelTransitionError>;
}

/// Landing, quiz, catalog, upsell, checkout, confirmation, strictly forward
/// apart from explicit back requests and restarts.
#[derive(Clone, Debug, Default)]
pub struct GiftFunnel;

impl FunnelDefinition for GiftFunnel {
    fn initial_step(&self) -> FunnelStep {
        FunnelStep::Landing
    }

    fn transition(
        &self,
        current: FunnelStep,
        event: &FunnelEvent,
        context: &FunnelContext,
    ) -> Result<TransitionOutcome, FunnelTransitionError> {
        transition_gift_funnel(current, event, context)
    }
}

pub struct FunnelEngine<F> {
    funnel: F,
}

impl<F> FunnelEngine<F>
where
    F: FunnelDefinition,
{
    pub fn new(funnel: F) -> Self {
        Self { funnel }
    }

    pub fn initial_step(&self) -> FunnelStep {
        self.funnel.initial_step()
    }

    pub fn apply(
        &self,
        current: FunnelStep,
        event: &FunnelEvent,
        context: &FunnelContext,
    ) -> Result<TransitionOutcome, FunnelTransitionError> {
        self.funnel.transition(current, event, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: FunnelStep,
        event: &FunnelEvent,
        context: &FunnelContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FunnelTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        let record = match &result {
            Ok(outcome) => FunnelRecord::TransitionApplied {
                from: outcome.from,
                to: outcome.to,
                event: outcome.event.clone(),
            },
            Err(error) => FunnelRecord::TransitionRejected {
                from: current,
                event: event.clone(),
                reason: error.to_string(),
            },
        };
        sink.record(audit, record);
        result
    }
}

impl Default for FunnelEngine<GiftFunnel> {
    fn default() -> Self {
        Self::new(GiftFunnel)
    }
}

/// Tracks which step a session is on and moves it through the engine.
pub struct FunnelNavigator<F> {
    engine: FunnelEngine<F>,
    current: FunnelStep,
    history: Vec<TransitionOutcome>,
}

impl<F> FunnelNavigator<F>
where
    F: FunnelDefinition,
{
    pub fn new(funnel: F) -> Self {
        let engine = FunnelEngine::new(funnel);
        let current = engine.initial_step();
        Self { engine, current, history: Vec::new() }
    }

    pub fn current(&self) -> FunnelStep {
        self.current
    }

    pub fn history(&self) -> &[TransitionOutcome] {
        &self.history
    }

    pub fn dispatch<S>(
        &mut self,
        event: FunnelEvent,
        context: &FunnelContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FunnelTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let outcome = self.engine.apply_with_audit(self.current, &event, context, sink, audit)?;
        debug!(
            event_name = "funnel.navigation.moved",
            session_id = %audit.session_id,
            from = outcome.from.as_str(),
            to = outcome.to.as_str(),
            "funnel step changed"
        );
        self.current = outcome.to;
        self.history.push(outcome.clone());
        Ok(outcome)
    }
}

impl Default for FunnelNavigator<GiftFunnel> {
    fn default() -> Self {
        Self::new(GiftFunnel)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FunnelTransitionError {
    #[error("quiz is missing answers before leaving {step:?}: {missing_fields:?}")]
    MissingQuizAnswers { step: FunnelStep, missing_fields: Vec<String> },
    #[error("at least one product must be selected before leaving {step:?}")]
    EmptyProductSelection { step: FunnelStep },
    #[error("no order has been placed yet")]
    OrderNotPlaced,
    #[error("invalid transition from {step:?} using event {event:?}")]
    InvalidTransition { step: FunnelStep, event: FunnelEvent },
}

fn transition_gift_funnel(
    current: FunnelStep,
    event: &FunnelEvent,
    context: &FunnelContext,
) -> Result<TransitionOutcome, FunnelTransitionError> {
    use FunnelAction::{
        CarryAddOnSelection, CarryProductSelection, CarryQuizAnswers, DiscardDownstreamState,
        FreezeOrderTotals, ShowStep, TearDownStep,
    };
    use FunnelEvent::{
        AddOnsCommitted, AddOnsSkipped, BackRequested, BrowseCatalog, OrderPlaced,
        ProductsCommitted, QuizCompleted, Restart, StartQuiz,
    };
    use FunnelStep::{Catalog, Checkout, Confirmation, Landing, Quiz, Upsell};

    let invalid =
        || FunnelTransitionError::InvalidTransition { step: current, event: event.clone() };

    let (to, actions) = match (current, event) {
        (Landing, StartQuiz) => (Quiz, vec![ShowStep(Quiz)]),
        (Landing, BrowseCatalog) => (Catalog, vec![ShowStep(Catalog)]),
        (Quiz, QuizCompleted) => {
            if !context.missing_quiz_fields.is_empty() {
                return Err(FunnelTransitionError::MissingQuizAnswers {
                    step: current,
                    missing_fields: context.missing_quiz_fields.clone(),
                });
            }
            (Catalog, vec![CarryQuizAnswers, ShowStep(Catalog)])
        }
        (Catalog, ProductsCommitted) => {
            if context.selected_product_count == 0 {
                return Err(FunnelTransitionError::EmptyProductSelection { step: current });
            }
            (Upsell, vec![CarryProductSelection, ShowStep(Upsell)])
        }
        (Upsell, AddOnsCommitted) | (Upsell, AddOnsSkipped) => {
            (Checkout, vec![CarryAddOnSelection, ShowStep(Checkout)])
        }
        (Checkout, OrderPlaced) => {
            if !context.order_placed {
                return Err(FunnelTransitionError::OrderNotPlaced);
            }
            (Confirmation, vec![FreezeOrderTotals, TearDownStep(Checkout), ShowStep(Confirmation)])
        }
        (_, BackRequested) => {
            let previous = current.previous().ok_or_else(invalid)?;
            (previous, vec![TearDownStep(current), DiscardDownstreamState, ShowStep(previous)])
        }
        (Landing, Restart) => return Err(invalid()),
        (_, Restart) => {
            (Landing, vec![TearDownStep(current), DiscardDownstreamState, ShowStep(Landing)])
        }
        _ => return Err(invalid()),
    };

    Ok(TransitionOutcome { from: current, to, event: event.clone(), actions })
}

#[cfg(test)]
mod tests {
    use crate::audit::{AuditContext, FunnelRecord, SessionLog};
    use crate::flows::engine::{FunnelEngine, FunnelNavigator, FunnelTransitionError};
    use crate::flows::states::{FunnelAction, FunnelContext, FunnelEvent, FunnelStep};

    fn ready() -> FunnelContext {
        FunnelContext {
            missing_quiz_fields: Vec::new(),
            selected_product_count: 2,
            order_placed: true,
        }
    }

    #[test]
    fn happy_path_walks_every_step_in_order() {
        let engine = FunnelEngine::default();
        let mut step = engine.initial_step();
        let events = [
            FunnelEvent::StartQuiz,
            FunnelEvent::QuizCompleted,
            FunnelEvent::ProductsCommitted,
            FunnelEvent::AddOnsSkipped,
            FunnelEvent::OrderPlaced,
        ];

        let mut visited = vec![step];
        for event in &events {
            step = engine.apply(step, event, &ready()).expect("forward transition").to;
            visited.push(step);
        }

        assert_eq!(
            visited,
            vec![
                FunnelStep::Landing,
                FunnelStep::Quiz,
                FunnelStep::Catalog,
                FunnelStep::Upsell,
                FunnelStep::Checkout,
                FunnelStep::Confirmation,
            ]
        );
    }

    #[test]
    fn incomplete_quiz_blocks_catalog() {
        let engine = FunnelEngine::default();
        let context = FunnelContext {
            missing_quiz_fields: vec!["budget".to_owned(), "style".to_owned()],
            ..FunnelContext::default()
        };
        let error = engine
            .apply(FunnelStep::Quiz, &FunnelEvent::QuizCompleted, &context)
            .expect_err("missing answers must block");

        assert!(matches!(
            error,
            FunnelTransitionError::MissingQuizAnswers { ref missing_fields, .. }
                if missing_fields.len() == 2
        ));
    }

    #[test]
    fn empty_catalog_selection_blocks_upsell() {
        let engine = FunnelEngine::default();
        let error = engine
            .apply(FunnelStep::Catalog, &FunnelEvent::ProductsCommitted, &FunnelContext::default())
            .expect_err("empty selection must block");
        assert_eq!(
            error,
            FunnelTransitionError::EmptyProductSelection { step: FunnelStep::Catalog }
        );
    }

    #[test]
    fn skipping_steps_is_rejected() {
        let engine = FunnelEngine::default();
        let error = engine
            .apply(FunnelStep::Catalog, &FunnelEvent::OrderPlaced, &ready())
            .expect_err("catalog cannot jump to confirmation");
        assert!(matches!(error, FunnelTransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn back_discards_downstream_state_but_not_after_confirmation() {
        let engine = FunnelEngine::default();
        let outcome = engine
            .apply(FunnelStep::Upsell, &FunnelEvent::BackRequested, &FunnelContext::default())
            .expect("upsell -> catalog");
        assert_eq!(outcome.to, FunnelStep::Catalog);
        assert!(outcome.actions.contains(&FunnelAction::DiscardDownstreamState));
        assert!(outcome.actions.contains(&FunnelAction::TearDownStep(FunnelStep::Upsell)));

        assert!(engine
            .apply(FunnelStep::Confirmation, &FunnelEvent::BackRequested, &FunnelContext::default())
            .is_err());
    }

    #[test]
    fn navigator_records_history_and_audits_rejections() {
        let sink = SessionLog::default();
        let audit = AuditContext::new("session-1", "req-1", "shopper");
        let mut navigator = FunnelNavigator::default();

        navigator
            .dispatch(FunnelEvent::StartQuiz, &FunnelContext::default(), &sink, &audit)
            .expect("landing -> quiz");
        let rejected = navigator.dispatch(
            FunnelEvent::QuizCompleted,
            &FunnelContext {
                missing_quiz_fields: vec!["style".to_owned()],
                ..FunnelContext::default()
            },
            &sink,
            &audit,
        );

        assert!(rejected.is_err());
        assert_eq!(navigator.current(), FunnelStep::Quiz);
        assert_eq!(navigator.history().len(), 1);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name(), "funnel.transition_applied");
        assert!(matches!(
            events[1].record,
            FunnelRecord::TransitionRejected { from: FunnelStep::Quiz, .. }
        ));
        assert_eq!(events[1].context.session_id, "session-1");
    }

    #[test]
    fn restart_returns_to_landing_from_confirmation() {
        let engine = FunnelEngine::default();
        let outcome = engine
            .apply(FunnelStep::Confirmation, &FunnelEvent::Restart, &FunnelContext::default())
            .expect("restart");
        assert_eq!(outcome.to, FunnelStep::Landing);
    }
}
