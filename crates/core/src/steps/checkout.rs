use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::add_on::{AddOn, AddOnId};
use crate::domain::order::{CardDetails, CheckoutForm, FormField, Order, OrderId, PaymentMethod};
use crate::domain::product::{Product, ProductId};
use crate::lifecycle::{ScopeError, StepScope};
use crate::pricing::{
    has_priced_products, order_lines, OrderLine, PricingSnapshot, SelectionSet, ShippingPolicy,
};
use crate::steps::handoff::{ConfirmationHandoff, UpsellHandoff};
use crate::submission::{OrderRequest, OrderSubmitter, SubmissionError};

const DEFAULT_SUBMISSION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("no selected product is available to order")]
    EmptyOrder,
    #[error("missing required checkout fields: {missing_fields:?}")]
    Validation { missing_fields: Vec<String> },
    #[error("submission attempt {attempt} is still in flight")]
    AlreadySubmitting { attempt: u32 },
    #[error("order {order_id} has already been placed")]
    AlreadySubmitted { order_id: OrderId },
    #[error(transparent)]
    Submission(SubmissionError),
    #[error("result for submission attempt {attempt} arrived after it was superseded")]
    StaleSubmission { attempt: u32 },
    #[error(transparent)]
    Scope(ScopeError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionState {
    Idle { last_error: Option<CheckoutError> },
    Submitting { attempt: u32 },
    Submitted(Order),
}

impl Default for SubmissionState {
    fn default() -> Self {
        Self::Idle { last_error: None }
    }
}

/// Proof that a submission was started. Completing with a ticket whose attempt
/// or scope generation no longer matches is rejected as stale.
#[derive(Clone, Debug)]
pub struct SubmissionTicket {
    attempt: u32,
    generation: u64,
    request: OrderRequest,
}

impl SubmissionTicket {
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> &OrderRequest {
        &self.request
    }
}

pub struct CheckoutStep {
    selected_products: SelectionSet<ProductId>,
    catalog: Vec<Product>,
    selected_add_ons: SelectionSet<AddOnId>,
    add_on_catalog: Vec<AddOn>,
    policy: ShippingPolicy,
    form: CheckoutForm,
    payment_method: PaymentMethod,
    card: Option<CardDetails>,
    state: SubmissionState,
    attempts: u32,
    timeout: Duration,
    scope: StepScope,
}

impl CheckoutStep {
    pub fn new(handoff: Option<UpsellHandoff>, policy: ShippingPolicy) -> Self {
        let UpsellHandoff { selected_product_ids, catalog, selected_add_on_ids, add_on_catalog } =
            handoff.unwrap_or_default();
        Self {
            selected_products: selected_product_ids,
            catalog,
            selected_add_ons: selected_add_on_ids,
            add_on_catalog,
            policy,
            form: CheckoutForm::default(),
            payment_method: PaymentMethod::default(),
            card: None,
            state: SubmissionState::default(),
            attempts: 0,
            timeout: DEFAULT_SUBMISSION_TIMEOUT,
            scope: StepScope::new("checkout"),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn form(&self) -> &CheckoutForm {
        &self.form
    }

    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        self.form.set(field, value);
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    pub fn set_card_details(&mut self, card: CardDetails) {
        self.card = Some(card);
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn is_mounted(&self) -> bool {
        self.scope.is_mounted()
    }

    pub fn selected_products(&self) -> &SelectionSet<ProductId> {
        &self.selected_products
    }

    pub fn selected_add_ons(&self) -> &SelectionSet<AddOnId> {
        &self.selected_add_ons
    }

    pub fn totals(&self) -> PricingSnapshot {
        PricingSnapshot::compute(
            &self.selected_products,
            &self.catalog,
            &self.selected_add_ons,
            &self.add_on_catalog,
            &self.policy,
        )
    }

    pub fn order_summary(&self) -> Vec<OrderLine> {
        order_lines(
            &self.selected_products,
            &self.catalog,
            &self.selected_add_ons,
            &self.add_on_catalog,
        )
    }

    pub fn item_count(&self) -> u32 {
        let count = self.selected_products.len() + self.selected_add_ons.len();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Required form fields that are blank, followed by card fields when paying
    /// by card.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing: Vec<String> =
            self.form.missing_required().iter().map(|field| field.as_str().to_string()).collect();

        if self.payment_method == PaymentMethod::Card {
            match &self.card {
                Some(card) => missing.extend(card.missing_fields().into_iter().map(str::to_string)),
                None => missing.extend(
                    ["card_number", "card_expiry", "card_cvc"].into_iter().map(str::to_string),
                ),
            }
        }

        missing
    }

    pub fn validate(&self) -> Result<(), CheckoutError> {
        let missing_fields = self.missing_fields();
        if missing_fields.is_empty() {
            Ok(())
        } else {
            Err(CheckoutError::Validation { missing_fields })
        }
    }

    pub fn begin_submission(&mut self) -> Result<SubmissionTicket, CheckoutError> {
        match &self.state {
            SubmissionState::Submitting { attempt } => {
                return Err(CheckoutError::AlreadySubmitting { attempt: *attempt });
            }
            SubmissionState::Submitted(order) => {
                return Err(CheckoutError::AlreadySubmitted { order_id: order.order_id.clone() });
            }
            SubmissionState::Idle { .. } => {}
        }

        if !self.scope.is_mounted() {
            return Err(CheckoutError::Scope(ScopeError::Unmounted { step: self.scope.step() }));
        }

        if !has_priced_products(&self.selected_products, &self.catalog) {
            self.state = SubmissionState::Idle { last_error: Some(CheckoutError::EmptyOrder) };
            return Err(CheckoutError::EmptyOrder);
        }

        if let Err(error) = self.validate() {
            self.state = SubmissionState::Idle { last_error: Some(error.clone()) };
            return Err(error);
        }

        self.attempts += 1;
        let attempt = self.attempts;
        let request = OrderRequest {
            totals: self.totals(),
            item_count: self.item_count(),
            contact: self.form.clone(),
            payment_method: self.payment_method,
            card: match self.payment_method {
                PaymentMethod::Card => self.card.clone(),
                PaymentMethod::ApplePay | PaymentMethod::Afterpay => None,
            },
            product_ids: self.selected_products.as_slice().to_vec(),
            add_on_ids: self.selected_add_ons.as_slice().to_vec(),
        };
        self.state = SubmissionState::Submitting { attempt };

        info!(
            event_name = "funnel.checkout.submission_started",
            attempt,
            item_count = request.item_count,
            grand_total = %request.totals.grand_total(),
            payment_method = request.payment_method.as_str(),
            "order submission started"
        );

        Ok(SubmissionTicket { attempt, generation: self.scope.generation(), request })
    }

    /// Applies a submitter result. Results for a torn-down step, a cancelled
    /// attempt, or a superseded attempt leave the step untouched.
    pub fn complete_submission(
        &mut self,
        ticket: &SubmissionTicket,
        result: Result<Order, SubmissionError>,
    ) -> Result<ConfirmationHandoff, CheckoutError> {
        let current = matches!(
            self.state,
            SubmissionState::Submitting { attempt } if attempt == ticket.attempt
        );
        if !self.scope.is_mounted() || ticket.generation != self.scope.generation() || !current {
            warn!(
                event_name = "funnel.checkout.stale_result_dropped",
                attempt = ticket.attempt,
                "dropping submission result for a superseded attempt"
            );
            return Err(CheckoutError::StaleSubmission { attempt: ticket.attempt });
        }

        match result {
            Ok(order) => {
                info!(
                    event_name = "funnel.checkout.order_placed",
                    attempt = ticket.attempt,
                    order_id = %order.order_id,
                    grand_total = %order.grand_total(),
                    "order placed"
                );
                self.state = SubmissionState::Submitted(order.clone());
                Ok(ConfirmationHandoff::from(order))
            }
            Err(error) => {
                warn!(
                    event_name = "funnel.checkout.submission_failed",
                    attempt = ticket.attempt,
                    error = %error,
                    "order submission failed; selections kept for retry"
                );
                let failure = CheckoutError::Submission(error);
                self.state = SubmissionState::Idle { last_error: Some(failure.clone()) };
                Err(failure)
            }
        }
    }

    /// Begins a submission, runs it inside this step's scope bounded by the
    /// configured timeout, and applies the result.
    pub async fn submit(
        &mut self,
        submitter: Arc<dyn OrderSubmitter>,
    ) -> Result<ConfirmationHandoff, CheckoutError> {
        let ticket = self.begin_submission()?;
        let request = ticket.request.clone();
        let timeout = self.timeout;
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        let spawned = self.scope.spawn(async move {
            tokio::time::timeout(timeout, submitter.submit(request))
                .await
                .unwrap_or_else(|_| Err(SubmissionError::Timeout { timeout_ms }))
        });
        let task = match spawned {
            Ok(task) => task,
            Err(error) => {
                self.state = SubmissionState::Idle { last_error: None };
                return Err(CheckoutError::Scope(error));
            }
        };

        let mut in_flight = InFlight { step: self, armed: true };
        let result = match in_flight.step.scope.join(task).await {
            Ok(result) => result,
            Err(ScopeError::Aborted { .. }) => Err(SubmissionError::Cancelled),
            Err(error) => Err(SubmissionError::Network { message: error.to_string() }),
        };
        in_flight.armed = false;

        in_flight.step.complete_submission(&ticket, result)
    }

    /// Abandons the in-flight attempt. Returns false when nothing was in flight.
    pub fn cancel_submission(&mut self) -> bool {
        if !matches!(self.state, SubmissionState::Submitting { .. }) {
            return false;
        }
        self.scope.cancel_pending();
        self.state = SubmissionState::Idle {
            last_error: Some(CheckoutError::Submission(SubmissionError::Cancelled)),
        };
        true
    }

    pub fn teardown(&mut self) {
        self.cancel_submission();
        self.scope.teardown();
    }
}

/// Held across the await in [`CheckoutStep::submit`]. Dropping the submit
/// future while armed aborts the attempt and returns the step to `Idle`.
struct InFlight<'a> {
    step: &'a mut CheckoutStep,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed && self.step.cancel_submission() {
            warn!(
                event_name = "funnel.checkout.submission_abandoned",
                "submit future dropped before the submitter resolved"
            );
        }
    }
}
