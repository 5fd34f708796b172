use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use giftfunnel_core::audit::{AuditContext, AuditSink, FunnelRecord, SessionLog};
use giftfunnel_core::config::{AppConfig, LoadOptions};
use giftfunnel_core::domain::quiz::{Budget, Occasion, Recipient, Style};
use giftfunnel_core::flows::{FunnelContext, GiftFunnel};
use giftfunnel_core::referral::SimulatedReferralDispatcher;
use giftfunnel_core::steps::upsell::HEADLINE_ADD_ON;
use giftfunnel_core::steps::SubmissionState;
use giftfunnel_core::{
    AddOnId, ApplicationError, CardDetails, CatalogStep, CheckoutError, CheckoutStep,
    ConfirmationStep,
    FormField, FunnelEvent, FunnelNavigator, OrderId, OrderSubmitter, PaymentMethod, ProductId,
    QuizOption, QuizStep, ReferralDispatcher, ShareChannel, SimulatedOrderSubmitter,
    StaticCatalog, SubmissionError, UpsellStep,
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::commands::CommandResult;

const MAX_SUBMISSION_ATTEMPTS: usize = 2;
const SCRIPTED_PRODUCTS: [&str; 2] = ["1", "3"];
const REFERRAL_RECIPIENT: &str = "friend@example.com";

#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub fail_first: bool,
    pub skip_upsell: bool,
    pub payment: String,
}

#[derive(Debug, Serialize)]
struct StepReport {
    step: &'static str,
    detail: Value,
}

#[derive(Debug, Serialize)]
struct WalkReport {
    session_id: String,
    correlation_id: String,
    transitions: Vec<String>,
    steps: Vec<StepReport>,
    audit_event_count: usize,
}

pub fn run(options: WalkOptions) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("walk", "config", error.to_string(), 2),
    };
    let payment = match options.payment.parse::<PaymentMethod>() {
        Ok(payment) => payment,
        Err(message) => return CommandResult::failure("walk", "invalid_argument", message, 2),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "walk",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            )
        }
    };

    match runtime.block_on(walk(&config, &options, payment)) {
        Ok(report) => CommandResult::report("walk", &report),
        Err(error) => CommandResult::failure("walk", "walk_failed", format!("{error:#}"), 1),
    }
}

async fn walk(
    config: &AppConfig,
    options: &WalkOptions,
    payment: PaymentMethod,
) -> Result<WalkReport> {
    let session_id = Uuid::new_v4().to_string();
    let correlation_id = Uuid::new_v4().to_string();
    let audit = AuditContext::new(&session_id, &correlation_id, "cli.walk");
    let sink = SessionLog::default();
    let mut navigator = FunnelNavigator::new(GiftFunnel);
    let mut steps = Vec::new();

    navigator
        .dispatch(FunnelEvent::StartQuiz, &FunnelContext::default(), &sink, &audit)
        .context("starting the quiz")?;

    let mut quiz = QuizStep::new();
    for option in [
        QuizOption::Recipient(Recipient::Partner),
        QuizOption::Occasion(Occasion::Anniversary),
        QuizOption::Budget(Budget::From100To200),
        QuizOption::Style(Style::Minimalist),
    ] {
        quiz.answer(option);
    }
    let quiz_context = FunnelContext {
        missing_quiz_fields: quiz
            .answers()
            .missing_fields()
            .iter()
            .map(|field| field.as_str().to_string())
            .collect(),
        ..FunnelContext::default()
    };
    navigator
        .dispatch(FunnelEvent::QuizCompleted, &quiz_context, &sink, &audit)
        .context("leaving the quiz")?;
    let quiz_handoff = quiz.advance().context("collecting quiz answers")?;
    steps.push(StepReport {
        step: "quiz",
        detail: json!({ "answers": quiz_handoff.quiz_answers, "progress": quiz.progress() }),
    });

    let provider = StaticCatalog::reference();
    let mut catalog = CatalogStep::new(Some(quiz_handoff), &provider);
    for id in SCRIPTED_PRODUCTS {
        catalog.toggle_product(ProductId::new(id));
    }
    let catalog_context = FunnelContext {
        selected_product_count: catalog.selected().len(),
        ..FunnelContext::default()
    };
    navigator
        .dispatch(FunnelEvent::ProductsCommitted, &catalog_context, &sink, &audit)
        .context("leaving the catalog")?;
    let catalog_handoff = catalog.advance().context("committing product selection")?;
    steps.push(StepReport {
        step: "catalog",
        detail: json!({
            "headline": catalog.headline(),
            "selected": catalog_handoff.selected_product_ids.as_slice(),
            "summary": catalog.summary(),
        }),
    });

    let mut upsell = UpsellStep::new(Some(catalog_handoff), &provider);
    let (upsell_event, upsell_handoff) = if options.skip_upsell {
        (FunnelEvent::AddOnsSkipped, upsell.skip())
    } else {
        upsell.toggle_add_on(AddOnId::new(HEADLINE_ADD_ON));
        (FunnelEvent::AddOnsCommitted, upsell.advance())
    };
    navigator
        .dispatch(upsell_event, &FunnelContext::default(), &sink, &audit)
        .context("leaving the upsell")?;
    steps.push(StepReport {
        step: "upsell",
        detail: json!({
            "skipped": options.skip_upsell,
            "add_ons": upsell_handoff.selected_add_on_ids.as_slice(),
            "grand_total": upsell.grand_total(),
        }),
    });

    let mut checkout = CheckoutStep::new(Some(upsell_handoff), config.pricing.shipping_policy())
        .with_timeout(Duration::from_secs(config.submission.timeout_secs));
    for (field, value) in [
        (FormField::Email, "sam@example.com"),
        (FormField::FirstName, "Sam"),
        (FormField::LastName, "Rivers"),
        (FormField::Address, "12 Harbour Street"),
        (FormField::City, "Sydney"),
        (FormField::State, "NSW"),
        (FormField::Postcode, "2000"),
    ] {
        checkout.set_field(field, value);
    }
    checkout.set_payment_method(payment);
    if payment == PaymentMethod::Card {
        checkout.set_card_details(CardDetails::new("4242 4242 4242 4242", "12/29", "123"));
    }

    let mut simulated = SimulatedOrderSubmitter::from_config(&config.submission);
    if options.fail_first {
        simulated = simulated.with_failure(SubmissionError::Network {
            message: "payment gateway unreachable".to_string(),
        });
    }
    let submitter: Arc<dyn OrderSubmitter> = Arc::new(simulated);

    let mut failed_attempts = Vec::new();
    let mut attempt: u32 = 0;
    let confirmation_handoff = loop {
        attempt += 1;
        match checkout.submit(Arc::clone(&submitter)).await {
            Ok(handoff) => break handoff,
            Err(error) => {
                if let CheckoutError::Submission(cause) = &error {
                    sink.record(
                        &audit,
                        FunnelRecord::SubmissionFailed { attempt, error: cause.clone() },
                    );
                }
                let application = ApplicationError::from(error.clone());
                let retryable = application.is_retryable();
                let interface = application.into_interface(correlation_id.as_str());
                failed_attempts.push(json!({
                    "error": error.to_string(),
                    "user_message": interface.user_message(),
                    "retryable": retryable,
                }));
                if !retryable || failed_attempts.len() >= MAX_SUBMISSION_ATTEMPTS {
                    return Err(anyhow::Error::new(error).context("placing the order"));
                }
            }
        }
    };

    let order_placed = matches!(checkout.state(), SubmissionState::Submitted(_));
    let order_id = checkout_order_id(&checkout)?;
    let audit = audit.with_order(order_id.clone());
    sink.record(
        &audit,
        FunnelRecord::OrderPlaced {
            order_id: order_id.clone(),
            grand_total: confirmation_handoff.order_total,
            item_count: confirmation_handoff.order_item_count,
        },
    );
    navigator
        .dispatch(
            FunnelEvent::OrderPlaced,
            &FunnelContext { order_placed, ..FunnelContext::default() },
            &sink,
            &audit,
        )
        .context("moving to confirmation")?;
    steps.push(StepReport {
        step: "checkout",
        detail: json!({
            "payment_method": payment.as_str(),
            "order_summary": checkout.order_summary(),
            "totals": checkout.totals(),
            "failed_attempts": failed_attempts,
            "order_id": order_id,
        }),
    });
    checkout.teardown();

    let base_url = config.referral.parsed_base_url().context("parsing referral base url")?;
    let mut confirmation =
        ConfirmationStep::new(Some(confirmation_handoff), &base_url, &config.referral.code_prefix);
    let mut share_actions = BTreeMap::new();
    for channel in ShareChannel::ALL {
        let action = confirmation
            .share(channel)
            .with_context(|| format!("building {} share action", channel.as_str()))?;
        share_actions.insert(channel.as_str(), action);
    }
    let dispatcher: Arc<dyn ReferralDispatcher> =
        Arc::new(SimulatedReferralDispatcher::from_config(&config.referral));
    let receipt = confirmation
        .send_referral(REFERRAL_RECIPIENT, dispatcher)
        .await
        .context("sending referral")?;
    sink.record(&audit, FunnelRecord::ReferralSent { code: receipt.code });
    steps.push(StepReport {
        step: "confirmation",
        detail: json!({
            "order_number": confirmation.order_number(),
            "order_total": confirmation.order_total(),
            "item_count": confirmation.item_count(),
            "customer_email": confirmation.customer_email(),
            "delivery_window_days": confirmation.delivery_window(),
            "referral_code": confirmation.referral_code().as_str(),
            "share_url": confirmation.share_url().as_str(),
            "share_actions": share_actions,
            "referrals_sent": confirmation.sent_referrals().len(),
        }),
    });
    confirmation.teardown();

    let transitions = navigator
        .history()
        .iter()
        .map(|outcome| format!("{}->{}", outcome.from.as_str(), outcome.to.as_str()))
        .collect();

    tracing::info!(
        event_name = "cli.walk.completed",
        session_id = %session_id,
        order_id = %order_id,
        "scripted funnel walk completed"
    );

    Ok(WalkReport {
        session_id,
        correlation_id,
        transitions,
        steps,
        audit_event_count: sink.len(),
    })
}

fn checkout_order_id(checkout: &CheckoutStep) -> Result<OrderId> {
    match checkout.state() {
        SubmissionState::Submitted(order) => Ok(order.order_id.clone()),
        other => anyhow::bail!("checkout finished without a placed order: {other:?}"),
    }
}
