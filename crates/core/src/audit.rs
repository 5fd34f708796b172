use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::OrderId;
use crate::flows::states::{FunnelEvent, FunnelStep};
use crate::referral::ReferralCode;
use crate::submission::SubmissionError;

/// Something worth keeping a record of in a shopper's session. Each variant
/// carries the typed facts of the occurrence rather than free-form metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FunnelRecord {
    TransitionApplied { from: FunnelStep, to: FunnelStep, event: FunnelEvent },
    TransitionRejected { from: FunnelStep, event: FunnelEvent, reason: String },
    SubmissionFailed { attempt: u32, error: SubmissionError },
    OrderPlaced { order_id: OrderId, grand_total: Decimal, item_count: u32 },
    ReferralSent { code: ReferralCode },
}

impl FunnelRecord {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TransitionApplied { .. } => "funnel.transition_applied",
            Self::TransitionRejected { .. } => "funnel.transition_rejected",
            Self::SubmissionFailed { .. } => "checkout.submission_failed",
            Self::OrderPlaced { .. } => "checkout.order_placed",
            Self::ReferralSent { .. } => "referral.sent",
        }
    }

    /// The step the shopper was on when this happened.
    pub fn step(&self) -> FunnelStep {
        match self {
            Self::TransitionApplied { from, .. } | Self::TransitionRejected { from, .. } => *from,
            Self::SubmissionFailed { .. } | Self::OrderPlaced { .. } => FunnelStep::Checkout,
            Self::ReferralSent { .. } => FunnelStep::Confirmation,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::TransitionRejected { .. } | Self::SubmissionFailed { .. })
    }
}

/// Correlation fields shared by every record emitted for one shopper session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub session_id: String,
    pub order_id: Option<OrderId>,
    pub correlation_id: String,
    pub actor: String,
}

impl AuditContext {
    pub fn new(
        session_id: impl Into<String>,
        correlation_id: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            order_id: None,
            correlation_id: correlation_id.into(),
            actor: actor.into(),
        }
    }

    pub fn with_order(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn stamp(&self, record: FunnelRecord) -> AuditEvent {
        AuditEvent {
            event_id: Uuid::new_v4(),
            context: self.clone(),
            record,
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    #[serde(flatten)]
    pub context: AuditContext,
    pub record: FunnelRecord,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn name(&self) -> &'static str {
        self.record.name()
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);

    fn record(&self, context: &AuditContext, record: FunnelRecord) {
        self.emit(context.stamp(record));
    }
}

/// Keeps a session's records in memory, in emission order.
#[derive(Clone, Default)]
pub struct SessionLog {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl SessionLog {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.with_events(|events| events.to_vec())
    }

    pub fn len(&self) -> usize {
        self.with_events(|events| events.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn failures(&self) -> usize {
        self.with_events(|events| events.iter().filter(|event| event.record.is_failure()).count())
    }

    fn with_events<T>(&self, read: impl FnOnce(&[AuditEvent]) -> T) -> T {
        match self.events.lock() {
            Ok(events) => read(&events),
            Err(poisoned) => read(&poisoned.into_inner()),
        }
    }
}

impl AuditSink for SessionLog {
    fn emit(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
