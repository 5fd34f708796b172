use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SubmissionConfig;
use crate::domain::add_on::AddOnId;
use crate::domain::order::{CardDetails, CheckoutForm, Order, OrderId, PaymentMethod};
use crate::domain::product::ProductId;
use crate::pricing::PricingSnapshot;

/// Everything the checkout step hands to a submitter. Built once per attempt;
/// the totals are already frozen.
#[derive(Clone, Debug)]
pub struct OrderRequest {
    pub totals: PricingSnapshot,
    pub item_count: u32,
    pub contact: CheckoutForm,
    pub payment_method: PaymentMethod,
    pub card: Option<CardDetails>,
    pub product_ids: Vec<ProductId>,
    pub add_on_ids: Vec<AddOnId>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionError {
    #[error("order submission failed to reach the payment service: {message}")]
    Network { message: String },
    #[error("order submission was rejected: {reason}")]
    Rejected { reason: String },
    #[error("order submission timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("order submission was cancelled")]
    Cancelled,
}

#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    async fn submit(&self, request: OrderRequest) -> Result<Order, SubmissionError>;
}

/// Stands in for a payment backend: waits for a fixed latency, then places the
/// order. Failures can be queued up front to exercise retry paths.
pub struct SimulatedOrderSubmitter {
    latency: Duration,
    order_id_prefix: String,
    scripted_failures: Mutex<VecDeque<SubmissionError>>,
}

impl SimulatedOrderSubmitter {
    pub fn new(latency: Duration, order_id_prefix: impl Into<String>) -> Self {
        Self {
            latency,
            order_id_prefix: order_id_prefix.into(),
            scripted_failures: Mutex::new(VecDeque::new()),
        }
    }

    pub fn from_config(config: &SubmissionConfig) -> Self {
        Self::new(Duration::from_millis(config.simulated_latency_ms), &config.order_id_prefix)
    }

    /// Queues a failure for the next unanswered attempt.
    pub fn with_failure(self, error: SubmissionError) -> Self {
        match self.scripted_failures.lock() {
            Ok(mut failures) => failures.push_back(error),
            Err(poisoned) => poisoned.into_inner().push_back(error),
        }
        self
    }

    fn next_failure(&self) -> Option<SubmissionError> {
        match self.scripted_failures.lock() {
            Ok(mut failures) => failures.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        }
    }
}

#[async_trait]
impl OrderSubmitter for SimulatedOrderSubmitter {
    async fn submit(&self, request: OrderRequest) -> Result<Order, SubmissionError> {
        tokio::time::sleep(self.latency).await;

        if let Some(error) = self.next_failure() {
            warn!(
                event_name = "funnel.submission.simulated_failure",
                error = %error,
                "simulated order submission failed"
            );
            return Err(error);
        }

        let placed_at = Utc::now();
        let order_id = generate_order_id(&self.order_id_prefix, placed_at, &mut rand::thread_rng());
        info!(
            event_name = "funnel.submission.order_placed",
            order_id = %order_id,
            grand_total = %request.totals.grand_total(),
            item_count = request.item_count,
            payment_method = request.payment_method.as_str(),
            "simulated order placed"
        );

        Ok(Order {
            order_id,
            totals: request.totals,
            item_count: request.item_count,
            customer_email: request.contact.email,
            payment_method: request.payment_method,
            placed_at,
        })
    }
}

/// `{prefix}{last six digits of epoch millis}-{four random characters}`.
///
/// Unique enough to tell orders apart within a session; it is a display token,
/// not a key.
pub fn generate_order_id<R: Rng + ?Sized>(
    prefix: &str,
    placed_at: DateTime<Utc>,
    rng: &mut R,
) -> OrderId {
    let millis = placed_at.timestamp_millis().rem_euclid(1_000_000);
    let suffix: String =
        (0..4).map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase()).collect();
    OrderId(format!("{prefix}{millis:06}-{suffix}"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal::Decimal;

    use super::{
        generate_order_id, OrderRequest, OrderSubmitter, SimulatedOrderSubmitter, SubmissionError,
    };
    use crate::domain::order::{CheckoutForm, PaymentMethod};
    use crate::domain::product::ProductId;
    use crate::pricing::{
        CatalogProvider, PricingSnapshot, SelectionSet, ShippingPolicy, StaticCatalog,
    };

    fn request() -> OrderRequest {
        let catalog = StaticCatalog::reference();
        let products: SelectionSet<ProductId> = [ProductId::new("5")].into_iter().collect();
        OrderRequest {
            totals: PricingSnapshot::compute(
                &products,
                &catalog.products(),
                &SelectionSet::new(),
                &catalog.add_ons(),
                &ShippingPolicy::default(),
            ),
            item_count: 1,
            contact: CheckoutForm { email: "shopper@example.com".to_owned(), ..Default::default() },
            payment_method: PaymentMethod::ApplePay,
            card: None,
            product_ids: products.as_slice().to_vec(),
            add_on_ids: Vec::new(),
        }
    }

    #[test]
    fn order_id_uses_prefix_time_digits_and_suffix() {
        let placed_at = Utc.timestamp_millis_opt(1_730_000_123_456).single().expect("valid time");
        let mut rng = StdRng::seed_from_u64(7);
        let id = generate_order_id("FC", placed_at, &mut rng);

        assert!(id.0.starts_with("FC123456-"), "unexpected id {id}");
        let suffix = id.0.rsplit('-').next().unwrap_or_default();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit()));
    }

    #[test]
    fn order_id_pads_short_millis() {
        let placed_at = Utc.timestamp_millis_opt(2_000_000_042).single().expect("valid time");
        let id = generate_order_id("FC", placed_at, &mut StdRng::seed_from_u64(1));
        assert!(id.0.starts_with("FC000042-"), "unexpected id {id}");
    }

    #[tokio::test]
    async fn simulated_submitter_echoes_frozen_totals() {
        let submitter = SimulatedOrderSubmitter::new(Duration::ZERO, "FC");
        let order = submitter.submit(request()).await.expect("simulated success");

        assert_eq!(order.grand_total(), Decimal::from(57));
        assert_eq!(order.item_count, 1);
        assert_eq!(order.customer_email, "shopper@example.com");
        assert_eq!(order.payment_method, PaymentMethod::ApplePay);
        assert!(order.order_id.0.starts_with("FC"));
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed_in_order() {
        let submitter = SimulatedOrderSubmitter::new(Duration::ZERO, "FC")
            .with_failure(SubmissionError::Network { message: "connection reset".to_owned() });

        let first = submitter.submit(request()).await;
        assert!(matches!(first, Err(SubmissionError::Network { .. })));

        let second = submitter.submit(request()).await;
        assert!(second.is_ok());
    }
}
