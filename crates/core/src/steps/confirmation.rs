use std::sync::Arc;

use rand::Rng;
use rust_decimal::Decimal;
use tracing::info;
use url::Url;

use crate::domain::order::{Order, OrderId};
use crate::lifecycle::{ScopeError, StepScope};
use crate::referral::{
    share_action, share_url, ReferralCode, ReferralDispatcher, ReferralError, ReferralReceipt,
    ShareAction, ShareChannel, ShareError,
};
use crate::steps::handoff::ConfirmationHandoff;

/// Estimated delivery, in business days.
pub const DELIVERY_WINDOW_DAYS: &str = "2-3";

pub struct ConfirmationStep {
    handoff: ConfirmationHandoff,
    referral_code: ReferralCode,
    share_url: Url,
    sent_referrals: Vec<ReferralReceipt>,
    scope: StepScope,
}

impl ConfirmationStep {
    pub fn new(handoff: Option<ConfirmationHandoff>, base_url: &Url, code_prefix: &str) -> Self {
        Self::with_rng(handoff, base_url, code_prefix, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(
        handoff: Option<ConfirmationHandoff>,
        base_url: &Url,
        code_prefix: &str,
        rng: &mut R,
    ) -> Self {
        let referral_code = ReferralCode::generate(code_prefix, rng);
        let share_url = share_url(base_url, &referral_code);
        Self {
            handoff: handoff.unwrap_or_default(),
            referral_code,
            share_url,
            sent_referrals: Vec::new(),
            scope: StepScope::new("confirmation"),
        }
    }

    pub fn order_total(&self) -> Decimal {
        self.handoff.order_total
    }

    pub fn item_count(&self) -> u32 {
        self.handoff.order_item_count
    }

    pub fn customer_email(&self) -> &str {
        &self.handoff.customer_email
    }

    pub fn order(&self) -> Option<&Order> {
        self.handoff.order.as_ref()
    }

    pub fn order_number(&self) -> Option<&OrderId> {
        self.handoff.order.as_ref().map(|order| &order.order_id)
    }

    pub fn delivery_window(&self) -> &'static str {
        DELIVERY_WINDOW_DAYS
    }

    pub fn referral_code(&self) -> &ReferralCode {
        &self.referral_code
    }

    pub fn share_url(&self) -> &Url {
        &self.share_url
    }

    pub fn share(&self, channel: ShareChannel) -> Result<ShareAction, ShareError> {
        share_action(channel, &self.share_url)
    }

    pub fn sent_referrals(&self) -> &[ReferralReceipt] {
        &self.sent_referrals
    }

    /// Sends the referral code to `recipient` through `dispatcher`, as a task
    /// owned by this step.
    pub async fn send_referral(
        &mut self,
        recipient: &str,
        dispatcher: Arc<dyn ReferralDispatcher>,
    ) -> Result<ReferralReceipt, ReferralError> {
        let recipient = recipient.trim().to_string();
        if recipient.is_empty() {
            return Err(ReferralError::InvalidRecipient);
        }

        let code = self.referral_code.clone();
        let task = self
            .scope
            .spawn(async move { dispatcher.send(&recipient, &code).await })
            .map_err(|_| ReferralError::Cancelled)?;
        let generation = task.generation();

        let receipt = match self.scope.join(task).await {
            Ok(result) => result?,
            Err(ScopeError::Aborted { .. }) | Err(ScopeError::Unmounted { .. }) => {
                return Err(ReferralError::Cancelled);
            }
            Err(error @ ScopeError::Panicked { .. }) => {
                return Err(ReferralError::Dispatch(error.to_string()));
            }
        };

        if !self.scope.is_mounted() || generation != self.scope.generation() {
            return Err(ReferralError::Cancelled);
        }

        info!(
            event_name = "funnel.referral.sent",
            referral_code = %self.referral_code,
            sent_count = self.sent_referrals.len() + 1,
            "referral email accepted"
        );
        self.sent_referrals.push(receipt.clone());
        Ok(receipt)
    }

    pub fn teardown(&mut self) {
        self.scope.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal::Decimal;
    use url::Url;

    use super::ConfirmationStep;
    use crate::referral::{
        ReferralDispatcher, ReferralError, ShareAction, ShareChannel, SimulatedReferralDispatcher,
    };
    use crate::steps::handoff::ConfirmationHandoff;

    fn base() -> Url {
        Url::parse("https://fossickandco.com.au").expect("static url")
    }

    fn dispatcher() -> Arc<dyn ReferralDispatcher> {
        Arc::new(SimulatedReferralDispatcher::new(Duration::ZERO))
    }

    #[test]
    fn missing_handoff_shows_zeroed_order() {
        let step = ConfirmationStep::new(None, &base(), "FRIEND");
        assert_eq!(step.order_total(), Decimal::ZERO);
        assert_eq!(step.item_count(), 0);
        assert_eq!(step.customer_email(), "");
        assert!(step.order_number().is_none());
        assert_eq!(step.delivery_window(), "2-3");
    }

    #[test]
    fn referral_code_is_stable_for_the_step() {
        let handoff = ConfirmationHandoff {
            order_total: Decimal::from(182),
            order_item_count: 3,
            customer_email: "shopper@example.com".to_string(),
            order: None,
        };
        let mut rng = StdRng::seed_from_u64(9);
        let step = ConfirmationStep::with_rng(Some(handoff), &base(), "FRIEND", &mut rng);

        let code = step.referral_code().clone();
        assert!(code.as_str().starts_with("FRIEND"));
        assert_eq!(step.referral_code(), &code);
        let shared_code = step
            .share_url()
            .query_pairs()
            .find(|(key, _)| key == "ref")
            .map(|(_, value)| value.into_owned());
        assert_eq!(shared_code, Some(code.0.clone()));
        assert_eq!(step.order_total(), Decimal::from(182));
    }

    #[test]
    fn copy_link_shares_the_referral_url() {
        let step = ConfirmationStep::new(None, &base(), "FRIEND");
        let action = step.share(ShareChannel::CopyLink).expect("copy link");
        assert_eq!(action, ShareAction::CopyToClipboard { text: step.share_url().to_string() });
    }

    #[tokio::test]
    async fn referral_requires_recipient() {
        let mut step = ConfirmationStep::new(None, &base(), "FRIEND");
        let result = step.send_referral("   ", dispatcher()).await;
        assert_eq!(result, Err(ReferralError::InvalidRecipient));
        assert!(step.sent_referrals().is_empty());
    }

    #[tokio::test]
    async fn referral_is_recorded_once_sent() {
        let mut step = ConfirmationStep::new(None, &base(), "FRIEND");
        let receipt = step.send_referral(" friend@example.com ", dispatcher()).await.expect("sent");
        assert_eq!(receipt.recipient, "friend@example.com");
        assert_eq!(&receipt.code, step.referral_code());
        assert_eq!(step.sent_referrals().len(), 1);
    }

    #[tokio::test]
    async fn referral_after_teardown_is_cancelled() {
        let mut step = ConfirmationStep::new(None, &base(), "FRIEND");
        step.teardown();
        let result = step.send_referral("friend@example.com", dispatcher()).await;
        assert_eq!(result, Err(ReferralError::Cancelled));
    }
}
