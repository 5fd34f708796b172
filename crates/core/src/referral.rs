use std::time::Duration;

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::config::ReferralConfig;

pub const SHARE_TEXT: &str =
    "I just discovered the most beautiful boutique gifts at Fossick & Co! Check them out:";

const FACEBOOK_SHARER: &str = "https://facebook.com/sharer/sharer.php";
const TWITTER_INTENT: &str = "https://twitter.com/intent/tweet";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferralCode(pub String);

impl ReferralCode {
    /// `{prefix}` followed by six random uppercase alphanumerics.
    pub fn generate<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> Self {
        let suffix: String =
            (0..6).map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase()).collect();
        Self(format!("{prefix}{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn share_url(base_url: &Url, code: &ReferralCode) -> Url {
    let mut url = base_url.clone();
    url.query_pairs_mut().clear().append_pair("ref", code.as_str());
    url
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareChannel {
    Facebook,
    Twitter,
    Instagram,
    CopyLink,
}

impl ShareChannel {
    pub const ALL: [Self; 4] = [Self::Facebook, Self::Twitter, Self::Instagram, Self::CopyLink];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
            Self::Instagram => "instagram",
            Self::CopyLink => "copy_link",
        }
    }
}

/// What the presentation layer should do for a share request. Opening a window
/// or writing to the clipboard stays outside the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ShareAction {
    Open { url: String },
    CopyToClipboard { text: String },
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("could not build share link: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub fn share_action(channel: ShareChannel, link: &Url) -> Result<ShareAction, ShareError> {
    let action = match channel {
        ShareChannel::Facebook => {
            let url = Url::parse_with_params(FACEBOOK_SHARER, &[("u", link.as_str())])?;
            ShareAction::Open { url: url.into() }
        }
        ShareChannel::Twitter => {
            let url = Url::parse_with_params(
                TWITTER_INTENT,
                &[("text", SHARE_TEXT), ("url", link.as_str())],
            )?;
            ShareAction::Open { url: url.into() }
        }
        ShareChannel::Instagram => {
            ShareAction::CopyToClipboard { text: format!("{SHARE_TEXT} {link}") }
        }
        ShareChannel::CopyLink => ShareAction::CopyToClipboard { text: link.to_string() },
    };
    Ok(action)
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReferralError {
    #[error("referral recipient email is required")]
    InvalidRecipient,
    #[error("referral dispatch failed: {0}")]
    Dispatch(String),
    #[error("referral dispatch was cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralReceipt {
    pub recipient: String,
    pub code: ReferralCode,
}

#[async_trait]
pub trait ReferralDispatcher: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        code: &ReferralCode,
    ) -> Result<ReferralReceipt, ReferralError>;
}

pub struct SimulatedReferralDispatcher {
    latency: Duration,
}

impl SimulatedReferralDispatcher {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn from_config(config: &ReferralConfig) -> Self {
        Self::new(Duration::from_millis(config.dispatch_latency_ms))
    }
}

#[async_trait]
impl ReferralDispatcher for SimulatedReferralDispatcher {
    async fn send(
        &self,
        recipient: &str,
        code: &ReferralCode,
    ) -> Result<ReferralReceipt, ReferralError> {
        tokio::time::sleep(self.latency).await;
        info!(
            event_name = "funnel.referral.dispatched",
            referral_code = %code,
            "simulated referral email sent"
        );
        Ok(ReferralReceipt { recipient: recipient.to_string(), code: code.clone() })
    }
}
