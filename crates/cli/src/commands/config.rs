use std::env;
use std::fs;
use std::path::Path;

use giftfunnel_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let entries = [
        (
            "pricing.currency",
            config.pricing.currency.clone(),
            source("pricing.currency", &["GIFTFUNNEL_PRICING_CURRENCY"]),
        ),
        (
            "pricing.free_shipping_threshold",
            config.pricing.free_shipping_threshold.to_string(),
            source(
                "pricing.free_shipping_threshold",
                &["GIFTFUNNEL_PRICING_FREE_SHIPPING_THRESHOLD"],
            ),
        ),
        (
            "pricing.flat_shipping_fee",
            config.pricing.flat_shipping_fee.to_string(),
            source("pricing.flat_shipping_fee", &["GIFTFUNNEL_PRICING_FLAT_SHIPPING_FEE"]),
        ),
        (
            "submission.simulated_latency_ms",
            config.submission.simulated_latency_ms.to_string(),
            source(
                "submission.simulated_latency_ms",
                &["GIFTFUNNEL_SUBMISSION_SIMULATED_LATENCY_MS"],
            ),
        ),
        (
            "submission.timeout_secs",
            config.submission.timeout_secs.to_string(),
            source("submission.timeout_secs", &["GIFTFUNNEL_SUBMISSION_TIMEOUT_SECS"]),
        ),
        (
            "submission.order_id_prefix",
            config.submission.order_id_prefix.clone(),
            source("submission.order_id_prefix", &["GIFTFUNNEL_SUBMISSION_ORDER_ID_PREFIX"]),
        ),
        (
            "referral.base_url",
            config.referral.base_url.clone(),
            source("referral.base_url", &["GIFTFUNNEL_REFERRAL_BASE_URL"]),
        ),
        (
            "referral.code_prefix",
            config.referral.code_prefix.clone(),
            source("referral.code_prefix", &["GIFTFUNNEL_REFERRAL_CODE_PREFIX"]),
        ),
        (
            "referral.dispatch_latency_ms",
            config.referral.dispatch_latency_ms.to_string(),
            source("referral.dispatch_latency_ms", &["GIFTFUNNEL_REFERRAL_DISPATCH_LATENCY_MS"]),
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            source("logging.level", &["GIFTFUNNEL_LOGGING_LEVEL", "GIFTFUNNEL_LOG_LEVEL"]),
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            source("logging.format", &["GIFTFUNNEL_LOGGING_FORMAT", "GIFTFUNNEL_LOG_FORMAT"]),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(entries.iter().map(|(key, value, source)| render_line(key, value, source)));
    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: &str) -> String {
    format!("- {key} = {value} (source: {source})")
}
