use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::pricing::ShippingPolicy;

pub const ENV_PREFIX: &str = "GIFTFUNNEL_";
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["giftfunnel.toml", "config/giftfunnel.toml"];

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub pricing: PricingConfig,
    pub submission: SubmissionConfig,
    pub referral: ReferralConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PricingConfig {
    pub currency: String,
    pub free_shipping_threshold: Decimal,
    pub flat_shipping_fee: Decimal,
}

impl PricingConfig {
    pub fn shipping_policy(&self) -> ShippingPolicy {
        ShippingPolicy {
            free_shipping_threshold: self.free_shipping_threshold,
            flat_fee: self.flat_shipping_fee,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubmissionConfig {
    pub simulated_latency_ms: u64,
    pub timeout_secs: u64,
    pub order_id_prefix: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReferralConfig {
    pub base_url: String,
    pub code_prefix: String,
    pub dispatch_latency_ms: u64,
}

impl ReferralConfig {
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(self.base_url.trim()).map_err(|error| {
            ConfigError::Validation(format!("referral.base_url is not a valid URL: {error}"))
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub simulated_latency_ms: Option<u64>,
    pub dispatch_latency_ms: Option<u64>,
    pub referral_base_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig {
                currency: "AUD".to_string(),
                free_shipping_threshold: Decimal::from(100),
                flat_shipping_fee: Decimal::from(12),
            },
            submission: SubmissionConfig {
                simulated_latency_ms: 2_000,
                timeout_secs: 30,
                order_id_prefix: "FC".to_string(),
            },
            referral: ReferralConfig {
                base_url: "https://fossickandco.com.au".to_string(),
                code_prefix: "FRIEND".to_string(),
                dispatch_latency_ms: 1_000,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(pricing) = patch.pricing {
            if let Some(currency) = pricing.currency {
                self.pricing.currency = currency;
            }
            if let Some(threshold) = pricing.free_shipping_threshold {
                self.pricing.free_shipping_threshold = threshold;
            }
            if let Some(fee) = pricing.flat_shipping_fee {
                self.pricing.flat_shipping_fee = fee;
            }
        }

        if let Some(submission) = patch.submission {
            if let Some(latency) = submission.simulated_latency_ms {
                self.submission.simulated_latency_ms = latency;
            }
            if let Some(timeout_secs) = submission.timeout_secs {
                self.submission.timeout_secs = timeout_secs;
            }
            if let Some(prefix) = submission.order_id_prefix {
                self.submission.order_id_prefix = prefix;
            }
        }

        if let Some(referral) = patch.referral {
            if let Some(base_url) = referral.base_url {
                self.referral.base_url = base_url;
            }
            if let Some(prefix) = referral.code_prefix {
                self.referral.code_prefix = prefix;
            }
            if let Some(latency) = referral.dispatch_latency_ms {
                self.referral.dispatch_latency_ms = latency;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("GIFTFUNNEL_PRICING_CURRENCY") {
            self.pricing.currency = value;
        }
        if let Some(value) = read_env("GIFTFUNNEL_PRICING_FREE_SHIPPING_THRESHOLD") {
            self.pricing.free_shipping_threshold =
                parse_decimal("GIFTFUNNEL_PRICING_FREE_SHIPPING_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("GIFTFUNNEL_PRICING_FLAT_SHIPPING_FEE") {
            self.pricing.flat_shipping_fee =
                parse_decimal("GIFTFUNNEL_PRICING_FLAT_SHIPPING_FEE", &value)?;
        }

        if let Some(value) = read_env("GIFTFUNNEL_SUBMISSION_SIMULATED_LATENCY_MS") {
            self.submission.simulated_latency_ms =
                parse_u64("GIFTFUNNEL_SUBMISSION_SIMULATED_LATENCY_MS", &value)?;
        }
        if let Some(value) = read_env("GIFTFUNNEL_SUBMISSION_TIMEOUT_SECS") {
            self.submission.timeout_secs = parse_u64("GIFTFUNNEL_SUBMISSION_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("GIFTFUNNEL_SUBMISSION_ORDER_ID_PREFIX") {
            self.submission.order_id_prefix = value;
        }

        if let Some(value) = read_env("GIFTFUNNEL_REFERRAL_BASE_URL") {
            self.referral.base_url = value;
        }
        if let Some(value) = read_env("GIFTFUNNEL_REFERRAL_CODE_PREFIX") {
            self.referral.code_prefix = value;
        }
        if let Some(value) = read_env("GIFTFUNNEL_REFERRAL_DISPATCH_LATENCY_MS") {
            self.referral.dispatch_latency_ms =
                parse_u64("GIFTFUNNEL_REFERRAL_DISPATCH_LATENCY_MS", &value)?;
        }

        let log_level =
            read_env("GIFTFUNNEL_LOGGING_LEVEL").or_else(|| read_env("GIFTFUNNEL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("GIFTFUNNEL_LOGGING_FORMAT").or_else(|| read_env("GIFTFUNNEL_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(latency) = overrides.simulated_latency_ms {
            self.submission.simulated_latency_ms = latency;
        }
        if let Some(latency) = overrides.dispatch_latency_ms {
            self.referral.dispatch_latency_ms = latency;
        }
        if let Some(base_url) = overrides.referral_base_url {
            self.referral.base_url = base_url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pricing(&self.pricing)?;
        validate_submission(&self.submission)?;
        validate_referral(&self.referral)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Candidate config files in lookup order: an explicit path wins, otherwise
/// the first default location that exists.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    let currency = pricing.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(ConfigError::Validation(
            "pricing.currency must be a three-letter uppercase ISO code such as `AUD`".to_string(),
        ));
    }

    if pricing.free_shipping_threshold < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.free_shipping_threshold must not be negative".to_string(),
        ));
    }

    if pricing.flat_shipping_fee < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "pricing.flat_shipping_fee must not be negative".to_string(),
        ));
    }

    Ok(())
}

fn validate_submission(submission: &SubmissionConfig) -> Result<(), ConfigError> {
    if submission.timeout_secs == 0 || submission.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "submission.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if submission.order_id_prefix.trim().is_empty() {
        return Err(ConfigError::Validation(
            "submission.order_id_prefix must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_referral(referral: &ReferralConfig) -> Result<(), ConfigError> {
    let base_url = referral.parsed_base_url()?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(
            "referral.base_url must start with http:// or https://".to_string(),
        ));
    }

    if referral.code_prefix.trim().is_empty() {
        return Err(ConfigError::Validation(
            "referral.code_prefix must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    pricing: Option<PricingPatch>,
    submission: Option<SubmissionPatch>,
    referral: Option<ReferralPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    currency: Option<String>,
    free_shipping_threshold: Option<Decimal>,
    flat_shipping_fee: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct SubmissionPatch {
    simulated_latency_ms: Option<u64>,
    timeout_secs: Option<u64>,
    order_id_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReferralPatch {
    base_url: Option<String>,
    code_prefix: Option<String>,
    dispatch_latency_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_storefront_behaviour() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.pricing.currency == "AUD", "default currency should be AUD")?;
        ensure(
            config.pricing.shipping_policy().free_shipping_threshold == Decimal::from(100),
            "default threshold should be 100",
        )?;
        ensure(
            config.pricing.shipping_policy().flat_fee == Decimal::from(12),
            "default flat fee should be 12",
        )?;
        ensure(config.submission.simulated_latency_ms == 2_000, "default latency is 2s")?;
        ensure(config.submission.order_id_prefix == "FC", "default order prefix is FC")?;
        ensure(config.referral.code_prefix == "FRIEND", "default referral prefix is FRIEND")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_GIFTFUNNEL_SHARE_HOST", "https://gifts.example.com");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("giftfunnel.toml");
            fs::write(
                &path,
                r#"
[referral]
base_url = "${TEST_GIFTFUNNEL_SHARE_HOST}"

[pricing]
free_shipping_threshold = "150.00"
flat_shipping_fee = 9
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.referral.base_url == "https://gifts.example.com",
                "base url should be interpolated from environment",
            )?;
            ensure(
                config.pricing.free_shipping_threshold == Decimal::from(150),
                "threshold should be read from the file",
            )?;
            ensure(
                config.pricing.flat_shipping_fee == Decimal::from(9),
                "flat fee should be read from the file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_GIFTFUNNEL_SHARE_HOST"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GIFTFUNNEL_LOG_LEVEL", "warn");
        env::set_var("GIFTFUNNEL_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["GIFTFUNNEL_LOG_LEVEL", "GIFTFUNNEL_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GIFTFUNNEL_SUBMISSION_SIMULATED_LATENCY_MS", "250");
        env::set_var("GIFTFUNNEL_PRICING_CURRENCY", "NZD");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("giftfunnel.toml");
            fs::write(
                &path,
                r#"
[pricing]
currency = "USD"

[submission]
simulated_latency_ms = 500
order_id_prefix = "GF"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    simulated_latency_ms: Some(0),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.submission.simulated_latency_ms == 0, "override latency should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.pricing.currency == "NZD", "env currency should win over file")?;
            ensure(config.submission.order_id_prefix == "GF", "file prefix should beat default")?;
            Ok(())
        })();

        clear_vars(&["GIFTFUNNEL_SUBMISSION_SIMULATED_LATENCY_MS", "GIFTFUNNEL_PRICING_CURRENCY"]);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GIFTFUNNEL_PRICING_FLAT_SHIPPING_FEE", "twelve");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected env parse failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. }
                        if key == "GIFTFUNNEL_PRICING_FLAT_SHIPPING_FEE"
                ),
                "error should name the offending variable",
            )
        })();

        clear_vars(&["GIFTFUNNEL_PRICING_FLAT_SHIPPING_FEE"]);
        result
    }

    #[test]
    fn validation_rejects_negative_money_and_bad_urls() -> Result<(), String> {
        let mut config = AppConfig::default();
        config.pricing.flat_shipping_fee = Decimal::from(-1);
        let negative_fee = matches!(
            config.validate(),
            Err(ConfigError::Validation(ref message)) if message.contains("flat_shipping_fee")
        );
        ensure(negative_fee, "negative fee should fail validation")?;

        let mut config = AppConfig::default();
        config.referral.base_url = "ftp://fossickandco.com.au".to_string();
        let bad_scheme = matches!(
            config.validate(),
            Err(ConfigError::Validation(ref message)) if message.contains("referral.base_url")
        );
        ensure(bad_scheme, "non-http base url should fail validation")?;

        let mut config = AppConfig::default();
        config.submission.timeout_secs = 0;
        let zero_timeout = matches!(
            config.validate(),
            Err(ConfigError::Validation(ref message)) if message.contains("timeout_secs")
        );
        ensure(zero_timeout, "zero timeout should fail validation")?;

        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        ensure(config.validate().is_err(), "unknown log level should fail validation")
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(missing),
            require_file: true,
            ..LoadOptions::default()
        });
        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should be reported",
        )
    }
}
