use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::commands::CommandResult;
use giftfunnel_core::config::{AppConfig, LoadOptions};
use giftfunnel_core::pricing::{
    audit_catalog, compute_shipping, CatalogProvider, ShippingPolicy, StaticCatalog,
};
use giftfunnel_core::steps::handoff::UpsellHandoff;
use giftfunnel_core::{
    AddOnId, CheckoutStep, FormField, OrderSubmitter, PaymentMethod, PricingSnapshot, ProductId,
    SelectionSet, SimulatedOrderSubmitter,
};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

/// (products, add-ons, expected subtotal, savings, shipping, grand total)
/// against the reference catalog and default shipping policy.
const PRICING_SCENARIOS: [(&[&str], &[&str], i64, i64, i64, i64); 3] = [
    (&["1", "3"], &[], 167, 57, 0, 167),
    (&["5"], &[], 45, 0, 12, 57),
    (&["5"], &["premium-wrap"], 45, 0, 12, 72),
];

pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed_check(|| AppConfig::load(LoadOptions::default())) {
        Ok((elapsed_ms, config)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            checks.push(skipped("catalog_integrity"));
            checks.push(skipped("pricing_scenarios"));
            checks.push(skipped("submission_round_trip"));
            return finalize_report(checks, elapsed_since(started));
        }
    };

    let catalog = StaticCatalog::reference();
    let catalog_started = Instant::now();
    let violations = audit_catalog(&catalog);
    checks.push(SmokeCheck {
        name: "catalog_integrity",
        status: if violations.is_empty() { SmokeStatus::Pass } else { SmokeStatus::Fail },
        elapsed_ms: elapsed_since(catalog_started),
        message: if violations.is_empty() {
            format!(
                "{} products and {} add-ons pass integrity audit",
                catalog.products().len(),
                catalog.add_ons().len()
            )
        } else {
            let codes: Vec<&str> =
                violations.iter().map(|violation| violation.code.as_str()).collect();
            codes.join(", ")
        },
    });

    let pricing_started = Instant::now();
    let mismatches = pricing_mismatches(&catalog);
    checks.push(SmokeCheck {
        name: "pricing_scenarios",
        status: if mismatches.is_empty() { SmokeStatus::Pass } else { SmokeStatus::Fail },
        elapsed_ms: elapsed_since(pricing_started),
        message: if mismatches.is_empty() {
            format!("{} reference scenarios priced as expected", PRICING_SCENARIOS.len())
        } else {
            mismatches.join("; ")
        },
    });

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "submission_round_trip",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            });
            return finalize_report(checks, elapsed_since(started));
        }
    };

    let submission_started = Instant::now();
    let round_trip = runtime.block_on(submission_round_trip(&config, &catalog));
    checks.push(SmokeCheck {
        name: "submission_round_trip",
        status: if round_trip.is_ok() { SmokeStatus::Pass } else { SmokeStatus::Fail },
        elapsed_ms: elapsed_since(submission_started),
        message: match round_trip {
            Ok(order_id) => format!("simulated submitter placed order {order_id}"),
            Err(message) => message,
        },
    });

    finalize_report(checks, elapsed_since(started))
}

fn pricing_mismatches(catalog: &dyn CatalogProvider) -> Vec<String> {
    let products = catalog.products();
    let add_ons = catalog.add_ons();
    let policy = ShippingPolicy::default();

    PRICING_SCENARIOS
        .iter()
        .filter_map(|(product_ids, add_on_ids, subtotal, savings, shipping, grand_total)| {
            let selected_products: SelectionSet<ProductId> =
                product_ids.iter().map(|id| ProductId::new(*id)).collect();
            let selected_add_ons: SelectionSet<AddOnId> =
                add_on_ids.iter().map(|id| AddOnId::new(*id)).collect();
            let snapshot = PricingSnapshot::compute(
                &selected_products,
                &products,
                &selected_add_ons,
                &add_ons,
                &policy,
            );
            let expected = [*subtotal, *savings, *shipping, *grand_total].map(Decimal::from);
            let actual = [
                snapshot.subtotal(),
                snapshot.savings(),
                snapshot.shipping_fee(),
                snapshot.grand_total(),
            ];
            (expected != actual).then(|| {
                format!("{product_ids:?}+{add_on_ids:?}: expected {expected:?}, got {actual:?}")
            })
        })
        .collect()
}

/// Places one Apple Pay order through the simulated submitter with no latency.
async fn submission_round_trip(
    config: &AppConfig,
    catalog: &dyn CatalogProvider,
) -> Result<String, String> {
    let handoff = UpsellHandoff {
        selected_product_ids: [ProductId::new("5")].into_iter().collect(),
        catalog: catalog.products(),
        selected_add_on_ids: SelectionSet::new(),
        add_on_catalog: catalog.add_ons(),
    };
    let mut checkout = CheckoutStep::new(Some(handoff), config.pricing.shipping_policy())
        .with_timeout(Duration::from_secs(config.submission.timeout_secs));
    for field in FormField::REQUIRED {
        checkout.set_field(field, "smoke");
    }
    checkout.set_field(FormField::Email, "smoke@example.com");
    checkout.set_payment_method(PaymentMethod::ApplePay);

    let prefix = &config.submission.order_id_prefix;
    let submitter: Arc<dyn OrderSubmitter> =
        Arc::new(SimulatedOrderSubmitter::new(Duration::ZERO, prefix.as_str()));
    let handoff = checkout.submit(submitter).await.map_err(|error| error.to_string())?;
    checkout.teardown();

    let subtotal = Decimal::from(45);
    let expected_total = subtotal + compute_shipping(subtotal, &config.pricing.shipping_policy());
    if handoff.order_total != expected_total {
        return Err(format!(
            "frozen order total {} does not match expected {expected_total}",
            handoff.order_total
        ));
    }

    handoff
        .order
        .map(|order| order.order_id.to_string())
        .ok_or_else(|| "confirmation handoff carried no order".to_string())
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((elapsed_since(started), value)),
        Err(error) => Err((elapsed_since(started), error)),
    }
}

fn elapsed_since(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}

#[cfg(test)]
mod tests {
    use giftfunnel_core::pricing::StaticCatalog;

    use super::{finalize_report, pricing_mismatches, SmokeCheck, SmokeStatus};

    #[test]
    fn reference_catalog_prices_every_scenario() {
        assert!(pricing_mismatches(&StaticCatalog::reference()).is_empty());
    }

    #[test]
    fn any_failed_check_sets_exit_code_six() {
        let result = finalize_report(
            vec![SmokeCheck {
                name: "pricing_scenarios",
                status: SmokeStatus::Fail,
                elapsed_ms: 1,
                message: "mismatch".to_string(),
            }],
            1,
        );

        assert_eq!(result.exit_code, 6);
        assert!(result.output.starts_with("smoke: 0/1 checks passed"));
    }
}
