use giftfunnel_core::config::{AppConfig, LoadOptions};
use giftfunnel_core::pricing::totals::{order_lines, OrderLine, PricingTrace};
use giftfunnel_core::pricing::{
    CatalogProvider, PricingSnapshot, SelectionSet, ShippingPolicy, StaticCatalog,
};
use giftfunnel_core::{AddOnId, ProductId};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct PriceReport {
    totals: PricingSnapshot,
    trace: PricingTrace,
    lines: Vec<OrderLine>,
    unknown_ids: Vec<String>,
}

pub fn run(products: &[String], add_ons: &[String]) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("price", "config", error.to_string(), 2),
    };

    let report = price(
        &StaticCatalog::reference(),
        &config.pricing.shipping_policy(),
        &config.pricing.currency,
        products,
        add_ons,
    );
    for id in &report.unknown_ids {
        tracing::warn!(event_name = "cli.price.unknown_id", id = %id, "id not in catalog");
    }

    CommandResult::report("price", &report)
}

fn price(
    provider: &dyn CatalogProvider,
    policy: &ShippingPolicy,
    currency: &str,
    product_ids: &[String],
    add_on_ids: &[String],
) -> PriceReport {
    let mut unknown_ids = Vec::new();

    let selected_products: SelectionSet<ProductId> = product_ids
        .iter()
        .map(|raw| ProductId::new(raw.trim()))
        .filter(|id| {
            let known = provider.find_product(id).is_some();
            if !known {
                unknown_ids.push(format!("product:{id}"));
            }
            known
        })
        .collect();
    let selected_add_ons: SelectionSet<AddOnId> = add_on_ids
        .iter()
        .map(|raw| AddOnId::new(raw.trim()))
        .filter(|id| {
            let known = provider.find_add_on(id).is_some();
            if !known {
                unknown_ids.push(format!("add_on:{id}"));
            }
            known
        })
        .collect();

    let catalog = provider.products();
    let add_on_catalog = provider.add_ons();
    let totals = PricingSnapshot::compute(
        &selected_products,
        &catalog,
        &selected_add_ons,
        &add_on_catalog,
        policy,
    );

    PriceReport {
        trace: totals.trace(currency),
        lines: order_lines(&selected_products, &catalog, &selected_add_ons, &add_on_catalog),
        totals,
        unknown_ids,
    }
}

#[cfg(test)]
mod tests {
    use giftfunnel_core::pricing::{ShippingPolicy, StaticCatalog};
    use rust_decimal::Decimal;

    use super::price;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn prices_selection_with_free_shipping() {
        let report = price(
            &StaticCatalog::reference(),
            &ShippingPolicy::default(),
            "AUD",
            &ids(&["1", "3"]),
            &ids(&["premium-wrap"]),
        );

        assert_eq!(report.totals.subtotal(), Decimal::from(167));
        assert_eq!(report.totals.savings(), Decimal::from(57));
        assert_eq!(report.totals.shipping_fee(), Decimal::ZERO);
        assert_eq!(report.totals.grand_total(), Decimal::from(182));
        assert_eq!(report.lines.len(), 3);
        assert_eq!(report.trace.currency, "AUD");
        assert!(report.unknown_ids.is_empty());
    }

    #[test]
    fn repeated_ids_count_once_and_unknown_ids_are_reported() {
        let report = price(
            &StaticCatalog::reference(),
            &ShippingPolicy::default(),
            "AUD",
            &ids(&["5", "5", "99"]),
            &ids(&["gold-bow"]),
        );

        assert_eq!(report.totals.subtotal(), Decimal::from(45));
        assert_eq!(report.totals.shipping_fee(), Decimal::from(12));
        assert_eq!(report.totals.grand_total(), Decimal::from(57));
        assert_eq!(
            report.unknown_ids,
            vec!["product:99".to_string(), "add_on:gold-bow".to_string()]
        );
    }
}
