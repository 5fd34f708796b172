use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::add_on::{AddOn, AddOnId};
use crate::domain::product::{Product, ProductId};
use crate::pricing::selection::SelectionSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    pub free_shipping_threshold: Decimal,
    pub flat_fee: Decimal,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self { free_shipping_threshold: Decimal::from(100), flat_fee: Decimal::from(12) }
    }
}

pub fn compute_subtotal(products: &SelectionSet<ProductId>, catalog: &[Product]) -> Decimal {
    products.iter().filter_map(|id| find_product(catalog, id)).map(|product| product.price).sum()
}

pub fn compute_savings(products: &SelectionSet<ProductId>, catalog: &[Product]) -> Decimal {
    products.iter().filter_map(|id| find_product(catalog, id)).map(Product::discount).sum()
}

pub fn compute_add_on_total(add_ons: &SelectionSet<AddOnId>, catalog: &[AddOn]) -> Decimal {
    add_ons.iter().filter_map(|id| find_add_on(catalog, id)).map(|add_on| add_on.price).sum()
}

/// Free at or above the threshold, flat fee below it.
pub fn compute_shipping(subtotal: Decimal, policy: &ShippingPolicy) -> Decimal {
    if subtotal >= policy.free_shipping_threshold {
        Decimal::ZERO
    } else {
        policy.flat_fee
    }
}

/// Shipping for a selection. Nothing ships when no selected product is in the
/// catalog.
pub fn compute_order_shipping(
    products: &SelectionSet<ProductId>,
    catalog: &[Product],
    policy: &ShippingPolicy,
) -> Decimal {
    if has_priced_products(products, catalog) {
        compute_shipping(compute_subtotal(products, catalog), policy)
    } else {
        Decimal::ZERO
    }
}

pub fn has_priced_products(products: &SelectionSet<ProductId>, catalog: &[Product]) -> bool {
    products.iter().any(|id| find_product(catalog, id).is_some())
}

pub fn compute_grand_total(subtotal: Decimal, add_on_total: Decimal, shipping: Decimal) -> Decimal {
    subtotal + add_on_total + shipping
}

fn find_product<'a>(catalog: &'a [Product], id: &ProductId) -> Option<&'a Product> {
    catalog.iter().find(|product| &product.id == id)
}

fn find_add_on<'a>(catalog: &'a [AddOn], id: &AddOnId) -> Option<&'a AddOn> {
    catalog.iter().find(|add_on| &add_on.id == id)
}

/// Derived totals for one set of selections.
///
/// The grand total is not a field: [`PricingSnapshot::grand_total`] sums the
/// components every time it is asked, and the serialized form carries it as a
/// computed value only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSnapshot {
    subtotal: Decimal,
    add_on_total: Decimal,
    savings: Decimal,
    shipping_fee: Decimal,
}

impl PricingSnapshot {
    pub fn compute(
        products: &SelectionSet<ProductId>,
        catalog: &[Product],
        add_ons: &SelectionSet<AddOnId>,
        add_on_catalog: &[AddOn],
        policy: &ShippingPolicy,
    ) -> Self {
        Self {
            subtotal: compute_subtotal(products, catalog),
            add_on_total: compute_add_on_total(add_ons, add_on_catalog),
            savings: compute_savings(products, catalog),
            shipping_fee: compute_order_shipping(products, catalog, policy),
        }
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    pub fn add_on_total(&self) -> Decimal {
        self.add_on_total
    }

    pub fn savings(&self) -> Decimal {
        self.savings
    }

    pub fn shipping_fee(&self) -> Decimal {
        self.shipping_fee
    }

    pub fn grand_total(&self) -> Decimal {
        compute_grand_total(self.subtotal, self.add_on_total, self.shipping_fee)
    }

    pub fn free_shipping(&self) -> bool {
        self.shipping_fee.is_zero()
    }

    pub fn trace(&self, currency: &str) -> PricingTrace {
        let steps = vec![
            PricingTraceStep {
                stage: "subtotal".to_string(),
                detail: "sum(product.price) over selected products".to_string(),
                amount: self.subtotal,
            },
            PricingTraceStep {
                stage: "savings".to_string(),
                detail: "sum(original_price - price) over discounted products".to_string(),
                amount: self.savings,
            },
            PricingTraceStep {
                stage: "add_on_total".to_string(),
                detail: "sum(add_on.price) over selected add-ons".to_string(),
                amount: self.add_on_total,
            },
            PricingTraceStep {
                stage: "shipping".to_string(),
                detail: if self.free_shipping() {
                    "free shipping threshold met".to_string()
                } else {
                    "flat fee below free shipping threshold".to_string()
                },
                amount: self.shipping_fee,
            },
            PricingTraceStep {
                stage: "grand_total".to_string(),
                detail: "subtotal + add_on_total + shipping".to_string(),
                amount: self.grand_total(),
            },
        ];

        PricingTrace { currency: currency.to_string(), steps }
    }
}

impl Serialize for PricingSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct View {
            subtotal: Decimal,
            add_on_total: Decimal,
            savings: Decimal,
            shipping_fee: Decimal,
            grand_total: Decimal,
        }

        View {
            subtotal: self.subtotal,
            add_on_total: self.add_on_total,
            savings: self.savings,
            shipping_fee: self.shipping_fee,
            grand_total: self.grand_total(),
        }
        .serialize(serializer)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub currency: String,
    pub steps: Vec<PricingTraceStep>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Product,
    AddOn,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub kind: LineKind,
    pub id: String,
    pub name: String,
    pub detail: Option<String>,
    pub amount: Decimal,
}

/// Line items for an order summary: products first, then add-ons, each in
/// selection order. Ids missing from the catalog are skipped.
pub fn order_lines(
    products: &SelectionSet<ProductId>,
    catalog: &[Product],
    add_ons: &SelectionSet<AddOnId>,
    add_on_catalog: &[AddOn],
) -> Vec<OrderLine> {
    let product_lines = products.iter().filter_map(|id| find_product(catalog, id)).map(|product| {
        OrderLine {
            kind: LineKind::Product,
            id: product.id.0.clone(),
            name: product.name.clone(),
            detail: Some(product.category.clone()),
            amount: product.price,
        }
    });
    let add_on_lines =
        add_ons.iter().filter_map(|id| find_add_on(add_on_catalog, id)).map(|add_on| OrderLine {
            kind: LineKind::AddOn,
            id: add_on.id.0.clone(),
            name: add_on.name.clone(),
            detail: None,
            amount: add_on.price,
        });

    product_lines.chain(add_on_lines).collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use super::{
        compute_add_on_total, compute_grand_total, compute_order_shipping, compute_savings,
        compute_shipping, compute_subtotal, order_lines, LineKind, PricingSnapshot,
        ShippingPolicy,
    };
    use crate::domain::add_on::AddOnId;
    use crate::domain::product::{Product, ProductId};
    use crate::pricing::catalog::{CatalogProvider, StaticCatalog};
    use crate::pricing::selection::SelectionSet;

    fn products(ids: &[&str]) -> SelectionSet<ProductId> {
        ids.iter().map(|id| ProductId::new(*id)).collect()
    }

    fn add_ons(ids: &[&str]) -> SelectionSet<AddOnId> {
        ids.iter().map(|id| AddOnId::new(*id)).collect()
    }

    #[test]
    fn two_discounted_products_ship_free() {
        let catalog = StaticCatalog::reference();
        let snapshot = PricingSnapshot::compute(
            &products(&["1", "3"]),
            &catalog.products(),
            &SelectionSet::new(),
            &catalog.add_ons(),
            &ShippingPolicy::default(),
        );

        assert_eq!(snapshot.subtotal(), Decimal::from(167));
        assert_eq!(snapshot.savings(), Decimal::from(57));
        assert_eq!(snapshot.shipping_fee(), Decimal::ZERO);
        assert_eq!(snapshot.grand_total(), Decimal::from(167));
    }

    #[test]
    fn single_cheap_product_pays_flat_shipping() {
        let catalog = StaticCatalog::reference();
        let snapshot = PricingSnapshot::compute(
            &products(&["5"]),
            &catalog.products(),
            &SelectionSet::new(),
            &catalog.add_ons(),
            &ShippingPolicy::default(),
        );

        assert_eq!(snapshot.subtotal(), Decimal::from(45));
        assert_eq!(snapshot.shipping_fee(), Decimal::from(12));
        assert_eq!(snapshot.grand_total(), Decimal::from(57));
    }

    #[test]
    fn shipping_threshold_is_inclusive() {
        let policy = ShippingPolicy::default();
        assert_eq!(compute_shipping(Decimal::from(100), &policy), Decimal::ZERO);
        assert_eq!(compute_shipping(Decimal::new(9999, 2), &policy), Decimal::from(12));
        assert_eq!(compute_shipping(Decimal::ZERO, &policy), Decimal::from(12));
    }

    #[test]
    fn shipping_policy_is_configurable() {
        let policy = ShippingPolicy {
            free_shipping_threshold: Decimal::from(150),
            flat_fee: Decimal::from(9),
        };
        assert_eq!(compute_shipping(Decimal::from(120), &policy), Decimal::from(9));
        assert_eq!(compute_shipping(Decimal::from(150), &policy), Decimal::ZERO);
    }

    #[test]
    fn unknown_ids_contribute_zero() {
        let catalog = StaticCatalog::reference();
        assert_eq!(compute_subtotal(&products(&["missing"]), &catalog.products()), Decimal::ZERO);
        assert_eq!(compute_savings(&products(&["missing"]), &catalog.products()), Decimal::ZERO);
        assert_eq!(
            compute_add_on_total(&add_ons(&["missing", "premium-wrap"]), &catalog.add_ons()),
            Decimal::from(15)
        );
    }

    #[test]
    fn empty_selection_prices_to_zero() {
        let snapshot = PricingSnapshot::compute(
            &SelectionSet::new(),
            &[],
            &SelectionSet::new(),
            &[],
            &ShippingPolicy::default(),
        );
        assert_eq!(snapshot, PricingSnapshot::default());
        assert_eq!(snapshot.grand_total(), Decimal::ZERO);
    }

    #[test]
    fn selection_with_no_catalog_products_ships_free() {
        let catalog = StaticCatalog::reference();
        let policy = ShippingPolicy::default();
        assert_eq!(
            compute_order_shipping(&products(&["missing"]), &catalog.products(), &policy),
            Decimal::ZERO
        );
        assert_eq!(
            compute_order_shipping(&products(&["missing", "5"]), &catalog.products(), &policy),
            Decimal::from(12)
        );
    }

    #[test]
    fn add_on_toggle_round_trip_restores_grand_total() {
        let catalog = StaticCatalog::reference();
        let selected = products(&["1", "3"]);
        let mut extras = SelectionSet::new();
        let price = |extras: &SelectionSet<AddOnId>| {
            PricingSnapshot::compute(
                &selected,
                &catalog.products(),
                extras,
                &catalog.add_ons(),
                &ShippingPolicy::default(),
            )
        };

        let before = price(&extras).grand_total();
        extras.toggle(AddOnId::new("premium-wrap"));
        assert_eq!(price(&extras).add_on_total(), Decimal::from(15));
        assert_eq!(price(&extras).grand_total(), before + Decimal::from(15));

        extras.toggle(AddOnId::new("premium-wrap"));
        assert_eq!(price(&extras).add_on_total(), Decimal::ZERO);
        assert_eq!(price(&extras).grand_total(), before);
    }

    #[test]
    fn serialized_snapshot_carries_computed_grand_total() {
        let catalog = StaticCatalog::reference();
        let snapshot = PricingSnapshot::compute(
            &products(&["5"]),
            &catalog.products(),
            &add_ons(&["handwritten-note"]),
            &catalog.add_ons(),
            &ShippingPolicy::default(),
        );

        let json = serde_json::to_value(snapshot).expect("serialize snapshot");
        assert_eq!(json["grandTotal"], "65");
        assert_eq!(json["shippingFee"], "12");

        let round_trip: PricingSnapshot = serde_json::from_value(json).expect("deserialize");
        assert_eq!(round_trip, snapshot);
    }

    #[test]
    fn trace_ends_with_grand_total() {
        let snapshot = PricingSnapshot::compute(
            &products(&["5"]),
            &StaticCatalog::reference().products(),
            &SelectionSet::new(),
            &[],
            &ShippingPolicy::default(),
        );
        let trace = snapshot.trace("AUD");

        assert_eq!(trace.currency, "AUD");
        let last = trace.steps.last().expect("trace has steps");
        assert_eq!(last.stage, "grand_total");
        assert_eq!(last.amount, Decimal::from(57));
    }

    #[test]
    fn order_lines_follow_selection_order_and_skip_unknown_ids() {
        let catalog = StaticCatalog::reference();
        let lines = order_lines(
            &products(&["3", "missing", "1"]),
            &catalog.products(),
            &add_ons(&["handwritten-note"]),
            &catalog.add_ons(),
        );

        let ids: Vec<&str> = lines.iter().map(|line| line.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "handwritten-note"]);
        assert_eq!(lines[2].kind, LineKind::AddOn);
        assert_eq!(lines[0].detail.as_deref(), Some("Home & Lifestyle"));
    }

    fn priced_catalog(prices: &[u32]) -> Vec<Product> {
        prices
            .iter()
            .enumerate()
            .map(|(index, price)| Product {
                id: ProductId::new(index.to_string()),
                name: format!("product-{index}"),
                description: String::new(),
                price: Decimal::from(*price),
                original_price: None,
                category: "Test".to_string(),
                featured: false,
                rating: Decimal::ZERO,
                review_count: 0,
                urgency_note: None,
            })
            .collect()
    }

    proptest! {
        #[test]
        fn subtotal_is_literal_sum_of_selected_prices(
            prices in prop::collection::vec(0u32..10_000, 0..10),
            picks in prop::collection::vec(0usize..12, 0..12),
        ) {
            let catalog = priced_catalog(&prices);
            let selection: SelectionSet<ProductId> =
                picks.iter().map(|index| ProductId::new(index.to_string())).collect();

            let expected: Decimal = selection
                .iter()
                .filter_map(|id| id.as_str().parse::<usize>().ok())
                .filter_map(|index| prices.get(index))
                .map(|price| Decimal::from(*price))
                .sum();

            prop_assert_eq!(compute_subtotal(&selection, &catalog), expected);
        }

        #[test]
        fn grand_total_equals_sum_of_components(
            prices in prop::collection::vec(0u32..500, 1..8),
            picks in prop::collection::vec(0usize..8, 0..8),
            add_on_picks in prop::collection::vec(0usize..5, 0..5),
        ) {
            let catalog = priced_catalog(&prices);
            let reference = StaticCatalog::reference().add_ons();
            let selection: SelectionSet<ProductId> =
                picks.iter().map(|index| ProductId::new(index.to_string())).collect();
            let extras: SelectionSet<AddOnId> =
                add_on_picks.iter().map(|index| reference[*index].id.clone()).collect();

            let snapshot = PricingSnapshot::compute(
                &selection,
                &catalog,
                &extras,
                &reference,
                &ShippingPolicy::default(),
            );

            prop_assert_eq!(
                snapshot.grand_total(),
                compute_grand_total(
                    compute_subtotal(&selection, &catalog),
                    compute_add_on_total(&extras, &reference),
                    compute_order_shipping(&selection, &catalog, &ShippingPolicy::default()),
                )
            );
        }
    }
}
