pub mod catalog;
pub mod selection;
pub mod totals;

pub use catalog::{audit_catalog, featured, CatalogProvider, CatalogViolation, StaticCatalog};
pub use selection::SelectionSet;
pub use totals::{
    compute_add_on_total, compute_grand_total, compute_order_shipping, compute_savings,
    compute_shipping, compute_subtotal, has_priced_products, order_lines, LineKind, OrderLine,
    PricingSnapshot, PricingTrace, PricingTraceStep, ShippingPolicy,
};
