use giftfunnel_core::pricing::{audit_catalog, CatalogProvider, CatalogViolation, StaticCatalog};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ProductRow {
    id: String,
    name: String,
    category: String,
    price: Decimal,
    original_price: Option<Decimal>,
    discount: Decimal,
    featured: bool,
}

#[derive(Debug, Serialize)]
struct AddOnRow {
    id: String,
    name: String,
    price: Decimal,
    popular: bool,
}

#[derive(Debug, Serialize)]
struct CatalogListing {
    products: Vec<ProductRow>,
    add_ons: Vec<AddOnRow>,
    featured_count: usize,
    violations: Vec<CatalogViolation>,
}

pub fn run() -> CommandResult {
    let catalog = StaticCatalog::reference();
    let listing = listing(&catalog);

    if !listing.violations.is_empty() {
        tracing::warn!(
            event_name = "cli.catalog.integrity_violations",
            count = listing.violations.len(),
            "catalog failed integrity audit"
        );
    }

    CommandResult::report("catalog", &listing)
}

fn listing(provider: &dyn CatalogProvider) -> CatalogListing {
    let products: Vec<ProductRow> = provider
        .products()
        .into_iter()
        .map(|product| ProductRow {
            discount: product.discount(),
            id: product.id.0,
            name: product.name,
            category: product.category,
            price: product.price,
            original_price: product.original_price,
            featured: product.featured,
        })
        .collect();
    let add_ons = provider
        .add_ons()
        .into_iter()
        .map(|add_on| AddOnRow {
            id: add_on.id.0,
            name: add_on.name,
            price: add_on.price,
            popular: add_on.popular,
        })
        .collect();

    CatalogListing {
        featured_count: products.iter().filter(|row| row.featured).count(),
        products,
        add_ons,
        violations: audit_catalog(provider),
    }
}
