use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::add_on::{AddOn, AddOnId};
use crate::domain::product::{Product, ProductId};

/// Read-only source of purchasable products and add-ons.
///
/// Steps take owned snapshots of the catalog so a live inventory source can sit
/// behind this trait without the pricing functions changing.
pub trait CatalogProvider: Send + Sync {
    fn products(&self) -> Vec<Product>;
    fn add_ons(&self) -> Vec<AddOn>;

    fn find_product(&self, id: &ProductId) -> Option<Product> {
        self.products().into_iter().find(|product| &product.id == id)
    }

    fn find_add_on(&self, id: &AddOnId) -> Option<AddOn> {
        self.add_ons().into_iter().find(|add_on| &add_on.id == id)
    }
}

#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    products: Vec<Product>,
    add_ons: Vec<AddOn>,
}

impl StaticCatalog {
    pub fn new(products: Vec<Product>, add_ons: Vec<AddOn>) -> Self {
        Self { products, add_ons }
    }

    /// The storefront's fixed launch catalog.
    pub fn reference() -> Self {
        Self::new(reference_products(), reference_add_ons())
    }
}

impl CatalogProvider for StaticCatalog {
    fn products(&self) -> Vec<Product> {
        self.products.clone()
    }

    fn add_ons(&self) -> Vec<AddOn> {
        self.add_ons.clone()
    }
}

pub fn featured(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|product| product.featured).collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogViolation {
    pub code: String,
    pub message: String,
}

/// Checks the data contract the pricing functions rely on but do not enforce:
/// unique ids, non-negative prices, and original prices not below the current
/// price.
pub fn audit_catalog(provider: &dyn CatalogProvider) -> Vec<CatalogViolation> {
    let mut violations = Vec::new();

    let mut seen_products = HashSet::new();
    for product in provider.products() {
        if !seen_products.insert(product.id.clone()) {
            violations.push(CatalogViolation {
                code: "DUPLICATE_PRODUCT_ID".to_string(),
                message: format!("Duplicate product id in catalog: {}", product.id),
            });
        }
        if product.price < Decimal::ZERO {
            violations.push(CatalogViolation {
                code: "NEGATIVE_PRICE".to_string(),
                message: format!("Product {} has a negative price", product.id),
            });
        }
        if product.original_price.is_some_and(|original| original < product.price) {
            violations.push(CatalogViolation {
                code: "ORIGINAL_BELOW_PRICE".to_string(),
                message: format!("Product {} has an original price below its price", product.id),
            });
        }
    }

    let mut seen_add_ons = HashSet::new();
    for add_on in provider.add_ons() {
        if !seen_add_ons.insert(add_on.id.clone()) {
            violations.push(CatalogViolation {
                code: "DUPLICATE_ADD_ON_ID".to_string(),
                message: format!("Duplicate add-on id in catalog: {}", add_on.id),
            });
        }
        if add_on.price < Decimal::ZERO {
            violations.push(CatalogViolation {
                code: "NEGATIVE_PRICE".to_string(),
                message: format!("Add-on {} has a negative price", add_on.id),
            });
        }
    }

    violations
}

fn reference_products() -> Vec<Product> {
    vec![
        Product {
            id: ProductId::new("1"),
            name: "Handcrafted Ceramic Vase".to_string(),
            description: "Beautiful artisan vase with unique glazing, perfect for fresh flowers or as a standalone piece.".to_string(),
            price: Decimal::from(89),
            original_price: Some(Decimal::from(129)),
            category: "Home Decor".to_string(),
            featured: true,
            rating: Decimal::new(49, 1),
            review_count: 127,
            urgency_note: Some("Only 3 left in stock".to_string()),
        },
        Product {
            id: ProductId::new("2"),
            name: "Artisan Jewelry Box".to_string(),
            description: "Handmade wooden jewelry box with velvet interior and intricate details.".to_string(),
            price: Decimal::from(165),
            original_price: None,
            category: "Accessories".to_string(),
            featured: false,
            rating: Decimal::new(48, 1),
            review_count: 89,
            urgency_note: None,
        },
        Product {
            id: ProductId::new("3"),
            name: "Luxury Candle Set".to_string(),
            description: "Set of three premium soy candles with unique Australian-inspired scents.".to_string(),
            price: Decimal::from(78),
            original_price: Some(Decimal::from(95)),
            category: "Home & Lifestyle".to_string(),
            featured: true,
            rating: Decimal::new(47, 1),
            review_count: 203,
            urgency_note: Some("Flash sale - 48 hours left".to_string()),
        },
        Product {
            id: ProductId::new("4"),
            name: "Vintage Silk Scarf".to_string(),
            description: "Luxurious silk scarf with hand-painted botanical design, perfect for any season.".to_string(),
            price: Decimal::from(120),
            original_price: None,
            category: "Fashion".to_string(),
            featured: false,
            rating: Decimal::new(49, 1),
            review_count: 156,
            urgency_note: None,
        },
        Product {
            id: ProductId::new("5"),
            name: "Artisan Tea Collection".to_string(),
            description: "Curated collection of premium loose-leaf teas from local growers.".to_string(),
            price: Decimal::from(45),
            original_price: None,
            category: "Gourmet".to_string(),
            featured: false,
            rating: Decimal::new(46, 1),
            review_count: 92,
            urgency_note: None,
        },
        Product {
            id: ProductId::new("6"),
            name: "Hand-thrown Pottery Set".to_string(),
            description: "Complete dinner set crafted by local artisan, each piece unique.".to_string(),
            price: Decimal::from(220),
            original_price: Some(Decimal::from(280)),
            category: "Home Decor".to_string(),
            featured: true,
            rating: Decimal::new(50, 1),
            review_count: 67,
            urgency_note: Some("Limited edition - only 5 sets available".to_string()),
        },
    ]
}

fn reference_add_ons() -> Vec<AddOn> {
    vec![
        AddOn {
            id: AddOnId::new("premium-wrap"),
            name: "Premium Gift Wrapping".to_string(),
            description: "Beautiful hand-wrapped packaging with sustainable materials, custom ribbon, and elegant finishing touches.".to_string(),
            price: Decimal::from(15),
            popular: true,
        },
        AddOn {
            id: AddOnId::new("handwritten-note"),
            name: "Handwritten Personal Note".to_string(),
            description: "A thoughtfully written personal message on our signature letterpress card, sealed with wax.".to_string(),
            price: Decimal::from(8),
            popular: true,
        },
        AddOn {
            id: AddOnId::new("express-shipping"),
            name: "Express Shipping".to_string(),
            description: "Next-day delivery across Australia with tracking and insurance included.".to_string(),
            price: Decimal::from(25),
            popular: false,
        },
        AddOn {
            id: AddOnId::new("care-package"),
            name: "Care Instructions Card".to_string(),
            description: "Detailed care instructions and story about the artisan who created your piece.".to_string(),
            price: Decimal::from(5),
            popular: false,
        },
        AddOn {
            id: AddOnId::new("seasonal-extras"),
            name: "Seasonal Extras".to_string(),
            description: "Curated seasonal additions like dried flowers, local chocolates, or small decorative elements.".to_string(),
            price: Decimal::from(18),
            popular: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{audit_catalog, featured, CatalogProvider, StaticCatalog};
    use crate::domain::product::ProductId;

    #[test]
    fn reference_catalog_passes_audit() {
        let catalog = StaticCatalog::reference();
        assert_eq!(catalog.products().len(), 6);
        assert_eq!(catalog.add_ons().len(), 5);
        assert!(audit_catalog(&catalog).is_empty());
    }

    #[test]
    fn featured_subset_uses_flag() {
        let products = StaticCatalog::reference().products();
        let ids: Vec<&str> =
            featured(&products).iter().map(|product| product.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "6"]);
    }

    #[test]
    fn audit_flags_duplicates_and_inverted_discounts() {
        let mut products = StaticCatalog::reference().products();
        let mut duplicate = products[0].clone();
        duplicate.original_price = Some(Decimal::from(10));
        products.push(duplicate);
        products[1].price = Decimal::from(-1);

        let catalog = StaticCatalog::new(products, Vec::new());
        let violations = audit_catalog(&catalog);

        assert_eq!(violations.len(), 3);
        assert!(violations.iter().any(|v| v.code == "DUPLICATE_PRODUCT_ID"));
        assert!(violations.iter().any(|v| v.code == "ORIGINAL_BELOW_PRICE"));
        assert!(violations.iter().any(|v| v.code == "NEGATIVE_PRICE"));
    }

    #[test]
    fn find_product_returns_none_for_unknown_id() {
        let catalog = StaticCatalog::reference();
        assert!(catalog.find_product(&ProductId::new("999")).is_none());
        assert_eq!(
            catalog.find_product(&ProductId::new("5")).map(|product| product.price),
            Some(Decimal::from(45))
        );
    }
}
