use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::add_on::{AddOn, AddOnId};
use crate::domain::product::{Product, ProductId};
use crate::pricing::{compute_add_on_total, compute_subtotal, CatalogProvider, SelectionSet};
use crate::steps::handoff::{CatalogHandoff, UpsellHandoff};

pub const HEADLINE_ADD_ON: &str = "premium-wrap";

pub struct UpsellStep {
    selected_products: SelectionSet<ProductId>,
    catalog: Vec<Product>,
    selected_add_ons: SelectionSet<AddOnId>,
    add_on_catalog: Vec<AddOn>,
}

impl UpsellStep {
    pub fn new(handoff: Option<CatalogHandoff>, provider: &dyn CatalogProvider) -> Self {
        let CatalogHandoff { selected_product_ids, catalog } = handoff.unwrap_or_default();
        Self {
            selected_products: selected_product_ids,
            catalog,
            selected_add_ons: SelectionSet::new(),
            add_on_catalog: provider.add_ons(),
        }
    }

    pub fn add_ons(&self) -> &[AddOn] {
        &self.add_on_catalog
    }

    pub fn selected_add_ons(&self) -> &SelectionSet<AddOnId> {
        &self.selected_add_ons
    }

    pub fn headline_add_on(&self) -> Option<&AddOn> {
        self.add_on_catalog.iter().find(|add_on| add_on.id.as_str() == HEADLINE_ADD_ON)
    }

    pub fn other_add_ons(&self) -> Vec<&AddOn> {
        self.add_on_catalog.iter().filter(|add_on| add_on.id.as_str() != HEADLINE_ADD_ON).collect()
    }

    pub fn toggle_add_on(&mut self, id: AddOnId) -> bool {
        let selected = self.selected_add_ons.toggle(id.clone());
        debug!(
            event_name = "funnel.selection.toggled",
            step = "upsell",
            add_on_id = %id,
            selected,
            add_on_total = %self.add_on_total(),
            "add-on selection toggled"
        );
        selected
    }

    pub fn subtotal(&self) -> Decimal {
        compute_subtotal(&self.selected_products, &self.catalog)
    }

    pub fn add_on_total(&self) -> Decimal {
        compute_add_on_total(&self.selected_add_ons, &self.add_on_catalog)
    }

    /// Carried subtotal plus add-ons. Shipping is settled at checkout.
    pub fn grand_total(&self) -> Decimal {
        self.subtotal() + self.add_on_total()
    }

    pub fn advance(&self) -> UpsellHandoff {
        self.handoff(self.selected_add_ons.clone())
    }

    pub fn skip(&self) -> UpsellHandoff {
        self.handoff(SelectionSet::new())
    }

    fn handoff(&self, selected_add_on_ids: SelectionSet<AddOnId>) -> UpsellHandoff {
        UpsellHandoff {
            selected_product_ids: self.selected_products.clone(),
            catalog: self.catalog.clone(),
            selected_add_on_ids,
            add_on_catalog: self.add_on_catalog.clone(),
        }
    }
}
