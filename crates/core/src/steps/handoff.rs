use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::add_on::{AddOn, AddOnId};
use crate::domain::order::Order;
use crate::domain::product::{Product, ProductId};
use crate::domain::quiz::QuizAnswers;
use crate::pricing::SelectionSet;

/// Quiz → Catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuizHandoff {
    pub quiz_answers: QuizAnswers,
}

/// Catalog → Upsell. Carries the catalog by value so later steps can price
/// without a provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogHandoff {
    pub selected_product_ids: SelectionSet<ProductId>,
    pub catalog: Vec<Product>,
}

/// Upsell → Checkout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpsellHandoff {
    pub selected_product_ids: SelectionSet<ProductId>,
    pub catalog: Vec<Product>,
    pub selected_add_on_ids: SelectionSet<AddOnId>,
    pub add_on_catalog: Vec<AddOn>,
}

/// Checkout → Confirmation. The totals here are frozen at submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfirmationHandoff {
    pub order_total: Decimal,
    pub order_item_count: u32,
    pub customer_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
}

impl From<Order> for ConfirmationHandoff {
    fn from(order: Order) -> Self {
        Self {
            order_total: order.grand_total(),
            order_item_count: order.item_count,
            customer_email: order.customer_email.clone(),
            order: Some(order),
        }
    }
}
