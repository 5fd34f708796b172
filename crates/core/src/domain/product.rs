use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable catalog entry. `original_price`, when present, is the pre-discount
/// price and is expected to be at least `price`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    pub category: String,
    #[serde(default)]
    pub featured: bool,
    pub rating: Decimal,
    pub review_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency_note: Option<String>,
}

impl Product {
    /// Amount saved against the original price. Never negative, zero when the
    /// product is not discounted.
    pub fn discount(&self) -> Decimal {
        self.original_price
            .map(|original| (original - self.price).max(Decimal::ZERO))
            .unwrap_or(Decimal::ZERO)
    }
}
