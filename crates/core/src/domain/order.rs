use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::pricing::PricingSnapshot;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "card")]
    Card,
    #[serde(rename = "apple")]
    ApplePay,
    #[serde(rename = "afterpay")]
    Afterpay,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::ApplePay => "apple",
            Self::Afterpay => "afterpay",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "apple" | "applepay" | "apple_pay" => Ok(Self::ApplePay),
            "afterpay" => Ok(Self::Afterpay),
            other => {
                Err(format!("unsupported payment method `{other}` (expected card|apple|afterpay)"))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Email,
    FirstName,
    LastName,
    Address,
    City,
    State,
    Postcode,
    Phone,
}

impl FormField {
    pub const REQUIRED: [Self; 7] = [
        Self::Email,
        Self::FirstName,
        Self::LastName,
        Self::Address,
        Self::City,
        Self::State,
        Self::Postcode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Address => "address",
            Self::City => "city",
            Self::State => "state",
            Self::Postcode => "postcode",
            Self::Phone => "phone",
        }
    }
}

/// Contact and shipping details collected at checkout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckoutForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub phone: String,
}

impl CheckoutForm {
    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Email => &self.email,
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Address => &self.address,
            FormField::City => &self.city,
            FormField::State => &self.state,
            FormField::Postcode => &self.postcode,
            FormField::Phone => &self.phone,
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Email => self.email = value,
            FormField::FirstName => self.first_name = value,
            FormField::LastName => self.last_name = value,
            FormField::Address => self.address = value,
            FormField::City => self.city = value,
            FormField::State => self.state = value,
            FormField::Postcode => self.postcode = value,
            FormField::Phone => self.phone = value,
        }
    }

    pub fn missing_required(&self) -> Vec<FormField> {
        FormField::REQUIRED
            .into_iter()
            .filter(|field| self.field(*field).trim().is_empty())
            .collect()
    }
}

/// Card details are only needed for `PaymentMethod::Card`. Number and CVC stay
/// wrapped so they cannot leak through `Debug` or logs.
#[derive(Clone, Debug)]
pub struct CardDetails {
    pub number: SecretString,
    pub expiry: String,
    pub cvc: SecretString,
}

impl CardDetails {
    pub fn new(
        number: impl Into<String>,
        expiry: impl Into<String>,
        cvc: impl Into<String>,
    ) -> Self {
        Self {
            number: SecretString::from(number.into()),
            expiry: expiry.into(),
            cvc: SecretString::from(cvc.into()),
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.number.expose_secret().trim().is_empty() {
            missing.push("card_number");
        }
        if self.expiry.trim().is_empty() {
            missing.push("card_expiry");
        }
        if self.cvc.expose_secret().trim().is_empty() {
            missing.push("card_cvc");
        }
        missing
    }
}

/// A placed order. `totals` is frozen at submission time and never recomputed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub totals: PricingSnapshot,
    pub item_count: u32,
    pub customer_email: String,
    pub payment_method: PaymentMethod,
    pub placed_at: DateTime<Utc>,
}

impl Order {
    pub fn grand_total(&self) -> Decimal {
        self.totals.grand_total()
    }
}
