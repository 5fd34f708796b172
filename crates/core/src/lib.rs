pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod lifecycle;
pub mod pricing;
pub mod referral;
pub mod steps;
pub mod submission;

pub use domain::add_on::{AddOn, AddOnId};
pub use domain::order::{CardDetails, CheckoutForm, FormField, Order, OrderId, PaymentMethod};
pub use domain::product::{Product, ProductId};
pub use domain::quiz::{Budget, Occasion, QuizAnswers, QuizField, QuizOption, Recipient, Style};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{FunnelEngine, FunnelEvent, FunnelNavigator, FunnelStep};
pub use lifecycle::{ScopeError, StepScope};
pub use pricing::{CatalogProvider, PricingSnapshot, SelectionSet, ShippingPolicy, StaticCatalog};
pub use referral::{ReferralCode, ReferralDispatcher, ShareAction, ShareChannel};
pub use steps::{
    CatalogHandoff, CatalogStep, CheckoutError, CheckoutStep, ConfirmationHandoff,
    ConfirmationStep, QuizHandoff, QuizStep, StepError, UpsellHandoff, UpsellStep,
};
pub use submission::{OrderRequest, OrderSubmitter, SimulatedOrderSubmitter, SubmissionError};
