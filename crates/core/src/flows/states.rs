use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStep {
    Landing,
    Quiz,
    Catalog,
    Upsell,
    Checkout,
    Confirmation,
}

impl FunnelStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::Quiz => "quiz",
            Self::Catalog => "catalog",
            Self::Upsell => "upsell",
            Self::Checkout => "checkout",
            Self::Confirmation => "confirmation",
        }
    }

    /// The step a back request returns to. Landing and Confirmation have none.
    pub fn previous(&self) -> Option<Self> {
        match self {
            Self::Landing | Self::Confirmation => None,
            Self::Quiz => Some(Self::Landing),
            Self::Catalog => Some(Self::Quiz),
            Self::Upsell => Some(Self::Catalog),
            Self::Checkout => Some(Self::Upsell),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunnelEvent {
    StartQuiz,
    BrowseCatalog,
    QuizCompleted,
    ProductsCommitted,
    AddOnsCommitted,
    AddOnsSkipped,
    OrderPlaced,
    BackRequested,
    Restart,
}

/// Facts about the current step that gate forward transitions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FunnelContext {
    pub missing_quiz_fields: Vec<String>,
    pub selected_product_count: usize,
    pub order_placed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunnelAction {
    ShowStep(FunnelStep),
    CarryQuizAnswers,
    CarryProductSelection,
    CarryAddOnSelection,
    FreezeOrderTotals,
    TearDownStep(FunnelStep),
    DiscardDownstreamState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: FunnelStep,
    pub to: FunnelStep,
    pub event: FunnelEvent,
    pub actions: Vec<FunnelAction>,
}
