pub mod engine;
pub mod states;

pub use engine::{
    FunnelDefinition, FunnelEngine, FunnelNavigator, FunnelTransitionError, GiftFunnel,
};
pub use states::{FunnelAction, FunnelContext, FunnelEvent, FunnelStep, TransitionOutcome};
