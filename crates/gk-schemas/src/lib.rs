//! gk-schemas
//!
//! Shared wire/domain types for the trading control plane. Every other
//! crate in the workspace depends on this one; it owns no behavior beyond
//! constructors and small invariant checks on construction.

pub mod envelope;
pub mod fixedpoint;
pub mod intent;
pub mod meta;
pub mod order;
pub mod portfolio;
pub mod risk;
pub mod strategy;
pub mod venue;

pub use envelope::{Message, Subject};
pub use fixedpoint::{micros_to_usd, usd_to_micros, MICROS_SCALE};
pub use intent::TradeIntent;
pub use meta::{GlobalTradingState, MetaDecision, RegimeType, StrategyState};
pub use order::{Fill, Order, OrderStatus, Side};
pub use portfolio::{PortfolioAllocation, StrategyAllocation};
pub use risk::{RiskAction, RiskDecision};
pub use strategy::{StrategyLifecycle, StrategyLifecycleState, StrategyStateTransition};
pub use venue::{Book, BookStatus, BookType, RiskTier, VenueHealth, VenueStatus};
