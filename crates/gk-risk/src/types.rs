use std::collections::HashMap;

/// Configurable risk limits. In a deployed system these would be loaded
/// through `gk-config`; defaults here match the conservative values the
/// desk has always run with.
#[derive(Debug, Clone, Copy)]
pub struct RiskLimits {
    pub max_position_size_usd: f64,
    pub max_portfolio_exposure_usd: f64,
    pub max_single_trade_usd: f64,
    pub max_concentration_pct: f64,
    pub max_daily_loss_usd: f64,
    pub min_confidence: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_size_usd: 50_000.0,
            max_portfolio_exposure_usd: 500_000.0,
            max_single_trade_usd: 25_000.0,
            max_concentration_pct: 25.0,
            max_daily_loss_usd: 10_000.0,
            min_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Position {
    pub size_usd: f64,
}

/// Mutable portfolio state the evaluator reads and `apply_fill` updates.
/// Kept separate from `RiskLimits` so the evaluator stays a pure function
/// of `(limits, state, intent)`.
#[derive(Debug, Clone, Default)]
pub struct RiskState {
    pub positions: HashMap<String, Position>,
    pub total_exposure_usd: f64,
    pub daily_pnl_usd: f64,
    pub kill_switch_triggered: bool,
    pub paused: bool,
}

impl RiskState {
    pub fn apply_fill(&mut self, fill: &gk_schemas::order::Fill) {
        use gk_schemas::order::Side;

        let position = self
            .positions
            .entry(fill.instrument.clone())
            .or_insert(Position { size_usd: 0.0 });
        match fill.side {
            Side::Buy => position.size_usd += fill.size_usd,
            Side::Sell => position.size_usd -= fill.size_usd,
        }
        if position.size_usd.abs() < 1.0 {
            self.positions.remove(&fill.instrument);
        }

        self.total_exposure_usd = self.positions.values().map(|p| p.size_usd.abs()).sum();
        self.daily_pnl_usd += fill.pnl;
    }
}
