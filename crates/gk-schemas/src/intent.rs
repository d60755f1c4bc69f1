use serde::{Deserialize, Serialize};

/// A market observation published to `market_data`.
///
/// Matches the field names signal and meta-decision agents key off of in
/// the upstream system: `price_change_1m` drives volatility, `spread`/
/// `depth` drive liquidity, `price_change_24h`/`volume_24h`/`vwap`/
/// `funding_rate` drive the built-in strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub instrument: String,
    pub price: f64,
    pub price_change_1m: f64,
    pub price_change_24h: f64,
    pub volume_24h: f64,
    pub vwap: Option<f64>,
    pub funding_rate: Option<f64>,
    pub spread: f64,
    pub depth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Buy,
    Sell,
}

/// A strategy's proposed trade, published to `risk_check` for approval.
///
/// `is_closing` resolves the spec's "closing intent" open question
/// explicitly: the Risk agent consults this flag (never instrument/position
/// inference) to decide whether an intent survives a `REDUCE_ONLY` gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeIntent {
    pub id: uuid::Uuid,
    pub strategy: String,
    pub instrument: String,
    pub direction: Direction,
    pub confidence: f64,
    pub target_exposure_usd: f64,
    pub entry_price: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub horizon_minutes: u32,
    pub is_closing: bool,
}
