//! Built-in strategies: pure functions from a [`MarketSnapshot`] to an
//! optional [`TradeIntent`], grounded on the three example strategies.
//!
//! Each strategy is stateless; the dedup/suppression decision (don't
//! republish the same direction twice in a row) lives one layer up, in
//! [`crate::SignalAgent`], since it needs cross-cycle memory a pure
//! function can't hold.

use chrono::{DateTime, Utc};
use gk_schemas::intent::{Direction, MarketSnapshot, TradeIntent};
use uuid::Uuid;

use crate::types::{FundingArbitrageParams, MeanReversionParams, TrendFollowingParams};

/// A single named strategy evaluated once per market snapshot.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, instrument: &str, snapshot: &MarketSnapshot, now: DateTime<Utc>) -> Option<TradeIntent>;
}

fn new_intent(
    strategy: &'static str,
    instrument: &str,
    direction: Direction,
    confidence: f64,
    target_exposure_usd: f64,
    entry_price: f64,
    stop_loss_pct: f64,
    take_profit_pct: f64,
    horizon_minutes: u32,
) -> TradeIntent {
    TradeIntent {
        id: Uuid::new_v4(),
        strategy: strategy.to_string(),
        instrument: instrument.to_string(),
        direction,
        confidence,
        target_exposure_usd,
        entry_price,
        stop_loss_pct,
        take_profit_pct,
        horizon_minutes,
        is_closing: false,
    }
}

pub struct TrendFollowing {
    pub params: TrendFollowingParams,
}

impl Strategy for TrendFollowing {
    fn name(&self) -> &'static str {
        "trend_following"
    }

    fn evaluate(&self, instrument: &str, snapshot: &MarketSnapshot, _now: DateTime<Utc>) -> Option<TradeIntent> {
        let price = snapshot.price;
        let volume = snapshot.volume_24h;
        if price == 0.0 || volume == 0.0 {
            return None;
        }

        let momentum = snapshot.price_change_24h / price;
        if momentum.abs() < self.params.momentum_threshold {
            return None;
        }

        let direction = if momentum > 0.0 { Direction::Buy } else { Direction::Sell };
        let confidence = (momentum.abs() * self.params.confidence_multiplier * 100.0).min(95.0);
        let target_exposure_usd = (volume * 0.001).min(self.params.max_exposure_per_signal);

        Some(new_intent(
            self.name(),
            instrument,
            direction,
            confidence,
            target_exposure_usd,
            price,
            self.params.stop_loss_pct,
            self.params.take_profit_pct,
            self.params.horizon_minutes,
        ))
    }
}

pub struct MeanReversion {
    pub params: MeanReversionParams,
}

impl Strategy for MeanReversion {
    fn name(&self) -> &'static str {
        "mean_reversion"
    }

    fn evaluate(&self, instrument: &str, snapshot: &MarketSnapshot, _now: DateTime<Utc>) -> Option<TradeIntent> {
        let price = snapshot.price;
        let vwap = snapshot.vwap.unwrap_or(price);
        if price == 0.0 || vwap == 0.0 {
            return None;
        }

        let deviation = (price - vwap) / vwap;
        if deviation.abs() < self.params.std_threshold * 0.01 {
            return None;
        }

        let direction = if deviation > 0.0 { Direction::Sell } else { Direction::Buy };
        let confidence = (deviation.abs() * 100.0 * 2.0).min(90.0);
        let take_profit_pct = deviation.abs() * self.params.reversion_target;

        Some(new_intent(
            self.name(),
            instrument,
            direction,
            confidence,
            self.params.fixed_exposure_usd,
            price,
            self.params.stop_loss_pct,
            take_profit_pct,
            self.params.horizon_minutes,
        ))
    }
}

pub struct FundingArbitrage {
    pub params: FundingArbitrageParams,
}

impl Strategy for FundingArbitrage {
    fn name(&self) -> &'static str {
        "funding_arbitrage"
    }

    fn evaluate(&self, instrument: &str, snapshot: &MarketSnapshot, _now: DateTime<Utc>) -> Option<TradeIntent> {
        let funding_rate = snapshot.funding_rate.unwrap_or(0.0);
        if funding_rate.abs() < self.params.min_spread {
            return None;
        }

        // Positive funding: shorts pay longs, go long. Negative: go short.
        let direction = if funding_rate > 0.0 { Direction::Buy } else { Direction::Sell };
        let target_exposure_usd = (funding_rate.abs() * 1_000_000.0).min(self.params.max_exposure);

        Some(new_intent(
            self.name(),
            instrument,
            direction,
            self.params.confidence,
            target_exposure_usd,
            snapshot.price,
            self.params.stop_loss_pct,
            funding_rate.abs(),
            self.params.horizon_minutes,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            instrument: "BTC-USD".to_string(),
            price: 60_000.0,
            price_change_1m: 0.0,
            price_change_24h: 0.0,
            volume_24h: 0.0,
            vwap: None,
            funding_rate: None,
            spread: 0.0005,
            depth: 1_000_000.0,
        }
    }

    #[test]
    fn trend_following_below_threshold_emits_nothing() {
        let strat = TrendFollowing { params: TrendFollowingParams::default() };
        let mut snap = snapshot();
        snap.price_change_24h = 100.0; // momentum ~ 0.0017, below 0.02
        snap.volume_24h = 1_000_000.0;
        assert!(strat.evaluate("BTC-USD", &snap, now()).is_none());
    }

    #[test]
    fn trend_following_positive_momentum_emits_buy() {
        let strat = TrendFollowing { params: TrendFollowingParams::default() };
        let mut snap = snapshot();
        snap.price_change_24h = 3_000.0; // momentum = 0.05
        snap.volume_24h = 2_000_000.0;
        let intent = strat.evaluate("BTC-USD", &snap, now()).unwrap();
        assert_eq!(intent.direction, Direction::Buy);
        assert_eq!(intent.strategy, "trend_following");
        assert_eq!(intent.target_exposure_usd, 2_000.0);
        assert!(intent.confidence > 0.0 && intent.confidence <= 95.0);
    }

    #[test]
    fn trend_following_negative_momentum_emits_sell() {
        let strat = TrendFollowing { params: TrendFollowingParams::default() };
        let mut snap = snapshot();
        snap.price_change_24h = -3_000.0;
        snap.volume_24h = 2_000_000.0;
        let intent = strat.evaluate("BTC-USD", &snap, now()).unwrap();
        assert_eq!(intent.direction, Direction::Sell);
    }

    #[test]
    fn trend_following_exposure_caps_at_max() {
        let strat = TrendFollowing { params: TrendFollowingParams::default() };
        let mut snap = snapshot();
        snap.price_change_24h = 3_000.0;
        snap.volume_24h = 50_000_000.0; // 0.001 * volume would blow past the cap
        let intent = strat.evaluate("BTC-USD", &snap, now()).unwrap();
        assert_eq!(intent.target_exposure_usd, 10_000.0);
    }

    #[test]
    fn mean_reversion_above_vwap_emits_sell() {
        let strat = MeanReversion { params: MeanReversionParams::default() };
        let mut snap = snapshot();
        snap.vwap = Some(58_000.0); // price above vwap -> deviation positive -> sell
        let intent = strat.evaluate("BTC-USD", &snap, now()).unwrap();
        assert_eq!(intent.direction, Direction::Sell);
        assert_eq!(intent.target_exposure_usd, 5_000.0);
    }

    #[test]
    fn mean_reversion_below_vwap_emits_buy() {
        let strat = MeanReversion { params: MeanReversionParams::default() };
        let mut snap = snapshot();
        snap.vwap = Some(62_000.0);
        let intent = strat.evaluate("BTC-USD", &snap, now()).unwrap();
        assert_eq!(intent.direction, Direction::Buy);
    }

    #[test]
    fn mean_reversion_small_deviation_emits_nothing() {
        let strat = MeanReversion { params: MeanReversionParams::default() };
        let mut snap = snapshot();
        snap.vwap = Some(59_950.0); // deviation well under the 2% threshold
        assert!(strat.evaluate("BTC-USD", &snap, now()).is_none());
    }

    #[test]
    fn funding_arbitrage_positive_rate_emits_buy() {
        let strat = FundingArbitrage { params: FundingArbitrageParams::default() };
        let mut snap = snapshot();
        snap.funding_rate = Some(0.01);
        let intent = strat.evaluate("BTC-USD", &snap, now()).unwrap();
        assert_eq!(intent.direction, Direction::Buy);
        assert_eq!(intent.target_exposure_usd, 10_000.0);
    }

    #[test]
    fn funding_arbitrage_negative_rate_emits_sell() {
        let strat = FundingArbitrage { params: FundingArbitrageParams::default() };
        let mut snap = snapshot();
        snap.funding_rate = Some(-0.02);
        let intent = strat.evaluate("BTC-USD", &snap, now()).unwrap();
        assert_eq!(intent.direction, Direction::Sell);
    }

    #[test]
    fn funding_arbitrage_below_min_spread_emits_nothing() {
        let strat = FundingArbitrage { params: FundingArbitrageParams::default() };
        let mut snap = snapshot();
        snap.funding_rate = Some(0.0001);
        assert!(strat.evaluate("BTC-USD", &snap, now()).is_none());
    }

    #[test]
    fn funding_arbitrage_exposure_caps_at_max() {
        let strat = FundingArbitrage { params: FundingArbitrageParams::default() };
        let mut snap = snapshot();
        snap.funding_rate = Some(0.5);
        let intent = strat.evaluate("BTC-USD", &snap, now()).unwrap();
        assert_eq!(intent.target_exposure_usd, 50_000.0);
    }
}
