//! Pure, deterministic risk evaluation. No IO, no bus access — the agent
//! shell in `lib.rs` owns state mutation and publishing.

use chrono::{DateTime, Utc};
use gk_schemas::intent::TradeIntent;
use gk_schemas::meta::{GlobalTradingState, MetaDecision};
use gk_schemas::risk::{RiskAction, RiskDecision};

use crate::types::{RiskLimits, RiskState};

fn rejected(reasons: Vec<String>, now: DateTime<Utc>) -> RiskDecision {
    RiskDecision {
        action: RiskAction::Reject,
        adjusted_exposure_usd: 0.0,
        risk_score: 0,
        reasons,
        evaluated_at: now,
    }
}

/// Every ordered check the original risk agent ran, plus the meta-decision
/// veto that sits upstream of it: a missing, expired, or non-`Normal`
/// [`MetaDecision`] fails the intent before any portfolio-limit check runs.
pub fn evaluate(
    limits: &RiskLimits,
    state: &RiskState,
    intent: &TradeIntent,
    meta: Option<&MetaDecision>,
    now: DateTime<Utc>,
) -> RiskDecision {
    // Check 0: meta-decision veto.
    match meta {
        None => return rejected(vec!["no_meta_decision".into()], now),
        Some(decision) => {
            if decision.is_expired(now) {
                return rejected(vec!["meta_decision_expired".into()], now);
            }
            match decision.global_state {
                GlobalTradingState::Halted => {
                    return rejected(vec!["global_state_halted".into()], now)
                }
                GlobalTradingState::ReduceOnly if !intent.is_closing => {
                    return rejected(vec!["reduce_only_blocks_new_exposure".into()], now)
                }
                _ => {}
            }
            if !decision.strategy_allowed(&intent.strategy) {
                return rejected(vec![format!("strategy_disabled:{}", intent.strategy)], now);
            }
        }
    }

    // Check 1: kill switch.
    if state.kill_switch_triggered {
        return rejected(vec!["kill_switch_active".into()], now);
    }

    // Check 2: agent paused.
    if state.paused {
        return rejected(vec!["risk_agent_paused".into()], now);
    }

    let mut reasons = Vec::new();
    let mut risk_score: u32 = 0;
    let mut adjusted_size = intent.target_exposure_usd;

    // Check 3: confidence threshold.
    if intent.confidence < limits.min_confidence {
        reasons.push(format!(
            "confidence {:.2} below threshold {:.2}",
            intent.confidence, limits.min_confidence
        ));
        risk_score += 20;
    }

    // Check 4: single trade size — scale down rather than reject.
    if adjusted_size > limits.max_single_trade_usd {
        adjusted_size = limits.max_single_trade_usd;
        risk_score += 10;
    }

    // Check 5: position concentration.
    let existing_size = state
        .positions
        .get(&intent.instrument)
        .map(|p| p.size_usd.abs())
        .unwrap_or(0.0);
    let new_total = existing_size + adjusted_size;
    if new_total > limits.max_position_size_usd {
        let remaining_capacity = limits.max_position_size_usd - existing_size;
        if remaining_capacity > 0.0 {
            adjusted_size = remaining_capacity;
            risk_score += 15;
        } else {
            reasons.push(format!(
                "position limit reached for {}: ${existing_size:.2}",
                intent.instrument
            ));
        }
    }

    // Check 6: portfolio exposure.
    const MIN_TRADE_SIZE_USD: f64 = 1_000.0;
    let new_exposure = state.total_exposure_usd + adjusted_size;
    if new_exposure > limits.max_portfolio_exposure_usd {
        let remaining_capacity = limits.max_portfolio_exposure_usd - state.total_exposure_usd;
        if remaining_capacity > MIN_TRADE_SIZE_USD {
            adjusted_size = adjusted_size.min(remaining_capacity);
            risk_score += 15;
        } else {
            reasons.push(format!(
                "portfolio exposure limit: ${:.2}/${:.2}",
                state.total_exposure_usd, limits.max_portfolio_exposure_usd
            ));
        }
    }

    // Check 7: daily loss limit.
    if state.daily_pnl_usd < -limits.max_daily_loss_usd {
        reasons.push(format!("daily loss limit breached: ${:.2}", state.daily_pnl_usd));
    }

    // Check 8: concentration.
    if state.total_exposure_usd > 0.0 {
        let concentration = (new_total / (state.total_exposure_usd + adjusted_size)) * 100.0;
        if concentration > limits.max_concentration_pct {
            reasons.push(format!("concentration too high: {concentration:.1}%"));
            risk_score += 20;
        }
    }

    if reasons.is_empty() {
        RiskDecision {
            action: RiskAction::Approve,
            adjusted_exposure_usd: adjusted_size,
            risk_score,
            reasons: Vec::new(),
            evaluated_at: now,
        }
    } else {
        rejected(reasons, now)
    }
}

/// Whether a daily-loss breach is severe enough to trip the kill switch,
/// independent of whether the evaluator above already rejected the
/// triggering intent.
pub fn should_trip_kill_switch(limits: &RiskLimits, state: &RiskState) -> bool {
    state.daily_pnl_usd < -limits.max_daily_loss_usd * 1.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_schemas::intent::Direction;
    use gk_schemas::meta::{RegimeType, StrategyState};
    use std::collections::HashMap;

    fn intent(strategy: &str, target_exposure_usd: f64, confidence: f64, is_closing: bool) -> TradeIntent {
        TradeIntent {
            id: uuid::Uuid::new_v4(),
            strategy: strategy.into(),
            instrument: "BTC-USD".into(),
            direction: Direction::Buy,
            confidence,
            target_exposure_usd,
            entry_price: 60_000.0,
            stop_loss_pct: 0.02,
            take_profit_pct: 0.04,
            horizon_minutes: 60,
            is_closing,
        }
    }

    fn normal_meta(now: DateTime<Utc>) -> MetaDecision {
        let mut strategy_states = HashMap::new();
        strategy_states.insert("trend_following".to_string(), StrategyState::Enable);
        MetaDecision {
            global_state: GlobalTradingState::Normal,
            strategy_states,
            size_multipliers: HashMap::new(),
            regime: RegimeType::Trending,
            confidence: 1.0,
            reason_codes: vec!["conditions_normal".into()],
            decided_at: now,
            expires_at: now + chrono::Duration::seconds(30),
        }
    }

    #[test]
    fn missing_meta_decision_rejects() {
        let now = Utc::now();
        let decision = evaluate(
            &RiskLimits::default(),
            &RiskState::default(),
            &intent("trend_following", 1000.0, 0.9, false),
            None,
            now,
        );
        assert_eq!(decision.action, RiskAction::Reject);
        assert!(decision.reasons.iter().any(|r| r == "no_meta_decision"));
    }

    #[test]
    fn expired_meta_decision_rejects() {
        let now = Utc::now();
        let mut meta = normal_meta(now);
        meta.expires_at = now - chrono::Duration::seconds(1);
        let decision = evaluate(
            &RiskLimits::default(),
            &RiskState::default(),
            &intent("trend_following", 1000.0, 0.9, false),
            Some(&meta),
            now,
        );
        assert_eq!(decision.action, RiskAction::Reject);
    }

    #[test]
    fn reduce_only_blocks_new_exposure_but_allows_closing() {
        let now = Utc::now();
        let mut meta = normal_meta(now);
        meta.global_state = GlobalTradingState::ReduceOnly;
        let limits = RiskLimits::default();
        let state = RiskState::default();

        let opening = evaluate(&limits, &state, &intent("trend_following", 1000.0, 0.9, false), Some(&meta), now);
        assert_eq!(opening.action, RiskAction::Reject);

        let closing = evaluate(&limits, &state, &intent("trend_following", 1000.0, 0.9, true), Some(&meta), now);
        assert_eq!(closing.action, RiskAction::Approve);
    }

    #[test]
    fn oversized_trade_is_scaled_down_not_rejected() {
        let now = Utc::now();
        let meta = normal_meta(now);
        let decision = evaluate(
            &RiskLimits::default(),
            &RiskState::default(),
            &intent("trend_following", 100_000.0, 0.9, false),
            Some(&meta),
            now,
        );
        assert_eq!(decision.action, RiskAction::Approve);
        assert_eq!(decision.adjusted_exposure_usd, RiskLimits::default().max_single_trade_usd);
    }

    #[test]
    fn low_confidence_is_scored_but_not_rejected_alone() {
        let now = Utc::now();
        let meta = normal_meta(now);
        let decision = evaluate(
            &RiskLimits::default(),
            &RiskState::default(),
            &intent("trend_following", 1000.0, 0.1, false),
            Some(&meta),
            now,
        );
        assert_eq!(decision.action, RiskAction::Approve);
        assert!(decision.risk_score >= 20);
    }

    #[test]
    fn daily_loss_limit_breach_rejects() {
        let now = Utc::now();
        let meta = normal_meta(now);
        let mut state = RiskState::default();
        state.daily_pnl_usd = -20_000.0;
        let decision = evaluate(&RiskLimits::default(), &state, &intent("trend_following", 1000.0, 0.9, false), Some(&meta), now);
        assert_eq!(decision.action, RiskAction::Reject);
        assert!(should_trip_kill_switch(&RiskLimits::default(), &state));
    }
}
