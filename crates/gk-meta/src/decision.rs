use std::collections::HashMap;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use gk_schemas::meta::{GlobalTradingState, MetaDecision, RegimeType, StrategyState};

use crate::{ExecutionQuality, LiquidityObservation, SystemStress, Thresholds, CRITICAL_AGENTS};

/// Strategies kept enabled when the global state drops out of `Normal`.
/// Everything else is disabled until conditions recover.
const CONSERVATIVE_STRATEGIES: [&str; 1] = ["mean_reversion"];

/// Strategies disabled outright in a choppy regime, where trend-following
/// edge decays fastest.
const TREND_STRATEGIES: [&str; 1] = ["trend_following"];

pub fn initializing_decision(now: DateTime<Utc>) -> MetaDecision {
    MetaDecision {
        global_state: GlobalTradingState::Halted,
        strategy_states: HashMap::new(),
        size_multipliers: HashMap::new(),
        regime: RegimeType::Choppy,
        confidence: 0.0,
        reason_codes: vec!["system_initializing".into()],
        decided_at: now,
        expires_at: now + ChronoDuration::minutes(5),
    }
}

pub fn fail_safe_decision(strategies: &[String], reason: &str, now: DateTime<Utc>) -> MetaDecision {
    MetaDecision {
        global_state: GlobalTradingState::Halted,
        strategy_states: strategies
            .iter()
            .map(|s| (s.clone(), StrategyState::Disable))
            .collect(),
        size_multipliers: strategies.iter().map(|s| (s.clone(), 0.0)).collect(),
        regime: RegimeType::Crisis,
        confidence: 0.0,
        reason_codes: vec![reason.to_string(), "fail_safe_activated".into()],
        decided_at: now,
        expires_at: now + ChronoDuration::minutes(5),
    }
}

fn halted_decision(
    strategies: &[String],
    regime: RegimeType,
    confidence: f64,
    reason_codes: Vec<String>,
    now: DateTime<Utc>,
) -> MetaDecision {
    MetaDecision {
        global_state: GlobalTradingState::Halted,
        strategy_states: strategies
            .iter()
            .map(|s| (s.clone(), StrategyState::Disable))
            .collect(),
        size_multipliers: strategies.iter().map(|s| (s.clone(), 0.0)).collect(),
        regime,
        confidence,
        reason_codes,
        decided_at: now,
        expires_at: now + ChronoDuration::minutes(1),
    }
}

/// Full port of the original decision pipeline: seven ordered checks plus
/// a finalize step. Any missing, anomalous, or conflicting input fails
/// safe toward `Halted`/`Disable`, never toward `Normal`/`Enable`.
#[allow(clippy::too_many_arguments)]
pub fn make_decision(
    strategies: &[String],
    thresholds: &Thresholds,
    volatility_data: &HashMap<String, f64>,
    liquidity_data: &HashMap<String, LiquidityObservation>,
    execution_quality: &HashMap<String, ExecutionQuality>,
    correlation_matrix: &HashMap<(String, String), f64>,
    system_stress: &SystemStress,
    agent_missing: impl Fn(&str) -> bool,
    now: DateTime<Utc>,
) -> MetaDecision {
    let mut reason_codes = Vec::new();

    // Check 1: data freshness.
    if volatility_data.is_empty() {
        reason_codes.push("no_market_data".to_string());
        return halted_decision(strategies, RegimeType::Choppy, 0.0, reason_codes, now);
    }

    // Check 2: critical-agent health.
    let mut confidence: f64 = 1.0;
    let mut global_state = GlobalTradingState::Normal;
    for agent_id in CRITICAL_AGENTS {
        if agent_missing(agent_id) {
            reason_codes.push(format!("agent_missing:{agent_id}"));
            global_state = GlobalTradingState::Halted;
            confidence = 0.0;
        }
    }
    if global_state == GlobalTradingState::Halted {
        return halted_decision(strategies, RegimeType::Crisis, confidence, reason_codes, now);
    }

    // Check 3: volatility regime.
    let avg_volatility = volatility_data.values().sum::<f64>() / volatility_data.len() as f64;
    let regime = classify_regime(thresholds, avg_volatility);

    let mut strategy_states: HashMap<String, StrategyState> = strategies
        .iter()
        .map(|s| (s.clone(), StrategyState::Enable))
        .collect();
    let mut size_multipliers: HashMap<String, f64> =
        strategies.iter().map(|s| (s.clone(), 1.0)).collect();

    match regime {
        RegimeType::Crisis => {
            reason_codes.push("volatility_crisis".into());
            global_state = GlobalTradingState::Halted;
            confidence *= 0.1;
        }
        RegimeType::Volatile => {
            reason_codes.push("high_volatility".into());
            global_state = GlobalTradingState::ReduceOnly;
            for m in size_multipliers.values_mut() {
                *m = 0.25;
            }
            confidence *= 0.5;
        }
        RegimeType::Choppy => {
            reason_codes.push("choppy_market".into());
            for trend_strategy in TREND_STRATEGIES {
                if let Some(state) = strategy_states.get_mut(trend_strategy) {
                    *state = StrategyState::Disable;
                }
            }
            for m in size_multipliers.values_mut() {
                *m *= 0.5;
            }
            confidence *= 0.7;
        }
        RegimeType::Trending | RegimeType::Ranging => {}
    }

    if global_state == GlobalTradingState::Halted {
        return halted_decision(strategies, regime, confidence, reason_codes, now);
    }

    // Check 4: liquidity / spread conditions.
    let mut degraded_liquidity = false;
    for (instrument, liq) in liquidity_data {
        if liq.spread > thresholds.spread_degraded {
            degraded_liquidity = true;
            reason_codes.push(format!("spread_wide:{instrument}"));
        }
    }
    if degraded_liquidity {
        for m in size_multipliers.values_mut() {
            *m *= 0.5;
        }
        confidence *= 0.8;
    }

    // Check 5: execution quality.
    for (strategy, eq) in execution_quality {
        if eq.avg_slippage() > thresholds.slippage_max {
            reason_codes.push(format!("high_slippage:{strategy}"));
            strategy_states.insert(strategy.clone(), StrategyState::ReduceSize);
            if let Some(m) = size_multipliers.get_mut(strategy) {
                *m *= 0.5;
            }
        }
    }

    // Check 6: system stress.
    if system_stress.critical_alerts > 3 {
        reason_codes.push("excessive_critical_alerts".into());
        global_state = GlobalTradingState::ReduceOnly;
        confidence *= 0.5;
    }

    // Check 7: correlation regime.
    let high_correlation = correlation_matrix
        .values()
        .filter(|c| **c > thresholds.correlation_high)
        .count();
    if high_correlation > 2 {
        reason_codes.push("high_correlation".into());
        for m in size_multipliers.values_mut() {
            *m *= 0.7;
        }
    }

    // Finalize: outside Normal, only conservative strategies stay enabled.
    if global_state != GlobalTradingState::Normal {
        for strategy in strategies {
            if !CONSERVATIVE_STRATEGIES.contains(&strategy.as_str()) {
                strategy_states.insert(strategy.clone(), StrategyState::Disable);
            }
        }
    }

    if reason_codes.is_empty() {
        reason_codes.push("conditions_normal".into());
    }

    MetaDecision {
        global_state,
        strategy_states,
        size_multipliers,
        regime,
        confidence: confidence.clamp(0.0, 1.0),
        reason_codes,
        decided_at: now,
        expires_at: now + ChronoDuration::seconds(30),
    }
}

fn classify_regime(thresholds: &Thresholds, volatility: f64) -> RegimeType {
    if volatility >= thresholds.volatility_crisis {
        RegimeType::Crisis
    } else if volatility >= thresholds.volatility_high {
        RegimeType::Volatile
    } else if volatility >= thresholds.volatility_normal {
        RegimeType::Choppy
    } else {
        RegimeType::Trending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategies() -> Vec<String> {
        vec!["trend_following".into(), "mean_reversion".into(), "funding_arbitrage".into()]
    }

    #[test]
    fn no_market_data_halts_and_disables_everything() {
        let decision = make_decision(
            &strategies(),
            &Thresholds::default(),
            &HashMap::new(),
            &HashMap::new(),
            &HashMap::new(),
            &HashMap::new(),
            &SystemStress::default(),
            |_| false,
            Utc::now(),
        );
        assert_eq!(decision.global_state, GlobalTradingState::Halted);
        assert!(decision.strategy_states.values().all(|s| *s == StrategyState::Disable));
        assert_eq!(decision.confidence, 0.0);
    }

    #[test]
    fn missing_critical_agent_halts() {
        let mut volatility = HashMap::new();
        volatility.insert("BTC-USD".to_string(), 0.001);
        let decision = make_decision(
            &strategies(),
            &Thresholds::default(),
            &volatility,
            &HashMap::new(),
            &HashMap::new(),
            &HashMap::new(),
            &SystemStress::default(),
            |agent_id| agent_id == "risk-agent",
            Utc::now(),
        );
        assert_eq!(decision.global_state, GlobalTradingState::Halted);
        assert!(decision.reason_codes.iter().any(|r| r.contains("risk-agent")));
    }

    #[test]
    fn calm_market_with_healthy_agents_trades_normally() {
        let mut volatility = HashMap::new();
        volatility.insert("BTC-USD".to_string(), 0.0005);
        let decision = make_decision(
            &strategies(),
            &Thresholds::default(),
            &volatility,
            &HashMap::new(),
            &HashMap::new(),
            &HashMap::new(),
            &SystemStress::default(),
            |_| false,
            Utc::now(),
        );
        assert_eq!(decision.global_state, GlobalTradingState::Normal);
        assert_eq!(decision.regime, RegimeType::Trending);
        assert!(decision
            .strategy_states
            .values()
            .all(|s| *s == StrategyState::Enable));
    }

    #[test]
    fn crisis_volatility_halts_regardless_of_other_inputs() {
        let mut volatility = HashMap::new();
        volatility.insert("BTC-USD".to_string(), 0.2);
        let decision = make_decision(
            &strategies(),
            &Thresholds::default(),
            &volatility,
            &HashMap::new(),
            &HashMap::new(),
            &HashMap::new(),
            &SystemStress::default(),
            |_| false,
            Utc::now(),
        );
        assert_eq!(decision.global_state, GlobalTradingState::Halted);
        assert_eq!(decision.regime, RegimeType::Crisis);
    }

    #[test]
    fn reduce_only_disables_non_conservative_strategies() {
        let mut volatility = HashMap::new();
        volatility.insert("BTC-USD".to_string(), 0.0005);
        let mut stress = SystemStress::default();
        stress.critical_alerts = 4;
        let decision = make_decision(
            &strategies(),
            &Thresholds::default(),
            &volatility,
            &HashMap::new(),
            &HashMap::new(),
            &HashMap::new(),
            &stress,
            |_| false,
            Utc::now(),
        );
        assert_eq!(decision.global_state, GlobalTradingState::ReduceOnly);
        assert_eq!(
            decision.strategy_states["trend_following"],
            StrategyState::Disable
        );
        assert_eq!(
            decision.strategy_states["mean_reversion"],
            StrategyState::Enable
        );
    }
}
