use std::collections::HashMap;

use chrono::{DateTime, Utc};
use gk_schemas::portfolio::{PortfolioAllocation, StrategyAllocation};

use crate::types::{base_weights, correlation_groups, StrategyMetrics};

const RISK_BUDGET_FRACTION: f64 = 0.02;
const EXPOSURE_LEVERAGE_CAP: f64 = 2.0;
const DRAWDOWN_REDUCTION_START: f64 = 0.05;
const MAX_DRAWDOWN_REDUCTION: f64 = 0.8;

/// Correlation penalty in `[0.0, 0.5]` based on how many correlated peers
/// were non-zero-weighted as of the *previous* allocation. Intentionally
/// one cycle lagged, matching how the upstream system avoided a
/// simultaneous-equations solve across strategies.
fn correlation_penalty(strategy_id: &str, previous: &HashMap<String, StrategyAllocation>, quarantined: &HashMap<String, String>) -> f64 {
    let groups = correlation_groups();
    let correlated = groups.get(strategy_id).cloned().unwrap_or_default();
    let active = correlated
        .iter()
        .filter(|peer| !quarantined.contains_key(**peer))
        .filter(|peer| previous.get(**peer).map(|a| a.weight > 0.0).unwrap_or(false))
        .count();
    (active as f64 * 0.15).min(0.5)
}

/// Full reallocation pass: base weight → regime → quarantine/performance
/// → correlation → drawdown reduction → USD risk budget and exposure cap.
pub fn reallocate(
    total_capital_usd: f64,
    regime_mult: f64,
    metrics: &HashMap<String, StrategyMetrics>,
    quarantined: &HashMap<String, String>,
    previous: &HashMap<String, StrategyAllocation>,
    now: DateTime<Utc>,
) -> PortfolioAllocation {
    let empty_metrics = StrategyMetrics::default();
    let mut allocations = HashMap::new();

    for (strategy_id, base_weight) in base_weights() {
        let strategy_metrics = metrics.get(strategy_id).unwrap_or(&empty_metrics);
        let mut weight = base_weight * regime_mult;

        let (performance_score, correlation_pen) = if quarantined.contains_key(strategy_id) {
            weight = 0.0;
            (strategy_metrics.performance_score(), 0.0)
        } else {
            let performance_score = strategy_metrics.performance_score();
            weight *= performance_score;

            let correlation_pen = correlation_penalty(strategy_id, previous, quarantined);
            weight *= 1.0 - correlation_pen;

            if strategy_metrics.max_drawdown_pct > DRAWDOWN_REDUCTION_START {
                let drawdown_factor = 1.0 - (strategy_metrics.max_drawdown_pct * 2.0).min(MAX_DRAWDOWN_REDUCTION);
                weight *= drawdown_factor;
            }
            (performance_score, correlation_pen)
        };

        let weight = weight.clamp(0.0, 1.0);
        let strategy_capital = total_capital_usd * weight;

        allocations.insert(
            strategy_id.to_string(),
            StrategyAllocation {
                strategy_id: strategy_id.to_string(),
                weight,
                risk_budget_usd: strategy_capital * RISK_BUDGET_FRACTION,
                exposure_cap_usd: strategy_capital * EXPOSURE_LEVERAGE_CAP,
                is_quarantined: quarantined.contains_key(strategy_id),
                quarantine_reason: quarantined.get(strategy_id).cloned(),
                performance_score,
                correlation_penalty: correlation_pen,
            },
        );
    }

    let total_weight: f64 = allocations.values().map(|a| a.weight).sum();
    let deployed_capital_usd = total_capital_usd * total_weight;

    PortfolioAllocation {
        allocations,
        total_capital_usd,
        deployed_capital_usd,
        cash_reserve_pct: 1.0 - total_weight,
        regime_multiplier: regime_mult,
        decided_at: now,
    }
}
