//! Pure transition checks and mutators for a single `StrategyLifecycle`,
//! grounded on `StrategyLifecycleManager`'s `_check_active_to_quarantine`,
//! `_check_quarantine_to_active`, `_check_quarantine_to_disabled`, and
//! `_check_paper_to_active`. Each check is a function of the lifecycle's
//! current metrics/state and the threshold table, returning the transition
//! to apply if one is due; `execute_transition` is the only code that
//! mutates a `StrategyLifecycle`.

use chrono::{DateTime, Utc};
use gk_schemas::strategy::{StrategyLifecycle, StrategyLifecycleState, StrategyStateTransition};

use crate::types::LifecycleThresholds;

const SYSTEM_ACTOR: &str = "lifecycle-manager";

fn check_active_to_quarantine(lifecycle: &StrategyLifecycle, thresholds: &LifecycleThresholds) -> Option<String> {
    let mut reasons = Vec::new();
    if lifecycle.edge_decay_pct > thresholds.edge_decay_max {
        reasons.push(format!("edge_decay:{:.1}%", lifecycle.edge_decay_pct * 100.0));
    }
    if lifecycle.performance_vs_expectation < thresholds.performance_ratio_min {
        reasons.push(format!("performance:{:.2}", lifecycle.performance_vs_expectation));
    }
    if lifecycle.current_drawdown_pct > thresholds.drawdown_quarantine {
        reasons.push(format!("drawdown:{:.1}%", lifecycle.current_drawdown_pct * 100.0));
    }
    if lifecycle.execution_quality < thresholds.execution_quality_min {
        reasons.push(format!("execution_quality:{:.2}", lifecycle.execution_quality));
    }
    if reasons.is_empty() {
        None
    } else {
        Some(reasons.join(", "))
    }
}

fn check_quarantine_to_active(lifecycle: &StrategyLifecycle, thresholds: &LifecycleThresholds, now: DateTime<Utc>) -> bool {
    let Some(expires_at) = lifecycle.quarantine_expires_at else {
        return false;
    };
    now >= expires_at
        && lifecycle.performance_vs_expectation >= thresholds.recovery_performance_min
        && lifecycle.execution_quality >= thresholds.execution_quality_min
}

fn check_quarantine_to_disabled(lifecycle: &StrategyLifecycle, thresholds: &LifecycleThresholds) -> bool {
    lifecycle.quarantine_count_30d >= thresholds.max_quarantine_count_30d
}

/// Evaluate every automatic transition rule for the strategy's current
/// state and return the one that's due, if any. Manual transitions
/// (`manually_disable`/`manually_enable`/`promote_to_active`) are never
/// produced here.
pub fn evaluate_transitions(
    lifecycle: &StrategyLifecycle,
    thresholds: &LifecycleThresholds,
    now: DateTime<Utc>,
) -> Option<StrategyStateTransition> {
    match lifecycle.current_state {
        StrategyLifecycleState::Active => check_active_to_quarantine(lifecycle, thresholds).map(|reason| {
            StrategyStateTransition {
                from_state: StrategyLifecycleState::Active,
                to_state: StrategyLifecycleState::Quarantined,
                reason,
                triggered_by: SYSTEM_ACTOR.to_string(),
                timestamp: now,
            }
        }),
        StrategyLifecycleState::Quarantined => {
            if check_quarantine_to_disabled(lifecycle, thresholds) {
                Some(StrategyStateTransition {
                    from_state: StrategyLifecycleState::Quarantined,
                    to_state: StrategyLifecycleState::Disabled,
                    reason: format!("quarantine_count_30d:{}", lifecycle.quarantine_count_30d),
                    triggered_by: SYSTEM_ACTOR.to_string(),
                    timestamp: now,
                })
            } else if check_quarantine_to_active(lifecycle, thresholds, now) {
                Some(StrategyStateTransition {
                    from_state: StrategyLifecycleState::Quarantined,
                    to_state: StrategyLifecycleState::Active,
                    reason: "recovered".to_string(),
                    triggered_by: SYSTEM_ACTOR.to_string(),
                    timestamp: now,
                })
            } else {
                None
            }
        }
        StrategyLifecycleState::PaperOnly | StrategyLifecycleState::Disabled => None,
    }
}

/// The only function that mutates a `StrategyLifecycle`'s state. Appends
/// an immutable record to `transition_history`, sets or clears the
/// quarantine bookkeeping, and bumps `quarantine_count_30d` only when the
/// destination is `Quarantined`.
pub fn execute_transition(
    lifecycle: &mut StrategyLifecycle,
    transition: StrategyStateTransition,
    thresholds: &LifecycleThresholds,
) {
    lifecycle.current_state = transition.to_state;
    lifecycle.state_entered_at = transition.timestamp;

    match transition.to_state {
        StrategyLifecycleState::Quarantined => {
            lifecycle.quarantine_reason = Some(transition.reason.clone());
            lifecycle.quarantine_expires_at = Some(transition.timestamp + thresholds.quarantine_min_duration);
            lifecycle.quarantine_count_30d += 1;
        }
        _ => {
            lifecycle.quarantine_reason = None;
            lifecycle.quarantine_expires_at = None;
        }
    }

    lifecycle.transition_history.push(transition);
}

/// Administrative override: any state to `Disabled`, always permitted.
pub fn manually_disable(lifecycle: &mut StrategyLifecycle, user_id: &str, now: DateTime<Utc>) {
    let transition = StrategyStateTransition {
        from_state: lifecycle.current_state,
        to_state: StrategyLifecycleState::Disabled,
        reason: "manual_disable".to_string(),
        triggered_by: user_id.to_string(),
        timestamp: now,
    };
    execute_transition(lifecycle, transition, &LifecycleThresholds::default());
}

/// Administrative override: any state back to `PaperOnly`. Re-enabling
/// never jumps straight to `Active` — a strategy always re-proves itself
/// in paper mode first.
pub fn manually_enable(lifecycle: &mut StrategyLifecycle, user_id: &str, now: DateTime<Utc>) {
    let transition = StrategyStateTransition {
        from_state: lifecycle.current_state,
        to_state: StrategyLifecycleState::PaperOnly,
        reason: "manual_enable".to_string(),
        triggered_by: user_id.to_string(),
        timestamp: now,
    };
    execute_transition(lifecycle, transition, &LifecycleThresholds::default());
}

/// Promote a strategy out of paper trading. Only valid from `PaperOnly`;
/// any other starting state is a no-op (the caller should check
/// `current_state` first if it wants to report that back).
pub fn promote_to_active(lifecycle: &mut StrategyLifecycle, user_id: &str, now: DateTime<Utc>) -> bool {
    if lifecycle.current_state != StrategyLifecycleState::PaperOnly {
        return false;
    }
    let transition = StrategyStateTransition {
        from_state: StrategyLifecycleState::PaperOnly,
        to_state: StrategyLifecycleState::Active,
        reason: "manual_promotion".to_string(),
        triggered_by: user_id.to_string(),
        timestamp: now,
    };
    execute_transition(lifecycle, transition, &LifecycleThresholds::default());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn active_lifecycle(now: DateTime<Utc>) -> StrategyLifecycle {
        let mut lifecycle = StrategyLifecycle::new("trend_following", now);
        lifecycle.current_state = StrategyLifecycleState::Active;
        lifecycle
    }

    #[test]
    fn healthy_active_strategy_has_no_transition() {
        let lifecycle = active_lifecycle(now());
        let thresholds = LifecycleThresholds::default();
        assert!(evaluate_transitions(&lifecycle, &thresholds, now()).is_none());
    }

    #[test]
    fn drawdown_above_threshold_quarantines() {
        let mut lifecycle = active_lifecycle(now());
        lifecycle.current_drawdown_pct = 0.25;
        let thresholds = LifecycleThresholds::default();
        let transition = evaluate_transitions(&lifecycle, &thresholds, now()).unwrap();
        assert_eq!(transition.to_state, StrategyLifecycleState::Quarantined);
        assert!(transition.reason.contains("drawdown"));
    }

    #[test]
    fn execute_transition_sets_quarantine_expiry_and_count() {
        let mut lifecycle = active_lifecycle(now());
        let thresholds = LifecycleThresholds::default();
        let transition = StrategyStateTransition {
            from_state: StrategyLifecycleState::Active,
            to_state: StrategyLifecycleState::Quarantined,
            reason: "drawdown".to_string(),
            triggered_by: "lifecycle-manager".to_string(),
            timestamp: now(),
        };
        execute_transition(&mut lifecycle, transition, &thresholds);
        assert_eq!(lifecycle.current_state, StrategyLifecycleState::Quarantined);
        assert_eq!(lifecycle.quarantine_count_30d, 1);
        assert_eq!(lifecycle.quarantine_expires_at, Some(now() + thresholds.quarantine_min_duration));
    }

    #[test]
    fn quarantine_does_not_clear_before_expiry() {
        let mut lifecycle = active_lifecycle(now());
        lifecycle.current_state = StrategyLifecycleState::Quarantined;
        lifecycle.quarantine_expires_at = Some(now() + chrono::Duration::hours(1));
        lifecycle.performance_vs_expectation = 1.2;
        lifecycle.execution_quality = 0.95;
        let thresholds = LifecycleThresholds::default();
        assert!(evaluate_transitions(&lifecycle, &thresholds, now()).is_none());
    }

    #[test]
    fn quarantine_clears_after_expiry_with_recovered_performance() {
        let mut lifecycle = active_lifecycle(now());
        lifecycle.current_state = StrategyLifecycleState::Quarantined;
        lifecycle.quarantine_expires_at = Some(now() - chrono::Duration::minutes(1));
        lifecycle.performance_vs_expectation = 1.1;
        lifecycle.execution_quality = 0.95;
        let thresholds = LifecycleThresholds::default();
        let transition = evaluate_transitions(&lifecycle, &thresholds, now()).unwrap();
        assert_eq!(transition.to_state, StrategyLifecycleState::Active);
    }

    #[test]
    fn third_quarantine_disables_instead_of_recovering() {
        let mut lifecycle = active_lifecycle(now());
        lifecycle.current_state = StrategyLifecycleState::Quarantined;
        lifecycle.quarantine_count_30d = 3;
        lifecycle.quarantine_expires_at = Some(now() - chrono::Duration::minutes(1));
        lifecycle.performance_vs_expectation = 1.1;
        lifecycle.execution_quality = 0.95;
        let thresholds = LifecycleThresholds::default();
        let transition = evaluate_transitions(&lifecycle, &thresholds, now()).unwrap();
        assert_eq!(transition.to_state, StrategyLifecycleState::Disabled);
    }

    #[test]
    fn promote_to_active_only_valid_from_paper_only() {
        let mut lifecycle = StrategyLifecycle::new("mean_reversion", now());
        assert!(promote_to_active(&mut lifecycle, "operator", now()));
        assert_eq!(lifecycle.current_state, StrategyLifecycleState::Active);

        let mut quarantined = active_lifecycle(now());
        quarantined.current_state = StrategyLifecycleState::Quarantined;
        assert!(!promote_to_active(&mut quarantined, "operator", now()));
        assert_eq!(quarantined.current_state, StrategyLifecycleState::Quarantined);
    }

    #[test]
    fn manually_disable_is_always_permitted() {
        let mut lifecycle = active_lifecycle(now());
        manually_disable(&mut lifecycle, "operator", now());
        assert_eq!(lifecycle.current_state, StrategyLifecycleState::Disabled);
        assert_eq!(lifecycle.transition_history.last().unwrap().triggered_by, "operator");
    }

    #[test]
    fn manually_enable_returns_to_paper_only_never_active() {
        let mut lifecycle = active_lifecycle(now());
        manually_disable(&mut lifecycle, "operator", now());
        manually_enable(&mut lifecycle, "operator", now());
        assert_eq!(lifecycle.current_state, StrategyLifecycleState::PaperOnly);
    }
}
