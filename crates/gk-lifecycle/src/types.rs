//! Transition thresholds and the per-strategy metrics tracker that feeds
//! them. A `Fill` carries only the raw trade outcome (pnl, slippage); the
//! four lifecycle inputs (`edge_decay_pct`, `performance_vs_expectation`,
//! `current_drawdown_pct`, `execution_quality`) are rolling derivations
//! this crate computes itself, mirroring the style of
//! `gk_allocation::types::StrategyMetrics` (a different consumer of the
//! same raw fills, scoring for a different purpose).

use std::collections::VecDeque;

use chrono::Duration;

/// Mirrors `StrategyLifecycleManager._thresholds` in the original agent.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleThresholds {
    pub edge_decay_max: f64,
    pub performance_ratio_min: f64,
    pub drawdown_quarantine: f64,
    pub execution_quality_min: f64,
    pub quarantine_min_duration: Duration,
    pub recovery_performance_min: f64,
    pub max_quarantine_count_30d: u32,
}

impl Default for LifecycleThresholds {
    fn default() -> Self {
        Self {
            edge_decay_max: 0.30,
            performance_ratio_min: 0.70,
            drawdown_quarantine: 0.10,
            execution_quality_min: 0.90,
            quarantine_min_duration: Duration::hours(4),
            recovery_performance_min: 1.0,
            max_quarantine_count_30d: 3,
        }
    }
}

const RECENT_WINDOW: usize = 20;
const MAX_ACCEPTABLE_SLIPPAGE: f64 = 0.003;

/// Rolling per-strategy stats a fill stream is reduced to, and the four
/// `StrategyLifecycle` inputs derived from them.
#[derive(Debug, Clone, Default)]
pub struct StrategyMetricsTracker {
    trade_count: u64,
    total_pnl_usd: f64,
    peak_pnl_usd: f64,
    total_slippage: f64,
    lifetime_wins: u64,
    recent_outcomes: VecDeque<bool>,
}

impl StrategyMetricsTracker {
    pub fn record_fill(&mut self, pnl: f64, slippage: f64) {
        self.trade_count += 1;
        self.total_pnl_usd += pnl;
        self.total_slippage += slippage.abs();

        let win = pnl > 0.0;
        if win {
            self.lifetime_wins += 1;
        }
        self.recent_outcomes.push_back(win);
        if self.recent_outcomes.len() > RECENT_WINDOW {
            self.recent_outcomes.pop_front();
        }

        if self.total_pnl_usd > self.peak_pnl_usd {
            self.peak_pnl_usd = self.total_pnl_usd;
        }
    }

    fn avg_slippage(&self) -> f64 {
        if self.trade_count == 0 {
            0.0
        } else {
            self.total_slippage / self.trade_count as f64
        }
    }

    fn avg_pnl(&self) -> f64 {
        if self.trade_count == 0 {
            0.0
        } else {
            self.total_pnl_usd / self.trade_count as f64
        }
    }

    fn lifetime_win_rate(&self) -> f64 {
        if self.trade_count == 0 {
            0.0
        } else {
            self.lifetime_wins as f64 / self.trade_count as f64
        }
    }

    fn recent_win_rate(&self) -> f64 {
        if self.recent_outcomes.is_empty() {
            return 0.0;
        }
        let wins = self.recent_outcomes.iter().filter(|w| **w).count();
        wins as f64 / self.recent_outcomes.len() as f64
    }

    /// `1.0` until a full recent window exists, so a strategy isn't flagged
    /// for edge decay before it has enough trades to measure a trend.
    pub fn execution_quality(&self) -> f64 {
        if self.trade_count == 0 {
            return 1.0;
        }
        (1.0 - self.avg_slippage() / MAX_ACCEPTABLE_SLIPPAGE).clamp(0.0, 1.0)
    }

    pub fn current_drawdown_pct(&self) -> f64 {
        if self.peak_pnl_usd <= 0.0 {
            return 0.0;
        }
        ((self.peak_pnl_usd - self.total_pnl_usd) / self.peak_pnl_usd.max(1.0)).max(0.0)
    }

    /// `1.0` is "performing exactly as expected"; scaled off average pnl
    /// per trade the same way `performance_score` in the allocator scales
    /// win rate and expectancy into a multiplier around `1.0`.
    pub fn performance_vs_expectation(&self) -> f64 {
        if self.trade_count < 5 {
            return 1.0;
        }
        let win_rate_component = self.lifetime_win_rate().clamp(0.0, 1.0);
        let pnl_component = if self.avg_pnl() > 0.0 {
            (1.0 + self.avg_pnl() / 100.0).min(1.5)
        } else {
            (1.0 + self.avg_pnl() / 50.0).max(0.0)
        };
        (win_rate_component * 0.5 + pnl_component * 0.5).min(1.5)
    }

    /// Drop in recent win rate relative to lifetime win rate, `0.0` when
    /// there isn't a full recent window yet or the strategy has never won.
    pub fn edge_decay_pct(&self) -> f64 {
        if self.recent_outcomes.len() < RECENT_WINDOW {
            return 0.0;
        }
        let lifetime = self.lifetime_win_rate();
        if lifetime <= 0.0 {
            return 0.0;
        }
        ((lifetime - self.recent_win_rate()) / lifetime).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_quality_degrades_with_slippage() {
        let mut tracker = StrategyMetricsTracker::default();
        for _ in 0..5 {
            tracker.record_fill(10.0, 0.006);
        }
        assert!(tracker.execution_quality() < 0.5);
    }

    #[test]
    fn drawdown_tracks_peak_to_trough() {
        let mut tracker = StrategyMetricsTracker::default();
        tracker.record_fill(100.0, 0.0);
        tracker.record_fill(-80.0, 0.0);
        assert!((tracker.current_drawdown_pct() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn edge_decay_needs_a_full_window() {
        let mut tracker = StrategyMetricsTracker::default();
        for _ in 0..10 {
            tracker.record_fill(10.0, 0.0);
        }
        assert_eq!(tracker.edge_decay_pct(), 0.0);
    }

    #[test]
    fn edge_decay_detects_recent_cooling() {
        let mut tracker = StrategyMetricsTracker::default();
        for _ in 0..15 {
            tracker.record_fill(10.0, 0.0);
        }
        for _ in 0..20 {
            tracker.record_fill(-5.0, 0.0);
        }
        assert!(tracker.edge_decay_pct() > 0.0);
    }
}
