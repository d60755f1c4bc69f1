use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct QuarantineThresholds {
    pub max_drawdown_pct: f64,
    pub max_loss_streak: u32,
    pub min_expectancy_usd: f64,
    pub max_slippage_avg: f64,
}

impl Default for QuarantineThresholds {
    fn default() -> Self {
        Self {
            max_drawdown_pct: 0.15,
            max_loss_streak: 5,
            min_expectancy_usd: 0.0,
            max_slippage_avg: 0.003,
        }
    }
}

/// Per-strategy running totals the allocator derives performance scores
/// and quarantine decisions from.
#[derive(Debug, Clone, Default)]
pub struct StrategyMetrics {
    pub total_pnl_usd: f64,
    pub trade_count: u32,
    pub win_count: u32,
    pub loss_streak: u32,
    pub peak_pnl_usd: f64,
    pub max_drawdown_pct: f64,
    pub total_slippage: f64,
}

impl StrategyMetrics {
    pub fn record_fill(&mut self, pnl: f64, slippage: f64) {
        self.trade_count += 1;
        self.total_pnl_usd += pnl;
        self.total_slippage += slippage.abs();

        if pnl > 0.0 {
            self.win_count += 1;
            self.loss_streak = 0;
        } else {
            self.loss_streak += 1;
        }

        if self.total_pnl_usd > self.peak_pnl_usd {
            self.peak_pnl_usd = self.total_pnl_usd;
        }
        let drawdown = (self.peak_pnl_usd - self.total_pnl_usd) / self.peak_pnl_usd.max(1.0);
        if drawdown > self.max_drawdown_pct {
            self.max_drawdown_pct = drawdown;
        }
    }

    pub fn avg_slippage(&self) -> f64 {
        if self.trade_count == 0 {
            0.0
        } else {
            self.total_slippage / self.trade_count as f64
        }
    }

    pub fn avg_pnl(&self) -> f64 {
        if self.trade_count == 0 {
            0.0
        } else {
            self.total_pnl_usd / self.trade_count as f64
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.trade_count == 0 {
            0.0
        } else {
            self.win_count as f64 / self.trade_count as f64
        }
    }

    /// Reasons a strategy should be quarantined, empty if it's clean.
    pub fn quarantine_reasons(&self, thresholds: &QuarantineThresholds) -> Vec<String> {
        let mut reasons = Vec::new();

        if self.max_drawdown_pct > thresholds.max_drawdown_pct {
            reasons.push(format!("drawdown:{:.1}%", self.max_drawdown_pct * 100.0));
        }
        if self.loss_streak >= thresholds.max_loss_streak {
            reasons.push(format!("loss_streak:{}", self.loss_streak));
        }
        if self.trade_count > 10 && self.avg_pnl() < thresholds.min_expectancy_usd {
            reasons.push(format!("negative_expectancy:{:.2}", self.avg_pnl()));
        }
        if self.trade_count > 0 && self.avg_slippage() > thresholds.max_slippage_avg {
            reasons.push(format!("high_slippage:{:.4}", self.avg_slippage()));
        }
        reasons
    }

    /// Performance multiplier in `[0.0, 1.5]`. Strategies with fewer than
    /// 5 trades get the neutral default of 0.5 rather than being scored on
    /// insufficient data.
    pub fn performance_score(&self) -> f64 {
        if self.trade_count < 5 {
            return 0.5;
        }
        let win_rate_score = self.win_rate().clamp(0.3, 1.0) * 1.5;
        let avg_pnl = self.avg_pnl();
        let expectancy_score = if avg_pnl > 0.0 {
            (1.0 + avg_pnl / 100.0).min(1.5)
        } else {
            (1.0 + avg_pnl / 50.0).max(0.0)
        };
        ((win_rate_score + expectancy_score) / 2.0).min(1.5)
    }
}

/// Strategies whose exposure moves together; enabling more than one at a
/// time draws a correlation penalty on every member.
pub fn correlation_groups() -> HashMap<&'static str, Vec<&'static str>> {
    HashMap::from([
        ("trend_following", vec!["momentum"]),
        ("momentum", vec!["trend_following", "breakout"]),
        ("breakout", vec!["momentum"]),
        ("mean_reversion", vec![]),
        ("funding_arbitrage", vec![]),
    ])
}

pub fn base_weights() -> HashMap<&'static str, f64> {
    HashMap::from([
        ("trend_following", 0.30),
        ("mean_reversion", 0.25),
        ("funding_arbitrage", 0.20),
        ("momentum", 0.15),
        ("breakout", 0.10),
    ])
}

pub fn regime_multiplier(regime: gk_schemas::meta::RegimeType) -> f64 {
    use gk_schemas::meta::RegimeType::*;
    match regime {
        Trending => 1.0,
        Ranging => 0.8,
        Choppy => 0.5,
        Volatile => 0.3,
        Crisis => 0.0,
    }
}
