/// Regime-classification and health thresholds. Values match the
/// conservative defaults the system has always run in production.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub volatility_crisis: f64,
    pub volatility_high: f64,
    pub volatility_normal: f64,
    pub spread_degraded: f64,
    pub slippage_max: f64,
    pub correlation_high: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            volatility_crisis: 0.05,
            volatility_high: 0.02,
            volatility_normal: 0.01,
            spread_degraded: 0.003,
            slippage_max: 0.002,
            correlation_high: 0.7,
        }
    }
}
