//! Strategy parameter tables and the signal-agent readiness gate.

use std::sync::atomic::{AtomicBool, Ordering};

/// Whether a host's strategies may publish live intents.
///
/// Mirrors the teacher's `ShadowMode`: strategies still evaluate and the
/// dedup cache still updates under `On`, but nothing reaches the bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ShadowMode {
    #[default]
    Off,
    On,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrendFollowingParams {
    pub momentum_threshold: f64,
    pub confidence_multiplier: f64,
    pub max_exposure_per_signal: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub horizon_minutes: u32,
}

impl Default for TrendFollowingParams {
    fn default() -> Self {
        Self {
            momentum_threshold: 0.02,
            confidence_multiplier: 1.5,
            max_exposure_per_signal: 10_000.0,
            stop_loss_pct: 0.02,
            take_profit_pct: 0.04,
            horizon_minutes: 60,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeanReversionParams {
    pub std_threshold: f64,
    pub reversion_target: f64,
    pub fixed_exposure_usd: f64,
    pub stop_loss_pct: f64,
    pub horizon_minutes: u32,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        Self {
            std_threshold: 2.0,
            reversion_target: 0.5,
            fixed_exposure_usd: 5_000.0,
            stop_loss_pct: 0.015,
            horizon_minutes: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FundingArbitrageParams {
    pub min_spread: f64,
    pub max_exposure: f64,
    pub confidence: f64,
    pub stop_loss_pct: f64,
    pub horizon_minutes: u32,
}

impl Default for FundingArbitrageParams {
    fn default() -> Self {
        Self {
            min_spread: 0.001,
            max_exposure: 50_000.0,
            confidence: 75.0,
            stop_loss_pct: 0.01,
            horizon_minutes: 480,
        }
    }
}

/// Shared precondition gate: signal agents hold their first publish until
/// both Meta-Decision and Risk have shown at least one heartbeat.
///
/// The orchestrator owns the write side (`mark_meta_ready`/`mark_risk_ready`);
/// every `SignalAgent` holds a clone of the same `Arc` and only reads it.
#[derive(Default)]
pub struct ReadinessGate {
    meta_ready: AtomicBool,
    risk_ready: AtomicBool,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_meta_ready(&self) {
        self.meta_ready.store(true, Ordering::Relaxed);
    }

    pub fn mark_risk_ready(&self) {
        self.risk_ready.store(true, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.meta_ready.load(Ordering::Relaxed) && self.risk_ready.load(Ordering::Relaxed)
    }
}
