//! Fixed-point money representation shared across the workspace.
//!
//! Monetary quantities are carried as integer micros (1e-6 USD) so that
//! accumulation and comparison are exact. Ratios (weights, confidence,
//! percentages) stay `f64` since they are dimensionless.

/// Canonical micros scale: 1 USD = 1_000_000 micros.
pub const MICROS_SCALE: i64 = 1_000_000;

pub fn usd_to_micros(usd: f64) -> i64 {
    (usd * MICROS_SCALE as f64).round() as i64
}

pub fn micros_to_usd(micros: i64) -> f64 {
    micros as f64 / MICROS_SCALE as f64
}
