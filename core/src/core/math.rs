//! Numeric conventions shared across the simulation.
//!
//! Physical quantities (deficits, volumes, requirements) are `f64` and
//! accumulate over thousands of daily timesteps. Two conventions keep the
//! accounting stable:
//!
//! 1. Stored quantities are rounded to 4 decimal places (`round4`)
//! 2. Values within `TOLERANCE` of zero are snapped to exactly 0.0
//!    (`snap_zero`) before they are stored or compared

/// Absolute tolerance for treating a floating value as zero.
pub const TOLERANCE: f64 = 1e-6;

/// Round to 4 decimal places.
///
/// Applied to every stored deficit, requirement, and ledger total to stop
/// floating accumulation drift across long simulations.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// True if `value` is within `TOLERANCE` of zero.
pub fn approx_zero(value: f64) -> bool {
    value.abs() <= TOLERANCE
}

/// Snap values within `TOLERANCE` of zero to exactly 0.0.
///
/// Prevents tolerance-induced false negatives/positives in later invariant
/// checks (e.g. a ledger balance of `-1e-12` failing a non-negativity test).
pub fn snap_zero(value: f64) -> f64 {
    if approx_zero(value) {
        0.0
    } else {
        value
    }
}
