//! Common unit constants.

/// Millimetres of water depth over one hectare per megalitre.
///
/// 1 ML spread over 1 ha is 100 mm of depth, so dividing a depth in mm by
/// this constant yields ML/ha and multiplying converts back.
pub const ML_TO_MM: f64 = 100.0;

/// Litres in a megalitre.
pub const LITRES_PER_ML: f64 = 1_000_000.0;

/// Seconds in a day, for flow-rate conversions.
pub const SECONDS_PER_DAY: f64 = 86_400.0;
