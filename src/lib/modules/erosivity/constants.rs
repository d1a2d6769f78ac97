/// Rains separated by less than this are one rain
pub const RAIN_PAUSE_MINUTES: i64 = 6 * 60;
pub const I30_WINDOW_MINUTES: i64 = 30;

/// I30 above which a rain is erosive [mm/h]
pub const EROSIVE_I30: f32 = 10.0;
/// Rain sum from which a rain is erosive [mm]
pub const EROSIVE_SUM: f32 = 10.0;
/// I30 above which a rain is discarded [mm/h]
pub const MAX_I30: f32 = 40.0;

// kinetic energy of an interval, I in mm/h and N in mm
pub const ENERGY_MIN_INTENSITY: f64 = 0.05; // mm/h
pub const ENERGY_MAX_INTENSITY: f64 = 76.2; // mm/h
pub const ENERGY_OFFSET: f64 = 11.89;
pub const ENERGY_SLOPE: f64 = 8.73;
pub const ENERGY_MAX: f64 = 28.33;
pub const ENERGY_SCALE: f64 = 1e-3;
