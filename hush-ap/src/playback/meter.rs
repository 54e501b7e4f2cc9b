//! Power-to-loudness mapping for visual feedback

/// Power at or below which loudness reads 0 (dBFS)
pub const FLOOR_DB: f32 = -60.0;

/// Map average power in dBFS to a normalized loudness in [0, 1].
///
/// Linear over the top 60 dB: 0 dB → 1.0, -30 dB → 0.5, ≤ -60 dB → 0.0.
/// Missing or non-finite readings map to 0.
///
/// ```
/// use hush_ap::playback::meter::loudness_from_power_db;
///
/// assert_eq!(loudness_from_power_db(Some(0.0)), 1.0);
/// assert_eq!(loudness_from_power_db(Some(-30.0)), 0.5);
/// assert_eq!(loudness_from_power_db(None), 0.0);
/// ```
pub fn loudness_from_power_db(power_db: Option<f32>) -> f32 {
    match power_db {
        Some(db) if db.is_finite() => ((db - FLOOR_DB) / -FLOOR_DB).clamp(0.0, 1.0),
        _ => 0.0,
    }
}
