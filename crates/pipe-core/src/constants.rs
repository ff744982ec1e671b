/// Lowest level reported by the models, in dB SPL. Anything at or below it is
/// treated as inaudible.
pub const AUDIBILITY_FLOOR_DB: f64 = 0.0;

/// Attenuation of a wall placed in the free field, in dB.
pub const WALL_ATTENUATION_DB: f64 = 45.0;

/// Distance from the source at which the wall stands, in metres.
pub const WALL_THRESHOLD_M: f64 = 10.0;

/// Default distance axis: 500 points from 0 to 10 km.
pub const GRID_START_M: f64 = 0.0;
pub const GRID_END_M: f64 = 10_000.0;
pub const GRID_POINTS: usize = 500;

/// Clamp a level to the audibility floor.
pub fn clamp_to_floor(level_db: f64) -> f64 {
    level_db.max(AUDIBILITY_FLOOR_DB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_floor() {
        assert_eq!(clamp_to_floor(-12.5), 0.0);
        assert_eq!(clamp_to_floor(0.0), 0.0);
        assert_eq!(clamp_to_floor(42.0), 42.0);
    }
}
