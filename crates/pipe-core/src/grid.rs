use crate::constants::{GRID_END_M, GRID_POINTS, GRID_START_M};
use serde::{Deserialize, Serialize};

/// Extent and resolution of the distance axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub start_m: f64,
    pub end_m: f64,
    pub points: usize,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            start_m: GRID_START_M,
            end_m: GRID_END_M,
            points: GRID_POINTS,
        }
    }
}

/// Evenly spaced, increasing distances in metres.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceGrid {
    distances: Vec<f64>,
}

impl DistanceGrid {
    /// `points` evenly spaced distances from `start` to `end`, both included.
    pub fn linspace(start: f64, end: f64, points: usize) -> Self {
        let distances = match points {
            0 => Vec::new(),
            1 => vec![start],
            n => {
                let step = (end - start) / (n - 1) as f64;
                let mut d: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
                // Pin the last sample so the axis ends exactly at `end`.
                d[n - 1] = end;
                d
            }
        };
        Self { distances }
    }

    pub fn from_settings(settings: &GridSettings) -> Self {
        Self::linspace(settings.start_m, settings.end_m, settings.points)
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

impl Default for DistanceGrid {
    fn default() -> Self {
        Self::from_settings(&GridSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid() {
        let grid = DistanceGrid::default();
        assert_eq!(grid.len(), 500);
        assert_eq!(grid.distances()[0], 0.0);
        assert_eq!(*grid.distances().last().unwrap(), 10_000.0);

        let step = 10_000.0 / 499.0;
        assert!((grid.distances()[1] - step).abs() < 1e-9);
    }

    #[test]
    fn test_strictly_increasing() {
        let grid = DistanceGrid::linspace(5.0, 1_234.5, 97);
        for w in grid.distances().windows(2) {
            assert!(w[1] > w[0], "{} !> {}", w[1], w[0]);
        }
    }

    #[test]
    fn test_degenerate_sizes() {
        assert!(DistanceGrid::linspace(0.0, 10.0, 0).is_empty());
        assert_eq!(DistanceGrid::linspace(3.0, 10.0, 1).distances(), &[3.0]);
        assert_eq!(DistanceGrid::linspace(0.0, 10.0, 2).distances(), &[0.0, 10.0]);
    }
}
