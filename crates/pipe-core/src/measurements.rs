//! Field measurements used to calibrate the attenuation coefficient.
//!
//! Measurements arrive as a comma-separated table with a header row naming
//! at least the `distance_m` and `niveau_dB` columns. Other columns are
//! ignored and may appear in any order.

use serde::{Deserialize, Serialize};
use std::io::Read;

pub const DISTANCE_COLUMN: &str = "distance_m";
pub const LEVEL_COLUMN: &str = "niveau_dB";

/// A single reading: the level measured at some distance from the source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub distance_m: f64,
    pub level_db: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum MeasurementError {
    #[error("failed to read measurements: {0}")]
    Io(#[from] std::io::Error),
    #[error("measurement table has no header row")]
    MissingHeader,
    #[error("measurement table has no `{0}` column")]
    MissingColumn(&'static str),
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: `{value}` in column `{column}` is not a number")]
    InvalidNumber {
        line: usize,
        column: &'static str,
        value: String,
    },
    #[error("{distances} distances but {levels} levels")]
    LengthMismatch { distances: usize, levels: usize },
}

/// Ordered measurement pairs. No ordering or uniqueness is assumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSet {
    points: Vec<Measurement>,
}

impl MeasurementSet {
    pub fn new(points: Vec<Measurement>) -> Self {
        Self { points }
    }

    /// Pair up two columns of equal length.
    pub fn from_columns(distances: &[f64], levels: &[f64]) -> Result<Self, MeasurementError> {
        if distances.len() != levels.len() {
            return Err(MeasurementError::LengthMismatch {
                distances: distances.len(),
                levels: levels.len(),
            });
        }
        let points = distances
            .iter()
            .zip(levels)
            .map(|(&distance_m, &level_db)| Measurement {
                distance_m,
                level_db,
            })
            .collect();
        Ok(Self { points })
    }

    pub fn from_csv_reader<R: Read>(mut reader: R) -> Result<Self, MeasurementError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_csv_str(&text)
    }

    pub fn from_csv_str(text: &str) -> Result<Self, MeasurementError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (_, header) = lines.next().ok_or(MeasurementError::MissingHeader)?;
        let columns: Vec<&str> = split_fields(header.trim_start_matches('\u{feff}')).collect();
        let find = |name: &'static str| {
            columns
                .iter()
                .position(|c| *c == name)
                .ok_or(MeasurementError::MissingColumn(name))
        };
        let distance_idx = find(DISTANCE_COLUMN)?;
        let level_idx = find(LEVEL_COLUMN)?;
        let expected = distance_idx.max(level_idx) + 1;

        let mut points = Vec::new();
        for (line, row) in lines {
            let fields: Vec<&str> = split_fields(row).collect();
            if fields.len() < expected {
                return Err(MeasurementError::ShortRow {
                    line,
                    expected,
                    found: fields.len(),
                });
            }
            let parse = |idx: usize, column: &'static str| {
                fields[idx]
                    .parse::<f64>()
                    .map_err(|_| MeasurementError::InvalidNumber {
                        line,
                        column,
                        value: fields[idx].to_string(),
                    })
            };
            points.push(Measurement {
                distance_m: parse(distance_idx, DISTANCE_COLUMN)?,
                level_db: parse(level_idx, LEVEL_COLUMN)?,
            });
        }

        tracing::debug!("Parsed {} measurements", points.len());
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Measurement] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn distances(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|m| m.distance_m)
    }

    pub fn levels(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|m| m.level_db)
    }
}

fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(',').map(|f| f.trim().trim_matches('"'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_columns() {
        let csv = "distance_m,niveau_dB\n0,72\n1000,62.5\n\n2500,47\n";
        let set = MeasurementSet::from_csv_str(csv).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(
            set.points()[1],
            Measurement {
                distance_m: 1000.0,
                level_db: 62.5
            }
        );
    }

    #[test]
    fn test_columns_located_by_name() {
        let csv = "site,niveau_dB,note,distance_m\nA,70,ok,200\n\"B\", 65 ,, 700\n";
        let set = MeasurementSet::from_csv_str(csv).unwrap();
        let distances: Vec<f64> = set.distances().collect();
        let levels: Vec<f64> = set.levels().collect();
        assert_eq!(distances, vec![200.0, 700.0]);
        assert_eq!(levels, vec![70.0, 65.0]);
    }

    #[test]
    fn test_missing_column() {
        let csv = "distance,niveau_dB\n0,72\n";
        let err = MeasurementSet::from_csv_str(csv).unwrap_err();
        assert!(matches!(err, MeasurementError::MissingColumn("distance_m")));
    }

    #[test]
    fn test_invalid_number_reports_line() {
        let csv = "distance_m,niveau_dB\n0,72\n100,loud\n";
        match MeasurementSet::from_csv_str(csv).unwrap_err() {
            MeasurementError::InvalidNumber {
                line,
                column,
                value,
            } => {
                assert_eq!(line, 3);
                assert_eq!(column, LEVEL_COLUMN);
                assert_eq!(value, "loud");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_row() {
        let csv = "distance_m,niveau_dB\n100\n";
        assert!(matches!(
            MeasurementSet::from_csv_str(csv),
            Err(MeasurementError::ShortRow { line: 2, .. })
        ));
    }

    #[test]
    fn test_empty_input_has_no_header() {
        assert!(matches!(
            MeasurementSet::from_csv_str("\n\n"),
            Err(MeasurementError::MissingHeader)
        ));
    }

    #[test]
    fn test_header_only_is_an_empty_set() {
        let set = MeasurementSet::from_csv_str("distance_m,niveau_dB\n").unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_from_columns_length_mismatch() {
        let err = MeasurementSet::from_columns(&[1.0, 2.0], &[3.0]).unwrap_err();
        assert!(matches!(
            err,
            MeasurementError::LengthMismatch {
                distances: 2,
                levels: 1
            }
        ));
    }

    #[test]
    fn test_from_reader() {
        let csv = b"distance_m,niveau_dB\n10,90\n";
        let set = MeasurementSet::from_csv_reader(&csv[..]).unwrap();
        assert_eq!(set.len(), 1);
    }
}
