//! Min-max normalization into the unit cube
//!
//! Axis mapping: X = latitude, Y = longitude, Z = timestamp.

use serde::Serialize;

use crate::color::{ColorAssigner, HexColor};
use crate::ingest::RawRecord;

/// Observed range of one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    fn empty() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn include(&mut self, v: f64) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    /// Rescale `v` into [0, 1]; a zero-width range maps everything to 0.5
    pub fn scale(&self, v: f64) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.5;
        }
        (v - self.min) / range
    }

    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }
}

/// Raw-value bounds of a batch, one range per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub latitude: AxisRange,
    pub longitude: AxisRange,
    pub timestamp: AxisRange,
}

impl Bounds {
    /// Single pass over the batch; `None` when it is empty
    pub fn of(records: &[RawRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let mut bounds = Bounds {
            latitude: AxisRange::empty(),
            longitude: AxisRange::empty(),
            timestamp: AxisRange::empty(),
        };
        for r in records {
            bounds.latitude.include(r.latitude);
            bounds.longitude.include(r.longitude);
            bounds.timestamp.include(r.timestamp_millis as f64);
        }
        Some(bounds)
    }

    pub fn normalize(&self, r: &RawRecord) -> [f64; 3] {
        [
            self.latitude.scale(r.latitude),
            self.longitude.scale(r.longitude),
            self.timestamp.scale(r.timestamp_millis as f64),
        ]
    }
}

/// A record placed in the unit cube, keeping its original values for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPoint {
    pub id: String,
    pub position: [f64; 3],
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_millis: i64,
    pub color: HexColor,
}

/// Normalize a whole batch, preserving input order
pub fn normalize(records: Vec<RawRecord>) -> (Vec<NormalizedPoint>, Option<Bounds>) {
    let Some(bounds) = Bounds::of(&records) else {
        return (Vec::new(), None);
    };

    let mut colors = ColorAssigner::new();
    let points: Vec<NormalizedPoint> = records
        .into_iter()
        .map(|r| NormalizedPoint {
            position: bounds.normalize(&r),
            color: colors.color_for(&r.id),
            latitude: r.latitude,
            longitude: r.longitude,
            timestamp_millis: r.timestamp_millis,
            id: r.id,
        })
        .collect();

    tracing::debug!(
        "Normalized {} points, {} distinct ids",
        points.len(),
        colors.len()
    );
    (points, Some(bounds))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, lat: f64, lon: f64, ts: i64) -> RawRecord {
        RawRecord {
            id: id.to_string(),
            latitude: lat,
            longitude: lon,
            timestamp_millis: ts,
        }
    }

    #[test]
    fn test_extremes_map_to_zero_and_one() {
        let records = vec![
            rec("a", 5.0, -120.0, 3_000),
            rec("b", -5.0, 80.0, 1_000),
            rec("c", 0.0, 0.0, 2_000),
        ];
        let (points, bounds) = normalize(records);
        let bounds = bounds.unwrap();
        assert_eq!(bounds.latitude, AxisRange { min: -5.0, max: 5.0 });

        assert_eq!(points[1].position[0], 0.0);
        assert_eq!(points[0].position[0], 1.0);
        assert_eq!(points[0].position[1], 0.0);
        assert_eq!(points[1].position[1], 1.0);
        assert_eq!(points[1].position[2], 0.0);
        assert_eq!(points[0].position[2], 1.0);
        assert_eq!(points[2].position, [0.5, 0.6, 0.5]);
    }

    #[test]
    fn test_originals_are_kept() {
        let (points, _) = normalize(vec![rec("a", 1.5, 2.5, 10), rec("b", 3.5, 4.5, 20)]);
        assert_eq!(points[0].latitude, 1.5);
        assert_eq!(points[0].longitude, 2.5);
        assert_eq!(points[0].timestamp_millis, 10);
        assert_eq!(points[0].id, "a");
    }

    #[test]
    fn test_reordering_permutes_outputs() {
        let records = vec![
            rec("a", 1.0, 9.0, 100),
            rec("b", 4.0, 3.0, 400),
            rec("c", 2.0, 6.0, 250),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let (forward, _) = normalize(records.clone());
        let (backward, _) = normalize(reversed);
        let (again, _) = normalize(records);

        assert_eq!(forward, again);
        for (f, b) in forward.iter().zip(backward.iter().rev()) {
            assert_eq!(f, b);
        }
    }

    #[test]
    fn test_shared_id_shares_color() {
        let (points, _) = normalize(vec![
            rec("bus-7", 0.0, 0.0, 0),
            rec("bus-9", 1.0, 1.0, 1),
            rec("bus-7", 2.0, 2.0, 2),
        ]);
        assert_eq!(points[0].color, points[2].color);
        assert_ne!(points[0].color, points[1].color);
    }

    #[test]
    fn test_degenerate_axis_maps_to_center() {
        let (points, bounds) = normalize(vec![rec("a", 7.0, 1.0, 5), rec("b", 7.0, 2.0, 5)]);
        let bounds = bounds.unwrap();
        assert!(bounds.latitude.is_degenerate());
        assert!(!bounds.longitude.is_degenerate());
        for p in &points {
            assert_eq!(p.position[0], 0.5);
            assert_eq!(p.position[2], 0.5);
        }
        assert_eq!(points[1].position[1], 1.0);
    }

    #[test]
    fn test_empty_batch() {
        let (points, bounds) = normalize(Vec::new());
        assert!(points.is_empty());
        assert!(bounds.is_none());
    }
}
