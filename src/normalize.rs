//! Mapping of raw embedding coordinates into render-surface extents.
//!
//! Axis bounds always come from the full unfiltered record set so the plot
//! scale stays stable while shelf filters and sort keys change.

use crate::record::BookRecord;

/// A record placed on the 2D scatter surface, `[0, extent]` per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PlottedBook2 {
    pub record: BookRecord,
    pub x: f64,
    pub y: f64,
}

/// A record placed in the 3D scatter volume, `[-extent/2, extent/2]` per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PlottedBook3 {
    pub record: BookRecord,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy)]
struct AxisBounds {
    min: f64,
    max: f64,
}

impl AxisBounds {
    fn of(values: impl Iterator<Item = f64>) -> AxisBounds {
        let mut bounds = AxisBounds {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        };
        for value in values {
            bounds.min = bounds.min.min(value);
            bounds.max = bounds.max.max(value);
        }
        if bounds.min > bounds.max {
            // Empty input; treat as a degenerate axis at the origin.
            bounds.min = 0.0;
            bounds.max = 0.0;
        }
        bounds
    }

    /// Position of `value` within the bounds as a fraction in `[0, 1]`.
    /// A degenerate axis maps everything to the midpoint, never NaN.
    fn unit(&self, value: f64) -> f64 {
        if self.max == self.min {
            return 0.5;
        }
        (value - self.min) / (self.max - self.min)
    }
}

fn axis_2d(records: &[BookRecord], axis: usize) -> AxisBounds {
    AxisBounds::of(
        records
            .iter()
            .map(move |record| record.position_2d.map_or(0.0, |position| position[axis])),
    )
}

fn axis_3d(records: &[BookRecord], axis: usize) -> AxisBounds {
    AxisBounds::of(
        records
            .iter()
            .map(move |record| record.position_3d.map_or(0.0, |position| position[axis])),
    )
}

/// True when the record should appear on the 2D surface.
///
/// A raw position of exactly (0, 0) is treated as "no position" because the
/// decoder's zero-vector fallback shares that value; a legitimately
/// zero-placed record is indistinguishable and is skipped too (known
/// upstream quirk).
fn has_plot_position_2d(record: &BookRecord) -> bool {
    match record.position_2d {
        Some(position) => position[0] != 0.0 || position[1] != 0.0,
        None => false,
    }
}

/// Places the filtered/sorted subset on a square surface of edge `extent`,
/// scaled by bounds computed over the full set. Top-left origin: the axis
/// minimum maps to 0 and the maximum to `extent`.
pub fn project_2d(full: &[BookRecord], subset: &[BookRecord], extent: f64) -> Vec<PlottedBook2> {
    let x_bounds = axis_2d(full, 0);
    let y_bounds = axis_2d(full, 1);

    subset
        .iter()
        .filter(|record| has_plot_position_2d(record))
        .map(|record| {
            let position = record.position_2d.unwrap_or_default();
            PlottedBook2 {
                record: record.clone(),
                x: x_bounds.unit(position[0]) * extent,
                y: y_bounds.unit(position[1]) * extent,
            }
        })
        .collect()
}

/// Places the filtered/sorted subset in a centered volume of edge `extent`,
/// scaled by bounds computed over the full set. The axis minimum maps to
/// `-extent/2` and the maximum to `extent/2`.
pub fn project_3d(full: &[BookRecord], subset: &[BookRecord], extent: f64) -> Vec<PlottedBook3> {
    let x_bounds = axis_3d(full, 0);
    let y_bounds = axis_3d(full, 1);
    let z_bounds = axis_3d(full, 2);

    subset
        .iter()
        .filter(|record| record.position_3d.is_some())
        .map(|record| {
            let position = record.position_3d.unwrap_or_default();
            PlottedBook3 {
                record: record.clone(),
                x: (x_bounds.unit(position[0]) - 0.5) * extent,
                y: (y_bounds.unit(position[1]) - 0.5) * extent,
                z: (z_bounds.unit(position[2]) - 0.5) * extent,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{project_2d, project_3d};
    use crate::record::BookRecord;

    fn record_2d(title: &str, x: f64, y: f64) -> BookRecord {
        BookRecord {
            title: title.to_string(),
            position_2d: Some([x, y]),
            ..BookRecord::default()
        }
    }

    fn record_3d(title: &str, x: f64, y: f64, z: f64) -> BookRecord {
        BookRecord {
            title: title.to_string(),
            position_3d: Some([x, y, z]),
            ..BookRecord::default()
        }
    }

    #[test]
    fn test_project_2d_maps_bounds_to_surface_edges() {
        let full = vec![record_2d("low", 2.0, -1.0), record_2d("high", 6.0, 3.0)];

        let plotted = project_2d(&full, &full, 100.0);
        assert_eq!(plotted.len(), 2);
        assert!((plotted[0].x - 0.0).abs() < 1e-9);
        assert!((plotted[0].y - 0.0).abs() < 1e-9);
        assert!((plotted[1].x - 100.0).abs() < 1e-9);
        assert!((plotted[1].y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_2d_degenerate_axis_yields_midpoint() {
        let full = vec![record_2d("a", 0.0, 5.0), record_2d("b", 10.0, 5.0)];

        let plotted = project_2d(&full, &full, 100.0);
        // (0, 5) is skipped below; only the x-spanning record remains.
        assert_eq!(plotted.len(), 1);
        assert!((plotted[0].x - 100.0).abs() < 1e-9);
        assert!((plotted[0].y - 50.0).abs() < 1e-9);
        assert!(plotted[0].y.is_finite());
    }

    #[test]
    fn test_project_2d_skips_missing_and_zero_positions() {
        let unplaced = BookRecord {
            title: "unplaced".to_string(),
            ..BookRecord::default()
        };
        let full = vec![
            record_2d("origin", 0.0, 0.0),
            record_2d("placed", 4.0, 4.0),
            unplaced,
        ];

        let plotted = project_2d(&full, &full, 10.0);
        assert_eq!(plotted.len(), 1);
        assert_eq!(plotted[0].record.title, "placed");
    }

    #[test]
    fn test_project_2d_bounds_come_from_full_set_not_subset() {
        let full = vec![record_2d("low", 0.0, 1.0), record_2d("high", 10.0, 2.0)];
        let subset = vec![record_2d("mid", 5.0, 1.5)];

        let plotted = project_2d(&full, &subset, 100.0);
        assert_eq!(plotted.len(), 1);
        assert!((plotted[0].x - 50.0).abs() < 1e-9);
        assert!((plotted[0].y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_3d_maps_bounds_to_centered_range() {
        let full = vec![
            record_3d("low", -2.0, 0.0, 1.0),
            record_3d("high", 2.0, 8.0, 3.0),
        ];

        let plotted = project_3d(&full, &full, 200.0);
        assert_eq!(plotted.len(), 2);
        assert!((plotted[0].x - -100.0).abs() < 1e-9);
        assert!((plotted[0].y - -100.0).abs() < 1e-9);
        assert!((plotted[0].z - -100.0).abs() < 1e-9);
        assert!((plotted[1].x - 100.0).abs() < 1e-9);
        assert!((plotted[1].y - 100.0).abs() < 1e-9);
        assert!((plotted[1].z - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_3d_degenerate_axis_yields_center() {
        let full = vec![
            record_3d("a", 1.0, 7.0, 0.0),
            record_3d("b", 3.0, 7.0, 4.0),
        ];

        let plotted = project_3d(&full, &full, 200.0);
        assert_eq!(plotted.len(), 2);
        for point in &plotted {
            assert!((point.y - 0.0).abs() < 1e-9);
            assert!(point.y.is_finite());
        }
    }

    #[test]
    fn test_project_3d_keeps_origin_points_but_skips_missing() {
        let unplaced = BookRecord {
            title: "unplaced".to_string(),
            ..BookRecord::default()
        };
        let full = vec![
            record_3d("origin", 0.0, 0.0, 0.0),
            record_3d("far", 2.0, 2.0, 2.0),
            unplaced,
        ];

        let plotted = project_3d(&full, &full, 100.0);
        assert_eq!(plotted.len(), 2);
        assert_eq!(plotted[0].record.title, "origin");
    }

    #[test]
    fn test_missing_coordinates_contribute_zero_to_bounds() {
        let unplaced = BookRecord {
            title: "unplaced".to_string(),
            ..BookRecord::default()
        };
        // With the missing record counted as 0, bounds are [0, 10].
        let full = vec![record_2d("far", 10.0, 10.0), unplaced];
        let subset = vec![record_2d("mid", 5.0, 5.0)];

        let plotted = project_2d(&full, &subset, 100.0);
        assert_eq!(plotted.len(), 1);
        assert!((plotted[0].x - 50.0).abs() < 1e-9);
    }
}
