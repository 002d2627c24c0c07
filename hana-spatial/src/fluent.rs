//! Fluent API for creating spatial predicates.
//!
//! ## Example
//!
//! ```rust
//! use hana_spatial::spatial_field;
//! use hana_spatial::Geometry;
//!
//! // Features whose geometry lies in a bounding box
//! let in_box = spatial_field("geom").bbox(0.0, 0.0, 10.0, 10.0);
//!
//! // Features within 500 units of a point
//! let near = spatial_field("geom").dwithin(Geometry::point(5.0, 5.0), 500.0);
//! ```

use std::sync::Arc;

use crate::filter::{DistanceOperator, Predicate, SpatialOperator};
use crate::geometry::{Coordinate, Geometry};
use crate::SpatialResult;

/// A fluent predicate builder for a geometry column.
///
/// Use [`spatial_field`] to start building a predicate.
#[derive(Clone)]
pub struct SpatialFluentFilter {
    inner: Arc<SpatialFluentFilterInner>,
}

struct SpatialFluentFilterInner {
    field: String,
}

/// Creates a new spatial predicate builder for the given column.
///
/// # Example
///
/// ```rust
/// use hana_spatial::spatial_field;
/// let predicate = spatial_field("geom").intersects_point(10.0, 20.0);
/// ```
pub fn spatial_field(field: impl Into<String>) -> SpatialFluentFilter {
    SpatialFluentFilter {
        inner: Arc::new(SpatialFluentFilterInner {
            field: field.into(),
        }),
    }
}

impl SpatialFluentFilter {
    pub fn field(&self) -> &str {
        &self.inner.field
    }

    fn binary(&self, op: SpatialOperator, geometry: Geometry) -> Predicate {
        Predicate::BinarySpatial {
            op,
            property: self.inner.field.clone(),
            geometry,
            swapped: false,
        }
    }

    fn distance(&self, op: DistanceOperator, geometry: Geometry, distance: f64) -> Predicate {
        Predicate::DistanceSpatial {
            op,
            property: self.inner.field.clone(),
            geometry,
            distance,
            swapped: false,
        }
    }

    // =========================================================================
    // Intersects predicates
    // =========================================================================

    /// Matches geometries intersecting the given geometry.
    pub fn intersects(self, geometry: Geometry) -> Predicate {
        self.binary(SpatialOperator::Intersects, geometry)
    }

    /// Matches geometries intersecting a point.
    pub fn intersects_point(self, x: f64, y: f64) -> Predicate {
        self.intersects(Geometry::point(x, y))
    }

    /// Matches geometries intersecting a rectangle.
    pub fn intersects_envelope(self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Predicate {
        self.intersects(Geometry::envelope(min_x, min_y, max_x, max_y))
    }

    /// Matches geometries intersecting a polygon.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` when the shell is not a closed ring.
    pub fn intersects_polygon(self, shell: Vec<Coordinate>) -> SpatialResult<Predicate> {
        Ok(self.intersects(Geometry::polygon(shell)?))
    }

    /// Matches geometries whose envelope overlaps the rectangle.
    pub fn bbox(self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Predicate {
        self.binary(
            SpatialOperator::BBox,
            Geometry::envelope(min_x, min_y, max_x, max_y),
        )
    }

    // =========================================================================
    // Containment predicates
    // =========================================================================

    /// Matches geometries contained within the given geometry.
    pub fn within(self, geometry: Geometry) -> Predicate {
        self.binary(SpatialOperator::Within, geometry)
    }

    /// Matches geometries contained within a rectangle.
    pub fn within_envelope(self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Predicate {
        self.within(Geometry::envelope(min_x, min_y, max_x, max_y))
    }

    /// Matches geometries containing the given geometry.
    pub fn contains(self, geometry: Geometry) -> Predicate {
        self.binary(SpatialOperator::Contains, geometry)
    }

    // =========================================================================
    // Other relations
    // =========================================================================

    pub fn equals(self, geometry: Geometry) -> Predicate {
        self.binary(SpatialOperator::Equals, geometry)
    }

    pub fn disjoint(self, geometry: Geometry) -> Predicate {
        self.binary(SpatialOperator::Disjoint, geometry)
    }

    pub fn crosses(self, geometry: Geometry) -> Predicate {
        self.binary(SpatialOperator::Crosses, geometry)
    }

    pub fn overlaps(self, geometry: Geometry) -> Predicate {
        self.binary(SpatialOperator::Overlaps, geometry)
    }

    pub fn touches(self, geometry: Geometry) -> Predicate {
        self.binary(SpatialOperator::Touches, geometry)
    }

    // =========================================================================
    // Distance predicates
    // =========================================================================

    /// Matches geometries within `distance` of the given geometry, in the
    /// units of the column's reference system.
    pub fn dwithin(self, geometry: Geometry, distance: f64) -> Predicate {
        self.distance(DistanceOperator::DWithin, geometry, distance)
    }

    /// Matches geometries farther than `distance` from the given geometry.
    pub fn beyond(self, geometry: Geometry, distance: f64) -> Predicate {
        self.distance(DistanceOperator::Beyond, geometry, distance)
    }

    /// Matches rows whose geometry is SQL NULL.
    pub fn is_null(self) -> Predicate {
        Predicate::is_null(&self.inner.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_field_creation() {
        let builder = spatial_field("location");
        assert_eq!(builder.field(), "location");
    }

    #[test]
    fn test_intersects() {
        let p = spatial_field("geom").intersects_point(1.0, 2.0);
        assert_eq!(
            p,
            Predicate::BinarySpatial {
                op: SpatialOperator::Intersects,
                property: "geom".to_string(),
                geometry: Geometry::point(1.0, 2.0),
                swapped: false,
            }
        );
    }

    #[test]
    fn test_bbox_uses_rectangle() {
        match spatial_field("geom").bbox(0.0, 0.0, 2.0, 1.0) {
            Predicate::BinarySpatial { op, geometry, .. } => {
                assert_eq!(op, SpatialOperator::BBox);
                assert_eq!(geometry, Geometry::envelope(0.0, 0.0, 2.0, 1.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_intersects_polygon_validates_shell() {
        let open = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(1.0, 0.0),
        ];
        assert!(spatial_field("geom").intersects_polygon(open).is_err());
    }

    #[test]
    fn test_distance() {
        let p = spatial_field("geom").beyond(Geometry::point(0.0, 0.0), 10.0);
        assert!(matches!(
            p,
            Predicate::DistanceSpatial {
                op: DistanceOperator::Beyond,
                distance,
                swapped: false,
                ..
            } if distance == 10.0
        ));
    }

    #[test]
    fn test_all_relations() {
        let g = Geometry::point(0.0, 0.0);
        let cases = vec![
            (spatial_field("g").equals(g.clone()), SpatialOperator::Equals),
            (spatial_field("g").disjoint(g.clone()), SpatialOperator::Disjoint),
            (spatial_field("g").crosses(g.clone()), SpatialOperator::Crosses),
            (spatial_field("g").within(g.clone()), SpatialOperator::Within),
            (spatial_field("g").contains(g.clone()), SpatialOperator::Contains),
            (spatial_field("g").overlaps(g.clone()), SpatialOperator::Overlaps),
            (spatial_field("g").touches(g.clone()), SpatialOperator::Touches),
            (spatial_field("g").within_envelope(0.0, 0.0, 1.0, 1.0), SpatialOperator::Within),
        ];
        for (predicate, expected) in cases {
            match predicate {
                Predicate::BinarySpatial { op, .. } => assert_eq!(op, expected),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_is_null() {
        assert_eq!(spatial_field("geom").is_null(), Predicate::is_null("geom"));
    }
}
