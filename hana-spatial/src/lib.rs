//! # Hana Spatial - Spatial SQL dialect for SAP HANA
//!
//! This crate turns spatial query filters into HANA SQL and moves geometries
//! across the wire:
//!
//! - **Geometry Model**: points, lines, polygons, their multi-part forms and
//!   collections, with envelopes and WKT rendering
//! - **WKB Codec**: (extended) well-known-binary decode and encode
//! - **Resolver**: geometry subtype and SRID lookup through catalog probes,
//!   cached per column
//! - **Filter Compiler**: predicate trees to `ST_*` SQL, with loose bbox
//!   pre-filtering and operand swap resolution
//! - **Dialect**: column selection, literals, limit/offset and type mapping
//!
//! ## Quick Start
//!
//! ```rust
//! use hana_spatial::{spatial_field, Geometry, HanaFilterToSql};
//!
//! let compiler = HanaFilterToSql::new(true);
//! let predicate = spatial_field("geom")
//!     .dwithin(Geometry::point(8.68, 49.41), 500.0);
//!
//! let sql = compiler.encode_to_where(&predicate).unwrap();
//! assert_eq!(
//!     sql,
//!     "WHERE \"geom\".ST_WithinDistance(ST_Geometry('POINT (8.68 49.41)'),500.0)"
//! );
//! ```
//!
//! ## WKB
//!
//! ```rust
//! use hana_spatial::{Geometry, WkbCodec};
//!
//! let mut codec = WkbCodec::new();
//! let point = Geometry::point(1.0, 2.0);
//! let bytes = codec.encode_to_vec(&point);
//! assert_eq!(codec.decode(&bytes).unwrap(), point);
//! ```

pub mod compiler;
pub mod dialect;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod fluent;
pub mod geometry;
pub mod resolver;
pub mod wkb;
pub mod wkt;

pub use error::{SpatialError, SpatialResult};

// Re-export geometry types
pub use envelope::Envelope;
pub use geometry::{Coordinate, Geometry, GeometryType, LineString, LinearRing, Point, Polygon};
pub use wkt::{parse_wkt, to_wkt};

// Re-export codec types
pub use wkb::{WkbByteOrder, WkbCodec};

// Re-export resolver types
pub use resolver::{GeometryColumn, GeometryResolver, DEFAULT_SRID};

// Re-export filter types
pub use filter::{ComparisonOp, DistanceOperator, Expression, Predicate, SpatialOperator};
pub use fluent::{spatial_field, SpatialFluentFilter};

pub use compiler::{FilterCapabilities, HanaFilterToSql};
pub use dialect::{Binding, HanaDialect, HanaLiteralEncoder, Hint};
