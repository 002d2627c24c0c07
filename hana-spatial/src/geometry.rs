//! Geometry model.
//!
//! In-memory geometry values exchanged with the database. Values are built by
//! the WKB decoder on the read path or by the caller on the write path and are
//! not mutated afterwards. Emptiness is expressed by zero-length coordinate
//! sequences, never by absent ones.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{self, Display};

use crate::envelope::Envelope;
use crate::{SpatialError, SpatialResult};

/// A 2D or 3D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Coordinate {
    /// Creates a 2D coordinate.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Creates a 3D coordinate.
    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    /// Calculates the planar distance to another coordinate.
    pub fn distance(&self, other: &Coordinate) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Compares the X and Y ordinates only.
    pub fn equals_2d(&self, other: &Coordinate) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.z {
            Some(z) => write!(f, "({}, {}, {})", self.x, self.y, z),
            None => write!(f, "({}, {})", self.x, self.y),
        }
    }
}

/// The closed set of geometry kinds a column can be declared with.
///
/// `Generic` is used when a column is spatial but no subtype is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Generic,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryType {
    /// The OGC WKB type code of the 2D form.
    pub fn wkb_code(&self) -> u32 {
        match self {
            GeometryType::Generic => 0,
            GeometryType::Point => 1,
            GeometryType::LineString => 2,
            GeometryType::Polygon => 3,
            GeometryType::MultiPoint => 4,
            GeometryType::MultiLineString => 5,
            GeometryType::MultiPolygon => 6,
            GeometryType::GeometryCollection => 7,
        }
    }

    /// Maps a base WKB type code back to a concrete kind.
    pub fn from_wkb_code(code: u32) -> Option<GeometryType> {
        match code {
            1 => Some(GeometryType::Point),
            2 => Some(GeometryType::LineString),
            3 => Some(GeometryType::Polygon),
            4 => Some(GeometryType::MultiPoint),
            5 => Some(GeometryType::MultiLineString),
            6 => Some(GeometryType::MultiPolygon),
            7 => Some(GeometryType::GeometryCollection),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GeometryType::Generic => "Geometry",
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
        }
    }
}

impl Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A point, or the empty point when it has no coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    coordinate: Option<Coordinate>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self::from_coordinate(Coordinate::new(x, y))
    }

    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self::from_coordinate(Coordinate::new_3d(x, y, z))
    }

    pub fn from_coordinate(coordinate: Coordinate) -> Self {
        Self {
            coordinate: Some(coordinate),
        }
    }

    pub fn empty() -> Self {
        Self { coordinate: None }
    }

    pub fn coordinate(&self) -> Option<&Coordinate> {
        self.coordinate.as_ref()
    }

    pub fn x(&self) -> Option<f64> {
        self.coordinate.map(|c| c.x)
    }

    pub fn y(&self) -> Option<f64> {
        self.coordinate.map(|c| c.y)
    }

    pub fn is_empty(&self) -> bool {
        self.coordinate.is_none()
    }
}

/// An open or closed sequence of coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineString {
    coordinates: Vec<Coordinate>,
}

impl LineString {
    pub fn new(coordinates: Vec<Coordinate>) -> Self {
        Self { coordinates }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        match (self.coordinates.first(), self.coordinates.last()) {
            (Some(first), Some(last)) => first.equals_2d(last),
            _ => false,
        }
    }
}

/// A closed line string with at least four coordinates, or empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearRing {
    coordinates: Vec<Coordinate>,
}

impl LinearRing {
    /// Creates a ring.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` when a non-empty sequence is not closed or
    /// has fewer than four coordinates.
    pub fn new(coordinates: Vec<Coordinate>) -> SpatialResult<Self> {
        if !coordinates.is_empty() {
            if coordinates.len() < 4 {
                return Err(SpatialError::InvalidOperation(format!(
                    "A linear ring needs at least 4 coordinates, got {}",
                    coordinates.len()
                )));
            }
            let closed = match (coordinates.first(), coordinates.last()) {
                (Some(first), Some(last)) => first.equals_2d(last),
                _ => false,
            };
            if !closed {
                return Err(SpatialError::InvalidOperation(
                    "A linear ring must be closed".to_string(),
                ));
            }
        }
        Ok(Self { coordinates })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// The same coordinates as an ordinary line string.
    pub fn to_line_string(&self) -> LineString {
        LineString::new(self.coordinates.clone())
    }
}

/// A polygon: an exterior ring followed by zero or more holes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    rings: Vec<LinearRing>,
}

impl Polygon {
    pub fn new(exterior: LinearRing, holes: Vec<LinearRing>) -> Self {
        let mut rings = Vec::with_capacity(holes.len() + 1);
        rings.push(exterior);
        rings.extend(holes);
        Self { rings }
    }

    /// Builds a polygon from its rings, exterior first.
    pub fn from_rings(rings: Vec<LinearRing>) -> Self {
        Self { rings }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn exterior(&self) -> Option<&LinearRing> {
        self.rings.first()
    }

    pub fn interiors(&self) -> &[LinearRing] {
        if self.rings.is_empty() {
            &[]
        } else {
            &self.rings[1..]
        }
    }

    pub fn rings(&self) -> &[LinearRing] {
        &self.rings
    }

    pub fn is_empty(&self) -> bool {
        self.exterior().map_or(true, |ring| ring.is_empty())
    }
}

/// A geometry value.
///
/// # Examples
///
/// ```rust
/// use hana_spatial::{Geometry, GeometryType};
///
/// let point = Geometry::point(1.0, 2.0);
/// assert_eq!(point.geometry_type(), GeometryType::Point);
/// assert_eq!(point.to_string(), "POINT (1 2)");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    LinearRing(LinearRing),
    Polygon(Polygon),
    MultiPoint(Vec<Point>),
    MultiLineString(Vec<LineString>),
    MultiPolygon(Vec<Polygon>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    /// Creates a point geometry.
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Point::new(x, y))
    }

    pub fn point_3d(x: f64, y: f64, z: f64) -> Self {
        Geometry::Point(Point::new_3d(x, y, z))
    }

    pub fn empty_point() -> Self {
        Geometry::Point(Point::empty())
    }

    /// Creates a line string geometry.
    pub fn line_string(coords: Vec<Coordinate>) -> Self {
        Geometry::LineString(LineString::new(coords))
    }

    /// Creates a polygon without holes from its shell coordinates.
    pub fn polygon(shell: Vec<Coordinate>) -> SpatialResult<Self> {
        Ok(Geometry::Polygon(Polygon::new(
            LinearRing::new(shell)?,
            Vec::new(),
        )))
    }

    /// Creates the rectangular polygon covering the given extrema.
    pub fn envelope(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        let env = Envelope::new(min_x, min_y, max_x, max_y);
        Geometry::Polygon(Polygon::from_rings(vec![LinearRing {
            coordinates: vec![
                Coordinate::new(env.min_x, env.min_y),
                Coordinate::new(env.min_x, env.max_y),
                Coordinate::new(env.max_x, env.max_y),
                Coordinate::new(env.max_x, env.min_y),
                Coordinate::new(env.min_x, env.min_y),
            ],
        }]))
    }

    /// The kind of this geometry. A linear ring reports `LineString`.
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::LineString(_) | Geometry::LinearRing(_) => GeometryType::LineString,
            Geometry::Polygon(_) => GeometryType::Polygon,
            Geometry::MultiPoint(_) => GeometryType::MultiPoint,
            Geometry::MultiLineString(_) => GeometryType::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryType::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryType::GeometryCollection,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(p) => p.is_empty(),
            Geometry::LineString(l) => l.is_empty(),
            Geometry::LinearRing(r) => r.is_empty(),
            Geometry::Polygon(p) => p.is_empty(),
            Geometry::MultiPoint(points) => points.iter().all(Point::is_empty),
            Geometry::MultiLineString(lines) => lines.iter().all(LineString::is_empty),
            Geometry::MultiPolygon(polygons) => polygons.iter().all(Polygon::is_empty),
            Geometry::GeometryCollection(members) => members.iter().all(Geometry::is_empty),
        }
    }

    /// Whether any coordinate carries a Z ordinate.
    pub fn has_z(&self) -> bool {
        let mut has_z = false;
        self.visit_coordinates(&mut |c| has_z |= c.has_z());
        has_z
    }

    /// Calls `f` for every coordinate in storage order.
    pub fn visit_coordinates<F: FnMut(&Coordinate)>(&self, f: &mut F) {
        match self {
            Geometry::Point(p) => {
                if let Some(c) = p.coordinate() {
                    f(c)
                }
            }
            Geometry::LineString(l) => l.coordinates().iter().for_each(|c| f(c)),
            Geometry::LinearRing(r) => r.coordinates().iter().for_each(|c| f(c)),
            Geometry::Polygon(p) => visit_polygon(p, f),
            Geometry::MultiPoint(points) => points
                .iter()
                .filter_map(Point::coordinate)
                .for_each(|c| f(c)),
            Geometry::MultiLineString(lines) => lines
                .iter()
                .flat_map(|l| l.coordinates())
                .for_each(|c| f(c)),
            Geometry::MultiPolygon(polygons) => {
                polygons.iter().for_each(|p| visit_polygon(p, f))
            }
            Geometry::GeometryCollection(members) => {
                members.iter().for_each(|g| g.visit_coordinates(f))
            }
        }
    }

    /// The number of coordinates in the geometry.
    pub fn num_coordinates(&self) -> usize {
        let mut count = 0;
        self.visit_coordinates(&mut |_| count += 1);
        count
    }

    /// Gets the bounding envelope, null for an empty geometry.
    pub fn envelope_of(&self) -> Envelope {
        let mut env = Envelope::null();
        self.visit_coordinates(&mut |c| env.expand_to_include(c));
        env
    }

    /// Rewrites linear rings as line strings, at any depth.
    ///
    /// Borrowed when there is nothing to rewrite.
    pub fn normalized(&self) -> Cow<'_, Geometry> {
        if !self.contains_ring() {
            return Cow::Borrowed(self);
        }
        Cow::Owned(self.without_rings())
    }

    fn contains_ring(&self) -> bool {
        match self {
            Geometry::LinearRing(_) => true,
            Geometry::GeometryCollection(members) => members.iter().any(Geometry::contains_ring),
            _ => false,
        }
    }

    fn without_rings(&self) -> Geometry {
        match self {
            Geometry::LinearRing(ring) => Geometry::LineString(ring.to_line_string()),
            Geometry::GeometryCollection(members) => {
                Geometry::GeometryCollection(members.iter().map(Geometry::without_rings).collect())
            }
            other => other.clone(),
        }
    }

    /// The well-known-text rendering.
    pub fn to_wkt(&self) -> String {
        crate::wkt::to_wkt(self)
    }
}

fn visit_polygon<F: FnMut(&Coordinate)>(polygon: &Polygon, f: &mut F) {
    polygon
        .rings()
        .iter()
        .flat_map(|r| r.coordinates())
        .for_each(|c| f(c))
}

impl Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wkt())
    }
}

impl From<Point> for Geometry {
    fn from(value: Point) -> Self {
        Geometry::Point(value)
    }
}

impl From<LineString> for Geometry {
    fn from(value: LineString) -> Self {
        Geometry::LineString(value)
    }
}

impl From<LinearRing> for Geometry {
    fn from(value: LinearRing) -> Self {
        Geometry::LinearRing(value)
    }
}

impl From<Polygon> for Geometry {
    fn from(value: Polygon) -> Self {
        Geometry::Polygon(value)
    }
}
