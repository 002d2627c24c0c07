//! Well-known-binary codec.
//!
//! Decodes OGC WKB, ISO WKB (`1000+` type codes) and the extended flavour
//! the database returns from `ST_AsEWKB()` (Z/M/SRID flags in the high bits
//! of the type code). Encodes OGC WKB, flagging Z geometries and embedded
//! SRIDs the extended way.
//!
//! A [`WkbCodec`] owns a scratch buffer, so every connection or thread keeps
//! its own instance.

use bitflags::bitflags;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use hana::catalog::{ColumnRef, Row};
use hana::value::Value;
use std::io::Cursor;

use crate::geometry::{Coordinate, Geometry, GeometryType, LineString, LinearRing, Point, Polygon};
use crate::{SpatialError, SpatialResult};

bitflags! {
    /// Extended WKB flags carried in the high bits of the type code.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct EwkbFlags: u32 {
        const Z = 0x8000_0000;
        const M = 0x4000_0000;
        const SRID = 0x2000_0000;
    }
}

const TYPE_MASK: u32 = 0x0FFF_FFFF;

/// Collections nested deeper than this are rejected.
const MAX_DEPTH: usize = 64;

/// The byte order marker of a WKB value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WkbByteOrder {
    BigEndian,
    #[default]
    LittleEndian,
}

impl WkbByteOrder {
    fn marker(&self) -> u8 {
        match self {
            WkbByteOrder::BigEndian => 0,
            WkbByteOrder::LittleEndian => 1,
        }
    }

    fn from_marker(marker: u8) -> Option<WkbByteOrder> {
        match marker {
            0 => Some(WkbByteOrder::BigEndian),
            1 => Some(WkbByteOrder::LittleEndian),
            _ => None,
        }
    }
}

/// Reads and writes geometries in WKB.
///
/// # Examples
///
/// ```rust
/// use hana_spatial::{Geometry, WkbCodec};
///
/// let mut codec = WkbCodec::new();
/// let point = Geometry::point(1.0, 2.0);
/// let bytes = codec.encode_to_vec(&point);
/// assert_eq!(bytes.len(), 21);
/// assert_eq!(codec.decode(&bytes).unwrap(), point);
/// ```
#[derive(Debug, Default)]
pub struct WkbCodec {
    byte_order: WkbByteOrder,
    buffer: Vec<u8>,
}

impl WkbCodec {
    /// Creates a codec writing little-endian WKB.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_byte_order(byte_order: WkbByteOrder) -> Self {
        Self {
            byte_order,
            buffer: Vec::new(),
        }
    }

    pub fn byte_order(&self) -> WkbByteOrder {
        self.byte_order
    }

    /// Decodes a geometry, discarding any embedded SRID.
    ///
    /// # Errors
    ///
    /// Returns `MalformedWireFormat` when the byte order marker or a type
    /// code is unknown, when a declared count exceeds the remaining bytes,
    /// or when bytes are left over.
    pub fn decode(&self, bytes: &[u8]) -> SpatialResult<Geometry> {
        decode_bytes(bytes).map(|(geometry, _)| geometry)
    }

    /// Decodes a geometry together with the SRID of an extended WKB value.
    pub fn decode_with_srid(&self, bytes: &[u8]) -> SpatialResult<(Geometry, Option<i32>)> {
        decode_bytes(bytes)
    }

    /// Decodes bytes that may be absent because the column is SQL NULL.
    pub fn decode_optional(&self, bytes: Option<&[u8]>) -> SpatialResult<Option<Geometry>> {
        bytes.map(|b| self.decode(b)).transpose()
    }

    /// Decodes a geometry column of a result row.
    ///
    /// Binary values are decoded directly; hex text, as some drivers return
    /// it, is unpacked into the scratch buffer first. SQL NULL yields `None`.
    pub fn read(&mut self, row: &Row, column: impl Into<ColumnRef>) -> SpatialResult<Option<Geometry>> {
        let column = column.into();
        let decoded = match row.get(&column)? {
            Value::Null => return Ok(None),
            Value::Bytes(bytes) => decode_bytes(bytes),
            Value::String(text) => {
                self.buffer.clear();
                self.buffer.resize(text.len() / 2, 0);
                hex::decode_to_slice(text, &mut self.buffer).map_err(|err| {
                    SpatialError::MalformedWireFormat(format!(
                        "column {} holds invalid hex: {}",
                        column, err
                    ))
                })?;
                decode_bytes(&self.buffer)
            }
            other => {
                return Err(SpatialError::MalformedWireFormat(format!(
                    "column {} holds {} instead of geometry bytes",
                    column,
                    other.type_name()
                )))
            }
        };
        decoded
            .map(|(geometry, _)| Some(geometry))
            .map_err(|err| match err {
                SpatialError::MalformedWireFormat(msg) => {
                    SpatialError::MalformedWireFormat(format!("column {}: {}", column, msg))
                }
                other => other,
            })
    }

    /// Encodes a geometry into the scratch buffer and returns it.
    pub fn encode(&mut self, geometry: &Geometry) -> &[u8] {
        self.encode_into_buffer(geometry, None);
        &self.buffer
    }

    /// Encodes a geometry with an embedded SRID (extended WKB).
    pub fn encode_with_srid(&mut self, geometry: &Geometry, srid: i32) -> &[u8] {
        self.encode_into_buffer(geometry, Some(srid));
        &self.buffer
    }

    /// Encodes a geometry into an owned vector.
    pub fn encode_to_vec(&mut self, geometry: &Geometry) -> Vec<u8> {
        self.encode(geometry).to_vec()
    }

    fn encode_into_buffer(&mut self, geometry: &Geometry, srid: Option<i32>) {
        self.buffer.clear();
        let mut writer = WkbWriter {
            out: &mut self.buffer,
            order: self.byte_order,
            z: geometry.has_z(),
        };
        writer.geometry(geometry, srid);
    }
}

fn decode_bytes(bytes: &[u8]) -> SpatialResult<(Geometry, Option<i32>)> {
    let mut reader = WkbReader {
        cursor: Cursor::new(bytes),
        len: bytes.len(),
    };
    let (geometry, srid) = reader.geometry(0)?;
    let consumed = reader.cursor.position() as usize;
    if consumed != bytes.len() {
        return Err(SpatialError::MalformedWireFormat(format!(
            "{} trailing bytes after geometry of {} bytes",
            bytes.len() - consumed,
            consumed
        )));
    }
    Ok((geometry, srid))
}

struct Header {
    order: WkbByteOrder,
    kind: GeometryType,
    z: bool,
    m: bool,
    srid: Option<i32>,
}

struct WkbReader<'a> {
    cursor: Cursor<&'a [u8]>,
    len: usize,
}

impl WkbReader<'_> {
    fn remaining(&self) -> usize {
        self.len.saturating_sub(self.cursor.position() as usize)
    }

    fn eof(&self, what: &str) -> SpatialError {
        SpatialError::MalformedWireFormat(format!(
            "unexpected end of input reading {} at offset {} of {} bytes",
            what,
            self.cursor.position(),
            self.len
        ))
    }

    fn u8(&mut self, what: &str) -> SpatialResult<u8> {
        self.cursor.read_u8().map_err(|_| self.eof(what))
    }

    fn u32(&mut self, order: WkbByteOrder, what: &str) -> SpatialResult<u32> {
        let value = match order {
            WkbByteOrder::BigEndian => self.cursor.read_u32::<BigEndian>(),
            WkbByteOrder::LittleEndian => self.cursor.read_u32::<LittleEndian>(),
        };
        value.map_err(|_| self.eof(what))
    }

    fn f64(&mut self, order: WkbByteOrder) -> SpatialResult<f64> {
        let value = match order {
            WkbByteOrder::BigEndian => self.cursor.read_f64::<BigEndian>(),
            WkbByteOrder::LittleEndian => self.cursor.read_f64::<LittleEndian>(),
        };
        value.map_err(|_| self.eof("ordinate"))
    }

    /// Reads an element count and checks it against the bytes left.
    fn count(&mut self, order: WkbByteOrder, min_item_size: usize, what: &str) -> SpatialResult<usize> {
        let count = self.u32(order, what)? as usize;
        let needed = count.saturating_mul(min_item_size);
        if needed > self.remaining() {
            return Err(SpatialError::MalformedWireFormat(format!(
                "declared {} count {} needs at least {} bytes, {} remain of {}",
                what,
                count,
                needed,
                self.remaining(),
                self.len
            )));
        }
        Ok(count)
    }

    fn header(&mut self) -> SpatialResult<Header> {
        let marker = self.u8("byte order")?;
        let order = WkbByteOrder::from_marker(marker).ok_or_else(|| {
            SpatialError::MalformedWireFormat(format!(
                "unknown byte order marker {} at offset {}",
                marker,
                self.cursor.position() - 1
            ))
        })?;
        let code = self.u32(order, "type code")?;
        let flags = EwkbFlags::from_bits_truncate(code);
        let base = code & TYPE_MASK;
        let (iso_dims, kind_code) = (base / 1000, base % 1000);
        let kind = GeometryType::from_wkb_code(kind_code)
            .filter(|_| iso_dims <= 3)
            .ok_or_else(|| {
                SpatialError::MalformedWireFormat(format!("unknown geometry type code {:#x}", code))
            })?;
        let srid = if flags.contains(EwkbFlags::SRID) {
            Some(self.u32(order, "srid")? as i32)
        } else {
            None
        };
        let header = Header {
            order,
            kind,
            z: flags.contains(EwkbFlags::Z) || iso_dims == 1 || iso_dims == 3,
            m: flags.contains(EwkbFlags::M) || iso_dims == 2 || iso_dims == 3,
            srid,
        };
        log::trace!(
            "WKB header {} order={:?} z={} m={} srid={:?}",
            header.kind,
            header.order,
            header.z,
            header.m,
            header.srid
        );
        Ok(header)
    }

    fn geometry(&mut self, depth: usize) -> SpatialResult<(Geometry, Option<i32>)> {
        if depth > MAX_DEPTH {
            return Err(SpatialError::MalformedWireFormat(format!(
                "geometry nesting deeper than {}",
                MAX_DEPTH
            )));
        }
        let header = self.header()?;
        let geometry = match header.kind {
            GeometryType::Point => Geometry::Point(self.point(&header)?),
            GeometryType::LineString => {
                Geometry::LineString(LineString::new(self.sequence(&header)?))
            }
            GeometryType::Polygon => Geometry::Polygon(self.polygon(&header)?),
            GeometryType::MultiPoint => Geometry::MultiPoint(self.members(&header, depth, |g| {
                match g {
                    Geometry::Point(p) => Some(p),
                    _ => None,
                }
            })?),
            GeometryType::MultiLineString => {
                Geometry::MultiLineString(self.members(&header, depth, |g| match g {
                    Geometry::LineString(l) => Some(l),
                    _ => None,
                })?)
            }
            GeometryType::MultiPolygon => {
                Geometry::MultiPolygon(self.members(&header, depth, |g| match g {
                    Geometry::Polygon(p) => Some(p),
                    _ => None,
                })?)
            }
            GeometryType::GeometryCollection => {
                Geometry::GeometryCollection(self.members(&header, depth, Some)?)
            }
            GeometryType::Generic => {
                return Err(SpatialError::MalformedWireFormat(
                    "generic geometry type code".to_string(),
                ))
            }
        };
        Ok((geometry, header.srid))
    }

    fn members<T, F>(&mut self, header: &Header, depth: usize, accept: F) -> SpatialResult<Vec<T>>
    where
        F: Fn(Geometry) -> Option<T>,
    {
        // byte order, type code and at least one count or ordinate
        let count = self.count(header.order, 9, "member")?;
        let mut members = Vec::with_capacity(count);
        for _ in 0..count {
            let (member, _) = self.geometry(depth + 1)?;
            let member_kind = member.geometry_type();
            let member = accept(member).ok_or_else(|| {
                SpatialError::MalformedWireFormat(format!(
                    "{} cannot contain a {}",
                    header.kind, member_kind
                ))
            })?;
            members.push(member);
        }
        Ok(members)
    }

    fn coordinate_size(header: &Header) -> usize {
        8 * (2 + header.z as usize + header.m as usize)
    }

    fn coordinate(&mut self, header: &Header) -> SpatialResult<Coordinate> {
        let x = self.f64(header.order)?;
        let y = self.f64(header.order)?;
        let z = if header.z {
            Some(self.f64(header.order)?).filter(|z| !z.is_nan())
        } else {
            None
        };
        if header.m {
            // M is read and dropped
            self.f64(header.order)?;
        }
        Ok(Coordinate { x, y, z })
    }

    fn point(&mut self, header: &Header) -> SpatialResult<Point> {
        let coord = self.coordinate(header)?;
        if coord.x.is_nan() && coord.y.is_nan() {
            return Ok(Point::empty());
        }
        Ok(Point::from_coordinate(coord))
    }

    fn sequence(&mut self, header: &Header) -> SpatialResult<Vec<Coordinate>> {
        let count = self.count(header.order, Self::coordinate_size(header), "coordinate")?;
        (0..count).map(|_| self.coordinate(header)).collect()
    }

    fn polygon(&mut self, header: &Header) -> SpatialResult<Polygon> {
        let count = self.count(header.order, 4, "ring")?;
        let mut rings = Vec::with_capacity(count);
        for i in 0..count {
            let ring = LinearRing::new(self.sequence(header)?).map_err(|err| {
                SpatialError::MalformedWireFormat(format!("ring {}: {}", i, err))
            })?;
            rings.push(ring);
        }
        Ok(Polygon::from_rings(rings))
    }
}

struct WkbWriter<'a> {
    out: &'a mut Vec<u8>,
    order: WkbByteOrder,
    z: bool,
}

impl WkbWriter<'_> {
    fn u32(&mut self, value: u32) {
        // writes into a Vec cannot fail
        let _ = match self.order {
            WkbByteOrder::BigEndian => self.out.write_u32::<BigEndian>(value),
            WkbByteOrder::LittleEndian => self.out.write_u32::<LittleEndian>(value),
        };
    }

    fn f64(&mut self, value: f64) {
        let _ = match self.order {
            WkbByteOrder::BigEndian => self.out.write_f64::<BigEndian>(value),
            WkbByteOrder::LittleEndian => self.out.write_f64::<LittleEndian>(value),
        };
    }

    fn header(&mut self, kind: GeometryType, srid: Option<i32>) {
        self.out.push(self.order.marker());
        let mut flags = EwkbFlags::empty();
        if self.z {
            flags |= EwkbFlags::Z;
        }
        if srid.is_some() {
            flags |= EwkbFlags::SRID;
        }
        self.u32(kind.wkb_code() | flags.bits());
        if let Some(srid) = srid {
            self.u32(srid as u32);
        }
    }

    fn geometry(&mut self, geometry: &Geometry, srid: Option<i32>) {
        self.header(geometry.geometry_type(), srid);
        match geometry {
            Geometry::Point(p) => self.point(p),
            Geometry::LineString(l) => self.sequence(l.coordinates()),
            Geometry::LinearRing(r) => self.sequence(r.coordinates()),
            Geometry::Polygon(p) => self.polygon(p),
            Geometry::MultiPoint(points) => {
                self.u32(points.len() as u32);
                for p in points {
                    self.header(GeometryType::Point, None);
                    self.point(p);
                }
            }
            Geometry::MultiLineString(lines) => {
                self.u32(lines.len() as u32);
                for l in lines {
                    self.header(GeometryType::LineString, None);
                    self.sequence(l.coordinates());
                }
            }
            Geometry::MultiPolygon(polygons) => {
                self.u32(polygons.len() as u32);
                for p in polygons {
                    self.header(GeometryType::Polygon, None);
                    self.polygon(p);
                }
            }
            Geometry::GeometryCollection(members) => {
                self.u32(members.len() as u32);
                for g in members {
                    self.geometry(g, None);
                }
            }
        }
    }

    fn coordinate(&mut self, c: &Coordinate) {
        self.f64(c.x);
        self.f64(c.y);
        if self.z {
            self.f64(c.z.unwrap_or(f64::NAN));
        }
    }

    fn point(&mut self, point: &Point) {
        match point.coordinate() {
            Some(c) => self.coordinate(c),
            None => {
                let empty = Coordinate {
                    x: f64::NAN,
                    y: f64::NAN,
                    z: None,
                };
                self.coordinate(&empty)
            }
        }
    }

    fn sequence(&mut self, coords: &[Coordinate]) {
        self.u32(coords.len() as u32);
        for c in coords {
            self.coordinate(c);
        }
    }

    fn polygon(&mut self, polygon: &Polygon) {
        self.u32(polygon.rings().len() as u32);
        for ring in polygon.rings() {
            self.sequence(ring.coordinates());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: f64, y: f64) -> Coordinate {
        Coordinate::new(x, y)
    }

    fn ring(coords: &[(f64, f64)]) -> LinearRing {
        LinearRing::new(coords.iter().map(|&(x, y)| c(x, y)).collect()).unwrap()
    }

    fn samples() -> Vec<Geometry> {
        let shell = ring(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (0.0, 0.0)]);
        let hole = ring(&[(2.0, 2.0), (2.0, 3.0), (3.0, 3.0), (2.0, 2.0)]);
        vec![
            Geometry::point(1.0, 2.0),
            Geometry::point_3d(1.0, 2.0, 3.0),
            Geometry::empty_point(),
            Geometry::line_string(vec![c(0.0, 0.0), c(1.0, 1.0), c(2.0, 0.5)]),
            Geometry::line_string(vec![]),
            Geometry::Polygon(Polygon::new(shell.clone(), vec![hole])),
            Geometry::Polygon(Polygon::empty()),
            Geometry::MultiPoint(vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]),
            Geometry::MultiLineString(vec![
                LineString::new(vec![c(0.0, 0.0), c(1.0, 1.0)]),
                LineString::new(vec![c(5.0, 5.0), c(6.0, 6.0)]),
            ]),
            Geometry::MultiPolygon(vec![Polygon::new(shell, vec![])]),
            Geometry::MultiPolygon(vec![]),
            Geometry::GeometryCollection(vec![
                Geometry::point(1.0, 1.0),
                Geometry::GeometryCollection(vec![Geometry::line_string(vec![
                    c(0.0, 0.0),
                    c(1.0, 0.0),
                ])]),
            ]),
        ]
    }

    #[test]
    fn test_round_trip_all_variants() {
        let mut codec = WkbCodec::new();
        for geometry in samples() {
            let bytes = codec.encode_to_vec(&geometry);
            assert_eq!(codec.decode(&bytes).unwrap(), geometry, "{}", geometry);
        }
    }

    #[test]
    fn test_round_trip_big_endian() {
        let mut codec = WkbCodec::with_byte_order(WkbByteOrder::BigEndian);
        for geometry in samples() {
            let bytes = codec.encode_to_vec(&geometry);
            assert_eq!(bytes[0], 0);
            assert_eq!(codec.decode(&bytes).unwrap(), geometry);
        }
    }

    #[test]
    fn test_point_layout() {
        let mut codec = WkbCodec::new();
        let bytes = codec.encode(&Geometry::point(1.0, 2.0));
        assert_eq!(
            hex::encode_upper(bytes),
            "0101000000000000000000F03F0000000000000040"
        );
    }

    #[test]
    fn test_decode_big_endian_literal() {
        let bytes = hex::decode("00000000013FF00000000000004000000000000000").unwrap();
        let codec = WkbCodec::new();
        assert_eq!(codec.decode(&bytes).unwrap(), Geometry::point(1.0, 2.0));
    }

    #[test]
    fn test_linear_ring_encodes_as_line_string() {
        let mut codec = WkbCodec::new();
        let r = ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.0, 0.0)]);
        let bytes = codec.encode_to_vec(&Geometry::LinearRing(r.clone()));
        assert_eq!(
            codec.decode(&bytes).unwrap(),
            Geometry::LineString(r.to_line_string())
        );
    }

    #[test]
    fn test_ewkb_srid() {
        let mut codec = WkbCodec::new();
        let point = Geometry::point_3d(1.0, 2.0, 3.0);
        let bytes = codec.encode_with_srid(&point, 4326).to_vec();
        let code = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
        assert_eq!(code, 0xA000_0001);

        let (decoded, srid) = codec.decode_with_srid(&bytes).unwrap();
        assert_eq!(decoded, point);
        assert_eq!(srid, Some(4326));
        let plain = codec.encode_to_vec(&point);
        assert_eq!(codec.decode_with_srid(&plain).unwrap().1, None);
    }

    #[test]
    fn test_iso_type_codes() {
        let codec = WkbCodec::new();

        // POINT Z (1 2 3)
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&1001u32.to_le_bytes());
        for v in [1.0f64, 2.0, 3.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(codec.decode(&bytes).unwrap(), Geometry::point_3d(1.0, 2.0, 3.0));

        // POINT M (1 2 9), M dropped
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&2001u32.to_le_bytes());
        for v in [1.0f64, 2.0, 9.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(codec.decode(&bytes).unwrap(), Geometry::point(1.0, 2.0));

        // POINT ZM (1 2 3 9)
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&3001u32.to_le_bytes());
        for v in [1.0f64, 2.0, 3.0, 9.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(codec.decode(&bytes).unwrap(), Geometry::point_3d(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_unknown_byte_order() {
        let codec = WkbCodec::new();
        let err = codec.decode(&[7, 1, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, SpatialError::MalformedWireFormat(ref m) if m.contains("byte order")));
    }

    #[test]
    fn test_unknown_type_code() {
        let codec = WkbCodec::new();
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&8u32.to_le_bytes());
        let err = codec.decode(&bytes).unwrap_err();
        assert!(matches!(err, SpatialError::MalformedWireFormat(ref m) if m.contains("type code")));

        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&4001u32.to_le_bytes());
        assert!(codec.decode(&bytes).is_err());
    }

    #[test]
    fn test_count_exceeds_bytes() {
        let codec = WkbCodec::new();
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&1_000_000u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 32]);
        let err = codec.decode(&bytes).unwrap_err();
        match err {
            SpatialError::MalformedWireFormat(msg) => {
                assert!(msg.contains("1000000"));
                assert!(msg.contains("of 41"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_truncated_and_trailing() {
        let mut codec = WkbCodec::new();
        let bytes = codec.encode_to_vec(&Geometry::point(1.0, 2.0));
        assert!(codec.decode(&bytes[..bytes.len() - 1]).is_err());
        assert!(codec.decode(&[]).is_err());

        let mut longer = bytes.clone();
        longer.push(0);
        assert!(matches!(
            codec.decode(&longer),
            Err(SpatialError::MalformedWireFormat(ref m)) if m.contains("trailing")
        ));
    }

    #[test]
    fn test_wrong_member_kind() {
        let mut codec = WkbCodec::new();
        let line = codec.encode_to_vec(&Geometry::line_string(vec![c(0.0, 0.0), c(1.0, 1.0)]));
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&line);
        assert!(matches!(
            codec.decode(&bytes),
            Err(SpatialError::MalformedWireFormat(ref m)) if m.contains("cannot contain")
        ));
    }

    #[test]
    fn test_unclosed_ring() {
        let codec = WkbCodec::new();
        let mut bytes = vec![1u8];
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&4u32.to_le_bytes());
        for v in [0.0f64, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        assert!(matches!(
            codec.decode(&bytes),
            Err(SpatialError::MalformedWireFormat(ref m)) if m.contains("ring 0")
        ));
    }

    #[test]
    fn test_decode_optional() {
        let mut codec = WkbCodec::new();
        assert_eq!(codec.decode_optional(None).unwrap(), None);
        let bytes = codec.encode_to_vec(&Geometry::empty_point());
        assert_eq!(
            codec.decode_optional(Some(&bytes)).unwrap(),
            Some(Geometry::empty_point())
        );
    }

    #[test]
    fn test_read_from_row() {
        let mut codec = WkbCodec::new();
        let point = Geometry::point(1.0, 2.0);
        let bytes = codec.encode_to_vec(&point);
        let row = Row::new()
            .with("GEOM", bytes.clone())
            .with("HEX", hex::encode(&bytes))
            .with("NOTHING", Value::Null)
            .with("NAME", 7i64);

        assert_eq!(codec.read(&row, "geom").unwrap(), Some(point.clone()));
        assert_eq!(codec.read(&row, 1usize).unwrap(), Some(point));
        assert_eq!(codec.read(&row, "NOTHING").unwrap(), None);
        assert!(matches!(
            codec.read(&row, "NAME"),
            Err(SpatialError::MalformedWireFormat(_))
        ));
        assert!(matches!(codec.read(&row, "MISSING"), Err(SpatialError::Core(_))));
    }

    #[test]
    fn test_read_reports_column() {
        let mut codec = WkbCodec::new();
        let row = Row::new().with("GEOM", vec![9u8, 9, 9]);
        match codec.read(&row, "GEOM") {
            Err(SpatialError::MalformedWireFormat(msg)) => assert!(msg.starts_with("column GEOM")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_scratch_buffer_reused() {
        let mut codec = WkbCodec::new();
        let first = codec.encode(&Geometry::point(1.0, 2.0)).len();
        let second = codec.encode(&Geometry::point(3.0, 4.0)).len();
        assert_eq!(first, second);
    }
}
