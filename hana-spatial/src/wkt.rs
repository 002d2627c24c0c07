//! Well-known-text rendering and parsing.
//!
//! The rendering follows the spacing the database echoes back
//! (`POINT (1 2)`, `POLYGON ((0 0, 0 1, 1 1, 0 0))`, `POINT Z (1 2 3)`), so a
//! geometry rendered here and parsed from an `ST_AsText()` result compare
//! equal.

use itertools::Itertools;

use crate::geometry::{Coordinate, Geometry, LineString, LinearRing, Point, Polygon};
use crate::{SpatialError, SpatialResult};

/// Deepest collection nesting accepted by [`parse_wkt`].
const MAX_DEPTH: usize = 64;

/// Renders a geometry as WKT.
pub fn to_wkt(geometry: &Geometry) -> String {
    let mut out = String::new();
    write_geometry(geometry, &mut out);
    out
}

fn write_geometry(geometry: &Geometry, out: &mut String) {
    let (tag, z) = (tag_of(geometry), renders_z(geometry));
    out.push_str(tag);
    if z {
        out.push_str(" Z");
    }
    if geometry.is_empty() {
        out.push_str(" EMPTY");
        return;
    }
    out.push(' ');

    match geometry {
        Geometry::Point(p) => write_point_body(p, z, out),
        Geometry::LineString(l) => write_sequence(l.coordinates(), z, out),
        Geometry::LinearRing(r) => write_sequence(r.coordinates(), z, out),
        Geometry::Polygon(p) => write_polygon_body(p, z, out),
        Geometry::MultiPoint(points) => {
            write_list(points, out, |p, out| write_point_body(p, z, out))
        }
        Geometry::MultiLineString(lines) => {
            write_list(lines, out, |l, out| write_sequence(l.coordinates(), z, out))
        }
        Geometry::MultiPolygon(polygons) => {
            write_list(polygons, out, |p, out| write_polygon_body(p, z, out))
        }
        Geometry::GeometryCollection(members) => write_list(members, out, write_geometry),
    }
}

/// Z is written only when every coordinate carries one.
fn renders_z(geometry: &Geometry) -> bool {
    let (mut any, mut all) = (false, true);
    geometry.visit_coordinates(&mut |c| {
        any = true;
        all &= c.has_z();
    });
    any && all
}

fn tag_of(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point(_) => "POINT",
        Geometry::LineString(_) => "LINESTRING",
        Geometry::LinearRing(_) => "LINEARRING",
        Geometry::Polygon(_) => "POLYGON",
        Geometry::MultiPoint(_) => "MULTIPOINT",
        Geometry::MultiLineString(_) => "MULTILINESTRING",
        Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
    }
}

fn write_list<T, F>(items: &[T], out: &mut String, mut write: F)
where
    F: FnMut(&T, &mut String),
{
    out.push('(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write(item, out);
    }
    out.push(')');
}

fn write_point_body(point: &Point, z: bool, out: &mut String) {
    match point.coordinate() {
        Some(c) => {
            out.push('(');
            write_coordinate(c, z, out);
            out.push(')');
        }
        None => out.push_str("EMPTY"),
    }
}

fn write_polygon_body(polygon: &Polygon, z: bool, out: &mut String) {
    if polygon.is_empty() {
        out.push_str("EMPTY");
        return;
    }
    write_list(polygon.rings(), out, |r, out| {
        write_sequence(r.coordinates(), z, out)
    })
}

fn write_sequence(coords: &[Coordinate], z: bool, out: &mut String) {
    if coords.is_empty() {
        out.push_str("EMPTY");
        return;
    }
    out.push('(');
    out.push_str(
        &coords
            .iter()
            .map(|c| {
                let mut s = String::new();
                write_coordinate(c, z, &mut s);
                s
            })
            .join(", "),
    );
    out.push(')');
}

fn write_coordinate(c: &Coordinate, z: bool, out: &mut String) {
    out.push_str(&format!("{} {}", c.x, c.y));
    if z {
        out.push_str(&format!(" {}", c.z.unwrap_or(f64::NAN)));
    }
}

/// Parses WKT into a geometry.
///
/// Accepts everything [`to_wkt`] emits plus the common variants: `M` and
/// `ZM` ordinates (M is dropped), implicit 3D coordinates, and multipoints
/// written without inner parentheses.
///
/// # Errors
///
/// Returns `TextParseFailure` naming the offending token.
///
/// # Examples
///
/// ```rust
/// use hana_spatial::wkt::parse_wkt;
/// use hana_spatial::Geometry;
///
/// let g = parse_wkt("POINT (1 2)").unwrap();
/// assert_eq!(g, Geometry::point(1.0, 2.0));
/// ```
pub fn parse_wkt(text: &str) -> SpatialResult<Geometry> {
    let tokens = tokenize(text)?;
    let mut parser = Parser { tokens, pos: 0 };
    let geometry = parser.geometry(0)?;
    if let Some(token) = parser.peek() {
        return Err(parse_error(&format!("unexpected trailing {:?}", token)));
    }
    Ok(geometry)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Number(f64),
    LParen,
    RParen,
    Comma,
}

fn tokenize(text: &str) -> SpatialResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some(&(start, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            c if c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.') => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.' | '_') {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let word = &text[start..end];
                let numeric = word.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
                    || word.eq_ignore_ascii_case("nan");
                if numeric {
                    let value = word
                        .parse::<f64>()
                        .map_err(|_| parse_error(&format!("invalid number '{}'", word)))?;
                    tokens.push(Token::Number(value));
                } else {
                    tokens.push(Token::Word(word.to_ascii_uppercase()));
                }
            }
            other => {
                return Err(parse_error(&format!(
                    "unexpected character '{}' at offset {}",
                    other, start
                )))
            }
        }
    }
    Ok(tokens)
}

fn parse_error(message: &str) -> SpatialError {
    SpatialError::TextParseFailure(message.to_string())
}

/// Which optional ordinates follow X and Y.
#[derive(Debug, Clone, Copy)]
struct Dims {
    z: bool,
    m: bool,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> SpatialResult<Token> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| parse_error("unexpected end of text"))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: Token) -> SpatialResult<()> {
        let token = self.next()?;
        if token != expected {
            return Err(parse_error(&format!(
                "expected {:?}, found {:?}",
                expected, token
            )));
        }
        Ok(())
    }

    fn is_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w == word)
    }

    /// Consumes `EMPTY` when it is next.
    fn empty(&mut self) -> bool {
        if self.is_word("EMPTY") {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn dims(&mut self) -> Dims {
        let dims = match self.peek() {
            Some(Token::Word(w)) if w == "Z" => Dims { z: true, m: false },
            Some(Token::Word(w)) if w == "M" => Dims { z: false, m: true },
            Some(Token::Word(w)) if w == "ZM" => Dims { z: true, m: true },
            _ => return Dims { z: false, m: false },
        };
        self.pos += 1;
        dims
    }

    fn geometry(&mut self, depth: usize) -> SpatialResult<Geometry> {
        if depth > MAX_DEPTH {
            return Err(parse_error(&format!(
                "geometry collections nested deeper than {}",
                MAX_DEPTH
            )));
        }
        let tag = match self.next()? {
            Token::Word(w) => w,
            other => return Err(parse_error(&format!("expected a geometry tag, found {:?}", other))),
        };
        let dims = self.dims();
        match tag.as_str() {
            "POINT" => Ok(Geometry::Point(self.point_body(dims)?)),
            "LINESTRING" => Ok(Geometry::LineString(LineString::new(self.sequence(dims)?))),
            "LINEARRING" => Ok(Geometry::LinearRing(self.ring(dims)?)),
            "POLYGON" => Ok(Geometry::Polygon(self.polygon_body(dims)?)),
            "MULTIPOINT" => self.list(|p| p.multi_point_item(dims)).map(Geometry::MultiPoint),
            "MULTILINESTRING" => self
                .list(|p| p.sequence(dims).map(LineString::new))
                .map(Geometry::MultiLineString),
            "MULTIPOLYGON" => self
                .list(|p| p.polygon_body(dims))
                .map(Geometry::MultiPolygon),
            "GEOMETRYCOLLECTION" => self
                .list(|p| p.geometry(depth + 1))
                .map(Geometry::GeometryCollection),
            other => Err(parse_error(&format!("unknown geometry tag {}", other))),
        }
    }

    /// `EMPTY` or a parenthesised, comma separated list of items.
    fn list<T, F>(&mut self, mut item: F) -> SpatialResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> SpatialResult<T>,
    {
        if self.empty() {
            return Ok(Vec::new());
        }
        self.expect(Token::LParen)?;
        let mut items = vec![item(self)?];
        loop {
            match self.next()? {
                Token::Comma => items.push(item(self)?),
                Token::RParen => return Ok(items),
                other => {
                    return Err(parse_error(&format!(
                        "expected ',' or ')', found {:?}",
                        other
                    )))
                }
            }
        }
    }

    fn point_body(&mut self, dims: Dims) -> SpatialResult<Point> {
        if self.empty() {
            return Ok(Point::empty());
        }
        self.expect(Token::LParen)?;
        let coord = self.coordinate(dims)?;
        self.expect(Token::RParen)?;
        Ok(Point::from_coordinate(coord))
    }

    fn multi_point_item(&mut self, dims: Dims) -> SpatialResult<Point> {
        match self.peek() {
            Some(Token::Number(_)) => Ok(Point::from_coordinate(self.coordinate(dims)?)),
            _ => self.point_body(dims),
        }
    }

    fn sequence(&mut self, dims: Dims) -> SpatialResult<Vec<Coordinate>> {
        self.list(|p| p.coordinate(dims))
    }

    fn ring(&mut self, dims: Dims) -> SpatialResult<LinearRing> {
        LinearRing::new(self.sequence(dims)?)
            .map_err(|err| SpatialError::TextParseFailure(err.to_string()))
    }

    fn polygon_body(&mut self, dims: Dims) -> SpatialResult<Polygon> {
        Ok(Polygon::from_rings(self.list(|p| p.ring(dims))?))
    }

    fn coordinate(&mut self, dims: Dims) -> SpatialResult<Coordinate> {
        let mut ordinates = Vec::with_capacity(4);
        while let Some(Token::Number(v)) = self.peek() {
            ordinates.push(*v);
            self.pos += 1;
        }
        let z = match (ordinates.len(), dims.z, dims.m) {
            (2, false, _) => None,
            (3, true, false) | (4, true, true) | (3, false, false) | (4, false, false) => {
                Some(ordinates[2])
            }
            (3, false, true) => None,
            (n, _, _) => {
                return Err(parse_error(&format!(
                    "coordinate has {} ordinates, expected {}",
                    n,
                    2 + dims.z as usize + dims.m as usize
                )))
            }
        };
        Ok(Coordinate {
            x: ordinates[0],
            y: ordinates[1],
            z: z.filter(|z| !z.is_nan()),
        })
    }
}
