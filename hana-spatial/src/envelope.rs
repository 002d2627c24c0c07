use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::geometry::Coordinate;

/// An axis-aligned bounding box.
///
/// An `Envelope` is either *null* (no coordinate has been folded into it) or
/// spans `[min_x, max_x] x [min_y, max_y]`, with an optional Z range when a
/// 3D coordinate contributed to it.
///
/// # Examples
///
/// ```rust
/// use hana_spatial::{Coordinate, Envelope};
///
/// let mut env = Envelope::null();
/// assert!(env.is_null());
///
/// env.expand_to_include(&Coordinate::new(1.0, 2.0));
/// env.expand_to_include(&Coordinate::new(-1.0, 5.0));
/// assert_eq!(env, Envelope::new(-1.0, 2.0, 1.0, 5.0));
/// ```
///
/// Serialized as its extrema, or as `null` for the null envelope.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Envelope {
    /// Minimum X coordinate
    pub min_x: f64,
    /// Minimum Y coordinate
    pub min_y: f64,
    /// Maximum X coordinate
    pub max_x: f64,
    /// Maximum Y coordinate
    pub max_y: f64,
    /// Minimum Z coordinate, present once a 3D coordinate was included
    pub min_z: Option<f64>,
    /// Maximum Z coordinate, present once a 3D coordinate was included
    pub max_z: Option<f64>,
}

#[derive(Serialize, Deserialize)]
struct EnvelopeBounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_z: Option<f64>,
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bounds = (!self.is_null()).then_some(EnvelopeBounds {
            min_x: self.min_x,
            min_y: self.min_y,
            max_x: self.max_x,
            max_y: self.max_y,
            min_z: self.min_z,
            max_z: self.max_z,
        });
        bounds.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let env = match Option::<EnvelopeBounds>::deserialize(deserializer)? {
            Some(b) => Envelope {
                min_x: b.min_x,
                min_y: b.min_y,
                max_x: b.max_x,
                max_y: b.max_y,
                min_z: b.min_z,
                max_z: b.max_z,
            },
            None => Envelope::null(),
        };
        Ok(env)
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope::null()
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "Env[null]");
        }
        write!(
            f,
            "Env[{} : {}, {} : {}]",
            self.min_x, self.max_x, self.min_y, self.max_y
        )?;
        if let (Some(min_z), Some(max_z)) = (self.min_z, self.max_z) {
            write!(f, "[{} : {}]", min_z, max_z)?;
        }
        Ok(())
    }
}

impl Envelope {
    /// Creates a 2D envelope. Extrema given in the wrong order are swapped.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Envelope {
        Envelope {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
            min_z: None,
            max_z: None,
        }
    }

    /// Creates a 3D envelope.
    pub fn new_3d(
        min_x: f64,
        min_y: f64,
        min_z: f64,
        max_x: f64,
        max_y: f64,
        max_z: f64,
    ) -> Envelope {
        Envelope {
            min_z: Some(min_z.min(max_z)),
            max_z: Some(min_z.max(max_z)),
            ..Envelope::new(min_x, min_y, max_x, max_y)
        }
    }

    /// The envelope no geometry has contributed to.
    pub fn null() -> Envelope {
        Envelope {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
            min_z: None,
            max_z: None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.min_x > self.max_x
    }

    pub fn has_z(&self) -> bool {
        self.min_z.is_some()
    }

    /// Grows the envelope to cover `coord`. NaN ordinates are ignored.
    pub fn expand_to_include(&mut self, coord: &Coordinate) {
        if coord.x.is_nan() || coord.y.is_nan() {
            return;
        }
        self.min_x = self.min_x.min(coord.x);
        self.min_y = self.min_y.min(coord.y);
        self.max_x = self.max_x.max(coord.x);
        self.max_y = self.max_y.max(coord.y);
        if let Some(z) = coord.z.filter(|z| !z.is_nan()) {
            self.min_z = Some(self.min_z.map_or(z, |m| m.min(z)));
            self.max_z = Some(self.max_z.map_or(z, |m| m.max(z)));
        }
    }

    /// Grows the envelope to cover another one.
    pub fn expand_to_include_envelope(&mut self, other: &Envelope) {
        if other.is_null() {
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
        if let (Some(min_z), Some(max_z)) = (other.min_z, other.max_z) {
            self.min_z = Some(self.min_z.map_or(min_z, |m| m.min(min_z)));
            self.max_z = Some(self.max_z.map_or(max_z, |m| m.max(max_z)));
        }
    }

    /// Returns the width of the envelope, zero when null.
    pub fn width(&self) -> f64 {
        if self.is_null() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    /// Returns the height of the envelope, zero when null.
    pub fn height(&self) -> f64 {
        if self.is_null() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Returns the center point, `None` when null.
    pub fn center(&self) -> Option<Coordinate> {
        if self.is_null() {
            return None;
        }
        Some(Coordinate::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        ))
    }

    /// Checks if this envelope contains a point.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        !self.is_null() && x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Checks if this envelope contains another envelope.
    pub fn contains(&self, other: &Envelope) -> bool {
        !self.is_null()
            && !other.is_null()
            && other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// The `&&` relation: two envelopes overlap or touch.
    pub fn intersects(&self, other: &Envelope) -> bool {
        !self.is_null()
            && !other.is_null()
            && self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Checks if this envelope is a point (zero area).
    pub fn is_point(&self) -> bool {
        !self.is_null() && self.min_x == self.max_x && self.min_y == self.max_y
    }
}
