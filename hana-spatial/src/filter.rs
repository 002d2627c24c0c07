//! Predicate trees compiled into SQL.
//!
//! A [`Predicate`] is built once per query, either directly, through
//! [`Predicate::binary_spatial`] which normalises operand order, or with the
//! fluent API in [`crate::fluent`].

use hana::value::Value;
use std::fmt::{self, Display};

use crate::geometry::Geometry;
use crate::{SpatialError, SpatialResult};

/// Spatial relations between two geometries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpatialOperator {
    Equals,
    Disjoint,
    Intersects,
    BBox,
    Crosses,
    Within,
    Contains,
    Overlaps,
    Touches,
    /// DE-9IM pattern match. No SQL mapping exists for it.
    Relate,
}

impl SpatialOperator {
    pub fn name(&self) -> &'static str {
        match self {
            SpatialOperator::Equals => "Equals",
            SpatialOperator::Disjoint => "Disjoint",
            SpatialOperator::Intersects => "Intersects",
            SpatialOperator::BBox => "BBox",
            SpatialOperator::Crosses => "Crosses",
            SpatialOperator::Within => "Within",
            SpatialOperator::Contains => "Contains",
            SpatialOperator::Overlaps => "Overlaps",
            SpatialOperator::Touches => "Touches",
            SpatialOperator::Relate => "Relate",
        }
    }
}

impl Display for SpatialOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Distance bounded relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceOperator {
    DWithin,
    Beyond,
}

impl Display for DistanceOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceOperator::DWithin => write!(f, "DWithin"),
            DistanceOperator::Beyond => write!(f, "Beyond"),
        }
    }
}

/// Scalar comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
}

impl ComparisonOp {
    /// The SQL spelling of the operator.
    pub fn sql(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::GtEq => ">=",
            ComparisonOp::Like => "LIKE",
        }
    }
}

/// A leaf operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A column, by attribute name.
    Property(String),
    /// A scalar literal.
    Literal(Value),
    /// A geometry literal.
    Geometry(Geometry),
}

impl Expression {
    pub fn property(name: impl Into<String>) -> Self {
        Expression::Property(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }
}

impl From<Geometry> for Expression {
    fn from(value: Geometry) -> Self {
        Expression::Geometry(value)
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Property(name) => write!(f, "{}", name),
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Geometry(geometry) => write!(f, "{}", geometry),
        }
    }
}

/// A filter over features.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches everything.
    Include,
    /// Matches nothing.
    Exclude,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Comparison {
        op: ComparisonOp,
        left: Expression,
        right: Expression,
    },
    IsNull(Expression),
    /// A spatial relation between a column and a geometry literal.
    ///
    /// `swapped` records that the literal came first as the filter was written.
    BinarySpatial {
        op: SpatialOperator,
        property: String,
        geometry: Geometry,
        swapped: bool,
    },
    /// A distance relation between a column and a geometry literal.
    DistanceSpatial {
        op: DistanceOperator,
        property: String,
        geometry: Geometry,
        distance: f64,
        swapped: bool,
    },
    /// A spatial relation between two arbitrary expressions.
    SpatialExpressions {
        op: SpatialOperator,
        left: Expression,
        right: Expression,
    },
}

impl Predicate {
    /// Builds a spatial predicate from operands in the order they were given.
    ///
    /// A property and a geometry literal, in either order, become a
    /// `BinarySpatial` node with `swapped` set when the literal came first.
    /// Any other pairing becomes a `SpatialExpressions` node.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hana_spatial::filter::{Expression, Predicate, SpatialOperator};
    /// use hana_spatial::Geometry;
    ///
    /// let p = Predicate::binary_spatial(
    ///     SpatialOperator::Within,
    ///     Geometry::point(1.0, 2.0).into(),
    ///     Expression::property("geom"),
    /// );
    /// assert!(matches!(p, Predicate::BinarySpatial { swapped: true, .. }));
    /// ```
    pub fn binary_spatial(op: SpatialOperator, e1: Expression, e2: Expression) -> Predicate {
        match (e1, e2) {
            (Expression::Property(property), Expression::Geometry(geometry)) => {
                Predicate::BinarySpatial {
                    op,
                    property,
                    geometry,
                    swapped: false,
                }
            }
            (Expression::Geometry(geometry), Expression::Property(property)) => {
                Predicate::BinarySpatial {
                    op,
                    property,
                    geometry,
                    swapped: true,
                }
            }
            (left, right) => Predicate::SpatialExpressions { op, left, right },
        }
    }

    /// Builds a distance predicate from operands in the order they were given.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` unless the operands are one property and one
    /// geometry literal.
    pub fn distance_spatial(
        op: DistanceOperator,
        e1: Expression,
        e2: Expression,
        distance: f64,
    ) -> SpatialResult<Predicate> {
        match (e1, e2) {
            (Expression::Property(property), Expression::Geometry(geometry)) => {
                Ok(Predicate::DistanceSpatial {
                    op,
                    property,
                    geometry,
                    distance,
                    swapped: false,
                })
            }
            (Expression::Geometry(geometry), Expression::Property(property)) => {
                Ok(Predicate::DistanceSpatial {
                    op,
                    property,
                    geometry,
                    distance,
                    swapped: true,
                })
            }
            (left, right) => {
                log::error!("{} needs a property and a geometry, got {} and {}", op, left, right);
                Err(SpatialError::InvalidOperation(format!(
                    "{} needs a property and a geometry literal, got {} and {}",
                    op, left, right
                )))
            }
        }
    }

    pub fn compare(op: ComparisonOp, left: Expression, right: Expression) -> Predicate {
        Predicate::Comparison { op, left, right }
    }

    /// `property = value`
    pub fn eq(property: &str, value: impl Into<Value>) -> Predicate {
        Predicate::compare(
            ComparisonOp::Eq,
            Expression::property(property),
            Expression::literal(value),
        )
    }

    pub fn is_null(property: &str) -> Predicate {
        Predicate::IsNull(Expression::property(property))
    }

    pub fn and(self, other: Predicate) -> Predicate {
        match self {
            Predicate::And(mut children) => {
                children.push(other);
                Predicate::And(children)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Predicate {
        match self {
            Predicate::Or(mut children) => {
                children.push(other);
                Predicate::Or(children)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Include => write!(f, "INCLUDE"),
            Predicate::Exclude => write!(f, "EXCLUDE"),
            Predicate::And(children) | Predicate::Or(children) => {
                let joiner = if matches!(self, Predicate::And(_)) { " and " } else { " or " };
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", joiner)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            Predicate::Not(child) => write!(f, "not {}", child),
            Predicate::Comparison { op, left, right } => {
                write!(f, "({} {} {})", left, op.sql(), right)
            }
            Predicate::IsNull(expr) => write!(f, "({} is null)", expr),
            Predicate::BinarySpatial {
                op,
                property,
                geometry,
                swapped,
            } => {
                if *swapped {
                    write!(f, "({} {} {})", geometry, op, property)
                } else {
                    write!(f, "({} {} {})", property, op, geometry)
                }
            }
            Predicate::DistanceSpatial {
                op,
                property,
                geometry,
                distance,
                swapped,
            } => {
                if *swapped {
                    write!(f, "({} {} {}, {})", geometry, op, property, distance)
                } else {
                    write!(f, "({} {} {}, {})", property, op, geometry, distance)
                }
            }
            Predicate::SpatialExpressions { op, left, right } => {
                write!(f, "({} {} {})", left, op, right)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_spatial_canonical_order() {
        let p = Predicate::binary_spatial(
            SpatialOperator::Intersects,
            Expression::property("geom"),
            Geometry::point(1.0, 2.0).into(),
        );
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
    fn test_binary_spatial_swapped_order() {
        let p = Predicate::binary_spatial(
            SpatialOperator::Contains,
            Geometry::point(1.0, 2.0).into(),
            Expression::property("geom"),
        );
        assert!(matches!(
            p,
            Predicate::BinarySpatial {
                op: SpatialOperator::Contains,
                swapped: true,
                ..
            }
        ));
    }

    #[test]
    fn test_binary_spatial_two_properties() {
        let p = Predicate::binary_spatial(
            SpatialOperator::Touches,
            Expression::property("a"),
            Expression::property("b"),
        );
        assert!(matches!(p, Predicate::SpatialExpressions { .. }));
    }

    #[test]
    fn test_distance_spatial() {
        let p = Predicate::distance_spatial(
            DistanceOperator::Beyond,
            Geometry::point(0.0, 0.0).into(),
            Expression::property("geom"),
            5.0,
        )
        .unwrap();
        assert!(matches!(p, Predicate::DistanceSpatial { swapped: true, .. }));

        let err = Predicate::distance_spatial(
            DistanceOperator::DWithin,
            Expression::property("a"),
            Expression::property("b"),
            5.0,
        )
        .unwrap_err();
        assert!(matches!(err, SpatialError::InvalidOperation(_)));
    }

    #[test]
    fn test_logical_combinators_flatten() {
        let p = Predicate::eq("a", 1i64)
            .and(Predicate::eq("b", 2i64))
            .and(Predicate::is_null("c"));
        match p {
            Predicate::And(children) => assert_eq!(children.len(), 3),
            other => panic!("unexpected {:?}", other),
        }

        let p = Predicate::Include.or(Predicate::Exclude).not();
        assert!(matches!(p, Predicate::Not(_)));
    }

    #[test]
    fn test_display() {
        let p = Predicate::binary_spatial(
            SpatialOperator::Within,
            Geometry::point(1.0, 2.0).into(),
            Expression::property("geom"),
        );
        assert_eq!(p.to_string(), "(POINT (1 2) Within geom)");

        let p = Predicate::eq("name", "x").or(Predicate::is_null("name"));
        assert_eq!(p.to_string(), "((name = x) or (name is null))");
    }

    #[test]
    fn test_comparison_sql() {
        assert_eq!(ComparisonOp::NotEq.sql(), "<>");
        assert_eq!(ComparisonOp::Like.sql(), "LIKE");
        assert_eq!(SpatialOperator::BBox.to_string(), "BBox");
    }
}
