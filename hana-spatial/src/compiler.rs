//! Predicate to SQL compilation.
//!
//! [`HanaFilterToSql`] reduces a [`Predicate`] tree to a SQL boolean
//! expression. It holds no state between calls: the output is a function of
//! the tree, the loose bbox flag and the literal encoder.

use hana::hana_config::HanaConfig;
use hana::sql::LiteralEncoder;
use std::sync::Arc;

use crate::dialect::HanaLiteralEncoder;
use crate::filter::{ComparisonOp, DistanceOperator, Expression, Predicate, SpatialOperator};
use crate::geometry::Geometry;
use crate::{SpatialError, SpatialResult};

/// The operators a compiler can translate.
#[derive(Debug)]
pub struct FilterCapabilities {
    spatial: &'static [SpatialOperator],
    distance: &'static [DistanceOperator],
    comparisons: &'static [ComparisonOp],
}

impl FilterCapabilities {
    pub fn spatial_operators(&self) -> &[SpatialOperator] {
        self.spatial
    }

    pub fn distance_operators(&self) -> &[DistanceOperator] {
        self.distance
    }

    pub fn comparison_operators(&self) -> &[ComparisonOp] {
        self.comparisons
    }

    pub fn supports_spatial(&self, op: SpatialOperator) -> bool {
        self.spatial.contains(&op)
    }

    pub fn supports_distance(&self, op: DistanceOperator) -> bool {
        self.distance.contains(&op)
    }

    pub fn supports_comparison(&self, op: ComparisonOp) -> bool {
        self.comparisons.contains(&op)
    }
}

static CAPABILITIES: FilterCapabilities = FilterCapabilities {
    spatial: &[
        SpatialOperator::BBox,
        SpatialOperator::Contains,
        SpatialOperator::Crosses,
        SpatialOperator::Disjoint,
        SpatialOperator::Equals,
        SpatialOperator::Intersects,
        SpatialOperator::Overlaps,
        SpatialOperator::Touches,
        SpatialOperator::Within,
    ],
    distance: &[DistanceOperator::DWithin, DistanceOperator::Beyond],
    comparisons: &[
        ComparisonOp::Eq,
        ComparisonOp::NotEq,
        ComparisonOp::Lt,
        ComparisonOp::LtEq,
        ComparisonOp::Gt,
        ComparisonOp::GtEq,
        ComparisonOp::Like,
    ],
};

/// Compiles predicates into HANA SQL.
///
/// # Examples
///
/// ```rust
/// use hana_spatial::{spatial_field, Geometry, HanaFilterToSql};
///
/// let compiler = HanaFilterToSql::new(false);
/// let sql = compiler
///     .compile(&spatial_field("geom").intersects(Geometry::point(1.0, 2.0)))
///     .unwrap();
/// assert_eq!(
///     sql,
///     "\"geom\" && ST_Geometry('POINT (1 2)') AND \"geom\".ST_Intersects(ST_Geometry('POINT (1 2)'))"
/// );
/// ```
#[derive(Clone)]
pub struct HanaFilterToSql {
    loose_bbox_enabled: bool,
    encoder: Arc<dyn LiteralEncoder>,
}

impl HanaFilterToSql {
    /// Creates a compiler using the HANA literal syntax.
    pub fn new(loose_bbox_enabled: bool) -> Self {
        Self::with_encoder(Arc::new(HanaLiteralEncoder), loose_bbox_enabled)
    }

    /// Creates a compiler delegating identifiers and scalars to `encoder`.
    pub fn with_encoder(encoder: Arc<dyn LiteralEncoder>, loose_bbox_enabled: bool) -> Self {
        HanaFilterToSql {
            loose_bbox_enabled,
            encoder,
        }
    }

    pub fn from_config(config: &HanaConfig) -> Self {
        Self::new(config.is_loose_bbox_enabled())
    }

    pub fn is_loose_bbox_enabled(&self) -> bool {
        self.loose_bbox_enabled
    }

    pub fn set_loose_bbox_enabled(&mut self, enabled: bool) {
        self.loose_bbox_enabled = enabled;
    }

    pub fn capabilities() -> &'static FilterCapabilities {
        &CAPABILITIES
    }

    /// Whether every node of the tree can be compiled.
    pub fn supports(&self, predicate: &Predicate) -> bool {
        let caps = Self::capabilities();
        match predicate {
            Predicate::Include | Predicate::Exclude | Predicate::IsNull(_) => true,
            Predicate::And(children) | Predicate::Or(children) => {
                children.iter().all(|c| self.supports(c))
            }
            Predicate::Not(child) => self.supports(child),
            Predicate::Comparison { op, .. } => caps.supports_comparison(*op),
            Predicate::BinarySpatial { op, .. } | Predicate::SpatialExpressions { op, .. } => {
                caps.supports_spatial(*op)
            }
            Predicate::DistanceSpatial { op, distance, .. } => {
                caps.supports_distance(*op) && distance.is_finite()
            }
        }
    }

    /// Compiles a predicate.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPredicate` when any node has no SQL mapping. No
    /// partial SQL is produced.
    pub fn compile(&self, predicate: &Predicate) -> SpatialResult<String> {
        let mut sql = String::new();
        self.write_predicate(predicate, &mut sql)?;
        Ok(sql)
    }

    /// Appends the compiled predicate to `out`, leaving `out` untouched on
    /// failure.
    pub fn compile_into(&self, predicate: &Predicate, out: &mut String) -> SpatialResult<()> {
        let sql = self.compile(predicate)?;
        out.push_str(&sql);
        Ok(())
    }

    /// Compiles a predicate into a `WHERE` clause.
    pub fn encode_to_where(&self, predicate: &Predicate) -> SpatialResult<String> {
        let mut sql = String::from("WHERE ");
        self.write_predicate(predicate, &mut sql)?;
        Ok(sql)
    }

    fn write_predicate(&self, predicate: &Predicate, out: &mut String) -> SpatialResult<()> {
        match predicate {
            Predicate::Include => out.push_str("1 = 1"),
            Predicate::Exclude => out.push_str("0 = 1"),
            Predicate::And(children) if children.is_empty() => out.push_str("1 = 1"),
            Predicate::Or(children) if children.is_empty() => out.push_str("0 = 1"),
            Predicate::And(children) => self.write_logical(children, " AND ", out)?,
            Predicate::Or(children) => self.write_logical(children, " OR ", out)?,
            Predicate::Not(child) => {
                out.push_str("NOT (");
                self.write_predicate(child, out)?;
                out.push(')');
            }
            Predicate::Comparison { op, left, right } => {
                self.write_expression(left, out);
                out.push(' ');
                out.push_str(op.sql());
                out.push(' ');
                self.write_expression(right, out);
            }
            Predicate::IsNull(expr) => {
                self.write_expression(expr, out);
                out.push_str(" IS NULL");
            }
            Predicate::BinarySpatial {
                op,
                property,
                geometry,
                swapped,
            } => self.write_comparison_spatial(*op, property, geometry, *swapped, out)?,
            Predicate::DistanceSpatial {
                op,
                property,
                geometry,
                distance,
                swapped,
            } => self.write_distance_spatial(*op, property, geometry, *distance, *swapped, out)?,
            Predicate::SpatialExpressions { op, left, right } => {
                let function = spatial_function(*op, false)?;
                self.write_expression(left, out);
                out.push('.');
                out.push_str(function);
                out.push('(');
                self.write_expression(right, out);
                out.push(')');
            }
        }
        Ok(())
    }

    fn write_logical(&self, children: &[Predicate], joiner: &str, out: &mut String) -> SpatialResult<()> {
        out.push('(');
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                out.push_str(joiner);
            }
            self.write_predicate(child, out)?;
        }
        out.push(')');
        Ok(())
    }

    /// `prop && geom AND prop.ST_<Op>(geom)`, with the envelope test alone
    /// for a loose bbox and the exact test alone for disjoint.
    fn write_comparison_spatial(
        &self,
        op: SpatialOperator,
        property: &str,
        geometry: &Geometry,
        swapped: bool,
        out: &mut String,
    ) -> SpatialResult<()> {
        let function = spatial_function(op, swapped)?;

        if op != SpatialOperator::Disjoint {
            self.write_property(property, out);
            out.push_str(" && ");
            self.write_geometry(geometry, out);

            if op == SpatialOperator::BBox && self.loose_bbox_enabled {
                return Ok(());
            }
            out.push_str(" AND ");
        }

        self.write_property(property, out);
        out.push('.');
        out.push_str(function);
        out.push('(');
        self.write_geometry(geometry, out);
        out.push(')');
        Ok(())
    }

    fn write_distance_spatial(
        &self,
        op: DistanceOperator,
        property: &str,
        geometry: &Geometry,
        distance: f64,
        swapped: bool,
        out: &mut String,
    ) -> SpatialResult<()> {
        if !distance.is_finite() {
            log::error!("Distance {} of {} on {} is not finite", distance, op, property);
            return Err(SpatialError::UnsupportedPredicate(format!(
                "{} with non finite distance {}",
                op, distance
            )));
        }

        self.write_property(property, out);
        let within = matches!(
            (op, swapped),
            (DistanceOperator::DWithin, false) | (DistanceOperator::Beyond, true)
        );
        if within {
            out.push_str(".ST_WithinDistance(");
            self.write_geometry(geometry, out);
            out.push_str(&format!(",{:?})", distance));
        } else {
            out.push_str(".ST_Distance(");
            self.write_geometry(geometry, out);
            out.push_str(&format!(") > {:?}", distance));
        }
        Ok(())
    }

    fn write_expression(&self, expression: &Expression, out: &mut String) {
        match expression {
            Expression::Property(name) => self.write_property(name, out),
            Expression::Literal(value) => self.encoder.encode_value(value, out),
            Expression::Geometry(geometry) => self.write_geometry(geometry, out),
        }
    }

    fn write_property(&self, name: &str, out: &mut String) {
        self.encoder.encode_column_name(None, name, out);
    }

    /// `ST_Geometry('<wkt>')`, rings rendered as line strings.
    fn write_geometry(&self, geometry: &Geometry, out: &mut String) {
        out.push_str("ST_Geometry(");
        self.encoder
            .encode_string(&geometry.normalized().to_wkt(), out);
        out.push(')');
    }
}

/// The member function evaluating `op`, resolving operand swaps of the
/// asymmetric containment relations.
fn spatial_function(op: SpatialOperator, swapped: bool) -> SpatialResult<&'static str> {
    let function = match op {
        SpatialOperator::Equals => "ST_Equals",
        SpatialOperator::Disjoint => "ST_Disjoint",
        SpatialOperator::Intersects | SpatialOperator::BBox => "ST_Intersects",
        SpatialOperator::Crosses => "ST_Crosses",
        SpatialOperator::Within if swapped => "ST_Contains",
        SpatialOperator::Within => "ST_Within",
        SpatialOperator::Contains if swapped => "ST_Within",
        SpatialOperator::Contains => "ST_Contains",
        SpatialOperator::Overlaps => "ST_Overlaps",
        SpatialOperator::Touches => "ST_Touches",
        SpatialOperator::Relate => {
            log::error!("Unsupported filter type {}", op);
            return Err(SpatialError::UnsupportedPredicate(format!(
                "Unsupported filter type {}",
                op
            )));
        }
    };
    Ok(function)
}
