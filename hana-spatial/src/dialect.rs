//! The SAP HANA dialect.
//!
//! [`HanaDialect`] ties the literal syntax, the filter compiler, the WKB
//! codec and the geometry resolver together behind the calls a data-access
//! layer makes while building and reading queries.

use hana::catalog::{CatalogProbe, ColumnMetadata, ColumnRef, Row};
use hana::hana_config::HanaConfig;
use hana::sql::{BasicLiteralEncoder, LiteralEncoder};
use hana::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::compiler::HanaFilterToSql;
use crate::envelope::Envelope;
use crate::geometry::{Geometry, GeometryType};
use crate::resolver::{self, GeometryColumn, GeometryResolver, GEOMETRY_COLUMNS_VIEW};
use crate::wkb::WkbCodec;
use crate::wkt::parse_wkt;
use crate::SpatialResult;

/// HANA literal syntax: byte arrays are written as `'\x..'` strings, every
/// other value as in [`BasicLiteralEncoder`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HanaLiteralEncoder;

impl LiteralEncoder for HanaLiteralEncoder {
    fn encode_value(&self, value: &Value, sql: &mut String) {
        match value {
            Value::Bytes(bytes) => {
                sql.push_str("'\\x");
                sql.push_str(&hex::encode(bytes));
                sql.push('\'');
            }
            other => BasicLiteralEncoder.encode_value(other, sql),
        }
    }
}

/// The attribute type a column is read into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    Geometry(GeometryType),
    Uuid,
    String,
    Long,
    Integer,
    Boolean,
    Double,
    Float,
    Short,
    Time,
    Timestamp,
}

/// Query hints the dialect can honour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hint {
    GeometrySimplification,
}

static SCALAR_BINDINGS: LazyLock<HashMap<&'static str, Binding>> = LazyLock::new(|| {
    HashMap::from([
        ("TEXT", Binding::String),
        ("VARCHAR", Binding::String),
        ("BIGINT", Binding::Long),
        ("INTEGER", Binding::Integer),
        ("BOOLEAN", Binding::Boolean),
        ("DOUBLE", Binding::Double),
        ("REAL", Binding::Float),
        ("DECIMAL", Binding::Float),
        ("SMALLINT", Binding::Short),
        ("TIME", Binding::Time),
        ("TIMESTAMP", Binding::Timestamp),
    ])
});

/// SQL dialect for SAP HANA spatial.
///
/// Cloning is cheap; clones share the configuration and the metadata cache.
/// Codecs are not shared: every execution context creates its own with
/// [`HanaDialect::new_codec`].
///
/// # Examples
///
/// ```rust,ignore
/// let dialect = HanaDialect::new(probe, HanaConfig::new());
/// let mut sql = String::from("SELECT ");
/// dialect.encode_geometry_column("SHAPE", None, false, &mut sql);
/// sql.push_str(" FROM ROADS WHERE ");
/// dialect.filter_to_sql().compile_into(&predicate, &mut sql)?;
/// dialect.apply_limit_offset(&mut sql, Some(10), 20);
/// ```
#[derive(Clone)]
pub struct HanaDialect {
    inner: Arc<HanaDialectInner>,
}

struct HanaDialectInner {
    config: HanaConfig,
    resolver: GeometryResolver,
    encoder: Arc<HanaLiteralEncoder>,
}

impl HanaDialect {
    pub fn new(probe: Arc<dyn CatalogProbe>, config: HanaConfig) -> Self {
        HanaDialect {
            inner: Arc::new(HanaDialectInner {
                resolver: GeometryResolver::new(probe, config.clone()),
                config,
                encoder: Arc::new(HanaLiteralEncoder),
            }),
        }
    }

    pub fn config(&self) -> &HanaConfig {
        &self.inner.config
    }

    pub fn resolver(&self) -> &GeometryResolver {
        &self.inner.resolver
    }

    pub fn encoder(&self) -> &HanaLiteralEncoder {
        &self.inner.encoder
    }

    /// A filter compiler reflecting the current loose bbox setting.
    pub fn filter_to_sql(&self) -> HanaFilterToSql {
        HanaFilterToSql::with_encoder(
            self.inner.encoder.clone(),
            self.inner.config.is_loose_bbox_enabled(),
        )
    }

    pub fn new_codec(&self) -> WkbCodec {
        WkbCodec::new()
    }

    pub fn encode_value(&self, value: &Value, sql: &mut String) {
        self.inner.encoder.encode_value(value, sql);
    }

    /// Appends `LIMIT n [OFFSET m]`, or `OFFSET m` alone when the limit is
    /// unbounded. A zero offset is never written.
    pub fn apply_limit_offset(&self, sql: &mut String, limit: Option<u64>, offset: u64) {
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if offset > 0 {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
    }

    // =========================================================================
    // Geometry columns
    // =========================================================================

    /// Selects a geometry column as extended WKB, or as plain 2D WKB when
    /// `force_2d` is set.
    pub fn encode_geometry_column(
        &self,
        column: &str,
        prefix: Option<&str>,
        force_2d: bool,
        sql: &mut String,
    ) {
        self.inner.encoder.encode_column_name(prefix, column, sql);
        if force_2d {
            sql.push_str(".ST_AsWKB()");
        } else {
            sql.push_str(".ST_AsEWKB()");
        }
    }

    /// Selects the envelope of a geometry column as WKT.
    pub fn encode_geometry_envelope(&self, column: &str, sql: &mut String) {
        self.inner.encoder.encode_column_name(None, column, sql);
        sql.push_str(".ST_Envelope().ST_AsText()");
    }

    /// Parses an envelope selected by [`encode_geometry_envelope`].
    ///
    /// SQL NULL yields the null envelope.
    ///
    /// [`encode_geometry_envelope`]: HanaDialect::encode_geometry_envelope
    pub fn decode_geometry_envelope(&self, text: Option<&str>) -> SpatialResult<Envelope> {
        let Some(text) = text else {
            return Ok(Envelope::null());
        };
        match parse_wkt(text) {
            Ok(geometry) => Ok(geometry.envelope_of()),
            Err(err) => {
                log::warn!("Could not decode envelope {:?}: {}", text, err);
                Err(err)
            }
        }
    }

    /// Reads a geometry cell with the caller's codec.
    pub fn decode_geometry_value(
        &self,
        codec: &mut WkbCodec,
        row: &Row,
        column: impl Into<ColumnRef>,
    ) -> SpatialResult<Option<Geometry>> {
        codec.read(row, column)
    }

    /// Writes a geometry as a `NEW ST_<Type>('<wkt>'[, srid])` constructor,
    /// or `NULL` when absent or empty.
    pub fn encode_geometry_value(&self, geometry: Option<&Geometry>, srid: i32, sql: &mut String) {
        let Some(geometry) = geometry.filter(|g| !g.is_empty()) else {
            sql.push_str("NULL");
            return;
        };
        let geometry = geometry.normalized();
        sql.push_str("NEW ");
        sql.push_str(resolver::native_type_name(geometry.geometry_type()));
        sql.push('(');
        self.inner.encoder.encode_string(&geometry.to_wkt(), sql);
        if srid > 0 {
            sql.push_str(&format!(", {}", srid));
        }
        sql.push(')');
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Whether a table should be exposed as a feature type.
    pub fn include_table(&self, table: &str) -> bool {
        !table.eq_ignore_ascii_case(GEOMETRY_COLUMNS_VIEW)
    }

    /// Maps a column to the type its values are read into, `None` when the
    /// type is unknown.
    pub fn column_binding(&self, column: &ColumnMetadata) -> Option<Binding> {
        let type_name = column.type_name.as_str();
        if type_name.eq_ignore_ascii_case("uuid") {
            return Some(Binding::Uuid);
        }
        if let Some(kind) = resolver::classify(type_name) {
            if kind != GeometryType::Generic {
                return Some(Binding::Geometry(kind));
            }
            let subtype = self
                .inner
                .resolver
                .resolve_geometry_subtype(column.schema.as_deref(), &column.table, &column.name)
                .unwrap_or(GeometryType::Generic);
            return Some(Binding::Geometry(subtype));
        }
        SCALAR_BINDINGS
            .get(type_name.to_ascii_uppercase().as_str())
            .copied()
    }

    pub fn geometry_srid(&self, schema: Option<&str>, table: &str, column: &str) -> i32 {
        self.inner.resolver.resolve_srid(schema, table, column)
    }

    pub fn geometry_subtype(
        &self,
        schema: Option<&str>,
        table: &str,
        column: &str,
    ) -> Option<GeometryType> {
        self.inner
            .resolver
            .resolve_geometry_subtype(schema, table, column)
    }

    pub fn geometry_columns(&self, schema: Option<&str>, table: &str) -> Vec<GeometryColumn> {
        self.inner.resolver.geometry_columns(schema, table)
    }

    pub fn native_type_name(&self, kind: GeometryType) -> &'static str {
        resolver::native_type_name(kind)
    }

    /// Estimated extent of `columns`, `None` when the caller must aggregate.
    pub fn estimated_bounds(
        &self,
        schema: Option<&str>,
        table: &str,
        columns: &[&str],
    ) -> Option<Envelope> {
        self.inner
            .resolver
            .resolve_envelope_from_catalog_estimate(schema, table, columns)
    }

    /// Called when a connection is handed out; resets cached metadata when
    /// the schema changed.
    pub fn initialize_connection(&self, schema: &str) {
        self.inner.resolver.set_schema_context(schema);
    }

    pub fn supported_hints(&self) -> Vec<Hint> {
        let mut hints = Vec::new();
        if self.inner.config.is_simplify_enabled() {
            hints.push(Hint::GeometrySimplification);
        }
        hints
    }
}
