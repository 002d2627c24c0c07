//! Geometry column metadata resolution.
//!
//! Classifies native type names and asks the `ST_GEOMETRY_COLUMNS` catalog
//! view for the subtype and SRID of a column. Every catalog failure degrades
//! to a documented default and is logged; nothing here aborts the query that
//! needed the metadata.

use hana::catalog::{CatalogProbe, ColumnRef};
use hana::hana_config::HanaConfig;
use hana::sql::{BasicLiteralEncoder, LiteralEncoder};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::envelope::Envelope;
use crate::geometry::GeometryType;
use crate::wkt::parse_wkt;
use crate::{SpatialError, SpatialResult};

/// SRID assumed when the catalog cannot tell.
pub const DEFAULT_SRID: i32 = 4326;

/// SRIDs at or above this value carry a rounding flag in their high digits.
pub const SRID_OFFSET: i64 = 1_000_000_000;

/// The catalog view listing spatial columns.
pub const GEOMETRY_COLUMNS_VIEW: &str = "ST_GEOMETRY_COLUMNS";

static NATIVE_TYPES: LazyLock<HashMap<&'static str, GeometryType>> = LazyLock::new(|| {
    HashMap::from([
        ("ST_GEOMETRY", GeometryType::Generic),
        ("ST_POINT", GeometryType::Point),
        ("POINT", GeometryType::Point),
        ("ST_LINESTRING", GeometryType::LineString),
        ("ST_POLYGON", GeometryType::Polygon),
        ("ST_MULTIPOINT", GeometryType::MultiPoint),
        ("ST_MULTILINESTRING", GeometryType::MultiLineString),
        ("ST_MULTIPOLYGON", GeometryType::MultiPolygon),
    ])
});

/// Maps a native type name to a geometry kind.
///
/// Unknown `ST_` names are treated as generic geometry; any other name is not
/// a geometry and yields `None`.
///
/// # Examples
///
/// ```rust
/// use hana_spatial::resolver::classify;
/// use hana_spatial::GeometryType;
///
/// assert_eq!(classify("st_point"), Some(GeometryType::Point));
/// assert_eq!(classify("ST_CIRCULARSTRING"), Some(GeometryType::Generic));
/// assert_eq!(classify("VARCHAR"), None);
/// ```
pub fn classify(native_type_name: &str) -> Option<GeometryType> {
    let upper = native_type_name.trim().to_ascii_uppercase();
    match NATIVE_TYPES.get(upper.as_str()) {
        Some(kind) => Some(*kind),
        None if upper.starts_with("ST_") => Some(GeometryType::Generic),
        None => None,
    }
}

/// The native type a geometry kind is stored as.
pub fn native_type_name(kind: GeometryType) -> &'static str {
    match kind {
        GeometryType::Point => "ST_Point",
        GeometryType::LineString => "ST_LineString",
        GeometryType::Polygon => "ST_Polygon",
        GeometryType::MultiPoint => "ST_MultiPoint",
        GeometryType::MultiLineString => "ST_MultiLineString",
        GeometryType::MultiPolygon => "ST_MultiPolygon",
        GeometryType::Generic | GeometryType::GeometryCollection => "ST_Geometry",
    }
}

/// Strips the rounding flag from a catalog SRID.
pub fn fold_srid(raw: i64) -> i32 {
    let folded = if raw >= SRID_OFFSET { raw % SRID_OFFSET } else { raw };
    folded as i32
}

/// Identifies a column across schemas.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl ColumnKey {
    pub fn new(schema: &str, table: &str, column: &str) -> Self {
        ColumnKey {
            schema: schema.to_string(),
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

/// Resolved metadata of a geometry column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryColumn {
    pub name: String,
    pub geometry_type: GeometryType,
    pub srid: i32,
    pub native_type_name: String,
}

/// Descriptors keyed by column, as installed by one cache update.
pub type DescriptorCache = HashMap<ColumnKey, GeometryColumn>;

/// Resolves and caches geometry column metadata through a [`CatalogProbe`].
///
/// Clones share the cache. Lookups take a snapshot of the cache; updates
/// install a new map, so readers never see a partially written one.
#[derive(Clone)]
pub struct GeometryResolver {
    inner: Arc<GeometryResolverInner>,
}

struct GeometryResolverInner {
    probe: Arc<dyn CatalogProbe>,
    config: HanaConfig,
    cache: RwLock<Arc<DescriptorCache>>,
    schema_context: RwLock<Option<String>>,
}

impl GeometryResolver {
    pub fn new(probe: Arc<dyn CatalogProbe>, config: HanaConfig) -> Self {
        GeometryResolver {
            inner: Arc::new(GeometryResolverInner {
                probe,
                config,
                cache: RwLock::new(Arc::new(HashMap::new())),
                schema_context: RwLock::new(None),
            }),
        }
    }

    pub fn probe(&self) -> &Arc<dyn CatalogProbe> {
        &self.inner.probe
    }

    pub fn config(&self) -> &HanaConfig {
        &self.inner.config
    }

    /// Looks up the declared subtype of a column.
    ///
    /// Returns `None` when the catalog has no row for the column or the probe
    /// fails; the caller then treats the column as generic geometry.
    pub fn resolve_geometry_subtype(
        &self,
        schema: Option<&str>,
        table: &str,
        column: &str,
    ) -> Option<GeometryType> {
        let schema = self.schema_or_default(schema);
        match self.query_subtype(&schema, table, column) {
            Ok(kind) => kind,
            Err(err) => {
                log::warn!(
                    "Could not resolve geometry type of {}.{}.{}: {}",
                    schema,
                    table,
                    column,
                    err
                );
                None
            }
        }
    }

    fn query_subtype(
        &self,
        schema: &str,
        table: &str,
        column: &str,
    ) -> SpatialResult<Option<GeometryType>> {
        let sql = catalog_sql("DATA_TYPE_NAME", schema, table, column);
        log::debug!("Geometry type check; {}", sql);

        let rows = self.inner.probe.query(&sql).map_err(probe_failure)?;
        let Some(row) = rows.first() else {
            log::debug!("No catalog row for {}.{}.{}", schema, table, column);
            return Ok(None);
        };
        let type_name = row.string(&ColumnRef::Index(0)).map_err(probe_failure)?;
        Ok(type_name.and_then(classify))
    }

    /// Looks up the SRID of a column, `4326` when the catalog cannot tell.
    pub fn resolve_srid(&self, schema: Option<&str>, table: &str, column: &str) -> i32 {
        let schema = self.schema_or_default(schema);
        match self.query_srid(&schema, table, column) {
            Ok(srid) => srid,
            Err(err) => {
                log::warn!(
                    "Failed to retrieve the SRID of {}.{}.{} from {}, using {}: {}",
                    schema,
                    table,
                    column,
                    GEOMETRY_COLUMNS_VIEW,
                    DEFAULT_SRID,
                    err
                );
                DEFAULT_SRID
            }
        }
    }

    fn query_srid(&self, schema: &str, table: &str, column: &str) -> SpatialResult<i32> {
        let sql = catalog_sql("SRS_ID", schema, table, column);
        log::debug!("SRID check; {}", sql);

        let rows = self.inner.probe.query(&sql).map_err(probe_failure)?;
        let raw = rows
            .first()
            .map(|row| row.i64(&ColumnRef::Index(0)))
            .transpose()
            .map_err(probe_failure)?
            .flatten()
            .ok_or_else(|| {
                SpatialError::CatalogProbeFailure(format!(
                    "no SRID recorded for {}.{}.{}",
                    schema, table, column
                ))
            })?;
        Ok(fold_srid(raw))
    }

    /// Describes a column given its reported native type name.
    ///
    /// Returns `None` for non-spatial types. Generic columns get their subtype
    /// from the catalog. Results are cached per (schema, table, column).
    pub fn describe_column(
        &self,
        schema: Option<&str>,
        table: &str,
        column: &str,
        native_type: &str,
    ) -> Option<GeometryColumn> {
        let declared = classify(native_type)?;
        let schema = self.schema_or_default(schema);
        let key = ColumnKey::new(&schema, table, column);
        if let Some(cached) = self.snapshot().get(&key) {
            return Some(cached.clone());
        }

        let descriptor = self.probe_column(&schema, table, column, native_type, declared);
        self.store(vec![(key, descriptor.clone())]);
        Some(descriptor)
    }

    fn probe_column(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        native_type: &str,
        declared: GeometryType,
    ) -> GeometryColumn {
        let geometry_type = match declared {
            GeometryType::Generic => self
                .resolve_geometry_subtype(Some(schema), table, column)
                .unwrap_or(GeometryType::Generic),
            kind => kind,
        };
        GeometryColumn {
            name: column.to_string(),
            geometry_type,
            srid: self.resolve_srid(Some(schema), table, column),
            native_type_name: native_type.to_string(),
        }
    }

    /// Lists the geometry columns of a table.
    ///
    /// A failing column listing is logged and yields no columns. Newly probed
    /// descriptors are installed together in one cache update.
    pub fn geometry_columns(&self, schema: Option<&str>, table: &str) -> Vec<GeometryColumn> {
        let schema = self.schema_or_default(schema);
        let columns = match self.inner.probe.list_columns(None, &schema, table, "%") {
            Ok(columns) => columns,
            Err(err) => {
                log::warn!(
                    "Could not list columns of {}.{}: {}",
                    schema,
                    table,
                    probe_failure(err)
                );
                return Vec::new();
            }
        };
        let cache = self.snapshot();
        let mut probed = Vec::new();
        let descriptors = columns
            .iter()
            .filter_map(|c| {
                let declared = classify(&c.type_name)?;
                let key = ColumnKey::new(&schema, table, &c.name);
                if let Some(cached) = cache.get(&key) {
                    return Some(cached.clone());
                }
                let descriptor = self.probe_column(&schema, table, &c.name, &c.type_name, declared);
                probed.push((key, descriptor.clone()));
                Some(descriptor)
            })
            .collect();
        self.store(probed);
        descriptors
    }

    /// Returns a cached descriptor without probing.
    pub fn cached(&self, schema: Option<&str>, table: &str, column: &str) -> Option<GeometryColumn> {
        let key = ColumnKey::new(&self.schema_or_default(schema), table, column);
        self.snapshot().get(&key).cloned()
    }

    pub fn cache_len(&self) -> usize {
        self.snapshot().len()
    }

    /// Switches the active schema. A schema that differs, ignoring case,
    /// from the previous one drops every cached descriptor.
    ///
    /// Returns `true` when the cache was reset.
    pub fn set_schema_context(&self, schema: &str) -> bool {
        let mut context = self.inner.schema_context.write();
        let changed = context
            .as_deref()
            .map_or(true, |current| !current.eq_ignore_ascii_case(schema));
        if changed {
            log::debug!("Schema context changed to {}, clearing geometry metadata", schema);
            *self.inner.cache.write() = Arc::new(HashMap::new());
            *context = Some(schema.to_string());
        }
        changed
    }

    pub fn schema_context(&self) -> Option<String> {
        self.inner.schema_context.read().clone()
    }

    /// Asks the engine for its precomputed extent of the given columns.
    ///
    /// Returns `None` when estimates are disabled, when any estimate query or
    /// its text fails, or when no column has an estimate; the caller then
    /// aggregates the envelopes itself.
    pub fn resolve_envelope_from_catalog_estimate(
        &self,
        schema: Option<&str>,
        table: &str,
        columns: &[&str],
    ) -> Option<Envelope> {
        if !self.inner.config.is_estimated_extents_enabled() {
            return None;
        }
        let schema = self.schema_or_default(schema);
        let mut extent = Envelope::null();
        for column in columns {
            match self.query_estimate(&schema, table, column) {
                Ok(Some(env)) => extent.expand_to_include_envelope(&env),
                Ok(None) => {}
                Err(err) => {
                    log::warn!(
                        "Estimated extent of {}.{}.{} unavailable, falling back to aggregation: {}",
                        schema,
                        table,
                        column,
                        err
                    );
                    return None;
                }
            }
        }
        if extent.is_null() {
            None
        } else {
            Some(extent)
        }
    }

    fn query_estimate(&self, schema: &str, table: &str, column: &str) -> SpatialResult<Option<Envelope>> {
        let encoder = BasicLiteralEncoder;
        let mut sql = String::from("SELECT ST_AsText(ST_force_2d(ST_Envelope(ST_Estimated_Extent(");
        encoder.encode_string(schema, &mut sql);
        sql.push_str(", ");
        encoder.encode_string(table, &mut sql);
        sql.push_str(", ");
        encoder.encode_string(column, &mut sql);
        sql.push_str("))))");
        log::debug!("Envelope estimate; {}", sql);

        let rows = self.inner.probe.query(&sql).map_err(probe_failure)?;
        let text = match rows.first() {
            Some(row) => row.string(&ColumnRef::Index(0)).map_err(probe_failure)?,
            None => None,
        };
        match text {
            Some(text) => {
                let env = parse_wkt(text)?.envelope_of();
                Ok((!env.is_null()).then_some(env))
            }
            None => Ok(None),
        }
    }

    fn schema_or_default(&self, schema: Option<&str>) -> String {
        match schema {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => self.inner.config.schema(),
        }
    }

    /// The cache as installed by the last update. Never changes after it is
    /// returned.
    pub fn snapshot(&self) -> Arc<DescriptorCache> {
        self.inner.cache.read().clone()
    }

    fn store(&self, entries: Vec<(ColumnKey, GeometryColumn)>) {
        if entries.is_empty() {
            return;
        }
        let mut cache = self.inner.cache.write();
        let mut next = DescriptorCache::clone(&cache);
        next.extend(entries);
        *cache = Arc::new(next);
    }
}

/// `SELECT <field> FROM ST_GEOMETRY_COLUMNS WHERE ...` for one column.
fn catalog_sql(field: &str, schema: &str, table: &str, column: &str) -> String {
    let encoder = BasicLiteralEncoder;
    let mut sql = format!("SELECT {} FROM {} WHERE SCHEMA_NAME=", field, GEOMETRY_COLUMNS_VIEW);
    encoder.encode_string(schema, &mut sql);
    sql.push_str(" AND TABLE_NAME=");
    encoder.encode_string(table, &mut sql);
    sql.push_str(" AND COLUMN_NAME=");
    encoder.encode_string(column, &mut sql);
    sql
}

fn probe_failure(err: hana::errors::HanaError) -> SpatialError {
    SpatialError::CatalogProbeFailure(err.to_string())
}
