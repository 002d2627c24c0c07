use hana::catalog::{CatalogProbe, ColumnMetadata, ResultSet, Row, TableMetadata};
use hana::errors::{ErrorKind, HanaError, HanaResult};
use hana::hana_config::HanaConfig;
use hana_spatial::HanaDialect;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Runs a test between a setup and a teardown step.
///
/// Teardown runs even when the test fails; the first error is reported.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> HanaResult<()>,
    B: Fn() -> HanaResult<TestContext>,
    A: Fn(TestContext) -> HanaResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };
    let result = test(ctx.clone());
    let after_result = after(ctx);
    if let Err(e) = result {
        panic!("Test failed: {:?}", e);
    }
    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

#[derive(Clone)]
pub struct TestContext {
    catalog: InMemoryCatalog,
    dialect: HanaDialect,
}

impl TestContext {
    pub fn new(catalog: InMemoryCatalog, config: HanaConfig) -> Self {
        let dialect = HanaDialect::new(Arc::new(catalog.clone()), config);
        Self { catalog, dialect }
    }

    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.catalog
    }

    pub fn dialect(&self) -> HanaDialect {
        self.dialect.clone()
    }
}

/// A `GIS` schema with a `ROADS` table (generic geometry column `SHAPE`
/// holding line strings, SRID stored with the round flag) and a `CITIES`
/// table (point column `LOCATION` without a catalog entry).
pub fn create_test_context() -> HanaResult<TestContext> {
    create_test_context_with(HanaConfig::builder().schema("GIS").build())
}

pub fn create_test_context_with(config: HanaConfig) -> HanaResult<TestContext> {
    let catalog = InMemoryCatalog::new();
    catalog.add_table(
        "GIS",
        "ROADS",
        &[("ID", "BIGINT"), ("NAME", "NVARCHAR"), ("SHAPE", "ST_GEOMETRY")],
    );
    catalog.add_table(
        "GIS",
        "CITIES",
        &[("ID", "INTEGER"), ("LOCATION", "ST_POINT")],
    );
    catalog.add_table(
        "GIS",
        "ST_GEOMETRY_COLUMNS",
        &[("SCHEMA_NAME", "NVARCHAR"), ("SRS_ID", "INTEGER")],
    );
    catalog.register_geometry("GIS", "ROADS", "SHAPE", "ST_LINESTRING", 1_000_004_326);
    catalog.set_estimated_extent("GIS", "ROADS", "SHAPE", "POLYGON ((0 0, 10 0, 10 5, 0 5, 0 0))");
    Ok(TestContext::new(catalog, config))
}

pub fn cleanup(ctx: TestContext) -> HanaResult<()> {
    ctx.catalog.clear();
    Ok(())
}

type ColumnKey = (String, String, String);

/// A catalog held in memory.
///
/// Answers the metadata queries the dialect issues against
/// `ST_GEOMETRY_COLUMNS` and `ST_Estimated_Extent` by reading the quoted
/// schema, table and column names out of the SQL text. Every query is
/// recorded.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    inner: Arc<InMemoryCatalogInner>,
}

#[derive(Default)]
struct InMemoryCatalogInner {
    tables: RwLock<Vec<(String, String, Vec<(String, String)>)>>,
    geometry_columns: RwLock<HashMap<ColumnKey, (String, i64)>>,
    extents: RwLock<HashMap<ColumnKey, String>>,
    queries: RwLock<Vec<String>>,
    failing: RwLock<bool>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&self, schema: &str, table: &str, columns: &[(&str, &str)]) {
        let columns = columns
            .iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect();
        self.inner
            .tables
            .write()
            .push((schema.to_string(), table.to_string(), columns));
    }

    /// Records a row of `ST_GEOMETRY_COLUMNS`.
    pub fn register_geometry(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        data_type_name: &str,
        srs_id: i64,
    ) {
        self.inner
            .geometry_columns
            .write()
            .insert(key(schema, table, column), (data_type_name.to_string(), srs_id));
    }

    pub fn set_estimated_extent(&self, schema: &str, table: &str, column: &str, wkt: &str) {
        self.inner
            .extents
            .write()
            .insert(key(schema, table, column), wkt.to_string());
    }

    /// Makes every subsequent call fail with a catalog error.
    pub fn set_failing(&self, failing: bool) {
        *self.inner.failing.write() = failing;
    }

    pub fn queries(&self) -> Vec<String> {
        self.inner.queries.read().clone()
    }

    pub fn query_count(&self) -> usize {
        self.inner.queries.read().len()
    }

    pub fn clear(&self) {
        self.inner.tables.write().clear();
        self.inner.geometry_columns.write().clear();
        self.inner.extents.write().clear();
        self.inner.queries.write().clear();
    }

    fn check(&self) -> HanaResult<()> {
        if *self.inner.failing.read() {
            return Err(HanaError::new("catalog unavailable", ErrorKind::CatalogError));
        }
        Ok(())
    }
}

fn key(schema: &str, table: &str, column: &str) -> ColumnKey {
    (schema.to_string(), table.to_string(), column.to_string())
}

/// Single-quoted literals of a statement, unescaped.
fn quoted_literals(sql: &str) -> Vec<String> {
    let mut literals = Vec::new();
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\'' {
            continue;
        }
        let mut literal = String::new();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    literal.push('\'');
                    continue;
                }
                break;
            }
            literal.push(c);
        }
        literals.push(literal);
    }
    literals
}

impl CatalogProbe for InMemoryCatalog {
    fn list_table_types(&self) -> HanaResult<Vec<String>> {
        self.check()?;
        Ok(vec!["TABLE".to_string(), "VIEW".to_string()])
    }

    fn list_tables(
        &self,
        schema_pattern: Option<&str>,
        table_pattern: &str,
        _types: &[String],
    ) -> HanaResult<Vec<TableMetadata>> {
        self.check()?;
        Ok(self
            .inner
            .tables
            .read()
            .iter()
            .filter(|(s, t, _)| {
                schema_pattern.map_or(true, |p| p == "%" || p == s)
                    && (table_pattern == "%" || table_pattern == t)
            })
            .map(|(s, t, _)| TableMetadata {
                schema: Some(s.clone()),
                name: t.clone(),
                table_type: "TABLE".to_string(),
            })
            .collect())
    }

    fn list_columns(
        &self,
        _catalog: Option<&str>,
        schema: &str,
        table: &str,
        column_pattern: &str,
    ) -> HanaResult<Vec<ColumnMetadata>> {
        self.check()?;
        let tables = self.inner.tables.read();
        let Some((_, _, columns)) = tables.iter().find(|(s, t, _)| s == schema && t == table)
        else {
            return Ok(Vec::new());
        };
        Ok(columns
            .iter()
            .filter(|(n, _)| column_pattern == "%" || column_pattern == n)
            .map(|(n, t)| ColumnMetadata::new(Some(schema), table, n, t))
            .collect())
    }

    fn query(&self, sql: &str) -> HanaResult<ResultSet> {
        self.inner.queries.write().push(sql.to_string());
        self.check()?;

        let literals = quoted_literals(sql);
        let [schema, table, column] = literals.as_slice() else {
            return Err(HanaError::new(
                &format!("unexpected statement: {}", sql),
                ErrorKind::CatalogError,
            ));
        };
        let key = key(schema, table, column);

        if sql.contains("ST_Estimated_Extent") {
            let extents = self.inner.extents.read();
            return Ok(match extents.get(&key) {
                Some(wkt) => ResultSet::new(vec![Row::new().with("EXTENT", wkt.as_str())]),
                None => ResultSet::empty(),
            });
        }

        let geometry_columns = self.inner.geometry_columns.read();
        let Some((type_name, srs_id)) = geometry_columns.get(&key) else {
            return Ok(ResultSet::empty());
        };
        if sql.starts_with("SELECT SRS_ID") {
            Ok(ResultSet::new(vec![Row::new().with("SRS_ID", *srs_id)]))
        } else if sql.starts_with("SELECT DATA_TYPE_NAME") {
            Ok(ResultSet::new(vec![
                Row::new().with("DATA_TYPE_NAME", type_name.as_str())
            ]))
        } else {
            Err(HanaError::new(
                &format!("unexpected statement: {}", sql),
                ErrorKind::CatalogError,
            ))
        }
    }
}
