//! Catalog probing and tabular results.
//!
//! The dialect never owns a connection. Everything it needs from the
//! database (table types, table and column listings, ad-hoc read-only
//! queries) goes through a [`CatalogProbe`] supplied by the caller.

use indexmap::IndexMap;
use std::fmt::{self, Display};

use crate::errors::{ErrorKind, HanaError, HanaResult};
use crate::value::Value;

/// Read-only access to database metadata.
///
/// Implementations wrap whatever connection the surrounding data-access layer
/// uses. Every call is synchronous and may block on I/O.
pub trait CatalogProbe: Send + Sync {
    /// Lists the table types known to the database (`TABLE`, `VIEW`, `CALC VIEW`, ...).
    fn list_table_types(&self) -> HanaResult<Vec<String>>;

    /// Lists tables matching the schema and name patterns restricted to `types`.
    fn list_tables(
        &self,
        schema_pattern: Option<&str>,
        table_pattern: &str,
        types: &[String],
    ) -> HanaResult<Vec<TableMetadata>>;

    /// Lists the columns of a table matching `column_pattern`.
    fn list_columns(
        &self,
        catalog: Option<&str>,
        schema: &str,
        table: &str,
        column_pattern: &str,
    ) -> HanaResult<Vec<ColumnMetadata>>;

    /// Executes a read-only SQL statement.
    fn query(&self, sql: &str) -> HanaResult<ResultSet>;
}

/// One row of a table listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    pub schema: Option<String>,
    pub name: String,
    pub table_type: String,
}

/// One row of a column listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub schema: Option<String>,
    pub table: String,
    pub name: String,
    /// Native type name as reported by the driver, e.g. `ST_GEOMETRY`.
    pub type_name: String,
    pub sql_type: i32,
    pub nullable: bool,
}

impl ColumnMetadata {
    pub fn new(
        schema: Option<&str>,
        table: &str,
        name: &str,
        type_name: &str,
    ) -> Self {
        ColumnMetadata {
            schema: schema.map(str::to_string),
            table: table.to_string(),
            name: name.to_string(),
            type_name: type_name.to_string(),
            sql_type: 0,
            nullable: true,
        }
    }
}

/// Addresses a cell within a [`Row`], by name or by 0-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Name(String),
    Index(usize),
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> Self {
        ColumnRef::Name(name)
    }
}

impl From<usize> for ColumnRef {
    fn from(index: usize) -> Self {
        ColumnRef::Index(index)
    }
}

impl Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Name(name) => write!(f, "{}", name),
            ColumnRef::Index(index) => write!(f, "#{}", index),
        }
    }
}

/// An ordered row of named cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: IndexMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Row {
            cells: IndexMap::new(),
        }
    }

    /// Builder-style insert, keeps column order.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.cells.insert(column.to_string(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Returns the raw cell. Names match exactly first, then case-insensitively.
    pub fn get(&self, column: &ColumnRef) -> HanaResult<&Value> {
        let found = match column {
            ColumnRef::Index(index) => self.cells.get_index(*index).map(|(_, v)| v),
            ColumnRef::Name(name) => self.cells.get(name).or_else(|| {
                self.cells
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            }),
        };
        found.ok_or_else(|| {
            log::error!("Column {} not present in row {:?}", column, self.cells.keys());
            HanaError::new(
                &format!("Column {} not found in result row", column),
                ErrorKind::CatalogError,
            )
        })
    }

    /// Reads a binary cell; `None` for SQL NULL.
    pub fn bytes(&self, column: &ColumnRef) -> HanaResult<Option<&[u8]>> {
        match self.get(column)? {
            Value::Null => Ok(None),
            Value::Bytes(bytes) => Ok(Some(bytes)),
            other => Err(type_mismatch(column, "bytes", other)),
        }
    }

    /// Reads a text cell; `None` for SQL NULL.
    pub fn string(&self, column: &ColumnRef) -> HanaResult<Option<&str>> {
        match self.get(column)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(type_mismatch(column, "string", other)),
        }
    }

    /// Reads an integer cell; `None` for SQL NULL.
    pub fn i64(&self, column: &ColumnRef) -> HanaResult<Option<i64>> {
        match self.get(column)? {
            Value::Null => Ok(None),
            other => other
                .as_i64()
                .map(Some)
                .ok_or_else(|| type_mismatch(column, "integer", other)),
        }
    }
}

fn type_mismatch(column: &ColumnRef, expected: &str, actual: &Value) -> HanaError {
    HanaError::new(
        &format!(
            "Column {} holds a {} value, expected {}",
            column,
            actual.type_name(),
            expected
        ),
        ErrorKind::InvalidDataType,
    )
}

/// Rows returned by [`CatalogProbe::query`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(rows: Vec<Row>) -> Self {
        ResultSet { rows }
    }

    pub fn empty() -> Self {
        ResultSet { rows: Vec::new() }
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
