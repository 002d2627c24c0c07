//! SQL literal encoding.
//!
//! A [`LiteralEncoder`] knows how a dialect spells identifiers and scalar
//! literals. Spatial SQL is composed around it by the spatial crate.

use crate::value::Value;

/// Encodes identifiers and scalar literals into a SQL buffer.
pub trait LiteralEncoder: Send + Sync {
    /// Appends a quoted, escaped identifier.
    fn encode_identifier(&self, name: &str, sql: &mut String) {
        sql.push('"');
        sql.push_str(&name.replace('"', "\"\""));
        sql.push('"');
    }

    /// Appends a column reference, qualified by `prefix` when given.
    fn encode_column_name(&self, prefix: Option<&str>, name: &str, sql: &mut String) {
        if let Some(prefix) = prefix {
            self.encode_identifier(prefix, sql);
            sql.push('.');
        }
        self.encode_identifier(name, sql);
    }

    /// Appends a table reference, qualified by `schema` when given.
    fn encode_table_name(&self, schema: Option<&str>, table: &str, sql: &mut String) {
        self.encode_column_name(schema, table, sql)
    }

    /// Escapes the body of a single-quoted string literal.
    fn escape_string(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    /// Appends a single-quoted string literal.
    fn encode_string(&self, value: &str, sql: &mut String) {
        sql.push('\'');
        sql.push_str(&self.escape_string(value));
        sql.push('\'');
    }

    /// Appends the literal form of a scalar value.
    fn encode_value(&self, value: &Value, sql: &mut String);
}

/// The ANSI-flavoured encoder every dialect starts from.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicLiteralEncoder;

impl LiteralEncoder for BasicLiteralEncoder {
    fn encode_value(&self, value: &Value, sql: &mut String) {
        match value {
            Value::Null => sql.push_str("NULL"),
            Value::Bool(true) => sql.push_str("TRUE"),
            Value::Bool(false) => sql.push_str("FALSE"),
            Value::I32(v) => sql.push_str(&v.to_string()),
            Value::I64(v) => sql.push_str(&v.to_string()),
            Value::F64(v) if v.is_finite() => sql.push_str(&format!("{:?}", v)),
            Value::F64(v) => {
                log::warn!("Non finite number {} encoded as NULL", v);
                sql.push_str("NULL")
            }
            Value::String(s) => self.encode_string(s, sql),
            Value::Bytes(bytes) => {
                sql.push_str("X'");
                sql.push_str(&hex::encode_upper(bytes));
                sql.push('\'');
            }
            Value::Date(d) => self.encode_string(&d.format("%Y-%m-%d").to_string(), sql),
            Value::Time(t) => self.encode_string(&t.format("%H:%M:%S%.f").to_string(), sql),
            Value::Timestamp(ts) => {
                self.encode_string(&ts.format("%Y-%m-%d %H:%M:%S%.f").to_string(), sql)
            }
            Value::Uuid(u) => self.encode_string(&u.hyphenated().to_string(), sql),
        }
    }
}
