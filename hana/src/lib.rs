//! # Hana - core types for the SAP HANA dialect
//!
//! This crate holds the engine-agnostic pieces the spatial dialect is built
//! on:
//!
//! - [`errors`] - `HanaError`, `ErrorKind` and the `HanaResult` alias
//! - [`value`] - scalar SQL values
//! - [`catalog`] - the `CatalogProbe` interface and tabular results
//! - [`sql`] - identifier and literal encoding
//! - [`hana_config`] - dialect configuration
//!
//! Geometry handling, WKB decoding and filter compilation live in the
//! `hana_spatial` crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use hana::sql::{BasicLiteralEncoder, LiteralEncoder};
//! use hana::value::Value;
//!
//! let mut sql = String::from("SELECT * FROM ROADS WHERE ");
//! BasicLiteralEncoder.encode_column_name(None, "NAME", &mut sql);
//! sql.push_str(" = ");
//! BasicLiteralEncoder.encode_value(&Value::from("Main St"), &mut sql);
//! assert_eq!(sql, "SELECT * FROM ROADS WHERE \"NAME\" = 'Main St'");
//! ```

pub mod catalog;
pub mod errors;
pub mod hana_config;
pub mod sql;
pub mod value;

pub use catalog::{CatalogProbe, ColumnMetadata, ColumnRef, ResultSet, Row, TableMetadata};
pub use errors::{ErrorKind, HanaError, HanaResult};
pub use hana_config::HanaConfig;
pub use sql::{BasicLiteralEncoder, LiteralEncoder};
pub use value::Value;
