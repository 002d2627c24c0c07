//! Dialect configuration.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{ErrorKind, HanaError, HanaResult};

/// Database type identifier accepted in the `dbtype` parameter.
pub const DBTYPE: &str = "hana";
/// Schema assumed when none is configured.
pub const DEFAULT_SCHEMA: &str = "public";

pub const PARAM_DBTYPE: &str = "dbtype";
pub const PARAM_SCHEMA: &str = "schema";
pub const PARAM_LOOSE_BBOX: &str = "Loose bbox";
pub const PARAM_ESTIMATED_EXTENTS: &str = "Estimated extends";
pub const PARAM_SIMPLIFY: &str = "Support on the fly geometry simplification";

/// Settings that shape the SQL generated by the dialect.
///
/// Clones share state, so a flag flipped on one handle is seen by every
/// compiler created afterwards.
///
/// # Examples
///
/// ```rust
/// use hana::hana_config::HanaConfig;
///
/// let config = HanaConfig::builder()
///     .schema("GIS")
///     .loose_bbox(false)
///     .build();
/// assert_eq!(config.schema(), "GIS");
/// assert!(!config.is_loose_bbox_enabled());
/// ```
#[derive(Clone, Debug)]
pub struct HanaConfig {
    inner: Arc<HanaConfigInner>,
}

impl Default for HanaConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl HanaConfig {
    /// Creates a configuration with the documented defaults.
    pub fn new() -> Self {
        HanaConfig {
            inner: Arc::new(HanaConfigInner::new()),
        }
    }

    pub fn builder() -> HanaConfigBuilder {
        HanaConfigBuilder::new()
    }

    /// Reads a data-store parameter map.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a foreign `dbtype` and
    /// `InvalidDataType` for a boolean parameter that does not parse.
    pub fn from_params(params: &HashMap<String, String>) -> HanaResult<HanaConfig> {
        if let Some(dbtype) = params.get(PARAM_DBTYPE) {
            if !dbtype.eq_ignore_ascii_case(DBTYPE) {
                log::error!("Unsupported dbtype {}", dbtype);
                return Err(HanaError::new(
                    &format!("Unsupported dbtype {}, expected {}", dbtype, DBTYPE),
                    ErrorKind::ValidationError,
                ));
            }
        }

        let mut builder = HanaConfig::builder();
        if let Some(schema) = params.get(PARAM_SCHEMA) {
            builder = builder.schema(schema);
        }
        if let Some(flag) = parse_flag(params, PARAM_LOOSE_BBOX)? {
            builder = builder.loose_bbox(flag);
        }
        if let Some(flag) = parse_flag(params, PARAM_ESTIMATED_EXTENTS)? {
            builder = builder.estimated_extents(flag);
        }
        if let Some(flag) = parse_flag(params, PARAM_SIMPLIFY)? {
            builder = builder.simplify(flag);
        }
        Ok(builder.build())
    }

    /// Database schema the dialect resolves metadata against.
    pub fn schema(&self) -> String {
        self.inner.schema.read().clone()
    }

    pub fn set_schema(&self, schema: &str) -> HanaResult<()> {
        if schema.trim().is_empty() {
            log::error!("Schema name cannot be empty");
            return Err(HanaError::new(
                "Schema name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        *self.inner.schema.write() = schema.to_string();
        Ok(())
    }

    /// Whether bbox filters are evaluated with the `&&` primary filter only.
    pub fn is_loose_bbox_enabled(&self) -> bool {
        self.inner.loose_bbox.load(Ordering::Relaxed)
    }

    pub fn set_loose_bbox_enabled(&self, enabled: bool) {
        self.inner.loose_bbox.store(enabled, Ordering::Relaxed);
    }

    /// Whether envelope estimates may be requested from the catalog.
    pub fn is_estimated_extents_enabled(&self) -> bool {
        self.inner.estimated_extents.load(Ordering::Relaxed)
    }

    pub fn set_estimated_extents_enabled(&self, enabled: bool) {
        self.inner.estimated_extents.store(enabled, Ordering::Relaxed);
    }

    pub fn is_simplify_enabled(&self) -> bool {
        self.inner.simplify.load(Ordering::Relaxed)
    }

    pub fn set_simplify_enabled(&self, enabled: bool) {
        self.inner.simplify.store(enabled, Ordering::Relaxed);
    }
}

#[derive(Debug)]
struct HanaConfigInner {
    schema: RwLock<String>,
    loose_bbox: AtomicBool,
    estimated_extents: AtomicBool,
    simplify: AtomicBool,
}

impl HanaConfigInner {
    fn new() -> Self {
        HanaConfigInner {
            schema: RwLock::new(DEFAULT_SCHEMA.to_string()),
            loose_bbox: AtomicBool::new(true),
            estimated_extents: AtomicBool::new(true),
            simplify: AtomicBool::new(false),
        }
    }
}

/// Builder for [`HanaConfig`].
pub struct HanaConfigBuilder {
    schema: Option<String>,
    loose_bbox: bool,
    estimated_extents: bool,
    simplify: bool,
}

impl HanaConfigBuilder {
    fn new() -> Self {
        HanaConfigBuilder {
            schema: None,
            loose_bbox: true,
            estimated_extents: true,
            simplify: false,
        }
    }

    pub fn schema(mut self, schema: &str) -> Self {
        if !schema.trim().is_empty() {
            self.schema = Some(schema.to_string());
        }
        self
    }

    pub fn loose_bbox(mut self, enabled: bool) -> Self {
        self.loose_bbox = enabled;
        self
    }

    pub fn estimated_extents(mut self, enabled: bool) -> Self {
        self.estimated_extents = enabled;
        self
    }

    pub fn simplify(mut self, enabled: bool) -> Self {
        self.simplify = enabled;
        self
    }

    pub fn build(self) -> HanaConfig {
        let config = HanaConfig::new();
        if let Some(schema) = self.schema {
            *config.inner.schema.write() = schema;
        }
        config.set_loose_bbox_enabled(self.loose_bbox);
        config.set_estimated_extents_enabled(self.estimated_extents);
        config.set_simplify_enabled(self.simplify);
        config
    }
}

fn parse_flag(params: &HashMap<String, String>, key: &str) -> HanaResult<Option<bool>> {
    let Some(raw) = params.get(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => {
            log::error!("Parameter {} has a non boolean value {}", key, raw);
            Err(HanaError::new(
                &format!("Parameter {} expects a boolean, got {}", key, raw),
                ErrorKind::InvalidDataType,
            ))
        }
    }
}
