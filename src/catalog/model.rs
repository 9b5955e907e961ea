use crate::catalog::{CatalogKey, Category, OperationName};
use crate::policy::FailureCondition;
use crate::schema_loader::{CompiledSchema, extract_schema_version};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Format marker every catalog descriptor must carry.
pub const CATALOG_SCHEMA_VERSION: &str = "dht2_fop_catalog_v1";

const BUNDLED_CATALOG: &str = include_str!("../../catalogs/dht2_fops.json");

/// A catalog descriptor as written on disk.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FopCatalog {
    pub schema_version: String,
    pub catalog: CatalogMetadata,
    #[serde(default)]
    pub categories: BTreeMap<Category, Vec<OperationName>>,
    /// Per-catalog overrides of the generated error codes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub error_codes: BTreeMap<FailureCondition, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogMetadata {
    pub key: CatalogKey,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FopCatalog {
    /// An empty catalog with the current format marker.
    pub fn new(key: &str, title: &str) -> Self {
        Self {
            schema_version: CATALOG_SCHEMA_VERSION.to_string(),
            catalog: CatalogMetadata {
                key: CatalogKey(key.to_string()),
                title: title.to_string(),
                notes: None,
            },
            categories: BTreeMap::new(),
            error_codes: BTreeMap::new(),
        }
    }

    /// Append operations to a category.
    pub fn with_operations<I, S>(mut self, category: Category, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories
            .entry(category)
            .or_default()
            .extend(names.into_iter().map(|name| OperationName(name.into())));
        self
    }
}

/// Parse and schema-check a catalog descriptor read from disk.
pub fn load_catalog_from_path(path: &Path) -> Result<FopCatalog> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading fop catalog {}", path.display()))?;
    parse_catalog(&data, &path.display().to_string())
}

/// The catalog compiled into the binary (`catalogs/dht2_fops.json`).
pub fn bundled_catalog() -> Result<FopCatalog> {
    parse_catalog(BUNDLED_CATALOG, "bundled catalog")
}

pub(crate) fn parse_catalog(data: &str, origin: &str) -> Result<FopCatalog> {
    let value: Value =
        serde_json::from_str(data).with_context(|| format!("parsing fop catalog {origin}"))?;

    match extract_schema_version(&value) {
        Some(CATALOG_SCHEMA_VERSION) => {}
        Some(other) => bail!(
            "unsupported fop catalog schema_version '{other}' in {origin}, expected {CATALOG_SCHEMA_VERSION}"
        ),
        None => bail!("fop catalog {origin} is missing a valid schema_version"),
    }

    CompiledSchema::catalog()?.validate(&value, origin)?;

    serde_json::from_value(value).with_context(|| format!("decoding fop catalog {origin}"))
}
