//! Validated, ordered view of a fop catalog.
//!
//! The index is strict: an operation listed twice, in one category or across
//! two, is rejected, as is any name that cannot be pasted into a C
//! identifier. Operation sets are `BTreeSet`s so iteration order (and
//! therefore generated output) is stable from run to run.

use crate::catalog::{
    CATALOG_SCHEMA_VERSION, CatalogKey, CatalogMetadata, Category, FopCatalog, OperationName,
    bundled_catalog, load_catalog_from_path,
};
use crate::policy::ErrorPolicy;
use anyhow::{Context, Result, bail};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct CatalogIndex {
    catalog_key: CatalogKey,
    by_category: BTreeMap<Category, BTreeSet<OperationName>>,
    by_name: BTreeMap<OperationName, Category>,
    policy: ErrorPolicy,
}

impl CatalogIndex {
    /// Load a descriptor from disk and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let catalog =
            load_catalog_from_path(path).with_context(|| format!("loading {}", path.display()))?;
        Self::from_catalog(catalog).with_context(|| format!("indexing {}", path.display()))
    }

    /// Index the catalog compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_catalog(bundled_catalog()?).context("indexing bundled catalog")
    }

    pub fn from_catalog(catalog: FopCatalog) -> Result<Self> {
        validate_schema_version(&catalog.schema_version)?;
        validate_catalog_metadata(&catalog.catalog)?;
        let policy = ErrorPolicy::with_overrides(&catalog.error_codes)?;
        let (by_category, by_name) = build_index(&catalog)?;
        Ok(Self {
            catalog_key: catalog.catalog.key,
            by_category,
            by_name,
            policy,
        })
    }

    pub fn key(&self) -> &CatalogKey {
        &self.catalog_key
    }

    /// Operations of one category in name order; empty when the category is absent.
    pub fn operations(&self, category: Category) -> impl Iterator<Item = &OperationName> {
        self.by_category.get(&category).into_iter().flatten()
    }

    pub fn category_of(&self, name: &OperationName) -> Option<Category> {
        self.by_name.get(name).copied()
    }

    /// Every operation, in generation order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &OperationName)> {
        Category::ALL
            .into_iter()
            .flat_map(move |category| self.operations(category).map(move |op| (category, op)))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn error_policy(&self) -> &ErrorPolicy {
        &self.policy
    }
}

fn validate_schema_version(schema_version: &str) -> Result<()> {
    if schema_version != CATALOG_SCHEMA_VERSION {
        bail!(
            "schema_version '{}' not supported, expected {}",
            schema_version,
            CATALOG_SCHEMA_VERSION
        );
    }
    Ok(())
}

fn validate_catalog_metadata(meta: &CatalogMetadata) -> Result<()> {
    if meta.key.0.is_empty() {
        bail!("catalog.key must not be empty");
    }
    if !meta
        .key
        .0
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        bail!("catalog.key must match ^[A-Za-z0-9_.-]+$, got {}", meta.key.0);
    }
    if meta.title.trim().is_empty() {
        bail!("catalog.title must not be empty");
    }
    Ok(())
}

type Index = (
    BTreeMap<Category, BTreeSet<OperationName>>,
    BTreeMap<OperationName, Category>,
);

fn build_index(catalog: &FopCatalog) -> Result<Index> {
    let mut by_category: BTreeMap<Category, BTreeSet<OperationName>> = BTreeMap::new();
    let mut by_name: BTreeMap<OperationName, Category> = BTreeMap::new();

    for (category, names) in &catalog.categories {
        let set = by_category.entry(*category).or_default();
        for name in names {
            if !name.is_identifier() {
                bail!(
                    "operation '{}' in category {} is not a valid C identifier",
                    name,
                    category
                );
            }
            if let Some(existing) = by_name.get(name) {
                if existing == category {
                    bail!("operation '{}' listed twice in category {}", name, category);
                }
                bail!(
                    "operation '{}' listed in both {} and {}",
                    name,
                    existing,
                    category
                );
            }
            by_name.insert(name.clone(), *category);
            set.insert(name.clone());
        }
    }

    Ok((by_category, by_name))
}
