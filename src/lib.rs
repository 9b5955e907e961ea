//! Build-time generator for the DHT2 translator's fop stubs.
//!
//! The crate expands a catalog of fop names into forward-call/callback pairs
//! and splices them into a C template at its `#pragma generate` line. The
//! header and the implementation front-end read the same catalog and
//! signature table, so declarations and definitions cannot drift apart.

pub mod catalog;
pub mod error;
pub mod policy;
mod schema_loader;
pub mod signatures;
pub mod splice;
pub mod template;

pub use catalog::{CatalogIndex, CatalogKey, Category, FopCatalog, OperationName};
pub use error::GenError;
pub use policy::{ErrorPolicy, FailureCondition};
pub use signatures::{ArgLists, FopSignature, SignatureTable, SubstitutionTable};
pub use splice::{BEGIN_FENCE, END_FENCE, Frontend, GENERATION_MARKER, Splicer};
pub use template::{RoutingLayout, Template, TemplateRole, expand};

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Catalog plus signature table: everything one generation run reads.
#[derive(Debug, Clone)]
pub struct Generator {
    catalog: CatalogIndex,
    signatures: SignatureTable,
}

impl Generator {
    pub fn new(catalog: CatalogIndex, signatures: SignatureTable) -> Self {
        Self {
            catalog,
            signatures,
        }
    }

    /// The catalog and signatures compiled into the crate.
    pub fn bundled() -> Result<Self> {
        Ok(Self::new(CatalogIndex::bundled()?, SignatureTable::bundled()?))
    }

    /// Load from descriptor paths, falling back to the bundled copy of each
    /// one that is not given.
    pub fn from_paths(catalog: Option<&Path>, signatures: Option<&Path>) -> Result<Self> {
        let catalog = match catalog {
            Some(path) => CatalogIndex::load(path)?,
            None => CatalogIndex::bundled()?,
        };
        let signatures = match signatures {
            Some(path) => SignatureTable::load(path)?,
            None => SignatureTable::bundled()?,
        };
        Ok(Self::new(catalog, signatures))
    }

    pub fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    pub fn signatures(&self) -> &SignatureTable {
        &self.signatures
    }

    pub fn splicer(&self, frontend: Frontend) -> Splicer<'_> {
        Splicer::new(&self.catalog, &self.signatures, frontend)
    }

    /// Splice generated code into in-memory template text.
    pub fn generate(&self, frontend: Frontend, input: &str) -> Result<String> {
        let output = self.splicer(frontend).splice(input).with_context(|| {
            format!(
                "generating {} fops from catalog {}",
                frontend.as_str(),
                self.catalog.key()
            )
        })?;
        Ok(output)
    }

    /// Read a template file and splice generated code into it.
    pub fn generate_file(&self, frontend: Frontend, path: &Path) -> Result<String> {
        let input = fs::read_to_string(path)
            .with_context(|| format!("reading template {}", path.display()))?;
        self.generate(frontend, &input)
            .with_context(|| format!("processing {}", path.display()))
    }
}
