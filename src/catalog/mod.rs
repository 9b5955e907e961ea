//! Fop catalog wiring.
//!
//! A catalog partitions operation names into categories that decide which
//! templates and routing layout each operation is generated with. Catalogs
//! are versioned JSON descriptors (see `catalogs/`); the default one is
//! compiled into the binary and alternates can be loaded from disk. Callers
//! use `CatalogIndex` for validated, ordered access.

pub mod identity;
pub mod index;
pub mod model;

pub use identity::{CatalogKey, Category, OperationName};
pub use index::CatalogIndex;
pub use model::{CATALOG_SCHEMA_VERSION, CatalogMetadata, FopCatalog};

pub use model::{bundled_catalog, load_catalog_from_path};
