use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a file operation, e.g. `stat` or `readv`.
///
/// The name is embedded verbatim into generated C identifiers
/// (`dht2_<name>_cbk`, `wind_subvol->fops-><name>`), so catalogs only accept
/// names that pass [`OperationName::is_identifier`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationName(pub String);

impl OperationName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the name matches `^[a-z_][a-z0-9_]*$`.
    pub fn is_identifier(&self) -> bool {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) if first.is_ascii_lowercase() || first == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Revision key of a catalog descriptor, e.g. `dht2_fops_v3`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogKey(pub String);

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an operation addresses its target and where its forward call routes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Addressed through a `loc_t` (path/GFID handle).
    Inode,
    /// Addressed through an open `fd_t`, routed to the metadata subvolumes.
    FdMds,
    /// Addressed through an open `fd_t`, routed to the data subvolumes.
    FdDs,
    /// Declared in the header only; no generated definition.
    Unsupported,
}

impl Category {
    /// Generation order. Output is only reproducible because this is fixed.
    pub const ALL: [Category; 4] = [
        Category::Inode,
        Category::FdMds,
        Category::FdDs,
        Category::Unsupported,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Inode => "inode",
            Category::FdMds => "fd_mds",
            Category::FdDs => "fd_ds",
            Category::Unsupported => "unsupported",
        }
    }

    /// Whether generated code carries runtime behavior for this category.
    pub fn is_behavioral(&self) -> bool {
        !matches!(self, Category::Unsupported)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
