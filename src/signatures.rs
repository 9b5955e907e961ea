//! Fop argument lists used to fill template placeholders.
//!
//! [`SubstitutionTable`] is the contract the expander consumes. The bundled
//! implementation, [`SignatureTable`], reads the typed fop and callback
//! parameters of every operation from `catalogs/fop_signatures.json` and
//! derives the three argument-list spellings from them.

use crate::catalog::OperationName;
use crate::error::GenError;
use crate::schema_loader::{CompiledSchema, extract_schema_version};
use crate::template::TemplateRole;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

pub const SIGNATURES_SCHEMA_VERSION: &str = "dht2_fop_signatures_v1";

const BUNDLED_SIGNATURES: &str = include_str!("../catalogs/fop_signatures.json");

/// Argument-list text for one template call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgLists {
    /// Typed parameter list, e.g. `loc_t *loc, dict_t *xdata`.
    pub long: String,
    /// Bare value list, e.g. `loc, xdata`.
    pub short: String,
    /// Callback arguments on the failure path, e.g. `NULL, NULL`.
    pub error: String,
}

impl ArgLists {
    pub fn new(long: &str, short: &str, error: &str) -> Self {
        Self {
            long: long.to_string(),
            short: short.to_string(),
            error: error.to_string(),
        }
    }
}

/// Maps an operation to the argument lists of a template role.
pub trait SubstitutionTable {
    fn resolve(&self, operation: &OperationName, role: TemplateRole) -> Result<ArgLists, GenError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FopArg {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl FopArg {
    /// `<type> <name>`, keeping pointer stars attached to the name.
    fn declaration(&self) -> String {
        let ty = self.ty.trim_end();
        if ty.ends_with('*') {
            format!("{ty}{}", self.name)
        } else {
            format!("{ty} {}", self.name)
        }
    }

    /// Value handed back on the unwind path when the fop fails.
    fn error_value(&self) -> &'static str {
        if self.ty.contains('*') { "NULL" } else { "-1" }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FopSignature {
    pub fop_args: Vec<FopArg>,
    pub cbk_args: Vec<FopArg>,
}

impl FopSignature {
    pub fn arg_lists(&self, role: TemplateRole) -> ArgLists {
        let args = match role {
            TemplateRole::ForwardCall => &self.fop_args,
            TemplateRole::Callback => &self.cbk_args,
        };
        ArgLists {
            long: join(args.iter().map(FopArg::declaration)),
            short: join(args.iter().map(|arg| arg.name.clone())),
            error: join(self.cbk_args.iter().map(|arg| arg.error_value().to_string())),
        }
    }
}

fn join(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join(", ")
}

/// Top-level shape, including `schema_version`, is enforced by the schema.
#[derive(Debug, Deserialize)]
struct SignatureFile {
    fops: BTreeMap<OperationName, FopSignature>,
}

/// Signature descriptor keyed by operation name.
#[derive(Clone, Debug)]
pub struct SignatureTable {
    fops: BTreeMap<OperationName, FopSignature>,
}

impl SignatureTable {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading fop signatures {}", path.display()))?;
        Self::parse(&data, &path.display().to_string())
    }

    /// Signatures compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED_SIGNATURES, "bundled signatures")
    }

    fn parse(data: &str, origin: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(data)
            .with_context(|| format!("parsing fop signatures {origin}"))?;

        match extract_schema_version(&value) {
            Some(SIGNATURES_SCHEMA_VERSION) => {}
            Some(other) => bail!(
                "unsupported fop signatures schema_version '{other}' in {origin}, expected {SIGNATURES_SCHEMA_VERSION}"
            ),
            None => bail!("fop signatures {origin} is missing a valid schema_version"),
        }

        CompiledSchema::signatures()?.validate(&value, origin)?;

        let file: SignatureFile = serde_json::from_value(value)
            .with_context(|| format!("decoding fop signatures {origin}"))?;
        for (name, signature) in &file.fops {
            validate_signature(name, signature)
                .with_context(|| format!("fop signatures {origin}"))?;
        }
        Ok(Self { fops: file.fops })
    }

    pub fn signature(&self, operation: &OperationName) -> Option<&FopSignature> {
        self.fops.get(operation)
    }

    pub fn contains(&self, operation: &OperationName) -> bool {
        self.fops.contains_key(operation)
    }
}

impl SubstitutionTable for SignatureTable {
    fn resolve(&self, operation: &OperationName, role: TemplateRole) -> Result<ArgLists, GenError> {
        self.signature(operation)
            .map(|signature| signature.arg_lists(role))
            .ok_or_else(|| GenError::UnknownOperation {
                operation: operation.to_string(),
            })
    }
}

/// Argument names must be unique per list; the schema cannot express that.
fn validate_signature(name: &OperationName, signature: &FopSignature) -> Result<()> {
    for (list, args) in [("fop_args", &signature.fop_args), ("cbk_args", &signature.cbk_args)] {
        let mut seen = BTreeSet::new();
        for arg in args {
            if !seen.insert(arg.name.as_str()) {
                bail!("operation '{name}' repeats argument '{}' in {list}", arg.name);
            }
        }
    }
    Ok(())
}
