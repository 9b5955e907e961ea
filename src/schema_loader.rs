//! JSON Schema validation for catalog and signature descriptors.
//!
//! Descriptors are checked against their bundled schema before they are
//! deserialized, so a typo in a category name or an unexpected field fails
//! with a schema error instead of being silently ignored by serde.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;

const CATALOG_SCHEMA: &str = include_str!("../schema/fop_catalog.schema.json");
const SIGNATURES_SCHEMA: &str = include_str!("../schema/fop_signatures.schema.json");

/// Compiled schema plus the label used in error messages.
pub(crate) struct CompiledSchema {
    label: &'static str,
    compiled: JSONSchema,
}

impl CompiledSchema {
    pub(crate) fn catalog() -> Result<Self> {
        compile_embedded("fop catalog schema", CATALOG_SCHEMA)
    }

    pub(crate) fn signatures() -> Result<Self> {
        compile_embedded("fop signatures schema", SIGNATURES_SCHEMA)
    }

    /// Validate `instance`, joining every violation into one error.
    pub(crate) fn validate(&self, instance: &Value, origin: &str) -> Result<()> {
        if let Err(errors) = self.compiled.validate(instance) {
            let details = errors
                .map(|err| err.to_string())
                .collect::<Vec<_>>()
                .join("\n");
            bail!("{origin} failed {} validation:\n{details}", self.label);
        }
        Ok(())
    }
}

fn compile_embedded(label: &'static str, raw: &str) -> Result<CompiledSchema> {
    let schema: Value =
        serde_json::from_str(raw).with_context(|| format!("parsing bundled {label}"))?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|err| anyhow!("compiling bundled {label}: {err}"))?;
    Ok(CompiledSchema { label, compiled })
}

/// Pull the `schema_version` marker out of a descriptor, if it is a plain
/// `[A-Za-z0-9_.-]+` string.
pub(crate) fn extract_schema_version(value: &Value) -> Option<&str> {
    let version = value.get("schema_version").and_then(Value::as_str)?;
    if !version.is_empty()
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Some(version)
    } else {
        None
    }
}
