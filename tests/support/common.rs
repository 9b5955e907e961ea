#![allow(dead_code)]

use anyhow::{Context, Result};
use dht2_fopgen::{BEGIN_FENCE, END_FENCE};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn catalog_path(name: &str) -> PathBuf {
    repo_root().join("catalogs").join(name)
}

pub fn template_path(name: &str) -> PathBuf {
    repo_root().join("templates").join(name)
}

pub fn fopgen_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_dht2-fopgen"))
}

/// Write a catalog descriptor under `dir` and return its path.
pub fn write_catalog(dir: &Path, name: &str, value: &Value) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("failed to write catalog fixture {}", path.display()))?;
    Ok(path)
}

/// Run the generator binary with a clean logging environment.
pub fn run_fopgen<I, S>(args: I) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut cmd = Command::new(fopgen_binary());
    cmd.args(args)
        .env_remove("RUST_LOG")
        .env_remove("DHT2_FOPGEN_CATALOG")
        .env_remove("DHT2_FOPGEN_SIGNATURES");
    cmd.output().context("failed to execute dht2-fopgen")
}

/// Text between the fence comments, fences excluded.
pub fn generated_region(text: &str) -> &str {
    let start = text
        .find(BEGIN_FENCE)
        .map(|idx| idx + BEGIN_FENCE.len())
        .expect("begin fence present");
    let end = text.find(END_FENCE).expect("end fence present");
    &text[start..end]
}

/// The generated definition or declaration of `function`, from its name line
/// through the closing brace (or the terminating `);` for declarations).
pub fn function_text<'a>(text: &'a str, function: &str) -> Option<&'a str> {
    let needle = format!("\n{function} (");
    let start = text.find(&needle)? + 1;
    let rest = &text[start..];
    let declaration_end = rest.find(");\n");
    let body_start = rest.find(")\n{\n");
    let end = match (body_start, declaration_end) {
        (Some(body), Some(decl)) if decl < body => decl + 3,
        (Some(_), _) => rest.find("\n}\n")? + 3,
        (None, Some(decl)) => decl + 3,
        (None, None) => return None,
    };
    Some(&rest[..end])
}
