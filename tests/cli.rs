// End-to-end behavior of the dht2-fopgen binary.
#[path = "support/common.rs"]
mod common;

use anyhow::{Context, Result};
use dht2_fopgen::{BEGIN_FENCE, END_FENCE};
use serde_json::json;
use std::ffi::OsString;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

use common::{fopgen_binary, run_fopgen, template_path, write_catalog};

#[test]
fn implementation_run_writes_spliced_source_to_stdout() -> Result<()> {
    let output = run_fopgen([template_path("dht2-autogen-fops-tmpl.c")])?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).context("stdout utf-8")?;
    assert!(stdout.contains(BEGIN_FENCE));
    assert!(stdout.contains(END_FENCE));
    assert!(stdout.contains("#include \"dht2-autogen-fops.h\""));
    assert!(stdout.contains("\ndht2_flush (\n"));
    assert!(output.stderr.is_empty(), "warn-level logging should be quiet");
    Ok(())
}

#[test]
fn header_frontend_flag_selects_declarations() -> Result<()> {
    let output = run_fopgen([
        OsString::from("--frontend"),
        OsString::from("header"),
        template_path("dht2-autogen-fops-tmpl.h").into_os_string(),
    ])?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("dht2_ipc ("));
    assert!(!stdout.contains("STACK_WIND"));
    Ok(())
}

#[test]
fn rejects_unknown_frontend() -> Result<()> {
    let output = run_fopgen([
        OsString::from("--frontend"),
        OsString::from("both"),
        template_path("dht2-autogen-fops-tmpl.c").into_os_string(),
    ])?;
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    Ok(())
}

#[test]
fn unknown_operation_fails_without_stdout() -> Result<()> {
    let temp = TempDir::new()?;
    let catalog = write_catalog(
        temp.path(),
        "unknown.json",
        &json!({
            "schema_version": "dht2_fop_catalog_v1",
            "catalog": {"key": "unknown", "title": "unknown op"},
            "categories": {"inode": ["stat", "frobnicate"]}
        }),
    )?;
    let output = run_fopgen([
        OsString::from("--catalog"),
        catalog.into_os_string(),
        template_path("dht2-autogen-fops-tmpl.c").into_os_string(),
    ])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty(), "partial output leaked to stdout");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no fop signature known for operation 'frobnicate'"),
        "stderr was: {stderr}"
    );
    Ok(())
}

#[test]
fn catalog_can_come_from_environment() -> Result<()> {
    let temp = TempDir::new()?;
    let catalog = write_catalog(
        temp.path(),
        "tiny.json",
        &json!({
            "schema_version": "dht2_fop_catalog_v1",
            "catalog": {"key": "tiny", "title": "tiny"},
            "categories": {"fd_ds": ["readv"]}
        }),
    )?;
    let output = Command::new(fopgen_binary())
        .arg(template_path("dht2-autogen-fops-tmpl.c"))
        .env_remove("RUST_LOG")
        .env("DHT2_FOPGEN_CATALOG", &catalog)
        .output()
        .context("failed to execute dht2-fopgen")?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("dht2_readv_cbk"));
    assert!(!stdout.contains("dht2_stat"));
    Ok(())
}

#[test]
fn missing_template_is_reported() -> Result<()> {
    let temp = TempDir::new()?;
    let missing = temp.path().join("absent-tmpl.c");
    let output = run_fopgen([missing.as_os_str()])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("absent-tmpl.c"), "stderr was: {stderr}");
    Ok(())
}

#[test]
fn output_flag_writes_file_instead_of_stdout() -> Result<()> {
    let temp = TempDir::new()?;
    let dest = temp.path().join("dht2-autogen-fops.c");
    let output = run_fopgen([
        OsString::from("--output"),
        dest.clone().into_os_string(),
        template_path("dht2-autogen-fops-tmpl.c").into_os_string(),
    ])?;
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let written = fs::read_to_string(&dest)?;
    assert_eq!(written.matches(BEGIN_FENCE).count(), 1);
    Ok(())
}

#[test]
fn debug_logging_goes_to_stderr() -> Result<()> {
    let output = Command::new(fopgen_binary())
        .arg(template_path("dht2-autogen-fops-tmpl.c"))
        .env("RUST_LOG", "debug")
        .env_remove("DHT2_FOPGEN_CATALOG")
        .output()
        .context("failed to execute dht2-fopgen")?;
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("expanded fop"), "stderr was: {stderr}");
    let stdout = String::from_utf8(output.stdout)?;
    assert!(!stdout.contains("expanded fop"));
    Ok(())
}
