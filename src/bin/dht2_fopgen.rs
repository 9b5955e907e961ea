//! Splice generated DHT2 fop stubs into a C template.
//!
//! Usage:
//!   dht2-fopgen dht2-autogen-fops-tmpl.c > dht2-autogen-fops.c
//!   dht2-fopgen --frontend header dht2-autogen-fops-tmpl.h > dht2-autogen-fops.h
//!
//! Both front-ends read the same catalog and signature table. Generated text
//! goes to stdout (or `--output`) only once the whole file expanded cleanly.

use anyhow::{Context, Result};
use clap::Parser;
use dht2_fopgen::{Frontend, Generator};
use std::fs;
use std::io::{IsTerminal, Write, stderr, stdout};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "dht2-fopgen")]
#[command(about = "Expand the DHT2 fop catalog into a C source or header template")]
struct Cli {
    /// Template file containing a `#pragma generate` line.
    template: PathBuf,
    /// Which stubs to generate: impl (definitions) or header (declarations).
    #[arg(long, default_value = "impl", value_parser = ["impl", "header"])]
    frontend: String,
    /// Alternate catalog descriptor; the bundled catalog is used when omitted.
    #[arg(long, env = "DHT2_FOPGEN_CATALOG")]
    catalog: Option<PathBuf>,
    /// Alternate fop signature descriptor.
    #[arg(long, env = "DHT2_FOPGEN_SIGNATURES")]
    signatures: Option<PathBuf>,
    /// Write to this file instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("dht2-fopgen: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(stderr)
                .with_ansi(stderr().is_terminal())
                .with_target(false),
        )
        .with(filter)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let frontend = Frontend::try_from(cli.frontend.as_str())?;
    let generator = Generator::from_paths(cli.catalog.as_deref(), cli.signatures.as_deref())?;
    let output = generator.generate_file(frontend, &cli.template)?;

    match &cli.output {
        Some(path) => fs::write(path, &output)
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut handle = stdout().lock();
            handle
                .write_all(output.as_bytes())
                .context("writing generated source to stdout")?;
            handle.flush().context("flushing stdout")?;
        }
    }
    Ok(())
}
