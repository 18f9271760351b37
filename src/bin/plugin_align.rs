//! Check a plugin tree for registry drift, bad references, hierarchy
//! violations and reference cycles.
//!
//! Usage:
//!   plugin-align --root path/to/plugin
//!   plugin-align --format json --used-by
//!   PLUGIN_ALIGN_ROOT=path/to/plugin plugin-align --verbose

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use plugin_align::{ValidateOptions, find_plugin_root, validate_with};
use std::io::{Write, stdout};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "plugin-align")]
#[command(about = "Validate plugin component alignment and the reference graph")]
struct Cli {
    /// Plugin root; defaults to PLUGIN_ALIGN_ROOT or the nearest ancestor holding registry.yaml.
    #[arg(long)]
    root: Option<PathBuf>,
    /// Registry path, relative to the root unless absolute.
    #[arg(long)]
    registry: Option<PathBuf>,
    /// Report format written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Append the reverse reference index to the text report.
    #[arg(long)]
    used_by: bool,
    /// Debug logging on stderr (RUST_LOG takes precedence).
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let root = match cli.root {
        Some(root) => root,
        None => find_plugin_root().context("locating plugin root")?,
    };
    let mut options = ValidateOptions::from_env();
    if let Some(registry) = cli.registry {
        options.registry = registry;
    }
    debug!(root = %root.display(), ?options, "starting validation");

    let validation = validate_with(&root, &options)
        .with_context(|| format!("validating {}", root.display()))?;
    let report = validation.report();

    let rendered = match cli.format {
        OutputFormat::Json => {
            let mut document = report.to_json(&validation.reverse_index);
            document["root"] = validation.root.display().to_string().into();
            document["registry_version"] = validation.registry_version.clone().into();
            document["components"] = validation.component_count.into();
            document["references"] = validation.reference_count.into();
            let mut text =
                serde_json::to_string_pretty(&document).context("serializing JSON report")?;
            text.push('\n');
            text
        }
        OutputFormat::Text if cli.used_by => report.text_with_used_by(&validation.reverse_index),
        OutputFormat::Text => report.text(),
    };

    let mut out = stdout().lock();
    out.write_all(rendered.as_bytes())
        .and_then(|()| out.flush())
        .context("writing report")?;
    Ok(report.exit_code())
}

fn init_logging(verbose: bool) {
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("plugin_align=debug")
    } else {
        EnvFilter::new("plugin_align=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
