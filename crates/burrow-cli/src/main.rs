//! burrow CLI - build tunnel networks from TOML scenarios
//!
//! `generate` builds a scenario, prints a JSON summary and optionally writes
//! the combined mesh as STL. `config` prints the effective configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burrow::{export, NetworkConfig, Scenario};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "burrow")]
#[command(about = "Incremental tunnel-network mesh generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a scenario and print a JSON summary
    Generate {
        /// Scenario file (.toml)
        scenario: PathBuf,
        /// Write the combined mesh to this STL file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print compact JSON instead of pretty JSON
        #[arg(long)]
        compact: bool,
    },
    /// Print the effective configuration as TOML
    Config {
        /// Scenario file whose configuration to print (default: built-in defaults)
        scenario: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            scenario,
            output,
            compact,
        } => generate(&scenario, output.as_deref(), compact),
        Commands::Config { scenario } => show_config(scenario.as_deref()),
    }
}

fn load(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Scenario::from_toml_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn generate(path: &Path, output: Option<&Path>, compact: bool) -> Result<()> {
    let scenario = load(path)?;
    let run = scenario.run()?;
    let report = run.report();

    let json = if compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{json}");

    if let Some(output) = output {
        export::write_stl(&run.meshes.combined(), output)?;
        info!(
            path = %output.display(),
            triangles = report.triangles,
            "wrote STL"
        );
    }
    Ok(())
}

fn show_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(path) => {
            let config = load(path)?.config;
            config.validate()?;
            config
        }
        None => NetworkConfig::default(),
    };
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
