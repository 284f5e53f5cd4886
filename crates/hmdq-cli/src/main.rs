//! hmdq CLI - VR headset view geometry
//!
//! Reads the data file collected from a VR runtime, calculates the view
//! geometry (FOV, panel rotation, IPD, hidden area mesh statistics) and
//! writes or prints the result.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod report;
mod subsystem;

use config::Config;
use subsystem::Subsystem;

#[derive(Parser)]
#[command(name = "hmdq")]
#[command(about = "VR headset view geometry calculator", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output verbosity (default from the configuration)
    #[arg(short, long, global = true, allow_hyphen_values = true)]
    verbosity: Option<i32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the view geometry and write the augmented data file
    Geom {
        /// Input JSON data file
        input: PathBuf,
        /// Output JSON file (default: standard output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the view geometry summary
    Print {
        /// Input JSON data file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let verbosity = cli.verbosity.unwrap_or(config.verbosity.default);

    match cli.command {
        Commands::Geom { input, output } => {
            calc_file(&input, output.as_deref(), &config)?;
        }
        Commands::Print { input } => {
            print_file(&input, verbosity, &config)?;
        }
    }

    Ok(())
}

fn load_document(input: &Path) -> Result<(Map<String, Value>, Vec<Subsystem>)> {
    let json = fs::read_to_string(input)
        .with_context(|| format!("cannot read {}", input.display()))?;
    let value: Value = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a valid JSON file", input.display()))?;
    let Value::Object(mut doc) = value else {
        bail!("{} does not contain a JSON object", input.display());
    };
    let subsystems = Subsystem::from_document(&mut doc);
    if subsystems.is_empty() {
        bail!("no OpenVR or Oculus data in {}", input.display());
    }
    Ok((doc, subsystems))
}

fn calculate_all(subsystems: &mut [Subsystem], config: &Config) {
    for sub in subsystems.iter_mut() {
        info!(subsystem = sub.name(), "calculating geometry");
        sub.calculate(&config.geometry);
    }
}

fn calc_file(input: &Path, output: Option<&Path>, config: &Config) -> Result<()> {
    let (mut doc, mut subsystems) = load_document(input)?;
    calculate_all(&mut subsystems, config);
    for sub in subsystems {
        sub.into_document(&mut doc);
    }

    let doc = Value::Object(doc);
    let text = if config.format.json_pretty {
        serde_json::to_string_pretty(&doc)?
    } else {
        serde_json::to_string(&doc)?
    };
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))?;
            info!(output = %path.display(), "geometry written");
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn print_file(input: &Path, verbosity: i32, config: &Config) -> Result<()> {
    let (_, mut subsystems) = load_document(input)?;
    calculate_all(&mut subsystems, config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (i, sub) in subsystems.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        sub.print(&mut out, verbosity, config)?;
    }
    Ok(())
}
