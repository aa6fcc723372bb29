//! Configuration management for the G-code move processor.
//!
//! Handles:
//! - Command-line argument parsing
//! - Machine configuration files (flavor, units, extruders)

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::flavor::{CustomCommand, Flavor};
use crate::processor::position::Units;

/// File looked up in the working directory when `--config` is not given
pub const LOCAL_CONFIG_FILE: &str = ".gcode-moves.toml";

/// Command-line arguments for the move processor
#[derive(Debug, Parser)]
#[command(name = "gcode-moves")]
#[command(about = "Interpret a G-code file into a list of machine moves")]
#[command(version)]
pub struct Args {
    /// G-code file to process
    pub input: PathBuf,

    /// Explicitly specify the G-code flavor to use
    #[arg(long, help = "G-code flavor to use (e.g., 'reprap', 'marlin2', 'repetier')")]
    pub flavor: Option<String>,

    /// Machine configuration file
    #[arg(long, help = "Machine configuration TOML file")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log level for the processor
    #[arg(
        long,
        default_value = "warn",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per move
    #[default]
    Text,
    /// JSON array of moves
    Json,
    /// Counts and lengths only
    Summary,
}

/// Machine description loaded from TOML
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub flavor: Flavor,
    /// Units in effect before the file selects any
    pub units: Units,
    /// Firmware-retract length, mm
    pub retract_length: f32,
    /// Nozzle offsets, one per extruder
    pub extruder_offsets: Vec<[f32; 3]>,
    /// Extra command mappings on top of the flavor's table
    pub custom_commands: Vec<CustomCommand>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            flavor: Flavor::default(),
            units: Units::default(),
            retract_length: 1.0,
            extruder_offsets: vec![[0.0; 3]],
            custom_commands: Vec::new(),
        }
    }
}

impl MachineConfig {
    /// Parse a machine configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: MachineConfig = toml::from_str(content)?;
        if config.extruder_offsets.is_empty() {
            config.extruder_offsets.push([0.0; 3]);
        }
        if !config.retract_length.is_finite() || config.retract_length < 0.0 {
            return Err(anyhow!(
                "retract_length must be a non-negative number, got {}",
                config.retract_length
            ));
        }
        Ok(config)
    }

    /// Load a machine configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read machine config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse machine config {}", path.display()))
    }

    /// Load the explicit file, or the first candidate that exists
    ///
    /// Returns the defaults and `None` when nothing is found.
    pub fn discover(
        explicit: Option<&Path>,
        candidates: &[PathBuf],
    ) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        for candidate in candidates {
            if candidate.is_file() {
                log::debug!("Using machine config {}", candidate.display());
                return Ok((Self::load(candidate)?, Some(candidate.clone())));
            }
        }

        Ok((Self::default(), None))
    }

    pub fn extruder_count(&self) -> usize {
        self.extruder_offsets.len().max(1)
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub machine: MachineConfig,
    /// File the machine configuration came from, if any
    pub machine_source: Option<PathBuf>,
    pub format: OutputFormat,
    pub log_level: String,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        Self::from_args_with_candidates(args, &default_config_paths())
    }

    /// Like [`Config::from_args`] with an explicit list of fallback files
    pub fn from_args_with_candidates(args: Args, candidates: &[PathBuf]) -> Result<Self> {
        let (mut machine, machine_source) =
            MachineConfig::discover(args.config.as_deref(), candidates)?;

        if let Some(name) = &args.flavor {
            machine.flavor = name
                .parse()
                .map_err(|e: String| anyhow!(e))
                .context("Invalid --flavor")?;
        }

        Ok(Config {
            input: args.input,
            machine,
            machine_source,
            format: args.format,
            log_level: args.log_level,
        })
    }

    /// Flavor after applying the command line over the machine file
    pub fn effective_flavor(&self) -> Flavor {
        self.machine.flavor
    }
}

/// Fallback machine config locations, in lookup order
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("gcode-moves").join("machine.toml"));
    }
    paths
}
