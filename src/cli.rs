//! Command-line front end
//!
//! Loads the configuration, runs the processor over the input file and
//! prints the recorded moves.

use anyhow::{Context, Result};
use std::io::{self, BufWriter, Write};

use crate::config::{Config, OutputFormat};
use crate::core::Diagnostic;
use crate::moves::{MoveType, ProcessorResult};
use crate::processor::GCodeProcessor;

/// Entry point of the `gcode-moves` binary
pub fn run() -> Result<()> {
    let config = Config::from_args_and_env()?;
    init_logging(&config.log_level);

    if let Some(source) = &config.machine_source {
        log::info!("Machine config: {}", source.display());
    }
    log::info!("Flavor: {}", config.effective_flavor());

    let mut processor = GCodeProcessor::with_config(&config.machine);
    processor.process_file(&config.input)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    render(&mut out, config.format, processor.result(), processor.diagnostics())?;
    out.flush().context("Failed to write output")?;
    Ok(())
}

/// `RUST_LOG` wins over the `--log-level` default
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Write a result in the requested format
pub fn render<W: Write>(
    out: &mut W,
    format: OutputFormat,
    result: &ProcessorResult,
    diagnostics: &[Diagnostic],
) -> Result<()> {
    match format {
        OutputFormat::Text => write_text(out, result),
        OutputFormat::Json => write_json(out, result),
        OutputFormat::Summary => write_summary(out, result, diagnostics),
    }
}

fn write_text<W: Write>(out: &mut W, result: &ProcessorResult) -> Result<()> {
    for vertex in result {
        writeln!(out, "{}", vertex)?;
    }
    Ok(())
}

fn write_json<W: Write>(out: &mut W, result: &ProcessorResult) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, result).context("Failed to serialize moves")?;
    writeln!(out)?;
    Ok(())
}

fn write_summary<W: Write>(
    out: &mut W,
    result: &ProcessorResult,
    diagnostics: &[Diagnostic],
) -> Result<()> {
    let summary = result.summary();

    writeln!(out, "moves: {}", summary.total_moves())?;
    for move_type in MoveType::ALL {
        let count = summary.moves_of(move_type);
        if count > 0 {
            writeln!(out, "  {}: {}", move_type, count)?;
        }
    }

    if !summary.roles.is_empty() {
        writeln!(out, "extrusion roles:")?;
        for (role, count) in &summary.roles {
            writeln!(out, "  {}: {}", role, count)?;
        }
    }

    writeln!(out, "extrude length: {:.3} mm", summary.extrude_length)?;
    writeln!(out, "travel length: {:.3} mm", summary.travel_length)?;
    writeln!(out, "filament: {:.3} mm", summary.extruded_filament)?;
    writeln!(out, "diagnostics: {}", diagnostics.len())?;
    for diagnostic in diagnostics {
        writeln!(out, "  {}", diagnostic)?;
    }
    Ok(())
}
