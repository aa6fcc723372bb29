//! G-code Processor
//!
//! Streams G-code lines through the parser, the flavor dispatch table and the
//! command handlers, recording one [`MoveVertex`] per emitted move.
//!
//! ```
//! use gcode_processor::{GCodeProcessor, MoveType};
//!
//! let mut processor = GCodeProcessor::new();
//! processor.process_str("G1 X10 F3000\nG1 X20 E1 F1200\n");
//!
//! let moves = processor.result().moves();
//! assert_eq!(moves[0].move_type, MoveType::Travel);
//! assert_eq!(moves[1].move_type, MoveType::Extrude);
//! ```

pub mod annotation;
pub mod handlers;
pub mod position;
pub mod state;

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::Path;

use crate::config::MachineConfig;
use crate::core::Diagnostic;
use crate::flavor::CommandRegistry;
use crate::moves::{MoveType, MoveVertex, ProcessorResult};
use crate::parser::{self, ParsedLine};

pub use annotation::Annotations;
pub use handlers::MoveEvent;
pub use position::{Axis, CoordinateState, PositioningMode, Units};
pub use state::{Extruders, ProcessorState};

/// Sequential interpreter for one G-code stream
#[derive(Debug, Clone)]
pub struct GCodeProcessor {
    config: MachineConfig,
    registry: CommandRegistry,
    state: ProcessorState,
    result: ProcessorResult,
    diagnostics: Vec<Diagnostic>,
    line_number: usize,
}

impl Default for GCodeProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl GCodeProcessor {
    pub fn new() -> Self {
        Self::with_config(&MachineConfig::default())
    }

    pub fn with_config(config: &MachineConfig) -> Self {
        let mut registry = CommandRegistry::for_flavor(config.flavor);
        registry.add_custom_commands(&config.custom_commands);

        Self {
            config: config.clone(),
            registry,
            state: ProcessorState::new(config),
            result: ProcessorResult::new(),
            diagnostics: Vec::new(),
            line_number: 0,
        }
    }

    /// Switch to another machine; resets the interpreter state
    pub fn apply_config(&mut self, config: &MachineConfig) {
        *self = Self::with_config(config);
    }

    /// Back to the initial state, keeping the applied configuration
    pub fn reset(&mut self) {
        self.state = ProcessorState::new(&self.config);
        self.result = ProcessorResult::new();
        self.diagnostics.clear();
        self.line_number = 0;
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Current interpreter state
    pub fn state(&self) -> &ProcessorState {
        &self.state
    }

    /// Moves recorded so far
    pub fn result(&self) -> &ProcessorResult {
        &self.result
    }

    /// Hand the recorded moves over, leaving an empty result behind
    pub fn take_result(&mut self) -> ProcessorResult {
        mem::take(&mut self.result)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn lines_processed(&self) -> usize {
        self.line_number
    }

    /// Interpret one line of G-code
    pub fn process_line(&mut self, line: &str) {
        self.line_number += 1;
        self.state.coords.begin_line();

        let parsed = match parser::parse_line(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Line {}: {}", self.line_number, e);
                self.diagnostics
                    .push(Diagnostic::warning(self.line_number, e.to_string()));
                return;
            }
        };

        if let Some(comment) = parsed.comment() {
            self.state.annotations.apply_comment(&comment.text);
        }

        let ParsedLine::Command(command) = parsed else {
            return;
        };

        let Some(handler) = self.registry.lookup(&command) else {
            log::trace!("Line {}: skipping {}", self.line_number, command.name);
            return;
        };

        if let Some(event) = handlers::handle(handler, &command, &mut self.state) {
            self.store_move_vertex(event.move_type, event.delta_extruder);
        }
    }

    /// Interpret every line of an in-memory buffer
    pub fn process_str(&mut self, content: &str) {
        for line in content.lines() {
            self.process_line(line);
        }
    }

    /// Interpret a stream line by line, reusing one buffer
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn process_reader<R: BufRead>(&mut self, mut reader: R) -> Result<()> {
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            let read = reader
                .read_until(b'\n', &mut buffer)
                .with_context(|| format!("Failed to read line {}", self.line_number + 1))?;
            if read == 0 {
                break;
            }

            let mut line = buffer.as_slice();
            if let Some(stripped) = line.strip_suffix(b"\n") {
                line = stripped;
            }
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            self.process_line(&String::from_utf8_lossy(line));
        }
        Ok(())
    }

    /// Interpret a G-code file
    pub fn process_file(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open G-code file {}", path.display()))?;
        self.process_reader(BufReader::new(file))
            .with_context(|| format!("Failed to process {}", path.display()))?;

        log::info!(
            "Processed {} lines from {}: {} moves, {} diagnostics",
            self.line_number,
            path.display(),
            self.result.len(),
            self.diagnostics.len()
        );
        Ok(())
    }

    /// Snapshot the current state into a new move record
    fn store_move_vertex(&mut self, move_type: MoveType, delta_extruder: f32) {
        let state = &self.state;
        self.result.push(MoveVertex {
            move_type,
            extrusion_role: state.annotations.extrusion_role,
            position: state.coords.position(),
            feedrate: state.feedrate,
            width: state.annotations.width,
            height: state.annotations.height,
            mm3_per_mm: state.annotations.mm3_per_mm,
            fan_speed: state.fan_speed,
            extruder_id: state.extruders.active,
            delta_extruder,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flavor::Flavor;
    use crate::moves::ExtrusionRole;
    use std::io::Cursor;

    #[test]
    fn test_initial_state() {
        let processor = GCodeProcessor::new();
        assert!(processor.result().is_empty());
        assert!(processor.diagnostics().is_empty());
        assert_eq!(processor.lines_processed(), 0);
        assert_eq!(processor.registry().flavor(), Flavor::RepRap);
        assert_eq!(processor.state().extruders.active, 0);
        assert_eq!(processor.state().coords.units, Units::Millimeters);
    }

    #[test]
    fn test_travel_then_extrude() {
        let mut processor = GCodeProcessor::new();
        processor.process_str("G90\nG1 X10 Y0 F3000\nG1 X20 Y0 E1 F1200\n");

        let moves = processor.result().moves();
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0].move_type, MoveType::Travel);
        assert_eq!(moves[0].position, [10.0, 0.0, 0.0]);
        assert_eq!(moves[0].feedrate, 50.0);
        assert_eq!(moves[1].move_type, MoveType::Extrude);
        assert_eq!(moves[1].position, [20.0, 0.0, 0.0]);
        assert_eq!(moves[1].feedrate, 20.0);
        assert_eq!(moves[1].delta_extruder, 1.0);
        assert_eq!(processor.lines_processed(), 3);
    }

    #[test]
    fn test_annotation_on_move_line_applies_to_that_move() {
        let mut processor = GCodeProcessor::new();
        processor.process_line("G1 X5 E1 ; _EXTRUSION_ROLE=ExternalPerimeter _WIDTH=0.42");
        processor.process_line("G1 X6");

        let moves = processor.result().moves();
        assert_eq!(moves[0].extrusion_role, ExtrusionRole::ExternalPerimeter);
        assert_eq!(moves[0].width, 0.42);
        assert_eq!(moves[1].extrusion_role, ExtrusionRole::ExternalPerimeter);
    }

    #[test]
    fn test_malformed_line_is_reported_and_skipped() {
        let mut processor = GCodeProcessor::new();
        processor.process_str("G1 X1 E1\nG1 X(oops\nG1 X2 E2\n");

        assert_eq!(processor.result().len(), 2);
        assert_eq!(processor.diagnostics().len(), 1);
        assert_eq!(processor.diagnostics()[0].line, 2);
        assert_eq!(processor.result().moves()[1].position, [2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unknown_commands_are_ignored() {
        let mut processor = GCodeProcessor::new();
        processor.process_str("M104 S200\nG28\nSET_FAN_SPEED FAN=a SPEED=1\nM401\n");
        assert!(processor.result().is_empty());
        assert!(processor.diagnostics().is_empty());
        assert_eq!(processor.state().coords.cached, None);
    }

    #[test]
    fn test_reset_keeps_config() {
        let config = MachineConfig {
            flavor: Flavor::Repetier,
            units: Units::Inches,
            ..MachineConfig::default()
        };
        let mut processor = GCodeProcessor::with_config(&config);
        processor.process_str("G21\nG1 X10 E1\nG1 X(\n");
        assert!(!processor.result().is_empty());

        processor.reset();
        assert!(processor.result().is_empty());
        assert!(processor.diagnostics().is_empty());
        assert_eq!(processor.lines_processed(), 0);
        assert_eq!(processor.state().coords.units, Units::Inches);
        assert_eq!(processor.state().coords.end, [0.0; 4]);
        assert_eq!(processor.registry().flavor(), Flavor::Repetier);
    }

    #[test]
    fn test_apply_config_rebuilds_dispatch() {
        let mut processor = GCodeProcessor::new();
        processor.process_str("G1 X10\nM401\nG1 X20\nM402\n");
        assert_eq!(processor.state().coords.end[0], 20.0);

        processor.apply_config(&MachineConfig {
            flavor: Flavor::Repetier,
            ..MachineConfig::default()
        });
        processor.process_str("G1 X10\nM401\nG1 X20\nM402\n");
        assert_eq!(processor.state().coords.end[0], 10.0);
        assert_eq!(processor.result().len(), 2);
    }

    #[test]
    fn test_take_result() {
        let mut processor = GCodeProcessor::new();
        processor.process_line("G1 X1");
        let taken = processor.take_result();
        assert_eq!(taken.len(), 1);
        assert!(processor.result().is_empty());
    }

    #[test]
    fn test_process_reader_handles_crlf_and_invalid_utf8() {
        let mut processor = GCodeProcessor::new();
        let input: &[u8] = b"G1 X1 F600\r\n; caf\xe9\r\nG1 X2 E1";
        processor.process_reader(Cursor::new(input)).unwrap();

        assert_eq!(processor.lines_processed(), 3);
        assert_eq!(processor.result().len(), 2);
        assert!(processor.diagnostics().is_empty());
        assert_eq!(processor.result().moves()[1].position, [2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_process_file_missing() {
        let mut processor = GCodeProcessor::new();
        let err = processor
            .process_file(Path::new("/nonexistent/part.gcode"))
            .unwrap_err();
        assert!(err.to_string().contains("part.gcode"));
    }
}
