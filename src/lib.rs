//! G-code Move Processor
//!
//! A streaming interpreter that turns G-code into the sequence of moves a
//! printer would perform.
//!
//! This library provides:
//! - G-code line parsing
//! - Flavor-based command dispatch
//! - Position, feedrate, fan and tool tracking
//! - Slicer annotation decoding
//! - Configuration management and a command-line front end

pub mod cli;
pub mod config;
pub mod core;
pub mod flavor;
pub mod moves;
pub mod parser;
pub mod processor;

// Re-exports for a compact public API
pub use config::{Config, MachineConfig};
pub use crate::core::{Diagnostic, Severity};
pub use flavor::{CommandHandler, CommandRegistry, Flavor};
pub use moves::{ExtrusionRole, MoveSummary, MoveType, MoveVertex, ProcessorResult};
pub use parser::{parse_line, ParsedLine};
pub use processor::GCodeProcessor;
