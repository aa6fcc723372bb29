//! Flavor System
//!
//! Firmware dialects and the per-flavor command dispatch table.

pub mod registry;
pub mod schema;

pub use registry::CommandRegistry;
pub use schema::{CommandHandler, CommandKey, CustomCommand, Flavor};
