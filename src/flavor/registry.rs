//! Command Registry
//!
//! Dispatch table mapping command keys to handlers for one flavor.
//! New dialect commands are added as table entries, never as branches
//! in the processor.

use super::schema::{CommandHandler, CommandKey, CustomCommand, Flavor};
use crate::parser::Command;
use std::collections::HashMap;

/// Commands understood by every flavor
const BASELINE: &[(CommandKey, CommandHandler)] = &[
    (CommandKey::new('G', 0), CommandHandler::LinearMove),
    (CommandKey::new('G', 1), CommandHandler::LinearMove),
    (CommandKey::new('G', 10), CommandHandler::Retract),
    (CommandKey::new('G', 11), CommandHandler::Unretract),
    (CommandKey::new('G', 20), CommandHandler::SetInches),
    (CommandKey::new('G', 21), CommandHandler::SetMillimeters),
    (CommandKey::new('G', 22), CommandHandler::FirmwareRetract),
    (CommandKey::new('G', 23), CommandHandler::FirmwareUnretract),
    (CommandKey::new('G', 90), CommandHandler::SetAbsolute),
    (CommandKey::new('G', 91), CommandHandler::SetRelative),
    (CommandKey::new('G', 92), CommandHandler::SetPosition),
    (CommandKey::new('M', 82), CommandHandler::SetExtruderAbsolute),
    (CommandKey::new('M', 83), CommandHandler::SetExtruderRelative),
    (CommandKey::new('M', 106), CommandHandler::SetFanSpeed),
    (CommandKey::new('M', 107), CommandHandler::DisableFan),
    (CommandKey::new('M', 132), CommandHandler::ResetOrigin),
    (CommandKey::family('T'), CommandHandler::SelectTool),
];

const SAILFISH: &[(CommandKey, CommandHandler)] = &[(
    CommandKey::new('M', 108),
    CommandHandler::SelectToolFromParameter,
)];

const MAKERWARE: &[(CommandKey, CommandHandler)] = &[(
    CommandKey::new('M', 135),
    CommandHandler::SelectToolFromParameter,
)];

const REPETIER: &[(CommandKey, CommandHandler)] = &[
    (CommandKey::new('M', 401), CommandHandler::StorePosition),
    (CommandKey::new('M', 402), CommandHandler::RecallPosition),
];

const MARLIN2: &[(CommandKey, CommandHandler)] = &[
    (CommandKey::new('G', 60), CommandHandler::StorePosition),
    (CommandKey::new('G', 61), CommandHandler::RecallPosition),
];

/// Extra table entries contributed by a flavor
fn flavor_entries(flavor: Flavor) -> &'static [(CommandKey, CommandHandler)] {
    match flavor {
        Flavor::Sailfish => SAILFISH,
        Flavor::MakerWare => MAKERWARE,
        Flavor::Repetier => REPETIER,
        Flavor::Marlin2 => MARLIN2,
        _ => &[],
    }
}

/// Dispatch table for the active flavor
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    flavor: Flavor,
    handlers: HashMap<CommandKey, CommandHandler>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::for_flavor(Flavor::default())
    }
}

impl CommandRegistry {
    /// Empty table, nothing is recognized
    pub fn new(flavor: Flavor) -> Self {
        Self {
            flavor,
            handlers: HashMap::new(),
        }
    }

    /// Baseline commands plus the flavor's own entries
    pub fn for_flavor(flavor: Flavor) -> Self {
        let mut registry = Self::new(flavor);
        for &(key, handler) in BASELINE.iter().chain(flavor_entries(flavor)) {
            registry.add(key, handler);
        }
        registry
    }

    /// Add or replace a table entry
    pub fn add(&mut self, key: CommandKey, handler: CommandHandler) {
        if let Some(previous) = self.handlers.insert(key, handler) {
            if previous != handler {
                log::debug!("{} remapped from {:?} to {:?}", key, previous, handler);
            }
        }
    }

    /// Add user-defined mappings; invalid command words are skipped with a warning
    ///
    /// `select_tool` reads the tool index from the command code, so it only
    /// makes sense on `T` words. Other words should map to
    /// `select_tool_from_parameter`.
    pub fn add_custom_commands(&mut self, commands: &[CustomCommand]) {
        for custom in commands {
            match custom.command.parse::<CommandKey>() {
                Ok(key) if custom.action == CommandHandler::SelectTool && key.letter != 'T' => {
                    log::warn!(
                        "Ignoring custom command {}: select_tool needs a T word, use select_tool_from_parameter",
                        key
                    );
                }
                Ok(key) => self.add(key, custom.action),
                Err(e) => log::warn!("Ignoring custom command: {}", e),
            }
        }
    }

    /// The flavor this table was built for
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Number of table entries
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Exact entry for a key
    pub fn get(&self, key: &CommandKey) -> Option<CommandHandler> {
        self.handlers.get(key).copied()
    }

    /// Handler for a parsed command: exact key first, then the letter-wide family
    pub fn lookup(&self, command: &Command) -> Option<CommandHandler> {
        let key = CommandKey::of(command)?;
        self.get(&key)
            .or_else(|| self.get(&CommandKey::family(key.letter)))
    }
}
