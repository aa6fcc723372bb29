//! Flavor Schema Types
//!
//! Firmware flavors, dispatch keys and the handler catalogue the dispatch
//! table maps commands to.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::parser::Command;

/// Firmware dialect of the G-code stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Flavor {
    #[default]
    RepRap,
    Repetier,
    Teacup,
    MakerWare,
    MarlinLegacy,
    Marlin2,
    Sailfish,
    Mach3,
    MachineKit,
    Smoothie,
    Klipper,
    RepRapFirmware,
    NoExtrusion,
}

impl Flavor {
    pub const ALL: [Flavor; 13] = [
        Flavor::RepRap,
        Flavor::Repetier,
        Flavor::Teacup,
        Flavor::MakerWare,
        Flavor::MarlinLegacy,
        Flavor::Marlin2,
        Flavor::Sailfish,
        Flavor::Mach3,
        Flavor::MachineKit,
        Flavor::Smoothie,
        Flavor::Klipper,
        Flavor::RepRapFirmware,
        Flavor::NoExtrusion,
    ];

    /// Canonical lower-case name, as accepted in config files and on the command line
    pub fn name(self) -> &'static str {
        match self {
            Flavor::RepRap => "reprap",
            Flavor::Repetier => "repetier",
            Flavor::Teacup => "teacup",
            Flavor::MakerWare => "makerware",
            Flavor::MarlinLegacy => "marlinlegacy",
            Flavor::Marlin2 => "marlin2",
            Flavor::Sailfish => "sailfish",
            Flavor::Mach3 => "mach3",
            Flavor::MachineKit => "machinekit",
            Flavor::Smoothie => "smoothie",
            Flavor::Klipper => "klipper",
            Flavor::RepRapFirmware => "reprapfirmware",
            Flavor::NoExtrusion => "noextrusion",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Flavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        if normalized == "marlin" {
            return Ok(Flavor::MarlinLegacy);
        }
        if normalized == "sprinter" {
            return Ok(Flavor::RepRap);
        }

        Flavor::ALL
            .into_iter()
            .find(|flavor| flavor.name() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = Flavor::ALL.iter().map(|f| f.name()).collect();
                format!("unknown flavor '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

impl TryFrom<String> for Flavor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Dispatch key: command letter, numeric code and optional sub-code
///
/// A key without a code is a letter-wide family entry (`T<n>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandKey {
    pub letter: char,
    pub code: Option<u32>,
    pub subcode: Option<u32>,
}

impl CommandKey {
    pub const fn new(letter: char, code: u32) -> Self {
        Self {
            letter,
            code: Some(code),
            subcode: None,
        }
    }

    pub const fn family(letter: char) -> Self {
        Self {
            letter,
            code: None,
            subcode: None,
        }
    }

    /// Key of a parsed command; extended words have none
    pub fn of(command: &Command) -> Option<Self> {
        if command.extended {
            return None;
        }
        Some(Self {
            letter: command.letter,
            code: command.code,
            subcode: command.subcode,
        })
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter)?;
        match (self.code, self.subcode) {
            (Some(code), Some(subcode)) => write!(f, "{}.{}", code, subcode),
            (Some(code), None) => write!(f, "{}", code),
            _ => write!(f, "<n>"),
        }
    }
}

impl FromStr for CommandKey {
    type Err = String;

    /// Parse "G1", "M402", "G29.1" or a bare family letter like "T"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let mut chars = upper.chars();
        let letter = chars
            .next()
            .filter(|c| c.is_ascii_alphabetic())
            .ok_or_else(|| format!("invalid command '{}'", s))?;
        let digits = chars.as_str();
        if digits.is_empty() {
            return Ok(Self::family(letter));
        }

        let invalid = || format!("invalid command '{}'", s);
        let (code, subcode) = match digits.split_once('.') {
            Some((code, subcode)) => (
                code.parse().map_err(|_| invalid())?,
                Some(subcode.parse().map_err(|_| invalid())?),
            ),
            None => (digits.parse().map_err(|_| invalid())?, None),
        };

        Ok(Self {
            letter,
            code: Some(code),
            subcode,
        })
    }
}

/// What a recognized command does to the processor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandHandler {
    /// G0/G1: move, possibly extruding
    LinearMove,
    /// G10: retract, honouring an explicit `E` length
    Retract,
    /// G11: unretract, honouring an explicit `E` length
    Unretract,
    /// G22: firmware retract, always the configured length
    FirmwareRetract,
    /// G23: firmware unretract, always the configured length
    FirmwareUnretract,
    /// G20
    SetInches,
    /// G21
    SetMillimeters,
    /// G90
    SetAbsolute,
    /// G91
    SetRelative,
    /// G92
    SetPosition,
    /// M82
    SetExtruderAbsolute,
    /// M83
    SetExtruderRelative,
    /// M106
    SetFanSpeed,
    /// M107
    DisableFan,
    /// M132: MakerBot recall of home offsets, zeroes the origin of listed axes
    ResetOrigin,
    /// T<n>: tool index from the command code
    SelectTool,
    /// M108 T<n> / M135 T<n>: tool index from the `T` parameter
    SelectToolFromParameter,
    /// M401 / G60
    StorePosition,
    /// M402 / G61
    RecallPosition,
}

impl CommandHandler {
    /// Handlers that may emit a move record
    pub fn emits_moves(self) -> bool {
        matches!(
            self,
            CommandHandler::LinearMove
                | CommandHandler::Retract
                | CommandHandler::Unretract
                | CommandHandler::FirmwareRetract
                | CommandHandler::FirmwareUnretract
                | CommandHandler::SelectTool
                | CommandHandler::SelectToolFromParameter
        )
    }
}

/// A user-defined command mapping from the machine configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CustomCommand {
    /// Command word, e.g. "M601"
    pub command: String,
    /// Handler the command maps to
    pub action: CommandHandler,
}
