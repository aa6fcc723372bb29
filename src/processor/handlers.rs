//! Command handlers
//!
//! One function per command family. Each takes only the state it touches;
//! [`handle`] routes a dispatch-table entry to its function and returns the
//! move to record, if any.

use super::position::{Axis, CoordinateState, PositioningMode, Units};
use super::state::{Extruders, ProcessorState};
use crate::flavor::CommandHandler;
use crate::moves::MoveType;
use crate::parser::Command;

/// A move-producing outcome handed to the recorder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveEvent {
    pub move_type: MoveType,
    /// Filament fed by the move, mm
    pub delta_extruder: f32,
}

impl MoveEvent {
    pub fn new(move_type: MoveType, delta_extruder: f32) -> Self {
        Self {
            move_type,
            delta_extruder,
        }
    }
}

/// Run one handler against the state
pub fn handle(
    handler: CommandHandler,
    command: &Command,
    state: &mut ProcessorState,
) -> Option<MoveEvent> {
    match handler {
        CommandHandler::LinearMove => Some(linear_move(
            command,
            &mut state.coords,
            &mut state.feedrate,
        )),
        CommandHandler::Retract => {
            let length = explicit_length(command, &state.coords).unwrap_or(state.retract_length);
            Some(retract(length))
        }
        CommandHandler::Unretract => {
            let length = explicit_length(command, &state.coords).unwrap_or(state.retract_length);
            Some(unretract(length))
        }
        CommandHandler::FirmwareRetract => Some(retract(state.retract_length)),
        CommandHandler::FirmwareUnretract => Some(unretract(state.retract_length)),
        CommandHandler::SetInches => {
            set_units(&mut state.coords, Units::Inches);
            None
        }
        CommandHandler::SetMillimeters => {
            set_units(&mut state.coords, Units::Millimeters);
            None
        }
        CommandHandler::SetAbsolute => {
            state.coords.positioning = PositioningMode::Absolute;
            None
        }
        CommandHandler::SetRelative => {
            state.coords.positioning = PositioningMode::Relative;
            None
        }
        CommandHandler::SetPosition => {
            state.coords.set_position(command);
            None
        }
        CommandHandler::SetExtruderAbsolute => {
            state.coords.extruder_positioning = PositioningMode::Absolute;
            None
        }
        CommandHandler::SetExtruderRelative => {
            state.coords.extruder_positioning = PositioningMode::Relative;
            None
        }
        CommandHandler::SetFanSpeed => {
            set_fan_speed(command, &mut state.fan_speed);
            None
        }
        CommandHandler::DisableFan => {
            state.fan_speed = 0.0;
            None
        }
        CommandHandler::ResetOrigin => {
            state.coords.reset_origin(command);
            None
        }
        CommandHandler::SelectTool => select_tool(
            command.code,
            &command.name,
            &mut state.extruders,
            &mut state.coords,
        ),
        CommandHandler::SelectToolFromParameter => select_tool(
            tool_parameter(command),
            &command.name,
            &mut state.extruders,
            &mut state.coords,
        ),
        CommandHandler::StorePosition => {
            state.coords.store(state.feedrate);
            None
        }
        CommandHandler::RecallPosition => {
            match state.coords.recall(command) {
                Some(feedrate) => state.feedrate = feedrate,
                None => log::debug!("{} without a stored position", command.name),
            }
            None
        }
    }
}

/// G0/G1: update the target position and feedrate, classify the move
pub fn linear_move(
    command: &Command,
    coords: &mut CoordinateState,
    feedrate: &mut f32,
) -> MoveEvent {
    coords.apply_move(command);

    if let Some(f) = command.value('F') {
        *feedrate = coords.feedrate_from(f);
    }

    let delta_e = coords.delta()[Axis::E.index()];
    let move_type = if delta_e > 0.0 {
        MoveType::Extrude
    } else {
        MoveType::Travel
    };
    MoveEvent::new(move_type, delta_e)
}

/// Length from an explicit `E` word, in millimetres
fn explicit_length(command: &Command, coords: &CoordinateState) -> Option<f32> {
    command
        .value('E')
        .map(|e| (e as f32).abs() * coords.scale())
}

pub fn retract(length: f32) -> MoveEvent {
    MoveEvent::new(MoveType::Retract, -length)
}

pub fn unretract(length: f32) -> MoveEvent {
    MoveEvent::new(MoveType::Unretract, length)
}

pub fn set_units(coords: &mut CoordinateState, units: Units) {
    coords.units = units;
}

/// M106: `S` is 0..255; without `S` the fan runs at full speed
///
/// Only the print cooling fan (no `P`, or `P0`) is tracked.
pub fn set_fan_speed(command: &Command, fan_speed: &mut f32) {
    if let Some(fan) = command.value('P') {
        if fan != 0.0 {
            log::trace!("{} targets fan {}, ignoring", command.name, fan);
            return;
        }
    }

    *fan_speed = match command.value('S') {
        Some(s) => (s as f32 * 100.0 / 255.0).clamp(0.0, 100.0),
        None => 100.0,
    };
}

/// Tool index carried by a `T` parameter (M108 T1, M135 T1)
fn tool_parameter(command: &Command) -> Option<u32> {
    command
        .value('T')
        .filter(|t| *t >= 0.0 && t.fract() == 0.0 && *t <= f64::from(u32::MAX))
        .map(|t| t as u32)
}

/// Switch the active extruder, moving the origin by the offset difference
///
/// Selectors without an index (`Tc`, `T?`) and indexes beyond the
/// configured extruders are ignored.
pub fn select_tool(
    requested: Option<u32>,
    command_name: &str,
    extruders: &mut Extruders,
    coords: &mut CoordinateState,
) -> Option<MoveEvent> {
    let Some(index) = requested else {
        log::debug!("{} carries no tool index, ignoring", command_name);
        return None;
    };

    let index = index as usize;
    if index >= extruders.count() {
        log::warn!(
            "{} selects tool {} but only {} extruder(s) are configured, ignoring",
            command_name,
            index,
            extruders.count()
        );
        return None;
    }

    let old = extruders.offset(extruders.active);
    let new = extruders.offset(index);
    coords.shift_origin([new[0] - old[0], new[1] - old[1], new[2] - old[2]]);
    extruders.active = index;

    Some(MoveEvent::new(MoveType::ToolChange, 0.0))
}
