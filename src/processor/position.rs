//! Coordinate state
//!
//! Start, end and origin positions for the four axes, the positioning
//! modes, the unit system and the single cached-position slot.

use serde::Deserialize;

use crate::parser::Command;

pub const INCHES_TO_MM: f32 = 25.4;
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Machine axis; `E` is the filament feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
    E = 3,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Z, Axis::E];
    pub const SPATIAL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::E => 'E',
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// X, Y, Z, E in millimetres
pub type AxisCoords = [f32; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Millimeters,
    Inches,
}

impl Units {
    /// Factor converting a value in these units to millimetres
    pub fn scale(self) -> f32 {
        match self {
            Units::Millimeters => 1.0,
            Units::Inches => INCHES_TO_MM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositioningMode {
    #[default]
    Absolute,
    Relative,
}

/// Snapshot taken by a store-position command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedPosition {
    pub position: AxisCoords,
    /// mm/s
    pub feedrate: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoordinateState {
    pub units: Units,
    /// Mode of X, Y and Z (and of E unless the extruder mode says otherwise)
    pub positioning: PositioningMode,
    pub extruder_positioning: PositioningMode,
    /// Position at the start of the current command
    pub start: AxisCoords,
    /// Position reached by the current command
    pub end: AxisCoords,
    pub origin: AxisCoords,
    pub cached: Option<CachedPosition>,
}

impl CoordinateState {
    pub fn new(units: Units) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    /// Called once per line before any handler runs
    pub fn begin_line(&mut self) {
        self.start = self.end;
    }

    pub fn scale(&self) -> f32 {
        self.units.scale()
    }

    pub fn is_relative(&self, axis: Axis) -> bool {
        let global = self.positioning == PositioningMode::Relative;
        match axis {
            Axis::E => global || self.extruder_positioning == PositioningMode::Relative,
            _ => global,
        }
    }

    /// Compute `end` from the axis words of a move command
    pub fn apply_move(&mut self, command: &Command) {
        let scale = self.scale();
        for axis in Axis::ALL {
            let a = axis.index();
            self.end[a] = match command.value(axis.letter()) {
                Some(raw) => {
                    let value = raw as f32 * scale;
                    if self.is_relative(axis) {
                        self.start[a] + value
                    } else {
                        self.origin[a] + value
                    }
                }
                None => self.start[a],
            };
        }
    }

    /// Movement of the current command
    pub fn delta(&self) -> AxisCoords {
        let mut delta = [0.0; 4];
        for (a, d) in delta.iter_mut().enumerate() {
            *d = self.end[a] - self.start[a];
        }
        delta
    }

    /// Absolute XYZ position reached
    pub fn position(&self) -> [f32; 3] {
        [self.end[0], self.end[1], self.end[2]]
    }

    /// Make the current position read back as the given values (G92)
    ///
    /// A bare `G92` zeroes every axis; axes not listed keep their origin.
    pub fn set_position(&mut self, command: &Command) {
        if command.parameters.is_empty() {
            self.origin = self.end;
            return;
        }

        let scale = self.scale();
        for axis in Axis::ALL {
            if let Some(raw) = command.value(axis.letter()) {
                let a = axis.index();
                self.origin[a] = self.end[a] - raw as f32 * scale;
            }
        }
    }

    /// Zero the origin of each listed axis (M132)
    pub fn reset_origin(&mut self, command: &Command) {
        for axis in Axis::ALL {
            if command.has(axis.letter()) {
                self.origin[axis.index()] = 0.0;
            }
        }
    }

    /// Shift the XYZ origin, e.g. by a tool offset difference
    pub fn shift_origin(&mut self, delta: [f32; 3]) {
        for (a, d) in delta.into_iter().enumerate() {
            self.origin[a] += d;
        }
    }

    /// Overwrite the cached slot with the current position
    pub fn store(&mut self, feedrate: f32) {
        self.cached = Some(CachedPosition {
            position: self.end,
            feedrate,
        });
    }

    /// Restore the cached position; returns the feedrate to resume with
    ///
    /// Only the listed XYZ axes are restored, or all three when none is
    /// listed; E is always restored. An explicit `F` overrides the cached
    /// feedrate. Returns `None` when nothing has been stored.
    pub fn recall(&mut self, command: &Command) -> Option<f32> {
        let cached = self.cached?;
        let all_spatial = !Axis::SPATIAL.iter().any(|axis| command.has(axis.letter()));

        for axis in Axis::SPATIAL {
            if all_spatial || command.has(axis.letter()) {
                self.end[axis.index()] = cached.position[axis.index()];
            }
        }
        self.end[Axis::E.index()] = cached.position[Axis::E.index()];

        Some(
            command
                .value('F')
                .map_or(cached.feedrate, |f| self.feedrate_from(f)),
        )
    }

    /// Convert an `F` word (units per minute) to mm/s
    pub fn feedrate_from(&self, raw: f64) -> f32 {
        (raw * f64::from(self.scale()) / SECONDS_PER_MINUTE) as f32
    }
}
