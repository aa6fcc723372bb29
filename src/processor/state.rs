//! Processor state shared by the command handlers

use super::annotation::Annotations;
use super::position::CoordinateState;
use crate::config::MachineConfig;

/// Active extruder and the configured nozzle offsets
#[derive(Debug, Clone, PartialEq)]
pub struct Extruders {
    pub active: usize,
    /// One XYZ offset per extruder, never empty
    pub offsets: Vec<[f32; 3]>,
}

impl Default for Extruders {
    fn default() -> Self {
        Self {
            active: 0,
            offsets: vec![[0.0; 3]],
        }
    }
}

impl Extruders {
    pub fn new(offsets: &[[f32; 3]]) -> Self {
        if offsets.is_empty() {
            return Self::default();
        }
        Self {
            active: 0,
            offsets: offsets.to_vec(),
        }
    }

    pub fn count(&self) -> usize {
        self.offsets.len()
    }

    pub fn offset(&self, index: usize) -> [f32; 3] {
        self.offsets.get(index).copied().unwrap_or([0.0; 3])
    }
}

/// Everything a pass mutates, owned exclusively by one processor
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorState {
    pub coords: CoordinateState,
    pub annotations: Annotations,
    /// mm/s
    pub feedrate: f32,
    /// percentage
    pub fan_speed: f32,
    pub extruders: Extruders,
    /// Firmware-retract length, mm
    pub retract_length: f32,
}

impl ProcessorState {
    /// Freshly reset state for a machine
    pub fn new(config: &MachineConfig) -> Self {
        Self {
            coords: CoordinateState::new(config.units),
            annotations: Annotations::default(),
            feedrate: 0.0,
            fan_speed: 0.0,
            extruders: Extruders::new(&config.extruder_offsets),
            retract_length: config.retract_length,
        }
    }
}

impl Default for ProcessorState {
    fn default() -> Self {
        Self::new(&MachineConfig::default())
    }
}
