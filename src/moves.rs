//! Move records produced by the processor
//!
//! [`MoveVertex`] is the immutable output record, [`ProcessorResult`] the
//! ordered, append-only sequence the processor owns until it is taken.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Kind of move a vertex records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    #[default]
    Noop,
    Retract,
    Unretract,
    ToolChange,
    Travel,
    Extrude,
}

impl MoveType {
    pub const ALL: [MoveType; 6] = [
        MoveType::Noop,
        MoveType::Retract,
        MoveType::Unretract,
        MoveType::ToolChange,
        MoveType::Travel,
        MoveType::Extrude,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MoveType::Noop => "noop",
            MoveType::Retract => "retract",
            MoveType::Unretract => "unretract",
            MoveType::ToolChange => "tool_change",
            MoveType::Travel => "travel",
            MoveType::Extrude => "extrude",
        }
    }
}

impl fmt::Display for MoveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Semantic purpose of an extrusion, declared through annotation tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrusionRole {
    #[default]
    None,
    Perimeter,
    ExternalPerimeter,
    OverhangPerimeter,
    InternalInfill,
    SolidInfill,
    TopSolidInfill,
    BridgeInfill,
    GapFill,
    Skirt,
    SupportMaterial,
    SupportMaterialInterface,
    WipeTower,
    Custom,
    Mixed,
}

impl ExtrusionRole {
    pub const ALL: [ExtrusionRole; 15] = [
        ExtrusionRole::None,
        ExtrusionRole::Perimeter,
        ExtrusionRole::ExternalPerimeter,
        ExtrusionRole::OverhangPerimeter,
        ExtrusionRole::InternalInfill,
        ExtrusionRole::SolidInfill,
        ExtrusionRole::TopSolidInfill,
        ExtrusionRole::BridgeInfill,
        ExtrusionRole::GapFill,
        ExtrusionRole::Skirt,
        ExtrusionRole::SupportMaterial,
        ExtrusionRole::SupportMaterialInterface,
        ExtrusionRole::WipeTower,
        ExtrusionRole::Custom,
        ExtrusionRole::Mixed,
    ];

    /// Role for a numeric tag value
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            ExtrusionRole::None => "none",
            ExtrusionRole::Perimeter => "perimeter",
            ExtrusionRole::ExternalPerimeter => "external_perimeter",
            ExtrusionRole::OverhangPerimeter => "overhang_perimeter",
            ExtrusionRole::InternalInfill => "internal_infill",
            ExtrusionRole::SolidInfill => "solid_infill",
            ExtrusionRole::TopSolidInfill => "top_solid_infill",
            ExtrusionRole::BridgeInfill => "bridge_infill",
            ExtrusionRole::GapFill => "gap_fill",
            ExtrusionRole::Skirt => "skirt",
            ExtrusionRole::SupportMaterial => "support_material",
            ExtrusionRole::SupportMaterialInterface => "support_material_interface",
            ExtrusionRole::WipeTower => "wipe_tower",
            ExtrusionRole::Custom => "custom",
            ExtrusionRole::Mixed => "mixed",
        }
    }
}

impl fmt::Display for ExtrusionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExtrusionRole {
    type Err = String;

    /// Accepts a role index or a name in any case, ignoring `_`, `-` and spaces
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(index) = trimmed.parse::<usize>() {
            return Self::from_index(index)
                .ok_or_else(|| format!("extrusion role index {} out of range", index));
        }

        let squash = |name: &str| -> String {
            name.chars()
                .filter(|c| !matches!(c, '_' | '-' | ' '))
                .map(|c| c.to_ascii_lowercase())
                .collect()
        };
        let wanted = squash(trimmed);

        Self::ALL
            .into_iter()
            .find(|role| squash(role.name()) == wanted)
            .ok_or_else(|| format!("unknown extrusion role '{}'", s))
    }
}

/// One recorded machine move
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveVertex {
    #[serde(rename = "type")]
    pub move_type: MoveType,
    pub extrusion_role: ExtrusionRole,
    /// Absolute position reached, mm
    pub position: [f32; 3],
    /// mm/s
    pub feedrate: f32,
    /// mm
    pub width: f32,
    /// mm
    pub height: f32,
    pub mm3_per_mm: f32,
    /// percentage
    pub fan_speed: f32,
    pub extruder_id: usize,
    /// Filament fed by this move, mm (negative when retracting)
    pub delta_extruder: f32,
}

impl fmt::Display for MoveVertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, ({:.3}, {:.3}, {:.3}), {}, {:.3}, {:.3}, {:.3}, {:.5}, {:.3}, {:.5}",
            self.move_type,
            self.extrusion_role,
            self.position[0],
            self.position[1],
            self.position[2],
            self.extruder_id,
            self.feedrate,
            self.width,
            self.height,
            self.mm3_per_mm,
            self.fan_speed,
            self.delta_extruder
        )
    }
}

/// Ordered sequence of recorded moves
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProcessorResult {
    moves: Vec<MoveVertex>,
}

impl ProcessorResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the moves in emission order
    pub fn moves(&self) -> &[MoveVertex] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MoveVertex> {
        self.moves.iter()
    }

    pub(crate) fn push(&mut self, vertex: MoveVertex) {
        self.moves.push(vertex);
    }

    /// Aggregate statistics over the recorded moves
    pub fn summary(&self) -> MoveSummary {
        let mut summary = MoveSummary::default();
        let mut previous: Option<[f32; 3]> = None;

        for vertex in &self.moves {
            summary.count(vertex.move_type);

            let length = previous.map_or(0.0, |p| distance(p, vertex.position));
            match vertex.move_type {
                MoveType::Extrude => {
                    summary.extrude_length += length;
                    summary.extruded_filament += vertex.delta_extruder;
                    match summary
                        .roles
                        .iter_mut()
                        .find(|(role, _)| *role == vertex.extrusion_role)
                    {
                        Some((_, count)) => *count += 1,
                        None => summary.roles.push((vertex.extrusion_role, 1)),
                    }
                }
                MoveType::Travel => summary.travel_length += length,
                _ => {}
            }
            previous = Some(vertex.position);
        }

        summary
    }
}

impl<'a> IntoIterator for &'a ProcessorResult {
    type Item = &'a MoveVertex;
    type IntoIter = std::slice::Iter<'a, MoveVertex>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Statistics over a [`ProcessorResult`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MoveSummary {
    /// Number of moves per type, indexed like [`MoveType::ALL`]
    pub per_type: [usize; 6],
    /// Extrude moves per role, in order of first appearance
    pub roles: Vec<(ExtrusionRole, usize)>,
    /// mm of path length covered while extruding
    pub extrude_length: f32,
    /// mm of path length covered while travelling
    pub travel_length: f32,
    /// mm of filament fed by extrude moves
    pub extruded_filament: f32,
}

impl MoveSummary {
    fn count(&mut self, move_type: MoveType) {
        if let Some(index) = MoveType::ALL.iter().position(|t| *t == move_type) {
            self.per_type[index] += 1;
        }
    }

    /// Number of moves of one type
    pub fn moves_of(&self, move_type: MoveType) -> usize {
        MoveType::ALL
            .iter()
            .position(|t| *t == move_type)
            .map_or(0, |index| self.per_type[index])
    }

    pub fn total_moves(&self) -> usize {
        self.per_type.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(move_type: MoveType, position: [f32; 3], delta_extruder: f32) -> MoveVertex {
        MoveVertex {
            move_type,
            extrusion_role: ExtrusionRole::Perimeter,
            position,
            feedrate: 10.0,
            width: 0.4,
            height: 0.2,
            mm3_per_mm: 0.08,
            fan_speed: 0.0,
            extruder_id: 0,
            delta_extruder,
        }
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("perimeter".parse::<ExtrusionRole>(), Ok(ExtrusionRole::Perimeter));
        assert_eq!("ExternalPerimeter".parse::<ExtrusionRole>(), Ok(ExtrusionRole::ExternalPerimeter));
        assert_eq!("external_perimeter".parse::<ExtrusionRole>(), Ok(ExtrusionRole::ExternalPerimeter));
        assert_eq!("SUPPORT-MATERIAL".parse::<ExtrusionRole>(), Ok(ExtrusionRole::SupportMaterial));
        assert_eq!("9".parse::<ExtrusionRole>(), Ok(ExtrusionRole::Skirt));
        assert!("15".parse::<ExtrusionRole>().is_err());
        assert!("brim".parse::<ExtrusionRole>().is_err());
    }

    #[test]
    fn test_role_names_round_trip() {
        for (index, role) in ExtrusionRole::ALL.into_iter().enumerate() {
            assert_eq!(role.name().parse::<ExtrusionRole>(), Ok(role));
            assert_eq!(ExtrusionRole::from_index(index), Some(role));
        }
    }

    #[test]
    fn test_result_preserves_order() {
        let mut result = ProcessorResult::new();
        result.push(vertex(MoveType::Travel, [1.0, 0.0, 0.0], 0.0));
        result.push(vertex(MoveType::Extrude, [2.0, 0.0, 0.0], 0.1));

        let types: Vec<MoveType> = result.iter().map(|v| v.move_type).collect();
        assert_eq!(types, vec![MoveType::Travel, MoveType::Extrude]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_summary() {
        let mut result = ProcessorResult::new();
        result.push(vertex(MoveType::Travel, [3.0, 4.0, 0.0], 0.0));
        result.push(vertex(MoveType::Extrude, [3.0, 14.0, 0.0], 0.5));
        result.push(vertex(MoveType::Retract, [3.0, 14.0, 0.0], -0.8));

        let summary = result.summary();
        assert_eq!(summary.total_moves(), 3);
        assert_eq!(summary.moves_of(MoveType::Extrude), 1);
        assert_eq!(summary.moves_of(MoveType::ToolChange), 0);
        assert!((summary.extrude_length - 10.0).abs() < 1e-6);
        assert_eq!(summary.travel_length, 0.0);
        assert!((summary.extruded_filament - 0.5).abs() < 1e-6);
        assert_eq!(summary.roles, vec![(ExtrusionRole::Perimeter, 1)]);
    }

    #[test]
    fn test_vertex_serializes_with_type_field() {
        let json = serde_json::to_value(vertex(MoveType::ToolChange, [0.0; 3], 0.0)).unwrap();
        assert_eq!(json["type"], "tool_change");
        assert_eq!(json["extrusion_role"], "perimeter");
    }
}
