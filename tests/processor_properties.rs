//! End-to-end behaviour of the move processor
use gcode_processor::{ExtrusionRole, GCodeProcessor, MachineConfig, MoveType, MoveVertex};

const EPSILON: f32 = 1e-4;

fn run(content: &str) -> GCodeProcessor {
    let mut processor = GCodeProcessor::new();
    processor.process_str(content);
    processor
}

fn run_with(config: &MachineConfig, content: &str) -> GCodeProcessor {
    let mut processor = GCodeProcessor::with_config(config);
    processor.process_str(content);
    processor
}

fn two_extruders() -> MachineConfig {
    MachineConfig {
        extruder_offsets: vec![[0.0, 0.0, 0.0], [5.0, 0.0, 0.0]],
        ..MachineConfig::default()
    }
}

fn assert_close(a: [f32; 3], b: [f32; 3]) {
    for axis in 0..3 {
        assert!(
            (a[axis] - b[axis]).abs() < EPSILON,
            "positions differ: {:?} vs {:?}",
            a,
            b
        );
    }
}

fn types(moves: &[MoveVertex]) -> Vec<MoveType> {
    moves.iter().map(|m| m.move_type).collect()
}

#[test]
fn test_emitted_count_matches_move_commands() {
    let content = "\
G90
G1 X10 Y10 F3000
G0 X20
M104 S200
G10
G11
G22
G23
G92 E0
T0
T3
Tc
M106 S128
G1 X5 E1
";
    let processor = run(content);
    // G1, G0, G10, G11, G22, G23, T0, G1
    assert_eq!(processor.result().len(), 8);
    assert_eq!(
        types(processor.result().moves()),
        vec![
            MoveType::Travel,
            MoveType::Travel,
            MoveType::Retract,
            MoveType::Unretract,
            MoveType::Retract,
            MoveType::Unretract,
            MoveType::ToolChange,
            MoveType::Extrude,
        ]
    );
    assert!(processor.diagnostics().is_empty());
}

#[test]
fn test_absolute_and_relative_sequences_agree() {
    let absolute = run("G90\nG1 X10 Y10 E1\nG1 X15 Y12 E1.5\nG1 X20 Y20 Z0.5 E3\n");
    let relative = run("G91\nG1 X10 Y10 E1\nG1 X5 Y2 E0.5\nG1 X5 Y8 Z0.5 E1.5\n");

    assert_eq!(absolute.result().len(), relative.result().len());
    for (a, r) in absolute.result().iter().zip(relative.result()) {
        assert_eq!(a.move_type, r.move_type);
        assert_close(a.position, r.position);
        assert!((a.delta_extruder - r.delta_extruder).abs() < EPSILON);
    }
}

#[test]
fn test_positioning_mode_is_idempotent() {
    let once = run("G90\nG1 X1 Y2 E1\nM83\nG1 X3 E1\n");
    let twice = run("G90\nG90\nG1 X1 Y2 E1\nM83\nM83\nG1 X3 E1\n");
    assert_eq!(once.result(), twice.result());
}

#[test]
fn test_extruder_relative_mode_with_absolute_xyz() {
    let processor = run("M83\nG1 X10 E1\nG1 X20 E1\nM82\nG1 X30 E3\n");
    let moves = processor.result().moves();
    assert_eq!(types(moves), vec![MoveType::Extrude; 3]);
    assert_eq!(moves[1].delta_extruder, 1.0);
    assert_eq!(moves[2].delta_extruder, 1.0);
    assert_eq!(moves[2].position, [30.0, 0.0, 0.0]);
}

#[test]
fn test_width_is_sticky_across_other_commands() {
    let processor =
        run(";_WIDTH=0.4\nG1 X1 E1\nM104 S200\nG92 E0\nG10\nG11\n; note\nG1 X2 E1\n");
    let moves = processor.result().moves();
    assert_eq!(moves.len(), 4);
    assert!(moves.iter().all(|m| m.width == 0.4));
}

#[test]
fn test_annotation_after_paren_comment_is_applied() {
    let processor = run("G1 X1 (note) E1 ; _WIDTH=0.4\nG1 X2 E2\n");
    let moves = processor.result().moves();
    assert_eq!(moves[0].width, 0.4);
    assert_eq!(moves[1].width, 0.4);
    assert_eq!(moves[0].delta_extruder, 1.0);
}

#[test]
fn test_set_position_with_unknown_axis_only() {
    let processor = run("G1 X10 Y5\nG92 A0\nG1 X1\n");
    let moves = processor.result().moves();
    assert_eq!(moves[1].position, [1.0, 5.0, 0.0]);
    assert_eq!(processor.state().coords.origin, [0.0; 4]);
}

#[test]
fn test_inch_moves_match_millimeter_moves() {
    let inches = run("G20\nG1 X1 Y2 Z0.5 F100\nG91\nG1 X1 E0.1\n");
    let millimeters = run("G21\nG1 X25.4 Y50.8 Z12.7 F2540\nG91\nG1 X25.4 E2.54\n");

    for (i, m) in inches.result().iter().zip(millimeters.result()) {
        assert_close(i.position, m.position);
        assert!((i.feedrate - m.feedrate).abs() < EPSILON);
        assert!((i.delta_extruder - m.delta_extruder).abs() < EPSILON);
    }
}

#[test]
fn test_travel_then_extrude_scenario() {
    let processor = run("G1 X10 Y0 F3000\nG1 X10 Y10 E1 F1200\n");
    let moves = processor.result().moves();

    assert_eq!(moves.len(), 2);
    assert_eq!(moves[0].move_type, MoveType::Travel);
    assert_eq!(moves[0].position, [10.0, 0.0, 0.0]);
    assert_eq!(moves[0].feedrate, 50.0);
    assert_eq!(moves[1].move_type, MoveType::Extrude);
    assert_eq!(moves[1].position, [10.0, 10.0, 0.0]);
    assert_eq!(moves[1].feedrate, 20.0);
    assert_eq!(processor.state().coords.end[3], 1.0);
}

#[test]
fn test_retract_pair_at_unchanged_position() {
    let processor = run("G1 X5 Y5 E1\nG10\nG11\n");
    let moves = processor.result().moves();

    assert_eq!(
        types(moves),
        vec![MoveType::Extrude, MoveType::Retract, MoveType::Unretract]
    );
    assert_eq!(moves[1].position, moves[0].position);
    assert_eq!(moves[2].position, moves[0].position);
    assert_eq!(moves[1].delta_extruder, -1.0);
    assert_eq!(moves[2].delta_extruder, 1.0);
}

#[test]
fn test_tool_offset_applies_to_following_moves() {
    let processor = run_with(&two_extruders(), "T1\nG1 X0\nT0\nG1 X0\n");
    let moves = processor.result().moves();

    assert_eq!(moves[0].move_type, MoveType::ToolChange);
    assert_eq!(moves[0].extruder_id, 1);
    assert_eq!(moves[1].position[0], 5.0);
    assert_eq!(moves[1].extruder_id, 1);
    assert_eq!(moves[3].position[0], 0.0);
    assert_eq!(moves[3].extruder_id, 0);
}

#[test]
fn test_out_of_range_tool_is_ignored() {
    let processor = run_with(&two_extruders(), "T2\nG1 X1\n");
    let moves = processor.result().moves();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].extruder_id, 0);
    assert_eq!(moves[0].position[0], 1.0);
}

#[test]
fn test_malformed_line_between_extrusions() {
    let processor = run("G1 X1 E1\nG1 X2 Y=3 E2\nG1 X3 E3\n");

    assert_eq!(processor.result().len(), 2);
    assert_eq!(processor.diagnostics().len(), 1);
    assert_eq!(processor.diagnostics()[0].line, 2);
    let moves = processor.result().moves();
    assert_eq!(moves[1].position, [3.0, 0.0, 0.0]);
    assert_eq!(moves[1].delta_extruder, 2.0);
}

#[test]
fn test_each_malformed_kind_is_diagnosed() {
    let processor = run("G1 X1 (unterminated\nG1.x X1\nG1 X1O\nX10 Y10\nG1 X1 @\n");
    assert_eq!(processor.diagnostics().len(), 5);
    assert!(processor.result().is_empty());
}

#[test]
fn test_set_position_on_extruder_keeps_cumulative_delta() {
    let processor = run("G1 X10 E5\nG92 E0\nG1 X20 E1\nG92 X0\nG1 X5\n");
    let moves = processor.result().moves();

    assert_eq!(moves[1].delta_extruder, 1.0);
    assert_eq!(moves[1].move_type, MoveType::Extrude);
    assert_eq!(moves[2].position, [25.0, 0.0, 0.0]);
    assert_eq!(moves[2].move_type, MoveType::Travel);
}

#[test]
fn test_annotations_and_fan_snapshot() {
    let content = "\
;_EXTRUSION_ROLE=Perimeter
;_WIDTH=0.45
;_HEIGHT=0.2
;_MM3_PER_MM=0.0337
M106 S127.5
G1 X1 E1
;_EXTRUSION_ROLE=not-a-role
M107
G1 X2 E2
";
    let processor = run(content);
    let moves = processor.result().moves();

    assert_eq!(moves[0].extrusion_role, ExtrusionRole::Perimeter);
    assert_eq!(moves[0].height, 0.2);
    assert_eq!(moves[0].mm3_per_mm, 0.0337);
    assert!((moves[0].fan_speed - 50.0).abs() < EPSILON);
    assert_eq!(moves[1].extrusion_role, ExtrusionRole::Perimeter);
    assert_eq!(moves[1].fan_speed, 0.0);
}

#[test]
fn test_empty_input() {
    let processor = run("");
    assert!(processor.result().is_empty());
    assert_eq!(processor.lines_processed(), 0);

    let processor = run("\n\n; only comments\n(and this)\n");
    assert!(processor.result().is_empty());
    assert!(processor.diagnostics().is_empty());
}
