//! Frame extraction and inspector rows over the bundled demo scene

use approx::assert_relative_eq;
use primview_gpu::DrawList;
use primview_io::Stage;
use primview_visualization::*;
use std::path::PathBuf;

fn demo_stage() -> Stage {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data/scene.usda");
    Stage::open(&path).unwrap()
}

#[test]
fn test_demo_scene_frame() {
    let stage = demo_stage();
    let mut draw_list = DrawList::new();
    let stats = FrameExtractor::new().extract(&stage, &FrameOptions::default(), &mut draw_list);

    assert_eq!(stats.meshes, 3);
    assert_eq!(stats.points_prims, 1);
    assert_eq!(stats.malformed, 0);
    // cube 6 quads, roof quad + 4 triangles, hexagon capped to one quad loop
    assert_eq!(stats.segments, 24 + 16 + 4);
    assert_eq!(draw_list.line_segment_count(), 3 + stats.segments);
    assert_eq!(draw_list.point_count(), 8 + 5 + 6 + 4);
}

#[test]
fn test_demo_scene_inspector() {
    let stage = demo_stage();

    let rows: Vec<String> = inspector_rows(&stage, "MyMaterial", 0.0)
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        rows,
        vec![
            "/World/Cube - MyMaterial : steel",
            "/World/Roof - MyMaterial : clay",
            "/World/Hexagon -  : ",
        ]
    );

    let later = inspector_rows(&stage, "MyMaterial", 20.0);
    assert_eq!(later[1].value, "slate");

    assert_eq!(time_range(&stage), 0.0..=24.0);
    let summary = StageSummary::of(&stage, 0.0);
    assert_eq!(summary.mesh_count, 3);
    assert_eq!(summary.face_count, 6 + 5 + 1);
}

#[test]
fn test_demo_scene_bounds_and_framing() {
    let stage = demo_stage();
    let (min, max) = scene_bounds(&stage, 0.0).unwrap();
    // stars on top, scaled hexagon at the bottom
    assert_relative_eq!(max.y, 1.9, epsilon = 1e-4);
    assert_relative_eq!(min.y, -1.25 - 0.433, epsilon = 1e-4);

    let mut viewer = InteractiveViewer::new(ViewerConfig::default(), stage);
    viewer.frame_scene();
    assert_relative_eq!(viewer.camera().lookat, nalgebra::center(&min, &max), epsilon = 1e-5);
}
