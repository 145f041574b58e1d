//! Inspector panel: per-mesh property rows and stage summary

use crate::camera::Camera3D;
use primview_io::{MeshPrim, Stage, TimeCode};
use std::fmt;
use std::ops::RangeInclusive;

/// Time range used when the stage does not declare one
pub const FALLBACK_TIME_RANGE: RangeInclusive<f64> = 0.0..=24.0;

/// One `<path> - <property> : <value>` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorRow {
    pub path: String,
    /// Empty when the prim has no such property
    pub property: String,
    pub value: String,
}

impl fmt::Display for InspectorRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} : {}", self.path, self.property, self.value)
    }
}

/// A row for every mesh prim showing `attribute` at `time`
pub fn inspector_rows(stage: &Stage, attribute: &str, time: f64) -> Vec<InspectorRow> {
    stage
        .traverse()
        .filter_map(MeshPrim::new)
        .map(|mesh| {
            let prim = mesh.prim();
            let (property, value) = match prim.property(attribute) {
                Some(p) => (p.name().to_string(), p.display_value(TimeCode::At(time))),
                None => (String::new(), String::new()),
            };
            InspectorRow {
                path: prim.path().to_string(),
                property,
                value,
            }
        })
        .collect()
}

/// Slider range from the stage's start and end time codes
pub fn time_range(stage: &Stage) -> RangeInclusive<f64> {
    match (stage.start_time_code(), stage.end_time_code()) {
        (Some(start), Some(end)) if start < end => start..=end,
        (Some(start), None) if start < *FALLBACK_TIME_RANGE.end() => {
            start..=*FALLBACK_TIME_RANGE.end()
        }
        _ => FALLBACK_TIME_RANGE,
    }
}

/// Stage facts shown in the "Stage" section
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub file: String,
    pub up_axis: &'static str,
    pub prim_count: usize,
    pub mesh_count: usize,
    pub point_count: usize,
    pub face_count: usize,
    pub time_range: RangeInclusive<f64>,
}

impl StageSummary {
    pub fn of(stage: &Stage, time: f64) -> Self {
        let time_code = TimeCode::At(time);
        let (mesh_count, point_count, face_count) = stage
            .traverse()
            .filter_map(MeshPrim::new)
            .fold((0, 0, 0), |(meshes, points, faces), mesh| {
                (
                    meshes + 1,
                    points + mesh.points(time_code).len(),
                    faces + mesh.face_vertex_counts(time_code).len(),
                )
            });

        Self {
            file: stage
                .source()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<memory>".to_string()),
            up_axis: stage.up_axis().as_str(),
            prim_count: stage.prim_count(),
            mesh_count,
            point_count,
            face_count,
            time_range: time_range(stage),
        }
    }
}

/// State the panel edits directly
#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    pub draw_wire: bool,
    pub time: f64,
    pub show_grid: bool,
}

/// Requests from the panel the viewer acts on after the frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelActions {
    pub reset_camera: bool,
    pub frame_scene: bool,
}

/// Draw the "Panel" window
pub fn show_panel(
    ctx: &egui::Context,
    state: &mut PanelState,
    summary: &StageSummary,
    rows: &[InspectorRow],
    fps: f32,
    camera: &Camera3D,
    initial_size: [f32; 2],
) -> PanelActions {
    let mut actions = PanelActions::default();

    egui::Window::new("Panel")
        .default_size(egui::vec2(initial_size[0], initial_size[1]))
        .show(ctx, |ui| {
            ui.label(format!("fps = {:.1}", fps));
            ui.checkbox(&mut state.draw_wire, "drawwire");
            ui.add(egui::Slider::new(&mut state.time, summary.time_range.clone()).text("time"));

            for row in rows {
                ui.label(row.to_string());
            }

            egui::CollapsingHeader::new("Stage").show(ui, |ui| {
                ui.label(format!("file: {}", summary.file));
                ui.label(format!("up axis: {}", summary.up_axis));
                ui.label(format!("prims: {}", summary.prim_count));
                ui.label(format!("meshes: {}", summary.mesh_count));
                ui.label(format!("points: {}", summary.point_count));
                ui.label(format!("faces: {}", summary.face_count));
                ui.checkbox(&mut state.show_grid, "grid");
            });

            egui::CollapsingHeader::new("Camera").show(ui, |ui| {
                let o = camera.origin;
                let l = camera.lookat;
                ui.label(format!("origin: ({:.2}, {:.2}, {:.2})", o.x, o.y, o.z));
                ui.label(format!("lookat: ({:.2}, {:.2}, {:.2})", l.x, l.y, l.z));
                ui.horizontal(|ui| {
                    actions.reset_camera = ui.button("Reset").clicked();
                    actions.frame_scene = ui.button("Frame").clicked();
                });
            });
        });

    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use primview_io::usda::parse_layer;

    const SCENE: &str = r#"#usda 1.0
(
    startTimeCode = 1
    endTimeCode = 48
)

def Mesh "Tagged"
{
    point3f[] points = [(0, 0, 0), (1, 0, 0), (0, 1, 0)]
    int[] faceVertexCounts = [3]
    int[] faceVertexIndices = [0, 1, 2]
    custom string MyMaterial.timeSamples = {
        1: "clay",
        30: "glass",
    }
}

def Mesh "Plain"
{
    point3f[] points = [(0, 0, 0)]
}

def Xform "NotAMesh"
{
    custom string MyMaterial = "ignored"
}
"#;

    fn stage() -> Stage {
        Stage::from_layer(parse_layer(SCENE).unwrap())
    }

    #[test]
    fn test_rows_follow_time() {
        let stage = stage();
        let rows = inspector_rows(&stage, "MyMaterial", 10.0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].to_string(), "/Tagged - MyMaterial : clay");
        assert_eq!(rows[1].to_string(), "/Plain -  : ");

        let rows = inspector_rows(&stage, "MyMaterial", 40.0);
        assert_eq!(rows[0].value, "glass");
    }

    #[test]
    fn test_rows_for_other_attribute() {
        let stage = stage();
        let rows = inspector_rows(&stage, "faceVertexCounts", 0.0);
        assert_eq!(rows[0].to_string(), "/Tagged - faceVertexCounts : [3]");
    }

    #[test]
    fn test_time_range() {
        assert_eq!(time_range(&stage()), 1.0..=48.0);

        let bare = Stage::from_layer(parse_layer("#usda 1.0\n").unwrap());
        assert_eq!(time_range(&bare), FALLBACK_TIME_RANGE);
    }

    #[test]
    fn test_summary() {
        let summary = StageSummary::of(&stage(), 0.0);
        assert_eq!(summary.prim_count, 3);
        assert_eq!(summary.mesh_count, 2);
        assert_eq!(summary.point_count, 4);
        assert_eq!(summary.face_count, 1);
        assert_eq!(summary.up_axis, "Y");
        assert_eq!(summary.file, "<memory>");
    }
}
