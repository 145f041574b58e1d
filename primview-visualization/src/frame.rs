//! Per-frame scene extraction into a draw list
//!
//! Walks the stage at one time code and records the axis gizmo, optional
//! grid, mesh points and wireframes, and point prims. Nothing here touches
//! the GPU so the whole frame can be checked headless.

use log::warn;
use primview_core::{merge_bounds, Bounds3, Color, LineSegment, Point3f, Result, Transform3D};
use primview_gpu::{DrawList, GridAxis, PrimitiveMode};
use primview_io::{MeshPrim, PointsPrim, Prim, Stage, TimeCode, UpAxis};
use std::collections::HashSet;

pub const MESH_POINT_COLOR: Color = Color::RED;
pub const MESH_POINT_SIZE: f32 = 2.0;
pub const WIRE_COLOR: Color = Color::WHITE;
pub const WIRE_WIDTH: f32 = 1.0;
pub const AXIS_LENGTH: f32 = 1.0;

/// What to draw this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOptions {
    pub time: f64,
    pub draw_wire: bool,
    pub show_grid: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            time: 0.0,
            draw_wire: true,
            show_grid: false,
        }
    }
}

/// Counts gathered while extracting a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub meshes: usize,
    pub points_prims: usize,
    pub points: usize,
    pub segments: usize,
    /// Prims skipped or cut short because their data was malformed
    pub malformed: usize,
}

/// Records frames, warning once per prim about malformed data
#[derive(Debug, Default)]
pub struct FrameExtractor {
    warned: HashSet<String>,
}

impl FrameExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn warn_once(&mut self, prim: &Prim<'_>, message: impl std::fmt::Display) {
        if self.warned.insert(prim.path().to_string()) {
            warn!("{}: {}", prim.path(), message);
        }
    }

    /// Clear `draw_list` and record the stage at `options.time`
    pub fn extract(
        &mut self,
        stage: &Stage,
        options: &FrameOptions,
        draw_list: &mut DrawList,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        let time = TimeCode::At(options.time);

        draw_list.clear();
        draw_list.push_graphic_state();
        draw_list.draw_xyz_axis(AXIS_LENGTH);
        if options.show_grid {
            let axis = match stage.up_axis() {
                UpAxis::Y => GridAxis::Y,
                UpAxis::Z => GridAxis::Z,
            };
            draw_list.draw_grid(axis, 1.0, 10, Color::GRAY);
        }

        if options.draw_wire {
            for prim in stage.traverse() {
                if let Some(mesh) = MeshPrim::new(prim) {
                    self.draw_mesh(mesh, time, draw_list, &mut stats);
                } else if let Some(points) = PointsPrim::new(prim) {
                    self.draw_points(points, time, draw_list, &mut stats);
                }
            }
        }

        if let Err(e) = draw_list.pop_graphic_state() {
            warn!("{}", e);
        }
        stats
    }

    fn draw_mesh(
        &mut self,
        mesh: MeshPrim<'_>,
        time: TimeCode,
        draw_list: &mut DrawList,
        stats: &mut FrameStats,
    ) {
        let prim = mesh.prim();
        let transform = match prim.local_to_world(time) {
            Ok(matrix) => matrix.cast::<f32>(),
            Err(e) => {
                self.warn_once(&prim, e);
                stats.malformed += 1;
                return;
            }
        };

        let polygon = mesh.polygon_mesh(time);
        stats.meshes += 1;
        stats.points += polygon.point_count();

        draw_list.set_object_transform(&transform);
        draw_list.draw_points(polygon.points.iter(), MESH_POINT_COLOR, MESH_POINT_SIZE);

        if let Err(e) = draw_list.prim_begin(PrimitiveMode::Lines, WIRE_WIDTH) {
            warn!("{}", e);
        } else {
            for segment in polygon.wireframe() {
                match segment {
                    Ok(segment) => {
                        if let Err(e) = push_segment(draw_list, &segment) {
                            warn!("{}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        self.warn_once(&prim, e);
                        stats.malformed += 1;
                    }
                }
            }
            match draw_list.prim_end() {
                Ok(segments) => stats.segments += segments,
                Err(e) => warn!("{}", e),
            }
        }

        draw_list.set_object_identity();
    }

    fn draw_points(
        &mut self,
        points: PointsPrim<'_>,
        time: TimeCode,
        draw_list: &mut DrawList,
        stats: &mut FrameStats,
    ) {
        let prim = points.prim();
        let transform = match prim.local_to_world(time) {
            Ok(matrix) => matrix.cast::<f32>(),
            Err(e) => {
                self.warn_once(&prim, e);
                stats.malformed += 1;
                return;
            }
        };

        let cloud = points.points(time);
        let colors = points.display_color(time);
        stats.points_prims += 1;
        stats.points += cloud.len();

        draw_list.set_object_transform(&transform);
        for point in cloud.with_colors(&colors, MESH_POINT_COLOR).iter() {
            draw_list.draw_point(&point.position, point.color, MESH_POINT_SIZE);
        }
        draw_list.set_object_identity();
    }
}

fn push_segment(draw_list: &mut DrawList, segment: &LineSegment) -> Result<()> {
    draw_list.prim_vertex(&segment.start, WIRE_COLOR)?;
    draw_list.prim_vertex(&segment.end, WIRE_COLOR)
}

/// World-space bounds of every drawable prim at `time`
pub fn scene_bounds(stage: &Stage, time: f64) -> Option<(Point3f, Point3f)> {
    let time = TimeCode::At(time);
    stage.traverse().fold(None, |bounds, prim| {
        let Ok(world) = prim.local_to_world(time) else {
            return bounds;
        };
        let transform = Transform3D::from_f64(&world);
        let local = if let Some(mesh) = MeshPrim::new(prim) {
            mesh.polygon_mesh(time).transformed_bounding_box(&transform)
        } else if let Some(points) = PointsPrim::new(prim) {
            points.points(time).transformed_bounding_box(&transform)
        } else {
            None
        };
        merge_bounds(bounds, local)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use primview_io::usda::parse_layer;

    const SCENE: &str = r#"#usda 1.0
(
    upAxis = "Z"
)

def Xform "World"
{
    double3 xformOp:translate.timeSamples = {
        0: (0, 0, 0),
        10: (10, 0, 0),
    }
    uniform token[] xformOpOrder = ["xformOp:translate"]

    def Mesh "Quad"
    {
        point3f[] points = [(0, 0, 0), (1, 0, 0), (1, 1, 0), (0, 1, 0)]
        int[] faceVertexCounts = [4]
        int[] faceVertexIndices = [0, 1, 2, 3]
    }

    def Points "Cloud"
    {
        point3f[] points = [(0, 0, 5), (0, 0, 6)]
        color3f[] primvars:displayColor = [(0, 1, 0)]
    }
}
"#;

    fn stage(source: &str) -> Stage {
        Stage::from_layer(parse_layer(source).unwrap())
    }

    #[test]
    fn test_extract_mesh_and_points() {
        let stage = stage(SCENE);
        let mut draw_list = DrawList::new();
        let stats = FrameExtractor::new().extract(&stage, &FrameOptions::default(), &mut draw_list);

        assert_eq!(stats.meshes, 1);
        assert_eq!(stats.points_prims, 1);
        assert_eq!(stats.points, 6);
        assert_eq!(stats.segments, 4);
        assert_eq!(stats.malformed, 0);

        // axis (3 segments) + quad loop
        assert_eq!(draw_list.line_segment_count(), 7);
        assert_eq!(draw_list.point_count(), 6);

        let points = draw_list.points();
        assert_eq!(points[0].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(points[0].size, MESH_POINT_SIZE);
        assert_eq!(points[4].color, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_extract_applies_time_sampled_transform() {
        let stage = stage(SCENE);
        let mut draw_list = DrawList::new();
        let options = FrameOptions {
            time: 5.0,
            ..Default::default()
        };
        FrameExtractor::new().extract(&stage, &options, &mut draw_list);

        // first mesh point (0,0,0) moved halfway along the animated translate
        assert_relative_eq!(draw_list.points()[0].position[0], 5.0, epsilon = 1e-5);
        assert_eq!(draw_list.object_transform(), &nalgebra::Matrix4::<f32>::identity());
    }

    #[test]
    fn test_draw_wire_off_keeps_axis_only() {
        let stage = stage(SCENE);
        let mut draw_list = DrawList::new();
        let options = FrameOptions {
            draw_wire: false,
            show_grid: false,
            time: 0.0,
        };
        let stats = FrameExtractor::new().extract(&stage, &options, &mut draw_list);

        assert_eq!(stats, FrameStats::default());
        assert_eq!(draw_list.line_segment_count(), 3);
        assert_eq!(draw_list.point_count(), 0);
    }

    #[test]
    fn test_malformed_mesh_keeps_earlier_faces() {
        let stage = stage(
            r#"#usda 1.0
def Mesh "Broken"
{
    point3f[] points = [(0, 0, 0), (1, 0, 0), (1, 1, 0)]
    int[] faceVertexCounts = [3, 3]
    int[] faceVertexIndices = [0, 1, 2, 0, 1, 9]
}
"#,
        );
        let mut extractor = FrameExtractor::new();
        let mut draw_list = DrawList::new();
        let stats = extractor.extract(&stage, &FrameOptions::default(), &mut draw_list);

        // first face, then the one good edge of the second
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.segments, 4);
        assert_eq!(extractor.warned.len(), 1);

        extractor.extract(&stage, &FrameOptions::default(), &mut draw_list);
        assert_eq!(extractor.warned.len(), 1);
    }

    #[test]
    fn test_push_segment_needs_open_batch() {
        let mut draw_list = DrawList::new();
        let segment = LineSegment::new(Point3f::origin(), Point3f::new(1.0, 0.0, 0.0));
        assert!(push_segment(&mut draw_list, &segment).is_err());

        draw_list.prim_begin(PrimitiveMode::Lines, WIRE_WIDTH).unwrap();
        push_segment(&mut draw_list, &segment).unwrap();
        assert_eq!(draw_list.prim_end().unwrap(), 1);
        assert_eq!(draw_list.lines()[1].color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_scene_bounds() {
        let stage = stage(SCENE);
        let (min, max) = scene_bounds(&stage, 10.0).unwrap();
        assert_relative_eq!(min, Point3f::new(10.0, 0.0, 0.0));
        assert_relative_eq!(max, Point3f::new(11.0, 1.0, 6.0));
    }
}
