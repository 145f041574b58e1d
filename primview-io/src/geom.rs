//! Typed views over the geometry prims the viewer draws

use crate::stage::Prim;
use crate::time::TimeCode;
use crate::value::FromValue;
use primview_core::{Color, Point3f, PointCloud3f, PolygonMesh};

const POINTS: &str = "points";
const DISPLAY_COLOR: &str = "primvars:displayColor";

fn read<T: FromValue + Default>(prim: &Prim<'_>, name: &str, time: TimeCode) -> T {
    prim.attribute(name)
        .and_then(|a| a.get_as(time))
        .unwrap_or_default()
}

/// A `Mesh` prim
#[derive(Debug, Clone, Copy)]
pub struct MeshPrim<'a> {
    prim: Prim<'a>,
}

impl<'a> MeshPrim<'a> {
    pub const TYPE_NAME: &'static str = "Mesh";

    /// Wrap `prim` if it is a mesh
    pub fn new(prim: Prim<'a>) -> Option<Self> {
        prim.is_a(Self::TYPE_NAME).then_some(Self { prim })
    }

    pub fn prim(&self) -> Prim<'a> {
        self.prim
    }

    pub fn points(&self, time: TimeCode) -> Vec<Point3f> {
        read(&self.prim, POINTS, time)
    }

    pub fn face_vertex_counts(&self, time: TimeCode) -> Vec<i32> {
        read(&self.prim, "faceVertexCounts", time)
    }

    pub fn face_vertex_indices(&self, time: TimeCode) -> Vec<i32> {
        read(&self.prim, "faceVertexIndices", time)
    }

    pub fn display_color(&self, time: TimeCode) -> Vec<Color> {
        read(&self.prim, DISPLAY_COLOR, time)
    }

    /// Points, face counts and face indices at `time`. Missing arrays are empty.
    pub fn polygon_mesh(&self, time: TimeCode) -> PolygonMesh {
        PolygonMesh::from_parts(
            self.points(time),
            self.face_vertex_counts(time),
            self.face_vertex_indices(time),
        )
    }
}

/// A `Points` prim
#[derive(Debug, Clone, Copy)]
pub struct PointsPrim<'a> {
    prim: Prim<'a>,
}

impl<'a> PointsPrim<'a> {
    pub const TYPE_NAME: &'static str = "Points";

    pub fn new(prim: Prim<'a>) -> Option<Self> {
        prim.is_a(Self::TYPE_NAME).then_some(Self { prim })
    }

    pub fn prim(&self) -> Prim<'a> {
        self.prim
    }

    pub fn points(&self, time: TimeCode) -> PointCloud3f {
        PointCloud3f::from_points(read(&self.prim, POINTS, time))
    }

    pub fn display_color(&self, time: TimeCode) -> Vec<Color> {
        read(&self.prim, DISPLAY_COLOR, time)
    }

    pub fn widths(&self, time: TimeCode) -> Vec<f64> {
        read(&self.prim, "widths", time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{AttributeSpec, Layer, PrimSpec, Specifier};
    use crate::stage::Stage;
    use crate::value::Value;

    fn stage() -> Stage {
        let quad = PrimSpec::new(Specifier::Def, Some("Mesh"), "Quad")
            .with_attribute(AttributeSpec::new("points", "point3f[]").with_default(Value::Vec3Array(vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ])))
            .with_attribute(
                AttributeSpec::new("faceVertexCounts", "int[]").with_default(Value::IntArray(vec![4])),
            )
            .with_attribute(
                AttributeSpec::new("faceVertexIndices", "int[]")
                    .with_default(Value::IntArray(vec![0, 1, 2, 3])),
            );
        let cloud = PrimSpec::new(Specifier::Def, Some("Points"), "Cloud")
            .with_attribute(
                AttributeSpec::new("points", "point3f[]")
                    .with_default(Value::Vec3Array(vec![[0.0, 0.0, 0.0], [0.0, 2.0, 0.0]])),
            )
            .with_attribute(
                AttributeSpec::new(DISPLAY_COLOR, "color3f[]")
                    .with_default(Value::Vec3Array(vec![[0.0, 1.0, 0.0]])),
            );

        let mut layer = Layer::default();
        layer.root_prims.push(quad);
        layer.root_prims.push(cloud);
        Stage::from_layer(layer)
    }

    #[test]
    fn test_mesh_view() {
        let stage = stage();
        let mesh = MeshPrim::new(stage.prim_at("/Quad").unwrap()).unwrap();
        let polygon = mesh.polygon_mesh(TimeCode::Default);
        assert_eq!(polygon.point_count(), 4);
        assert_eq!(polygon.face_count(), 1);
        assert_eq!(polygon.wireframe_segments().unwrap().len(), 4);
        assert!(mesh.display_color(TimeCode::Default).is_empty());
        assert!(MeshPrim::new(stage.prim_at("/Cloud").unwrap()).is_none());
    }

    #[test]
    fn test_points_view() {
        let stage = stage();
        let points = PointsPrim::new(stage.prim_at("/Cloud").unwrap()).unwrap();
        assert_eq!(points.points(TimeCode::Default).len(), 2);
        assert_eq!(points.display_color(TimeCode::Default), vec![Color::GREEN]);
        assert!(points.widths(TimeCode::Default).is_empty());
    }
}
