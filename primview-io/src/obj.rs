//! Wavefront OBJ support
//!
//! An OBJ file becomes a one-layer stage: a `/root` Xform holding a single
//! prim named after the file stem. Polygons keep their arity, so the mesh
//! carries the same counts + indices layout as a scene mesh. A file with
//! positions but no faces becomes a `Points` prim.

use crate::layer::{AttributeSpec, Layer, PrimSpec, RawValue, Specifier};
use crate::registry::StageReader;
use crate::stage::Stage;
use crate::value::Value;
use crate::IoError;
use obj::{ObjData, SimplePolygon};
use primview_core::Result;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Name of the Xform that parents the imported geometry
pub const ROOT_PRIM: &str = "root";

#[derive(Debug, Default, Clone, Copy)]
pub struct ObjReader;

impl ObjReader {
    /// Parse OBJ text into a layer; `name` becomes the geometry prim's name
    pub fn read_layer<R: Read>(&self, input: R, name: &str) -> std::result::Result<Layer, IoError> {
        let data = ObjData::load_buf(input)?;
        Ok(layer_from_data(&data, &prim_name(name)))
    }
}

impl StageReader for ObjReader {
    fn read_stage(&self, path: &Path) -> Result<Stage> {
        let file = File::open(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let layer = self.read_layer(BufReader::new(file), &stem)?;
        Ok(Stage::from_layer(layer).with_source(path))
    }

    fn can_read(&self, header: &[u8]) -> bool {
        let text = String::from_utf8_lossy(header);
        text.lines().any(|line| {
            let line = line.trim_start();
            line.starts_with("v ") || line.starts_with("mtllib ") || line.starts_with("o ")
        })
    }

    fn format_name(&self) -> &'static str {
        "obj"
    }

    fn extensions(&self) -> &[&'static str] {
        &["obj"]
    }
}

/// Turn a file stem into a valid prim name
fn prim_name(stem: &str) -> String {
    let mut name: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}

/// Every polygon in file order, across objects and groups
fn polygons(data: &ObjData) -> impl Iterator<Item = &SimplePolygon> {
    data.objects
        .iter()
        .flat_map(|object| object.groups.iter())
        .flat_map(|group| group.polys.iter())
}

fn layer_from_data(data: &ObjData, name: &str) -> Layer {
    let points = Value::Vec3Array(
        data.position
            .iter()
            .map(|&[x, y, z]| [x as f64, y as f64, z as f64])
            .collect(),
    );

    let geometry = if polygons(data).next().is_none() {
        PrimSpec::new(Specifier::Def, Some("Points"), name)
            .with_attribute(AttributeSpec::new("points", "point3f[]").with_default(points))
    } else {
        let mut counts = Vec::new();
        let mut indices = Vec::new();
        for SimplePolygon(face) in polygons(data) {
            counts.push(face.len() as i64);
            indices.extend(face.iter().map(|tuple| tuple.0 as i64));
        }
        PrimSpec::new(Specifier::Def, Some("Mesh"), name)
            .with_attribute(AttributeSpec::new("points", "point3f[]").with_default(points))
            .with_attribute(
                AttributeSpec::new("faceVertexCounts", "int[]").with_default(Value::IntArray(counts)),
            )
            .with_attribute(
                AttributeSpec::new("faceVertexIndices", "int[]")
                    .with_default(Value::IntArray(indices)),
            )
    };

    let mut layer = Layer::default();
    layer
        .metadata
        .insert("defaultPrim", RawValue::String(ROOT_PRIM.to_string()));
    layer.metadata.insert("upAxis", RawValue::String("Y".to_string()));
    layer
        .root_prims
        .push(PrimSpec::new(Specifier::Def, Some("Xform"), ROOT_PRIM).with_child(geometry));
    layer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::MeshPrim;
    use crate::time::TimeCode;

    const QUAD_AND_TRI: &str = "\
# two faces
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 2 0 0
vn 0 0 1
f 1//1 2//1 3//1 4//1
f 2 5 3
";

    fn stage(source: &str, name: &str) -> Stage {
        let layer = ObjReader.read_layer(source.as_bytes(), name).unwrap();
        Stage::from_layer(layer)
    }

    #[test]
    fn test_polygons_keep_arity() {
        let stage = stage(QUAD_AND_TRI, "panel");
        let mesh = MeshPrim::new(stage.prim_at("/root/panel").unwrap()).unwrap();
        let polygon = mesh.polygon_mesh(TimeCode::Default);
        assert_eq!(polygon.face_vertex_counts, vec![4, 3]);
        assert_eq!(polygon.face_vertex_indices, vec![0, 1, 2, 3, 1, 4, 2]);
        assert_eq!(polygon.point_count(), 5);
        assert_eq!(polygon.wireframe_segments().unwrap().len(), 7);
        assert_eq!(stage.default_prim().unwrap().name(), ROOT_PRIM);
    }

    #[test]
    fn test_faces_from_every_object_and_group() {
        let source = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
o first
g a
f 1 2 3
g b
f 1 3 4
o second
f 1/1 2/1 3/1 4/1
";
        let stage = stage(source, "parts");
        let mesh = MeshPrim::new(stage.prim_at("/root/parts").unwrap()).unwrap();
        let polygon = mesh.polygon_mesh(TimeCode::Default);
        assert_eq!(polygon.face_vertex_counts, vec![3, 3, 4]);
        assert_eq!(polygon.face_vertex_indices, vec![0, 1, 2, 0, 2, 3, 0, 1, 2, 3]);
    }

    #[test]
    fn test_points_only_file() {
        let stage = stage("v 0 0 0\nv 1 2 3\n", "scan");
        let prim = stage.prim_at("/root/scan").unwrap();
        assert!(prim.is_a("Points"));
    }

    #[test]
    fn test_prim_name_sanitized() {
        assert_eq!(prim_name("my model.v2"), "my_model_v2");
        assert_eq!(prim_name("3d"), "_3d");
    }

    #[test]
    fn test_can_read() {
        assert!(ObjReader.can_read(b"# exported\nv 0 0 0\n"));
        assert!(!ObjReader.can_read(b"#usda 1.0\n"));
    }
}
