//! Integration tests for primview-io
//!
//! These tests open complete layers from disk and check that traversal,
//! attribute resolution and transforms agree with each other.

use approx::assert_relative_eq;
use nalgebra::Point3;
use primview_io::*;
use std::fs;
use std::path::PathBuf;

const ANIMATED_LAYER: &str = r#"#usda 1.0
(
    defaultPrim = "World"
    upAxis = "Y"
    startTimeCode = 0
    endTimeCode = 24
    metersPerUnit = 1
)

def Xform "World"
{
    double3 xformOp:translate.timeSamples = {
        0: (0, 0, 0),
        24: (0, 12, 0),
    }
    uniform token[] xformOpOrder = ["xformOp:translate"]

    def Mesh "Box" (
        kind = "component"
    )
    {
        point3f[] points = [(0, 0, 0), (1, 0, 0), (1, 1, 0), (0, 1, 0), (0.5, 2, 0)]
        int[] faceVertexCounts = [4, 5]
        int[] faceVertexIndices = [0, 1, 2, 3, 0, 1, 4, 3, 2]
        custom string MyMaterial.timeSamples = {
            0: "wood",
            12: "steel",
        }
        double3 xformOp:scale = (2, 2, 2)
        uniform token[] xformOpOrder = ["xformOp:scale"]
    }

    def Points "Cloud"
    {
        point3f[] points = [(0, 0, 0), (0, 0, 1)]
        color3f[] primvars:displayColor = [(0, 0, 1)] (interpolation = "constant")
    }

    def Mesh "Disabled" (active = false)
    {
        point3f[] points = [(0, 0, 0)]
    }
}

class "Prototype"
{
}
"#;

fn write_fixture(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("primview_io_{}_{}", std::process::id(), name));
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_open_usda_stage() {
    let path = write_fixture("animated.usda", ANIMATED_LAYER);
    let stage = Stage::open(&path).unwrap();

    assert_eq!(stage.up_axis(), UpAxis::Y);
    assert_eq!(stage.start_time_code(), Some(0.0));
    assert_eq!(stage.end_time_code(), Some(24.0));
    assert_eq!(stage.meters_per_unit(), 1.0);
    assert_eq!(stage.default_prim().unwrap().path().as_str(), "/World");

    let visited: Vec<String> = stage.traverse().map(|p| p.path().to_string()).collect();
    assert_eq!(visited, vec!["/World", "/World/Box", "/World/Cloud"]);

    let _ = fs::remove_file(path);
}

#[test]
fn test_mesh_wireframe_and_material_over_time() {
    let path = write_fixture("material.usda", ANIMATED_LAYER);
    let stage = open_stage(&path).unwrap();
    let mesh_prims: Vec<MeshPrim> = stage.traverse().filter_map(MeshPrim::new).collect();
    assert_eq!(mesh_prims.len(), 1);

    let mesh = mesh_prims[0];
    let polygon = mesh.polygon_mesh(TimeCode::At(0.0));
    assert!(polygon.validate().is_ok());
    // quad loop (4) + pentagon capped to its first four vertices (4)
    assert_eq!(polygon.wireframe_segments().unwrap().len(), 8);

    let material = mesh.prim().attribute("MyMaterial").unwrap();
    assert_eq!(material.get_as::<String>(TimeCode::At(6.0)).as_deref(), Some("wood"));
    assert_eq!(material.get_as::<String>(TimeCode::At(18.0)).as_deref(), Some("steel"));
    assert_eq!(mesh.prim().kind(), Some("component"));

    let _ = fs::remove_file(path);
}

#[test]
fn test_animated_local_to_world() {
    let path = write_fixture("xform.usda", ANIMATED_LAYER);
    let stage = Stage::open(&path).unwrap();
    let mesh = stage.prim_at("/World/Box").unwrap();

    let at_start = mesh.local_to_world(TimeCode::At(0.0)).unwrap();
    let halfway = mesh.local_to_world(TimeCode::At(12.0)).unwrap();

    // Scale by 2 locally, then the parent's animated translate.
    assert_relative_eq!(
        at_start.transform_point(&Point3::new(1.0, 1.0, 0.0)),
        Point3::new(2.0, 2.0, 0.0),
        epsilon = 1e-9
    );
    assert_relative_eq!(
        halfway.transform_point(&Point3::new(1.0, 1.0, 0.0)),
        Point3::new(2.0, 8.0, 0.0),
        epsilon = 1e-9
    );

    let _ = fs::remove_file(path);
}

#[test]
fn test_points_prim_colors() {
    let path = write_fixture("points.usda", ANIMATED_LAYER);
    let stage = Stage::open(&path).unwrap();
    let cloud = PointsPrim::new(stage.prim_at("/World/Cloud").unwrap()).unwrap();
    assert_eq!(cloud.points(TimeCode::Default).len(), 2);
    assert_eq!(cloud.display_color(TimeCode::Default), vec![primview_core::Color::BLUE]);
    let attr = cloud.prim().attribute("primvars:displayColor").unwrap();
    assert_eq!(attr.interpolation(), Some("constant"));

    let _ = fs::remove_file(path);
}

#[test]
fn test_open_obj_stage() {
    let path = write_fixture("tri.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
    let stage = Stage::open(&path).unwrap();
    let name = path.file_stem().unwrap().to_string_lossy().into_owned();
    let prim = stage
        .traverse()
        .find(|p| p.is_a("Mesh"))
        .expect("mesh prim");
    assert_eq!(prim.parent().unwrap().path().as_str(), "/root");
    assert_eq!(prim.name(), name);

    let _ = fs::remove_file(path);
}

#[test]
fn test_parse_error_is_reported() {
    let path = write_fixture("broken.usda", "#usda 1.0\ndef Mesh \"Broken\" {\n    int[] faceVertexCounts = [4,\n");
    let err = Stage::open(&path).unwrap_err();
    assert!(err.to_string().contains("Parse error"), "got {}", err);

    let _ = fs::remove_file(path);
}

#[test]
fn test_matrix_transform_samples_interpolate() {
    let layer = usda::parse_layer(
        r#"#usda 1.0
def Xform "Rig"
{
    matrix4d xformOp:transform.timeSamples = {
        0: ( (1, 0, 0, 0), (0, 1, 0, 0), (0, 0, 1, 0), (0, 0, 0, 1) ),
        10: ( (3, 0, 0, 0), (0, 1, 0, 0), (0, 0, 1, 0), (10, 4, 0, 1) ),
    }
    uniform token[] xformOpOrder = ["xformOp:transform"]
}
"#,
    )
    .unwrap();
    let stage = Stage::from_layer(layer);
    let rig = stage.prim_at("/Rig").unwrap();

    let attr = rig.attribute("xformOp:transform").unwrap();
    let halfway = match attr.get(TimeCode::At(5.0)) {
        Some(Value::Matrix4(m)) => m,
        other => panic!("expected a matrix, got {:?}", other),
    };
    assert_relative_eq!(halfway[(0, 0)], 2.0, epsilon = 1e-12);
    assert_relative_eq!(halfway[(0, 3)], 5.0, epsilon = 1e-12);
    assert_relative_eq!(halfway[(1, 3)], 2.0, epsilon = 1e-12);

    let world = rig.local_to_world(TimeCode::At(5.0)).unwrap();
    assert_relative_eq!(
        world.transform_point(&Point3::new(1.0, 0.0, 0.0)),
        Point3::new(7.0, 2.0, 0.0),
        epsilon = 1e-9
    );
}
