//! Draw list recording of mesh wireframes under object transforms

use nalgebra::{Matrix4, Vector3};
use primview_core::{Color, Point3f, PolygonMesh};
use primview_gpu::{DrawList, GridAxis, PrimitiveMode};

fn pentagon_and_quad() -> PolygonMesh {
    PolygonMesh::from_parts(
        vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.5, 2.0, 0.0),
        ],
        vec![5, 4],
        vec![0, 1, 4, 2, 3, 0, 1, 2, 3],
    )
}

#[test]
fn test_mesh_wireframe_batch() {
    let mesh = pentagon_and_quad();
    let mut list = DrawList::new();

    list.set_object_transform(&Matrix4::new_translation(&Vector3::new(0.0, 0.0, -2.0)));
    list.prim_begin(PrimitiveMode::Lines, 1.0).unwrap();
    for segment in mesh.wireframe_segments().unwrap() {
        list.prim_vertex(&segment.start, Color::WHITE).unwrap();
        list.prim_vertex(&segment.end, Color::WHITE).unwrap();
    }
    assert_eq!(list.prim_end().unwrap(), 8);
    list.set_object_identity();

    assert_eq!(list.batch_count(), 1);
    assert!(list.lines().iter().all(|v| v.position[2] == -2.0));
    assert!(list.lines().iter().all(|v| v.color == [1.0, 1.0, 1.0, 1.0]));
    // the pentagon loop closes from its fourth vertex back to the first
    assert_eq!(list.lines()[6].position, [1.0, 1.0, -2.0]);
    assert_eq!(list.lines()[7].position, [0.0, 0.0, -2.0]);
}

#[test]
fn test_nested_batch_is_rejected_without_losing_the_open_one() {
    let mut list = DrawList::new();
    list.prim_begin(PrimitiveMode::Lines, 1.0).unwrap();
    list.prim_vertex(&Point3f::origin(), Color::WHITE).unwrap();
    assert!(list.prim_begin(PrimitiveMode::Lines, 1.0).is_err());
    list.prim_vertex(&Point3f::new(1.0, 0.0, 0.0), Color::WHITE).unwrap();
    assert_eq!(list.prim_end().unwrap(), 1);
}

#[test]
fn test_axis_and_grid() {
    let mut list = DrawList::new();
    list.draw_xyz_axis(1.0);
    list.draw_grid(GridAxis::Y, 1.0, 2, Color::GRAY);
    assert!(list.lines().iter().skip(6).all(|v| v.position[1] == 0.0));
    assert!(list.line_segment_count() > 3);
    assert!(!list.is_empty());

    list.clear();
    assert!(list.is_empty());
}
