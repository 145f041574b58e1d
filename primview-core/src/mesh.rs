//! Polygon meshes and wireframe extraction
//!
//! Meshes are kept in the layout scene descriptions use: a point array, one
//! vertex count per face and a flattened vertex index buffer holding one run
//! of indices per face. Faces may have any number of vertices.

use crate::error::Error;
use crate::point::*;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Maximum number of vertices of a face that take part in its wireframe loop
pub const MAX_LOOP_VERTICES: usize = 4;

/// A polygon mesh with arbitrary face arity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonMesh {
    pub points: Vec<Point3f>,
    pub face_vertex_counts: Vec<i32>,
    pub face_vertex_indices: Vec<i32>,
}

impl PolygonMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from its three arrays
    pub fn from_parts(
        points: Vec<Point3f>,
        face_vertex_counts: Vec<i32>,
        face_vertex_indices: Vec<i32>,
    ) -> Self {
        Self {
            points,
            face_vertex_counts,
            face_vertex_indices,
        }
    }

    /// Get the number of points
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.face_vertex_counts.len()
    }

    /// Check if the mesh has nothing to draw
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Upper bound on the number of wireframe segments, for preallocation
    pub fn wireframe_segment_hint(&self) -> usize {
        self.face_vertex_counts
            .iter()
            .map(|&n| (n.max(0) as usize).min(MAX_LOOP_VERTICES))
            .sum()
    }

    /// Iterate the wireframe of the mesh in local space.
    ///
    /// Each face contributes a closed loop over its first `min(count, 4)`
    /// vertices; the index cursor always advances by the face's full count.
    /// The iterator yields a single `Err` at the first malformed face and
    /// then stops, so callers keep everything produced before it.
    pub fn wireframe(&self) -> WireframeEdges<'_> {
        WireframeEdges {
            mesh: self,
            face: 0,
            cursor: 0,
            face_start: 0,
            loop_len: 0,
            edge: 0,
            finished: false,
        }
    }

    /// Collect the whole wireframe, failing on the first malformed face
    pub fn wireframe_segments(&self) -> Result<Vec<LineSegment>> {
        let mut segments = Vec::with_capacity(self.wireframe_segment_hint());
        for segment in self.wireframe() {
            segments.push(segment?);
        }
        Ok(segments)
    }

    /// Check every face, including vertices beyond the wireframe loop
    pub fn validate(&self) -> Result<()> {
        let mut cursor = 0usize;
        for (face, &count) in self.face_vertex_counts.iter().enumerate() {
            let count = face_count_to_usize(face, count)?;
            let end = cursor + count;
            if end > self.face_vertex_indices.len() {
                return Err(Error::malformed(
                    face,
                    format!(
                        "face needs indices {}..{} but only {} are present",
                        cursor,
                        end,
                        self.face_vertex_indices.len()
                    ),
                ));
            }
            for &index in &self.face_vertex_indices[cursor..end] {
                self.resolve_index(face, index)?;
            }
            cursor = end;
        }
        if cursor != self.face_vertex_indices.len() {
            return Err(Error::InvalidData(format!(
                "face counts cover {} indices but {} are present",
                cursor,
                self.face_vertex_indices.len()
            )));
        }
        Ok(())
    }

    fn resolve_index(&self, face: usize, index: i32) -> Result<Point3f> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.points.get(i).copied())
            .ok_or_else(|| {
                Error::malformed(
                    face,
                    format!("vertex index {} outside 0..{}", index, self.points.len()),
                )
            })
    }
}

fn face_count_to_usize(face: usize, count: i32) -> Result<usize> {
    usize::try_from(count)
        .map_err(|_| Error::malformed(face, format!("negative vertex count {}", count)))
}

/// Iterator over the wireframe segments of a [`PolygonMesh`]
pub struct WireframeEdges<'a> {
    mesh: &'a PolygonMesh,
    face: usize,
    cursor: usize,
    face_start: usize,
    loop_len: usize,
    edge: usize,
    finished: bool,
}

impl<'a> WireframeEdges<'a> {
    fn fail(&mut self, error: Error) -> Option<Result<LineSegment>> {
        self.finished = true;
        Some(Err(error))
    }

    /// Move to the next face with a non-empty loop. Returns false when the
    /// mesh is exhausted.
    fn start_next_face(&mut self) -> Result<bool> {
        while self.face < self.mesh.face_vertex_counts.len() {
            let face = self.face;
            let count = face_count_to_usize(face, self.mesh.face_vertex_counts[face])?;
            let end = self.cursor + count;
            if end > self.mesh.face_vertex_indices.len() {
                return Err(Error::malformed(
                    face,
                    format!(
                        "face needs indices {}..{} but only {} are present",
                        self.cursor,
                        end,
                        self.mesh.face_vertex_indices.len()
                    ),
                ));
            }

            self.face_start = self.cursor;
            self.loop_len = count.min(MAX_LOOP_VERTICES);
            self.edge = 0;
            self.cursor = end;
            self.face += 1;

            if self.loop_len > 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<'a> Iterator for WireframeEdges<'a> {
    type Item = Result<LineSegment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if self.edge >= self.loop_len {
            match self.start_next_face() {
                Ok(true) => {}
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => return self.fail(e),
            }
        }

        // `face` was already advanced past the face being looped
        let face = self.face - 1;
        let i = self.edge;
        self.edge += 1;

        let indices = &self.mesh.face_vertex_indices;
        let i0 = indices[self.face_start + i];
        let i1 = indices[self.face_start + (i + 1) % self.loop_len];

        let segment = self
            .mesh
            .resolve_index(face, i0)
            .and_then(|p0| self.mesh.resolve_index(face, i1).map(|p1| LineSegment::new(p0, p1)));

        match segment {
            Ok(segment) => Some(Ok(segment)),
            Err(e) => self.fail(e),
        }
    }
}

impl<'a> std::iter::FusedIterator for WireframeEdges<'a> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_and_triangle() -> PolygonMesh {
        PolygonMesh::from_parts(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(2.0, 0.0, 0.0),
            ],
            vec![4, 3],
            vec![0, 1, 2, 3, 1, 4, 2],
        )
    }

    fn ends(segments: &[LineSegment], points: &[Point3f]) -> Vec<(usize, usize)> {
        let index_of = |p: &Point3f| points.iter().position(|q| q == p).unwrap();
        segments
            .iter()
            .map(|s| (index_of(&s.start), index_of(&s.end)))
            .collect()
    }

    #[test]
    fn test_quad_and_triangle_loops() {
        let mesh = quad_and_triangle();
        let segments = mesh.wireframe_segments().unwrap();
        assert_eq!(
            ends(&segments, &mesh.points),
            vec![(0, 1), (1, 2), (2, 3), (3, 0), (1, 4), (4, 2), (2, 1)]
        );
        assert_eq!(mesh.wireframe_segment_hint(), 7);
    }

    #[test]
    fn test_large_faces_are_capped_but_cursor_advances_fully() {
        let points: Vec<Point3f> = (0..8).map(|i| Point3f::new(i as f32, 0.0, 0.0)).collect();
        // A hexagon followed by a triangle.
        let mesh = PolygonMesh::from_parts(
            points.clone(),
            vec![6, 3],
            vec![0, 1, 2, 3, 4, 5, 5, 6, 7],
        );
        let segments = mesh.wireframe_segments().unwrap();
        assert_eq!(
            ends(&segments, &points),
            vec![(0, 1), (1, 2), (2, 3), (3, 0), (5, 6), (6, 7), (7, 5)]
        );
    }

    #[test]
    fn test_small_faces() {
        let points = vec![Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 0.0, 0.0)];
        let mesh = PolygonMesh::from_parts(points.clone(), vec![0, 1, 2], vec![0, 0, 1]);
        let segments = mesh.wireframe_segments().unwrap();

        assert_eq!(segments.len(), 3);
        assert!(segments[0].is_degenerate());
        assert_eq!(ends(&segments[1..], &points), vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_out_of_range_index_stops_after_good_faces() {
        let mut mesh = quad_and_triangle();
        mesh.face_vertex_indices[5] = 42;

        let items: Vec<_> = mesh.wireframe().collect();
        assert_eq!(items.len(), 5);
        assert!(items[..4].iter().all(|s| s.is_ok()));
        match &items[4] {
            Err(Error::MalformedMesh { face, .. }) => assert_eq!(*face, 1),
            other => panic!("expected malformed mesh error, got {:?}", other),
        }
        assert!(mesh.wireframe_segments().is_err());
    }

    #[test]
    fn test_negative_vertex_index_is_malformed() {
        let points = vec![Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 0.0, 0.0)];
        let mesh = PolygonMesh::from_parts(points, vec![3], vec![0, -1, 1]);

        let items: Vec<_> = mesh.wireframe().collect();
        assert_eq!(items.len(), 1);
        match &items[0] {
            Err(e @ Error::MalformedMesh { face: 0, .. }) => {
                assert!(e.to_string().contains("vertex index -1"));
            }
            other => panic!("expected malformed mesh error, got {:?}", other),
        }
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_truncated_index_buffer_and_negative_count() {
        let mut mesh = quad_and_triangle();
        mesh.face_vertex_indices.truncate(5);
        let items: Vec<_> = mesh.wireframe().collect();
        assert_eq!(items.len(), 5);
        assert!(items[4].is_err());

        let mesh = PolygonMesh::from_parts(vec![Point3f::origin()], vec![-1], vec![]);
        assert!(matches!(
            mesh.wireframe().next(),
            Some(Err(Error::MalformedMesh { face: 0, .. }))
        ));
    }

    #[test]
    fn test_validate_checks_hidden_vertices() {
        assert!(quad_and_triangle().validate().is_ok());

        // The sixth vertex of a hexagon is never drawn but is still checked.
        let points: Vec<Point3f> = (0..5).map(|i| Point3f::new(i as f32, 0.0, 0.0)).collect();
        let mesh = PolygonMesh::from_parts(points, vec![6], vec![0, 1, 2, 3, 4, 9]);
        assert!(mesh.wireframe_segments().is_ok());
        assert!(mesh.validate().is_err());

        let leftover = PolygonMesh::from_parts(vec![Point3f::origin()], vec![1], vec![0, 0]);
        assert!(matches!(leftover.validate(), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = PolygonMesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.wireframe().count(), 0);
    }
}
