//! Immediate-mode draw recording
//!
//! A [`DrawList`] collects one frame of points and line batches. Calls mirror
//! a classic immediate API: set an object transform, begin a primitive batch,
//! push vertices, end it. Geometry is transformed to world space on the way
//! in, so the GPU only needs the camera's view-projection.

use bytemuck::{Pod, Zeroable};
use log::warn;
use nalgebra::{Matrix4, Point3};
use primview_core::{Color, Error, Point3f, Result};

/// Line vertex as uploaded to the GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    pub fn new(position: Point3f, color: Color) -> Self {
        let [r, g, b] = color.to_f32();
        Self {
            position: [position.x, position.y, position.z],
            color: [r, g, b, 1.0],
        }
    }

    /// Vertex buffer layout descriptor
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// One point sprite, drawn as an instanced screen-space quad
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    /// Size in pixels
    pub size: f32,
    pub color: [f32; 4],
}

impl PointInstance {
    pub fn new(position: Point3f, color: Color, size: f32) -> Self {
        let [r, g, b] = color.to_f32();
        Self {
            position: [position.x, position.y, position.z],
            size,
            color: [r, g, b, 1.0],
        }
    }

    /// Instance buffer layout descriptor
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Size
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// How vertices of a batch are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveMode {
    /// Independent segments from vertex pairs
    Lines,
    /// Each vertex connects to the previous one
    LineStrip,
}

/// Axis normal to a grid plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAxis {
    X,
    Y,
    Z,
}

#[derive(Debug, Clone)]
struct Batch {
    mode: PrimitiveMode,
    vertices: Vec<LineVertex>,
}

#[derive(Debug, Clone, Copy)]
struct GraphicState {
    object_transform: Matrix4<f32>,
}

/// One frame of recorded draw calls
#[derive(Debug, Clone)]
pub struct DrawList {
    lines: Vec<LineVertex>,
    points: Vec<PointInstance>,
    object_transform: Matrix4<f32>,
    state_stack: Vec<GraphicState>,
    batch: Option<Batch>,
    batch_count: usize,
}

impl Default for DrawList {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawList {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            points: Vec::new(),
            object_transform: Matrix4::identity(),
            state_stack: Vec::new(),
            batch: None,
            batch_count: 0,
        }
    }

    /// Drop recorded geometry and state, keeping allocations
    pub fn clear(&mut self) {
        if self.batch.is_some() {
            warn!("Clearing draw list with an unfinished primitive batch");
        }
        self.lines.clear();
        self.points.clear();
        self.object_transform = Matrix4::identity();
        self.state_stack.clear();
        self.batch = None;
        self.batch_count = 0;
    }

    pub fn set_object_transform(&mut self, transform: &Matrix4<f32>) {
        self.object_transform = *transform;
    }

    pub fn set_object_identity(&mut self) {
        self.object_transform = Matrix4::identity();
    }

    pub fn object_transform(&self) -> &Matrix4<f32> {
        &self.object_transform
    }

    /// Save the current object transform
    pub fn push_graphic_state(&mut self) {
        self.state_stack.push(GraphicState {
            object_transform: self.object_transform,
        });
    }

    /// Restore the last saved object transform
    pub fn pop_graphic_state(&mut self) -> Result<()> {
        let state = self
            .state_stack
            .pop()
            .ok_or_else(|| Error::InvalidData("pop_graphic_state without a matching push".into()))?;
        self.object_transform = state.object_transform;
        Ok(())
    }

    fn to_world(&self, p: &Point3f) -> Point3f {
        self.object_transform.transform_point(p)
    }

    /// Draw a single point of `size` pixels
    pub fn draw_point(&mut self, position: &Point3f, color: Color, size: f32) {
        let world = self.to_world(position);
        self.points.push(PointInstance::new(world, color, size));
    }

    pub fn draw_points<'p>(
        &mut self,
        positions: impl IntoIterator<Item = &'p Point3f>,
        color: Color,
        size: f32,
    ) {
        for p in positions {
            self.draw_point(p, color, size);
        }
    }

    /// Start a primitive batch; nested batches are rejected.
    ///
    /// Lines are rasterized one pixel wide whatever `_width` says.
    pub fn prim_begin(&mut self, mode: PrimitiveMode, _width: f32) -> Result<()> {
        if self.batch.is_some() {
            return Err(Error::InvalidData(
                "prim_begin called while another batch is open".into(),
            ));
        }
        self.batch = Some(Batch {
            mode,
            vertices: Vec::new(),
        });
        Ok(())
    }

    /// Add a vertex to the open batch
    pub fn prim_vertex(&mut self, position: &Point3f, color: Color) -> Result<()> {
        let world = self.to_world(position);
        let batch = self
            .batch
            .as_mut()
            .ok_or_else(|| Error::InvalidData("prim_vertex called outside a batch".into()))?;
        batch.vertices.push(LineVertex::new(world, color));
        Ok(())
    }

    /// Close the open batch and return the number of segments it produced
    pub fn prim_end(&mut self) -> Result<usize> {
        let batch = self
            .batch
            .take()
            .ok_or_else(|| Error::InvalidData("prim_end called without prim_begin".into()))?;

        let before = self.lines.len();
        match batch.mode {
            PrimitiveMode::Lines => {
                if batch.vertices.len() % 2 == 1 {
                    warn!("Dropping trailing unpaired vertex of a line batch");
                }
                let paired = batch.vertices.len() / 2 * 2;
                self.lines.extend_from_slice(&batch.vertices[..paired]);
            }
            PrimitiveMode::LineStrip => {
                for pair in batch.vertices.windows(2) {
                    self.lines.extend_from_slice(pair);
                }
            }
        }
        self.batch_count += 1;
        Ok((self.lines.len() - before) / 2)
    }

    /// Convenience for a single segment outside of any batch
    pub fn draw_line(&mut self, start: &Point3f, end: &Point3f, color: Color) {
        let (a, b) = (self.to_world(start), self.to_world(end));
        self.lines.push(LineVertex::new(a, color));
        self.lines.push(LineVertex::new(b, color));
    }

    /// Red X, green Y and blue Z axes from the origin
    pub fn draw_xyz_axis(&mut self, length: f32) {
        let origin = Point3::origin();
        self.draw_line(&origin, &Point3::new(length, 0.0, 0.0), Color::RED);
        self.draw_line(&origin, &Point3::new(0.0, length, 0.0), Color::GREEN);
        self.draw_line(&origin, &Point3::new(0.0, 0.0, length), Color::BLUE);
    }

    /// Square grid centred on the origin in the plane normal to `axis`,
    /// with `count` cells of `step` on each side of the centre
    pub fn draw_grid(&mut self, axis: GridAxis, step: f32, count: u32, color: Color) {
        let extent = step * count as f32;
        let plane = |u: f32, v: f32| match axis {
            GridAxis::X => Point3::new(0.0, u, v),
            GridAxis::Y => Point3::new(u, 0.0, v),
            GridAxis::Z => Point3::new(u, v, 0.0),
        };
        let n = count as i32;
        for i in -n..=n {
            let t = i as f32 * step;
            self.draw_line(&plane(t, -extent), &plane(t, extent), color);
            self.draw_line(&plane(-extent, t), &plane(extent, t), color);
        }
    }

    pub fn lines(&self) -> &[LineVertex] {
        &self.lines
    }

    pub fn points(&self) -> &[PointInstance] {
        &self.points
    }

    pub fn line_segment_count(&self) -> usize {
        self.lines.len() / 2
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of batches closed with [`DrawList::prim_end`]
    pub fn batch_count(&self) -> usize {
        self.batch_count
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_line_batch_pairs() {
        let mut list = DrawList::new();
        list.prim_begin(PrimitiveMode::Lines, 1.0).unwrap();
        for x in 0..5 {
            list.prim_vertex(&Point3f::new(x as f32, 0.0, 0.0), Color::WHITE).unwrap();
        }
        assert_eq!(list.prim_end().unwrap(), 2);
        assert_eq!(list.line_segment_count(), 2);
        assert_eq!(list.batch_count(), 1);
    }

    #[test]
    fn test_line_strip() {
        let mut list = DrawList::new();
        list.prim_begin(PrimitiveMode::LineStrip, 1.0).unwrap();
        for x in 0..4 {
            list.prim_vertex(&Point3f::new(x as f32, 0.0, 0.0), Color::WHITE).unwrap();
        }
        assert_eq!(list.prim_end().unwrap(), 3);
    }

    #[test]
    fn test_batch_misuse() {
        let mut list = DrawList::new();
        assert!(list.prim_vertex(&Point3f::origin(), Color::WHITE).is_err());
        assert!(list.prim_end().is_err());
        list.prim_begin(PrimitiveMode::Lines, 1.0).unwrap();
        assert!(list.prim_begin(PrimitiveMode::Lines, 1.0).is_err());
        // The first batch is still open and usable.
        list.prim_vertex(&Point3f::origin(), Color::WHITE).unwrap();
        list.prim_vertex(&Point3f::new(1.0, 0.0, 0.0), Color::WHITE).unwrap();
        assert_eq!(list.prim_end().unwrap(), 1);
    }

    #[test]
    fn test_object_transform_applies_to_geometry() {
        let mut list = DrawList::new();
        list.push_graphic_state();
        list.set_object_transform(&Matrix4::new_translation(&Vector3::new(0.0, 0.0, 5.0)));
        list.draw_point(&Point3f::new(1.0, 0.0, 0.0), Color::RED, 2.0);
        list.pop_graphic_state().unwrap();
        list.draw_point(&Point3f::new(1.0, 0.0, 0.0), Color::RED, 2.0);

        let points = list.points();
        assert_eq!(points[0].position, [1.0, 0.0, 5.0]);
        assert_eq!(points[0].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(points[0].size, 2.0);
        assert_eq!(points[1].position, [1.0, 0.0, 0.0]);
        assert!(list.pop_graphic_state().is_err());
    }

    #[test]
    fn test_axis_and_grid() {
        let mut list = DrawList::new();
        list.draw_xyz_axis(1.0);
        assert_eq!(list.line_segment_count(), 3);
        assert_eq!(list.lines()[1].position, [1.0, 0.0, 0.0]);

        list.clear();
        assert!(list.is_empty());
        list.draw_grid(GridAxis::Y, 1.0, 2, Color::GRAY);
        // 5 lines along each direction
        assert_eq!(list.line_segment_count(), 10);
        assert!(list.lines().iter().all(|v| v.position[1] == 0.0));
    }
}
