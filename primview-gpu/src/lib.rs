//! # primview GPU
//!
//! Immediate-mode drawing for the viewer. Scene traversal records lines and
//! points into a [`DrawList`]; a [`FrameRenderer`] uploads the list and draws
//! it with wgpu every frame.
//!
//! ## Example Usage
//!
//! ```rust
//! use primview_gpu::{DrawList, PrimitiveMode};
//! use primview_core::{Color, Point3f};
//!
//! let mut draw_list = DrawList::new();
//! draw_list.draw_xyz_axis(1.0);
//! draw_list.prim_begin(PrimitiveMode::LineStrip, 1.0).unwrap();
//! draw_list.prim_vertex(&Point3f::new(0.0, 0.0, 0.0), Color::WHITE).unwrap();
//! draw_list.prim_vertex(&Point3f::new(1.0, 0.0, 0.0), Color::WHITE).unwrap();
//! draw_list.prim_end().unwrap();
//! assert_eq!(draw_list.line_segment_count(), 4);
//! ```

pub mod device;
pub mod draw_list;
pub mod renderer;

pub use device::GpuContext;
pub use draw_list::{DrawList, GridAxis, LineVertex, PointInstance, PrimitiveMode};
pub use renderer::{CameraUniform, Frame, FrameRenderer, RenderConfig};
