//! # primview
//!
//! A small interactive viewer for scene-description stages.
//!
//! This is the umbrella crate that re-exports the workspace crates. Use it to
//! get everything in one place, or depend on individual crates for finer
//! control over dependencies.
//!
//! ## Quick Start
//!
//! ```rust
//! use primview::prelude::*;
//!
//! let mesh = PolygonMesh::from_parts(
//!     vec![
//!         Point3f::new(0.0, 0.0, 0.0),
//!         Point3f::new(1.0, 0.0, 0.0),
//!         Point3f::new(1.0, 1.0, 0.0),
//!         Point3f::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![4],
//!     vec![0, 1, 2, 3],
//! );
//! assert_eq!(mesh.wireframe_segments().unwrap().len(), 4);
//! ```
//!
//! ## Feature Flags
//!
//! - `io`: stage model and scene readers
//! - `gpu`: draw lists and the wgpu renderer
//! - `visualization`: interactive viewer and the `primview` binary
//!
//! All three are on by default.

// Re-export core functionality
pub use primview_core::*;

#[cfg(feature = "io")]
pub use primview_io as io;

#[cfg(feature = "gpu")]
pub use primview_gpu as gpu;

#[cfg(feature = "visualization")]
pub use primview_visualization as visualization;

/// Convenient imports for common use cases
pub mod prelude {
    pub use primview_core::*;

    #[cfg(feature = "io")]
    pub use primview_io::{open_stage, MeshPrim, PointsPrim, Prim, Stage, TimeCode};

    #[cfg(feature = "gpu")]
    pub use primview_gpu::{DrawList, PrimitiveMode};

    #[cfg(feature = "visualization")]
    pub use primview_visualization::{Camera3D, InteractiveViewer, ViewerConfig};
}
