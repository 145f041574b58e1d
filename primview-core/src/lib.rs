//! Core data structures for primview
//!
//! This crate provides the geometry types shared by the scene reader, the
//! immediate-mode renderer and the viewer: points and colors, 4x4 transforms,
//! polygon meshes with wireframe extraction, point clouds and the error type.

pub mod point;
pub mod point_cloud;
pub mod mesh;
pub mod traits;
pub mod transform;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use mesh::*;
pub use traits::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4, UnitQuaternion};

/// Common result type for primview operations
pub type Result<T> = std::result::Result<T, Error>;
