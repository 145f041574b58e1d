//! Scene stages for primview
//!
//! This crate models the scene side of the viewer: a [`Stage`] of prims with
//! typed, time-sampled attributes and transform stacks, plus readers that
//! build stages from ASCII scene layers and Wavefront OBJ files.

pub mod error;
pub mod geom;
pub mod layer;
pub mod obj;
pub mod path;
pub mod registry;
pub mod stage;
pub mod time;
pub mod usda;
pub mod value;
pub mod xform;

pub use error::*;
pub use geom::{MeshPrim, PointsPrim};
pub use layer::{AttributeSpec, Layer, Metadata, PrimSpec, RawValue, Specifier};
pub use path::PrimPath;
pub use registry::{ReaderRegistry, StageReader};
pub use stage::{Attribute, Prim, Property, Relationship, Stage, Traverse, UpAxis};
pub use time::{TimeCode, TimeSamples};
pub use value::{FromValue, Value};
pub use xform::{XformOp, XformOpOrder, XformOpType};

use primview_core::Result;
use std::path::Path;

/// Open a stage, auto-detecting the format
pub fn open_stage<P: AsRef<Path>>(path: P) -> Result<Stage> {
    Stage::open(path)
}
