//! Visualization for primview stages
//!
//! This crate turns a loaded [`Stage`] into pictures:
//! - Orbit camera with Blender-style mouse controls
//! - Per-frame extraction of wireframes and points into a draw list
//! - Inspector panel listing a chosen attribute per mesh
//! - Interactive winit/egui viewer loop

pub mod camera;
pub mod clock;
pub mod config;
pub mod frame;
pub mod gui;
pub mod input;
pub mod inspector;
pub mod interactive_viewer;

pub use camera::Camera3D;
pub use clock::FrameClock;
pub use config::ViewerConfig;
pub use frame::{scene_bounds, FrameExtractor, FrameOptions, FrameStats};
pub use input::{DragMode, FrameInput, InputTracker};
pub use inspector::{inspector_rows, time_range, InspectorRow, PanelState, StageSummary};
pub use interactive_viewer::InteractiveViewer;

use primview_core::Result;
use primview_io::Stage;

/// Open `config.scene_path` and view it until the window closes
pub fn show_stage(config: ViewerConfig) -> Result<()> {
    let stage = Stage::open(&config.scene_path)?;
    InteractiveViewer::new(config, stage).run()
}
