//! Viewer configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SCENE: &str = "data/scene.usda";
pub const DEFAULT_INSPECT_ATTRIBUTE: &str = "MyMaterial";

/// Everything the interactive viewer needs before it opens a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub scene_path: PathBuf,
    /// Starting time code; `None` starts at the beginning of the stage range
    pub time: Option<f64>,
    /// Attribute listed per mesh in the inspector panel
    pub inspect_attribute: String,
    pub show_grid: bool,
    pub draw_wire: bool,
    pub panel_size: [f32; 2],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "primview".to_string(),
            width: 960,
            height: 960,
            vsync: true,
            scene_path: PathBuf::from(DEFAULT_SCENE),
            time: None,
            inspect_attribute: DEFAULT_INSPECT_ATTRIBUTE.to_string(),
            show_grid: false,
            draw_wire: true,
            panel_size: [500.0, 800.0],
        }
    }
}
