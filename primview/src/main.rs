//! `primview` - open a scene and inspect it interactively
//!
//! Run:
//! - `cargo run -- data/scene.usda`
//! - `RUST_LOG=debug cargo run -- model.obj --grid`

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use primview_visualization::{config::DEFAULT_SCENE, show_stage, ViewerConfig};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "primview", version, about = "Wireframe and point viewer for scene stages")]
struct Args {
    /// Scene to open (.usda, .usd or .obj)
    #[arg(default_value = DEFAULT_SCENE)]
    path: PathBuf,

    #[arg(long, default_value_t = 960)]
    width: u32,

    #[arg(long, default_value_t = 960)]
    height: u32,

    /// Present without waiting for vertical sync
    #[arg(long)]
    no_vsync: bool,

    /// Starting time code
    #[arg(long)]
    time: Option<f64>,

    /// Attribute listed per mesh in the panel
    #[arg(long, value_name = "ATTRIBUTE", default_value = "MyMaterial")]
    inspect: String,

    /// Draw a ground grid
    #[arg(long)]
    grid: bool,

    /// Start with wireframes hidden
    #[arg(long)]
    no_wire: bool,
}

impl Args {
    fn into_config(self, scene_path: PathBuf) -> ViewerConfig {
        let title = format!(
            "primview - {}",
            scene_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        ViewerConfig {
            title,
            width: self.width,
            height: self.height,
            vsync: !self.no_vsync,
            scene_path,
            time: self.time,
            inspect_attribute: self.inspect,
            show_grid: self.grid,
            draw_wire: !self.no_wire,
            ..ViewerConfig::default()
        }
    }
}

/// Relative paths are tried next to the executable first, then in the
/// working directory.
fn resolve_scene_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(path)))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let scene_path = resolve_scene_path(&args.path);
    let config = args.into_config(scene_path);
    info!("Configuration: {:?}", config);

    println!("Controls:");
    println!("  Left/middle drag: orbit    Right or shift+drag: pan    Wheel: dolly");
    println!("  F: frame scene    R: reset camera    Escape: quit");

    let scene = config.scene_path.display().to_string();
    show_stage(config).with_context(|| format!("Failed to view {}", scene))?;
    Ok(())
}
