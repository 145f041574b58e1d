//! Interactive stage viewer
//!
//! Each redraw takes the accumulated mouse input, re-extracts the stage at
//! the panel's time code into a draw list, renders it, then lays the
//! inspector panel on top.

use std::sync::Arc;
use std::time::Instant;
use winit::{
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::{Key, NamedKey},
    window::{Window, WindowBuilder},
};

use log::{debug, error, info};
use primview_core::{Error, Result};
use primview_gpu::{DrawList, FrameRenderer, RenderConfig};
use primview_io::Stage;

use crate::camera::Camera3D;
use crate::clock::FrameClock;
use crate::config::ViewerConfig;
use crate::frame::{scene_bounds, FrameExtractor, FrameOptions};
use crate::gui::GuiLayer;
use crate::input::InputTracker;
use crate::inspector::{inspector_rows, show_panel, time_range, PanelActions, PanelState, StageSummary};

const STATS_INTERVAL: u64 = 60;

/// Window, GPU and GUI handles that only exist while the loop runs
struct Surfaces {
    window: Arc<Window>,
    renderer: FrameRenderer,
    gui: GuiLayer,
}

/// Interactive viewer for one stage
pub struct InteractiveViewer {
    config: ViewerConfig,
    stage: Stage,
    camera: Camera3D,
    input: InputTracker,
    extractor: FrameExtractor,
    draw_list: DrawList,
    panel: PanelState,
    clock: FrameClock,
}

impl InteractiveViewer {
    /// Create a viewer for `stage`
    pub fn new(config: ViewerConfig, stage: Stage) -> Self {
        let range = time_range(&stage);
        let time = config
            .time
            .unwrap_or(*range.start())
            .clamp(*range.start(), *range.end());
        let panel = PanelState {
            draw_wire: config.draw_wire,
            time,
            show_grid: config.show_grid,
        };

        Self {
            camera: Camera3D::default(),
            input: InputTracker::new(),
            extractor: FrameExtractor::new(),
            draw_list: DrawList::new(),
            clock: FrameClock::new(),
            config,
            stage,
            panel,
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn camera(&self) -> &Camera3D {
        &self.camera
    }

    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    /// Re-center the camera on everything drawable at the current time
    pub fn frame_scene(&mut self) {
        match scene_bounds(&self.stage, self.panel.time) {
            Some((min, max)) => self.camera.frame_bounds(min, max),
            None => debug!("Nothing to frame"),
        }
    }

    /// Open the window and run until it is closed
    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()
            .map_err(|e| Error::Visualization(format!("Failed to create event loop: {}", e)))?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(&self.config.title)
                .with_inner_size(winit::dpi::LogicalSize::new(
                    self.config.width as f64,
                    self.config.height as f64,
                ))
                .build(&event_loop)
                .map_err(|e| Error::Visualization(format!("Failed to create window: {}", e)))?,
        );

        let render_config = RenderConfig {
            vsync: self.config.vsync,
            ..RenderConfig::default()
        };
        let renderer = pollster::block_on(FrameRenderer::new(window.clone(), render_config))?;
        let gui = GuiLayer::new(&window, renderer.device(), renderer.surface_format());

        let (width, height) = renderer.size();
        self.camera.set_viewport(width, height);

        info!(
            "Viewing {} ({} prims, time {})",
            self.config.scene_path.display(),
            self.stage.prim_count(),
            self.panel.time
        );

        let mut surfaces = Surfaces {
            window,
            renderer,
            gui,
        };

        event_loop
            .run(move |event, target| {
                target.set_control_flow(ControlFlow::Poll);

                match event {
                    Event::WindowEvent { event, .. } => {
                        self.handle_window_event(&mut surfaces, event, target)
                    }
                    Event::AboutToWait => surfaces.window.request_redraw(),
                    _ => {}
                }
            })
            .map_err(|e| Error::Visualization(format!("Event loop error: {}", e)))?;

        Ok(())
    }

    fn handle_window_event(
        &mut self,
        surfaces: &mut Surfaces,
        event: WindowEvent,
        target: &EventLoopWindowTarget<()>,
    ) {
        let consumed = surfaces.gui.on_window_event(&surfaces.window, &event);
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => target.exit(),
            WindowEvent::Resized(new_size) => {
                surfaces.renderer.resize(new_size);
                self.camera.set_viewport(new_size.width, new_size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        logical_key,
                        ..
                    },
                ..
            } if !consumed => match logical_key {
                Key::Named(NamedKey::Escape) => target.exit(),
                Key::Character(c) => match c.as_str() {
                    "f" | "F" => self.frame_scene(),
                    "r" | "R" => self.camera.reset(),
                    _ => {}
                },
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw(surfaces) {
                    error!("Render error: {}", e);
                    target.exit();
                }
            }
            _ => {}
        }
    }

    fn redraw(&mut self, surfaces: &mut Surfaces) -> Result<()> {
        let input = self.input.take_frame_input();
        if !surfaces.gui.wants_pointer() {
            input.apply(&mut self.camera);
        }

        let options = FrameOptions {
            time: self.panel.time,
            draw_wire: self.panel.draw_wire,
            show_grid: self.panel.show_grid,
        };
        let stats = self
            .extractor
            .extract(&self.stage, &options, &mut self.draw_list);
        if self.clock.total_frames() % STATS_INTERVAL == 0 {
            debug!(
                "Frame {}: {} meshes, {} points, {} segments",
                self.clock.total_frames(),
                stats.meshes,
                stats.points,
                stats.segments
            );
        }

        let renderer = &mut surfaces.renderer;
        renderer.update_camera(self.camera.view_projection());
        let Some(mut frame) = renderer.begin_frame()? else {
            return Ok(());
        };
        renderer.draw_scene(&mut frame, &self.draw_list);

        let rows = inspector_rows(&self.stage, &self.config.inspect_attribute, self.panel.time);
        let summary = StageSummary::of(&self.stage, self.panel.time);
        let (width, height) = renderer.size();
        let fps = self.clock.fps();
        let mut actions = PanelActions::default();
        {
            let panel = &mut self.panel;
            let camera = &self.camera;
            let panel_size = self.config.panel_size;
            surfaces.gui.draw(
                &surfaces.window,
                renderer.device(),
                renderer.queue(),
                &mut frame.encoder,
                &frame.view,
                [width, height],
                |ctx| {
                    actions = show_panel(ctx, panel, &summary, &rows, fps, camera, panel_size);
                },
            );
        }
        renderer.end_frame(frame);
        self.clock.tick(Instant::now());

        if actions.reset_camera {
            self.camera.reset();
        }
        if actions.frame_scene {
            self.frame_scene();
        }
        Ok(())
    }
}
