//! duoframe - two renderers, one GPU context
//!
//! Draws a rotating cube by hand and composites a panel overlay on top of it
//! through the same wgpu device and surface every frame.

use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowId,
};

use duoframe::config::AppConfig;
use duoframe::logging::init_logging;
use duoframe::systems::{RenderSystem, WindowSystem};
use duoframe_render::FrameStatus;

/// Frames between window title refreshes
const TITLE_INTERVAL: u64 = 60;

/// Main application state
struct App {
    config: AppConfig,
    window: Option<WindowSystem>,
    render: Option<RenderSystem>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            window: None,
            render: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match WindowSystem::create(event_loop, &self.config.window) {
            Ok(window) => window,
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        };

        // A setup failure means the manual pass can never draw
        match RenderSystem::new(window.window().clone(), &self.config) {
            Ok(render) => {
                let (width, height) = render.size();
                log::info!("Rendering at {}x{}", width, height);
                self.render = Some(render);
            }
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        }

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(render) = &mut self.render {
                    render.resize(physical_size.width, physical_size.height);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
                    PhysicalKey::Code(KeyCode::KeyF) => {
                        if let Some(window) = &self.window {
                            window.toggle_fullscreen();
                        }
                    }
                    _ => {}
                }
            }

            WindowEvent::RedrawRequested => {
                let (Some(render), Some(window)) = (&mut self.render, &self.window) else {
                    return;
                };

                match render.render_frame() {
                    Ok(FrameStatus::Rendered) => {
                        if render.frames() % TITLE_INTERVAL == 1 {
                            window.update_title(render.frames(), render.size());
                        }
                    }
                    Ok(FrameStatus::Skipped) => {}
                    Err(e) => {
                        log::error!("{}", e);
                        event_loop.exit();
                        return;
                    }
                }

                window.request_redraw();
            }

            _ => {}
        }
    }
}

fn main() {
    // Config first so the configured log level can apply
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    init_logging(&config.debug.log_level);
    if let Some(e) = config_error {
        log::warn!("Failed to load config: {}. Using defaults.", e);
    }
    log::info!("Starting duoframe");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
        std::process::exit(1);
    }
}
