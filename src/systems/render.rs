//! GPU rendering system
//!
//! Owns the shared wgpu context, the frame coordinator and the overlay scene:
//! - surface acquire/present around each coordinator tick
//! - surface error handling
//! - device loss and context rebuild

use std::sync::Arc;
use winit::window::Window;
use duoframe_render::{
    FrameCoordinator, FrameStatus, SetupError, SurfaceErrorAction, WgpuContext,
};
use crate::config::AppConfig;
use crate::scene::PanelScene;

/// Render error types
#[derive(Debug)]
pub enum RenderError {
    /// GPU resources for the manual pass could not be created
    Setup(SetupError),
    /// GPU out of memory
    OutOfMemory,
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Setup(e) => write!(f, "Render setup failed: {}", e),
            RenderError::OutOfMemory => write!(f, "Out of memory"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Setup(e) => Some(e),
            RenderError::OutOfMemory => None,
        }
    }
}

impl From<SetupError> for RenderError {
    fn from(e: SetupError) -> Self {
        RenderError::Setup(e)
    }
}

/// Manages GPU rendering
pub struct RenderSystem {
    window: Arc<Window>,
    vsync: bool,
    context: WgpuContext,
    coordinator: FrameCoordinator,
    scene: PanelScene,
}

impl RenderSystem {
    /// Create the GPU context and set up the manual pass.
    ///
    /// Fails if the context or any manual pass resource cannot be created.
    pub fn new(window: Arc<Window>, config: &AppConfig) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let vsync = config.window.vsync;
        let mut context = pollster::block_on(WgpuContext::new(window.clone(), vsync))?;

        let mut scene = PanelScene::from_config(&config.overlay, size.width, size.height);
        let mut coordinator =
            FrameCoordinator::new(config.coordinator_settings(), size.width, size.height);
        coordinator.initialize(&mut context, &mut scene)?;

        Ok(Self {
            window,
            vsync,
            context,
            coordinator,
            scene,
        })
    }

    /// Handle window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
        self.coordinator.resize(width, height, &mut self.scene);
    }

    /// Render a single frame
    pub fn render_frame(&mut self) -> Result<FrameStatus, RenderError> {
        if self.context.is_lost() {
            self.recover_lost_context()?;
        }

        if let Err(e) = self.context.begin_frame() {
            return match self.context.handle_surface_error(e) {
                SurfaceErrorAction::Reconfigured => {
                    log::debug!("surface reconfigured, skipping frame");
                    Ok(FrameStatus::Skipped)
                }
                SurfaceErrorAction::SkipFrame => {
                    log::warn!("surface timeout, skipping frame");
                    Ok(FrameStatus::Skipped)
                }
                SurfaceErrorAction::Fatal => Err(RenderError::OutOfMemory),
            };
        }

        let status = self.coordinator.tick(&mut self.context, &mut self.scene);
        self.context.end_frame();
        Ok(status)
    }

    /// Replace a lost device with a fresh one and rebuild the manual pass
    fn recover_lost_context(&mut self) -> Result<(), RenderError> {
        self.coordinator.context_lost();

        let mut context = pollster::block_on(WgpuContext::new(self.window.clone(), self.vsync))?;
        let (width, height) = self.coordinator.canvas();
        context.resize(width, height);
        self.coordinator.initialize(&mut context, &mut self.scene)?;
        self.context = context;

        log::info!("GPU context recreated after device loss");
        Ok(())
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.coordinator.clock().frames()
    }

    /// Canvas size used by the coordinator
    pub fn size(&self) -> (u32, u32) {
        self.coordinator.canvas()
    }
}
