//! Per-frame ordering of the two renderers
//!
//! The coordinator owns the manual pass, its transforms and the frame clock.
//! Each tick it runs the manual pass first and the external renderer second,
//! with the external renderer's auto-clear forced off so the cube survives.

use duoframe_math::{ProjectionParams, TransformPipeline};

use crate::clock::{FrameClock, DEFAULT_TIME_STEP};
use crate::context::GraphicsContext;
use crate::error::SetupError;
use crate::external::ExternalSceneRenderer;
use crate::manual_pass::{ManualRenderPass, DEFAULT_CLEAR_COLOR, DEFAULT_CLEAR_DEPTH};

/// Camera distance along the forward axis
pub const DEFAULT_ZOOM: f32 = -6.0;

/// Settings fixed for the lifetime of a coordinator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatorSettings {
    pub projection: ProjectionParams,
    pub zoom: f32,
    pub time_step: f32,
    pub clear_color: [f32; 4],
    pub clear_depth: f32,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            projection: ProjectionParams::default(),
            zoom: DEFAULT_ZOOM,
            time_step: DEFAULT_TIME_STEP,
            clear_color: DEFAULT_CLEAR_COLOR,
            clear_depth: DEFAULT_CLEAR_DEPTH,
        }
    }
}

/// Lifecycle of the coordinator
#[derive(Debug)]
pub enum CoordinatorState {
    /// No GPU resources; ticks are skipped
    Uninitialized,
    /// Setup succeeded; the manual pass draws every tick
    Running(ManualRenderPass),
}

/// Outcome of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Rendered,
    Skipped,
}

/// Drives the manual pass and the external renderer over one shared context
#[derive(Debug)]
pub struct FrameCoordinator {
    state: CoordinatorState,
    settings: CoordinatorSettings,
    clock: FrameClock,
    transforms: TransformPipeline,
    canvas: (u32, u32),
}

impl FrameCoordinator {
    pub fn new(settings: CoordinatorSettings, width: u32, height: u32) -> Self {
        let mut transforms = TransformPipeline::new(settings.projection, 1.0, settings.zoom);
        transforms.set_canvas_size(width, height);

        Self {
            state: CoordinatorState::Uninitialized,
            settings,
            clock: FrameClock::with_step(settings.time_step),
            transforms,
            canvas: (width, height),
        }
    }

    /// Create the manual pass's GPU resources and start running.
    ///
    /// On failure the error is logged and returned, and the coordinator
    /// stays uninitialized. Calling this while already running is a no-op.
    pub fn initialize(
        &mut self,
        ctx: &mut dyn GraphicsContext,
        external: &mut dyn ExternalSceneRenderer,
    ) -> Result<(), SetupError> {
        if self.is_running() {
            log::warn!("initialize called while already running");
            return Ok(());
        }

        let pass = match ManualRenderPass::new(ctx) {
            Ok(pass) => pass.with_clear(self.settings.clear_color, self.settings.clear_depth),
            Err(e) => {
                log::error!("Manual pass setup failed: {}", e);
                return Err(e);
            }
        };

        external.set_auto_clear(false);
        self.state = CoordinatorState::Running(pass);
        log::info!(
            "Frame coordinator running ({}x{}, aspect {:.3})",
            self.canvas.0,
            self.canvas.1,
            self.transforms.aspect()
        );
        Ok(())
    }

    /// Render one frame: manual pass, then the external scene
    pub fn tick(
        &mut self,
        ctx: &mut dyn GraphicsContext,
        external: &mut dyn ExternalSceneRenderer,
    ) -> FrameStatus {
        let CoordinatorState::Running(pass) = &self.state else {
            return FrameStatus::Skipped;
        };

        let frame = self.clock.tick();
        pass.render(ctx, &mut self.transforms, frame.time, self.canvas);

        if external.auto_clear() {
            log::debug!("external renderer re-enabled auto-clear, disabling it");
        }
        external.set_auto_clear(false);
        external.render(ctx);

        log::trace!("frame {} rendered at t = {}", frame.frame_index, frame.time);
        FrameStatus::Rendered
    }

    /// Apply a new drawable size.
    ///
    /// Canvas size and projection aspect change together. A zero-sized
    /// canvas (minimized window) is ignored and nothing is forwarded.
    pub fn resize(&mut self, width: u32, height: u32, external: &mut dyn ExternalSceneRenderer) {
        if !self.transforms.set_canvas_size(width, height) {
            log::debug!("ignoring degenerate resize to {}x{}", width, height);
            return;
        }
        self.canvas = (width, height);
        external.resize(width, height);
        log::debug!("resized to {}x{}, aspect {:.3}", width, height, self.transforms.aspect());
    }

    /// Forget every GPU handle after the context was lost.
    ///
    /// Ticks are skipped until [`FrameCoordinator::initialize`] succeeds on a
    /// fresh context. Transforms and clock carry on from where they were.
    pub fn context_lost(&mut self) {
        if self.is_running() {
            log::warn!("GPU context lost, manual pass suspended");
        }
        self.state = CoordinatorState::Uninitialized;
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, CoordinatorState::Running(_))
    }

    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    pub fn transforms(&self) -> &TransformPipeline {
        &self.transforms
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Canvas size used for the viewport
    pub fn canvas(&self) -> (u32, u32) {
        self.canvas
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }
}
