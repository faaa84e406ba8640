//! Integration tests for two renderers sharing one context
//!
//! These tests run full frames on a headless context and check:
//! 1. The manual pass's clear survives wherever the external scene does not draw
//! 2. An external renderer with auto-clear on would erase the cube
//! 3. State left behind by the external renderer never breaks the next frame
//! 4. Context loss and re-initialization

use duoframe_render::{
    Capability, ClearFlags, CoordinatorSettings, DepthFunc, ExternalSceneRenderer, FrameCoordinator,
    FrameStatus, GraphicsContext, HeadlessContext, Rect, SetupError,
};

const MANUAL_CLEAR: [f32; 4] = [0.5, 0.5, 0.5, 0.9];
const PANEL_COLOR: [f32; 4] = [0.8, 0.2, 0.1, 1.0];

/// Fills one rectangle with a scissored clear, like a hand-written rect fill
struct RectScene {
    rect: Rect,
    auto_clear: bool,
    frames: usize,
}

impl RectScene {
    fn new(rect: Rect) -> Self {
        Self {
            rect,
            auto_clear: true,
            frames: 0,
        }
    }
}

impl ExternalSceneRenderer for RectScene {
    fn render(&mut self, ctx: &mut dyn GraphicsContext) {
        if self.auto_clear {
            ctx.disable(Capability::ScissorTest);
            ctx.clear_color([0.0, 0.0, 0.0, 1.0]);
            ctx.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        }

        // Leave scissor on and clear values changed, as a careless renderer would
        ctx.enable(Capability::ScissorTest);
        ctx.scissor(self.rect);
        ctx.clear_color(PANEL_COLOR);
        ctx.clear(ClearFlags::COLOR);
        self.frames += 1;
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn set_auto_clear(&mut self, enabled: bool) {
        self.auto_clear = enabled;
    }

    fn auto_clear(&self) -> bool {
        self.auto_clear
    }
}

/// Clobbers every piece of state the manual pass depends on
struct HostileScene {
    auto_clear: bool,
}

impl ExternalSceneRenderer for HostileScene {
    fn render(&mut self, ctx: &mut dyn GraphicsContext) {
        ctx.use_program(None);
        ctx.bind_index_buffer(None);
        for attrib in ctx.state_mut().attribs.iter_mut() {
            attrib.enabled = false;
            attrib.buffer = None;
        }
        ctx.disable(Capability::DepthTest);
        ctx.depth_func(DepthFunc::Never);
        ctx.enable(Capability::ScissorTest);
        ctx.scissor(Rect::new(0, 0, 1, 1));
        ctx.viewport(Rect::new(3, 3, 1, 1));
        ctx.clear_color([0.0, 1.0, 0.0, 1.0]);
        ctx.clear_depth(0.0);
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn set_auto_clear(&mut self, enabled: bool) {
        self.auto_clear = enabled;
    }

    fn auto_clear(&self) -> bool {
        self.auto_clear
    }
}

fn start(
    ctx: &mut HeadlessContext,
    scene: &mut dyn ExternalSceneRenderer,
) -> FrameCoordinator {
    let (width, height) = ctx.drawable_size();
    let mut coordinator = FrameCoordinator::new(CoordinatorSettings::default(), width, height);
    coordinator
        .initialize(ctx, scene)
        .expect("setup should succeed on a fresh context");
    coordinator
}

// ==================== Compositing Tests ====================

#[test]
fn test_manual_clear_visible_outside_external_content() {
    let mut ctx = HeadlessContext::new(20, 20);
    let mut scene = RectScene::new(Rect::new(5, 5, 10, 10));
    let mut coordinator = start(&mut ctx, &mut scene);

    assert_eq!(coordinator.tick(&mut ctx, &mut scene), FrameStatus::Rendered);

    assert!(!scene.auto_clear(), "auto-clear should be off during render");
    assert_eq!(scene.frames, 1);

    // Outside the panel: manual clear color
    assert_eq!(ctx.pixel(0, 0), Some(MANUAL_CLEAR));
    assert_eq!(ctx.pixel(19, 19), Some(MANUAL_CLEAR));
    assert_eq!(ctx.pixel(4, 10), Some(MANUAL_CLEAR));
    // Inside the panel: the external scene's color
    assert_eq!(ctx.pixel(5, 5), Some(PANEL_COLOR));
    assert_eq!(ctx.pixel(14, 14), Some(PANEL_COLOR));

    // The cube was drawn into the same frame
    assert_eq!(ctx.draws().len(), 1);
    assert_eq!(ctx.draws()[0].index_count, 36);
}

#[test]
fn test_auto_clear_would_erase_manual_output() {
    // Run the external scene on its own with auto-clear on to show what the
    // coordinator prevents
    let mut ctx = HeadlessContext::new(20, 20);
    ctx.clear_color(MANUAL_CLEAR);
    ctx.clear(ClearFlags::COLOR);

    let mut scene = RectScene::new(Rect::new(5, 5, 10, 10));
    scene.render(&mut ctx);

    assert_eq!(ctx.pixel(0, 0), Some([0.0, 0.0, 0.0, 1.0]));
}

#[test]
fn test_second_frame_clear_ignores_leftover_scissor() {
    let mut ctx = HeadlessContext::new(20, 20);
    let mut scene = RectScene::new(Rect::new(0, 0, 4, 4));
    let mut coordinator = start(&mut ctx, &mut scene);

    coordinator.tick(&mut ctx, &mut scene);
    // Scissor is still enabled from the external scene; move the panel
    scene.rect = Rect::new(16, 16, 4, 4);
    coordinator.tick(&mut ctx, &mut scene);

    // The old panel area was cleared by the manual pass on frame two
    assert_eq!(ctx.pixel(1, 1), Some(MANUAL_CLEAR));
    assert_eq!(ctx.pixel(17, 17), Some(PANEL_COLOR));
    assert_eq!(ctx.draws().len(), 2);
    assert!(ctx.draws().iter().all(|d| d.scissor.is_none()));
}

// ==================== State Reassertion Tests ====================

#[test]
fn test_hostile_external_state_never_breaks_manual_pass() {
    let mut ctx = HeadlessContext::new(8, 8);
    let mut scene = HostileScene { auto_clear: true };
    let mut coordinator = start(&mut ctx, &mut scene);

    for _ in 0..5 {
        assert_eq!(coordinator.tick(&mut ctx, &mut scene), FrameStatus::Rendered);
    }

    assert_eq!(ctx.rejected_draws(), 0);
    assert_eq!(ctx.draws().len(), 5);
    for draw in ctx.draws() {
        assert_eq!(draw.depth, Some(DepthFunc::LessEqual));
        assert_eq!(draw.viewport, Rect::full(8, 8));
        assert_eq!(draw.scissor, None);
        assert!(draw.attribs.iter().all(|a| a.enabled && a.buffer.is_some()));
    }

    // Manual clear values were restored before clearing
    assert_eq!(ctx.pixel(7, 7), Some(MANUAL_CLEAR));
    assert_eq!(ctx.depth_at(7, 7), Some(1.0));
}

#[test]
fn test_rotation_accumulates_across_ticks() {
    let mut ctx = HeadlessContext::new(8, 8);
    let mut scene = HostileScene { auto_clear: false };
    let mut coordinator = start(&mut ctx, &mut scene);

    coordinator.tick(&mut ctx, &mut scene);
    coordinator.tick(&mut ctx, &mut scene);

    let draws = ctx.draws();
    assert_ne!(draws[0].uniforms[2], draws[1].uniforms[2]);
    // Projection and view are unchanged between frames
    assert_eq!(draws[0].uniforms[0], draws[1].uniforms[0]);
    assert_eq!(draws[0].uniforms[1], draws[1].uniforms[1]);
    assert_eq!(draws[0].uniforms[1][14], -6.0);
}

// ==================== Context Loss Tests ====================

#[test]
fn test_context_loss_and_reinitialize() {
    let mut ctx = HeadlessContext::new(10, 10);
    let mut scene = RectScene::new(Rect::new(0, 0, 2, 2));
    let mut coordinator = start(&mut ctx, &mut scene);
    coordinator.tick(&mut ctx, &mut scene);

    ctx.lose_context();
    coordinator.context_lost();
    assert_eq!(coordinator.tick(&mut ctx, &mut scene), FrameStatus::Skipped);
    assert_eq!(scene.frames, 1);

    coordinator.initialize(&mut ctx, &mut scene).unwrap();
    assert_eq!(coordinator.tick(&mut ctx, &mut scene), FrameStatus::Rendered);
    assert_eq!(ctx.rejected_draws(), 0);
    assert_eq!(scene.frames, 2);
}

#[test]
fn test_setup_failure_on_lost_context_stays_uninitialized() {
    let mut ctx = HeadlessContext::new(10, 10);
    let mut scene = RectScene::new(Rect::new(0, 0, 2, 2));
    let mut coordinator = start(&mut ctx, &mut scene);

    ctx.lose_context();
    coordinator.context_lost();
    ctx.set_buffer_budget(Some(0));

    let err = coordinator.initialize(&mut ctx, &mut scene).unwrap_err();
    assert!(matches!(err, SetupError::BufferCreation { .. }));
    assert!(!coordinator.is_running());
    assert_eq!(coordinator.tick(&mut ctx, &mut scene), FrameStatus::Skipped);
}
