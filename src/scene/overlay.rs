//! PanelScene - a minimal external scene renderer
//!
//! Draws solid rectangles on top of the manual pass using scissored clears.
//! Panels are placed in canvas fractions and rescaled to pixels on resize.
//! The scene leaves the scissor test enabled and its clear color set when
//! it finishes, like any renderer that does not tidy up after itself.

use duoframe_render::{
    Capability, ClearFlags, ExternalSceneRenderer, GraphicsContext, Rect,
};

use crate::config::{OverlayConfig, PanelConfig};

/// Color used when the scene clears on its own
const DEFAULT_BACKGROUND: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

#[derive(Debug, Clone, PartialEq)]
struct Panel {
    /// [x, y, width, height] in canvas fractions, lower-left origin
    fraction: [f32; 4],
    color: [f32; 4],
    /// Pixel rectangle for the current canvas
    rect: Rect,
}

/// Overlay of solid panels drawn after the manual pass
///
/// # Example
/// ```ignore
/// let scene = PanelScene::new(500, 500)
///     .with_background([0.1, 0.1, 0.1, 1.0])
///     .add_panel([0.0, 0.0, 0.5, 0.1], [1.0, 0.0, 0.0]);
/// ```
#[derive(Debug, Clone)]
pub struct PanelScene {
    panels: Vec<Panel>,
    background: [f32; 4],
    auto_clear: bool,
    width: u32,
    height: u32,
}

impl PanelScene {
    /// Create an empty scene for a canvas size. Auto-clear starts enabled.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            panels: Vec::new(),
            background: DEFAULT_BACKGROUND,
            auto_clear: true,
            width,
            height,
        }
    }

    /// Build the scene described by the overlay configuration
    pub fn from_config(config: &OverlayConfig, width: u32, height: u32) -> Self {
        let scene = Self::new(width, height);
        if !config.enabled {
            return scene;
        }
        config
            .panels
            .iter()
            .fold(scene, |scene, PanelConfig { rect, color }| scene.add_panel(*rect, *color))
    }

    /// Color used by the scene's own clear when auto-clear is on
    pub fn with_background(mut self, color: [f32; 4]) -> Self {
        self.background = color;
        self
    }

    /// Add a panel at `[x, y, width, height]` canvas fractions
    pub fn add_panel(mut self, fraction: [f32; 4], color: [f32; 3]) -> Self {
        let rect = to_pixels(fraction, self.width, self.height);
        self.panels.push(Panel {
            fraction,
            color: [color[0], color[1], color[2], 1.0],
            rect,
        });
        self
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Pixel rectangles of every panel, in drawing order
    pub fn panel_rects(&self) -> Vec<Rect> {
        self.panels.iter().map(|p| p.rect).collect()
    }
}

impl ExternalSceneRenderer for PanelScene {
    fn render(&mut self, ctx: &mut dyn GraphicsContext) {
        if self.auto_clear {
            ctx.disable(Capability::ScissorTest);
            ctx.clear_color(self.background);
            ctx.clear_depth(1.0);
            ctx.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        }

        if self.panels.is_empty() {
            return;
        }

        ctx.enable(Capability::ScissorTest);
        for panel in &self.panels {
            ctx.scissor(panel.rect);
            ctx.clear_color(panel.color);
            ctx.clear(ClearFlags::COLOR);
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        for panel in &mut self.panels {
            panel.rect = to_pixels(panel.fraction, width, height);
        }
    }

    fn set_auto_clear(&mut self, enabled: bool) {
        self.auto_clear = enabled;
    }

    fn auto_clear(&self) -> bool {
        self.auto_clear
    }
}

fn to_pixels(fraction: [f32; 4], width: u32, height: u32) -> Rect {
    let [x, y, w, h] = fraction;
    let (width, height) = (width as f32, height as f32);
    Rect::new(
        (x * width).round() as i32,
        (y * height).round() as i32,
        (w * width).round().max(0.0) as u32,
        (h * height).round().max(0.0) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use duoframe_render::HeadlessContext;

    #[test]
    fn test_to_pixels() {
        assert_eq!(to_pixels([0.1, 0.2, 0.5, 0.25], 200, 100), Rect::new(20, 20, 100, 25));
        assert_eq!(to_pixels([0.0, 0.0, 1.0, 1.0], 640, 480), Rect::full(640, 480));
    }

    #[test]
    fn test_from_config() {
        let scene = PanelScene::from_config(&OverlayConfig::default(), 500, 500);
        assert_eq!(scene.panel_count(), 2);
        assert!(scene.auto_clear());

        let disabled = OverlayConfig {
            enabled: false,
            ..OverlayConfig::default()
        };
        assert_eq!(PanelScene::from_config(&disabled, 500, 500).panel_count(), 0);
    }

    #[test]
    fn test_resize_rescales_panels() {
        let mut scene = PanelScene::new(100, 100).add_panel([0.5, 0.5, 0.5, 0.5], [1.0, 0.0, 0.0]);
        assert_eq!(scene.panel_rects(), vec![Rect::new(50, 50, 50, 50)]);

        scene.resize(400, 200);
        assert_eq!(scene.panel_rects(), vec![Rect::new(200, 100, 200, 100)]);
    }

    #[test]
    fn test_render_without_auto_clear_keeps_background() {
        let mut ctx = HeadlessContext::new(10, 10);
        ctx.clear_color([0.5, 0.5, 0.5, 1.0]);
        ctx.clear(ClearFlags::COLOR);

        let mut scene = PanelScene::new(10, 10).add_panel([0.0, 0.0, 0.5, 0.5], [0.0, 1.0, 0.0]);
        scene.set_auto_clear(false);
        scene.render(&mut ctx);

        assert_eq!(ctx.pixel(0, 0), Some([0.0, 1.0, 0.0, 1.0]));
        assert_eq!(ctx.pixel(4, 4), Some([0.0, 1.0, 0.0, 1.0]));
        assert_eq!(ctx.pixel(5, 5), Some([0.5, 0.5, 0.5, 1.0]));
        // Scissor is left enabled
        assert!(ctx.state().scissor_test);
    }

    #[test]
    fn test_render_with_auto_clear_erases_background() {
        let mut ctx = HeadlessContext::new(10, 10);
        ctx.clear_color([0.5, 0.5, 0.5, 1.0]);
        ctx.clear(ClearFlags::COLOR);

        let mut scene = PanelScene::new(10, 10).with_background([0.1, 0.2, 0.3, 1.0]);
        scene.render(&mut ctx);

        assert_eq!(ctx.pixel(9, 9), Some([0.1, 0.2, 0.3, 1.0]));
    }
}
