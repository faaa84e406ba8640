//! The renderer sharing the context with the manual pass
//!
//! The coordinator treats it as opaque: it draws its own content with
//! whatever state it likes and leaves that state behind.

use crate::context::GraphicsContext;

/// A scene renderer drawing into the shared context after the manual pass
pub trait ExternalSceneRenderer {
    /// Draw one frame into the shared context.
    ///
    /// With auto-clear enabled the renderer clears the framebuffer first,
    /// erasing the manual pass's output.
    fn render(&mut self, ctx: &mut dyn GraphicsContext);

    /// The drawable size changed
    fn resize(&mut self, width: u32, height: u32);

    fn set_auto_clear(&mut self, enabled: bool);

    fn auto_clear(&self) -> bool;
}
