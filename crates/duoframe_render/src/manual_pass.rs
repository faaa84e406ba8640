//! The hand-written cube draw
//!
//! The pass shares its context with a renderer it knows nothing about, so it
//! assumes nothing about the state it inherits. Every frame it sets depth
//! testing, scissoring, clear values, viewport, program, attribute pointers,
//! uniforms and index buffer before drawing.

use duoframe_math::TransformPipeline;

use crate::context::{Capability, ClearFlags, DepthFunc, GraphicsContext, Rect};
use crate::error::SetupError;
use crate::geometry::CubeGeometry;
use crate::shader::ShaderProgram;

/// Clear color used by the manual pass
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 0.9];

/// Clear depth used by the manual pass
pub const DEFAULT_CLEAR_DEPTH: f32 = 1.0;

/// GPU handles and per-pass settings for the cube draw
#[derive(Debug, Clone)]
pub struct ManualRenderPass {
    shader: ShaderProgram,
    geometry: CubeGeometry,
    clear_color: [f32; 4],
    clear_depth: f32,
}

impl ManualRenderPass {
    /// Upload the cube and build its program.
    ///
    /// Either both succeed or the error of the first failing step is returned.
    pub fn new(ctx: &mut dyn GraphicsContext) -> Result<Self, SetupError> {
        let geometry = CubeGeometry::upload(ctx)?;
        let shader = ShaderProgram::build(ctx)?;

        ctx.use_program(Some(shader.program));
        shader.bind_attributes(ctx, &geometry);

        Ok(Self {
            shader,
            geometry,
            clear_color: DEFAULT_CLEAR_COLOR,
            clear_depth: DEFAULT_CLEAR_DEPTH,
        })
    }

    /// Override the clear values
    pub fn with_clear(mut self, color: [f32; 4], depth: f32) -> Self {
        self.clear_color = color;
        self.clear_depth = depth;
        self
    }

    pub fn shader(&self) -> &ShaderProgram {
        &self.shader
    }

    pub fn geometry(&self) -> &CubeGeometry {
        &self.geometry
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Render one frame of the cube.
    ///
    /// `angle` is the rotation applied to the model this frame; `canvas` is
    /// the drawable size in pixels.
    pub fn render(
        &self,
        ctx: &mut dyn GraphicsContext,
        transforms: &mut TransformPipeline,
        angle: f32,
        canvas: (u32, u32),
    ) {
        transforms.rotate(angle);

        ctx.enable(Capability::DepthTest);
        ctx.depth_func(DepthFunc::LessEqual);
        ctx.disable(Capability::ScissorTest);

        ctx.clear_color(self.clear_color);
        ctx.clear_depth(self.clear_depth);
        ctx.viewport(Rect::full(canvas.0, canvas.1));
        ctx.clear(ClearFlags::COLOR | ClearFlags::DEPTH);

        ctx.use_program(Some(self.shader.program));
        self.shader.bind_attributes(ctx, &self.geometry);

        ctx.uniform_matrix4(self.shader.projection, transforms.projection());
        ctx.uniform_matrix4(self.shader.view, transforms.view());
        ctx.uniform_matrix4(self.shader.model, transforms.model());

        ctx.bind_index_buffer(Some(self.geometry.indices));
        ctx.draw_indexed(self.geometry.index_count);

        log::trace!("manual pass drew {} indices at angle {}", self.geometry.index_count, angle);
    }
}
