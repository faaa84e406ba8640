//! The manual pass's shader program and its resolved bindings

use crate::context::{
    AttribLocation, AttributeDesc, GraphicsContext, ProgramDesc, ProgramId, UniformLocation,
};
use crate::error::SetupError;
use crate::geometry::CubeGeometry;

/// WGSL source for the cube program
pub const CUBE_SHADER_SOURCE: &str = include_str!("shaders/cube.wgsl");

const UNIFORMS: [&str; 3] = ["Pmatrix", "Vmatrix", "Mmatrix"];

const ATTRIBUTES: [AttributeDesc<'static>; 2] = [
    AttributeDesc { name: "position", components: 3 },
    AttributeDesc { name: "color", components: 3 },
];

/// A linked program with every location the manual pass needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderProgram {
    pub program: ProgramId,
    pub projection: UniformLocation,
    pub view: UniformLocation,
    pub model: UniformLocation,
    pub position: AttribLocation,
    pub color: AttribLocation,
}

impl ShaderProgram {
    /// Compile and link the cube program, then resolve its bindings
    pub fn build(ctx: &mut dyn GraphicsContext) -> Result<Self, SetupError> {
        Self::build_from_source(ctx, CUBE_SHADER_SOURCE)
    }

    /// Same as [`ShaderProgram::build`] with caller-supplied WGSL.
    ///
    /// The source must define `vs_main` and `fs_main` and use the same
    /// uniform block and attribute names as the cube shader.
    pub fn build_from_source(ctx: &mut dyn GraphicsContext, source: &str) -> Result<Self, SetupError> {
        let program = ctx.create_program(&ProgramDesc {
            label: "cube",
            source,
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            uniforms: &UNIFORMS,
            attributes: &ATTRIBUTES,
        })?;

        let uniform = |name: &str| {
            ctx.uniform_location(program, name)
                .ok_or_else(|| SetupError::MissingBinding(name.to_string()))
        };
        let projection = uniform("Pmatrix")?;
        let view = uniform("Vmatrix")?;
        let model = uniform("Mmatrix")?;

        let attrib = |name: &str| {
            ctx.attrib_location(program, name)
                .ok_or_else(|| SetupError::MissingBinding(name.to_string()))
        };
        let position = attrib("position")?;
        let color = attrib("color")?;

        log::info!("Linked cube program");
        Ok(Self {
            program,
            projection,
            view,
            model,
            position,
            color,
        })
    }

    /// Point the attributes at the cube buffers and enable both arrays
    pub fn bind_attributes(&self, ctx: &mut dyn GraphicsContext, geometry: &CubeGeometry) {
        ctx.vertex_attrib_pointer(self.position, geometry.vertices, 3);
        ctx.enable_vertex_attrib(self.position);
        ctx.vertex_attrib_pointer(self.color, geometry.colors, 3);
        ctx.enable_vertex_attrib(self.color);
    }
}
