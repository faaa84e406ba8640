//! The shared graphics context
//!
//! Both renderers draw through one [`GraphicsContext`]. The trait exposes a
//! GL-style immediate-mode API on top of explicit global state: the bound
//! program, bound index buffer, vertex attribute pointers, depth and scissor
//! configuration, clear values and viewport all live in a [`DeviceState`]
//! that any caller may change at any time.
//!
//! Nothing here restores state on behalf of a caller. A pass that depends on
//! a piece of state sets it immediately before use.
//!
//! Backends:
//! - [`WgpuContext`] - a real device and window surface
//! - [`HeadlessContext`] - CPU framebuffer and draw log, no GPU required

pub mod headless;
pub mod wgpu_context;

use bitflags::bitflags;
use duoframe_math::Mat4;
use slotmap::new_key_type;

use crate::error::SetupError;

pub use headless::{DrawCall, HeadlessContext};
pub use wgpu_context::{SurfaceErrorAction, WgpuContext};

/// Number of vertex attribute slots tracked by the device state
pub const MAX_VERTEX_ATTRIBS: usize = 8;

new_key_type! {
    /// Handle to a buffer created through [`GraphicsContext::create_buffer`]
    pub struct BufferId;
    /// Handle to a linked program created through [`GraphicsContext::create_program`]
    pub struct ProgramId;
}

bitflags! {
    /// Buffers affected by [`GraphicsContext::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// What a buffer will be bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Per-vertex attribute data (`f32` components)
    Vertex,
    /// Triangle indices (`u16`)
    Index,
}

/// Description of a buffer to create and fill once
#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub kind: BufferKind,
    pub contents: &'a [u8],
}

impl BufferDesc<'_> {
    pub(crate) fn validate(&self) -> Result<(), SetupError> {
        if self.contents.is_empty() {
            return Err(SetupError::BufferCreation {
                label: self.label.to_string(),
                reason: "buffer contents are empty".to_string(),
            });
        }
        if self.kind == BufferKind::Index && self.contents.len() % 2 != 0 {
            return Err(SetupError::BufferCreation {
                label: self.label.to_string(),
                reason: "index data is not a whole number of u16 indices".to_string(),
            });
        }
        Ok(())
    }
}

/// A vertex attribute declared by a program
#[derive(Debug, Clone, Copy)]
pub struct AttributeDesc<'a> {
    pub name: &'a str,
    /// Number of `f32` components per vertex
    pub components: u32,
}

/// Description of a program to compile and link.
///
/// `uniforms` lists the `mat4` uniforms in block order; `attributes` are
/// assigned locations in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    /// WGSL source holding both stages
    pub source: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub uniforms: &'a [&'a str],
    pub attributes: &'a [AttributeDesc<'a>],
}

impl ProgramDesc<'_> {
    pub(crate) fn validate(&self) -> Result<(), SetupError> {
        let link_error = |log: String| SetupError::ProgramLink {
            label: self.label.to_string(),
            log,
        };

        if self.attributes.len() > MAX_VERTEX_ATTRIBS {
            return Err(link_error(format!(
                "{} attributes declared, at most {} supported",
                self.attributes.len(),
                MAX_VERTEX_ATTRIBS
            )));
        }
        for attr in self.attributes {
            if !(1..=4).contains(&attr.components) {
                return Err(link_error(format!(
                    "attribute '{}' has {} components",
                    attr.name, attr.components
                )));
            }
        }

        let mut names: Vec<&str> = self
            .uniforms
            .iter()
            .copied()
            .chain(self.attributes.iter().map(|a| a.name))
            .collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(link_error(format!("'{}' is declared twice", pair[0])));
        }
        Ok(())
    }
}

/// Location of a `mat4` uniform within its program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub(crate) u32);

impl UniformLocation {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Location of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttribLocation(pub(crate) u32);

impl AttribLocation {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Toggleable pipeline capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    DepthTest,
    ScissorTest,
}

/// A pixel rectangle with its origin at the lower-left corner of the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering a whole canvas
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Intersect with a `width` x `height` target.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the target.
    pub fn clamped(&self, width: u32, height: u32) -> Option<Rect> {
        let x0 = i64::from(self.x).clamp(0, i64::from(width));
        let y0 = i64::from(self.y).clamp(0, i64::from(height));
        let x1 = (i64::from(self.x) + i64::from(self.width)).clamp(0, i64::from(width));
        let y1 = (i64::from(self.y) + i64::from(self.height)).clamp(0, i64::from(height));

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::new(x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

/// Attribute pointer set by [`GraphicsContext::vertex_attrib_pointer`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VertexAttrib {
    /// Whether the attribute array is enabled
    pub enabled: bool,
    /// Buffer the attribute reads from
    pub buffer: Option<BufferId>,
    /// Components per vertex
    pub components: u32,
}

/// Complete global state of the shared context.
///
/// Initial values match a freshly created GL context: black transparent
/// clear color, depth test off, `Less` depth function, full-canvas viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    pub viewport: Rect,
    pub scissor: Rect,
    pub clear_color: [f32; 4],
    pub clear_depth: f32,
    pub depth_test: bool,
    pub scissor_test: bool,
    pub depth_func: DepthFunc,
    pub program: Option<ProgramId>,
    pub index_buffer: Option<BufferId>,
    pub attribs: [VertexAttrib; MAX_VERTEX_ATTRIBS],
}

impl DeviceState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Rect::full(width, height),
            scissor: Rect::full(width, height),
            clear_color: [0.0, 0.0, 0.0, 0.0],
            clear_depth: 1.0,
            depth_test: false,
            scissor_test: false,
            depth_func: DepthFunc::Less,
            program: None,
            index_buffer: None,
            attribs: [VertexAttrib::default(); MAX_VERTEX_ATTRIBS],
        }
    }

    /// Depth comparison in effect, or `None` when depth testing is off
    pub fn effective_depth(&self) -> Option<DepthFunc> {
        self.depth_test.then_some(self.depth_func)
    }
}

/// Immediate-mode access to the shared context.
///
/// Resource creation is fallible and reports [`SetupError`]. Per-frame calls
/// never fail: misuse (no program bound, missing attribute buffer) is logged
/// and the call is dropped, leaving the framebuffer untouched.
pub trait GraphicsContext {
    /// Current global state
    fn state(&self) -> &DeviceState;

    /// Mutable global state
    fn state_mut(&mut self) -> &mut DeviceState;

    /// Size of the default framebuffer in pixels
    fn drawable_size(&self) -> (u32, u32);

    /// Create a buffer and upload its contents once
    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferId, SetupError>;

    /// Compile and link a program
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, SetupError>;

    /// Look up a `mat4` uniform of a linked program
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Look up a vertex attribute of a linked program
    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation>;

    /// Write a `mat4` uniform of the currently bound program
    fn uniform_matrix4(&mut self, location: UniformLocation, value: &Mat4);

    /// Clear the selected buffers, honoring the scissor test
    fn clear(&mut self, mask: ClearFlags);

    /// Draw `index_count` indices from the bound index buffer as a triangle list
    fn draw_indexed(&mut self, index_count: u32);

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.state_mut().program = program;
    }

    fn bind_index_buffer(&mut self, buffer: Option<BufferId>) {
        self.state_mut().index_buffer = buffer;
    }

    fn vertex_attrib_pointer(&mut self, location: AttribLocation, buffer: BufferId, components: u32) {
        if let Some(attrib) = self.state_mut().attribs.get_mut(location.index()) {
            attrib.buffer = Some(buffer);
            attrib.components = components;
        } else {
            log::warn!("vertex_attrib_pointer: location {} out of range", location.index());
        }
    }

    fn enable_vertex_attrib(&mut self, location: AttribLocation) {
        set_attrib_enabled(self.state_mut(), location, true);
    }

    fn disable_vertex_attrib(&mut self, location: AttribLocation) {
        set_attrib_enabled(self.state_mut(), location, false);
    }

    fn enable(&mut self, capability: Capability) {
        set_capability(self.state_mut(), capability, true);
    }

    fn disable(&mut self, capability: Capability) {
        set_capability(self.state_mut(), capability, false);
    }

    fn depth_func(&mut self, func: DepthFunc) {
        self.state_mut().depth_func = func;
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.state_mut().clear_color = rgba;
    }

    fn clear_depth(&mut self, depth: f32) {
        self.state_mut().clear_depth = depth;
    }

    fn viewport(&mut self, rect: Rect) {
        self.state_mut().viewport = rect;
    }

    fn scissor(&mut self, rect: Rect) {
        self.state_mut().scissor = rect;
    }
}

fn set_attrib_enabled(state: &mut DeviceState, location: AttribLocation, enabled: bool) {
    match state.attribs.get_mut(location.index()) {
        Some(attrib) => attrib.enabled = enabled,
        None => log::warn!("vertex attribute location {} out of range", location.index()),
    }
}

fn set_capability(state: &mut DeviceState, capability: Capability, enabled: bool) {
    match capability {
        Capability::DepthTest => state.depth_test = enabled,
        Capability::ScissorTest => state.scissor_test = enabled,
    }
}

/// Checks shared by every backend before a draw is issued.
///
/// Returns the reason the draw cannot proceed, if any.
pub(crate) fn draw_blocker(state: &DeviceState, attribute_count: usize) -> Option<String> {
    if state.program.is_none() {
        return Some("no program bound".to_string());
    }
    if state.index_buffer.is_none() {
        return Some("no index buffer bound".to_string());
    }
    for (index, attrib) in state.attribs.iter().take(attribute_count).enumerate() {
        if !attrib.enabled {
            return Some(format!("attribute {} is not enabled", index));
        }
        if attrib.buffer.is_none() {
            return Some(format!("attribute {} has no buffer", index));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_clamped_inside() {
        let r = Rect::new(10, 20, 30, 40);
        assert_eq!(r.clamped(100, 100), Some(r));
    }

    #[test]
    fn test_rect_clamped_partial() {
        let r = Rect::new(-10, 90, 50, 50);
        assert_eq!(r.clamped(100, 100), Some(Rect::new(0, 90, 40, 10)));
    }

    #[test]
    fn test_rect_clamped_outside() {
        assert_eq!(Rect::new(200, 0, 10, 10).clamped(100, 100), None);
        assert_eq!(Rect::new(0, 0, 0, 10).clamped(100, 100), None);
    }

    #[test]
    fn test_device_state_defaults() {
        let state = DeviceState::new(640, 480);
        assert_eq!(state.viewport, Rect::full(640, 480));
        assert!(!state.depth_test);
        assert_eq!(state.depth_func, DepthFunc::Less);
        assert_eq!(state.clear_depth, 1.0);
        assert!(state.program.is_none());
        assert_eq!(state.effective_depth(), None);
    }

    #[test]
    fn test_effective_depth() {
        let mut state = DeviceState::new(1, 1);
        state.depth_test = true;
        state.depth_func = DepthFunc::LessEqual;
        assert_eq!(state.effective_depth(), Some(DepthFunc::LessEqual));
    }

    #[test]
    fn test_draw_blocker_reports_missing_program() {
        let state = DeviceState::new(1, 1);
        assert_eq!(draw_blocker(&state, 0).as_deref(), Some("no program bound"));
    }

    #[test]
    fn test_buffer_desc_rejects_empty() {
        let desc = BufferDesc {
            label: "empty",
            kind: BufferKind::Vertex,
            contents: &[],
        };
        assert!(matches!(desc.validate(), Err(SetupError::BufferCreation { .. })));
    }

    #[test]
    fn test_buffer_desc_rejects_odd_index_bytes() {
        let desc = BufferDesc {
            label: "indices",
            kind: BufferKind::Index,
            contents: &[0, 1, 2],
        };
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_program_desc_rejects_duplicate_names() {
        let desc = ProgramDesc {
            label: "dup",
            source: "",
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            uniforms: &["a", "b"],
            attributes: &[AttributeDesc { name: "a", components: 3 }],
        };
        assert!(matches!(desc.validate(), Err(SetupError::ProgramLink { .. })));
    }

    #[test]
    fn test_program_desc_rejects_bad_component_count() {
        let desc = ProgramDesc {
            label: "bad",
            source: "",
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            uniforms: &[],
            attributes: &[AttributeDesc { name: "position", components: 5 }],
        };
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_clear_flags() {
        let both = ClearFlags::COLOR | ClearFlags::DEPTH;
        assert!(both.contains(ClearFlags::COLOR));
        assert!(both.contains(ClearFlags::DEPTH));
        assert!(!ClearFlags::COLOR.contains(ClearFlags::DEPTH));
    }
}
