//! CPU-side graphics context
//!
//! `HeadlessContext` keeps the same global state a GPU context would, owns a
//! color and depth framebuffer for clears, and records every accepted draw
//! together with the state it was issued under. Draws are not rasterized:
//! the draw log is the observable result.
//!
//! "Compilation" checks that the source defines both entry points and
//! "linking" checks that every declared uniform and attribute name appears
//! in the source. Buffer creation can be made to fail with
//! [`HeadlessContext::set_buffer_budget`].

use duoframe_math::{Mat4, IDENTITY};
use slotmap::SlotMap;

use super::{
    draw_blocker, AttribLocation, BufferDesc, BufferId, BufferKind, ClearFlags, DepthFunc,
    DeviceState, GraphicsContext, ProgramDesc, ProgramId, Rect, UniformLocation, VertexAttrib,
};
use crate::error::SetupError;

struct HeadlessBuffer {
    kind: BufferKind,
    len: usize,
}

struct HeadlessProgram {
    label: String,
    uniforms: Vec<String>,
    attributes: Vec<String>,
    values: Vec<Mat4>,
}

/// A draw accepted by the headless context, with the state it saw
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: ProgramId,
    pub index_buffer: BufferId,
    pub index_count: u32,
    pub viewport: Rect,
    pub depth: Option<DepthFunc>,
    pub scissor: Option<Rect>,
    /// Uniform values of the program at draw time, in block order
    pub uniforms: Vec<Mat4>,
    /// Attribute pointers the program read from
    pub attribs: Vec<VertexAttrib>,
}

/// Graphics context backed by CPU memory
pub struct HeadlessContext {
    state: DeviceState,
    width: u32,
    height: u32,
    /// Row-major, row 0 is the bottom of the canvas
    color: Vec<[f32; 4]>,
    depth: Vec<f32>,
    buffers: SlotMap<BufferId, HeadlessBuffer>,
    programs: SlotMap<ProgramId, HeadlessProgram>,
    draws: Vec<DrawCall>,
    rejected_draws: usize,
    buffer_budget: Option<usize>,
}

impl HeadlessContext {
    pub fn new(width: u32, height: u32) -> Self {
        let pixels = (width as usize) * (height as usize);
        Self {
            state: DeviceState::new(width, height),
            width,
            height,
            color: vec![[0.0; 4]; pixels],
            depth: vec![1.0; pixels],
            buffers: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            draws: Vec::new(),
            rejected_draws: 0,
            buffer_budget: None,
        }
    }

    /// Reallocate the framebuffer. Contents are reset; device state is kept.
    pub fn resize(&mut self, width: u32, height: u32) {
        let pixels = (width as usize) * (height as usize);
        self.width = width;
        self.height = height;
        self.color = vec![[0.0; 4]; pixels];
        self.depth = vec![1.0; pixels];
    }

    /// Limit how many more buffers may be created. `None` removes the limit.
    pub fn set_buffer_budget(&mut self, budget: Option<usize>) {
        self.buffer_budget = budget;
    }

    /// Drop every resource, as a lost GPU context would.
    ///
    /// Handles held by callers become dangling and draws through them are rejected.
    pub fn lose_context(&mut self) {
        log::warn!(
            "headless context lost ({} buffers, {} programs)",
            self.buffers.len(),
            self.programs.len()
        );
        self.buffers.clear();
        self.programs.clear();
        self.state = DeviceState::new(self.width, self.height);
    }

    /// Color at a pixel (origin lower-left)
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        self.index_of(x, y).map(|i| self.color[i])
    }

    /// Depth at a pixel (origin lower-left)
    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        self.index_of(x, y).map(|i| self.depth[i])
    }

    /// Every draw accepted so far
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Take the draw log, leaving it empty
    pub fn take_draws(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draws)
    }

    /// Number of draws dropped because required state was missing
    pub fn rejected_draws(&self) -> usize {
        self.rejected_draws
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Current value of a program uniform
    pub fn uniform_value(&self, program: ProgramId, location: UniformLocation) -> Option<Mat4> {
        self.programs
            .get(program)
            .and_then(|p| p.values.get(location.index()).copied())
    }

    fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize) * (self.width as usize) + x as usize)
    }

    fn clear_region(&self) -> Option<Rect> {
        if self.state.scissor_test {
            self.state.scissor.clamped(self.width, self.height)
        } else {
            Rect::full(self.width, self.height).clamped(self.width, self.height)
        }
    }

    fn check_draw(&self, index_count: u32) -> Result<DrawCall, String> {
        let program_id = self.state.program.ok_or("no program bound")?;
        let program = self
            .programs
            .get(program_id)
            .ok_or("bound program does not exist")?;

        if let Some(reason) = draw_blocker(&self.state, program.attributes.len()) {
            return Err(reason);
        }

        let index_id = self.state.index_buffer.ok_or("no index buffer bound")?;
        let index_buffer = self
            .buffers
            .get(index_id)
            .ok_or("bound index buffer does not exist")?;
        if index_buffer.kind != BufferKind::Index {
            return Err("bound index buffer is not an index buffer".to_string());
        }
        if index_buffer.len < index_count as usize * 2 {
            return Err(format!(
                "{} indices requested, buffer holds {}",
                index_count,
                index_buffer.len / 2
            ));
        }

        let attribs: Vec<VertexAttrib> = self.state.attribs[..program.attributes.len()].to_vec();
        for attrib in &attribs {
            let vertex_buffer = attrib
                .buffer
                .and_then(|id| self.buffers.get(id))
                .ok_or("attribute buffer does not exist")?;
            if vertex_buffer.kind != BufferKind::Vertex {
                return Err("attribute buffer is not a vertex buffer".to_string());
            }
        }

        Ok(DrawCall {
            program: program_id,
            index_buffer: index_id,
            index_count,
            viewport: self.state.viewport,
            depth: self.state.effective_depth(),
            scissor: self.state.scissor_test.then_some(self.state.scissor),
            uniforms: program.values.clone(),
            attribs,
        })
    }
}

impl GraphicsContext for HeadlessContext {
    fn state(&self) -> &DeviceState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DeviceState {
        &mut self.state
    }

    fn drawable_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferId, SetupError> {
        desc.validate()?;

        if let Some(budget) = self.buffer_budget.as_mut() {
            if *budget == 0 {
                return Err(SetupError::BufferCreation {
                    label: desc.label.to_string(),
                    reason: "out of memory".to_string(),
                });
            }
            *budget -= 1;
        }

        let id = self.buffers.insert(HeadlessBuffer {
            kind: desc.kind,
            len: desc.contents.len(),
        });
        log::debug!("created {:?} buffer '{}' ({} bytes)", desc.kind, desc.label, desc.contents.len());
        Ok(id)
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, SetupError> {
        for entry in [desc.vertex_entry, desc.fragment_entry] {
            if !desc.source.contains(&format!("fn {}", entry)) {
                return Err(SetupError::ShaderCompile {
                    label: desc.label.to_string(),
                    log: format!("entry point '{}' not found", entry),
                });
            }
        }

        desc.validate()?;

        let names = desc
            .uniforms
            .iter()
            .copied()
            .chain(desc.attributes.iter().map(|a| a.name));
        for name in names {
            if !desc.source.contains(name) {
                return Err(SetupError::ProgramLink {
                    label: desc.label.to_string(),
                    log: format!("'{}' is not referenced by the shader", name),
                });
            }
        }

        let id = self.programs.insert(HeadlessProgram {
            label: desc.label.to_string(),
            uniforms: desc.uniforms.iter().map(|s| s.to_string()).collect(),
            attributes: desc.attributes.iter().map(|a| a.name.to_string()).collect(),
            values: vec![IDENTITY; desc.uniforms.len()],
        });
        log::debug!("linked program '{}'", desc.label);
        Ok(id)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let program = self.programs.get(program)?;
        program
            .uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| UniformLocation(i as u32))
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        let program = self.programs.get(program)?;
        program
            .attributes
            .iter()
            .position(|a| a == name)
            .map(|i| AttribLocation(i as u32))
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, value: &Mat4) {
        let Some(program) = self.state.program.and_then(|id| self.programs.get_mut(id)) else {
            log::warn!("uniform_matrix4 with no valid program bound");
            return;
        };
        match program.values.get_mut(location.index()) {
            Some(slot) => *slot = *value,
            None => log::warn!(
                "uniform location {} out of range for program '{}'",
                location.index(),
                program.label
            ),
        }
    }

    fn clear(&mut self, mask: ClearFlags) {
        let Some(region) = self.clear_region() else {
            return;
        };

        let color = self.state.clear_color.map(|c| c.clamp(0.0, 1.0));
        let depth = self.state.clear_depth.clamp(0.0, 1.0);

        for y in region.y as u32..region.y as u32 + region.height {
            let row = (y as usize) * (self.width as usize);
            let start = row + region.x as usize;
            let end = start + region.width as usize;
            if mask.contains(ClearFlags::COLOR) {
                self.color[start..end].fill(color);
            }
            if mask.contains(ClearFlags::DEPTH) {
                self.depth[start..end].fill(depth);
            }
        }
    }

    fn draw_indexed(&mut self, index_count: u32) {
        match self.check_draw(index_count) {
            Ok(draw) => {
                log::trace!("draw {} indices", index_count);
                self.draws.push(draw);
            }
            Err(reason) => {
                log::error!("draw rejected: {}", reason);
                self.rejected_draws += 1;
            }
        }
    }
}
