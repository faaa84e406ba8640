//! Two renderers, one GPU context
//!
//! A hand-written cube pass and an external scene renderer draw into the
//! same context every frame. The pieces:
//! - [`context`] - the shared GL-style context, with wgpu and headless backends
//! - [`geometry`] / [`shader`] - one-time resource setup for the cube
//! - [`manual_pass`] - the per-frame cube draw
//! - [`external`] - the interface of the renderer drawn on top
//! - [`coordinator`] - frame ordering, resize, clock and context loss

pub mod clock;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod external;
pub mod geometry;
pub mod manual_pass;
pub mod shader;

pub use clock::{FrameClock, FrameTime};
pub use context::{
    BufferId, Capability, ClearFlags, DepthFunc, DeviceState, GraphicsContext, HeadlessContext,
    ProgramId, Rect, SurfaceErrorAction, WgpuContext,
};
pub use coordinator::{CoordinatorSettings, CoordinatorState, FrameCoordinator, FrameStatus};
pub use error::SetupError;
pub use external::ExternalSceneRenderer;
pub use geometry::CubeGeometry;
pub use manual_pass::ManualRenderPass;
pub use shader::ShaderProgram;
