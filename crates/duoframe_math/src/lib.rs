//! Transform math for the manual render pass
//!
//! This crate provides the hand-rolled 4x4 matrix pipeline used to place the
//! cube on screen: a perspective projection, a fixed camera offset, and a
//! model matrix that accumulates rotation frame over frame.
//!
//! ## Core Types
//!
//! - [`Mat4`] - flat 16-element matrix (column-major storage, GL layout)
//! - [`TransformPipeline`] - owns the projection, view and model matrices
//! - [`ProjectionParams`] - field of view and clip planes

pub mod mat4;
pub mod transform;

pub use mat4::{Mat4, IDENTITY};
pub use transform::{ProjectionParams, TransformPipeline};
