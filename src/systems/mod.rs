//! Application systems
//!
//! Window and rendering concerns kept out of main.rs.

mod render;
mod window;

pub use render::{RenderError, RenderSystem};
pub use window::{WindowError, WindowSystem};
