//! Scenes drawn by the external renderer
//!
//! The application ships one: a panel overlay composited over the cube.

mod overlay;

pub use overlay::PanelScene;
