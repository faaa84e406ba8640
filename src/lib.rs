//! duoframe - a hand-written cube pass and a scene renderer sharing one GPU context
//!
//! The library half of the application: configuration, logging setup, the
//! overlay scene and the window/render systems used by the binary.

pub mod config;
pub mod logging;
pub mod scene;
pub mod systems;
