//! marsview
//!
//! A lightweight, cross-platform 3D scene viewer for a fixed catalog of glTF
//! assets. The crate bootstraps a wgpu rendering context on a winit window
//! (an HTML canvas on the web), loads every catalog entry concurrently,
//! places the resulting scene-graph nodes with per-asset transforms, and runs
//! a continuous render loop with orbit camera controls, keyframe animation
//! playback and a fullscreen presentation toggle.
//!
//! High-level modules
//! - `camera`: orbit camera, projection and the view/projection uniform
//! - `context`: central GPU context that owns surface/device/pipeline state
//! - `data_structures`: meshes, materials, instances and the scene graph
//! - `resources`: glTF/texture loading for native file IO and web fetches
//! - `scene`: asset descriptors, the placement pipeline and the registry
//! - `viewer`: the application event loop
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod resources;
pub mod scene;
pub mod viewer;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    if let Err(e) = viewer::run() {
        log::error!("viewer exited with an error: {e:#}");
    }
}
