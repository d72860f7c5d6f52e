//! Engine data structures: models, textures, scene graph, and instances.
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds per-node transformation data and its GPU layout
//! - `scene_graph` enables hierarchical scene organization with animations

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
