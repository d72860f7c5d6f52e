//! Render pipeline construction.
//!
//! - `basic` builds the textured, normal-mapped model pipeline
//! - `light` owns the light uniform and its bind group

pub mod basic;
pub mod light;
