//! The Mars scene itself: which assets exist, where they go, how their
//! animations play, and how loaded models are tracked for the render loop.

pub mod animation;
pub mod descriptor;
pub mod place;
pub mod planet;
pub mod registry;
