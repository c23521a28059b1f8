//! Voxel module - Frame data model and pure operations over frames.

mod frame;
mod generator;
mod transform;
mod tween;

pub use frame::*;
pub use generator::*;
pub use transform::*;
pub use tween::*;
