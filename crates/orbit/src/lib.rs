//! Lunar phase geometry.
//!
//! Everything here is a pure function of the phase value and the fixed sun
//! direction: where the moon sits on its orbit, how it is rotated so the same
//! face points at the camera, and how the sun looks from the camera's eye
//! space. The relief module mirrors the displacement shader on the CPU.

pub mod geometry;
pub mod phase;
pub mod relief;

pub use geometry::*;
pub use phase::*;
pub use relief::*;
