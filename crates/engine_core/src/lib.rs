//! Core types shared by the lunar phase crates.
//!
//! - Transform for placing the moon mesh
//! - Frame timing for the redraw loop

pub mod time;
pub mod transform;

pub use time::*;
pub use transform::*;
