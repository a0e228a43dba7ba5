//! wgpu rendering for the lunar phase viewer.

pub mod camera;
pub mod color;
pub mod frame;
pub mod mesh;
pub mod mosaic;
pub mod pipeline;
pub mod readback;
pub mod renderer;
pub mod texture;
pub mod vertex;

pub use camera::*;
pub use color::*;
pub use frame::*;
pub use mesh::*;
pub use mosaic::*;
pub use pipeline::*;
pub use readback::*;
pub use renderer::*;
pub use texture::*;
pub use vertex::*;
