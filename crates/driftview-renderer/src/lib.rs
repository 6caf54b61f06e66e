pub mod camera;
pub mod frame;
pub mod gpu;
pub mod mesh;
pub mod pipeline;

pub use frame::{Frame, PathRenderer};
pub use gpu::{GpuRenderer, RenderError};
pub use mesh::{tessellate, PathMesh};
