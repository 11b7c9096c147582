pub mod backend;
pub mod compat;
pub mod error;
pub mod renderer;
pub mod screenshot;
pub mod selector;
pub mod wgpu_renderer;

pub use backend::BackendKind;
pub use compat::{CompatRule, DEFAULT_COMPAT_RULES};
pub use error::RendererError;
pub use renderer::{Frame, Renderer, VideoMode};
pub use selector::{create_renderer, BackendFactory, SelectionConfig};
pub use wgpu_renderer::{WgpuBackendFactory, WgpuRenderer};
