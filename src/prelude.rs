pub use ash::vk;

pub use crate::core::error::Error;
pub use crate::core::settings::{GraphSettings, GraphSettingsBuilder};

pub use crate::allocator::traits::*;
pub use crate::allocator::headless::{HeadlessAllocator, HeadlessTexture};

pub use crate::graph::handle::ResourceHandle;
pub use crate::graph::resource::{CreateFlags, ResourceOrigin, TextureDescriptor};
pub use crate::graph::pass::{PassExecutor, PassFnResult, PassId, PassView};
pub use crate::graph::builder::PassBuilder;
pub use crate::graph::physical_resource::PassResources;
pub use crate::graph::compile::CompileSummary;
pub use crate::graph::frame_graph::FrameGraph;
pub use crate::graph::viz::GraphViz;
