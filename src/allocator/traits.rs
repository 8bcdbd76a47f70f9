use std::fmt::Debug;

use anyhow::Result;

use crate::graph::resource::TextureDescriptor;

/// Creates and destroys the concrete textures backing transient frame graph resources.
///
/// The frame graph never interprets the texture handles this returns. It only forwards them to pass callbacks
/// through [`PassResources`](crate::PassResources) and back to [`ResourceAllocator::destroy_texture`].
/// Implementations are only ever called from the thread executing the graph.
pub trait ResourceAllocator {
    /// Opaque texture handle.
    type Texture: Debug;

    /// Create a texture matching the descriptor. `name` is a debug name.
    fn create_texture(&mut self, name: &str, desc: &TextureDescriptor) -> Result<Self::Texture>;
    /// Destroy a texture previously obtained from [`ResourceAllocator::create_texture`].
    fn destroy_texture(&mut self, texture: Self::Texture) -> Result<()>;
}

impl<A: ResourceAllocator> ResourceAllocator for &mut A {
    type Texture = A::Texture;

    fn create_texture(&mut self, name: &str, desc: &TextureDescriptor) -> Result<Self::Texture> {
        (**self).create_texture(name, desc)
    }

    fn destroy_texture(&mut self, texture: Self::Texture) -> Result<()> {
        (**self).destroy_texture(texture)
    }
}
