use anyhow::Result;

use crate::core::error::Error;
use crate::graph::handle::ResourceHandle;
use crate::graph::resource::{ResourceRegistry, TextureDescriptor};

/// Resolves virtual resource handles to the concrete textures backing them while a pass executes.
///
/// Lookups only use the slot index of a handle. A pass may hold handles that later passes made stale, they still
/// resolve to the same texture. Moved resources resolve to the texture of the resource they were moved from.
///
/// # Example
/// ```
/// use deimos::prelude::*;
///
/// fn draw(resources: &PassResources<HeadlessTexture>, target: ResourceHandle) -> anyhow::Result<()> {
///     let texture = resources.try_texture(target)?;
///     println!("drawing into texture {}", texture.id);
///     Ok(())
/// }
/// ```
pub struct PassResources<'a, T> {
    registry: &'a ResourceRegistry,
    textures: &'a [Option<T>],
}

impl<'a, T> PassResources<'a, T> {
    pub(crate) fn new(registry: &'a ResourceRegistry, textures: &'a [Option<T>]) -> Self {
        Self {
            registry,
            textures,
        }
    }

    fn physical(&self, handle: ResourceHandle) -> Option<u16> {
        self.registry.slot(handle)?;
        Some(self.registry.physical(handle.index()))
    }

    /// Resolve a handle to its texture. Returns `None` if the handle is invalid or the resource is not allocated
    /// at this point in the frame.
    pub fn texture(&self, handle: ResourceHandle) -> Option<&'a T> {
        let index = self.physical(handle)?;
        self.textures.get(index as usize)?.as_ref()
    }

    /// Resolve a handle to its texture.
    /// # Errors
    /// * Fails if the handle is invalid, or if no texture is bound to the resource at this point in the frame.
    pub fn try_texture(&self, handle: ResourceHandle) -> Result<&'a T> {
        let slot = self.registry.slot(handle).ok_or(Error::InvalidHandle)?;
        self.texture(handle)
            .ok_or_else(|| Error::NoResourceBound(slot.name().to_owned()).into())
    }

    /// Descriptor of the texture backing this handle.
    pub fn descriptor(&self, handle: ResourceHandle) -> Option<&'a TextureDescriptor> {
        let index = self.physical(handle)?;
        Some(self.registry.slot_at(index).descriptor())
    }

    /// Debug name of the resource this handle refers to.
    pub fn name(&self, handle: ResourceHandle) -> Option<&'a str> {
        self.registry.slot(handle).map(|slot| slot.name())
    }
}
