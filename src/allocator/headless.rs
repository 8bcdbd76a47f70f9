//! An allocator that does not talk to a GPU. Useful for tests, tools and for validating graphs offline.

use std::collections::HashMap;

use anyhow::Result;

use crate::core::error::Error;
use crate::graph::resource::TextureDescriptor;
use crate::allocator::traits::ResourceAllocator;

/// Texture handle returned by the [`HeadlessAllocator`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HeadlessTexture {
    /// Unique id of this texture. Ids are never reused by the same allocator.
    pub id: u64,
    /// The descriptor this texture was created with.
    pub desc: TextureDescriptor,
}

/// Hands out unique texture ids and keeps track of which textures are alive.
///
/// # Example
/// ```
/// use deimos::prelude::*;
///
/// let mut allocator = HeadlessAllocator::new();
/// let texture = allocator.create_texture("color", &TextureDescriptor::default())?;
/// assert_eq!(allocator.live_count(), 1);
/// allocator.destroy_texture(texture)?;
/// assert_eq!(allocator.live_count(), 0);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct HeadlessAllocator {
    next_id: u64,
    live: HashMap<u64, String>,
    peak: usize,
}

impl HeadlessAllocator {
    /// Create a new headless allocator with no live textures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount of textures that were created but not yet destroyed.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Highest amount of textures that were alive at the same time.
    pub fn peak_count(&self) -> usize {
        self.peak
    }

    /// Total amount of textures ever created by this allocator.
    pub fn total_created(&self) -> u64 {
        self.next_id
    }

    /// Whether a texture with this name is currently alive.
    pub fn is_live(&self, name: &str) -> bool {
        self.live.values().any(|live| live == name)
    }
}

impl ResourceAllocator for HeadlessAllocator {
    type Texture = HeadlessTexture;

    fn create_texture(&mut self, name: &str, desc: &TextureDescriptor) -> Result<Self::Texture> {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id, name.to_owned());
        self.peak = self.peak.max(self.live.len());
        Ok(HeadlessTexture {
            id,
            desc: *desc,
        })
    }

    fn destroy_texture(&mut self, texture: Self::Texture) -> Result<()> {
        self.live
            .remove(&texture.id)
            .map(|_| ())
            .ok_or_else(|| Error::UnknownTexture(texture.id.to_string()).into())
    }
}
