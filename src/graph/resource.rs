//! Resource descriptors and the per-frame resource registry.

use ash::vk;

use crate::core::error::Error;
use crate::graph::handle::ResourceHandle;
use crate::graph::pass::PassId;

/// Describes a texture to be created by the [`ResourceAllocator`](crate::ResourceAllocator)
/// when the graph devirtualizes it.
///
/// # Example
/// ```
/// use deimos::prelude::*;
///
/// let desc = TextureDescriptor::new_2d(1920, 1080, vk::Format::R16G16B16A16_SFLOAT)
///     .usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Dimensionality of the texture.
    pub ty: vk::ImageType,
    /// Amount of mip levels.
    pub levels: u32,
    /// Texel format.
    pub format: vk::Format,
    /// Sample count. Textures that are sampled in a shader are always created single-sampled.
    pub samples: vk::SampleCountFlags,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth in texels, or the amount of array layers.
    pub depth: u32,
    /// How the texture will be used. A texture without any usage is never allocated.
    pub usage: vk::ImageUsageFlags,
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            ty: vk::ImageType::TYPE_2D,
            levels: 1,
            format: vk::Format::R8G8B8A8_UNORM,
            samples: vk::SampleCountFlags::TYPE_1,
            width: 1,
            height: 1,
            depth: 1,
            usage: vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
        }
    }
}

impl TextureDescriptor {
    /// Create a descriptor for a single-level 2D texture.
    pub fn new_2d(width: u32, height: u32, format: vk::Format) -> Self {
        Self {
            width,
            height,
            format,
            ..Default::default()
        }
    }

    /// Set the usage flags.
    pub fn usage(mut self, usage: vk::ImageUsageFlags) -> Self {
        self.usage = usage;
        self
    }

    /// Set the amount of mip levels.
    pub fn levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }

    /// Set the sample count.
    pub fn samples(mut self, samples: vk::SampleCountFlags) -> Self {
        self.samples = samples;
        self
    }

    /// Set the depth or array layer count.
    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// The descriptor that is actually handed to the allocator. Sampleable textures cannot be
    /// multisampled, so their sample count is reset to one.
    pub(crate) fn sanitized(&self) -> Self {
        let mut desc = *self;
        if desc.usage.contains(vk::ImageUsageFlags::SAMPLED) && desc.samples != vk::SampleCountFlags::TYPE_1 {
            warn!("Texture is both sampled and multisampled ({:?}), creating it single-sampled.", desc.samples);
            desc.samples = vk::SampleCountFlags::TYPE_1;
        }
        desc
    }
}

/// Extra accesses registered for the creating pass in [`PassBuilder::create_texture`](crate::PassBuilder::create_texture).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CreateFlags {
    /// Only create the resource. The returned handle is at version 0.
    #[default]
    Unknown,
    /// The creating pass also reads the resource. The returned handle is at version 0.
    Read,
    /// The creating pass also writes the resource. The returned handle is at version 1.
    Write,
    /// The creating pass reads version 0 and writes version 1. The returned handle is at version 1.
    ReadWrite,
}

impl CreateFlags {
    /// Whether these flags register a read.
    pub fn is_read(&self) -> bool {
        matches!(self, CreateFlags::Read | CreateFlags::ReadWrite)
    }

    /// Whether these flags register a write.
    pub fn is_write(&self) -> bool {
        matches!(self, CreateFlags::Write | CreateFlags::ReadWrite)
    }
}

/// Where the backing storage of a resource comes from.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceOrigin {
    /// Created and destroyed by the graph during [`FrameGraph::execute`](crate::FrameGraph::execute).
    #[default]
    Transient,
    /// Provided by the caller through [`FrameGraph::import_texture`](crate::FrameGraph::import_texture).
    Imported,
}

/// Bookkeeping for one version of a resource slot.
#[derive(Debug, Default, Clone)]
pub struct VersionNode {
    /// The pass that produced this version, if any.
    pub writer: Option<PassId>,
    /// Amount of passes that declared a write producing this version. Always at most one.
    pub writer_count: u32,
    /// Amount of live passes reading this version. Computed during compile.
    pub reader_count: u32,
}

/// Lifetime information for a resource slot, computed during compile.
#[derive(Debug, Default, Clone)]
pub struct SubResource {
    /// Last live pass that wrote to the slot.
    pub writer: Option<PassId>,
    /// Live pass that needs the backing storage first.
    pub first_user: Option<PassId>,
    /// Live pass after which the backing storage can be released.
    pub last_user: Option<PassId>,
    /// Amount of live reads of any version of this slot.
    pub reader_count: u32,
    /// Amount of live writes to any version of this slot.
    pub writer_count: u32,
}

/// Logical identity of a resource across all its versions within one frame.
#[derive(Debug, Clone)]
pub struct ResourceSlot {
    pub(crate) name: String,
    pub(crate) desc: TextureDescriptor,
    pub(crate) origin: ResourceOrigin,
    pub(crate) version: u16,
    pub(crate) versions: Vec<VersionNode>,
    pub(crate) sub_resource: SubResource,
    /// Slot whose backing storage this slot uses. Equal to its own index unless it was moved.
    pub(crate) physical: u16,
}

impl ResourceSlot {
    /// Debug name of this resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Descriptor used to create the backing storage.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.desc
    }

    /// Where the backing storage comes from.
    pub fn origin(&self) -> ResourceOrigin {
        self.origin
    }

    /// Current (latest) version of this slot.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Lifetime information. Only meaningful after compiling.
    pub fn sub_resource(&self) -> &SubResource {
        &self.sub_resource
    }

    /// Per-version bookkeeping, indexed by version.
    pub fn versions(&self) -> &[VersionNode] {
        &self.versions
    }

    pub(crate) fn is_imported(&self) -> bool {
        self.origin == ResourceOrigin::Imported
    }
}

/// Owns every resource slot of the frame, indexed by [`ResourceHandle::index`].
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    slots: Vec<ResourceSlot>,
}

impl ResourceRegistry {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Register a new slot and obtain a handle to its first version.
    /// # Errors
    /// * Fails if the registry is full. Handle indices are 16 bits wide.
    pub(crate) fn create(&mut self, name: impl Into<String>, desc: TextureDescriptor, origin: ResourceOrigin) -> Result<ResourceHandle, Error> {
        let index = self.slots.len();
        // u16::MAX is reserved for the invalid handle
        if index >= u16::MAX as usize {
            return Err(Error::TooManyResources);
        }
        let index = index as u16;
        self.slots.push(ResourceSlot {
            name: name.into(),
            desc,
            origin,
            version: 0,
            versions: vec![VersionNode::default()],
            sub_resource: SubResource::default(),
            physical: index,
        });
        Ok(ResourceHandle::new(index, 0))
    }

    /// Look up the slot a handle refers to, regardless of its version.
    pub fn slot(&self, handle: ResourceHandle) -> Option<&ResourceSlot> {
        self.slots.get(handle.index as usize)
    }

    pub(crate) fn slot_at(&self, index: u16) -> &ResourceSlot {
        &self.slots[index as usize]
    }

    pub(crate) fn slot_at_mut(&mut self, index: u16) -> &mut ResourceSlot {
        &mut self.slots[index as usize]
    }

    /// Check that a handle refers to an existing slot at its current version.
    /// # Errors
    /// * [`Error::InvalidHandle`] if the handle was never created by this graph.
    /// * [`Error::StaleHandle`] if the slot was written to after this handle was obtained.
    pub(crate) fn validate(&self, handle: ResourceHandle) -> Result<&ResourceSlot, Error> {
        let slot = self.slot(handle).ok_or(Error::InvalidHandle)?;
        if slot.version != handle.version {
            return Err(Error::StaleHandle {
                name: slot.name.clone(),
                expected: slot.version,
                found: handle.version,
            });
        }
        Ok(slot)
    }

    /// Returns true if the handle can be used for reading and writing.
    pub fn is_valid(&self, handle: ResourceHandle) -> bool {
        self.validate(handle).is_ok()
    }

    /// Bump the version of a slot after a write by `writer`, returning the new handle.
    /// The handle must have been validated.
    pub(crate) fn bump_version(&mut self, handle: ResourceHandle, writer: PassId) -> Result<ResourceHandle, Error> {
        if handle.version == u16::MAX {
            return Err(Error::TooManyVersions(self.slot_at(handle.index).name.clone()));
        }
        let next = handle.next_version();
        let slot = self.slot_at_mut(handle.index);
        slot.version = next.version;
        slot.versions.push(VersionNode {
            writer: Some(writer),
            writer_count: 1,
            reader_count: 0,
        });
        Ok(next)
    }

    /// Resolve the slot that owns the backing storage of `index`, following moves.
    pub(crate) fn physical(&self, index: u16) -> u16 {
        let mut current = index;
        // Moves are checked for cycles when they are recorded, the bound only guards against bugs.
        for _ in 0..=self.slots.len() {
            let next = self.slot_at(current).physical;
            if next == current {
                return current;
            }
            current = next;
        }
        error!("Alias chain starting at resource {} does not terminate.", self.slot_at(index).name);
        index
    }

    /// Iterate over all slots in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceSlot> {
        self.slots.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ResourceSlot> {
        self.slots.iter_mut()
    }

    /// Amount of slots in the registry.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the registry holds no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }
}
