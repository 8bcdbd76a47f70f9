//! Exposes the [`PassBuilder`], used to declare the resources a pass creates, reads and writes.

use crate::graph::handle::ResourceHandle;
use crate::graph::pass::{PassId, PassNode};
use crate::graph::resource::{CreateFlags, ResourceOrigin, ResourceRegistry, TextureDescriptor};

/// Declares resource usage for a single pass. Only available inside the setup closure given to
/// [`FrameGraph::add_pass`](crate::FrameGraph::add_pass).
///
/// None of these functions fail loudly. Using an invalid or stale handle is logged, and the call returns
/// [`ResourceHandle::INVALID`]. The pass then simply does not depend on that resource.
pub struct PassBuilder<'a, 'cb, T> {
    registry: &'a mut ResourceRegistry,
    pass: &'a mut PassNode<'cb, T>,
}

impl<'a, 'cb, T> PassBuilder<'a, 'cb, T> {
    pub(crate) fn new(registry: &'a mut ResourceRegistry, pass: &'a mut PassNode<'cb, T>) -> Self {
        Self {
            registry,
            pass,
        }
    }

    /// Name of the pass being declared.
    pub fn name(&self) -> &str {
        &self.pass.name
    }

    /// Id of the pass being declared.
    pub fn id(&self) -> PassId {
        self.pass.id
    }

    /// Create a new transient texture. Its backing storage is created right before the first pass using it
    /// executes, and destroyed after the last one. `flags` can additionally register this pass as a reader
    /// and/or writer of the new resource.
    pub fn create_texture(&mut self, name: impl Into<String>, desc: TextureDescriptor, flags: CreateFlags) -> ResourceHandle {
        let name = name.into();
        let mut handle = match self.registry.create(name, desc, ResourceOrigin::Transient) {
            Ok(handle) => handle,
            Err(err) => {
                warn!("Pass {}: {}", self.pass.name, err);
                return ResourceHandle::INVALID;
            }
        };
        #[cfg(feature = "log-objects")]
        trace!("Pass {} created resource {}", self.pass.name, handle);
        if flags.is_read() {
            handle = self.read(handle);
        }
        if flags.is_write() {
            handle = self.write(handle);
        }
        handle
    }

    /// Declare that this pass reads the given version of a resource. Returns the same handle.
    pub fn read(&mut self, handle: ResourceHandle) -> ResourceHandle {
        if let Err(err) = self.registry.validate(handle) {
            warn!("Pass {} cannot read resource {}: {}", self.pass.name, handle, err);
            return ResourceHandle::INVALID;
        }
        if !self.pass.reads.contains(&handle) {
            self.pass.reads.push(handle);
        }
        handle
    }

    /// Declare that this pass writes a resource. This produces a new version of the resource, and the returned
    /// handle must be used to refer to it from now on. The given handle becomes stale.
    ///
    /// Note that writing does not imply reading. If the pass needs the previous contents, [`PassBuilder::read`] the
    /// handle first.
    pub fn write(&mut self, handle: ResourceHandle) -> ResourceHandle {
        if let Err(err) = self.registry.validate(handle) {
            warn!("Pass {} cannot write resource {}: {}", self.pass.name, handle, err);
            return ResourceHandle::INVALID;
        }
        match self.registry.bump_version(handle, self.pass.id) {
            Ok(next) => {
                self.pass.writes.push(next);
                next
            }
            Err(err) => {
                warn!("Pass {}: {}", self.pass.name, err);
                ResourceHandle::INVALID
            }
        }
    }

    /// Mark this pass as having side effects outside the graph. Such a pass is never culled, and keeps
    /// everything it reads alive.
    pub fn side_effect(&mut self) {
        self.pass.side_effect = true;
    }

    /// Returns true if the handle refers to the current version of a resource.
    pub fn is_valid(&self, handle: ResourceHandle) -> bool {
        self.registry.is_valid(handle)
    }
}
