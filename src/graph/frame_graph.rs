//! The frame graph module holds the [`FrameGraph`] itself.

use anyhow::Result;

use crate::allocator::traits::ResourceAllocator;
use crate::core::error::Error;
use crate::core::settings::GraphSettings;
use crate::graph::builder::PassBuilder;
use crate::graph::compile::{self, Alias, CompileSummary};
use crate::graph::handle::ResourceHandle;
use crate::graph::pass::{PassFnResult, PassId, PassNode, PassView, TypedPassExecutor};
use crate::graph::physical_resource::PassResources;
use crate::graph::resource::{ResourceOrigin, ResourceRegistry, ResourceSlot, TextureDescriptor};

/// Per-frame render graph. Passes are added every frame, the graph is compiled to find out which passes are needed
/// and when each resource must be allocated, and is then executed. Executing the graph also clears it, so it is ready
/// to be rebuilt for the next frame.
///
/// See the [`graph`](crate::graph) module documentation for an overview.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct FrameGraph<'cb, A: ResourceAllocator> {
    settings: GraphSettings,
    pub(crate) passes: Vec<PassNode<'cb, A::Texture>>,
    pub(crate) registry: ResourceRegistry,
    pub(crate) aliases: Vec<Alias>,
    #[derivative(Debug = "ignore")]
    textures: Vec<Option<A::Texture>>,
    #[derivative(Debug = "ignore")]
    allocator: A,
    summary: Option<CompileSummary>,
}

impl<'cb, A: ResourceAllocator> FrameGraph<'cb, A> {
    /// Create an empty frame graph with default settings.
    pub fn new(allocator: A) -> Self {
        Self::with_settings(allocator, GraphSettings::default())
    }

    /// Create an empty frame graph.
    pub fn with_settings(allocator: A, settings: GraphSettings) -> Self {
        Self {
            passes: Vec::with_capacity(settings.pass_capacity),
            registry: ResourceRegistry::with_capacity(settings.resource_capacity),
            aliases: vec![],
            textures: Vec::with_capacity(settings.resource_capacity),
            allocator,
            summary: None,
            settings,
        }
    }

    /// Add a pass to the graph.
    ///
    /// `setup` is called immediately with a [`PassBuilder`] to declare the resources this pass uses, and with the
    /// pass data, which starts out as `Data::default()`. `execute` is called during [`FrameGraph::execute`] with the
    /// data as it was left by `setup`, unless the pass was culled.
    ///
    /// Passes always execute in the order they were added.
    pub fn add_pass<Data, Setup, Execute>(&mut self, name: impl Into<String>, setup: Setup, execute: Execute) -> PassView<Data>
    where
        Data: Default + Clone + 'cb,
        Setup: FnOnce(&mut PassBuilder<'_, 'cb, A::Texture>, &mut Data),
        Execute: FnMut(&PassResources<'_, A::Texture>, &Data) -> PassFnResult + 'cb,
    {
        let id = PassId(self.passes.len());
        let mut node = PassNode::new(name.into(), id);
        let mut data = Data::default();
        {
            let mut builder = PassBuilder::new(&mut self.registry, &mut node);
            setup(&mut builder, &mut data);
        }
        node.executor = Box::new(TypedPassExecutor::new(data.clone(), execute));
        self.passes.push(node);
        self.summary = None;
        PassView::new(id, data)
    }

    /// Mark a resource as the final output of the frame. This adds a pass that reads the resource and has side
    /// effects, so the passes producing it are never culled.
    pub fn present(&mut self, handle: ResourceHandle) -> PassView<()> {
        self.add_pass::<(), _, _>(
            "Present",
            |builder, _| {
                builder.read(handle);
                builder.side_effect();
            },
            |_, _| Ok(()),
        )
    }

    /// Import an existing texture into the graph. The graph never creates or destroys imported textures, and
    /// reading their first version does not require a pass to write them.
    pub fn import_texture(&mut self, name: impl Into<String>, desc: TextureDescriptor, texture: A::Texture) -> ResourceHandle {
        let name = name.into();
        match self.registry.create(name.clone(), desc, ResourceOrigin::Imported) {
            Ok(handle) => {
                self.textures.resize_with(self.registry.len(), || None);
                self.textures[handle.index() as usize] = Some(texture);
                self.summary = None;
                handle
            }
            Err(err) => {
                warn!("Cannot import texture {}: {}", name, err);
                ResourceHandle::INVALID
            }
        }
    }

    /// Replace the resource `to` with the resource `from`. After compiling, passes reading `to` read `from`
    /// instead, and `to` uses the same backing storage as `from`. The pass that produced `to` is culled if nothing
    /// else needs it.
    ///
    /// Returns false if the move was rejected, in which case the graph is unchanged.
    pub fn move_resource(&mut self, from: ResourceHandle, to: ResourceHandle) -> bool {
        match self.check_move(from, to) {
            Ok(()) => {
                self.registry.slot_at_mut(to.index()).physical = from.index();
                self.aliases.push(Alias {
                    from,
                    to,
                });
                self.summary = None;
                true
            }
            Err(err) => {
                warn!("Ignoring move from {} to {}: {}", from, to, err);
                false
            }
        }
    }

    fn check_move(&self, from: ResourceHandle, to: ResourceHandle) -> Result<(), Error> {
        let exists = |handle: ResourceHandle| {
            self.registry
                .slot(handle)
                .map(|slot| handle.version() <= slot.version())
                .unwrap_or(false)
        };
        if !exists(from) || !exists(to) {
            return Err(Error::InvalidHandle);
        }
        let target = self.registry.slot_at(to.index());
        if from.index() == to.index() {
            return Err(Error::IllegalAlias(format!("`{}` cannot be moved onto itself", target.name())));
        }
        if target.is_imported() {
            return Err(Error::IllegalAlias(format!("imported resource `{}` cannot be replaced", target.name())));
        }
        if self.registry.physical(to.index()) != to.index() {
            return Err(Error::IllegalAlias(format!("`{}` was already replaced", target.name())));
        }
        if self.registry.physical(from.index()) == to.index() {
            return Err(Error::IllegalAlias(format!("moving onto `{}` would create a cycle", target.name())));
        }
        Ok(())
    }

    /// Returns true if the handle refers to the current version of a resource in this graph.
    pub fn is_valid(&self, handle: ResourceHandle) -> bool {
        self.registry.is_valid(handle)
    }

    /// Compute which passes are needed and when each resource must be allocated and destroyed.
    /// Compiling again after adding more passes is allowed.
    pub fn compile(&mut self) -> &mut Self {
        let summary = compile::compile(&mut self.passes, &mut self.registry, &self.aliases, &self.settings);
        debug!(
            "{}: compiled {} passes ({} culled), {} transient resources",
            self.settings.name,
            self.passes.len(),
            summary.culled_passes,
            summary.transient_resources
        );
        self.summary = Some(summary);
        self
    }

    /// Run every live pass in insertion order, creating and destroying transient textures around them.
    /// Compiles the graph first if this was not done yet. Afterwards the graph is reset, whether execution
    /// succeeded or not.
    /// # Errors
    /// * Fails if the allocator fails to create or destroy a texture.
    /// * Fails if a pass callback returns an error. Execution stops at that pass.
    ///
    /// On failure, all transient textures created this frame are destroyed before returning.
    pub fn execute(&mut self) -> Result<()> {
        if self.summary.is_none() {
            debug!("{}: executing a graph that was not compiled, compiling it first", self.settings.name);
            self.compile();
        }
        let result = run_passes(&mut self.passes, &self.registry, &mut self.allocator, &mut self.textures);
        let cleanup = release_transient(&self.registry, &mut self.allocator, &mut self.textures);
        self.reset();
        result.and(cleanup)
    }

    /// Discard all passes, resources and moves. Nothing is allocated before [`FrameGraph::execute`], so this can be used
    /// to abandon a frame at any point before executing it.
    pub fn reset(&mut self) {
        self.passes.clear();
        self.registry.clear();
        self.aliases.clear();
        self.textures.clear();
        self.summary = None;
    }

    /// Result of the last compile, or `None` if the graph changed since.
    pub fn summary(&self) -> Option<CompileSummary> {
        self.summary
    }

    /// Amount of passes in the graph.
    pub fn num_passes(&self) -> usize {
        self.passes.len()
    }

    /// Amount of resource slots in the graph.
    pub fn num_resources(&self) -> usize {
        self.registry.len()
    }

    /// Get a pass by id.
    pub fn pass(&self, id: PassId) -> Option<&PassNode<'cb, A::Texture>> {
        self.passes.get(id.index())
    }

    /// Iterate over all passes in insertion order.
    pub fn passes(&self) -> impl Iterator<Item = &PassNode<'cb, A::Texture>> {
        self.passes.iter()
    }

    /// Returns whether a pass was culled, or `None` if the pass does not exist or the graph is not compiled.
    pub fn is_culled(&self, id: PassId) -> Option<bool> {
        self.summary?;
        self.pass(id).map(|pass| pass.is_culled())
    }

    /// Get the resource slot a handle refers to, regardless of its version.
    pub fn resource(&self, handle: ResourceHandle) -> Option<&ResourceSlot> {
        self.registry.slot(handle)
    }

    /// Access the resource registry.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Settings this graph was created with.
    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    /// Access the resource allocator.
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Access the resource allocator mutably.
    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.allocator
    }

    /// Destroy the graph and take back the allocator.
    pub fn into_allocator(self) -> A {
        self.allocator
    }
}

fn run_passes<A: ResourceAllocator>(
    passes: &mut [PassNode<'_, A::Texture>],
    registry: &ResourceRegistry,
    allocator: &mut A,
    textures: &mut Vec<Option<A::Texture>>,
) -> Result<()> {
    textures.resize_with(registry.len(), || None);
    for pass in passes.iter_mut() {
        if pass.is_culled() {
            trace!("Skipping culled pass {}", pass.name);
            continue;
        }

        for &index in &pass.devirtualize {
            let slot = registry.slot_at(index);
            let desc = slot.descriptor().sanitized();
            if desc.usage.is_empty() {
                debug!("Resource {} has no usage flags, not creating a texture for it", slot.name());
                continue;
            }
            let texture = allocator
                .create_texture(slot.name(), &desc)
                .map_err(|err| err.context(Error::AllocationFailed(slot.name().to_owned())))?;
            #[cfg(feature = "log-objects")]
            trace!("Created texture {:?} for resource {}", texture, slot.name());
            textures[index as usize] = Some(texture);
        }

        let resources = PassResources::new(registry, textures.as_slice());
        pass.executor
            .execute(&resources)
            .map_err(|err| err.context(format!("Pass {} failed", pass.name)))?;

        for &index in &pass.destroy {
            if let Some(texture) = textures[index as usize].take() {
                #[cfg(feature = "log-objects")]
                trace!("Destroying texture {:?} of resource {}", texture, registry.slot_at(index).name());
                allocator.destroy_texture(texture)?;
            }
        }
    }
    Ok(())
}

/// Destroys transient textures that are still alive. Only does work when execution stopped early.
fn release_transient<A: ResourceAllocator>(registry: &ResourceRegistry, allocator: &mut A, textures: &mut [Option<A::Texture>]) -> Result<()> {
    let mut result = Ok(());
    for (index, texture) in textures.iter_mut().enumerate() {
        if registry.slot_at(index as u16).is_imported() {
            continue;
        }
        if let Some(texture) = texture.take() {
            debug!("Releasing texture of resource {} after failed execution", registry.slot_at(index as u16).name());
            if let Err(err) = allocator.destroy_texture(texture) {
                error!("Failed to release texture: {}", err);
                result = result.and(Err(err));
            }
        }
    }
    result
}
