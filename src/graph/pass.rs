//! Passes are the units of work in a [`FrameGraph`](crate::FrameGraph).
//!
//! A pass is declared through [`FrameGraph::add_pass`](crate::FrameGraph::add_pass), which takes a setup closure and an
//! execute closure. The setup closure runs immediately and declares every resource the pass uses through a
//! [`PassBuilder`](crate::PassBuilder). It also fills in the pass data, a caller-defined struct that is typically used to
//! remember the handles the pass needs while executing. The execute closure runs later, during
//! [`FrameGraph::execute`](crate::FrameGraph::execute), and only if the pass survived culling.
//!
//! # Example
//!
//! ```
//! use deimos::prelude::*;
//!
//! #[derive(Default, Clone)]
//! struct BlurData {
//!     input: ResourceHandle,
//!     output: ResourceHandle,
//! }
//!
//! let mut graph = FrameGraph::new(HeadlessAllocator::new());
//! let scene = graph.add_pass::<ResourceHandle, _, _>("scene",
//!     |builder, output| {
//!         *output = builder.create_texture("scene", TextureDescriptor::default(), CreateFlags::Write);
//!     },
//!     |_, _| Ok(()));
//! let blur = graph.add_pass::<BlurData, _, _>("blur",
//!     |builder, data| {
//!         data.input = builder.read(*scene);
//!         data.output = builder.create_texture("blurred", TextureDescriptor::default(), CreateFlags::Write);
//!     },
//!     |resources, data| {
//!         let _input = resources.try_texture(data.input)?;
//!         let _output = resources.try_texture(data.output)?;
//!         Ok(())
//!     });
//! graph.present(blur.output);
//! graph.compile().execute()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fmt::{Display, Formatter};
use std::ops::Deref;

use anyhow::Result;

use crate::graph::handle::ResourceHandle;
use crate::graph::physical_resource::PassResources;

/// The returned value from a pass callback function.
pub type PassFnResult = Result<()>;

/// Identifies a pass within one frame. Ids are assigned in insertion order, starting at zero.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PassId(pub(crate) usize);

impl PassId {
    /// Position of the pass in insertion order.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for PassId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "pass#{}", self.0)
    }
}

/// Defines a pass executor that is called when the graph executes the pass.
pub trait PassExecutor<T> {
    /// Run the pass. `resources` resolves handles to the textures backing them.
    fn execute(&mut self, resources: &PassResources<'_, T>) -> PassFnResult;
}

pub(crate) type BoxedPassFn<'cb, T> = Box<dyn PassExecutor<T> + 'cb>;

/// An empty pass executor that does nothing
pub struct EmptyPassExecutor;

impl EmptyPassExecutor {
    /// Creates an empty pass executor
    pub fn new() -> Self {
        Self {}
    }

    /// Create a new empty pass executor in a [`Box`]
    pub fn new_boxed() -> Box<Self> {
        Box::new(Self::new())
    }
}

impl<T> PassExecutor<T> for EmptyPassExecutor {
    fn execute(&mut self, _resources: &PassResources<'_, T>) -> PassFnResult {
        Ok(())
    }
}

/// Pass executor owning the typed pass data together with the callback that consumes it.
pub(crate) struct TypedPassExecutor<Data, F> {
    data: Data,
    execute: F,
}

impl<Data, F> TypedPassExecutor<Data, F> {
    pub(crate) fn new(data: Data, execute: F) -> Self {
        Self {
            data,
            execute,
        }
    }
}

impl<T, Data, F> PassExecutor<T> for TypedPassExecutor<Data, F>
where
    F: FnMut(&PassResources<'_, T>, &Data) -> PassFnResult,
{
    fn execute(&mut self, resources: &PassResources<'_, T>) -> PassFnResult {
        (self.execute)(resources, &self.data)
    }
}

/// A pass in the frame graph, with its declared accesses and compiled state.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct PassNode<'cb, T> {
    pub(crate) name: String,
    pub(crate) id: PassId,
    /// Versions read by this pass
    pub(crate) reads: Vec<ResourceHandle>,
    /// Versions produced by this pass
    pub(crate) writes: Vec<ResourceHandle>,
    pub(crate) side_effect: bool,
    // computed during compile()
    pub(crate) ref_count: u32,
    pub(crate) devirtualize: Vec<u16>,
    pub(crate) destroy: Vec<u16>,
    #[derivative(Debug = "ignore")]
    pub(crate) executor: BoxedPassFn<'cb, T>,
}

impl<'cb, T> PassNode<'cb, T> {
    pub(crate) fn new(name: String, id: PassId) -> Self {
        Self {
            name,
            id,
            reads: vec![],
            writes: vec![],
            side_effect: false,
            ref_count: 0,
            devirtualize: vec![],
            destroy: vec![],
            executor: EmptyPassExecutor::new_boxed(),
        }
    }

    /// Get the pass name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the pass id
    pub fn id(&self) -> PassId {
        self.id
    }

    /// Resource versions read by this pass.
    pub fn reads(&self) -> &[ResourceHandle] {
        &self.reads
    }

    /// Resource versions produced by this pass.
    pub fn writes(&self) -> &[ResourceHandle] {
        &self.writes
    }

    /// Whether this pass was declared to have side effects, which keeps it from being culled.
    pub fn has_side_effect(&self) -> bool {
        self.side_effect
    }

    /// Amount of references keeping this pass alive. Only meaningful after compiling.
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// Whether this pass will be skipped. Only meaningful after compiling.
    pub fn is_culled(&self) -> bool {
        self.ref_count == 0
    }

    /// Slots allocated right before this pass executes.
    pub fn devirtualize(&self) -> &[u16] {
        &self.devirtualize
    }

    /// Slots released right after this pass executes.
    pub fn destroy(&self) -> &[u16] {
        &self.destroy
    }
}

/// Returned from [`FrameGraph::add_pass`](crate::FrameGraph::add_pass). Holds the pass id and a copy of the pass data
/// as it was after setup, so later passes can use the handles it declared.
#[derive(Debug, Clone)]
pub struct PassView<Data> {
    id: PassId,
    data: Data,
}

impl<Data> PassView<Data> {
    pub(crate) fn new(id: PassId, data: Data) -> Self {
        Self {
            id,
            data,
        }
    }

    /// Id of the pass.
    pub fn id(&self) -> PassId {
        self.id
    }

    /// The pass data.
    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Take the pass data out of the view.
    pub fn into_data(self) -> Data {
        self.data
    }
}

impl<Data> Deref for PassView<Data> {
    type Target = Data;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
