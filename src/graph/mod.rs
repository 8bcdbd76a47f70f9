//! The frame graph is rebuilt every frame. Rendering code declares passes and the transient resources they create, read
//! and write, and the graph works out which passes actually contribute to the final image, when each resource must be
//! allocated and freed, and runs the surviving passes in the order they were declared.
//!
//! Resources are referred to through versioned [`ResourceHandle`]s. Writing a resource produces a new version and a new
//! handle, which makes every older handle to that resource stale. This rules out ambiguous graphs where two passes
//! both modify the same version of a resource.
//!
//! Through the [`GraphViz`](viz::GraphViz) trait, it's possible to export a graphviz-compatible dot file to display the graph.
//!
//! # Example
//!
//! ```
//! use deimos::prelude::*;
//!
//! let mut graph = FrameGraph::new(HeadlessAllocator::new());
//! // A pass that renders into a new offscreen texture.
//! let render = graph.add_pass::<ResourceHandle, _, _>("render",
//!     |builder, output| {
//!         let desc = TextureDescriptor::new_2d(800, 600, vk::Format::R8G8B8A8_SRGB);
//!         *output = builder.create_texture("offscreen", desc, CreateFlags::Write);
//!     },
//!     |resources, output| {
//!         let _target = resources.try_texture(*output)?;
//!         // Record draw commands here.
//!         Ok(())
//!     });
//! // Without presenting the output, the render pass would be culled.
//! graph.present(*render);
//! graph.compile().execute()?;
//! // Executing the graph clears it.
//! assert_eq!(graph.num_passes(), 0);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! For more complex passes, see the [`pass`] module documentation.
//!
//! # Compiling
//!
//! See the [`compile`] module documentation for how culling and lifetimes are computed.

pub mod handle;
pub mod resource;
pub mod pass;
pub mod builder;
pub mod physical_resource;
pub mod compile;
pub mod frame_graph;
pub mod viz;
