//! Transient per-frame render graph
//!
//! Deimos lets rendering code declare logical passes and the virtual textures they read and write, and then figures
//! out by itself which passes are actually needed, when every texture must be allocated and freed, and in which order
//! everything runs. The graph is rebuilt from scratch every frame, and no state survives between frames.
//!
//! To get started, the easiest way is to simply
//! ```
//! // Import all important types and traits.
//! use deimos::prelude::*;
//! ```
//!
//! # Example
//!
//! First, pick a [`ResourceAllocator`](crate::ResourceAllocator). This is the interface the graph uses to create
//! and destroy the textures backing its resources. Real renderers implement it on top of their GPU backend.
//! Here we use the [`HeadlessAllocator`](crate::HeadlessAllocator), which does not need a GPU.
//! ```
//! use deimos::prelude::*;
//!
//! let settings = GraphSettingsBuilder::new()
//!     .name("main view")
//!     .build();
//! let mut graph = FrameGraph::with_settings(HeadlessAllocator::new(), settings);
//! ```
//! Every frame, add passes, present the final output, then compile and execute the graph.
//! ```
//! use deimos::prelude::*;
//!
//! # let mut graph = FrameGraph::new(HeadlessAllocator::new());
//! let gbuffer = graph.add_pass::<ResourceHandle, _, _>("gbuffer",
//!     |builder, albedo| {
//!         *albedo = builder.create_texture("albedo", TextureDescriptor::default(), CreateFlags::Write);
//!     },
//!     |_, _| Ok(()));
//! let lighting = graph.add_pass::<ResourceHandle, _, _>("lighting",
//!     |builder, output| {
//!         builder.read(*gbuffer);
//!         *output = builder.create_texture("hdr", TextureDescriptor::default(), CreateFlags::Write);
//!     },
//!     |_, _| Ok(()));
//! graph.present(*lighting);
//! graph.compile().execute()?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//! For further example code, check out the following modules
//! - [`graph`] for declaring passes and resources.
//! - [`graph::compile`] for how passes are culled and resource lifetimes are computed.
//! - [`graph::viz`] for exporting a graph for debugging.
//! - [`allocator`] for plugging in a texture backend.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod core;
pub mod allocator;
pub mod graph;
