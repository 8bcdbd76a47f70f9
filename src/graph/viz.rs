//! Debug export of a frame graph to graphviz `dot` and SVG.
//!
//! The exported graph has a node for every pass and for every resource version. Edges go from the pass that wrote a
//! version to that version, and from a version to every pass reading it. Moved resources get an additional dashed
//! edge. Export after [`FrameGraph::compile`](crate::FrameGraph::compile) to see which nodes were culled and their
//! reference counts.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use anyhow::{anyhow, Result};
use layout::backends::svg::SVGWriter;
use layout::gv::{DotParser, GraphBuilder};
use petgraph::dot::Dot;
use petgraph::graph::{EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Graph;

use crate::allocator::traits::ResourceAllocator;
use crate::graph::compile;
use crate::graph::frame_graph::FrameGraph;
use crate::graph::handle::ResourceHandle;

/// A node in the exported graph.
#[derive(Debug, Clone)]
pub enum VizNode {
    /// A pass
    Pass {
        /// Pass name
        name: String,
        /// Reference count after compiling
        ref_count: u32,
        /// Whether the pass survives compilation
        alive: bool,
    },
    /// One version of a resource
    Resource {
        /// Resource name
        name: String,
        /// The version this node represents
        handle: ResourceHandle,
        /// Amount of live readers of this version
        reader_count: u32,
        /// Whether this version is produced or consumed by a live pass
        alive: bool,
        /// Whether the resource was imported
        imported: bool,
    },
}

/// Kind of an edge in the exported graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VizEdge {
    /// Pass writes resource version
    Write,
    /// Resource version is read by pass
    Read,
    /// Resource was moved onto another resource
    Move,
}

/// Graph type used for debug exports.
pub type VizGraph = Graph<VizNode, VizEdge>;

impl VizNode {
    fn is_alive(&self) -> bool {
        match self {
            VizNode::Pass { alive, .. } => *alive,
            VizNode::Resource { alive, .. } => *alive,
        }
    }
}

impl Display for VizNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VizNode::Pass { name, ref_count, .. } => write!(f, "{} (refs: {})", name, ref_count),
            VizNode::Resource { name, handle, reader_count, imported, .. } => {
                let origin = if *imported { " imported" } else { "" };
                write!(f, "{} v{}{} (readers: {})", name, handle.version(), origin, reader_count)
            }
        }
    }
}

impl Display for VizEdge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VizEdge::Write => f.write_str("write"),
            VizEdge::Read => f.write_str("read"),
            VizEdge::Move => f.write_str("move"),
        }
    }
}

fn edge_attributes(_: &VizGraph, edge: EdgeReference<VizEdge>) -> String {
    match edge.weight() {
        VizEdge::Move => String::from("style = \"dashed\""),
        _ => String::from(""),
    }
}

fn node_attributes(_: &VizGraph, node: (NodeIndex, &VizNode)) -> String {
    let color = match (node.1, node.1.is_alive()) {
        (VizNode::Pass { .. }, true) => "#5e6df7",
        (VizNode::Resource { .. }, true) => "#5ef78c",
        (_, false) => "#b0b0b0",
    };
    match node.1 {
        VizNode::Pass { .. } => format!("fillcolor = \"{color}\""),
        VizNode::Resource { .. } => format!("fillcolor = \"{color}\" shape=box"),
    }
}

/// Trait that is implemented for the frame graph to help with debugging and visualizing it.
pub trait GraphViz {
    /// Build the debug graph.
    fn viz_graph(&self) -> VizGraph;

    /// Get the string representation of this graph in `dot` format.
    fn dot(&self) -> Result<String> {
        let graph = self.viz_graph();
        Ok(format!(
            "{}",
            Dot::with_attr_getters(&graph, &[], &edge_attributes, &node_attributes)
        ))
    }

    /// Lay out the graph and render it to an SVG document.
    fn svg(&self) -> Result<String> {
        let dot = self.dot()?;
        let mut parser = DotParser::new(&dot);
        let graph = parser.process().map_err(|err| anyhow!("dot render error: {}", err))?;
        let mut builder = GraphBuilder::new();
        builder.visit_graph(&graph);
        let mut visual = builder.get();
        let mut svg = SVGWriter::new();
        visual.do_it(false, false, false, &mut svg);
        Ok(svg.finalize())
    }
}

impl<A: ResourceAllocator> GraphViz for FrameGraph<'_, A> {
    fn viz_graph(&self) -> VizGraph {
        let mut graph = VizGraph::new();
        let passes = self
            .passes
            .iter()
            .map(|pass| {
                graph.add_node(VizNode::Pass {
                    name: pass.name.clone(),
                    ref_count: pass.ref_count,
                    alive: !pass.is_culled(),
                })
            })
            .collect::<Vec<_>>();

        let mut versions: HashMap<ResourceHandle, NodeIndex> = HashMap::new();
        for (index, slot) in self.registry.iter().enumerate() {
            for (version, node) in slot.versions.iter().enumerate() {
                let handle = ResourceHandle::new(index as u16, version as u16);
                let alive = node.reader_count > 0 || compile::is_live(&self.passes, node.writer);
                let id = graph.add_node(VizNode::Resource {
                    name: slot.name.clone(),
                    handle,
                    reader_count: node.reader_count,
                    alive,
                    imported: slot.is_imported(),
                });
                if let Some(writer) = node.writer {
                    graph.add_edge(passes[writer.index()], id, VizEdge::Write);
                }
                versions.insert(handle, id);
            }
        }

        for pass in &self.passes {
            for read in &pass.reads {
                if let Some(&version) = versions.get(read) {
                    graph.add_edge(version, passes[pass.id.index()], VizEdge::Read);
                }
            }
        }
        for alias in &self.aliases {
            if let (Some(&from), Some(&to)) = (versions.get(&alias.from), versions.get(&alias.to)) {
                graph.add_edge(from, to, VizEdge::Move);
            }
        }
        graph
    }
}
