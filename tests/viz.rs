use anyhow::Result;

use deimos as dm;
use dm::prelude::*;
use dm::graph::viz::{VizEdge, VizNode};

use framework::{EventLog, RecordingAllocator};

mod framework;

/// Builds a small graph with one culled pass and one moved resource.
fn build(graph: &mut FrameGraph<'_, RecordingAllocator>) {
    let gbuffer = graph.add_pass::<ResourceHandle, _, _>(
        "GBuffer",
        |builder, out| *out = builder.create_texture("albedo", TextureDescriptor::default(), CreateFlags::Write),
        |_, _| Ok(()),
    );
    let albedo = *gbuffer;
    graph.add_pass::<ResourceHandle, _, _>(
        "Debug",
        |builder, out| {
            builder.read(albedo);
            *out = builder.create_texture("debug", TextureDescriptor::default(), CreateFlags::Write);
        },
        |_, _| Ok(()),
    );
    let lighting = graph.add_pass::<ResourceHandle, _, _>(
        "Lighting",
        |builder, out| {
            builder.read(albedo);
            *out = builder.create_texture("hdr", TextureDescriptor::default(), CreateFlags::Write);
        },
        |_, _| Ok(()),
    );
    let tonemap = graph.add_pass::<ResourceHandle, _, _>(
        "Tonemap",
        |builder, out| *out = builder.create_texture("ldr", TextureDescriptor::default(), CreateFlags::Write),
        |_, _| Ok(()),
    );
    graph.move_resource(*lighting, *tonemap);
    graph.present(*tonemap);
}

#[test]
fn viz_graph_reflects_compiled_state() -> Result<()> {
    framework::init_logging();
    let log = EventLog::new();
    let mut graph = FrameGraph::new(RecordingAllocator::new(&log));
    build(&mut graph);
    graph.compile();

    let viz = graph.viz_graph();
    let pass = |name: &str| {
        viz.node_weights()
            .find_map(|node| match node {
                VizNode::Pass {
                    name: pass,
                    alive,
                    ..
                } if pass == name => Some(*alive),
                _ => None,
            })
            .unwrap()
    };
    assert!(pass("GBuffer"));
    assert!(pass("Lighting"));
    assert!(!pass("Debug"));
    assert!(!pass("Tonemap"));
    assert!(pass("Present"));

    // One node per resource version: albedo, debug, hdr and ldr each have two.
    let versions = viz.node_weights().filter(|node| matches!(node, VizNode::Resource { .. })).count();
    assert_eq!(versions, 8);
    assert_eq!(viz.edge_weights().filter(|edge| **edge == VizEdge::Move).count(), 1);
    Ok(())
}

#[test]
fn export_dot() -> Result<()> {
    framework::init_logging();
    let log = EventLog::new();
    let mut graph = FrameGraph::new(RecordingAllocator::new(&log));
    build(&mut graph);
    graph.compile();

    let dot = graph.dot()?;
    assert!(dot.starts_with("digraph"));
    assert!(dot.contains("GBuffer (refs: 1)"));
    assert!(dot.contains("Tonemap (refs: 0)"));
    assert!(dot.contains("albedo v1 (readers: 1)"));
    assert!(dot.contains("#b0b0b0"));
    assert!(dot.contains("dashed"));
    Ok(())
}

#[test]
fn export_svg() -> Result<()> {
    framework::init_logging();
    let log = EventLog::new();
    let mut graph = FrameGraph::new(RecordingAllocator::new(&log));
    build(&mut graph);
    graph.compile();

    let svg = graph.svg()?;
    assert!(svg.contains("<svg"));
    // Exporting does not change the graph.
    graph.execute()?;
    Ok(())
}
