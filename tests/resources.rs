use anyhow::Result;

use deimos as dm;
use dm::prelude::*;

use framework::{create, destroy, execute, EventLog, RecordingAllocator};

mod framework;

fn make_graph<'cb>(log: &EventLog) -> FrameGraph<'cb, RecordingAllocator> {
    framework::init_logging();
    let settings = GraphSettingsBuilder::new()
        .name("resource tests")
        .validation(true)
        .build();
    FrameGraph::with_settings(RecordingAllocator::new(log), settings)
}

fn backbuffer() -> (TextureDescriptor, HeadlessTexture) {
    let desc = TextureDescriptor::new_2d(1280, 720, vk::Format::B8G8R8A8_SRGB).usage(vk::ImageUsageFlags::COLOR_ATTACHMENT);
    (
        desc,
        HeadlessTexture {
            id: 1000,
            desc,
        },
    )
}

#[test]
fn imported_textures_are_never_allocated() -> Result<()> {
    let log = EventLog::new();
    let mut graph = make_graph(&log);
    let (desc, texture) = backbuffer();
    let swapchain = graph.import_texture("swapchain", desc, texture);
    assert_eq!(swapchain.version(), 0);
    assert_eq!(graph.resource(swapchain).unwrap().origin(), ResourceOrigin::Imported);

    let render = graph.add_pass::<ResourceHandle, _, _>(
        "Render",
        |builder, out| *out = builder.create_texture("hdr", TextureDescriptor::default(), CreateFlags::Write),
        |_, _| Ok(()),
    );
    let hdr = *render;
    let exec_log = log.clone();
    let blit = graph.add_pass::<ResourceHandle, _, _>(
        "Blit",
        |builder, out| {
            builder.read(hdr);
            *out = builder.write(swapchain);
        },
        move |resources, out| {
            assert_eq!(resources.try_texture(*out)?.id, 1000);
            assert_eq!(resources.name(*out), Some("swapchain"));
            assert_eq!(resources.descriptor(*out).map(|desc| desc.width), Some(1280));
            exec_log.push(execute("Blit"));
            Ok(())
        },
    );
    graph.present(*blit);
    graph.compile();
    assert_eq!(graph.summary().unwrap().transient_resources, 1);
    graph.execute()?;

    assert!(log.contains(&execute("Blit")));
    assert!(!log.contains(&create("swapchain")));
    assert!(!log.contains(&destroy("swapchain")));
    assert_eq!(graph.allocator().live_count(), 0);
    Ok(())
}

#[test]
fn imported_texture_can_be_read_without_writer() -> Result<()> {
    let log = EventLog::new();
    let mut graph = make_graph(&log);
    let (desc, texture) = backbuffer();
    let history = graph.import_texture("history", desc, texture);
    let exec_log = log.clone();
    graph.add_pass::<(), _, _>(
        "Readback",
        |builder, _| {
            builder.read(history);
            builder.side_effect();
        },
        move |resources, _| {
            assert!(resources.texture(history).is_some());
            exec_log.push(execute("Readback"));
            Ok(())
        },
    );
    graph.execute()?;
    assert_eq!(log.events(), vec![execute("Readback")]);
    Ok(())
}

#[test]
fn moved_resource_replaces_target() -> Result<()> {
    let log = EventLog::new();
    let mut graph = make_graph(&log);
    let main = graph.add_pass::<ResourceHandle, _, _>(
        "Main",
        |builder, out| *out = builder.create_texture("main", TextureDescriptor::default(), CreateFlags::Write),
        |_, _| Ok(()),
    );
    let fallback = graph.add_pass::<ResourceHandle, _, _>(
        "Fallback",
        |builder, out| *out = builder.create_texture("fallback", TextureDescriptor::default(), CreateFlags::Write),
        |_, _| Ok(()),
    );
    let (from, to) = (*main, *fallback);
    let exec_log = log.clone();
    let post = graph.add_pass::<ResourceHandle, _, _>(
        "Post",
        |builder, out| {
            builder.read(to);
            *out = builder.create_texture("post", TextureDescriptor::default(), CreateFlags::Write);
        },
        move |resources, _| {
            assert_eq!(resources.try_texture(to)?.id, resources.try_texture(from)?.id);
            exec_log.push(execute("Post"));
            Ok(())
        },
    );
    graph.present(*post);

    assert!(graph.move_resource(from, to));
    graph.compile();
    assert_eq!(graph.is_culled(fallback.id()), Some(true));
    assert_eq!(graph.is_culled(main.id()), Some(false));
    assert_eq!(graph.pass(post.id()).unwrap().reads(), &[from]);
    graph.execute()?;

    assert!(log.contains(&execute("Post")));
    assert!(log.before(&create("main"), &execute("Post")));
    assert!(log.before(&execute("Post"), &destroy("main")));
    assert!(!log.contains(&create("fallback")));
    assert_eq!(graph.allocator().live_count(), 0);
    Ok(())
}

#[test]
fn illegal_moves_are_rejected() -> Result<()> {
    let log = EventLog::new();
    let mut graph = make_graph(&log);
    let (desc, texture) = backbuffer();
    let imported = graph.import_texture("swapchain", desc, texture);
    let pass = graph.add_pass::<(ResourceHandle, ResourceHandle, ResourceHandle), _, _>(
        "Pass",
        |builder, (a, b, c)| {
            *a = builder.create_texture("a", TextureDescriptor::default(), CreateFlags::Write);
            *b = builder.create_texture("b", TextureDescriptor::default(), CreateFlags::Write);
            *c = builder.create_texture("c", TextureDescriptor::default(), CreateFlags::Write);
        },
        |_, _| Ok(()),
    );
    let (a, b, c) = *pass.data();

    assert!(!graph.move_resource(a, a));
    assert!(!graph.move_resource(a, imported));
    assert!(!graph.move_resource(ResourceHandle::INVALID, b));
    assert!(graph.move_resource(a, b));
    // b is already replaced by a
    assert!(!graph.move_resource(c, b));
    // b already uses a's storage, so the reverse would loop
    assert!(!graph.move_resource(b, a));
    assert!(graph.move_resource(c, a));

    // The graph is still usable after rejected moves.
    graph.present(b);
    graph.execute()?;
    assert_eq!(log.events(), vec![create("c"), destroy("c")]);
    Ok(())
}

/// Three passes each producing one texture, with the last one presented.
fn three_producers(graph: &mut FrameGraph<'_, RecordingAllocator>, log: &EventLog) -> [PassView<ResourceHandle>; 3] {
    ["A", "B", "C"].map(|name| {
        let exec_log = log.clone();
        graph.add_pass::<ResourceHandle, _, _>(
            name,
            |builder, out| *out = builder.create_texture(name, TextureDescriptor::default(), CreateFlags::Write),
            move |_, _| {
                exec_log.push(execute(name));
                Ok(())
            },
        )
    })
}

#[test]
fn chained_moves_do_not_depend_on_order() -> Result<()> {
    let mut frames = vec![];
    for reversed in [false, true] {
        let log = EventLog::new();
        let mut graph = make_graph(&log);
        let [a, b, c] = three_producers(&mut graph, &log);
        graph.present(*c);
        if reversed {
            assert!(graph.move_resource(*b, *c));
            assert!(graph.move_resource(*a, *b));
        } else {
            assert!(graph.move_resource(*a, *b));
            assert!(graph.move_resource(*b, *c));
        }

        graph.compile();
        assert_eq!(graph.is_culled(a.id()), Some(false));
        assert_eq!(graph.is_culled(b.id()), Some(true));
        assert_eq!(graph.is_culled(c.id()), Some(true));
        let present = graph.passes().last().unwrap();
        assert_eq!(present.reads(), &[*a]);
        graph.execute()?;
        frames.push(log.events());
    }

    assert_eq!(frames[0], vec![create("A"), execute("A"), destroy("A")]);
    assert_eq!(frames[0], frames[1]);
    Ok(())
}

#[test]
fn sampled_textures_are_created_single_sampled() -> Result<()> {
    let log = EventLog::new();
    let mut graph = make_graph(&log);
    let pass = graph.add_pass::<ResourceHandle, _, _>(
        "Resolve",
        |builder, out| {
            let desc = TextureDescriptor::new_2d(256, 256, vk::Format::R16G16B16A16_SFLOAT).samples(vk::SampleCountFlags::TYPE_4);
            *out = builder.create_texture("msaa", desc, CreateFlags::Write);
        },
        |resources, out| {
            let texture = resources.try_texture(*out)?;
            assert_eq!(texture.desc.samples, vk::SampleCountFlags::TYPE_1);
            // The graph keeps the requested descriptor.
            assert_eq!(resources.descriptor(*out).unwrap().samples, vk::SampleCountFlags::TYPE_4);
            Ok(())
        },
    );
    graph.present(*pass);
    graph.execute()?;
    assert_eq!(log.events(), vec![create("msaa"), destroy("msaa")]);
    Ok(())
}

#[test]
fn textures_without_usage_are_not_allocated() -> Result<()> {
    let log = EventLog::new();
    let mut graph = make_graph(&log);
    let pass = graph.add_pass::<ResourceHandle, _, _>(
        "Virtual",
        |builder, out| {
            let desc = TextureDescriptor::default().usage(vk::ImageUsageFlags::empty());
            *out = builder.create_texture("virtual", desc, CreateFlags::Write);
        },
        |resources, out| {
            assert!(resources.texture(*out).is_none());
            assert!(resources.try_texture(*out).is_err());
            Ok(())
        },
    );
    graph.present(*pass);
    graph.compile();
    assert_eq!(graph.summary().unwrap().transient_resources, 0);
    graph.execute()?;
    assert!(log.events().is_empty());
    Ok(())
}

#[test]
fn create_flags_register_accesses() -> Result<()> {
    let log = EventLog::new();
    let mut graph = make_graph(&log);
    let pass = graph.add_pass::<[ResourceHandle; 4], _, _>(
        "Flags",
        |builder, handles| {
            let desc = TextureDescriptor::default();
            handles[0] = builder.create_texture("unknown", desc, CreateFlags::Unknown);
            handles[1] = builder.create_texture("read", desc, CreateFlags::Read);
            handles[2] = builder.create_texture("write", desc, CreateFlags::Write);
            handles[3] = builder.create_texture("read write", desc, CreateFlags::ReadWrite);
            builder.side_effect();
        },
        |_, _| Ok(()),
    );
    let [unknown, read, write, read_write] = *pass.data();
    assert_eq!([unknown.version(), read.version(), write.version(), read_write.version()], [0, 0, 1, 1]);

    let node = graph.pass(pass.id()).unwrap();
    assert_eq!(node.reads().len(), 2);
    assert!(node.reads().contains(&read));
    assert_eq!(node.writes(), &[write, read_write]);

    graph.execute()?;
    // Only resources the pass actually uses get backing storage.
    assert!(!log.contains(&create("unknown")));
    for name in ["read", "write", "read write"] {
        assert!(log.contains(&create(name)));
        assert!(log.contains(&destroy(name)));
    }
    Ok(())
}

#[test]
fn pass_data_is_handed_to_execute() -> Result<()> {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Blur {
        input: ResourceHandle,
        output: ResourceHandle,
        radius: u32,
    }

    let log = EventLog::new();
    let mut graph = make_graph(&log);
    let source = graph.add_pass::<ResourceHandle, _, _>(
        "Source",
        |builder, out| *out = builder.create_texture("source", TextureDescriptor::default(), CreateFlags::Write),
        |_, _| Ok(()),
    );
    let source = *source;
    let exec_log = log.clone();
    let blur = graph.add_pass::<Blur, _, _>(
        "Blur",
        |builder, data| {
            data.input = builder.read(source);
            data.output = builder.create_texture("blurred", TextureDescriptor::default(), CreateFlags::Write);
            data.radius = 4;
        },
        move |resources, data| {
            assert_eq!(data.radius, 4);
            assert_eq!(resources.name(data.input), Some("source"));
            assert_eq!(resources.name(data.output), Some("blurred"));
            exec_log.push(execute("Blur"));
            Ok(())
        },
    );
    assert_eq!(blur.radius, 4);
    graph.present(blur.output);
    graph.execute()?;
    assert!(log.contains(&execute("Blur")));
    Ok(())
}
