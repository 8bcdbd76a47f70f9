//! Graph compilation: pass culling and resource lifetime computation.
//!
//! Compiling runs in four steps:
//! 1. Moves recorded through [`FrameGraph::move_resource`](crate::FrameGraph::move_resource) redirect the reads of
//!    the moved resource to the resource it was moved from.
//! 2. Every pass gets a reference for each resource version it produces, and every resource version gets a
//!    reference for each pass reading it.
//! 3. Resource versions nobody reads are peeled off the graph, releasing a reference on their writer. A writer left
//!    without references is culled, which in turn releases its reads. This continues until nothing changes.
//! 4. For every resource used by a live pass, the first and last live pass using it are recorded. The resource is
//!    devirtualized before the first one executes and destroyed after the last one.
//!
//! Passes are never reordered. Execution order is always the order in which passes were added.

use std::collections::HashMap;

use crate::core::error::Error;
use crate::core::settings::GraphSettings;
use crate::graph::handle::ResourceHandle;
use crate::graph::pass::{PassId, PassNode};
use crate::graph::resource::ResourceRegistry;

/// A recorded resource move. Reads of `to` are served by `from`, and `to` shares the backing storage of `from`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Alias {
    /// The resource that is moved
    pub from: ResourceHandle,
    /// The resource that is replaced
    pub to: ResourceHandle,
}

/// Statistics about a compiled graph.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CompileSummary {
    /// Passes that will execute.
    pub live_passes: usize,
    /// Passes that were culled.
    pub culled_passes: usize,
    /// Transient resources that will be allocated. Resources without usage flags are not counted.
    pub transient_resources: usize,
}

pub(crate) fn compile<T>(
    passes: &mut [PassNode<'_, T>],
    registry: &mut ResourceRegistry,
    aliases: &[Alias],
    settings: &GraphSettings,
) -> CompileSummary {
    reset_compiled_state(passes, registry);
    apply_aliases(passes, aliases);
    count_references(passes, registry, settings);
    cull(passes, registry, settings);
    let transient_resources = assign_lifetimes(passes, registry);
    check_invariants(passes, registry, settings);

    let live_passes = passes.iter().filter(|pass| !pass.is_culled()).count();
    CompileSummary {
        live_passes,
        culled_passes: passes.len() - live_passes,
        transient_resources,
    }
}

fn reset_compiled_state<T>(passes: &mut [PassNode<'_, T>], registry: &mut ResourceRegistry) {
    for pass in passes.iter_mut() {
        pass.ref_count = 0;
        pass.devirtualize.clear();
        pass.destroy.clear();
    }
    for slot in registry.iter_mut() {
        slot.sub_resource = Default::default();
        for version in slot.versions.iter_mut() {
            version.reader_count = 0;
        }
    }
}

fn apply_aliases<T>(passes: &mut [PassNode<'_, T>], aliases: &[Alias]) {
    if aliases.is_empty() {
        return;
    }
    let replaced: HashMap<ResourceHandle, ResourceHandle> = aliases.iter().map(|alias| (alias.to, alias.from)).collect();
    // Follows moves until reaching a handle that was not replaced, regardless of the order moves were recorded in.
    let resolve = |handle: ResourceHandle| {
        let mut current = handle;
        for _ in 0..=replaced.len() {
            match replaced.get(&current) {
                Some(&from) => current = from,
                None => return current,
            }
        }
        error!("Move chain starting at resource {} does not terminate.", handle);
        handle
    };

    for pass in passes.iter_mut() {
        let mut redirected = false;
        for read in pass.reads.iter_mut() {
            let resolved = resolve(*read);
            if resolved != *read {
                trace!("Pass {} now reads {} instead of {}", pass.name, resolved, read);
                *read = resolved;
                redirected = true;
            }
        }
        if redirected {
            // A pass reading both resources must only hold one reference
            let mut seen = Vec::with_capacity(pass.reads.len());
            pass.reads.retain(|read| {
                if seen.contains(read) {
                    false
                } else {
                    seen.push(*read);
                    true
                }
            });
        }
    }
}

fn count_references<T>(passes: &mut [PassNode<'_, T>], registry: &mut ResourceRegistry, settings: &GraphSettings) {
    for pass in passes.iter_mut() {
        pass.ref_count = pass.writes.len() as u32 + pass.side_effect as u32;
        if pass.ref_count == 0 {
            // Nothing can ever need this pass, so its reads must not keep anything alive either.
            if settings.log_culled_passes {
                debug!("Culling pass {}: it has no outputs and no side effects", pass.name);
            }
            continue;
        }
        for read in &pass.reads {
            registry.slot_at_mut(read.index).versions[read.version as usize].reader_count += 1;
        }
    }
}

fn cull<T>(passes: &mut [PassNode<'_, T>], registry: &mut ResourceRegistry, settings: &GraphSettings) {
    let mut stack: Vec<ResourceHandle> = Vec::with_capacity(registry.len());
    for (index, slot) in registry.iter().enumerate() {
        for (version, node) in slot.versions.iter().enumerate() {
            if node.reader_count == 0 {
                stack.push(ResourceHandle::new(index as u16, version as u16));
            }
        }
    }

    while let Some(resource) = stack.pop() {
        // by construction, a version has at most one producer: writing always creates a new version,
        // and a stale handle cannot be written to
        let Some(writer) = registry.slot_at(resource.index).versions[resource.version as usize].writer else {
            continue;
        };
        let pass = &mut passes[writer.index()];
        debug_assert!(pass.ref_count >= 1, "pass {} released more references than it holds", pass.name);
        pass.ref_count = pass.ref_count.saturating_sub(1);
        if pass.ref_count > 0 {
            continue;
        }

        if settings.log_culled_passes {
            debug!("Culling pass {}: none of its outputs are used", pass.name);
        }
        for read in &pass.reads {
            let node = &mut registry.slot_at_mut(read.index).versions[read.version as usize];
            node.reader_count -= 1;
            if node.reader_count == 0 {
                stack.push(*read);
            }
        }
    }
}

/// Records first and last users and fills the devirtualize and destroy lists. Returns the amount of transient
/// resources that will be allocated.
fn assign_lifetimes<T>(passes: &mut [PassNode<'_, T>], registry: &mut ResourceRegistry) -> usize {
    for pass in passes.iter().filter(|pass| !pass.is_culled()) {
        for read in &pass.reads {
            let slot = registry.slot_at(read.index);
            let never_written = slot.versions[read.version as usize].writer.is_none();
            if never_written && !slot.is_imported() && !registry.slot_at(registry.physical(read.index)).is_imported() {
                warn!("Pass {} reads resource {} ({}), which is never written", pass.name, slot.name, read);
            }
            let physical = registry.physical(read.index);
            let sub = &mut registry.slot_at_mut(physical).sub_resource;
            sub.reader_count += 1;
            sub.first_user.get_or_insert(pass.id);
            sub.last_user = Some(pass.id);
        }
        for write in &pass.writes {
            let physical = registry.physical(write.index);
            let sub = &mut registry.slot_at_mut(physical).sub_resource;
            sub.writer_count += 1;
            sub.writer = Some(pass.id);
            sub.first_user.get_or_insert(pass.id);
            sub.last_user = Some(pass.id);
        }
    }

    let mut transient = 0;
    for index in 0..registry.len() as u16 {
        let slot = registry.slot_at(index);
        let sub = &slot.sub_resource;
        let (Some(first), Some(last)) = (sub.first_user, sub.last_user) else {
            continue;
        };
        if slot.is_imported() {
            continue;
        }
        if sub.reader_count == 0 {
            warn!("Resource {} is written by a live pass but never read, allocating it anyway", slot.name);
        }
        passes[first.index()].devirtualize.push(index);
        passes[last.index()].destroy.push(index);
        // textures without usage flags are never handed to the allocator
        if !slot.desc.usage.is_empty() {
            transient += 1;
        }
    }
    transient
}

fn violation(settings: &GraphSettings, err: Error) {
    if settings.enable_validation {
        panic!("Frame graph {} is inconsistent: {}", settings.name, err);
    }
    error!("Frame graph {} is inconsistent: {}", settings.name, err);
}

fn check_invariants<T>(passes: &[PassNode<'_, T>], registry: &ResourceRegistry, settings: &GraphSettings) {
    for slot in registry.iter() {
        if slot.versions.iter().any(|version| version.writer_count > 1) {
            violation(settings, Error::MultipleWriters(slot.name.clone()));
        }
    }

    if !settings.enable_validation {
        return;
    }

    // Every live use of a resource must lie within its lifetime.
    let users = |pass: &PassNode<'_, T>| -> Vec<u16> {
        pass.reads
            .iter()
            .chain(pass.writes.iter())
            .map(|handle| registry.physical(handle.index))
            .collect()
    };
    for pass in passes.iter().filter(|pass| !pass.is_culled()) {
        for index in users(pass) {
            let slot = registry.slot_at(index);
            let sub = &slot.sub_resource;
            let bracketed = matches!((sub.first_user, sub.last_user),
                (Some(first), Some(last)) if first <= pass.id && pass.id <= last);
            if !bracketed {
                violation(settings, Error::OutsideLifetime {
                    pass: pass.name.clone(),
                    resource: slot.name.clone(),
                });
            }
        }
    }
}

/// Whether `pass` survives compilation. Used by the debug export.
pub(crate) fn is_live<T>(passes: &[PassNode<'_, T>], pass: Option<PassId>) -> bool {
    pass.map(|pass| !passes[pass.index()].is_culled()).unwrap_or(false)
}
