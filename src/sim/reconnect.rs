//! Opportunistic reconnection of de-energized equipment near a repair.

use std::collections::{HashSet, VecDeque};

use crate::network::{NetworkGraph, NetworkModel};
use crate::sim::component::{ComponentRef, ComponentType, ComponentRegistry, Status};

/// Hop budget for the neighborhood search.
pub const RECONNECT_DEPTH: usize = 2;

/// Restores disconnected equipment within [`RECONNECT_DEPTH`] hops of a
/// just-restored component, consuming no crew time.
///
/// Worklist BFS anchored at the component's incident bus (a branch anchors at
/// its "from" bus, a generator at its host bus). Each visited bus contributes
/// itself and its generators; while hop budget remains, its incident branches
/// are candidates too and adjacent buses are enqueued. Damaged or actively
/// repaired equipment is never reconnected here — it must go through the crew
/// queue.
///
/// Returns the components restored by this call.
pub fn reconnect_neighbors(
    origin: ComponentRef,
    model: &mut NetworkModel,
    graph: &NetworkGraph,
    registry: &mut ComponentRegistry,
) -> Vec<ComponentRef> {
    let anchor = match origin.ctype {
        ComponentType::Branch => model.branch(origin.id).from_bus,
        ComponentType::Bus => origin.id,
        ComponentType::Generator => model.generator(origin.id).bus,
    };

    let mut restored = Vec::new();
    let mut visited: HashSet<usize> = HashSet::new();
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
    queue.push_back((anchor, RECONNECT_DEPTH));

    while let Some((bus, budget)) = queue.pop_front() {
        if !visited.insert(bus) {
            continue;
        }

        try_restore(ComponentRef::bus(bus), model, registry, &mut restored);
        for &gen_id in graph.gens_at(bus) {
            try_restore(ComponentRef::generator(gen_id), model, registry, &mut restored);
        }

        if budget == 0 {
            continue;
        }
        for (branch, other) in graph.incident(bus) {
            try_restore(ComponentRef::branch(branch), model, registry, &mut restored);
            if !visited.contains(&other) {
                queue.push_back((other, budget - 1));
            }
        }
    }

    restored
}

fn try_restore(
    comp: ComponentRef,
    model: &mut NetworkModel,
    registry: &mut ComponentRegistry,
    restored: &mut Vec<ComponentRef>,
) {
    // A component already restored earlier in the batch is no longer
    // Disconnected, so this check also deduplicates.
    if registry.status(comp) != Status::Disconnected {
        return;
    }
    registry.set_status(comp, Status::Restored);
    model.energize(comp);
    restored.push(comp);
}
