//! Shared test fixtures for integration tests.

use grid_restore_sim::network::NetworkModel;
use grid_restore_sim::sim::component::{ComponentRef, ComponentRegistry, ComponentType, Status};
use grid_restore_sim::sim::crew::RepairTask;
use grid_restore_sim::sim::engine::EngineOptions;

/// The study grid plus a matching all-healthy registry.
pub fn study_network() -> (NetworkModel, ComponentRegistry) {
    let model = NetworkModel::study_case();
    let registry =
        ComponentRegistry::new(model.branch_count(), model.bus_count(), model.gen_count());
    (model, registry)
}

/// Marks components damaged with the given repair durations and returns the
/// matching repair tasks.
pub fn damage(
    model: &mut NetworkModel,
    registry: &mut ComponentRegistry,
    work: &[(ComponentRef, f64)],
) -> Vec<RepairTask> {
    let mut tasks = Vec::with_capacity(work.len());
    for &(comp, duration_hr) in work {
        registry.set_status(comp, Status::Damaged);
        model.de_energize(comp);
        if comp.ctype == ComponentType::Bus {
            shed_bus(model, comp.id);
        }
        tasks.push(RepairTask { comp, duration_hr });
    }
    tasks
}

/// Marks components disconnected (tripped, undamaged), shedding bus demand.
pub fn disconnect(
    model: &mut NetworkModel,
    registry: &mut ComponentRegistry,
    comps: &[ComponentRef],
) {
    for &comp in comps {
        registry.set_status(comp, Status::Disconnected);
        model.de_energize(comp);
        if comp.ctype == ComponentType::Bus {
            shed_bus(model, comp.id);
        }
    }
}

fn shed_bus(model: &mut NetworkModel, bus_id: usize) {
    let bus = model.bus_mut(bus_id);
    bus.demand_mw = 0.0;
    bus.demand_mvar = 0.0;
    bus.served_mw = 0.0;
    bus.served_mvar = 0.0;
}

/// Default engine options used across the integration tests.
pub fn default_options() -> EngineOptions {
    EngineOptions::default()
}
