//! Island repartitioning and feasibility-driven load pickup.

use crate::network::model::BusKind;
use crate::network::{Island, NetworkGraph, NetworkModel};
use crate::sim::component::{ComponentRef, ComponentRegistry, Status};
use crate::sim::solver::{IslandState, PowerFlowSolver, SolverConfig};

/// What happened to one touched island during resolution.
#[derive(Debug, Clone)]
pub struct IslandOutcome {
    pub island_index: usize,
    /// Demand reached the pre-disturbance level and solved.
    pub fully_restored: bool,
    /// Ramp steps actually attempted (0 for a direct-only resolution).
    pub ramp_steps_used: usize,
    /// False when the ramp budget ran out or a step failed mid-ramp.
    pub converged: bool,
}

/// Re-checks feasibility of islands touched by restorations.
///
/// Each touched island first gets a direct attempt at its pre-disturbance
/// demand. On failure the resolver ramps demand toward that target in
/// `ramp_steps` fixed increments, keeping the last state that solved. Once
/// any island solves at full demand, a global flag switches later islands to
/// the direct attempt only.
pub struct IslandResolver {
    ramp_steps: usize,
    solver_config: SolverConfig,
    load_restored: bool,
}

impl IslandResolver {
    /// # Panics
    ///
    /// Panics if `ramp_steps` is zero.
    pub fn new(ramp_steps: usize, solver_config: SolverConfig) -> Self {
        assert!(ramp_steps > 0, "ramp needs at least one step");
        Self {
            ramp_steps,
            solver_config,
            load_restored: false,
        }
    }

    /// Whether some island has already solved at full pre-disturbance demand.
    pub fn load_restored(&self) -> bool {
        self.load_restored
    }

    /// Repartitions the network and resolves every island containing at
    /// least one component restored this iteration. Islands are visited once
    /// each, in discovery order.
    pub fn resolve_touched<S: PowerFlowSolver>(
        &mut self,
        model: &mut NetworkModel,
        graph: &NetworkGraph,
        registry: &ComponentRegistry,
        restored: &[ComponentRef],
        solver: &mut S,
    ) -> Vec<IslandOutcome> {
        let islands = graph.islands(|branch_id| {
            matches!(
                registry.status(ComponentRef::branch(branch_id)),
                Status::Healthy | Status::Restored
            )
        });

        let mut outcomes = Vec::new();
        for (island_index, island) in islands.iter().enumerate() {
            if !restored.iter().any(|&c| island.contains(c)) {
                continue;
            }
            outcomes.push(self.resolve_one(island_index, island, model, solver));
        }
        outcomes
    }

    fn resolve_one<S: PowerFlowSolver>(
        &mut self,
        island_index: usize,
        island: &Island,
        model: &mut NetworkModel,
        solver: &mut S,
    ) -> IslandOutcome {
        normalize_reference_bus(model, island);
        let start = IslandState::from_network(model, island);

        // Direct attempt at pre-disturbance demand.
        let mut full = start.clone();
        for bus in &mut full.buses {
            let (p, q) = model.baseline_demand(bus.id);
            bus.demand_mw = p;
            bus.demand_mvar = q;
        }
        let direct = solver.solve(&full, &self.solver_config);
        if direct.success {
            model.write_back(&direct.island);
            self.load_restored = true;
            return IslandOutcome {
                island_index,
                fully_restored: true,
                ramp_steps_used: 0,
                converged: true,
            };
        }

        // Past the first full restoration, later islands do not ramp: a
        // failed direct attempt just keeps the current (last known-good)
        // state.
        if self.load_restored {
            return IslandOutcome {
                island_index,
                fully_restored: false,
                ramp_steps_used: 0,
                converged: false,
            };
        }

        // Incremental ramp: each step moves demand gap/ramp_steps closer to
        // the pre-disturbance level. A failing step rolls back to the last
        // state that solved; exhausting the budget accepts the final state.
        let mut last_good: Option<IslandState> = None;
        let mut steps_used = 0;
        let mut converged = true;
        for k in 1..=self.ramp_steps {
            let fraction = k as f64 / self.ramp_steps as f64;
            let mut step = start.clone();
            for (bus, origin) in step.buses.iter_mut().zip(&start.buses) {
                let (p_full, q_full) = model.baseline_demand(bus.id);
                bus.demand_mw = origin.demand_mw + (p_full - origin.demand_mw) * fraction;
                bus.demand_mvar = origin.demand_mvar + (q_full - origin.demand_mvar) * fraction;
            }
            let outcome = solver.solve(&step, &self.solver_config);
            steps_used = k;
            if outcome.success {
                last_good = Some(outcome.island);
            } else {
                converged = false;
                break;
            }
        }

        let fully_restored = converged;
        if let Some(state) = last_good {
            model.write_back(&state);
        }
        IslandOutcome {
            island_index,
            fully_restored,
            ramp_steps_used: steps_used,
            converged,
        }
    }
}

/// Ensures the island has exactly one reference bus.
///
/// Extra reference-capable buses are demoted to load buses (the lowest id
/// wins); an island without one gets the lowest-id generator bus, or failing
/// that the lowest-id bus.
fn normalize_reference_bus(model: &mut NetworkModel, island: &Island) {
    let refs: Vec<usize> = island
        .bus_ids
        .iter()
        .copied()
        .filter(|&b| model.bus(b).kind == BusKind::Reference)
        .collect();

    match refs.split_first() {
        Some((_, extra)) => {
            for &b in extra {
                model.bus_mut(b).kind = BusKind::Load;
            }
        }
        None => {
            let pick = island
                .bus_ids
                .iter()
                .copied()
                .find(|&b| model.gens().iter().any(|g| g.bus == b))
                .unwrap_or(island.bus_ids[0]);
            model.bus_mut(pick).kind = BusKind::Reference;
        }
    }
}
