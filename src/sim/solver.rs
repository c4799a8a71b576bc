//! Power-flow feasibility seam: the solver trait and a built-in stand-in.

use crate::network::model::{BranchRecord, BusRecord, GenRecord, NetworkModel};
use crate::network::graph::Island;

/// Solver knobs passed through on every call.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Slack allowed when comparing available capacity to demand (MW).
    pub tolerance_mw: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { tolerance_mw: 1e-6 }
    }
}

/// Owned snapshot of one island's records, in the network's own column
/// layout.
///
/// Solvers receive and return this shape, so anything extra they compute
/// internally never reaches the authoritative tables.
#[derive(Debug, Clone)]
pub struct IslandState {
    pub buses: Vec<BusRecord>,
    pub branches: Vec<BranchRecord>,
    pub gens: Vec<GenRecord>,
}

impl IslandState {
    /// Snapshots the island's records out of the model.
    pub fn from_network(model: &NetworkModel, island: &Island) -> Self {
        Self {
            buses: island.bus_ids.iter().map(|&id| model.bus(id).clone()).collect(),
            branches: island
                .branch_ids
                .iter()
                .map(|&id| model.branch(id).clone())
                .collect(),
            gens: island
                .gen_ids
                .iter()
                .map(|&id| model.generator(id).clone())
                .collect(),
        }
    }

    pub fn total_demand_mw(&self) -> f64 {
        self.buses.iter().map(|b| b.demand_mw).sum()
    }

    pub fn total_demand_mvar(&self) -> f64 {
        self.buses.iter().map(|b| b.demand_mvar).sum()
    }

    /// Capacity of in-service generation (MW).
    pub fn online_capacity_mw(&self) -> f64 {
        self.gens
            .iter()
            .filter(|g| g.in_service)
            .map(|g| g.capacity_mw)
            .sum()
    }
}

/// Result of one feasibility attempt.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub island: IslandState,
    pub success: bool,
}

/// External feasibility check for one island.
///
/// Synchronous with no timing guarantee; retry and back-off policy belongs to
/// the caller (the island resolver's bounded ramp). Infeasibility is an
/// outcome, not an error.
pub trait PowerFlowSolver {
    fn solve(&mut self, island: &IslandState, config: &SolverConfig) -> SolveOutcome;
}

/// Copper-plate stand-in for the external OPF collaborator.
///
/// An island is feasible when in-service generation capacity covers its
/// demand; generators then pick up load proportionally to capacity and every
/// bus is served in full. Good enough to drive the restoration loop in demos
/// and tests.
#[derive(Debug, Clone, Default)]
pub struct CapacityBalanceSolver;

impl PowerFlowSolver for CapacityBalanceSolver {
    fn solve(&mut self, island: &IslandState, config: &SolverConfig) -> SolveOutcome {
        let mut next = island.clone();
        let demand_mw = next.total_demand_mw();
        let demand_mvar = next.total_demand_mvar();
        let capacity = next.online_capacity_mw();

        if capacity + config.tolerance_mw < demand_mw {
            return SolveOutcome {
                island: next,
                success: false,
            };
        }

        for g in &mut next.gens {
            if g.in_service && capacity > 0.0 {
                let share = g.capacity_mw / capacity;
                g.output_mw = share * demand_mw;
                g.output_mvar = share * demand_mvar;
            } else {
                g.output_mw = 0.0;
                g.output_mvar = 0.0;
            }
        }
        for b in &mut next.buses {
            b.served_mw = b.demand_mw;
            b.served_mvar = b.demand_mvar;
        }

        SolveOutcome {
            island: next,
            success: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkGraph;

    fn whole_network_state() -> IslandState {
        let model = NetworkModel::study_case();
        let graph = NetworkGraph::from_model(&model);
        let islands = graph.islands(|_| true);
        IslandState::from_network(&model, &islands[0])
    }

    #[test]
    fn ample_capacity_serves_all_demand() {
        let state = whole_network_state();
        let mut solver = CapacityBalanceSolver;
        let outcome = solver.solve(&state, &SolverConfig::default());
        assert!(outcome.success);

        let served: f64 = outcome.island.buses.iter().map(|b| b.served_mw).sum();
        assert!((served - 380.0).abs() < 1e-9);
        let dispatched: f64 = outcome.island.gens.iter().map(|g| g.output_mw).sum();
        assert!((dispatched - 380.0).abs() < 1e-9);
    }

    #[test]
    fn dispatch_is_proportional_to_capacity() {
        let state = whole_network_state();
        let mut solver = CapacityBalanceSolver;
        let outcome = solver.solve(&state, &SolverConfig::default());
        // Capacities 250/150/100 out of 500.
        let g = &outcome.island.gens;
        assert!((g[0].output_mw - 380.0 * 0.5).abs() < 1e-9);
        assert!((g[1].output_mw - 380.0 * 0.3).abs() < 1e-9);
        assert!((g[2].output_mw - 380.0 * 0.2).abs() < 1e-9);
    }

    #[test]
    fn shortfall_is_infeasible_and_leaves_state_alone() {
        let mut state = whole_network_state();
        for g in &mut state.gens {
            g.in_service = false;
        }
        let before_served: Vec<f64> = state.buses.iter().map(|b| b.served_mw).collect();
        let mut solver = CapacityBalanceSolver;
        let outcome = solver.solve(&state, &SolverConfig::default());
        assert!(!outcome.success);
        let after_served: Vec<f64> = outcome.island.buses.iter().map(|b| b.served_mw).collect();
        assert_eq!(before_served, after_served);
    }

    #[test]
    fn zero_demand_island_is_trivially_feasible() {
        let mut state = whole_network_state();
        for b in &mut state.buses {
            b.demand_mw = 0.0;
            b.demand_mvar = 0.0;
        }
        let mut solver = CapacityBalanceSolver;
        let outcome = solver.solve(&state, &SolverConfig::default());
        assert!(outcome.success);
        assert!(outcome.island.gens.iter().all(|g| g.output_mw == 0.0));
    }
}
