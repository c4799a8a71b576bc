//! Restoration engine: the discrete-event main loop.

use std::fmt;

use crate::network::{NetworkGraph, NetworkModel};
use crate::sim::clock::{DEFAULT_RECONNECT_THRESHOLD_HR, SimulationClock};
use crate::sim::component::{ComponentRef, ComponentType, ComponentRegistry, Status};
use crate::sim::crew::{CrewAllocator, CrewPool, RepairTask};
use crate::sim::indicators::{IndicatorRecorder, IndicatorRow};
use crate::sim::island::IslandResolver;
use crate::sim::reconnect::reconnect_neighbors;
use crate::sim::solver::{PowerFlowSolver, SolverConfig};

/// Restoration-loop knobs.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Simulated hours after which all remaining disconnected equipment is
    /// reconnected in one batch (one-shot).
    pub reconnect_threshold_hr: f64,
    /// Hard cap on restoration iterations; hitting it truncates the run.
    pub max_iterations: usize,
    /// Ramp steps for the island feasibility retry.
    pub ramp_steps: usize,
    pub solver_config: SolverConfig,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            reconnect_threshold_hr: DEFAULT_RECONNECT_THRESHOLD_HR,
            max_iterations: 500,
            ramp_steps: 10,
            solver_config: SolverConfig::default(),
        }
    }
}

/// Everything a finished run leaves behind.
pub struct RestorationResult {
    /// One indicator row per iteration.
    pub indicators: Vec<IndicatorRow>,
    /// Event time of each iteration (hours).
    pub times_hr: Vec<f64>,
    pub iterations: usize,
    /// Total elapsed simulated hours.
    pub elapsed_hr: f64,
    /// True when the iteration cap fired with work still outstanding.
    pub truncated: bool,
    /// Final authoritative tables.
    pub model: NetworkModel,
    /// Final component statuses.
    pub registry: ComponentRegistry,
}

impl RestorationResult {
    pub fn report(&self) -> RestorationReport {
        RestorationReport {
            elapsed_hr: self.elapsed_hr,
            iterations: self.iterations,
            truncated: self.truncated,
            outaged_branches: self.registry.outaged_count(ComponentType::Branch),
            outaged_buses: self.registry.outaged_count(ComponentType::Bus),
            outaged_generators: self.registry.outaged_count(ComponentType::Generator),
            served_fraction: if self.model.total_baseline_mw() > 0.0 {
                self.model.total_served_mw() / self.model.total_baseline_mw()
            } else {
                1.0
            },
        }
    }
}

/// End-of-run summary.
#[derive(Debug, Clone)]
pub struct RestorationReport {
    pub elapsed_hr: f64,
    pub iterations: usize,
    pub truncated: bool,
    pub outaged_branches: usize,
    pub outaged_buses: usize,
    pub outaged_generators: usize,
    /// Served active power as a fraction of pre-disturbance demand.
    pub served_fraction: f64,
}

impl fmt::Display for RestorationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Restoration Report ---")?;
        writeln!(f, "Elapsed:            {:.2} h", self.elapsed_hr)?;
        writeln!(f, "Iterations:         {}", self.iterations)?;
        writeln!(
            f,
            "Remaining outages:  {} branches, {} buses, {} generators",
            self.outaged_branches, self.outaged_buses, self.outaged_generators
        )?;
        writeln!(f, "Load served:        {:.1}%", self.served_fraction * 100.0)?;
        write!(
            f,
            "Status:             {}",
            if self.truncated {
                "TRUNCATED (iteration cap reached)"
            } else {
                "complete"
            }
        )
    }
}

/// Drives restoration to completion: repair completions, opportunistic
/// reconnection, mass reconnection past the threshold, island feasibility,
/// and indicator bookkeeping.
///
/// Generic over the feasibility solver for static dispatch. The loop itself
/// draws no randomness: given fixed repair durations and crew capacities the
/// restoration ordering and timing are fully deterministic.
pub struct RestorationEngine<S: PowerFlowSolver> {
    model: NetworkModel,
    graph: NetworkGraph,
    registry: ComponentRegistry,
    crews: CrewAllocator,
    clock: SimulationClock,
    resolver: IslandResolver,
    recorder: IndicatorRecorder,
    solver: S,
    max_iterations: usize,
    times_hr: Vec<f64>,
}

impl<S: PowerFlowSolver> RestorationEngine<S> {
    /// Creates an engine over a disturbed network.
    ///
    /// `tasks` carries one repair duration per damaged component; the initial
    /// crew admission happens here, at t = 0.
    pub fn new(
        model: NetworkModel,
        mut registry: ComponentRegistry,
        pool: CrewPool,
        tasks: Vec<RepairTask>,
        solver: S,
        options: EngineOptions,
    ) -> Self {
        let graph = NetworkGraph::from_model(&model);
        let mut crews = CrewAllocator::new(pool, tasks);
        crews.replenish(&mut registry);
        Self {
            model,
            graph,
            registry,
            crews,
            clock: SimulationClock::new(options.reconnect_threshold_hr),
            resolver: IslandResolver::new(options.ramp_steps, options.solver_config),
            recorder: IndicatorRecorder::new(),
            solver,
            max_iterations: options.max_iterations,
            times_hr: Vec::new(),
        }
    }

    fn finished(&self) -> bool {
        self.crews.remaining_work() == 0 && !self.registry.any_with_status(Status::Disconnected)
    }

    /// Runs the loop until both queues drain or the iteration cap fires.
    pub fn run(mut self) -> RestorationResult {
        let mut iterations = 0;
        let mut truncated = false;
        while !self.finished() {
            if iterations >= self.max_iterations {
                truncated = true;
                break;
            }
            iterations += 1;
            self.step(iterations);
        }

        RestorationResult {
            indicators: self.recorder.into_rows(),
            times_hr: self.times_hr,
            iterations,
            elapsed_hr: self.clock.t_cur(),
            truncated,
            model: self.model,
            registry: self.registry,
        }
    }

    fn step(&mut self, iteration: usize) {
        // 1. Advance to the next event: earliest repair completion, clamped
        //    to the mass-reconnect threshold. No active work means the clock
        //    jumps to the threshold (crews starved) or stays put (nothing
        //    left needing crew time).
        let proposed = match self.crews.min_remaining() {
            Some(remaining) => self.clock.t_prev() + remaining,
            None if self.crews.queued_len() > 0 => self.clock.threshold_hr(),
            None => self.clock.t_prev(),
        };
        let t_cur = if proposed.is_finite() {
            self.clock.propose(proposed)
        } else {
            // Starved crews with the threshold already spent: time cannot
            // advance; the iteration cap terminates the run.
            self.clock.propose(self.clock.t_prev())
        };
        let dt = t_cur - self.clock.t_prev();
        let threshold_hit = self.clock.at_threshold();

        // 2–3. Apply all completions at this boundary together, running the
        //      neighborhood reconnection for each.
        let mut restored_batch: Vec<ComponentRef> = Vec::new();
        for comp in self.crews.take_completions(dt) {
            self.registry.set_status(comp, Status::Restored);
            self.model.energize(comp);
            restored_batch.push(comp);
            let neighbors =
                reconnect_neighbors(comp, &mut self.model, &self.graph, &mut self.registry);
            restored_batch.extend(neighbors);
        }

        // 4. Mass reconnection once no crew work remains or the threshold is
        //    first crossed; the threshold is then raised for good.
        if self.crews.remaining_work() == 0 || threshold_hit {
            for ctype in ComponentType::ALL {
                for comp in self.registry.with_status(ctype, Status::Disconnected) {
                    self.registry.set_status(comp, Status::Restored);
                    self.model.energize(comp);
                    restored_batch.push(comp);
                }
            }
            self.clock.raise_threshold();
        }

        // Islands are repartitioned only after every mutation of this
        // iteration, then each touched island is checked for feasibility.
        if !restored_batch.is_empty() {
            self.resolver.resolve_touched(
                &mut self.model,
                &self.graph,
                &self.registry,
                &restored_batch,
                &mut self.solver,
            );
        }

        // 5. Refill freed crew slots.
        self.crews.replenish(&mut self.registry);

        // 6. Burn down remaining work and commit the clock.
        self.crews.advance(dt);
        self.clock.commit();
        self.times_hr.push(t_cur);

        // 7. Bookkeeping.
        self.recorder
            .record(iteration, t_cur, &self.model, &self.registry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::solver::CapacityBalanceSolver;

    fn damaged_model(branch_ids: &[usize]) -> (NetworkModel, ComponentRegistry) {
        let mut model = NetworkModel::study_case();
        let mut registry =
            ComponentRegistry::new(model.branch_count(), model.bus_count(), model.gen_count());
        for &id in branch_ids {
            registry.set_status(ComponentRef::branch(id), Status::Damaged);
            model.de_energize(ComponentRef::branch(id));
        }
        (model, registry)
    }

    fn task(comp: ComponentRef, duration_hr: f64) -> RepairTask {
        RepairTask { comp, duration_hr }
    }

    #[test]
    fn clean_network_terminates_immediately() {
        let (model, registry) = damaged_model(&[]);
        let engine = RestorationEngine::new(
            model,
            registry,
            CrewPool::new(1, 1, 1),
            Vec::new(),
            CapacityBalanceSolver,
            EngineOptions::default(),
        );
        let result = engine.run();
        assert_eq!(result.iterations, 0);
        assert!(!result.truncated);
        assert!(result.times_hr.is_empty());
    }

    #[test]
    fn threshold_forces_one_mass_reconnect_batch() {
        let (mut model, mut registry) = damaged_model(&[1]);
        // A disconnected far-side bus that neighbor search cannot reach.
        registry.set_status(ComponentRef::bus(7), Status::Disconnected);
        model.bus_mut(7).demand_mw = 0.0;
        model.bus_mut(7).served_mw = 0.0;

        let engine = RestorationEngine::new(
            model,
            registry,
            CrewPool::new(1, 1, 1),
            vec![task(ComponentRef::branch(1), 1000.0)],
            CapacityBalanceSolver,
            EngineOptions::default(),
        );
        let result = engine.run();
        // Iteration 1 lands on the 600 h threshold and reconnects bus 7;
        // iteration 2 finishes the 1000 h repair.
        assert_eq!(result.times_hr, vec![600.0, 1000.0]);
        assert_eq!(
            result.registry.status(ComponentRef::bus(7)),
            Status::Restored
        );
        assert!(!result.truncated);
    }

    #[test]
    fn starved_crews_truncate_at_the_iteration_cap() {
        let (model, registry) = damaged_model(&[2]);
        let engine = RestorationEngine::new(
            model,
            registry,
            // No branch crew at all.
            CrewPool::new(0, 1, 1),
            vec![task(ComponentRef::branch(2), 4.0)],
            CapacityBalanceSolver,
            EngineOptions {
                max_iterations: 8,
                ..EngineOptions::default()
            },
        );
        let result = engine.run();
        assert!(result.truncated);
        assert_eq!(result.iterations, 8);
        assert_eq!(
            result.registry.status(ComponentRef::branch(2)),
            Status::Damaged
        );
    }

    #[test]
    fn outage_counts_never_increase() {
        let (model, registry) = damaged_model(&[1, 3, 5, 8]);
        let engine = RestorationEngine::new(
            model,
            registry,
            CrewPool::new(2, 1, 1),
            vec![
                task(ComponentRef::branch(1), 5.0),
                task(ComponentRef::branch(3), 2.0),
                task(ComponentRef::branch(5), 2.0),
                task(ComponentRef::branch(8), 9.0),
            ],
            CapacityBalanceSolver,
            EngineOptions::default(),
        );
        let result = engine.run();
        for pair in result.indicators.windows(2) {
            assert!(pair[1].outaged_branches <= pair[0].outaged_branches);
            assert!(pair[1].outaged_buses <= pair[0].outaged_buses);
            assert!(pair[1].outaged_generators <= pair[0].outaged_generators);
        }
        assert!(!result.truncated);
    }

    #[test]
    fn report_summarizes_final_state() {
        let (model, registry) = damaged_model(&[4]);
        let engine = RestorationEngine::new(
            model,
            registry,
            CrewPool::new(1, 1, 1),
            vec![task(ComponentRef::branch(4), 2.0)],
            CapacityBalanceSolver,
            EngineOptions::default(),
        );
        let result = engine.run();
        let report = result.report();
        assert_eq!(report.outaged_branches, 0);
        assert!(!report.truncated);
        assert!((report.served_fraction - 1.0).abs() < 1e-9);
        let text = format!("{report}");
        assert!(text.contains("Restoration Report"));
        assert!(text.contains("complete"));
    }
}
