//! Stochastic contingency generation and disturbance application.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::error::DataError;
use crate::network::{NetworkGraph, NetworkModel};
use crate::sim::component::{ComponentRef, ComponentType, ComponentRegistry, Status};
use crate::sim::fragility::FragilityStore;

/// Environmental-state time series: one row per component type, or a single
/// row broadcast to all types.
#[derive(Debug, Clone)]
pub struct EnvironmentSeries {
    rows: Vec<Vec<f64>>,
}

impl EnvironmentSeries {
    /// One shared row applied to every component type.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptyEnvironmentSeries`] on an empty row.
    pub fn broadcast(row: Vec<f64>) -> Result<Self, DataError> {
        if row.is_empty() {
            return Err(DataError::EmptyEnvironmentSeries);
        }
        Ok(Self { rows: vec![row] })
    }

    /// Separate rows per type, in `Branch, Bus, Generator` order.
    ///
    /// # Errors
    ///
    /// Returns a [`DataError`] when any row is empty or lengths differ.
    pub fn per_type(branch: Vec<f64>, bus: Vec<f64>, generator: Vec<f64>) -> Result<Self, DataError> {
        if branch.is_empty() {
            return Err(DataError::EmptyEnvironmentSeries);
        }
        if branch.len() != bus.len() || branch.len() != generator.len() {
            return Err(DataError::RaggedEnvironmentSeries);
        }
        Ok(Self {
            rows: vec![branch, bus, generator],
        })
    }

    /// Number of time steps in the series.
    pub fn steps(&self) -> usize {
        self.rows[0].len()
    }

    /// Environmental state for a type at a 0-based step index.
    pub fn state(&self, ctype: ComponentType, step: usize) -> f64 {
        let row = if self.rows.len() == 1 { 0 } else { ctype.index() };
        self.rows[row][step]
    }
}

/// Per-type failure-time assignment: component index → 1-based failure
/// time-index, with 0 meaning "never failed".
///
/// Once a component is marked it stays marked; the same draw never fails a
/// component twice.
#[derive(Debug, Clone)]
pub struct ContingencySet {
    failed_at: [Vec<u32>; 3],
}

impl ContingencySet {
    fn new(counts: [usize; 3]) -> Self {
        Self {
            failed_at: [
                vec![0; counts[0]],
                vec![0; counts[1]],
                vec![0; counts[2]],
            ],
        }
    }

    /// 1-based failure time-index, or 0 if the component never failed.
    pub fn failure_step(&self, comp: ComponentRef) -> u32 {
        self.failed_at[comp.ctype.index()][comp.id - 1]
    }

    pub fn is_failed(&self, comp: ComponentRef) -> bool {
        self.failure_step(comp) != 0
    }

    fn mark(&mut self, comp: ComponentRef, step: u32) {
        let slot = &mut self.failed_at[comp.ctype.index()][comp.id - 1];
        if *slot == 0 {
            *slot = step;
        }
    }

    /// Failed components of one type, in id order.
    pub fn failed_components(&self, ctype: ComponentType) -> Vec<ComponentRef> {
        self.failed_at[ctype.index()]
            .iter()
            .enumerate()
            .filter(|(_, step)| **step != 0)
            .map(|(i, _)| ComponentRef { ctype, id: i + 1 })
            .collect()
    }

    pub fn total_failed(&self) -> usize {
        self.failed_at
            .iter()
            .map(|col| col.iter().filter(|&&s| s != 0).count())
            .sum()
    }
}

/// Turns fragility curves plus an environmental-state series into a failure
/// assignment.
///
/// For every time step, in order, for every type in admission order: the
/// curve index nearest the current state gives the step's failure
/// probability; each still-unfailed component in the active set draws
/// `r ~ Uniform(0,1)` and fails when `r < p`. Fully deterministic for a
/// fixed seed.
pub struct ContingencyGenerator {
    store: FragilityStore,
    series: EnvironmentSeries,
    active_set: Option<Vec<ComponentRef>>,
    rng: StdRng,
}

impl ContingencyGenerator {
    pub fn new(store: FragilityStore, series: EnvironmentSeries, seed: u64) -> Self {
        Self {
            store,
            series,
            active_set: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Restricts the draw to the given components (default: every component
    /// in the network).
    pub fn with_active_set(mut self, comps: Vec<ComponentRef>) -> Self {
        self.active_set = Some(comps);
        self
    }

    /// Runs the draw over the full series.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingCurve`] when an in-scope component has no
    /// registered curve.
    pub fn generate(&mut self, model: &NetworkModel) -> Result<ContingencySet, DataError> {
        let counts = [model.branch_count(), model.bus_count(), model.gen_count()];
        let mut set = ContingencySet::new(counts);

        let candidates: [Vec<usize>; 3] = match &self.active_set {
            Some(comps) => {
                let mut per_type: [Vec<usize>; 3] = [Vec::new(), Vec::new(), Vec::new()];
                for c in comps {
                    per_type[c.ctype.index()].push(c.id);
                }
                per_type
            }
            None => [
                (1..=counts[0]).collect(),
                (1..=counts[1]).collect(),
                (1..=counts[2]).collect(),
            ],
        };

        for step in 1..=self.series.steps() {
            for ctype in ComponentType::ALL {
                let state = self.series.state(ctype, step - 1);
                for &id in &candidates[ctype.index()] {
                    let comp = ComponentRef { ctype, id };
                    if set.is_failed(comp) {
                        continue;
                    }
                    let p = self.store.curve_for(comp)?.probability_for(state);
                    let r: f64 = self.rng.random();
                    if r < p {
                        set.mark(comp, step as u32);
                    }
                }
            }
        }

        Ok(set)
    }
}

/// Damaged and disconnected components produced by a disturbance.
#[derive(Debug, Clone)]
pub struct DisturbanceSummary {
    pub damaged: Vec<ComponentRef>,
    pub disconnected: Vec<ComponentRef>,
}

/// Applies a failure assignment to the network.
///
/// Failed components become `Damaged` and drop out of service. Undamaged
/// equipment stranded in islands without any healthy generation is marked
/// `Disconnected` (the protective-trip stand-in for the external cascading
/// solver) and its bus demand is shed pending re-energization.
pub fn apply_contingency(
    model: &mut NetworkModel,
    registry: &mut ComponentRegistry,
    set: &ContingencySet,
) -> DisturbanceSummary {
    let mut damaged = Vec::new();
    for ctype in ComponentType::ALL {
        for comp in set.failed_components(ctype) {
            registry.set_status(comp, Status::Damaged);
            model.de_energize(comp);
            if comp.ctype == ComponentType::Bus {
                shed_bus(model, comp.id);
            }
            damaged.push(comp);
        }
    }

    // Trip everything stranded without generation.
    let graph = NetworkGraph::from_model(model);
    let islands = graph.islands(|branch_id| {
        registry.status(ComponentRef::branch(branch_id)) == Status::Healthy
    });
    let mut disconnected = Vec::new();
    for island in &islands {
        let has_generation = island
            .gen_ids
            .iter()
            .any(|&g| registry.status(ComponentRef::generator(g)) == Status::Healthy);
        if has_generation {
            continue;
        }
        let members = island
            .bus_ids
            .iter()
            .map(|&id| ComponentRef::bus(id))
            .chain(island.branch_ids.iter().map(|&id| ComponentRef::branch(id)))
            .chain(island.gen_ids.iter().map(|&id| ComponentRef::generator(id)));
        for comp in members {
            if registry.status(comp) != Status::Healthy {
                continue;
            }
            registry.set_status(comp, Status::Disconnected);
            model.de_energize(comp);
            if comp.ctype == ComponentType::Bus {
                shed_bus(model, comp.id);
            }
            disconnected.push(comp);
        }
    }

    DisturbanceSummary {
        damaged,
        disconnected,
    }
}

fn shed_bus(model: &mut NetworkModel, bus_id: usize) {
    let bus = model.bus_mut(bus_id);
    bus.demand_mw = 0.0;
    bus.demand_mvar = 0.0;
    bus.served_mw = 0.0;
    bus.served_mvar = 0.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::fragility::FragilityCurve;

    fn store_with(prob: f64) -> FragilityStore {
        let mut store = FragilityStore::new();
        for ctype in ComponentType::ALL {
            store.set_type_curve(
                ctype,
                FragilityCurve::new(vec![0.0, 50.0], vec![0.0, prob]).expect("valid curve"),
            );
        }
        store
    }

    #[test]
    fn certain_failure_marks_everything_at_step_one() {
        let model = NetworkModel::study_case();
        let series = EnvironmentSeries::broadcast(vec![50.0; 4]).expect("series");
        let mut generator = ContingencyGenerator::new(store_with(1.0), series, 1);
        let set = generator.generate(&model).expect("generate");
        assert_eq!(
            set.total_failed(),
            model.branch_count() + model.bus_count() + model.gen_count()
        );
        assert_eq!(set.failure_step(ComponentRef::branch(1)), 1);
        assert_eq!(set.failure_step(ComponentRef::generator(3)), 1);
    }

    #[test]
    fn failed_components_are_never_refailed() {
        let model = NetworkModel::study_case();
        let series = EnvironmentSeries::broadcast(vec![50.0; 10]).expect("series");
        let mut generator = ContingencyGenerator::new(store_with(1.0), series, 7);
        let set = generator.generate(&model).expect("generate");
        // All marks are from the first step despite ten certain-failure steps.
        for comp in set.failed_components(ComponentType::Branch) {
            assert_eq!(set.failure_step(comp), 1);
        }
    }

    #[test]
    fn same_seed_same_outcome() {
        let model = NetworkModel::study_case();
        let series = EnvironmentSeries::broadcast(vec![35.0; 24]).expect("series");
        let store = {
            let mut s = FragilityStore::new();
            for ctype in ComponentType::ALL {
                s.set_type_curve(
                    ctype,
                    FragilityCurve::new(vec![0.0, 20.0, 40.0], vec![0.0, 0.05, 0.2])
                        .expect("valid curve"),
                );
            }
            s
        };
        let mut g1 = ContingencyGenerator::new(store.clone(), series.clone(), 123);
        let mut g2 = ContingencyGenerator::new(store, series, 123);
        let s1 = g1.generate(&model).expect("generate");
        let s2 = g2.generate(&model).expect("generate");
        for ctype in ComponentType::ALL {
            assert_eq!(s1.failed_components(ctype), s2.failed_components(ctype));
        }
    }

    #[test]
    fn active_set_restricts_the_draw() {
        let model = NetworkModel::study_case();
        let series = EnvironmentSeries::broadcast(vec![50.0; 2]).expect("series");
        let mut generator = ContingencyGenerator::new(store_with(1.0), series, 5)
            .with_active_set(vec![ComponentRef::branch(4), ComponentRef::branch(6)]);
        let set = generator.generate(&model).expect("generate");
        assert_eq!(set.total_failed(), 2);
        assert!(set.is_failed(ComponentRef::branch(4)));
        assert!(!set.is_failed(ComponentRef::bus(1)));
    }

    #[test]
    fn missing_curve_surfaces_as_data_error() {
        let model = NetworkModel::study_case();
        let series = EnvironmentSeries::broadcast(vec![10.0]).expect("series");
        let mut generator = ContingencyGenerator::new(FragilityStore::new(), series, 0);
        let err = generator.generate(&model);
        assert!(matches!(err, Err(DataError::MissingCurve(_))));
    }

    #[test]
    fn per_type_series_rows_must_align() {
        let err = EnvironmentSeries::per_type(vec![1.0, 2.0], vec![1.0], vec![1.0, 2.0]);
        assert!(matches!(err, Err(DataError::RaggedEnvironmentSeries)));
    }

    #[test]
    fn disturbance_trips_generation_starved_islands() {
        let mut model = NetworkModel::study_case();
        let mut registry =
            ComponentRegistry::new(model.branch_count(), model.bus_count(), model.gen_count());
        // Fail branches 2, 3, and 10 by hand: bus 5 ends up isolated.
        let mut set = ContingencySet::new([model.branch_count(), model.bus_count(), model.gen_count()]);
        set.mark(ComponentRef::branch(2), 1);
        set.mark(ComponentRef::branch(3), 1);
        set.mark(ComponentRef::branch(10), 2);

        let summary = apply_contingency(&mut model, &mut registry, &set);
        assert_eq!(summary.damaged.len(), 3);
        assert!(summary.disconnected.contains(&ComponentRef::bus(5)));
        assert_eq!(registry.status(ComponentRef::bus(5)), Status::Disconnected);
        assert_eq!(model.bus(5).demand_mw, 0.0);
        // The generation-side island keeps its demand.
        assert_eq!(model.bus(7).demand_mw, 100.0);
    }
}
