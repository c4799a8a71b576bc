//! Tabular network model: per-component records addressable by positional id.

use crate::sim::component::{ComponentRef, ComponentType};
use crate::sim::solver::IslandState;

/// Role of a bus in the power-flow formulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusKind {
    /// Plain load (PQ) bus.
    Load,
    /// Generator (PV) bus.
    Generator,
    /// Reference (slack) bus anchoring the voltage angle.
    Reference,
}

/// One row of the bus table.
#[derive(Debug, Clone, PartialEq)]
pub struct BusRecord {
    pub id: usize,
    pub kind: BusKind,
    /// Demand currently assigned to the bus (MW). Ramped back toward the
    /// pre-disturbance value during island resolution.
    pub demand_mw: f64,
    pub demand_mvar: f64,
    /// Demand actually served per the last feasibility solve (MW).
    pub served_mw: f64,
    pub served_mvar: f64,
}

/// One row of the branch table.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchRecord {
    pub id: usize,
    pub from_bus: usize,
    pub to_bus: usize,
    pub in_service: bool,
}

/// One row of the generator table.
#[derive(Debug, Clone, PartialEq)]
pub struct GenRecord {
    pub id: usize,
    pub bus: usize,
    pub in_service: bool,
    pub output_mw: f64,
    pub output_mvar: f64,
    pub capacity_mw: f64,
}

/// The authoritative network tables.
///
/// Records are positional: the record with id `k` lives at index `k - 1`.
/// Pre-disturbance bus demand is captured at construction and kept immutable;
/// it is the target the island resolver ramps back toward.
#[derive(Debug, Clone)]
pub struct NetworkModel {
    buses: Vec<BusRecord>,
    branches: Vec<BranchRecord>,
    gens: Vec<GenRecord>,
    baseline_demand: Vec<(f64, f64)>,
}

impl NetworkModel {
    /// Builds a model from raw tables.
    ///
    /// # Panics
    ///
    /// Panics if record ids are not positional (`id == index + 1`), a branch
    /// endpoint or generator bus is out of range, or a capacity is negative.
    pub fn new(buses: Vec<BusRecord>, branches: Vec<BranchRecord>, gens: Vec<GenRecord>) -> Self {
        for (i, b) in buses.iter().enumerate() {
            assert_eq!(b.id, i + 1, "bus ids must be positional");
        }
        let n = buses.len();
        for (i, br) in branches.iter().enumerate() {
            assert_eq!(br.id, i + 1, "branch ids must be positional");
            assert!(
                (1..=n).contains(&br.from_bus) && (1..=n).contains(&br.to_bus),
                "branch {} endpoints out of range",
                br.id
            );
        }
        for (i, g) in gens.iter().enumerate() {
            assert_eq!(g.id, i + 1, "generator ids must be positional");
            assert!((1..=n).contains(&g.bus), "generator {} bus out of range", g.id);
            assert!(g.capacity_mw >= 0.0);
        }
        let baseline_demand = buses.iter().map(|b| (b.demand_mw, b.demand_mvar)).collect();
        Self {
            buses,
            branches,
            gens,
            baseline_demand,
        }
    }

    pub fn bus_count(&self) -> usize {
        self.buses.len()
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    pub fn gen_count(&self) -> usize {
        self.gens.len()
    }

    pub fn bus(&self, id: usize) -> &BusRecord {
        &self.buses[id - 1]
    }

    pub fn bus_mut(&mut self, id: usize) -> &mut BusRecord {
        &mut self.buses[id - 1]
    }

    pub fn branch(&self, id: usize) -> &BranchRecord {
        &self.branches[id - 1]
    }

    pub fn branch_mut(&mut self, id: usize) -> &mut BranchRecord {
        &mut self.branches[id - 1]
    }

    pub fn generator(&self, id: usize) -> &GenRecord {
        &self.gens[id - 1]
    }

    pub fn generator_mut(&mut self, id: usize) -> &mut GenRecord {
        &mut self.gens[id - 1]
    }

    pub fn buses(&self) -> &[BusRecord] {
        &self.buses
    }

    pub fn branches(&self) -> &[BranchRecord] {
        &self.branches
    }

    pub fn gens(&self) -> &[GenRecord] {
        &self.gens
    }

    /// Pre-disturbance `(MW, MVAr)` demand of a bus.
    pub fn baseline_demand(&self, bus_id: usize) -> (f64, f64) {
        self.baseline_demand[bus_id - 1]
    }

    /// Total pre-disturbance active demand (MW).
    pub fn total_baseline_mw(&self) -> f64 {
        self.baseline_demand.iter().map(|(p, _)| p).sum()
    }

    /// Total served active power (MW) per the bus table.
    pub fn total_served_mw(&self) -> f64 {
        self.buses.iter().map(|b| b.served_mw).sum()
    }

    /// Marks a branch or generator in service; buses carry no service column.
    pub fn energize(&mut self, comp: ComponentRef) {
        match comp.ctype {
            ComponentType::Branch => self.branch_mut(comp.id).in_service = true,
            ComponentType::Generator => self.generator_mut(comp.id).in_service = true,
            ComponentType::Bus => {}
        }
    }

    /// Marks a branch or generator out of service; buses carry no service
    /// column.
    pub fn de_energize(&mut self, comp: ComponentRef) {
        match comp.ctype {
            ComponentType::Branch => self.branch_mut(comp.id).in_service = false,
            ComponentType::Generator => {
                let g = self.generator_mut(comp.id);
                g.in_service = false;
                g.output_mw = 0.0;
                g.output_mvar = 0.0;
            }
            ComponentType::Bus => {}
        }
    }

    /// Bulk write-back of a solved island into the authoritative tables.
    ///
    /// Copies record fields by id. The island state carries exactly this
    /// model's column layout, so solver-derived extras never reach the tables.
    pub fn write_back(&mut self, state: &IslandState) {
        for b in &state.buses {
            self.buses[b.id - 1] = b.clone();
        }
        for br in &state.branches {
            self.branches[br.id - 1] = br.clone();
        }
        for g in &state.gens {
            self.gens[g.id - 1] = g.clone();
        }
    }

    /// Small synthetic transmission grid for demos and tests: 9 buses,
    /// 10 branches, 3 generators (500 MW capacity vs. 380 MW demand).
    ///
    /// Bus 1 is the reference; generation sits at buses 1–3 and load at
    /// buses 5–9, connected in a ring with one inner tie (5–9).
    pub fn study_case() -> Self {
        let mk_bus = |id, kind, p: f64, q: f64| BusRecord {
            id,
            kind,
            demand_mw: p,
            demand_mvar: q,
            served_mw: p,
            served_mvar: q,
        };
        let buses = vec![
            mk_bus(1, BusKind::Reference, 0.0, 0.0),
            mk_bus(2, BusKind::Generator, 0.0, 0.0),
            mk_bus(3, BusKind::Generator, 0.0, 0.0),
            mk_bus(4, BusKind::Load, 0.0, 0.0),
            mk_bus(5, BusKind::Load, 90.0, 30.0),
            mk_bus(6, BusKind::Load, 60.0, 20.0),
            mk_bus(7, BusKind::Load, 100.0, 35.0),
            mk_bus(8, BusKind::Load, 50.0, 15.0),
            mk_bus(9, BusKind::Load, 80.0, 25.0),
        ];
        let mk_branch = |id, from_bus, to_bus| BranchRecord {
            id,
            from_bus,
            to_bus,
            in_service: true,
        };
        let branches = vec![
            mk_branch(1, 1, 4),
            mk_branch(2, 4, 5),
            mk_branch(3, 5, 6),
            mk_branch(4, 3, 6),
            mk_branch(5, 6, 7),
            mk_branch(6, 7, 8),
            mk_branch(7, 8, 2),
            mk_branch(8, 8, 9),
            mk_branch(9, 9, 4),
            mk_branch(10, 5, 9),
        ];
        let mk_gen = |id, bus, capacity_mw| GenRecord {
            id,
            bus,
            in_service: true,
            output_mw: 0.0,
            output_mvar: 0.0,
            capacity_mw,
        };
        let gens = vec![mk_gen(1, 1, 250.0), mk_gen(2, 2, 150.0), mk_gen(3, 3, 100.0)];
        Self::new(buses, branches, gens)
    }
}
