//! Per-iteration restoration indicators.

use std::fmt;

use crate::network::NetworkModel;
use crate::sim::component::{ComponentType, ComponentRegistry};

/// Bookkeeping appended after every restoration iteration.
///
/// Pure accounting over the registry and network tables: given a fixed
/// restoration ordering the recorded series is fully reproducible.
#[derive(Debug, Clone)]
pub struct IndicatorRow {
    pub iteration: usize,
    pub time_hr: f64,
    pub outaged_branches: usize,
    pub outaged_buses: usize,
    pub outaged_generators: usize,
    /// Served active power per bus (MW), id order.
    pub bus_served_mw: Vec<f64>,
    /// Served reactive power per bus (MVAr), id order.
    pub bus_served_mvar: Vec<f64>,
    pub served_total_mw: f64,
    pub served_total_mvar: f64,
    /// Active output per generator (MW), id order.
    pub gen_output_mw: Vec<f64>,
    /// Reactive output per generator (MVAr), id order.
    pub gen_output_mvar: Vec<f64>,
    pub generation_total_mw: f64,
    /// Capacity-weighted fraction of generation that is in service.
    pub online_capacity_fraction: f64,
}

impl fmt::Display for IndicatorRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "iter {:>3} ({:>8.2}h) | out: br={:>2} bus={:>2} gen={:>2} | \
             served={:>7.1} MW {:>6.1} MVAr | gen={:>7.1} MW | online-cap={:>5.1}%",
            self.iteration,
            self.time_hr,
            self.outaged_branches,
            self.outaged_buses,
            self.outaged_generators,
            self.served_total_mw,
            self.served_total_mvar,
            self.generation_total_mw,
            self.online_capacity_fraction * 100.0,
        )
    }
}

/// Accumulates [`IndicatorRow`]s over the run.
#[derive(Debug, Clone, Default)]
pub struct IndicatorRecorder {
    rows: Vec<IndicatorRow>,
}

impl IndicatorRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots the current outage and power-service state.
    pub fn record(
        &mut self,
        iteration: usize,
        time_hr: f64,
        model: &NetworkModel,
        registry: &ComponentRegistry,
    ) {
        let bus_served_mw: Vec<f64> = model.buses().iter().map(|b| b.served_mw).collect();
        let bus_served_mvar: Vec<f64> = model.buses().iter().map(|b| b.served_mvar).collect();
        let gen_output_mw: Vec<f64> = model.gens().iter().map(|g| g.output_mw).collect();
        let gen_output_mvar: Vec<f64> = model.gens().iter().map(|g| g.output_mvar).collect();

        let total_capacity: f64 = model.gens().iter().map(|g| g.capacity_mw).sum();
        let online_capacity: f64 = model
            .gens()
            .iter()
            .filter(|g| g.in_service)
            .map(|g| g.capacity_mw)
            .sum();
        let online_capacity_fraction = if total_capacity > 0.0 {
            online_capacity / total_capacity
        } else {
            0.0
        };

        self.rows.push(IndicatorRow {
            iteration,
            time_hr,
            outaged_branches: registry.outaged_count(ComponentType::Branch),
            outaged_buses: registry.outaged_count(ComponentType::Bus),
            outaged_generators: registry.outaged_count(ComponentType::Generator),
            served_total_mw: bus_served_mw.iter().sum(),
            served_total_mvar: bus_served_mvar.iter().sum(),
            bus_served_mw,
            bus_served_mvar,
            generation_total_mw: gen_output_mw.iter().sum(),
            gen_output_mw,
            gen_output_mvar,
            online_capacity_fraction,
        });
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<IndicatorRow> {
        self.rows
    }
}
