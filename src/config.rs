//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::DataError;
use crate::sim::component::ComponentType;
use crate::sim::engine::EngineOptions;
use crate::sim::fragility::{FragilityCurve, FragilityStore};
use crate::sim::solver::SolverConfig;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from TOML
/// with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Loop timing, caps, and the master seed.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Per-type repair crew capacities.
    #[serde(default)]
    pub crews: CrewsConfig,
    /// Storm profile and fragility curves.
    #[serde(default)]
    pub contingency: ContingencyConfig,
    /// Historical repair-duration dataset.
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

/// Loop timing, caps, and the master seed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master random seed.
    pub seed: u64,
    /// Hard cap on restoration iterations (must be > 0).
    pub max_iterations: usize,
    /// Simulated hours before forced mass reconnection (must be > 0).
    pub reconnect_threshold_hr: f64,
    /// Steps in the island feasibility ramp (must be > 0).
    pub ramp_steps: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_iterations: 500,
            reconnect_threshold_hr: 600.0,
            ramp_steps: 10,
        }
    }
}

/// Per-type repair crew capacities. Crews never cross types.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrewsConfig {
    pub branch: usize,
    pub bus: usize,
    pub generator: usize,
}

impl Default for CrewsConfig {
    fn default() -> Self {
        Self {
            branch: 2,
            bus: 1,
            generator: 1,
        }
    }
}

/// One fragility curve as paired arrays.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CurveConfig {
    pub states: Vec<f64>,
    pub probabilities: Vec<f64>,
}

impl CurveConfig {
    /// Validates and converts to a runtime curve.
    ///
    /// # Errors
    ///
    /// Propagates the [`DataError`] from [`FragilityCurve::new`].
    pub fn to_curve(&self) -> Result<FragilityCurve, DataError> {
        FragilityCurve::new(self.states.clone(), self.probabilities.clone())
    }
}

/// Storm profile shape and per-type fragility curves.
///
/// The environmental state is a wind-speed-like intensity: the profile rises
/// from `base_state` to `peak_state` and decays back over `steps` time steps.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContingencyConfig {
    /// Environmental-series length (must be > 0).
    pub steps: usize,
    pub base_state: f64,
    pub peak_state: f64,
    pub branch_curve: CurveConfig,
    pub bus_curve: CurveConfig,
    pub generator_curve: CurveConfig,
}

impl Default for ContingencyConfig {
    fn default() -> Self {
        let states = vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0];
        Self {
            steps: 48,
            base_state: 5.0,
            peak_state: 40.0,
            branch_curve: CurveConfig {
                states: states.clone(),
                probabilities: vec![0.0, 0.001, 0.01, 0.05, 0.15, 0.30],
            },
            bus_curve: CurveConfig {
                states: states.clone(),
                probabilities: vec![0.0, 0.0005, 0.002, 0.01, 0.03, 0.08],
            },
            generator_curve: CurveConfig {
                states,
                probabilities: vec![0.0, 0.0005, 0.005, 0.02, 0.06, 0.12],
            },
        }
    }
}

impl ContingencyConfig {
    /// Synthetic storm intensity series: a single `sin²` pulse from
    /// `base_state` up to `peak_state` and back.
    pub fn storm_profile(&self) -> Vec<f64> {
        let n = self.steps;
        (0..n)
            .map(|i| {
                let x = if n > 1 {
                    i as f64 / (n - 1) as f64
                } else {
                    0.5
                };
                let pulse = (std::f64::consts::PI * x).sin().powi(2);
                self.base_state + (self.peak_state - self.base_state) * pulse
            })
            .collect()
    }

    /// Builds the per-type fragility store.
    ///
    /// # Errors
    ///
    /// Propagates the first curve [`DataError`].
    pub fn fragility_store(&self) -> Result<FragilityStore, DataError> {
        let mut store = FragilityStore::new();
        store.set_type_curve(ComponentType::Branch, self.branch_curve.to_curve()?);
        store.set_type_curve(ComponentType::Bus, self.bus_curve.to_curve()?);
        store.set_type_curve(ComponentType::Generator, self.generator_curve.to_curve()?);
        Ok(store)
    }
}

/// Historical repair-duration dataset sampled with replacement.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecoveryConfig {
    /// Outage durations in hours (must be nonempty, all >= 0).
    pub dataset_hr: Vec<f64>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            dataset_hr: vec![2.0, 3.0, 4.0, 6.0, 8.0, 12.0, 16.0, 24.0, 36.0, 48.0, 72.0],
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.ramp_steps"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: a moderate storm over the study grid.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            crews: CrewsConfig::default(),
            contingency: ContingencyConfig::default(),
            recovery: RecoveryConfig::default(),
        }
    }

    /// Returns the hurricane preset: longer, more intense storm and longer
    /// repairs, with an extra branch crew.
    pub fn hurricane() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            crews: CrewsConfig {
                branch: 3,
                ..CrewsConfig::default()
            },
            contingency: ContingencyConfig {
                steps: 72,
                peak_state: 55.0,
                ..ContingencyConfig::default()
            },
            recovery: RecoveryConfig {
                dataset_hr: vec![6.0, 12.0, 24.0, 36.0, 48.0, 72.0, 96.0, 120.0, 168.0],
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "hurricane"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "hurricane" => Ok(Self::hurricane()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Engine options implied by this scenario.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            reconnect_threshold_hr: self.simulation.reconnect_threshold_hr,
            max_iterations: self.simulation.max_iterations,
            ramp_steps: self.simulation.ramp_steps,
            solver_config: SolverConfig::default(),
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.max_iterations == 0 {
            errors.push(ConfigError {
                field: "simulation.max_iterations".into(),
                message: "must be > 0".into(),
            });
        }
        if s.ramp_steps == 0 {
            errors.push(ConfigError {
                field: "simulation.ramp_steps".into(),
                message: "must be > 0".into(),
            });
        }
        if !(s.reconnect_threshold_hr > 0.0 && s.reconnect_threshold_hr.is_finite()) {
            errors.push(ConfigError {
                field: "simulation.reconnect_threshold_hr".into(),
                message: "must be a positive finite number of hours".into(),
            });
        }

        let c = &self.contingency;
        if c.steps == 0 {
            errors.push(ConfigError {
                field: "contingency.steps".into(),
                message: "must be > 0".into(),
            });
        }
        if !c.peak_state.is_finite() || !c.base_state.is_finite() {
            errors.push(ConfigError {
                field: "contingency.peak_state".into(),
                message: "states must be finite".into(),
            });
        }
        for (field, curve) in [
            ("contingency.branch_curve", &c.branch_curve),
            ("contingency.bus_curve", &c.bus_curve),
            ("contingency.generator_curve", &c.generator_curve),
        ] {
            if let Err(e) = curve.to_curve() {
                errors.push(ConfigError {
                    field: field.into(),
                    message: e.to_string(),
                });
            }
        }

        let r = &self.recovery;
        if r.dataset_hr.is_empty() {
            errors.push(ConfigError {
                field: "recovery.dataset_hr".into(),
                message: "must be nonempty".into(),
            });
        }
        if r.dataset_hr.iter().any(|d| !d.is_finite() || *d < 0.0) {
            errors.push(ConfigError {
                field: "recovery.dataset_hr".into(),
                message: "durations must be nonnegative and finite".into(),
            });
        }

        errors
    }
}
