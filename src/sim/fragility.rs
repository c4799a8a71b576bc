//! Fragility curves: environmental state → failure probability.

use std::collections::HashMap;

use crate::error::DataError;
use crate::sim::component::{ComponentRef, ComponentType};

/// Ordered `(environmental state, failure probability)` pairs.
///
/// Immutable once constructed. The core only ever needs the probability at
/// the point nearest a queried state.
#[derive(Debug, Clone)]
pub struct FragilityCurve {
    states: Vec<f64>,
    probabilities: Vec<f64>,
}

impl FragilityCurve {
    /// Validates and builds a curve.
    ///
    /// # Errors
    ///
    /// Returns a [`DataError`] if the curve is empty, the vectors have
    /// different lengths, a state is non-finite, or a probability falls
    /// outside `[0, 1]`.
    pub fn new(states: Vec<f64>, probabilities: Vec<f64>) -> Result<Self, DataError> {
        if states.is_empty() || probabilities.is_empty() {
            return Err(DataError::EmptyFragilityCurve);
        }
        if states.len() != probabilities.len() {
            return Err(DataError::CurveLengthMismatch {
                states: states.len(),
                probabilities: probabilities.len(),
            });
        }
        for (index, &value) in states.iter().enumerate() {
            if !value.is_finite() {
                return Err(DataError::InvalidCurveState { index, value });
            }
        }
        for (index, &value) in probabilities.iter().enumerate() {
            if !(0.0..=1.0).contains(&value) {
                return Err(DataError::InvalidProbability { index, value });
            }
        }
        Ok(Self {
            states,
            probabilities,
        })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Index of the curve point nearest the given state (minimum absolute
    /// difference; the earlier point wins a tie).
    pub fn nearest_index(&self, state: f64) -> usize {
        let mut best = 0;
        let mut best_dist = (self.states[0] - state).abs();
        for (i, &s) in self.states.iter().enumerate().skip(1) {
            let dist = (s - state).abs();
            if dist < best_dist {
                best = i;
                best_dist = dist;
            }
        }
        best
    }

    /// Failure probability at the curve point nearest the given state.
    pub fn probability_for(&self, state: f64) -> f64 {
        self.probabilities[self.nearest_index(state)]
    }
}

/// Per-type curves with optional per-component overrides.
#[derive(Debug, Clone, Default)]
pub struct FragilityStore {
    per_type: [Option<FragilityCurve>; 3],
    overrides: HashMap<ComponentRef, FragilityCurve>,
}

impl FragilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the curve shared by all components of one type.
    pub fn set_type_curve(&mut self, ctype: ComponentType, curve: FragilityCurve) {
        self.per_type[ctype.index()] = Some(curve);
    }

    /// Registers a component-specific override.
    pub fn set_override(&mut self, comp: ComponentRef, curve: FragilityCurve) {
        self.overrides.insert(comp, curve);
    }

    /// Curve applying to a component: its override if any, else its type
    /// curve.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingCurve`] when neither is registered — an
    /// in-scope component without a curve is a data defect, not a default.
    pub fn curve_for(&self, comp: ComponentRef) -> Result<&FragilityCurve, DataError> {
        self.overrides
            .get(&comp)
            .or(self.per_type[comp.ctype.index()].as_ref())
            .ok_or(DataError::MissingCurve(comp))
    }
}
