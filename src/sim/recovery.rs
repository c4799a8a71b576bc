//! Repair-duration assignment for damaged components.

use std::collections::HashMap;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::error::DataError;
use crate::sim::component::ComponentRef;

/// Source of one nonnegative repair duration per damaged component.
///
/// Either explicit caller-provided values, or uniform with-replacement
/// sampling from a historical outage-duration dataset.
pub enum RecoveryTimes {
    Explicit(HashMap<ComponentRef, f64>),
    Sampled { dataset: Vec<f64>, rng: StdRng },
}

impl RecoveryTimes {
    /// Explicit per-component durations.
    pub fn explicit(durations: HashMap<ComponentRef, f64>) -> Self {
        RecoveryTimes::Explicit(durations)
    }

    /// Seeded uniform sampling with replacement from a historical dataset.
    ///
    /// # Errors
    ///
    /// Returns a [`DataError`] when the dataset is empty or contains a
    /// negative or non-finite duration — there is no fallback.
    pub fn sampled(dataset: Vec<f64>, seed: u64) -> Result<Self, DataError> {
        if dataset.is_empty() {
            return Err(DataError::EmptyRecoveryDataset);
        }
        for (index, &value) in dataset.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(DataError::InvalidRecoveryDuration { index, value });
            }
        }
        Ok(RecoveryTimes::Sampled {
            dataset,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Repair duration in hours for one damaged component.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingRecoveryDuration`] when explicit durations
    /// were supplied but none covers the component.
    pub fn duration_for(&mut self, comp: ComponentRef) -> Result<f64, DataError> {
        match self {
            RecoveryTimes::Explicit(map) => map
                .get(&comp)
                .copied()
                .ok_or(DataError::MissingRecoveryDuration(comp)),
            RecoveryTimes::Sampled { dataset, rng } => {
                let idx = rng.random_range(0..dataset.len());
                Ok(dataset[idx])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_durations_are_returned_verbatim() {
        let mut map = HashMap::new();
        map.insert(ComponentRef::branch(1), 3.5);
        let mut src = RecoveryTimes::explicit(map);
        assert_eq!(src.duration_for(ComponentRef::branch(1)).ok(), Some(3.5));
    }

    #[test]
    fn missing_explicit_duration_is_an_error() {
        let mut src = RecoveryTimes::explicit(HashMap::new());
        let err = src.duration_for(ComponentRef::bus(4));
        assert!(matches!(err, Err(DataError::MissingRecoveryDuration(_))));
    }

    #[test]
    fn sampling_only_draws_dataset_values() {
        let dataset = vec![2.0, 4.0, 8.0];
        let mut src = RecoveryTimes::sampled(dataset.clone(), 11).expect("valid dataset");
        for _ in 0..50 {
            let d = src.duration_for(ComponentRef::branch(1)).expect("sample");
            assert!(dataset.contains(&d));
        }
    }

    #[test]
    fn sampling_is_deterministic_per_seed() {
        let dataset = vec![1.0, 2.0, 3.0, 5.0, 8.0];
        let mut a = RecoveryTimes::sampled(dataset.clone(), 42).expect("valid dataset");
        let mut b = RecoveryTimes::sampled(dataset, 42).expect("valid dataset");
        for _ in 0..20 {
            assert_eq!(
                a.duration_for(ComponentRef::generator(1)).ok(),
                b.duration_for(ComponentRef::generator(1)).ok()
            );
        }
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let err = RecoveryTimes::sampled(Vec::new(), 0);
        assert!(matches!(err, Err(DataError::EmptyRecoveryDataset)));
    }

    #[test]
    fn negative_duration_is_rejected() {
        let err = RecoveryTimes::sampled(vec![4.0, -1.0], 0);
        assert!(matches!(
            err,
            Err(DataError::InvalidRecoveryDuration { index: 1, .. })
        ));
    }
}
