//! File output.

/// CSV export of indicator time series.
pub mod export;
