//! Restoration simulation: contingency draw, crews, event loop, islands.

/// Event clock with the one-shot mass-reconnect threshold.
pub mod clock;
pub mod component;
/// Stochastic failure generation and disturbance application.
pub mod contingency;
pub mod crew;
pub mod engine;
pub mod fragility;
pub mod indicators;
pub mod island;
/// Opportunistic neighborhood reconnection.
pub mod reconnect;
pub mod recovery;
pub mod solver;
