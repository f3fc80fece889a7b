//! Evolutionary search for the open-route TSP.
//!
//! `operators` holds the stateless building blocks (selection, crossover,
//! mutation, replacement); `genetic` drives them as a state machine.

pub mod genetic;
pub mod operators;

pub use genetic::*;
pub use operators::*;
