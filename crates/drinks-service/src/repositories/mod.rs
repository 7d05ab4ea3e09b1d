//! Repository layer for the drinks service.
//!
//! Exposes persistence to the rest of the service as a capability trait so
//! handlers stay independent of the concrete store and tests can substitute
//! an in-memory double.

pub mod drinks;

pub use drinks::{DrinkRepository, PgDrinkRepository};
