//! `mission_core`: containment mission planning and flight simulation.
//!
//! Planning is pure: rules in, plan out, with randomness from the passed-in
//! Rng. Each mission then flies in its own Tokio task, owned by the
//! `MissionRegistry` and reachable only through its async API.

mod actor;
mod config;
mod context;
mod defense;
mod error;
mod id;
mod phase;
mod plan;
mod registry;
pub mod runtime;
mod tactics;
mod timeline;
mod types;
mod weakness;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use config::Constants;
pub use context::{build_context, classify_category, classify_risk};
pub use defense::select_defenses;
pub use error::MissionError;
pub use id::{mission_rng, IdSequence};
pub use phase::{Phase, FLIGHT_PLAN};
pub use plan::MissionPlan;
pub use registry::MissionRegistry;
pub use runtime::{damage_probability, engagement_chance, MissionRuntime, Step};
pub use tactics::{select_tactics, tactic_matches, weakness_bonus, MAX_WEAKNESS_BONUS};
pub use timeline::EventLog;
pub use types::*;
pub use weakness::{evaluate_weaknesses, weakness_matches};

#[cfg(test)]
mod tests;
