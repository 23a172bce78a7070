//! Shared type definitions for the checkMeta matchday engine.
//!
//! This crate is the single source of truth for the data model used across
//! the workspace. It holds no orchestration logic, only invariant-preserving
//! constructors and mutators.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier newtypes (units, teams, matchdays)
//! - [`enums`] -- Divisions, classifications, board outcomes, trait vocabulary
//! - [`structs`] -- Units, bounded resources, the roster, convergence records
//! - [`events`] -- Typed events routed over the event bus

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    BoardOutcome, Classification, Division, ResourceKind, TraitFormula, TraitTrigger, TraitType,
};
pub use events::{Event, EventKind, EventPayload};
pub use ids::{MatchdayId, TeamId, UnitId};
pub use structs::{BoundedResource, ConvergenceRecord, Resources, Unit, UnitRoster};
