//! Unit-side systems for the checkMeta matchday engine.
//!
//! This crate holds everything that reasons about a unit without driving
//! the matchday: the trait/effect catalog consulted by the resolver, the
//! canonical statistic schema and its validator, roster role checks, and
//! the standard event subscribers that mutate unit state.
//!
//! # Modules
//!
//! - [`catalog`] -- Trait identifier to effect mapping ([`TraitCatalog`])
//! - [`config`] -- Resource, progression, morale, round, and roster tunables
//! - [`error`] -- Catalog/schema loading errors ([`CatalogError`])
//! - [`roles`] -- Role codes and role/division checks ([`Role`], [`RoleIssue`])
//! - [`schema`] -- Canonical rStat codes and domains ([`StatSchema`])
//! - [`subscribers`] -- Vitals, morale, experience, statistics, round upkeep, journal
//! - [`validator`] -- Statistic Validator ([`StatValidator`])

pub mod catalog;
pub mod config;
pub mod error;
pub mod roles;
pub mod schema;
pub mod subscribers;
pub mod validator;

pub use catalog::{TraitCatalog, TraitEffect};
pub use config::{
    MoraleConfig, ProgressionConfig, ResourceBounds, ResourceConfig, RosterConfig, RoundConfig,
};
pub use error::CatalogError;
pub use roles::{Role, RoleIssue, check_unit};
pub use schema::StatSchema;
pub use subscribers::{
    ExperienceTracker, JournalSubscriber, MoraleTracker, RoundTracker, StatTracker, VitalsTracker,
};
pub use validator::{Rejection, RejectionReason, StatValidator};
