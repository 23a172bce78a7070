//! Turn loop, convergence, and orchestration for the checkMeta matchday engine.
//!
//! Each unit plays its own game on a [`Board`](board::Board), one move per
//! turn. When two or more units pick the same move notation on the same
//! turn, the units *converge*: the [`ConvergenceResolver`] rolls contested
//! dice, fires traits, and publishes assists, damage, and healing onto the
//! event bus. The [`Matchday`] drives the whole loop.
//!
//! # Modules
//!
//! - [`board`] -- Board Simulation Unit: one game stepped one move at a time.
//! - [`config`] -- Configuration loading from `checkmeta-config.yaml` into
//!   strongly-typed structs.
//! - [`control`] -- Pause, resume, stop, and pacing shared with the runner.
//! - [`convergence`] -- Convergence Detector and per-unit participation cap.
//! - [`dice`] -- Seedable d20 service; the only source of randomness.
//! - [`matchday`] -- The orchestrator state machine and its result object.
//! - [`oracle`] -- [`MoveOracle`] and [`MoveSelector`] seams plus a
//!   scripted oracle.
//! - [`resolver`] -- Convergence Resolver.
//! - [`runner`] -- Async runner observing [`MatchdayControl`] at turn
//!   boundaries.
//!
//! [`ConvergenceResolver`]: resolver::ConvergenceResolver
//! [`Matchday`]: matchday::Matchday
//! [`MoveOracle`]: oracle::MoveOracle
//! [`MoveSelector`]: oracle::MoveSelector
//! [`MatchdayControl`]: control::MatchdayControl

pub mod board;
pub mod config;
pub mod control;
pub mod convergence;
pub mod dice;
pub mod matchday;
pub mod oracle;
pub mod resolver;
pub mod runner;
