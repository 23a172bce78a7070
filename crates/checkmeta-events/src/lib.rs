//! Event bus for the checkMeta matchday engine.
//!
//! Every consequence of a convergence (assists, damage, healing, trait
//! activations, knockouts, progression) travels as a typed
//! [`checkmeta_types::Event`] through an [`EventBus`]. Subscribers are
//! registered explicitly per kind and receive a [`DispatchContext`] giving
//! them mutable access to the unit roster for the duration of one
//! delivery.
//!
//! The bus is a queue, not a call stack: publishing never re-enters a
//! handler, and the orchestrator drains the queue at well-defined points
//! in the turn.

pub mod bus;
pub mod error;
pub mod subscriber;

pub use bus::{DrainReport, EventBus, SubscriptionId};
pub use error::{SubscriberError, SubscriberFailure};
pub use subscriber::{DispatchContext, SharedSubscriber, Subscriber, shared};
