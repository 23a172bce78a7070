//! Type-safe identifier wrappers.
//!
//! Units and teams are identified by roster-assigned strings (`A1`, `B12`),
//! so their identifiers wrap [`String`]. Matchdays get a generated UUID v7
//! (time-ordered) so result files sort naturally by start time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

/// Generates a newtype wrapper around a roster-assigned [`String`] name.
macro_rules! define_name {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a roster-assigned name.
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Borrow the underlying name.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(name.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for one orchestrated matchday run.
    MatchdayId
}

define_name! {
    /// Identifier of a unit, unique within a matchday (e.g. `A1`).
    UnitId
}

define_name! {
    /// Identifier of a team (e.g. `A`).
    TeamId
}

impl UnitId {
    /// Team prefix encoded in the identifier.
    ///
    /// The prefix is the leading run of characters before the first ASCII
    /// digit, `-`, or `_`. `A1` yields `A`, `red-3` yields `red`. An
    /// identifier with no such prefix (`7`, `-x`) is its own team.
    pub fn team_prefix(&self) -> TeamId {
        let end = self
            .0
            .find(|c: char| c.is_ascii_digit() || c == '-' || c == '_')
            .unwrap_or(self.0.len());
        match self.0.get(..end) {
            Some(prefix) if !prefix.is_empty() => TeamId::new(prefix),
            _ => TeamId::new(self.0.as_str()),
        }
    }
}
