//! Statistic Validator: canonicalizes a unit's derived statistics before
//! results leave the engine.
//!
//! Acceptance is partial by design. A code is kept iff it resolves in the
//! [`StatSchema`] and its domain is admitted by the unit's division;
//! everything else is dropped and reported as a [`Rejection`], never as an
//! error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use checkmeta_types::{Division, Unit};

use crate::schema::StatSchema;

/// Why a statistic code was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The code is not in the schema.
    NonCanonical,
    /// The code exists but belongs to another division.
    DivisionMismatch {
        /// Domain the code is declared under.
        domain: Division,
    },
}

/// A statistic code that did not survive validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Code as it appeared on the unit.
    pub code: String,
    /// Why it was dropped.
    #[serde(flatten)]
    pub reason: RejectionReason,
}

/// Filters statistics against a schema and per-division restrictions.
#[derive(Debug, Clone, Default)]
pub struct StatValidator {
    schema: StatSchema,
}

impl StatValidator {
    /// Create a validator over the given schema.
    pub const fn new(schema: StatSchema) -> Self {
        Self { schema }
    }

    /// The schema in use.
    pub const fn schema(&self) -> &StatSchema {
        &self.schema
    }

    fn check(&self, division: Division, raw: &str) -> Result<&str, RejectionReason> {
        let (code, domain) = self
            .schema
            .resolve(raw)
            .ok_or(RejectionReason::NonCanonical)?;
        if division.admits(domain) {
            Ok(code)
        } else {
            Err(RejectionReason::DivisionMismatch { domain })
        }
    }

    /// Codes currently on the unit that would be dropped, in code order.
    pub fn validate(&self, unit: &Unit) -> Vec<Rejection> {
        unit.stats
            .keys()
            .filter_map(|raw| {
                self.check(unit.division, raw)
                    .err()
                    .map(|reason| Rejection {
                        code: raw.clone(),
                        reason,
                    })
            })
            .collect()
    }

    /// Accepted statistics for `unit` out of `raw`.
    ///
    /// Output keys are canonical spellings; aliases of the same code are
    /// summed. Idempotent: sanitizing the output again yields the same map.
    pub fn sanitize(&self, unit: &Unit, raw: &BTreeMap<String, i64>) -> BTreeMap<String, i64> {
        let mut accepted: BTreeMap<String, i64> = BTreeMap::new();
        for (code, value) in raw {
            if let Ok(canonical) = self.check(unit.division, code) {
                let slot = accepted.entry(canonical.to_owned()).or_insert(0);
                *slot = slot.saturating_add(*value);
            }
        }
        accepted
    }

    /// Replace the unit's statistics with their sanitized form and return
    /// what was dropped.
    pub fn finalize(&self, unit: &mut Unit) -> Vec<Rejection> {
        let rejected = self.validate(unit);
        for rejection in &rejected {
            debug!(
                unit = %unit.id,
                code = %rejection.code,
                reason = ?rejection.reason,
                "statistic dropped"
            );
        }
        unit.stats = self.sanitize(unit, &unit.stats);
        rejected
    }
}
