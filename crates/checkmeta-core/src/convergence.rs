//! Convergence Detector.
//!
//! Groups one turn's `unit -> move` output by move notation. Every group of
//! two or more units becomes a [`ConvergenceRecord`], classified `ally`
//! when all participants share a team and `enemy` otherwise. Output is
//! sorted by notation, independent of input iteration order.
//!
//! [`ParticipationLedger`] enforces the per-matchday cap on how many
//! convergences a single unit may take part in.

use std::collections::BTreeMap;

use checkmeta_types::{ConvergenceRecord, TeamId, UnitId};

/// Detects convergences from a turn's moves.
///
/// Team membership comes from the roster passed to
/// [`with_teams`](Self::with_teams); units missing from it fall back to
/// their identifier prefix ([`UnitId::team_prefix`]).
#[derive(Debug, Clone, Default)]
pub struct ConvergenceDetector {
    teams: BTreeMap<UnitId, TeamId>,
}

impl ConvergenceDetector {
    /// A detector that classifies purely by identifier prefix.
    pub const fn new() -> Self {
        Self {
            teams: BTreeMap::new(),
        }
    }

    /// A detector with explicit team assignments.
    pub const fn with_teams(teams: BTreeMap<UnitId, TeamId>) -> Self {
        Self { teams }
    }

    /// Team used for classification.
    pub fn team_of(&self, unit: &UnitId) -> TeamId {
        self.teams
            .get(unit)
            .cloned()
            .unwrap_or_else(|| unit.team_prefix())
    }

    /// Convergence records for `turn`, sorted by notation.
    ///
    /// Units absent from `moves` (terminal boards) take no part. Each unit
    /// appears in at most one record, since it has exactly one move.
    pub fn detect(&self, turn: u32, moves: &BTreeMap<UnitId, String>) -> Vec<ConvergenceRecord> {
        let mut groups: BTreeMap<&str, Vec<&UnitId>> = BTreeMap::new();
        for (unit, notation) in moves {
            groups.entry(notation.as_str()).or_default().push(unit);
        }

        groups
            .into_iter()
            .filter_map(|(notation, units)| {
                ConvergenceRecord::new(
                    turn,
                    notation,
                    units.into_iter().map(|u| (u.clone(), self.team_of(u))),
                )
            })
            .collect()
    }
}

/// Per-unit convergence participation counts for one matchday.
#[derive(Debug, Clone, Default)]
pub struct ParticipationLedger {
    cap: u32,
    counts: BTreeMap<UnitId, u32>,
}

impl ParticipationLedger {
    /// A ledger admitting `cap` convergences per unit. 0 means no cap.
    pub const fn new(cap: u32) -> Self {
        Self {
            cap,
            counts: BTreeMap::new(),
        }
    }

    /// Whether `unit` may still take part in a convergence.
    pub fn admits(&self, unit: &UnitId) -> bool {
        self.cap == 0 || self.count(unit) < self.cap
    }

    /// Convergences `unit` has taken part in.
    pub fn count(&self, unit: &UnitId) -> u32 {
        self.counts.get(unit).copied().unwrap_or(0)
    }

    /// Drop moves of units that have exhausted their cap.
    pub fn filter(&self, moves: BTreeMap<UnitId, String>) -> BTreeMap<UnitId, String> {
        moves.into_iter().filter(|(u, _)| self.admits(u)).collect()
    }

    /// Count participation in `records`.
    pub fn record(&mut self, records: &[ConvergenceRecord]) {
        for unit in records.iter().flat_map(ConvergenceRecord::participants) {
            let count = self.counts.entry(unit.clone()).or_insert(0);
            *count = count.saturating_add(1);
        }
    }
}
