//! Core entity structs: units, bounded resources, the roster, and
//! convergence records.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::enums::{Classification, Division, ResourceKind};
use crate::ids::{TeamId, UnitId};

// ---------------------------------------------------------------------------
// BoundedResource
// ---------------------------------------------------------------------------

/// An integer resource that can never leave its declared range.
///
/// Every constructor and mutator clamps, including deserialization, so a
/// value read from a roster file is already inside `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BoundedResourceRepr")]
pub struct BoundedResource {
    value: i32,
    min: i32,
    max: i32,
}

#[derive(Deserialize)]
struct BoundedResourceRepr {
    value: i32,
    min: i32,
    max: i32,
}

impl From<BoundedResourceRepr> for BoundedResource {
    fn from(repr: BoundedResourceRepr) -> Self {
        Self::new(repr.value, repr.min, repr.max)
    }
}

impl BoundedResource {
    /// Create a resource clamped to `[min, max]`.
    ///
    /// If `max < min` the range collapses to `[min, min]`.
    pub fn new(value: i32, min: i32, max: i32) -> Self {
        let max = max.max(min);
        Self {
            value: value.clamp(min, max),
            min,
            max,
        }
    }

    /// Current value.
    pub const fn value(&self) -> i32 {
        self.value
    }

    /// Lower bound (inclusive).
    pub const fn min(&self) -> i32 {
        self.min
    }

    /// Upper bound (inclusive).
    pub const fn max(&self) -> i32 {
        self.max
    }

    /// Whether the resource sits at its lower bound.
    pub const fn is_depleted(&self) -> bool {
        self.value <= self.min
    }

    /// Replace the value, clamping into range.
    pub fn set(&mut self, value: i32) {
        self.value = value.clamp(self.min, self.max);
    }

    /// Add `delta` (which may be negative), clamping into range.
    ///
    /// Returns the change that was actually applied.
    pub fn apply_delta(&mut self, delta: i32) -> i32 {
        let before = self.value;
        self.value = before.saturating_add(delta).clamp(self.min, self.max);
        self.value.saturating_sub(before)
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// The three bounded resources carried by every unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// Hit points; damage lands here first.
    pub hit_points: BoundedResource,
    /// Stamina; absorbs damage overflow once hit points are gone.
    pub stamina: BoundedResource,
    /// Morale; scales contested rolls.
    pub morale: BoundedResource,
}

impl Resources {
    /// Borrow a resource by kind.
    pub const fn get(&self, kind: ResourceKind) -> &BoundedResource {
        match kind {
            ResourceKind::HitPoints => &self.hit_points,
            ResourceKind::Stamina => &self.stamina,
            ResourceKind::Morale => &self.morale,
        }
    }

    /// Mutably borrow a resource by kind.
    pub const fn get_mut(&mut self, kind: ResourceKind) -> &mut BoundedResource {
        match kind {
            ResourceKind::HitPoints => &mut self.hit_points,
            ResourceKind::Stamina => &mut self.stamina,
            ResourceKind::Morale => &mut self.morale,
        }
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            hit_points: BoundedResource::new(100, 0, 100),
            stamina: BoundedResource::new(100, 0, 100),
            morale: BoundedResource::new(50, 0, 100),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

/// One simulated character taking part in a matchday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier, unique within the matchday.
    pub id: UnitId,
    /// Owning team.
    pub team: TeamId,
    /// Role code (`FL`, `GO`, ...).
    pub role: String,
    /// Division gating which rStat codes may attach to this unit.
    pub division: Division,
    /// Bounded resources.
    #[serde(default)]
    pub resources: Resources,
    /// Ordered trait identifiers, looked up in the trait catalog.
    #[serde(default)]
    pub traits: Vec<String>,
    /// Accumulated derived statistics (rStat code -> value).
    #[serde(default)]
    pub stats: BTreeMap<String, i64>,
    /// Experience points.
    #[serde(default)]
    pub xp: u32,
    /// Level derived from experience thresholds.
    #[serde(default)]
    pub level: u32,
    /// Set once hit points and stamina are both depleted.
    #[serde(default)]
    pub knocked_out: bool,
    /// Rounds left before a trait may fire again. Absent means ready.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cooldowns: BTreeMap<String, u32>,
}

impl Unit {
    /// Create a unit with default resources and no traits.
    pub fn new(
        id: impl Into<UnitId>,
        team: impl Into<TeamId>,
        role: impl Into<String>,
        division: Division,
    ) -> Self {
        Self {
            id: id.into(),
            team: team.into(),
            role: role.into(),
            division,
            resources: Resources::default(),
            traits: Vec::new(),
            stats: BTreeMap::new(),
            xp: 0,
            level: 0,
            knocked_out: false,
            cooldowns: BTreeMap::new(),
        }
    }

    /// Builder-style trait assignment.
    #[must_use]
    pub fn with_traits<I, S>(mut self, traits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.traits = traits.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style resource assignment.
    #[must_use]
    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    /// Add `amount` to a statistic, saturating on overflow.
    pub fn add_stat(&mut self, code: &str, amount: i64) {
        let entry = self.stats.entry(code.to_owned()).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Current value of a statistic (0 if never recorded).
    pub fn stat(&self, code: &str) -> i64 {
        self.stats.get(code).copied().unwrap_or(0)
    }

    /// Whether a trait is free of cooldown.
    pub fn trait_ready(&self, trait_id: &str) -> bool {
        self.cooldowns.get(trait_id).is_none_or(|left| *left == 0)
    }

    /// Drop traits beyond `cap`, returning the ones removed.
    pub fn truncate_traits(&mut self, cap: usize) -> Vec<String> {
        if self.traits.len() <= cap {
            return Vec::new();
        }
        self.traits.split_off(cap)
    }
}

// ---------------------------------------------------------------------------
// UnitRoster
// ---------------------------------------------------------------------------

/// All units taking part in a matchday, keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRoster {
    units: BTreeMap<UnitId, Unit>,
}

impl UnitRoster {
    /// Create an empty roster.
    pub const fn new() -> Self {
        Self {
            units: BTreeMap::new(),
        }
    }

    /// Insert a unit. Fails with the identifier if it is already taken.
    pub fn insert(&mut self, unit: Unit) -> Result<(), UnitId> {
        if self.units.contains_key(&unit.id) {
            return Err(unit.id);
        }
        self.units.insert(unit.id.clone(), unit);
        Ok(())
    }

    /// Look up a unit.
    pub fn get(&self, id: &UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Look up a unit mutably.
    pub fn get_mut(&mut self, id: &UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id)
    }

    /// Team of a unit, if it is on the roster.
    pub fn team_of(&self, id: &UnitId) -> Option<&TeamId> {
        self.units.get(id).map(|u| &u.team)
    }

    /// Every other unit on the same team as `id`.
    pub fn teammates(&self, id: &UnitId) -> Vec<UnitId> {
        let Some(team) = self.team_of(id) else {
            return Vec::new();
        };
        self.units
            .values()
            .filter(|u| &u.team == team && &u.id != id)
            .map(|u| u.id.clone())
            .collect()
    }

    /// Map of unit to team, used to classify convergences.
    pub fn team_index(&self) -> BTreeMap<UnitId, TeamId> {
        self.units
            .values()
            .map(|u| (u.id.clone(), u.team.clone()))
            .collect()
    }

    /// Iterate units in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Iterate units mutably in identifier order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.values_mut()
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ConvergenceRecord
// ---------------------------------------------------------------------------

/// Two or more units choosing the same move notation on the same turn.
///
/// Immutable once built: fields are private and participants are stored
/// sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergenceRecord {
    turn: u32,
    notation: String,
    participants: Vec<UnitId>,
    classification: Classification,
}

impl ConvergenceRecord {
    /// Build a record from `(unit, team)` participants.
    ///
    /// Returns `None` when fewer than two distinct units take part.
    /// Classification is [`Classification::Ally`] iff every participant
    /// has the same team.
    pub fn new(
        turn: u32,
        notation: impl Into<String>,
        participants: impl IntoIterator<Item = (UnitId, TeamId)>,
    ) -> Option<Self> {
        let mut units = BTreeSet::new();
        let mut teams = BTreeSet::new();
        for (unit, team) in participants {
            if units.insert(unit) {
                teams.insert(team);
            }
        }
        if units.len() < 2 {
            return None;
        }
        let classification = if teams.len() == 1 {
            Classification::Ally
        } else {
            Classification::Enemy
        };
        Some(Self {
            turn,
            notation: notation.into(),
            participants: units.into_iter().collect(),
            classification,
        })
    }

    /// Turn on which the convergence happened.
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Shared move notation.
    pub fn notation(&self) -> &str {
        &self.notation
    }

    /// Participants in identifier order (always at least two).
    pub fn participants(&self) -> &[UnitId] {
        &self.participants
    }

    /// Ally or enemy.
    pub const fn classification(&self) -> Classification {
        self.classification
    }

    /// Every unordered pair of participants, in identifier order.
    pub fn pairs(&self) -> impl Iterator<Item = (&UnitId, &UnitId)> {
        self.participants.iter().enumerate().flat_map(move |(i, a)| {
            self.participants
                .iter()
                .skip(i.saturating_add(1))
                .map(move |b| (a, b))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn member(id: &str, team: &str) -> (UnitId, TeamId) {
        (UnitId::from(id), TeamId::from(team))
    }

    #[test]
    fn bounded_resource_clamps_on_construction() {
        let r = BoundedResource::new(150, 0, 100);
        assert_eq!(r.value(), 100);
        let r = BoundedResource::new(-5, 0, 100);
        assert_eq!(r.value(), 0);
    }

    #[test]
    fn bounded_resource_collapses_inverted_range() {
        let r = BoundedResource::new(10, 20, 5);
        assert_eq!(r.min(), 20);
        assert_eq!(r.max(), 20);
        assert_eq!(r.value(), 20);
    }

    #[test]
    fn apply_delta_reports_actual_change() {
        let mut morale = BoundedResource::new(95, 0, 100);
        assert_eq!(morale.apply_delta(10), 5);
        assert_eq!(morale.value(), 100);
        assert_eq!(morale.apply_delta(-250), -100);
        assert_eq!(morale.value(), 0);
        assert!(morale.is_depleted());
    }

    #[test]
    fn apply_delta_survives_extreme_values() {
        let mut r = BoundedResource::new(0, i32::MIN, i32::MAX);
        r.apply_delta(i32::MAX);
        r.apply_delta(i32::MAX);
        assert_eq!(r.value(), i32::MAX);
    }

    #[test]
    fn deserialized_resource_is_clamped() {
        let r: BoundedResource =
            serde_json::from_str(r#"{"value": 500, "min": 0, "max": 100}"#).unwrap();
        assert_eq!(r.value(), 100);
    }

    #[test]
    fn stats_saturate() {
        let mut unit = Unit::new("A1", "A", "FL", Division::Ops);
        unit.add_stat("DD", i64::MAX);
        unit.add_stat("DD", 5);
        assert_eq!(unit.stat("DD"), i64::MAX);
        assert_eq!(unit.stat("AST"), 0);
    }

    #[test]
    fn truncate_traits_returns_overflow() {
        let mut unit =
            Unit::new("A1", "A", "FL", Division::Ops).with_traits(["a", "b", "c", "d"]);
        let dropped = unit.truncate_traits(3);
        assert_eq!(dropped, vec![String::from("d")]);
        assert_eq!(unit.traits.len(), 3);
    }

    #[test]
    fn roster_rejects_duplicate_ids() {
        let mut roster = UnitRoster::new();
        assert!(roster.insert(Unit::new("A1", "A", "FL", Division::Ops)).is_ok());
        assert!(roster.insert(Unit::new("A1", "B", "GO", Division::Intel)).is_err());
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn roster_teammates_excludes_self_and_other_teams() {
        let mut roster = UnitRoster::new();
        for (id, team) in [("A1", "A"), ("A2", "A"), ("B1", "B")] {
            roster.insert(Unit::new(id, team, "FL", Division::Ops)).unwrap();
        }
        assert_eq!(roster.teammates(&UnitId::from("A1")), vec![UnitId::from("A2")]);
        assert!(roster.teammates(&UnitId::from("Z9")).is_empty());
    }

    #[test]
    fn record_requires_two_distinct_units() {
        assert!(ConvergenceRecord::new(1, "e4", [member("A1", "A")]).is_none());
        assert!(ConvergenceRecord::new(1, "e4", [member("A1", "A"), member("A1", "A")]).is_none());
    }

    #[test]
    fn record_classifies_by_team() {
        let ally =
            ConvergenceRecord::new(4, "Nf3", [member("A2", "A"), member("A1", "A")]).unwrap();
        assert_eq!(ally.classification(), Classification::Ally);
        assert_eq!(ally.participants(), &[UnitId::from("A1"), UnitId::from("A2")]);

        let enemy =
            ConvergenceRecord::new(1, "e4", [member("A1", "A"), member("B1", "B")]).unwrap();
        assert_eq!(enemy.classification(), Classification::Enemy);
    }

    #[test]
    fn record_pairs_cover_each_pair_once() {
        let record = ConvergenceRecord::new(
            2,
            "d4",
            [member("A1", "A"), member("A2", "A"), member("B1", "B")],
        )
        .unwrap();
        let pairs: Vec<(String, String)> = record
            .pairs()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (String::from("A1"), String::from("A2")),
                (String::from("A1"), String::from("B1")),
                (String::from("A2"), String::from("B1")),
            ]
        );
    }
}
