//! Enumeration types shared across the matchday engine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Division
// ---------------------------------------------------------------------------

/// A unit's broad role category, also used as the domain of an rStat code.
///
/// Accepts the short roster codes (`o`, `i`, `b`) as aliases when
/// deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Division {
    /// Operations division.
    #[serde(alias = "o")]
    Ops,
    /// Intelligence division.
    #[serde(alias = "i")]
    Intel,
    /// Shared between both divisions.
    #[serde(alias = "b")]
    Both,
}

impl Division {
    /// Whether a statistic declared for `domain` may be attached to a unit
    /// of this division.
    ///
    /// Shared-domain codes are always allowed. Division-specific codes are
    /// allowed only on a unit of exactly that division, so a `Both` unit
    /// carries shared codes only.
    pub const fn admits(self, domain: Self) -> bool {
        matches!(
            (self, domain),
            (_, Self::Both) | (Self::Ops, Self::Ops) | (Self::Intel, Self::Intel)
        )
    }
}

impl core::fmt::Display for Division {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Ops => f.write_str("ops"),
            Self::Intel => f.write_str("intel"),
            Self::Both => f.write_str("both"),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Whether the participants of a convergence are all on one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Every participant shares a team.
    Ally,
    /// At least two participants are on different teams.
    Enemy,
}

// ---------------------------------------------------------------------------
// BoardOutcome
// ---------------------------------------------------------------------------

/// How a board reached its terminal state.
///
/// The unit always plays the white side, so `Won`/`Lost` are from the
/// unit's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardOutcome {
    /// The oracle reported game over with the unit winning.
    Won,
    /// The oracle reported game over with the unit losing.
    Lost,
    /// The oracle reported a drawn game.
    Drawn,
    /// The oracle offered no legal moves without declaring game over.
    Stalled,
    /// The matchday turn cap was reached while the game was still running.
    TurnLimit,
    /// The unit was knocked out during resolution.
    KnockedOut,
    /// The matchday was cancelled at a turn boundary.
    Cancelled,
    /// The move oracle failed for this board.
    Aborted,
}

impl BoardOutcome {
    /// Whether the outcome came from the game itself rather than being
    /// imposed by the orchestrator.
    pub const fn is_natural(self) -> bool {
        matches!(self, Self::Won | Self::Lost | Self::Drawn | Self::Stalled)
    }
}

impl core::fmt::Display for BoardOutcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Drawn => "drawn",
            Self::Stalled => "stalled",
            Self::TurnLimit => "turn-limit",
            Self::KnockedOut => "knocked-out",
            Self::Cancelled => "cancelled",
            Self::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// ResourceKind
// ---------------------------------------------------------------------------

/// The bounded resources every unit carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Hit points.
    HitPoints,
    /// Stamina.
    Stamina,
    /// Morale.
    Morale,
}

// ---------------------------------------------------------------------------
// Trait catalog vocabulary
// ---------------------------------------------------------------------------

/// Broad category of a trait, as declared in the trait catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraitType {
    /// Improves the unit's own attacks.
    Offensive,
    /// Mitigates incoming damage.
    Defensive,
    /// Helps teammates.
    Support,
    /// Anything else.
    Utility,
}

/// Situation in which a trait is eligible to activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitTrigger {
    /// Any convergence.
    Convergence,
    /// A convergence among teammates only.
    AllyConvergence,
    /// A convergence that includes an opposing team.
    EnemyConvergence,
}

impl TraitTrigger {
    /// Whether this trigger fires for a convergence of the given class.
    pub const fn matches(self, classification: Classification) -> bool {
        matches!(
            (self, classification),
            (Self::Convergence, _)
                | (Self::AllyConvergence, Classification::Ally)
                | (Self::EnemyConvergence, Classification::Enemy)
        )
    }
}

/// How an active trait's magnitude is applied during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitFormula {
    /// Added to the unit's contested roll modifier.
    RollBonus,
    /// Added to damage the unit deals.
    DamageBonus,
    /// Subtracted from damage the unit takes.
    DamageReduction,
    /// Hit points restored to a teammate the unit assists.
    Heal,
}
