//! Core content types for slidequiz.
//!
//! A lesson supplies a [`UnitSet`]: an ordered list of gradable [`Unit`]s plus
//! the mode, policy overrides and scoring map that tell the engine how to run
//! them. Content is immutable once a session is mounted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::policy::{PolicyOverrides, Scoring};

/// One gradable item in a sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Stable identity, unique within its unit set.
    pub id: String,
    /// Question text or situation description.
    pub prompt: String,
    /// Explanation shown once the unit is revealed.
    #[serde(default)]
    pub feedback: String,
    /// What kind of answer the unit expects.
    #[serde(flatten)]
    pub kind: UnitKind,
}

/// The three shapes of gradable unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitKind {
    /// Pick one option; exactly one is correct.
    SingleSelect { options: Vec<ChoiceOption> },
    /// Pick one candidate for each item; each item has one correct candidate.
    Matching { items: Vec<MatchItem> },
    /// Pick one option; each option carries an outcome tag that the scoring
    /// map turns into counters.
    Scenario { options: Vec<ScenarioOption> },
}

impl UnitKind {
    /// Short lowercase name used in listings and logs.
    pub fn name(&self) -> &'static str {
        match self {
            UnitKind::SingleSelect { .. } => "single_select",
            UnitKind::Matching { .. } => "matching",
            UnitKind::Scenario { .. } => "scenario",
        }
    }
}

/// A displayable choice of a single-select unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: String,
    #[serde(default)]
    pub correct: bool,
    /// Option-specific feedback, if the lesson provides one.
    #[serde(default)]
    pub feedback: Option<String>,
}

/// One row of a matching unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchItem {
    pub label: String,
    /// Candidates in authored order.
    pub candidates: Vec<String>,
    /// Index into `candidates` of the correct one.
    pub correct: usize,
}

/// A branch of a scenario unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOption {
    pub text: String,
    /// Open-ended outcome tag (e.g. "reciprocal", "poor", "correct").
    pub outcome: String,
    #[serde(default)]
    pub feedback: String,
}

/// How a unit set is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Step through units with feedback per unit; going back is allowed.
    #[default]
    Review,
    /// Branching simulation; choosing an option reveals its outcome and
    /// there is no going back.
    Simulation,
    /// A batch of questions answered together and checked at once.
    Checkpoint,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Review => write!(f, "review"),
            Mode::Simulation => write!(f, "simulation"),
            Mode::Checkpoint => write!(f, "checkpoint"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "review" | "quiz" => Ok(Mode::Review),
            "simulation" | "sim" => Ok(Mode::Simulation),
            "checkpoint" | "batch" => Ok(Mode::Checkpoint),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// A lesson's collection of units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSet {
    /// Unique identifier for this unit set.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mode: Mode,
    /// Number of units the layout was designed for, if it cares.
    #[serde(default)]
    pub expected_units: Option<usize>,
    /// Per-set adjustments to the mode's default policy.
    #[serde(default)]
    pub policy: PolicyOverrides,
    #[serde(default)]
    pub scoring: Scoring,
    /// The units in presentation order.
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl UnitSet {
    /// Look up a unit by id.
    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_display_and_parse() {
        assert_eq!(Mode::Simulation.to_string(), "simulation");
        assert_eq!("Review".parse::<Mode>().unwrap(), Mode::Review);
        assert_eq!("quiz".parse::<Mode>().unwrap(), Mode::Review);
        assert_eq!("batch".parse::<Mode>().unwrap(), Mode::Checkpoint);
        assert_eq!("sim".parse::<Mode>().unwrap(), Mode::Simulation);
        assert!("slideshow".parse::<Mode>().is_err());
    }

    #[test]
    fn unit_serializes_with_kind_tag() {
        let unit = Unit {
            id: "q1".into(),
            prompt: "What does innate mean?".into(),
            feedback: String::new(),
            kind: UnitKind::SingleSelect {
                options: vec![
                    ChoiceOption {
                        text: "Learned".into(),
                        correct: false,
                        feedback: None,
                    },
                    ChoiceOption {
                        text: "Present from birth".into(),
                        correct: true,
                        feedback: None,
                    },
                ],
            },
        };
        let json = serde_json::to_value(&unit).unwrap();
        assert_eq!(json["kind"], "single_select");
        assert_eq!(json["options"][1]["correct"], true);

        let back: Unit = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind.name(), "single_select");
    }
}
