//! Per-lesson behaviour switches and the scoring map.
//!
//! Lessons never reimplement state handling; they pick a [`Mode`] and, where
//! needed, override individual [`Policy`] fields and supply a [`Scoring`] map.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::Mode;

/// Whether a matching unit's items may be re-answered after reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingEdits {
    /// Items stay selectable after reveal; each change is re-graded.
    Open,
    /// Items lock together with the unit.
    Locked,
}

/// How scenario selections whose tag maps to no counter are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedOutcomes {
    /// Not graded at all: `total` counts positive outcomes only.
    #[default]
    Exclude,
    /// Graded as an attempt: `total` counts every answered scenario.
    Attempted,
}

/// Resolved behaviour switches for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// `retreat()` is permitted.
    pub allow_retreat: bool,
    /// A unit re-entered via navigation keeps the reveal state it had.
    pub sticky_reveal: bool,
    /// A selection that completes the current unit reveals it immediately.
    pub reveal_on_select: bool,
    /// Options and candidates are shuffled once at mount.
    pub shuffle: bool,
    pub matching_edits: MatchingEdits,
    /// `reveal_all()` is permitted regardless of completeness.
    pub allow_reveal_all: bool,
}

impl Policy {
    /// Defaults for each mode.
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Review => Self {
                allow_retreat: true,
                sticky_reveal: true,
                reveal_on_select: false,
                shuffle: true,
                matching_edits: MatchingEdits::Open,
                allow_reveal_all: false,
            },
            Mode::Simulation => Self {
                allow_retreat: false,
                sticky_reveal: false,
                reveal_on_select: true,
                shuffle: false,
                matching_edits: MatchingEdits::Locked,
                allow_reveal_all: false,
            },
            Mode::Checkpoint => Self {
                allow_retreat: true,
                sticky_reveal: true,
                reveal_on_select: false,
                shuffle: false,
                matching_edits: MatchingEdits::Locked,
                allow_reveal_all: true,
            },
        }
    }

    /// Apply the fields a unit set overrides.
    pub fn with_overrides(mut self, overrides: &PolicyOverrides) -> Self {
        if let Some(v) = overrides.allow_retreat {
            self.allow_retreat = v;
        }
        if let Some(v) = overrides.sticky_reveal {
            self.sticky_reveal = v;
        }
        if let Some(v) = overrides.reveal_on_select {
            self.reveal_on_select = v;
        }
        if let Some(v) = overrides.shuffle {
            self.shuffle = v;
        }
        if let Some(v) = overrides.matching_edits {
            self.matching_edits = v;
        }
        if let Some(v) = overrides.allow_reveal_all {
            self.allow_reveal_all = v;
        }
        self
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::for_mode(Mode::default())
    }
}

/// Optional per-set policy fields, as written in content files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyOverrides {
    #[serde(default)]
    pub allow_retreat: Option<bool>,
    #[serde(default)]
    pub sticky_reveal: Option<bool>,
    #[serde(default)]
    pub reveal_on_select: Option<bool>,
    #[serde(default)]
    pub shuffle: Option<bool>,
    #[serde(default)]
    pub matching_edits: Option<MatchingEdits>,
    #[serde(default)]
    pub allow_reveal_all: Option<bool>,
}

/// Maps answers onto named counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoring {
    /// Counter incremented by correct single-select and matching answers.
    #[serde(default = "default_correct_counter")]
    pub correct_counter: String,
    /// Scenario outcome tag -> counters it increments. A tag may feed
    /// several counters ("both") or none.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub unmapped: UnmappedOutcomes,
}

fn default_correct_counter() -> String {
    "correct".to_string()
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            correct_counter: default_correct_counter(),
            categories: BTreeMap::new(),
            unmapped: UnmappedOutcomes::default(),
        }
    }
}

impl Scoring {
    /// Counters an outcome tag increments. Unknown tags map to none.
    pub fn counters_for(&self, outcome: &str) -> &[String] {
        self.categories
            .get(outcome)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every counter name the map can produce.
    pub fn category_counters(&self) -> BTreeSet<&str> {
        self.categories
            .values()
            .flatten()
            .map(String::as_str)
            .collect()
    }
}
