//! The learner's current selections.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Which part of a unit a selection answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceKey {
    /// The unit as a whole (single-select, scenario).
    Whole,
    /// One item of a matching unit, by position.
    Item(usize),
}

impl fmt::Display for ChoiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceKey::Whole => write!(f, "whole"),
            ChoiceKey::Item(i) => write!(f, "item {i}"),
        }
    }
}

/// Selections keyed by `(unit id, choice key)`; values are positions in the
/// session's presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerRecord {
    entries: BTreeMap<(String, ChoiceKey), usize>,
}

impl AnswerRecord {
    /// Record a selection, returning the one it replaced.
    pub fn insert(&mut self, unit: &str, key: ChoiceKey, choice: usize) -> Option<usize> {
        self.entries.insert((unit.to_string(), key), choice)
    }

    pub fn get(&self, unit: &str, key: ChoiceKey) -> Option<usize> {
        self.entries.get(&(unit.to_string(), key)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ChoiceKey, usize)> + '_ {
        self.entries
            .iter()
            .map(|((unit, key), choice)| (unit.as_str(), *key, *choice))
    }

    /// Selections recorded for one unit, in key order.
    pub fn for_unit<'a>(&'a self, unit: &'a str) -> impl Iterator<Item = (ChoiceKey, usize)> + 'a {
        self.iter()
            .filter(move |(u, _, _)| *u == unit)
            .map(|(_, key, choice)| (key, choice))
    }

    /// A copy holding only the units `keep` accepts.
    pub fn filtered(&self, keep: impl Fn(&str) -> bool) -> AnswerRecord {
        AnswerRecord {
            entries: self
                .entries
                .iter()
                .filter(|((unit, _), _)| keep(unit.as_str()))
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// An [`AnswerRecord`] bound to the units of one mounted set.
#[derive(Debug, Clone)]
pub struct AnswerTracker {
    known: HashSet<String>,
    record: AnswerRecord,
}

impl AnswerTracker {
    pub fn new<I, S>(unit_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: unit_ids.into_iter().map(Into::into).collect(),
            record: AnswerRecord::default(),
        }
    }

    /// Record or overwrite a selection.
    ///
    /// Fails for a unit that is not mounted: that is a bug in the caller,
    /// not a learner action to be ignored.
    pub fn select(
        &mut self,
        unit: &str,
        key: ChoiceKey,
        choice: usize,
    ) -> Result<Option<usize>, EngineError> {
        if !self.known.contains(unit) {
            return Err(EngineError::UnknownUnit(unit.to_string()));
        }
        Ok(self.record.insert(unit, key, choice))
    }

    pub fn get(&self, unit: &str, key: ChoiceKey) -> Option<usize> {
        self.record.get(unit, key)
    }

    /// True iff every required key of `unit` has a selection.
    pub fn is_unit_complete(&self, unit: &str, required: &[ChoiceKey]) -> bool {
        self.known.contains(unit) && required.iter().all(|key| self.get(unit, *key).is_some())
    }

    pub fn record(&self) -> &AnswerRecord {
        &self.record
    }

    pub fn clear(&mut self) {
        self.record.clear();
    }
}
