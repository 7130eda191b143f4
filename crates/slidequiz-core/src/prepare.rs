//! Validated, session-stable view of a unit set.
//!
//! The view is built once per session: content is checked against its
//! contract, then options and matching candidates are shuffled (each matching
//! item independently) with the correct positions carried through the index
//! maps. Nothing in here is recomputed afterwards, not even on reset.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::model::{ChoiceOption, ScenarioOption, Unit, UnitKind, UnitSet};
use crate::shuffle::{shuffle, Shuffled};
use crate::tracker::ChoiceKey;

/// A unit as presented for the whole session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedUnit {
    pub id: String,
    pub prompt: String,
    pub feedback: String,
    pub body: PreparedBody,
}

/// Presentation-order choices of a prepared unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreparedBody {
    SingleSelect {
        options: Vec<ChoiceOption>,
        /// Position of the correct option in `options`.
        correct: usize,
    },
    Matching {
        items: Vec<PreparedItem>,
    },
    Scenario {
        options: Vec<ScenarioOption>,
    },
}

/// A matching item with its candidates in presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedItem {
    pub label: String,
    pub candidates: Vec<String>,
    /// Position of the correct candidate in `candidates`.
    pub correct: usize,
}

impl PreparedUnit {
    /// Keys that must all hold a selection before the unit can be submitted.
    pub fn required_keys(&self) -> Vec<ChoiceKey> {
        match &self.body {
            PreparedBody::Matching { items } => (0..items.len()).map(ChoiceKey::Item).collect(),
            PreparedBody::SingleSelect { .. } | PreparedBody::Scenario { .. } => {
                vec![ChoiceKey::Whole]
            }
        }
    }

    /// Number of choices behind `key`, or `None` if the key does not fit
    /// this unit.
    pub fn choice_count(&self, key: ChoiceKey) -> Option<usize> {
        match (&self.body, key) {
            (PreparedBody::SingleSelect { options, .. }, ChoiceKey::Whole) => Some(options.len()),
            (PreparedBody::Scenario { options }, ChoiceKey::Whole) => Some(options.len()),
            (PreparedBody::Matching { items }, ChoiceKey::Item(i)) => {
                items.get(i).map(|item| item.candidates.len())
            }
            _ => None,
        }
    }

    pub fn is_matching(&self) -> bool {
        matches!(self.body, PreparedBody::Matching { .. })
    }

    /// Short lowercase kind name.
    pub fn kind_name(&self) -> &'static str {
        match self.body {
            PreparedBody::SingleSelect { .. } => "single_select",
            PreparedBody::Matching { .. } => "matching",
            PreparedBody::Scenario { .. } => "scenario",
        }
    }
}

/// Check a unit set against the content contract without preparing it.
pub fn check_unit_set(set: &UnitSet) -> Result<(), ContentError> {
    if set.units.is_empty() {
        return Err(ContentError::EmptyUnitSet(set.id.clone()));
    }

    let mut seen = HashSet::new();
    for unit in &set.units {
        if !seen.insert(unit.id.as_str()) {
            return Err(ContentError::DuplicateUnitId(unit.id.clone()));
        }
        check_unit(unit)?;
    }
    Ok(())
}

fn check_unit(unit: &Unit) -> Result<(), ContentError> {
    match &unit.kind {
        UnitKind::SingleSelect { options } => {
            if options.is_empty() {
                return Err(ContentError::NoOptions(unit.id.clone()));
            }
            match options.iter().filter(|o| o.correct).count() {
                0 => Err(ContentError::NoCorrectOption(unit.id.clone())),
                1 => Ok(()),
                count => Err(ContentError::MultipleCorrectOptions {
                    unit: unit.id.clone(),
                    count,
                }),
            }
        }
        UnitKind::Matching { items } => {
            if items.is_empty() {
                return Err(ContentError::NoItems(unit.id.clone()));
            }
            let mut labels = HashSet::new();
            for item in items {
                if !labels.insert(item.label.as_str()) {
                    return Err(ContentError::DuplicateItemLabel {
                        unit: unit.id.clone(),
                        label: item.label.clone(),
                    });
                }
                if item.candidates.is_empty() {
                    return Err(ContentError::NoCandidates {
                        unit: unit.id.clone(),
                        item: item.label.clone(),
                    });
                }
                if item.correct >= item.candidates.len() {
                    return Err(ContentError::CorrectIndexOutOfRange {
                        unit: unit.id.clone(),
                        item: item.label.clone(),
                        index: item.correct,
                        len: item.candidates.len(),
                    });
                }
            }
            Ok(())
        }
        UnitKind::Scenario { options } => {
            if options.is_empty() {
                return Err(ContentError::NoOptions(unit.id.clone()));
            }
            Ok(())
        }
    }
}

/// Validate `set` and build its presentation view, shuffling when asked.
pub fn prepare_units<R: Rng + ?Sized>(
    set: &UnitSet,
    shuffle_choices: bool,
    rng: &mut R,
) -> Result<Vec<PreparedUnit>, ContentError> {
    check_unit_set(set)?;

    set.units
        .iter()
        .map(|unit| {
            let body = match &unit.kind {
                UnitKind::SingleSelect { options } => {
                    let original = options
                        .iter()
                        .position(|o| o.correct)
                        .ok_or_else(|| ContentError::NoCorrectOption(unit.id.clone()))?;
                    let shuffled = arrange(options.clone(), shuffle_choices, rng);
                    let correct = shuffled
                        .relocate(original)
                        .ok_or_else(|| ContentError::NoCorrectOption(unit.id.clone()))?;
                    PreparedBody::SingleSelect {
                        options: shuffled.into_parts().0,
                        correct,
                    }
                }
                UnitKind::Matching { items } => {
                    let items = items
                        .iter()
                        .map(|item| {
                            let shuffled = arrange(item.candidates.clone(), shuffle_choices, rng);
                            let correct = shuffled.relocate(item.correct).ok_or_else(|| {
                                ContentError::CorrectIndexOutOfRange {
                                    unit: unit.id.clone(),
                                    item: item.label.clone(),
                                    index: item.correct,
                                    len: item.candidates.len(),
                                }
                            })?;
                            Ok(PreparedItem {
                                label: item.label.clone(),
                                candidates: shuffled.into_parts().0,
                                correct,
                            })
                        })
                        .collect::<Result<Vec<_>, ContentError>>()?;
                    PreparedBody::Matching { items }
                }
                UnitKind::Scenario { options } => PreparedBody::Scenario {
                    options: arrange(options.clone(), shuffle_choices, rng).into_parts().0,
                },
            };

            Ok(PreparedUnit {
                id: unit.id.clone(),
                prompt: unit.prompt.clone(),
                feedback: unit.feedback.clone(),
                body,
            })
        })
        .collect()
}

fn arrange<T, R: Rng + ?Sized>(items: Vec<T>, shuffle_choices: bool, rng: &mut R) -> Shuffled<T> {
    if shuffle_choices {
        shuffle(items, rng)
    } else {
        Shuffled::identity(items)
    }
}
