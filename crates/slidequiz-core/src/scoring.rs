//! Score aggregation.
//!
//! [`compute_score`] is a pure function of the prepared units, an answer
//! record and the scoring map. It keeps no event log, so recomputing after a
//! reset, a re-answer or a navigation step can never drift.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::policy::{Scoring, UnmappedOutcomes};
use crate::prepare::{PreparedBody, PreparedUnit};
use crate::tracker::{AnswerRecord, ChoiceKey};

/// Named counters plus the number of graded selections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreState {
    pub counters: BTreeMap<String, u32>,
    pub total: u32,
}

impl ScoreState {
    /// All counters the unit set can produce, at zero.
    pub fn zeroed(units: &[PreparedUnit], scoring: &Scoring) -> Self {
        let mut counters = BTreeMap::new();
        let graded_by_correctness = units
            .iter()
            .any(|u| !matches!(u.body, PreparedBody::Scenario { .. }));
        if graded_by_correctness {
            counters.insert(scoring.correct_counter.clone(), 0);
        }
        for name in scoring.category_counters() {
            counters.insert(name.to_string(), 0);
        }
        Self { counters, total: 0 }
    }

    /// Value of a counter; unknown counters read as zero.
    pub fn get(&self, name: &str) -> u32 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// `round(100 * counter / total)`, zero when nothing was graded.
    pub fn percent(&self, name: &str) -> u32 {
        percent(self.get(name), self.total)
    }

    fn bump(&mut self, name: &str) {
        *self.counters.entry(name.to_string()).or_insert(0) += 1;
    }
}

/// `round(100 * count / denominator)`, zero for an empty denominator.
pub fn percent(count: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 0;
    }
    (100.0 * count as f64 / denominator as f64).round() as u32
}

/// How a single recorded selection is judged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
    /// Scenario selections are not right or wrong; they land in a category.
    Outcome(String),
}

/// Judge `choice` for `key` of `unit`. `None` if the pair does not exist.
pub fn verdict(unit: &PreparedUnit, key: ChoiceKey, choice: usize) -> Option<Verdict> {
    let judged = |correct: usize| {
        if choice == correct {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    };

    match (&unit.body, key) {
        (PreparedBody::SingleSelect { options, correct }, ChoiceKey::Whole) => {
            (choice < options.len()).then(|| judged(*correct))
        }
        (PreparedBody::Matching { items }, ChoiceKey::Item(i)) => {
            let item = items.get(i)?;
            (choice < item.candidates.len()).then(|| judged(item.correct))
        }
        (PreparedBody::Scenario { options }, ChoiceKey::Whole) => options
            .get(choice)
            .map(|option| Verdict::Outcome(option.outcome.clone())),
        _ => None,
    }
}

/// Aggregate every selection in `answers` into counters.
///
/// - single-select: each answered unit is one graded selection, and a
///   correct one increments `scoring.correct_counter`;
/// - matching: each answered item is one graded selection;
/// - scenario: the outcome tag increments every counter it maps to. A tag
///   mapping to nothing counts toward `total` only under
///   [`UnmappedOutcomes::Attempted`].
///
/// Selections for units outside `units`, or that do not fit their unit,
/// are not graded.
pub fn compute_score(units: &[PreparedUnit], answers: &AnswerRecord, scoring: &Scoring) -> ScoreState {
    let mut score = ScoreState::zeroed(units, scoring);
    let by_id: HashMap<&str, &PreparedUnit> = units.iter().map(|u| (u.id.as_str(), u)).collect();

    for (unit_id, key, choice) in answers.iter() {
        let Some(unit) = by_id.get(unit_id) else {
            continue;
        };
        match verdict(unit, key, choice) {
            Some(Verdict::Correct) => {
                score.total += 1;
                score.bump(&scoring.correct_counter);
            }
            Some(Verdict::Incorrect) => score.total += 1,
            Some(Verdict::Outcome(tag)) => {
                let counters: BTreeSet<&str> =
                    scoring.counters_for(&tag).iter().map(String::as_str).collect();
                if counters.is_empty() && scoring.unmapped == UnmappedOutcomes::Exclude {
                    continue;
                }
                score.total += 1;
                for name in counters {
                    score.bump(name);
                }
            }
            None => {}
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChoiceOption, ScenarioOption};
    use crate::prepare::PreparedItem;

    fn single(id: &str, correct: usize) -> PreparedUnit {
        PreparedUnit {
            id: id.into(),
            prompt: String::new(),
            feedback: String::new(),
            body: PreparedBody::SingleSelect {
                options: (0..3)
                    .map(|i| ChoiceOption {
                        text: format!("option {i}"),
                        correct: i == correct,
                        feedback: None,
                    })
                    .collect(),
                correct,
            },
        }
    }

    fn scenario(id: &str, outcomes: &[&str]) -> PreparedUnit {
        PreparedUnit {
            id: id.into(),
            prompt: String::new(),
            feedback: String::new(),
            body: PreparedBody::Scenario {
                options: outcomes
                    .iter()
                    .map(|o| ScenarioOption {
                        text: format!("respond {o}"),
                        outcome: o.to_string(),
                        feedback: String::new(),
                    })
                    .collect(),
            },
        }
    }

    fn interaction_scoring() -> Scoring {
        let mut scoring = Scoring::default();
        scoring
            .categories
            .insert("synchronous".into(), vec!["synchronous".into()]);
        scoring
            .categories
            .insert("reciprocal".into(), vec!["reciprocal".into()]);
        scoring
    }

    #[test]
    fn percent_rounds_and_handles_zero() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(4, 4), 100);
    }

    #[test]
    fn single_select_counts_correct_and_total() {
        let units: Vec<_> = (0..4).map(|i| single(&format!("q{i}"), 1)).collect();
        let mut answers = AnswerRecord::default();
        answers.insert("q0", ChoiceKey::Whole, 1);
        answers.insert("q1", ChoiceKey::Whole, 0);
        answers.insert("q2", ChoiceKey::Whole, 1);

        let score = compute_score(&units, &answers, &Scoring::default());
        assert_eq!(score.get("correct"), 2);
        assert_eq!(score.total, 3);
        assert_eq!(score.percent("correct"), 67);
    }

    #[test]
    fn scenario_categories_exclude_unmapped_by_default() {
        let outcomes = ["synchronous", "reciprocal", "poor"];
        let units: Vec<_> = (0..6).map(|i| scenario(&format!("s{i}"), &outcomes)).collect();
        // three synchronous, two reciprocal, one poor
        let picks = [0, 0, 0, 1, 1, 2];
        let mut answers = AnswerRecord::default();
        for (i, pick) in picks.iter().enumerate() {
            answers.insert(&format!("s{i}"), ChoiceKey::Whole, *pick);
        }

        let score = compute_score(&units, &answers, &interaction_scoring());
        assert_eq!(score.get("synchronous"), 3);
        assert_eq!(score.get("reciprocal"), 2);
        assert_eq!(score.total, 5);
        assert!(!score.counters.contains_key("correct"));

        let mut attempted = interaction_scoring();
        attempted.unmapped = UnmappedOutcomes::Attempted;
        let score = compute_score(&units, &answers, &attempted);
        assert_eq!(score.total, 6);
        assert_eq!(score.get("synchronous") + score.get("reciprocal"), 5);
    }

    #[test]
    fn one_outcome_can_feed_two_counters() {
        let units = vec![scenario("card", &["both", "social"])];
        let mut scoring = Scoring::default();
        scoring
            .categories
            .insert("both".into(), vec!["biological".into(), "social".into()]);
        scoring
            .categories
            .insert("social".into(), vec!["social".into()]);

        let mut answers = AnswerRecord::default();
        answers.insert("card", ChoiceKey::Whole, 0);

        let score = compute_score(&units, &answers, &scoring);
        assert_eq!(score.get("biological"), 1);
        assert_eq!(score.get("social"), 1);
        assert_eq!(score.total, 1);
    }

    #[test]
    fn matching_items_are_graded_individually() {
        let unit = PreparedUnit {
            id: "m1".into(),
            prompt: String::new(),
            feedback: String::new(),
            body: PreparedBody::Matching {
                items: vec![
                    PreparedItem {
                        label: "Meltzoff & Moore".into(),
                        candidates: vec!["imitation".into(), "synchrony".into()],
                        correct: 0,
                    },
                    PreparedItem {
                        label: "Condon & Sander".into(),
                        candidates: vec!["imitation".into(), "synchrony".into()],
                        correct: 1,
                    },
                ],
            },
        };
        let mut answers = AnswerRecord::default();
        answers.insert("m1", ChoiceKey::Item(0), 0);
        answers.insert("m1", ChoiceKey::Item(1), 0);

        let score = compute_score(std::slice::from_ref(&unit), &answers, &Scoring::default());
        assert_eq!(score.get("correct"), 1);
        assert_eq!(score.total, 2);

        assert_eq!(verdict(&unit, ChoiceKey::Item(0), 0), Some(Verdict::Correct));
        assert_eq!(verdict(&unit, ChoiceKey::Item(1), 0), Some(Verdict::Incorrect));
        assert_eq!(verdict(&unit, ChoiceKey::Item(5), 0), None);
        assert_eq!(verdict(&unit, ChoiceKey::Whole, 0), None);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let units = vec![single("q1", 2), scenario("s1", &["reciprocal", "poor"])];
        let mut answers = AnswerRecord::default();
        answers.insert("q1", ChoiceKey::Whole, 2);
        answers.insert("s1", ChoiceKey::Whole, 0);
        let scoring = interaction_scoring();

        let first = compute_score(&units, &answers, &scoring);
        let second = compute_score(&units, &answers, &scoring);
        assert_eq!(first, second);
        for (name, count) in &first.counters {
            assert!(*count <= first.total, "{name} exceeds total");
        }
    }

    #[test]
    fn foreign_and_out_of_range_selections_are_ignored() {
        let units = vec![single("q1", 0)];
        let mut answers = AnswerRecord::default();
        answers.insert("elsewhere", ChoiceKey::Whole, 0);
        answers.insert("q1", ChoiceKey::Whole, 17);

        let score = compute_score(&units, &answers, &Scoring::default());
        assert_eq!(score, ScoreState::zeroed(&units, &Scoring::default()));
        assert_eq!(score.get("correct"), 0);
    }
}
