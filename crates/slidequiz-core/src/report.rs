//! Session report with JSON export and markdown rendering.
//!
//! A report is a write-only export of a session's read model. Nothing here
//! restores a session from a report.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::Session;
use crate::model::Mode;
use crate::prepare::{PreparedBody, PreparedUnit};
use crate::scoring::{verdict, ScoreState, Verdict};
use crate::tracker::ChoiceKey;

/// A complete session report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// The session's identifier.
    pub id: Uuid,
    /// When the session was mounted.
    pub started_at: DateTime<Utc>,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub unit_set: UnitSetSummary,
    pub mode: Mode,
    /// Whether the session reached its terminal state.
    pub completed: bool,
    pub progress_percent: u32,
    pub score: ScoreState,
    /// One entry per unit, in presentation order.
    pub units: Vec<UnitOutcome>,
}

/// Summary of a unit set (without the unit definitions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSetSummary {
    pub id: String,
    pub name: String,
    pub unit_count: usize,
}

/// What the learner did with one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitOutcome {
    pub unit_id: String,
    pub kind: String,
    pub revealed: bool,
    pub selections: Vec<RecordedSelection>,
}

/// A selection with the text it pointed at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedSelection {
    pub key: ChoiceKey,
    pub choice: usize,
    pub text: String,
    /// Only present for revealed units.
    pub verdict: Option<Verdict>,
}

impl SessionReport {
    /// Capture the current state of `session`.
    pub fn from_session(session: &Session) -> Self {
        let units = session
            .units()
            .iter()
            .map(|unit| {
                let revealed = session.is_revealed(&unit.id);
                let selections = session
                    .answers_for(&unit.id)
                    .into_iter()
                    .map(|(key, choice)| RecordedSelection {
                        key,
                        choice,
                        text: choice_text(unit, key, choice),
                        verdict: revealed.then(|| verdict(unit, key, choice)).flatten(),
                    })
                    .collect();
                UnitOutcome {
                    unit_id: unit.id.clone(),
                    kind: unit.kind_name().to_string(),
                    revealed,
                    selections,
                }
            })
            .collect();

        Self {
            id: session.id(),
            started_at: session.started_at(),
            created_at: Utc::now(),
            unit_set: UnitSetSummary {
                id: session.set_id().to_string(),
                name: session.set_name().to_string(),
                unit_count: session.units().len(),
            },
            mode: session.mode(),
            completed: session.is_complete(),
            progress_percent: session.progress_percent(),
            score: session.score().clone(),
            units,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## {}\n\n", self.unit_set.name));
        md.push_str(&format!(
            "**Summary:** {} mode, {} units, {}% through, {}\n\n",
            self.mode,
            self.unit_set.unit_count,
            self.progress_percent,
            if self.completed { "completed" } else { "not completed" }
        ));

        md.push_str("### Score\n\n");
        md.push_str("| Counter | Count | Percent |\n");
        md.push_str("|---------|-------|---------|\n");
        for (name, count) in &self.score.counters {
            md.push_str(&format!(
                "| {} | {} | {}% |\n",
                name,
                count,
                self.score.percent(name)
            ));
        }
        md.push_str(&format!("| total | {} | |\n\n", self.score.total));

        md.push_str("### Units\n\n");
        md.push_str("| Unit | Kind | Selection | Verdict |\n");
        md.push_str("|------|------|-----------|---------|\n");
        for unit in &self.units {
            if unit.selections.is_empty() {
                md.push_str(&format!("| {} | {} | - | - |\n", unit.unit_id, unit.kind));
                continue;
            }
            for s in &unit.selections {
                let verdict = match &s.verdict {
                    Some(Verdict::Correct) => "correct".to_string(),
                    Some(Verdict::Incorrect) => "incorrect".to_string(),
                    Some(Verdict::Outcome(tag)) => tag.clone(),
                    None => "hidden".to_string(),
                };
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    unit.unit_id, unit.kind, s.text, verdict
                ));
            }
        }

        md
    }
}

fn choice_text(unit: &PreparedUnit, key: ChoiceKey, choice: usize) -> String {
    let text = match (&unit.body, key) {
        (PreparedBody::SingleSelect { options, .. }, ChoiceKey::Whole) => {
            options.get(choice).map(|o| o.text.clone())
        }
        (PreparedBody::Scenario { options }, ChoiceKey::Whole) => {
            options.get(choice).map(|o| o.text.clone())
        }
        (PreparedBody::Matching { items }, ChoiceKey::Item(i)) => items.get(i).and_then(|item| {
            item.candidates
                .get(choice)
                .map(|c| format!("{}: {}", item.label, c))
        }),
        _ => None,
    };
    text.unwrap_or_else(|| format!("#{choice}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChoiceOption, Unit, UnitKind, UnitSet};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quiz() -> UnitSet {
        let question = |id: &str| Unit {
            id: id.into(),
            prompt: format!("prompt {id}"),
            feedback: String::new(),
            kind: UnitKind::SingleSelect {
                options: vec![
                    ChoiceOption {
                        text: "Right".into(),
                        correct: true,
                        feedback: None,
                    },
                    ChoiceOption {
                        text: "Wrong".into(),
                        correct: false,
                        feedback: None,
                    },
                ],
            },
        };
        UnitSet {
            id: "do-now".into(),
            name: "Do Now".into(),
            description: String::new(),
            mode: Mode::Checkpoint,
            expected_units: None,
            policy: Default::default(),
            scoring: Default::default(),
            units: vec![question("q1"), question("q2")],
        }
    }

    fn played() -> SessionReport {
        let mut session = Session::with_rng(&quiz(), &mut StdRng::seed_from_u64(5)).unwrap();
        // checkpoint mode keeps authored order
        session.select("q1", ChoiceKey::Whole, 0).unwrap();
        session.submit();
        session.report()
    }

    #[test]
    fn report_captures_session() {
        let report = played();
        assert_eq!(report.unit_set.id, "do-now");
        assert_eq!(report.unit_set.unit_count, 2);
        assert!(!report.completed);
        assert_eq!(report.score.get("correct"), 1);
        assert_eq!(report.units[0].selections[0].text, "Right");
        assert_eq!(report.units[0].selections[0].verdict, Some(Verdict::Correct));
        assert!(report.units[1].selections.is_empty());
    }

    #[test]
    fn json_export() {
        let report = played();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(value["unit_set"]["name"], "Do Now");
        assert_eq!(value["mode"], "checkpoint");
        assert_eq!(value["score"]["total"], 1);
    }

    #[test]
    fn markdown_output() {
        let md = played().to_markdown();
        assert!(md.contains("## Do Now"));
        assert!(md.contains("| correct | 1 | 100% |"));
        assert!(md.contains("| q1 | single_select | Right | correct |"));
        assert!(md.contains("| q2 | single_select | - | - |"));
    }
}
