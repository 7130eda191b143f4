//! TOML unit set parser.
//!
//! Loads unit sets from TOML files and directories, and validates them.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{ChoiceOption, MatchItem, Mode, ScenarioOption, Unit, UnitKind, UnitSet};
use crate::policy::{PolicyOverrides, Scoring, UnmappedOutcomes};

/// Intermediate TOML structure for parsing unit set files.
#[derive(Debug, Deserialize)]
struct TomlUnitFile {
    unit_set: TomlUnitSetHeader,
    #[serde(default)]
    policy: PolicyOverrides,
    #[serde(default)]
    scoring: TomlScoring,
    #[serde(default)]
    units: Vec<TomlUnit>,
}

#[derive(Debug, Deserialize)]
struct TomlUnitSetHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_mode_str")]
    mode: String,
    #[serde(default)]
    expected_units: Option<usize>,
}

fn default_mode_str() -> String {
    "review".to_string()
}

#[derive(Debug, Default, Deserialize)]
struct TomlScoring {
    #[serde(default)]
    correct_counter: Option<String>,
    #[serde(default)]
    categories: BTreeMap<String, TomlCounters>,
    #[serde(default)]
    unmapped: UnmappedOutcomes,
}

/// `tag = "counter"` or `tag = ["counter", "other"]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlCounters {
    One(String),
    Many(Vec<String>),
}

impl TomlCounters {
    fn into_vec(self) -> Vec<String> {
        match self {
            TomlCounters::One(name) => vec![name],
            TomlCounters::Many(names) => names,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TomlUnit {
    id: String,
    kind: String,
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    feedback: String,
    /// Index of the correct option when options are plain strings.
    #[serde(default)]
    correct: Option<usize>,
    #[serde(default)]
    options: Vec<TomlOption>,
    #[serde(default)]
    items: Vec<TomlItem>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlOption {
    Text(String),
    Table {
        text: String,
        #[serde(default)]
        correct: bool,
        #[serde(default)]
        outcome: Option<String>,
        #[serde(default)]
        feedback: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct TomlItem {
    label: String,
    candidates: Vec<String>,
    correct: usize,
}

/// Parse a single TOML file into a `UnitSet`.
pub fn parse_unit_set(path: &Path) -> Result<UnitSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read unit set file: {}", path.display()))?;

    parse_unit_set_str(&content, path)
}

/// Parse a TOML string into a `UnitSet` (useful for testing).
pub fn parse_unit_set_str(content: &str, source_path: &Path) -> Result<UnitSet> {
    let parsed: TomlUnitFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let mode: Mode = parsed
        .unit_set
        .mode
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;

    let units = parsed
        .units
        .into_iter()
        .map(|u| {
            let id = u.id.clone();
            convert_unit(u).with_context(|| {
                format!("invalid unit '{}' in {}", id, source_path.display())
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut scoring = Scoring {
        categories: parsed
            .scoring
            .categories
            .into_iter()
            .map(|(tag, counters)| (tag, counters.into_vec()))
            .collect(),
        unmapped: parsed.scoring.unmapped,
        ..Scoring::default()
    };
    if let Some(counter) = parsed.scoring.correct_counter {
        scoring.correct_counter = counter;
    }

    Ok(UnitSet {
        id: parsed.unit_set.id,
        name: parsed.unit_set.name,
        description: parsed.unit_set.description,
        mode,
        expected_units: parsed.unit_set.expected_units,
        policy: parsed.policy,
        scoring,
        units,
    })
}

fn convert_unit(u: TomlUnit) -> Result<Unit> {
    let kind = match u.kind.as_str() {
        "single_select" | "single-select" | "question" => {
            if let Some(index) = u.correct {
                if index >= u.options.len() {
                    anyhow::bail!(
                        "correct index {} is out of range ({} options)",
                        index,
                        u.options.len()
                    );
                }
            }
            let options = u
                .options
                .into_iter()
                .enumerate()
                .map(|(i, option)| {
                    let marked = u.correct == Some(i);
                    match option {
                        TomlOption::Text(text) => ChoiceOption {
                            text,
                            correct: marked,
                            feedback: None,
                        },
                        TomlOption::Table {
                            text,
                            correct,
                            feedback,
                            ..
                        } => ChoiceOption {
                            text,
                            correct: correct || marked,
                            feedback,
                        },
                    }
                })
                .collect();
            UnitKind::SingleSelect { options }
        }
        "matching" => UnitKind::Matching {
            items: u
                .items
                .into_iter()
                .map(|item| MatchItem {
                    label: item.label,
                    candidates: item.candidates,
                    correct: item.correct,
                })
                .collect(),
        },
        "scenario" => {
            let options = u
                .options
                .into_iter()
                .map(|option| match option {
                    TomlOption::Table {
                        text,
                        outcome: Some(outcome),
                        feedback,
                        ..
                    } => Ok(ScenarioOption {
                        text,
                        outcome,
                        feedback: feedback.unwrap_or_default(),
                    }),
                    TomlOption::Table { text, .. } | TomlOption::Text(text) => {
                        anyhow::bail!("scenario option '{}' has no outcome", text)
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            UnitKind::Scenario { options }
        }
        other => anyhow::bail!(
            "unknown unit kind '{}' (expected single_select, matching or scenario)",
            other
        ),
    };

    Ok(Unit {
        id: u.id,
        prompt: u.prompt,
        feedback: u.feedback,
        kind,
    })
}

/// Recursively load all `.toml` unit set files from a directory.
///
/// Files that fail to parse are skipped with a warning; use
/// [`unit_set_paths`] with [`parse_unit_set`] to see every failure.
pub fn load_unit_directory(dir: &Path) -> Result<Vec<UnitSet>> {
    let mut sets = Vec::new();

    for path in unit_set_paths(dir)? {
        match parse_unit_set(&path) {
            Ok(set) => sets.push(set),
            Err(e) => {
                tracing::warn!("skipping {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(sets)
}

/// All `.toml` files under `dir`, recursively, in sorted order.
pub fn unit_set_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    let mut found = Vec::new();
    for path in paths {
        if path.is_dir() {
            found.extend(unit_set_paths(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            found.push(path);
        }
    }

    Ok(found)
}

/// A warning from unit set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The unit ID (if applicable).
    pub unit_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn set(message: impl Into<String>) -> Self {
        Self {
            unit_id: None,
            message: message.into(),
        }
    }

    fn unit(unit: &Unit, message: impl Into<String>) -> Self {
        Self {
            unit_id: Some(unit.id.clone()),
            message: message.into(),
        }
    }
}

/// Check a unit set for issues that do not stop a session from running.
///
/// Hard contract violations are reported by
/// [`check_unit_set`](crate::prepare::check_unit_set) instead.
pub fn validate_unit_set(set: &UnitSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if let Some(expected) = set.expected_units {
        if expected != set.units.len() {
            warnings.push(ValidationWarning::set(format!(
                "expected {} units but found {}",
                expected,
                set.units.len()
            )));
        }
    }

    for (tag, counters) in &set.scoring.categories {
        if counters.is_empty() {
            warnings.push(ValidationWarning::set(format!(
                "outcome '{tag}' is mapped to no counter"
            )));
        }
    }

    let mut produced = BTreeSet::new();
    let mut reported_unmapped = HashSet::new();

    for unit in &set.units {
        if unit.prompt.trim().is_empty() {
            warnings.push(ValidationWarning::unit(unit, "prompt is empty"));
        }

        match &unit.kind {
            UnitKind::SingleSelect { options } => {
                if options.len() == 1 {
                    warnings.push(ValidationWarning::unit(unit, "only one option to choose from"));
                }
                if unit.feedback.trim().is_empty() && options.iter().all(|o| o.feedback.is_none()) {
                    warnings.push(ValidationWarning::unit(unit, "no feedback to reveal"));
                }
            }
            UnitKind::Matching { items } => {
                if unit.feedback.trim().is_empty() {
                    warnings.push(ValidationWarning::unit(unit, "no feedback to reveal"));
                }
                for item in items.iter().filter(|i| i.candidates.len() == 1) {
                    warnings.push(ValidationWarning::unit(
                        unit,
                        format!("item '{}' has only one candidate", item.label),
                    ));
                }
            }
            UnitKind::Scenario { options } => {
                if options.len() == 1 {
                    warnings.push(ValidationWarning::unit(unit, "only one option to choose from"));
                }
                if options.iter().any(|o| o.feedback.trim().is_empty()) {
                    warnings.push(ValidationWarning::unit(
                        unit,
                        "some options have no feedback",
                    ));
                }
                if !options.is_empty()
                    && options
                        .iter()
                        .all(|o| set.scoring.counters_for(&o.outcome).is_empty())
                {
                    warnings.push(ValidationWarning::unit(
                        unit,
                        "no option maps to a score counter",
                    ));
                }
                for option in options {
                    produced.insert(option.outcome.as_str());
                    if !set.scoring.categories.contains_key(&option.outcome)
                        && reported_unmapped.insert(option.outcome.as_str())
                    {
                        let treatment = match set.scoring.unmapped {
                            UnmappedOutcomes::Exclude => "excluded from the total",
                            UnmappedOutcomes::Attempted => "counted toward the total only",
                        };
                        warnings.push(ValidationWarning::unit(
                            unit,
                            format!("outcome '{}' has no category and is {}", option.outcome, treatment),
                        ));
                    }
                }
            }
        }
    }

    for tag in set.scoring.categories.keys() {
        if !produced.contains(tag.as_str()) {
            warnings.push(ValidationWarning::set(format!(
                "category '{tag}' is never produced by any scenario option"
            )));
        }
    }

    warnings
}
