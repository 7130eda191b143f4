//! The session engine.
//!
//! A [`Session`] is constructed once per mounted unit set and owns all of
//! its mutable state: the answer tracker, the score and the progression
//! stepper. The shuffled view is computed at construction and kept for the
//! life of the session. Switching lessons means dropping the session and
//! building a new one.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ContentError, EngineError, GuardViolation, Step};
use crate::model::{Mode, UnitSet};
use crate::policy::{MatchingEdits, Policy, Scoring};
use crate::prepare::{prepare_units, PreparedUnit};
use crate::progression::{Position, Progression, ProgressionState};
use crate::report::SessionReport;
use crate::scoring::{compute_score, verdict, ScoreState, Verdict};
use crate::tracker::{AnswerRecord, AnswerTracker, ChoiceKey};

/// One learner's pass through a unit set.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    set_id: String,
    set_name: String,
    mode: Mode,
    units: Vec<PreparedUnit>,
    policy: Policy,
    scoring: Scoring,
    tracker: AnswerTracker,
    score: ScoreState,
    progression: Progression,
}

/// A selection as shown to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub key: ChoiceKey,
    pub choice: usize,
    /// Present once the unit's feedback is revealed.
    pub verdict: Option<Verdict>,
}

/// Everything needed to render the current state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub unit_set: String,
    pub mode: Mode,
    pub position: Position,
    pub progression: ProgressionState,
    pub progress_percent: u32,
    pub current_unit: PreparedUnit,
    pub selections: Vec<Selection>,
    pub score: ScoreState,
    pub can_submit: bool,
    pub can_advance: bool,
    pub can_retreat: bool,
}

impl Session {
    /// Mount `set` with the policy of its mode, shuffling from the thread RNG.
    pub fn new(set: &UnitSet) -> Result<Self, ContentError> {
        Self::with_rng(set, &mut rand::thread_rng())
    }

    /// Mount `set` with the policy of its mode, shuffling from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(set: &UnitSet, rng: &mut R) -> Result<Self, ContentError> {
        let policy = Policy::for_mode(set.mode).with_overrides(&set.policy);
        Self::with_policy(set, policy, rng)
    }

    /// Mount `set` under an explicit policy. The set's own overrides are not
    /// applied.
    pub fn with_policy<R: Rng + ?Sized>(
        set: &UnitSet,
        policy: Policy,
        rng: &mut R,
    ) -> Result<Self, ContentError> {
        let units = prepare_units(set, policy.shuffle, rng)?;
        let tracker = AnswerTracker::new(units.iter().map(|u| u.id.clone()));
        let score = ScoreState::zeroed(&units, &set.scoring);
        let progression = Progression::new(units.len(), &policy);

        let session = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            set_id: set.id.clone(),
            set_name: set.name.clone(),
            mode: set.mode,
            units,
            policy,
            scoring: set.scoring.clone(),
            tracker,
            score,
            progression,
        };
        tracing::info!(
            "session {} mounted '{}' ({} units, {} mode)",
            session.id,
            session.set_id,
            session.units.len(),
            session.mode
        );
        Ok(session)
    }

    // -- commands --

    /// Record a selection for `key` of unit `unit_id`.
    ///
    /// Unknown units, keys that do not fit the unit and out-of-range choices
    /// are caller errors. A selection on a locked unit is ignored.
    pub fn select(&mut self, unit_id: &str, key: ChoiceKey, choice: usize) -> Result<Step, EngineError> {
        let index = self
            .units
            .iter()
            .position(|u| u.id == unit_id)
            .ok_or_else(|| EngineError::UnknownUnit(unit_id.to_string()))?;
        let unit = &self.units[index];
        let len = unit
            .choice_count(key)
            .ok_or_else(|| EngineError::InvalidChoiceKey {
                unit: unit_id.to_string(),
                key: key.to_string(),
            })?;
        if choice >= len {
            return Err(EngineError::ChoiceOutOfRange {
                unit: unit_id.to_string(),
                choice,
                len,
            });
        }

        if let Some(violation) = self.select_violation(index) {
            return Ok(note("select", Step::Ignored(violation)));
        }

        self.tracker.select(unit_id, key, choice)?;
        tracing::debug!("selected {choice} for {unit_id} ({key})");

        if self.policy.reveal_on_select
            && index == self.progression.current_index()
            && self.can_submit()
        {
            self.submit();
        } else {
            self.rescore();
        }
        Ok(Step::Applied)
    }

    /// Reveal feedback for the current unit once its selections are present.
    pub fn submit(&mut self) -> Step {
        let ready = self.current_ready();
        let step = self.progression.reveal(ready);
        if step.is_applied() {
            tracing::debug!("revealed {}", self.current_unit().id);
            self.rescore();
        }
        note("submit", step)
    }

    /// Reveal every unit at once, provided every unit is answered.
    pub fn submit_all(&mut self) -> Step {
        let step = match self.check_reveal_all() {
            Err(v) => Step::Ignored(v),
            Ok(()) if !self.all_answered() => Step::Ignored(GuardViolation::Incomplete),
            Ok(()) => self.progression.reveal_every_unit(),
        };
        if step.is_applied() {
            tracing::debug!("submitted all {} units", self.units.len());
            self.rescore();
        }
        note("submit_all", step)
    }

    /// Reveal every unit whether or not it has been answered.
    pub fn reveal_all(&mut self) -> Step {
        let step = match self.check_reveal_all() {
            Err(v) => Step::Ignored(v),
            Ok(()) => self.progression.reveal_every_unit(),
        };
        if step.is_applied() {
            tracing::debug!("revealed all {} units", self.units.len());
            self.rescore();
        }
        note("reveal_all", step)
    }

    /// Move to the next unit, or complete the session from the last one.
    pub fn advance(&mut self) -> Step {
        let step = self.progression.advance();
        if step.is_applied() {
            self.rescore();
            match self.progression.position() {
                Position::Complete => tracing::info!(
                    "session {} complete: {}/{} graded selections counted",
                    self.id,
                    self.score.get(&self.scoring.correct_counter),
                    self.score.total
                ),
                Position::At { index, .. } => tracing::debug!("advanced to unit {index}"),
            }
        }
        note("advance", step)
    }

    /// Move to the previous unit, where the policy allows it.
    pub fn retreat(&mut self) -> Step {
        let step = self.progression.retreat();
        if step.is_applied() {
            tracing::debug!("retreated to unit {}", self.progression.current_index());
            self.rescore();
        }
        note("retreat", step)
    }

    /// Back to the first unit with no answers and a zero score. The shuffled
    /// view is kept.
    pub fn reset(&mut self) {
        self.tracker.clear();
        self.progression.reset();
        self.score = ScoreState::zeroed(&self.units, &self.scoring);
        tracing::debug!("session {} reset", self.id);
    }

    // -- guards --

    pub fn can_submit(&self) -> bool {
        self.progression.check_reveal(self.current_ready()).is_ok()
    }

    pub fn can_advance(&self) -> bool {
        self.progression.can_advance()
    }

    pub fn can_retreat(&self) -> bool {
        self.progression.can_retreat()
    }

    pub fn can_reveal_all(&self) -> bool {
        self.check_reveal_all().is_ok()
    }

    pub fn can_submit_all(&self) -> bool {
        self.can_reveal_all() && self.all_answered()
    }

    // -- read model --

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn set_id(&self) -> &str {
        &self.set_id
    }

    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn scoring(&self) -> &Scoring {
        &self.scoring
    }

    pub fn progression(&self) -> ProgressionState {
        self.progression.state()
    }

    pub fn position(&self) -> Position {
        self.progression.position()
    }

    pub fn is_complete(&self) -> bool {
        self.progression.is_complete()
    }

    pub fn progress_percent(&self) -> u32 {
        self.progression.progress_percent()
    }

    /// The active unit. After completion this stays the last unit.
    pub fn current_unit(&self) -> &PreparedUnit {
        &self.units[self.progression.current_index()]
    }

    pub fn unit(&self, unit_id: &str) -> Option<&PreparedUnit> {
        self.units.iter().find(|u| u.id == unit_id)
    }

    /// The session's presentation view, in order.
    pub fn units(&self) -> &[PreparedUnit] {
        &self.units
    }

    pub fn answers(&self) -> &AnswerRecord {
        self.tracker.record()
    }

    /// Recorded selections of one unit, in key order.
    pub fn answers_for(&self, unit_id: &str) -> Vec<(ChoiceKey, usize)> {
        self.tracker.record().for_unit(unit_id).collect()
    }

    /// Verdicts for the selections of one unit. Empty until it is revealed.
    pub fn verdicts_for(&self, unit_id: &str) -> Vec<(ChoiceKey, Verdict)> {
        let Some(unit) = self.unit(unit_id) else {
            return Vec::new();
        };
        if !self.is_revealed(unit_id) {
            return Vec::new();
        }
        self.tracker
            .record()
            .for_unit(unit_id)
            .filter_map(|(key, choice)| verdict(unit, key, choice).map(|v| (key, v)))
            .collect()
    }

    pub fn is_revealed(&self, unit_id: &str) -> bool {
        self.index_of(unit_id)
            .is_some_and(|i| self.progression.is_revealed(i))
    }

    pub fn score(&self) -> &ScoreState {
        &self.score
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let current = self.current_unit();
        let revealed = self.progression.is_revealed(self.progression.current_index());
        let selections = self
            .answers_for(&current.id)
            .into_iter()
            .map(|(key, choice)| Selection {
                key,
                choice,
                verdict: revealed.then(|| verdict(current, key, choice)).flatten(),
            })
            .collect();

        SessionSnapshot {
            session_id: self.id,
            unit_set: self.set_id.clone(),
            mode: self.mode,
            position: self.position(),
            progression: self.progression(),
            progress_percent: self.progress_percent(),
            current_unit: current.clone(),
            selections,
            score: self.score.clone(),
            can_submit: self.can_submit(),
            can_advance: self.can_advance(),
            can_retreat: self.can_retreat(),
        }
    }

    pub fn report(&self) -> SessionReport {
        SessionReport::from_session(self)
    }

    // -- internals --

    fn index_of(&self, unit_id: &str) -> Option<usize> {
        self.units.iter().position(|u| u.id == unit_id)
    }

    fn unit_answered(&self, unit: &PreparedUnit) -> bool {
        self.tracker.is_unit_complete(&unit.id, &unit.required_keys())
    }

    fn current_ready(&self) -> bool {
        self.unit_answered(self.current_unit())
    }

    fn all_answered(&self) -> bool {
        self.units.iter().all(|u| self.unit_answered(u))
    }

    fn check_reveal_all(&self) -> Result<(), GuardViolation> {
        if self.progression.is_complete() {
            Err(GuardViolation::Finished)
        } else if !self.policy.allow_reveal_all {
            Err(GuardViolation::RevealAllDisabled)
        } else {
            Ok(())
        }
    }

    fn select_violation(&self, index: usize) -> Option<GuardViolation> {
        if self.progression.is_complete() {
            return Some(GuardViolation::Finished);
        }
        let editable_after_reveal =
            self.units[index].is_matching() && self.policy.matching_edits == MatchingEdits::Open;
        (self.progression.is_revealed(index) && !editable_after_reveal)
            .then_some(GuardViolation::Locked)
    }

    /// Score from the answers of revealed units only.
    fn rescore(&mut self) {
        let progression = &self.progression;
        let graded = self.tracker.record().filtered(|unit_id| {
            self.units
                .iter()
                .position(|u| u.id == unit_id)
                .is_some_and(|i| progression.is_revealed(i))
        });
        self.score = compute_score(&self.units, &graded, &self.scoring);
    }
}

fn note(command: &str, step: Step) -> Step {
    if let Step::Ignored(violation) = step {
        tracing::warn!("{command} ignored: {violation}");
    }
    step
}
