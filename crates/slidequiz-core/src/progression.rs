//! Stepper over an ordered list of units.
//!
//! States are `At { index, revealed }` for every unit plus the terminal
//! `Complete`. Transitions whose guard fails return
//! [`Step::Ignored`] and leave the state exactly as it was.
//!
//! ```text
//! At(i, false) --reveal(ready)--> At(i, true)
//! At(i, true)  --advance-------> At(i+1, memory[i+1])   (i < N-1)
//! At(N-1,true) --advance-------> Complete
//! At(i, _)     --retreat-------> At(i-1, memory[i-1])   (i > 0, allowed)
//! any          --reset---------> At(0, false)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GuardViolation, Step};
use crate::policy::Policy;
use crate::scoring::percent;

/// Where the stepper is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Position {
    At { index: usize, revealed: bool },
    Complete,
}

/// Read-only snapshot for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    pub current_index: usize,
    pub len: usize,
    pub revealed: bool,
    pub is_complete: bool,
}

#[derive(Debug, Clone)]
pub struct Progression {
    index: usize,
    /// Reveal state per unit, kept across navigation.
    revealed: Vec<bool>,
    complete: bool,
    allow_retreat: bool,
    sticky_reveal: bool,
}

impl Progression {
    /// A stepper over `len` units. Callers guarantee `len > 0`; content
    /// preparation rejects empty unit sets.
    pub fn new(len: usize, policy: &Policy) -> Self {
        debug_assert!(len > 0, "progression needs at least one unit");
        Self {
            index: 0,
            revealed: vec![false; len.max(1)],
            complete: false,
            allow_retreat: policy.allow_retreat,
            sticky_reveal: policy.sticky_reveal,
        }
    }

    pub fn len(&self) -> usize {
        self.revealed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revealed.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Whether feedback for unit `index` is currently shown.
    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.get(index).copied().unwrap_or(false)
    }

    pub fn position(&self) -> Position {
        if self.complete {
            Position::Complete
        } else {
            Position::At {
                index: self.index,
                revealed: self.is_revealed(self.index),
            }
        }
    }

    pub fn state(&self) -> ProgressionState {
        ProgressionState {
            current_index: self.index,
            len: self.len(),
            revealed: self.is_revealed(self.index),
            is_complete: self.complete,
        }
    }

    /// Check whether the current unit may be revealed. `ready` says whether
    /// its required selections are present.
    pub fn check_reveal(&self, ready: bool) -> Result<(), GuardViolation> {
        if self.complete {
            Err(GuardViolation::Finished)
        } else if self.is_revealed(self.index) {
            Err(GuardViolation::AlreadyRevealed)
        } else if !ready {
            Err(GuardViolation::Incomplete)
        } else {
            Ok(())
        }
    }

    /// `At(i, false)` -> `At(i, true)`.
    pub fn reveal(&mut self, ready: bool) -> Step {
        match self.check_reveal(ready) {
            Ok(()) => {
                self.revealed[self.index] = true;
                Step::Applied
            }
            Err(v) => Step::Ignored(v),
        }
    }

    /// Reveal every unit without moving.
    pub fn reveal_every_unit(&mut self) -> Step {
        if self.complete {
            return Step::Ignored(GuardViolation::Finished);
        }
        self.revealed.iter_mut().for_each(|r| *r = true);
        Step::Applied
    }

    pub fn check_advance(&self) -> Result<(), GuardViolation> {
        if self.complete {
            Err(GuardViolation::Finished)
        } else if !self.is_revealed(self.index) {
            Err(GuardViolation::NotRevealed)
        } else {
            Ok(())
        }
    }

    pub fn can_advance(&self) -> bool {
        self.check_advance().is_ok()
    }

    /// Move to the next unit, or finish from the last one. The next unit's
    /// reveal state is restored when sticky and cleared otherwise.
    pub fn advance(&mut self) -> Step {
        if let Err(v) = self.check_advance() {
            return Step::Ignored(v);
        }
        if self.index + 1 < self.len() {
            self.index += 1;
            if !self.sticky_reveal {
                self.revealed[self.index] = false;
            }
        } else {
            self.complete = true;
        }
        Step::Applied
    }

    pub fn check_retreat(&self) -> Result<(), GuardViolation> {
        if self.complete {
            Err(GuardViolation::Finished)
        } else if !self.allow_retreat {
            Err(GuardViolation::RetreatDisabled)
        } else if self.index == 0 {
            Err(GuardViolation::AtFirstUnit)
        } else {
            Ok(())
        }
    }

    pub fn can_retreat(&self) -> bool {
        self.check_retreat().is_ok()
    }

    /// Move to the previous unit. Its reveal state is restored when sticky
    /// and cleared otherwise.
    pub fn retreat(&mut self) -> Step {
        if let Err(v) = self.check_retreat() {
            return Step::Ignored(v);
        }
        self.index -= 1;
        if !self.sticky_reveal {
            self.revealed[self.index] = false;
        }
        Step::Applied
    }

    /// Back to `At(0, false)` with every reveal forgotten.
    pub fn reset(&mut self) {
        self.index = 0;
        self.complete = false;
        self.revealed.iter_mut().for_each(|r| *r = false);
    }

    /// Units passed so far, counting the current one once it is revealed.
    pub fn steps_done(&self) -> usize {
        if self.complete {
            self.len()
        } else {
            self.index + usize::from(self.is_revealed(self.index))
        }
    }

    pub fn progress_percent(&self) -> u32 {
        percent(self.steps_done() as u32, self.len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mode;

    fn review(len: usize) -> Progression {
        Progression::new(len, &Policy::for_mode(Mode::Review))
    }

    #[test]
    fn starts_at_first_unit_unrevealed() {
        let p = review(3);
        assert_eq!(p.position(), Position::At { index: 0, revealed: false });
        assert_eq!(
            p.state(),
            ProgressionState {
                current_index: 0,
                len: 3,
                revealed: false,
                is_complete: false,
            }
        );
    }

    #[test]
    fn advance_without_reveal_is_a_no_op() {
        let mut p = review(3);
        assert_eq!(p.advance(), Step::Ignored(GuardViolation::NotRevealed));
        assert_eq!(p.position(), Position::At { index: 0, revealed: false });
    }

    #[test]
    fn reveal_needs_selections_and_happens_once() {
        let mut p = review(2);
        assert_eq!(p.reveal(false), Step::Ignored(GuardViolation::Incomplete));
        assert_eq!(p.reveal(true), Step::Applied);
        assert_eq!(p.reveal(true), Step::Ignored(GuardViolation::AlreadyRevealed));
    }

    #[test]
    fn completes_only_by_advancing_from_revealed_last_unit() {
        let mut p = review(2);
        p.reveal(true);
        assert!(p.advance().is_applied());
        assert_eq!(p.position(), Position::At { index: 1, revealed: false });

        p.reveal(true);
        assert!(!p.is_complete());
        assert_eq!(p.steps_done(), 2);

        assert!(p.advance().is_applied());
        assert!(p.is_complete());
        assert_eq!(p.position(), Position::Complete);
        assert_eq!(p.state().current_index, 1);
        assert_eq!(p.advance(), Step::Ignored(GuardViolation::Finished));
        assert_eq!(p.retreat(), Step::Ignored(GuardViolation::Finished));
        assert_eq!(p.progress_percent(), 100);
    }

    #[test]
    fn advance_never_decreases_index() {
        let mut p = review(4);
        let mut last = p.current_index();
        for i in 0..12 {
            if i % 3 == 0 {
                p.reveal(true);
            }
            let revealed_before = p.state().revealed;
            let step = p.advance();
            assert!(p.current_index() >= last);
            if step.is_applied() {
                assert!(revealed_before);
            }
            last = p.current_index();
        }
    }

    #[test]
    fn retreat_restores_sticky_reveal() {
        let mut p = review(3);
        p.reveal(true);
        p.advance();
        assert_eq!(p.retreat(), Step::Applied);
        assert_eq!(p.position(), Position::At { index: 0, revealed: true });
        assert_eq!(p.retreat(), Step::Ignored(GuardViolation::AtFirstUnit));
    }

    #[test]
    fn retreat_clears_reveal_when_not_sticky() {
        let policy = Policy {
            allow_retreat: true,
            sticky_reveal: false,
            ..Policy::for_mode(Mode::Review)
        };
        let mut p = Progression::new(3, &policy);
        p.reveal(true);
        p.advance();
        p.retreat();
        assert_eq!(p.position(), Position::At { index: 0, revealed: false });
    }

    #[test]
    fn advance_clears_reveal_when_not_sticky() {
        let policy = Policy {
            allow_retreat: true,
            sticky_reveal: false,
            ..Policy::for_mode(Mode::Simulation)
        };
        let mut p = Progression::new(3, &policy);
        p.reveal(true);
        p.advance();
        p.reveal(true);
        p.retreat();
        p.reveal(true);
        assert!(p.advance().is_applied());
        assert_eq!(p.position(), Position::At { index: 1, revealed: false });
        assert_eq!(p.advance(), Step::Ignored(GuardViolation::NotRevealed));
    }

    #[test]
    fn advance_restores_sticky_reveal() {
        let mut p = review(3);
        p.reveal(true);
        p.advance();
        p.reveal(true);
        p.retreat();
        p.advance();
        assert_eq!(p.position(), Position::At { index: 1, revealed: true });
    }

    #[test]
    fn simulation_cannot_retreat() {
        let mut p = Progression::new(3, &Policy::for_mode(Mode::Simulation));
        p.reveal(true);
        p.advance();
        assert_eq!(p.retreat(), Step::Ignored(GuardViolation::RetreatDisabled));
        assert_eq!(p.current_index(), 1);
    }

    #[test]
    fn reveal_every_unit_and_reset() {
        let mut p = review(3);
        assert!(p.reveal_every_unit().is_applied());
        assert!(p.is_revealed(2));
        p.advance();
        assert_eq!(p.position(), Position::At { index: 1, revealed: true });

        p.reset();
        assert_eq!(p.position(), Position::At { index: 0, revealed: false });
        assert!((0..3).all(|i| !p.is_revealed(i)));
        assert_eq!(p.steps_done(), 0);
    }
}
