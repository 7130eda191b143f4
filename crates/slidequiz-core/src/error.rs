//! Engine error types.
//!
//! Three tiers, from most to least severe:
//!
//! - [`ContentError`]: the content handed to the engine breaks its contract.
//!   Raised once, when a session is constructed, and the session refuses to run.
//! - [`EngineError`]: a command referenced something that does not exist
//!   (unknown unit, out-of-range option). This is a bug in the calling layer.
//! - [`GuardViolation`]: a well-formed command arrived in a state where it is
//!   not allowed. The command is ignored and the state is left untouched.

use thiserror::Error;

/// Content contract violations detected while preparing a unit set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// The unit set has no units to step through.
    #[error("unit set '{0}' has no units")]
    EmptyUnitSet(String),

    /// Two units share the same id.
    #[error("duplicate unit id: {0}")]
    DuplicateUnitId(String),

    /// A single-select or scenario unit has no options.
    #[error("unit '{0}' has no options")]
    NoOptions(String),

    /// A single-select unit has no option marked correct.
    #[error("unit '{0}' has no option marked correct")]
    NoCorrectOption(String),

    /// A single-select unit has more than one option marked correct.
    #[error("unit '{unit}' has {count} options marked correct, expected exactly one")]
    MultipleCorrectOptions { unit: String, count: usize },

    /// A matching unit has no items.
    #[error("matching unit '{0}' has no items")]
    NoItems(String),

    /// A matching item has no candidates.
    #[error("item '{item}' of unit '{unit}' has no candidates")]
    NoCandidates { unit: String, item: String },

    /// A matching item designates a correct candidate that does not exist.
    #[error("item '{item}' of unit '{unit}' marks candidate {index} correct, but only {len} exist")]
    CorrectIndexOutOfRange {
        unit: String,
        item: String,
        index: usize,
        len: usize,
    },

    /// Two items of one matching unit share a label.
    #[error("unit '{unit}' has duplicate item label: {label}")]
    DuplicateItemLabel { unit: String, label: String },
}

/// Caller contract violations at command time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The unit id is not part of the mounted unit set.
    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    /// The selected option or candidate index does not exist.
    #[error("choice {choice} is out of range for unit '{unit}' ({len} choices)")]
    ChoiceOutOfRange {
        unit: String,
        choice: usize,
        len: usize,
    },

    /// The choice key does not fit the unit kind (e.g. an item key on a
    /// single-select unit, or an item that does not exist).
    #[error("invalid choice key {key} for unit '{unit}'")]
    InvalidChoiceKey { unit: String, key: String },
}

/// Reasons a command was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuardViolation {
    #[error("feedback for the current unit has not been revealed")]
    NotRevealed,

    #[error("the current unit is already revealed")]
    AlreadyRevealed,

    #[error("the current unit is missing required selections")]
    Incomplete,

    #[error("the unit is locked after its feedback was revealed")]
    Locked,

    #[error("retreating is disabled for this unit set")]
    RetreatDisabled,

    #[error("already at the first unit")]
    AtFirstUnit,

    #[error("revealing all answers is disabled for this unit set")]
    RevealAllDisabled,

    #[error("the session is complete")]
    Finished,
}

/// Outcome of a state-changing command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The transition was applied.
    Applied,
    /// The command was rejected by a guard and the state is unchanged.
    Ignored(GuardViolation),
}

impl Step {
    /// Returns `true` if the transition was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, Step::Applied)
    }

    /// Returns the guard that rejected the command, if any.
    pub fn violation(&self) -> Option<GuardViolation> {
        match self {
            Step::Applied => None,
            Step::Ignored(v) => Some(*v),
        }
    }
}
