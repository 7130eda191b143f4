//! slidequiz-core: assessment and scenario engine.
//!
//! This crate defines the content model, the shuffled session view, answer
//! tracking, scoring and progression that every quiz and simulation in a
//! slidequiz lesson runs on. A lesson supplies a [`UnitSet`]; a [`Session`]
//! owns all state for one pass through it.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod policy;
pub mod prepare;
pub mod progression;
pub mod report;
pub mod scoring;
pub mod shuffle;
pub mod tracker;

pub use engine::{Session, SessionSnapshot};
pub use error::{ContentError, EngineError, GuardViolation, Step};
pub use model::{Mode, UnitSet};
pub use tracker::ChoiceKey;
