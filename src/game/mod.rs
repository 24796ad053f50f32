//! Game simulation modules

pub mod effects;
pub mod engine;
pub mod fruit;
pub mod physics;
pub mod ranking;
pub mod registry;
pub mod round;
pub mod tuning;

pub use engine::{CutEvent, Game};
pub use ranking::{RankEntry, RoundSummary};
pub use registry::{Participant, ParticipantRegistry};
pub use round::RoundPhase;
pub use tuning::GameTuning;
