//! # Adaptive Difficulty Engine
//!
//! Pure, synchronous computation in two halves:
//!
//! - [`offline`]: pre-quiz difficulty distribution synthesized from a user's
//!   performance history
//! - [`online`]: intra-quiz adjustment from the answers given so far
//!
//! Neither half performs I/O; orchestrators shape store data into the inputs.

pub mod offline;
pub mod online;

pub use offline::{
    recommend, DatedScore, DifficultyRecommendation, PerformanceSnapshot, SubjectHistory,
};
pub use online::{adjust_difficulty, AdjustmentDirection, LiveAnswer, RealtimeAdjustment};
