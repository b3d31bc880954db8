//! Academic-risk and stress early warning for students.
//!
//! Nine survey answers are turned into an eight-feature vector, scored by a
//! pre-fit risk pipeline, banded, explained, and nudged one habit at a time to
//! show what would change. Mood text goes to a separate stress classifier.

pub mod artifacts;
pub mod engine;
pub mod error;
pub mod features;
pub mod intake;
pub mod logging;
pub mod models;
pub mod plan;
pub mod report;
pub mod session;
