#![forbid(unsafe_code)]

//! Lesson Runner
//!
//! Runs the pass-by-reference / pass-by-value lessons against an output
//! sink. All record semantics live in `record_semantics`; this crate only
//! sequences the lessons and prints.

pub mod error;
pub mod logging;
pub mod runner;

pub use error::LessonError;
pub use runner::{Lesson, LessonReport, LessonRunner};
