//! Lesson failures.

use thiserror::Error;

use record_semantics::CopyError;

#[derive(Debug, Error)]
pub enum LessonError {
    /// A copy or rendering step rejected a record.
    #[error("copy failed: {0}")]
    Copy(#[from] CopyError),

    /// The output sink refused a write.
    #[error("output sink error: {0}")]
    Io(#[from] std::io::Error),
}
