//! Core trait definitions for the collaborators of an exam session.
//!
//! Content comes from an [`ExamCatalog`], finished results go to a
//! [`ResultStore`], and scoring goes through a [`Grader`]. Implementations
//! live in `catalog`, `store` and `grader` respectively.

use crate::answers::SubmittedAnswer;
use crate::error::StoreError;
use crate::model::{Exam, ExamSummary, SubQuestion};
use crate::results::{ExamResult, SubQuestionGrade};

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Read-only source of exam content.
pub trait ExamCatalog: Send + Sync {
    /// Look up an exam. `None` when the id is unknown.
    fn exam_by_id(&self, id: u32) -> Option<Exam>;

    /// Listing of every exam, ordered by id.
    fn exams(&self) -> Vec<ExamSummary>;
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Append-only history of finished exams.
pub trait ResultStore: Send + Sync {
    /// Append one result to the end of the history.
    fn append_result(&self, result: &ExamResult) -> Result<(), StoreError>;

    /// Every stored result in append order.
    fn list_results(&self) -> Result<Vec<ExamResult>, StoreError>;

    /// Remove all stored results.
    fn clear(&self) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Grading
// ---------------------------------------------------------------------------

/// Scores one sub-question. Must be pure, total and deterministic.
pub trait Grader: Send + Sync {
    /// Grade `submitted` against the sub-question's key. `None` means the
    /// candidate never touched the sub-question.
    fn grade(&self, sub_question: &SubQuestion, submitted: Option<&SubmittedAnswer>)
        -> SubQuestionGrade;
}
