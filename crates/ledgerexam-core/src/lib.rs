//! ledgerexam-core: exam sessions, countdown clock, and partial-credit grading.
//!
//! This crate defines the exam content model, the answer store, the grader
//! for calculation/table/journal sub-questions, and the session state
//! machine that ties them together under a countdown.

pub mod answers;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod grader;
pub mod model;
pub mod numeric;
pub mod results;
pub mod session;
pub mod store;
pub mod traits;
