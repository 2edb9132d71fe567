//! The exam session state machine.
//!
//! `NotStarted → InProgress → Finished`. Answers are accepted only while
//! `InProgress`; grading runs exactly once, guarded by a one-shot flag shared
//! by explicit submission and clock expiry.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answers::{AnswerStore, AnswerUpdate, QuestionStatus};
use crate::clock::{Clock, ClockEvent, ClockEvents, TICK_PERIOD};
use crate::error::SessionError;
use crate::grader::{grade_exam, total_score, StandardGrader};
use crate::model::Exam;
use crate::results::{format_timestamp, ExamResult, FinishReason, SessionOutcome};
use crate::traits::{ExamCatalog, Grader, ResultStore};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    InProgress,
    Finished,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::NotStarted => write!(f, "not started"),
            SessionState::InProgress => write!(f, "in progress"),
            SessionState::Finished => write!(f, "finished"),
        }
    }
}

/// Progress of one question, for navigation displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionProgress {
    pub question_id: u32,
    pub title: String,
    pub status: QuestionStatus,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub remaining_secs: u64,
    pub progress: Vec<QuestionProgress>,
}

/// One attempt at one exam.
pub struct ExamSession {
    id: Uuid,
    exam: Exam,
    state: SessionState,
    answers: AnswerStore,
    remaining_secs: u64,
    clock: Option<Clock>,
    finalized: AtomicBool,
    grader: Arc<dyn Grader>,
    store: Arc<dyn ResultStore>,
    tick_period: Duration,
}

impl ExamSession {
    pub fn new(exam: Exam, store: Arc<dyn ResultStore>) -> Self {
        let remaining_secs = exam.time_limit_secs();
        Self {
            id: Uuid::new_v4(),
            exam,
            state: SessionState::NotStarted,
            answers: AnswerStore::new(),
            remaining_secs,
            clock: None,
            finalized: AtomicBool::new(false),
            grader: Arc::new(StandardGrader),
            store,
            tick_period: TICK_PERIOD,
        }
    }

    /// Build a session for `exam_id`, or `None` if the catalog has no such exam.
    pub fn from_catalog(
        catalog: &dyn ExamCatalog,
        exam_id: u32,
        store: Arc<dyn ResultStore>,
    ) -> Option<Self> {
        match catalog.exam_by_id(exam_id) {
            Some(exam) => Some(Self::new(exam, store)),
            None => {
                tracing::warn!(exam_id, "exam not found");
                None
            }
        }
    }

    /// Replace the grading rules.
    pub fn with_grader(mut self, grader: Arc<dyn Grader>) -> Self {
        self.grader = grader;
        self
    }

    /// Override the countdown step (one second by default).
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    /// Arm the clock and begin accepting answers.
    ///
    /// Fails with [`SessionError::AlreadyStarted`] or
    /// [`SessionError::AlreadyFinished`] if called again; the session is left
    /// untouched. Must be called from within a Tokio runtime.
    pub fn start(&mut self) -> Result<ClockEvents, SessionError> {
        match self.state {
            SessionState::NotStarted => {}
            SessionState::InProgress => return Err(SessionError::AlreadyStarted),
            SessionState::Finished => return Err(SessionError::AlreadyFinished),
        }

        self.remaining_secs = self.exam.time_limit_secs();
        let (clock, events) = Clock::with_period(self.remaining_secs, self.tick_period);
        self.clock = Some(clock);
        self.state = SessionState::InProgress;

        tracing::info!(
            session = %self.id,
            exam_id = self.exam.id,
            time_limit_secs = self.remaining_secs,
            "exam session started"
        );
        Ok(events)
    }

    /// Record an answer update. Ignored unless the session is in progress
    /// and the sub-question exists.
    pub fn record_answer(&mut self, sub_question_id: &str, update: AnswerUpdate) {
        if self.state != SessionState::InProgress {
            tracing::debug!(
                session = %self.id,
                sub_question_id,
                state = %self.state,
                "answer ignored: session not in progress"
            );
            return;
        }
        let Some(sub) = self.exam.sub_question(sub_question_id) else {
            tracing::debug!(
                session = %self.id,
                sub_question_id,
                "answer ignored: unknown sub-question"
            );
            return;
        };
        if let AnswerUpdate::JournalField { side, position, .. } = &update {
            let lines = side.lines_in(&sub.answer);
            if *position >= lines {
                tracing::warn!(
                    session = %self.id,
                    sub_question_id,
                    %side,
                    position,
                    lines,
                    "answer ignored: journal line out of range"
                );
                return;
            }
        }
        self.answers.apply(sub_question_id, update);
    }

    /// Submit for grading. Returns the outcome the first time only.
    pub fn submit(&mut self) -> Option<SessionOutcome> {
        self.finish(FinishReason::Submitted)
    }

    /// Feed one clock event into the session. Expiry grades the session if
    /// nothing else has.
    pub fn handle_clock_event(&mut self, event: ClockEvent) -> Option<SessionOutcome> {
        match event {
            ClockEvent::Tick { remaining } => {
                if self.state == SessionState::InProgress {
                    self.remaining_secs = remaining;
                }
                None
            }
            ClockEvent::Expired => {
                if self.state == SessionState::InProgress {
                    self.remaining_secs = 0;
                }
                self.finish(FinishReason::Expired)
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            remaining_secs: self.remaining_secs,
            progress: self
                .exam
                .questions
                .iter()
                .map(|q| QuestionProgress {
                    question_id: q.id,
                    title: q.title.clone(),
                    status: self.answers.question_status(q),
                })
                .collect(),
        }
    }

    fn finish(&mut self, reason: FinishReason) -> Option<SessionOutcome> {
        if self.state != SessionState::InProgress {
            tracing::debug!(session = %self.id, state = %self.state, ?reason, "finish ignored");
            return None;
        }
        if self
            .finalized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(session = %self.id, ?reason, "already graded");
            return None;
        }

        if let Some(clock) = self.clock.take() {
            clock.cancel();
        }
        self.state = SessionState::Finished;

        let grades = grade_exam(self.grader.as_ref(), &self.exam, &self.answers);
        let score = total_score(&grades);
        let time_spent = self
            .exam
            .time_limit_secs()
            .saturating_sub(self.remaining_secs);

        let result = ExamResult {
            exam_id: self.exam.id,
            date: format_timestamp(Utc::now()),
            score,
            answers: Vec::new(),
            time_spent,
        };

        if let Err(e) = self.store.append_result(&result) {
            tracing::error!(session = %self.id, "failed to save exam result: {e}");
        }

        tracing::info!(
            session = %self.id,
            exam_id = self.exam.id,
            score,
            time_spent,
            ?reason,
            "exam session finished"
        );

        Some(SessionOutcome {
            result,
            grades,
            reason,
        })
    }
}
