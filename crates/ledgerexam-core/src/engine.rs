//! Session driver.
//!
//! [`run_session`] merges user commands and clock events into one stream and
//! feeds them to an [`ExamSession`] in arrival order until it finishes.

use tokio::sync::{mpsc, oneshot};

use crate::answers::AnswerUpdate;
use crate::clock::ClockEvent;
use crate::error::SessionError;
use crate::model::Exam;
use crate::results::SessionOutcome;
use crate::session::{ExamSession, SessionSnapshot};

/// A request from the user side of a running session.
#[derive(Debug)]
pub enum SessionCommand {
    /// Apply an answer update to one sub-question.
    Record {
        sub_question_id: String,
        update: AnswerUpdate,
    },
    /// Submit for grading.
    Submit,
    /// Reply with the current progress.
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

/// Progress reporting trait.
pub trait SessionObserver: Send + Sync {
    fn on_start(&self, exam: &Exam, remaining_secs: u64);
    fn on_tick(&self, remaining_secs: u64);
    fn on_finished(&self, outcome: &SessionOutcome);
}

/// No-op observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_start(&self, _: &Exam, _: u64) {}
    fn on_tick(&self, _: u64) {}
    fn on_finished(&self, _: &SessionOutcome) {}
}

/// Start `session` and drive it to completion.
///
/// Clock events are taken before commands when both are ready. The session
/// is submitted when the command channel closes, and also if the clock stops
/// without expiring.
pub async fn run_session(
    session: &mut ExamSession,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    observer: &dyn SessionObserver,
) -> Result<SessionOutcome, SessionError> {
    let mut events = session.start()?;
    observer.on_start(session.exam(), session.remaining_secs());

    let outcome = loop {
        tokio::select! {
            biased;

            event = events.recv() => match event {
                Some(event) => {
                    if let ClockEvent::Tick { remaining } = event {
                        observer.on_tick(remaining);
                    }
                    if let Some(outcome) = session.handle_clock_event(event) {
                        break Some(outcome);
                    }
                }
                None => {
                    tracing::warn!(session = %session.id(), "clock stopped early, submitting");
                    break session.submit();
                }
            },

            command = commands.recv() => match command {
                Some(SessionCommand::Record { sub_question_id, update }) => {
                    session.record_answer(&sub_question_id, update);
                }
                Some(SessionCommand::Snapshot(reply)) => {
                    let _ = reply.send(session.snapshot());
                }
                Some(SessionCommand::Submit) => break session.submit(),
                None => {
                    tracing::debug!(session = %session.id(), "command channel closed, submitting");
                    break session.submit();
                }
            },
        }
    };

    let outcome = outcome.ok_or(SessionError::AlreadyFinished)?;
    observer.on_finished(&outcome);
    Ok(outcome)
}
