//! The `ledgerexam grade` command.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use ledgerexam_core::answers::{AnswerUpdate, SubmittedAnswer};
use ledgerexam_core::config::load_config_from;
use ledgerexam_core::engine::{run_session, NoopObserver, SessionCommand};
use ledgerexam_core::session::ExamSession;
use ledgerexam_core::store::{JsonFileResultStore, MemoryResultStore};
use ledgerexam_core::traits::ResultStore;

/// Read an answer file: a JSON object mapping sub-question ids to answers.
pub fn load_answers(path: &Path) -> Result<BTreeMap<String, SubmittedAnswer>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answers: {}", path.display()))
}

pub async fn execute(
    config_path: Option<PathBuf>,
    catalog: Option<PathBuf>,
    exam_id: u32,
    answers_path: PathBuf,
    format: String,
    save: bool,
) -> Result<()> {
    anyhow::ensure!(
        matches!(format.as_str(), "text" | "json"),
        "unknown format: {format} (expected text or json)"
    );

    let config = load_config_from(config_path.as_deref())?;
    let catalog = super::load_catalog(&super::catalog_path(&config, catalog))?;
    let answers = load_answers(&answers_path)?;

    let store: Arc<dyn ResultStore> = if save {
        Arc::new(JsonFileResultStore::new(&config.history_file))
    } else {
        Arc::new(MemoryResultStore::new())
    };
    let mut session = ExamSession::from_catalog(&catalog, exam_id, store)
        .with_context(|| format!("exam {exam_id} not found"))?;

    let (tx, rx) = mpsc::unbounded_channel();
    for (sub_question_id, answer) in answers {
        if session.exam().sub_question(&sub_question_id).is_none() {
            tracing::warn!(
                sub_question_id = %sub_question_id,
                "answer for unknown sub-question ignored"
            );
        }
        tx.send(SessionCommand::Record {
            sub_question_id,
            update: AnswerUpdate::Replace(answer),
        })?;
    }
    tx.send(SessionCommand::Submit)?;

    let outcome = run_session(&mut session, rx, &NoopObserver).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        super::print_outcome(session.exam(), &outcome, config.passing_score);
    }

    if save {
        eprintln!("Result saved to: {}", config.history_file.display());
    }

    Ok(())
}
