//! The `ledgerexam take` command.
//!
//! Reads answer commands from stdin on a dedicated thread and feeds them to
//! the session driver while the clock runs. End of input submits.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use tokio::sync::{mpsc, oneshot};

use ledgerexam_core::answers::{AnswerUpdate, JournalField, LedgerSide};
use ledgerexam_core::clock::{format_hms, TimeAlert};
use ledgerexam_core::config::load_config_from;
use ledgerexam_core::engine::{run_session, SessionCommand, SessionObserver};
use ledgerexam_core::model::{Exam, SubQuestionType};
use ledgerexam_core::numeric::normalize_input;
use ledgerexam_core::results::SessionOutcome;
use ledgerexam_core::session::{ExamSession, SessionSnapshot};
use ledgerexam_core::store::JsonFileResultStore;
use ledgerexam_core::traits::ResultStore;

/// Console session observer. Announces each change of time alert level.
#[derive(Default)]
struct ConsoleObserver {
    alert: Mutex<Option<TimeAlert>>,
}

impl SessionObserver for ConsoleObserver {
    fn on_start(&self, exam: &Exam, remaining_secs: u64) {
        println!("Exam {}: {}", exam.id, exam.title);
        if !exam.description.is_empty() {
            println!("{}", exam.description);
        }
        println!(
            "{} questions, {} points, time limit {}",
            exam.questions.len(),
            exam.max_score(),
            format_hms(remaining_secs)
        );
        println!("Type 'help' for commands, 'show' to see the questions.\n");
        if let Ok(mut last) = self.alert.lock() {
            *last = Some(TimeAlert::for_remaining(remaining_secs));
        }
    }

    fn on_tick(&self, remaining_secs: u64) {
        let alert = TimeAlert::for_remaining(remaining_secs);
        let Ok(mut last) = self.alert.lock() else {
            return;
        };
        if *last == Some(alert) {
            return;
        }
        *last = Some(alert);

        let message = match alert {
            TimeAlert::Normal => return,
            TimeAlert::Notice => "10 minutes left",
            TimeAlert::Warning => "5 minutes left",
            TimeAlert::Critical => "1 minute left!",
        };
        eprintln!("[{}] {message}", format_hms(remaining_secs));
    }

    fn on_finished(&self, outcome: &SessionOutcome) {
        tracing::debug!(score = outcome.result.score, "take finished");
    }
}

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Record {
        sub_question_id: String,
        updates: Vec<AnswerUpdate>,
    },
    Status,
    Show(Option<u32>),
    Submit,
    Help,
    Empty,
}

/// The sub-question type an update writes to.
fn target_kind(update: &AnswerUpdate) -> Option<SubQuestionType> {
    match update {
        AnswerUpdate::Value(_) => Some(SubQuestionType::Calculation),
        AnswerUpdate::TableItem { .. } => Some(SubQuestionType::Table),
        AnswerUpdate::JournalField { .. } => Some(SubQuestionType::Journal),
        AnswerUpdate::Replace(_) => None,
    }
}

const HELP: &str = "\
Commands:
  answer <id> <value>                          answer a calculation
  table <id> <item> <value>                    fill one table item
  debit|credit <id> <line> <account> <amount>  fill one journal line (lines start at 1)
  show [question]                              print questions
  status                                       remaining time and progress
  submit                                       finish and grade
  help                                         this text";

/// Parse one line of the interactive grammar.
pub fn parse_line(line: &str) -> Result<Input, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = tokens.split_first() else {
        return Ok(Input::Empty);
    };

    match verb.to_lowercase().as_str() {
        "answer" | "a" => {
            let [id, value] = args else {
                return Err("usage: answer <id> <value>".into());
            };
            Ok(Input::Record {
                sub_question_id: id.to_string(),
                updates: vec![AnswerUpdate::Value(normalize_input(value))],
            })
        }
        "table" | "t" => {
            let [id, key @ .., value] = args else {
                return Err("usage: table <id> <item> <value>".into());
            };
            if key.is_empty() {
                return Err("usage: table <id> <item> <value>".into());
            }
            Ok(Input::Record {
                sub_question_id: id.to_string(),
                updates: vec![AnswerUpdate::TableItem {
                    key: key.join(" "),
                    value: normalize_input(value),
                }],
            })
        }
        "debit" | "credit" | "dr" | "cr" => {
            let side: LedgerSide = verb.parse()?;
            let [id, line, account @ .., amount] = args else {
                return Err(format!("usage: {side} <id> <line> <account> <amount>"));
            };
            if account.is_empty() {
                return Err(format!("usage: {side} <id> <line> <account> <amount>"));
            }
            let position = line
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .ok_or_else(|| format!("line must be a number starting at 1, got '{line}'"))?;
            Ok(Input::Record {
                sub_question_id: id.to_string(),
                updates: vec![
                    AnswerUpdate::JournalField {
                        side,
                        position,
                        field: JournalField::Account(account.join(" ")),
                    },
                    AnswerUpdate::JournalField {
                        side,
                        position,
                        field: JournalField::Amount(normalize_input(amount)),
                    },
                ],
            })
        }
        "show" => match args {
            [] => Ok(Input::Show(None)),
            [id] => id
                .parse()
                .map(|id| Input::Show(Some(id)))
                .map_err(|_| format!("not a question number: {id}")),
            _ => Err("usage: show [question]".into()),
        },
        "status" => Ok(Input::Status),
        "submit" => Ok(Input::Submit),
        "help" | "?" => Ok(Input::Help),
        other => Err(format!("unknown command: {other} (type 'help')")),
    }
}

fn show_questions(exam: &Exam, only: Option<u32>) {
    let questions = exam
        .questions
        .iter()
        .filter(|q| only.map_or(true, |id| q.id == id));

    for question in questions {
        println!(
            "\nQuestion {}: {} ({} points)",
            question.id, question.title, question.total_points
        );
        if !question.category.is_empty() {
            println!("  [{}]", question.category);
        }
        for line in question.scenario.lines() {
            println!("  {line}");
        }
        for sub in &question.sub_questions {
            println!("  ({}) [{}, {} pts] {}", sub.id, sub.kind(), sub.points, sub.prompt);
            if let Some(config) = &sub.table_config {
                println!("      items: {}", config.item_keys().join(", "));
            }
        }
    }
}

fn print_status(snapshot: &SessionSnapshot) {
    let mut table = Table::new();
    table.set_header(vec!["Question", "Title", "Status"]);
    for progress in &snapshot.progress {
        table.add_row(vec![
            Cell::new(progress.question_id),
            Cell::new(&progress.title),
            Cell::new(progress.status),
        ]);
    }
    println!("Remaining: {}", format_hms(snapshot.remaining_secs));
    println!("{table}");
}

/// Read stdin on a plain thread so a blocked read never holds up shutdown.
fn spawn_input(exam: Exam, tx: mpsc::UnboundedSender<SessionCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let input = match parse_line(&line) {
                Ok(input) => input,
                Err(msg) => {
                    eprintln!("{msg}");
                    continue;
                }
            };

            match input {
                Input::Empty => {}
                Input::Help => println!("{HELP}"),
                Input::Show(only) => show_questions(&exam, only),
                Input::Status => {
                    let (reply_tx, reply_rx) = oneshot::channel();
                    if tx.send(SessionCommand::Snapshot(reply_tx)).is_err() {
                        break;
                    }
                    match reply_rx.blocking_recv() {
                        Ok(snapshot) => print_status(&snapshot),
                        Err(_) => break,
                    }
                }
                Input::Submit => {
                    let _ = tx.send(SessionCommand::Submit);
                    break;
                }
                Input::Record {
                    sub_question_id,
                    updates,
                } => {
                    let kind = updates.first().and_then(target_kind);
                    let Some(sub) = exam.sub_question(&sub_question_id) else {
                        eprintln!("no sub-question '{sub_question_id}'");
                        continue;
                    };
                    if kind.is_some_and(|k| k != sub.kind()) {
                        eprintln!("({sub_question_id}) is a {} sub-question", sub.kind());
                        continue;
                    }
                    if let Some(AnswerUpdate::JournalField { side, position, .. }) = updates.first()
                    {
                        let lines = side.lines_in(&sub.answer);
                        if *position >= lines {
                            eprintln!("({sub_question_id}) has {lines} {side} line(s)");
                            continue;
                        }
                    }
                    for update in updates {
                        let command = SessionCommand::Record {
                            sub_question_id: sub_question_id.clone(),
                            update,
                        };
                        if tx.send(command).is_err() {
                            return;
                        }
                    }
                }
            }
        }
    });
}

pub async fn execute(
    config_path: Option<PathBuf>,
    catalog: Option<PathBuf>,
    exam_id: u32,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog = super::load_catalog(&super::catalog_path(&config, catalog))?;
    let store: Arc<dyn ResultStore> = Arc::new(JsonFileResultStore::new(&config.history_file));

    let mut session = ExamSession::from_catalog(&catalog, exam_id, store)
        .with_context(|| format!("exam {exam_id} not found"))?;

    let (tx, rx) = mpsc::unbounded_channel();
    spawn_input(session.exam().clone(), tx);

    let observer = ConsoleObserver::default();
    let outcome = run_session(&mut session, rx, &observer).await?;

    super::print_outcome(session.exam(), &outcome, config.passing_score);
    eprintln!("Result saved to: {}", config.history_file.display());

    Ok(())
}
