pub mod grade;
pub mod history;
pub mod init;
pub mod list;
pub mod take;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use ledgerexam_core::catalog::Catalog;
use ledgerexam_core::config::LedgerExamConfig;
use ledgerexam_core::model::Exam;
use ledgerexam_core::results::{FinishReason, SessionOutcome};

/// The catalog path given on the command line, or the configured one.
pub fn catalog_path(config: &LedgerExamConfig, catalog: Option<PathBuf>) -> PathBuf {
    catalog.unwrap_or_else(|| config.catalog_dir.clone())
}

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    Catalog::load(path).with_context(|| format!("failed to load exams from {}", path.display()))
}

/// Format seconds as `Xm Ys`.
pub fn format_duration(secs: u64) -> String {
    format!("{}m {}s", secs / 60, secs % 60)
}

/// Print a per-sub-question breakdown and the final score.
pub fn print_outcome(exam: &Exam, outcome: &SessionOutcome, passing_score: u32) {
    let mut table = Table::new();
    table.set_header(vec!["Sub-question", "Type", "Items", "Points"]);

    for grade in &outcome.grades {
        let kind = exam
            .sub_question(&grade.sub_question_id)
            .map(|s| s.kind().to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&grade.sub_question_id),
            Cell::new(kind),
            Cell::new(format!("{}/{}", grade.correct, grade.total)),
            Cell::new(format!("{}/{}", grade.points_awarded, grade.points_possible)),
        ]);
    }

    println!("\n{table}");

    let verdict = if outcome.result.passed(passing_score) {
        "PASS"
    } else {
        "FAIL"
    };
    if outcome.reason == FinishReason::Expired {
        println!("Time is up.");
    }
    println!(
        "Score: {} / {} ({verdict}, pass mark {passing_score})",
        outcome.result.score,
        exam.max_score()
    );
    println!("Time spent: {}", format_duration(outcome.result.time_spent));
}
