//! The `ledgerexam validate` command.

use std::path::PathBuf;

use anyhow::Result;

use ledgerexam_core::catalog::{load_exam_directory, parse_exam, validate_exam};
use ledgerexam_core::config::load_config_from;

pub fn execute(config_path: Option<PathBuf>, catalog: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let path = super::catalog_path(&config, catalog);

    let exams = if path.is_dir() {
        load_exam_directory(&path)?
    } else {
        vec![parse_exam(&path)?]
    };

    let mut total_warnings = 0;

    for exam in &exams {
        println!(
            "Exam {}: {} ({} questions, {} points)",
            exam.id,
            exam.title,
            exam.questions.len(),
            exam.max_score()
        );

        let warnings = validate_exam(exam);
        for w in &warnings {
            let prefix = w
                .sub_question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All exams valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
