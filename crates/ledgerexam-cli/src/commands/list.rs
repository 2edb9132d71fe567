//! The `ledgerexam list` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use ledgerexam_core::config::load_config_from;
use ledgerexam_core::traits::ExamCatalog;

pub fn execute(
    config_path: Option<PathBuf>,
    catalog: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let path = super::catalog_path(&config, catalog);
    let catalog = super::load_catalog(&path)?;
    let exams = catalog.exams();

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&exams)?),
        "text" => {
            if exams.is_empty() {
                println!("No exams found in {}", path.display());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec!["ID", "Title", "Questions", "Time limit", "Points"]);
            for exam in &exams {
                table.add_row(vec![
                    Cell::new(exam.id),
                    Cell::new(&exam.title),
                    Cell::new(exam.question_count),
                    Cell::new(format!("{} min", exam.time_limit)),
                    Cell::new(exam.max_score),
                ]);
            }
            println!("{table}");
        }
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }

    Ok(())
}
