//! The `ledgerexam history` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use ledgerexam_core::config::load_config_from;
use ledgerexam_core::results::sort_newest_first;
use ledgerexam_core::store::JsonFileResultStore;
use ledgerexam_core::traits::ResultStore;

pub fn execute(
    config_path: Option<PathBuf>,
    file: Option<PathBuf>,
    limit: Option<usize>,
    clear: bool,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let path = file.unwrap_or_else(|| config.history_file.clone());
    let store = JsonFileResultStore::new(&path);

    if clear {
        store
            .clear()
            .with_context(|| format!("failed to clear history: {}", path.display()))?;
        println!("History cleared.");
        return Ok(());
    }

    let mut results = store
        .list_results()
        .with_context(|| format!("failed to read history: {}", path.display()))?;

    if results.is_empty() {
        println!("No results yet.");
        return Ok(());
    }

    sort_newest_first(&mut results);

    let attempts = results.len();
    let passed = results
        .iter()
        .filter(|r| r.passed(config.passing_score))
        .count();
    let best = results.iter().map(|r| r.score).max().unwrap_or(0);
    let average = results.iter().map(|r| f64::from(r.score)).sum::<f64>() / attempts as f64;

    let mut table = Table::new();
    table.set_header(vec!["Date", "Exam", "Score", "Result", "Time"]);

    for result in results.iter().take(limit.unwrap_or(usize::MAX)) {
        let date = result
            .timestamp()
            .map(|t| {
                t.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            })
            .unwrap_or_else(|| result.date.clone());
        let verdict = if result.passed(config.passing_score) {
            "PASS"
        } else {
            "FAIL"
        };
        table.add_row(vec![
            Cell::new(date),
            Cell::new(result.exam_id),
            Cell::new(result.score),
            Cell::new(verdict),
            Cell::new(super::format_duration(result.time_spent)),
        ]);
    }

    println!("{table}");
    println!("{attempts} attempt(s), {passed} passed, best {best}, average {average:.1}");

    Ok(())
}
