//! The `ledgerexam init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create ledgerexam.toml
    if std::path::Path::new("ledgerexam.toml").exists() {
        println!("ledgerexam.toml already exists, skipping.");
    } else {
        std::fs::write("ledgerexam.toml", SAMPLE_CONFIG)?;
        println!("Created ledgerexam.toml");
    }

    // Create a sample exam
    std::fs::create_dir_all("exams")?;
    let example_path = std::path::Path::new("exams/sample.toml");
    if example_path.exists() {
        println!("exams/sample.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, SAMPLE_EXAM)?;
        println!("Created exams/sample.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: ledgerexam validate");
    println!("  2. Run: ledgerexam list");
    println!("  3. Run: ledgerexam take --exam 1");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# ledgerexam configuration

catalog_dir = "./exams"
history_file = "./ledgerexam-history.json"
passing_score = 70
"#;

const SAMPLE_EXAM: &str = r#"[exam]
id = 1
title = "Sample Exam"
description = "One question of each answer type"
time_limit = 15

[[questions]]
id = 1
category = "Basics"
title = "Cash sale"
scenario = """
The owner opened the business with 100,000 in cash.
Goods were then sold for 50,000, paid in cash.
"""
total_points = 30

[[questions.sub_questions]]
id = "1-1"
prompt = "How much cash was received?"
points = 10
explanation = "The whole sale price was paid in cash."
answer = { type = "calculation", value = 50000 }

[[questions.sub_questions]]
id = "1-2"
prompt = "Record the sale."
points = 10
explanation = "Cash increases on the debit side, sales on the credit side."

[questions.sub_questions.answer]
type = "journal"
debit = [{ account = "Cash", amount = 50000 }]
credit = [{ account = "Sales", amount = 50000 }]

[[questions.sub_questions]]
id = "1-3"
prompt = "Fill in the closing balances."
points = 10

[questions.sub_questions.answer]
type = "table"
items = { Cash = 150000, Capital = 100000, Sales = 50000 }

[questions.sub_questions.table_config]
left = { title = "Debit", items = ["Cash"] }
right = { title = "Credit", items = ["Capital", "Sales"] }
"#;
