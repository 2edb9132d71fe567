//! TOML exam catalog.
//!
//! Loads exams from TOML files and directories, serves them through
//! [`ExamCatalog`], and validates authoring invariants.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{CanonicalAnswer, Exam, ExamSummary, Question, SubQuestionType};
use crate::traits::ExamCatalog;

/// Layout of an exam file: an `[exam]` header followed by `[[questions]]`.
#[derive(Debug, Deserialize)]
struct TomlExamFile {
    exam: TomlExamHeader,
    #[serde(default)]
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    id: u32,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_time_limit")]
    time_limit: u32,
}

fn default_time_limit() -> u32 {
    120
}

/// Parse a single TOML file into an `Exam`.
pub fn parse_exam(path: &Path) -> Result<Exam> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam file: {}", path.display()))?;

    parse_exam_str(&content, path)
}

/// Parse a TOML string into an `Exam` (useful for testing).
pub fn parse_exam_str(content: &str, source_path: &Path) -> Result<Exam> {
    let parsed: TomlExamFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(Exam {
        id: parsed.exam.id,
        title: parsed.exam.title,
        description: parsed.exam.description,
        time_limit: parsed.exam.time_limit,
        questions: parsed.questions,
    })
}

/// Recursively load all `.toml` exam files from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_exam_directory(dir: &Path) -> Result<Vec<Exam>> {
    let mut exams = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            exams.extend(load_exam_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_exam(&path) {
                Ok(exam) => exams.push(exam),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(exams)
}

/// In-memory catalog keyed by exam id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    exams: BTreeMap<u32, Exam>,
}

impl Catalog {
    /// Build a catalog. Later exams with an id already present are dropped.
    pub fn new(exams: impl IntoIterator<Item = Exam>) -> Self {
        let mut by_id = BTreeMap::new();
        for exam in exams {
            if by_id.contains_key(&exam.id) {
                tracing::warn!(exam_id = exam.id, "duplicate exam id, keeping the first");
                continue;
            }
            by_id.insert(exam.id, exam);
        }
        Self { exams: by_id }
    }

    /// Load from a single file or a directory of files.
    pub fn load(path: &Path) -> Result<Self> {
        let exams = if path.is_dir() {
            load_exam_directory(path)?
        } else {
            vec![parse_exam(path)?]
        };
        tracing::debug!(count = exams.len(), path = %path.display(), "catalog loaded");
        Ok(Self::new(exams))
    }

    pub fn len(&self) -> usize {
        self.exams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exams.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exam> {
        self.exams.values()
    }
}

impl ExamCatalog for Catalog {
    fn exam_by_id(&self, id: u32) -> Option<Exam> {
        self.exams.get(&id).cloned()
    }

    fn exams(&self) -> Vec<ExamSummary> {
        self.exams.values().map(ExamSummary::from).collect()
    }
}

/// A warning from exam validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The sub-question ID (if applicable).
    pub sub_question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate an exam against its authoring invariants.
pub fn validate_exam(exam: &Exam) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if exam.time_limit == 0 {
        warnings.push(ValidationWarning {
            sub_question_id: None,
            message: "time_limit is 0; the exam expires as soon as it starts".into(),
        });
    }

    if exam.questions.is_empty() {
        warnings.push(ValidationWarning {
            sub_question_id: None,
            message: "exam has no questions".into(),
        });
    }

    // Check for duplicate sub-question IDs across the whole exam
    let mut seen_ids = HashSet::new();
    for sub in exam.sub_questions() {
        if !seen_ids.insert(&sub.id) {
            warnings.push(ValidationWarning {
                sub_question_id: Some(sub.id.clone()),
                message: format!("duplicate sub-question ID: {}", sub.id),
            });
        }
    }

    // Declared question totals should match their sub-questions
    for question in &exam.questions {
        let sum: u32 = question.sub_questions.iter().map(|s| s.points).sum();
        if sum != question.total_points {
            warnings.push(ValidationWarning {
                sub_question_id: None,
                message: format!(
                    "question {} declares {} points but its sub-questions sum to {}",
                    question.id, question.total_points, sum
                ),
            });
        }
    }

    for sub in exam.sub_questions() {
        let id = Some(sub.id.clone());

        if sub.points == 0 {
            warnings.push(ValidationWarning {
                sub_question_id: id.clone(),
                message: "points must be positive".into(),
            });
        }

        match (sub.kind(), &sub.table_config) {
            (SubQuestionType::Table, None) => warnings.push(ValidationWarning {
                sub_question_id: id.clone(),
                message: "table sub-question has no table_config".into(),
            }),
            (SubQuestionType::Calculation | SubQuestionType::Journal, Some(_)) => {
                warnings.push(ValidationWarning {
                    sub_question_id: id.clone(),
                    message: format!("table_config is ignored for {} sub-questions", sub.kind()),
                })
            }
            _ => {}
        }

        if sub.answer.item_count() == 0 {
            warnings.push(ValidationWarning {
                sub_question_id: id.clone(),
                message: "answer key has no gradable items; this sub-question always scores 0"
                    .into(),
            });
        }

        // Layout keys that the key does not grade are shown but never scored
        if let (CanonicalAnswer::Table { items }, Some(config)) = (&sub.answer, &sub.table_config) {
            for key in config.item_keys() {
                if !items.contains_key(key) {
                    warnings.push(ValidationWarning {
                        sub_question_id: id.clone(),
                        message: format!("table_config item '{key}' has no answer key"),
                    });
                }
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[exam]
id = 6
title = "Mock Exam 6"
description = "Fundamentals"
time_limit = 90

[[questions]]
id = 1
category = "Commercial"
title = "Share issue"
scenario = """
200 shares issued at 100,000 each.
"""
total_points = 13

[[questions.sub_questions]]
id = "1-1"
prompt = "Total amount paid in."
points = 5
explanation = "200 x 100,000"
answer = { type = "calculation", value = 20000000 }

[[questions.sub_questions]]
id = "1-2"
prompt = "Record the issue."
points = 8

[questions.sub_questions.answer]
type = "journal"
debit = [{ account = "Checking account", amount = 20000000 }]
credit = [
    { account = "Share capital", amount = 10000000 },
    { account = "Capital reserve", amount = 10000000 },
]

[[questions]]
id = 2
title = "Balance sheet"
total_points = 10

[[questions.sub_questions]]
id = "2-1"
prompt = "Fill in the balance sheet."
points = 10
answer = { type = "table", items = { Cash = 500, Loans = 200.5 } }
table_config = { left = { title = "Assets", items = ["Cash"] }, right = { title = "Liabilities", items = ["Loans"] } }
"#;

    #[test]
    fn parse_valid_toml() {
        let exam = parse_exam_str(VALID_TOML, &PathBuf::from("exam6.toml")).unwrap();
        assert_eq!(exam.id, 6);
        assert_eq!(exam.time_limit, 90);
        assert_eq!(exam.questions.len(), 2);
        assert_eq!(exam.max_score(), 23);

        let journal = exam.sub_question("1-2").unwrap();
        assert_eq!(journal.kind(), SubQuestionType::Journal);
        assert_eq!(journal.answer.item_count(), 3);

        let table = exam.sub_question("2-1").unwrap();
        let CanonicalAnswer::Table { items } = &table.answer else {
            panic!("expected table key");
        };
        assert_eq!(items.get("Loans"), Some(&200.5));
        assert_eq!(
            table.table_config.as_ref().unwrap().item_keys(),
            vec!["Cash", "Loans"]
        );

        assert!(validate_exam(&exam).is_empty());
    }

    #[test]
    fn parse_missing_optional_fields() {
        let toml = r#"
[exam]
id = 1
title = "Minimal"
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(exam.time_limit, 120);
        assert!(exam.questions.is_empty());
        assert!(exam.description.is_empty());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_exam_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn parse_unknown_answer_type() {
        let toml = r#"
[exam]
id = 1
title = "Bad"

[[questions]]
id = 1
title = "Q"
total_points = 1

[[questions.sub_questions]]
id = "1-1"
prompt = "?"
points = 1
answer = { type = "essay", value = 1 }
"#;
        assert!(parse_exam_str(toml, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_reports_authoring_problems() {
        let toml = r#"
[exam]
id = 1
title = "Problems"
time_limit = 0

[[questions]]
id = 1
title = "Q"
total_points = 20

[[questions.sub_questions]]
id = "1-1"
prompt = "table without layout"
points = 5
answer = { type = "table", items = {} }

[[questions.sub_questions]]
id = "1-1"
prompt = "duplicate id with layout"
points = 0
answer = { type = "calculation", value = 1 }
table_config = { items = ["A"] }
"#;
        let exam = parse_exam_str(toml, &PathBuf::from("problems.toml")).unwrap();
        let messages: Vec<String> = validate_exam(&exam).into_iter().map(|w| w.message).collect();
        let has = |needle: &str| messages.iter().any(|m| m.contains(needle));

        assert!(has("time_limit is 0"));
        assert!(has("duplicate sub-question ID"));
        assert!(has("sum to 5"));
        assert!(has("no table_config"));
        assert!(has("table_config is ignored"));
        assert!(has("points must be positive"));
        assert!(has("no gradable items"));
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("exam6.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "[exam").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let exams = load_exam_directory(dir.path()).unwrap();
        assert_eq!(exams.len(), 1);
        assert_eq!(exams[0].id, 6);
    }

    #[test]
    fn catalog_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("exam6.toml"), VALID_TOML).unwrap();

        let catalog = Catalog::load(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.exam_by_id(6).is_some());
        assert!(catalog.exam_by_id(7).is_none());

        let listing = catalog.exams();
        assert_eq!(listing[0].title, "Mock Exam 6");
        assert_eq!(listing[0].max_score, 23);
    }

    #[test]
    fn catalog_keeps_first_duplicate() {
        let exam = parse_exam_str(VALID_TOML, &PathBuf::from("a.toml")).unwrap();
        let mut other = exam.clone();
        other.title = "Shadowed".into();

        let catalog = Catalog::new(vec![exam, other]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.exam_by_id(6).unwrap().title, "Mock Exam 6");
    }
}
