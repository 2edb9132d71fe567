//! Core data model types for ledgerexam.
//!
//! Exams, questions and sub-questions are authored externally and are
//! read-only for the lifetime of the process.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A complete timed exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    /// Unique identifier for this exam.
    pub id: u32,
    /// Human-readable title.
    pub title: String,
    /// Short description shown in listings.
    #[serde(default)]
    pub description: String,
    /// Time limit in minutes.
    pub time_limit: u32,
    /// The questions in presentation order.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Exam {
    /// Time limit converted to seconds.
    pub fn time_limit_secs(&self) -> u64 {
        u64::from(self.time_limit) * 60
    }

    /// All sub-questions in presentation order.
    pub fn sub_questions(&self) -> impl Iterator<Item = &SubQuestion> {
        self.questions.iter().flat_map(|q| q.sub_questions.iter())
    }

    /// Look up a sub-question by its exam-unique id.
    pub fn sub_question(&self, id: &str) -> Option<&SubQuestion> {
        self.sub_questions().find(|s| s.id == id)
    }

    /// Sum of all sub-question points.
    pub fn max_score(&self) -> u32 {
        self.sub_questions().map(|s| s.points).sum()
    }
}

/// A numbered question grouping related sub-questions under one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    /// Category label (e.g. "Commercial bookkeeping").
    #[serde(default)]
    pub category: String,
    pub title: String,
    /// Scenario text the sub-questions refer to.
    #[serde(default)]
    pub scenario: String,
    /// Declared point total. Should equal the sum of sub-question points.
    pub total_points: u32,
    #[serde(default)]
    pub sub_questions: Vec<SubQuestion>,
}

/// The smallest gradable unit of an exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuestion {
    /// Identifier, unique within the exam (e.g. "1-2").
    pub id: String,
    /// Prompt text.
    pub prompt: String,
    /// Canonical answer. Its tag is the sub-question type.
    pub answer: CanonicalAnswer,
    /// Points available.
    pub points: u32,
    #[serde(default)]
    pub explanation: String,
    /// Layout for table sub-questions. Never used for scoring.
    #[serde(default)]
    pub table_config: Option<TableConfig>,
}

impl SubQuestion {
    pub fn kind(&self) -> SubQuestionType {
        self.answer.kind()
    }
}

/// The three answer shapes an exam can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubQuestionType {
    Calculation,
    Table,
    Journal,
}

impl fmt::Display for SubQuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubQuestionType::Calculation => write!(f, "calculation"),
            SubQuestionType::Table => write!(f, "table"),
            SubQuestionType::Journal => write!(f, "journal"),
        }
    }
}

impl FromStr for SubQuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "calculation" | "calc" => Ok(SubQuestionType::Calculation),
            "table" => Ok(SubQuestionType::Table),
            "journal" => Ok(SubQuestionType::Journal),
            other => Err(format!("unknown sub-question type: {other}")),
        }
    }
}

/// Canonical answer key, tagged by sub-question type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CanonicalAnswer {
    /// A single expected number.
    Calculation { value: f64 },
    /// Labelled numeric fields, each graded independently.
    Table { items: BTreeMap<String, f64> },
    /// Double-entry journal, graded position by position on each side.
    Journal {
        #[serde(default)]
        debit: Vec<JournalEntry>,
        #[serde(default)]
        credit: Vec<JournalEntry>,
    },
}

impl CanonicalAnswer {
    pub fn kind(&self) -> SubQuestionType {
        match self {
            CanonicalAnswer::Calculation { .. } => SubQuestionType::Calculation,
            CanonicalAnswer::Table { .. } => SubQuestionType::Table,
            CanonicalAnswer::Journal { .. } => SubQuestionType::Journal,
        }
    }

    /// Number of independently gradable items in this key.
    pub fn item_count(&self) -> usize {
        match self {
            CanonicalAnswer::Calculation { .. } => 1,
            CanonicalAnswer::Table { items } => items.len(),
            CanonicalAnswer::Journal { debit, credit } => debit.len() + credit.len(),
        }
    }
}

/// One line of a journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub account: String,
    pub amount: f64,
}

/// Layout of a table sub-question: either one flat list of item keys or a
/// two-column left/right layout (e.g. assets vs. liabilities).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableConfig {
    Sections {
        left: TableSection,
        right: TableSection,
    },
    Flat {
        items: Vec<String>,
    },
}

impl TableConfig {
    /// Every item key referenced by the layout, left before right.
    pub fn item_keys(&self) -> Vec<&str> {
        match self {
            TableConfig::Flat { items } => items.iter().map(String::as_str).collect(),
            TableConfig::Sections { left, right } => left
                .items
                .iter()
                .chain(right.items.iter())
                .map(String::as_str)
                .collect(),
        }
    }
}

/// A titled column of a sectioned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Brief listing entry for an exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSummary {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub time_limit: u32,
    pub question_count: usize,
    pub max_score: u32,
}

impl From<&Exam> for ExamSummary {
    fn from(exam: &Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title.clone(),
            description: exam.description.clone(),
            time_limit: exam.time_limit,
            question_count: exam.questions.len(),
            max_score: exam.max_score(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_exam() -> Exam {
        Exam {
            id: 6,
            title: "Mock Exam 6".into(),
            description: String::new(),
            time_limit: 90,
            questions: vec![Question {
                id: 1,
                category: "Commercial".into(),
                title: "Share issue".into(),
                scenario: String::new(),
                total_points: 13,
                sub_questions: vec![
                    SubQuestion {
                        id: "1-1".into(),
                        prompt: "Total paid in".into(),
                        answer: CanonicalAnswer::Calculation { value: 20_000_000.0 },
                        points: 5,
                        explanation: String::new(),
                        table_config: None,
                    },
                    SubQuestion {
                        id: "1-2".into(),
                        prompt: "Journal".into(),
                        answer: CanonicalAnswer::Journal {
                            debit: vec![JournalEntry {
                                account: "Cash".into(),
                                amount: 500.0,
                            }],
                            credit: vec![],
                        },
                        points: 8,
                        explanation: String::new(),
                        table_config: None,
                    },
                ],
            }],
        }
    }

    #[test]
    fn sub_question_type_display_and_parse() {
        assert_eq!(SubQuestionType::Journal.to_string(), "journal");
        assert_eq!(
            "Calculation".parse::<SubQuestionType>().unwrap(),
            SubQuestionType::Calculation
        );
        assert_eq!(
            "calc".parse::<SubQuestionType>().unwrap(),
            SubQuestionType::Calculation
        );
        assert!("essay".parse::<SubQuestionType>().is_err());
    }

    #[test]
    fn exam_lookup_and_totals() {
        let exam = sample_exam();
        assert_eq!(exam.time_limit_secs(), 5400);
        assert_eq!(exam.max_score(), 13);
        assert_eq!(exam.sub_question("1-2").unwrap().kind(), SubQuestionType::Journal);
        assert!(exam.sub_question("9-9").is_none());
    }

    #[test]
    fn canonical_answer_tagged_json() {
        let json = r#"{"type":"table","items":{"Cash":100,"Sales":200.5}}"#;
        let answer: CanonicalAnswer = serde_json::from_str(json).unwrap();
        assert_eq!(answer.kind(), SubQuestionType::Table);
        assert_eq!(answer.item_count(), 2);
    }

    #[test]
    fn table_config_variants() {
        let flat: TableConfig = serde_json::from_str(r#"{"items":["A","B"]}"#).unwrap();
        assert_eq!(flat.item_keys(), vec!["A", "B"]);

        let sections: TableConfig = serde_json::from_str(
            r#"{"left":{"title":"Assets","items":["Cash"]},"right":{"title":"Liabilities","items":["Loans"]}}"#,
        )
        .unwrap();
        assert!(matches!(sections, TableConfig::Sections { .. }));
        assert_eq!(sections.item_keys(), vec!["Cash", "Loans"]);
    }

    #[test]
    fn exam_serde_roundtrip() {
        let exam = sample_exam();
        let json = serde_json::to_string(&exam).unwrap();
        let back: Exam = serde_json::from_str(&json).unwrap();
        assert_eq!(back, exam);
    }

    #[test]
    fn summary_from_exam() {
        let summary = ExamSummary::from(&sample_exam());
        assert_eq!(summary.question_count, 1);
        assert_eq!(summary.max_score, 13);
    }
}
