//! Submitted answers and the per-session answer store.
//!
//! Submitted answers mirror the canonical answer shapes, but every numeric
//! field is kept as the raw text the candidate typed. Parsing happens only
//! at grading time, so a blank or garbled field is simply an incorrect item.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{CanonicalAnswer, Question};

/// Journal positions at or past this are never stored.
pub const MAX_JOURNAL_LINES: usize = 64;

/// A candidate's answer to one sub-question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SubmittedAnswer {
    Calculation {
        #[serde(default)]
        value: String,
    },
    Table {
        #[serde(default)]
        items: BTreeMap<String, String>,
    },
    Journal {
        #[serde(default)]
        debit: Vec<SubmittedEntry>,
        #[serde(default)]
        credit: Vec<SubmittedEntry>,
    },
}

impl SubmittedAnswer {
    /// `true` when nothing has been typed into any field.
    pub fn is_blank(&self) -> bool {
        match self {
            SubmittedAnswer::Calculation { value } => value.trim().is_empty(),
            SubmittedAnswer::Table { items } => items.values().all(|v| v.trim().is_empty()),
            SubmittedAnswer::Journal { debit, credit } => {
                debit.iter().chain(credit.iter()).all(SubmittedEntry::is_blank)
            }
        }
    }
}

/// One line of a submitted journal entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmittedEntry {
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub amount: String,
}

impl SubmittedEntry {
    pub fn is_blank(&self) -> bool {
        self.account.trim().is_empty() && self.amount.trim().is_empty()
    }
}

/// Debit or credit side of a journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerSide {
    Debit,
    Credit,
}

impl fmt::Display for LedgerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerSide::Debit => write!(f, "debit"),
            LedgerSide::Credit => write!(f, "credit"),
        }
    }
}

impl FromStr for LedgerSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" | "dr" => Ok(LedgerSide::Debit),
            "credit" | "cr" => Ok(LedgerSide::Credit),
            other => Err(format!("unknown ledger side: {other}")),
        }
    }
}

impl LedgerSide {
    /// Number of key lines on this side, or 0 when the key is not a journal.
    pub fn lines_in(self, answer: &CanonicalAnswer) -> usize {
        match (self, answer) {
            (LedgerSide::Debit, CanonicalAnswer::Journal { debit, .. }) => debit.len(),
            (LedgerSide::Credit, CanonicalAnswer::Journal { credit, .. }) => credit.len(),
            _ => 0,
        }
    }
}

/// A single field of a journal line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalField {
    Account(String),
    Amount(String),
}

/// One mutation of the answer store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerUpdate {
    /// Overwrite a calculation answer.
    Value(String),
    /// Set one key of a table answer, keeping the other keys.
    TableItem { key: String, value: String },
    /// Set one field of one journal line, keeping everything else.
    JournalField {
        side: LedgerSide,
        position: usize,
        field: JournalField,
    },
    /// Replace the whole answer.
    Replace(SubmittedAnswer),
}

/// Answer status of a question, derived from its sub-questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Unanswered,
    Partial,
    Completed,
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionStatus::Unanswered => write!(f, "unanswered"),
            QuestionStatus::Partial => write!(f, "partial"),
            QuestionStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Keyed mapping from sub-question id to the candidate's answer.
///
/// Supports insert and update only. An update of a different shape than the
/// stored answer replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerStore {
    entries: BTreeMap<String, SubmittedAnswer>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, sub_question_id: &str) -> Option<&SubmittedAnswer> {
        self.entries.get(sub_question_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SubmittedAnswer)> {
        self.entries.iter()
    }

    /// Apply one update to the entry for `sub_question_id`.
    pub fn apply(&mut self, sub_question_id: &str, update: AnswerUpdate) {
        match update {
            AnswerUpdate::Value(value) => self.set_value(sub_question_id, value),
            AnswerUpdate::TableItem { key, value } => {
                self.set_table_item(sub_question_id, key, value)
            }
            AnswerUpdate::JournalField {
                side,
                position,
                field,
            } => self.set_journal_field(sub_question_id, side, position, field),
            AnswerUpdate::Replace(answer) => {
                self.entries.insert(sub_question_id.to_string(), answer);
            }
        }
    }

    pub fn set_value(&mut self, sub_question_id: &str, value: impl Into<String>) {
        self.entries.insert(
            sub_question_id.to_string(),
            SubmittedAnswer::Calculation {
                value: value.into(),
            },
        );
    }

    pub fn set_table_item(
        &mut self,
        sub_question_id: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        let entry = self
            .entries
            .entry(sub_question_id.to_string())
            .or_insert_with(|| SubmittedAnswer::Table {
                items: BTreeMap::new(),
            });
        if !matches!(entry, SubmittedAnswer::Table { .. }) {
            *entry = SubmittedAnswer::Table {
                items: BTreeMap::new(),
            };
        }
        if let SubmittedAnswer::Table { items } = entry {
            items.insert(key.into(), value.into());
        }
    }

    /// Set one field of the journal line at `position` on `side`.
    ///
    /// Missing lines before `position` are padded with blank entries.
    /// Positions at or past [`MAX_JOURNAL_LINES`] are dropped.
    pub fn set_journal_field(
        &mut self,
        sub_question_id: &str,
        side: LedgerSide,
        position: usize,
        field: JournalField,
    ) {
        if position >= MAX_JOURNAL_LINES {
            tracing::debug!(sub_question_id, %side, position, "journal position out of range");
            return;
        }
        let entry = self
            .entries
            .entry(sub_question_id.to_string())
            .or_insert_with(|| SubmittedAnswer::Journal {
                debit: Vec::new(),
                credit: Vec::new(),
            });
        if !matches!(entry, SubmittedAnswer::Journal { .. }) {
            *entry = SubmittedAnswer::Journal {
                debit: Vec::new(),
                credit: Vec::new(),
            };
        }
        if let SubmittedAnswer::Journal { debit, credit } = entry {
            let lines = match side {
                LedgerSide::Debit => debit,
                LedgerSide::Credit => credit,
            };
            if lines.len() <= position {
                lines.resize_with(position + 1, SubmittedEntry::default);
            }
            match field {
                JournalField::Account(account) => lines[position].account = account,
                JournalField::Amount(amount) => lines[position].amount = amount,
            }
        }
    }

    /// Whether every, some, or none of the question's sub-questions has a
    /// non-blank answer.
    pub fn question_status(&self, question: &Question) -> QuestionStatus {
        let total = question.sub_questions.len();
        let answered = question
            .sub_questions
            .iter()
            .filter(|s| self.get(&s.id).is_some_and(|a| !a.is_blank()))
            .count();

        if total > 0 && answered == total {
            QuestionStatus::Completed
        } else if answered > 0 {
            QuestionStatus::Partial
        } else {
            QuestionStatus::Unanswered
        }
    }
}
