//! Grading results and the persisted exam result record.

use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::answers::{LedgerSide, SubmittedAnswer};

/// Conventional pass line for a 100-point exam.
pub const PASSING_SCORE: u32 = 70;

/// The record handed to the result store when a session finishes.
///
/// Serialized field names and order are fixed so that stored history
/// round-trips byte for byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub exam_id: u32,
    /// ISO-8601 timestamp in UTC with millisecond precision.
    pub date: String,
    /// Sum of awarded points. Not clamped.
    pub score: u32,
    /// Reserved. Always empty.
    #[serde(default)]
    pub answers: Vec<AnswerRecord>,
    /// Seconds elapsed between start and grading.
    pub time_spent: u64,
}

impl ExamResult {
    pub fn passed(&self, passing_score: u32) -> bool {
        self.score >= passing_score
    }

    /// Parsed form of `date`, if it is valid RFC 3339.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }
}

/// A recorded answer attached to a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: u32,
    pub sub_question_id: String,
    pub answer: SubmittedAnswer,
}

/// Format a timestamp the way results store it: `2024-05-01T09:30:00.000Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Sort results newest first. Unparseable dates sort last.
pub fn sort_newest_first(results: &mut [ExamResult]) {
    results.sort_by(|a, b| match (a.timestamp(), b.timestamp()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.date.cmp(&a.date),
    });
}

/// Which item of a sub-question an outcome refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GradedItem {
    /// The single value of a calculation.
    Value,
    /// A table key.
    Key { key: String },
    /// A journal line.
    Entry { side: LedgerSide, position: usize },
}

/// Correctness of one gradable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub item: GradedItem,
    pub correct: bool,
}

/// The grade for one sub-question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuestionGrade {
    pub sub_question_id: String,
    /// Rounded points awarded, `0..=points_possible`.
    pub points_awarded: u32,
    pub points_possible: u32,
    /// Number of matching items.
    pub correct: usize,
    /// Number of gradable items in the key.
    pub total: usize,
    pub items: Vec<ItemOutcome>,
}

impl SubQuestionGrade {
    pub fn is_full_marks(&self) -> bool {
        self.points_awarded == self.points_possible
    }
}

/// How a session reached `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishReason {
    Submitted,
    Expired,
}

/// Everything a finished session produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub result: ExamResult,
    pub grades: Vec<SubQuestionGrade>,
    pub reason: FinishReason,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn result(date: &str, score: u32) -> ExamResult {
        ExamResult {
            exam_id: 6,
            date: date.into(),
            score,
            answers: vec![],
            time_spent: 1234,
        }
    }

    #[test]
    fn serialized_shape_is_fixed() {
        let r = result("2024-05-01T09:30:00.000Z", 85);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(
            json,
            r#"{"examId":6,"date":"2024-05-01T09:30:00.000Z","score":85,"answers":[],"timeSpent":1234}"#
        );
    }

    #[test]
    fn result_roundtrip_is_byte_exact() {
        let json = r#"{"examId":6,"date":"2024-05-01T09:30:00.123Z","score":100,"answers":[],"timeSpent":5400}"#;
        let parsed: ExamResult = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&parsed).unwrap(), json);

        let reserialized = serde_json::to_string(&parsed).unwrap();
        let again: ExamResult = serde_json::from_str(&reserialized).unwrap();
        assert_eq!(again, parsed);
    }

    #[test]
    fn timestamp_format_matches_iso_millis() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        assert_eq!(format_timestamp(at), "2024-05-01T09:30:00.000Z");
    }

    #[test]
    fn pass_line() {
        assert!(result("", 70).passed(PASSING_SCORE));
        assert!(!result("", 69).passed(PASSING_SCORE));
    }

    #[test]
    fn sorts_newest_first() {
        let mut results = vec![
            result("2024-01-01T00:00:00.000Z", 1),
            result("garbage", 2),
            result("2024-03-01T00:00:00.000Z", 3),
            result("2024-02-01T00:00:00.000Z", 4),
        ];
        sort_newest_first(&mut results);
        let scores: Vec<u32> = results.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![3, 4, 1, 2]);
    }
}
