//! Partial-credit grading for calculation, table and journal answers.
//!
//! Every comparison is exact floating-point equality after lenient parsing
//! (see [`crate::numeric::parse_number`]). Partial credit is
//! `round_half_up(points * correct / total)`, rounded once per sub-question
//! in integer arithmetic. A key with no gradable items awards 0.

use std::collections::BTreeMap;

use crate::answers::{AnswerStore, LedgerSide, SubmittedAnswer, SubmittedEntry};
use crate::model::{CanonicalAnswer, Exam, JournalEntry, SubQuestion};
use crate::numeric::matches_value;
use crate::results::{GradedItem, ItemOutcome, SubQuestionGrade};
use crate::traits::Grader;

/// The grading rules used by every session unless overridden.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardGrader;

impl Grader for StandardGrader {
    fn grade(
        &self,
        sub_question: &SubQuestion,
        submitted: Option<&SubmittedAnswer>,
    ) -> SubQuestionGrade {
        grade(sub_question, submitted)
    }
}

/// Grade one sub-question.
///
/// A submitted answer of the wrong shape is treated as absent.
pub fn grade(sub_question: &SubQuestion, submitted: Option<&SubmittedAnswer>) -> SubQuestionGrade {
    let items = match &sub_question.answer {
        CanonicalAnswer::Calculation { value } => {
            let typed = match submitted {
                Some(SubmittedAnswer::Calculation { value }) => Some(value.as_str()),
                _ => None,
            };
            grade_calculation(*value, typed)
        }
        CanonicalAnswer::Table { items } => {
            let typed = match submitted {
                Some(SubmittedAnswer::Table { items }) => Some(items),
                _ => None,
            };
            grade_table(items, typed)
        }
        CanonicalAnswer::Journal { debit, credit } => {
            let (typed_debit, typed_credit) = match submitted {
                Some(SubmittedAnswer::Journal { debit, credit }) => {
                    (debit.as_slice(), credit.as_slice())
                }
                _ => (&[][..], &[][..]),
            };
            let mut outcomes = grade_journal_side(LedgerSide::Debit, debit, typed_debit);
            outcomes.extend(grade_journal_side(
                LedgerSide::Credit,
                credit,
                typed_credit,
            ));
            outcomes
        }
    };

    let total = items.len();
    let correct = items.iter().filter(|i| i.correct).count();

    SubQuestionGrade {
        sub_question_id: sub_question.id.clone(),
        points_awarded: award(sub_question.points, correct, total),
        points_possible: sub_question.points,
        correct,
        total,
        items,
    }
}

/// Points for `correct` of `total` items, rounded half up.
///
/// Returns 0 when `total` is 0. Never exceeds `points` when
/// `correct <= total`.
pub fn award(points: u32, correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let p = u64::from(points);
    let c = correct.min(total) as u64;
    let t = total as u64;
    ((2 * p * c + t) / (2 * t)) as u32
}

fn grade_calculation(expected: f64, typed: Option<&str>) -> Vec<ItemOutcome> {
    vec![ItemOutcome {
        item: GradedItem::Value,
        correct: typed.is_some_and(|v| matches_value(v, expected)),
    }]
}

fn grade_table(
    key: &BTreeMap<String, f64>,
    typed: Option<&BTreeMap<String, String>>,
) -> Vec<ItemOutcome> {
    key.iter()
        .map(|(label, &expected)| ItemOutcome {
            item: GradedItem::Key { key: label.clone() },
            correct: typed
                .and_then(|t| t.get(label))
                .is_some_and(|v| matches_value(v, expected)),
        })
        .collect()
}

fn grade_journal_side(
    side: LedgerSide,
    key: &[JournalEntry],
    typed: &[SubmittedEntry],
) -> Vec<ItemOutcome> {
    key.iter()
        .enumerate()
        .map(|(position, expected)| ItemOutcome {
            item: GradedItem::Entry { side, position },
            correct: typed.get(position).is_some_and(|entry| {
                entry.account == expected.account && matches_value(&entry.amount, expected.amount)
            }),
        })
        .collect()
}

/// Grade every sub-question of `exam` in presentation order.
pub fn grade_exam(
    grader: &dyn Grader,
    exam: &Exam,
    answers: &AnswerStore,
) -> Vec<SubQuestionGrade> {
    exam.sub_questions()
        .map(|s| grader.grade(s, answers.get(&s.id)))
        .collect()
}

/// Sum of awarded points. Per-sub-question rounding has already happened.
pub fn total_score(grades: &[SubQuestionGrade]) -> u32 {
    grades.iter().map(|g| g.points_awarded).sum()
}
