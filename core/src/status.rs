use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::testset::{Testcase, Testset, TestsetOutline};
use crate::verdict::{FeedbackType, VerdictName};

/// Judged outcome of one submission.
///
/// Testcases are addressed by a 1-based index that runs continuously across
/// the testsets of `feedback`, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Status {
    pub compiled: bool,
    pub feedback_type: FeedbackType,
    pub feedback: Vec<Testset>,
}

/// A testcase together with its global position.
#[derive(Debug, Clone, Copy)]
pub struct IndexedTestcase<'a> {
    /// 1-based, across all testsets.
    pub index: usize,
    pub testset: &'a Testset,
    pub testcase: &'a Testcase,
}

impl Status {
    pub fn new(compiled: bool, feedback_type: FeedbackType, feedback: Vec<Testset>) -> Self {
        Self {
            compiled,
            feedback_type,
            feedback,
        }
    }

    /// Status for a submission whose testcases never ran: every testcase of
    /// `outline` gets `verdict` and a score of 0. `note` goes to the checker
    /// output of the first testcase.
    pub fn unjudged(
        outline: &[TestsetOutline],
        feedback_type: FeedbackType,
        verdict: VerdictName,
        note: &str,
    ) -> Self {
        let mut note = Some(note);
        let feedback = outline
            .iter()
            .map(|o| {
                let testcases = o
                    .max_scores
                    .iter()
                    .map(|&max_score| Testcase {
                        testset: o.name.clone(),
                        verdict_name: verdict,
                        score: 0,
                        max_score,
                        checker_output: note.take().unwrap_or_default().to_owned(),
                        ..Default::default()
                    })
                    .collect();
                Testset::new(o.name.clone(), o.scoring).with_testcases(testcases)
            })
            .collect();
        Self::new(false, feedback_type, feedback)
    }

    /// Walks every testcase in global order. Every index-based query goes through here.
    pub fn testcases(&self) -> impl Iterator<Item = IndexedTestcase<'_>> + '_ {
        self.feedback
            .iter()
            .flat_map(|ts| ts.testcases.iter().map(move |tc| (ts, tc)))
            .enumerate()
            .map(|(i, (testset, testcase))| IndexedTestcase {
                index: i + 1,
                testset,
                testcase,
            })
    }

    pub fn testcase_count(&self) -> usize {
        self.feedback.iter().map(|ts| ts.testcases.len()).sum()
    }

    pub fn score(&self) -> u64 {
        self.feedback.iter().map(Testset::score).sum()
    }

    pub fn max_score(&self) -> u64 {
        self.feedback.iter().map(Testset::max_score).sum()
    }

    /// Global 1-based index of the first testcase that is not accepted.
    pub fn first_non_ac(&self) -> Option<usize> {
        self.first_non_ac_testcase().map(|x| x.index)
    }

    pub fn first_non_ac_testcase(&self) -> Option<IndexedTestcase<'_>> {
        self.testcases()
            .find(|x| !x.testcase.verdict_name.is_accepted())
    }

    /// Testcase at the global 1-based `index`, or `None` when out of range.
    pub fn index_testcase(&self, index: usize) -> Option<&Testcase> {
        let skip = index.checked_sub(1)?;
        self.testcases().nth(skip).map(|x| x.testcase)
    }

    pub fn verdict(&self) -> VerdictName {
        match self.first_non_ac().and_then(|i| self.index_testcase(i)) {
            Some(tc) => tc.verdict_name,
            None => VerdictName::Accepted,
        }
    }

    pub fn is_ac(&self) -> bool {
        self.feedback.iter().all(Testset::is_ac)
    }

    pub fn max_memory_usage(&self) -> u64 {
        self.feedback
            .iter()
            .map(Testset::max_memory_usage)
            .max()
            .unwrap_or(0)
    }

    pub fn max_time_spent(&self) -> Duration {
        self.feedback
            .iter()
            .map(Testset::max_time_spent)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}
