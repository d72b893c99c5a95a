use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::verdict::{ScoringType, VerdictName};

/// One executed test and its judged outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Testcase {
    /// Name of the testset this testcase belongs to.
    pub testset: String,
    pub verdict_name: VerdictName,
    pub score: u32,
    pub max_score: u32,
    pub output: String,
    pub expected_output: String,
    pub checker_output: String,
    #[serde(with = "crate::codec::duration_nanos")]
    pub time_spent: Duration,
    /// KiB
    pub memory_used: u64,
}

/// A named, ordered group of testcases sharing a scoring policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Testset {
    pub name: String,
    pub scoring: ScoringType,
    pub testcases: Vec<Testcase>,
}

impl Testset {
    pub fn new(name: impl Into<String>, scoring: ScoringType) -> Self {
        Self {
            name: name.into(),
            scoring,
            testcases: Vec::new(),
        }
    }

    pub fn with_testcases(mut self, testcases: Vec<Testcase>) -> Self {
        self.testcases = testcases;
        self
    }

    /// Group: full [`Self::max_score`] iff every testcase is accepted, otherwise 0.
    /// Sum: sum of testcase scores, each capped by its own max score.
    ///
    /// The cap keeps `score() <= max_score()` for stored testcases whose score
    /// exceeds their max; such a testset no longer scores the plain sum.
    ///
    /// Aggregates are `u64` so that no decodable testset can overflow them.
    pub fn score(&self) -> u64 {
        use ScoringType::*;
        match self.scoring {
            Group => {
                if self.is_ac() {
                    self.max_score()
                } else {
                    0
                }
            }
            Sum => self
                .testcases
                .iter()
                .map(|t| u64::from(t.score.min(t.max_score)))
                .sum(),
        }
    }

    pub fn max_score(&self) -> u64 {
        self.testcases.iter().map(|t| u64::from(t.max_score)).sum()
    }

    /// 1-based position (within this testset) of the first testcase that is not accepted.
    pub fn first_non_ac(&self) -> Option<usize> {
        self.testcases
            .iter()
            .position(|t| !t.verdict_name.is_accepted())
            .map(|i| i + 1)
    }

    pub fn is_ac(&self) -> bool {
        self.first_non_ac().is_none()
    }

    pub fn max_memory_usage(&self) -> u64 {
        self.testcases
            .iter()
            .map(|t| t.memory_used)
            .max()
            .unwrap_or(0)
    }

    pub fn max_time_spent(&self) -> Duration {
        self.testcases
            .iter()
            .map(|t| t.time_spent)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

/// Shape of a testset before anything has been executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestsetOutline {
    pub name: String,
    pub scoring: ScoringType,
    /// Max score of each testcase, in order.
    pub max_scores: Vec<u32>,
}
