pub mod action;
pub mod checker;
pub mod codec;
pub mod config;
pub mod content;
pub mod fs_problem;
pub mod judge;
pub mod language;
pub mod problem;
pub mod sandbox;
pub mod status;
pub mod str_interp;
pub mod style;
pub mod testset;
pub mod verdict;

pub use crate::codec::{DecodeError, EncodeError, StoredValue};
pub use crate::config::Config;
pub use crate::fs_problem::DirectoryProblem;
pub use crate::problem::{spawn_judge, JudgeTask, Problem, Progress, ProgressSink};
pub use crate::status::Status;
pub use crate::testset::{Testcase, Testset};
pub use crate::verdict::{FeedbackType, ScoringType, VerdictName};
