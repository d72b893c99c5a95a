use serde::{Deserialize, Serialize};

/// Outcome of a single testcase.
///
/// Persisted as its integer discriminant (`Accepted` = 0 ... `InternalError` = 5).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum VerdictName {
    #[default]
    #[strum(to_string = "Accepted")]
    Accepted,

    #[strum(to_string = "Wrong answer")]
    WrongAnswer,

    #[strum(to_string = "Runtime error")]
    RuntimeError,

    #[strum(to_string = "Time limit exceeded")]
    TimeLimitExceeded,

    #[strum(to_string = "Memory limit exceeded")]
    MemoryLimitExceeded,

    #[strum(to_string = "Internal error")]
    InternalError,
}

impl VerdictName {
    pub const fn code(&self) -> &'static str {
        use VerdictName::*;
        match self {
            Accepted => "AC",
            WrongAnswer => "WA",
            RuntimeError => "RE",
            TimeLimitExceeded => "TLE",
            MemoryLimitExceeded => "MLE",
            InternalError => "XX",
        }
    }

    pub const fn is_accepted(&self) -> bool {
        matches!(self, VerdictName::Accepted)
    }
}

/// How much detail a result view should surface.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(into = "u8", try_from = "u8")]
#[strum(serialize_all = "lowercase")]
pub enum FeedbackType {
    /// Overall verdict and the first failing test.
    #[default]
    CF,
    /// Per-testset scores with every testcase.
    IOI,
    /// Accepted or rejected, nothing else.
    ACM,
}

/// Parses leniently: anything other than `"ioi"` or `"acm"` is [`FeedbackType::CF`].
impl From<&str> for FeedbackType {
    fn from(s: &str) -> Self {
        match s {
            "ioi" => FeedbackType::IOI,
            "acm" => FeedbackType::ACM,
            _ => FeedbackType::CF,
        }
    }
}

/// How a testset turns its testcases into a score.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(into = "u8", try_from = "u8")]
#[strum(serialize_all = "lowercase")]
pub enum ScoringType {
    /// All or nothing.
    #[default]
    Group,
    /// Sum of the testcase scores.
    Sum,
}

/// Parses leniently: anything other than `"group"` is [`ScoringType::Sum`].
impl From<&str> for ScoringType {
    fn from(s: &str) -> Self {
        match s {
            "group" => ScoringType::Group,
            _ => ScoringType::Sum,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} discriminant: {value}")]
pub struct UnknownDiscriminant {
    pub kind: &'static str,
    pub value: u8,
}

macro_rules! int_repr {
    ($ty:ident { $($variant:ident = $n:literal),* $(,)? }) => {
        impl From<$ty> for u8 {
            fn from(value: $ty) -> Self {
                match value {
                    $($ty::$variant => $n,)*
                }
            }
        }

        impl TryFrom<u8> for $ty {
            type Error = UnknownDiscriminant;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($n => Ok($ty::$variant),)*
                    _ => Err(UnknownDiscriminant {
                        kind: stringify!($ty),
                        value,
                    }),
                }
            }
        }
    };
}

int_repr!(VerdictName {
    Accepted = 0,
    WrongAnswer = 1,
    RuntimeError = 2,
    TimeLimitExceeded = 3,
    MemoryLimitExceeded = 4,
    InternalError = 5,
});

int_repr!(FeedbackType {
    CF = 0,
    IOI = 1,
    ACM = 2,
});

int_repr!(ScoringType { Group = 0, Sum = 1 });

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn verdict_labels() {
        let labels: Vec<_> = VerdictName::iter().map(|v| v.to_string()).collect();
        assert_eq!(
            labels,
            [
                "Accepted",
                "Wrong answer",
                "Runtime error",
                "Time limit exceeded",
                "Memory limit exceeded",
                "Internal error",
            ]
        );
        assert_eq!(VerdictName::InternalError.code(), "XX");
        assert!(VerdictName::default().is_accepted());
    }

    #[test]
    fn feedback_type_parse_is_lenient() {
        assert_eq!(FeedbackType::from("ioi"), FeedbackType::IOI);
        assert_eq!(FeedbackType::from("acm"), FeedbackType::ACM);
        assert_eq!(FeedbackType::from("cf"), FeedbackType::CF);
        assert_eq!(FeedbackType::from(""), FeedbackType::CF);
        assert_eq!(FeedbackType::from("IOI"), FeedbackType::CF);
        assert_eq!(FeedbackType::from("icpc"), FeedbackType::CF);
    }

    #[test]
    fn scoring_type_parse_is_lenient() {
        assert_eq!(ScoringType::from("group"), ScoringType::Group);
        assert_eq!(ScoringType::from("sum"), ScoringType::Sum);
        assert_eq!(ScoringType::from("Group"), ScoringType::Sum);
        assert_eq!(ScoringType::from("whatever"), ScoringType::Sum);
    }

    #[test]
    fn display_matches_parse_input() {
        for f in FeedbackType::iter() {
            assert_eq!(FeedbackType::from(f.to_string().as_str()), f);
        }
        for s in ScoringType::iter() {
            assert_eq!(ScoringType::from(s.to_string().as_str()), s);
        }
    }

    #[test]
    fn serialized_as_integers() {
        assert_eq!(serde_json::to_string(&VerdictName::WrongAnswer).unwrap(), "1");
        assert_eq!(serde_json::to_string(&VerdictName::InternalError).unwrap(), "5");
        assert_eq!(serde_json::to_string(&FeedbackType::ACM).unwrap(), "2");
        assert_eq!(serde_json::to_string(&ScoringType::Sum).unwrap(), "1");

        let v: VerdictName = serde_json::from_str("3").unwrap();
        assert_eq!(v, VerdictName::TimeLimitExceeded);
    }

    #[test]
    fn unknown_discriminant_is_rejected() {
        assert!(serde_json::from_str::<VerdictName>("6").is_err());
        assert!(serde_json::from_str::<ScoringType>("2").is_err());
        assert!(serde_json::from_str::<FeedbackType>("-1").is_err());
        assert_eq!(
            VerdictName::try_from(9).unwrap_err(),
            UnknownDiscriminant {
                kind: "VerdictName",
                value: 9
            }
        );
    }
}
