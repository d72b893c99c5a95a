use std::fmt;

use serde::Deserialize;

use crate::verdict::VerdictName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub verdict: VerdictName,
    pub message: String,
}

impl CheckResult {
    fn accepted() -> Self {
        Self {
            verdict: VerdictName::Accepted,
            message: "ok".to_owned(),
        }
    }

    fn wrong(message: String) -> Self {
        Self {
            verdict: VerdictName::WrongAnswer,
            message,
        }
    }
}

/// Decides whether a program's output answers a testcase.
pub trait Checker: Send + Sync + fmt::Debug {
    fn check(&self, input: &[u8], output: &[u8], expected: &[u8]) -> CheckResult;
}

/// Byte-for-byte comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactChecker;

impl Checker for ExactChecker {
    fn check(&self, _input: &[u8], output: &[u8], expected: &[u8]) -> CheckResult {
        if output == expected {
            return CheckResult::accepted();
        }
        let at = output
            .iter()
            .zip(expected)
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| output.len().min(expected.len()));
        CheckResult::wrong(format!("Output differs at byte {}", at + 1))
    }
}

/// Compares whitespace-separated tokens, ignoring the amount and kind of whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenChecker;

impl Checker for TokenChecker {
    fn check(&self, _input: &[u8], output: &[u8], expected: &[u8]) -> CheckResult {
        let mut found = output.split(u8::is_ascii_whitespace).filter(|t| !t.is_empty());
        let mut wanted = expected.split(u8::is_ascii_whitespace).filter(|t| !t.is_empty());

        for nth in 1.. {
            match (found.next(), wanted.next()) {
                (None, None) => return CheckResult::accepted(),
                (Some(a), Some(b)) if a == b => continue,
                (Some(a), Some(b)) => {
                    return CheckResult::wrong(format!(
                        "Token {}: expected '{}', found '{}'",
                        nth,
                        String::from_utf8_lossy(b),
                        String::from_utf8_lossy(a),
                    ))
                }
                (Some(a), None) => {
                    return CheckResult::wrong(format!(
                        "Token {}: expected end of output, found '{}'",
                        nth,
                        String::from_utf8_lossy(a),
                    ))
                }
                (None, Some(b)) => {
                    return CheckResult::wrong(format!(
                        "Token {}: expected '{}', found end of output",
                        nth,
                        String::from_utf8_lossy(b),
                    ))
                }
            }
        }
        unreachable!()
    }
}

/// Checker selection as written in `problem.toml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckerKind {
    Exact,
    #[default]
    Tokens,
}

impl CheckerKind {
    pub fn checker(self) -> &'static dyn Checker {
        match self {
            CheckerKind::Exact => &ExactChecker,
            CheckerKind::Tokens => &TokenChecker,
        }
    }
}
