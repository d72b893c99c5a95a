use colored::{Color, ColoredString, Colorize};

use crate::verdict::VerdictName;

#[macro_export]
macro_rules! print_success {
    ($fmt:literal, $($e:tt)*) => {
        use ::colored::Colorize as _;
        println!("{}", format!($fmt, $($e)*).green())
    }
}

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false
    };
    matches!(v.as_str(), "truecolor" | "24bit")
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for VerdictName {
    fn color(&self) -> Color {
        use VerdictName::*;
        if !self::is_truecolor_supported() {
            return match self {
                Accepted => Color::Green,
                WrongAnswer => Color::Yellow,
                TimeLimitExceeded => Color::Red,
                MemoryLimitExceeded => Color::BrightRed,
                RuntimeError => Color::Magenta,
                InternalError => Color::Blue,
            };
        }

        let (r, g, b) = match self {
            Accepted => (30, 180, 40),
            WrongAnswer => (210, 138, 4),
            TimeLimitExceeded => (220, 42, 42),
            MemoryLimitExceeded => (200, 70, 110),
            RuntimeError => (171, 40, 200),
            InternalError => (60, 90, 200),
        };
        Color::TrueColor { r, g, b }
    }
}

/// Short verdict code on a coloured background, e.g. ` WA `.
pub fn verdict_icon(verdict: VerdictName) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {:<3} ", verdict.code())
        .on_color(verdict.color())
        .bold()
        .color(fg)
}

pub fn verdict_label(verdict: VerdictName) -> ColoredString {
    verdict.to_string().color(verdict.color()).bold()
}
