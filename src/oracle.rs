use std::fmt;

use rand::{Rng, RngCore};

/// The light color shown once a press becomes a hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackColor {
    Blue,
    White,
    Yellow,
    Magenta,
    Cyan,
}

impl fmt::Display for FeedbackColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeedbackColor::Blue => "BLUE",
            FeedbackColor::White => "WHITE",
            FeedbackColor::Yellow => "YELLOW",
            FeedbackColor::Magenta => "MAGENTA",
            FeedbackColor::Cyan => "CYAN",
        })
    }
}

/// A hold's feedback color and the digit the countdown must show at release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HoldFeedback {
    pub color: FeedbackColor,
    pub digit: u8,
}

impl HoldFeedback {
    pub const fn new(color: FeedbackColor, digit: u8) -> Self {
        Self { color, digit }
    }

    /// `true` when `countdown` currently shows this feedback's digit.
    pub fn is_satisfied_by(&self, countdown: &str) -> bool {
        digit_matches(countdown, self.digit)
    }
}

/// Every possible hold feedback, each equally likely.
pub const FEEDBACK_OUTCOMES: [HoldFeedback; 5] = [
    HoldFeedback::new(FeedbackColor::Blue, 2),
    HoldFeedback::new(FeedbackColor::White, 7),
    HoldFeedback::new(FeedbackColor::Yellow, 3),
    HoldFeedback::new(FeedbackColor::Magenta, 4),
    HoldFeedback::new(FeedbackColor::Cyan, 0),
];

/// Decides the feedback for a hold. Asked at most once per hold.
pub trait FeedbackSource: fmt::Debug {
    fn assign_feedback(&mut self) -> HoldFeedback;
}

/// A fixed feedback: every hold gets the same color and digit.
impl FeedbackSource for HoldFeedback {
    fn assign_feedback(&mut self) -> HoldFeedback {
        *self
    }
}

/// Draws uniformly from [`FEEDBACK_OUTCOMES`].
#[derive(Debug, Clone)]
pub struct RandomFeedback<R>(pub R);

impl<R: RngCore + fmt::Debug> FeedbackSource for RandomFeedback<R> {
    fn assign_feedback(&mut self) -> HoldFeedback {
        FEEDBACK_OUTCOMES[self.0.gen_range(0..FEEDBACK_OUTCOMES.len())]
    }
}

/// Normalize a formatted countdown to its digits.
///
/// A four-character reading such as `"4:32"` gains a leading zero so every reading has the
/// same width; the colon is dropped.
pub fn countdown_digits(formatted: &str) -> String {
    let mut digits = String::with_capacity(5);
    if formatted.chars().count() == 4 {
        digits.push('0');
    }
    digits.extend(formatted.chars().filter(|&c| c != ':'));
    digits
}

/// `true` iff the countdown reading contains `digit` anywhere.
///
/// Evaluated against the live reading each time; never cache the result.
pub fn digit_matches(countdown: &str, digit: u8) -> bool {
    match char::from_digit(u32::from(digit), 10) {
        Some(needle) => countdown_digits(countdown).contains(needle),
        None => false,
    }
}
