use std::{fmt, time::Duration};

/// how the alarm ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Dismissed,
    Snoozed(Duration),
    TimedOut,
}

impl Outcome {
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Dismissed | Self::Snoozed(_) => 0,
            Self::TimedOut => 2,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dismissed => write!(f, "Dismissed"),
            Self::Snoozed(duration) => write!(f, "Snoozed {}", crate::duration::format(*duration)),
            Self::TimedOut => write!(f, "Timeout"),
        }
    }
}
