use std::time::Duration;

/// how much one press of + or - changes the snooze, also the lowest it can go
pub const SNOOZE_STEP: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snooze {
    current: Duration,
}

impl Snooze {
    /// the starting value is taken as is, the floor only applies once it is decreased
    #[must_use]
    pub const fn new(initial: Duration) -> Self {
        Self { current: initial }
    }

    #[must_use]
    pub const fn current(&self) -> Duration {
        self.current
    }

    pub fn increase(&mut self) {
        self.current = self.current.saturating_add(SNOOZE_STEP);
    }

    pub fn decrease(&mut self) {
        self.current = self.current.saturating_sub(SNOOZE_STEP).max(SNOOZE_STEP);
    }

    #[must_use]
    pub fn label(&self) -> String {
        crate::duration::format(self.current)
    }
}
