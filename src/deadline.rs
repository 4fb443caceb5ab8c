/// A single absolute wake time. Starting a new deadline replaces the old one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    wake_at: Option<u64>,
}

impl Deadline {
    pub fn start(&mut self, now: u64, duration_ms: u32) {
        self.wake_at = Some(now.saturating_add(duration_ms as u64));
    }

    /// Milliseconds left until the deadline, 0 once it has passed or if it
    /// was never started
    pub fn remaining(&self, now: u64) -> u32 {
        match self.wake_at {
            Some(wake_at) => wake_at.saturating_sub(now).min(u32::MAX as u64) as u32,
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_counts_down_and_clamps() {
        let mut deadline = Deadline::default();
        deadline.start(1_000, 100);

        assert_eq!(deadline.remaining(1_000), 100);
        assert_eq!(deadline.remaining(1_030), 70);
        assert_eq!(deadline.remaining(1_100), 0);
        assert_eq!(deadline.remaining(5_000), 0);
    }

    #[test]
    fn remaining_never_increases_until_restarted() {
        let mut deadline = Deadline::default();
        deadline.start(0, 50);

        let mut last = deadline.remaining(0);
        for now in 0..80 {
            let left = deadline.remaining(now);
            assert!(left <= last);
            last = left;
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn restart_discards_previous_deadline() {
        let mut deadline = Deadline::default();
        deadline.start(0, 10);
        deadline.start(5, 200);
        assert_eq!(deadline.remaining(20), 185);
    }

    #[test]
    fn unstarted_deadline_is_expired() {
        let deadline = Deadline::default();
        assert_eq!(deadline.remaining(42), 0);
    }
}
