use std::time::{Duration, Instant};

/// Time source for every wait in the port layer.
///
/// All waits are busy-polls on the calling thread. `relax` is called once per
/// poll iteration and is where an implementation may hand the CPU to other
/// work; it must not change how long a timeout lasts.
pub trait Clock {
    /// Milliseconds since an arbitrary, monotonic epoch
    fn millis(&self) -> u64;

    /// Block the calling thread for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);

    /// One iteration of a busy-poll loop
    fn relax(&mut self) {
        std::hint::spin_loop();
    }
}

/// [`Clock`] backed by [`Instant`], unaffected by wall-clock adjustments
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }

    fn relax(&mut self) {
        std::thread::yield_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_advances_across_delay() {
        let mut clock = MonotonicClock::new();
        let before = clock.millis();
        clock.delay_ms(5);
        assert!(clock.millis() >= before + 5);
    }
}
