use std::thread;
use std::time::{Duration, Instant};

/// Where refresh instants come from.
///
/// The session blocks on the clock between ticks, which is how the loop runs
/// at the display cadence instead of spinning.
pub trait FrameClock: Send {
    /// Blocks until the next refresh slot and returns its timestamp.
    fn wait_for_refresh(&mut self) -> Instant;
}

/// Clock that paces frames at a fixed cadence against the system monotonic
/// clock.
pub struct IntervalClock {
    interval: Duration,
    next_slot: Option<Instant>,
}

impl IntervalClock {
    const FALLBACK_HZ: f32 = 60.0;

    /// Creates a clock firing at the given refresh rate. Non-positive rates
    /// fall back to 60 Hz.
    pub fn from_hz(hz: f32) -> Self {
        let hz = if hz > 0.0 { hz } else { Self::FALLBACK_HZ };
        Self {
            interval: Duration::from_secs_f32(1.0 / hz),
            next_slot: None,
        }
    }
}

impl FrameClock for IntervalClock {
    fn wait_for_refresh(&mut self) -> Instant {
        let now = Instant::now();
        let slot = match self.next_slot {
            Some(slot) if slot > now => {
                thread::sleep(slot.saturating_duration_since(now));
                slot
            }
            // Overdue slots collapse into an immediate tick; missed slots are
            // dropped rather than replayed as a burst.
            _ => now,
        };
        self.next_slot = Some(slot + self.interval);
        slot
    }
}

/// Deterministic clock for tests; advances a fixed step per refresh without
/// sleeping.
pub struct ManualClock {
    next: Instant,
    step: Duration,
}

impl ManualClock {
    pub fn new(start: Instant, step: Duration) -> Self {
        Self { next: start, step }
    }
}

impl FrameClock for ManualClock {
    fn wait_for_refresh(&mut self) -> Instant {
        let slot = self.next;
        self.next += self.step;
        slot
    }
}

/// Convenient alias for owning frame clocks behind trait objects.
pub type BoxedFrameClock = Box<dyn FrameClock + Send>;

/// Estimates the instantaneous frame rate from presentation timestamps.
///
/// Only presented frames record a timestamp. A skipped tick leaves the
/// previous one in place, so the next sample spans the whole gap and the
/// reported rate stays honest instead of snapping back up.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameRateEstimator {
    last_presented: Option<Instant>,
}

impl FrameRateEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a presented frame and returns the rate over the elapsed
    /// window. The first presentation has no window and yields `None`.
    pub fn sample(&mut self, now: Instant) -> Option<f32> {
        let fps = match self.last_presented {
            Some(previous) => {
                let elapsed = now.saturating_duration_since(previous).as_secs_f32();
                if elapsed > 0.0 {
                    Some(1.0 / elapsed)
                } else {
                    None
                }
            }
            None => None,
        };
        self.last_presented = Some(now);
        fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_clock_spaces_slots_by_at_least_the_interval() {
        let mut clock = IntervalClock::from_hz(100.0);
        let first = clock.wait_for_refresh();
        let second = clock.wait_for_refresh();
        let gap = second.duration_since(first);
        assert!(gap >= Duration::from_millis(9), "gap was {gap:?}");
        assert!(gap < Duration::from_millis(100), "gap was {gap:?}");
    }

    #[test]
    fn manual_clock_steps_deterministically() {
        let start = Instant::now();
        let mut clock = ManualClock::new(start, Duration::from_millis(16));
        assert_eq!(clock.wait_for_refresh(), start);
        assert_eq!(clock.wait_for_refresh(), start + Duration::from_millis(16));
    }

    #[test]
    fn estimator_needs_two_presentations_for_a_window() {
        let start = Instant::now();
        let mut estimator = FrameRateEstimator::new();
        assert_eq!(estimator.sample(start), None);

        let fps = estimator
            .sample(start + Duration::from_millis(20))
            .expect("second sample has a window");
        assert!((fps - 50.0).abs() < 0.5);
    }

    #[test]
    fn skipped_ticks_widen_the_next_window() {
        let start = Instant::now();
        let mut estimator = FrameRateEstimator::new();
        estimator.sample(start);

        // One refresh slot passes with no presented frame; the next sample
        // must cover both slots.
        let fps = estimator
            .sample(start + Duration::from_millis(32))
            .expect("window exists");
        assert!((fps - 31.25).abs() < 0.5);
    }

    #[test]
    fn zero_elapsed_time_yields_no_rate() {
        let start = Instant::now();
        let mut estimator = FrameRateEstimator::new();
        estimator.sample(start);
        assert_eq!(estimator.sample(start), None);
    }
}
