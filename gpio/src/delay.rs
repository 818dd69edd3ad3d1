//! Blocking delays used to meet the display controller timings.
use std::fmt::Debug;
use std::thread::sleep;
use std::time::Duration;

/// Blocking wait. The caller resumes only after the full duration has elapsed.
pub trait Delay: Debug + Send {
    fn delay(&mut self, duration: Duration);
}

/// Delay backed by [std::thread::sleep].
///
/// The OS may oversleep, which is fine: every timing of the controller is a minimum.
#[derive(Debug, Default, Copy, Clone)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay(&mut self, duration: Duration) {
        if !duration.is_zero() {
            sleep(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn std_delay_waits_at_least_the_duration() {
        let start = Instant::now();
        StdDelay.delay(Duration::from_millis(2));
        assert!(start.elapsed() >= Duration::from_millis(2));
    }
}
