/// Interval between progress ticks while a prediction is on screen.
pub const TICK_INTERVAL_MS: u32 = 60_000;

/// Each tick represents one simulated minute.
pub const TICKS_PER_HOUR: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressBand {
    Danger,
    Warning,
    Success,
}

impl ProgressBand {
    pub fn for_percent(percent: f64) -> Self {
        if percent < 30.0 {
            Self::Danger
        } else if percent < 70.0 {
            Self::Warning
        } else {
            Self::Success
        }
    }

    pub fn css_color(self) -> &'static str {
        match self {
            Self::Danger => "#e74c3c",
            Self::Warning => "#f39c12",
            Self::Success => "#27ae60",
        }
    }
}

/// Simulated drainage countdown for one displayed prediction.
///
/// Elapsed time is stored as a tick count so that 180 ticks against a 3 h
/// estimate lands exactly on 100 % instead of drifting through float sums.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressTimer {
    total_hours: f64,
    ticks: u32,
}

impl ProgressTimer {
    pub fn new(total_hours: f64) -> Self {
        let total_hours = if total_hours.is_finite() && total_hours > 0.0 {
            total_hours
        } else {
            0.0
        };
        Self {
            total_hours,
            ticks: 0,
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.total_hours
    }

    pub fn elapsed_hours(&self) -> f64 {
        (f64::from(self.ticks) / f64::from(TICKS_PER_HOUR)).min(self.total_hours)
    }

    pub fn remaining_hours(&self) -> f64 {
        (self.total_hours - self.elapsed_hours()).max(0.0)
    }

    pub fn percent(&self) -> f64 {
        if self.total_hours <= 0.0 {
            return 100.0;
        }
        (self.elapsed_hours() / self.total_hours * 100.0).clamp(0.0, 100.0)
    }

    pub fn band(&self) -> ProgressBand {
        ProgressBand::for_percent(self.percent())
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_hours() <= 0.0
    }

    /// Advance one tick. Returns `true` while the countdown is still running
    /// after this tick; once finished, further ticks are no-ops.
    pub fn tick(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.ticks = self.ticks.saturating_add(1);
        !self.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_hours_completes_after_180_ticks() {
        let mut timer = ProgressTimer::new(3.0);
        for _ in 0..179 {
            assert!(timer.tick());
        }
        assert!(!timer.tick());
        assert_eq!(timer.percent(), 100.0);
        assert_eq!(timer.remaining_hours(), 0.0);
        assert!(timer.is_finished());
    }

    #[test]
    fn remaining_is_monotonic_and_sticks_at_zero() {
        let mut timer = ProgressTimer::new(0.5);
        let mut last = timer.remaining_hours();
        for _ in 0..100 {
            timer.tick();
            let now = timer.remaining_hours();
            assert!(now <= last);
            assert!((0.0..=100.0).contains(&timer.percent()));
            last = now;
        }
        assert_eq!(last, 0.0);
        assert!(!timer.tick());
    }

    #[test]
    fn degenerate_totals_are_complete_immediately() {
        for total in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let timer = ProgressTimer::new(total);
            assert!(timer.is_finished(), "total {total}");
            assert_eq!(timer.percent(), 100.0);
            assert_eq!(timer.remaining_hours(), 0.0);
        }
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(ProgressBand::for_percent(0.0), ProgressBand::Danger);
        assert_eq!(ProgressBand::for_percent(29.9), ProgressBand::Danger);
        assert_eq!(ProgressBand::for_percent(30.0), ProgressBand::Warning);
        assert_eq!(ProgressBand::for_percent(69.9), ProgressBand::Warning);
        assert_eq!(ProgressBand::for_percent(70.0), ProgressBand::Success);
    }

    #[test]
    fn half_way_after_ninety_minutes_of_three_hours() {
        let mut timer = ProgressTimer::new(3.0);
        for _ in 0..90 {
            timer.tick();
        }
        assert!((timer.percent() - 50.0).abs() < 1e-9);
        assert!((timer.remaining_hours() - 1.5).abs() < 1e-9);
        assert_eq!(timer.band(), ProgressBand::Warning);
    }
}
