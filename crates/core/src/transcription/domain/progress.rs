use super::segment_planner::SegmentWindow;

/// Completion estimate taken after one window finishes.
///
/// The remaining-time figure extrapolates from the wall time of the most
/// recent window only, so it moves with that window's individual speed
/// rather than an average over the run.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressEstimate {
    /// Share of the source timeline processed so far, 0..=100.
    pub percent: f64,
    /// Estimated wall seconds left at the just-observed throughput.
    pub eta_secs: f64,
}

impl ProgressEstimate {
    pub fn after_window(total_duration: f64, window: &SegmentWindow, wall_secs: f64) -> Self {
        let processed = window.end_secs().min(total_duration);
        let percent = if total_duration > 0.0 {
            processed / total_duration * 100.0
        } else {
            0.0
        };
        let remaining = (total_duration - processed).max(0.0);
        let eta_secs = if window.duration_secs > 0.0 {
            remaining / window.duration_secs * wall_secs
        } else {
            0.0
        };
        Self { percent, eta_secs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn window(index: usize, start: f64, duration: f64) -> SegmentWindow {
        SegmentWindow {
            index,
            start_secs: start,
            duration_secs: duration,
        }
    }

    #[test]
    fn test_percent_after_first_window() {
        let est = ProgressEstimate::after_window(3000.0, &window(1, 0.0, 1200.0), 60.0);
        assert_relative_eq!(est.percent, 40.0);
    }

    #[test]
    fn test_eta_linear_in_last_window_speed() {
        // 1800s remain; the last 1200s window took 60s, so 1.5 windows ≈ 90s
        let est = ProgressEstimate::after_window(3000.0, &window(1, 0.0, 1200.0), 60.0);
        assert_relative_eq!(est.eta_secs, 90.0);
    }

    #[test]
    fn test_estimate_tracks_most_recent_window_only() {
        let fast = ProgressEstimate::after_window(3000.0, &window(1, 0.0, 1200.0), 30.0);
        let slow = ProgressEstimate::after_window(3000.0, &window(1, 0.0, 1200.0), 120.0);
        assert_relative_eq!(fast.eta_secs, 45.0);
        assert_relative_eq!(slow.eta_secs, 180.0);
    }

    #[test]
    fn test_final_window_reaches_hundred_percent_zero_eta() {
        let est = ProgressEstimate::after_window(3000.0, &window(3, 2400.0, 600.0), 45.0);
        assert_relative_eq!(est.percent, 100.0);
        assert_relative_eq!(est.eta_secs, 0.0);
    }

    #[test]
    fn test_zero_total_duration() {
        let est = ProgressEstimate::after_window(0.0, &window(1, 0.0, 1200.0), 10.0);
        assert_relative_eq!(est.percent, 0.0);
    }
}
