use crate::api::DrainagePrediction;
use crate::prediction::PredictionContext;

pub const SYSTEM_NAME: &str = "Hanoi Flood Monitoring System";

/// Status of one pending completion on the drainage dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionBadge {
    DrainingSoon,
    Draining,
    Slow,
}

impl CompletionBadge {
    pub fn for_remaining(remaining_hours: f64) -> Self {
        if remaining_hours <= 2.0 {
            Self::DrainingSoon
        } else if remaining_hours <= 6.0 {
            Self::Draining
        } else {
            Self::Slow
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::DrainingSoon => "Draining soon",
            Self::Draining => "Draining",
            Self::Slow => "Slow",
        }
    }

    pub fn css_color(self) -> &'static str {
        match self {
            Self::DrainingSoon => "#27ae60",
            Self::Draining => "#f39c12",
            Self::Slow => "#e74c3c",
        }
    }
}

/// Fill of the dashboard bar: a day or more left reads as empty.
pub fn completion_bar_width(remaining_hours: f64) -> f64 {
    if !remaining_hours.is_finite() {
        return 0.0;
    }
    (100.0 - remaining_hours / 24.0 * 100.0).clamp(0.0, 100.0)
}

/// "5 hours", or "30 hours (1.3 days)" past a day.
pub fn format_duration_hours(hours: f64) -> String {
    let unit = if hours == 1.0 { "hour" } else { "hours" };
    if hours >= 24.0 {
        format!("{hours} {unit} ({:.1} days)", hours / 24.0)
    } else {
        format!("{hours} {unit}")
    }
}

/// Plain-text summary copied to the clipboard by the share action.
pub fn share_text(context: Option<&PredictionContext>, prediction: &DrainagePrediction) -> String {
    let location = context
        .map(PredictionContext::display_name)
        .unwrap_or(crate::prediction::DEFAULT_LOCATION_NAME);
    format!(
        "Estimated drainage time: {} hours\nLocation: {location}\n{SYSTEM_NAME}",
        prediction.estimated_hours
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;

    #[test]
    fn badge_thresholds_are_inclusive() {
        assert_eq!(CompletionBadge::for_remaining(2.0), CompletionBadge::DrainingSoon);
        assert_eq!(CompletionBadge::for_remaining(2.1), CompletionBadge::Draining);
        assert_eq!(CompletionBadge::for_remaining(6.0), CompletionBadge::Draining);
        assert_eq!(CompletionBadge::for_remaining(6.5), CompletionBadge::Slow);
    }

    #[test]
    fn bar_width_is_clamped() {
        assert_eq!(completion_bar_width(0.0), 100.0);
        assert_eq!(completion_bar_width(12.0), 50.0);
        assert_eq!(completion_bar_width(48.0), 0.0);
        assert_eq!(completion_bar_width(-5.0), 100.0);
        assert_eq!(completion_bar_width(f64::NAN), 0.0);
    }

    #[test]
    fn long_durations_show_days() {
        assert_eq!(format_duration_hours(3.0), "3 hours");
        assert_eq!(format_duration_hours(1.0), "1 hour");
        assert_eq!(format_duration_hours(36.0), "36 hours (1.5 days)");
    }

    #[test]
    fn share_text_names_location_and_system() {
        let prediction: DrainagePrediction =
            serde_json::from_value(serde_json::json!({"estimated_drainage_time_hours": 4.5}))
                .expect("prediction");
        let ctx = PredictionContext::new(LatLng::new(21.0, 105.8), "Ngã Tư Sở", 30.0);
        assert_eq!(
            share_text(Some(&ctx), &prediction),
            "Estimated drainage time: 4.5 hours\nLocation: Ngã Tư Sở\nHanoi Flood Monitoring System"
        );
        assert!(share_text(None, &prediction).contains("Location: Selected location"));
    }
}
