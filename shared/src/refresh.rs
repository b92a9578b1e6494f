//! Map layer refresh bookkeeping: sequencing of overlapping fetches, the
//! periodic schedule, and the refresh-all summary.

use crate::api::{FloodLayers, LayerStats};
use crate::error::ApiError;
use crate::geo::Feature;
use crate::notify::NotificationLevel;

pub const AUTO_UPDATE_INTERVAL_MS: u32 = 5 * 60 * 1000;
pub const WEATHER_REFRESH_INTERVAL_MS: u32 = 10 * 60 * 1000;
pub const REPORT_RELOAD_DELAY_MS: u32 = 2_000;
pub const MIN_INTERVAL_MS: u32 = 1_000;

/// Layers currently on the map. Always one complete response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapLayerState {
    pub flood_zone_features: Vec<Feature>,
    pub report_features: Vec<Feature>,
    pub stats: Option<LayerStats>,
    pub last_refreshed_at_ms: f64,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Applied { zones: usize, reports: usize },
    /// A newer fetch already landed.
    Stale,
    /// Previous layers stay on screen.
    Failed(ApiError),
}

#[derive(Debug, Default)]
pub struct LayerRefresher {
    issued: u64,
    in_flight: u32,
    state: Option<MapLayerState>,
}

impl LayerRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> RefreshTicket {
        self.issued += 1;
        self.in_flight += 1;
        RefreshTicket { seq: self.issued }
    }

    pub fn complete(
        &mut self,
        ticket: RefreshTicket,
        result: Result<FloodLayers, ApiError>,
        now_ms: f64,
    ) -> RefreshOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.applied_seq() > ticket.seq {
            return RefreshOutcome::Stale;
        }
        match result {
            Ok(layers) => {
                let zones = layers.flood_zones.len();
                let reports = layers.flood_reports.len();
                self.state = Some(MapLayerState {
                    flood_zone_features: layers.flood_zones,
                    report_features: layers.flood_reports,
                    stats: layers.stats,
                    last_refreshed_at_ms: now_ms,
                    seq: ticket.seq,
                });
                RefreshOutcome::Applied { zones, reports }
            }
            Err(err) => RefreshOutcome::Failed(err),
        }
    }

    pub fn state(&self) -> Option<&MapLayerState> {
        self.state.as_ref()
    }

    pub fn applied_seq(&self) -> u64 {
        self.state.as_ref().map_or(0, |s| s.seq)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleChange {
    /// Install a new interval under this token, dropping any previous one.
    Started(ScheduleToken),
    /// Already running at this cadence.
    Unchanged,
}

/// Ownership record for one periodic job (auto-update, weather refresh).
///
/// The driver holds the actual timer; this decides when it must be replaced
/// and lets late callbacks recognise that they belong to a cancelled run.
#[derive(Debug, Default)]
pub struct PeriodicSchedule {
    generation: u64,
    active: Option<(ScheduleToken, u32)>,
}

impl PeriodicSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, interval_ms: u32) -> ScheduleChange {
        let interval_ms = interval_ms.max(MIN_INTERVAL_MS);
        if let Some((_, current)) = self.active {
            if current == interval_ms {
                return ScheduleChange::Unchanged;
            }
        }
        self.generation += 1;
        let token = ScheduleToken(self.generation);
        self.active = Some((token, interval_ms));
        ScheduleChange::Started(token)
    }

    /// Returns whether something was running.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    pub fn is_current(&self, token: ScheduleToken) -> bool {
        matches!(self.active, Some((t, _)) if t == token)
    }

    pub fn interval_ms(&self) -> Option<u32> {
        self.active.map(|(_, ms)| ms)
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshStep {
    FloodZones,
    Statistics,
    Weather,
    RecentReports,
}

impl RefreshStep {
    pub const ALL: [RefreshStep; 4] = [
        Self::FloodZones,
        Self::Statistics,
        Self::Weather,
        Self::RecentReports,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::FloodZones => "flood zones",
            Self::Statistics => "statistics",
            Self::Weather => "weather",
            Self::RecentReports => "recent reports",
        }
    }
}

/// Per-step results of one "refresh everything" run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshAllReport {
    steps: Vec<(RefreshStep, Result<(), ApiError>)>,
}

impl RefreshAllReport {
    pub fn record(&mut self, step: RefreshStep, result: Result<(), ApiError>) {
        self.steps.retain(|(s, _)| *s != step);
        self.steps.push((step, result));
    }

    pub fn succeeded(&self) -> impl Iterator<Item = RefreshStep> + '_ {
        self.steps
            .iter()
            .filter(|(_, r)| r.is_ok())
            .map(|(s, _)| *s)
    }

    pub fn failed(&self) -> impl Iterator<Item = (RefreshStep, &ApiError)> + '_ {
        self.steps
            .iter()
            .filter_map(|(s, r)| r.as_ref().err().map(|e| (*s, e)))
    }

    /// Single toast for the whole run.
    pub fn summary(&self) -> (NotificationLevel, String) {
        let failed: Vec<&str> = self.failed().map(|(s, _)| s.label()).collect();
        if failed.is_empty() {
            (NotificationLevel::Success, "All data refreshed".to_owned())
        } else if failed.len() == self.steps.len() {
            (
                NotificationLevel::Warning,
                "Refresh failed. Check your connection and try again.".to_owned(),
            )
        } else {
            (
                NotificationLevel::Warning,
                format!("Refreshed with errors: could not load {}", failed.join(", ")),
            )
        }
    }
}

/// Rejects a refresh-all while one is already running.
#[derive(Debug, Default)]
pub struct RefreshAllGate {
    running: bool,
}

impl RefreshAllGate {
    pub fn try_begin(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    pub fn finish(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{FeatureProperties, Geometry};

    fn layers(zone_count: usize) -> FloodLayers {
        let zone = Feature {
            geometry: Some(Geometry::Point {
                coordinates: [105.85, 21.03],
            }),
            properties: FeatureProperties::default(),
        };
        FloodLayers {
            flood_zones: vec![zone; zone_count],
            ..FloodLayers::default()
        }
    }

    #[test]
    fn out_of_order_completion_keeps_newest() {
        let mut refresher = LayerRefresher::new();
        let older = refresher.begin();
        let newer = refresher.begin();
        assert!(refresher.is_loading());

        assert_eq!(
            refresher.complete(newer, Ok(layers(2)), 10.0),
            RefreshOutcome::Applied { zones: 2, reports: 0 }
        );
        assert_eq!(
            refresher.complete(older, Ok(layers(7)), 11.0),
            RefreshOutcome::Stale
        );
        let state = refresher.state().expect("state");
        assert_eq!(state.flood_zone_features.len(), 2);
        assert_eq!(state.seq, newer.seq);
        assert_eq!(state.last_refreshed_at_ms, 10.0);
        assert!(!refresher.is_loading());
    }

    #[test]
    fn in_order_completion_applies_both_wholesale() {
        let mut refresher = LayerRefresher::new();
        let a = refresher.begin();
        let b = refresher.begin();
        refresher.complete(a, Ok(layers(1)), 1.0);
        assert_eq!(refresher.state().map(|s| s.flood_zone_features.len()), Some(1));
        refresher.complete(b, Ok(layers(3)), 2.0);
        assert_eq!(refresher.state().map(|s| s.flood_zone_features.len()), Some(3));
    }

    #[test]
    fn failure_keeps_previous_layers() {
        let mut refresher = LayerRefresher::new();
        let ok = refresher.begin();
        refresher.complete(ok, Ok(layers(4)), 1.0);
        let bad = refresher.begin();
        let outcome = refresher.complete(bad, Err(ApiError::status(500, "boom")), 2.0);
        assert!(matches!(outcome, RefreshOutcome::Failed(ApiError::Status { status: 500, .. })));
        let state = refresher.state().expect("state");
        assert_eq!(state.flood_zone_features.len(), 4);
        assert_eq!(state.seq, ok.seq);
    }

    #[test]
    fn stale_failure_is_not_reported() {
        let mut refresher = LayerRefresher::new();
        let older = refresher.begin();
        let newer = refresher.begin();
        refresher.complete(newer, Ok(layers(1)), 1.0);
        assert_eq!(
            refresher.complete(older, Err(ApiError::Transport("x".into())), 2.0),
            RefreshOutcome::Stale
        );
    }

    #[test]
    fn schedule_same_interval_is_noop_and_new_interval_replaces() {
        let mut schedule = PeriodicSchedule::new();
        let ScheduleChange::Started(first) = schedule.start(AUTO_UPDATE_INTERVAL_MS) else {
            panic!("expected start");
        };
        assert_eq!(schedule.start(AUTO_UPDATE_INTERVAL_MS), ScheduleChange::Unchanged);
        assert!(schedule.is_current(first));

        let ScheduleChange::Started(second) = schedule.start(60_000) else {
            panic!("expected restart");
        };
        assert!(!schedule.is_current(first));
        assert!(schedule.is_current(second));
        assert_eq!(schedule.interval_ms(), Some(60_000));

        assert!(schedule.cancel());
        assert!(!schedule.is_current(second));
        assert!(!schedule.cancel());
    }

    #[test]
    fn cancelled_schedule_restarts_at_same_interval() {
        let mut schedule = PeriodicSchedule::new();
        let ScheduleChange::Started(first) = schedule.start(AUTO_UPDATE_INTERVAL_MS) else {
            panic!("first start should start");
        };
        assert!(schedule.cancel());
        assert!(!schedule.is_current(first));
        assert_eq!(schedule.interval_ms(), None);

        let ScheduleChange::Started(second) = schedule.start(AUTO_UPDATE_INTERVAL_MS) else {
            panic!("start after cancel should start again");
        };
        assert_ne!(first, second);
        assert!(schedule.is_current(second));
    }

    #[test]
    fn schedule_clamps_tiny_intervals() {
        let mut schedule = PeriodicSchedule::new();
        schedule.start(0);
        assert_eq!(schedule.interval_ms(), Some(MIN_INTERVAL_MS));
    }

    #[test]
    fn weather_failure_does_not_hide_other_steps() {
        let mut report = RefreshAllReport::default();
        report.record(RefreshStep::FloodZones, Ok(()));
        report.record(RefreshStep::Statistics, Ok(()));
        report.record(RefreshStep::Weather, Err(ApiError::Transport("timeout".into())));
        report.record(RefreshStep::RecentReports, Ok(()));

        assert_eq!(report.failed().count(), 1);
        let ok: Vec<_> = report.succeeded().collect();
        assert_eq!(
            ok,
            [RefreshStep::FloodZones, RefreshStep::Statistics, RefreshStep::RecentReports]
        );
        let (level, message) = report.summary();
        assert_eq!(level, NotificationLevel::Warning);
        assert_eq!(message, "Refreshed with errors: could not load weather");
    }

    #[test]
    fn all_steps_ok_is_success() {
        let mut report = RefreshAllReport::default();
        for step in RefreshStep::ALL {
            report.record(step, Ok(()));
        }
        assert_eq!(report.summary().0, NotificationLevel::Success);
    }

    #[test]
    fn gate_ignores_reentrant_run() {
        let mut gate = RefreshAllGate::default();
        assert!(gate.try_begin());
        assert!(!gate.try_begin());
        gate.finish();
        assert!(gate.try_begin());
    }
}
