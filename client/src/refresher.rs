//! Drives the map layers and the side panels: one-shot refreshes, the
//! auto-update and weather schedules, and "refresh everything".

use std::cell::RefCell;
use std::thread::LocalKey;

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use hanoi_flood_shared::ApiError;
use hanoi_flood_shared::refresh::{
    PeriodicSchedule, REPORT_RELOAD_DELAY_MS, RefreshAllGate, RefreshAllReport, RefreshOutcome,
    RefreshStep, ScheduleChange,
};

use crate::api;
use crate::app::{MapViewState, SideData, map_center};
use crate::config::RECENT_REPORTS_LIMIT;
use crate::timers::{IntervalBinding, now_ms, start_interval};
use crate::toast::Toasts;

thread_local! {
    static AUTO_UPDATE_BINDING: RefCell<Option<IntervalBinding>> = const { RefCell::new(None) };
    static WEATHER_BINDING: RefCell<Option<IntervalBinding>> = const { RefCell::new(None) };
}

/// Ownership records for the two periodic jobs.
#[derive(Clone, Copy)]
pub(crate) struct Schedules {
    pub auto_update: StoredValue<PeriodicSchedule>,
    pub weather: StoredValue<PeriodicSchedule>,
}

impl Schedules {
    pub fn new() -> Self {
        Self {
            auto_update: StoredValue::new(PeriodicSchedule::new()),
            weather: StoredValue::new(PeriodicSchedule::new()),
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct RefreshAll(pub RwSignal<RefreshAllGate>);

/// Fetch the flood layers once and apply them if nothing newer landed
/// meanwhile. On failure the current layers stay on screen.
pub async fn refresh_layers(view: MapViewState) -> Result<(), ApiError> {
    let Some(ticket) = view.layers.try_update(|r| r.begin()) else {
        return Ok(());
    };
    let result = api::fetch_flood_layers().await;
    if let Ok(layers) = &result
        && layers.skipped > 0
    {
        web_sys::console::warn_1(
            &format!(
                "refresh: skipped {} malformed features, kept {}",
                layers.skipped,
                layers.feature_count()
            )
            .into(),
        );
    }
    let outcome = view
        .layers
        .try_update(|r| r.complete(ticket, result, now_ms()));
    match outcome {
        Some(RefreshOutcome::Applied { zones, reports }) => {
            web_sys::console::info_1(
                &format!("refresh: seq={} zones={zones} reports={reports}", ticket.seq).into(),
            );
            Ok(())
        }
        Some(RefreshOutcome::Stale) | None => {
            web_sys::console::info_1(&format!("refresh: seq={} superseded", ticket.seq).into());
            Ok(())
        }
        Some(RefreshOutcome::Failed(err)) => {
            web_sys::console::warn_1(&format!("refresh: seq={} failed: {err}", ticket.seq).into());
            Err(err)
        }
    }
}

pub fn refresh_now(view: MapViewState, toasts: Toasts) {
    spawn_local(async move {
        if let Err(err) = refresh_layers(view).await {
            toasts.error(format!("Could not load flood data. {}", err.user_message()));
        }
    });
}

/// Layers again after a short delay, so a freshly submitted report shows up.
pub fn schedule_layer_reload(view: MapViewState, toasts: Toasts) {
    Timeout::new(REPORT_RELOAD_DELAY_MS, move || refresh_now(view, toasts)).forget();
}

fn install_periodic(
    slot: &'static LocalKey<RefCell<Option<IntervalBinding>>>,
    schedule: StoredValue<PeriodicSchedule>,
    interval_ms: u32,
    job: impl Fn() + 'static,
) {
    let Some(change) = schedule.try_update_value(|s| s.start(interval_ms)) else {
        return;
    };
    let ScheduleChange::Started(token) = change else {
        return;
    };
    let Some(period) = schedule.with_value(|s| s.interval_ms()) else {
        return;
    };
    let binding = start_interval(period, move || {
        if schedule.try_with_value(|s| s.is_current(token)) == Some(true) {
            job();
        }
    });
    if binding.is_none() {
        // Not running, so the next setup with this interval must start it again.
        schedule.try_update_value(|s| s.cancel());
        web_sys::console::error_1(&format!("periodic: could not start {period} ms interval").into());
    }
    // Replacing the slot drops, and so clears, any previous interval.
    slot.with(|s| *s.borrow_mut() = binding);
}

fn clear_periodic(
    slot: &'static LocalKey<RefCell<Option<IntervalBinding>>>,
    schedule: StoredValue<PeriodicSchedule>,
) {
    schedule.try_update_value(|s| s.cancel());
    slot.with(|s| s.borrow_mut().take());
}

/// Periodic layer refresh. Same interval while running is a no-op; a new
/// interval replaces the old timer.
pub fn setup_auto_update(
    view: MapViewState,
    toasts: Toasts,
    schedules: Schedules,
    interval_ms: u32,
) {
    install_periodic(&AUTO_UPDATE_BINDING, schedules.auto_update, interval_ms, move || {
        refresh_now(view, toasts)
    });
}

pub fn cancel_auto_update(schedules: Schedules) {
    clear_periodic(&AUTO_UPDATE_BINDING, schedules.auto_update);
}

pub fn setup_weather_refresh(
    view: MapViewState,
    data: SideData,
    toasts: Toasts,
    schedules: Schedules,
    interval_ms: u32,
) {
    install_periodic(&WEATHER_BINDING, schedules.weather, interval_ms, move || {
        spawn_local(async move {
            if let Err(err) = load_weather(view, data).await {
                toasts.warning(format!("Weather update failed. {}", err.user_message()));
            }
        });
    });
}

pub fn cancel_weather_refresh(schedules: Schedules) {
    clear_periodic(&WEATHER_BINDING, schedules.weather);
}

pub async fn load_weather(view: MapViewState, data: SideData) -> Result<(), ApiError> {
    let at = map_center(view.viewport);
    let weather = api::weather(at).await?;
    data.weather.try_set(Some(weather));
    Ok(())
}

pub async fn load_statistics(data: SideData) -> Result<(), ApiError> {
    let resp = api::statistics().await?;
    data.statistics.try_set(Some(resp.stats));
    Ok(())
}

pub async fn load_recent_reports(data: SideData) -> Result<(), ApiError> {
    let resp = api::recent_reports(RECENT_REPORTS_LIMIT).await?;
    data.recent.try_set(resp.reports);
    Ok(())
}

/// Runs every step in order. A failing step is recorded and the next one
/// still runs; the user gets one summary toast at the end.
pub fn refresh_all(
    view: MapViewState,
    data: SideData,
    toasts: Toasts,
    gate: RefreshAll,
) {
    let RefreshAll(gate) = gate;
    if gate.try_update(|g| g.try_begin()) != Some(true) {
        web_sys::console::info_1(&"refresh-all: already running".into());
        return;
    }
    spawn_local(async move {
        let mut report = RefreshAllReport::default();
        for step in RefreshStep::ALL {
            let result = match step {
                RefreshStep::FloodZones => refresh_layers(view).await,
                RefreshStep::Statistics => load_statistics(data).await,
                RefreshStep::Weather => load_weather(view, data).await,
                RefreshStep::RecentReports => load_recent_reports(data).await,
            };
            if let Err(err) = &result {
                web_sys::console::warn_1(
                    &format!("refresh-all: step={} failed: {err}", step.label()).into(),
                );
            }
            report.record(step, result);
        }
        let ok: Vec<&str> = report.succeeded().map(RefreshStep::label).collect();
        web_sys::console::info_1(&format!("refresh-all: ok=[{}]", ok.join(", ")).into());
        let (level, message) = report.summary();
        toasts.push(level, message);
        gate.try_update(|g| g.finish());
    });
}
