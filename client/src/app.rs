use std::cell::RefCell;

use gloo_storage::Storage;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use hanoi_flood_shared::api::{CheckFloodResponse, RecentReport, Statistics, WeatherResponse};
use hanoi_flood_shared::dashboard::SYSTEM_NAME;
use hanoi_flood_shared::geo::{HANOI_BOUNDS, LatLng};
use hanoi_flood_shared::refresh::{
    AUTO_UPDATE_INTERVAL_MS, LayerRefresher, WEATHER_REFRESH_INTERVAL_MS,
};
use hanoi_flood_shared::{NotificationQueue, PredictionSession};

use crate::canvas::MapCanvas;
use crate::colors::{report_severity, rgb_hex, zone_color};
use crate::config::{SETTINGS_KEY, SIDEBAR_WIDTH, TOAST_CAPACITY};
use crate::dashboard::DashboardModal;
use crate::prediction::{PredictionModal, Session, close_prediction};
use crate::refresher::{
    RefreshAll, Schedules, cancel_auto_update, cancel_weather_refresh, load_recent_reports,
    load_statistics, load_weather, refresh_all, refresh_now, setup_auto_update,
    setup_weather_refresh,
};
use crate::sidebar::Sidebar;
use crate::spatial::{FeatureRef, Layer};
use crate::time_format::format_clock;
use crate::timers::{IntervalBinding, now_ms, start_interval};
use crate::toast::{ToastHost, Toasts};
use crate::viewport::Viewport;

const HEADER_HEIGHT: f64 = 48.0;

/// Size of the map area, falling back to the window when it is not mounted yet.
pub(crate) fn canvas_dimensions() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    if let Some(root) = window
        .document()
        .and_then(|d| d.query_selector("[data-map-root]").ok().flatten())
        && root.client_width() > 0
    {
        return (root.client_width() as f64, root.client_height() as f64);
    }
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h - HEADER_HEIGHT)
}

/// Geographic point under the middle of the map.
pub(crate) fn map_center(viewport: RwSignal<Viewport>) -> LatLng {
    let (w, h) = canvas_dimensions();
    viewport.with_untracked(|vp| vp.screen_to_latlng(w / 2.0, h / 2.0))
}

struct KeydownBinding {
    window: web_sys::Window,
    _handler: wasm_bindgen::closure::Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

struct ResizeBinding {
    window: web_sys::Window,
    _handler: wasm_bindgen::closure::Closure<dyn Fn()>,
}

thread_local! {
    static CLOCK_BINDING: RefCell<Option<IntervalBinding>> = const { RefCell::new(None) };
    static KEYDOWN_BINDING: RefCell<Option<KeydownBinding>> = const { RefCell::new(None) };
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

/// Everything the map canvas draws from.
#[derive(Clone, Copy)]
pub(crate) struct MapViewState {
    pub layers: RwSignal<LayerRefresher>,
    pub viewport: RwSignal<Viewport>,
    pub hovered: RwSignal<Option<FeatureRef>>,
    pub selected: RwSignal<Option<FeatureRef>>,
    /// Last location the user clicked or searched for.
    pub picked: RwSignal<Option<LatLng>>,
}

/// Side panel data loaded independently of the map layers.
#[derive(Clone, Copy)]
pub(crate) struct SideData {
    pub weather: RwSignal<Option<WeatherResponse>>,
    pub statistics: RwSignal<Option<Statistics>>,
    pub recent: RwSignal<Vec<RecentReport>>,
    pub flood_check: RwSignal<Option<CheckFloodResponse>>,
    pub checking: RwSignal<bool>,
    pub check_nonce: StoredValue<u32>,
}

#[derive(Clone, Copy)]
pub(crate) struct SidebarOpen(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct AutoUpdate(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct DashboardOpen(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct MousePos(pub RwSignal<(f64, f64)>);
/// Epoch milliseconds, advanced once a second.
#[derive(Clone, Copy)]
pub(crate) struct Clock(pub RwSignal<i64>);

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct Settings {
    auto_update: bool,
    sidebar_open: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_update: true,
            sidebar_open: true,
        }
    }
}

#[component]
pub fn App() -> impl IntoView {
    let saved: Settings = gloo_storage::LocalStorage::get(SETTINGS_KEY).unwrap_or_default();

    let view_state = MapViewState {
        layers: RwSignal::new(LayerRefresher::new()),
        viewport: RwSignal::new(Viewport::default()),
        hovered: RwSignal::new(None),
        selected: RwSignal::new(None),
        picked: RwSignal::new(None),
    };
    let data = SideData {
        weather: RwSignal::new(None),
        statistics: RwSignal::new(None),
        recent: RwSignal::new(Vec::new()),
        flood_check: RwSignal::new(None),
        checking: RwSignal::new(false),
        check_nonce: StoredValue::new(0),
    };
    let toasts = Toasts(RwSignal::new(NotificationQueue::new(TOAST_CAPACITY)));
    let session = Session(RwSignal::new(PredictionSession::new()));
    let schedules = Schedules::new();
    let gate = RefreshAll(RwSignal::new(Default::default()));
    let sidebar_open = RwSignal::new(saved.sidebar_open);
    let auto_update = RwSignal::new(saved.auto_update);
    let dashboard_open = RwSignal::new(false);
    let mouse_pos = RwSignal::new((0.0, 0.0));
    let clock = RwSignal::new(now_ms() as i64);

    provide_context(view_state);
    provide_context(data);
    provide_context(toasts);
    provide_context(session);
    provide_context(schedules);
    provide_context(gate);
    provide_context(SidebarOpen(sidebar_open));
    provide_context(AutoUpdate(auto_update));
    provide_context(DashboardOpen(dashboard_open));
    provide_context(MousePos(mouse_pos));
    provide_context(Clock(clock));

    Effect::new(move || {
        let settings = Settings {
            auto_update: auto_update.get(),
            sidebar_open: sidebar_open.get(),
        };
        if let Err(e) = gloo_storage::LocalStorage::set(SETTINGS_KEY, &settings) {
            web_sys::console::warn_1(&format!("settings: save failed: {e}").into());
        }
    });

    Effect::new(move || {
        let binding = start_interval(1_000, move || {
            clock.try_set(now_ms() as i64);
        });
        CLOCK_BINDING.with(|slot| *slot.borrow_mut() = binding);
    });
    on_cleanup(|| {
        CLOCK_BINDING.with(|slot| slot.borrow_mut().take());
    });

    // Initial load: layers first, side panels alongside.
    Effect::new(move || {
        refresh_now(view_state, toasts);
        spawn_local(async move {
            if let Err(err) = load_statistics(data).await {
                web_sys::console::warn_1(&format!("startup: statistics failed: {err}").into());
            }
        });
        spawn_local(async move {
            if let Err(err) = load_recent_reports(data).await {
                web_sys::console::warn_1(&format!("startup: recent reports failed: {err}").into());
            }
        });
        spawn_local(async move {
            if let Err(err) = load_weather(view_state, data).await {
                web_sys::console::warn_1(&format!("startup: weather failed: {err}").into());
            }
        });
        setup_weather_refresh(view_state, data, toasts, schedules, WEATHER_REFRESH_INTERVAL_MS);
        on_cleanup(move || cancel_weather_refresh(schedules));
    });

    Effect::new(move || {
        if auto_update.get() {
            setup_auto_update(view_state, toasts, schedules, AUTO_UPDATE_INTERVAL_MS);
        } else {
            cancel_auto_update(schedules);
        }
    });
    on_cleanup(move || cancel_auto_update(schedules));

    // Global keyboard shortcuts
    Effect::new(move || {
        use wasm_bindgen::prelude::*;

        let Some(window) = web_sys::window() else {
            return;
        };

        KEYDOWN_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "keydown",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });

        let handler =
            Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(move |e: web_sys::KeyboardEvent| {
                let key = e.key();
                let target_tag = e
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                    .map(|el| el.tag_name())
                    .unwrap_or_default();

                if matches!(target_tag.as_str(), "INPUT" | "TEXTAREA" | "SELECT") {
                    if key == "Escape"
                        && let Some(el) = e
                            .target()
                            .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                    {
                        el.blur().ok();
                    }
                    return;
                }

                match key.as_str() {
                    "Escape" => {
                        close_prediction(session);
                        dashboard_open.set(false);
                        view_state.selected.set(None);
                        view_state.hovered.set(None);
                    }
                    "/" => {
                        e.prevent_default();
                        let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
                            return;
                        };
                        if let Some(el) = doc.query_selector("[data-search-input]").ok().flatten()
                            && let Ok(input) = el.dyn_into::<web_sys::HtmlElement>()
                        {
                            sidebar_open.set(true);
                            input.focus().ok();
                        }
                    }
                    "r" => refresh_all(view_state, data, toasts, gate),
                    "d" => dashboard_open.update(|v| *v = !*v),
                    "0" => {
                        let (cw, ch) = canvas_dimensions();
                        view_state
                            .viewport
                            .update(|vp| vp.fit_latlng_bounds(&HANOI_BOUNDS, cw, ch));
                    }
                    "+" | "=" => {
                        e.prevent_default();
                        let (cw, ch) = canvas_dimensions();
                        view_state
                            .viewport
                            .update(|vp| vp.zoom_at(-120.0, cw / 2.0, ch / 2.0));
                    }
                    "-" => {
                        e.prevent_default();
                        let (cw, ch) = canvas_dimensions();
                        view_state
                            .viewport
                            .update(|vp| vp.zoom_at(120.0, cw / 2.0, ch / 2.0));
                    }
                    _ => {}
                }
            });

        if window
            .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            KEYDOWN_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(KeydownBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    // The canvas sizes itself on each frame; a resize only needs a redraw.
    Effect::new(move || {
        use wasm_bindgen::prelude::*;

        let Some(window) = web_sys::window() else {
            return;
        };
        RESIZE_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "resize",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });
        let handler = Closure::<dyn Fn()>::new(move || {
            view_state.viewport.try_update(|_| {});
        });
        if window
            .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            RESIZE_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(ResizeBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    view! {
        <div style="width: 100%; height: 100%; display: flex; flex-direction: column; background: #0c1018; color: #e4e8ef; font-family: 'Inter', system-ui, sans-serif;">
            <Header />
            <div style="flex: 1; position: relative; overflow: hidden;">
                <div data-map-root="" style="position: absolute; inset: 0;">
                    <MapCanvas />
                </div>
                <div
                    style=format!("position: absolute; top: 0; right: 0; bottom: 0; width: {SIDEBAR_WIDTH}px; transition: transform 0.2s ease; z-index: 10;")
                    style:transform=move || if sidebar_open.get() { "translateX(0)" } else { "translateX(100%)" }
                >
                    <SidebarToggle />
                    <Sidebar />
                </div>
            </div>
        </div>
        <Tooltip />
        <PredictionModal />
        <DashboardModal />
        <ToastHost />
    }
}

#[component]
fn Header() -> impl IntoView {
    let view_state: MapViewState = expect_context();
    let data: SideData = expect_context();
    let toasts: Toasts = expect_context();
    let gate: RefreshAll = expect_context();
    let RefreshAll(gate_state) = gate;
    let AutoUpdate(auto_update) = expect_context();
    let DashboardOpen(dashboard_open) = expect_context();
    let Clock(clock) = expect_context();

    let running = Memo::new(move |_| gate_state.with(|g| g.is_running()));
    let loading = Memo::new(move |_| view_state.layers.with(|r| r.is_loading()));

    view! {
        <header style=format!("height: {HEADER_HEIGHT}px; flex-shrink: 0; display: flex; align-items: center; gap: 14px; padding: 0 16px; background: #111620; border-bottom: 1px solid #232a38;")>
            <span style="font-size: 0.95rem; font-weight: 700; letter-spacing: 0.02em;">{SYSTEM_NAME}</span>
            <span style="font-size: 0.72rem; color: #7d8799; font-family: 'JetBrains Mono', monospace; font-variant-numeric: tabular-nums;">
                {move || format_clock(clock.get())}
            </span>
            {move || loading.get().then(|| view! {
                <span style="font-size: 0.7rem; color: #5dade2;">"Updating\u{2026}"</span>
            })}
            <div style="margin-left: auto; display: flex; align-items: center; gap: 8px;">
                <span
                    title="Auto-refresh"
                    style=move || format!(
                        "width: 8px; height: 8px; border-radius: 50%; background: {};",
                        if auto_update.get() { "#27ae60" } else { "#4a5263" }
                    )
                />
                <button
                    style="background: #232a38; color: #c9d1dc; border: 1px solid #323b4d; border-radius: 5px; padding: 5px 10px; cursor: pointer; font-size: 0.78rem;"
                    disabled=move || running.get()
                    on:click=move |_| refresh_all(view_state, data, toasts, gate)
                >
                    {move || if running.get() { "Refreshing\u{2026}" } else { "Refresh all" }}
                </button>
                <button
                    style="background: #2d6cdf; color: #fff; border: none; border-radius: 5px; padding: 5px 10px; cursor: pointer; font-size: 0.78rem;"
                    on:click=move |_| dashboard_open.set(true)
                >
                    "Drainage dashboard"
                </button>
            </div>
        </header>
    }
}

/// Toggle button for showing/hiding the sidebar. Attached to the sidebar's left edge.
#[component]
fn SidebarToggle() -> impl IntoView {
    let SidebarOpen(sidebar_open) = expect_context();

    view! {
        <button
            title=move || if sidebar_open.get() { "Hide sidebar" } else { "Show sidebar" }
            style="position: absolute; top: 14px; left: -42px; z-index: 11; width: 32px; height: 32px; background: #111620; border: 1px solid #283042; border-radius: 6px; cursor: pointer; color: #7d8799; font-size: 1.1rem; line-height: 1;"
            on:click=move |_| sidebar_open.update(|v| *v = !*v)
            on:mouseenter=move |e| {
                if let Some(el) = e.target().and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok()) {
                    el.style().set_property("border-color", "rgba(93,173,226,0.5)").ok();
                    el.style().set_property("color", "#5dade2").ok();
                }
            }
            on:mouseleave=move |e| {
                if let Some(el) = e.target().and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok()) {
                    el.style().set_property("border-color", "#283042").ok();
                    el.style().set_property("color", "#7d8799").ok();
                }
            }
        >
            {move || if sidebar_open.get() { "\u{00BB}" } else { "\u{00AB}" }}
        </button>
    }
}

/// Follows the cursor while a zone or report is hovered.
#[component]
fn Tooltip() -> impl IntoView {
    let view_state: MapViewState = expect_context();
    let MousePos(mouse_pos) = expect_context();

    let info = Memo::new(move |_| {
        let target = view_state.hovered.get()?;
        view_state.layers.with(|r| {
            let feature = r.state().and_then(|s| target.resolve(s))?;
            let p = &feature.properties;
            let (color, detail) = match target.layer {
                Layer::Zone => (
                    zone_color(feature),
                    p.max_depth
                        .map(|d| format!("{} \u{00B7} up to {d:.0} cm", p.zone_kind().label()))
                        .unwrap_or_else(|| p.zone_kind().label().to_owned()),
                ),
                Layer::Report => (
                    report_severity(feature).color_rgb(),
                    p.water_depth
                        .map(|d| format!("Reported {d:.0} cm"))
                        .unwrap_or_else(|| "Flood report".to_owned()),
                ),
            };
            Some((p.title().to_owned(), detail, rgb_hex(color)))
        })
    });

    move || {
        let Some((title, detail, color)) = info.get() else {
            return ().into_any();
        };
        let (x, y) = mouse_pos.get();
        view! {
            <div
                style:left=format!("{}px", x + 14.0)
                style:top=format!("{}px", y - 6.0)
                style="position: fixed; pointer-events: none; z-index: 100; background: #161c28; border: 1px solid #283042; border-radius: 6px; padding: 6px 9px; max-width: 240px; box-shadow: 0 4px 16px rgba(0,0,0,0.5);"
            >
                <div style=format!("font-size: 0.8rem; font-weight: 600; border-left: 3px solid {color}; padding-left: 6px;")>{title}</div>
                <div style="font-size: 0.7rem; color: #9aa5b5; margin-top: 2px;">{detail}</div>
            </div>
        }
        .into_any()
    }
}
