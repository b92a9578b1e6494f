use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use hanoi_flood_shared::api::{
    AreaStatusResponse, CheckFloodResponse, DEFAULT_AREA_RADIUS_M, NearbyItem, SearchResult,
};
use hanoi_flood_shared::geo::{Feature, LatLng, Severity};
use hanoi_flood_shared::report::{ReportDraft, validate_search_query};
use hanoi_flood_shared::{ApiError, PredictionContext};

use crate::api;
use crate::app::{AutoUpdate, Clock, MapViewState, SideData, canvas_dimensions, map_center};
use crate::colors::{report_severity, rgb_hex, zone_legend};
use crate::config::{AREA_RADIUS_CHOICES_M, SIDEBAR_WIDTH};
use crate::prediction::{Session, start_prediction};
use crate::refresher::schedule_layer_reload;
use crate::spatial::Layer;
use crate::time_format::{format_age, format_timestamp};
use crate::toast::Toasts;

const SEARCH_ZOOM_SCALE: f64 = 0.25;
const DEFAULT_PREDICT_DEPTH_CM: f64 = 30.0;

const PANEL_STYLE: &str = "padding: 14px 20px; border-bottom: 1px solid #232a38;";
const LABEL_STYLE: &str = "font-size: 0.7rem; color: #7d8799; margin-bottom: 3px;";
const INPUT_STYLE: &str = "width: 100%; box-sizing: border-box; padding: 7px 9px; background: #182030; border: 1px solid #283042; border-radius: 5px; color: #e4e8ef; font-size: 0.82rem; outline: none;";
const PRIMARY_BUTTON: &str = "background: #2d6cdf; color: #fff; border: none; border-radius: 5px; padding: 7px 12px; cursor: pointer; font-size: 0.8rem;";
const SECONDARY_BUTTON: &str = "background: #232a38; color: #c9d1dc; border: 1px solid #323b4d; border-radius: 5px; padding: 6px 10px; cursor: pointer; font-size: 0.78rem;";

fn target_value(e: &leptos::ev::Event) -> Option<String> {
    let target = e.target()?;
    if let Some(input) = target.dyn_ref::<web_sys::HtmlInputElement>() {
        return Some(input.value());
    }
    if let Some(area) = target.dyn_ref::<web_sys::HtmlTextAreaElement>() {
        return Some(area.value());
    }
    target
        .dyn_ref::<web_sys::HtmlSelectElement>()
        .map(|select| select.value())
}

fn bind(field: RwSignal<String>) -> impl Fn(leptos::ev::Event) + Copy + 'static {
    move |e| {
        if let Some(value) = target_value(&e) {
            field.set(value);
        }
    }
}

/// Run a flood check for `at` and show it in the location panel. A newer
/// check supersedes an older one still in flight.
pub fn check_location(at: LatLng, data: SideData, toasts: Toasts) {
    let request_nonce = data.check_nonce.get_value().wrapping_add(1);
    data.check_nonce.set_value(request_nonce);
    data.checking.set(true);
    spawn_local(async move {
        let result = api::check_flood(at).await;
        if data.check_nonce.try_get_value() != Some(request_nonce) {
            return;
        }
        data.checking.try_set(false);
        match result {
            Ok(check) => {
                data.flood_check.try_set(Some(check));
            }
            Err(err) => {
                web_sys::console::warn_1(&format!("check-flood: failed: {err}").into());
                toasts.error(format!("Flood check failed. {}", err.user_message()));
            }
        }
    });
}

fn focus_location(view: MapViewState, at: LatLng) {
    let (cw, ch) = canvas_dimensions();
    view.viewport
        .update(|vp| vp.center_on(at, SEARCH_ZOOM_SCALE, cw, ch));
    view.picked.set(Some(at));
}

#[component]
pub fn Sidebar() -> impl IntoView {
    view! {
        <div style=format!("width: {SIDEBAR_WIDTH}px; height: 100%; overflow-y: auto; background: #111620; border-left: 1px solid #232a38; color: #e4e8ef; font-family: 'Inter', system-ui, sans-serif;")>
            <SearchPanel />
            <LocationPanel />
            <AreaStatusPanel />
            <ReportPanel />
            <WeatherPanel />
            <StatisticsPanel />
            <RecentReportsPanel />
            <LegendPanel />
            <SettingsPanel />
        </div>
    }
}

#[component]
fn SectionHeader(title: &'static str) -> impl IntoView {
    view! {
        <div style="font-size: 0.66rem; text-transform: uppercase; letter-spacing: 0.1em; color: #7d8799; margin-bottom: 8px;">
            {title}
        </div>
    }
}

#[component]
fn SearchPanel() -> impl IntoView {
    let view: MapViewState = expect_context();
    let data: SideData = expect_context();
    let toasts: Toasts = expect_context();

    let query = RwSignal::new(String::new());
    let results: RwSignal<Vec<SearchResult>> = RwSignal::new(Vec::new());
    let searching = RwSignal::new(false);
    let nonce = StoredValue::new(0u32);

    let run_search = move || {
        let raw = query.get_untracked();
        let q = match validate_search_query(&raw) {
            Ok(q) => q.to_owned(),
            Err(err) => {
                toasts.warning(err.to_string());
                return;
            }
        };
        let request_nonce = nonce.get_value().wrapping_add(1);
        nonce.set_value(request_nonce);
        searching.set(true);
        spawn_local(async move {
            let result = api::search(&q).await;
            if nonce.try_get_value() != Some(request_nonce) {
                return;
            }
            searching.try_set(false);
            match result {
                Ok(resp) => {
                    if resp.results.is_empty() {
                        toasts.info(resp.message.unwrap_or_else(|| "No places found".to_owned()));
                    }
                    results.try_set(resp.results);
                }
                Err(err) => toasts.error(format!("Search failed. {}", err.user_message())),
            }
        });
    };

    view! {
        <div style=PANEL_STYLE>
            <form
                style="display: flex; gap: 6px;"
                on:submit=move |e| {
                    e.prevent_default();
                    run_search();
                }
            >
                <input
                    data-search-input=""
                    type="text"
                    placeholder="Search a street, ward or district..."
                    style=INPUT_STYLE
                    prop:value=move || query.get()
                    on:input=bind(query)
                />
                <button type="submit" style=PRIMARY_BUTTON disabled=move || searching.get()>
                    "Search"
                </button>
            </form>
            <div style="margin-top: 6px;">
                {move || {
                    results
                        .get()
                        .into_iter()
                        .map(|r| {
                            let at = r.position();
                            view! {
                                <div
                                    style="padding: 6px 4px; font-size: 0.78rem; color: #c9d1dc; cursor: pointer; border-bottom: 1px solid #1c2331;"
                                    on:click=move |_| {
                                        focus_location(view, at);
                                        check_location(at, data, toasts);
                                        results.set(Vec::new());
                                    }
                                >
                                    {r.display_name}
                                </div>
                            }
                        })
                        .collect_view()
                }}
            </div>
        </div>
    }
}

fn nearby_row(item: NearbyItem) -> impl IntoView {
    let depth = item.depth_cm();
    let color = depth
        .map(|d| rgb_hex(Severity::from_depth_cm(d).color_rgb()))
        .unwrap_or_else(|| "#7f8c8d".to_owned());
    let distance = item.distance.map(|d| format!("{d:.0} m"));
    let title = item.title().to_owned();
    view! {
        <div style="display: flex; align-items: center; gap: 6px; padding: 3px 0; font-size: 0.75rem;">
            <span style=format!("width: 8px; height: 8px; border-radius: 50%; background: {color}; flex-shrink: 0;") />
            <span style="flex: 1; color: #c9d1dc; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">{title}</span>
            <span style="color: #7d8799;">{depth.map(|d| format!("{d:.0} cm"))}</span>
            <span style="color: #5d6778;">{distance}</span>
        </div>
    }
}

fn flood_check_view(check: CheckFloodResponse) -> impl IntoView {
    let fc = check.flood_check;
    let (headline, color) = if fc.has_flood {
        ("Flooding reported nearby", "#e74c3c")
    } else if fc.has_risk {
        ("Flood risk in this area", "#f39c12")
    } else {
        ("No flooding reported", "#27ae60")
    };
    let place = check
        .location
        .address
        .clone()
        .or_else(|| check.location.district.clone());
    let weather = check.weather.map(|w| {
        format!(
            "{} \u{00B7} {}\u{00B0}C \u{00B7} rain {} mm",
            w.description.unwrap_or_default(),
            w.temp.map_or("-".to_owned(), |t| format!("{t:.0}")),
            w.rain.map_or("0".to_owned(), |r| format!("{r:.1}")),
        )
    });
    view! {
        <div style="margin-top: 8px; padding: 8px 10px; background: #161c28; border-radius: 6px;">
            {place.map(|p| view! { <div style="font-size: 0.75rem; color: #9aa5b5;">{p}</div> })}
            <div style=format!("font-size: 0.85rem; font-weight: 600; color: {color}; margin-top: 2px;")>{headline}</div>
            {fc.risk_level.map(|r| view! { <div style="font-size: 0.72rem; color: #9aa5b5;">"Risk level: " {r}</div> })}
            {fc.message.map(|m| view! { <div style="font-size: 0.75rem; color: #c9d1dc; margin-top: 4px;">{m}</div> })}
            {weather.map(|w| view! { <div style="font-size: 0.72rem; color: #7d8799; margin-top: 4px;">{w}</div> })}
            {(!fc.nearby_data.is_empty()).then(|| view! {
                <div style="margin-top: 6px;">
                    {fc.nearby_data.into_iter().map(nearby_row).collect_view()}
                </div>
            })}
        </div>
    }
}

fn feature_details(feature: &Feature, layer: Layer) -> impl IntoView + use<> {
    let p = &feature.properties;
    let mut rows: Vec<(&'static str, String)> = Vec::new();
    match layer {
        Layer::Zone => {
            rows.push(("Type", p.zone_kind().label().to_owned()));
            if let Some(d) = p.max_depth {
                rows.push(("Max depth", format!("{d:.0} cm")));
            }
            if let Some(n) = p.report_count {
                rows.push(("Reports", n.to_string()));
            }
            if let Some(cause) = p.flood_cause.clone() {
                rows.push(("Cause", cause));
            }
            if let Some(t) = p.last_reported.as_deref() {
                rows.push(("Last reported", format_timestamp(t)));
            }
        }
        Layer::Report => {
            let severity = report_severity(feature);
            let label = p
                .severity_display
                .clone()
                .unwrap_or_else(|| format!("{severity:?}"));
            rows.push(("Severity", label));
            if let Some(d) = p.water_depth {
                rows.push(("Water depth", format!("{d:.0} cm")));
            }
            if let Some(t) = p.created_at.as_deref() {
                rows.push(("Reported", format_timestamp(t)));
            }
            if let Some(name) = p.reporter_name.clone() {
                rows.push(("By", name));
            }
        }
    }
    for (label, value) in [("District", p.district.clone()), ("Ward", p.ward.clone())] {
        if let Some(v) = value {
            rows.push((label, v));
        }
    }
    let title = p.title().to_owned();
    let description = p.description.clone();
    view! {
        <div style="margin-top: 8px;">
            <div style="font-size: 0.9rem; font-weight: 600;">{title}</div>
            {rows.into_iter().map(|(label, value)| view! {
                <div style="display: flex; justify-content: space-between; gap: 8px; font-size: 0.75rem; padding: 2px 0;">
                    <span style="color: #7d8799;">{label}</span>
                    <span style="color: #c9d1dc; text-align: right;">{value}</span>
                </div>
            }).collect_view()}
            {description.map(|d| view! { <div style="font-size: 0.75rem; color: #9aa5b5; margin-top: 4px;">{d}</div> })}
        </div>
    }
}

#[component]
fn LocationPanel() -> impl IntoView {
    let view: MapViewState = expect_context();
    let data: SideData = expect_context();
    let toasts: Toasts = expect_context();
    let session: Session = expect_context();
    let depth = RwSignal::new(format!("{DEFAULT_PREDICT_DEPTH_CM}"));

    // Prefill the depth from the deepest nearby observation.
    Effect::new(move || {
        let deepest = data.flood_check.with(|c| {
            c.as_ref().and_then(|c| {
                c.flood_check
                    .nearby_data
                    .iter()
                    .filter_map(NearbyItem::depth_cm)
                    .reduce(f64::max)
            })
        });
        if let Some(d) = deepest {
            depth.set(format!("{d:.0}"));
        }
    });

    let selected_report_id = Memo::new(move |_| {
        let target = view.selected.get()?;
        if target.layer != Layer::Report {
            return None;
        }
        view.layers.with(|r| {
            r.state()
                .and_then(|s| target.resolve(s))
                .and_then(|f| f.properties.id.clone())
        })
    });

    let predict = move |_| {
        let Some(at) = view.picked.get_untracked() else {
            toasts.warning("Pick a location on the map first");
            return;
        };
        let depth_raw = depth.get_untracked();
        let Ok(depth_cm) = depth_raw.trim().replace(',', ".").parse::<f64>() else {
            toasts.warning("Enter the water depth in centimetres");
            return;
        };
        let name = data
            .flood_check
            .with_untracked(|c| c.as_ref().and_then(|c| c.location.address.clone()))
            .unwrap_or_default();
        let mut context = PredictionContext::new(at, name, depth_cm);
        if let Some(id) = selected_report_id.get_untracked() {
            context = context.with_report(&id);
        }
        start_prediction(session, toasts, context);
    };

    let details = move || {
        let target = view.selected.get()?;
        view.layers.with(|r| {
            r.state()
                .and_then(|s| target.resolve(s))
                .map(|f| feature_details(f, target.layer))
        })
    };

    view! {
        <Show when=move || view.picked.get().is_some() || view.selected.get().is_some()>
            <div style=PANEL_STYLE>
                <div style="display: flex; justify-content: space-between; align-items: center;">
                    <SectionHeader title="Selected location" />
                    <button
                        title="Clear"
                        style="background: none; border: none; color: #7d8799; cursor: pointer;"
                        on:click=move |_| {
                            view.picked.set(None);
                            view.selected.set(None);
                            data.flood_check.set(None);
                        }
                    >
                        "\u{00D7}"
                    </button>
                </div>
                {move || view.picked.get().map(|p| view! {
                    <div style="font-size: 0.72rem; color: #7d8799; font-family: 'JetBrains Mono', monospace;">
                        {format!("{:.5}, {:.5}", p.lat, p.lng)}
                    </div>
                })}
                {details}
                {move || {
                    if data.checking.get() {
                        view! { <div style="font-size: 0.75rem; color: #7d8799; margin-top: 8px;">"Checking flood status\u{2026}"</div> }.into_any()
                    } else {
                        data.flood_check.get().map(flood_check_view).into_any()
                    }
                }}
                <div style="display: flex; gap: 6px; align-items: flex-end; margin-top: 10px;">
                    <label style="flex: 1;">
                        <div style=LABEL_STYLE>"Water depth (cm)"</div>
                        <input
                            type="text"
                            inputmode="decimal"
                            style=INPUT_STYLE
                            prop:value=move || depth.get()
                            on:input=bind(depth)
                        />
                    </label>
                    <button style=PRIMARY_BUTTON on:click=predict>
                        {move || if selected_report_id.get().is_some() { "Predict for report" } else { "Predict drainage" }}
                    </button>
                </div>
            </div>
        </Show>
    }
}

fn area_status_view(resp: AreaStatusResponse) -> impl IntoView {
    let s = resp.area_status.stats;
    let forecast: Vec<_> = resp.forecast.into_iter().take(6).collect();
    view! {
        <div style="margin-top: 8px;">
            <div style="display: grid; grid-template-columns: repeat(3, 1fr); gap: 6px; text-align: center;">
                <div><div style="font-weight: 700;">{s.total_zones}</div><div style=LABEL_STYLE>"Zones"</div></div>
                <div><div style="font-weight: 700;">{s.total_reports}</div><div style=LABEL_STYLE>"Reports"</div></div>
                <div><div style="font-weight: 700;">{s.recent_reports}</div><div style=LABEL_STYLE>"Last 24 h"</div></div>
            </div>
            {resp.area_status.risk_level.map(|r| view! { <div style="font-size: 0.75rem; margin-top: 4px;">"Risk level: " {r}</div> })}
            {resp.area_status.summary.map(|t| view! { <div style="font-size: 0.75rem; color: #9aa5b5; margin-top: 4px;">{t}</div> })}
            {(!forecast.is_empty()).then(|| view! {
                <div style="display: flex; gap: 4px; overflow-x: auto; margin-top: 8px;">
                    {forecast.into_iter().map(|f| view! {
                        <div style="min-width: 56px; background: #161c28; border-radius: 5px; padding: 4px; text-align: center; font-size: 0.68rem;">
                            <div style="color: #7d8799;">{f.datetime.as_deref().map(format_timestamp).unwrap_or_default()}</div>
                            <div>{f.temp.map(|t| format!("{t:.0}\u{00B0}"))}</div>
                            <div style="color: #5dade2;">{f.rain.map(|r| format!("{r:.1} mm"))}</div>
                        </div>
                    }).collect_view()}
                </div>
            })}
        </div>
    }
}

#[component]
fn AreaStatusPanel() -> impl IntoView {
    let view: MapViewState = expect_context();
    let toasts: Toasts = expect_context();
    let radius = RwSignal::new(DEFAULT_AREA_RADIUS_M);
    let status: RwSignal<Option<AreaStatusResponse>> = RwSignal::new(None);
    let loading = RwSignal::new(false);
    let nonce = StoredValue::new(0u32);

    let load = move |_| {
        let at = view
            .picked
            .get_untracked()
            .unwrap_or_else(|| map_center(view.viewport));
        let radius_m = radius.get_untracked();
        let request_nonce = nonce.get_value().wrapping_add(1);
        nonce.set_value(request_nonce);
        loading.set(true);
        spawn_local(async move {
            let result = api::area_status(at, radius_m).await;
            if nonce.try_get_value() != Some(request_nonce) {
                return;
            }
            loading.try_set(false);
            match result {
                Ok(resp) => {
                    status.try_set(Some(resp));
                }
                Err(err) => toasts.error(format!("Area status failed. {}", err.user_message())),
            }
        });
    };

    view! {
        <div style=PANEL_STYLE>
            <SectionHeader title="Area status" />
            <div style="display: flex; gap: 6px;">
                <select
                    style=INPUT_STYLE
                    on:change=move |e| {
                        if let Some(v) = target_value(&e).and_then(|v| v.parse::<u32>().ok()) {
                            radius.set(v);
                        }
                    }
                >
                    {AREA_RADIUS_CHOICES_M.iter().map(|&m| view! {
                        <option value=m.to_string() selected=move || radius.get() == m>
                            {if m >= 1000 { format!("{} km", m / 1000) } else { format!("{m} m") }}
                        </option>
                    }).collect_view()}
                </select>
                <button style=SECONDARY_BUTTON on:click=load disabled=move || loading.get()>
                    "Check area"
                </button>
            </div>
            {move || status.get().map(area_status_view)}
        </div>
    }
}

#[component]
fn ReportPanel() -> impl IntoView {
    let view: MapViewState = expect_context();
    let toasts: Toasts = expect_context();

    let address = RwSignal::new(String::new());
    let water_depth = RwSignal::new(String::new());
    let description = RwSignal::new(String::new());
    let reporter_name = RwSignal::new(String::new());
    let reporter_phone = RwSignal::new(String::new());
    let area_size = RwSignal::new(String::new());
    let submitting = RwSignal::new(false);

    let reset = move || {
        for field in [address, water_depth, description, reporter_name, reporter_phone, area_size] {
            field.set(String::new());
        }
    };

    let submit = move |e: leptos::ev::SubmitEvent| {
        e.prevent_default();
        if submitting.get_untracked() {
            return;
        }
        let draft = ReportDraft {
            address: address.get_untracked(),
            water_depth: water_depth.get_untracked(),
            location: view.picked.get_untracked(),
            description: description.get_untracked(),
            reporter_name: reporter_name.get_untracked(),
            reporter_phone: reporter_phone.get_untracked(),
            area_size: area_size.get_untracked(),
        };
        let request = match draft.validate() {
            Ok(r) => r,
            Err(err) => {
                toasts.warning(err.to_string());
                return;
            }
        };
        submitting.set(true);
        spawn_local(async move {
            let result = api::submit_report(&request).await;
            submitting.try_set(false);
            match result {
                Ok(resp) => {
                    toasts.success(
                        resp.message
                            .unwrap_or_else(|| "Thank you, your report was submitted".to_owned()),
                    );
                    reset();
                    schedule_layer_reload(view, toasts);
                }
                Err(ApiError::MissingCsrf) => {
                    toasts.error(ApiError::MissingCsrf.user_message());
                }
                Err(err) => {
                    web_sys::console::warn_1(&format!("report: submit failed: {err}").into());
                    toasts.error(format!("Could not submit report. {}", err.user_message()));
                }
            }
        });
    };

    let field = move |label: &'static str, signal: RwSignal<String>, placeholder: &'static str| {
        view! {
            <label style="display: block; margin-top: 6px;">
                <div style=LABEL_STYLE>{label}</div>
                <input type="text" style=INPUT_STYLE placeholder=placeholder prop:value=move || signal.get() on:input=bind(signal) />
            </label>
        }
    };

    view! {
        <div style=PANEL_STYLE>
            <SectionHeader title="Report flooding" />
            <form on:submit=submit>
                {field("Address *", address, "Street, ward, district")}
                {field("Water depth (cm) *", water_depth, "e.g. 30")}
                <div style="font-size: 0.7rem; color: #7d8799; margin-top: 6px;">
                    {move || match view.picked.get() {
                        Some(p) => format!("Location: {:.5}, {:.5}", p.lat, p.lng),
                        None => "Click the map to set the location *".to_owned(),
                    }}
                </div>
                <label style="display: block; margin-top: 6px;">
                    <div style=LABEL_STYLE>"Description"</div>
                    <textarea rows="2" style=INPUT_STYLE prop:value=move || description.get() on:input=bind(description) />
                </label>
                {field("Your name", reporter_name, "")}
                {field("Phone", reporter_phone, "")}
                <label style="display: block; margin-top: 6px;">
                    <div style=LABEL_STYLE>"Affected area"</div>
                    <select style=INPUT_STYLE on:change=bind(area_size)>
                        <option value="" selected=move || area_size.get().is_empty()>"Not sure"</option>
                        <option value="small" selected=move || area_size.get() == "small">"Small (one spot)"</option>
                        <option value="medium" selected=move || area_size.get() == "medium">"Medium (a street)"</option>
                        <option value="large" selected=move || area_size.get() == "large">"Large (several streets)"</option>
                    </select>
                </label>
                <button type="submit" style=format!("{PRIMARY_BUTTON} margin-top: 10px; width: 100%;") disabled=move || submitting.get()>
                    {move || if submitting.get() { "Submitting\u{2026}" } else { "Submit report" }}
                </button>
            </form>
        </div>
    }
}

#[component]
fn WeatherPanel() -> impl IntoView {
    let data: SideData = expect_context();

    view! {
        <div style=PANEL_STYLE>
            <SectionHeader title="Weather" />
            {move || match data.weather.get() {
                None => view! { <div style="font-size: 0.75rem; color: #7d8799;">"Loading weather\u{2026}"</div> }.into_any(),
                Some(w) => {
                    let current = w.current.unwrap_or_default();
                    let fallback = current.is_fallback;
                    view! {
                        <div style="display: flex; align-items: baseline; gap: 10px;">
                            <span style="font-size: 1.4rem; font-weight: 700;">
                                {current.temp.map_or("-".to_owned(), |t| format!("{t:.0}\u{00B0}C"))}
                            </span>
                            <span style="font-size: 0.8rem; color: #c9d1dc;">{current.description.unwrap_or_default()}</span>
                        </div>
                        <div style="font-size: 0.72rem; color: #9aa5b5; margin-top: 2px;">
                            {format!(
                                "Humidity {} \u{00B7} Rain {} \u{00B7} Wind {}",
                                current.humidity.map_or("-".to_owned(), |h| format!("{h:.0}%")),
                                current.rain.map_or("0 mm".to_owned(), |r| format!("{r:.1} mm")),
                                current.wind_speed.map_or("-".to_owned(), |s| format!("{s:.1} m/s")),
                            )}
                        </div>
                        {fallback.then(|| view! { <div style="font-size: 0.68rem; color: #f39c12; margin-top: 2px;">"Estimated data, live feed unavailable"</div> })}
                        {w.alerts.into_iter().map(|a| view! {
                            <div style="margin-top: 6px; padding: 6px 8px; border-left: 3px solid #e67e22; background: #1d1a16; font-size: 0.75rem; color: #f0c28b;">
                                {a.message}
                            </div>
                        }).collect_view()}
                    }.into_any()
                }
            }}
        </div>
    }
}

#[component]
fn StatisticsPanel() -> impl IntoView {
    let data: SideData = expect_context();
    let view: MapViewState = expect_context();

    let layer_counts = move || {
        view.layers.with(|r| {
            r.state().map(|s| (s.flood_zone_features.len(), s.report_features.len()))
        })
    };

    view! {
        <div style=PANEL_STYLE>
            <SectionHeader title="Statistics" />
            {move || data.statistics.get().map(|s| view! {
                <div style="display: grid; grid-template-columns: 1fr 1fr; gap: 6px; font-size: 0.75rem;">
                    <div>"Flood zones: " <b>{s.zones.total}</b></div>
                    <div>"Active: " <b>{s.zones.active}</b></div>
                    <div>"Black spots: " <b>{s.zones.black_zones}</b></div>
                    <div>"Reports: " <b>{s.reports.total}</b></div>
                    <div>"Verified: " <b>{s.reports.verified}</b></div>
                    <div>"Today: " <b>{s.reports.today}</b></div>
                </div>
            })}
            {move || layer_counts().map(|(z, r)| view! {
                <div style="font-size: 0.7rem; color: #7d8799; margin-top: 6px;">
                    {format!("On map: {z} zones, {r} reports")}
                </div>
            })}
        </div>
    }
}

#[component]
fn RecentReportsPanel() -> impl IntoView {
    let data: SideData = expect_context();
    let view: MapViewState = expect_context();
    let toasts: Toasts = expect_context();
    let Clock(clock) = expect_context();

    view! {
        <div style=PANEL_STYLE>
            <SectionHeader title="Recent reports" />
            {move || {
                let reports = data.recent.get();
                if reports.is_empty() {
                    return view! { <div style="font-size: 0.75rem; color: #7d8799;">"No recent reports"</div> }.into_any();
                }
                let now_ms = clock.get();
                reports.into_iter().map(|r| {
                    let at = LatLng::new(r.lat, r.lng);
                    let severity = r
                        .severity
                        .as_deref()
                        .map(Severity::parse)
                        .filter(|s| *s != Severity::Unknown)
                        .unwrap_or_else(|| Severity::from_depth_cm(r.water_depth));
                    let color = rgb_hex(severity.color_rgb());
                    let age = r.created_at.as_deref().and_then(|t| format_age(t, now_ms));
                    view! {
                        <div
                            style="display: flex; gap: 8px; align-items: center; padding: 5px 0; cursor: pointer; border-bottom: 1px solid #1c2331;"
                            on:click=move |_| {
                                focus_location(view, at);
                                check_location(at, data, toasts);
                            }
                        >
                            <span style=format!("width: 8px; height: 8px; border-radius: 50%; background: {color}; flex-shrink: 0;") />
                            <div style="flex: 1; min-width: 0;">
                                <div style="font-size: 0.78rem; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">{r.address}</div>
                                <div style="font-size: 0.68rem; color: #7d8799;">
                                    {format!("{:.0} cm", r.water_depth)}
                                    {age.map(|a| format!(" \u{00B7} {a}"))}
                                </div>
                            </div>
                        </div>
                    }
                }).collect_view().into_any()
            }}
        </div>
    }
}

#[component]
fn LegendPanel() -> impl IntoView {
    view! {
        <div style=PANEL_STYLE>
            <SectionHeader title="Legend" />
            {zone_legend().into_iter().map(|(zone, hex)| view! {
                <div style="display: flex; align-items: center; gap: 8px; font-size: 0.75rem; padding: 2px 0;">
                    <span style=format!("width: 12px; height: 12px; border-radius: 2px; background: {hex}; opacity: 0.8;") />
                    <span style="color: #c9d1dc;">{zone.label()}</span>
                </div>
            }).collect_view()}
        </div>
    }
}

#[component]
fn SettingsPanel() -> impl IntoView {
    let AutoUpdate(auto_update) = expect_context();

    view! {
        <div style=PANEL_STYLE>
            <SectionHeader title="Settings" />
            <label style="display: flex; align-items: center; gap: 8px; font-size: 0.8rem; cursor: pointer;">
                <input
                    type="checkbox"
                    prop:checked=move || auto_update.get()
                    on:change=move |e| {
                        if let Some(input) = e.target().and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok()) {
                            auto_update.set(input.checked());
                        }
                    }
                />
                "Auto-refresh map every 5 minutes"
            </label>
        </div>
    }
}
