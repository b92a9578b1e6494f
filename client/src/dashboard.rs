use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use hanoi_flood_shared::ApiError;
use hanoi_flood_shared::api::DrainageDashboard;
use hanoi_flood_shared::dashboard::{CompletionBadge, completion_bar_width};

use crate::api;
use crate::app::DashboardOpen;

#[derive(Clone, Debug)]
enum Load {
    Empty,
    Loading,
    Ready(DrainageDashboard),
    Failed(ApiError),
}

fn summary_tile(label: &'static str, value: u32, color: &'static str) -> impl IntoView {
    view! {
        <div style="flex: 1; min-width: 88px; background: #182030; border: 1px solid #263043; border-radius: 6px; padding: 8px 10px;">
            <div style=format!("font-size: 1.2rem; font-weight: 700; color: {color};")>{value}</div>
            <div style="font-size: 0.68rem; color: #7d8799; margin-top: 2px;">{label}</div>
        </div>
    }
}

fn dashboard_view(data: DrainageDashboard) -> impl IntoView {
    let s = &data.summary;
    let districts: Vec<(String, u32)> = s
        .districts
        .iter()
        .map(|(name, count)| (name.clone(), *count))
        .collect();
    view! {
        <div style="display: flex; flex-wrap: wrap; gap: 8px;">
            {summary_tile("Active predictions", s.total_active_predictions, "#e4e8ef")}
            {summary_tile("Fast", s.fast_drainage_count, "#27ae60")}
            {summary_tile("Moderate", s.medium_drainage_count, "#f39c12")}
            {summary_tile("Slow", s.slow_drainage_count, "#e74c3c")}
        </div>
        {(!districts.is_empty()).then(|| view! {
            <div style="margin-top: 12px; font-size: 0.75rem; color: #9aa5b5; display: flex; flex-wrap: wrap; gap: 6px;">
                {districts.into_iter().map(|(name, count)| view! {
                    <span style="background: #1b2231; border-radius: 10px; padding: 2px 8px;">{format!("{name}: {count}")}</span>
                }).collect_view()}
            </div>
        })}
        <div style="margin-top: 14px; font-size: 0.7rem; text-transform: uppercase; letter-spacing: 0.06em; color: #7d8799;">
            "Soonest to drain"
        </div>
        {if data.soonest_completions.is_empty() {
            view! { <div style="font-size: 0.8rem; color: #7d8799; margin-top: 6px;">"No active predictions"</div> }.into_any()
        } else {
            data.soonest_completions.iter().map(|c| {
                let badge = CompletionBadge::for_remaining(c.remaining_hours);
                let width = completion_bar_width(c.remaining_hours);
                let title = c.address.clone().or_else(|| c.district.clone()).unwrap_or_else(|| "Unknown location".to_owned());
                let depth = c.current_depth.map(|d| format!("{d:.0} cm"));
                view! {
                    <div style="margin-top: 8px; padding: 8px 10px; background: #161c28; border-radius: 6px;">
                        <div style="display: flex; justify-content: space-between; align-items: center; gap: 8px;">
                            <span style="font-size: 0.8rem; color: #e4e8ef; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">{title}</span>
                            <span style=format!("font-size: 0.68rem; padding: 1px 7px; border-radius: 8px; background: {}; color: #fff; flex-shrink: 0;", badge.css_color())>
                                {badge.label()}
                            </span>
                        </div>
                        <div style="display: flex; justify-content: space-between; font-size: 0.7rem; color: #9aa5b5; margin: 4px 0;">
                            <span>{format!("{:.1} h left", c.remaining_hours)}</span>
                            <span>{depth}</span>
                        </div>
                        <div style="height: 5px; background: rgba(255,255,255,0.07); border-radius: 3px; overflow: hidden;">
                            <div style=format!("height: 100%; width: {width:.1}%; background: {};", badge.css_color()) />
                        </div>
                    </div>
                }
            }).collect_view().into_any()
        }}
    }
}

#[component]
pub fn DashboardModal() -> impl IntoView {
    let DashboardOpen(open) = expect_context();
    let load = RwSignal::new(Load::Empty);
    let nonce = StoredValue::new(0u32);

    let reload = move || {
        let request_nonce = nonce.get_value().wrapping_add(1);
        nonce.set_value(request_nonce);
        load.set(Load::Loading);
        spawn_local(async move {
            let result = api::drainage_dashboard().await;
            if nonce.try_get_value() != Some(request_nonce) {
                return;
            }
            match result {
                Ok(data) => load.try_set(Load::Ready(data)),
                Err(err) => {
                    web_sys::console::warn_1(&format!("dashboard: load failed: {err}").into());
                    load.try_set(Load::Failed(err))
                }
            };
        });
    };

    Effect::new(move || {
        if open.get() {
            reload();
        }
    });

    let body = move || match load.get() {
        Load::Empty | Load::Loading => view! {
            <div style="padding: 24px 0; text-align: center; color: #9aa5b5; font-size: 0.85rem;">"Loading dashboard\u{2026}"</div>
        }.into_any(),
        Load::Failed(err) => view! {
            <div style="padding: 18px 0; text-align: center;">
                <div style="color: #e74c3c; font-size: 0.85rem; margin-bottom: 10px;">{err.user_message()}</div>
                <button
                    style="background: #2d6cdf; color: #fff; border: none; border-radius: 4px; padding: 6px 14px; cursor: pointer;"
                    on:click=move |_| reload()
                >
                    "Retry"
                </button>
            </div>
        }.into_any(),
        Load::Ready(data) => dashboard_view(data).into_any(),
    };

    view! {
        <Show when=move || open.get()>
            <div
                style="position: fixed; inset: 0; background: rgba(5,8,14,0.6); z-index: 140; display: flex; align-items: center; justify-content: center;"
                on:click=move |_| open.set(false)
            >
                <div
                    role="dialog"
                    style="width: min(560px, 94vw); max-height: 86vh; overflow-y: auto; background: #131822; border: 1px solid #283042; border-radius: 8px; padding: 16px 18px; font-family: 'Inter', system-ui, sans-serif;"
                    on:click=|e| e.stop_propagation()
                >
                    <div style="display: flex; justify-content: space-between; align-items: center; margin-bottom: 12px;">
                        <span style="font-size: 0.95rem; font-weight: 600; color: #e4e8ef;">"Drainage dashboard"</span>
                        <div style="display: flex; gap: 6px;">
                            <button
                                title="Reload"
                                disabled=move || matches!(load.get(), Load::Loading)
                                style="background: #232a38; color: #c9d1dc; border: 1px solid #323b4d; border-radius: 4px; padding: 3px 10px; cursor: pointer; font-size: 0.75rem;"
                                on:click=move |_| reload()
                            >
                                "Reload"
                            </button>
                            <button
                                title="Close"
                                style="background: none; border: none; color: #7d8799; cursor: pointer; font-size: 1.1rem;"
                                on:click=move |_| open.set(false)
                            >
                                "\u{00D7}"
                            </button>
                        </div>
                    </div>
                    {body}
                </div>
            </div>
        </Show>
    }
}
