use std::cell::RefCell;

use js_sys::{Function, Promise, Reflect};
use leptos::prelude::*;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{JsFuture, spawn_local};

use hanoi_flood_shared::PredictionContext;
use hanoi_flood_shared::PredictionSession;
use hanoi_flood_shared::dashboard::{format_duration_hours, share_text};
use hanoi_flood_shared::prediction::{Phase, PredictionTicket, Resolution, TickOutcome, TimerToken};
use hanoi_flood_shared::progress::TICK_INTERVAL_MS;

use crate::api;
use crate::app::DashboardOpen;
use crate::timers::{IntervalBinding, start_interval};
use crate::toast::Toasts;

#[derive(Clone, Copy)]
pub(crate) struct Session(pub RwSignal<PredictionSession>);

thread_local! {
    static PROGRESS_BINDING: RefCell<Option<(TimerToken, IntervalBinding)>> = const { RefCell::new(None) };
}

fn stop_progress() {
    PROGRESS_BINDING.with(|slot| slot.borrow_mut().take());
}

fn stop_progress_for(token: TimerToken) {
    PROGRESS_BINDING.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.as_ref().is_some_and(|(current, _)| *current == token) {
            slot.take();
        }
    });
}

fn start_progress(session: Session, token: TimerToken) {
    let Session(state) = session;
    let binding = start_interval(TICK_INTERVAL_MS, move || {
        let outcome = state
            .try_update(|s| s.tick(token))
            .unwrap_or(TickOutcome::Cancelled);
        if !matches!(outcome, TickOutcome::Running { .. }) {
            // Dropping the binding from inside its own callback is not
            // allowed, so defer it to a microtask.
            spawn_local(async move { stop_progress_for(token) });
        }
    });
    PROGRESS_BINDING.with(|slot| *slot.borrow_mut() = binding.map(|b| (token, b)));
}

fn dispatch(session: Session, toasts: Toasts, ticket: PredictionTicket) {
    stop_progress();
    let Session(state) = session;
    spawn_local(async move {
        let result = api::run_prediction(&ticket.call).await;
        let Some(resolution) = state.try_update(|s| s.resolve(ticket.seq, result)) else {
            return;
        };
        match resolution {
            Resolution::Applied { timer } => start_progress(session, timer),
            Resolution::Failed(err) => {
                web_sys::console::warn_1(
                    &format!("prediction: seq={} failed: {err}", ticket.seq).into(),
                );
                toasts.error(format!("Drainage prediction failed. {}", err.user_message()));
            }
            Resolution::Stale => {
                web_sys::console::info_1(
                    &format!("prediction: seq={} discarded", ticket.seq).into(),
                );
            }
        }
    });
}

/// Open the modal and ask the backend for a fresh estimate.
pub fn start_prediction(session: Session, toasts: Toasts, context: PredictionContext) {
    match session.0.try_update(|s| s.request(context)) {
        Some(Ok(ticket)) => dispatch(session, toasts, ticket),
        Some(Err(err)) => toasts.warning(err.to_string()),
        None => {}
    }
}

pub fn retry_prediction(session: Session, toasts: Toasts) {
    if let Some(Some(ticket)) = session.0.try_update(|s| s.retry()) {
        dispatch(session, toasts, ticket);
    }
}

pub fn close_prediction(session: Session) {
    session.0.update(|s| s.close());
    stop_progress();
}

fn write_clipboard(text: &str) -> Option<Promise> {
    let navigator = web_sys::window()?.navigator();
    let clipboard = Reflect::get(&navigator, &JsValue::from_str("clipboard")).ok()?;
    let write = Reflect::get(&clipboard, &JsValue::from_str("writeText"))
        .ok()?
        .dyn_into::<Function>()
        .ok()?;
    write
        .call1(&clipboard, &JsValue::from_str(text))
        .ok()?
        .dyn_into::<Promise>()
        .ok()
}

pub fn share_prediction(session: Session, toasts: Toasts) {
    let Some(text) = session
        .0
        .with_untracked(|s| s.result().map(|r| share_text(s.context(), r)))
    else {
        return;
    };
    let Some(promise) = write_clipboard(&text) else {
        toasts.warning("Clipboard is not available in this browser");
        return;
    };
    spawn_local(async move {
        match JsFuture::from(promise).await {
            Ok(_) => toasts.success("Prediction copied to clipboard"),
            Err(e) => {
                web_sys::console::warn_1(&format!("share: clipboard write failed: {e:?}").into());
                toasts.warning("Could not copy the prediction");
            }
        }
    });
}

fn list_section(title: &'static str, items: Vec<String>) -> impl IntoView {
    (!items.is_empty()).then(|| {
        view! {
            <div style="margin-top: 12px;">
                <div style="font-size: 0.7rem; text-transform: uppercase; letter-spacing: 0.06em; color: #7d8799; margin-bottom: 4px;">{title}</div>
                <ul style="margin: 0; padding-left: 18px; font-size: 0.8rem; color: #c9d1dc; line-height: 1.45;">
                    {items.into_iter().map(|item| view! { <li>{item}</li> }).collect_view()}
                </ul>
            </div>
        }
    })
}

#[component]
pub fn PredictionModal() -> impl IntoView {
    let session: Session = expect_context();
    let toasts: Toasts = expect_context();
    let DashboardOpen(dashboard_open) = expect_context();
    let Session(state) = session;

    let phase = Memo::new(move |_| state.with(|s| s.phase()));
    let visible = move || !matches!(phase.get(), Phase::Idle | Phase::Closed);

    let body = move || {
        state.with(|s| match s.phase() {
            Phase::Requesting => view! {
                <div style="padding: 28px 0; text-align: center; color: #9aa5b5; font-size: 0.85rem;">
                    "Calculating drainage time\u{2026}"
                </div>
            }
            .into_any(),
            Phase::Retrying => {
                let message = s
                    .last_error()
                    .map(|e| e.user_message())
                    .unwrap_or_else(|| "Prediction failed".to_owned());
                view! {
                    <div style="padding: 18px 0; text-align: center;">
                        <div style="color: #e74c3c; font-size: 0.85rem; margin-bottom: 12px;">{message}</div>
                        <button
                            class="btn"
                            style="background: #2d6cdf; color: #fff; border: none; border-radius: 4px; padding: 6px 14px; cursor: pointer;"
                            on:click=move |_| retry_prediction(session, toasts)
                        >
                            "Retry"
                        </button>
                    </div>
                }
                .into_any()
            }
            Phase::Displaying => {
                let Some(result) = s.result() else {
                    return ().into_any();
                };
                let location = s
                    .context()
                    .map(|c| c.display_name().to_owned())
                    .unwrap_or_default();
                let level_color = result.level().css_color();
                let level_label = result.level_label().to_owned();
                let hours = format_duration_hours(result.estimated_hours);
                let long_term = result.is_long_term();
                let (percent, remaining, band_color) = s
                    .timer()
                    .map(|t| (t.percent(), t.remaining_hours(), t.band().css_color()))
                    .unwrap_or((100.0, 0.0, "#27ae60"));
                let report_id = result.flood_report_id.clone();
                view! {
                    <div>
                        <div style="font-size: 0.75rem; color: #7d8799;">{location}</div>
                        <div style="display: flex; align-items: baseline; gap: 10px; margin-top: 6px;">
                            <span style="font-size: 1.6rem; font-weight: 700; color: #e4e8ef;">{hours}</span>
                            <span style=format!("font-size: 0.75rem; padding: 2px 8px; border-radius: 10px; background: {level_color}; color: #fff;")>
                                {level_label}
                            </span>
                        </div>
                        {long_term.then(|| view! {
                            <div style="margin-top: 6px; font-size: 0.75rem; color: #f39c12;">
                                "Long-term flooding expected. Avoid this area."
                            </div>
                        })}
                        {result.message.clone().map(|m| view! {
                            <div style="margin-top: 8px; font-size: 0.8rem; color: #c9d1dc;">{m}</div>
                        })}
                        {result.completion_timestamp.clone().map(|t| view! {
                            <div style="margin-top: 4px; font-size: 0.75rem; color: #9aa5b5;">
                                "Expected dry by " {t}
                            </div>
                        })}
                        {report_id.map(|id| view! {
                            <div style="margin-top: 4px; font-size: 0.7rem; color: #7d8799;">"Report #" {id}</div>
                        })}
                        <div style="margin-top: 14px;">
                            <div style="display: flex; justify-content: space-between; font-size: 0.72rem; color: #9aa5b5; margin-bottom: 4px;">
                                <span>{format!("{percent:.0}% drained")}</span>
                                <span>{format!("{remaining:.1} h remaining")}</span>
                            </div>
                            <div style="height: 8px; background: rgba(255,255,255,0.08); border-radius: 4px; overflow: hidden;">
                                <div style=format!("height: 100%; width: {percent:.1}%; background: {band_color}; transition: width 0.4s;") />
                            </div>
                        </div>
                        {list_section("Factors considered", result.factors.clone())}
                        {list_section("Recommendations", result.recommendations.clone())}
                        <div style="display: flex; gap: 8px; margin-top: 16px;">
                            <button
                                style="background: #2d6cdf; color: #fff; border: none; border-radius: 4px; padding: 6px 12px; cursor: pointer; font-size: 0.8rem;"
                                on:click=move |_| share_prediction(session, toasts)
                            >
                                "Share"
                            </button>
                            <button
                                style="background: #232a38; color: #c9d1dc; border: 1px solid #323b4d; border-radius: 4px; padding: 6px 12px; cursor: pointer; font-size: 0.8rem;"
                                on:click=move |_| retry_prediction(session, toasts)
                            >
                                "Recalculate"
                            </button>
                            <button
                                style="background: #232a38; color: #c9d1dc; border: 1px solid #323b4d; border-radius: 4px; padding: 6px 12px; cursor: pointer; font-size: 0.8rem;"
                                on:click=move |_| dashboard_open.set(true)
                            >
                                "Dashboard"
                            </button>
                        </div>
                    </div>
                }
                .into_any()
            }
            Phase::Idle | Phase::Closed => ().into_any(),
        })
    };

    view! {
        <Show when=visible>
            <div
                style="position: fixed; inset: 0; background: rgba(5,8,14,0.6); z-index: 150; display: flex; align-items: center; justify-content: center;"
                on:click=move |_| close_prediction(session)
            >
                <div
                    role="dialog"
                    style="width: min(440px, 92vw); max-height: 86vh; overflow-y: auto; background: #131822; border: 1px solid #283042; border-radius: 8px; padding: 16px 18px; box-shadow: 0 12px 40px rgba(0,0,0,0.6); font-family: 'Inter', system-ui, sans-serif;"
                    on:click=|e| e.stop_propagation()
                >
                    <div style="display: flex; justify-content: space-between; align-items: center; margin-bottom: 8px;">
                        <span style="font-size: 0.95rem; font-weight: 600; color: #e4e8ef;">"Drainage prediction"</span>
                        <button
                            title="Close"
                            style="background: none; border: none; color: #7d8799; cursor: pointer; font-size: 1.1rem;"
                            on:click=move |_| close_prediction(session)
                        >
                            "\u{00D7}"
                        </button>
                    </div>
                    {body}
                </div>
            </div>
        </Show>
    }
}
