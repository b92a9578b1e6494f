use gloo_timers::callback::Timeout;
use leptos::prelude::*;

use hanoi_flood_shared::{NotificationLevel, NotificationQueue};

use crate::timers::now_ms;

/// App-wide notification sink. Pushing never blocks and never fails.
#[derive(Clone, Copy)]
pub(crate) struct Toasts(pub RwSignal<NotificationQueue>);

impl Toasts {
    pub fn push(self, level: NotificationLevel, message: impl Into<String>) {
        let queue = self.0;
        let Some(ttl) = queue.try_update(|q| {
            let id = q.push(level, message, now_ms());
            q.iter().find(|n| n.id == id).map(|n| n.ttl_ms)
        }) else {
            return;
        };
        let Some(ttl) = ttl else {
            return;
        };
        // Expiry is a sweep, so a late or duplicate timer is harmless.
        Timeout::new(ttl.max(0.0) as u32, move || {
            queue.try_update(|q| q.expire(now_ms()));
        })
        .forget();
    }

    pub fn info(self, message: impl Into<String>) {
        self.push(NotificationLevel::Info, message);
    }

    pub fn success(self, message: impl Into<String>) {
        self.push(NotificationLevel::Success, message);
    }

    pub fn warning(self, message: impl Into<String>) {
        self.push(NotificationLevel::Warning, message);
    }

    pub fn error(self, message: impl Into<String>) {
        self.push(NotificationLevel::Error, message);
    }
}

#[component]
pub fn ToastHost() -> impl IntoView {
    let Toasts(queue) = expect_context();

    view! {
        <div style="position: fixed; top: 64px; left: 50%; transform: translateX(-50%); z-index: 200; display: flex; flex-direction: column; gap: 6px; pointer-events: none; min-width: 280px; max-width: 420px;">
            {move || {
                queue
                    .get()
                    .iter()
                    .map(|n| {
                        let id = n.id;
                        let accent = n.level.accent();
                        view! {
                            <div
                                role="status"
                                data-level=n.level.as_str()
                                style=format!(
                                    "pointer-events: auto; display: flex; align-items: flex-start; gap: 8px; background: #161b26; border: 1px solid #283042; border-left: 3px solid {accent}; border-radius: 6px; padding: 8px 10px; box-shadow: 0 4px 16px rgba(0,0,0,0.45); color: #e4e8ef; font-size: 0.8rem; font-family: 'Inter', system-ui, sans-serif;"
                                )
                            >
                                <span style="flex: 1; line-height: 1.35;">{n.message.clone()}</span>
                                <button
                                    title="Dismiss"
                                    style="background: none; border: none; color: #7d8799; cursor: pointer; font-size: 0.9rem; line-height: 1; padding: 0;"
                                    on:click=move |_| {
                                        queue.update(|q| {
                                            q.dismiss(id);
                                        });
                                    }
                                >
                                    "\u{00D7}"
                                </button>
                            </div>
                        }
                    })
                    .collect_view()
            }}
        </div>
    }
}
