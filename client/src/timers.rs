use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

/// A `setInterval` registration. Dropping it clears the interval and frees
/// the callback, so whoever owns the binding owns the periodic work.
pub struct IntervalBinding {
    window: web_sys::Window,
    interval_id: i32,
    _callback: Closure<dyn Fn()>,
}

impl Drop for IntervalBinding {
    fn drop(&mut self) {
        self.window.clear_interval_with_handle(self.interval_id);
    }
}

pub fn start_interval(period_ms: u32, job: impl Fn() + 'static) -> Option<IntervalBinding> {
    let window = web_sys::window()?;
    let callback = Closure::<dyn Fn()>::new(job);
    let timeout = i32::try_from(period_ms).unwrap_or(i32::MAX);
    match window.set_interval_with_callback_and_timeout_and_arguments_0(
        callback.as_ref().unchecked_ref(),
        timeout,
    ) {
        Ok(interval_id) => Some(IntervalBinding {
            window,
            interval_id,
            _callback: callback,
        }),
        Err(e) => {
            web_sys::console::warn_1(&format!("timers: setInterval failed: {e:?}").into());
            None
        }
    }
}

pub fn now_ms() -> f64 {
    js_sys::Date::now()
}
