use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Coalesces redraw requests into one `requestAnimationFrame` callback.
///
/// Layer refreshes, hover changes and pointer drags all call `mark_dirty()`;
/// the map is painted at most once per frame regardless of how many arrived.
pub struct RenderScheduler {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    pending: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Inner {
    fn request_frame(&self) {
        if self.pending.get().is_some() {
            return;
        }
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let callback = self.callback.borrow();
        let Some(cb) = callback.as_ref() else {
            return;
        };
        match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => self.pending.set(Some(id)),
            Err(e) => web_sys::console::warn_1(&format!("render: rAF failed: {e:?}").into()),
        }
    }
}

impl RenderScheduler {
    pub fn new(render_fn: impl Fn() + 'static) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            pending: Cell::new(None),
            callback: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let cb = Closure::<dyn FnMut()>::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.pending.set(None);
            render_fn();
        });
        *inner.callback.borrow_mut() = Some(cb);

        Self { inner }
    }

    pub fn mark_dirty(&self) {
        self.inner.request_frame();
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        if let Some(id) = self.inner.pending.take()
            && let Some(window) = self.inner.window.as_ref()
        {
            let _ = window.cancel_animation_frame(id);
        }
        self.inner.callback.borrow_mut().take();
    }
}
