use wasm_bindgen::JsCast;
use web_sys::{HtmlDocument, HtmlInputElement};

use hanoi_flood_shared::csrf::{CSRF_INPUT_NAME, CSRF_META_NAME, resolve_token};

/// Looks the token up in the hidden form input, the cookie jar and the meta
/// tag, in that order.
pub fn token() -> Option<String> {
    let document = web_sys::window()?.document()?;

    let hidden = document
        .query_selector(&format!("input[name=\"{CSRF_INPUT_NAME}\"]"))
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .map(|input| input.value());

    let cookies = document
        .clone()
        .dyn_into::<HtmlDocument>()
        .ok()
        .and_then(|html| html.cookie().ok());

    let meta = document
        .query_selector(&format!("meta[name=\"{CSRF_META_NAME}\"]"))
        .ok()
        .flatten()
        .and_then(|el| el.get_attribute("content"));

    let token = resolve_token(hidden, cookies.as_deref(), meta);
    if token.is_none() {
        web_sys::console::warn_1(&"csrf: no token in form, cookie or meta".into());
    }
    token
}
