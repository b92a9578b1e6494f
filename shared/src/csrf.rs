pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_INPUT_NAME: &str = "csrfmiddlewaretoken";
pub const CSRF_META_NAME: &str = "csrf-token";

/// Value of `name` in a `document.cookie` string.
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// First non-empty token in lookup order: hidden form input, cookie, meta tag.
pub fn resolve_token(
    hidden_input: Option<String>,
    cookies: Option<&str>,
    meta: Option<String>,
) -> Option<String> {
    let non_empty = |v: Option<String>| v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
    non_empty(hidden_input)
        .or_else(|| cookies.and_then(|c| cookie_value(c, CSRF_COOKIE)))
        .or_else(|| non_empty(meta))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_lookup_ignores_similar_names() {
        let cookies = "sessionid=abc; xcsrftoken=nope; csrftoken=tok123";
        assert_eq!(cookie_value(cookies, CSRF_COOKIE).as_deref(), Some("tok123"));
        assert_eq!(cookie_value("a=1", CSRF_COOKIE), None);
    }

    #[test]
    fn hidden_input_wins_then_cookie_then_meta() {
        assert_eq!(
            resolve_token(Some("form".into()), Some("csrftoken=c"), Some("m".into())).as_deref(),
            Some("form")
        );
        assert_eq!(
            resolve_token(Some("  ".into()), Some("csrftoken=c"), Some("m".into())).as_deref(),
            Some("c")
        );
        assert_eq!(
            resolve_token(None, Some("other=1"), Some("m".into())).as_deref(),
            Some("m")
        );
        assert_eq!(resolve_token(None, None, None), None);
    }
}
