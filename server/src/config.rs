use std::time::Duration;

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_GATEWAY_PORT: u16 = 3000;
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";
pub const DEFAULT_MAX_PROXY_BODY_BYTES: usize = 1024 * 1024;

/// Flood backend origin, without a trailing slash.
pub fn upstream_base_url() -> String {
    std::env::var("UPSTREAM_BASE_URL")
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_owned())
        .filter(|value| value.starts_with("http://") || value.starts_with("https://"))
        .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_owned())
}

pub fn gateway_port() -> u16 {
    std::env::var("GATEWAY_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_GATEWAY_PORT)
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}

pub fn static_dir() -> String {
    std::env::var("STATIC_DIR")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_owned())
}

pub fn max_proxy_body_bytes() -> usize {
    std::env::var("MAX_PROXY_BODY_BYTES")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_PROXY_BODY_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        temp_env::with_vars_unset(
            [
                "UPSTREAM_BASE_URL",
                "GATEWAY_PORT",
                "UPSTREAM_HTTP_TIMEOUT_SECS",
                "STATIC_DIR",
                "MAX_PROXY_BODY_BYTES",
            ],
            || {
                assert_eq!(upstream_base_url(), DEFAULT_UPSTREAM_BASE_URL);
                assert_eq!(gateway_port(), DEFAULT_GATEWAY_PORT);
                assert_eq!(upstream_http_timeout(), Duration::from_secs(15));
                assert_eq!(static_dir(), DEFAULT_STATIC_DIR);
                assert_eq!(max_proxy_body_bytes(), DEFAULT_MAX_PROXY_BODY_BYTES);
            },
        );
    }

    #[test]
    fn upstream_url_loses_trailing_slash() {
        temp_env::with_var("UPSTREAM_BASE_URL", Some(" https://flood.example.vn/ "), || {
            assert_eq!(upstream_base_url(), "https://flood.example.vn");
        });
    }

    #[test]
    fn upstream_url_without_scheme_falls_back() {
        temp_env::with_var("UPSTREAM_BASE_URL", Some("flood.example.vn"), || {
            assert_eq!(upstream_base_url(), DEFAULT_UPSTREAM_BASE_URL);
        });
    }

    #[test]
    fn invalid_numbers_fall_back() {
        temp_env::with_vars(
            [
                ("GATEWAY_PORT", Some("0")),
                ("UPSTREAM_CONNECT_TIMEOUT_SECS", Some("soon")),
                ("MAX_PROXY_BODY_BYTES", Some("-5")),
            ],
            || {
                assert_eq!(gateway_port(), DEFAULT_GATEWAY_PORT);
                assert_eq!(upstream_connect_timeout(), Duration::from_secs(3));
                assert_eq!(max_proxy_body_bytes(), DEFAULT_MAX_PROXY_BODY_BYTES);
            },
        );
    }

    #[test]
    fn explicit_values_are_used() {
        temp_env::with_vars(
            [("GATEWAY_PORT", Some("8080")), ("STATIC_DIR", Some("/srv/www"))],
            || {
                assert_eq!(gateway_port(), 8080);
                assert_eq!(static_dir(), "/srv/www");
            },
        );
    }
}
