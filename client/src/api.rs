//! Thin gloo-net wrappers over the backend endpoints.
//!
//! Every call returns `Result<_, ApiError>`; callers turn failures into toasts.

use gloo_net::http::{Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use hanoi_flood_shared::ApiError;
use hanoi_flood_shared::LatLng;
use hanoi_flood_shared::api::{
    AREA_STATUS_PATH, AreaStatusResponse, CHECK_FLOOD_PATH, CSRF_HEADER, CheckFloodResponse,
    DRAINAGE_DASHBOARD_PATH, DrainageDashboard, DrainagePrediction, FLOOD_DATA_PATH, FloodLayers,
    IDEMPOTENCY_HEADER, PREDICT_DRAINAGE_LOCATION_PATH, PREDICT_DRAINAGE_PATH,
    RECENT_REPORTS_PATH, REPORT_FLOOD_PATH, RecentReportsResponse, ReportFloodRequest,
    ReportFloodResponse, SEARCH_PATH, STATISTICS_PATH, SearchResponse, StatisticsResponse,
    WEATHER_PATH, WeatherResponse, decode_envelope, parse_dashboard, parse_prediction,
};
use hanoi_flood_shared::prediction::PredictionCall;

use crate::csrf;

fn with_query(path: &str, pairs: &[(&str, String)]) -> String {
    join_query(
        path,
        pairs.iter().map(|(k, v)| {
            let encoded = js_sys::encode_uri_component(v)
                .as_string()
                .unwrap_or_default();
            (*k, encoded)
        }),
    )
}

/// Appends already-encoded `key=value` pairs to `path`.
fn join_query<'a>(path: &str, encoded: impl IntoIterator<Item = (&'a str, String)>) -> String {
    let query = encoded
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    if query.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{query}")
    }
}

fn coords(p: LatLng) -> [(&'static str, String); 2] {
    [("lat", p.lat.to_string()), ("lng", p.lng.to_string())]
}

async fn read_json(resp: Response) -> Result<Value, ApiError> {
    if !resp.ok() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::status(status, body));
    }
    resp.json::<Value>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

async fn get_value(url: &str) -> Result<Value, ApiError> {
    let resp = Request::get(url)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    read_json(resp).await
}

async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, ApiError> {
    decode_envelope(get_value(url).await?)
}

/// POST with the CSRF header. The token is resolved per call so a page that
/// rotated its cookie keeps working.
async fn post_value<B: Serialize>(
    path: &str,
    body: &B,
    idempotency_key: Option<&str>,
) -> Result<Value, ApiError> {
    let token = csrf::token().ok_or(ApiError::MissingCsrf)?;
    let mut builder = Request::post(path)
        .header("Accept", "application/json")
        .header(CSRF_HEADER, &token);
    if let Some(key) = idempotency_key {
        builder = builder.header(IDEMPOTENCY_HEADER, key);
    }
    let resp = builder
        .json(body)
        .map_err(|e| ApiError::Decode(e.to_string()))?
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    read_json(resp).await
}

pub async fn fetch_flood_layers() -> Result<FloodLayers, ApiError> {
    FloodLayers::from_payload(get_value(FLOOD_DATA_PATH).await?)
}

/// Runs whichever backend call the prediction session asked for.
pub async fn run_prediction(call: &PredictionCall) -> Result<DrainagePrediction, ApiError> {
    let raw = match call {
        PredictionCall::Lookup { flood_report_id } => {
            let url = with_query(
                PREDICT_DRAINAGE_PATH,
                &[("flood_report_id", flood_report_id.clone())],
            );
            get_value(&url).await?
        }
        PredictionCall::CreateAndPredict {
            request,
            idempotency_key,
        } => {
            post_value(
                PREDICT_DRAINAGE_LOCATION_PATH,
                request,
                Some(idempotency_key.as_str()),
            )
            .await?
        }
    };
    parse_prediction(raw)
}

pub async fn check_flood(at: LatLng) -> Result<CheckFloodResponse, ApiError> {
    get_json(&with_query(CHECK_FLOOD_PATH, &coords(at))).await
}

pub async fn area_status(at: LatLng, radius_m: u32) -> Result<AreaStatusResponse, ApiError> {
    let [lat, lng] = coords(at);
    let url = with_query(AREA_STATUS_PATH, &[lat, lng, ("radius", radius_m.to_string())]);
    get_json(&url).await
}

pub async fn weather(at: LatLng) -> Result<WeatherResponse, ApiError> {
    get_json(&with_query(WEATHER_PATH, &coords(at))).await
}

pub async fn search(query: &str) -> Result<SearchResponse, ApiError> {
    get_json(&with_query(SEARCH_PATH, &[("q", query.to_owned())])).await
}

pub async fn statistics() -> Result<StatisticsResponse, ApiError> {
    get_json(STATISTICS_PATH).await
}

pub async fn recent_reports(limit: usize) -> Result<RecentReportsResponse, ApiError> {
    get_json(&with_query(RECENT_REPORTS_PATH, &[("limit", limit.to_string())])).await
}

pub async fn drainage_dashboard() -> Result<DrainageDashboard, ApiError> {
    parse_dashboard(get_value(DRAINAGE_DASHBOARD_PATH).await?)
}

pub async fn submit_report(request: &ReportFloodRequest) -> Result<ReportFloodResponse, ApiError> {
    decode_envelope(post_value(REPORT_FLOOD_PATH, request, None).await?)
}

#[cfg(test)]
mod tests {
    use super::join_query;

    #[test]
    fn join_query_appends_encoded_pairs() {
        let url = join_query(
            "/api/search/",
            [("q", "Ho%C3%A0n%20Ki%E1%BA%BFm".to_owned()), ("lat", "21.03".to_owned())],
        );
        assert_eq!(url, "/api/search/?q=Ho%C3%A0n%20Ki%E1%BA%BFm&lat=21.03");
    }

    #[test]
    fn join_query_without_pairs_keeps_path() {
        assert_eq!(join_query("/api/statistics/", Vec::<(&str, String)>::new()), "/api/statistics/");
    }
}
