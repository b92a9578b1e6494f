use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::geo::{Feature, LatLng};

pub const PREDICT_DRAINAGE_PATH: &str = "/api/predict-drainage/";
pub const PREDICT_DRAINAGE_LOCATION_PATH: &str = "/api/predict-drainage-location/";
pub const FLOOD_DATA_PATH: &str = "/api/flood-data/";
pub const CHECK_FLOOD_PATH: &str = "/api/check-flood/";
pub const AREA_STATUS_PATH: &str = "/api/area-status/";
pub const REPORT_FLOOD_PATH: &str = "/api/report-flood/";
pub const WEATHER_PATH: &str = "/api/weather/";
pub const DRAINAGE_DASHBOARD_PATH: &str = "/api/drainage-dashboard/";
pub const SEARCH_PATH: &str = "/api/search/";
pub const STATISTICS_PATH: &str = "/api/statistics/";
pub const RECENT_REPORTS_PATH: &str = "/api/recent-reports/";

pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }

    /// Mutating methods carry the CSRF token.
    pub fn needs_csrf(self) -> bool {
        matches!(self, Self::Post)
    }
}

/// Backend surface the dashboard talks to. The gateway forwards exactly these.
pub const ENDPOINTS: &[(&str, HttpMethod)] = &[
    (PREDICT_DRAINAGE_PATH, HttpMethod::Get),
    (PREDICT_DRAINAGE_LOCATION_PATH, HttpMethod::Post),
    (FLOOD_DATA_PATH, HttpMethod::Get),
    (CHECK_FLOOD_PATH, HttpMethod::Get),
    (AREA_STATUS_PATH, HttpMethod::Get),
    (REPORT_FLOOD_PATH, HttpMethod::Post),
    (WEATHER_PATH, HttpMethod::Get),
    (DRAINAGE_DASHBOARD_PATH, HttpMethod::Get),
    (SEARCH_PATH, HttpMethod::Get),
    (STATISTICS_PATH, HttpMethod::Get),
    (RECENT_REPORTS_PATH, HttpMethod::Get),
];

/// Canonical path and method for `path`, tolerating a missing trailing slash.
pub fn endpoint(path: &str) -> Option<(&'static str, HttpMethod)> {
    let trimmed = path.trim_end_matches('/');
    ENDPOINTS
        .iter()
        .find(|(p, _)| p.trim_end_matches('/') == trimmed)
        .copied()
}

pub fn endpoint_method(path: &str) -> Option<HttpMethod> {
    endpoint(path).map(|(_, m)| m)
}

/// Accepts `12`, `"12"` and `"report_12"` alike; ids are opaque to the client.
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn rejection_message(value: &Value) -> Option<String> {
    if value.get("success").and_then(Value::as_bool) != Some(false) {
        return None;
    }
    let text = ["error", "message"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("The request was rejected by the server");
    Some(text.to_owned())
}

/// Decode a `{ success, ... }` envelope into `T`, turning `success: false`
/// into [`ApiError::Rejected`].
pub fn decode_envelope<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    if let Some(message) = rejection_message(&value) {
        return Err(ApiError::Rejected(message));
    }
    Ok(serde_json::from_value(value)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainageLevel {
    Fast,
    Medium,
    Slow,
    VerySlow,
    Unknown,
}

impl DrainageLevel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fast" => Self::Fast,
            "medium" => Self::Medium,
            "slow" => Self::Slow,
            "very_slow" => Self::VerySlow,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Fast => "Fast drainage",
            Self::Medium => "Moderate drainage",
            Self::Slow => "Slow drainage",
            Self::VerySlow => "Very slow drainage",
            Self::Unknown => "Unknown",
        }
    }

    pub fn css_color(self) -> &'static str {
        match self {
            Self::Fast => "#27ae60",
            Self::Medium => "#f39c12",
            Self::Slow => "#e74c3c",
            Self::VerySlow => "#2c3e50",
            Self::Unknown => "#7f8c8d",
        }
    }
}

/// Server-computed drainage estimate as shown in the prediction modal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrainagePrediction {
    #[serde(rename = "estimated_drainage_time_hours")]
    pub estimated_hours: f64,
    #[serde(default, rename = "drainage_level")]
    pub level_category: Option<String>,
    #[serde(default, rename = "drainage_level_text")]
    pub level_text: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub water_depth_cm: Option<f64>,
    #[serde(default, rename = "completion_time_formatted")]
    pub completion_timestamp: Option<String>,
    #[serde(default, rename = "factors_considered")]
    pub factors: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub flood_report_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub prediction_id: Option<String>,
}

impl DrainagePrediction {
    pub fn level(&self) -> DrainageLevel {
        DrainageLevel::parse(self.level_category.as_deref().unwrap_or_default())
    }

    pub fn level_label(&self) -> &str {
        self.level_text
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.level().label())
    }

    pub fn is_long_term(&self) -> bool {
        self.estimated_hours >= 24.0
    }
}

/// Prediction endpoints put the payload under `data`, older deployments at
/// the top level.
pub fn parse_prediction(value: Value) -> Result<DrainagePrediction, ApiError> {
    if let Some(message) = rejection_message(&value) {
        return Err(ApiError::Rejected(message));
    }
    let payload = match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(data @ Value::Object(_)) => data,
            Some(_) | None => Value::Object(map),
        },
        other => other,
    };
    let prediction: DrainagePrediction = serde_json::from_value(payload)?;
    if !prediction.estimated_hours.is_finite() {
        return Err(ApiError::Decode(
            "estimated_drainage_time_hours is not a finite number".into(),
        ));
    }
    Ok(prediction)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictLocationRequest {
    pub lat: f64,
    pub lng: f64,
    pub location_name: String,
    pub water_depth_cm: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerStats {
    #[serde(default)]
    pub total_zones: u32,
    #[serde(default)]
    pub total_reports: u32,
    #[serde(default)]
    pub last_update: Option<String>,
}

/// Flood zones and report points for the map, in backend order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloodLayers {
    pub flood_zones: Vec<Feature>,
    pub flood_reports: Vec<Feature>,
    pub stats: Option<LayerStats>,
    /// Features dropped because they did not decode.
    pub skipped: usize,
}

impl FloodLayers {
    /// Accepts `{data: {flood_zones, flood_reports}}`, the same keys at top
    /// level, or a plain GeoJSON `FeatureCollection`.
    pub fn from_payload(value: Value) -> Result<Self, ApiError> {
        if let Some(message) = rejection_message(&value) {
            return Err(ApiError::Rejected(message));
        }
        let Value::Object(mut root) = value else {
            return Err(ApiError::Decode("flood data is not an object".into()));
        };

        let mut source = match root.remove("data") {
            Some(Value::Object(data)) if data.contains_key("flood_zones") => data,
            _ => root,
        };

        let mut layers = Self::default();
        if let Some(zones) = source.remove("flood_zones") {
            layers.flood_zones = decode_features(zones, &mut layers.skipped);
            if let Some(reports) = source.remove("flood_reports") {
                layers.flood_reports = decode_features(reports, &mut layers.skipped);
            }
            layers.stats = source
                .remove("stats")
                .and_then(|s| serde_json::from_value(s).ok());
            return Ok(layers);
        }

        if let Some(features) = source.remove("features") {
            for feature in decode_features(features, &mut layers.skipped) {
                if is_report_feature(&feature) {
                    layers.flood_reports.push(feature);
                } else {
                    layers.flood_zones.push(feature);
                }
            }
            return Ok(layers);
        }

        Err(ApiError::Decode("response has no flood layers".into()))
    }

    pub fn feature_count(&self) -> usize {
        self.flood_zones.len() + self.flood_reports.len()
    }
}

fn decode_features(value: Value, skipped: &mut usize) -> Vec<Feature> {
    let Value::Array(items) = value else {
        *skipped += 1;
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Feature>(item) {
            Ok(f) => Some(f),
            Err(_) => {
                *skipped += 1;
                None
            }
        })
        .collect()
}

fn is_report_feature(feature: &Feature) -> bool {
    let props = &feature.properties;
    if let Some(id) = props.id.as_deref() {
        if id.starts_with("report_") {
            return true;
        }
        if id.starts_with("zone_") {
            return false;
        }
    }
    props.zone_type.is_none() && (props.severity.is_some() || props.water_depth.is_some())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub rain: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_fallback: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub rain: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    #[serde(default)]
    pub current: Option<CurrentWeather>,
    #[serde(default)]
    pub forecast: Vec<ForecastEntry>,
    #[serde(default)]
    pub alerts: Vec<WeatherAlert>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckedLocation {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
}

/// One zone or report near a checked point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearbyItem {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub max_depth: Option<f64>,
    #[serde(default)]
    pub depth: Option<f64>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub district: Option<String>,
}

impl NearbyItem {
    pub fn title(&self) -> &str {
        self.name
            .as_deref()
            .or(self.address.as_deref())
            .unwrap_or("Unnamed")
    }

    pub fn depth_cm(&self) -> Option<f64> {
        self.max_depth.or(self.depth)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloodCheck {
    #[serde(default)]
    pub has_flood: bool,
    #[serde(default)]
    pub has_risk: bool,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub nearby_data: Vec<NearbyItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckFloodResponse {
    #[serde(default)]
    pub location: CheckedLocation,
    #[serde(default)]
    pub flood_check: FloodCheck,
    #[serde(default)]
    pub weather: Option<CurrentWeather>,
    #[serde(default)]
    pub alerts: Vec<WeatherAlert>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaStats {
    #[serde(default)]
    pub total_zones: u32,
    #[serde(default)]
    pub total_reports: u32,
    #[serde(default)]
    pub recent_reports: u32,
    #[serde(default)]
    pub search_radius: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaStatus {
    #[serde(default)]
    pub stats: AreaStats,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub zones: Vec<NearbyItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaStatusResponse {
    #[serde(default)]
    pub area_status: AreaStatus,
    #[serde(default)]
    pub forecast: Vec<ForecastEntry>,
}

pub const DEFAULT_AREA_RADIUS_M: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl SearchResult {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneTotals {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub active: u32,
    #[serde(default)]
    pub black_zones: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportTotals {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub verified: u32,
    #[serde(default)]
    pub today: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub zones: ZoneTotals,
    #[serde(default)]
    pub reports: ReportTotals,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResponse {
    #[serde(default)]
    pub stats: Statistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentReport {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub water_depth: f64,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub reporter_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentReportsResponse {
    #[serde(default)]
    pub reports: Vec<RecentReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_active_predictions: u32,
    #[serde(default)]
    pub fast_drainage_count: u32,
    #[serde(default)]
    pub medium_drainage_count: u32,
    #[serde(default)]
    pub slow_drainage_count: u32,
    #[serde(default)]
    pub districts: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingCompletion {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub current_depth: Option<f64>,
    #[serde(default)]
    pub remaining_hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrainageDashboard {
    #[serde(default)]
    pub summary: DashboardSummary,
    #[serde(default)]
    pub soonest_completions: Vec<PendingCompletion>,
}

/// The dashboard endpoint wraps its payload in `data`.
pub fn parse_dashboard(value: Value) -> Result<DrainageDashboard, ApiError> {
    if let Some(message) = rejection_message(&value) {
        return Err(ApiError::Rejected(message));
    }
    let payload = match value {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Object(map)),
        other => other,
    };
    Ok(serde_json::from_value(payload)?)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportFloodRequest {
    pub address: String,
    pub water_depth: f64,
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reporter_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reporter_phone: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub area_size: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFloodResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub report_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn prediction_payload_under_data() {
        let raw = json!({
            "success": true,
            "data": {
                "estimated_drainage_time_hours": 3.5,
                "drainage_level": "medium",
                "factors_considered": ["Độ sâu 40cm"],
                "recommendations": ["Tránh di chuyển"],
                "completion_time_formatted": "18:30 12/10",
                "flood_report_id": 42
            }
        });
        let prediction = parse_prediction(raw).expect("prediction");
        assert_eq!(prediction.estimated_hours, 3.5);
        assert_eq!(prediction.level(), DrainageLevel::Medium);
        assert_eq!(prediction.flood_report_id.as_deref(), Some("42"));
        assert_eq!(prediction.factors.len(), 1);
    }

    #[test]
    fn prediction_payload_at_top_level() {
        let raw = json!({"success": true, "estimated_drainage_time_hours": 30});
        let prediction = parse_prediction(raw).expect("prediction");
        assert!(prediction.is_long_term());
        assert_eq!(prediction.level(), DrainageLevel::Unknown);
        assert_eq!(prediction.level_label(), "Unknown");
    }

    #[test]
    fn rejected_envelope_prefers_error_then_message() {
        let err = parse_prediction(json!({"success": false, "error": "Không tìm thấy báo cáo"}))
            .unwrap_err();
        assert_eq!(err, ApiError::Rejected("Không tìm thấy báo cáo".into()));

        let err = decode_envelope::<SearchResponse>(json!({"success": false, "message": "busy"}))
            .unwrap_err();
        assert_eq!(err, ApiError::Rejected("busy".into()));
    }

    #[test]
    fn missing_hours_is_decode_error() {
        let err = parse_prediction(json!({"success": true, "data": {}})).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn flood_layers_accept_all_three_shapes() {
        let zone = json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [105.85, 21.03]},
            "properties": {"id": "zone_1", "zone_type": "rain"}
        });
        let report = json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [105.80, 21.01]},
            "properties": {"id": "report_9", "water_depth": 25, "severity": "medium"}
        });

        let nested = json!({
            "success": true,
            "data": {"flood_zones": [zone.clone()], "flood_reports": [report.clone()],
                     "stats": {"total_zones": 1, "total_reports": 1}}
        });
        let layers = FloodLayers::from_payload(nested).expect("nested");
        assert_eq!((layers.flood_zones.len(), layers.flood_reports.len()), (1, 1));
        assert_eq!(layers.stats.map(|s| s.total_zones), Some(1));

        let flat = json!({"flood_zones": [zone.clone()], "flood_reports": []});
        let layers = FloodLayers::from_payload(flat).expect("flat");
        assert_eq!(layers.feature_count(), 1);

        let collection = json!({"type": "FeatureCollection", "features": [zone, report]});
        let layers = FloodLayers::from_payload(collection).expect("collection");
        assert_eq!(layers.flood_zones.len(), 1);
        assert_eq!(layers.flood_reports.len(), 1);
    }

    #[test]
    fn flood_layers_skip_malformed_features() {
        let raw = json!({"flood_zones": [
            {"geometry": {"type": "Point", "coordinates": [105.8, 21.0]}, "properties": {}},
            {"geometry": {"type": "Point", "coordinates": "nope"}},
        ]});
        let layers = FloodLayers::from_payload(raw).expect("layers");
        assert_eq!(layers.flood_zones.len(), 1);
        assert_eq!(layers.skipped, 1);
    }

    #[test]
    fn flood_layers_without_known_keys_fail() {
        let err = FloodLayers::from_payload(json!({"success": true, "data": []})).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn endpoint_lookup_tolerates_trailing_slash() {
        assert_eq!(endpoint_method("/api/weather"), Some(HttpMethod::Get));
        assert_eq!(
            endpoint_method("/api/report-flood/"),
            Some(HttpMethod::Post)
        );
        assert_eq!(endpoint_method("/api/admin/"), None);
        assert!(HttpMethod::Post.needs_csrf());
        assert!(!HttpMethod::Get.needs_csrf());
    }

    #[test]
    fn dashboard_payload_unwraps_data() {
        let raw = json!({
            "success": true,
            "data": {
                "summary": {"total_active_predictions": 2, "districts": {"Đống Đa": 2}},
                "soonest_completions": [{"address": "Chùa Bộc", "remaining_hours": 1.5}]
            }
        });
        let dashboard = parse_dashboard(raw).expect("dashboard");
        assert_eq!(dashboard.summary.total_active_predictions, 2);
        assert_eq!(dashboard.soonest_completions[0].remaining_hours, 1.5);
    }

    #[test]
    fn report_request_omits_empty_optionals() {
        let body = ReportFloodRequest {
            address: "Phố Huế".into(),
            water_depth: 30.0,
            lat: 21.01,
            lng: 105.85,
            description: String::new(),
            reporter_name: "Lan".into(),
            reporter_phone: String::new(),
            area_size: String::new(),
        };
        let value = serde_json::to_value(body).expect("json");
        assert!(value.get("description").is_none());
        assert_eq!(value["reporter_name"], "Lan");
    }
}
