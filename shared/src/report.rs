use crate::api::ReportFloodRequest;
use crate::error::RequestError;
use crate::geo::{LatLng, ensure_in_hanoi};

pub const MIN_SEARCH_CHARS: usize = 2;

/// Trimmed query, or an error when it is too short to send.
pub fn validate_search_query(raw: &str) -> Result<&str, RequestError> {
    let query = raw.trim();
    if query.chars().count() < MIN_SEARCH_CHARS {
        return Err(RequestError::QueryTooShort {
            min: MIN_SEARCH_CHARS,
        });
    }
    Ok(query)
}

/// Raw contents of the report form. Numbers stay as typed until submit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDraft {
    pub address: String,
    pub water_depth: String,
    pub location: Option<LatLng>,
    pub description: String,
    pub reporter_name: String,
    pub reporter_phone: String,
    pub area_size: String,
}

impl ReportDraft {
    pub fn validate(&self) -> Result<ReportFloodRequest, RequestError> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(RequestError::MissingField("address"));
        }

        let depth_raw = self.water_depth.trim();
        if depth_raw.is_empty() {
            return Err(RequestError::MissingField("water_depth"));
        }
        let water_depth: f64 = depth_raw
            .replace(',', ".")
            .parse()
            .map_err(|_| RequestError::InvalidDepth(f64::NAN))?;
        if !water_depth.is_finite() || water_depth < 0.0 {
            return Err(RequestError::InvalidDepth(water_depth));
        }

        let location = self.location.ok_or(RequestError::MissingField("location"))?;
        let location = ensure_in_hanoi(location)?;

        Ok(ReportFloodRequest {
            address: address.to_owned(),
            water_depth,
            lat: location.lat,
            lng: location.lng,
            description: self.description.trim().to_owned(),
            reporter_name: self.reporter_name.trim().to_owned(),
            reporter_phone: self.reporter_phone.trim().to_owned(),
            area_size: self.area_size.trim().to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ReportDraft {
        ReportDraft {
            address: " 12 Phố Huế ".into(),
            water_depth: "35,5".into(),
            location: Some(LatLng::new(21.015, 105.851)),
            reporter_name: "Minh".into(),
            ..ReportDraft::default()
        }
    }

    #[test]
    fn valid_draft_builds_trimmed_request() {
        let request = draft().validate().expect("valid");
        assert_eq!(request.address, "12 Phố Huế");
        assert_eq!(request.water_depth, 35.5);
        assert_eq!(request.reporter_name, "Minh");
        assert!(request.description.is_empty());
    }

    #[test]
    fn required_fields_are_checked_in_order() {
        let mut d = draft();
        d.address = "  ".into();
        assert_eq!(d.validate(), Err(RequestError::MissingField("address")));

        let mut d = draft();
        d.water_depth.clear();
        assert_eq!(d.validate(), Err(RequestError::MissingField("water_depth")));

        let mut d = draft();
        d.location = None;
        assert_eq!(d.validate(), Err(RequestError::MissingField("location")));
    }

    #[test]
    fn negative_or_garbage_depth_is_rejected() {
        let mut d = draft();
        d.water_depth = "-3".into();
        assert_eq!(d.validate(), Err(RequestError::InvalidDepth(-3.0)));

        d.water_depth = "deep".into();
        assert!(matches!(d.validate(), Err(RequestError::InvalidDepth(v)) if v.is_nan()));
    }

    #[test]
    fn location_outside_hanoi_is_rejected() {
        let mut d = draft();
        d.location = Some(LatLng::new(16.047, 108.206));
        assert!(matches!(d.validate(), Err(RequestError::OutsideHanoi { .. })));
    }

    #[test]
    fn search_needs_two_characters() {
        assert_eq!(
            validate_search_query(" a "),
            Err(RequestError::QueryTooShort { min: 2 })
        );
        assert_eq!(validate_search_query("  Hồ "), Ok("Hồ"));
    }
}
