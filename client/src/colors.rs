use hanoi_flood_shared::geo::{Feature, Severity, ZoneType};

/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

pub fn rgb_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Brighten a color by a factor (1.0 = no change, >1.0 = brighter).
pub fn brighten(r: u8, g: u8, b: u8, factor: f64) -> (u8, u8, u8) {
    (
        ((r as f64 * factor).min(255.0)) as u8,
        ((g as f64 * factor).min(255.0)) as u8,
        ((b as f64 * factor).min(255.0)) as u8,
    )
}

pub fn zone_color(feature: &Feature) -> (u8, u8, u8) {
    feature.properties.zone_kind().color_rgb()
}

/// Severity from the label when present, otherwise derived from depth.
pub fn report_severity(feature: &Feature) -> Severity {
    match feature.properties.severity_kind() {
        Severity::Unknown => feature
            .properties
            .water_depth
            .map_or(Severity::Unknown, Severity::from_depth_cm),
        known => known,
    }
}

pub fn zone_legend() -> [(ZoneType, String); 6] {
    [
        ZoneType::Black,
        ZoneType::Frequent,
        ZoneType::Seasonal,
        ZoneType::Rain,
        ZoneType::Tide,
        ZoneType::Other,
    ]
    .map(|z| (z, rgb_hex(z.color_rgb())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanoi_flood_shared::geo::FeatureProperties;

    #[test]
    fn hex_is_lowercase_six_digits() {
        assert_eq!(rgb_hex((0xc0, 0x39, 0x2b)), "#c0392b");
        assert_eq!(rgb_hex((0, 0, 0)), "#000000");
    }

    #[test]
    fn brighten_saturates() {
        assert_eq!(brighten(200, 100, 0, 2.0), (255, 200, 0));
    }

    #[test]
    fn report_severity_falls_back_to_depth() {
        let feature = Feature {
            geometry: None,
            properties: FeatureProperties {
                water_depth: Some(55.0),
                ..FeatureProperties::default()
            },
        };
        assert_eq!(report_severity(&feature), Severity::Heavy);
    }
}
