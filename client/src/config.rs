//! Compile-time client settings.

pub(crate) const SETTINGS_KEY: &str = "hanoi_flood_settings";

pub(crate) const SIDEBAR_WIDTH: f64 = 360.0;

pub(crate) const TOAST_CAPACITY: usize = 4;

/// Asia/Ho_Chi_Minh has no DST.
pub(crate) const HANOI_UTC_OFFSET_SECS: i32 = 7 * 3600;

pub(crate) const RECENT_REPORTS_LIMIT: usize = 10;

pub(crate) const AREA_RADIUS_CHOICES_M: [u32; 4] = [500, 1000, 2000, 5000];

/// Screen-space pick radius for report dots and point zones.
pub(crate) const POINT_HIT_RADIUS_PX: f64 = 9.0;

/// Clicks that moved further than this are treated as drags.
pub(crate) const CLICK_SLOP_PX: f64 = 5.0;
