use hanoi_flood_shared::geo::{Bounds, HANOI_CENTER, LatLng};

const METRES_PER_DEG_LAT: f64 = 110_574.0;
const METRES_PER_DEG_LNG_EQUATOR: f64 = 111_320.0;

/// Equirectangular projection around the city centre. World units are metres,
/// x grows east and y grows south so it lines up with canvas space.
pub fn project(p: LatLng) -> (f64, f64) {
    let k = METRES_PER_DEG_LNG_EQUATOR * HANOI_CENTER.lat.to_radians().cos();
    (
        (p.lng - HANOI_CENTER.lng) * k,
        -(p.lat - HANOI_CENTER.lat) * METRES_PER_DEG_LAT,
    )
}

pub fn unproject(wx: f64, wy: f64) -> LatLng {
    let k = METRES_PER_DEG_LNG_EQUATOR * HANOI_CENTER.lat.to_radians().cos();
    LatLng {
        lat: HANOI_CENTER.lat - wy / METRES_PER_DEG_LAT,
        lng: HANOI_CENTER.lng + wx / k,
    }
}

/// Pan/zoom transform from world metres to screen pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    /// Pixels per metre.
    pub scale: f64,
}

const MIN_SCALE: f64 = 0.004;
const MAX_SCALE: f64 = 4.0;
const ZOOM_SENSITIVITY: f64 = 0.0015;

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset_x: 600.0,
            offset_y: 400.0,
            scale: 0.03,
        }
    }
}

impl Viewport {
    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (
            wx * self.scale + self.offset_x,
            wy * self.scale + self.offset_y,
        )
    }

    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.offset_x) / self.scale,
            (sy - self.offset_y) / self.scale,
        )
    }

    pub fn latlng_to_screen(&self, p: LatLng) -> (f64, f64) {
        let (wx, wy) = project(p);
        self.world_to_screen(wx, wy)
    }

    pub fn screen_to_latlng(&self, sx: f64, sy: f64) -> LatLng {
        let (wx, wy) = self.screen_to_world(sx, sy);
        unproject(wx, wy)
    }

    /// Zoom toward a focus point (screen coordinates).
    pub fn zoom_at(&mut self, delta: f64, screen_x: f64, screen_y: f64) {
        let factor = (-delta * ZOOM_SENSITIVITY).exp();
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = new_scale / self.scale;

        self.offset_x = screen_x - (screen_x - self.offset_x) * ratio;
        self.offset_y = screen_y - (screen_y - self.offset_y) * ratio;
        self.scale = new_scale;
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Put `p` at the centre of the canvas, keeping at least `min_scale`.
    pub fn center_on(&mut self, p: LatLng, min_scale: f64, canvas_w: f64, canvas_h: f64) {
        self.scale = self.scale.max(min_scale).clamp(MIN_SCALE, MAX_SCALE);
        let (wx, wy) = project(p);
        self.offset_x = canvas_w / 2.0 - wx * self.scale;
        self.offset_y = canvas_h / 2.0 - wy * self.scale;
    }

    pub fn fit_latlng_bounds(&mut self, bounds: &Bounds, canvas_w: f64, canvas_h: f64) {
        let (x0, y0) = project(LatLng::new(bounds.north_east.lat, bounds.south_west.lng));
        let (x1, y1) = project(LatLng::new(bounds.south_west.lat, bounds.north_east.lng));
        self.fit_bounds(x0, y0, x1, y1, canvas_w, canvas_h);
    }

    /// Fit world-coordinate bounds with padding.
    pub fn fit_bounds(
        &mut self,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        canvas_w: f64,
        canvas_h: f64,
    ) {
        let world_w = max_x - min_x;
        let world_h = max_y - min_y;

        if world_w <= 0.0 || world_h <= 0.0 || canvas_w <= 0.0 || canvas_h <= 0.0 {
            return;
        }

        let padding = 0.05;
        let scale_x = canvas_w / (world_w * (1.0 + padding * 2.0));
        let scale_y = canvas_h / (world_h * (1.0 + padding * 2.0));
        self.scale = scale_x.min(scale_y).clamp(MIN_SCALE, MAX_SCALE);

        let center_x = (min_x + max_x) / 2.0;
        let center_y = (min_y + max_y) / 2.0;
        self.offset_x = canvas_w / 2.0 - center_x * self.scale;
        self.offset_y = canvas_h / 2.0 - center_y * self.scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanoi_flood_shared::geo::HANOI_BOUNDS;

    #[test]
    fn projection_round_trips_near_centre() {
        let p = LatLng::new(21.05, 105.80);
        let (wx, wy) = project(p);
        let back = unproject(wx, wy);
        assert!((back.lat - p.lat).abs() < 1e-9);
        assert!((back.lng - p.lng).abs() < 1e-9);
        // north of centre is up on screen
        assert!(wy < 0.0);
        assert!(wx < 0.0);
    }

    #[test]
    fn fitted_city_bounds_are_fully_visible() {
        let mut vp = Viewport::default();
        vp.fit_latlng_bounds(&HANOI_BOUNDS, 1000.0, 800.0);
        for corner in [HANOI_BOUNDS.south_west, HANOI_BOUNDS.north_east] {
            let (sx, sy) = vp.latlng_to_screen(corner);
            assert!((0.0..=1000.0).contains(&sx), "x {sx}");
            assert!((0.0..=800.0).contains(&sy), "y {sy}");
        }
    }

    #[test]
    fn zoom_keeps_focus_point_fixed() {
        let mut vp = Viewport::default();
        let before = vp.screen_to_latlng(300.0, 200.0);
        vp.zoom_at(-240.0, 300.0, 200.0);
        let after = vp.screen_to_latlng(300.0, 200.0);
        assert!((before.lat - after.lat).abs() < 1e-9);
        assert!((before.lng - after.lng).abs() < 1e-9);
    }

    #[test]
    fn center_on_places_point_mid_canvas() {
        let mut vp = Viewport::default();
        let target = LatLng::new(21.0, 105.9);
        vp.center_on(target, 0.2, 800.0, 600.0);
        let (sx, sy) = vp.latlng_to_screen(target);
        assert!((sx - 400.0).abs() < 1e-6);
        assert!((sy - 300.0).abs() < 1e-6);
        assert!(vp.scale >= 0.2);
    }
}
