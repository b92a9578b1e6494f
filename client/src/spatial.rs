use hanoi_flood_shared::geo::{Feature, Geometry, LatLng};
use hanoi_flood_shared::refresh::MapLayerState;

use crate::viewport::{project, unproject};

const GRID_COLS: usize = 50;
const GRID_ROWS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Zone,
    Report,
}

/// Index into `MapLayerState::flood_zone_features` or `report_features`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureRef {
    pub layer: Layer,
    pub index: usize,
}

impl FeatureRef {
    pub fn resolve<'a>(&self, state: &'a MapLayerState) -> Option<&'a Feature> {
        match self.layer {
            Layer::Zone => state.flood_zone_features.get(self.index),
            Layer::Report => state.report_features.get(self.index),
        }
    }
}

struct Entry {
    target: FeatureRef,
    geometry: Geometry,
    /// World-space bbox: min_x, min_y, max_x, max_y.
    bounds: (f64, f64, f64, f64),
}

/// Uniform grid over world space for click and hover hit-testing.
/// Rebuilt whenever a new layer state is applied.
pub struct SpatialGrid {
    cells: Vec<Vec<usize>>,
    entries: Vec<Entry>,
    min_x: f64,
    min_y: f64,
    cell_w: f64,
    cell_h: f64,
}

impl SpatialGrid {
    pub fn empty() -> Self {
        Self {
            cells: Vec::new(),
            entries: Vec::new(),
            min_x: 0.0,
            min_y: 0.0,
            cell_w: 1.0,
            cell_h: 1.0,
        }
    }

    pub fn build(state: &MapLayerState) -> Self {
        let mut entries = Vec::new();
        let layers = [
            (Layer::Zone, &state.flood_zone_features),
            (Layer::Report, &state.report_features),
        ];
        for (layer, features) in layers {
            for (index, feature) in features.iter().enumerate() {
                let Some(geometry) = feature.geometry.as_ref() else {
                    continue;
                };
                let Some((min_lng, min_lat, max_lng, max_lat)) = geometry.bbox() else {
                    continue;
                };
                // north is up, so the max latitude gives the min y
                let (x0, y0) = project(LatLng::new(max_lat, min_lng));
                let (x1, y1) = project(LatLng::new(min_lat, max_lng));
                entries.push(Entry {
                    target: FeatureRef { layer, index },
                    geometry: geometry.clone(),
                    bounds: (x0, y0, x1, y1),
                });
            }
        }

        if entries.is_empty() {
            return Self::empty();
        }

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for e in &entries {
            min_x = min_x.min(e.bounds.0);
            min_y = min_y.min(e.bounds.1);
            max_x = max_x.max(e.bounds.2);
            max_y = max_y.max(e.bounds.3);
        }

        // Padding keeps single-point layers from collapsing to a zero-size grid.
        min_x -= 1.0;
        min_y -= 1.0;
        max_x += 1.0;
        max_y += 1.0;

        let cell_w = (max_x - min_x) / GRID_COLS as f64;
        let cell_h = (max_y - min_y) / GRID_ROWS as f64;

        let mut grid = Self {
            cells: vec![Vec::new(); GRID_COLS * GRID_ROWS],
            entries: Vec::new(),
            min_x,
            min_y,
            cell_w,
            cell_h,
        };
        for (idx, e) in entries.iter().enumerate() {
            let (c0, r0, c1, r1) = grid.cell_range(e.bounds.0, e.bounds.1, e.bounds.2, e.bounds.3);
            for row in r0..=r1 {
                for col in c0..=c1 {
                    grid.cells[row * GRID_COLS + col].push(idx);
                }
            }
        }
        grid.entries = entries;
        grid
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn cell_range(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> (usize, usize, usize, usize) {
        let col = |x: f64| {
            (((x - self.min_x) / self.cell_w).floor().max(0.0) as usize).min(GRID_COLS - 1)
        };
        let row = |y: f64| {
            (((y - self.min_y) / self.cell_h).floor().max(0.0) as usize).min(GRID_ROWS - 1)
        };
        (col(x0), row(y0), col(x1), row(y1))
    }

    /// Feature under a world coordinate. Points within `pick_radius` (world
    /// units) win over areas; reports win over zones; the nearest point wins.
    pub fn find_at(&self, wx: f64, wy: f64, pick_radius: f64) -> Option<FeatureRef> {
        if self.cells.is_empty() {
            return None;
        }
        let r = pick_radius.max(0.0);
        if wx + r < self.min_x
            || wy + r < self.min_y
            || wx - r > self.min_x + self.cell_w * GRID_COLS as f64
            || wy - r > self.min_y + self.cell_h * GRID_ROWS as f64
        {
            return None;
        }

        let (c0, r0, c1, r1) = self.cell_range(wx - r, wy - r, wx + r, wy + r);
        let mut candidates: Vec<usize> = Vec::new();
        for row in r0..=r1 {
            for col in c0..=c1 {
                candidates.extend_from_slice(&self.cells[row * GRID_COLS + col]);
            }
        }
        candidates.sort_unstable();
        candidates.dedup();

        let mut best_point: Option<(FeatureRef, f64)> = None;
        for &idx in &candidates {
            let e = &self.entries[idx];
            let Geometry::Point { coordinates } = &e.geometry else {
                continue;
            };
            let (px, py) = project(LatLng::from_geojson(*coordinates));
            let d = ((px - wx).powi(2) + (py - wy).powi(2)).sqrt();
            if d > r {
                continue;
            }
            let better = match best_point {
                None => true,
                Some((prev, prev_d)) => {
                    (e.target.layer == Layer::Report && prev.layer == Layer::Zone)
                        || (e.target.layer == prev.layer && d < prev_d)
                }
            };
            if better {
                best_point = Some((e.target, d));
            }
        }
        if let Some((target, _)) = best_point {
            return Some(target);
        }

        let p = unproject(wx, wy);
        // Later zones are painted on top, so search back to front.
        candidates
            .iter()
            .rev()
            .map(|&idx| &self.entries[idx])
            .find(|e| e.geometry.contains(p))
            .map(|e| e.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hanoi_flood_shared::geo::FeatureProperties;

    fn square(lat: f64, lng: f64, half: f64) -> Feature {
        Feature {
            geometry: Some(Geometry::Polygon {
                coordinates: vec![vec![
                    [lng - half, lat - half],
                    [lng + half, lat - half],
                    [lng + half, lat + half],
                    [lng - half, lat + half],
                    [lng - half, lat - half],
                ]],
            }),
            properties: FeatureProperties::default(),
        }
    }

    fn point(lat: f64, lng: f64) -> Feature {
        Feature {
            geometry: Some(Geometry::Point {
                coordinates: [lng, lat],
            }),
            properties: FeatureProperties::default(),
        }
    }

    fn state(zones: Vec<Feature>, reports: Vec<Feature>) -> MapLayerState {
        MapLayerState {
            flood_zone_features: zones,
            report_features: reports,
            ..MapLayerState::default()
        }
    }

    #[test]
    fn empty_layers_hit_nothing() {
        let grid = SpatialGrid::build(&state(Vec::new(), Vec::new()));
        assert!(grid.is_empty());
        assert_eq!(grid.find_at(0.0, 0.0, 100.0), None);
    }

    #[test]
    fn finds_zone_containing_point() {
        let grid = SpatialGrid::build(&state(
            vec![square(21.0, 105.8, 0.01), square(21.1, 105.9, 0.01)],
            Vec::new(),
        ));
        let (wx, wy) = project(LatLng::new(21.1, 105.9));
        assert_eq!(
            grid.find_at(wx, wy, 0.0),
            Some(FeatureRef {
                layer: Layer::Zone,
                index: 1
            })
        );
        let (wx, wy) = project(LatLng::new(21.05, 105.85));
        assert_eq!(grid.find_at(wx, wy, 0.0), None);
    }

    #[test]
    fn report_inside_zone_wins() {
        let grid = SpatialGrid::build(&state(
            vec![square(21.0, 105.8, 0.01)],
            vec![point(21.0, 105.8)],
        ));
        let (wx, wy) = project(LatLng::new(21.0, 105.8));
        let hit = grid.find_at(wx + 20.0, wy, 50.0);
        assert_eq!(
            hit,
            Some(FeatureRef {
                layer: Layer::Report,
                index: 0
            })
        );
        // outside the pick radius falls back to the zone underneath
        let hit = grid.find_at(wx + 200.0, wy, 50.0);
        assert_eq!(hit.map(|h| h.layer), Some(Layer::Zone));
    }

    #[test]
    fn nearest_report_is_picked() {
        let grid = SpatialGrid::build(&state(
            Vec::new(),
            vec![point(21.0, 105.80), point(21.0, 105.8005)],
        ));
        let (wx, wy) = project(LatLng::new(21.0, 105.8004));
        assert_eq!(grid.find_at(wx, wy, 200.0).map(|h| h.index), Some(1));
    }

    #[test]
    fn features_without_geometry_are_ignored() {
        let mut f = point(21.0, 105.8);
        f.geometry = None;
        let grid = SpatialGrid::build(&state(Vec::new(), vec![f]));
        assert!(grid.is_empty());
    }
}
