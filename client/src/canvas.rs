use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent, WheelEvent};

use hanoi_flood_shared::geo::{Feature, Geometry, HANOI_BOUNDS, LatLng};
use hanoi_flood_shared::refresh::MapLayerState;

use crate::app::{MapViewState, MousePos, SideData, SidebarOpen};
use crate::colors::{brighten, report_severity, rgba_css, zone_color};
use crate::config::{CLICK_SLOP_PX, POINT_HIT_RADIUS_PX};
use crate::render_loop::RenderScheduler;
use crate::sidebar::check_location;
use crate::spatial::{FeatureRef, Layer, SpatialGrid};
use crate::toast::Toasts;
use crate::viewport::Viewport;

const BACKGROUND: &str = "#0d121b";
const REPORT_RADIUS_PX: f64 = 5.0;
const GRATICULE_STEP_DEG: f64 = 0.05;

fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .max(1.0)
}

/// Size the backing store to the parent box and return a context scaled so
/// all drawing happens in CSS pixels.
fn prepare_context(canvas: &HtmlCanvasElement) -> Option<(CanvasRenderingContext2d, f64, f64)> {
    let parent = canvas.parent_element()?;
    let w = parent.client_width() as f64;
    let h = parent.client_height() as f64;
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    let dpr = device_pixel_ratio();
    let (pw, ph) = ((w * dpr).round() as u32, (h * dpr).round() as u32);
    if canvas.width() != pw || canvas.height() != ph {
        canvas.set_width(pw);
        canvas.set_height(ph);
    }
    let ctx = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())?;
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();
    Some((ctx, w, h))
}

fn trace_ring(ctx: &CanvasRenderingContext2d, vp: &Viewport, ring: &[[f64; 2]]) {
    for (i, pos) in ring.iter().enumerate() {
        let (x, y) = vp.latlng_to_screen(LatLng::from_geojson(*pos));
        if i == 0 {
            ctx.move_to(x, y);
        } else {
            ctx.line_to(x, y);
        }
    }
    ctx.close_path();
}

fn draw_frame(ctx: &CanvasRenderingContext2d, vp: &Viewport, w: f64, h: f64) {
    ctx.set_fill_style_str(BACKGROUND);
    ctx.fill_rect(0.0, 0.0, w, h);

    let sw = HANOI_BOUNDS.south_west;
    let ne = HANOI_BOUNDS.north_east;

    ctx.set_stroke_style_str("rgba(255,255,255,0.05)");
    ctx.set_line_width(1.0);
    ctx.begin_path();
    let mut lat = (sw.lat / GRATICULE_STEP_DEG).ceil() * GRATICULE_STEP_DEG;
    while lat <= ne.lat {
        let (x0, y) = vp.latlng_to_screen(LatLng::new(lat, sw.lng));
        let (x1, _) = vp.latlng_to_screen(LatLng::new(lat, ne.lng));
        ctx.move_to(x0, y);
        ctx.line_to(x1, y);
        lat += GRATICULE_STEP_DEG;
    }
    let mut lng = (sw.lng / GRATICULE_STEP_DEG).ceil() * GRATICULE_STEP_DEG;
    while lng <= ne.lng {
        let (x, y0) = vp.latlng_to_screen(LatLng::new(ne.lat, lng));
        let (_, y1) = vp.latlng_to_screen(LatLng::new(sw.lat, lng));
        ctx.move_to(x, y0);
        ctx.line_to(x, y1);
        lng += GRATICULE_STEP_DEG;
    }
    ctx.stroke();

    let (x0, y0) = vp.latlng_to_screen(LatLng::new(ne.lat, sw.lng));
    let (x1, y1) = vp.latlng_to_screen(LatLng::new(sw.lat, ne.lng));
    ctx.set_stroke_style_str("rgba(120,160,220,0.35)");
    ctx.set_line_width(1.5);
    ctx.stroke_rect(x0, y0, x1 - x0, y1 - y0);
}

fn draw_zone(ctx: &CanvasRenderingContext2d, vp: &Viewport, feature: &Feature, emphasis: f64) {
    let Some(geometry) = feature.geometry.as_ref() else {
        return;
    };
    let (r, g, b) = zone_color(feature);
    let (sr, sg, sb) = brighten(r, g, b, emphasis);
    let fill_alpha = if emphasis > 1.0 { 0.45 } else { 0.28 };
    match geometry {
        Geometry::Polygon { coordinates } => {
            ctx.begin_path();
            coordinates.iter().for_each(|ring| trace_ring(ctx, vp, ring));
        }
        Geometry::MultiPolygon { coordinates } => {
            ctx.begin_path();
            coordinates
                .iter()
                .flatten()
                .for_each(|ring| trace_ring(ctx, vp, ring));
        }
        Geometry::LineString { coordinates } => {
            ctx.begin_path();
            for (i, pos) in coordinates.iter().enumerate() {
                let (x, y) = vp.latlng_to_screen(LatLng::from_geojson(*pos));
                if i == 0 {
                    ctx.move_to(x, y);
                } else {
                    ctx.line_to(x, y);
                }
            }
            ctx.set_stroke_style_str(&rgba_css(sr, sg, sb, 0.9));
            ctx.set_line_width(3.0 * emphasis);
            ctx.stroke();
            return;
        }
        Geometry::Point { coordinates } => {
            let (x, y) = vp.latlng_to_screen(LatLng::from_geojson(*coordinates));
            ctx.begin_path();
            ctx.arc(x, y, 6.0 * emphasis, 0.0, std::f64::consts::TAU).ok();
        }
        Geometry::Unsupported => return,
    }
    ctx.set_fill_style_str(&rgba_css(r, g, b, fill_alpha));
    ctx.fill_with_canvas_winding_rule(web_sys::CanvasWindingRule::Evenodd);
    ctx.set_stroke_style_str(&rgba_css(sr, sg, sb, 0.95));
    ctx.set_line_width(if emphasis > 1.0 { 2.5 } else { 1.2 });
    ctx.stroke();
}

fn draw_report(ctx: &CanvasRenderingContext2d, vp: &Viewport, feature: &Feature, emphasis: f64) {
    let Some(Geometry::Point { coordinates }) = feature.geometry.as_ref() else {
        return;
    };
    let (x, y) = vp.latlng_to_screen(LatLng::from_geojson(*coordinates));
    let (r, g, b) = report_severity(feature).color_rgb();
    ctx.begin_path();
    ctx.arc(x, y, REPORT_RADIUS_PX * emphasis, 0.0, std::f64::consts::TAU)
        .ok();
    ctx.set_fill_style_str(&rgba_css(r, g, b, 0.95));
    ctx.fill();
    ctx.set_stroke_style_str("rgba(255,255,255,0.85)");
    ctx.set_line_width(if emphasis > 1.0 { 2.0 } else { 1.0 });
    ctx.stroke();
}

fn draw_marker(ctx: &CanvasRenderingContext2d, vp: &Viewport, at: LatLng) {
    let (x, y) = vp.latlng_to_screen(at);
    ctx.begin_path();
    ctx.arc(x, y - 14.0, 7.0, 0.0, std::f64::consts::TAU).ok();
    ctx.move_to(x - 6.0, y - 10.0);
    ctx.line_to(x, y);
    ctx.line_to(x + 6.0, y - 10.0);
    ctx.set_fill_style_str("#2d6cdf");
    ctx.fill();
    ctx.set_stroke_style_str("#ffffff");
    ctx.set_line_width(1.5);
    ctx.stroke();
}

fn draw_label(ctx: &CanvasRenderingContext2d, vp: &Viewport, feature: &Feature) {
    let Some(anchor) = feature.geometry.as_ref().and_then(Geometry::anchor) else {
        return;
    };
    let (x, y) = vp.latlng_to_screen(anchor);
    let text = feature.properties.title();
    ctx.set_font("600 12px 'Inter', system-ui, sans-serif");
    ctx.set_text_align("center");
    ctx.set_line_width(3.0);
    ctx.set_stroke_style_str("rgba(8,10,18,0.9)");
    ctx.stroke_text(text, x, y - 12.0).ok();
    ctx.set_fill_style_str("#e4e8ef");
    ctx.fill_text(text, x, y - 12.0).ok();
}

struct Highlight {
    hovered: Option<FeatureRef>,
    selected: Option<FeatureRef>,
}

impl Highlight {
    fn emphasis(&self, target: FeatureRef) -> f64 {
        if self.selected == Some(target) {
            1.5
        } else if self.hovered == Some(target) {
            1.25
        } else {
            1.0
        }
    }
}

fn render_layers(
    ctx: &CanvasRenderingContext2d,
    vp: &Viewport,
    state: &MapLayerState,
    highlight: &Highlight,
) {
    for (index, feature) in state.flood_zone_features.iter().enumerate() {
        let target = FeatureRef {
            layer: Layer::Zone,
            index,
        };
        draw_zone(ctx, vp, feature, highlight.emphasis(target));
    }
    for (index, feature) in state.report_features.iter().enumerate() {
        let target = FeatureRef {
            layer: Layer::Report,
            index,
        };
        draw_report(ctx, vp, feature, highlight.emphasis(target));
    }
    if let Some(feature) = highlight.selected.and_then(|s| s.resolve(state)) {
        draw_label(ctx, vp, feature);
    }
}

fn canvas_element(canvas_ref: NodeRef<leptos::html::Canvas>) -> Option<HtmlCanvasElement> {
    canvas_ref.get_untracked().map(|c| {
        let c: &HtmlCanvasElement = &c;
        c.clone()
    })
}

fn local_point(canvas: Option<HtmlCanvasElement>, e: &MouseEvent) -> (f64, f64) {
    canvas
        .map(|el| {
            let rect = el.get_bounding_client_rect();
            (
                e.client_x() as f64 - rect.left(),
                e.client_y() as f64 - rect.top(),
            )
        })
        .unwrap_or((e.offset_x() as f64, e.offset_y() as f64))
}

#[component]
pub fn MapCanvas() -> impl IntoView {
    let view: MapViewState = expect_context();
    let data: SideData = expect_context();
    let toasts: Toasts = expect_context();
    let SidebarOpen(sidebar_open) = expect_context();
    let MousePos(mouse_pos) = expect_context();
    let MapViewState {
        layers,
        viewport,
        hovered,
        selected,
        picked,
    } = view;

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    let is_dragging = Rc::new(Cell::new(false));
    let drag_start = Rc::new(Cell::new((0.0f64, 0.0f64)));
    let last_pos = Rc::new(Cell::new((0.0f64, 0.0f64)));
    let pinch_dist = Rc::new(Cell::new(0.0f64));

    let spatial_grid = Rc::new(RefCell::new(SpatialGrid::empty()));
    let grid_seq = Rc::new(Cell::new(0u64));

    let scheduler = Rc::new(RenderScheduler::new(move || {
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let canvas: &HtmlCanvasElement = &canvas;
        let Some((ctx, w, h)) = prepare_context(canvas) else {
            return;
        };
        let vp = viewport.get_untracked();
        draw_frame(&ctx, &vp, w, h);
        let highlight = Highlight {
            hovered: hovered.get_untracked(),
            selected: selected.get_untracked(),
        };
        layers.with_untracked(|r| {
            if let Some(state) = r.state() {
                render_layers(&ctx, &vp, state, &highlight);
            }
        });
        if let Some(at) = picked.get_untracked() {
            draw_marker(&ctx, &vp, at);
        }
    }));

    // New layer state: rebuild hit-test grid, drop references into the old one.
    Effect::new({
        let sched = scheduler.clone();
        let grid = spatial_grid.clone();
        let grid_seq = grid_seq.clone();
        move || {
            let seq = layers.with(|r| r.applied_seq());
            if seq != grid_seq.get() {
                grid_seq.set(seq);
                layers.with_untracked(|r| {
                    *grid.borrow_mut() = r
                        .state()
                        .map(SpatialGrid::build)
                        .unwrap_or_else(SpatialGrid::empty);
                });
                hovered.set(None);
                selected.set(None);
            }
            sched.mark_dirty();
        }
    });

    Effect::new({
        let sched = scheduler.clone();
        move || {
            viewport.track();
            hovered.track();
            selected.track();
            picked.track();
            sched.mark_dirty();
        }
    });

    // Fit the city once the canvas has a size.
    Effect::new(move || {
        let Some(canvas) = canvas_ref.get() else {
            return;
        };
        let canvas: &HtmlCanvasElement = &canvas;
        if let Some(parent) = canvas.parent_element() {
            let (w, h) = (parent.client_width() as f64, parent.client_height() as f64);
            viewport.update(|vp| vp.fit_latlng_bounds(&HANOI_BOUNDS, w, h));
        }
    });

    let pick_at = {
        let grid = spatial_grid.clone();
        move |sx: f64, sy: f64| -> (Option<FeatureRef>, LatLng) {
            let vp = viewport.get_untracked();
            let (wx, wy) = vp.screen_to_world(sx, sy);
            let hit = grid
                .borrow()
                .find_at(wx, wy, POINT_HIT_RADIUS_PX / vp.scale);
            (hit, vp.screen_to_latlng(sx, sy))
        }
    };

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let (x, y) = (e.offset_x() as f64, e.offset_y() as f64);
        viewport.update(|vp| vp.zoom_at(e.delta_y(), x, y));
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let drag_start = drag_start.clone();
        let last_pos = last_pos.clone();
        move |e: PointerEvent| {
            let pos = (e.client_x() as f64, e.client_y() as f64);
            is_dragging.set(true);
            drag_start.set(pos);
            last_pos.set(pos);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        let last_pos = last_pos.clone();
        let pick_at = pick_at.clone();
        move |e: PointerEvent| {
            if is_dragging.get() {
                let (lx, ly) = last_pos.get();
                let pos = (e.client_x() as f64, e.client_y() as f64);
                last_pos.set(pos);
                viewport.update(|vp| vp.pan(pos.0 - lx, pos.1 - ly));
                return;
            }
            let (sx, sy) = local_point(canvas_element(canvas_ref), &e);
            let (hit, _) = pick_at(sx, sy);
            if hit != hovered.get_untracked() {
                hovered.set(hit);
            }
            if hit.is_some() {
                mouse_pos.set((e.client_x() as f64, e.client_y() as f64));
            }
        }
    };

    let on_pointer_up = {
        let is_dragging = is_dragging.clone();
        move |e: PointerEvent| {
            is_dragging.set(false);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }
        }
    };

    let on_pointer_leave = move |_: PointerEvent| {
        if hovered.get_untracked().is_some() {
            hovered.set(None);
        }
    };

    let on_click = {
        let drag_start = drag_start.clone();
        move |e: MouseEvent| {
            let (x0, y0) = drag_start.get();
            if (e.client_x() as f64 - x0).abs() >= CLICK_SLOP_PX
                || (e.client_y() as f64 - y0).abs() >= CLICK_SLOP_PX
            {
                return;
            }
            let (sx, sy) = local_point(canvas_element(canvas_ref), &e);
            let (hit, at) = pick_at(sx, sy);
            if let Some(target) = hit {
                selected.set(Some(target));
                let anchor = layers.with_untracked(|r| {
                    r.state()
                        .and_then(|s| target.resolve(s))
                        .and_then(|f| f.geometry.as_ref())
                        .and_then(Geometry::anchor)
                });
                let check_at = if target.layer == Layer::Zone { at } else { anchor.unwrap_or(at) };
                picked.set(Some(check_at));
                check_location(check_at, data, toasts);
                if !sidebar_open.get_untracked() {
                    sidebar_open.set(true);
                }
                return;
            }
            selected.set(None);
            if !HANOI_BOUNDS.contains(at) {
                toasts.warning("Please pick a location inside Hanoi");
                return;
            }
            picked.set(Some(at));
            check_location(at, data, toasts);
            if !sidebar_open.get_untracked() {
                sidebar_open.set(true);
            }
        }
    };

    let on_touch_start = {
        let pinch_dist = pinch_dist.clone();
        move |e: web_sys::TouchEvent| {
            let touches = e.touches();
            if touches.length() != 2 {
                return;
            }
            e.prevent_default();
            let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                return;
            };
            let dx = (t1.client_x() - t0.client_x()) as f64;
            let dy = (t1.client_y() - t0.client_y()) as f64;
            pinch_dist.set(dx.hypot(dy));
        }
    };

    let on_touch_move = {
        let pinch_dist = pinch_dist.clone();
        move |e: web_sys::TouchEvent| {
            let touches = e.touches();
            if touches.length() != 2 {
                return;
            }
            e.prevent_default();
            let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                return;
            };
            let dx = (t1.client_x() - t0.client_x()) as f64;
            let dy = (t1.client_y() - t0.client_y()) as f64;
            let new_dist = dx.hypot(dy);
            let old_dist = pinch_dist.get();
            if old_dist > 0.0 {
                let mid_x = (t0.client_x() + t1.client_x()) as f64 / 2.0;
                let mid_y = (t0.client_y() + t1.client_y()) as f64 / 2.0;
                let delta = -(new_dist - old_dist) * 2.0;
                viewport.update(|vp| vp.zoom_at(delta, mid_x, mid_y));
            }
            pinch_dist.set(new_dist);
        }
    };

    view! {
        <div
            style="position: relative; width: 100%; height: 100%; overflow: hidden;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=on_pointer_leave
            on:click=on_click
            on:touchstart=on_touch_start
            on:touchmove=on_touch_move
        >
            <canvas
                node_ref=canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
            />
        </div>
    }
}
