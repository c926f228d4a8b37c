use std::f64::consts::PI;

use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Plot, PlotBounds, PlotPoint, Points, Text};

use crate::color::cluster_color;
use crate::map::cluster::{cluster_markers, zoom_for_span, Cluster};
use crate::map::marker::MarkerDescriptor;
use crate::map::render::MapView;
use crate::state::AppState;

/// Screen radius of a cluster glyph.
const CLUSTER_GLYPH_RADIUS: f32 = 15.0;
/// Extra pick tolerance around markers, in pixels.
const PICK_SLACK: f64 = 3.0;

// ---------------------------------------------------------------------------
// Clustered marker preview (central panel)
// ---------------------------------------------------------------------------

/// Render every valid marker on a Web Mercator plot, clustered for the
/// current zoom. Clicking a marker opens its popup; clicking a cluster zooms
/// in on its members.
pub fn map_preview(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a place table to view the map  (File → Open…)");
        });
        return;
    }

    let reset = state.reset_view;
    let view = state.settings.map;
    let markers = &state.markers.markers;

    let response = Plot::new("map_preview")
        .data_aspect(1.0)
        .x_axis_label("经度")
        .y_axis_label("纬度")
        .y_axis_formatter(|mark, _range| format!("{:.1}", mercator_to_lat(mark.value)))
        .label_formatter(|name, value| {
            if name.is_empty() {
                format!("{:.3}, {:.3}", mercator_to_lat(value.y), value.x)
            } else {
                name.to_owned()
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let rect = plot_ui.response().rect;
            let width = rect.width() as f64;
            let height = rect.height() as f64;

            // A zero-sized first frame keeps the reset pending.
            let reset_bounds = if reset { view_bounds(&view, width, height) } else { None };
            let reset_applied = reset_bounds.is_some();
            if let Some(bounds) = reset_bounds {
                plot_ui.set_plot_bounds(bounds);
            }

            let bounds = plot_ui.plot_bounds();
            let zoom = zoom_for_span(bounds.width(), width);
            let clusters = cluster_markers(markers, zoom, view.cluster_radius_px);

            for cluster in &clusters {
                if cluster.is_single() {
                    draw_marker(plot_ui, &markers[cluster.members[0]]);
                } else {
                    draw_cluster(plot_ui, cluster, markers);
                }
            }

            let scale = (width / bounds.width(), height / bounds.height());
            let clicked = if plot_ui.response().clicked() {
                plot_ui.pointer_coordinate()
            } else {
                None
            };

            let selected = match clicked.and_then(|p| pick(&clusters, markers, p, scale)) {
                Some(Pick::Marker(idx)) => Some(idx),
                Some(Pick::Cluster(c)) => {
                    plot_ui.set_plot_bounds(member_bounds(&clusters[c], markers));
                    None
                }
                None => None,
            };
            (selected, reset_applied)
        });

    let (selected, reset_applied) = response.inner;
    if reset_applied {
        state.reset_view = false;
    }
    if let Some(idx) = selected {
        state.selected_marker = Some(idx);
    }
}

fn draw_marker(plot_ui: &mut egui_plot::PlotUi, marker: &MarkerDescriptor) {
    let pos = vec![[marker.lng, lat_to_mercator(marker.lat)]];
    let radius = marker.radius as f32;
    plot_ui.points(
        Points::new(pos.clone())
            .radius(radius)
            .filled(true)
            .color(marker.style.fill_color32())
            .name(&marker.tooltip),
    );
    plot_ui.points(
        Points::new(pos)
            .radius(radius)
            .filled(false)
            .color(marker.style.stroke_color32())
            .name(&marker.tooltip),
    );
}

fn draw_cluster(plot_ui: &mut egui_plot::PlotUi, cluster: &Cluster, markers: &[MarkerDescriptor]) {
    let (lat, lng) = cluster.center;
    let y = lat_to_mercator(lat);
    let names: Vec<&str> = cluster
        .members
        .iter()
        .map(|&i| markers[i].tooltip.as_str())
        .collect();

    plot_ui.points(
        Points::new(vec![[lng, y]])
            .radius(CLUSTER_GLYPH_RADIUS)
            .filled(true)
            .color(cluster_color(cluster.len()))
            .name(names.join("、")),
    );
    plot_ui.text(Text::new(
        PlotPoint::new(lng, y),
        RichText::new(cluster.len().to_string())
            .strong()
            .color(Color32::BLACK),
    ));
}

enum Pick {
    Marker(usize),
    Cluster(usize),
}

/// Topmost glyph under the pointer. Later glyphs are drawn on top, so the
/// search runs back to front.
fn pick(
    clusters: &[Cluster],
    markers: &[MarkerDescriptor],
    pointer: PlotPoint,
    (sx, sy): (f64, f64),
) -> Option<Pick> {
    clusters.iter().enumerate().rev().find_map(|(c, cluster)| {
        let (lat, lng) = cluster.center;
        let dx = (pointer.x - lng) * sx;
        let dy = (pointer.y - lat_to_mercator(lat)) * sy;
        let distance = (dx * dx + dy * dy).sqrt();

        if cluster.is_single() {
            let idx = cluster.members[0];
            (distance <= markers[idx].radius + PICK_SLACK).then_some(Pick::Marker(idx))
        } else {
            (distance <= CLUSTER_GLYPH_RADIUS as f64 + PICK_SLACK).then_some(Pick::Cluster(c))
        }
    })
}

/// Plot bounds showing `view` on a `width` x `height` pixel plot, or `None`
/// while the plot has no area yet.
fn view_bounds(view: &MapView, width: f64, height: f64) -> Option<PlotBounds> {
    if !(width > 0.0 && height > 0.0) {
        return None;
    }
    let span_x = 360.0 * width / (256.0 * 2.0_f64.powi(view.zoom as i32));
    let span_y = span_x * height / width;
    let (cx, cy) = (view.center.1, lat_to_mercator(view.center.0));
    Some(PlotBounds::from_min_max(
        [cx - span_x / 2.0, cy - span_y / 2.0],
        [cx + span_x / 2.0, cy + span_y / 2.0],
    ))
}

/// Padded bounds around a cluster's members.
fn member_bounds(cluster: &Cluster, markers: &[MarkerDescriptor]) -> PlotBounds {
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for &i in &cluster.members {
        let p = [markers[i].lng, lat_to_mercator(markers[i].lat)];
        for axis in 0..2 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    for axis in 0..2 {
        let pad = ((max[axis] - min[axis]) * 0.2).max(0.25);
        min[axis] -= pad;
        max[axis] += pad;
    }
    PlotBounds::from_min_max(min, max)
}

/// Web Mercator northing, in degree-equivalent units so that one unit on
/// either axis covers the same screen distance.
fn lat_to_mercator(lat: f64) -> f64 {
    let lat = lat.clamp(-85.0511, 85.0511).to_radians();
    (PI / 4.0 + lat / 2.0).tan().ln().to_degrees()
}

fn mercator_to_lat(y: f64) -> f64 {
    (2.0 * y.to_radians().exp().atan() - PI / 2.0).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mercator_round_trip() {
        for lat in [-60.0, 0.0, 32.06, 39.9, 80.0] {
            assert!((mercator_to_lat(lat_to_mercator(lat)) - lat).abs() < 1e-9);
        }
        assert!(lat_to_mercator(0.0).abs() < 1e-9);
    }

    #[test]
    fn view_bounds_wait_for_a_sized_plot() {
        let view = MapView::default();
        assert!(view_bounds(&view, 0.0, 600.0).is_none());
        assert!(view_bounds(&view, 800.0, 0.0).is_none());

        // Zoom 4 is 4096 px per world, so 1024 px show a quarter of it.
        let bounds = view_bounds(&view, 1024.0, 512.0).unwrap();
        assert!((bounds.width() - 90.0).abs() < 1e-9);
        assert!((bounds.height() - 45.0).abs() < 1e-9);
        let center_x = (bounds.min()[0] + bounds.max()[0]) / 2.0;
        assert!((center_x - 104.1954).abs() < 1e-9);
        let center_y = (bounds.min()[1] + bounds.max()[1]) / 2.0;
        assert!((mercator_to_lat(center_y) - 35.8617).abs() < 1e-9);
    }
}
