use std::f64::consts::PI;

use super::marker::MarkerDescriptor;
use super::MAX_ZOOM;

/// Default grouping radius, the Leaflet.markercluster default.
pub const DEFAULT_CLUSTER_RADIUS_PX: f64 = 80.0;

const TILE_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_78;

/// A group of markers drawn as one glyph at the current zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Mean (lat, lng) of the members.
    pub center: (f64, f64),
    /// Indices into the clustered marker slice, in input order.
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }
}

/// Web Mercator world-pixel position of a coordinate at `zoom`
/// (fractional zooms allowed).
pub fn project(lat: f64, lng: f64, zoom: f64) -> (f64, f64) {
    let world = TILE_SIZE * 2.0_f64.powf(zoom);
    let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (lng + 180.0) / 360.0 * world;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * world;
    (x, y)
}

/// Effective zoom of a viewport showing `span_degrees` of longitude across
/// `width_px` pixels.
pub fn zoom_for_span(span_degrees: f64, width_px: f64) -> f64 {
    if !(span_degrees > 0.0) || !(width_px > 0.0) {
        return MAX_ZOOM as f64;
    }
    (360.0 * width_px / (TILE_SIZE * span_degrees))
        .log2()
        .clamp(0.0, MAX_ZOOM as f64)
}

/// Greedy distance clustering.
///
/// Markers are visited in input order; each joins the first cluster whose
/// pixel centroid lies within `radius_px`, or starts a new one. Every marker
/// ends up in exactly one cluster, and the result depends only on the input
/// order, the zoom and the radius.
pub fn cluster_markers(markers: &[MarkerDescriptor], zoom: f64, radius_px: f64) -> Vec<Cluster> {
    struct Group {
        px_sum: (f64, f64),
        geo_sum: (f64, f64),
        members: Vec<usize>,
    }

    impl Group {
        fn centroid_px(&self) -> (f64, f64) {
            let n = self.members.len() as f64;
            (self.px_sum.0 / n, self.px_sum.1 / n)
        }
    }

    let radius_sq = radius_px * radius_px;
    let mut groups: Vec<Group> = Vec::new();

    for (idx, marker) in markers.iter().enumerate() {
        let (x, y) = project(marker.lat, marker.lng, zoom);

        let target = groups.iter().position(|g| {
            let (cx, cy) = g.centroid_px();
            let (dx, dy) = (x - cx, y - cy);
            dx * dx + dy * dy < radius_sq
        });

        match target {
            Some(g) => {
                let group = &mut groups[g];
                group.px_sum.0 += x;
                group.px_sum.1 += y;
                group.geo_sum.0 += marker.lat;
                group.geo_sum.1 += marker.lng;
                group.members.push(idx);
            }
            None => groups.push(Group {
                px_sum: (x, y),
                geo_sum: (marker.lat, marker.lng),
                members: vec![idx],
            }),
        }
    }

    groups
        .into_iter()
        .map(|g| {
            let n = g.members.len() as f64;
            Cluster {
                center: (g.geo_sum.0 / n, g.geo_sum.1 / n),
                members: g.members,
            }
        })
        .collect()
}
