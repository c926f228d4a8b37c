use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::{hex, POPUP_HEADING};

use super::cluster::DEFAULT_CLUSTER_RADIUS_PX;
use super::escape::{escape_html, escape_script_json};
use super::marker::MarkerDescriptor;
use super::tiles::TileProvider;
use super::MAX_ZOOM;

/// Default view: central-east China at a country-wide zoom.
pub const DEFAULT_CENTER: (f64, f64) = (35.8617, 104.1954);
pub const DEFAULT_ZOOM: u8 = 4;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Map composition failures. None of them is fatal to a session: the table
/// view stays usable without a map.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid map view: {0}")]
    InvalidView(String),

    #[error("tile URL template {0:?} must contain {{z}}, {{x}} and {{y}}")]
    InvalidTileTemplate(String),

    #[error("tile provider {name} is unreachable: {source}")]
    TileProviderUnreachable {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to encode marker data: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write map to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// View parameters
// ---------------------------------------------------------------------------

/// Initial center and zoom of the map, plus the clustering radius.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapView {
    /// (lat, lng)
    pub center: (f64, f64),
    pub zoom: u8,
    pub cluster_radius_px: f64,
}

impl Default for MapView {
    fn default() -> Self {
        MapView {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            cluster_radius_px: DEFAULT_CLUSTER_RADIUS_PX,
        }
    }
}

impl MapView {
    pub fn validate(&self) -> Result<(), RenderError> {
        let (lat, lng) = self.center;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(RenderError::InvalidView(format!(
                "center ({lat}, {lng}) is not a geographic coordinate"
            )));
        }
        if self.zoom > MAX_ZOOM {
            return Err(RenderError::InvalidView(format!(
                "zoom {} exceeds {MAX_ZOOM}",
                self.zoom
            )));
        }
        if !(self.cluster_radius_px > 0.0) {
            return Err(RenderError::InvalidView(format!(
                "cluster radius {} must be positive",
                self.cluster_radius_px
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// A standalone HTML page holding the basemap and the clustered markers.
#[derive(Debug, Clone, PartialEq)]
pub struct MapArtifact {
    pub html: String,
    pub marker_count: usize,
}

impl MapArtifact {
    pub fn write_to(&self, path: &Path) -> Result<(), RenderError> {
        std::fs::write(path, &self.html).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!(
            "Wrote map with {} markers to {}",
            self.marker_count,
            path.display()
        );
        Ok(())
    }
}

/// Data handed to the page script.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageData<'a> {
    center: [f64; 2],
    zoom: u8,
    cluster_radius: f64,
    tiles: TileData<'a>,
    markers: Vec<MarkerData<'a>>,
}

#[derive(Serialize)]
struct TileData<'a> {
    url: &'a str,
    subdomains: &'a str,
    attribution: &'a str,
    #[serde(rename = "maxZoom")]
    max_zoom: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkerData<'a> {
    lat: f64,
    lng: f64,
    radius: f64,
    color: String,
    fill_color: String,
    fill_opacity: f32,
    tooltip: String,
    popup: &'a str,
}

/// Compose the basemap and a marker-cluster layer into one HTML page.
///
/// The page depends only on the markers, never on table filter state.
pub fn render_map(
    markers: &[MarkerDescriptor],
    view: &MapView,
    tiles: &TileProvider,
) -> Result<MapArtifact, RenderError> {
    view.validate()?;
    tiles.validate()?;

    let data = PageData {
        center: [view.center.0, view.center.1],
        zoom: view.zoom,
        cluster_radius: view.cluster_radius_px,
        tiles: TileData {
            url: &tiles.url_template,
            subdomains: &tiles.subdomains,
            attribution: &tiles.attribution,
            max_zoom: MAX_ZOOM,
        },
        markers: markers
            .iter()
            .map(|m| MarkerData {
                lat: m.lat,
                lng: m.lng,
                radius: m.radius,
                color: hex(m.style.stroke),
                fill_color: hex(m.style.fill),
                fill_opacity: m.style.fill_opacity,
                tooltip: escape_html(&m.tooltip),
                popup: &m.popup_html,
            })
            .collect(),
    };
    let json = escape_script_json(&serde_json::to_string(&data)?);

    // Page data goes in last so nothing inside it is mistaken for a placeholder.
    let html = PAGE_TEMPLATE
        .replace("__TITLE__", &escape_html(&tiles.name))
        .replace("__HEADING_COLOR__", &hex(POPUP_HEADING))
        .replace("__PAGE_DATA__", &json);

    Ok(MapArtifact {
        html,
        marker_count: markers.len(),
    })
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="zh">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>《儒林外史》地名分布 · __TITLE__</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.Default.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.markercluster@1.5.3/dist/leaflet.markercluster.js"></script>
<style>
html, body, #map { height: 100%; margin: 0; }
.place-popup { width: 250px; max-height: 180px; overflow: auto; }
.place-popup h4 { color: __HEADING_COLOR__; margin: 0; }
.place-popup hr { margin: 5px 0; }
.place-popup p { margin: 4px 0; overflow-wrap: anywhere; }
</style>
</head>
<body>
<div id="map"></div>
<script>
const atlas = __PAGE_DATA__;
const map = L.map("map").setView(atlas.center, atlas.zoom);
L.tileLayer(atlas.tiles.url, {
  subdomains: atlas.tiles.subdomains,
  attribution: atlas.tiles.attribution,
  maxZoom: atlas.tiles.maxZoom
}).addTo(map);
const cluster = L.markerClusterGroup({ maxClusterRadius: atlas.clusterRadius });
for (const m of atlas.markers) {
  L.circleMarker([m.lat, m.lng], {
    radius: m.radius,
    color: m.color,
    fill: true,
    fillColor: m.fillColor,
    fillOpacity: m.fillOpacity
  })
    .bindTooltip(m.tooltip)
    .bindPopup(m.popup, { maxWidth: 280 })
    .addTo(cluster);
}
map.addLayer(cluster);
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::PlaceRecord;
    use crate::map::marker::build_markers;

    fn markers() -> Vec<MarkerDescriptor> {
        let records = vec![
            PlaceRecord {
                source_row: 2,
                city: "南京".to_string(),
                occurrence_count: 5,
                related_figures: "<script>alert('x')</script>".to_string(),
                context_summary: "</script><img src=x onerror=alert(1)>".to_string(),
                latitude: 32.06,
                longitude: 118.78,
            },
            PlaceRecord {
                source_row: 3,
                city: "北京<i>".to_string(),
                occurrence_count: 2,
                related_figures: "范进".to_string(),
                context_summary: "会试".to_string(),
                latitude: 39.9,
                longitude: 116.4,
            },
        ];
        build_markers(&records).markers
    }

    #[test]
    fn artifact_embeds_view_tiles_and_every_marker() {
        let artifact = render_map(&markers(), &MapView::default(), &TileProvider::default()).unwrap();

        assert_eq!(artifact.marker_count, 2);
        assert!(artifact.html.contains("\"center\":[35.8617,104.1954]"));
        assert!(artifact.html.contains("\"zoom\":4"));
        assert!(artifact.html.contains("light_all/{z}/{x}/{y}{r}.png"));
        assert!(artifact.html.contains("L.markerClusterGroup"));
        assert_eq!(artifact.html.matches("\"radius\":").count(), 2);
        assert!(artifact.html.contains("\"radius\":10.0"));
        assert!(artifact.html.contains("\"fillColor\":\"#dc143c\""));
    }

    #[test]
    fn untrusted_text_never_appears_as_markup() {
        let artifact = render_map(&markers(), &MapView::default(), &TileProvider::default()).unwrap();

        // The only script elements are the page's own.
        assert_eq!(artifact.html.matches("<script").count(), 3);
        assert_eq!(artifact.html.matches("</script>").count(), 3);
        assert!(!artifact.html.contains("<img"));
        assert!(!artifact.html.contains("<i>"));
        // Escaped popup text survives, with its own markup neutralised.
        assert!(artifact.html.contains("\\u0026lt;script\\u0026gt;"));
    }

    #[test]
    fn invalid_view_is_rejected() {
        let view = MapView {
            zoom: 25,
            ..MapView::default()
        };
        assert!(matches!(
            render_map(&markers(), &view, &TileProvider::default()),
            Err(RenderError::InvalidView(_))
        ));

        let view = MapView {
            center: (95.0, 0.0),
            ..MapView::default()
        };
        assert!(render_map(&[], &view, &TileProvider::default()).is_err());
    }

    #[test]
    fn invalid_tile_template_is_rejected() {
        let tiles = TileProvider {
            url_template: "https://tiles.example.com/static.png".to_string(),
            ..TileProvider::default()
        };
        assert!(matches!(
            render_map(&markers(), &MapView::default(), &tiles),
            Err(RenderError::InvalidTileTemplate(_))
        ));
    }

    #[test]
    fn empty_marker_set_still_renders_a_basemap() {
        let artifact = render_map(&[], &MapView::default(), &TileProvider::default()).unwrap();
        assert_eq!(artifact.marker_count, 0);
        assert!(artifact.html.contains("\"markers\":[]"));
    }

    #[test]
    fn writes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.html");
        let artifact = render_map(&markers(), &MapView::default(), &TileProvider::default()).unwrap();
        artifact.write_to(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), artifact.html);

        let missing_dir = dir.path().join("absent").join("map.html");
        assert!(matches!(
            artifact.write_to(&missing_dir),
            Err(RenderError::Io { .. })
        ));
    }
}
