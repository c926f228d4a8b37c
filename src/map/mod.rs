/// Map layer: records → markers → clusters → HTML map page.
///
/// ```text
///   [PlaceRecord] ──build_markers──▶ MarkerBatch ──render_map──▶ MapArtifact
///                                        │
///                                        └──cluster_markers──▶ [Cluster]  (viewer)
/// ```

pub mod cluster;
pub mod escape;
pub mod marker;
pub mod render;
pub mod tiles;

/// Deepest zoom level served by the basemap.
pub const MAX_ZOOM: u8 = 19;
