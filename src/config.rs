use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::model::ColumnMap;
use crate::map::render::MapView;
use crate::map::tiles::TileProvider;

/// Settings file, e.g.
///
/// ```toml
/// [data]
/// path = "rulinwaishi_stats.xlsx"
///
/// [data.columns]
/// city = "城市"
///
/// [map]
/// center = [35.8617, 104.1954]
/// zoom = 4
///
/// [tiles]
/// url_template = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub map: MapView,
    pub tiles: TileProvider,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub path: PathBuf,
    pub columns: ColumnMap,
}

impl Default for DataSettings {
    fn default() -> Self {
        DataSettings {
            path: PathBuf::from("rulinwaishi_stats.xlsx"),
            columns: ColumnMap::default(),
        }
    }
}

impl Settings {
    /// Read settings from `path`; a missing file means all defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No settings file at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        Ok(settings)
    }
}
