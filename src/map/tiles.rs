use std::time::Duration;

use serde::Deserialize;

use super::render::RenderError;

/// An XYZ (slippy-map) tile source. The template uses Leaflet placeholders:
/// `{s}` subdomain, `{z}/{x}/{y}` tile address, `{r}` retina suffix.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TileProvider {
    pub name: String,
    pub url_template: String,
    pub subdomains: String,
    /// Attribution markup shown in the map corner. Comes from configuration,
    /// not from the dataset, and is embedded as-is.
    pub attribution: String,
}

impl Default for TileProvider {
    fn default() -> Self {
        Self::carto_positron()
    }
}

impl TileProvider {
    /// CartoDB positron: a light, low-contrast basemap.
    pub fn carto_positron() -> Self {
        TileProvider {
            name: "CartoDB positron".to_string(),
            url_template: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png"
                .to_string(),
            subdomains: "abcd".to_string(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> \
                          contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>"
                .to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        let has_address = ["{z}", "{x}", "{y}"]
            .iter()
            .all(|p| self.url_template.contains(p));
        let subdomains_ok = !self.url_template.contains("{s}") || !self.subdomains.is_empty();
        if has_address && subdomains_ok {
            Ok(())
        } else {
            Err(RenderError::InvalidTileTemplate(self.url_template.clone()))
        }
    }

    /// Concrete URL of one tile (first subdomain, standard resolution).
    pub fn tile_url(&self, z: u8, x: u32, y: u32) -> String {
        let subdomain: String = self.subdomains.chars().take(1).collect();
        self.url_template
            .replace("{s}", &subdomain)
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
            .replace("{r}", "")
    }

    /// Fetch the world tile 0/0/0 to check the provider answers.
    pub fn probe(&self, timeout: Duration) -> Result<(), RenderError> {
        self.validate()?;
        let url = self.tile_url(0, 0, 0);
        log::info!("Probing tile provider {} at {url}", self.name);

        let unreachable = |source| RenderError::TileProviderUnreachable {
            name: self.name.clone(),
            source,
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(unreachable)?;
        client
            .get(&url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .map_err(unreachable)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_positron_template() {
        let tiles = TileProvider::carto_positron();
        assert_eq!(
            tiles.tile_url(4, 13, 6),
            "https://a.basemaps.cartocdn.com/light_all/4/13/6.png"
        );
        assert!(tiles.validate().is_ok());
    }

    #[test]
    fn template_without_address_is_rejected() {
        let tiles = TileProvider {
            url_template: "https://tiles.example.com/{z}/{x}.png".to_string(),
            ..TileProvider::default()
        };
        assert!(matches!(
            tiles.validate(),
            Err(RenderError::InvalidTileTemplate(_))
        ));
    }

    #[test]
    fn subdomain_placeholder_needs_subdomains() {
        let tiles = TileProvider {
            subdomains: String::new(),
            ..TileProvider::default()
        };
        assert!(tiles.validate().is_err());

        let osm = TileProvider {
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            subdomains: String::new(),
            ..TileProvider::default()
        };
        assert!(osm.validate().is_ok());
    }
}
