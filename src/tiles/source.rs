use crate::core::{constants::MAX_TILE_ZOOM, geo::TileCoord};

pub const CARTO_LIGHT_URL: &str = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png";
pub const CARTO_ATTRIBUTION: &str = "© CartoDB";

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;

    fn max_zoom(&self) -> u8 {
        MAX_TILE_ZOOM
    }

    fn attribution(&self) -> &str {
        ""
    }
}

/// Leaflet-style URL template settings
#[derive(Debug, Clone, PartialEq)]
pub struct TileSourceOptions {
    /// Placeholders: `{s}` subdomain, `{z}` `{x}` `{y}` tile, `{r}` retina suffix
    pub url_template: String,
    /// One character per subdomain, e.g. `"abcd"`
    pub subdomains: String,
    pub retina: bool,
    pub max_zoom: u8,
    pub attribution: String,
}

impl Default for TileSourceOptions {
    fn default() -> Self {
        Self {
            url_template: CARTO_LIGHT_URL.to_string(),
            subdomains: "abcd".to_string(),
            retina: false,
            max_zoom: MAX_TILE_ZOOM,
            attribution: CARTO_ATTRIBUTION.to_string(),
        }
    }
}

/// Expands a [`TileSourceOptions`] template per tile
pub struct TemplateTileSource {
    options: TileSourceOptions,
    subdomains: Vec<char>,
}

impl TemplateTileSource {
    pub fn new(options: TileSourceOptions) -> Self {
        let subdomains = options.subdomains.chars().collect();
        Self {
            options,
            subdomains,
        }
    }

    pub fn options(&self) -> &TileSourceOptions {
        &self.options
    }
}

impl Default for TemplateTileSource {
    fn default() -> Self {
        Self::new(TileSourceOptions::default())
    }
}

impl TileSource for TemplateTileSource {
    fn url(&self, coord: TileCoord) -> String {
        // spread requests over subdomains the same way Leaflet does
        let subdomain = if self.subdomains.is_empty() {
            String::new()
        } else {
            let idx = ((coord.x + coord.y) % self.subdomains.len() as u32) as usize;
            self.subdomains[idx].to_string()
        };

        self.options
            .url_template
            .replace("{s}", &subdomain)
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
            .replace("{r}", if self.options.retina { "@2x" } else { "" })
    }

    fn max_zoom(&self) -> u8 {
        self.options.max_zoom
    }

    fn attribution(&self) -> &str {
        &self.options.attribution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carto_url() {
        let source = TemplateTileSource::default();
        assert_eq!(
            source.url(TileCoord::new(4824, 6156, 14)),
            "https://a.basemaps.cartocdn.com/light_all/14/4824/6156.png"
        );
        assert_eq!(
            source.url(TileCoord::new(1, 0, 1)),
            "https://b.basemaps.cartocdn.com/light_all/1/1/0.png"
        );
        assert_eq!(source.max_zoom(), 20);
        assert_eq!(source.attribution(), "© CartoDB");
    }

    #[test]
    fn test_retina_suffix() {
        let source = TemplateTileSource::new(TileSourceOptions {
            retina: true,
            ..Default::default()
        });
        assert!(source.url(TileCoord::new(3, 0, 2)).ends_with("/2/3/0@2x.png"));
        assert!(source.url(TileCoord::new(3, 0, 2)).starts_with("https://d."));
    }

    #[test]
    fn test_template_without_subdomains() {
        let source = TemplateTileSource::new(TileSourceOptions {
            url_template: "http://127.0.0.1:9000/{z}/{x}/{y}.png".into(),
            subdomains: String::new(),
            ..Default::default()
        });
        assert_eq!(source.url(TileCoord::new(1, 2, 3)), "http://127.0.0.1:9000/3/1/2.png");
    }
}
