//! Persistent application configuration model and defaults.

use crate::protocol::{EmbeddingMethod, PresentationMode, SortKey};

/// Root configuration persisted to `shelfspace.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    /// Remote tabular data source coordinates.
    pub source: SourceConfig,
    #[serde(default)]
    /// Rendering extents and startup selections.
    pub render: RenderConfig,
    #[serde(default)]
    /// Cover image fetching and caching preferences.
    pub covers: CoversConfig,
}

/// Spreadsheet endpoint identification for the catalog fetch.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub sheet_id: String,
    #[serde(default = "default_sheet_range")]
    pub sheet_range: String,
    /// Static API key sent as a query parameter; the only authentication.
    #[serde(default)]
    pub api_key: String,
}

/// Render-surface extents and startup view selections.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RenderConfig {
    /// Edge length of the square 2D scatter surface, top-left origin.
    #[serde(default = "default_extent_2d")]
    pub extent_2d: f64,
    /// Edge length of the centered 3D scatter volume.
    #[serde(default = "default_extent_3d")]
    pub extent_3d: f64,
    #[serde(default)]
    pub startup_mode: PresentationMode,
    #[serde(default)]
    pub startup_sort: SortKey,
    #[serde(default)]
    pub startup_embedding: EmbeddingMethod,
}

/// Cover image preferences persisted between sessions.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CoversConfig {
    #[serde(default = "default_true")]
    pub prefetch_covers: bool,
    #[serde(default = "default_cover_cache_max_size_mb")]
    pub cover_cache_max_size_mb: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            sheet_id: String::new(),
            sheet_range: default_sheet_range(),
            api_key: String::new(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            extent_2d: default_extent_2d(),
            extent_3d: default_extent_3d(),
            startup_mode: PresentationMode::default(),
            startup_sort: SortKey::default(),
            startup_embedding: EmbeddingMethod::default(),
        }
    }
}

impl Default for CoversConfig {
    fn default() -> Self {
        Self {
            prefetch_covers: true,
            cover_cache_max_size_mb: default_cover_cache_max_size_mb(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sheet_range() -> String {
    "Sheet1".to_string()
}

fn default_extent_2d() -> f64 {
    800.0
}

fn default_extent_3d() -> f64 {
    200.0
}

fn default_cover_cache_max_size_mb() -> u32 {
    256
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::protocol::{EmbeddingMethod, PresentationMode, SortKey};

    #[test]
    fn test_default_config_has_expected_values() {
        let config = Config::default();

        assert!(config.source.sheet_id.is_empty());
        assert_eq!(config.source.sheet_range, "Sheet1");
        assert!(config.source.api_key.is_empty());
        assert!((config.render.extent_2d - 800.0).abs() < f64::EPSILON);
        assert!((config.render.extent_3d - 200.0).abs() < f64::EPSILON);
        assert_eq!(config.render.startup_mode, PresentationMode::Scatter3d);
        assert_eq!(config.render.startup_sort, SortKey::DateRead);
        assert_eq!(config.render.startup_embedding, EmbeddingMethod::Tsne);
        assert!(config.covers.prefetch_covers);
        assert_eq!(config.covers.cover_cache_max_size_mb, 256);
    }

    #[test]
    fn test_minimal_config_deserialization_fills_defaults() {
        let minimal_toml = r#"
[source]
sheet_id = "1moYiL52ZN9F20QZ"
api_key = "key"
"#;

        let parsed: Config = toml::from_str(minimal_toml).expect("config should parse");
        assert_eq!(parsed.source.sheet_id, "1moYiL52ZN9F20QZ");
        assert_eq!(parsed.source.sheet_range, "Sheet1");
        assert_eq!(parsed.source.api_key, "key");
        assert!((parsed.render.extent_2d - 800.0).abs() < f64::EPSILON);
        assert_eq!(parsed.render.startup_mode, PresentationMode::Scatter3d);
        assert!(parsed.covers.prefetch_covers);
    }

    #[test]
    fn test_startup_selection_round_trip() {
        let config_toml = r#"
[source]
sheet_id = "abc"

[render]
startup_mode = "list"
startup_sort = "rating"
startup_embedding = "umap"
"#;

        let parsed: Config = toml::from_str(config_toml).expect("config should parse");
        assert_eq!(parsed.render.startup_mode, PresentationMode::List);
        assert_eq!(parsed.render.startup_sort, SortKey::Rating);
        assert_eq!(parsed.render.startup_embedding, EmbeddingMethod::Umap);

        let serialized = toml::to_string(&parsed).expect("config should serialize");
        let reparsed: Config = toml::from_str(&serialized).expect("config should re-parse");
        assert_eq!(reparsed, parsed);
    }
}
