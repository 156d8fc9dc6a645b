//! Event-bus protocol shared by all runtime components.
//!
//! This module defines the message payloads exchanged between catalog
//! loading, view derivation, and runtime configuration handlers, plus the
//! enumerated selection inputs supplied by UI controls.

use std::sync::Arc;

use crate::config::Config;
use crate::record::BookRecord;

/// Top-level envelope for all bus traffic.
#[derive(Debug, Clone)]
pub enum Message {
    Catalog(CatalogMessage),
    View(ViewMessage),
    Config(ConfigMessage),
}

/// Sort criterion applied to the active view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Title,
    Author,
    Rating,
    #[default]
    DateRead,
}

impl SortKey {
    /// User-visible label, as shown by selector controls.
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Title => "Title",
            SortKey::Author => "Author",
            SortKey::Rating => "Rating",
            SortKey::DateRead => "Date Read",
        }
    }

    pub fn parse(value: &str) -> Option<SortKey> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Some(SortKey::Title),
            "author" => Some(SortKey::Author),
            "rating" => Some(SortKey::Rating),
            "date_read" | "date read" => Some(SortKey::DateRead),
            _ => None,
        }
    }
}

/// Dimensionality-reduction method whose coordinate columns are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingMethod {
    #[default]
    Tsne,
    Umap,
}

impl EmbeddingMethod {
    /// Column-name suffix used by the sheet's embedding fields.
    pub fn key(&self) -> &'static str {
        match self {
            EmbeddingMethod::Tsne => "tsne",
            EmbeddingMethod::Umap => "umap",
        }
    }

    /// Header name carrying this method's 2D coordinates.
    pub fn column_2d(&self) -> String {
        format!("embedding_2d_{}", self.key())
    }

    /// Header name carrying this method's 3D coordinates.
    pub fn column_3d(&self) -> String {
        format!("embedding_3d_{}", self.key())
    }

    pub fn parse(value: &str) -> Option<EmbeddingMethod> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tsne" => Some(EmbeddingMethod::Tsne),
            "umap" => Some(EmbeddingMethod::Umap),
            _ => None,
        }
    }
}

/// Active presentation surface for the derived view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PresentationMode {
    List,
    Scatter2d,
    #[default]
    Scatter3d,
}

impl PresentationMode {
    pub fn parse(value: &str) -> Option<PresentationMode> {
        match value.trim().to_ascii_lowercase().as_str() {
            "list" => Some(PresentationMode::List),
            "2d" | "scatter2d" => Some(PresentationMode::Scatter2d),
            "3d" | "scatter3d" => Some(PresentationMode::Scatter3d),
            _ => None,
        }
    }
}

/// Catalog-domain commands and notifications.
#[derive(Debug, Clone)]
pub enum CatalogMessage {
    /// Explicit request to re-fetch and re-decode the full record set.
    RequestRefresh,
    /// Switch the embedding method; a change triggers a full reload since
    /// each row encodes both methods' coordinates side by side.
    SetEmbeddingMethod(EmbeddingMethod),
    /// A fetch completed and the full in-memory record set was replaced.
    CatalogLoaded {
        records: Arc<Vec<BookRecord>>,
        method: EmbeddingMethod,
    },
    /// A fetch or decode failed; the prior record set (if any) stays current.
    LoadFailed(String),
}

/// View-domain commands supplied by selection controls.
#[derive(Debug, Clone)]
pub enum ViewMessage {
    SetSortKey(SortKey),
    /// Empty string clears the shelf filter.
    SetShelf(String),
    SetMode(PresentationMode),
    /// Request a listing of the distinct shelves in the loaded catalog.
    ListShelves,
}

/// Runtime configuration updates.
#[derive(Debug, Clone)]
pub enum ConfigMessage {
    ConfigChanged(Config),
}

#[cfg(test)]
mod tests {
    use super::{EmbeddingMethod, PresentationMode, SortKey};

    #[test]
    fn test_sort_key_parse_accepts_known_keys() {
        assert_eq!(SortKey::parse("title"), Some(SortKey::Title));
        assert_eq!(SortKey::parse("Rating"), Some(SortKey::Rating));
        assert_eq!(SortKey::parse("date_read"), Some(SortKey::DateRead));
        assert_eq!(SortKey::parse("date read"), Some(SortKey::DateRead));
        assert_eq!(SortKey::parse("publisher"), None);
    }

    #[test]
    fn test_embedding_method_column_names_match_sheet_headers() {
        assert_eq!(EmbeddingMethod::Tsne.column_2d(), "embedding_2d_tsne");
        assert_eq!(EmbeddingMethod::Tsne.column_3d(), "embedding_3d_tsne");
        assert_eq!(EmbeddingMethod::Umap.column_2d(), "embedding_2d_umap");
        assert_eq!(EmbeddingMethod::Umap.column_3d(), "embedding_3d_umap");
    }

    #[test]
    fn test_presentation_mode_parse_accepts_short_forms() {
        assert_eq!(PresentationMode::parse("list"), Some(PresentationMode::List));
        assert_eq!(PresentationMode::parse("2d"), Some(PresentationMode::Scatter2d));
        assert_eq!(PresentationMode::parse("3d"), Some(PresentationMode::Scatter3d));
        assert_eq!(PresentationMode::parse("4d"), None);
    }

    #[test]
    fn test_defaults_match_initial_load_selections() {
        assert_eq!(SortKey::default(), SortKey::DateRead);
        assert_eq!(PresentationMode::default(), PresentationMode::Scatter3d);
        assert_eq!(EmbeddingMethod::default(), EmbeddingMethod::Tsne);
    }
}
