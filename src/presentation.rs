//! Presentation adapter boundary consumed by the view pipeline.
//!
//! Renderers receive already-filtered, already-sorted, already-normalized
//! data; nothing downstream of this trait reaches back into the pipeline.

use std::sync::Arc;

use log::info;

use crate::covers::CoverCache;
use crate::normalize::{PlottedBook2, PlottedBook3};
use crate::record::BookRecord;

/// Interface implemented by concrete presentation surfaces.
pub trait PresentationAdapter: Send {
    /// Renders the flat list view of the sorted, filtered record set.
    fn render_list(&mut self, records: &[BookRecord]);
    /// Renders the 2D scatter view; coordinates lie in `[0, extent]`.
    fn render_scatter_2d(&mut self, points: &[PlottedBook2], extent: f64);
    /// Renders the 3D scatter view; coordinates lie in `[-extent/2, extent/2]`.
    fn render_scatter_3d(&mut self, points: &[PlottedBook3], extent: f64);
}

/// Terminal presentation surface used by the shipped binary.
///
/// List rows mirror the bookshelf card contents (title, author, star
/// glyphs); scatter modes print placements and warm the cover cache the way
/// a sprite renderer would request textures.
pub struct ConsolePresenter {
    covers: Option<Arc<CoverCache>>,
}

impl ConsolePresenter {
    pub fn new(covers: Option<Arc<CoverCache>>) -> Self {
        Self { covers }
    }

    fn rating_glyphs(record: &BookRecord) -> String {
        "★".repeat(record.rating as usize)
    }

    fn prefetch_cover(&self, record: &BookRecord) {
        if record.isbn.is_empty() {
            return;
        }
        if let Some(covers) = &self.covers {
            covers.prefetch(&record.cover_url());
        }
    }
}

impl PresentationAdapter for ConsolePresenter {
    fn render_list(&mut self, records: &[BookRecord]) {
        info!("List view: {} book(s)", records.len());
        for record in records {
            println!(
                "{} - {} {} [{}]",
                record.title,
                record.author,
                Self::rating_glyphs(record),
                record.date_read
            );
        }
    }

    fn render_scatter_2d(&mut self, points: &[PlottedBook2], extent: f64) {
        info!(
            "2D scatter view: {} placed book(s) on a {:.0}x{:.0} surface",
            points.len(),
            extent,
            extent
        );
        for point in points {
            self.prefetch_cover(&point.record);
            println!(
                "({:8.2}, {:8.2})  {} - {}",
                point.x, point.y, point.record.title, point.record.author
            );
        }
    }

    fn render_scatter_3d(&mut self, points: &[PlottedBook3], extent: f64) {
        info!(
            "3D scatter view: {} placed book(s) in a centered volume of edge {:.0}",
            points.len(),
            extent
        );
        for point in points {
            self.prefetch_cover(&point.record);
            println!(
                "({:8.2}, {:8.2}, {:8.2})  {} - {}",
                point.x, point.y, point.z, point.record.title, point.record.author
            );
        }
    }
}
