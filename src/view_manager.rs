//! View derivation runtime component.
//!
//! This manager owns the active selections (sort key, shelf filter,
//! presentation mode) and the current full record set. Every selection
//! change re-derives a transient view (filter, then sort, then normalize for
//! the spatial modes) from the in-memory set and hands it to the
//! presentation adapter; the full set itself is never mutated.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::broadcast::Receiver;

use crate::normalize::{project_2d, project_3d};
use crate::presentation::PresentationAdapter;
use crate::protocol::{
    CatalogMessage, ConfigMessage, Message, PresentationMode, SortKey, ViewMessage,
};
use crate::record::BookRecord;
use crate::views::{collect_shelves, filter_by_shelf, sort_records};

/// Derives and renders views of the loaded catalog.
pub struct ViewManager {
    bus_consumer: Receiver<Message>,
    presenter: Box<dyn PresentationAdapter>,
    records: Option<Arc<Vec<BookRecord>>>,
    shelves: Vec<String>,
    sort_key: SortKey,
    shelf: String,
    mode: PresentationMode,
    extent_2d: f64,
    extent_3d: f64,
}

impl ViewManager {
    /// Creates a view manager bound to the bus and a presentation surface.
    pub fn new(bus_consumer: Receiver<Message>, presenter: Box<dyn PresentationAdapter>) -> Self {
        Self {
            bus_consumer,
            presenter,
            records: None,
            shelves: Vec::new(),
            sort_key: SortKey::default(),
            shelf: String::new(),
            mode: PresentationMode::default(),
            extent_2d: 800.0,
            extent_3d: 200.0,
        }
    }

    fn render(&mut self) {
        let Some(records) = self.records.clone() else {
            debug!("No catalog loaded yet, skipping render");
            return;
        };

        let filtered = filter_by_shelf(&records, &self.shelf);
        let sorted = sort_records(&filtered, self.sort_key);
        match self.mode {
            PresentationMode::List => self.presenter.render_list(&sorted),
            PresentationMode::Scatter2d => {
                let points = project_2d(&records, &sorted, self.extent_2d);
                self.presenter.render_scatter_2d(&points, self.extent_2d);
            }
            PresentationMode::Scatter3d => {
                let points = project_3d(&records, &sorted, self.extent_3d);
                self.presenter.render_scatter_3d(&points, self.extent_3d);
            }
        }
    }

    fn list_shelves(&self) {
        if self.records.is_none() {
            info!("No catalog loaded yet");
            return;
        }
        info!("Shelves: {}", self.shelves.join(", "));
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::Config(ConfigMessage::ConfigChanged(config)) => {
                self.extent_2d = config.render.extent_2d;
                self.extent_3d = config.render.extent_3d;
                self.sort_key = config.render.startup_sort;
                self.mode = config.render.startup_mode;
            }
            Message::Catalog(CatalogMessage::CatalogLoaded { records, .. }) => {
                self.shelves = collect_shelves(&records);
                self.records = Some(records);
                self.render();
            }
            Message::Catalog(CatalogMessage::LoadFailed(err)) => {
                warn!("Catalog load failed, keeping prior view: {}", err);
            }
            Message::View(ViewMessage::SetSortKey(sort_key)) => {
                self.sort_key = sort_key;
                self.render();
            }
            Message::View(ViewMessage::SetShelf(shelf)) => {
                self.shelf = shelf;
                self.render();
            }
            Message::View(ViewMessage::SetMode(mode)) => {
                self.mode = mode;
                self.render();
            }
            Message::View(ViewMessage::ListShelves) => {
                self.list_shelves();
            }
            _ => {}
        }
    }

    /// Starts the blocking event loop for selection changes and catalog updates.
    pub fn run(&mut self) {
        loop {
            match self.bus_consumer.blocking_recv() {
                Ok(message) => self.handle_message(message),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "ViewManager lagged on control bus, skipped {} message(s)",
                        skipped
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
