//! Catalog loading runtime component.
//!
//! This manager owns the fetch-and-decode step: it pulls the raw table from
//! the configured backend, decodes it against the active embedding method,
//! and publishes the replacement record set over the bus. A failed fetch is
//! published as a failure so consumers keep their prior view.

use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::broadcast::{Receiver, Sender};

use crate::backends::CatalogBackendAdapter;
use crate::config::SourceConfig;
use crate::protocol::{CatalogMessage, ConfigMessage, EmbeddingMethod, Message};
use crate::record::decode_table;

/// Coordinates catalog fetches and embedding-method switches.
pub struct CatalogManager {
    bus_consumer: Receiver<Message>,
    bus_producer: Sender<Message>,
    backend: Box<dyn CatalogBackendAdapter>,
    source: SourceConfig,
    active_method: EmbeddingMethod,
}

impl CatalogManager {
    /// Creates a catalog manager bound to bus channels and a backend.
    pub fn new(
        bus_consumer: Receiver<Message>,
        bus_producer: Sender<Message>,
        backend: Box<dyn CatalogBackendAdapter>,
    ) -> Self {
        Self {
            bus_consumer,
            bus_producer,
            backend,
            source: SourceConfig::default(),
            active_method: EmbeddingMethod::default(),
        }
    }

    fn reload(&self) {
        let table = match self.backend.fetch_table(&self.source) {
            Ok(table) => table,
            Err(err) => {
                error!("Catalog fetch failed: {}", err);
                let _ = self
                    .bus_producer
                    .send(Message::Catalog(CatalogMessage::LoadFailed(err)));
                return;
            }
        };

        let records = decode_table(&table, self.active_method);
        info!(
            "Catalog loaded: {} record(s), embedding method {:?}",
            records.len(),
            self.active_method
        );
        let _ = self
            .bus_producer
            .send(Message::Catalog(CatalogMessage::CatalogLoaded {
                records: Arc::new(records),
                method: self.active_method,
            }));
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::Config(ConfigMessage::ConfigChanged(config)) => {
                self.source = config.source;
                self.active_method = config.render.startup_embedding;
            }
            Message::Catalog(CatalogMessage::RequestRefresh) => {
                self.reload();
            }
            Message::Catalog(CatalogMessage::SetEmbeddingMethod(method)) => {
                // Each row encodes both methods side by side, so a switch
                // requires a full re-decode of the set.
                if method != self.active_method {
                    self.active_method = method;
                    self.reload();
                }
            }
            _ => {}
        }
    }

    /// Starts the blocking event loop for catalog requests.
    pub fn run(&mut self) {
        loop {
            match self.bus_consumer.blocking_recv() {
                Ok(message) => self.handle_message(message),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "CatalogManager lagged on control bus, skipped {} message(s)",
                        skipped
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
