mod backends;
mod catalog_manager;
mod config;
mod covers;
mod normalize;
mod presentation;
mod protocol;
mod record;
mod view_manager;
mod views;

use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use backends::google_sheets::GoogleSheetsAdapter;
use catalog_manager::CatalogManager;
use config::Config;
use covers::{CoverCache, HttpCoverSource};
use log::{info, warn};
use presentation::ConsolePresenter;
use protocol::{
    CatalogMessage, ConfigMessage, EmbeddingMethod, Message, PresentationMode, SortKey,
    ViewMessage,
};
use tokio::sync::broadcast;
use view_manager::ViewManager;

fn sanitize_config(config: Config) -> Config {
    let mut sanitized = config;
    if !sanitized.render.extent_2d.is_finite() || sanitized.render.extent_2d < 1.0 {
        sanitized.render.extent_2d = 1.0;
    }
    if !sanitized.render.extent_3d.is_finite() || sanitized.render.extent_3d < 1.0 {
        sanitized.render.extent_3d = 1.0;
    }
    sanitized.covers.cover_cache_max_size_mb = sanitized.covers.cover_cache_max_size_mb.max(1);
    sanitized
}

/// Maps one console command line onto a bus message.
fn parse_command(line: &str) -> Option<Message> {
    let trimmed = line.trim();
    let (command, argument) = match trimmed.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (trimmed, ""),
    };

    match command {
        "refresh" => Some(Message::Catalog(CatalogMessage::RequestRefresh)),
        "mode" => PresentationMode::parse(argument)
            .map(|mode| Message::View(ViewMessage::SetMode(mode))),
        "sort" => {
            SortKey::parse(argument).map(|key| Message::View(ViewMessage::SetSortKey(key)))
        }
        "shelf" => Some(Message::View(ViewMessage::SetShelf(argument.to_string()))),
        "shelves" => Some(Message::View(ViewMessage::ListShelves)),
        "embedding" => EmbeddingMethod::parse(argument)
            .map(|method| Message::Catalog(CatalogMessage::SetEmbeddingMethod(method))),
        _ => None,
    }
}

fn print_help() {
    info!("Commands:");
    info!("  mode <list|2d|3d>      switch the presentation mode");
    info!(
        "  sort <key>             order the list view ({})",
        [
            SortKey::Title,
            SortKey::Author,
            SortKey::Rating,
            SortKey::DateRead
        ]
        .map(|key| key.label())
        .join(", ")
    );
    info!("  shelf [name]           filter by shelf; no name clears the filter");
    info!("  shelves                list the shelves in the loaded catalog");
    info!("  embedding <tsne|umap>  switch the embedding method");
    info!("  refresh                re-fetch the catalog");
    info!("  quit                   exit");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.init();

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let config_dir = dirs::config_dir().ok_or("Could not find config directory")?;
    let config_file = config_dir.join("shelfspace.toml");

    if !config_file.exists() {
        let default_config = Config::default();
        info!(
            "Config file not found. Creating default config. path={}",
            config_file.display()
        );
        std::fs::write(&config_file, toml::to_string(&default_config)?)?;
    }

    let config_content = std::fs::read_to_string(&config_file)?;
    let config = sanitize_config(toml::from_str::<Config>(&config_content).unwrap_or_default());
    if config.source.sheet_id.trim().is_empty() {
        warn!(
            "No sheet_id configured; set [source] in {} before refreshing",
            config_file.display()
        );
    }

    // Bus for communication between components
    let (bus_sender, _) = broadcast::channel(1024);

    let cover_cache = CoverCache::new(
        Box::new(HttpCoverSource::new()),
        CoverCache::default_disk_root(),
    );
    cover_cache.set_disk_budget(config.covers.cover_cache_max_size_mb);

    // Setup catalog manager
    let catalog_bus_receiver = bus_sender.subscribe();
    let catalog_bus_sender = bus_sender.clone();
    thread::spawn(move || {
        let mut catalog_manager = CatalogManager::new(
            catalog_bus_receiver,
            catalog_bus_sender,
            Box::new(GoogleSheetsAdapter::new()),
        );
        catalog_manager.run();
    });

    // Setup view manager
    let view_bus_receiver = bus_sender.subscribe();
    let presenter_covers = config
        .covers
        .prefetch_covers
        .then(|| Arc::clone(&cover_cache));
    thread::spawn(move || {
        let mut view_manager = ViewManager::new(
            view_bus_receiver,
            Box::new(ConsolePresenter::new(presenter_covers)),
        );
        view_manager.run();
    });

    let _ = bus_sender.send(Message::Config(ConfigMessage::ConfigChanged(config)));
    let _ = bus_sender.send(Message::Catalog(CatalogMessage::RequestRefresh));

    print_help();

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" || trimmed == "exit" {
            break;
        }
        if trimmed == "help" {
            print_help();
            continue;
        }
        match parse_command(trimmed) {
            Some(message) => {
                let _ = bus_sender.send(message);
            }
            None => {
                warn!("Unknown command: {}", trimmed);
                print_help();
            }
        }
    }

    info!("Application exiting");
    Ok(())
}
