//! Cover image fetching, decoding, and caching.
//!
//! Covers are keyed by resource URL with at most one in-flight request per
//! key; every waiter registered while a request is outstanding receives the
//! same resolved image. Resolved originals are kept in memory and mirrored
//! to a disk cache pruned to a configurable budget.

use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::HashMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, UNIX_EPOCH};

use image::{DynamicImage, GenericImageView};
use log::{debug, warn};
use zune_core::{colorspace::ColorSpace, options::DecoderOptions};
use zune_jpeg::JpegDecoder;

const DEFAULT_DISK_BUDGET_BYTES: u64 = 256u64 * 1024u64 * 1024u64;
const MAX_COVER_BYTES: u64 = 8u64 * 1024u64 * 1024u64;

/// Outcome delivered to every waiter of one cover key.
pub type CoverResult = Result<Arc<CoverImage>, String>;

/// Source of raw cover bytes, keyed by URL.
pub trait CoverSource: Send + Sync {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, String>;
}

/// Cover source backed by `ureq`.
pub struct HttpCoverSource {
    http_client: ureq::Agent,
}

impl HttpCoverSource {
    pub fn new() -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(15))
            .timeout_write(Duration::from_secs(15))
            .build();
        Self { http_client }
    }
}

impl Default for HttpCoverSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverSource for HttpCoverSource {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self
            .http_client
            .get(url)
            .call()
            .map_err(|err| format!("Cover request failed ({url}): {err}"))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_COVER_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|err| format!("Cover read failed ({url}): {err}"))?;
        Ok(bytes)
    }
}

/// One decoded cover held by the cache.
#[derive(Debug)]
pub struct CoverImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub pixels: image::RgbaImage,
}

enum CoverSlot {
    /// A request is outstanding; queued senders are drained on resolve.
    InFlight(Vec<Sender<CoverResult>>),
    Ready(Arc<CoverImage>),
}

/// URL-keyed cover cache with single-flight fetches.
pub struct CoverCache {
    source: Box<dyn CoverSource>,
    disk_root: Option<PathBuf>,
    disk_budget_bytes: AtomicU64,
    slots: Mutex<HashMap<String, CoverSlot>>,
}

impl CoverCache {
    pub fn new(source: Box<dyn CoverSource>, disk_root: Option<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            source,
            disk_root,
            disk_budget_bytes: AtomicU64::new(DEFAULT_DISK_BUDGET_BYTES),
            slots: Mutex::new(HashMap::new()),
        })
    }

    /// Default on-disk location for cached cover originals.
    pub fn default_disk_root() -> Option<PathBuf> {
        dirs::cache_dir().map(|path| path.join("shelfspace").join("covers"))
    }

    pub fn set_disk_budget(&self, max_size_mb: u32) {
        self.disk_budget_bytes
            .store(mb_to_bytes(max_size_mb), Ordering::Relaxed);
    }

    /// Requests the cover for `url`, returning a receiver for the outcome.
    ///
    /// A cached cover resolves immediately; otherwise the caller joins the
    /// in-flight request for that key, spawning a worker only when none is
    /// outstanding.
    pub fn fetch(self: &Arc<Self>, url: &str) -> Receiver<CoverResult> {
        let (result_tx, result_rx) = channel();
        let spawn_worker = {
            let mut slots = self.slots.lock().expect("cover slots lock poisoned");
            match slots.entry(url.to_string()) {
                Entry::Occupied(mut entry) => {
                    match entry.get_mut() {
                        CoverSlot::Ready(image) => {
                            let _ = result_tx.send(Ok(Arc::clone(image)));
                        }
                        CoverSlot::InFlight(waiters) => {
                            waiters.push(result_tx);
                        }
                    }
                    false
                }
                Entry::Vacant(entry) => {
                    entry.insert(CoverSlot::InFlight(vec![result_tx]));
                    true
                }
            }
        };

        if spawn_worker {
            let cache = Arc::clone(self);
            let url = url.to_string();
            thread::spawn(move || {
                let outcome = cache.load(&url).map(Arc::new);
                cache.resolve(&url, outcome);
            });
        }

        result_rx
    }

    /// Starts resolving the cover for `url` without waiting for the result.
    pub fn prefetch(self: &Arc<Self>, url: &str) {
        let _ = self.fetch(url);
    }

    fn resolve(&self, url: &str, outcome: CoverResult) {
        let waiters = {
            let mut slots = self.slots.lock().expect("cover slots lock poisoned");
            match slots.remove(url) {
                Some(CoverSlot::InFlight(waiters)) => {
                    if let Ok(image) = &outcome {
                        slots.insert(url.to_string(), CoverSlot::Ready(Arc::clone(image)));
                    }
                    // A failed key is dropped so a later request can retry.
                    waiters
                }
                Some(CoverSlot::Ready(image)) => {
                    slots.insert(url.to_string(), CoverSlot::Ready(image));
                    Vec::new()
                }
                None => Vec::new(),
            }
        };

        match &outcome {
            Ok(image) => debug!(
                "Cover ready: {} ({}x{}, {} rgba bytes)",
                image.url,
                image.width,
                image.height,
                image.pixels.as_raw().len()
            ),
            Err(err) => warn!("Cover resolve failed: {}", err),
        }
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }

    fn load(&self, url: &str) -> Result<CoverImage, String> {
        if let Some(bytes) = self.read_disk_cached(url) {
            if let Some(decoded) = decode_cover_bytes(&bytes) {
                return Ok(Self::cover_from_decoded(url, decoded));
            }
            self.remove_disk_cached(url);
        }

        let bytes = self.source.fetch_bytes(url)?;
        let decoded = decode_cover_bytes(&bytes)
            .ok_or_else(|| format!("Cover decode failed ({url})"))?;
        self.write_disk_cached(url, &bytes);
        Ok(Self::cover_from_decoded(url, decoded))
    }

    fn cover_from_decoded(url: &str, decoded: DynamicImage) -> CoverImage {
        let (width, height) = decoded.dimensions();
        CoverImage {
            url: url.to_string(),
            width,
            height,
            pixels: decoded.into_rgba8(),
        }
    }

    fn disk_path(&self, url: &str) -> Option<PathBuf> {
        self.disk_root
            .as_ref()
            .map(|root| root.join(format!("{}.img", cache_stem(url))))
    }

    fn read_disk_cached(&self, url: &str) -> Option<Vec<u8>> {
        let path = self.disk_path(url)?;
        fs::read(path).ok()
    }

    fn remove_disk_cached(&self, url: &str) {
        if let Some(path) = self.disk_path(url) {
            let _ = fs::remove_file(path);
        }
    }

    fn write_disk_cached(&self, url: &str, bytes: &[u8]) {
        let Some(path) = self.disk_path(url) else {
            return;
        };
        if let Some(parent) = path.parent() {
            if !parent.exists() && fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        let temp_path = path.with_extension("img.tmp");
        if fs::write(&temp_path, bytes).is_err() || fs::rename(&temp_path, &path).is_err() {
            debug!("Cover disk cache write failed for {}", url);
            return;
        }
        if let Some(root) = self.disk_root.clone() {
            prune_disk_cache(&root, self.disk_budget_bytes.load(Ordering::Relaxed));
        }
    }
}

pub fn mb_to_bytes(value_mb: u32) -> u64 {
    u64::from(value_mb.max(1)) * 1024u64 * 1024u64
}

fn cache_stem(url: &str) -> String {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

fn looks_like_jpeg(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0xff && bytes[1] == 0xd8
}

fn decode_jpeg_non_strict(bytes: &[u8]) -> Option<DynamicImage> {
    if !looks_like_jpeg(bytes) {
        return None;
    }

    let options = DecoderOptions::new_cmd()
        .set_strict_mode(false)
        .jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);
    let pixels = decoder.decode().ok()?;
    let (width, height) = decoder.dimensions()?;
    let image = image::RgbaImage::from_raw(width as u32, height as u32, pixels)?;
    Some(DynamicImage::ImageRgba8(image))
}

/// Primary decoder first; non-strict JPEG fallback for the malformed files
/// the cover service occasionally serves.
fn decode_cover_bytes(bytes: &[u8]) -> Option<DynamicImage> {
    image::load_from_memory(bytes)
        .ok()
        .or_else(|| decode_jpeg_non_strict(bytes))
}

fn list_files_with_age(root: &Path) -> Vec<(PathBuf, u64, u128)> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if metadata.is_dir() {
                stack.push(path);
                continue;
            }
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata
                .modified()
                .ok()
                .and_then(|value| value.duration_since(UNIX_EPOCH).ok())
                .map(|duration| duration.as_millis())
                .unwrap_or(0);
            files.push((path, metadata.len(), modified));
        }
    }
    files
}

/// Deletes least-recently-modified cached covers until the budget holds.
fn prune_disk_cache(root: &Path, max_size_bytes: u64) {
    let mut files = list_files_with_age(root);
    let mut total_bytes = files.iter().map(|(_, size, _)| *size).sum::<u64>();
    if total_bytes <= max_size_bytes {
        return;
    }

    files.sort_by_key(|(_, _, modified)| *modified);
    for (path, size, _) in files {
        if total_bytes <= max_size_bytes {
            break;
        }
        if fs::remove_file(&path).is_ok() {
            total_bytes = total_bytes.saturating_sub(size);
        }
    }
}
