//! Decoding of raw sheet rows into structured catalog records.
//!
//! One row plus the header list produces one [`BookRecord`]. The embedding
//! columns for the active method decode into optional positions; every other
//! header passes through as text.

use std::collections::BTreeMap;

use crate::backends::SheetTable;
use crate::protocol::EmbeddingMethod;

const COVER_URL_BASE: &str = "https://covers.openlibrary.org/b/isbn";

/// One catalog entry decoded from a sheet row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    /// Used to derive the cover-image URL; may be empty.
    pub isbn: String,
    /// Star count; absent or unparseable cells decode as 0.
    pub rating: u32,
    /// Raw cell text from the `date read` column; parsed lazily at sort time.
    pub date_read: String,
    /// Comma-separated free-text shelf tags.
    pub bookshelves: String,
    /// Present exactly when the active method's 2D embedding column exists.
    pub position_2d: Option<[f64; 2]>,
    /// Present exactly when the active method's 3D embedding column exists.
    pub position_3d: Option<[f64; 3]>,
    /// All other header-named cells, passed through verbatim.
    pub extra: BTreeMap<String, String>,
}

impl BookRecord {
    /// Open Library cover image URL for this record's ISBN.
    pub fn cover_url(&self) -> String {
        format!("{}/{}-L.jpg", COVER_URL_BASE, self.isbn)
    }
}

/// Decodes a raw coordinate cell at the given arity.
///
/// A valid JSON number array of length >= `arity` yields its first `arity`
/// elements; malformed text, empty cells, and shorter arrays yield the zero
/// vector so that a single bad cell never aborts the row.
pub fn decode_coordinates(raw: &str, arity: usize) -> Vec<f64> {
    match serde_json::from_str::<Vec<f64>>(raw.trim()) {
        Ok(values) if values.len() >= arity => values.into_iter().take(arity).collect(),
        _ => vec![0.0; arity],
    }
}

/// Decodes one row against the header list for the active embedding method.
///
/// Headers are matched by exact trimmed equality; a duplicated header means
/// the last cell wins. Cells missing from a short row decode as empty text.
pub fn decode_record(headers: &[String], row: &[String], method: EmbeddingMethod) -> BookRecord {
    let column_2d = method.column_2d();
    let column_3d = method.column_3d();
    let mut record = BookRecord::default();

    for (index, header) in headers.iter().enumerate() {
        let header = header.trim();
        let value = row.get(index).map(String::as_str).unwrap_or("");

        if header == column_2d {
            let coords = decode_coordinates(value, 2);
            record.position_2d = Some([coords[0], coords[1]]);
        } else if header == column_3d {
            let coords = decode_coordinates(value, 3);
            record.position_3d = Some([coords[0], coords[1], coords[2]]);
        } else {
            match header {
                "title" => record.title = value.to_string(),
                "author" => record.author = value.to_string(),
                "isbn" => record.isbn = value.to_string(),
                "rating" => record.rating = value.trim().parse().unwrap_or(0),
                "date read" => record.date_read = value.to_string(),
                "bookshelves" => record.bookshelves = value.to_string(),
                _ => {
                    record.extra.insert(header.to_string(), value.to_string());
                }
            }
        }
    }

    record
}

/// Decodes a fetched table into the full record set.
pub fn decode_table(table: &SheetTable, method: EmbeddingMethod) -> Vec<BookRecord> {
    table
        .rows
        .iter()
        .map(|row| decode_record(&table.headers, row, method))
        .collect()
}
