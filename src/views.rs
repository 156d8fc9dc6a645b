//! Derivation of sorted and shelf-filtered views from the full record set.
//!
//! Every function here returns a new sequence; the full set owned by the
//! catalog side is never mutated.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::protocol::SortKey;
use crate::record::BookRecord;

/// Date shapes accepted from the `date read` column.
const DATE_READ_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y"];

/// Parses a `date read` cell; empty or unrecognized text is `None`.
pub fn parse_date_read(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_READ_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Most recent first; records without a parseable date sink to the end.
/// Two unparseable dates compare equal so the stable sort keeps input order.
fn compare_by_date_read(a: &BookRecord, b: &BookRecord) -> Ordering {
    match (parse_date_read(&a.date_read), parse_date_read(&b.date_read)) {
        (Some(date_a), Some(date_b)) => date_b.cmp(&date_a),
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Returns a new sequence ordered by the requested key.
///
/// `rating` is descending with the date rule as secondary key; `title` and
/// `author` compare Unicode-lowercased, missing values as empty strings.
/// The sort is stable, so remaining ties keep their input order.
pub fn sort_records(records: &[BookRecord], key: SortKey) -> Vec<BookRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| match key {
        SortKey::DateRead => compare_by_date_read(a, b),
        SortKey::Rating => b
            .rating
            .cmp(&a.rating)
            .then_with(|| compare_by_date_read(a, b)),
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::Author => a.author.to_lowercase().cmp(&b.author.to_lowercase()),
    });
    sorted
}

/// Returns the subset shelved under `shelf`; an empty shelf means no filter.
///
/// Shelf membership splits `bookshelves` on commas and compares each entry
/// trimmed and lowercased against the lowercased target.
pub fn filter_by_shelf(records: &[BookRecord], shelf: &str) -> Vec<BookRecord> {
    let target = shelf.trim().to_lowercase();
    if target.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| {
            record
                .bookshelves
                .split(',')
                .map(|entry| entry.trim().to_lowercase())
                .any(|entry| entry == target)
        })
        .cloned()
        .collect()
}

/// Sorted distinct shelf tags across the record set, for selector population.
pub fn collect_shelves(records: &[BookRecord]) -> Vec<String> {
    let mut shelves = BTreeSet::new();
    for record in records {
        for entry in record.bookshelves.split(',') {
            let shelf = entry.trim().to_lowercase();
            if !shelf.is_empty() {
                shelves.insert(shelf);
            }
        }
    }
    shelves.into_iter().collect()
}
