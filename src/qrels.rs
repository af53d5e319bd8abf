//! Reader for qrels-style section label files.
//!
//! Each non-blank line holds whitespace-separated fields:
//!
//! ```text
//! <section path> <iteration> <paragraph id> <relevance>
//! ```
//!
//! Only the section path and paragraph id are used. The page a paragraph belongs
//! to is the first segment of its section path.

use crate::distance::PageLabels;
use crate::error::{DistanceError, Result};
use crate::tree::page_of;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Read a qrels file and group paragraph labels by page.
pub fn read_qrels(path: &Path) -> Result<PageLabels> {
    let file = File::open(path).map_err(|e| DistanceError::io(path, e))?;
    let labels = parse_qrels(BufReader::new(file)).map_err(|e| match e {
        DistanceError::Io { source, .. } => DistanceError::io(path, source),
        other => other,
    })?;

    info!(
        path = %path.display(),
        pages = labels.len(),
        paragraphs = paragraph_count(&labels),
        "Loaded section labels"
    );

    Ok(labels)
}

/// Parse qrels lines from any buffered reader.
///
/// If a paragraph is listed twice for the same page, the later label wins.
pub fn parse_qrels<R: BufRead>(reader: R) -> Result<PageLabels> {
    let mut labels = PageLabels::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| DistanceError::io("<qrels>", e))?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 3 {
            return Err(DistanceError::QrelsParse {
                line: i + 1,
                message: format!("expected at least 3 fields, found {}", fields.len()),
            });
        }

        let section = fields[0];
        let paragraph = fields[2];
        let page = page_of(section);

        let previous = labels
            .entry(page.to_string())
            .or_default()
            .insert(paragraph.to_string(), section.to_string());
        if let Some(previous) = previous {
            debug!(page, paragraph, previous = %previous, section, "Paragraph relabeled");
        }
    }

    Ok(labels)
}

/// Distinct section paths used on each page.
pub fn sections_by_page(labels: &PageLabels) -> BTreeMap<String, BTreeSet<String>> {
    labels
        .iter()
        .map(|(page, paragraphs)| (page.clone(), paragraphs.values().cloned().collect()))
        .collect()
}

/// All paragraph ids mentioned by any page.
pub fn paragraph_ids(labels: &PageLabels) -> HashSet<String> {
    labels
        .values()
        .flat_map(|paragraphs| paragraphs.keys().cloned())
        .collect()
}

/// Total number of labeled paragraphs across pages.
pub fn paragraph_count(labels: &PageLabels) -> usize {
    labels.values().map(BTreeMap::len).sum()
}
