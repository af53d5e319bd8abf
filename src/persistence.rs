//! Persistence layer for saving/loading computed distance tables.
//!
//! Supports both JSON (human-readable) and bincode (efficient binary) formats.
//! Pair keys are stored as explicit records so the JSON form stays a plain list.

use crate::distance::{PageDistances, PairDistances};
use crate::error::{DistanceError, Result};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Default filename for the distance results.
pub const DEFAULT_RESULTS_FILENAME: &str = "para_distances.json";

/// Save format for result files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// JSON format (human-readable, larger).
    Json,
    /// Bincode format (binary, compact).
    Bincode,
}

impl SaveFormat {
    /// Determine format from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => SaveFormat::Json,
            Some("bin") | Some("bincode") => SaveFormat::Bincode,
            _ => SaveFormat::Json, // Default to JSON
        }
    }
}

/// Distance of one paragraph pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct PairRecord {
    pub para1: String,
    pub para2: String,
    pub distance: f64,
}

/// All pair distances of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct PageRecord {
    pub page: String,
    pub pairs: Vec<PairRecord>,
}

/// On-disk form of [`PageDistances`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct DistanceFile {
    pub pages: Vec<PageRecord>,
}

impl DistanceFile {
    /// Flatten distance tables into records.
    pub fn from_distances(distances: &PageDistances) -> Self {
        let pages = distances
            .iter()
            .map(|(page, table)| PageRecord {
                page: page.clone(),
                pairs: table
                    .iter()
                    .map(|((para1, para2), &distance)| PairRecord {
                        para1: para1.clone(),
                        para2: para2.clone(),
                        distance,
                    })
                    .collect(),
            })
            .collect();
        Self { pages }
    }

    /// Rebuild the distance tables.
    pub fn into_distances(self) -> PageDistances {
        self.pages
            .into_iter()
            .map(|record| {
                let table: PairDistances = record
                    .pairs
                    .into_iter()
                    .map(|p| ((p.para1, p.para2), p.distance))
                    .collect();
                (record.page, table)
            })
            .collect::<BTreeMap<_, _>>()
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of pair records across pages.
    pub fn pair_count(&self) -> usize {
        self.pages.iter().map(|p| p.pairs.len()).sum()
    }

    /// Largest distance stored, if any.
    pub fn max_distance(&self) -> Option<f64> {
        self.pages
            .iter()
            .flat_map(|p| p.pairs.iter().map(|r| r.distance))
            .reduce(f64::max)
    }
}

/// Save distance tables to a file.
pub fn save_distances(distances: &PageDistances, path: &Path) -> Result<()> {
    let format = SaveFormat::from_path(path);
    save_distances_with_format(distances, path, format)
}

/// Save distance tables with specific format.
pub fn save_distances_with_format(
    distances: &PageDistances,
    path: &Path,
    format: SaveFormat,
) -> Result<()> {
    let file = DistanceFile::from_distances(distances);

    let data = match format {
        SaveFormat::Json => serde_json::to_string_pretty(&file)
            .map_err(|e| DistanceError::Serialization(e.to_string()))?
            .into_bytes(),
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            bincode::encode_to_vec(&file, config)
                .map_err(|e| DistanceError::Serialization(e.to_string()))?
        }
    };

    write_with_parents(path, &data)
}

/// Load a distance file.
pub fn load_distance_file(path: &Path) -> Result<DistanceFile> {
    if !path.exists() {
        return Err(DistanceError::ResultsNotFound(path.to_path_buf()));
    }

    let data = fs::read(path).map_err(|e| DistanceError::io(path, e))?;

    let file = match SaveFormat::from_path(path) {
        SaveFormat::Json => serde_json::from_slice(&data)
            .map_err(|e| DistanceError::Serialization(e.to_string()))?,
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            let (file, _): (DistanceFile, usize) = bincode::decode_from_slice(&data, config)
                .map_err(|e| DistanceError::Serialization(e.to_string()))?;
            file
        }
    };

    Ok(file)
}

/// Load distance tables from a file.
pub fn load_distances(path: &Path) -> Result<PageDistances> {
    Ok(load_distance_file(path)?.into_distances())
}

/// Save a `para_id → plaintext` map as pretty JSON.
pub fn save_passages(passages: &HashMap<String, String>, path: &Path) -> Result<()> {
    let sorted: BTreeMap<&String, &String> = passages.iter().collect();
    let json = serde_json::to_string_pretty(&sorted)?;
    write_with_parents(path, json.as_bytes())
}

fn write_with_parents(path: &Path, data: &[u8]) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| DistanceError::io(parent, e))?;
        }
    }

    fs::write(path, data).map_err(|e| DistanceError::io(path, e))
}

/// Check if a results file exists at the given path.
pub fn results_exist(path: &Path) -> bool {
    path.exists() && path.is_file()
}

/// Get the size of a results file in bytes.
pub fn results_size(path: &Path) -> Result<u64> {
    let metadata = fs::metadata(path).map_err(|e| DistanceError::io(path, e))?;
    Ok(metadata.len())
}
