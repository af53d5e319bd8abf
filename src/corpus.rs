//! Paragraph corpus loader.
//!
//! The corpus is a directory of shards, each holding one JSON paragraph per line:
//!
//! ```text
//! {"para_id": "...", "para_body": [{"text": "..."}, {"text": "...", "link_section": "..."}]}
//! ```
//!
//! Shards are gzip-compressed or plain text whatever their file name; gzip is
//! recognized by its magic bytes. A paragraph's plaintext is the `text` of its
//! body fragments joined by single spaces.

use crate::error::{DistanceError, Result};
use flate2::bufread::MultiGzDecoder;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Deserialize)]
struct RawParagraph {
    para_id: String,
    #[serde(default)]
    para_body: Vec<RawFragment>,
}

#[derive(Debug, Deserialize)]
struct RawFragment {
    #[serde(default)]
    text: String,
}

impl RawParagraph {
    fn plaintext(&self) -> String {
        self.para_body
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Plaintext of the paragraphs loaded from a corpus directory.
#[derive(Debug, Clone, Default)]
pub struct ParagraphCorpus {
    /// Directory the corpus was read from.
    pub path: Option<PathBuf>,
    passages: HashMap<String, String>,
}

impl ParagraphCorpus {
    /// Load the paragraphs whose ids are in `wanted` from every shard under `dir`.
    pub fn load_filtered(dir: &Path, wanted: &HashSet<String>) -> Result<Self> {
        if !dir.is_dir() {
            return Err(DistanceError::InvalidCorpusPath(dir.to_path_buf()));
        }

        let shards = shard_files(dir)?;
        let mut passages = HashMap::new();

        for (i, shard) in shards.iter().enumerate() {
            let before = passages.len();
            read_shard(shard, wanted, &mut passages)?;
            debug!(
                shard = %shard.display(),
                found = passages.len() - before,
                "Read corpus shard {}/{}",
                i + 1,
                shards.len()
            );
        }

        info!(
            path = %dir.display(),
            shards = shards.len(),
            found = passages.len(),
            wanted = wanted.len(),
            "Loaded paragraph corpus"
        );

        Ok(Self {
            path: Some(dir.to_path_buf()),
            passages,
        })
    }

    /// Plaintext of a paragraph.
    pub fn get(&self, para_id: &str) -> Option<&str> {
        self.passages.get(para_id).map(String::as_str)
    }

    /// Number of loaded paragraphs.
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Check if no paragraph was loaded.
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Wanted ids that no shard contained.
    pub fn missing<'a>(&self, wanted: &'a HashSet<String>) -> Vec<&'a str> {
        let mut missing: Vec<&str> = wanted
            .iter()
            .filter(|id| !self.passages.contains_key(*id))
            .map(String::as_str)
            .collect();
        missing.sort_unstable();
        missing
    }

    /// Take ownership of the `para_id → plaintext` map.
    pub fn into_passages(self) -> HashMap<String, String> {
        self.passages
    }
}

/// Regular files directly inside `dir`, sorted by name.
fn shard_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut shards = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            DistanceError::io(path, e.into())
        })?;
        if entry.file_type().is_file() {
            shards.push(entry.into_path());
        }
    }
    shards.sort();
    Ok(shards)
}

fn read_shard(
    path: &Path,
    wanted: &HashSet<String>,
    passages: &mut HashMap<String, String>,
) -> Result<()> {
    let file = File::open(path).map_err(|e| DistanceError::io(path, e))?;
    let mut buffered = BufReader::new(file);
    let is_gzip = buffered
        .fill_buf()
        .map_err(|e| DistanceError::io(path, e))?
        .starts_with(&GZIP_MAGIC);

    let reader: Box<dyn BufRead> = if is_gzip {
        Box::new(BufReader::new(MultiGzDecoder::new(buffered)))
    } else {
        Box::new(buffered)
    };

    for line in reader.lines() {
        let line = line.map_err(|e| DistanceError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let paragraph: RawParagraph = serde_json::from_str(&line).map_err(|e| {
            DistanceError::Serialization(format!("{}: {}", path.display(), e))
        })?;
        if wanted.contains(&paragraph.para_id) {
            let text = paragraph.plaintext();
            passages.insert(paragraph.para_id, text);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    const SHARD_A: &str = r#"{"para_id": "p1", "para_body": [{"text": "Panic Room is a"}, {"text": "thriller film.", "link_section": "Film"}]}
{"para_id": "p2", "para_body": [{"text": "Unwanted."}]}
"#;

    const SHARD_B: &str = r#"{"para_id": "p3", "para_body": [{"text": "Filming began in 2001."}]}
"#;

    fn wanted(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn write_corpus(dir: &Path) {
        fs::write(dir.join("part-0.jsonl"), SHARD_A).unwrap();

        let file = File::create(dir.join("part-1.jsonl.gz")).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(SHARD_B.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn test_load_plain_and_gzip_shards() {
        let dir = TempDir::new().unwrap();
        write_corpus(dir.path());

        let ids = wanted(&["p1", "p3"]);
        let corpus = ParagraphCorpus::load_filtered(dir.path(), &ids).unwrap();

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get("p1"), Some("Panic Room is a thriller film."));
        assert_eq!(corpus.get("p3"), Some("Filming began in 2001."));
        assert!(corpus.get("p2").is_none());
    }

    #[test]
    fn test_gzip_shard_without_suffix() {
        let dir = TempDir::new().unwrap();
        let file = File::create(dir.path().join("paragraph-corpus-split-0")).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(SHARD_A.as_bytes()).unwrap();
        encoder.finish().unwrap();
        fs::write(dir.path().join("paragraph-corpus-split-1"), SHARD_B).unwrap();

        let ids = wanted(&["p1", "p3"]);
        let corpus = ParagraphCorpus::load_filtered(dir.path(), &ids).unwrap();

        assert_eq!(corpus.get("p1"), Some("Panic Room is a thriller film."));
        assert_eq!(corpus.get("p3"), Some("Filming began in 2001."));
        assert_eq!(corpus.path.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_empty_shard() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("empty"), "").unwrap();

        let corpus = ParagraphCorpus::load_filtered(dir.path(), &wanted(&["p1"])).unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_missing_ids() {
        let dir = TempDir::new().unwrap();
        write_corpus(dir.path());

        let ids = wanted(&["p1", "p9", "p7"]);
        let corpus = ParagraphCorpus::load_filtered(dir.path(), &ids).unwrap();
        assert_eq!(corpus.missing(&ids), vec!["p7", "p9"]);
    }

    #[test]
    fn test_invalid_corpus_path() {
        let result = ParagraphCorpus::load_filtered(Path::new("/nonexistent/corpus"), &wanted(&[]));
        assert!(matches!(result, Err(DistanceError::InvalidCorpusPath(_))));
    }

    #[test]
    fn test_malformed_shard() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.jsonl"), "{not json}\n").unwrap();

        let result = ParagraphCorpus::load_filtered(dir.path(), &wanted(&["p1"]));
        assert!(matches!(result, Err(DistanceError::Serialization(_))));
    }
}
