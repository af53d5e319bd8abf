//! Tree distance between paragraphs and the per-page batch computation.
//!
//! The distance between two sections is the number of edges on the path that
//! joins them in the page's section tree:
//!
//! ```text
//! d(s1, s2) = depth(s1) + depth(s2) - 2 * depth(lca(s1, s2))
//! ```
//!
//! # Example
//!
//! ```
//! use section_distance::{distance, SectionTree};
//!
//! let tree = SectionTree::build(["Page/A/B", "Page/A/C"]).unwrap();
//! let d = distance("Page/A/B", "Page/A/C", Some(&tree)).unwrap();
//! assert_eq!(d, 2.0);
//! ```

use crate::error::{DistanceError, PairSide, Result};
use crate::lca::LcaResolver;
use crate::tree::SectionTree;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Section label of every paragraph, grouped by page: `page → paragraph → section path`.
pub type PageLabels = BTreeMap<String, BTreeMap<String, String>>;

/// An unordered paragraph pair, stored in enumeration order.
pub type ParagraphPair = (String, String);

/// Distances of one page's paragraph pairs.
pub type PairDistances = BTreeMap<ParagraphPair, f64>;

/// Distances of every page: `page → (paragraph, paragraph) → distance`.
pub type PageDistances = BTreeMap<String, PairDistances>;

/// Distance between two full section paths of the page described by `tree`.
///
/// Fails with [`DistanceError::RootMissing`] when no tree is given, and with
/// [`DistanceError::SectionNotFound`] naming the offending side when a section is
/// absent from the tree. Identical sections are at distance 0; a section and one
/// of its ancestors are at their depth difference.
pub fn distance(sec1: &str, sec2: &str, tree: Option<&SectionTree>) -> Result<f64> {
    let tree = tree.ok_or(DistanceError::RootMissing)?;

    let n1 = tree
        .find_section(sec1)
        .ok_or_else(|| not_found(PairSide::First, sec1))?;
    let n2 = tree
        .find_section(sec2)
        .ok_or_else(|| not_found(PairSide::Second, sec2))?;

    // Both nodes were found from the root, so an LCA always exists.
    let lca = LcaResolver::new(tree)
        .lca(tree.root(), n1, n2)
        .ok_or_else(|| not_found(PairSide::First, sec1))?;

    Ok(tree.depth(n1) as f64 + tree.depth(n2) as f64 - 2.0 * tree.depth(lca) as f64)
}

fn not_found(which: PairSide, path: &str) -> DistanceError {
    DistanceError::SectionNotFound {
        which,
        path: path.to_string(),
    }
}

/// Every unordered pair of distinct items, each pair exactly once.
pub fn unordered_pairs<T>(items: &[T]) -> impl Iterator<Item = (&T, &T)> {
    items
        .iter()
        .enumerate()
        .flat_map(move |(i, a)| items[i + 1..].iter().map(move |b| (a, b)))
}

/// What to do with a page when one of its pairs fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairErrorPolicy {
    /// Record the failed pair and keep the rest of the page.
    #[default]
    Skip,
    /// Drop the whole page on the first failed pair.
    Abort,
}

impl FromStr for PairErrorPolicy {
    type Err = DistanceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(PairErrorPolicy::Skip),
            "abort" => Ok(PairErrorPolicy::Abort),
            other => Err(DistanceError::Config(format!(
                "Unknown pair error policy '{}', expected 'skip' or 'abort'",
                other
            ))),
        }
    }
}

impl fmt::Display for PairErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairErrorPolicy::Skip => write!(f, "skip"),
            PairErrorPolicy::Abort => write!(f, "abort"),
        }
    }
}

/// A pair whose distance could not be computed.
#[derive(Debug)]
pub struct PairFailure {
    pub page: String,
    pub pair: ParagraphPair,
    pub error: DistanceError,
}

/// A page that produced no distance table.
#[derive(Debug)]
pub struct PageFailure {
    pub page: String,
    /// The pair that aborted the page, if the failure was not in tree construction.
    pub pair: Option<ParagraphPair>,
    pub error: DistanceError,
}

/// Result of a batch run over many pages.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Distance tables of all pages that completed.
    pub distances: PageDistances,
    /// Pages skipped entirely.
    pub page_failures: Vec<PageFailure>,
    /// Individual pairs skipped under [`PairErrorPolicy::Skip`].
    pub pair_failures: Vec<PairFailure>,
}

impl BatchOutcome {
    /// Number of pages with a distance table.
    pub fn page_count(&self) -> usize {
        self.distances.len()
    }

    /// Number of computed pair distances across all pages.
    pub fn pair_count(&self) -> usize {
        self.distances.values().map(BTreeMap::len).sum()
    }

    /// Whether every page and pair succeeded.
    pub fn is_clean(&self) -> bool {
        self.page_failures.is_empty() && self.pair_failures.is_empty()
    }
}

/// Computes paragraph pair distances page by page.
#[derive(Debug, Clone)]
pub struct DistanceEngine {
    policy: PairErrorPolicy,
    progress_every: usize,
}

impl Default for DistanceEngine {
    fn default() -> Self {
        Self {
            policy: PairErrorPolicy::default(),
            progress_every: 1000,
        }
    }
}

impl DistanceEngine {
    /// Create an engine that skips failed pairs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pair error policy.
    pub fn with_policy(mut self, policy: PairErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Log progress every `pages` pages (0 disables progress events).
    pub fn with_progress_every(mut self, pages: usize) -> Self {
        self.progress_every = pages;
        self
    }

    /// The configured pair error policy.
    pub fn policy(&self) -> PairErrorPolicy {
        self.policy
    }

    /// Distance between two sections of the page described by `tree`.
    pub fn distance(&self, sec1: &str, sec2: &str, tree: Option<&SectionTree>) -> Result<f64> {
        distance(sec1, sec2, tree)
    }

    /// Compute the distance table for one page.
    ///
    /// Builds one tree from the distinct sections of `paragraphs`, then scores every
    /// unordered pair of distinct paragraphs. Failed pairs are returned alongside
    /// the table under [`PairErrorPolicy::Skip`] and end the page under
    /// [`PairErrorPolicy::Abort`].
    pub fn page_distances(
        &self,
        page: &str,
        paragraphs: &BTreeMap<String, String>,
    ) -> std::result::Result<(PairDistances, Vec<PairFailure>), PageFailure> {
        let sections: BTreeSet<&str> = paragraphs.values().map(String::as_str).collect();
        let tree = SectionTree::build(sections).map_err(|error| PageFailure {
            page: page.to_string(),
            pair: None,
            error,
        })?;
        if tree.page_id() != page {
            return Err(PageFailure {
                page: page.to_string(),
                pair: None,
                error: DistanceError::InconsistentPageRoot {
                    expected: page.to_string(),
                    found: tree.page_id().to_string(),
                },
            });
        }

        debug!(
            page,
            sections = tree.len(),
            max_depth = tree.max_depth(),
            "Built section tree"
        );

        self.score_pairs(page, paragraphs, Some(&tree))
    }

    /// Score every unordered pair of `paragraphs` against an already built tree.
    pub fn score_pairs(
        &self,
        page: &str,
        paragraphs: &BTreeMap<String, String>,
        tree: Option<&SectionTree>,
    ) -> std::result::Result<(PairDistances, Vec<PairFailure>), PageFailure> {
        let ids: Vec<&String> = paragraphs.keys().collect();
        let mut table = PairDistances::new();
        let mut failures = Vec::new();

        for (&p1, &p2) in unordered_pairs(&ids) {
            let pair = (p1.clone(), p2.clone());
            match distance(&paragraphs[p1], &paragraphs[p2], tree) {
                Ok(d) => {
                    table.insert(pair, d);
                }
                Err(error) => match self.policy {
                    PairErrorPolicy::Skip => {
                        warn!(page, para1 = %p1, para2 = %p2, %error, "Skipping paragraph pair");
                        failures.push(PairFailure {
                            page: page.to_string(),
                            pair,
                            error,
                        });
                    }
                    PairErrorPolicy::Abort => {
                        return Err(PageFailure {
                            page: page.to_string(),
                            pair: Some(pair),
                            error,
                        });
                    }
                },
            }
        }

        Ok((table, failures))
    }

    /// Compute distance tables for every page in `labels`.
    ///
    /// A failing page never stops the others; it is recorded in
    /// [`BatchOutcome::page_failures`].
    pub fn batch_page_distances(&self, labels: &PageLabels) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let total = labels.len();

        for (done, (page, paragraphs)) in labels.iter().enumerate() {
            match self.page_distances(page, paragraphs) {
                Ok((table, failures)) => {
                    outcome.distances.insert(page.clone(), table);
                    outcome.pair_failures.extend(failures);
                }
                Err(failure) => {
                    warn!(page = %failure.page, error = %failure.error, "Skipping page");
                    outcome.page_failures.push(failure);
                }
            }

            if self.progress_every > 0 && (done + 1) % self.progress_every == 0 {
                info!(pages = done + 1, total, "Computing paragraph distances");
            }
        }

        info!(
            pages = outcome.page_count(),
            pairs = outcome.pair_count(),
            failed_pages = outcome.page_failures.len(),
            failed_pairs = outcome.pair_failures.len(),
            "Finished paragraph distances"
        );

        outcome
    }
}
