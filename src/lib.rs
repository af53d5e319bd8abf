//! Section Distance - pairwise paragraph distances from a page's section outline.
//!
//! Every paragraph of a page is labeled with the section path it belongs to
//! (e.g. `enwiki:Panic%20Room/Analysis/Themes`). The sections of one page form a
//! tree rooted at the page id, and the distance between two paragraphs is the
//! length of the tree path joining their sections:
//!
//! ```text
//! d(p1, p2) = depth(p1) + depth(p2) - 2 * depth(lca(p1, p2))
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use section_distance::{
//!     distance::DistanceEngine,
//!     persistence::save_distances,
//!     qrels::read_qrels,
//! };
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Group paragraph labels by page
//!     let labels = read_qrels(Path::new("train.pages.cbor-hierarchical.qrels"))?;
//!
//!     // One section tree per page, one distance per paragraph pair
//!     let outcome = DistanceEngine::new().batch_page_distances(&labels);
//!
//!     save_distances(&outcome.distances, Path::new("para_distances.json"))?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **SectionTree**: arena tree built from a page's section paths
//! - **LcaResolver**: lowest common ancestor by reachability partitioning
//! - **DistanceEngine**: tree distance and the per-page batch over paragraph pairs
//! - **qrels / corpus**: label file reader and paragraph text loader
//! - **persistence**: JSON/bincode result files

pub mod config;
pub mod corpus;
pub mod distance;
pub mod error;
pub mod lca;
pub mod logging;
pub mod persistence;
pub mod qrels;
pub mod tree;

// Re-export commonly used types
pub use config::Config;
pub use corpus::ParagraphCorpus;
pub use distance::{
    BatchOutcome, DistanceEngine, PageDistances, PageLabels, PairErrorPolicy, distance,
};
pub use error::{DistanceError, PairSide, Result};
pub use lca::LcaResolver;
pub use persistence::{load_distances, save_distances};
pub use qrels::read_qrels;
pub use tree::{NodeId, SectionTree, TreeNode};
