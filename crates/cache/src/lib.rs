//! Per-item rasterization caching (spec.md §4.3, component C2): a
//! `CacheTile` stores a rendered rectangle and tracks which sub-regions
//! are still dirty; a `CacheRegistry`, owned by the `Drawing` root, tracks
//! every tile against a shared byte budget and evicts the lowest-scoring
//! ones when over budget.

mod dirty;
mod error;
mod registry;
mod tile;

pub use dirty::{DirtyRegion, CELL_SIZE};
pub use error::CacheError;
pub use registry::{compute_score, CacheRegistry, DEFAULT_SCORE_THRESHOLD};
pub use tile::CacheTile;
