//! Process-wide (per-`Drawing`) cache bookkeeping: the set of items with an
//! active cache tile, the score-ordered candidate list, and budget-driven
//! eviction. Generic over `Owner` so this crate has no dependency on the
//! drawing tree's item-handle type, matching the teacher's
//! `TileLifecycleManager<Owner, Tile>` split between tile mechanics and the
//! identity of whoever owns a tile.

use std::collections::HashMap;
use std::hash::Hash;

use geom::IntRect;
use log::debug;
use scene_protocol::SurfaceFactory;

use crate::error::CacheError;
use crate::tile::CacheTile;

/// Minimum cache score for an item to be considered a caching candidate at
/// all, per spec.md §4.3: "Items whose score is below the threshold are
/// not cached even when space is available."
pub const DEFAULT_SCORE_THRESHOLD: f64 = 1.0;

/// `score = drawbox_area × (filter_complexity × filter_expansion) +
/// (clip ? 0.5 × clip.bbox_area : 0) + mask.score`.
pub fn compute_score(
    drawbox_area: i64,
    filter_complexity: f64,
    filter_expansion: f64,
    clip_bbox_area: Option<i64>,
    mask_score: f64,
) -> f64 {
    let base = drawbox_area as f64 * (filter_complexity * filter_expansion).max(1.0);
    let clip_term = clip_bbox_area.map(|area| 0.5 * area as f64).unwrap_or(0.0);
    base + clip_term + mask_score
}

pub struct CacheRegistry<Owner> {
    budget_bytes: i64,
    threshold: f64,
    tiles: HashMap<Owner, CacheTile>,
    candidate_scores: HashMap<Owner, f64>,
}

impl<Owner> CacheRegistry<Owner>
where
    Owner: Eq + Hash + Copy + std::fmt::Debug,
{
    pub fn new(budget_bytes: i64) -> Self {
        Self {
            budget_bytes,
            threshold: DEFAULT_SCORE_THRESHOLD,
            tiles: HashMap::new(),
            candidate_scores: HashMap::new(),
        }
    }

    pub fn set_budget_bytes(&mut self, budget_bytes: i64) {
        self.budget_bytes = budget_bytes;
        self.evict_to_budget();
    }

    pub fn budget_bytes(&self) -> i64 {
        self.budget_bytes
    }

    pub fn total_bytes(&self) -> i64 {
        self.tiles.values().map(CacheTile::byte_size).sum()
    }

    /// Updates `owner`'s candidate-list membership after a score
    /// recomputation in `update`. Does not itself allocate or evict a
    /// tile — that happens in `register_tile`.
    pub fn update_candidate_score(&mut self, owner: Owner, score: f64) {
        if score >= self.threshold {
            self.candidate_scores.insert(owner, score);
        } else {
            self.candidate_scores.remove(&owner);
        }
    }

    pub fn is_candidate(&self, owner: Owner) -> bool {
        self.candidate_scores.contains_key(&owner)
    }

    pub fn has_tile(&self, owner: Owner) -> bool {
        self.tiles.contains_key(&owner)
    }

    pub fn tile(&self, owner: Owner) -> Option<&CacheTile> {
        self.tiles.get(&owner)
    }

    pub fn tile_mut(&mut self, owner: Owner) -> Option<&mut CacheTile> {
        self.tiles.get_mut(&owner)
    }

    /// Allocates and registers a fresh tile for `owner` sized to `region`,
    /// evicting lower-scoring tiles if the budget is exceeded afterward.
    /// Returns `Err` only on allocation failure, which is a transient
    /// resource error the caller absorbs per spec.md §7 (skip caching for
    /// this frame).
    pub fn allocate_tile(
        &mut self,
        owner: Owner,
        region: IntRect,
        factory: &dyn SurfaceFactory,
    ) -> Result<(), CacheError> {
        let tile = CacheTile::new(region, factory).map_err(|_| CacheError::AllocationFailed)?;
        self.tiles.insert(owner, tile);
        self.evict_to_budget();
        Ok(())
    }

    pub fn remove_tile(&mut self, owner: Owner) {
        self.tiles.remove(&owner);
    }

    /// Removes and returns `owner`'s tile so the caller can draw into its
    /// surface without holding a second borrow of the registry (needed
    /// while recursively rendering children that may themselves touch
    /// the registry). Pair with `put_tile` to put it back.
    pub fn take_tile(&mut self, owner: Owner) -> Option<CacheTile> {
        self.tiles.remove(&owner)
    }

    pub fn put_tile(&mut self, owner: Owner, tile: CacheTile) {
        self.tiles.insert(owner, tile);
    }

    /// Drops caches on the lowest-scoring items until `total_bytes() <=
    /// budget_bytes`, per spec.md §4.3. An item not currently a candidate
    /// (score fell below threshold, or the item was never scored) is
    /// evicted before any scored candidate.
    pub fn evict_to_budget(&mut self) {
        if self.total_bytes() <= self.budget_bytes {
            return;
        }
        let mut ranked: Vec<(Owner, f64)> = self
            .tiles
            .keys()
            .map(|owner| {
                let score = self
                    .candidate_scores
                    .get(owner)
                    .copied()
                    .unwrap_or(f64::MIN);
                (*owner, score)
            })
            .collect();
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        for (owner, score) in ranked {
            if self.total_bytes() <= self.budget_bytes {
                break;
            }
            debug!("evicting cache tile for {owner:?} (score {score}) over budget");
            self.tiles.remove(&owner);
        }
    }

    /// Candidate items ordered by descending score, matching spec.md
    /// §4.3's `candidate_items` list.
    pub fn ranked_candidates(&self) -> Vec<Owner> {
        let mut items: Vec<(Owner, f64)> = self
            .candidate_scores
            .iter()
            .map(|(owner, score)| (*owner, *score))
            .collect();
        items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        items.into_iter().map(|(owner, _)| owner).collect()
    }

    pub fn cached_items(&self) -> impl Iterator<Item = &Owner> {
        self.tiles.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_protocol::{ContentKind, PixelFormat, Surface, SurfaceError, SurfaceFactory};

    struct FakeSurface {
        width: u32,
        height: u32,
    }

    impl Surface for FakeSurface {
        fn format(&self) -> PixelFormat {
            PixelFormat::Argb32
        }
        fn width(&self) -> u32 {
            self.width
        }
        fn height(&self) -> u32 {
            self.height
        }
        fn stride(&self) -> usize {
            self.width as usize * 4
        }
        fn data(&mut self) -> &mut [u8] {
            &mut []
        }
        fn data_ref(&self) -> &[u8] {
            &[]
        }
        fn flush(&mut self) {}
        fn mark_dirty(&mut self) {}
    }

    struct FakeFactory;

    impl SurfaceFactory for FakeFactory {
        fn new_image(
            &self,
            _format: PixelFormat,
            width: u32,
            height: u32,
        ) -> Result<Box<dyn Surface>, SurfaceError> {
            Ok(Box::new(FakeSurface { width, height }))
        }

        fn similar(
            &self,
            _src: &dyn Surface,
            _content: ContentKind,
            width: u32,
            height: u32,
        ) -> Result<Box<dyn Surface>, SurfaceError> {
            Ok(Box::new(FakeSurface { width, height }))
        }
    }

    #[test]
    fn score_below_threshold_is_not_a_candidate() {
        let mut registry: CacheRegistry<u32> = CacheRegistry::new(i64::MAX);
        registry.update_candidate_score(1, 0.1);
        assert!(!registry.is_candidate(1));
    }

    #[test]
    fn eviction_keeps_highest_scoring_items_under_budget() {
        let factory = FakeFactory;
        // 10x10 tile = 400 bytes; budget for 2 tiles = 800.
        let mut registry: CacheRegistry<u32> = CacheRegistry::new(800);
        for id in 0..4u32 {
            registry.update_candidate_score(id, 10.0 - id as f64);
            registry
                .allocate_tile(id, IntRect::new(0, 0, 10, 10), &factory)
                .unwrap();
        }
        assert_eq!(registry.total_bytes(), 800);
        assert!(registry.has_tile(0));
        assert!(registry.has_tile(1));
        assert!(!registry.has_tile(2));
        assert!(!registry.has_tile(3));
    }

    #[test]
    fn ranked_candidates_sorted_descending() {
        let mut registry: CacheRegistry<u32> = CacheRegistry::new(i64::MAX);
        registry.update_candidate_score(1, 5.0);
        registry.update_candidate_score(2, 9.0);
        registry.update_candidate_score(3, 1.5);
        assert_eq!(registry.ranked_candidates(), vec![2, 1, 3]);
    }
}
