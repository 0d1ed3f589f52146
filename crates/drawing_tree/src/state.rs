//! The per-item derived-data bitset (spec.md §3: "`state`: bitset of
//! `{BBOX, DRAWBOX, CACHE_READY, PICK_READY, RENDER_READY}`").

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ItemState: u8 {
        /// `bbox` is consistent with current attributes and ancestors.
        const BBOX = 0b0_0001;
        /// `drawbox` is consistent (implies `BBOX`; callers clear both
        /// together, but the bit is tracked separately since `drawbox`
        /// depends on clip/mask/filter state that can change without the
        /// item's own geometry changing).
        const DRAWBOX = 0b0_0010;
        /// The cache score and candidate-list membership reflect the
        /// current drawbox/filter/clip.
        const CACHE_READY = 0b0_0100;
        /// The item is ready to answer `pick` without recomputing bbox.
        const PICK_READY = 0b0_1000;
        /// The item's own content (not children) is known not to need
        /// repainting before the next `render`.
        const RENDER_READY = 0b1_0000;
    }
}

impl Default for ItemState {
    fn default() -> Self {
        ItemState::empty()
    }
}
