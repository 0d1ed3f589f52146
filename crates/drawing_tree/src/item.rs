//! The polymorphic `DrawingItem` node (spec.md §3, §9): a common header
//! plus a tagged variant. Generalizes the teacher's flat
//! `Root`/`Branch`/`Leaf` enum-with-owned-`Vec<children>` shape to a
//! `slotmap` arena, per spec.md §9's explicit call for "an owned ordered
//! sequence on the parent" with a back-reference that "becomes invalid
//! when detached" — the arena+handle pattern sidesteps the
//! `Rc<RefCell<..>>` parent-cycle problem the source's intrusive list had.

use std::rc::Rc;

use filters::FilterPipeline;
use geom::{Affine2D, IntRect, RectF};
use scene_protocol::{PathVector, Style, Surface};
use slotmap::new_key_type;

use crate::state::ItemState;

new_key_type! {
    /// Opaque handle into a `Tree`'s arena. Stale once the item is
    /// destroyed; slotmap's generational index means a reused slot never
    /// aliases an old handle.
    pub struct ItemKey;
}

/// What role a child plays relative to its `parent` (spec.md §3: "a
/// discriminator field marks the child role").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildRole {
    Regular,
    Clip,
    Mask,
}

/// Group-specific data (spec.md §4.1's Group row).
pub struct GroupData {
    /// Extra transform applied only to children, composed before `ctm`.
    pub child_transform: Option<Affine2D>,
    /// When false, `pick` returns the group itself instead of descending
    /// into whichever child was hit.
    pub pick_children: bool,
}

impl Default for GroupData {
    fn default() -> Self {
        Self {
            child_transform: None,
            pick_children: true,
        }
    }
}

/// A throttled pick memo (spec.md §4.5: "if the last query exceeded 10 ms,
/// cache the answer and skip the next `query_time / 5000` picks").
#[derive(Debug, Clone, Copy)]
pub struct PickMemo {
    pub point: (f64, f64),
    pub tolerance: f64,
    pub hit: bool,
    pub reuse_remaining: u32,
}

pub struct ShapeData {
    pub path: Option<Rc<dyn PathVector>>,
    pub style: Style,
    /// Marker sub-items rendered after the path itself; bbox-unioned with
    /// the shape's own outline, per spec.md §4.1.
    pub markers: Vec<ItemKey>,
    pub pick_memo: Option<PickMemo>,
}

impl Default for ShapeData {
    fn default() -> Self {
        Self {
            path: None,
            style: Style::default(),
            markers: Vec::new(),
            pick_memo: None,
        }
    }
}

pub struct ImageData {
    /// The embedded premultiplied-ARGB buffer, handed to the `Context` via
    /// `set_source_surface` (spec.md §4.1's Image `render_variant`).
    pub pixbuf: Option<Rc<dyn Surface>>,
    /// Image-local rectangle the pixbuf is mapped onto, before `ctm`.
    pub rect: RectF,
}

impl Default for ImageData {
    fn default() -> Self {
        Self {
            pixbuf: None,
            rect: RectF::EMPTY,
        }
    }
}

/// A single glyph's outline (spec.md §4.1's Glyphs row): one path, styled
/// like a shape but with no stroke-miter expansion of its own (the glyph
/// outline is exact).
pub struct GlyphsData {
    pub path: Option<Rc<dyn PathVector>>,
    pub style: Style,
}

impl Default for GlyphsData {
    fn default() -> Self {
        Self {
            path: None,
            style: Style::default(),
        }
    }
}

/// Text is a specialization of Group whose `render_variant` aggregates
/// its glyph children's paths into one path before filling/stroking once
/// (spec.md §9).
#[derive(Default)]
pub struct TextData {
    pub style: Style,
}

pub enum ItemVariant {
    Group(GroupData),
    Shape(ShapeData),
    Image(ImageData),
    Text(TextData),
    Glyphs(GlyphsData),
}

impl ItemVariant {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ItemVariant::Group(_) => "group",
            ItemVariant::Shape(_) => "shape",
            ItemVariant::Image(_) => "image",
            ItemVariant::Text(_) => "text",
            ItemVariant::Glyphs(_) => "glyphs",
        }
    }

    /// True for variants whose own content is nothing without a filter —
    /// spec.md §4.1 step 10: "if the item needs to draw itself
    /// (non-group, or group with a filter) mark its drawbox...".
    pub fn draws_own_content(&self, has_filter: bool) -> bool {
        !matches!(self, ItemVariant::Group(_)) || has_filter
    }
}

pub struct DrawingItem {
    pub parent: Option<ItemKey>,
    pub role: ChildRole,
    pub children: Vec<ItemKey>,
    pub clip: Option<ItemKey>,
    pub mask: Option<ItemKey>,
    pub filter: Option<FilterPipeline>,
    pub transform: Option<Affine2D>,
    pub ctm: Affine2D,
    pub opacity: f64,
    pub visible: bool,
    pub sensitive: bool,
    pub state: ItemState,
    pub propagate: bool,
    pub bbox: IntRect,
    pub drawbox: IntRect,
    pub item_bbox: RectF,
    pub cached: bool,
    pub cache_persistent: bool,
    pub cache_score: f64,
    pub user_data: u64,
    pub key_id: Option<u64>,
    pub variant: ItemVariant,
}

impl DrawingItem {
    pub fn new(variant: ItemVariant) -> Self {
        Self {
            parent: None,
            role: ChildRole::Regular,
            children: Vec::new(),
            clip: None,
            mask: None,
            filter: None,
            transform: None,
            ctm: Affine2D::IDENTITY,
            opacity: 1.0,
            visible: true,
            sensitive: true,
            state: ItemState::empty(),
            propagate: false,
            bbox: IntRect::EMPTY,
            drawbox: IntRect::EMPTY,
            item_bbox: RectF::EMPTY,
            cached: false,
            cache_persistent: false,
            cache_score: 0.0,
            user_data: 0,
            key_id: None,
            variant,
        }
    }

    pub fn local_transform(&self) -> Affine2D {
        self.transform.unwrap_or(Affine2D::IDENTITY)
    }

    pub fn is_group_like(&self) -> bool {
        matches!(self.variant, ItemVariant::Group(_) | ItemVariant::Text(_))
    }
}
