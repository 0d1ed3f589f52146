//! The item arena and the mutation operations of spec.md §4.1: adopt/
//! reorder children, replace clip/mask, and the attribute setters that
//! mark an item for rendering (with the old bbox) then for update.

use geom::{Affine2D, RectF};
use slotmap::SlotMap;

use crate::error::TreeError;
use crate::item::{ChildRole, DrawingItem, ItemKey, ItemVariant};
use crate::state::ItemState;

/// Every derived-data bit an attribute mutation can invalidate; `set_*`
/// setters clear these on the mutated item and every ancestor up to the
/// root, per spec.md §4.6's `mark_for_update` propagation rule.
fn derived_bits() -> ItemState {
    ItemState::BBOX | ItemState::DRAWBOX | ItemState::CACHE_READY | ItemState::PICK_READY
}

pub struct Tree {
    arena: SlotMap<ItemKey, DrawingItem>,
    root: ItemKey,
}

impl Tree {
    pub fn new(root_variant: ItemVariant) -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(DrawingItem::new(root_variant));
        Self { arena, root }
    }

    pub fn root(&self) -> ItemKey {
        self.root
    }

    pub fn get(&self, key: ItemKey) -> Option<&DrawingItem> {
        self.arena.get(key)
    }

    pub fn get_mut(&mut self, key: ItemKey) -> Option<&mut DrawingItem> {
        self.arena.get_mut(key)
    }

    pub fn contains(&self, key: ItemKey) -> bool {
        self.arena.contains_key(key)
    }

    pub fn insert(&mut self, variant: ItemVariant) -> ItemKey {
        self.arena.insert(DrawingItem::new(variant))
    }

    /// True when `ancestor` is `node` or lies on `node`'s parent chain —
    /// used to reject a clip/mask attachment that would create a cycle
    /// (spec.md §9: "a clip must not be an ancestor of its host").
    fn is_ancestor_of(&self, ancestor: ItemKey, mut node: ItemKey) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.arena.get(node).and_then(|item| item.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Clears `DERIVED_BITS` on `key` and walks ancestors clearing the
    /// subset that depends on a descendant (`BBOX`/`DRAWBOX`/
    /// `CACHE_READY`, not `PICK_READY` which only depends on the item's
    /// own bbox), matching spec.md §4.6's upward `mark_for_update`.
    fn invalidate_derived(&mut self, key: ItemKey) {
        if let Some(item) = self.arena.get_mut(key) {
            item.state.remove(derived_bits());
        }
        let mut cur = self.arena.get(key).and_then(|i| i.parent);
        while let Some(k) = cur {
            if let Some(item) = self.arena.get_mut(k) {
                item.state
                    .remove(ItemState::BBOX | ItemState::DRAWBOX | ItemState::CACHE_READY);
                cur = item.parent;
            } else {
                break;
            }
        }
    }

    fn attach_child(&mut self, host: ItemKey, child: ItemKey, at_front: bool) -> Result<(), TreeError> {
        if !self.arena.contains_key(host) {
            return Err(TreeError::NoSuchItem);
        }
        let child_item = self.arena.get(child).ok_or(TreeError::NoSuchItem)?;
        if child_item.parent.is_some() {
            return Err(TreeError::AlreadyHasParent);
        }
        let host_propagate = self.arena[host].propagate;

        let host_item = &mut self.arena[host];
        if at_front {
            host_item.children.insert(0, child);
        } else {
            host_item.children.push(child);
        }

        let child_item = &mut self.arena[child];
        child_item.parent = Some(host);
        child_item.role = ChildRole::Regular;
        if host_propagate {
            child_item.propagate = true;
        }

        self.invalidate_derived(host);
        Ok(())
    }

    pub fn append_child(&mut self, host: ItemKey, child: ItemKey) -> Result<(), TreeError> {
        self.attach_child(host, child, false)
    }

    pub fn prepend_child(&mut self, host: ItemKey, child: ItemKey) -> Result<(), TreeError> {
        self.attach_child(host, child, true)
    }

    pub fn set_z_order(&mut self, host: ItemKey, child: ItemKey, index: usize) -> Result<(), TreeError> {
        let host_item = self.arena.get_mut(host).ok_or(TreeError::NoSuchItem)?;
        let pos = host_item
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NoSuchItem)?;
        host_item.children.remove(pos);
        let index = index.min(host_item.children.len());
        host_item.children.insert(index, child);
        self.invalidate_derived(host);
        Ok(())
    }

    pub fn clear_children(&mut self, host: ItemKey) -> Result<(), TreeError> {
        let children = {
            let host_item = self.arena.get_mut(host).ok_or(TreeError::NoSuchItem)?;
            std::mem::take(&mut host_item.children)
        };
        for child in children {
            self.destroy(child);
        }
        self.invalidate_derived(host);
        Ok(())
    }

    fn replace_sub_item(
        &mut self,
        host: ItemKey,
        new_item: Option<ItemKey>,
        role: ChildRole,
        get_slot: impl Fn(&mut DrawingItem) -> &mut Option<ItemKey>,
    ) -> Result<(), TreeError> {
        if !self.arena.contains_key(host) {
            return Err(TreeError::NoSuchItem);
        }
        if let Some(new_key) = new_item {
            if !self.arena.contains_key(new_key) {
                return Err(TreeError::NoSuchItem);
            }
            if self.is_ancestor_of(new_key, host) {
                return Err(TreeError::ClipMaskCycle);
            }
        }

        let old = get_slot(&mut self.arena[host]).take();
        if let Some(old_key) = old {
            self.destroy(old_key);
        }
        if let Some(new_key) = new_item {
            let item = &mut self.arena[new_key];
            item.parent = Some(host);
            item.role = role;
        }
        *get_slot(&mut self.arena[host]) = new_item;
        self.invalidate_derived(host);
        Ok(())
    }

    pub fn set_clip(&mut self, host: ItemKey, clip: Option<ItemKey>) -> Result<(), TreeError> {
        self.replace_sub_item(host, clip, ChildRole::Clip, |item| &mut item.clip)
    }

    pub fn set_mask(&mut self, host: ItemKey, mask: Option<ItemKey>) -> Result<(), TreeError> {
        self.replace_sub_item(host, mask, ChildRole::Mask, |item| &mut item.mask)
    }

    pub fn set_transform(&mut self, key: ItemKey, transform: Option<Affine2D>) -> Result<(), TreeError> {
        let item = self.arena.get_mut(key).ok_or(TreeError::NoSuchItem)?;
        if item.transform == transform {
            return Ok(());
        }
        item.transform = transform;
        self.invalidate_derived(key);
        Ok(())
    }

    pub fn set_opacity(&mut self, key: ItemKey, opacity: f64) -> Result<(), TreeError> {
        let opacity = opacity.clamp(0.0, 1.0);
        let item = self.arena.get_mut(key).ok_or(TreeError::NoSuchItem)?;
        if (item.opacity - opacity).abs() < f64::EPSILON {
            return Ok(());
        }
        item.opacity = opacity;
        // spec.md §4.1 routes every attribute setter through the same
        // mark-for-render/mark-for-update cycle, even attributes like
        // opacity that don't change bbox geometry: the conservative
        // re-derivation is what lets a parent's cache be re-dirtied
        // uniformly rather than each setter reasoning about exactly which
        // derived bit it can leave alone.
        self.invalidate_derived(key);
        Ok(())
    }

    pub fn set_visible(&mut self, key: ItemKey, visible: bool) -> Result<(), TreeError> {
        let item = self.arena.get_mut(key).ok_or(TreeError::NoSuchItem)?;
        if item.visible == visible {
            return Ok(());
        }
        item.visible = visible;
        self.invalidate_derived(key);
        Ok(())
    }

    pub fn set_sensitive(&mut self, key: ItemKey, sensitive: bool) -> Result<(), TreeError> {
        let item = self.arena.get_mut(key).ok_or(TreeError::NoSuchItem)?;
        item.sensitive = sensitive;
        Ok(())
    }

    pub fn set_item_bbox(&mut self, key: ItemKey, rect: RectF) -> Result<(), TreeError> {
        let item = self.arena.get_mut(key).ok_or(TreeError::NoSuchItem)?;
        if item.item_bbox == rect {
            return Ok(());
        }
        item.item_bbox = rect;
        self.invalidate_derived(key);
        Ok(())
    }

    /// `persistent=true` is sticky: once requested, a later
    /// `set_cached(false, false)` cannot turn caching off, per spec.md
    /// §4.1.
    pub fn set_cached(&mut self, key: ItemKey, on: bool, persistent: bool) -> Result<(), TreeError> {
        let item = self.arena.get_mut(key).ok_or(TreeError::NoSuchItem)?;
        if item.cache_persistent && !on && !persistent {
            return Ok(());
        }
        item.cached = on;
        if persistent && on {
            item.cache_persistent = true;
        }
        Ok(())
    }

    /// Destroys `key` and every owned descendant (children, clip, mask),
    /// detaching it from its parent first. Matches spec.md §3's ownership
    /// invariant: "destroying an item destroys all of them transitively."
    pub fn destroy(&mut self, key: ItemKey) {
        let Some(item) = self.arena.get_mut(key) else {
            return;
        };
        let children = std::mem::take(&mut item.children);
        let clip = item.clip.take();
        let mask = item.mask.take();
        let parent = item.parent.take();
        let markers = match &mut item.variant {
            ItemVariant::Shape(shape) => std::mem::take(&mut shape.markers),
            _ => Vec::new(),
        };

        for child in children.into_iter().chain(markers) {
            self.destroy(child);
        }
        if let Some(clip_key) = clip {
            self.destroy(clip_key);
        }
        if let Some(mask_key) = mask {
            self.destroy(mask_key);
        }
        if let Some(parent_key) = parent {
            if let Some(parent_item) = self.arena.get_mut(parent_key) {
                parent_item.children.retain(|&c| c != key);
                if parent_item.clip == Some(key) {
                    parent_item.clip = None;
                }
                if parent_item.mask == Some(key) {
                    parent_item.mask = None;
                }
                if let ItemVariant::Shape(shape) = &mut parent_item.variant {
                    shape.markers.retain(|&c| c != key);
                }
            }
        }
        self.arena.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{GroupData, ShapeData};

    fn group(tree: &mut Tree) -> ItemKey {
        tree.insert(ItemVariant::Group(GroupData::default()))
    }

    fn shape(tree: &mut Tree) -> ItemKey {
        tree.insert(ItemVariant::Shape(ShapeData::default()))
    }

    #[test]
    fn append_child_sets_parent_and_order() {
        let mut tree = Tree::new(ItemVariant::Group(GroupData::default()));
        let root = tree.root();
        let a = shape(&mut tree);
        let b = shape(&mut tree);
        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();
        assert_eq!(tree.get(root).unwrap().children, vec![a, b]);
        assert_eq!(tree.get(a).unwrap().parent, Some(root));
    }

    #[test]
    fn append_child_twice_is_rejected() {
        let mut tree = Tree::new(ItemVariant::Group(GroupData::default()));
        let root = tree.root();
        let other = group(&mut tree);
        let a = shape(&mut tree);
        tree.append_child(root, a).unwrap();
        assert_eq!(tree.append_child(other, a), Err(TreeError::AlreadyHasParent));
    }

    #[test]
    fn set_clip_rejects_ancestor_cycle() {
        let mut tree = Tree::new(ItemVariant::Group(GroupData::default()));
        let root = tree.root();
        let child = group(&mut tree);
        tree.append_child(root, child).unwrap();
        // root cannot become child's clip: root is an ancestor of child.
        assert_eq!(tree.set_clip(child, Some(root)), Err(TreeError::ClipMaskCycle));
    }

    #[test]
    fn set_clip_replaces_and_destroys_old() {
        let mut tree = Tree::new(ItemVariant::Group(GroupData::default()));
        let root = tree.root();
        let clip_a = shape(&mut tree);
        let clip_b = shape(&mut tree);
        tree.set_clip(root, Some(clip_a)).unwrap();
        assert_eq!(tree.get(root).unwrap().clip, Some(clip_a));
        tree.set_clip(root, Some(clip_b)).unwrap();
        assert!(!tree.contains(clip_a));
        assert_eq!(tree.get(root).unwrap().clip, Some(clip_b));
    }

    #[test]
    fn destroy_removes_children_transitively() {
        let mut tree = Tree::new(ItemVariant::Group(GroupData::default()));
        let root = tree.root();
        let mid = group(&mut tree);
        let leaf = shape(&mut tree);
        tree.append_child(root, mid).unwrap();
        tree.append_child(mid, leaf).unwrap();
        tree.destroy(mid);
        assert!(!tree.contains(mid));
        assert!(!tree.contains(leaf));
        assert!(tree.get(root).unwrap().children.is_empty());
    }

    #[test]
    fn set_cached_persistent_is_sticky() {
        let mut tree = Tree::new(ItemVariant::Group(GroupData::default()));
        let root = tree.root();
        tree.set_cached(root, true, true).unwrap();
        tree.set_cached(root, false, false).unwrap();
        assert!(tree.get(root).unwrap().cached);
    }
}
