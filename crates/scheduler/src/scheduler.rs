//! `mark_for_rendering`/`mark_for_update` (spec.md §4.6): the two entry
//! points a `drawing_tree` mutator calls after changing an item, turning
//! a local edit into ancestor cache invalidation and a host signal.

use cache::CacheRegistry;
use drawing_tree::{ItemKey, ItemState, Tree};
use scene_protocol::RenderMode;

use crate::callbacks::SchedulerCallbacks;

/// Computes `item`'s dirty region (`bbox` in outline mode, else
/// `drawbox`), marks it dirty on every cache tile from `item` up to the
/// root, and emits `needs_redraw`.
pub fn mark_for_rendering(
    tree: &Tree,
    registry: &mut CacheRegistry<ItemKey>,
    item: ItemKey,
    render_mode: RenderMode,
    callbacks: &mut dyn SchedulerCallbacks,
) {
    let Some(it) = tree.get(item) else { return };
    let rect = if render_mode.is_outline() { it.bbox } else { it.drawbox };
    if rect.is_empty() {
        return;
    }

    let mut current = Some(item);
    while let Some(key) = current {
        if let Some(tile) = registry.tile_mut(key) {
            tile.mark_dirty(rect);
        }
        current = tree.get(key).and_then(|i| i.parent);
    }

    callbacks.needs_redraw(rect);
}

/// Clears `flags` from `item`'s state (setting `item.propagate` first
/// when `propagate` is set), then recurses to the parent with
/// `propagate = false`; once an item with no parent is reached, emits
/// `needs_update` for that root item.
pub fn mark_for_update(
    tree: &mut Tree,
    item: ItemKey,
    flags: ItemState,
    propagate: bool,
    callbacks: &mut dyn SchedulerCallbacks,
) {
    let Some(it) = tree.get_mut(item) else { return };
    if propagate {
        it.propagate = true;
    }
    it.state.remove(flags);
    let parent = it.parent;

    match parent {
        Some(parent_key) => mark_for_update(tree, parent_key, flags, false, callbacks),
        None => callbacks.needs_update(item),
    }
}
