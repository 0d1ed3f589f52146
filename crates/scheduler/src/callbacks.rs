//! The `Drawing`-owned callback list (spec.md §6's `signal_needs_redraw`,
//! `signal_needs_update`, `signal_item_deleted`): synchronous fan-out to
//! every host observer connected to a `Drawing`.

use drawing_tree::ItemKey;
use geom::IntRect;

/// A host observer of scheduler events. Every method call completes
/// synchronously before the triggering mutator returns, per spec.md §5's
/// "no operation suspends".
pub trait SchedulerCallbacks {
    /// `rect` needs to be redrawn; emitted from `mark_for_rendering`.
    fn needs_redraw(&mut self, rect: IntRect);
    /// Propagation from `mark_for_update` reached an item with no
    /// parent; the item passed is that root, not the originally-mutated
    /// item.
    fn needs_update(&mut self, item: ItemKey);
    /// `item` was removed from its tree.
    fn item_deleted(&mut self, item: ItemKey);
}

/// Fans every event out to every subscriber, in registration order.
#[derive(Default)]
pub struct CallbackList {
    subscribers: Vec<Box<dyn SchedulerCallbacks>>,
}

impl CallbackList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, callback: Box<dyn SchedulerCallbacks>) {
        self.subscribers.push(callback);
    }
}

impl SchedulerCallbacks for CallbackList {
    fn needs_redraw(&mut self, rect: IntRect) {
        for subscriber in &mut self.subscribers {
            subscriber.needs_redraw(rect);
        }
    }

    fn needs_update(&mut self, item: ItemKey) {
        for subscriber in &mut self.subscribers {
            subscriber.needs_update(item);
        }
    }

    fn item_deleted(&mut self, item: ItemKey) {
        for subscriber in &mut self.subscribers {
            subscriber.item_deleted(item);
        }
    }
}
