//! Object heap.
//!
//! Objects are reference counted. The heap keeps a weak registry of every
//! allocation so that [`Heap::teardown`] can break reference cycles (closures
//! that capture the scope holding them) when a context is disposed.

use crate::object::{JsObject, ObjectData};
use std::cell::RefCell;
use std::rc::Weak;

/// Allocation statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Objects allocated since creation
    pub total_allocated: usize,
    /// Objects still reachable from some handle
    pub live: usize,
}

/// Registry of allocated objects
#[derive(Default)]
pub struct Heap {
    objects: Vec<Weak<RefCell<ObjectData>>>,
    total_allocated: usize,
    prune_threshold: usize,
}

impl Heap {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            total_allocated: 0,
            prune_threshold: 1024,
        }
    }

    /// Allocates a new object.
    pub fn allocate(&mut self, data: ObjectData) -> JsObject {
        let object = JsObject::from_data(data);
        self.objects.push(std::rc::Rc::downgrade(&object.0));
        self.total_allocated += 1;
        if self.objects.len() >= self.prune_threshold {
            self.prune();
        }
        object
    }

    /// Drops registry entries for objects that no longer exist.
    fn prune(&mut self) {
        self.objects.retain(|weak| weak.strong_count() > 0);
        self.prune_threshold = (self.objects.len() * 2).max(1024);
    }

    /// Current statistics.
    pub fn stats(&self) -> HeapStats {
        HeapStats {
            total_allocated: self.total_allocated,
            live: self.objects.iter().filter(|w| w.strong_count() > 0).count(),
        }
    }

    /// Clears every live object so that cyclic garbage can be reclaimed.
    ///
    /// Handles held outside the heap stay valid but point at empty objects.
    pub fn teardown(&mut self) -> usize {
        // Upgrade everything first so clearing one object cannot free
        // another before it is counted.
        let live: Vec<_> = std::mem::take(&mut self.objects)
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        let cleared = live.len();
        for rc in live {
            // The old contents are dropped after the borrow is released.
            let old = JsObject(rc).clear();
            drop(old);
        }
        log::trace!("heap teardown cleared {} objects", cleared);
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;
    use crate::value::Value;

    #[test]
    fn test_stats_track_live_objects() {
        let mut heap = Heap::new();
        let kept = heap.allocate(ObjectData::new(ObjectKind::Ordinary, None));
        {
            let _dropped = heap.allocate(ObjectData::new(ObjectKind::Ordinary, None));
        }
        let stats = heap.stats();
        assert_eq!(stats.total_allocated, 2);
        assert_eq!(stats.live, 1);
        drop(kept);
    }

    #[test]
    fn test_teardown_breaks_cycles() {
        let mut heap = Heap::new();
        let a = heap.allocate(ObjectData::new(ObjectKind::Ordinary, None));
        let b = heap.allocate(ObjectData::new(ObjectKind::Ordinary, None));
        a.set_value("b", Value::Object(b.clone()));
        b.set_value("a", Value::Object(a.clone()));
        drop(a);
        drop(b);
        assert_eq!(heap.stats().live, 2);

        assert_eq!(heap.teardown(), 2);
        assert_eq!(heap.stats().live, 0);
    }

    #[test]
    fn test_teardown_counts_objects_held_only_by_other_objects() {
        let mut heap = Heap::new();
        let root = heap.allocate(ObjectData::new(ObjectKind::Ordinary, None));
        let child = heap.allocate(ObjectData::new(ObjectKind::Ordinary, None));
        root.set_value("child", Value::Object(child));
        root.set_value("self", Value::Object(root.clone()));
        drop(root);

        assert_eq!(heap.teardown(), 2);
        assert_eq!(heap.stats().live, 0);
    }
}
