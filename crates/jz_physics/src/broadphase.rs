//! AABB-tree broadphase
//!
//! Tracks a world bounding box per collideable and reports the pairs whose
//! boxes overlap and whose filters accept each other. Updates only mark the
//! tree dirty; [`Broadphase::tick`] rebuilds it and recomputes the pairs.

use jz_math::BoundingBox;

use crate::bvh::Bvh;
use crate::collision::{BodyType, CollisionFilter};

/// Handle to a broadphase entry
///
/// Slots are recycled after removal, so a handle must not be used once its
/// entry is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BroadphaseHandle(u16);

impl BroadphaseHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Entry<T> {
    collideable: T,
    filter: CollisionFilter,
    bounds: BoundingBox,
}

/// Broadphase over collideables of type `T` (usually a body key)
#[derive(Clone, Debug)]
pub struct Broadphase<T> {
    entries: Vec<Option<Entry<T>>>,
    free: Vec<u16>,
    tree: Bvh,
    dirty: bool,
    pairs: Vec<(T, T)>,
}

impl<T: Copy> Default for Broadphase<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> Broadphase<T> {
    /// Number of slots a broadphase can hold
    pub const CAPACITY: usize = u16::MAX as usize;

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            tree: Bvh::default(),
            dirty: false,
            pairs: Vec::new(),
        }
    }

    /// Register a collideable; `None` once every slot is taken
    pub fn add(
        &mut self,
        collideable: T,
        body_type: BodyType,
        collides_with: BodyType,
        bounds: BoundingBox,
    ) -> Option<BroadphaseHandle> {
        let entry = Entry {
            collideable,
            filter: CollisionFilter::new(body_type, collides_with),
            bounds,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.entries[slot as usize] = Some(entry);
                slot
            }
            None => {
                if self.entries.len() >= Self::CAPACITY {
                    log::warn!("Broadphase full ({} entries)", Self::CAPACITY);
                    return None;
                }
                self.entries.push(Some(entry));
                (self.entries.len() - 1) as u16
            }
        };
        self.dirty = true;
        Some(BroadphaseHandle(slot))
    }

    /// Remove an entry and recycle its slot
    pub fn remove(&mut self, handle: BroadphaseHandle) -> Option<T> {
        let entry = self.entries.get_mut(handle.index()).and_then(Option::take);
        debug_assert!(entry.is_some(), "remove of stale broadphase handle {:?}", handle);
        let entry = entry?;
        self.free.push(handle.0);
        self.dirty = true;
        Some(entry.collideable)
    }

    /// Replace an entry's bounds
    pub fn update(&mut self, handle: BroadphaseHandle, bounds: BoundingBox) {
        match self.entries.get_mut(handle.index()).and_then(Option::as_mut) {
            Some(entry) => {
                entry.bounds = bounds;
                self.dirty = true;
            }
            None => debug_assert!(false, "update of stale broadphase handle {:?}", handle),
        }
    }

    /// Rebuild the tree and pair list if anything changed since the last tick
    pub fn tick(&mut self) {
        if !self.dirty {
            return;
        }
        self.tree = Bvh::build(
            self.entries
                .iter()
                .enumerate()
                .filter_map(|(i, e)| e.as_ref().map(|e| (i as u32, e.bounds))),
            1,
        );

        self.pairs.clear();
        let mut hits = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let Some(entry) = entry else { continue };
            hits.clear();
            self.tree.query(&entry.bounds, |j| {
                if j as usize > i {
                    hits.push(j as usize);
                }
            });
            hits.sort_unstable();
            for &j in &hits {
                if let Some(other) = &self.entries[j] {
                    if entry.filter.collides_with(&other.filter) {
                        self.pairs.push((entry.collideable, other.collideable));
                    }
                }
            }
        }
        self.dirty = false;
    }

    /// Overlapping, filter-accepted pairs as of the last tick
    pub fn pairs(&self) -> &[(T, T)] {
        &self.pairs
    }

    /// Collideables whose bounds overlap `bounds`, ignoring filters
    ///
    /// Reflects updates made since the last tick.
    pub fn query(&self, bounds: &BoundingBox) -> Vec<T> {
        if self.dirty {
            return self
                .entries
                .iter()
                .flatten()
                .filter(|e| e.bounds.overlaps(bounds))
                .map(|e| e.collideable)
                .collect();
        }
        let mut hits = Vec::new();
        self.tree.query(bounds, |i| {
            if let Some(e) = &self.entries[i as usize] {
                hits.push(e.collideable);
            }
        });
        hits
    }

    pub fn bounds(&self, handle: BroadphaseHandle) -> Option<BoundingBox> {
        self.entries.get(handle.index())?.as_ref().map(|e| e.bounds)
    }

    pub fn get(&self, handle: BroadphaseHandle) -> Option<T> {
        self.entries.get(handle.index())?.as_ref().map(|e| e.collideable)
    }

    pub fn len(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
