//! Bounding-volume hierarchy shared by the broadphase and triangle trees
//!
//! Built top-down: each node splits its primitives at the median centroid
//! along the longest axis of the centroid bounds.

use jz_math::{BoundingBox, Vector3};

#[derive(Clone, Copy, Debug)]
enum NodeKind {
    Leaf { first: u32, count: u32 },
    Branch { left: u32, right: u32 },
}

#[derive(Clone, Copy, Debug)]
struct Node {
    bounds: BoundingBox,
    kind: NodeKind,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Bvh {
    nodes: Vec<Node>,
    items: Vec<u32>,
}

impl Bvh {
    /// Build over `(id, bounds)` primitives; inverted bounds are left out
    pub fn build(primitives: impl IntoIterator<Item = (u32, BoundingBox)>, max_leaf_size: usize) -> Self {
        let mut work: Vec<(u32, BoundingBox, Vector3)> = primitives
            .into_iter()
            .filter(|(_, b)| !b.is_inverted())
            .map(|(id, b)| (id, b, b.center()))
            .collect();

        let mut bvh = Self {
            nodes: Vec::with_capacity(work.len() * 2),
            items: Vec::with_capacity(work.len()),
        };
        if !work.is_empty() {
            bvh.build_node(&mut work, max_leaf_size.max(1));
        }
        bvh
    }

    fn build_node(&mut self, work: &mut [(u32, BoundingBox, Vector3)], max_leaf_size: usize) -> u32 {
        let bounds = work
            .iter()
            .fold(BoundingBox::INVERTED_MAX, |acc, (_, b, _)| acc.union(b));
        let index = self.nodes.len() as u32;

        if work.len() <= max_leaf_size {
            let first = self.items.len() as u32;
            self.items.extend(work.iter().map(|(id, _, _)| *id));
            self.nodes.push(Node {
                bounds,
                kind: NodeKind::Leaf {
                    first,
                    count: work.len() as u32,
                },
            });
            return index;
        }

        let axis = work
            .iter()
            .fold(BoundingBox::INVERTED_MAX, |acc, (_, _, c)| acc.grow_point(*c))
            .longest_axis();
        let mid = work.len() / 2;
        work.select_nth_unstable_by(mid, |a, b| a.2[axis].total_cmp(&b.2[axis]));

        // Placeholder until both children exist
        self.nodes.push(Node {
            bounds,
            kind: NodeKind::Leaf { first: 0, count: 0 },
        });
        let (lower, upper) = work.split_at_mut(mid);
        let left = self.build_node(lower, max_leaf_size);
        let right = self.build_node(upper, max_leaf_size);
        self.nodes[index as usize].kind = NodeKind::Branch { left, right };
        index
    }

    /// Visit the id of every primitive whose node bounds overlap `bounds`
    ///
    /// Leaves are tested as a whole, so callers refine against the
    /// primitive's own bounds when they need an exact answer.
    pub fn query(&self, bounds: &BoundingBox, mut visit: impl FnMut(u32)) {
        if self.nodes.is_empty() || bounds.is_inverted() {
            return;
        }
        let mut stack = vec![0u32];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if !node.bounds.overlaps(bounds) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { first, count } => {
                    for &id in &self.items[first as usize..(first + count) as usize] {
                        visit(id);
                    }
                }
                NodeKind::Branch { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
    }

    /// Bounds of the whole tree (inverted when empty)
    pub fn bounds(&self) -> BoundingBox {
        self.nodes.first().map_or(BoundingBox::INVERTED_MAX, |n| n.bounds)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
