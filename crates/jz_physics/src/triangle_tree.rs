//! Concave triangle mesh with a bounding-volume hierarchy
//!
//! Static level geometry is usually a triangle soup far too large to test
//! triangle by triangle. The tree narrows a query box down to the handful of
//! triangles worth handing to the narrow-phase.

use std::fmt;

use jz_math::{BoundingBox, Vector3};

use crate::bvh::Bvh;
use crate::shapes::TriangleShape;

/// Maximum triangles stored in one leaf
pub const MAX_LEAF_TRIANGLES: usize = 4;

/// Index buffer in either width a mesh loader may produce
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MeshIndices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl MeshIndices {
    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            Self::U16(v) => v.get(i).map(|&x| u32::from(x)),
            Self::U32(v) => v.get(i).copied(),
        }
    }
}

impl From<Vec<u16>> for MeshIndices {
    fn from(v: Vec<u16>) -> Self {
        Self::U16(v)
    }
}

impl From<Vec<u32>> for MeshIndices {
    fn from(v: Vec<u32>) -> Self {
        Self::U32(v)
    }
}

/// Reasons a mesh cannot become a [`TriangleTree`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The index buffer does not describe whole triangles
    IndexCountNotMultipleOfThree(usize),
    /// An index points past the end of the vertex buffer
    IndexOutOfRange { index: u32, vertex_count: usize },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::IndexCountNotMultipleOfThree(n) => {
                write!(f, "Index count {} is not a multiple of three", n)
            }
            MeshError::IndexOutOfRange { index, vertex_count } => {
                write!(f, "Index {} out of range for {} vertices", index, vertex_count)
            }
        }
    }
}

impl std::error::Error for MeshError {}

/// A triangle mesh with an AABB hierarchy over its triangles
#[derive(Clone, Debug)]
pub struct TriangleTree {
    vertices: Vec<Vector3>,
    indices: MeshIndices,
    bvh: Bvh,
}

impl TriangleTree {
    /// Validate the mesh and build the hierarchy
    pub fn new(vertices: Vec<Vector3>, indices: impl Into<MeshIndices>) -> Result<Self, MeshError> {
        let indices = indices.into();
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexCountNotMultipleOfThree(indices.len()));
        }
        for i in 0..indices.len() {
            let index = indices.get(i).unwrap_or(0);
            if index as usize >= vertices.len() {
                return Err(MeshError::IndexOutOfRange {
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }

        let mut tree = Self {
            vertices,
            indices,
            bvh: Bvh::default(),
        };
        let bvh = Bvh::build(
            (0..tree.triangle_count()).map(|i| {
                let t = tree.triangle(i);
                (i as u32, BoundingBox::from_points(&t.vertices()))
            }),
            MAX_LEAF_TRIANGLES,
        );
        tree.bvh = bvh;

        log::debug!(
            "Built triangle tree: {} triangles, {} vertices",
            tree.triangle_count(),
            tree.vertices.len()
        );
        Ok(tree)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertices(&self) -> &[Vector3] {
        &self.vertices
    }

    /// Triangle `i` in local space
    ///
    /// # Panics
    /// Panics if `i >= triangle_count()`.
    pub fn triangle(&self, i: usize) -> TriangleShape {
        let vertex = |k: usize| {
            let index = self.indices.get(i * 3 + k).unwrap_or(u32::MAX) as usize;
            self.vertices[index]
        };
        TriangleShape::new(vertex(0), vertex(1), vertex(2))
    }

    /// Bounds of every triangle
    pub fn bounding(&self) -> BoundingBox {
        self.bvh.bounds()
    }

    /// Indices of triangles whose bounds overlap `bounds` (local space)
    pub fn query(&self, bounds: &BoundingBox) -> Vec<usize> {
        let mut hits = Vec::new();
        self.bvh.query(bounds, |i| {
            let t = self.triangle(i as usize);
            if BoundingBox::from_points(&t.vertices()).overlaps(bounds) {
                hits.push(i as usize);
            }
        });
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A flat grid of `n * n` quads on the XZ plane at y = 0
    fn grid(n: u32) -> TriangleTree {
        let mut vertices = Vec::new();
        for z in 0..=n {
            for x in 0..=n {
                vertices.push(Vector3::new(x as f32, 0.0, z as f32));
            }
        }
        let row = n + 1;
        let mut indices: Vec<u32> = Vec::new();
        for z in 0..n {
            for x in 0..n {
                let i = z * row + x;
                indices.extend_from_slice(&[i, i + row, i + 1, i + 1, i + row, i + row + 1]);
            }
        }
        TriangleTree::new(vertices, indices).unwrap()
    }

    #[test]
    fn test_rejects_partial_triangle() {
        let err = TriangleTree::new(vec![Vector3::ZERO; 3], vec![0u16, 1]).unwrap_err();
        assert_eq!(err, MeshError::IndexCountNotMultipleOfThree(2));
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let err = TriangleTree::new(vec![Vector3::ZERO; 3], vec![0u32, 1, 3]).unwrap_err();
        assert_eq!(err, MeshError::IndexOutOfRange { index: 3, vertex_count: 3 });
    }

    #[test]
    fn test_u16_and_u32_indices_agree() {
        let vertices = vec![Vector3::ZERO, Vector3::X, Vector3::Z];
        let a = TriangleTree::new(vertices.clone(), vec![0u16, 1, 2]).unwrap();
        let b = TriangleTree::new(vertices, vec![0u32, 1, 2]).unwrap();
        assert_eq!(a.triangle(0), b.triangle(0));
    }

    #[test]
    fn test_bounding_covers_mesh() {
        let tree = grid(4);
        assert_eq!(tree.triangle_count(), 32);
        let b = tree.bounding();
        assert_eq!(b.min, Vector3::ZERO);
        assert_eq!(b.max, Vector3::new(4.0, 0.0, 4.0));
    }

    #[test]
    fn test_query_returns_local_triangles() {
        let tree = grid(8);
        let region = BoundingBox::from_center_half_extents(Vector3::new(2.5, 0.0, 2.5), Vector3::splat(0.25));
        let hits = tree.query(&region);
        assert_eq!(hits.len(), 2);
        for i in hits {
            let t = tree.triangle(i);
            assert!(BoundingBox::from_points(&t.vertices()).overlaps(&region));
        }
    }

    #[test]
    fn test_query_far_away_is_empty() {
        let tree = grid(4);
        let region = BoundingBox::from_center_half_extents(Vector3::new(0.0, 10.0, 0.0), Vector3::ONE);
        assert!(tree.query(&region).is_empty());
    }

    #[test]
    fn test_empty_mesh() {
        let tree = TriangleTree::new(Vec::new(), Vec::<u32>::new()).unwrap();
        assert_eq!(tree.triangle_count(), 0);
        assert!(tree.bounding().is_inverted());
    }
}
