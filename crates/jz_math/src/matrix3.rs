//! 3x3 matrix (row-major)

use serde::{Deserialize, Serialize};

use crate::Vector3;

/// 3x3 matrix stored as rows
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix3 {
    pub rows: [[f32; 3]; 3],
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix3 {
    pub const IDENTITY: Self = Self {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub const ZERO: Self = Self { rows: [[0.0; 3]; 3] };

    #[inline]
    pub const fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        Self { rows }
    }

    /// Diagonal matrix, e.g. a principal-axis inertia tensor
    pub fn from_diagonal(d: Vector3) -> Self {
        Self::from_rows([[d.x, 0.0, 0.0], [0.0, d.y, 0.0], [0.0, 0.0, d.z]])
    }

    /// Row `i` as a vector
    #[inline]
    pub fn row(&self, i: usize) -> Vector3 {
        Vector3::from(self.rows[i])
    }

    /// Column `j` as a vector
    #[inline]
    pub fn column(&self, j: usize) -> Vector3 {
        Vector3::new(self.rows[0][j], self.rows[1][j], self.rows[2][j])
    }

    #[inline]
    pub fn mul_vector(&self, v: Vector3) -> Vector3 {
        Vector3::new(self.row(0).dot(v), self.row(1).dot(v), self.row(2).dot(v))
    }

    pub fn mul_matrix(&self, other: &Self) -> Self {
        let mut out = Self::ZERO;
        for i in 0..3 {
            for j in 0..3 {
                out.rows[i][j] = self.row(i).dot(other.column(j));
            }
        }
        out
    }

    pub fn transpose(&self) -> Self {
        let r = &self.rows;
        Self::from_rows([
            [r[0][0], r[1][0], r[2][0]],
            [r[0][1], r[1][1], r[2][1]],
            [r[0][2], r[1][2], r[2][2]],
        ])
    }

    /// Component-wise absolute value (used for conservative box transforms)
    pub fn abs(&self) -> Self {
        let mut out = *self;
        for row in out.rows.iter_mut() {
            for v in row.iter_mut() {
                *v = v.abs();
            }
        }
        out
    }
}
