//! 3D Mathematics Library
//!
//! This crate provides the vector, rotation and bounding-volume types used by
//! the jz physics core.
//!
//! ## Core Types
//!
//! - [`Vector3`] - 3D vector with x, y, z components
//! - [`Quaternion`] - unit quaternion rotation
//! - [`Matrix3`] - 3x3 matrix (rotation and inertia tensors)
//! - [`CoordinateFrame3D`] - orientation + translation
//! - [`BoundingBox`] - axis-aligned bounding box
//!
//! ## Geometry
//!
//! The [`geometry`] module holds the tolerance constants and the guarded
//! closest-point / ray queries used by the narrow-phase.

mod vector3;
mod quaternion;
mod matrix3;
mod frame;
mod bounding_box;
pub mod geometry;

pub use vector3::Vector3;
pub use quaternion::Quaternion;
pub use matrix3::Matrix3;
pub use frame::CoordinateFrame3D;
pub use bounding_box::BoundingBox;
pub use geometry::{LOOSE_TOLERANCE, ZERO_TOLERANCE};
