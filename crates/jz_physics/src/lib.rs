//! Rigid-body physics for the jz engine
//!
//! This crate provides a discrete-time 3D physics world:
//! - Collision shapes with support mapping (sphere, box, convex hull, triangle, triangle tree)
//! - AABB-tree broadphase with type/collides-with bitmask filtering
//! - Narrow-phase contact generation (closed-form tests, GJK + EPA, concave meshes)
//! - Contact persistence (start / update / stop events)
//! - Fixed-step integration with impulse-based collision resolution

pub mod body;
pub mod broadphase;
mod bvh;
pub mod collision;
pub mod contact;
pub mod error;
mod gjk;
pub mod material;
pub mod narrow_phase;
pub mod shapes;
pub mod triangle_tree;
pub mod world;

// Re-export commonly used types
pub use body::{Body, BodyKey};
pub use broadphase::{Broadphase, BroadphaseHandle};
pub use collision::{BodyType, CollisionFilter};
pub use contact::{CollisionEvent, ContactEventKind, WorldContactPoint, DISTANCE_TOLERANCE, NORMAL_TOLERANCE};
pub use error::PhysicsError;
pub use material::PhysicsMaterial;
pub use narrow_phase::{test_collision, test_overlap};
pub use shapes::{BoxShape, CollisionShape, ConvexShape, ShapeKind, SphereShape, TriangleShape};
pub use triangle_tree::{MeshError, MeshIndices, TriangleTree};
pub use world::{CollisionListener, FrameListener, PhysicsConfig, World3D};
