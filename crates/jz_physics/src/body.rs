//! Rigid bodies
//!
//! Bodies are owned by [`World3D`](crate::World3D) and addressed through
//! [`BodyKey`]s. Everything that moves a body goes through the world so its
//! broadphase entry stays in sync; this module only exposes read access.

use std::sync::Arc;

use jz_math::{BoundingBox, CoordinateFrame3D, Quaternion, Vector3};
use slotmap::new_key_type;

use crate::broadphase::BroadphaseHandle;
use crate::collision::{BodyType, CollisionFilter};
use crate::material::PhysicsMaterial;
use crate::shapes::CollisionShape;

// Define generational key type for rigid bodies
new_key_type! {
    /// Key to a rigid body in the physics world
    ///
    /// Uses generational indexing: once a body is removed, its old keys
    /// return `None` even if the slot is reused.
    pub struct BodyKey;
}

/// Smallest mass a dynamic body may have
pub const MIN_MASS: f32 = 1e-3;

/// A rigid body: shape, mass, material, frame and velocities
#[derive(Clone, Debug)]
pub struct Body {
    shape: Arc<CollisionShape>,
    filter: CollisionFilter,
    mass: f32,
    inverse_mass: f32,
    /// Diagonal of the local-space inverse inertia tensor
    inverse_inertia: Vector3,
    material: PhysicsMaterial,
    prev_frame: CoordinateFrame3D,
    frame: CoordinateFrame3D,
    linear_velocity: Vector3,
    angular_velocity: Vector3,
    pub(crate) broadphase: Option<BroadphaseHandle>,
}

impl Body {
    /// A body at the origin, at rest, with unit mass if it is dynamic
    pub(crate) fn new(shape: Arc<CollisionShape>, body_type: BodyType, collides_with: BodyType) -> Self {
        let mut body = Self {
            shape,
            filter: CollisionFilter::new(body_type, collides_with),
            mass: 1.0,
            inverse_mass: 0.0,
            inverse_inertia: Vector3::ZERO,
            material: PhysicsMaterial::default(),
            prev_frame: CoordinateFrame3D::IDENTITY,
            frame: CoordinateFrame3D::IDENTITY,
            linear_velocity: Vector3::ZERO,
            angular_velocity: Vector3::ZERO,
            broadphase: None,
        };
        body.set_mass(1.0);
        body
    }

    /// Get the shared collision shape
    pub fn shape(&self) -> &Arc<CollisionShape> {
        &self.shape
    }

    /// Get the body type bits the body was created with
    pub fn body_type(&self) -> BodyType {
        self.filter.body_type
    }

    /// Get the body types this body accepts contacts from
    pub fn collides_with(&self) -> BodyType {
        self.filter.collides_with
    }

    /// Get the combined collision filter
    pub fn filter(&self) -> CollisionFilter {
        self.filter
    }

    /// Moved by gravity, velocity and collisions
    ///
    /// Concave shapes never are: a dynamic triangle tree has no inertia and
    /// nothing to rest on, so it falls back to static.
    pub fn is_dynamic(&self) -> bool {
        let t = self.filter.body_type;
        t.contains(BodyType::DYNAMIC)
            && !t.intersects(BodyType::STATIC | BodyType::KINEMATIC)
            && self.shape.is_convex()
    }

    /// Moved only by its own velocity
    pub fn is_kinematic(&self) -> bool {
        let t = self.filter.body_type;
        t.contains(BodyType::KINEMATIC) && !t.contains(BodyType::STATIC)
    }

    /// Never moved by the simulation (also the fallback when no motion bit is set)
    pub fn is_static(&self) -> bool {
        !self.is_dynamic() && !self.is_kinematic()
    }

    /// Get the mass last set (unit mass by default)
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Zero exactly when the body cannot be pushed
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Get the surface material
    pub fn material(&self) -> PhysicsMaterial {
        self.material
    }

    /// Get the friction coefficient
    pub fn friction(&self) -> f32 {
        self.material.friction
    }

    /// Get the current world frame
    pub fn frame(&self) -> &CoordinateFrame3D {
        &self.frame
    }

    /// Frame at the start of the last simulation step
    pub fn prev_frame(&self) -> &CoordinateFrame3D {
        &self.prev_frame
    }

    /// Get the world position
    pub fn translation(&self) -> Vector3 {
        self.frame.translation
    }

    /// Get the world orientation
    pub fn orientation(&self) -> Quaternion {
        self.frame.orientation
    }

    /// Get the linear velocity in world units per second
    pub fn linear_velocity(&self) -> Vector3 {
        self.linear_velocity
    }

    /// Get the angular velocity in radians per second, world axes
    pub fn angular_velocity(&self) -> Vector3 {
        self.angular_velocity
    }

    /// Get the broadphase slot, if the body got one
    pub fn broadphase_handle(&self) -> Option<BroadphaseHandle> {
        self.broadphase
    }

    /// Bounds of the shape in its own space
    pub fn local_bounding(&self) -> BoundingBox {
        self.shape.bounding()
    }

    /// Bounds of the shape at the current frame
    pub fn world_bounding(&self) -> BoundingBox {
        self.world_bounding_at(&self.frame)
    }

    /// Bounds of the shape if it were placed at `frame`
    ///
    /// Rotationally invariant shapes are only translated; everything else
    /// gets the conservative rotated box.
    pub fn world_bounding_at(&self, frame: &CoordinateFrame3D) -> BoundingBox {
        let local = self.shape.bounding();
        if self.shape.is_rotationally_invariant() {
            local.translated(frame.translation)
        } else {
            local.transformed(frame)
        }
    }

    /// Velocity of the material point at world position `point`
    pub fn velocity_at(&self, point: Vector3) -> Vector3 {
        self.linear_velocity + self.angular_velocity.cross(point - self.frame.translation)
    }

    /// World inverse inertia tensor applied to `v`
    pub fn apply_inverse_inertia(&self, v: Vector3) -> Vector3 {
        let q = self.frame.orientation;
        q.rotate(self.inverse_inertia.component_mul(q.inverse_rotate(v)))
    }

    pub(crate) fn set_frame(&mut self, frame: CoordinateFrame3D) {
        self.prev_frame = frame;
        self.frame = frame;
    }

    /// Move within a step, keeping the previous frame
    pub(crate) fn translate(&mut self, delta: Vector3) {
        self.frame.translation += delta;
    }

    /// Advance the frame by the current velocities
    ///
    /// Returns false if the body did not move.
    pub(crate) fn integrate(&mut self, dt: f32) -> bool {
        self.prev_frame = self.frame;
        let moving = self.linear_velocity != Vector3::ZERO || self.angular_velocity != Vector3::ZERO;
        if moving {
            self.frame.translation += self.linear_velocity * dt;
            self.frame.orientation = self.frame.orientation.integrate(self.angular_velocity, dt);
        }
        moving
    }

    pub(crate) fn set_linear_velocity(&mut self, v: Vector3) {
        self.linear_velocity = v;
    }

    pub(crate) fn set_angular_velocity(&mut self, w: Vector3) {
        self.angular_velocity = w;
    }

    /// Set the mass; dynamic bodies clamp bad values to [`MIN_MASS`]
    ///
    /// Static and kinematic bodies keep the value for reference but stay
    /// immovable.
    pub(crate) fn set_mass(&mut self, mass: f32) {
        if !self.is_dynamic() {
            self.mass = mass;
            self.inverse_mass = 0.0;
            self.inverse_inertia = Vector3::ZERO;
            return;
        }
        let mass = if mass.is_finite() && mass >= MIN_MASS {
            mass
        } else {
            log::warn!("Invalid mass {} for dynamic body, clamping to {}", mass, MIN_MASS);
            MIN_MASS
        };
        self.mass = mass;
        self.inverse_mass = 1.0 / mass;
        self.inverse_inertia = self.shape.inverse_inertia(self.inverse_mass);
    }

    pub(crate) fn set_friction(&mut self, friction: f32) {
        self.material = PhysicsMaterial::new(friction);
    }

    /// Apply `impulse` at offset `r` from the center of mass
    ///
    /// Immovable bodies ignore impulses.
    pub(crate) fn apply_impulse(&mut self, impulse: Vector3, r: Vector3) {
        if self.inverse_mass == 0.0 {
            return;
        }
        self.linear_velocity += impulse * self.inverse_mass;
        self.angular_velocity += self.apply_inverse_inertia(r.cross(impulse));
    }
}
