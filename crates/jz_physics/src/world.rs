//! Physics world and simulation
//!
//! [`World3D`] owns every body and the broadphase. [`World3D::tick`] banks
//! frame time and runs whole fixed steps; each step integrates motion,
//! refreshes the broadphase, generates and classifies contacts, and resolves
//! them with impulses plus a positional projection.

use std::sync::Arc;

use jz_math::{BoundingBox, CoordinateFrame3D, Quaternion, Vector3, ZERO_TOLERANCE};
use slotmap::{SecondaryMap, SlotMap};

use crate::body::{Body, BodyKey};
use crate::broadphase::Broadphase;
use crate::collision::BodyType;
use crate::contact::{CollisionEvent, ContactCache, WorldContactPoint, DISTANCE_TOLERANCE};
use crate::error::PhysicsError;
use crate::narrow_phase::test_collision;
use crate::shapes::CollisionShape;

/// Default fixed step length in seconds
pub const TIME_STEP: f32 = 1.0 / 60.0;

/// Called with a body's new frame after a tick moved it
pub type FrameListener = Box<dyn FnMut(BodyKey, &CoordinateFrame3D)>;

/// Called for every contact event involving a body
pub type CollisionListener = Box<dyn FnMut(&CollisionEvent<BodyKey>)>;

/// Sequential impulse passes over a pair's contacts per step
const SOLVER_ITERATIONS: usize = 10;

/// Per-contact solver state for one step
struct ContactConstraint {
    point: Vector3,
    ra: Vector3,
    rb: Vector3,
    normal: Vector3,
    tangents: [Vector3; 2],
    normal_mass: f32,
    tangent_mass: [f32; 2],
    normal_impulse: f32,
    tangent_impulse: [f32; 2],
}

/// Configuration for the physics simulation
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    /// Gravity acceleration in meters per second squared
    pub gravity: Vector3,
    /// World units per meter
    pub unit_meter: f32,
    /// Fixed step length in seconds
    pub time_step: f32,
    /// Most steps one `tick` may run before dropping owed time
    ///
    /// A backstop only. Callers clamp long frames themselves; at the default
    /// step this admits a quarter-second frame without dropping anything.
    pub max_sub_steps: u32,
    /// Fraction of excess penetration removed per step
    pub position_correction: f32,
    /// Penetration in meters left alone so resting contacts persist
    pub penetration_slop: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(0.0, -9.8, 0.0),
            unit_meter: 1.0,
            time_step: TIME_STEP,
            max_sub_steps: 15,
            position_correction: 0.8,
            penetration_slop: 0.005,
        }
    }
}

impl PhysicsConfig {
    /// Default configuration with the given gravity
    pub fn new(gravity: Vector3) -> Self {
        Self {
            gravity,
            ..Self::default()
        }
    }
}

/// The physics world containing all rigid bodies
pub struct World3D {
    /// All rigid bodies in the world (using generational keys)
    bodies: SlotMap<BodyKey, Body>,
    broadphase: Broadphase<BodyKey>,
    contacts: ContactCache<BodyKey>,
    frame_listeners: SecondaryMap<BodyKey, FrameListener>,
    collision_listeners: SecondaryMap<BodyKey, CollisionListener>,
    /// Banked time not yet simulated
    time_pool: f32,
    /// Physics configuration
    pub config: PhysicsConfig,
}

impl Default for World3D {
    fn default() -> Self {
        Self::new()
    }
}

impl World3D {
    /// Create a new physics world with default configuration
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    /// Create a new physics world with custom configuration
    pub fn with_config(config: PhysicsConfig) -> Self {
        Self {
            bodies: SlotMap::with_key(),
            broadphase: Broadphase::new(),
            contacts: ContactCache::default(),
            frame_listeners: SecondaryMap::new(),
            collision_listeners: SecondaryMap::new(),
            time_pool: 0.0,
            config,
        }
    }

    /// Create a body at the origin and register it with the broadphase
    ///
    /// Dynamic bodies start with unit mass. A body whose shape is invalid is
    /// still created but never collides. Triangle trees must be static or
    /// kinematic; one created as dynamic is treated as static.
    pub fn create(
        &mut self,
        shape: impl Into<Arc<CollisionShape>>,
        body_type: BodyType,
        collides_with: BodyType,
    ) -> BodyKey {
        let body = Body::new(shape.into(), body_type, collides_with);
        if !body.shape().is_valid() {
            log::warn!("Creating body with invalid {:?} shape; it will never collide", body.shape().kind());
        }
        let motion = BodyType::STATIC | BodyType::DYNAMIC | BodyType::KINEMATIC;
        if (body_type & motion) == BodyType::DYNAMIC && !body.shape().is_convex() {
            log::warn!("Concave {:?} shape cannot be dynamic; treating the body as static", body.shape().kind());
        }
        let bounds = body.world_bounding();
        let key = self.bodies.insert(body);

        let handle = self.broadphase.add(key, body_type, collides_with, bounds);
        if handle.is_none() {
            log::warn!("No broadphase slot for body {:?}; it will never collide", key);
        }
        if let Some(body) = self.bodies.get_mut(key) {
            body.broadphase = handle;
        }
        key
    }

    /// Remove a body, its broadphase entry, listeners and cached contacts
    ///
    /// Contacts of a removed body end silently; no stop event is sent.
    pub fn remove(&mut self, key: BodyKey) -> Option<Body> {
        let body = self.bodies.remove(key)?;
        if let Some(handle) = body.broadphase {
            self.broadphase.remove(handle);
        }
        self.frame_listeners.remove(key);
        self.collision_listeners.remove(key);
        self.contacts.forget(key);
        Some(body)
    }

    /// Get an immutable reference to a body by key
    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    /// Check whether a key still refers to a body
    pub fn contains(&self, key: BodyKey) -> bool {
        self.bodies.contains_key(key)
    }

    /// Get the number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Iterate over the keys of all bodies
    pub fn body_keys(&self) -> impl Iterator<Item = BodyKey> + '_ {
        self.bodies.keys()
    }

    /// Get the broadphase, for inspection
    pub fn broadphase(&self) -> &Broadphase<BodyKey> {
        &self.broadphase
    }

    /// Bodies whose world bounds overlap `bounds`
    pub fn query(&self, bounds: &BoundingBox) -> Vec<BodyKey> {
        self.broadphase.query(bounds)
    }

    /// Contacts between `a` and `b` from the last step, normals pointing from `a` to `b`
    pub fn contacts(&self, a: BodyKey, b: BodyKey) -> Vec<WorldContactPoint> {
        if a <= b {
            self.contacts.contacts((a, b)).to_vec()
        } else {
            self.contacts.contacts((b, a)).iter().map(|c| c.flipped()).collect()
        }
    }

    /// Time banked toward the next step
    pub fn time_pool(&self) -> f32 {
        self.time_pool
    }

    fn body_mut(&mut self, key: BodyKey) -> Result<&mut Body, PhysicsError> {
        self.bodies.get_mut(key).ok_or(PhysicsError::StaleBody(key))
    }

    /// Place a body; also resets its previous frame
    pub fn set_frame(&mut self, key: BodyKey, frame: CoordinateFrame3D) -> Result<(), PhysicsError> {
        let body = self.bodies.get_mut(key).ok_or(PhysicsError::StaleBody(key))?;
        body.set_frame(frame);
        if let Some(handle) = body.broadphase {
            self.broadphase.update(handle, body.world_bounding());
        }
        Ok(())
    }

    /// Move a body, keeping its orientation
    pub fn set_translation(&mut self, key: BodyKey, translation: Vector3) -> Result<(), PhysicsError> {
        let orientation = self.body_mut(key)?.orientation();
        self.set_frame(key, CoordinateFrame3D::new(orientation, translation))
    }

    /// Turn a body in place; the orientation is normalized
    pub fn set_orientation(&mut self, key: BodyKey, orientation: Quaternion) -> Result<(), PhysicsError> {
        let translation = self.body_mut(key)?.translation();
        self.set_frame(key, CoordinateFrame3D::new(orientation.normalize(), translation))
    }

    /// Set a body's linear velocity
    pub fn set_linear_velocity(&mut self, key: BodyKey, velocity: Vector3) -> Result<(), PhysicsError> {
        self.body_mut(key)?.set_linear_velocity(velocity);
        Ok(())
    }

    /// Set a body's angular velocity (radians per second, world axes)
    pub fn set_angular_velocity(&mut self, key: BodyKey, velocity: Vector3) -> Result<(), PhysicsError> {
        self.body_mut(key)?.set_angular_velocity(velocity);
        Ok(())
    }

    /// Set a body's mass; see [`MIN_MASS`](crate::body::MIN_MASS) for clamping
    pub fn set_mass(&mut self, key: BodyKey, mass: f32) -> Result<(), PhysicsError> {
        self.body_mut(key)?.set_mass(mass);
        Ok(())
    }

    /// Set a body's friction coefficient
    pub fn set_friction(&mut self, key: BodyKey, friction: f32) -> Result<(), PhysicsError> {
        self.body_mut(key)?.set_friction(friction);
        Ok(())
    }

    /// Set gravity in meters per second squared
    pub fn set_gravity(&mut self, gravity: Vector3) {
        self.config.gravity = gravity;
    }

    /// Get gravity in meters per second squared
    pub fn gravity(&self) -> Vector3 {
        self.config.gravity
    }

    /// Set world units per meter; non-positive values are ignored
    pub fn set_unit_meter(&mut self, unit_meter: f32) {
        if unit_meter.is_finite() && unit_meter > 0.0 {
            self.config.unit_meter = unit_meter;
        } else {
            log::warn!("Ignoring invalid unit meter {}", unit_meter);
        }
    }

    /// Get world units per meter
    pub fn unit_meter(&self) -> f32 {
        self.config.unit_meter
    }

    /// Call `listener` whenever a tick moves this body
    pub fn set_frame_listener(
        &mut self,
        key: BodyKey,
        listener: impl FnMut(BodyKey, &CoordinateFrame3D) + 'static,
    ) -> Result<(), PhysicsError> {
        if !self.bodies.contains_key(key) {
            return Err(PhysicsError::StaleBody(key));
        }
        self.frame_listeners.insert(key, Box::new(listener));
        Ok(())
    }

    /// Call `listener` for every start, update and stop event involving this body
    pub fn set_collision_listener(
        &mut self,
        key: BodyKey,
        listener: impl FnMut(&CollisionEvent<BodyKey>) + 'static,
    ) -> Result<(), PhysicsError> {
        if !self.bodies.contains_key(key) {
            return Err(PhysicsError::StaleBody(key));
        }
        self.collision_listeners.insert(key, Box::new(listener));
        Ok(())
    }

    /// Drop both listeners of a body
    pub fn clear_listeners(&mut self, key: BodyKey) {
        self.frame_listeners.remove(key);
        self.collision_listeners.remove(key);
    }

    /// Advance the simulation by `dt` seconds of frame time
    ///
    /// Runs as many fixed steps as the banked time allows and returns how
    /// many ran. Listeners fire once, after the last step.
    pub fn tick(&mut self, dt: f32) -> usize {
        let step = self.config.time_step;
        if !(dt > 0.0 && dt.is_finite()) || !(step > 0.0 && step.is_finite()) {
            return 0;
        }

        self.time_pool += dt;
        let mut moved = SecondaryMap::new();
        let mut events = Vec::new();
        let mut steps = 0;

        while self.time_pool >= step {
            if steps >= self.config.max_sub_steps as usize {
                let owed = (self.time_pool / step) as usize;
                log::debug!("Dropping {} physics steps after {} sub-steps", owed, steps);
                self.time_pool %= step;
                break;
            }
            self.time_pool -= step;
            self.step(step, &mut moved, &mut events);
            steps += 1;
        }

        self.dispatch(&moved, &events);
        steps
    }

    /// Perform one fixed step
    fn step(
        &mut self,
        dt: f32,
        moved: &mut SecondaryMap<BodyKey, ()>,
        events: &mut Vec<CollisionEvent<BodyKey>>,
    ) {
        let gravity = self.config.gravity * self.config.unit_meter;

        // Phase 1: Integrate velocities and frames
        for (key, body) in self.bodies.iter_mut() {
            if body.is_static() {
                continue;
            }
            if body.is_dynamic() {
                body.set_linear_velocity(body.linear_velocity() + gravity * dt);
            }
            if body.integrate(dt) {
                moved.insert(key, ());
                if let Some(handle) = body.broadphase {
                    self.broadphase.update(handle, body.world_bounding());
                }
            }
        }

        // Phase 2: Candidate pairs
        self.broadphase.tick();
        let pairs = self.broadphase.pairs().to_vec();

        // Phase 3: Contacts, classification and resolution
        self.contacts
            .set_distance_tolerance(DISTANCE_TOLERANCE * self.config.unit_meter);
        self.contacts.begin_step();
        for (a, b) in pairs {
            let (a, b) = if a <= b { (a, b) } else { (b, a) };
            let (Some(body_a), Some(body_b)) = (self.bodies.get(a), self.bodies.get(b)) else {
                continue;
            };
            if body_a.is_static() && body_b.is_static() {
                continue;
            }
            let contacts = test_collision(body_a.shape(), body_a.frame(), body_b.shape(), body_b.frame());
            events.extend(self.contacts.record((a, b), &contacts));
            if !contacts.is_empty() {
                self.resolve_collision(a, b, &contacts, moved);
            }
        }
        events.extend(self.contacts.finish_step());
    }

    /// Resolve every contact of one pair
    fn resolve_collision(
        &mut self,
        a: BodyKey,
        b: BodyKey,
        contacts: &[WorldContactPoint],
        moved: &mut SecondaryMap<BodyKey, ()>,
    ) {
        let Some([body_a, body_b]) = self.bodies.get_disjoint_mut([a, b]) else {
            return;
        };
        let movable_a = body_a.inverse_mass() > 0.0;
        let movable_b = body_b.inverse_mass() > 0.0;
        if Self::solve_contacts(&self.config, body_a, movable_a, body_b, movable_b, contacts) {
            self.sync_moved(a, movable_a, moved);
            self.sync_moved(b, movable_b, moved);
        }
    }

    fn sync_moved(&mut self, key: BodyKey, movable: bool, moved: &mut SecondaryMap<BodyKey, ()>) {
        if !movable {
            return;
        }
        if let Some(body) = self.bodies.get(key) {
            if let Some(handle) = body.broadphase {
                self.broadphase.update(handle, body.world_bounding());
            }
            moved.insert(key, ());
        }
    }

    /// Inelastic normal impulses and Coulomb friction, then positional projection
    ///
    /// The pair's contacts are solved together by sequential impulses with
    /// accumulated, clamped totals, so a face resting on four points ends
    /// with no velocity into any of them. The projection runs once for the
    /// deepest contact. Bodies flagged immovable are treated as infinite
    /// mass and left untouched. Returns true if any body was translated.
    fn solve_contacts(
        config: &PhysicsConfig,
        a: &mut Body,
        movable_a: bool,
        b: &mut Body,
        movable_b: bool,
        contacts: &[WorldContactPoint],
    ) -> bool {
        let inv_a = if movable_a { a.inverse_mass() } else { 0.0 };
        let inv_b = if movable_b { b.inverse_mass() } else { 0.0 };
        let inv_sum = inv_a + inv_b;
        if inv_sum <= 0.0 {
            return false;
        }

        // Inverse of the effective inverse mass along a direction, including rotation
        let mass_along = |a: &Body, b: &Body, ra: Vector3, rb: Vector3, dir: Vector3| {
            let mut k = inv_sum;
            if movable_a {
                k += a.apply_inverse_inertia(ra.cross(dir)).cross(ra).dot(dir);
            }
            if movable_b {
                k += b.apply_inverse_inertia(rb.cross(dir)).cross(rb).dot(dir);
            }
            if k > ZERO_TOLERANCE {
                1.0 / k
            } else {
                0.0
            }
        };

        let mut constraints: Vec<ContactConstraint> = contacts
            .iter()
            .map(|contact| {
                let normal = contact.world_normal;
                let point = contact.midpoint();
                let ra = point - a.translation();
                let rb = point - b.translation();
                let tangent = normal.any_perpendicular();
                let tangents = [tangent, normal.cross(tangent)];
                ContactConstraint {
                    point,
                    ra,
                    rb,
                    normal,
                    tangents,
                    normal_mass: mass_along(&*a, &*b, ra, rb, normal),
                    tangent_mass: tangents.map(|t| mass_along(&*a, &*b, ra, rb, t)),
                    normal_impulse: 0.0,
                    tangent_impulse: [0.0; 2],
                }
            })
            .collect();
        let friction = a.material().combine(&b.material()).friction;

        let push = |a: &mut Body, b: &mut Body, c: &ContactConstraint, impulse: Vector3| {
            if movable_a {
                a.apply_impulse(-impulse, c.ra);
            }
            if movable_b {
                b.apply_impulse(impulse, c.rb);
            }
        };
        for _ in 0..SOLVER_ITERATIONS {
            for c in constraints.iter_mut() {
                // Totals never pull, so separating contacts get no impulse
                let vn = (b.velocity_at(c.point) - a.velocity_at(c.point)).dot(c.normal);
                let total = (c.normal_impulse - vn * c.normal_mass).max(0.0);
                let applied = total - c.normal_impulse;
                c.normal_impulse = total;
                push(&mut *a, &mut *b, &*c, c.normal * applied);

                // Cap at the Coulomb cone
                let limit = (friction * c.normal_impulse).max(0.0);
                for k in 0..2 {
                    let t = c.tangents[k];
                    let vt = (b.velocity_at(c.point) - a.velocity_at(c.point)).dot(t);
                    let total = (c.tangent_impulse[k] - vt * c.tangent_mass[k]).clamp(-limit, limit);
                    let applied = total - c.tangent_impulse[k];
                    c.tangent_impulse[k] = total;
                    push(&mut *a, &mut *b, &*c, t * applied);
                }
            }
        }

        let Some(deepest) = contacts.iter().max_by(|x, y| x.penetration().total_cmp(&y.penetration())) else {
            return false;
        };
        let depth = deepest.penetration();
        let slop = config.penetration_slop * config.unit_meter;
        if depth <= slop {
            return false;
        }
        let correction = deepest.world_normal * ((depth - slop) * config.position_correction / inv_sum);
        if movable_a {
            a.translate(-correction * inv_a);
        }
        if movable_b {
            b.translate(correction * inv_b);
        }
        true
    }

    fn dispatch(&mut self, moved: &SecondaryMap<BodyKey, ()>, events: &[CollisionEvent<BodyKey>]) {
        for (key, _) in moved {
            if let (Some(listener), Some(body)) = (self.frame_listeners.get_mut(key), self.bodies.get(key)) {
                listener(key, body.frame());
            }
        }
        for event in events {
            for key in [event.body_a, event.body_b] {
                if let Some(listener) = self.collision_listeners.get_mut(key) {
                    listener(event);
                }
            }
        }
    }
}
