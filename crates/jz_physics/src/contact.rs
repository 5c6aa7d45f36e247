//! Contact points and contact persistence
//!
//! A [`WorldContactPoint`] describes one point of overlap between two bodies.
//! The [`ContactCache`] compares the contacts generated for a pair on
//! consecutive steps and classifies them as starting, updating or stopping.

use std::collections::HashMap;
use std::hash::Hash;

use jz_math::Vector3;

/// Midpoints closer than this (scaled by the world's unit meter) match
pub const DISTANCE_TOLERANCE: f32 = 0.05;

/// Normals with `1 - n1·n2` at or below this match
pub const NORMAL_TOLERANCE: f32 = 0.05;

/// A single contact between body A and body B, in world space
///
/// `world_normal` is unit length and points from A toward B. `world_point_a`
/// is the point of A deepest inside B and `world_point_b` the point of B
/// deepest inside A.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldContactPoint {
    pub world_point_a: Vector3,
    pub world_point_b: Vector3,
    pub world_normal: Vector3,
}

impl WorldContactPoint {
    pub fn new(world_point_a: Vector3, world_point_b: Vector3, world_normal: Vector3) -> Self {
        Self {
            world_point_a,
            world_point_b,
            world_normal,
        }
    }

    /// Point halfway between the two deepest points
    pub fn midpoint(&self) -> Vector3 {
        (self.world_point_a + self.world_point_b) * 0.5
    }

    /// Overlap depth along the normal (positive when penetrating)
    pub fn penetration(&self) -> f32 {
        (self.world_point_a - self.world_point_b).dot(self.world_normal)
    }

    /// Same contact seen from B's side
    pub fn flipped(&self) -> Self {
        Self {
            world_point_a: self.world_point_b,
            world_point_b: self.world_point_a,
            world_normal: -self.world_normal,
        }
    }

    /// Midpoints within `distance_tolerance` and normals within `normal_tolerance`
    pub fn about_equal(&self, other: &Self, distance_tolerance: f32, normal_tolerance: f32) -> bool {
        (self.midpoint() - other.midpoint()).length_squared() <= distance_tolerance * distance_tolerance
            && self.normal_about_equal(other, normal_tolerance)
    }

    /// `1 - n1·n2 <= tolerance`
    pub fn normal_about_equal(&self, other: &Self, tolerance: f32) -> bool {
        1.0 - self.world_normal.dot(other.world_normal) <= tolerance
    }
}

/// Lifecycle stage of a contact
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContactEventKind {
    /// Contact appeared this step
    Start,
    /// Contact persisted from the previous step
    Update,
    /// Contact from the previous step has no match this step
    Stop,
}

/// A classified contact between two bodies
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionEvent<K> {
    pub kind: ContactEventKind,
    pub body_a: K,
    pub body_b: K,
    pub contact: WorldContactPoint,
}

/// Remembers each pair's contacts from the previous step
///
/// Call [`begin_step`](Self::begin_step), then [`record`](Self::record) once
/// for every pair tested, then [`finish_step`](Self::finish_step) to stop
/// contacts of pairs that were not tested at all.
#[derive(Debug)]
pub struct ContactCache<K> {
    previous: HashMap<(K, K), Vec<WorldContactPoint>>,
    current: HashMap<(K, K), Vec<WorldContactPoint>>,
    distance_tolerance: f32,
    normal_tolerance: f32,
}

impl<K: Copy + Eq + Hash> Default for ContactCache<K> {
    fn default() -> Self {
        Self::new(DISTANCE_TOLERANCE, NORMAL_TOLERANCE)
    }
}

impl<K: Copy + Eq + Hash> ContactCache<K> {
    pub fn new(distance_tolerance: f32, normal_tolerance: f32) -> Self {
        Self {
            previous: HashMap::new(),
            current: HashMap::new(),
            distance_tolerance,
            normal_tolerance,
        }
    }

    pub fn set_distance_tolerance(&mut self, tolerance: f32) {
        self.distance_tolerance = tolerance;
    }

    /// Move this step's contacts to "previous" and start collecting anew
    pub fn begin_step(&mut self) {
        self.previous = std::mem::take(&mut self.current);
    }

    /// Classify `contacts` for `pair` against the previous step
    ///
    /// Each new contact matches at most one previous contact. Matched contacts
    /// report `Update`, unmatched new ones `Start`, and leftover previous ones
    /// `Stop`.
    pub fn record(&mut self, pair: (K, K), contacts: &[WorldContactPoint]) -> Vec<CollisionEvent<K>> {
        let mut previous = self.previous.remove(&pair).unwrap_or_default();
        let mut events = Vec::with_capacity(contacts.len() + previous.len());

        for contact in contacts {
            let matched = previous
                .iter()
                .position(|old| old.about_equal(contact, self.distance_tolerance, self.normal_tolerance));
            let kind = match matched {
                Some(index) => {
                    previous.swap_remove(index);
                    ContactEventKind::Update
                }
                None => ContactEventKind::Start,
            };
            events.push(CollisionEvent {
                kind,
                body_a: pair.0,
                body_b: pair.1,
                contact: *contact,
            });
        }

        events.extend(previous.into_iter().map(|contact| CollisionEvent {
            kind: ContactEventKind::Stop,
            body_a: pair.0,
            body_b: pair.1,
            contact,
        }));

        if !contacts.is_empty() {
            self.current.insert(pair, contacts.to_vec());
        }
        events
    }

    /// Stop every contact of pairs not recorded since `begin_step`
    pub fn finish_step(&mut self) -> Vec<CollisionEvent<K>> {
        self.previous
            .drain()
            .flat_map(|(pair, contacts)| {
                contacts.into_iter().map(move |contact| CollisionEvent {
                    kind: ContactEventKind::Stop,
                    body_a: pair.0,
                    body_b: pair.1,
                    contact,
                })
            })
            .collect()
    }

    /// Contacts recorded for `pair` on the latest step
    pub fn contacts(&self, pair: (K, K)) -> &[WorldContactPoint] {
        self.current.get(&pair).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop every cached contact involving `key` without reporting them
    pub fn forget(&mut self, key: K) {
        self.current.retain(|&(a, b), _| a != key && b != key);
        self.previous.retain(|&(a, b), _| a != key && b != key);
    }

    /// Number of pairs currently in contact
    pub fn pair_count(&self) -> usize {
        self.current.len()
    }
}
