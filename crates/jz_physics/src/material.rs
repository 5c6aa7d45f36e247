//! Surface material for collision response

use serde::{Deserialize, Serialize};

/// Surface material of a body
///
/// Only friction is modeled; collisions are fully inelastic along the
/// contact normal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    /// Coulomb friction coefficient (0.0 = ice, 1.0 = rubber)
    pub friction: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self { friction: 0.5 }
    }
}

impl PhysicsMaterial {
    pub const ICE: Self = Self { friction: 0.05 };
    pub const METAL: Self = Self { friction: 0.3 };
    pub const WOOD: Self = Self { friction: 0.5 };
    pub const CONCRETE: Self = Self { friction: 0.7 };
    pub const RUBBER: Self = Self { friction: 0.9 };

    /// Material with friction clamped to [0.0, 1.0]
    pub fn new(friction: f32) -> Self {
        // NaN becomes frictionless
        let friction = if friction.is_nan() { 0.0 } else { friction.clamp(0.0, 1.0) };
        Self { friction }
    }

    /// Friction of a contact between two materials (geometric mean)
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            friction: (self.friction * other.friction).sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_material() {
        assert_eq!(PhysicsMaterial::default().friction, 0.5);
    }

    #[test]
    fn test_new_clamps_values() {
        assert_eq!(PhysicsMaterial::new(1.5).friction, 1.0);
        assert_eq!(PhysicsMaterial::new(-1.0).friction, 0.0);
        assert_eq!(PhysicsMaterial::new(f32::NAN).friction, 0.0);
    }

    #[test]
    fn test_combine_geometric_mean_friction() {
        let combined = PhysicsMaterial::ICE.combine(&PhysicsMaterial::RUBBER);
        let expected = (0.05_f32 * 0.9_f32).sqrt();
        assert!((combined.friction - expected).abs() < 0.0001);
    }

    #[test]
    fn test_combine_with_frictionless_is_frictionless() {
        let combined = PhysicsMaterial::new(0.0).combine(&PhysicsMaterial::CONCRETE);
        assert_eq!(combined.friction, 0.0);
    }
}
