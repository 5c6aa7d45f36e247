//! SceneBuilder - Declarative scene construction
//!
//! Provides a fluent API for building physics scenes whose bodies are bound
//! to scene nodes.

use std::sync::Arc;

use jz_math::Vector3;
use jz_physics::{BodyKey, BodyType, CollisionShape, PhysicsConfig, PhysicsMaterial, TriangleTree, World3D};

use super::scene_graph::SceneGraph;

/// A physics world with the scene nodes that follow its bodies
pub struct Scene {
    pub world: World3D,
    pub graph: SceneGraph,
}

/// Builder for constructing scenes with physics
///
/// # Example
/// ```ignore
/// let scene = SceneBuilder::new()
///     .with_physics(PhysicsConfig::default())
///     .add_ground(0.0, 10.0, PhysicsMaterial::CONCRETE)
///     .add_sphere("ball", Vector3::new(0.0, 3.0, 0.0), 0.5, 1.0)
///     .build();
/// ```
pub struct SceneBuilder {
    world: World3D,
    graph: SceneGraph,
}

impl SceneBuilder {
    /// Create a new scene builder with default physics
    pub fn new() -> Self {
        Self {
            world: World3D::new(),
            graph: SceneGraph::new(),
        }
    }

    /// Replace the physics configuration
    pub fn with_physics(mut self, config: PhysicsConfig) -> Self {
        self.world.config = config;
        self
    }

    /// Add a static ground box whose top face sits at `top_y`
    pub fn add_ground(mut self, top_y: f32, half_size: f32, material: PhysicsMaterial) -> Self {
        let half_extents = Vector3::new(half_size, 1.0, half_size);
        let center = Vector3::new(0.0, top_y - half_extents.y, 0.0);
        self.add_body("ground", &["static"], CollisionShape::cuboid(half_extents), BodyType::STATIC, center, None, material);
        self
    }

    /// Add a dynamic sphere
    pub fn add_sphere(mut self, name: &str, position: Vector3, radius: f32, mass: f32) -> Self {
        self.add_body(
            name,
            &["dynamic"],
            CollisionShape::sphere(radius),
            BodyType::DYNAMIC,
            position,
            Some(mass),
            PhysicsMaterial::RUBBER,
        );
        self
    }

    /// Add a dynamic box
    pub fn add_box(mut self, name: &str, position: Vector3, half_extents: Vector3, mass: f32) -> Self {
        self.add_body(
            name,
            &["dynamic"],
            CollisionShape::cuboid(half_extents),
            BodyType::DYNAMIC,
            position,
            Some(mass),
            PhysicsMaterial::WOOD,
        );
        self
    }

    /// Add static heightfield terrain as a triangle mesh
    ///
    /// The grid spans `[-half_size, half_size]` on x and z with `cells` cells
    /// per side; `height(x, z)` gives the surface y.
    pub fn add_terrain(mut self, half_size: f32, cells: u32, height: impl Fn(f32, f32) -> f32) -> Self {
        let cells = cells.max(1);
        let step = 2.0 * half_size / cells as f32;
        let row = cells + 1;

        let mut vertices = Vec::with_capacity((row * row) as usize);
        for iz in 0..row {
            for ix in 0..row {
                let x = -half_size + ix as f32 * step;
                let z = -half_size + iz as f32 * step;
                vertices.push(Vector3::new(x, height(x, z), z));
            }
        }

        let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
        for iz in 0..cells {
            for ix in 0..cells {
                let i = iz * row + ix;
                indices.extend_from_slice(&[i, i + row, i + 1, i + 1, i + row, i + row + 1]);
            }
        }

        match TriangleTree::new(vertices, indices) {
            Ok(tree) => {
                self.add_body(
                    "terrain",
                    &["static"],
                    CollisionShape::from(tree),
                    BodyType::STATIC,
                    Vector3::ZERO,
                    None,
                    PhysicsMaterial::CONCRETE,
                );
            }
            Err(e) => log::warn!("Skipping terrain: {}", e),
        }
        self
    }

    #[allow(clippy::too_many_arguments)]
    fn add_body(
        &mut self,
        name: &str,
        tags: &[&str],
        shape: CollisionShape,
        body_type: BodyType,
        position: Vector3,
        mass: Option<f32>,
        material: PhysicsMaterial,
    ) -> Option<BodyKey> {
        let key = self.world.create(Arc::new(shape), body_type, BodyType::ALL);
        let configured = self
            .world
            .set_translation(key, position)
            .and_then(|_| self.world.set_friction(key, material.friction))
            .and_then(|_| match mass {
                Some(mass) => self.world.set_mass(key, mass),
                None => Ok(()),
            });
        let node = self.graph.add_node(name, tags);
        match configured.and_then(|_| self.graph.bind_body(node, &mut self.world, key)) {
            Ok(()) => Some(key),
            Err(e) => {
                log::warn!("Failed to set up body for '{}': {}", name, e);
                None
            }
        }
    }

    /// Build the scene
    pub fn build(self) -> Scene {
        Scene {
            world: self.world,
            graph: self.graph,
        }
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Named demo scenes run by the binary
pub fn demo_scene(name: &str, config: PhysicsConfig) -> Scene {
    let builder = SceneBuilder::new().with_physics(config);
    match name {
        "terrain" => builder
            .add_terrain(10.0, 16, |x, z| 0.1 * (x * 0.5).sin() * (z * 0.5).cos())
            .add_sphere("ball_a", Vector3::new(-2.0, 3.0, 1.0), 0.5, 1.0)
            .add_sphere("ball_b", Vector3::new(2.5, 4.0, -1.5), 0.75, 2.0)
            .add_box("crate", Vector3::new(0.0, 2.0, 3.0), Vector3::splat(0.5), 5.0)
            .build(),
        other => {
            if other != "stack" {
                log::warn!("Unknown scene '{}', using 'stack'", other);
            }
            builder
                .add_ground(0.0, 10.0, PhysicsMaterial::CONCRETE)
                .add_box("crate", Vector3::new(0.0, 0.5, 0.0), Vector3::splat(0.5), 5.0)
                .add_sphere("ball", Vector3::new(0.0, 3.0, 0.0), 0.5, 1.0)
                .add_sphere("side_ball", Vector3::new(3.0, 2.0, 0.0), 0.5, 1.0)
                .build()
        }
    }
}
