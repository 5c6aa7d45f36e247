//! Simulation system
//!
//! Feeds frame time into the physics world:
//! - Delta time measurement
//! - Frame delta clamping
//! - Physics ticking

use std::time::Instant;

use jz_physics::World3D;

use crate::scene::SceneGraph;

/// Result of a simulation update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationResult {
    /// Frame delta actually handed to the world
    pub dt: f32,
    /// Fixed steps the world ran
    pub steps: usize,
    /// Whether any scene node moved
    pub nodes_dirty: bool,
}

/// Drives the physics world from frame time
///
/// Frame deltas longer than `max_frame_dt` are clamped before they reach
/// the world, so a stall (first frame, debugger pause) does not turn into
/// a burst of catch-up steps. This clamp owns long frames; the world's
/// `max_sub_steps` only catches callers that skip it.
pub struct SimulationSystem {
    last_frame: Instant,
    max_frame_dt: f32,
}

impl SimulationSystem {
    /// Create a new simulation system
    pub fn new(max_frame_dt: f32) -> Self {
        Self {
            last_frame: Instant::now(),
            max_frame_dt,
        }
    }

    pub fn max_frame_dt(&self) -> f32 {
        self.max_frame_dt
    }

    /// Advance the world by a given frame delta
    pub fn update(&mut self, world: &mut World3D, graph: &SceneGraph, frame_dt: f32) -> SimulationResult {
        let dt = frame_dt.min(self.max_frame_dt);
        let steps = world.tick(dt);
        SimulationResult {
            dt,
            steps,
            nodes_dirty: graph.has_dirty_nodes(),
        }
    }

    /// Advance the world by the wall-clock time since the last call
    pub fn update_realtime(&mut self, world: &mut World3D, graph: &SceneGraph) -> SimulationResult {
        let now = Instant::now();
        let raw_dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.update(world, graph, raw_dt)
    }
}

impl Default for SimulationSystem {
    fn default() -> Self {
        Self::new(0.25)
    }
}
