//! jz - rigid-body physics demo application
//!
//! Wires the `jz_physics` world to layered configuration, a scene graph that
//! follows simulated bodies, and a frame-driven simulation system.

pub mod config;
pub mod scene;
pub mod systems;
