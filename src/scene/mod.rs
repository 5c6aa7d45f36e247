//! Scene construction utilities
//!
//! This module provides scene nodes bound to physics bodies and a
//! declarative API for building physics scenes.

mod scene_builder;
mod scene_graph;

pub use scene_builder::{demo_scene, Scene, SceneBuilder};
pub use scene_graph::{NodeKey, SceneGraph, SceneNode};
