//! Scene nodes driven by physics bodies
//!
//! A node's transform lives in a shared cell so the frame listener installed
//! by [`SceneGraph::bind_body`] can write into it while the world ticks.

use std::cell::Cell;
use std::rc::Rc;

use jz_math::CoordinateFrame3D;
use jz_physics::{BodyKey, PhysicsError, World3D};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Key to a node in a [`SceneGraph`]
    pub struct NodeKey;
}

#[derive(Debug)]
struct NodeTransform {
    frame: Cell<CoordinateFrame3D>,
    dirty: Cell<bool>,
}

/// A named object in the scene, optionally following a physics body
#[derive(Debug)]
pub struct SceneNode {
    name: String,
    tags: Vec<String>,
    body: Option<BodyKey>,
    transform: Rc<NodeTransform>,
}

impl SceneNode {
    fn new(name: String) -> Self {
        Self {
            name,
            tags: Vec::new(),
            body: None,
            transform: Rc::new(NodeTransform {
                frame: Cell::new(CoordinateFrame3D::IDENTITY),
                // New nodes are dirty
                dirty: Cell::new(true),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Body this node follows, if bound
    pub fn body(&self) -> Option<BodyKey> {
        self.body
    }

    pub fn frame(&self) -> CoordinateFrame3D {
        self.transform.frame.get()
    }

    /// Set the frame and mark the node dirty
    pub fn set_frame(&self, frame: CoordinateFrame3D) {
        self.transform.frame.set(frame);
        self.transform.dirty.set(true);
    }

    /// True if the frame changed since the last [`SceneGraph::clear_dirty`]
    pub fn is_dirty(&self) -> bool {
        self.transform.dirty.get()
    }
}

/// Container of scene nodes
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with the given name and tags
    pub fn add_node(&mut self, name: impl Into<String>, tags: &[&str]) -> NodeKey {
        let mut node = SceneNode::new(name.into());
        node.tags = tags.iter().map(|t| t.to_string()).collect();
        self.nodes.insert(node)
    }

    /// Remove a node; a bound body's listener keeps writing into a detached cell
    /// until the body is removed or rebound
    pub fn remove_node(&mut self, key: NodeKey) -> Option<SceneNode> {
        self.nodes.remove(key)
    }

    pub fn get(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Get the first node with the given name
    pub fn get_by_name(&self, name: &str) -> Option<(NodeKey, &SceneNode)> {
        self.nodes.iter().find(|(_, node)| node.name == name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &SceneNode)> {
        self.nodes.iter()
    }

    /// Make `node` follow `body`
    ///
    /// The node takes the body's current frame immediately, then every tick
    /// that moves the body pushes the new frame into the node.
    pub fn bind_body(&mut self, node: NodeKey, world: &mut World3D, body: BodyKey) -> Result<(), PhysicsError> {
        let frame = *world.body(body).ok_or(PhysicsError::StaleBody(body))?.frame();
        let Some(scene_node) = self.nodes.get_mut(node) else {
            log::warn!("Cannot bind body {:?} to missing node {:?}", body, node);
            return Ok(());
        };

        let transform = Rc::clone(&scene_node.transform);
        world.set_frame_listener(body, move |_, frame| {
            transform.frame.set(*frame);
            transform.dirty.set(true);
        })?;
        scene_node.body = Some(body);
        scene_node.set_frame(frame);
        Ok(())
    }

    /// Nodes whose frame changed since the last clear
    pub fn dirty_nodes(&self) -> Vec<NodeKey> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.is_dirty())
            .map(|(key, _)| key)
            .collect()
    }

    pub fn has_dirty_nodes(&self) -> bool {
        self.nodes.values().any(SceneNode::is_dirty)
    }

    pub fn clear_dirty(&mut self) {
        for node in self.nodes.values() {
            node.transform.dirty.set(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jz_math::Vector3;
    use jz_physics::{BodyType, CollisionShape};

    #[test]
    fn test_add_and_find_node() {
        let mut graph = SceneGraph::new();
        let key = graph.add_node("ball", &["dynamic"]);
        let (found, node) = graph.get_by_name("ball").unwrap();
        assert_eq!(found, key);
        assert!(node.has_tag("dynamic"));
        assert!(!node.has_tag("static"));
        assert!(node.body().is_none());
    }

    #[test]
    fn test_new_nodes_are_dirty() {
        let mut graph = SceneGraph::new();
        let key = graph.add_node("a", &[]);
        assert_eq!(graph.dirty_nodes(), vec![key]);
        graph.clear_dirty();
        assert!(!graph.has_dirty_nodes());
    }

    #[test]
    fn test_bound_node_follows_body() {
        let mut world = World3D::new();
        let body = world.create(CollisionShape::sphere(0.5), BodyType::DYNAMIC, BodyType::ALL);
        world.set_translation(body, Vector3::new(0.0, 10.0, 0.0)).unwrap();

        let mut graph = SceneGraph::new();
        let node = graph.add_node("ball", &[]);
        graph.bind_body(node, &mut world, body).unwrap();
        assert_eq!(graph.get(node).unwrap().frame().translation.y, 10.0);
        graph.clear_dirty();

        world.tick(1.0 / 60.0);
        let scene_node = graph.get(node).unwrap();
        assert!(scene_node.is_dirty());
        assert_eq!(scene_node.frame(), *world.body(body).unwrap().frame());
        assert!(scene_node.frame().translation.y < 10.0);
    }

    #[test]
    fn test_static_body_node_stays_clean() {
        let mut world = World3D::new();
        let body = world.create(CollisionShape::cuboid(Vector3::ONE), BodyType::STATIC, BodyType::ALL);
        let mut graph = SceneGraph::new();
        let node = graph.add_node("ground", &["static"]);
        graph.bind_body(node, &mut world, body).unwrap();
        graph.clear_dirty();

        world.tick(1.0 / 60.0);
        assert!(!graph.has_dirty_nodes());
    }

    #[test]
    fn test_bind_stale_body_fails() {
        let mut world = World3D::new();
        let body = world.create(CollisionShape::sphere(0.5), BodyType::DYNAMIC, BodyType::ALL);
        world.remove(body);
        let mut graph = SceneGraph::new();
        let node = graph.add_node("ghost", &[]);
        assert_eq!(graph.bind_body(node, &mut world, body), Err(PhysicsError::StaleBody(body)));
    }
}
