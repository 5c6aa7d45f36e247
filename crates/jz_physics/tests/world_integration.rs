//! End-to-end simulation scenarios for `World3D`

use std::cell::RefCell;
use std::rc::Rc;

use jz_math::{BoundingBox, CoordinateFrame3D, Quaternion, Vector3};
use jz_physics::{
    BodyKey, BodyType, CollisionShape, ContactEventKind, PhysicsConfig, PhysicsError, TriangleTree, World3D,
};

const DT: f32 = 1.0 / 60.0;

fn run(world: &mut World3D, seconds: f32) {
    let steps = (seconds / DT).round() as usize;
    for _ in 0..steps {
        world.tick(DT);
    }
}

fn ground_box(world: &mut World3D) -> BodyKey {
    let ground = world.create(CollisionShape::cuboid(Vector3::new(10.0, 1.0, 10.0)), BodyType::STATIC, BodyType::ALL);
    world.set_translation(ground, Vector3::ZERO).unwrap();
    ground
}

fn ball(world: &mut World3D, radius: f32, at: Vector3) -> BodyKey {
    let key = world.create(CollisionShape::sphere(radius), BodyType::DYNAMIC, BodyType::ALL);
    world.set_translation(key, at).unwrap();
    key
}

#[test]
fn test_free_fall_velocity() {
    let mut world = World3D::new();
    let key = ball(&mut world, 0.5, Vector3::new(0.0, 100.0, 0.0));
    let ticks = 30;
    for _ in 0..ticks {
        world.tick(DT);
    }
    let vy = world.body(key).unwrap().linear_velocity().y;
    assert!((vy - (-9.8 * ticks as f32 * DT)).abs() < 1e-3);
}

#[test]
fn test_sphere_comes_to_rest_on_box() {
    let mut world = World3D::new();
    world.create(CollisionShape::cuboid(Vector3::ONE), BodyType::STATIC, BodyType::ALL);
    let key = ball(&mut world, 0.5, Vector3::new(0.0, 5.0, 0.0));

    let mut lowest = f32::MAX;
    for _ in 0..240 {
        world.tick(DT);
        lowest = lowest.min(world.body(key).unwrap().translation().y);
    }
    assert!(lowest > 1.3, "sphere sank to y = {}", lowest);

    let body = world.body(key).unwrap();
    let y = body.translation().y;
    assert!(y > 1.45 && y < 1.55, "sphere settled at y = {}", y);
    assert!(body.linear_velocity().length() < 0.5);
}

#[test]
fn test_static_body_never_moves() {
    let mut world = World3D::new();
    let ground = ground_box(&mut world);
    world.set_linear_velocity(ground, Vector3::new(5.0, 0.0, 0.0)).unwrap();
    ball(&mut world, 0.5, Vector3::new(0.0, 1.2, 0.0));

    run(&mut world, 1.0);

    let body = world.body(ground).unwrap();
    assert_eq!(*body.frame(), CoordinateFrame3D::IDENTITY);
}

#[test]
fn test_two_overlapping_spheres_push_apart() {
    let mut world = World3D::with_config(PhysicsConfig::new(Vector3::ZERO));
    let a = ball(&mut world, 1.0, Vector3::ZERO);
    let b = ball(&mut world, 1.0, Vector3::new(1.0, 0.0, 0.0));

    let mut last = 1.0;
    for _ in 0..10 {
        world.tick(DT);
        let pa = world.body(a).unwrap().translation();
        let pb = world.body(b).unwrap().translation();
        let distance = (pb - pa).length();
        assert!(distance >= last);
        last = distance;
    }
    assert!(last > 1.9);
}

#[test]
fn test_sphere_rests_on_triangle_mesh() {
    let vertices = vec![
        Vector3::new(-5.0, 0.0, -5.0),
        Vector3::new(5.0, 0.0, -5.0),
        Vector3::new(5.0, 0.0, 5.0),
        Vector3::new(-5.0, 0.0, 5.0),
    ];
    let mesh = TriangleTree::new(vertices, vec![0u32, 2, 1, 0, 3, 2]).unwrap();

    let mut world = World3D::new();
    let floor = world.create(CollisionShape::from(mesh), BodyType::STATIC, BodyType::ALL);
    let key = ball(&mut world, 0.5, Vector3::new(2.0, 2.0, -2.0));

    run(&mut world, 3.0);

    let y = world.body(key).unwrap().translation().y;
    assert!(y > 0.45 && y < 0.55, "sphere settled at y = {}", y);
    assert_eq!(world.contacts(key, floor).len(), 1);
}

#[test]
fn test_box_lands_on_box() {
    let mut world = World3D::new();
    ground_box(&mut world);
    let key = world.create(CollisionShape::cuboid(Vector3::splat(0.5)), BodyType::DYNAMIC, BodyType::ALL);
    world.set_translation(key, Vector3::new(0.0, 2.5, 0.0)).unwrap();

    run(&mut world, 3.0);

    let y = world.body(key).unwrap().translation().y;
    assert!(y > 1.3 && y < 1.7, "box settled at y = {}", y);
}

#[test]
fn test_tilted_box_settles_flat() {
    let mut world = World3D::new();
    let ground = ground_box(&mut world);
    let key = world.create(CollisionShape::cuboid(Vector3::splat(0.5)), BodyType::DYNAMIC, BodyType::ALL);
    let tilt = Quaternion::from_axis_angle(Vector3::new(1.0, 0.0, 0.3), 0.5);
    world.set_frame(key, CoordinateFrame3D::new(tilt, Vector3::new(0.0, 2.5, 0.0))).unwrap();

    run(&mut world, 10.0);

    let body = world.body(key).unwrap();
    let speed = body.linear_velocity().length();
    let spin = body.angular_velocity().length();
    assert!(speed < 0.01, "box still moving at {}", speed);
    assert!(spin < 0.01, "box still spinning at {}", spin);
    let y = body.translation().y;
    assert!(y > 1.45 && y < 1.55, "box settled at y = {}", y);
    // Resting on a face: one contact per corner
    assert_eq!(world.contacts(ground, key).len(), 4);
}

#[test]
fn test_dynamic_triangle_tree_does_not_fall() {
    let vertices = vec![Vector3::ZERO, Vector3::X, Vector3::Z];
    let mesh = TriangleTree::new(vertices, vec![0u32, 2, 1]).unwrap();
    let mut world = World3D::new();
    let key = world.create(CollisionShape::from(mesh), BodyType::DYNAMIC, BodyType::ALL);
    world.set_translation(key, Vector3::new(0.0, 5.0, 0.0)).unwrap();

    run(&mut world, 1.0);

    let body = world.body(key).unwrap();
    assert!(body.is_static());
    assert_eq!(body.inverse_mass(), 0.0);
    assert_eq!(body.translation(), Vector3::new(0.0, 5.0, 0.0));
}

#[test]
fn test_kinematic_body_pushes_dynamic_body() {
    let mut world = World3D::with_config(PhysicsConfig::new(Vector3::ZERO));
    let pusher = world.create(CollisionShape::cuboid(Vector3::ONE), BodyType::KINEMATIC, BodyType::ALL);
    world.set_linear_velocity(pusher, Vector3::new(2.0, 0.0, 0.0)).unwrap();
    let target = ball(&mut world, 0.5, Vector3::new(2.0, 0.0, 0.0));

    run(&mut world, 1.0);

    assert!(world.body(target).unwrap().translation().x > 2.5);
    // The pusher keeps its velocity
    assert_eq!(world.body(pusher).unwrap().linear_velocity(), Vector3::new(2.0, 0.0, 0.0));
}

#[test]
fn test_set_frame_round_trip() {
    let mut world = World3D::new();
    let key = world.create(CollisionShape::cuboid(Vector3::new(1.0, 2.0, 3.0)), BodyType::DYNAMIC, BodyType::ALL);
    let frame = CoordinateFrame3D::new(
        Quaternion::from_axis_angle(Vector3::Y, std::f32::consts::FRAC_PI_2),
        Vector3::new(4.0, 5.0, 6.0),
    );
    world.set_frame(key, frame).unwrap();

    let body = world.body(key).unwrap();
    assert_eq!(*body.frame(), frame);
    assert_eq!(*body.prev_frame(), frame);
    let bounds = body.world_bounding();
    assert!((bounds.center() - Vector3::new(4.0, 5.0, 6.0)).length() < 1e-4);
    // Quarter turn about Y swaps the x and z extents
    assert!((bounds.half_extents() - Vector3::new(3.0, 2.0, 1.0)).length() < 1e-4);
}

#[test]
fn test_region_query_follows_bodies() {
    let mut world = World3D::with_config(PhysicsConfig::new(Vector3::ZERO));
    let key = ball(&mut world, 0.5, Vector3::ZERO);
    world.set_linear_velocity(key, Vector3::new(10.0, 0.0, 0.0)).unwrap();
    run(&mut world, 1.0);

    let origin = BoundingBox::from_center_half_extents(Vector3::ZERO, Vector3::ONE);
    let target = BoundingBox::from_center_half_extents(Vector3::new(10.0, 0.0, 0.0), Vector3::ONE);
    assert!(world.query(&origin).is_empty());
    assert_eq!(world.query(&target), vec![key]);
}

#[test]
fn test_collision_events_start_and_stop() {
    let mut world = World3D::new();
    let ground = ground_box(&mut world);
    let key = ball(&mut world, 0.5, Vector3::new(0.0, 2.0, 0.0));

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    world
        .set_collision_listener(ground, move |e| sink.borrow_mut().push(e.kind))
        .unwrap();

    run(&mut world, 2.0);
    assert_eq!(events.borrow().first(), Some(&ContactEventKind::Start));
    assert!(!events.borrow().contains(&ContactEventKind::Stop));

    // Launch the ball clear of the ground
    world.set_translation(key, Vector3::new(0.0, 20.0, 0.0)).unwrap();
    world.tick(DT);
    assert_eq!(events.borrow().last(), Some(&ContactEventKind::Stop));
}

#[test]
fn test_frame_listener_tracks_falling_body() {
    let mut world = World3D::new();
    let key = ball(&mut world, 0.5, Vector3::new(0.0, 10.0, 0.0));
    let heights = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&heights);
    world
        .set_frame_listener(key, move |_, frame| sink.borrow_mut().push(frame.translation.y))
        .unwrap();

    run(&mut world, 0.5);

    let heights = heights.borrow();
    assert_eq!(heights.len(), 30);
    assert!(heights.windows(2).all(|w| w[1] < w[0]));
}

#[test]
fn test_removed_key_is_stale() {
    let mut world = World3D::new();
    let key = ball(&mut world, 0.5, Vector3::ZERO);
    world.remove(key).unwrap();
    let replacement = ball(&mut world, 0.5, Vector3::ZERO);

    assert_ne!(key, replacement);
    assert!(world.body(key).is_none());
    assert_eq!(world.set_linear_velocity(key, Vector3::X), Err(PhysicsError::StaleBody(key)));
    assert_eq!(world.body_count(), 1);
}
