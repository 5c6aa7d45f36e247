//! jz - headless rigid-body simulation demo
//!
//! Loads the layered configuration, builds the configured demo scene and
//! runs it for `simulation.duration` seconds, then logs where every body
//! came to rest.

use jz::config::AppConfig;
use jz::scene::{demo_scene, Scene};
use jz::systems::SimulationSystem;
use jz_physics::{BodyKey, ContactEventKind};

fn init_logging(level: &str) {
    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn log_contacts(scene: &mut Scene) {
    let keys: Vec<BodyKey> = scene.world.body_keys().collect();
    for key in keys {
        let name = scene
            .graph
            .iter()
            .find(|(_, node)| node.body() == Some(key))
            .map(|(_, node)| node.name().to_string())
            .unwrap_or_else(|| format!("{:?}", key));
        let result = scene.world.set_collision_listener(key, move |event| match event.kind {
            ContactEventKind::Start => log::debug!(
                "{}: contact start, depth {:.4}",
                name,
                event.contact.penetration()
            ),
            ContactEventKind::Stop => log::debug!("{}: contact stop", name),
            ContactEventKind::Update => {}
        });
        if let Err(e) = result {
            log::warn!("{}", e);
        }
    }
}

fn main() {
    let config = AppConfig::load();
    let log_level = config
        .as_ref()
        .map(|c| c.debug.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_logging(&log_level);

    let config = config.unwrap_or_else(|e| {
        log::warn!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });

    let mut scene = demo_scene(&config.simulation.scene, config.physics.to_physics_config());
    log::info!(
        "Loaded scene '{}' with {} bodies",
        config.simulation.scene,
        scene.world.body_count()
    );
    if config.debug.log_contacts {
        log_contacts(&mut scene);
    }

    let mut simulation = SimulationSystem::new(config.simulation.max_frame_dt);
    let frame_dt = config.simulation.frame_dt;
    if !(frame_dt > 0.0) {
        log::error!("simulation.frame_dt must be positive, got {}", frame_dt);
        return;
    }

    let frames = (config.simulation.duration / frame_dt).ceil() as usize;
    let mut steps = 0;
    for _ in 0..frames {
        steps += simulation.update(&mut scene.world, &scene.graph, frame_dt).steps;
        scene.graph.clear_dirty();
    }
    log::info!("Simulated {} frames ({} physics steps)", frames, steps);

    for (_, node) in scene.graph.iter() {
        let Some(body) = node.body().and_then(|key| scene.world.body(key)) else {
            continue;
        };
        let p = body.translation();
        log::info!(
            "{:>10}: position ({:.3}, {:.3}, {:.3}), speed {:.3}",
            node.name(),
            p.x,
            p.y,
            p.z,
            body.linear_velocity().length()
        );
    }
}
