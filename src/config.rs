//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`JZ_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use jz_math::Vector3;
use jz_physics::PhysicsConfig;
use serde::{Serialize, Deserialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Physics world configuration
    #[serde(default)]
    pub physics: PhysicsSection,
    /// Frame loop configuration
    #[serde(default)]
    pub simulation: SimulationSection,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugSection,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`JZ_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Load user config (optional)
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // Environment variables override everything
        // JZ_PHYSICS__UNIT_METER=100 -> physics.unit_meter = 100
        figment = figment.merge(Env::prefixed("JZ_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Physics world configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSection {
    /// Gravity acceleration [x, y, z] in meters per second squared
    pub gravity: [f32; 3],
    /// World units per meter
    pub unit_meter: f32,
    /// Fixed step length in seconds
    pub time_step: f32,
    /// Most fixed steps run per tick; a backstop behind `simulation.max_frame_dt`
    pub max_sub_steps: u32,
    /// Fraction of penetration removed per step
    pub position_correction: f32,
    /// Penetration (meters) tolerated before projection kicks in
    pub penetration_slop: f32,
}

impl Default for PhysicsSection {
    fn default() -> Self {
        let defaults = PhysicsConfig::default();
        Self {
            gravity: [defaults.gravity.x, defaults.gravity.y, defaults.gravity.z],
            unit_meter: defaults.unit_meter,
            time_step: defaults.time_step,
            max_sub_steps: defaults.max_sub_steps,
            position_correction: defaults.position_correction,
            penetration_slop: defaults.penetration_slop,
        }
    }
}

impl PhysicsSection {
    /// Convert to the physics library's configuration
    pub fn to_physics_config(&self) -> PhysicsConfig {
        let [x, y, z] = self.gravity;
        PhysicsConfig {
            gravity: Vector3::new(x, y, z),
            unit_meter: self.unit_meter,
            time_step: self.time_step,
            max_sub_steps: self.max_sub_steps,
            position_correction: self.position_correction,
            penetration_slop: self.penetration_slop,
        }
    }
}

/// Frame loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    /// Demo scene to run ("stack" or "terrain")
    pub scene: String,
    /// Seconds of simulated time the headless run covers
    pub duration: f32,
    /// Frame delta fed to the world each frame
    pub frame_dt: f32,
    /// Longest frame delta passed to the world; longer frames are clamped
    ///
    /// This clamp is the one that shapes a long frame. Keep it within
    /// `physics.max_sub_steps * physics.time_step` so a clamped frame never
    /// also loses steps to the world's sub-step cap.
    pub max_frame_dt: f32,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            scene: "stack".to_string(),
            duration: 5.0,
            frame_dt: 1.0 / 60.0,
            max_frame_dt: 0.25,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSection {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Log every contact start and stop
    pub log_contacts: bool,
}

impl Default for DebugSection {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_contacts: false,
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}
