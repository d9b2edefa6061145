use serde::{Deserialize, Serialize};

/// Gravity per normalized frame, downward positive (screen-space Y).
pub const GRAVITY: f32 = 0.6;
/// Gravity while the slow-fall effect is active.
pub const SLOW_FALL_GRAVITY: f32 = 0.2;
/// Horizontal velocity retained per frame with no input held.
pub const FRICTION: f32 = 0.8;
/// Walk speed cap (px/frame). Speed stacks multiply this.
pub const WALK_SPEED: f32 = 6.0;
/// Run speed cap (px/frame).
pub const RUN_SPEED: f32 = 8.0;
/// Upward velocity of a normal or double jump.
pub const JUMP_POWER: f32 = 12.0;
/// Upward velocity of a jump pad launch.
pub const PAD_LAUNCH_VY: f32 = -25.0;
/// Horizontal width of one terrain chunk in px.
pub const CHUNK_WIDTH: f32 = 800.0;
/// Height of the nominal ground band at the bottom of the viewport.
pub const GROUND_HEIGHT: f32 = 100.0;

/// Player body and movement parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub width: f32,
    pub height: f32,
    pub walk_speed: f32,
    pub run_speed: f32,
    pub accel: f32,
    pub jump_power: f32,
    pub start_lives: u32,
    pub max_lives: u32,
    pub start_x: f32,
    pub start_y: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            width: 24.0,
            height: 48.0,
            walk_speed: WALK_SPEED,
            run_speed: RUN_SPEED,
            accel: 2.0,
            jump_power: JUMP_POWER,
            start_lives: 3,
            max_lives: 3,
            start_x: 100.0,
            start_y: 300.0,
        }
    }
}

/// Forces and impulses, all per normalized 60 Hz frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    pub gravity: f32,
    pub slow_fall_gravity: f32,
    pub friction: f32,
    pub pad_launch_vy: f32,
    pub stomp_bounce_vy: f32,
    pub flyer_stomp_bounce_vy: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            slow_fall_gravity: SLOW_FALL_GRAVITY,
            friction: FRICTION,
            pad_launch_vy: PAD_LAUNCH_VY,
            stomp_bounce_vy: -8.0,
            flyer_stomp_bounce_vy: -15.0,
        }
    }
}

/// World geometry and streaming parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub chunk_width: f32,
    pub ground_height: f32,
    pub spike_size: f32,
    /// Spike hitboxes are inflated by this margin when tested.
    pub spike_margin: f32,
    pub pad_size: f32,
    pub spinner_size: f32,
    pub powerup_size: f32,
    /// How far below the viewport bottom the player can fall before dying.
    pub fall_death_margin: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            chunk_width: CHUNK_WIDTH,
            ground_height: GROUND_HEIGHT,
            spike_size: 20.0,
            spike_margin: 2.0,
            pad_size: 20.0,
            spinner_size: 40.0,
            powerup_size: 30.0,
            fall_death_margin: 100.0,
        }
    }
}

/// Effect durations and the speed-stack shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerupTuning {
    pub slow_fall_ms: f32,
    pub fly_ms: f32,
    pub shrink_ms: f32,
    pub invincibility_ms: f32,
    pub speed_stack_ms: f32,
    pub max_speed_stacks: usize,
    pub shrink_scale: f32,
    /// Shrunk dimensions never go below this many px.
    pub min_dimension: f32,
}

impl Default for PowerupTuning {
    fn default() -> Self {
        Self {
            slow_fall_ms: 5000.0,
            fly_ms: 2000.0,
            shrink_ms: 5000.0,
            invincibility_ms: 5000.0,
            speed_stack_ms: 12000.0,
            max_speed_stacks: 5,
            shrink_scale: 0.6,
            min_dimension: 8.0,
        }
    }
}

/// Run lifecycle timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    pub respawn_delay_ms: f32,
    pub spawn_invincibility_ms: f32,
    pub game_over_delay_ms: f32,
    /// Horizontal half-band around the player inside which pickups are
    /// tested each tick.
    pub pickup_scan_range: f32,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            respawn_delay_ms: 3000.0,
            spawn_invincibility_ms: 3000.0,
            game_over_delay_ms: 2100.0,
            pickup_scan_range: 100.0,
        }
    }
}

/// Top-level gameplay tuning, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub physics: PhysicsTuning,
    pub world: WorldTuning,
    pub powerups: PowerupTuning,
    pub session: SessionTuning,
}

impl Tuning {
    /// Load tuning from a TOML file. Falls back to defaults if the file is
    /// missing or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("HEADLONG_TUNING")
            .unwrap_or_else(|_| "config/headlong.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<Tuning>(&content) {
                Ok(tuning) => tuning,
                Err(e) => {
                    tracing::warn!("Failed to parse {path}: {e}, using defaults");
                    Tuning::default()
                },
            },
            Err(_) => Tuning::default(),
        }
    }

    /// Nominal ground surface Y for a given viewport height.
    pub fn ground_y(&self, viewport_height: f32) -> f32 {
        viewport_height - self.world.ground_height
    }
}
