use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::effect::PowerupKind;
use crate::input::FrameContext;

/// Core trait a Headlong game session implements.
///
/// The embedding shell owns input devices, rendering, audio, and score
/// persistence; the session only simulates and reports what happened each
/// tick as a batch of [`GameEvent`]s.
pub trait HeadlongGame: Send + Sync {
    /// Session metadata for the shell's menu screen.
    fn metadata(&self) -> GameMetadata;

    /// Called once to start a fresh run.
    fn init(&mut self, config: &GameConfig);

    /// Called each frame. Returns the events produced by this tick.
    fn update(&mut self, ctx: &FrameContext) -> Vec<GameEvent>;

    /// Serialize the full session state for save/restore or replay capture.
    fn serialize_state(&self) -> Vec<u8>;

    /// Apply a previously serialized state.
    fn apply_state(&mut self, state: &[u8]);

    /// Whether the shell may pause this session.
    fn supports_pause(&self) -> bool {
        true
    }

    /// Called when the shell pauses gameplay.
    fn pause(&mut self);

    /// Called when gameplay should resume.
    fn resume(&mut self);

    /// Whether the run has ended (out of lives, game-over delay elapsed).
    fn is_run_complete(&self) -> bool;

    /// Final numbers for the completed run.
    fn run_results(&self) -> RunSummary;
}

/// Session metadata for the shell's menu screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub name: String,
    pub description: String,
}

/// Visible play area in pixels. Supplied by the shell; the simulation
/// uses it for fall-death and culling bounds, never for drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Configuration for a game session.
///
/// `custom` carries optional per-run overrides as JSON values; the only
/// key the runner reads is `"seed"` (u64) to pin world generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    pub viewport: Viewport,
    pub custom: HashMap<String, serde_json::Value>,
}

/// Events emitted by a session during update.
///
/// Fire-and-forget: the shell routes sounds to the mixer, particle
/// requests to the effect layer, and coin awards to the economy. Nothing
/// here feeds back into the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(SoundCue),
    Particles {
        x: f32,
        y: f32,
        count: u32,
        kind: ParticleKind,
    },
    PowerupCollected {
        kind: PowerupKind,
    },
    CoinsAwarded {
        amount: u32,
        source: CoinSource,
    },
    LifeLost {
        lives_left: u32,
        cause: DeathCause,
    },
    Respawned {
        x: f32,
        y: f32,
    },
    RunOver(RunSummary),
}

/// Sound cues the shell's mixer knows how to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    Jump,
    DoubleJump,
    Land,
    JumpPad,
    CollectPowerup,
    PlayerDie,
    /// Start the looping hover sound (fly effect engaged).
    FlyHoverStart,
    /// Stop the looping hover sound (fly effect lapsed).
    FlyHoverStop,
}

/// Particle burst variants the shell's effect layer renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Burst,
    SparkBurst,
    PadSmoke,
    DeathBurst,
}

/// Why a coin award happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinSource {
    Pickup,
    WalkerKill,
    FlyerKill,
    Milestone { distance_m: u32 },
}

/// What killed the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Spike,
    Spinner,
    Enemy,
    Fell,
}

/// Final numbers for a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub distance_m: u32,
    pub time_ms: f32,
    pub coins: u32,
}
