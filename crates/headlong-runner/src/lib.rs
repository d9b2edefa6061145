//! Headlong: an endless-runner platformer over deterministic,
//! chunk-streamed terrain.
//!
//! [`EndlessRunner`] is the [`HeadlongGame`] session. Each tick it applies
//! input edges, steps the player and the world, slides the chunk window,
//! pays out milestones, and resolves pickups and hazards, reporting
//! everything observable as [`GameEvent`]s. The whole run replays
//! bit-identically from a world seed and the input sequence.

pub mod chunk;
pub mod collision;
pub mod enemy;
pub mod geom;
pub mod physics;
pub mod powerups;
pub mod scoring;
pub mod tuning;
pub mod world;
pub mod worldgen;

use serde::{Deserialize, Serialize};

use headlong_core::effect::PowerupKind;
use headlong_core::game_trait::{
    CoinSource, DeathCause, GameConfig, GameEvent, GameMetadata, HeadlongGame, ParticleKind,
    RunSummary, SoundCue, Viewport,
};
use headlong_core::input::FrameContext;

use crate::collision::HazardHit;
use crate::physics::{JumpKind, PlayerBody};
use crate::powerups::PowerupSystem;
use crate::scoring::MilestoneLedger;
use crate::tuning::Tuning;
use crate::world::WorldState;

/// Everything that must survive a save/restore or replay cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub player: PlayerBody,
    pub world: WorldState,
    pub powerups: PowerupSystem,
    pub milestones: MilestoneLedger,
    /// Wall-clock run time, frozen while dead.
    pub timer_ms: f32,
    pub coins: u32,
    /// Last tick's jump input, for press-edge detection.
    pub prev_jump_held: bool,
    pub game_over_elapsed_ms: f32,
    pub run_complete: bool,
}

impl RunState {
    fn fresh(seed: u64, viewport: Viewport, tuning: &Tuning) -> Self {
        let mut world = WorldState::new(seed, viewport);
        world.reset(tuning);
        Self {
            player: PlayerBody::new(tuning),
            world,
            powerups: PowerupSystem::new(),
            milestones: MilestoneLedger::new(),
            timer_ms: 0.0,
            coins: 0,
            prev_jump_held: false,
            game_over_elapsed_ms: 0.0,
            run_complete: false,
        }
    }
}

/// The endless-runner session.
#[derive(Debug)]
pub struct EndlessRunner {
    state: RunState,
    tuning: Tuning,
    paused: bool,
}

impl EndlessRunner {
    /// A session with tuning loaded from the environment.
    pub fn new() -> Self {
        Self::with_tuning(Tuning::load())
    }

    /// A session with explicit tuning. The world is a placeholder until
    /// [`HeadlongGame::init`] seeds a real run.
    pub fn with_tuning(tuning: Tuning) -> Self {
        let state = RunState::fresh(0, Viewport::default(), &tuning);
        Self {
            state,
            tuning,
            paused: false,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn world(&self) -> &WorldState {
        &self.state.world
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Drop a random pickup on a safe platform just ahead (debug command).
    pub fn debug_spawn_powerup(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if let Some((kind, x, y)) =
            powerups::spawn_powerup_ahead(&mut self.state.world, &self.state.player, &self.tuning)
        {
            tracing::debug!(?kind, x, y, "Debug powerup spawned");
            events.push(GameEvent::Particles {
                x,
                y,
                count: 10,
                kind: ParticleKind::SparkBurst,
            });
        }
        events
    }

    /// Drop a walker on a wide platform ahead (debug command).
    pub fn debug_spawn_walker(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if let Some((x, y)) =
            powerups::spawn_walker_ahead(&mut self.state.world, &self.state.player, &self.tuning)
        {
            events.push(GameEvent::Particles {
                x,
                y,
                count: 8,
                kind: ParticleKind::Burst,
            });
        }
        events
    }

    /// Drop a flyer ahead of the player (debug command).
    pub fn debug_spawn_flyer(&mut self) -> Vec<GameEvent> {
        let (x, y) = powerups::spawn_flyer_ahead(&mut self.state.world, &self.state.player);
        vec![GameEvent::Particles {
            x,
            y,
            count: 8,
            kind: ParticleKind::Burst,
        }]
    }
}

impl Default for EndlessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlongGame for EndlessRunner {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Headlong".to_string(),
            description: "Endless runner over procedurally generated terrain".to_string(),
        }
    }

    fn init(&mut self, config: &GameConfig) {
        let seed = config
            .custom
            .get("seed")
            .and_then(|v| v.as_u64())
            .unwrap_or_else(rand::random);
        self.state = RunState::fresh(seed, config.viewport, &self.tuning);
        self.paused = false;
        tracing::info!(seed, "Run started");
    }

    fn update(&mut self, ctx: &FrameContext) -> Vec<GameEvent> {
        if self.paused || self.state.run_complete || !ctx.is_valid() {
            return Vec::new();
        }
        let tuning = &self.tuning;
        let state = &mut self.state;
        let mut events = Vec::new();

        state.powerups.tick(ctx.dt_ms);
        if !state.player.dead {
            state.timer_ms += ctx.dt_ms;
        }

        // Jumps fire on the press edge, never while held
        if ctx.input.jump && !state.prev_jump_held && !state.player.dead {
            match state.player.jump(tuning) {
                Some(JumpKind::Ground) => {
                    events.push(GameEvent::Sound(SoundCue::Jump));
                    events.push(GameEvent::Particles {
                        x: state.player.x + state.player.width / 2.0,
                        y: state.player.y + state.player.height,
                        count: 12,
                        kind: ParticleKind::Burst,
                    });
                }
                Some(JumpKind::Double) => {
                    events.push(GameEvent::Sound(SoundCue::DoubleJump));
                    events.push(GameEvent::Particles {
                        x: state.player.x + state.player.width / 2.0,
                        y: state.player.y + state.player.height,
                        count: 12,
                        kind: ParticleKind::SparkBurst,
                    });
                }
                None => {}
            }
        }
        state.prev_jump_held = ctx.input.jump;

        let effective_speed = state.powerups.effective_speed(tuning.player.walk_speed);
        events.extend(
            state
                .player
                .update(ctx, &mut state.world.chunks, effective_speed, tuning),
        );

        state
            .world
            .update(state.player.x, !state.player.dead, ctx.step(), tuning);
        state
            .world
            .ensure_window(state.player.x, state.player.lives, tuning);

        let distance = scoring::distance_m(state.player.x, tuning.player.start_x);
        for (milestone_m, coins) in state.milestones.advance(distance) {
            state.coins += coins;
            events.push(GameEvent::CoinsAwarded {
                amount: coins,
                source: CoinSource::Milestone {
                    distance_m: milestone_m,
                },
            });
        }

        if !state.player.dead {
            for kind in collision::collect_powerups(&state.player, &mut state.world, tuning) {
                events.push(GameEvent::Sound(SoundCue::CollectPowerup));
                if state.player.collect_powerup(kind, tuning) {
                    events.push(GameEvent::Sound(SoundCue::FlyHoverStart));
                }
                if kind == PowerupKind::Speed {
                    state.powerups.on_speed_pickup(tuning);
                }
                state.coins += scoring::PICKUP_COINS;
                events.push(GameEvent::PowerupCollected { kind });
                events.push(GameEvent::CoinsAwarded {
                    amount: scoring::PICKUP_COINS,
                    source: CoinSource::Pickup,
                });
            }
        }

        let mut fatal: Option<DeathCause> = None;
        if !state.player.dead && !state.player.invincibility.active() {
            match collision::check_hazards(
                &state.player,
                &state.world.chunks,
                &mut state.world.walkers,
                &mut state.world.flyers,
                tuning,
            ) {
                HazardHit::None => {}
                HazardHit::Stomp(kill) => {
                    state.player.vy = kill.bounce_vy;
                    events.push(GameEvent::Particles {
                        x: kill.x,
                        y: kill.y,
                        count: kill.particles,
                        kind: ParticleKind::Burst,
                    });
                    let (reward, source) = if kill.flyer {
                        (scoring::FLYER_KILL_COINS, CoinSource::FlyerKill)
                    } else {
                        (scoring::WALKER_KILL_COINS, CoinSource::WalkerKill)
                    };
                    state.coins += reward;
                    events.push(GameEvent::Sound(SoundCue::CollectPowerup));
                    events.push(GameEvent::CoinsAwarded {
                        amount: reward,
                        source,
                    });
                }
                HazardHit::Lethal(cause) => fatal = Some(cause),
            }
        }

        if !state.player.dead
            && state.player.y > state.world.viewport.height + tuning.world.fall_death_margin
        {
            fatal.get_or_insert(DeathCause::Fell);
        }

        if let Some(cause) = fatal {
            let was_flying = state.player.fly.active();
            let mut stream = state.world.spawn_stream();
            state.player.die(&mut stream);
            if was_flying {
                events.push(GameEvent::Sound(SoundCue::FlyHoverStop));
            }
            events.push(GameEvent::Sound(SoundCue::PlayerDie));
            events.push(GameEvent::Particles {
                x: state.player.x + state.player.width / 2.0,
                y: state.player.y + 24.0,
                count: 15,
                kind: ParticleKind::DeathBurst,
            });
            events.push(GameEvent::LifeLost {
                lives_left: state.player.lives,
                cause,
            });
            tracing::debug!(?cause, lives_left = state.player.lives, "Player died");
        }

        if state.player.dead
            && state.player.lives > 0
            && state.player.death_timer_ms > tuning.session.respawn_delay_ms
        {
            let (x, y) = collision::find_safe_spawn_point(
                &state.world,
                state.player.x,
                state.player.width,
                state.player.height,
                tuning,
            );
            state.player.respawn(x, y, tuning);
            events.push(GameEvent::Respawned { x, y });
        }

        if state.player.dead && state.player.lives == 0 {
            state.game_over_elapsed_ms += ctx.dt_ms;
            if state.game_over_elapsed_ms >= tuning.session.game_over_delay_ms {
                state.run_complete = true;
                let summary = RunSummary {
                    distance_m: distance,
                    time_ms: state.timer_ms,
                    coins: state.coins,
                };
                tracing::info!(
                    distance_m = distance,
                    coins = state.coins,
                    "Run complete"
                );
                events.push(GameEvent::RunOver(summary));
            }
        }

        events
    }

    fn serialize_state(&self) -> Vec<u8> {
        rmp_serde::to_vec(&self.state).expect("game state serialization must succeed")
    }

    fn apply_state(&mut self, state: &[u8]) {
        match rmp_serde::from_slice::<RunState>(state) {
            Ok(restored) => self.state = restored,
            Err(e) => tracing::warn!("Failed to apply serialized state: {e}"),
        }
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn is_run_complete(&self) -> bool {
        self.state.run_complete
    }

    fn run_results(&self) -> RunSummary {
        RunSummary {
            distance_m: scoring::distance_m(self.state.player.x, self.tuning.player.start_x),
            time_ms: self.state.timer_ms,
            coins: self.state.coins,
        }
    }
}
