//! The player body: integration, jumping, status effects, and the
//! death-animation ragdoll.
//!
//! Frame-rate independence follows the frame-normalized model from
//! [`FrameContext`](headlong_core::input::FrameContext): motion scales by
//! `time_scale * dt_norm`, effect timers burn raw wall-clock milliseconds,
//! and the invincibility and death timers burn scaled milliseconds so
//! they stretch with slow motion.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use headlong_core::effect::{PowerupKind, StatusTimer};
use headlong_core::game_trait::{GameEvent, ParticleKind, SoundCue};
use headlong_core::input::FrameContext;
use headlong_core::rng::SeededStream;

use crate::chunk::Chunk;
use crate::collision;
use crate::geom::Rect;
use crate::tuning::Tuning;

/// Side length of a ragdoll fragment.
const DEATH_PART_SIZE: f32 = 20.0;

/// Which kind of jump fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Ground,
    Double,
}

/// A tumbling fragment of the defeated player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathPart {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub vx: f32,
    pub vy: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerBody {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub vx: f32,
    pub vy: f32,
    /// Facing, `1.0` right or `-1.0` left.
    pub direction: f32,
    pub on_ground: bool,
    /// Squash-and-stretch amount for the renderer, decays every tick.
    pub jump_squash: f32,
    pub double_jump_charges: u32,
    pub can_double_jump: bool,
    pub lives: u32,
    pub dead: bool,
    /// Scaled milliseconds since death, drives the respawn delay.
    pub death_timer_ms: f32,
    pub death_parts: Vec<DeathPart>,
    pub slow_fall: StatusTimer,
    pub fly: StatusTimer,
    pub shrink: StatusTimer,
    pub invincibility: StatusTimer,
}

impl PlayerBody {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            x: tuning.player.start_x,
            y: tuning.player.start_y,
            width: tuning.player.width,
            height: tuning.player.height,
            vx: 0.0,
            vy: 0.0,
            direction: 1.0,
            on_ground: false,
            jump_squash: 0.0,
            double_jump_charges: 0,
            can_double_jump: false,
            lives: tuning.player.start_lives,
            dead: false,
            death_timer_ms: 0.0,
            death_parts: Vec::new(),
            slow_fall: StatusTimer::default(),
            fly: StatusTimer::default(),
            shrink: StatusTimer::default(),
            invincibility: StatusTimer::default(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Try to jump. A grounded jump arms the double jump; the double jump
    /// itself needs both the arm and a stored charge.
    pub fn jump(&mut self, tuning: &Tuning) -> Option<JumpKind> {
        if self.on_ground {
            self.vy = -tuning.player.jump_power;
            self.on_ground = false;
            self.can_double_jump = true;
            self.jump_squash = 1.0;
            Some(JumpKind::Ground)
        } else if self.can_double_jump && self.double_jump_charges > 0 {
            self.vy = -tuning.player.jump_power;
            self.double_jump_charges -= 1;
            self.can_double_jump = false;
            self.jump_squash = 1.0;
            Some(JumpKind::Double)
        } else {
            None
        }
    }

    /// Apply a collected pickup. Returns `true` when this pickup just
    /// started the fly effect (the hover loop should start).
    pub fn collect_powerup(&mut self, kind: PowerupKind, tuning: &Tuning) -> bool {
        match kind {
            PowerupKind::DoubleJump => {
                self.double_jump_charges += 1;
                false
            }
            PowerupKind::SlowFall => {
                self.slow_fall.extend(tuning.powerups.slow_fall_ms);
                false
            }
            PowerupKind::Fly => {
                let started = !self.fly.active();
                self.fly.extend(tuning.powerups.fly_ms);
                started
            }
            PowerupKind::Shrink => {
                if !self.shrink.active() {
                    // Resize anchored at the bottom-center
                    let bottom = self.y + self.height;
                    let center_x = self.x + self.width / 2.0;
                    self.width = (tuning.player.width * tuning.powerups.shrink_scale)
                        .floor()
                        .max(tuning.powerups.min_dimension);
                    self.height = (tuning.player.height * tuning.powerups.shrink_scale)
                        .floor()
                        .max(tuning.powerups.min_dimension);
                    self.x = center_x - self.width / 2.0;
                    self.y = bottom - self.height;
                }
                self.shrink.extend(tuning.powerups.shrink_ms);
                false
            }
            PowerupKind::Speed => false,
            PowerupKind::Invincibility => {
                self.invincibility.extend(tuning.powerups.invincibility_ms);
                false
            }
            PowerupKind::Life => {
                self.lives = (self.lives + 1).min(tuning.player.max_lives);
                false
            }
        }
    }

    /// Kill the body: drop a life and break into two tumbling fragments
    /// inheriting half the player's horizontal momentum.
    pub fn die(&mut self, stream: &mut SeededStream) {
        if self.dead {
            return;
        }
        self.dead = true;
        self.death_timer_ms = 0.0;
        self.lives = self.lives.saturating_sub(1);
        let momentum = self.vx;

        let part_x = self.x + (self.width - DEATH_PART_SIZE) / 2.0;
        self.death_parts = vec![
            DeathPart {
                x: part_x,
                y: self.y,
                width: DEATH_PART_SIZE,
                height: DEATH_PART_SIZE,
                vx: momentum * 0.5 + (stream.next_f32() - 0.5) * 8.0,
                vy: -5.0 - stream.next_f32() * 3.0,
                rotation: 0.0,
                rotation_speed: (stream.next_f32() - 0.5) * 0.1,
            },
            DeathPart {
                x: part_x,
                y: self.y + 24.0,
                width: DEATH_PART_SIZE,
                height: DEATH_PART_SIZE,
                vx: momentum * 0.5 + (stream.next_f32() - 0.5) * 6.0,
                vy: -3.0 - stream.next_f32() * 2.0,
                rotation: 0.0,
                rotation_speed: (stream.next_f32() - 0.5) * 0.08,
            },
        ];
    }

    /// Bring the body back at a safe point with a grace window. Fly and
    /// slow-fall time carries over; shrink is undone.
    pub fn respawn(&mut self, x: f32, y: f32, tuning: &Tuning) {
        self.dead = false;
        self.death_parts.clear();
        self.death_timer_ms = 0.0;
        self.x = x;
        self.y = y;
        self.vx = 0.0;
        self.vy = 0.0;
        self.on_ground = false;
        self.can_double_jump = false;
        self.invincibility.set(tuning.session.spawn_invincibility_ms);
        if self.shrink.active() {
            let bottom = self.y + self.height;
            let center_x = self.x + self.width / 2.0;
            self.width = tuning.player.width;
            self.height = tuning.player.height;
            self.x = center_x - self.width / 2.0;
            self.y = bottom - self.height;
            self.shrink.clear();
        }
    }

    /// One simulation tick: input response, effect timers, integration,
    /// then terrain resolution. `effective_speed` is the walk cap with
    /// speed stacks already applied.
    pub fn update(
        &mut self,
        ctx: &FrameContext,
        chunks: &mut BTreeMap<i32, Chunk>,
        effective_speed: f32,
        tuning: &Tuning,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if self.invincibility.active() {
            self.invincibility.tick(ctx.scaled_ms());
        }

        let step = ctx.step();
        if self.dead {
            self.update_death_parts(chunks, step, tuning);
            self.death_timer_ms += ctx.scaled_ms();
            return events;
        }

        let max_speed = if ctx.input.run {
            tuning.player.run_speed
        } else {
            effective_speed
        };
        if ctx.input.left {
            if self.vx > -max_speed {
                self.vx -= tuning.player.accel * step;
            }
            self.direction = -1.0;
        } else if ctx.input.right {
            if self.vx < max_speed {
                self.vx += tuning.player.accel * step;
            }
            self.direction = 1.0;
        } else {
            // Friction is per tick, deliberately not step-scaled
            self.vx *= tuning.physics.friction;
        }

        let move_amount = self.vx * step;
        self.x += move_amount;

        if self.fly.active() {
            if ctx.input.jump {
                self.vy = -effective_speed;
            }
            if self.fly.tick(ctx.dt_ms) {
                events.push(GameEvent::Sound(SoundCue::FlyHoverStop));
            }
        }
        self.slow_fall.tick(ctx.dt_ms);
        if self.shrink.tick(ctx.dt_ms) {
            // Restore size, staying anchored at the bottom-center
            let bottom = self.y + self.height;
            let center_x = self.x + self.width / 2.0;
            self.width = tuning.player.width;
            self.height = tuning.player.height;
            self.x = center_x - self.width / 2.0;
            self.y = bottom - self.height;
        }

        let gravity = if self.slow_fall.active() {
            tuning.physics.slow_fall_gravity
        } else {
            tuning.physics.gravity
        };
        if !self.fly.active() {
            self.vy += gravity * step;
        }

        let vertical_move = self.vy * step;
        self.y += vertical_move;

        if self.jump_squash > 0.0 {
            self.jump_squash -= 0.08 * step;
        }

        let contact = collision::resolve_terrain(self, chunks, move_amount, vertical_move, tuning);
        if let Some((x, y)) = contact.pad_smoke {
            events.push(GameEvent::Sound(SoundCue::JumpPad));
            events.push(GameEvent::Particles {
                x,
                y,
                count: 30,
                kind: ParticleKind::PadSmoke,
            });
        }
        if contact.landing_impact.is_some() {
            events.push(GameEvent::Sound(SoundCue::Land));
        }
        events
    }

    /// Ragdoll physics for the two fragments: gravity, tumble, and a
    /// dampened bounce off platform tops.
    fn update_death_parts(&mut self, chunks: &BTreeMap<i32, Chunk>, step: f32, tuning: &Tuning) {
        for part in &mut self.death_parts {
            part.vy += tuning.physics.gravity * step;
            part.x += part.vx * step;
            part.y += part.vy * step;
            part.rotation += part.rotation_speed * step;

            for chunk in chunks.values() {
                for platform in &chunk.platforms {
                    if part.x + part.width > platform.x
                        && part.x < platform.right()
                        && part.y + part.height > platform.y
                        && part.y < platform.bottom()
                        && part.vy > 0.0
                        && part.y < platform.y - part.height / 2.0
                    {
                        part.y = platform.y - part.height;
                        part.vy = -part.vy * 0.5;
                        part.vx *= 0.8;
                        if part.vy.abs() < 1.0 {
                            part.vy = 0.0;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headlong_core::input::{InputSnapshot, FRAME_MS};

    fn idle_ctx() -> FrameContext {
        FrameContext::new(FRAME_MS, InputSnapshot::default())
    }

    fn jump_held_ctx() -> FrameContext {
        FrameContext::new(
            FRAME_MS,
            InputSnapshot {
                jump: true,
                ..InputSnapshot::default()
            },
        )
    }

    #[test]
    fn ground_jump_arms_double_jump() {
        let tuning = Tuning::default();
        let mut player = PlayerBody::new(&tuning);
        player.on_ground = true;

        assert_eq!(player.jump(&tuning), Some(JumpKind::Ground));
        assert_eq!(player.vy, -tuning.player.jump_power);
        assert!(!player.on_ground);
        assert!(player.can_double_jump);
    }

    #[test]
    fn double_jump_consumes_the_stored_charge() {
        let tuning = Tuning::default();
        let mut player = PlayerBody::new(&tuning);
        player.on_ground = true;
        player.double_jump_charges = 1;

        assert_eq!(player.jump(&tuning), Some(JumpKind::Ground));
        assert_eq!(player.jump(&tuning), Some(JumpKind::Double));
        assert_eq!(player.double_jump_charges, 0);
        assert_eq!(player.vy, -tuning.player.jump_power);
        assert!(!player.can_double_jump);
        assert_eq!(player.jump(&tuning), None, "No third jump without charges");
    }

    #[test]
    fn no_double_jump_from_a_fresh_fall() {
        let tuning = Tuning::default();
        let mut player = PlayerBody::new(&tuning);
        player.on_ground = false;
        player.can_double_jump = false;
        player.double_jump_charges = 2;

        assert_eq!(
            player.jump(&tuning),
            None,
            "Walking off an edge must not allow an air jump"
        );
    }

    #[test]
    fn shrink_resizes_anchored_at_the_feet() {
        let tuning = Tuning::default();
        let mut player = PlayerBody::new(&tuning);
        player.x = 100.0;
        player.y = 452.0; // feet at 500

        player.collect_powerup(PowerupKind::Shrink, &tuning);
        assert_eq!(player.width, 14.0);
        assert_eq!(player.height, 28.0);
        assert_eq!(player.y + player.height, 500.0, "Feet must stay planted");
        assert_eq!(player.x + player.width / 2.0, 112.0, "Center must not move");

        // A second pickup only extends the timer
        let before = (player.x, player.y, player.width, player.height);
        player.collect_powerup(PowerupKind::Shrink, &tuning);
        assert_eq!(
            (player.x, player.y, player.width, player.height),
            before
        );
        assert_eq!(
            player.shrink.remaining_ms(),
            2.0 * tuning.powerups.shrink_ms
        );
    }

    #[test]
    fn shrink_expiry_restores_base_dimensions() {
        let tuning = Tuning::default();
        let mut player = PlayerBody::new(&tuning);
        let mut chunks = BTreeMap::new();
        player.collect_powerup(PowerupKind::Shrink, &tuning);

        let ctx = FrameContext::new(tuning.powerups.shrink_ms + 1.0, InputSnapshot::default());
        player.update(&ctx, &mut chunks, 6.0, &tuning);

        assert!(!player.shrink.active());
        assert_eq!(player.width, tuning.player.width);
        assert_eq!(player.height, tuning.player.height);
    }

    #[test]
    fn fly_thrusts_while_jump_is_held() {
        let tuning = Tuning::default();
        let mut player = PlayerBody::new(&tuning);
        let mut chunks = BTreeMap::new();

        let started = player.collect_powerup(PowerupKind::Fly, &tuning);
        assert!(started, "First fly pickup starts the hover loop");
        assert!(
            !player.collect_powerup(PowerupKind::Fly, &tuning),
            "Stacked fly pickups extend without restarting"
        );

        let events = player.update(&jump_held_ctx(), &mut chunks, 6.0, &tuning);
        assert_eq!(player.vy, -6.0, "Thrust counters gravity completely");
        assert!(events.is_empty());

        // Burn the remaining time in one long frame
        let ctx = FrameContext::new(2.0 * tuning.powerups.fly_ms, InputSnapshot::default());
        let events = player.update(&ctx, &mut chunks, 6.0, &tuning);
        assert!(
            events.contains(&GameEvent::Sound(SoundCue::FlyHoverStop)),
            "Expiry must stop the hover loop"
        );
        assert!(!player.fly.active());
    }

    #[test]
    fn slow_fall_reduces_gravity() {
        let tuning = Tuning::default();
        let mut chunks = BTreeMap::new();

        let mut player = PlayerBody::new(&tuning);
        player.update(&idle_ctx(), &mut chunks, 6.0, &tuning);
        let normal_vy = player.vy;

        let mut player = PlayerBody::new(&tuning);
        player.collect_powerup(PowerupKind::SlowFall, &tuning);
        player.update(&idle_ctx(), &mut chunks, 6.0, &tuning);

        assert!((normal_vy - tuning.physics.gravity).abs() < 1e-4);
        assert!((player.vy - tuning.physics.slow_fall_gravity).abs() < 1e-4);
    }

    #[test]
    fn invincibility_burns_scaled_time() {
        let tuning = Tuning::default();
        let mut player = PlayerBody::new(&tuning);
        let mut chunks = BTreeMap::new();
        player.collect_powerup(PowerupKind::Invincibility, &tuning);

        let ctx = FrameContext::new(1000.0, InputSnapshot::default()).with_time_scale(0.5);
        player.update(&ctx, &mut chunks, 6.0, &tuning);
        assert_eq!(
            player.invincibility.remaining_ms(),
            tuning.powerups.invincibility_ms - 500.0,
            "Slow motion must stretch the grace window"
        );
    }

    #[test]
    fn lives_cap_at_the_maximum() {
        let tuning = Tuning::default();
        let mut player = PlayerBody::new(&tuning);
        player.collect_powerup(PowerupKind::Life, &tuning);
        assert_eq!(player.lives, tuning.player.max_lives);

        player.lives = 1;
        player.collect_powerup(PowerupKind::Life, &tuning);
        assert_eq!(player.lives, 2);
    }

    #[test]
    fn death_breaks_the_body_into_two_parts() {
        let tuning = Tuning::default();
        let mut player = PlayerBody::new(&tuning);
        player.x = 100.0;
        player.y = 300.0;
        player.vx = 4.0;
        let mut stream = SeededStream::new(9);

        player.die(&mut stream);
        assert!(player.dead);
        assert_eq!(player.lives, tuning.player.start_lives - 1);
        assert_eq!(player.death_parts.len(), 2);

        let head = &player.death_parts[0];
        let torso = &player.death_parts[1];
        assert_eq!(head.x, 102.0);
        assert_eq!(head.y, 300.0);
        assert_eq!(torso.y, 324.0);
        assert!(head.vy <= -5.0 && head.vy >= -8.0);
        assert!(torso.vy <= -3.0 && torso.vy >= -5.0);

        // Dying again while dead must not double-charge a life
        player.die(&mut stream);
        assert_eq!(player.lives, tuning.player.start_lives - 1);
    }

    #[test]
    fn death_parts_replay_identically_per_stream_seed() {
        let tuning = Tuning::default();
        let mut a = PlayerBody::new(&tuning);
        let mut b = PlayerBody::new(&tuning);
        a.die(&mut SeededStream::new(77));
        b.die(&mut SeededStream::new(77));
        assert_eq!(a.death_parts, b.death_parts);
    }

    #[test]
    fn dead_body_animates_parts_and_counts_down() {
        let tuning = Tuning::default();
        let mut player = PlayerBody::new(&tuning);
        let mut chunks = BTreeMap::new();
        player.die(&mut SeededStream::new(9));
        let start_y = player.death_parts[0].y;

        let events = player.update(&idle_ctx(), &mut chunks, 6.0, &tuning);
        assert!(events.is_empty(), "A dead body emits nothing");
        assert!((player.death_timer_ms - FRAME_MS).abs() < 1e-3);
        assert_ne!(player.death_parts[0].y, start_y, "Parts must keep moving");
    }

    #[test]
    fn respawn_restores_size_and_grants_grace() {
        let tuning = Tuning::default();
        let mut player = PlayerBody::new(&tuning);
        player.collect_powerup(PowerupKind::Shrink, &tuning);
        player.die(&mut SeededStream::new(9));

        player.respawn(400.0, 452.0, &tuning);
        assert!(!player.dead);
        assert!(player.death_parts.is_empty());
        assert_eq!(player.width, tuning.player.width);
        assert_eq!(player.height, tuning.player.height);
        assert!(!player.shrink.active());
        assert!(!player.can_double_jump);
        assert_eq!(
            player.invincibility.remaining_ms(),
            tuning.session.spawn_invincibility_ms
        );
        assert_eq!(
            player.y + player.height,
            452.0 + 28.0,
            "Un-shrinking keeps the feet where the spawn put them"
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn floor_chunks(floor: Rect) -> BTreeMap<i32, Chunk> {
            // The slab sits in every chunk the broad phase can probe, so
            // a long walk in either direction stays supported
            let mut chunks = BTreeMap::new();
            for index in -1..=1 {
                let mut chunk = Chunk::new(index, 800.0);
                chunk.platforms.push(floor);
                chunks.insert(index, chunk);
            }
            chunks
        }

        fn drive(player: &mut PlayerBody, m: f32, chunks: &mut BTreeMap<i32, Chunk>, tuning: &Tuning) {
            if m.abs() > 0.9 {
                player.jump(tuning);
            }
            let ctx = FrameContext::new(
                FRAME_MS,
                InputSnapshot {
                    left: m < -0.33,
                    right: m > 0.33,
                    ..InputSnapshot::default()
                },
            );
            player.update(&ctx, chunks, tuning.player.walk_speed, tuning);
        }

        proptest! {
            #[test]
            fn body_never_ends_a_tick_inside_the_floor(
                drop_y in 100.0f32..500.0,
                moves in proptest::collection::vec(-1.0f32..=1.0, 10..60)
            ) {
                let tuning = Tuning::default();
                let floor = Rect::new(-400.0, 620.0, 2000.0, 100.0);
                let mut chunks = floor_chunks(floor);
                let mut player = PlayerBody::new(&tuning);
                player.y = drop_y;

                for m in moves {
                    drive(&mut player, m, &mut chunks, &tuning);
                    prop_assert!(
                        !player.rect().overlaps(&floor),
                        "Body at y={} overlaps the floor top at {}",
                        player.y,
                        floor.y
                    );
                    if player.on_ground {
                        prop_assert!(
                            (player.y + player.height - floor.y).abs() < 1e-3,
                            "Grounded feet drifted to {}",
                            player.y + player.height
                        );
                    }
                }
            }

            #[test]
            fn horizontal_speed_stays_bounded(
                moves in proptest::collection::vec(-1.0f32..=1.0, 20..80)
            ) {
                let tuning = Tuning::default();
                let mut chunks = floor_chunks(Rect::new(-400.0, 620.0, 2000.0, 100.0));
                let mut player = PlayerBody::new(&tuning);
                let cap = tuning.player.run_speed + tuning.player.accel;

                for m in moves {
                    drive(&mut player, m, &mut chunks, &tuning);
                    prop_assert!(
                        player.vx.abs() <= cap + 1e-3,
                        "vx={} exceeds the acceleration-bounded cap {}",
                        player.vx,
                        cap
                    );
                }
            }
        }
    }
}
