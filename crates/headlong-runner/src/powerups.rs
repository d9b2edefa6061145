use serde::{Deserialize, Serialize};

use headlong_core::effect::PowerupKind;

use crate::collision;
use crate::enemy::{Flyer, FlightPattern};
use crate::geom::{dist, Rect};
use crate::physics::PlayerBody;
use crate::tuning::Tuning;
use crate::world::WorldState;
use crate::worldgen;

/// How far ahead of the player a summoned pickup is aimed.
const PICKUP_AHEAD: f32 = 120.0;
/// How far ahead of the player a summoned enemy is aimed.
const ENEMY_AHEAD: f32 = 150.0;
/// Chunk offsets scanned when placing something ahead of the player.
const SPAWN_SEARCH_OFFSETS: [i32; 5] = [0, 1, -1, 2, -2];

/// A collectible floating in the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Powerup {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub kind: PowerupKind,
    pub collected: bool,
}

impl Powerup {
    pub fn new(x: f32, y: f32, kind: PowerupKind, size: f32) -> Self {
        Self {
            x,
            y,
            width: size,
            height: size,
            kind,
            collected: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Bookkeeping for the stacking speed effect.
///
/// Each pickup adds an independently timed stack; the player's speed is
/// multiplied by `2^stacks`. At the cap, another pickup refreshes the
/// oldest stack instead of adding one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerupSystem {
    speed_stacks: Vec<f32>,
    multiplier: f32,
}

impl PowerupSystem {
    pub fn new() -> Self {
        Self {
            speed_stacks: Vec::new(),
            multiplier: 1.0,
        }
    }

    pub fn reset(&mut self) {
        self.speed_stacks.clear();
        self.multiplier = 1.0;
    }

    pub fn on_speed_pickup(&mut self, tuning: &Tuning) {
        if self.speed_stacks.len() < tuning.powerups.max_speed_stacks {
            self.speed_stacks.push(tuning.powerups.speed_stack_ms);
        } else {
            // Refresh the oldest stack instead of adding a new one
            self.speed_stacks[0] = tuning.powerups.speed_stack_ms;
        }
        self.recompute_multiplier();
    }

    /// Count down every stack and drop the expired ones.
    pub fn tick(&mut self, dt_ms: f32) {
        if self.speed_stacks.is_empty() {
            return;
        }
        for stack in &mut self.speed_stacks {
            *stack -= dt_ms;
        }
        self.speed_stacks.retain(|&remaining| remaining > 0.0);
        self.recompute_multiplier();
    }

    fn recompute_multiplier(&mut self) {
        self.multiplier = 2f32.powi(self.speed_stacks.len() as i32).max(1.0);
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn stack_count(&self) -> usize {
        self.speed_stacks.len()
    }

    /// Walk-speed cap with all active stacks applied.
    pub fn effective_speed(&self, base_speed: f32) -> f32 {
        base_speed * self.multiplier
    }

    /// Total remaining boost time across all stacks, for the HUD.
    pub fn total_remaining_ms(&self) -> f32 {
        self.speed_stacks.iter().map(|&ms| ms.max(0.0)).sum()
    }
}

/// Drop a random pickup on a safe platform ahead of the player. Returns
/// the kind and center of the placed pickup, or `None` if no spot
/// qualified (a silent outcome, same as generation-time rejection).
pub fn spawn_powerup_ahead(
    world: &mut WorldState,
    player: &PlayerBody,
    tuning: &Tuning,
) -> Option<(PowerupKind, f32, f32)> {
    let mut stream = world.spawn_stream();
    let mut kinds = vec![
        PowerupKind::DoubleJump,
        PowerupKind::SlowFall,
        PowerupKind::Fly,
        PowerupKind::Shrink,
        PowerupKind::Speed,
        PowerupKind::Invincibility,
    ];
    if player.lives < 2 && !world.life_powerup_present {
        kinds.push(PowerupKind::Life);
    }
    let kind = kinds[stream.pick_index(kinds.len())];

    let size = tuning.world.powerup_size;
    let desired_x = player.x + PICKUP_AHEAD;
    let base_chunk = (desired_x / tuning.world.chunk_width).floor() as i32;

    let mut target = None;
    'search: for off in SPAWN_SEARCH_OFFSETS {
        let Some(chunk) = world.chunks.get(&(base_chunk + off)) else {
            continue;
        };
        let mut platforms = chunk.platforms.clone();
        platforms.sort_by(|a, b| {
            let da = (a.center_x() - desired_x).abs();
            let db = (b.center_x() - desired_x).abs();
            da.total_cmp(&db)
        });
        for plat in &platforms {
            if !collision::is_platform_safe_for_spawn(chunk, plat, player.width, player.height) {
                continue;
            }
            let px = plat.center_x() - size / 2.0;
            let py = plat.y - size - 5.0;
            let too_close = world
                .powerups
                .iter()
                .any(|p| !p.collected && dist(p.x, p.y, px, py) < 60.0);
            if too_close {
                continue;
            }
            target = Some((px, py));
            break 'search;
        }
    }

    let (px, py) = target?;
    world.powerups.push(Powerup::new(px, py, kind, size));
    if kind == PowerupKind::Life {
        world.life_powerup_present = true;
    }
    Some((kind, px + size / 2.0, py + size / 2.0))
}

/// Drop a ground enemy on a wide, safe platform ahead of the player.
/// Returns the platform's top-center so the shell can flash a burst there.
pub fn spawn_walker_ahead(
    world: &mut WorldState,
    player: &PlayerBody,
    tuning: &Tuning,
) -> Option<(f32, f32)> {
    let desired_x = player.x + ENEMY_AHEAD;
    let base_chunk = (desired_x / tuning.world.chunk_width).floor() as i32;

    let mut target = None;
    'search: for off in SPAWN_SEARCH_OFFSETS {
        let Some(chunk) = world.chunks.get(&(base_chunk + off)) else {
            continue;
        };
        let mut platforms: Vec<Rect> = chunk
            .platforms
            .iter()
            .filter(|p| p.width >= 80.0)
            .copied()
            .collect();
        platforms.sort_by(|a, b| {
            let da = (a.center_x() - desired_x).abs();
            let db = (b.center_x() - desired_x).abs();
            da.total_cmp(&db)
        });
        for plat in platforms {
            if collision::is_platform_safe_for_spawn(
                chunk,
                &plat,
                crate::enemy::WALKER_SIZE,
                crate::enemy::WALKER_SIZE,
            ) {
                target = Some(plat);
                break 'search;
            }
        }
    }

    let plat = target?;
    if worldgen::spawn_enemy_on_platform(world, &plat) {
        Some((plat.center_x(), plat.y))
    } else {
        None
    }
}

/// Drop a flyer slightly ahead and above the player, unconditionally.
pub fn spawn_flyer_ahead(world: &mut WorldState, player: &PlayerBody) -> (f32, f32) {
    let spawn_x = player.x + 200.0;
    let spawn_y = player.y - 100.0;
    world.flyers.push(Flyer::new(
        spawn_x,
        spawn_y,
        spawn_x,
        spawn_y,
        80.0,
        FlightPattern::Vertical,
    ));
    (spawn_x, spawn_y)
}
