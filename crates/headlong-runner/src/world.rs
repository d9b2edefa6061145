use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use headlong_core::effect::PowerupKind;
use headlong_core::game_trait::Viewport;
use headlong_core::rng::{chunk_seed, SeededStream};

use crate::chunk::Chunk;
use crate::enemy::{self, Flyer, Walker};
use crate::geom::dist;
use crate::powerups::Powerup;
use crate::tuning::Tuning;
use crate::worldgen;

/// Chunks generated around the player each tick, behind and ahead.
const GENERATE_BEHIND: i32 = 2;
const GENERATE_AHEAD: i32 = 3;
/// Retention is wider than generation so a chunk is not rebuilt the
/// moment it leaves the generation window.
const RETAIN_BEHIND: i32 = 3;
const RETAIN_AHEAD: i32 = 5;
/// Mixed into the world seed for on-demand spawn streams, keeping them
/// distinct from chunk generation streams.
const SPAWN_STREAM_SALT: u64 = 54_321;

/// All terrain, pickups, and enemies alive in the sliding window.
///
/// Pickups live here rather than on a chunk so they survive chunk
/// regeneration and are culled on their own wider band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub world_seed: u64,
    pub viewport: Viewport,
    pub chunks: BTreeMap<i32, Chunk>,
    pub powerups: Vec<Powerup>,
    pub walkers: Vec<Walker>,
    pub flyers: Vec<Flyer>,
    /// End height per chunk index, the continuity link between neighbours.
    /// Never culled: a regenerated chunk must pick up its old start height.
    pub chunk_end_heights: BTreeMap<i32, f32>,
    pub last_platform_y: f32,
    pub life_powerup_present: bool,
    spawn_counter: u64,
}

impl WorldState {
    /// An empty world. Call [`reset`](Self::reset) to build the starting
    /// window before simulating.
    pub fn new(world_seed: u64, viewport: Viewport) -> Self {
        Self {
            world_seed,
            viewport,
            chunks: BTreeMap::new(),
            powerups: Vec::new(),
            walkers: Vec::new(),
            flyers: Vec::new(),
            chunk_end_heights: BTreeMap::new(),
            last_platform_y: 0.0,
            life_powerup_present: false,
            spawn_counter: 0,
        }
    }

    /// Drop everything and rebuild the starting chunks.
    pub fn reset(&mut self, tuning: &Tuning) {
        self.chunks.clear();
        self.powerups.clear();
        self.walkers.clear();
        self.flyers.clear();
        self.chunk_end_heights.clear();
        self.life_powerup_present = false;
        self.spawn_counter = 0;
        self.last_platform_y = tuning.ground_y(self.viewport.height);
        // Seed the continuity chain so chunk 0 starts at ground level
        self.chunk_end_heights.insert(-1, self.last_platform_y);
        worldgen::generate_initial_chunks(self, tuning);
    }

    /// A fresh deterministic stream for a one-off spawn decision. Each
    /// call advances the counter, so successive spawns differ while the
    /// whole sequence stays reproducible from the world seed.
    pub fn spawn_stream(&mut self) -> SeededStream {
        let counter = self.spawn_counter;
        self.spawn_counter += 1;
        SeededStream::new(chunk_seed(self.world_seed ^ SPAWN_STREAM_SALT, counter as i32))
    }

    /// Slide the generation and retention windows to the player's chunk:
    /// materialize missing chunks nearby, drop chunks and pickups far
    /// behind or ahead, and restock the safety-net life pickup.
    pub fn ensure_window(&mut self, player_x: f32, player_lives: u32, tuning: &Tuning) {
        let player_chunk = (player_x / tuning.world.chunk_width).floor() as i32;

        for index in player_chunk - GENERATE_BEHIND..=player_chunk + GENERATE_AHEAD {
            if index >= 0 && !self.chunks.contains_key(&index) {
                worldgen::generate_chunk(self, index, tuning);
            }
        }

        self.chunks.retain(|&index, _| {
            index >= player_chunk - RETAIN_BEHIND && index <= player_chunk + RETAIN_AHEAD
        });

        let cutoff_min = (player_chunk - 3) as f32 * tuning.world.chunk_width;
        let cutoff_max = (player_chunk + 4) as f32 * tuning.world.chunk_width;
        self.powerups
            .retain(|p| p.x >= cutoff_min && p.x <= cutoff_max && !p.collected);
        self.life_powerup_present = self
            .powerups
            .iter()
            .any(|p| !p.collected && p.kind == PowerupKind::Life);

        // Enemies left far behind are dropped on the same line
        self.walkers.retain(|w| w.x >= cutoff_min);
        self.flyers.retain(|f| f.x >= cutoff_min);

        if player_lives < 2 && !self.life_powerup_present {
            self.place_emergency_life(player_chunk, tuning);
        }
    }

    /// Scan the chunks ahead for a safe platform and drop a life pickup
    /// on the first that accepts one.
    fn place_emergency_life(&mut self, player_chunk: i32, tuning: &Tuning) {
        for index in player_chunk..=player_chunk + 2 {
            let Some(chunk) = self.chunks.get(&index) else {
                continue;
            };
            let safe = worldgen::safe_platforms(chunk);
            if safe.is_empty() {
                continue;
            }
            let mut stream = self.spawn_stream();
            let platform = safe[stream.pick_index(safe.len())];
            let size = tuning.world.powerup_size;
            let px = platform.center_x() - size / 2.0;
            let py = platform.y - size - 5.0;
            if self.powerups.iter().any(|p| dist(p.x, p.y, px, py) < 120.0) {
                continue;
            }
            self.powerups
                .push(Powerup::new(px, py, PowerupKind::Life, size));
            self.life_powerup_present = true;
            tracing::debug!("Emergency life pickup placed in chunk {index}");
            return;
        }
    }

    /// Advance spinners, jump pad squish, and both enemy pools.
    pub fn update(&mut self, player_x: f32, player_alive: bool, step: f32, tuning: &Tuning) {
        if !step.is_finite() || step <= 0.0 {
            return;
        }

        for chunk in self.chunks.values_mut() {
            for spinner in &mut chunk.spinners {
                spinner.angle += spinner.angle_speed * step;

                spinner.y += spinner.speed * spinner.direction * step;
                if spinner.y > spinner.patrol_end_y {
                    spinner.y = spinner.patrol_end_y;
                    spinner.direction = -1.0;
                } else if spinner.y < spinner.patrol_start_y {
                    spinner.y = spinner.patrol_start_y;
                    spinner.direction = 1.0;
                }
            }
            for pad in &mut chunk.jump_pads {
                if pad.squish > 0.0 {
                    pad.squish -= 0.08 * step;
                }
            }
        }

        enemy::update_walkers(
            &mut self.walkers,
            &self.chunks,
            player_x,
            player_alive,
            self.viewport.height,
            step,
            tuning,
        );
        enemy::update_flyers(&mut self.flyers, player_x, self.viewport.height, step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{JumpPad, Spinner};
    use crate::geom::Rect;

    fn fresh(seed: u64) -> (WorldState, Tuning) {
        let tuning = Tuning::default();
        let mut world = WorldState::new(seed, Viewport::default());
        world.reset(&tuning);
        (world, tuning)
    }

    #[test]
    fn reset_builds_starting_window() {
        let (world, tuning) = fresh(42);
        assert_eq!(world.chunks.len(), worldgen::INITIAL_CHUNKS as usize);
        assert_eq!(
            world.chunk_end_heights.get(&-1),
            Some(&tuning.ground_y(world.viewport.height)),
            "Continuity chain must be seeded at ground level"
        );
    }

    #[test]
    fn window_generates_ahead_and_culls_behind() {
        let (mut world, tuning) = fresh(42);
        let width = tuning.world.chunk_width;

        // Walk to chunk 4: generation reaches 7, retention keeps chunk 1
        for index in 0..=6 {
            if !world.chunks.contains_key(&index) {
                worldgen::generate_chunk(&mut world, index, &tuning);
            }
        }
        world.ensure_window(4.5 * width, 3, &tuning);
        assert!(world.chunks.contains_key(&7), "Chunk 7 should be generated");
        assert!(world.chunks.contains_key(&1), "Chunk 1 is still in retention");

        // One chunk further the retention window passes chunk 1
        world.ensure_window(5.5 * width, 3, &tuning);
        assert!(!world.chunks.contains_key(&1), "Chunk 1 should be culled");
        assert!(world.chunks.contains_key(&8));
        for index in world.chunks.keys() {
            assert!(
                (2..=10).contains(index),
                "Chunk {index} outside retention window"
            );
        }
    }

    #[test]
    fn collected_pickups_are_dropped_on_window_slide() {
        let (mut world, tuning) = fresh(42);
        assert!(!world.powerups.is_empty());
        for p in &mut world.powerups {
            p.collected = true;
        }
        world.ensure_window(100.0, 3, &tuning);
        assert!(
            world.powerups.is_empty(),
            "Collected pickups must not survive the slide"
        );
    }

    #[test]
    fn emergency_life_appears_when_low_on_lives() {
        let (mut world, tuning) = fresh(42);
        // The first chunks are spike-free, so a safe platform always exists
        world.powerups.clear();
        world.life_powerup_present = false;

        world.ensure_window(100.0, 1, &tuning);
        assert!(
            world.powerups.iter().any(|p| p.kind == PowerupKind::Life),
            "A life pickup must be restocked below 2 lives"
        );
        assert!(world.life_powerup_present);
    }

    #[test]
    fn no_emergency_life_at_full_lives() {
        let (mut world, tuning) = fresh(42);
        world.powerups.retain(|p| p.kind != PowerupKind::Life);
        world.life_powerup_present = false;

        world.ensure_window(100.0, 3, &tuning);
        assert!(
            !world.powerups.iter().any(|p| p.kind == PowerupKind::Life),
            "No restock above the scarcity threshold"
        );
    }

    #[test]
    fn spawn_streams_advance_per_call() {
        let (mut world, _) = fresh(42);
        let a = world.spawn_stream().next_f32();
        let b = world.spawn_stream().next_f32();
        assert_ne!(a, b, "Consecutive spawn streams should not repeat");

        let (mut replay, _) = fresh(42);
        assert_eq!(
            replay.spawn_stream().next_f32(),
            a,
            "Spawn streams must replay from the world seed"
        );
    }

    #[test]
    fn spinner_patrol_reverses_at_bounds() {
        let (mut world, tuning) = fresh(42);
        let mut chunk = Chunk::new(0, tuning.world.chunk_width);
        chunk.spinners.push(Spinner {
            x: 100.0,
            y: 495.0,
            size: 40.0,
            angle: 0.0,
            angle_speed: 0.05,
            patrol_start_y: 400.0,
            patrol_end_y: 500.0,
            speed: 2.0,
            direction: 1.0,
        });
        world.chunks.clear();
        world.chunks.insert(0, chunk);

        world.update(0.0, true, 4.0, &tuning);
        let spinner = &world.chunks[&0].spinners[0];
        assert_eq!(spinner.y, 500.0, "Patrol must clamp at the lower bound");
        assert_eq!(spinner.direction, -1.0, "Patrol must reverse at the bound");
        assert!(spinner.angle > 0.0);
    }

    #[test]
    fn pad_squish_decays_over_time() {
        let (mut world, tuning) = fresh(42);
        let mut chunk = Chunk::new(0, tuning.world.chunk_width);
        let mut pad = JumpPad::new(Rect::new(0.0, 0.0, 20.0, 20.0));
        pad.squish = 1.0;
        chunk.jump_pads.push(pad);
        world.chunks.clear();
        world.chunks.insert(0, chunk);

        world.update(0.0, true, 1.0, &tuning);
        let squish = world.chunks[&0].jump_pads[0].squish;
        assert!((squish - 0.92).abs() < 1e-6);
    }

    #[test]
    fn update_ignores_invalid_steps() {
        let (mut world, tuning) = fresh(42);
        let before = world.clone();
        world.update(100.0, true, 0.0, &tuning);
        world.update(100.0, true, -1.0, &tuning);
        world.update(100.0, true, f32::NAN, &tuning);
        assert_eq!(world, before, "Invalid steps must not mutate the world");
    }
}
