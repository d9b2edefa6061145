//! Deterministic terrain generation.
//!
//! Each chunk is generated from a stream seeded by the world seed and the
//! chunk index, so a culled chunk regenerates byte-identical when the
//! player backtracks. Vertical continuity between neighbours flows through
//! the end-height cache on [`WorldState`](crate::world::WorldState).

use headlong_core::effect::PowerupKind;
use headlong_core::rng::{chunk_seed, coord_seed, SeededStream};

use crate::chunk::{Chunk, JumpPad, Spinner};
use crate::enemy::{FlightPattern, Flyer, Walker, WalkerKind, FLYER_SIZE, WALKER_SIZE};
use crate::geom::{dist, Rect};
use crate::powerups::Powerup;
use crate::tuning::Tuning;
use crate::world::WorldState;

/// Chunks generated up front when a run starts.
pub const INITIAL_CHUNKS: i32 = 5;
/// Mixed into the world seed for the guaranteed starting pickup.
const START_POWERUP_SEED: u64 = 12_345;
/// Minimum clearance kept between any two uncollected pickups.
const POWERUP_SPACING: f32 = 60.0;
/// Placement attempts per floating platform before giving up.
const FLOAT_ATTEMPTS: u32 = 10;
/// Clearance buffer when testing floating platforms against existing ones.
const PLATFORM_BUFFER: f32 = 30.0;
/// Most enemies a single chunk may seed.
const MAX_ENEMIES_PER_CHUNK: usize = 2;

pub fn generate_initial_chunks(world: &mut WorldState, tuning: &Tuning) {
    for index in 0..INITIAL_CHUNKS {
        generate_chunk(world, index, tuning);
    }
    ensure_start_powerup(world, tuning);
}

/// Vertical-change severity for a chunk, ramping from 0.25 to 1.0 between
/// 500m and 1000m of progress.
fn difficulty_factor(index: i32, chunk_width: f32) -> f32 {
    let distance = index as f32 * chunk_width / 10.0;
    if distance < 500.0 {
        0.25
    } else if distance <= 1000.0 {
        0.25 + 0.75 * ((distance - 500.0) / 500.0)
    } else {
        1.0
    }
}

pub fn generate_chunk(world: &mut WorldState, index: i32, tuning: &Tuning) {
    let mut rng = SeededStream::new(chunk_seed(world.world_seed, index));
    let width = tuning.world.chunk_width;
    let mut chunk = Chunk::new(index, width);
    let ground_y = tuning.ground_y(world.viewport.height);

    let mut x = chunk.x;
    // Continue from the previous chunk's end height when it is known
    let mut current_y = world
        .chunk_end_heights
        .get(&(index - 1))
        .copied()
        .unwrap_or(world.last_platform_y);

    if index > 0 && rng.chance(0.2) {
        x += 50.0 + rng.range(0.0, 100.0);
    }

    // Ground segments separated by gaps
    while x < chunk.x + width {
        let mut segment_width = 100.0 + rng.range(0.0, 200.0);
        if x + segment_width > chunk.x + width {
            segment_width = chunk.x + width - x;
        }
        if segment_width < 50.0 {
            break;
        }

        if index > 1 {
            let factor = difficulty_factor(index, width);
            let band = 280.0 * factor;
            current_y += rng.range(0.0, band) - band / 2.0;
            let max_verticality = 250.0 + 200.0 * factor;
            current_y = current_y.clamp(ground_y - max_verticality, ground_y + 250.0);
        }

        let platform = Rect::new(x, current_y, segment_width, tuning.world.ground_height);
        chunk.platforms.push(platform);

        if index > 1 && rng.chance(0.7) {
            let slots = (segment_width / 40.0).floor() as i32;
            for slot in 0..slots {
                if rng.chance(0.6) {
                    continue;
                }
                let hazard_x = x + slot as f32 * 40.0 + 10.0 + rng.range(0.0, 10.0);
                if rng.chance(0.15) {
                    let size = tuning.world.pad_size;
                    chunk
                        .jump_pads
                        .push(JumpPad::new(Rect::new(hazard_x, current_y - size, size, size)));
                } else {
                    let size = tuning.world.spike_size;
                    chunk
                        .spikes
                        .push(Rect::new(hazard_x, current_y - size, size, size));
                }
            }
        }
        x += segment_width;

        if x < chunk.x + width {
            let gap_width = 70.0 + rng.range(0.0, 80.0);

            // Wide gaps get a traversal pickup on the ledge before them
            if gap_width > 120.0 && index > 1 {
                let kinds = [PowerupKind::DoubleJump, PowerupKind::Fly];
                let kind = kinds[rng.pick_index(kinds.len())];
                let size = tuning.world.powerup_size;
                let px = platform.center_x() - size / 2.0;
                let py = platform.y - size - 5.0;
                if !too_close_to_powerup(&world.powerups, px, py, POWERUP_SPACING) {
                    world.powerups.push(Powerup::new(px, py, kind, size));
                }
            }

            if index > 5
                && gap_width > 150.0
                && rng.chance(0.5 + (index as f32 * 0.01).min(0.4))
            {
                chunk.spinners.push(Spinner {
                    x: x + gap_width / 2.0,
                    y: current_y - 100.0,
                    size: tuning.world.spinner_size,
                    angle: rng.next_f32() * std::f32::consts::TAU,
                    angle_speed: rng.sign() * 0.05,
                    patrol_start_y: current_y - 150.0,
                    patrol_end_y: current_y - 50.0,
                    speed: 1.0 + rng.next_f32(),
                    direction: rng.sign(),
                });
            }
            x += gap_width;
        }
    }

    world.chunk_end_heights.insert(index, current_y);
    world.last_platform_y = current_y;

    // Floating platforms, rejection-sampled against what is already placed
    let float_count = 6 + (rng.next_f32() * 7.0) as i32;
    for _ in 0..float_count {
        let mut attempts = 0;
        let mut platform;
        loop {
            platform = Rect::new(
                chunk.x + rng.range(0.0, width - 150.0),
                ground_y - 120.0 - rng.range(0.0, 500.0),
                80.0 + rng.range(0.0, 120.0),
                20.0,
            );
            attempts += 1;
            if attempts >= FLOAT_ATTEMPTS || !platform_overlaps(&platform, &chunk.platforms) {
                break;
            }
        }
        if attempts < FLOAT_ATTEMPTS {
            chunk.platforms.push(platform);
            if index > 1 && rng.chance(0.6) {
                let hazard_x = platform.x + rng.range(0.0, platform.width - 20.0);
                if rng.chance(0.20) {
                    let size = tuning.world.pad_size;
                    chunk
                        .jump_pads
                        .push(JumpPad::new(Rect::new(hazard_x, platform.y - size, size, size)));
                } else {
                    let size = tuning.world.spike_size;
                    chunk
                        .spikes
                        .push(Rect::new(hazard_x, platform.y - size, size, size));
                }
            }
        }
    }

    // Enemies, at most two per chunk, kept away from hazards and pickups
    if index >= 1 {
        let mut candidates: Vec<Rect> = chunk
            .platforms
            .iter()
            .filter(|p| p.width >= 60.0)
            .copied()
            .collect();
        rng.shuffle(&mut candidates);

        let spawn_chance = if index < 4 { 0.6 } else { 0.35 };
        let mut spawned = 0;
        for platform in &candidates {
            if spawned >= MAX_ENEMIES_PER_CHUNK {
                break;
            }
            if !rng.chance(spawn_chance) {
                continue;
            }
            let spawn_x = platform.center_x();
            if chunk.spikes.iter().any(|s| (s.x - spawn_x).abs() < 40.0) {
                continue;
            }
            if chunk.spinners.iter().any(|s| (s.x - spawn_x).abs() < 60.0) {
                continue;
            }
            let near_powerup = world
                .powerups
                .iter()
                .any(|p| (p.x - spawn_x).abs() < 50.0 && (p.y - platform.y).abs() < 100.0);
            if near_powerup {
                continue;
            }
            if spawn_enemy_on_platform(world, platform) {
                spawned += 1;
            }
        }
    }

    // Floating pickups on spike-free platforms
    let safe = safe_platforms(&chunk);
    if !safe.is_empty() {
        let slot_count = if index == 0 {
            1
        } else {
            3 + (rng.next_f32() * 2.0) as usize
        };
        for _ in 0..slot_count {
            if !rng.chance(0.75) {
                continue;
            }
            let platform = safe[rng.pick_index(safe.len())];
            let kinds = [PowerupKind::DoubleJump, PowerupKind::SlowFall, PowerupKind::Fly];
            let kind = kinds[rng.pick_index(kinds.len())];
            push_platform_powerup(world, &platform, kind, POWERUP_SPACING, tuning);
        }
        if rng.chance(0.03) {
            let platform = safe[rng.pick_index(safe.len())];
            push_platform_powerup(world, &platform, PowerupKind::Shrink, 80.0, tuning);
        }
        if rng.chance(0.01) {
            let platform = safe[rng.pick_index(safe.len())];
            push_platform_powerup(world, &platform, PowerupKind::Speed, 120.0, tuning);
        }
        if index > 2 && rng.chance(0.015) {
            let platform = safe[rng.pick_index(safe.len())];
            push_platform_powerup(world, &platform, PowerupKind::Invincibility, 120.0, tuning);
        }
    }

    world.chunks.insert(index, chunk);
}

/// Platforms with no spike within 50px of their horizontal span.
pub fn safe_platforms(chunk: &Chunk) -> Vec<Rect> {
    chunk
        .platforms
        .iter()
        .filter(|p| {
            !chunk
                .spikes
                .iter()
                .any(|s| s.x >= p.x - 50.0 && s.x <= p.right() + 50.0)
        })
        .copied()
        .collect()
}

/// Guarantee one life pickup near the start of a fresh run.
pub fn ensure_start_powerup(world: &mut WorldState, tuning: &Tuning) {
    let mut rng = SeededStream::new(world.world_seed ^ START_POWERUP_SEED);
    let has_start_powerup = world
        .powerups
        .iter()
        .any(|p| p.x < tuning.world.chunk_width * 0.75);
    if has_start_powerup {
        return;
    }

    for index in 0..=1 {
        let Some(chunk) = world.chunks.get(&index) else {
            continue;
        };
        let safe = safe_platforms(chunk);
        if safe.is_empty() {
            continue;
        }
        let platform = safe[rng.pick_index(safe.len())];
        let size = tuning.world.powerup_size;
        let px = platform.center_x() - size / 2.0;
        let py = platform.y - size - 5.0;
        if too_close_to_powerup(&world.powerups, px, py, 120.0) {
            continue;
        }
        world
            .powerups
            .push(Powerup::new(px, py, PowerupKind::Life, size));
        world.life_powerup_present = true;
        return;
    }
}

pub fn platform_overlaps(candidate: &Rect, existing: &[Rect]) -> bool {
    existing.iter().any(|e| {
        candidate.x < e.right() + PLATFORM_BUFFER
            && candidate.right() + PLATFORM_BUFFER > e.x
            && candidate.y < e.bottom() + PLATFORM_BUFFER
            && candidate.bottom() + PLATFORM_BUFFER > e.y
    })
}

/// Seed one enemy on a platform. The stream is keyed by the platform's
/// position, so regenerating the chunk replays the same spawn.
pub fn spawn_enemy_on_platform(world: &mut WorldState, platform: &Rect) -> bool {
    let mut rng = SeededStream::new(coord_seed(world.world_seed, platform.x, platform.y));
    let roll = rng.next_f32();

    if roll < 0.1 {
        let patterns = [
            FlightPattern::Vertical,
            FlightPattern::Horizontal,
            FlightPattern::FigureEight,
            FlightPattern::Square,
        ];
        let pattern = patterns[rng.pick_index(patterns.len())];
        let center_x = platform.center_x();
        world.flyers.push(Flyer::new(
            center_x - FLYER_SIZE / 2.0,
            // Spawn high so the flyer does not clip the platform
            platform.y - 120.0,
            center_x,
            platform.y - 80.0,
            60.0 + rng.next_f32() * 40.0,
            pattern,
        ));
        true
    } else {
        let kind = if roll < 0.4 {
            WalkerKind::Block
        } else if roll < 0.7 {
            WalkerKind::Triangle
        } else {
            WalkerKind::Circle
        };
        world.walkers.push(Walker::new(
            platform.center_x() - WALKER_SIZE / 2.0,
            // Slightly above the surface so gravity settles them cleanly
            platform.y - 45.0,
            kind,
            rng.sign(),
        ));
        true
    }
}

fn push_platform_powerup(
    world: &mut WorldState,
    platform: &Rect,
    kind: PowerupKind,
    min_spacing: f32,
    tuning: &Tuning,
) {
    let size = tuning.world.powerup_size;
    let px = platform.center_x() - size / 2.0;
    let py = platform.y - size - 5.0;
    if !too_close_to_powerup(&world.powerups, px, py, min_spacing) {
        world.powerups.push(Powerup::new(px, py, kind, size));
    }
}

fn too_close_to_powerup(powerups: &[Powerup], x: f32, y: f32, min_dist: f32) -> bool {
    powerups.iter().any(|p| dist(p.x, p.y, x, y) < min_dist)
}
