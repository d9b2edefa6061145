//! Swept collision between the player and the live window.
//!
//! Terrain resolution compares the body's previous-tick edges (derived
//! from this tick's movement) against platform faces, so a fast fall
//! cannot tunnel through a platform top. Hazard checks are a separate
//! pass so invincibility can skip them wholesale.

use std::collections::BTreeMap;

use headlong_core::effect::PowerupKind;
use headlong_core::game_trait::DeathCause;

use crate::chunk::Chunk;
use crate::enemy::{Flyer, Walker};
use crate::geom::{circle_intersects_rect, Rect};
use crate::physics::PlayerBody;
use crate::tuning::Tuning;
use crate::world::WorldState;

/// Horizontal reach of the terrain broad phase around the player.
const TERRAIN_PROBE: f32 = 100.0;
/// Tolerance on top/bottom face tests, absorbing float drift between ticks.
const FACE_TOLERANCE: f32 = 0.1;
/// Enemies further than this from the player are not contact-tested.
const ENEMY_CONTACT_RANGE: f32 = 200.0;
/// Fade-out time on a stomped ground enemy.
const WALKER_DEATH_FADE_MS: f32 = 1000.0;
/// Fade-out time on a stomped flyer.
const FLYER_DEATH_FADE_MS: f32 = 1500.0;
/// Minimum free platform width on each side of a spawned body.
const SPAWN_EDGE_MARGIN: f32 = 12.0;
/// Extra spike clearance demanded around a spawn point.
const SPAWN_SPIKE_MARGIN: f32 = 8.0;
/// Head room above a spawn point that must also be spike-free.
const SPAWN_HEAD_CLEARANCE: f32 = 8.0;
/// Extra spinner radius demanded around a spawn point.
const SPAWN_SPINNER_PAD: f32 = 6.0;

/// What the terrain pass reported back for event emission.
#[derive(Debug, Default)]
pub struct TerrainContact {
    /// Smoke anchor when a jump pad fired this tick.
    pub pad_smoke: Option<(f32, f32)>,
    /// Downward speed at the moment of a fresh landing.
    pub landing_impact: Option<f32>,
}

/// Contact with something that kills or gets killed.
#[derive(Debug, PartialEq)]
pub enum HazardHit {
    None,
    Stomp(StompKill),
    Lethal(DeathCause),
}

/// A successful stomp on an enemy.
#[derive(Debug, PartialEq)]
pub struct StompKill {
    pub bounce_vy: f32,
    pub x: f32,
    pub y: f32,
    pub particles: u32,
    pub flyer: bool,
}

/// Correct the player's post-integration position against platforms and
/// jump pads in the chunks around them. A pad launch short-circuits the
/// rest of the frame's terrain checks.
pub fn resolve_terrain(
    player: &mut PlayerBody,
    chunks: &mut BTreeMap<i32, Chunk>,
    move_amount: f32,
    vertical_move: f32,
    tuning: &Tuning,
) -> TerrainContact {
    player.on_ground = false;
    let start_chunk = ((player.x - TERRAIN_PROBE) / tuning.world.chunk_width).floor() as i32;
    let end_chunk = ((player.x + TERRAIN_PROBE) / tuning.world.chunk_width).floor() as i32;

    let player_bottom = player.y + player.height;
    let prev_bottom = player_bottom - vertical_move;
    let prev_top = player.y - vertical_move;

    let mut contact = TerrainContact::default();

    for index in start_chunk..=end_chunk {
        let Some(chunk) = chunks.get_mut(&index) else {
            continue;
        };
        for pad in &mut chunk.jump_pads {
            // Falling onto the pad top from above
            if player.vy >= 0.0
                && prev_bottom <= pad.rect.y
                && player_bottom >= pad.rect.y
                && player.x + player.width > pad.rect.x
                && player.x < pad.rect.right()
            {
                player.vy = tuning.physics.pad_launch_vy;
                player.on_ground = false;
                player.can_double_jump = true;
                player.jump_squash = 1.2;
                pad.squish = 1.0;
                contact.pad_smoke =
                    Some((player.x + player.width / 2.0, pad.rect.y + 10.0));
                player.y = pad.rect.y - player.height;
                return contact;
            }
        }
    }

    let mut corrected_x = player.x;
    let mut corrected_y = player.y;

    for index in start_chunk..=end_chunk {
        let Some(chunk) = chunks.get(&index) else {
            continue;
        };
        for platform in &chunk.platforms {
            if player.x + player.width > platform.x
                && player.x < platform.right()
                && player.y + player.height > platform.y
                && player.y < platform.bottom()
            {
                if player.vy >= 0.0 && prev_bottom <= platform.y + FACE_TOLERANCE {
                    // Landing on top
                    if !player.on_ground && player.vy > 1.0 {
                        player.jump_squash = (player.vy / 15.0).min(1.5);
                        contact.landing_impact = Some(player.vy);
                    }
                    corrected_y = platform.y - player.height;
                    player.vy = 0.0;
                    player.on_ground = true;
                    // A landing alone does not arm the double jump
                    player.can_double_jump = false;
                } else if player.vy < 0.0 && prev_top >= platform.bottom() - FACE_TOLERANCE {
                    // Hitting the underside
                    corrected_y = platform.bottom();
                    if player.vy < -0.1 {
                        player.vy = 0.0;
                    }
                } else if move_amount != 0.0 {
                    if move_amount > 0.0 {
                        corrected_x = platform.x - player.width;
                    } else {
                        corrected_x = platform.right();
                    }
                    player.vx = 0.0;
                }
            }
        }
    }

    player.x = corrected_x;
    player.y = corrected_y;
    contact
}

/// Test the player against spikes, spinners, and both enemy pools.
/// The first contact wins; at most one enemy dies per tick.
pub fn check_hazards(
    player: &PlayerBody,
    chunks: &BTreeMap<i32, Chunk>,
    walkers: &mut [Walker],
    flyers: &mut [Flyer],
    tuning: &Tuning,
) -> HazardHit {
    let player_rect = player.rect();
    let player_chunk = (player.x / tuning.world.chunk_width).floor() as i32;

    for index in player_chunk - 1..=player_chunk + 1 {
        let Some(chunk) = chunks.get(&index) else {
            continue;
        };
        for spike in &chunk.spikes {
            if player_rect.overlaps(&spike.inflated(tuning.world.spike_margin)) {
                return HazardHit::Lethal(DeathCause::Spike);
            }
        }
        for spinner in &chunk.spinners {
            if circle_intersects_rect(spinner.x, spinner.y, spinner.radius(), &player_rect) {
                return HazardHit::Lethal(DeathCause::Spinner);
            }
        }
    }

    for walker in walkers.iter_mut() {
        if walker.dead || (walker.x - player.x).abs() > ENEMY_CONTACT_RANGE {
            continue;
        }
        let walker_rect = Rect::new(walker.x, walker.y, walker.width, walker.height);
        if player_rect.overlaps(&walker_rect) {
            let player_bottom = player.y + player.height;
            let stomp = player.vy > 0.0
                && player_bottom - 10.0 < walker.y
                && player_bottom > walker.y - 5.0;
            if stomp && walker.kind.stompable() {
                walker.dead = true;
                walker.death_timer_ms = WALKER_DEATH_FADE_MS;
                return HazardHit::Stomp(StompKill {
                    bounce_vy: tuning.physics.stomp_bounce_vy,
                    x: walker.center_x(),
                    y: walker.y + walker.height / 2.0,
                    particles: 8,
                    flyer: false,
                });
            }
            return HazardHit::Lethal(DeathCause::Enemy);
        }
    }

    for flyer in flyers.iter_mut() {
        if flyer.dead || (flyer.x - player.x).abs() > ENEMY_CONTACT_RANGE {
            continue;
        }
        let flyer_rect = Rect::new(flyer.x, flyer.y, flyer.width, flyer.height);
        if player_rect.overlaps(&flyer_rect) {
            let player_bottom = player.y + player.height;
            let stomp = player.vy > 0.0
                && player_bottom - 10.0 < flyer.y
                && player_bottom > flyer.y - 5.0;
            if stomp {
                flyer.dead = true;
                flyer.death_timer_ms = FLYER_DEATH_FADE_MS;
                return HazardHit::Stomp(StompKill {
                    bounce_vy: tuning.physics.flyer_stomp_bounce_vy,
                    x: flyer.x + flyer.width / 2.0,
                    y: flyer.y + flyer.height / 2.0,
                    particles: 12,
                    flyer: true,
                });
            }
            return HazardHit::Lethal(DeathCause::Enemy);
        }
    }

    HazardHit::None
}

/// Mark overlapped pickups collected and report their kinds in order.
pub fn collect_powerups(
    player: &PlayerBody,
    world: &mut WorldState,
    tuning: &Tuning,
) -> Vec<PowerupKind> {
    let player_rect = player.rect();
    let mut collected = Vec::new();
    for powerup in &mut world.powerups {
        if powerup.collected || (powerup.x - player.x).abs() > tuning.session.pickup_scan_range {
            continue;
        }
        if player_rect.overlaps(&powerup.rect()) {
            powerup.collected = true;
            if powerup.kind == PowerupKind::Life {
                world.life_powerup_present = false;
            }
            collected.push(powerup.kind);
        }
    }
    collected
}

pub fn rect_overlaps_spikes(chunk: &Chunk, rect: &Rect, margin: f32) -> bool {
    chunk
        .spikes
        .iter()
        .any(|s| rect.overlaps(&s.inflated(margin)))
}

pub fn rect_overlaps_spinners(chunk: &Chunk, rect: &Rect, extra_radius: f32) -> bool {
    chunk
        .spinners
        .iter()
        .any(|s| circle_intersects_rect(s.x, s.y, s.radius() + extra_radius, rect))
}

/// Whether a body of the given size can stand on the platform's center
/// without touching a hazard.
pub fn is_platform_safe_for_spawn(
    chunk: &Chunk,
    platform: &Rect,
    body_width: f32,
    body_height: f32,
) -> bool {
    if platform.width < body_width + SPAWN_EDGE_MARGIN * 2.0 {
        return false;
    }

    let spawn_rect = Rect::new(
        platform.center_x() - body_width / 2.0,
        platform.y - body_height,
        body_width,
        body_height,
    );
    if rect_overlaps_spikes(chunk, &spawn_rect, SPAWN_SPIKE_MARGIN) {
        return false;
    }

    let head_clear = Rect::new(
        spawn_rect.x,
        spawn_rect.y - SPAWN_HEAD_CLEARANCE,
        spawn_rect.width,
        spawn_rect.height + SPAWN_HEAD_CLEARANCE,
    );
    if rect_overlaps_spikes(chunk, &head_clear, SPAWN_SPIKE_MARGIN) {
        return false;
    }

    !rect_overlaps_spinners(chunk, &spawn_rect, SPAWN_SPINNER_PAD)
}

/// Pick a respawn point near (slightly behind) the player's death spot.
/// Scans nearby chunks closest-platform-first, falls back to the ground
/// band, and finally to a fixed point above the target.
pub fn find_safe_spawn_point(
    world: &WorldState,
    player_x: f32,
    body_width: f32,
    body_height: f32,
    tuning: &Tuning,
) -> (f32, f32) {
    let target_x = (player_x - 200.0).max(100.0);
    let base_chunk = (target_x / tuning.world.chunk_width).floor() as i32;

    for off in [0, 1, -1, 2, -2, 3, -3] {
        let Some(chunk) = world.chunks.get(&(base_chunk + off)) else {
            continue;
        };
        let mut platforms = chunk.platforms.clone();
        platforms.sort_by(|a, b| {
            let da = (a.center_x() - player_x).abs();
            let db = (b.center_x() - player_x).abs();
            da.total_cmp(&db)
        });
        for platform in &platforms {
            // Platforms hanging below the viewport are not landable
            if platform.y > world.viewport.height - 2.0 {
                continue;
            }
            if is_platform_safe_for_spawn(chunk, platform, body_width, body_height) {
                return (platform.center_x(), platform.y - body_height);
            }
        }
    }

    if let Some(chunk) = world.chunks.get(&base_chunk) {
        let ground_y = tuning.ground_y(world.viewport.height);
        let left = base_chunk as f32 * tuning.world.chunk_width + 50.0;
        let right = (base_chunk + 1) as f32 * tuning.world.chunk_width - 50.0;
        let fallback_x = player_x.min(right).max(left);
        let rect = Rect::new(
            fallback_x - body_width / 2.0,
            ground_y - body_height,
            body_width,
            body_height,
        );
        if !rect_overlaps_spikes(chunk, &rect, SPAWN_SPIKE_MARGIN)
            && !rect_overlaps_spinners(chunk, &rect, SPAWN_SPINNER_PAD)
        {
            return (fallback_x, ground_y - body_height);
        }
    }

    tracing::warn!("No safe spawn point near x={player_x}, using fixed fallback");
    (target_x, 200.0)
}
