use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use headlong_core::input::FRAME_MS;

use crate::chunk::Chunk;
use crate::tuning::Tuning;

/// Ground walker dimensions in px.
pub const WALKER_SIZE: f32 = 30.0;
/// Flyer dimensions in px.
pub const FLYER_SIZE: f32 = 40.0;
/// Horizontal range inside which chasing walkers track the player.
const CHASE_RANGE: f32 = 800.0;
/// How close a walker's feet must be to a platform top to land on it.
const LAND_TOLERANCE: f32 = 20.0;
/// How far above the platform top the walker must have been last frame.
const LAND_PREV_TOLERANCE: f32 = 5.0;
/// Distance from a platform edge at which a block walker turns around.
const EDGE_BUFFER: f32 = 10.0;
/// Flyers farther than this from the player skip their update entirely.
const FLYER_UPDATE_RANGE: f32 = 1500.0;
/// Flyers never drift more than this from their pattern center.
const FLYER_ROAM_CLAMP: f32 = 200.0;
/// Vertical margin flyers keep from the viewport edges.
const FLYER_EDGE_MARGIN: f32 = 100.0;

/// Ground walker subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalkerKind {
    /// Patrols its platform and turns at edges. Faster than the chasers.
    Block,
    /// Chases the player. Spiked top, cannot be stomped.
    Triangle,
    /// Chases the player.
    Circle,
}

impl WalkerKind {
    pub fn speed(&self) -> f32 {
        match self {
            WalkerKind::Block => 3.5,
            WalkerKind::Triangle | WalkerKind::Circle => 2.0,
        }
    }

    pub fn stompable(&self) -> bool {
        !matches!(self, WalkerKind::Triangle)
    }
}

/// A ground enemy. Falls under gravity, lands on platforms, patrols or
/// chases per its kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Walker {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub vx: f32,
    pub vy: f32,
    /// +1.0 moving right, -1.0 moving left.
    pub direction: f32,
    pub kind: WalkerKind,
    pub dead: bool,
    pub death_timer_ms: f32,
}

impl Walker {
    pub fn new(x: f32, y: f32, kind: WalkerKind, direction: f32) -> Self {
        Self {
            x,
            y,
            width: WALKER_SIZE,
            height: WALKER_SIZE,
            vx: 0.0,
            vy: 0.0,
            direction,
            kind,
            dead: false,
            death_timer_ms: 0.0,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Oscillation paths a flyer can follow around its center point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightPattern {
    Vertical,
    Horizontal,
    FigureEight,
    Square,
}

/// A flying enemy holding a center position and tracing its pattern on a
/// per-enemy clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flyer {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub center_x: f32,
    pub center_y: f32,
    pub amplitude: f32,
    pub pattern: FlightPattern,
    pub pattern_timer_ms: f32,
    pub dead: bool,
    pub death_timer_ms: f32,
}

impl Flyer {
    pub fn new(
        x: f32,
        y: f32,
        center_x: f32,
        center_y: f32,
        amplitude: f32,
        pattern: FlightPattern,
    ) -> Self {
        Self {
            x,
            y,
            width: FLYER_SIZE,
            height: FLYER_SIZE,
            center_x,
            center_y,
            amplitude,
            pattern,
            pattern_timer_ms: 0.0,
            dead: false,
            death_timer_ms: 0.0,
        }
    }
}

/// Advance all ground walkers by one tick: behavior, motion, gravity,
/// platform landing, and removal of expired or fallen-out enemies.
pub fn update_walkers(
    walkers: &mut Vec<Walker>,
    chunks: &BTreeMap<i32, Chunk>,
    player_x: f32,
    player_alive: bool,
    viewport_height: f32,
    step: f32,
    tuning: &Tuning,
) {
    let mut i = 0;
    while i < walkers.len() {
        let walker = &mut walkers[i];

        if walker.dead {
            walker.death_timer_ms -= step * FRAME_MS;
            if walker.death_timer_ms <= 0.0 {
                walkers.swap_remove(i);
                continue;
            }
            i += 1;
            continue;
        }

        match walker.kind {
            WalkerKind::Block => {
                walker.vx = walker.direction * walker.kind.speed();
            },
            WalkerKind::Circle | WalkerKind::Triangle => {
                // Chasers track the player in range and ignore edges
                if player_alive {
                    let dx = player_x - walker.x;
                    if dx.abs() < CHASE_RANGE {
                        walker.direction = if dx > 0.0 { 1.0 } else { -1.0 };
                    }
                }
                walker.vx = walker.direction * walker.kind.speed();
            },
        }

        let move_step = walker.vx * step;
        walker.x += move_step;
        walker.vy += tuning.physics.gravity * step;
        walker.y += walker.vy * step;

        if walker.y > viewport_height + 200.0 {
            walkers.swap_remove(i);
            continue;
        }

        let bottom = walker.bottom();
        let center = walker.center_x();
        let walker_chunk = (center / tuning.world.chunk_width).floor() as i32;
        let mut landed_on = None;
        'scan: for idx in walker_chunk - 1..=walker_chunk + 1 {
            let Some(chunk) = chunks.get(&idx) else {
                continue;
            };
            for platform in &chunk.platforms {
                if walker.vy >= 0.0
                    && bottom >= platform.y
                    && bottom <= platform.y + LAND_TOLERANCE
                    && bottom - walker.vy * step <= platform.y + LAND_PREV_TOLERANCE
                    && center > platform.x
                    && center < platform.right()
                {
                    landed_on = Some(*platform);
                    break 'scan;
                }
            }
        }

        if let Some(platform) = landed_on {
            walker.y = platform.y - walker.height;
            walker.vy = 0.0;

            if walker.kind == WalkerKind::Block {
                // Probe the leading edge one step ahead
                let next_x = walker.x
                    + move_step
                    + if walker.direction > 0.0 {
                        walker.width
                    } else {
                        0.0
                    };
                if next_x > platform.right() - EDGE_BUFFER || walker.x < platform.x + EDGE_BUFFER {
                    walker.direction *= -1.0;
                    walker.x += walker.direction * move_step.abs() * 2.0;
                }
            }
        }

        i += 1;
    }
}

/// Advance all flyers by one tick: the per-enemy pattern clock, the
/// pattern position, clamping, and removal of expired enemies.
pub fn update_flyers(
    flyers: &mut Vec<Flyer>,
    player_x: f32,
    viewport_height: f32,
    step: f32,
) {
    let mut i = 0;
    while i < flyers.len() {
        let flyer = &mut flyers[i];

        if !flyer.dead && (flyer.x - player_x).abs() > FLYER_UPDATE_RANGE {
            i += 1;
            continue;
        }

        if flyer.dead {
            flyer.death_timer_ms -= step * FRAME_MS;
            if flyer.death_timer_ms <= 0.0 {
                flyers.swap_remove(i);
                continue;
            }
            i += 1;
            continue;
        }

        flyer.pattern_timer_ms += step * FRAME_MS;
        let cycle = flyer.pattern_timer_ms / 1000.0;
        let amp = flyer.amplitude;

        match flyer.pattern {
            FlightPattern::Vertical => {
                flyer.y = flyer.center_y + (cycle * 2.0).sin() * amp;
            },
            FlightPattern::Horizontal => {
                flyer.x = flyer.center_x + (cycle * 1.5).sin() * amp;
            },
            FlightPattern::FigureEight => {
                flyer.x = flyer.center_x + cycle.sin() * amp;
                flyer.y = flyer.center_y + (cycle * 2.0).sin() * (amp * 0.5);
            },
            FlightPattern::Square => {
                // Four linear segments tracing the square's perimeter
                let phase = (cycle * 0.8) % 4.0;
                if phase < 1.0 {
                    flyer.x = flyer.center_x + (phase * amp * 2.0 - amp);
                    flyer.y = flyer.center_y - amp;
                } else if phase < 2.0 {
                    flyer.x = flyer.center_x + amp;
                    flyer.y = flyer.center_y + ((phase - 1.0) * amp * 2.0 - amp);
                } else if phase < 3.0 {
                    flyer.x = flyer.center_x + (amp - (phase - 2.0) * amp * 2.0);
                    flyer.y = flyer.center_y + amp;
                } else {
                    flyer.x = flyer.center_x - amp;
                    flyer.y = flyer.center_y + (amp - (phase - 3.0) * amp * 2.0);
                }
            },
        }

        flyer.x = flyer
            .x
            .clamp(flyer.center_x - FLYER_ROAM_CLAMP, flyer.center_x + FLYER_ROAM_CLAMP);
        flyer.y = flyer
            .y
            .clamp(FLYER_EDGE_MARGIN, viewport_height - FLYER_EDGE_MARGIN);

        i += 1;
    }
}
