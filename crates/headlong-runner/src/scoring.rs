//! Distance scoring and coin milestones.
//!
//! Distance is reported in whole meters (ten world pixels each) past the
//! spawn point and never goes negative. Coin awards come from a fixed
//! ladder of early milestones, then an endless repeating schedule for
//! marathon runs. The ledger only ever moves forward, so teleport-sized
//! jumps in a single tick still pay out every milestone they crossed.

use serde::{Deserialize, Serialize};

/// World pixels per reported meter.
pub const PX_PER_METER: f32 = 10.0;

/// Early one-shot milestones as `(distance_m, coins)`.
pub const MILESTONES: [(u32, u32); 4] = [(100, 5), (900, 10), (4_000, 25), (19_999, 50)];

/// First repeating milestone, in meters.
pub const REPEAT_START_M: u32 = 20_000;
/// Spacing of repeating milestones, in meters.
pub const REPEAT_INTERVAL_M: u32 = 2_000;
/// Coins per repeating milestone.
pub const REPEAT_COINS: u32 = 20;

/// Coins granted per collected pickup.
pub const PICKUP_COINS: u32 = 1;
/// Coins for stomping a walker.
pub const WALKER_KILL_COINS: u32 = 5;
/// Coins for stomping a flyer.
pub const FLYER_KILL_COINS: u32 = 15;

/// Whole meters travelled past the spawn point, clamped at zero.
pub fn distance_m(player_x: f32, start_x: f32) -> u32 {
    ((player_x - start_x) / PX_PER_METER).floor().max(0.0) as u32
}

/// Tracks which milestones have already paid out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilestoneLedger {
    next_fixed: usize,
    repeats_claimed: u32,
}

impl MilestoneLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current best distance and return every milestone newly
    /// crossed since the last call, as `(distance_m, coins)`.
    pub fn advance(&mut self, distance_m: u32) -> Vec<(u32, u32)> {
        let mut awards = Vec::new();
        while self.next_fixed < MILESTONES.len() && distance_m >= MILESTONES[self.next_fixed].0 {
            awards.push(MILESTONES[self.next_fixed]);
            self.next_fixed += 1;
        }
        if distance_m >= REPEAT_START_M {
            let crossed = (distance_m - REPEAT_START_M) / REPEAT_INTERVAL_M + 1;
            while self.repeats_claimed < crossed {
                awards.push((
                    REPEAT_START_M + self.repeats_claimed * REPEAT_INTERVAL_M,
                    REPEAT_COINS,
                ));
                self.repeats_claimed += 1;
            }
        }
        awards
    }
}
