use serde::{Deserialize, Serialize};

use crate::geom::Rect;

/// A bounce pad sitting on terrain. `squish` is the press-down animation
/// value (decays after a launch, cosmetic only).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpPad {
    pub rect: Rect,
    pub squish: f32,
}

impl JumpPad {
    pub fn new(rect: Rect) -> Self {
        Self { rect, squish: 0.0 }
    }
}

/// A rotating blade hazard that patrols vertically between two bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spinner {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub angle: f32,
    /// Rotation per normalized frame, sign is spin direction.
    pub angle_speed: f32,
    pub patrol_start_y: f32,
    pub patrol_end_y: f32,
    pub speed: f32,
    /// +1.0 descending, -1.0 ascending.
    pub direction: f32,
}

impl Spinner {
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }
}

/// One fixed-width slice of generated terrain.
///
/// Owns only static geometry; powerups and enemies live on the world so
/// they can outlive (or be culled independently of) the chunk window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: i32,
    /// Left edge in world px (`index * chunk_width`).
    pub x: f32,
    pub platforms: Vec<Rect>,
    pub spikes: Vec<Rect>,
    pub jump_pads: Vec<JumpPad>,
    pub spinners: Vec<Spinner>,
}

impl Chunk {
    pub fn new(index: i32, chunk_width: f32) -> Self {
        Self {
            index,
            x: index as f32 * chunk_width,
            platforms: Vec::new(),
            spikes: Vec::new(),
            jump_pads: Vec::new(),
            spinners: Vec::new(),
        }
    }

    pub fn right(&self, chunk_width: f32) -> f32 {
        self.x + chunk_width
    }
}
