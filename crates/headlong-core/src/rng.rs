use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Multiplier for deriving per-chunk seeds from the world seed.
const CHUNK_SEED_MUL: u64 = 1_664_525;
/// Increment for deriving per-chunk seeds from the world seed.
const CHUNK_SEED_ADD: u64 = 1_013_904_223;

/// A deterministic random stream seeded from a `u64`.
///
/// Every draw consumes exactly one value from the underlying generator, so
/// two streams built from the same seed produce identical sequences no
/// matter which helper methods are called, as long as the call order
/// matches. Generation code relies on this to replay identical worlds.
#[derive(Debug, Clone)]
pub struct SeededStream {
    rng: StdRng,
}

impl SeededStream {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Next uniform value in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Uniform value in `[min, max)`.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }

    /// Uniformly chosen element, or `None` if the slice is empty.
    ///
    /// Consumes one draw even when the slice has a single element, so
    /// callers replaying a stream see the same sequence either way.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = (self.next_f32() * items.len() as f32) as usize;
        // next_f32 < 1.0, but guard the cast anyway
        Some(&items[idx.min(items.len() - 1)])
    }

    /// Index into a collection of `len` elements. `len` must be non-zero.
    pub fn pick_index(&mut self, len: usize) -> usize {
        let idx = (self.next_f32() * len as f32) as usize;
        idx.min(len.saturating_sub(1))
    }

    /// `1.0` or `-1.0` with equal probability.
    pub fn sign(&mut self) -> f32 {
        if self.chance(0.5) { 1.0 } else { -1.0 }
    }

    /// Fisher-Yates shuffle driven by this stream.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_f32() * (i + 1) as f32) as usize;
            items.swap(i, j.min(i));
        }
    }
}

/// Derive the seed for a chunk from the world seed and chunk index.
///
/// Adjacent indices map to unrelated seeds, so neighboring chunks share no
/// visible structure beyond the explicit height continuity hand-off.
pub fn chunk_seed(world_seed: u64, chunk_index: i32) -> u64 {
    let mixed = (chunk_index as i64 as u64)
        .wrapping_mul(CHUNK_SEED_MUL)
        .wrapping_add(CHUNK_SEED_ADD);
    world_seed ^ mixed
}

/// Derive a seed from a world position, for effects anchored to a spot
/// (enemy rolls on a platform, debris scatter at a death point).
pub fn coord_seed(world_seed: u64, x: f32, y: f32) -> u64 {
    world_seed ^ ((x + y) as i64 as u64)
}
