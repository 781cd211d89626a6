//! Seeded 32-bit generator shared by every lexical choice in the corpus.
//!
//! Mulberry32: tiny, fast, and trivially portable. The output sequence is a
//! pure function of `(seed, call count)`, so a corpus generated here matches
//! one generated by any other Mulberry32 implementation bit for bit.

const GOLDEN_GAMMA: u32 = 0x6d2b_79f5;
const TWO_POW_32: f64 = 4_294_967_296.0;

#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        let mut z = self.state;
        z = (z ^ (z >> 15)).wrapping_mul(z | 1);
        z ^= z.wrapping_add((z ^ (z >> 7)).wrapping_mul(z | 61));
        f64::from(z ^ (z >> 14)) / TWO_POW_32
    }

    /// Uniform integer in `min..=max`.
    pub fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        let span = f64::from(max - min + 1);
        min + (self.next_f64() * span).floor() as u32
    }

    /// Uniformly pick one element. Panics on an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        let idx = (self.next_f64() * items.len() as f64).floor() as usize;
        &items[idx.min(items.len() - 1)]
    }
}
