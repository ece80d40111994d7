//! Deterministic jitter source for the wind term.
//!
//! `XorShift32` is a plain 32-bit xorshift generator (shifts 13, 17, 5). It
//! implements [`rand::RngCore`] so the trajectory loop can be driven by any
//! generator, but the default is seeded from a fingerprint of the build time:
//! runs differ between builds and repeat within one build.

use rand::{RngCore, SeedableRng};

/// Fixed-point scale shared by noise, wind and velocity.
pub const SCALE: i32 = 128;

/// Seed baked in by the build script.
pub const BUILD_SEED: u32 = parse_seed(env!("WINDMOUSE_BUILD_SEED"));

// Xorshift never leaves the all-zero state, so zero seeds are replaced.
const NONZERO_SEED: u32 = 2_166_136_261;

const fn parse_seed(text: &str) -> u32 {
    let bytes = text.as_bytes();
    let mut value: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        value = value.wrapping_mul(10).wrapping_add((bytes[i] - b'0') as u32);
        i += 1;
    }
    value
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub fn new(seed: u32) -> Self {
        let state = if seed == 0 { NONZERO_SEED } else { seed };
        Self { state }
    }

    /// Generator seeded from the build fingerprint
    pub fn from_build() -> Self {
        Self::new(BUILD_SEED)
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    fn advance(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

impl Default for XorShift32 {
    fn default() -> Self {
        Self::from_build()
    }
}

impl RngCore for XorShift32 {
    fn next_u32(&mut self) -> u32 {
        self.advance()
    }

    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.advance());
        let high = u64::from(self.advance());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.advance().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for XorShift32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

/// Next value in `[0, 255]`
pub fn unsigned_byte<R: RngCore + ?Sized>(rng: &mut R) -> u8 {
    (rng.next_u32() & (SCALE as u32 * 2 - 1)) as u8
}

/// Next value in `[-128, 127]`
pub fn signed_byte<R: RngCore + ?Sized>(rng: &mut R) -> i8 {
    (i16::from(unsigned_byte(rng)) - SCALE as i16) as i8
}
