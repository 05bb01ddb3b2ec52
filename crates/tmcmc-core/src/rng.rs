//! Seeded random streams.
//!
//! A run owns one master seed. Every independent unit of work (a prior draw,
//! a chain, a resampling pass) opens its own stream from
//! `derive_substream_seed(master, id)`, so its draws never depend on the
//! order in which sibling units execute.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// Random stream used by priors, proposals and the resampler.
#[derive(Debug, Clone)]
pub struct RngHandle {
    rng: StdRng,
}

impl RngHandle {
    /// Opens a stream seeded directly with `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Opens stream `id` of `master_seed`.
    pub fn substream(master_seed: u64, id: u64) -> Self {
        Self::from_seed(derive_substream_seed(master_seed, id))
    }

    /// Uniform draw in `[0, 1)` from the top 53 bits of one `u64`.
    pub fn next_unit(&mut self) -> f64 {
        (self.rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

impl RngCore for RngHandle {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

/// SipHash-1-3 (zero keys) of `(master_seed, id)`.
pub fn derive_substream_seed(master_seed: u64, id: u64) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(master_seed);
    hasher.write_u64(id);
    hasher.finish()
}
