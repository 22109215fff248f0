//! Seeded random streams for the sampler and the optimizer.

use std::hash::Hasher;

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use siphasher::sip::SipHasher13;

/// Random stream fully determined by its seed.
///
/// Seeds derived from request contents go through SipHash-1-3 with zero keys,
/// which is stable across platforms and releases. A stream built from the
/// same seed replays the same draws.
#[derive(Debug, Clone)]
pub struct RngHandle {
    rng: StdRng,
}

impl RngHandle {
    /// Starts the stream for `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
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

fn sip_words(words: impl IntoIterator<Item = u64>) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    words.into_iter().for_each(|word| hasher.write_u64(word));
    hasher.finish()
}

/// Seed of substream `substream` under `master_seed`.
pub fn derive_substream_seed(master_seed: u64, substream: u64) -> u64 {
    sip_words([master_seed, substream])
}

/// Seed derived from request words (identifiers, counts).
///
/// The word count is hashed first so `[1, 2]` and `[1, 2, 0]` differ.
pub fn derive_request_seed(words: &[u64]) -> u64 {
    sip_words(std::iter::once(words.len() as u64).chain(words.iter().copied()))
}

/// Fresh seed from OS entropy. Record it, or the run cannot be replayed.
pub fn entropy_seed() -> u64 {
    OsRng.next_u64()
}
