//! Hierarchical seeds for reproducible sweeps.

use crate::error::EnvError;
use crate::types::SeriesId;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Width of a seed value in bytes.
pub const SEED_BYTES: usize = 16;

/// Generator handed out for a single purpose (one series' generation step).
pub type RandomStream = ChaCha8Rng;

/// A 128-bit seed plus the generator seeded from it.
///
/// Seeds are derived, never mutated:
/// - **Children**: `SHA-256(value || context...)` seeds a ChaCha8 stream, and
///   the first 16 bytes drawn from it become the child value
/// - **Streams**: `fresh_random` draws 16 bytes from this seed's own
///   generator, so consecutive calls give distinct streams while a seed
///   rebuilt from the same value replays the same sequence
pub struct Seed {
    /// The seed value
    value: [u8; SEED_BYTES],

    /// Generator seeded from `value`, advanced by `fresh_random`
    rng: ChaCha8Rng,
}

impl Seed {
    /// Creates a seed from its raw value.
    pub fn from_bytes(value: [u8; SEED_BYTES]) -> Self {
        Self {
            value,
            rng: ChaCha8Rng::from_seed(expand(&value)),
        }
    }

    /// Creates a seed from a byte slice, which must be exactly 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EnvError> {
        let value: [u8; SEED_BYTES] = bytes
            .try_into()
            .map_err(|_| EnvError::seed_length(SEED_BYTES, bytes.len()))?;
        Ok(Self::from_bytes(value))
    }

    /// Creates a seed whose value is the UUID's bytes.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self::from_bytes(*uuid.as_bytes())
    }

    /// Creates a random master seed from OS entropy.
    pub fn generate() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Returns the seed value.
    pub fn as_bytes(&self) -> &[u8; SEED_BYTES] {
        &self.value
    }

    /// Returns the seed value as a UUID (for logging and config files).
    pub fn as_uuid(&self) -> Uuid {
        Uuid::from_bytes(self.value)
    }

    /// Derives a child seed from this seed and an ordered context path.
    ///
    /// Pure: only the value participates, never the generator state.
    pub fn derive_child<P: AsRef<[u8]>>(&self, context: &[P]) -> Seed {
        let mut hasher = Sha256::new();
        hasher.update(self.value);
        for part in context {
            hasher.update(part.as_ref());
        }
        let digest: [u8; 32] = hasher.finalize().into();

        let mut rng = ChaCha8Rng::from_seed(digest);
        let mut child = [0u8; SEED_BYTES];
        rng.fill_bytes(&mut child);
        Seed::from_bytes(child)
    }

    /// Derives the child seed keyed by a series' epoch and iteration.
    pub fn for_series(&self, id: SeriesId) -> Seed {
        self.derive_child(&id.context_bytes())
    }

    /// Returns a new generator for one purpose, advancing this seed's own
    /// generator.
    pub fn fresh_random(&mut self) -> RandomStream {
        let mut bytes = [0u8; SEED_BYTES];
        self.rng.fill_bytes(&mut bytes);
        ChaCha8Rng::from_seed(expand(&bytes))
    }
}

/// Stretches 16 bytes of seed material to ChaCha's 32-byte key.
fn expand(bytes: &[u8; SEED_BYTES]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

impl PartialEq for Seed {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Seed {}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Seed").field(&self.as_uuid()).finish()
    }
}

impl std::fmt::Display for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_uuid())
    }
}

impl std::str::FromStr for Seed {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Seed::from_uuid)
            .map_err(|_| EnvError::invalid_seed(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::Rng;

    const MASTER: &str = "09c158c3-18f3-40a4-80fe-2b855bff538f";

    fn master() -> Seed {
        MASTER.parse().unwrap()
    }

    fn draws(rng: &mut RandomStream) -> Vec<u64> {
        (0..8).map(|_| rng.gen()).collect()
    }

    #[test]
    fn test_derive_child_deterministic() {
        let a = master().derive_child(&[b"epoch".as_slice(), b"iter".as_slice()]);
        let b = master().derive_child(&[b"epoch".as_slice(), b"iter".as_slice()]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_context_order_matters() {
        let id = SeriesId::new(1, 2);
        let swapped = SeriesId::new(2, 1);
        assert_ne!(master().for_series(id), master().for_series(swapped));
    }

    #[test]
    fn test_derive_ignores_generator_state() {
        let mut advanced = master();
        let _ = advanced.fresh_random();
        let _ = advanced.fresh_random();

        let id = SeriesId::new(0, 5);
        assert_eq!(advanced.for_series(id), master().for_series(id));
    }

    #[test]
    fn test_fresh_random_consumes_parent() {
        let mut seed = master();
        let mut first = seed.fresh_random();
        let mut second = seed.fresh_random();
        assert_ne!(draws(&mut first), draws(&mut second));
    }

    #[test]
    fn test_fresh_random_replays_from_same_value() {
        let mut seed1 = master().for_series(SeriesId::new(3, 9));
        let mut seed2 = Seed::from_bytes(*seed1.as_bytes());

        for _ in 0..3 {
            assert_eq!(
                draws(&mut seed1.fresh_random()),
                draws(&mut seed2.fresh_random())
            );
        }
    }

    #[test]
    fn test_series_streams_independent() {
        let m = master();
        let mut s00 = m.for_series(SeriesId::new(0, 0));
        let mut s01 = m.for_series(SeriesId::new(0, 1));
        let mut s10 = m.for_series(SeriesId::new(1, 0));

        let d00 = draws(&mut s00.fresh_random());
        let d01 = draws(&mut s01.fresh_random());
        let d10 = draws(&mut s10.fresh_random());

        assert_ne!(d00, d01);
        assert_ne!(d00, d10);
        assert_ne!(d01, d10);
    }

    #[test]
    fn test_from_slice_rejects_wrong_width() {
        let err = Seed::from_slice(&[0u8; 15]).unwrap_err();
        assert_eq!(err, EnvError::seed_length(16, 15));
        assert!(Seed::from_slice(&[7u8; 16]).is_ok());
    }

    #[test]
    fn test_uuid_round_trip() {
        let seed = master();
        assert_eq!(seed.to_string(), MASTER);
        assert!("not-a-seed".parse::<Seed>().is_err());
    }

    #[test]
    fn test_generated_seeds_differ() {
        assert_ne!(Seed::generate(), Seed::generate());
    }

    proptest! {
        #[test]
        fn prop_distinct_series_distinct_children(
            e1 in 0u64..1000, i1 in 0u64..1000,
            e2 in 0u64..1000, i2 in 0u64..1000,
        ) {
            prop_assume!((e1, i1) != (e2, i2));
            let m = master();
            prop_assert_ne!(
                m.for_series(SeriesId::new(e1, i1)),
                m.for_series(SeriesId::new(e2, i2))
            );
        }
    }
}
