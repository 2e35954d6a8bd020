use fastrand::Rng;

/// Deterministic random number service.
///
/// All randomness in a run flows from a single configured seed. Each consumer
/// gets its own named stream so that adding a draw in one component cannot
/// shift the sequence observed by another. A stream's seed is
/// `root_seed XOR fnv1a64(name)`; replaying with the same root seed and the
/// same stream names reproduces the exact event trace.
#[derive(Clone, Debug)]
pub struct RngService {
    root_seed: u64,
}

impl RngService {
    pub fn new(root_seed: u64) -> Self {
        Self { root_seed }
    }

    pub fn root_seed(&self) -> u64 {
        self.root_seed
    }

    /// Returns the RNG for the stream with the given stable name.
    pub fn stream(&self, name: &str) -> Rng {
        Rng::with_seed(self.root_seed ^ fnv1a64(name.as_bytes()))
    }
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_and_name_give_same_sequence() {
        let service = RngService::new(1);
        let mut a = service.stream("events");
        let mut b = service.stream("events");
        for _ in 0..100 {
            assert_eq!(a.u64(..), b.u64(..));
        }
    }

    #[test]
    fn different_names_give_different_sequences() {
        let service = RngService::new(1);
        let mut a = service.stream("events");
        let mut b = service.stream("movement");
        let left: Vec<u64> = (0..8).map(|_| a.u64(..)).collect();
        let right: Vec<u64> = (0..8).map(|_| b.u64(..)).collect();
        assert_ne!(left, right);
    }

    #[test]
    fn different_seeds_give_different_sequences() {
        let mut a = RngService::new(1).stream("churn/0");
        let mut b = RngService::new(2).stream("churn/0");
        assert_ne!(a.u64(..), b.u64(..));
    }
}
