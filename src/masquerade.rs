//! Masquerade domain selection.
//!
//! The relay advertises a decoy domain as both TLS common name and SNI so
//! its traffic blends with ordinary HTTPS. The domain is re-sampled on
//! every run and never persisted; an already-issued certificate keeps its
//! original common name until it expires.

use rand::seq::SliceRandom;
use rand::Rng;

/// Candidate decoy domains. All serve high-volume HTTPS traffic.
pub const MASQUERADE_DOMAINS: &[&str] = &[
    "www.bing.com",
    "www.apple.com",
    "www.microsoft.com",
    "www.amazon.com",
    "addons.mozilla.org",
    "www.fandom.com",
];

/// Pick a masquerade domain using the given RNG.
///
/// Taking the RNG as a parameter lets tests pin the choice with a seeded
/// generator.
pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    MASQUERADE_DOMAINS
        .choose(rng)
        .copied()
        .expect("candidate set is non-empty")
}

/// Pick a masquerade domain from the thread RNG.
pub fn pick_random() -> &'static str {
    pick(&mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn seeded_pick_is_deterministic() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        assert_eq!(pick(&mut a), pick(&mut b));
    }

    #[test]
    fn pick_stays_in_candidate_set() {
        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let domain = pick(&mut rng);
            assert!(MASQUERADE_DOMAINS.contains(&domain));
        }
    }

    #[test]
    fn candidates_look_like_hostnames() {
        for domain in MASQUERADE_DOMAINS {
            assert!(domain.contains('.'));
            assert!(!domain.contains("://"));
        }
    }
}
