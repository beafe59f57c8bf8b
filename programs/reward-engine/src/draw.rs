//! Weighted outcome resolution
//!
//! Pure functions, no account access: the sacrifice handler feeds them the
//! pool snapshot, the caller's seed material and the engine-wide nonce, and
//! acts on the result. Keeping the draw pure is what makes the distribution
//! and determinism properties unit-testable.

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::keccak;

use crate::state::WeightedPool;

/// Result of one weighted draw
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DrawOutcome {
    pub kind_id: u16,
    /// Index into the pool's entries, or None when the fallback resolved
    pub entry_index: Option<usize>,
}

/// Hash (seed_material || account || nonce) down to a draw value.
///
/// The nonce is engine-wide and increments on every draw. Reusing a nonce
/// for the same block/seed is what made outcomes predictable and
/// exploitable, so the caller must never pass the same nonce twice.
pub fn draw_value(seed_material: &[u8; 32], account: &Pubkey, nonce: u64) -> u64 {
    let mut data = Vec::with_capacity(32 + 32 + 8);
    data.extend_from_slice(seed_material);
    data.extend_from_slice(&account.to_bytes());
    data.extend_from_slice(&nonce.to_le_bytes());

    let hash = keccak::hash(&data).to_bytes();
    u64::from_le_bytes([
        hash[0], hash[1], hash[2], hash[3], hash[4], hash[5], hash[6], hash[7],
    ])
}

/// Resolve one outcome from the pool.
///
/// Entries are walked in stored order, accumulating weights until the
/// running sum exceeds the draw; the order is part of the protocol, so the
/// same (pool, seed, account, nonce) always resolves identically.
///
/// An empty or zero-weight pool resolves to the fallback kind: a sacrifice
/// that has already burned its input must always move forward. None is only
/// returned when no fallback is configured either, which admin validation
/// keeps out of the request path.
pub fn resolve(
    pool: &WeightedPool,
    seed_material: &[u8; 32],
    account: &Pubkey,
    nonce: u64,
) -> Option<DrawOutcome> {
    if pool.entries.is_empty() || pool.total_weight == 0 {
        return pool.fallback().map(|kind_id| DrawOutcome {
            kind_id,
            entry_index: None,
        });
    }

    let draw = draw_value(seed_material, account, nonce) % pool.total_weight;

    let mut acc: u64 = 0;
    for (index, entry) in pool.entries.iter().enumerate() {
        acc += entry.weight as u64;
        if draw < acc {
            return Some(DrawOutcome {
                kind_id: entry.kind_id,
                entry_index: Some(index),
            });
        }
    }

    // Unreachable while total_weight == sum(weights); kept as a guard
    // against a corrupted cached total.
    pool.fallback().map(|kind_id| DrawOutcome {
        kind_id,
        entry_index: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PoolEntry;

    fn pool(entries: Vec<PoolEntry>, fallback: Option<u16>) -> WeightedPool {
        WeightedPool {
            total_weight: WeightedPool::total_of(&entries),
            entries,
            fallback_kind: fallback.unwrap_or(0),
            has_fallback: fallback.is_some(),
            version: 1,
            bump: 255,
        }
    }

    #[test]
    fn draw_is_deterministic_per_nonce() {
        let account = Pubkey::new_unique();
        let seed = [7u8; 32];
        assert_eq!(draw_value(&seed, &account, 5), draw_value(&seed, &account, 5));
        assert_ne!(draw_value(&seed, &account, 5), draw_value(&seed, &account, 6));
    }

    #[test]
    fn single_entry_pool_always_resolves_that_entry() {
        let p = pool(vec![PoolEntry { kind_id: 3, weight: 1 }], Some(3));
        let account = Pubkey::new_unique();
        for nonce in 0..50 {
            let outcome = resolve(&p, &[0u8; 32], &account, nonce).unwrap();
            assert_eq!(outcome.kind_id, 3);
            assert_eq!(outcome.entry_index, Some(0));
        }
    }

    #[test]
    fn zero_weight_entries_are_never_selected() {
        let p = pool(
            vec![
                PoolEntry { kind_id: 1, weight: 0 },
                PoolEntry { kind_id: 2, weight: 10 },
                PoolEntry { kind_id: 3, weight: 0 },
            ],
            None,
        );
        let account = Pubkey::new_unique();
        for nonce in 0..200 {
            let outcome = resolve(&p, &[1u8; 32], &account, nonce).unwrap();
            assert_eq!(outcome.kind_id, 2);
        }
    }

    #[test]
    fn empty_pool_resolves_to_fallback() {
        let p = pool(vec![], Some(9));
        let outcome = resolve(&p, &[2u8; 32], &Pubkey::new_unique(), 0).unwrap();
        assert_eq!(outcome.kind_id, 9);
        assert_eq!(outcome.entry_index, None);
    }

    #[test]
    fn zero_total_weight_resolves_to_fallback() {
        let p = pool(vec![PoolEntry { kind_id: 1, weight: 0 }], Some(9));
        let outcome = resolve(&p, &[2u8; 32], &Pubkey::new_unique(), 0).unwrap();
        assert_eq!(outcome.kind_id, 9);
    }

    #[test]
    fn unresolvable_pool_without_fallback_is_none() {
        let p = pool(vec![], None);
        assert!(resolve(&p, &[0u8; 32], &Pubkey::new_unique(), 0).is_none());
    }

    #[test]
    fn stacked_duplicate_kind_gains_probability_mass() {
        // kind 1 appears twice with weight 1 each, kind 2 once
        let p = pool(
            vec![
                PoolEntry { kind_id: 1, weight: 1 },
                PoolEntry { kind_id: 1, weight: 1 },
                PoolEntry { kind_id: 2, weight: 1 },
            ],
            None,
        );
        let account = Pubkey::new_unique();
        let ones = (0..30_000)
            .filter(|&n| resolve(&p, &[3u8; 32], &account, n).unwrap().kind_id == 1)
            .count();
        let freq = ones as f64 / 30_000.0;
        assert!((freq - 2.0 / 3.0).abs() < 0.02, "freq = {}", freq);
    }

    #[test]
    fn distribution_converges_to_weights() {
        // pool {(A=1, 70), (B=2, 30)}: frequency of A over many nonce-varied
        // draws must converge to 0.7
        let p = pool(
            vec![
                PoolEntry { kind_id: 1, weight: 70 },
                PoolEntry { kind_id: 2, weight: 30 },
            ],
            None,
        );
        let account = Pubkey::new_unique();
        let seed = [5u8; 32];

        const N: u64 = 100_000;
        let a_hits = (0..N)
            .filter(|&nonce| resolve(&p, &seed, &account, nonce).unwrap().kind_id == 1)
            .count();

        let freq = a_hits as f64 / N as f64;
        assert!((freq - 0.7).abs() < 0.02, "freq of A = {}", freq);
    }
}
