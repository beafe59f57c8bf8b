use anchor_lang::prelude::*;
use anchor_lang::solana_program::keccak;

use crate::errors::EngineError;

/// Semantic role of a token kind. Closed set: a kind id with no role tag
/// cannot exist, so "reward id doesn't exist" is unrepresentable.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
#[repr(u8)]
pub enum KindRole {
    /// Accepted as sacrifice input and burned
    Burnable = 0,
    /// Mintable as a reward outcome
    Mintable = 1,
    /// Consolation outcome when the pool cannot resolve
    Fallback = 2,
    /// Intermediate kind used only by conversion rules
    Conversion = 3,
}

/// Which collaborator credits this kind
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
#[repr(u8)]
pub enum KindClass {
    /// SPL mint, credited through the token program
    Fungible = 0,
    /// Catalog item, credited through the item-catalog program
    CatalogItem = 1,
}

/// A registered token kind
///
/// KIND IDS ARE PERMANENT: once a pool or conversion rule has referenced an
/// id, it must never be reassigned to a different mint. `set_token_kinds`
/// refuses to drop an id that is still referenced.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub struct TokenKind {
    pub id: u16,
    pub role: KindRole,
    pub class: KindClass,
    /// SPL mint for Fungible kinds; the item mint for CatalogItem kinds
    pub mint: Pubkey,
}

/// Registry of every kind the engine may touch
#[account]
#[derive(InitSpace)]
pub struct KindTable {
    #[max_len(32)]
    pub kinds: Vec<TokenKind>,
    /// Bumped on every wholesale replacement
    pub version: u32,
    pub bump: u8,
}

impl KindTable {
    pub fn kind(&self, id: u16) -> Option<&TokenKind> {
        self.kinds.iter().find(|k| k.id == id)
    }

    pub fn contains(&self, id: u16) -> bool {
        self.kind(id).is_some()
    }
}

/// One weighted pool entry. Duplicate kind ids are allowed and simply stack
/// probability mass on that kind.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub struct PoolEntry {
    pub kind_id: u16,
    pub weight: u32,
}

/// The active reward pool
///
/// Replaced wholesale by `set_weighted_pool`; never patched in place, so an
/// in-flight sacrifice sees either the old or the new pool in full.
#[account]
#[derive(InitSpace)]
pub struct WeightedPool {
    #[max_len(32)]
    pub entries: Vec<PoolEntry>,
    /// Cached sum of entry weights, recomputed on every mutation
    pub total_weight: u64,
    pub fallback_kind: u16,
    pub has_fallback: bool,
    pub version: u32,
    pub bump: u8,
}

impl WeightedPool {
    pub fn fallback(&self) -> Option<u16> {
        if self.has_fallback {
            Some(self.fallback_kind)
        } else {
            None
        }
    }

    /// Sum of entry weights, widened to u64 so 32 entries of u32::MAX
    /// cannot wrap.
    pub fn total_of(entries: &[PoolEntry]) -> u64 {
        entries.iter().map(|e| e.weight as u64).sum()
    }

    /// The cached-total invariant, re-checked by the upgrade coordinator.
    pub fn invariant_holds(&self) -> bool {
        self.total_weight == Self::total_of(&self.entries)
            && (self.total_weight > 0 || self.has_fallback)
    }
}

/// Fixed-ratio exchange: `ratio` units of `from_kind` yield 1 of `to_kind`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub struct ConversionRule {
    pub from_kind: u16,
    pub to_kind: u16,
    pub ratio: u32,
}

impl ConversionRule {
    /// Exact application of the rule. Non-multiples are rejected, never
    /// rounded, so no partial/remainder minting can occur.
    pub fn apply(&self, amount: u64) -> std::result::Result<u64, ()> {
        if self.ratio == 0 || amount == 0 || amount % self.ratio as u64 != 0 {
            return Err(());
        }
        Ok(amount / self.ratio as u64)
    }
}

#[account]
#[derive(InitSpace)]
pub struct ConversionTable {
    #[max_len(16)]
    pub rules: Vec<ConversionRule>,
    pub version: u32,
    pub bump: u8,
}

impl ConversionTable {
    pub fn rule_for(&self, from_kind: u16) -> Option<&ConversionRule> {
        self.rules.iter().find(|r| r.from_kind == from_kind)
    }
}

/// One role -> current-authority binding
///
/// `version` increments on every rotation so dependents can detect that a
/// previously cached authority is stale. There is deliberately no history:
/// the current entry is the only authority, ever.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, PartialEq, Eq, Debug, InitSpace)]
pub struct TrustEntry {
    #[max_len(16)]
    pub role: String,
    pub authority: Pubkey,
    pub version: u32,
}

#[account]
#[derive(InitSpace)]
pub struct TrustRegistry {
    #[max_len(8)]
    pub entries: Vec<TrustEntry>,
    pub bump: u8,
}

impl TrustRegistry {
    pub fn entry(&self, role: &str) -> Option<&TrustEntry> {
        self.entries.iter().find(|e| e.role == role)
    }

    pub fn authority_of(&self, role: &str) -> Option<Pubkey> {
        self.entry(role).map(|e| e.authority)
    }

    /// Equality check against the current entry only. A caller that was the
    /// authority before a rotation is just as unauthorized as one that
    /// never was.
    pub fn is_authorized(&self, role: &str, caller: &Pubkey) -> bool {
        self.authority_of(role).map_or(false, |a| a == *caller)
    }

    /// Privileged-call gate. Failures here are wiring errors, not user
    /// errors, and are logged with the OPERATOR prefix so they stand apart
    /// from InsufficientBalance in transaction logs.
    pub fn require_role(&self, role: &str, caller: &Pubkey) -> Result<()> {
        match self.entry(role) {
            None => {
                msg!("OPERATOR ERROR: role '{}' missing from trust registry", role);
                Err(EngineError::RoleNotFound.into())
            }
            Some(entry) if entry.authority != *caller => {
                msg!(
                    "OPERATOR ERROR: caller {} is not the current '{}' authority {} (version {})",
                    caller,
                    role,
                    entry.authority,
                    entry.version
                );
                Err(EngineError::Unauthorized.into())
            }
            Some(_) => Ok(()),
        }
    }

    /// Replace (or insert) a role binding, bumping its version.
    /// Returns (previous_authority, new_version).
    pub fn rotate(&mut self, role: &str, authority: Pubkey) -> (Option<Pubkey>, u32) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.role == role) {
            let previous = entry.authority;
            entry.authority = authority;
            entry.version = entry.version.saturating_add(1);
            (Some(previous), entry.version)
        } else {
            self.entries.push(TrustEntry {
                role: role.to_string(),
                authority,
                version: 1,
            });
            (None, 1)
        }
    }
}

/// Per-account cooldown tracker
///
/// Seeds: ["cooldown", account]. Created on first action, never deleted.
/// A zeroed record (no action yet) always admits.
#[account]
#[derive(InitSpace)]
pub struct CooldownRecord {
    pub last_action_height: u64,
    pub actions: u64,
    pub bump: u8,
}

impl CooldownRecord {
    /// Heights remaining until the next admitted action. 0 means admitted.
    pub fn remaining(&self, current_height: u64, min_spacing: u64) -> u64 {
        if self.actions == 0 {
            return 0;
        }
        let next_allowed = self.last_action_height.saturating_add(min_spacing);
        next_allowed.saturating_sub(current_height)
    }

    /// Atomic check-then-record: the caller holds this account mutably for
    /// the whole transaction, so no second request can pass the check
    /// before the record is written. Returns the remaining spacing on
    /// rejection.
    pub fn check_and_record(
        &mut self,
        current_height: u64,
        min_spacing: u64,
    ) -> std::result::Result<(), u64> {
        let remaining = self.remaining(current_height, min_spacing);
        if remaining > 0 {
            return Err(remaining);
        }
        self.last_action_height = current_height;
        self.actions = self.actions.saturating_add(1);
        Ok(())
    }
}

/// Engine state: admin identity, upgrade pointers, rate-limit config and
/// the engine-wide draw nonce
#[account]
#[derive(InitSpace)]
pub struct EngineState {
    pub admin: Pubkey,
    /// Stable external identifier dependents trust: the engine-authority
    /// PDA. Never changes across upgrades.
    pub stable_id: Pubkey,
    /// Currently active implementation behind the stable identifier
    pub active_impl: Pubkey,
    pub impl_version: u32,
    pub pending_impl: Pubkey,
    pub has_pending: bool,
    /// Minimum heights between actions per account; 0 disables the guard
    pub min_spacing: u64,
    /// Engine-wide monotonic nonce, incremented on every draw. Never
    /// per-account: nonce reuse within a block made outcomes predictable.
    pub draw_nonce: u64,
    pub total_sacrifices: u64,
    pub total_input_burned: u64,
    pub bump: u8,
}

/// Append-only audit record of one resolved sacrifice
///
/// Seeds: ["sacrifice_record", nonce]. Written once, never mutated.
#[account]
#[derive(InitSpace)]
pub struct SacrificeRecord {
    pub account: Pubkey,
    pub input_kind: u16,
    pub input_amount: u64,
    pub outcome_kind: u16,
    pub outcome_amount: u64,
    pub height: u64,
    pub nonce: u64,
    /// keccak256(account || input_kind || input_amount || outcome_kind ||
    /// outcome_amount || nonce) for off-chain verification
    pub record_hash: [u8; 32],
    pub bump: u8,
}

impl SacrificeRecord {
    pub fn compute_hash(
        account: &Pubkey,
        input_kind: u16,
        input_amount: u64,
        outcome_kind: u16,
        outcome_amount: u64,
        nonce: u64,
    ) -> [u8; 32] {
        let mut data = Vec::with_capacity(32 + 2 + 8 + 2 + 8 + 8);
        data.extend_from_slice(&account.to_bytes());
        data.extend_from_slice(&input_kind.to_le_bytes());
        data.extend_from_slice(&input_amount.to_le_bytes());
        data.extend_from_slice(&outcome_kind.to_le_bytes());
        data.extend_from_slice(&outcome_amount.to_le_bytes());
        data.extend_from_slice(&nonce.to_le_bytes());
        keccak::hash(&data).to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_cooldown() -> CooldownRecord {
        CooldownRecord {
            last_action_height: 0,
            actions: 0,
            bump: 255,
        }
    }

    #[test]
    fn first_action_always_admitted() {
        let mut cd = fresh_cooldown();
        // min_spacing far larger than current height: still admitted
        assert_eq!(cd.check_and_record(3, 1_000), Ok(()));
        assert_eq!(cd.last_action_height, 3);
        assert_eq!(cd.actions, 1);
    }

    #[test]
    fn cooldown_rejects_with_exact_remaining() {
        let mut cd = fresh_cooldown();
        cd.check_and_record(100, 10).unwrap();
        // h' < h + min_spacing fails with remaining = h + min_spacing - h'
        assert_eq!(cd.check_and_record(104, 10), Err(6));
        // rejection must not update the record
        assert_eq!(cd.last_action_height, 100);
        assert_eq!(cd.actions, 1);
        // boundary: exactly min_spacing later is admitted
        assert_eq!(cd.check_and_record(110, 10), Ok(()));
    }

    #[test]
    fn zero_spacing_disables_guard() {
        let mut cd = fresh_cooldown();
        assert_eq!(cd.check_and_record(50, 0), Ok(()));
        assert_eq!(cd.check_and_record(50, 0), Ok(()));
        assert_eq!(cd.check_and_record(50, 0), Ok(()));
        assert_eq!(cd.actions, 3);
    }

    #[test]
    fn remaining_saturates_near_u64_max() {
        let cd = CooldownRecord {
            last_action_height: u64::MAX - 1,
            actions: 1,
            bump: 255,
        };
        // next_allowed saturates instead of wrapping to a small number
        assert_eq!(cd.remaining(0, 10), u64::MAX);
    }

    #[test]
    fn conversion_is_exact() {
        let rule = ConversionRule {
            from_kind: 1,
            to_kind: 2,
            ratio: 100,
        };
        assert_eq!(rule.apply(100), Ok(1));
        assert_eq!(rule.apply(700), Ok(7));
        // never rounds
        assert_eq!(rule.apply(150), Err(()));
        assert_eq!(rule.apply(99), Err(()));
        assert_eq!(rule.apply(0), Err(()));
    }

    #[test]
    fn zero_ratio_rule_never_applies() {
        let rule = ConversionRule {
            from_kind: 1,
            to_kind: 2,
            ratio: 0,
        };
        assert_eq!(rule.apply(100), Err(()));
    }

    #[test]
    fn trust_rotation_bumps_version_and_drops_previous() {
        let mut registry = TrustRegistry {
            entries: vec![],
            bump: 255,
        };
        let first = Pubkey::new_unique();
        let second = Pubkey::new_unique();

        assert_eq!(registry.rotate("engine", first), (None, 1));
        assert!(registry.is_authorized("engine", &first));

        let (previous, version) = registry.rotate("engine", second);
        assert_eq!(previous, Some(first));
        assert_eq!(version, 2);

        // the rotated-out authority must fail against the current entry
        assert!(!registry.is_authorized("engine", &first));
        assert!(registry.is_authorized("engine", &second));
        assert!(registry.require_role("engine", &first).is_err());
        assert!(registry.require_role("engine", &second).is_ok());
    }

    #[test]
    fn unknown_role_is_never_authorized() {
        let registry = TrustRegistry {
            entries: vec![],
            bump: 255,
        };
        assert!(!registry.is_authorized("shop", &Pubkey::new_unique()));
        assert!(registry.require_role("shop", &Pubkey::new_unique()).is_err());
    }

    #[test]
    fn pool_invariant_tracks_entries() {
        let entries = vec![
            PoolEntry { kind_id: 1, weight: 70 },
            PoolEntry { kind_id: 2, weight: 30 },
        ];
        let pool = WeightedPool {
            total_weight: WeightedPool::total_of(&entries),
            entries,
            fallback_kind: 0,
            has_fallback: false,
            version: 1,
            bump: 255,
        };
        assert_eq!(pool.total_weight, 100);
        assert!(pool.invariant_holds());

        let mut stale = pool;
        stale.total_weight = 99;
        assert!(!stale.invariant_holds());
    }

    #[test]
    fn empty_pool_needs_fallback() {
        let mut pool = WeightedPool {
            entries: vec![],
            total_weight: 0,
            fallback_kind: 9,
            has_fallback: false,
            version: 1,
            bump: 255,
        };
        assert!(!pool.invariant_holds());
        pool.has_fallback = true;
        assert!(pool.invariant_holds());
    }

    #[test]
    fn record_hash_is_stable_and_input_sensitive() {
        let account = Pubkey::new_unique();
        let a = SacrificeRecord::compute_hash(&account, 1, 5, 2, 5, 42);
        let b = SacrificeRecord::compute_hash(&account, 1, 5, 2, 5, 42);
        let c = SacrificeRecord::compute_hash(&account, 1, 5, 2, 5, 43);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
