use anchor_lang::prelude::*;

use crate::errors::EngineError;
use crate::state::*;
use crate::ROLE_ENGINE;

#[derive(Accounts)]
pub struct ProposeUpgrade<'info> {
    #[account(
        mut,
        seeds = [b"engine_state"],
        bump = engine_state.bump,
        constraint = engine_state.admin == admin.key() @ EngineError::NotAdmin
    )]
    pub engine_state: Account<'info, EngineState>,

    pub admin: Signer<'info>,
}

/// Stage a new implementation behind the stable identifier. Nothing
/// becomes active until `activate_upgrade` passes the invariant check.
pub fn propose_handler(ctx: Context<ProposeUpgrade>, new_impl: Pubkey) -> Result<()> {
    let state = &mut ctx.accounts.engine_state;
    state.pending_impl = new_impl;
    state.has_pending = true;

    emit!(UpgradeProposed {
        current_impl: state.active_impl,
        pending_impl: new_impl,
    });

    msg!("Upgrade proposed: {} (active: {})", new_impl, state.active_impl);
    Ok(())
}

#[derive(Accounts)]
pub struct ActivateUpgrade<'info> {
    #[account(
        mut,
        seeds = [b"engine_state"],
        bump = engine_state.bump,
        constraint = engine_state.admin == admin.key() @ EngineError::NotAdmin
    )]
    pub engine_state: Account<'info, EngineState>,

    #[account(
        seeds = [b"trust_registry"],
        bump = trust_registry.bump
    )]
    pub trust_registry: Account<'info, TrustRegistry>,

    #[account(
        seeds = [b"weighted_pool"],
        bump = weighted_pool.bump
    )]
    pub weighted_pool: Account<'info, WeightedPool>,

    #[account(
        seeds = [b"kind_table"],
        bump = kind_table.bump
    )]
    pub kind_table: Account<'info, KindTable>,

    #[account(
        seeds = [b"conversion_table"],
        bump = conversion_table.bump
    )]
    pub conversion_table: Account<'info, ConversionTable>,

    pub admin: Signer<'info>,
}

/// Activate the pending implementation, gated by the post-upgrade
/// invariant check. On any violation the transaction reverts and the
/// previous implementation stays active; "upgrade then hope" is not a
/// supported path.
pub fn activate_handler(ctx: Context<ActivateUpgrade>) -> Result<()> {
    let state = &ctx.accounts.engine_state;
    require!(state.has_pending, EngineError::NoPendingUpgrade);

    check_invariants(
        &ctx.accounts.trust_registry,
        &ctx.accounts.weighted_pool,
        &ctx.accounts.kind_table,
        &ctx.accounts.conversion_table,
        &state.stable_id,
    )
    .map_err(|violation| {
        msg!("OPERATOR ERROR: UPGRADE REJECTED: {:?}", violation);
        Error::from(match violation {
            UpgradeViolation::TrustDrift => EngineError::UpgradeRejectedTrustDrift,
            UpgradeViolation::PoolInvariant => EngineError::UpgradeRejectedPoolInvariant,
            UpgradeViolation::DanglingRule => EngineError::UpgradeRejectedDanglingRule,
        })
    })?;

    let state = &mut ctx.accounts.engine_state;
    let previous_impl = state.active_impl;
    state.active_impl = state.pending_impl;
    state.pending_impl = Pubkey::default();
    state.has_pending = false;
    state.impl_version = state
        .impl_version
        .checked_add(1)
        .ok_or(EngineError::ArithmeticOverflow)?;

    emit!(UpgradeActivated {
        previous_impl,
        new_impl: state.active_impl,
        impl_version: state.impl_version,
    });

    msg!(
        "✓ Upgrade activated: {} -> {} (version {})",
        previous_impl,
        state.active_impl,
        state.impl_version
    );
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UpgradeViolation {
    /// The "engine" role no longer resolves to the stable identifier
    TrustDrift,
    /// Cached pool total diverged, or zero weight with no usable fallback
    PoolInvariant,
    /// A conversion rule references a kind that no longer exists
    DanglingRule,
}

/// The post-upgrade invariant check, pure over configuration snapshots.
///
/// This is the single gate that catches authorization drift: an upgrade
/// that leaves the registry pointing at a stale implementation address is
/// rejected before any dependent can act on it.
pub fn check_invariants(
    registry: &TrustRegistry,
    pool: &WeightedPool,
    kinds: &KindTable,
    rules: &ConversionTable,
    stable_id: &Pubkey,
) -> std::result::Result<(), UpgradeViolation> {
    if registry.authority_of(ROLE_ENGINE) != Some(*stable_id) {
        return Err(UpgradeViolation::TrustDrift);
    }

    if !pool.invariant_holds() {
        return Err(UpgradeViolation::PoolInvariant);
    }
    for entry in pool.entries.iter() {
        if !kinds.contains(entry.kind_id) {
            return Err(UpgradeViolation::PoolInvariant);
        }
    }
    if let Some(fallback) = pool.fallback() {
        if !kinds.contains(fallback) {
            return Err(UpgradeViolation::PoolInvariant);
        }
    }

    for rule in rules.rules.iter() {
        if rule.ratio == 0 || !kinds.contains(rule.from_kind) || !kinds.contains(rule.to_kind) {
            return Err(UpgradeViolation::DanglingRule);
        }
    }

    Ok(())
}

#[event]
pub struct UpgradeProposed {
    pub current_impl: Pubkey,
    pub pending_impl: Pubkey,
}

#[event]
pub struct UpgradeActivated {
    pub previous_impl: Pubkey,
    pub new_impl: Pubkey,
    pub impl_version: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{KindClass, KindRole, PoolEntry, TokenKind};

    fn kind(id: u16, role: KindRole) -> TokenKind {
        TokenKind {
            id,
            role,
            class: KindClass::Fungible,
            mint: Pubkey::new_unique(),
        }
    }

    fn healthy() -> (TrustRegistry, WeightedPool, KindTable, ConversionTable, Pubkey) {
        let stable_id = Pubkey::new_unique();
        let mut registry = TrustRegistry {
            entries: vec![],
            bump: 255,
        };
        registry.rotate(ROLE_ENGINE, stable_id);

        let kinds = KindTable {
            kinds: vec![
                kind(1, KindRole::Burnable),
                kind(2, KindRole::Mintable),
                kind(3, KindRole::Fallback),
                kind(4, KindRole::Conversion),
            ],
            version: 1,
            bump: 255,
        };

        let entries = vec![
            PoolEntry { kind_id: 2, weight: 70 },
            PoolEntry { kind_id: 3, weight: 30 },
        ];
        let pool = WeightedPool {
            total_weight: WeightedPool::total_of(&entries),
            entries,
            fallback_kind: 3,
            has_fallback: true,
            version: 1,
            bump: 255,
        };

        let rules = ConversionTable {
            rules: vec![ConversionRule {
                from_kind: 1,
                to_kind: 4,
                ratio: 100,
            }],
            version: 1,
            bump: 255,
        };

        (registry, pool, kinds, rules, stable_id)
    }

    #[test]
    fn healthy_configuration_passes() {
        let (registry, pool, kinds, rules, stable_id) = healthy();
        assert_eq!(
            check_invariants(&registry, &pool, &kinds, &rules, &stable_id),
            Ok(())
        );
    }

    #[test]
    fn rotated_engine_role_is_trust_drift() {
        let (mut registry, pool, kinds, rules, stable_id) = healthy();
        // registry now points at some prior implementation address
        registry.rotate(ROLE_ENGINE, Pubkey::new_unique());
        assert_eq!(
            check_invariants(&registry, &pool, &kinds, &rules, &stable_id),
            Err(UpgradeViolation::TrustDrift)
        );
    }

    #[test]
    fn stale_cached_total_is_rejected() {
        let (registry, mut pool, kinds, rules, stable_id) = healthy();
        pool.total_weight = 1;
        assert_eq!(
            check_invariants(&registry, &pool, &kinds, &rules, &stable_id),
            Err(UpgradeViolation::PoolInvariant)
        );
    }

    #[test]
    fn zero_weight_without_fallback_is_rejected() {
        let (registry, mut pool, kinds, rules, stable_id) = healthy();
        pool.entries.clear();
        pool.total_weight = 0;
        pool.has_fallback = false;
        assert_eq!(
            check_invariants(&registry, &pool, &kinds, &rules, &stable_id),
            Err(UpgradeViolation::PoolInvariant)
        );

        // with the fallback configured the same pool is acceptable
        pool.has_fallback = true;
        pool.fallback_kind = 3;
        assert_eq!(
            check_invariants(&registry, &pool, &kinds, &rules, &stable_id),
            Ok(())
        );
    }

    #[test]
    fn dangling_conversion_rule_is_rejected() {
        let (registry, pool, mut kinds, rules, stable_id) = healthy();
        kinds.kinds.retain(|k| k.id != 4);
        // pool references survive, only the rule's target is gone
        assert_eq!(
            check_invariants(&registry, &pool, &kinds, &rules, &stable_id),
            Err(UpgradeViolation::DanglingRule)
        );
    }

    #[test]
    fn pool_entry_over_missing_kind_is_rejected() {
        let (registry, mut pool, kinds, rules, stable_id) = healthy();
        pool.entries.push(PoolEntry { kind_id: 99, weight: 1 });
        pool.total_weight = WeightedPool::total_of(&pool.entries);
        assert_eq!(
            check_invariants(&registry, &pool, &kinds, &rules, &stable_id),
            Err(UpgradeViolation::PoolInvariant)
        );
    }
}
