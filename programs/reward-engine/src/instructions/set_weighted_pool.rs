use anchor_lang::prelude::*;

use crate::errors::EngineError;
use crate::state::*;

#[derive(Accounts)]
pub struct SetWeightedPool<'info> {
    #[account(
        seeds = [b"engine_state"],
        bump = engine_state.bump,
        constraint = engine_state.admin == admin.key() @ EngineError::NotAdmin
    )]
    pub engine_state: Account<'info, EngineState>,

    #[account(
        mut,
        seeds = [b"weighted_pool"],
        bump = weighted_pool.bump
    )]
    pub weighted_pool: Account<'info, WeightedPool>,

    #[account(
        seeds = [b"kind_table"],
        bump = kind_table.bump
    )]
    pub kind_table: Account<'info, KindTable>,

    pub admin: Signer<'info>,
}

/// Replace the weighted pool wholesale
///
/// A pool that could strand a sacrifice (zero total weight, no fallback)
/// is refused here, at admin time; the request path never has to handle
/// it. Duplicate kind ids are allowed: stacking entries is the intended
/// way to raise a kind's probability mass.
pub fn handler(
    ctx: Context<SetWeightedPool>,
    entries: Vec<PoolEntry>,
    fallback_kind: Option<u16>,
) -> Result<()> {
    let kind_table = &ctx.accounts.kind_table;

    for entry in entries.iter() {
        let kind = kind_table
            .kind(entry.kind_id)
            .ok_or(EngineError::KindNotFound)?;
        require!(
            matches!(kind.role, KindRole::Mintable | KindRole::Fallback),
            EngineError::PoolMisconfigured
        );
    }

    if let Some(fallback) = fallback_kind {
        let kind = kind_table.kind(fallback).ok_or(EngineError::KindNotFound)?;
        require!(
            matches!(kind.role, KindRole::Fallback | KindRole::Mintable),
            EngineError::PoolMisconfigured
        );
    }

    let total_weight = WeightedPool::total_of(&entries);
    require!(
        total_weight > 0 || fallback_kind.is_some(),
        EngineError::PoolMisconfigured
    );

    let pool = &mut ctx.accounts.weighted_pool;
    let count = entries.len() as u32;
    pool.entries = entries;
    pool.total_weight = total_weight;
    pool.fallback_kind = fallback_kind.unwrap_or_default();
    pool.has_fallback = fallback_kind.is_some();
    pool.version = pool.version.saturating_add(1);

    emit!(PoolReplaced {
        entries: count,
        total_weight,
        fallback_kind,
        version: pool.version,
    });

    msg!(
        "Pool replaced: {} entries, total weight {}, fallback {:?} (version {})",
        count,
        total_weight,
        fallback_kind,
        pool.version
    );
    Ok(())
}

#[event]
pub struct PoolReplaced {
    pub entries: u32,
    pub total_weight: u64,
    pub fallback_kind: Option<u16>,
    pub version: u32,
}
