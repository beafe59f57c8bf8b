use anchor_lang::prelude::*;

use crate::state::*;
use crate::{ROLE_CATALOG, ROLE_ENGINE};

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(
        init,
        payer = admin,
        space = 8 + EngineState::INIT_SPACE,
        seeds = [b"engine_state"],
        bump
    )]
    pub engine_state: Account<'info, EngineState>,

    #[account(
        init,
        payer = admin,
        space = 8 + TrustRegistry::INIT_SPACE,
        seeds = [b"trust_registry"],
        bump
    )]
    pub trust_registry: Account<'info, TrustRegistry>,

    #[account(
        init,
        payer = admin,
        space = 8 + KindTable::INIT_SPACE,
        seeds = [b"kind_table"],
        bump
    )]
    pub kind_table: Account<'info, KindTable>,

    #[account(
        init,
        payer = admin,
        space = 8 + WeightedPool::INIT_SPACE,
        seeds = [b"weighted_pool"],
        bump
    )]
    pub weighted_pool: Account<'info, WeightedPool>,

    #[account(
        init,
        payer = admin,
        space = 8 + ConversionTable::INIT_SPACE,
        seeds = [b"conversion_table"],
        bump
    )]
    pub conversion_table: Account<'info, ConversionTable>,

    /// CHECK: engine authority PDA. Never initialized; it only signs
    /// outbound CPIs. Its address is the engine's stable identifier.
    #[account(seeds = [b"engine_authority"], bump)]
    pub engine_authority: UncheckedAccount<'info>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Initialize the engine (call once)
///
/// Seeds the trust registry with the "engine" role pointing at the
/// engine-authority PDA, which is also recorded as the stable identifier
/// the upgrade coordinator re-validates against, and the "catalog" role
/// pointing at the catalog collaborator's authority.
pub fn handler(
    ctx: Context<Initialize>,
    min_spacing: u64,
    catalog_authority: Pubkey,
) -> Result<()> {
    let stable_id = ctx.accounts.engine_authority.key();

    let state = &mut ctx.accounts.engine_state;
    state.admin = ctx.accounts.admin.key();
    state.stable_id = stable_id;
    state.active_impl = crate::ID;
    state.impl_version = 1;
    state.pending_impl = Pubkey::default();
    state.has_pending = false;
    state.min_spacing = min_spacing;
    state.draw_nonce = 0;
    state.total_sacrifices = 0;
    state.total_input_burned = 0;
    state.bump = ctx.bumps.engine_state;

    let registry = &mut ctx.accounts.trust_registry;
    registry.bump = ctx.bumps.trust_registry;
    registry.rotate(ROLE_ENGINE, stable_id);
    registry.rotate(ROLE_CATALOG, catalog_authority);

    let kinds = &mut ctx.accounts.kind_table;
    kinds.kinds = Vec::new();
    kinds.version = 0;
    kinds.bump = ctx.bumps.kind_table;

    let pool = &mut ctx.accounts.weighted_pool;
    pool.entries = Vec::new();
    pool.total_weight = 0;
    pool.fallback_kind = 0;
    pool.has_fallback = false;
    pool.version = 0;
    pool.bump = ctx.bumps.weighted_pool;

    let table = &mut ctx.accounts.conversion_table;
    table.rules = Vec::new();
    table.version = 0;
    table.bump = ctx.bumps.conversion_table;

    msg!("Engine initialized");
    msg!("Stable identifier (engine authority): {}", stable_id);
    msg!("Catalog authority: {}", catalog_authority);
    msg!("Active implementation: {}", state.active_impl);
    msg!("Min spacing: {} heights", min_spacing);
    Ok(())
}
