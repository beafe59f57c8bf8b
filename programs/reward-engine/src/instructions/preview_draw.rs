use anchor_lang::prelude::*;

use crate::draw;
use crate::errors::EngineError;
use crate::state::*;

#[derive(Accounts)]
pub struct PreviewDraw<'info> {
    #[account(
        seeds = [b"engine_state"],
        bump = engine_state.bump
    )]
    pub engine_state: Account<'info, EngineState>,

    #[account(
        seeds = [b"weighted_pool"],
        bump = weighted_pool.bump
    )]
    pub weighted_pool: Account<'info, WeightedPool>,

    pub caller: Signer<'info>,
}

/// Diagnostics: simulate a draw against the current pool and nonce
/// without mutating anything. The nonce is NOT consumed, so the answer is
/// only predictive while no sacrifice lands in between.
pub fn handler(ctx: Context<PreviewDraw>, seed_material: [u8; 32]) -> Result<u16> {
    let nonce = ctx.accounts.engine_state.draw_nonce;
    let outcome = draw::resolve(
        &ctx.accounts.weighted_pool,
        &seed_material,
        &ctx.accounts.caller.key(),
        nonce,
    )
    .ok_or(EngineError::PoolMisconfigured)?;

    msg!(
        "Preview draw (nonce {}): kind {} ({})",
        nonce,
        outcome.kind_id,
        if outcome.entry_index.is_some() {
            "pool entry"
        } else {
            "fallback"
        }
    );
    Ok(outcome.kind_id)
}
