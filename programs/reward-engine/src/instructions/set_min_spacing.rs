use anchor_lang::prelude::*;

use crate::errors::EngineError;
use crate::state::*;

#[derive(Accounts)]
pub struct SetMinSpacing<'info> {
    #[account(
        mut,
        seeds = [b"engine_state"],
        bump = engine_state.bump,
        constraint = engine_state.admin == admin.key() @ EngineError::NotAdmin
    )]
    pub engine_state: Account<'info, EngineState>,

    pub admin: Signer<'info>,
}

/// Set the per-account minimum action spacing
///
/// Zero disables the guard through the ordinary admission path; there is
/// no special-cased branch to drift out of sync.
pub fn handler(ctx: Context<SetMinSpacing>, min_spacing: u64) -> Result<()> {
    let state = &mut ctx.accounts.engine_state;
    let previous = state.min_spacing;
    state.min_spacing = min_spacing;

    emit!(MinSpacingUpdated {
        previous,
        current: min_spacing,
    });

    msg!("Min spacing: {} -> {} heights", previous, min_spacing);
    Ok(())
}

#[event]
pub struct MinSpacingUpdated {
    pub previous: u64,
    pub current: u64,
}
