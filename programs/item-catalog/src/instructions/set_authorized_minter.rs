use anchor_lang::prelude::*;

use crate::errors::CatalogError;
use crate::state::*;

#[derive(Accounts)]
pub struct SetAuthorizedMinter<'info> {
    #[account(
        mut,
        seeds = [b"catalog_state"],
        bump = catalog_state.bump,
        constraint = catalog_state.admin == admin.key() @ CatalogError::NotAdmin
    )]
    pub catalog_state: Account<'info, CatalogState>,

    pub admin: Signer<'info>,
}

/// Rotate the authorized minter
///
/// Run whenever the engine's trust registry rotates its "engine" role, so
/// the catalog and the registry agree on who may mint. The version bump
/// makes a stale minter detectable off-chain.
pub fn handler(ctx: Context<SetAuthorizedMinter>, new_minter: Pubkey) -> Result<()> {
    let state = &mut ctx.accounts.catalog_state;
    let previous = state.authorized_minter;
    state.authorized_minter = new_minter;
    state.minter_version = state
        .minter_version
        .checked_add(1)
        .ok_or(CatalogError::ArithmeticOverflow)?;

    emit!(MinterRotated {
        previous,
        current: new_minter,
        minter_version: state.minter_version,
    });

    msg!(
        "Authorized minter rotated: {} -> {} (version {})",
        previous,
        new_minter,
        state.minter_version
    );
    Ok(())
}

#[event]
pub struct MinterRotated {
    pub previous: Pubkey,
    pub current: Pubkey,
    pub minter_version: u32,
}
