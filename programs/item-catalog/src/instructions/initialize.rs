use anchor_lang::prelude::*;

use crate::state::*;

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(
        init,
        payer = admin,
        space = 8 + CatalogState::INIT_SPACE,
        seeds = [b"catalog_state"],
        bump
    )]
    pub catalog_state: Account<'info, CatalogState>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Initialize the catalog (call once)
///
/// `authorized_minter` should be the engine authority PDA of the reward
/// engine. It can be rotated later with `set_authorized_minter` when the
/// engine's trust registry rotates.
pub fn handler(ctx: Context<Initialize>, authorized_minter: Pubkey) -> Result<()> {
    let state = &mut ctx.accounts.catalog_state;
    state.admin = ctx.accounts.admin.key();
    state.authorized_minter = authorized_minter;
    state.minter_version = 1;
    state.items_registered = 0;
    state.total_items_minted = 0;
    state.bump = ctx.bumps.catalog_state;

    msg!("Catalog initialized, authorized minter: {}", authorized_minter);
    Ok(())
}
