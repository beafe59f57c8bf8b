use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::token::Mint;

use crate::errors::CatalogError;
use crate::state::*;

#[derive(Accounts)]
#[instruction(item_kind: u16)]
pub struct RegisterItem<'info> {
    #[account(
        mut,
        seeds = [b"catalog_state"],
        bump = catalog_state.bump,
        constraint = catalog_state.admin == admin.key() @ CatalogError::NotAdmin
    )]
    pub catalog_state: Account<'info, CatalogState>,

    #[account(
        init,
        payer = admin,
        space = 8 + CatalogItem::INIT_SPACE,
        seeds = [b"catalog_item", item_kind.to_le_bytes().as_ref()],
        bump
    )]
    pub item: Account<'info, CatalogItem>,

    /// SPL mint backing this item
    pub item_mint: Account<'info, Mint>,

    /// CHECK: catalog authority PDA, must be the mint authority of `item_mint`
    #[account(seeds = [b"catalog_authority"], bump)]
    pub catalog_authority: UncheckedAccount<'info>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Register a new mintable item under `item_kind`
///
/// Kind ids are permanent: the PDA seed prevents re-registration, so an id
/// can never be reassigned to a different mint.
pub fn handler(ctx: Context<RegisterItem>, item_kind: u16, supply_cap: u64) -> Result<()> {
    // Refuse mints the catalog cannot actually sign for. Catching this at
    // registration keeps the failure out of the request path.
    require!(
        ctx.accounts.item_mint.mint_authority
            == COption::Some(ctx.accounts.catalog_authority.key()),
        CatalogError::InvalidMintAuthority
    );

    let item = &mut ctx.accounts.item;
    item.item_kind = item_kind;
    item.mint = ctx.accounts.item_mint.key();
    item.active = true;
    item.supply_cap = supply_cap;
    item.minted = 0;
    item.bump = ctx.bumps.item;

    let state = &mut ctx.accounts.catalog_state;
    state.items_registered = state
        .items_registered
        .checked_add(1)
        .ok_or(CatalogError::ArithmeticOverflow)?;

    emit!(ItemRegistered {
        item_kind,
        mint: item.mint,
        supply_cap,
    });

    msg!(
        "Registered item kind {} (mint {}, cap {})",
        item_kind,
        item.mint,
        supply_cap
    );
    Ok(())
}

#[event]
pub struct ItemRegistered {
    pub item_kind: u16,
    pub mint: Pubkey,
    pub supply_cap: u64,
}
