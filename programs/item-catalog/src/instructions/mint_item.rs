use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, MintTo, Token, TokenAccount};

use crate::errors::CatalogError;
use crate::state::*;

#[derive(Accounts)]
pub struct MintItem<'info> {
    #[account(
        mut,
        seeds = [b"catalog_state"],
        bump = catalog_state.bump
    )]
    pub catalog_state: Account<'info, CatalogState>,

    #[account(
        mut,
        seeds = [b"catalog_item", item.item_kind.to_le_bytes().as_ref()],
        bump = item.bump
    )]
    pub item: Account<'info, CatalogItem>,

    #[account(
        mut,
        address = item.mint @ CatalogError::MintMismatch
    )]
    pub item_mint: Account<'info, Mint>,

    #[account(
        mut,
        constraint = recipient_token_account.mint == item.mint @ CatalogError::MintMismatch
    )]
    pub recipient_token_account: Account<'info, TokenAccount>,

    /// Must be the current authorized minter. The engine calls this via CPI
    /// with its engine-authority PDA as signer, so a rotated-out engine
    /// fails here rather than minting under stale authority.
    #[account(
        constraint = caller.key() == catalog_state.authorized_minter
            @ CatalogError::UnauthorizedMinter
    )]
    pub caller: Signer<'info>,

    /// CHECK: catalog authority PDA, mint authority of every item mint
    #[account(seeds = [b"catalog_authority"], bump)]
    pub catalog_authority: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
}

/// Mint `amount` units of an item to the recipient
///
/// Admission order matters: authorization, then active flag, then supply
/// cap, and only then the mint CPI. Nothing is mutated on any failure.
pub fn handler(ctx: Context<MintItem>, amount: u64) -> Result<()> {
    let item = &ctx.accounts.item;

    require!(item.active, CatalogError::ItemInactive);
    require!(!item.cap_exceeded(amount), CatalogError::SupplyCapExceeded);

    token::mint_to(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            MintTo {
                mint: ctx.accounts.item_mint.to_account_info(),
                to: ctx.accounts.recipient_token_account.to_account_info(),
                authority: ctx.accounts.catalog_authority.to_account_info(),
            },
            &[&[b"catalog_authority", &[ctx.bumps.catalog_authority]]],
        ),
        amount,
    )?;

    let item = &mut ctx.accounts.item;
    item.minted = item
        .minted
        .checked_add(amount)
        .ok_or(CatalogError::ArithmeticOverflow)?;

    let state = &mut ctx.accounts.catalog_state;
    state.total_items_minted = state.total_items_minted.saturating_add(amount);

    emit!(ItemMinted {
        item_kind: item.item_kind,
        recipient: ctx.accounts.recipient_token_account.owner,
        amount,
        minted_total: item.minted,
    });

    msg!(
        "Minted {} of item kind {} ({} / {})",
        amount,
        item.item_kind,
        item.minted,
        item.supply_cap
    );
    Ok(())
}

#[event]
pub struct ItemMinted {
    pub item_kind: u16,
    pub recipient: Pubkey,
    pub amount: u64,
    pub minted_total: u64,
}
