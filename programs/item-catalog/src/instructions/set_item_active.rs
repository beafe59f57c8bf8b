use anchor_lang::prelude::*;

use crate::errors::CatalogError;
use crate::state::*;

#[derive(Accounts)]
#[instruction(item_kind: u16)]
pub struct SetItemActive<'info> {
    #[account(
        seeds = [b"catalog_state"],
        bump = catalog_state.bump,
        constraint = catalog_state.admin == admin.key() @ CatalogError::NotAdmin
    )]
    pub catalog_state: Account<'info, CatalogState>,

    #[account(
        mut,
        seeds = [b"catalog_item", item_kind.to_le_bytes().as_ref()],
        bump = item.bump
    )]
    pub item: Account<'info, CatalogItem>,

    pub admin: Signer<'info>,
}

pub fn handler(ctx: Context<SetItemActive>, item_kind: u16, active: bool) -> Result<()> {
    let item = &mut ctx.accounts.item;
    let previous = item.active;
    item.active = active;

    emit!(ItemActiveChanged {
        item_kind,
        previous,
        active,
    });

    msg!("Item kind {} active: {} -> {}", item_kind, previous, active);
    Ok(())
}

#[event]
pub struct ItemActiveChanged {
    pub item_kind: u16,
    pub previous: bool,
    pub active: bool,
}
