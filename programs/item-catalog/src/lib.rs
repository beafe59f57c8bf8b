use anchor_lang::prelude::*;

pub mod errors;
pub mod instructions;
pub mod state;

use instructions::*;
pub use state::{CatalogItem, CatalogState};

declare_id!("DN6SYvfn14n9vLEnKyp3dE6f2KGtFvjsypt11RxkdWbR");

#[program]
pub mod item_catalog {
    use super::*;

    /// Initialize the catalog state (call once)
    pub fn initialize(ctx: Context<Initialize>, authorized_minter: Pubkey) -> Result<()> {
        instructions::initialize::handler(ctx, authorized_minter)
    }

    /// Register a new mintable item kind
    pub fn register_item(ctx: Context<RegisterItem>, item_kind: u16, supply_cap: u64) -> Result<()> {
        instructions::register_item::handler(ctx, item_kind, supply_cap)
    }

    /// Enable or disable an item kind
    pub fn set_item_active(ctx: Context<SetItemActive>, item_kind: u16, active: bool) -> Result<()> {
        instructions::set_item_active::handler(ctx, item_kind, active)
    }

    /// Rotate the single caller allowed to mint items
    pub fn set_authorized_minter(ctx: Context<SetAuthorizedMinter>, new_minter: Pubkey) -> Result<()> {
        instructions::set_authorized_minter::handler(ctx, new_minter)
    }

    /// Mint an item to a recipient (engine-only, via CPI)
    pub fn mint_item(ctx: Context<MintItem>, amount: u64) -> Result<()> {
        instructions::mint_item::handler(ctx, amount)
    }
}
