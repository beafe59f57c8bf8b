use anchor_lang::prelude::*;

#[error_code]
pub enum CatalogError {
    #[msg("Caller is not the catalog admin")]
    NotAdmin,

    #[msg("Caller is not the authorized minter for this catalog")]
    UnauthorizedMinter,

    #[msg("Item is not active")]
    ItemInactive,

    #[msg("Minting would exceed the item's supply cap")]
    SupplyCapExceeded,

    #[msg("Mint account does not match the registered item mint")]
    MintMismatch,

    #[msg("Mint authority is not the catalog authority PDA")]
    InvalidMintAuthority,

    #[msg("Arithmetic overflow")]
    ArithmeticOverflow,
}
