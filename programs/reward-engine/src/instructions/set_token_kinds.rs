use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::token::Mint;

use crate::errors::EngineError;
use crate::state::*;

#[derive(Accounts)]
pub struct SetTokenKinds<'info> {
    #[account(
        seeds = [b"engine_state"],
        bump = engine_state.bump,
        constraint = engine_state.admin == admin.key() @ EngineError::NotAdmin
    )]
    pub engine_state: Account<'info, EngineState>,

    #[account(
        mut,
        seeds = [b"kind_table"],
        bump = kind_table.bump
    )]
    pub kind_table: Account<'info, KindTable>,

    #[account(
        seeds = [b"weighted_pool"],
        bump = weighted_pool.bump
    )]
    pub weighted_pool: Account<'info, WeightedPool>,

    #[account(
        seeds = [b"conversion_table"],
        bump = conversion_table.bump
    )]
    pub conversion_table: Account<'info, ConversionTable>,

    /// CHECK: engine authority PDA; must be the mint authority of every
    /// creditable fungible kind being registered
    #[account(seeds = [b"engine_authority"], bump)]
    pub engine_authority: UncheckedAccount<'info>,

    pub admin: Signer<'info>,
}

/// Replace the kind table wholesale
///
/// Ids referenced by the active pool (entries or fallback) or by a
/// conversion rule must survive the replacement, so a kind can never
/// vanish out from under live configuration.
///
/// remaining_accounts carry the mint of every creditable fungible kind
/// (role Mintable, Fallback or Conversion), in table order. Each mint's
/// authority must be the engine authority PDA: a mint the engine cannot
/// sign for is refused here, at admin time, instead of failing the
/// `mint_to` after a user's input is already burned.
pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, SetTokenKinds<'info>>,
    kinds: Vec<TokenKind>,
) -> Result<()> {
    for (i, kind) in kinds.iter().enumerate() {
        require!(
            !kinds[..i].iter().any(|other| other.id == kind.id),
            EngineError::DuplicateKind
        );
        require!(kind.mint != Pubkey::default(), EngineError::MissingKindMint);
    }

    let engine_authority = ctx.accounts.engine_authority.key();
    let mut mint_accounts = ctx.remaining_accounts.iter();
    for kind in kinds.iter().filter(|k| needs_engine_authority(k)) {
        let info = mint_accounts
            .next()
            .ok_or(EngineError::MissingKindMint)?;
        require!(info.key() == kind.mint, EngineError::KindMintMismatch);

        let mint = Account::<Mint>::try_from(info)?;
        require!(
            mint.mint_authority == COption::Some(engine_authority),
            EngineError::InvalidMintAuthority
        );
    }

    let exists = |id: u16| kinds.iter().any(|k| k.id == id);

    let pool = &ctx.accounts.weighted_pool;
    for entry in pool.entries.iter() {
        require!(exists(entry.kind_id), EngineError::KindInUse);
    }
    if let Some(fallback) = pool.fallback() {
        require!(exists(fallback), EngineError::KindInUse);
    }
    for rule in ctx.accounts.conversion_table.rules.iter() {
        require!(exists(rule.from_kind), EngineError::KindInUse);
        require!(exists(rule.to_kind), EngineError::KindInUse);
    }

    let table = &mut ctx.accounts.kind_table;
    let count = kinds.len() as u32;
    table.kinds = kinds;
    table.version = table.version.saturating_add(1);

    emit!(KindTableReplaced {
        kinds: count,
        version: table.version,
    });

    msg!("Kind table replaced: {} kinds (version {})", count, table.version);
    Ok(())
}

/// Which kinds the engine must be able to sign mints for. Burnable input
/// kinds are only ever debited, and catalog items are minted under the
/// catalog's own authority.
fn needs_engine_authority(kind: &TokenKind) -> bool {
    kind.class == KindClass::Fungible
        && matches!(
            kind.role,
            KindRole::Mintable | KindRole::Fallback | KindRole::Conversion
        )
}

#[event]
pub struct KindTableReplaced {
    pub kinds: u32,
    pub version: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(role: KindRole, class: KindClass) -> TokenKind {
        TokenKind {
            id: 1,
            role,
            class,
            mint: Pubkey::new_unique(),
        }
    }

    #[test]
    fn creditable_fungible_kinds_need_engine_authority() {
        assert!(needs_engine_authority(&kind(KindRole::Mintable, KindClass::Fungible)));
        assert!(needs_engine_authority(&kind(KindRole::Fallback, KindClass::Fungible)));
        assert!(needs_engine_authority(&kind(KindRole::Conversion, KindClass::Fungible)));
    }

    #[test]
    fn burnable_inputs_are_exempt() {
        // the engine never mints input kinds, it only burns them with the
        // holder's own signature
        assert!(!needs_engine_authority(&kind(KindRole::Burnable, KindClass::Fungible)));
    }

    #[test]
    fn catalog_items_are_exempt() {
        // minted under the catalog authority PDA, validated at
        // register_item time on the catalog side
        assert!(!needs_engine_authority(&kind(KindRole::Mintable, KindClass::CatalogItem)));
        assert!(!needs_engine_authority(&kind(KindRole::Fallback, KindClass::CatalogItem)));
    }
}
