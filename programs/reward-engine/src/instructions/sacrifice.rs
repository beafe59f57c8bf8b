use anchor_lang::prelude::*;
use anchor_spl::token::{self, Burn, Mint, MintTo, Token, TokenAccount};
use item_catalog::program::ItemCatalog;

use crate::draw;
use crate::errors::EngineError;
use crate::state::*;
use crate::ROLE_ENGINE;

#[derive(Accounts)]
pub struct Sacrifice<'info> {
    #[account(
        mut,
        seeds = [b"engine_state"],
        bump = engine_state.bump
    )]
    pub engine_state: Account<'info, EngineState>,

    #[account(
        seeds = [b"trust_registry"],
        bump = trust_registry.bump
    )]
    pub trust_registry: Account<'info, TrustRegistry>,

    #[account(
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

    /// Per-account cooldown tracker, created on the first sacrifice.
    /// Held mutably for the whole transaction, so two concurrent requests
    /// for one account cannot both pass the check before either records.
    #[account(
        init_if_needed,
        payer = user,
        space = 8 + CooldownRecord::INIT_SPACE,
        seeds = [b"cooldown", user.key().as_ref()],
        bump
    )]
    pub cooldown: Account<'info, CooldownRecord>,

    /// Append-only audit record, keyed by the engine-wide draw nonce
    #[account(
        init,
        payer = user,
        space = 8 + SacrificeRecord::INIT_SPACE,
        seeds = [b"sacrifice_record", engine_state.draw_nonce.to_le_bytes().as_ref()],
        bump
    )]
    pub sacrifice_record: Account<'info, SacrificeRecord>,

    /// Mint of the input kind being sacrificed
    #[account(mut)]
    pub input_mint: Account<'info, Mint>,

    #[account(
        mut,
        constraint = user_input_account.owner == user.key() @ EngineError::InvalidOwner,
        constraint = user_input_account.mint == input_mint.key() @ EngineError::InputMintMismatch
    )]
    pub user_input_account: Account<'info, TokenAccount>,

    /// CHECK: engine authority PDA, signs the credit CPIs. Its key must
    /// match the trust registry's current "engine" entry.
    #[account(seeds = [b"engine_authority"], bump)]
    pub engine_authority: UncheckedAccount<'info>,

    #[account(mut)]
    pub user: Signer<'info>,

    /// CHECK: catalog state, validated by the catalog program during CPI
    #[account(mut)]
    pub catalog_state: UncheckedAccount<'info>,

    /// CHECK: catalog authority PDA, validated by the catalog program
    pub catalog_authority: UncheckedAccount<'info>,

    pub catalog_program: Program<'info, ItemCatalog>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

/// Sacrifice input tokens for a weighted-random reward
///
/// Flow:
/// 1. Validate input kind and amount (conversion-ratio multiple included)
/// 2. Rate-limiter admission
/// 3. Trust registry check for the "engine" role
/// 4. Balance pre-check, then debit (burn) the input
/// 5. Weighted draw with the engine-wide nonce
/// 6. Credit the outcome (token mint, or catalog CPI for item kinds)
/// 7. Write the sacrifice record and emit the event
///
/// Every admission check runs before the debit: the historical failure was
/// burning input and then dying inside minting, wasting the input. After
/// the debit, the fallback rule guarantees an outcome, and transaction
/// atomicity guarantees debit and credit land together or not at all.
///
/// remaining_accounts carry the candidate outcome accounts in pool-entry
/// order, fallback last:
///   Fungible kind:    [mint, user_token_account]
///   CatalogItem kind: [catalog_item, item_mint, user_token_account]
pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Sacrifice<'info>>,
    input_kind: u16,
    input_amount: u64,
    seed_material: [u8; 32],
) -> Result<()> {
    let height = Clock::get()?.slot;
    let user_key = ctx.accounts.user.key();

    msg!("╔═══════════════════════════════════════╗");
    msg!("║        Sacrifice Resolution           ║");
    msg!("╚═══════════════════════════════════════╝");
    msg!("Account: {}", user_key);
    msg!("Input: kind {} x {}", input_kind, input_amount);

    // ===== STEP 1: Input validation (before anything else) =====
    require!(input_amount > 0, EngineError::InvalidAmount);

    let kind = ctx
        .accounts
        .kind_table
        .kind(input_kind)
        .ok_or(EngineError::KindNotFound)?;
    require!(kind.role == KindRole::Burnable, EngineError::KindNotBurnable);
    require!(
        kind.mint == ctx.accounts.input_mint.key(),
        EngineError::InputMintMismatch
    );

    if let Some(rule) = ctx.accounts.conversion_table.rule_for(input_kind) {
        require!(
            input_amount % rule.ratio as u64 == 0,
            EngineError::InvalidAmount
        );
    }

    msg!("✓ Input validated");

    // ===== STEP 2: Rate limiter =====
    let min_spacing = ctx.accounts.engine_state.min_spacing;
    if let Err(remaining) = ctx
        .accounts
        .cooldown
        .check_and_record(height, min_spacing)
    {
        msg!("Cooldown active: {} heights remaining", remaining);
        return Err(EngineError::CooldownActive.into());
    }

    msg!("✓ Cooldown clear");

    // ===== STEP 3: Trust registry =====
    // Read the current entry, never a cached one. A rotated-out engine
    // authority fails here, before any token moves.
    ctx.accounts
        .trust_registry
        .require_role(ROLE_ENGINE, &ctx.accounts.engine_authority.key())?;

    msg!("✓ Engine authority current");

    // ===== STEP 4: Debit the input =====
    require!(
        ctx.accounts.user_input_account.amount >= input_amount,
        EngineError::InsufficientBalance
    );

    token::burn(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Burn {
                mint: ctx.accounts.input_mint.to_account_info(),
                from: ctx.accounts.user_input_account.to_account_info(),
                authority: ctx.accounts.user.to_account_info(),
            },
        ),
        input_amount,
    )?;

    msg!("✓ Burned {} of kind {}", input_amount, input_kind);

    // ===== STEP 5: Weighted draw =====
    let nonce = ctx.accounts.engine_state.draw_nonce;
    let pool = &ctx.accounts.weighted_pool;

    let outcome = draw::resolve(pool, &seed_material, &user_key, nonce)
        .ok_or(EngineError::PoolMisconfigured)?;

    let outcome_kind = *ctx
        .accounts
        .kind_table
        .kind(outcome.kind_id)
        .ok_or(EngineError::KindNotFound)?;

    let outcome_amount = match (outcome.entry_index, outcome_kind.class) {
        // fallback consolation is always a single unit
        (None, _) => 1,
        (Some(_), KindClass::Fungible) => input_amount,
        (Some(_), KindClass::CatalogItem) => 1,
    };

    msg!(
        "✓ Draw resolved: kind {} x {} (nonce {})",
        outcome.kind_id,
        outcome_amount,
        nonce
    );

    // ===== STEP 6: Credit the outcome =====
    let target_slot = outcome.entry_index.unwrap_or(pool.entries.len());
    let (offset, stride) = outcome_span(&ctx.accounts.kind_table, pool, target_slot)?;
    let end = offset
        .checked_add(stride)
        .ok_or(EngineError::ArithmeticOverflow)?;
    require!(
        ctx.remaining_accounts.len() >= end,
        EngineError::MissingOutcomeAccount
    );
    let accounts = &ctx.remaining_accounts[offset..end];
    let authority_seeds: &[&[u8]] = &[b"engine_authority", &[ctx.bumps.engine_authority]];

    match outcome_kind.class {
        KindClass::Fungible => {
            let [outcome_mint, outcome_token_account] = accounts else {
                return Err(EngineError::MissingOutcomeAccount.into());
            };
            require!(
                outcome_mint.key() == outcome_kind.mint,
                EngineError::OutcomeAccountMismatch
            );
            let token_account = Account::<TokenAccount>::try_from(outcome_token_account)?;
            require!(
                token_account.owner == user_key && token_account.mint == outcome_kind.mint,
                EngineError::OutcomeAccountMismatch
            );

            token::mint_to(
                CpiContext::new_with_signer(
                    ctx.accounts.token_program.to_account_info(),
                    MintTo {
                        mint: outcome_mint.clone(),
                        to: outcome_token_account.clone(),
                        authority: ctx.accounts.engine_authority.to_account_info(),
                    },
                    &[authority_seeds],
                ),
                outcome_amount,
            )?;
        }
        KindClass::CatalogItem => {
            let [catalog_item, item_mint, outcome_token_account] = accounts else {
                return Err(EngineError::MissingOutcomeAccount.into());
            };
            require!(
                item_mint.key() == outcome_kind.mint,
                EngineError::OutcomeAccountMismatch
            );

            // The catalog re-checks authorization, active flag and supply
            // cap on its side before minting.
            item_catalog::cpi::mint_item(
                CpiContext::new_with_signer(
                    ctx.accounts.catalog_program.to_account_info(),
                    item_catalog::cpi::accounts::MintItem {
                        catalog_state: ctx.accounts.catalog_state.to_account_info(),
                        item: catalog_item.clone(),
                        item_mint: item_mint.clone(),
                        recipient_token_account: outcome_token_account.clone(),
                        caller: ctx.accounts.engine_authority.to_account_info(),
                        catalog_authority: ctx.accounts.catalog_authority.to_account_info(),
                        token_program: ctx.accounts.token_program.to_account_info(),
                    },
                    &[authority_seeds],
                ),
                outcome_amount,
            )?;
        }
    }

    msg!("✓ Credited {} of kind {}", outcome_amount, outcome.kind_id);

    // ===== STEP 7: Record, counters, event =====
    let state = &mut ctx.accounts.engine_state;
    state.draw_nonce = state
        .draw_nonce
        .checked_add(1)
        .ok_or(EngineError::ArithmeticOverflow)?;
    state.total_sacrifices = state.total_sacrifices.saturating_add(1);
    state.total_input_burned = state.total_input_burned.saturating_add(input_amount);

    let record = &mut ctx.accounts.sacrifice_record;
    record.account = user_key;
    record.input_kind = input_kind;
    record.input_amount = input_amount;
    record.outcome_kind = outcome.kind_id;
    record.outcome_amount = outcome_amount;
    record.height = height;
    record.nonce = nonce;
    record.record_hash = SacrificeRecord::compute_hash(
        &user_key,
        input_kind,
        input_amount,
        outcome.kind_id,
        outcome_amount,
        nonce,
    );
    record.bump = ctx.bumps.sacrifice_record;

    emit!(Sacrificed {
        account: user_key,
        input_kind,
        input_amount,
        outcome_kind: outcome.kind_id,
        outcome_amount,
        height,
        nonce,
    });

    msg!(
        "Sacrifice resolved (nonce {}): total sacrifices {}, total burned {}",
        nonce,
        state.total_sacrifices,
        state.total_input_burned
    );
    Ok(())
}

/// Locate `target_slot` in the remaining_accounts packing: slots follow
/// pool-entry order with the fallback last, and each slot's stride depends
/// on its kind's class (2 for fungible, 3 for catalog items). Returns the
/// slot's (offset, stride); pure over configuration, so the fencepost
/// behavior is unit-testable.
fn outcome_span(
    kind_table: &KindTable,
    pool: &WeightedPool,
    target_slot: usize,
) -> Result<(usize, usize)> {
    let mut cursor = 0usize;
    for slot in 0..=pool.entries.len() {
        let kind_id = if slot < pool.entries.len() {
            pool.entries[slot].kind_id
        } else {
            match pool.fallback() {
                Some(kind_id) => kind_id,
                None => break,
            }
        };
        let kind = kind_table.kind(kind_id).ok_or(EngineError::KindNotFound)?;
        let stride = match kind.class {
            KindClass::Fungible => 2,
            KindClass::CatalogItem => 3,
        };
        if slot == target_slot {
            return Ok((cursor, stride));
        }
        cursor = cursor
            .checked_add(stride)
            .ok_or(EngineError::ArithmeticOverflow)?;
    }
    Err(EngineError::MissingOutcomeAccount.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(id: u16, class: KindClass) -> TokenKind {
        TokenKind {
            id,
            role: KindRole::Mintable,
            class,
            mint: Pubkey::new_unique(),
        }
    }

    fn mixed_fixture() -> (KindTable, WeightedPool) {
        // slots: 0 fungible, 1 catalog, 2 fungible, fallback catalog
        let kinds = KindTable {
            kinds: vec![
                kind(1, KindClass::Fungible),
                kind(2, KindClass::CatalogItem),
                kind(3, KindClass::Fungible),
                kind(4, KindClass::CatalogItem),
            ],
            version: 1,
            bump: 255,
        };
        let entries = vec![
            PoolEntry { kind_id: 1, weight: 1 },
            PoolEntry { kind_id: 2, weight: 1 },
            PoolEntry { kind_id: 3, weight: 1 },
        ];
        let pool = WeightedPool {
            total_weight: WeightedPool::total_of(&entries),
            entries,
            fallback_kind: 4,
            has_fallback: true,
            version: 1,
            bump: 255,
        };
        (kinds, pool)
    }

    #[test]
    fn mixed_class_strides_accumulate() {
        let (kinds, pool) = mixed_fixture();
        assert_eq!(outcome_span(&kinds, &pool, 0).unwrap(), (0, 2));
        assert_eq!(outcome_span(&kinds, &pool, 1).unwrap(), (2, 3));
        assert_eq!(outcome_span(&kinds, &pool, 2).unwrap(), (5, 2));
    }

    #[test]
    fn fallback_slot_sits_after_all_entries() {
        let (kinds, pool) = mixed_fixture();
        assert_eq!(outcome_span(&kinds, &pool, 3).unwrap(), (7, 3));
    }

    #[test]
    fn fallback_slot_without_fallback_is_an_error() {
        let (kinds, mut pool) = mixed_fixture();
        pool.has_fallback = false;
        assert!(outcome_span(&kinds, &pool, 3).is_err());
    }

    #[test]
    fn slot_past_fallback_is_an_error() {
        let (kinds, pool) = mixed_fixture();
        assert!(outcome_span(&kinds, &pool, 4).is_err());
    }

    #[test]
    fn entry_over_unknown_kind_is_an_error() {
        let (mut kinds, pool) = mixed_fixture();
        kinds.kinds.retain(|k| k.id != 2);
        assert!(outcome_span(&kinds, &pool, 2).is_err());
    }
}

/// Emitted once per resolved sacrifice
#[event]
pub struct Sacrificed {
    pub account: Pubkey,
    pub input_kind: u16,
    pub input_amount: u64,
    pub outcome_kind: u16,
    pub outcome_amount: u64,
    pub height: u64,
    pub nonce: u64,
}
