use anchor_lang::prelude::*;
use anchor_spl::token::{self, Burn, Mint, MintTo, Token, TokenAccount};

use crate::errors::EngineError;
use crate::state::*;
use crate::ROLE_ENGINE;

#[derive(Accounts)]
pub struct Convert<'info> {
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
        seeds = [b"conversion_table"],
        bump = conversion_table.bump
    )]
    pub conversion_table: Account<'info, ConversionTable>,

    #[account(mut)]
    pub from_mint: Account<'info, Mint>,

    #[account(
        mut,
        constraint = user_from_account.owner == user.key() @ EngineError::InvalidOwner,
        constraint = user_from_account.mint == from_mint.key() @ EngineError::InputMintMismatch
    )]
    pub user_from_account: Account<'info, TokenAccount>,

    #[account(mut)]
    pub to_mint: Account<'info, Mint>,

    #[account(
        mut,
        constraint = user_to_account.owner == user.key() @ EngineError::InvalidOwner,
        constraint = user_to_account.mint == to_mint.key() @ EngineError::OutcomeAccountMismatch
    )]
    pub user_to_account: Account<'info, TokenAccount>,

    /// CHECK: engine authority PDA, signs the credit CPI
    #[account(seeds = [b"engine_authority"], bump)]
    pub engine_authority: UncheckedAccount<'info>,

    #[account(mut)]
    pub user: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

/// Deterministic ratio conversion: burn `amount` of the source kind, mint
/// exactly `amount / ratio` of the target kind. No randomness, no
/// cooldown, no rounding: non-multiples fail before any token moves.
pub fn handler(ctx: Context<Convert>, from_kind: u16, amount: u64) -> Result<()> {
    let rule = *ctx
        .accounts
        .conversion_table
        .rule_for(from_kind)
        .ok_or(EngineError::RuleNotFound)?;

    let to_amount = rule.apply(amount).map_err(|_| EngineError::InvalidAmount)?;

    let from = ctx
        .accounts
        .kind_table
        .kind(rule.from_kind)
        .ok_or(EngineError::KindNotFound)?;
    let to = ctx
        .accounts
        .kind_table
        .kind(rule.to_kind)
        .ok_or(EngineError::KindNotFound)?;
    require!(
        from.mint == ctx.accounts.from_mint.key(),
        EngineError::InputMintMismatch
    );
    require!(
        to.mint == ctx.accounts.to_mint.key(),
        EngineError::OutcomeAccountMismatch
    );

    ctx.accounts
        .trust_registry
        .require_role(ROLE_ENGINE, &ctx.accounts.engine_authority.key())?;

    require!(
        ctx.accounts.user_from_account.amount >= amount,
        EngineError::InsufficientBalance
    );

    // Same ordering as sacrifice: debit first, then credit, both inside
    // one atomic transaction.
    token::burn(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Burn {
                mint: ctx.accounts.from_mint.to_account_info(),
                from: ctx.accounts.user_from_account.to_account_info(),
                authority: ctx.accounts.user.to_account_info(),
            },
        ),
        amount,
    )?;

    token::mint_to(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            MintTo {
                mint: ctx.accounts.to_mint.to_account_info(),
                to: ctx.accounts.user_to_account.to_account_info(),
                authority: ctx.accounts.engine_authority.to_account_info(),
            },
            &[&[b"engine_authority", &[ctx.bumps.engine_authority]]],
        ),
        to_amount,
    )?;

    emit!(Converted {
        account: ctx.accounts.user.key(),
        from_kind: rule.from_kind,
        to_kind: rule.to_kind,
        amount,
        to_amount,
    });

    msg!(
        "Converted {} of kind {} into {} of kind {} (ratio {})",
        amount,
        rule.from_kind,
        to_amount,
        rule.to_kind,
        rule.ratio
    );
    Ok(())
}

#[event]
pub struct Converted {
    pub account: Pubkey,
    pub from_kind: u16,
    pub to_kind: u16,
    pub amount: u64,
    pub to_amount: u64,
}
