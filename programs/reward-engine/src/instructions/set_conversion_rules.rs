use anchor_lang::prelude::*;

use crate::errors::EngineError;
use crate::state::*;

#[derive(Accounts)]
pub struct SetConversionRules<'info> {
    #[account(
        seeds = [b"engine_state"],
        bump = engine_state.bump,
        constraint = engine_state.admin == admin.key() @ EngineError::NotAdmin
    )]
    pub engine_state: Account<'info, EngineState>,

    #[account(
        mut,
        seeds = [b"conversion_table"],
        bump = conversion_table.bump
    )]
    pub conversion_table: Account<'info, ConversionTable>,

    #[account(
        seeds = [b"kind_table"],
        bump = kind_table.bump
    )]
    pub kind_table: Account<'info, KindTable>,

    pub admin: Signer<'info>,
}

/// Replace the conversion table wholesale
///
/// At most one rule per source kind; zero ratios and rules over unknown
/// kinds are rejected before they can reach the request path.
pub fn handler(ctx: Context<SetConversionRules>, rules: Vec<ConversionRule>) -> Result<()> {
    let kind_table = &ctx.accounts.kind_table;

    for (i, rule) in rules.iter().enumerate() {
        require!(rule.ratio > 0, EngineError::InvalidRatio);
        require!(rule.from_kind != rule.to_kind, EngineError::InvalidRatio);
        require!(kind_table.contains(rule.from_kind), EngineError::KindNotFound);
        require!(kind_table.contains(rule.to_kind), EngineError::KindNotFound);
        require!(
            !rules[..i].iter().any(|other| other.from_kind == rule.from_kind),
            EngineError::DuplicateRule
        );
    }

    let table = &mut ctx.accounts.conversion_table;
    let count = rules.len() as u32;
    table.rules = rules;
    table.version = table.version.saturating_add(1);

    emit!(ConversionRulesReplaced {
        rules: count,
        version: table.version,
    });

    msg!("Conversion table replaced: {} rules (version {})", count, table.version);
    Ok(())
}

#[event]
pub struct ConversionRulesReplaced {
    pub rules: u32,
    pub version: u32,
}
