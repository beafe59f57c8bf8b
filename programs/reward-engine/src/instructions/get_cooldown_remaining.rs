use anchor_lang::prelude::*;

use crate::state::*;

#[derive(Accounts)]
pub struct GetCooldownRemaining<'info> {
    #[account(
        seeds = [b"engine_state"],
        bump = engine_state.bump
    )]
    pub engine_state: Account<'info, EngineState>,

    /// Absent until the account's first sacrifice; an account with no
    /// cooldown record has no remaining spacing by definition
    #[account(
        seeds = [b"cooldown", account.key().as_ref()],
        bump = cooldown.bump
    )]
    pub cooldown: Option<Account<'info, CooldownRecord>>,

    /// CHECK: only used to derive the cooldown PDA
    pub account: UncheckedAccount<'info>,
}

/// Heights remaining until `account` may act again (0 = clear now)
pub fn handler(ctx: Context<GetCooldownRemaining>) -> Result<u64> {
    let height = Clock::get()?.slot;
    let remaining = remaining_spacing(
        ctx.accounts.cooldown.as_deref(),
        height,
        ctx.accounts.engine_state.min_spacing,
    );

    msg!(
        "Cooldown for {}: {} heights remaining at height {}",
        ctx.accounts.account.key(),
        remaining,
        height
    );
    Ok(remaining)
}

/// First-ever action is always permitted, so a missing record reads as 0.
fn remaining_spacing(record: Option<&CooldownRecord>, height: u64, min_spacing: u64) -> u64 {
    match record {
        Some(record) => record.remaining(height, min_spacing),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_record_reads_as_clear() {
        assert_eq!(remaining_spacing(None, 0, 1_000), 0);
        assert_eq!(remaining_spacing(None, 500, u64::MAX), 0);
    }

    #[test]
    fn existing_record_reports_its_remaining() {
        let record = CooldownRecord {
            last_action_height: 100,
            actions: 1,
            bump: 255,
        };
        assert_eq!(remaining_spacing(Some(&record), 104, 10), 6);
        assert_eq!(remaining_spacing(Some(&record), 110, 10), 0);
    }
}
