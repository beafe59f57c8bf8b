use anchor_lang::prelude::*;

use crate::errors::EngineError;
use crate::state::*;

#[derive(Accounts)]
pub struct SetAuthority<'info> {
    #[account(
        seeds = [b"engine_state"],
        bump = engine_state.bump,
        constraint = engine_state.admin == admin.key() @ EngineError::NotAdmin
    )]
    pub engine_state: Account<'info, EngineState>,

    #[account(
        mut,
        seeds = [b"trust_registry"],
        bump = trust_registry.bump
    )]
    pub trust_registry: Account<'info, TrustRegistry>,

    pub admin: Signer<'info>,
}

/// Rotate a role to a new authority
///
/// The entry is replaced, never shadowed: from this transaction on, the
/// previous authority fails every privileged check. Dependents that cached
/// the old address can detect the rotation through the version bump.
pub fn handler(ctx: Context<SetAuthority>, role: String, authority: Pubkey) -> Result<()> {
    require!(!role.is_empty() && role.len() <= 16, EngineError::RoleNotFound);

    let registry = &mut ctx.accounts.trust_registry;
    let (previous, version) = registry.rotate(&role, authority);

    emit!(AuthorityRotated {
        role: role.clone(),
        previous: previous.unwrap_or_default(),
        current: authority,
        version,
    });

    msg!(
        "Authority rotated for role '{}': {} -> {} (version {})",
        role,
        previous.map(|p| p.to_string()).unwrap_or_else(|| "<none>".to_string()),
        authority,
        version
    );
    Ok(())
}

#[event]
pub struct AuthorityRotated {
    pub role: String,
    pub previous: Pubkey,
    pub current: Pubkey,
    pub version: u32,
}
