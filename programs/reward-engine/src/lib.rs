use anchor_lang::prelude::*;

pub mod draw;
pub mod errors;
pub mod instructions;
pub mod state;

use instructions::*;
pub use state::{
    ConversionRule,
    CooldownRecord,
    EngineState,
    KindClass,
    KindRole,
    KindTable,
    PoolEntry,
    SacrificeRecord,
    TokenKind,
    TrustEntry,
    TrustRegistry,
    WeightedPool,
};

declare_id!("DmKxFiT4iXRszprqsJnFE7F7qKnniV19Eu4PF3ugWskS");

/// Trust registry role resolved before every privileged credit/debit
pub const ROLE_ENGINE: &str = "engine";
/// Role for the catalog collaborator's own privileged surface
pub const ROLE_CATALOG: &str = "catalog";

#[program]
pub mod reward_engine {
    use super::*;

    /// Initialize engine state, trust registry and configuration tables
    pub fn initialize(
        ctx: Context<Initialize>,
        min_spacing: u64,
        catalog_authority: Pubkey,
    ) -> Result<()> {
        instructions::initialize::handler(ctx, min_spacing, catalog_authority)
    }

    /// Rotate a role to a new authority (admin only)
    pub fn set_authority(ctx: Context<SetAuthority>, role: String, authority: Pubkey) -> Result<()> {
        instructions::set_authority::handler(ctx, role, authority)
    }

    /// Replace the token kind table wholesale (admin only)
    pub fn set_token_kinds<'info>(
        ctx: Context<'_, '_, 'info, 'info, SetTokenKinds<'info>>,
        kinds: Vec<TokenKind>,
    ) -> Result<()> {
        instructions::set_token_kinds::handler(ctx, kinds)
    }

    /// Replace the weighted reward pool wholesale (admin only)
    pub fn set_weighted_pool(
        ctx: Context<SetWeightedPool>,
        entries: Vec<PoolEntry>,
        fallback_kind: Option<u16>,
    ) -> Result<()> {
        instructions::set_weighted_pool::handler(ctx, entries, fallback_kind)
    }

    /// Replace the conversion rule table wholesale (admin only)
    pub fn set_conversion_rules(
        ctx: Context<SetConversionRules>,
        rules: Vec<ConversionRule>,
    ) -> Result<()> {
        instructions::set_conversion_rules::handler(ctx, rules)
    }

    /// Set the per-account cooldown spacing; 0 disables it (admin only)
    pub fn set_min_spacing(ctx: Context<SetMinSpacing>, min_spacing: u64) -> Result<()> {
        instructions::set_min_spacing::handler(ctx, min_spacing)
    }

    /// Burn input tokens and resolve a weighted-random reward
    pub fn sacrifice<'info>(
        ctx: Context<'_, '_, 'info, 'info, Sacrifice<'info>>,
        input_kind: u16,
        input_amount: u64,
        seed_material: [u8; 32],
    ) -> Result<()> {
        instructions::sacrifice::handler(ctx, input_kind, input_amount, seed_material)
    }

    /// Exact-ratio conversion between two kinds, no randomness
    pub fn convert(ctx: Context<Convert>, from_kind: u16, amount: u64) -> Result<()> {
        instructions::convert::handler(ctx, from_kind, amount)
    }

    /// Simulate a draw without consuming the nonce (diagnostics)
    pub fn preview_draw(ctx: Context<PreviewDraw>, seed_material: [u8; 32]) -> Result<u16> {
        instructions::preview_draw::handler(ctx, seed_material)
    }

    /// Heights remaining before an account may act again
    pub fn get_cooldown_remaining(ctx: Context<GetCooldownRemaining>) -> Result<u64> {
        instructions::get_cooldown_remaining::handler(ctx)
    }

    /// Stage a new implementation behind the stable identifier (admin only)
    pub fn propose_upgrade(ctx: Context<ProposeUpgrade>, new_impl: Pubkey) -> Result<()> {
        instructions::upgrade::propose_handler(ctx, new_impl)
    }

    /// Activate the pending implementation after the invariant check
    /// passes; rejected upgrades leave the previous implementation active
    pub fn activate_upgrade(ctx: Context<ActivateUpgrade>) -> Result<()> {
        instructions::upgrade::activate_handler(ctx)
    }
}
