use anchor_lang::prelude::*;

#[error_code]
pub enum EngineError {
    // ----- user errors (no state mutated) -----
    #[msg("Invalid amount: zero, or not an exact multiple of the conversion ratio")]
    InvalidAmount,

    #[msg("Insufficient balance for the requested debit")]
    InsufficientBalance,

    #[msg("Cooldown active: minimum spacing since last action not yet elapsed")]
    CooldownActive,

    #[msg("Token kind not found in the kind table")]
    KindNotFound,

    #[msg("Token kind is not burnable")]
    KindNotBurnable,

    #[msg("No conversion rule registered for this kind")]
    RuleNotFound,

    #[msg("Input mint does not match the registered kind mint")]
    InputMintMismatch,

    #[msg("Token account is not owned by the acting account")]
    InvalidOwner,

    // ----- operator errors (wiring/configuration, logged distinctly) -----
    #[msg("Caller is not the engine admin")]
    NotAdmin,

    #[msg("Caller is not the current authority for this role")]
    Unauthorized,

    #[msg("Role not found in the trust registry")]
    RoleNotFound,

    #[msg("Pool misconfigured: zero total weight with no fallback kind")]
    PoolMisconfigured,

    #[msg("Duplicate token kind id")]
    DuplicateKind,

    #[msg("Token kind is still referenced by the pool or conversion table")]
    KindInUse,

    #[msg("Duplicate conversion rule for the same source kind")]
    DuplicateRule,

    #[msg("Conversion ratio must be greater than zero")]
    InvalidRatio,

    #[msg("Fungible kind must carry a mint address")]
    MissingKindMint,

    #[msg("Mint account does not match the kind being registered")]
    KindMintMismatch,

    #[msg("Mint authority is not the engine authority PDA")]
    InvalidMintAuthority,

    #[msg("No pending upgrade to activate")]
    NoPendingUpgrade,

    #[msg("Upgrade rejected: trust registry no longer resolves 'engine' to the stable identifier")]
    UpgradeRejectedTrustDrift,

    #[msg("Upgrade rejected: weighted pool invariant violated")]
    UpgradeRejectedPoolInvariant,

    #[msg("Upgrade rejected: conversion rule references a missing kind")]
    UpgradeRejectedDanglingRule,

    // ----- structural -----
    #[msg("Missing outcome account in remaining_accounts")]
    MissingOutcomeAccount,

    #[msg("Outcome account does not match the resolved kind")]
    OutcomeAccountMismatch,

    #[msg("Arithmetic overflow")]
    ArithmeticOverflow,
}
