use anchor_lang::prelude::*;

/// Catalog program state
#[account]
#[derive(InitSpace)]
pub struct CatalogState {
    /// Authority that can register items and rotate the minter
    pub admin: Pubkey,
    /// The only caller allowed to mint catalog items (the engine authority PDA)
    pub authorized_minter: Pubkey,
    /// Bumped on every minter rotation so stale minters are detectable
    pub minter_version: u32,
    pub items_registered: u32,
    pub total_items_minted: u64,
    pub bump: u8,
}

/// One mintable catalog item definition
///
/// Seeds: ["catalog_item", item_kind]
/// The wrapped SPL mint's authority must be the catalog authority PDA,
/// otherwise minting would silently fail after registration.
#[account]
#[derive(InitSpace)]
pub struct CatalogItem {
    /// Kind id, matches the engine's kind table entry for this item
    pub item_kind: u16,
    /// SPL mint backing this item
    pub mint: Pubkey,
    /// Inactive items are never mintable, regardless of supply
    pub active: bool,
    /// Maximum units ever mintable; 0 means uncapped
    pub supply_cap: u64,
    /// Units minted so far (audit trail)
    pub minted: u64,
    pub bump: u8,
}

impl CatalogItem {
    /// Whether minting `amount` more units would exceed the supply cap.
    pub fn cap_exceeded(&self, amount: u64) -> bool {
        if self.supply_cap == 0 {
            return false;
        }
        match self.minted.checked_add(amount) {
            Some(next) => next > self.supply_cap,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(minted: u64, supply_cap: u64) -> CatalogItem {
        CatalogItem {
            item_kind: 7,
            mint: Pubkey::new_unique(),
            active: true,
            supply_cap,
            minted,
            bump: 255,
        }
    }

    #[test]
    fn uncapped_item_never_exceeds() {
        assert!(!item(u64::MAX - 1, 0).cap_exceeded(1));
    }

    #[test]
    fn cap_boundary_is_inclusive() {
        assert!(!item(9, 10).cap_exceeded(1));
        assert!(item(10, 10).cap_exceeded(1));
    }

    #[test]
    fn counter_overflow_counts_as_exceeded() {
        assert!(item(u64::MAX, 10).cap_exceeded(1));
    }
}
