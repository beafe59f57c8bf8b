pub mod initialize;
pub mod mint_item;
pub mod register_item;
pub mod set_authorized_minter;
pub mod set_item_active;

pub use initialize::*;
pub use mint_item::*;
pub use register_item::*;
pub use set_authorized_minter::*;
pub use set_item_active::*;
