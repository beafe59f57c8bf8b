pub mod convert;
pub mod get_cooldown_remaining;
pub mod initialize;
pub mod preview_draw;
pub mod sacrifice;
pub mod set_authority;
pub mod set_conversion_rules;
pub mod set_min_spacing;
pub mod set_token_kinds;
pub mod set_weighted_pool;
pub mod upgrade;

pub use convert::*;
pub use get_cooldown_remaining::*;
pub use initialize::*;
pub use preview_draw::*;
pub use sacrifice::*;
pub use set_authority::*;
pub use set_conversion_rules::*;
pub use set_min_spacing::*;
pub use set_token_kinds::*;
pub use set_weighted_pool::*;
pub use upgrade::*;
