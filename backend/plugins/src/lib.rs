pub mod audit;
pub mod cooldown;
pub mod permissions;

#[cfg(test)]
mod testing;

pub use audit::AuditPlugin;
pub use cooldown::{CooldownPlugin, CooldownPolicy, CooldownResult};
pub use permissions::{PermissionsPlugin, insufficient_permissions_embed};
