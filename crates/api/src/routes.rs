//! HTTP routes, one module per surface area.

pub mod external;
pub mod organizations;
pub mod permissions;
pub mod public;
pub mod roles;
pub mod system;
pub mod users;
