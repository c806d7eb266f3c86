//! Use-case services.
//!
//! One service per entity family, each owning the repository handles it
//! needs. Every mutating method takes the typed [`Caller`] so audit stamps
//! and policy checks never reach into transport state.
//!
//! [`Caller`]: gatehouse_auth::Caller

pub mod organizations;
pub mod permissions;
pub mod roles;
pub mod users;

pub use organizations::OrganizationService;
pub use permissions::PermissionService;
pub use roles::RoleService;
pub use users::{LoginRequest, UpdateUser, UserService};
