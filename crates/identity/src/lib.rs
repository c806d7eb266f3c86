//! `gatehouse-identity` — the identity domain layer.
//!
//! Entity models, the persistence contracts they are stored through, the
//! organization hierarchy engine, the authorization resolver and the
//! use-case services. Everything here is storage-agnostic; `gatehouse-store`
//! provides the Postgres implementation of the repository traits.

pub mod access;
pub mod gradient;
pub mod hierarchy;
pub mod model;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use access::AccessResolver;
pub use repository::{
    OrganizationRepository, PermissionRepository, RoleRepository, UserRepository,
};
pub use service::{OrganizationService, PermissionService, RoleService, UserService};
