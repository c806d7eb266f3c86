//! Postgres implementations of the identity repository contracts.

pub mod organizations;
pub mod permissions;
pub mod roles;
pub mod users;

pub use organizations::PgOrganizationRepository;
pub use permissions::PgPermissionRepository;
pub use roles::PgRoleRepository;
pub use users::PgUserRepository;
