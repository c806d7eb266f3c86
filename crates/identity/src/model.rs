//! Identity domain entities.

pub mod membership;
pub mod organization;
pub mod permission;
pub mod role;
pub mod user;

pub use membership::{CreateRolePermission, CreateUserRole, RolePermission, UserRole};
pub use organization::{
    CreateOrganization, Organization, OrganizationNode, OrganizationPatch,
};
pub use permission::{CreatePermission, Permission, PermissionPatch};
pub use role::{CreateRole, Role, RolePatch};
pub use user::{CreateUser, OrganizationSummary, User, UserDetail, UserPatch, UserSummary};
