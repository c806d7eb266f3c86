//! `gatehouse-auth` — authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: session
//! claims, token issuance/verification, password hashing and the typed
//! caller identity threaded through every use-case.

pub mod caller;
pub mod claims;
pub mod error;
pub mod password;
pub mod scope;
pub mod token;

pub use caller::{Caller, CallerKind};
pub use claims::{ClaimRole, SessionClaims};
pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use scope::Scope;
pub use token::{SESSION_TTL_HOURS, TokenCodec};
