//! `renthub-auth`: identity boundary consumed by the domain.
//!
//! Authentication itself (sessions, tokens, password handling) lives outside
//! this workspace; domain code trusts the role and user id supplied here.

pub mod principal;
pub mod roles;

pub use principal::Principal;
pub use roles::ActorRole;
