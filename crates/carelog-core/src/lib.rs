//! # carelog-core
//!
//! Core types shared across the carelog crates.
//!
//! - Staff roles and their string forms
//! - Staff user records as stored by the backend
//! - Session state (`Unknown` / `LoggedOut` / `LoggedIn`)
//! - The application route table and per-route access requirements
//! - Cross-cutting error types

pub mod enums;
pub mod errors;
pub mod routes;
pub mod session;
pub mod user;

pub use enums::Role;
pub use errors::CoreError;
pub use routes::{Access, Route};
pub use session::{Session, SessionState};
pub use user::UserRecord;
