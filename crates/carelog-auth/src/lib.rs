//! # carelog-auth
//!
//! Staff sign-in and role-gated access for carelog.
//!
//! - [`SessionManager`] restores, signs in, signs out, and applies pushed
//!   token changes, publishing every transition to its observers.
//! - [`gate::evaluate`] maps a session state and a required role to an
//!   [`AuthDecision`]; [`AuthGuard`] acts on it, navigating at most once per
//!   redirect target.
//! - [`navigation`] holds the entry-page redirects and the role menu.
//! - [`HttpBackend`] implements the identity and user record stores against
//!   the hosted backend, caching the token with [`TokenCache`]
//!   (keyring → env → file).
//! - [`memory`] provides in-process stores for tests and offline wiring.

pub mod composer;
pub mod error;
pub mod gate;
pub mod http;
pub mod manager;
pub mod memory;
pub mod navigation;
pub mod observers;
pub mod store;
pub mod token;
pub mod token_store;

pub use composer::{AuthGuard, Navigator, Render, RouteComposer};
pub use error::{AuthError, AuthErrorKind};
pub use gate::{AuthDecision, evaluate, evaluate_route};
pub use http::HttpBackend;
pub use manager::{SessionManager, SignedIn};
pub use navigation::{MenuEntry, login_redirect, menu_for, menu_for_state, root_redirect};
pub use observers::SubscriptionId;
pub use store::{IdentityStore, StoreError, UserRecordStore, staff_email};
pub use token::Token;
pub use token_store::{TokenCache, TokenSource};
