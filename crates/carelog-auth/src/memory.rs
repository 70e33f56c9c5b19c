//! In-process identity and user record stores.
//!
//! Used by tests and for wiring the session manager without a backend. The
//! identity store supports failure injection, holding a credential exchange
//! until released (to reorder concurrent sign-ins), and pushing external
//! token changes.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use carelog_core::UserRecord;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{Notify, broadcast};

use crate::store::{IdentityStore, StoreError, UserRecordStore};
use crate::token::Token;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct Account {
    subject_id: String,
    secret: String,
}

#[derive(Default)]
struct IdentityState {
    accounts: HashMap<String, Account>,
    active: Option<Token>,
    holds: HashMap<String, Arc<Notify>>,
    token_ttl: Option<chrono::TimeDelta>,
    unavailable: bool,
    revoke_fails: bool,
    revoked: Vec<String>,
}

pub struct MemoryIdentityStore {
    state: Mutex<IdentityState>,
    changes: broadcast::Sender<Option<Token>>,
    issued: AtomicU64,
}

impl Default for MemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(IdentityState::default()),
            changes,
            issued: AtomicU64::new(0),
        }
    }

    /// Register an account that can sign in with `identifier` / `secret`.
    #[must_use]
    pub fn with_account(self, identifier: &str, subject_id: &str, secret: &str) -> Self {
        self.state.lock().accounts.insert(
            identifier.to_string(),
            Account {
                subject_id: subject_id.to_string(),
                secret: secret.to_string(),
            },
        );
        self
    }

    /// Issue tokens that expire `ttl` after the exchange.
    #[must_use]
    pub fn with_token_ttl(self, ttl: chrono::TimeDelta) -> Self {
        self.state.lock().token_ttl = Some(ttl);
        self
    }

    /// Make a token the active one, as if restored from a previous run.
    pub fn set_active(&self, token: Option<Token>) {
        self.state.lock().active = token;
    }

    /// Simulate the backend being unreachable for every call.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Make `invalidate` fail remotely (the local token is still dropped).
    pub fn set_revoke_fails(&self, fails: bool) {
        self.state.lock().revoke_fails = fails;
    }

    /// Hold the next exchange for `identifier` until the returned handle is
    /// notified.
    pub fn hold_exchange(&self, identifier: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state
            .lock()
            .holds
            .insert(identifier.to_string(), Arc::clone(&notify));
        notify
    }

    /// Announce a token change that did not come from this client.
    pub fn push_external(&self, change: Option<Token>) {
        self.state.lock().active.clone_from(&change);
        let _ = self.changes.send(change);
    }

    #[must_use]
    pub fn active(&self) -> Option<Token> {
        self.state.lock().active.clone()
    }

    /// Access tokens passed to a successful or failed `invalidate`.
    #[must_use]
    pub fn revoked(&self) -> Vec<String> {
        self.state.lock().revoked.clone()
    }

    /// Mint a token for `subject_id` without going through credentials.
    #[must_use]
    pub fn mint(&self, subject_id: &str, expires_at: Option<DateTime<Utc>>) -> Token {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Token::new(format!("mem-token-{n}"), subject_id, expires_at)
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn active_token(&self) -> Result<Option<Token>, StoreError> {
        let state = self.state.lock();
        if state.unavailable {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(state.active.clone())
    }

    async fn exchange_credentials(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Token, StoreError> {
        let hold = self.state.lock().holds.remove(identifier);
        if let Some(hold) = hold {
            hold.notified().await;
        }

        let (subject_id, ttl) = {
            let state = self.state.lock();
            if state.unavailable {
                return Err(StoreError::Unavailable("memory store offline".into()));
            }
            match state.accounts.get(identifier) {
                Some(account) if account.secret == secret => {
                    (account.subject_id.clone(), state.token_ttl)
                }
                _ => return Err(StoreError::Rejected),
            }
        };

        let token = self.mint(&subject_id, ttl.map(|ttl| Utc::now() + ttl));
        self.state.lock().active = Some(token.clone());
        Ok(token)
    }

    async fn invalidate(&self, token: &Token) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.revoked.push(token.access_token.clone());
        if state.active.as_ref() == Some(token) {
            state.active = None;
        }
        if state.unavailable {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        if state.revoke_fails {
            return Err(StoreError::Protocol("revoke rejected".into()));
        }
        Ok(())
    }

    async fn reinstate(&self, token: &Token) -> Result<(), StoreError> {
        self.state.lock().active = Some(token.clone());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Option<Token>> {
        self.changes.subscribe()
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    records: Mutex<HashMap<String, UserRecord>>,
    unavailable: Mutex<bool>,
    bearers: Mutex<Vec<String>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_record(self, record: UserRecord) -> Self {
        self.insert(record);
        self
    }

    pub fn insert(&self, record: UserRecord) {
        self.records.lock().insert(record.id.clone(), record);
    }

    pub fn remove(&self, subject_id: &str) -> Option<UserRecord> {
        self.records.lock().remove(subject_id)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    /// Access tokens that token-scoped lookups were made with, oldest first.
    #[must_use]
    pub fn bearers(&self) -> Vec<String> {
        self.bearers.lock().clone()
    }
}

#[async_trait]
impl UserRecordStore for MemoryUserStore {
    async fn find_by_id(&self, subject_id: &str) -> Result<Option<UserRecord>, StoreError> {
        if *self.unavailable.lock() {
            return Err(StoreError::Unavailable("user store offline".into()));
        }
        Ok(self.records.lock().get(subject_id).cloned())
    }

    async fn find_for_token(&self, token: &Token) -> Result<Option<UserRecord>, StoreError> {
        self.bearers.lock().push(token.access_token.clone());
        self.find_by_id(&token.subject_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelog_core::Role;

    #[tokio::test]
    async fn exchange_checks_secret_and_activates_token() {
        let store = MemoryIdentityStore::new().with_account("1001", "uid-1001", "pw");

        assert_eq!(
            store.exchange_credentials("1001", "wrong").await,
            Err(StoreError::Rejected)
        );
        assert!(store.active().is_none());

        let token = store.exchange_credentials("1001", "pw").await.unwrap();
        assert_eq!(token.subject_id, "uid-1001");
        assert_eq!(store.active(), Some(token));
    }

    #[tokio::test]
    async fn invalidate_drops_active_even_when_remote_fails() {
        let store = MemoryIdentityStore::new().with_account("1001", "uid-1001", "pw");
        let token = store.exchange_credentials("1001", "pw").await.unwrap();
        store.set_revoke_fails(true);

        assert!(store.invalidate(&token).await.is_err());
        assert!(store.active().is_none());
        assert_eq!(store.revoked(), vec![token.access_token]);
    }

    #[tokio::test]
    async fn reinstate_restores_active_without_broadcast() {
        let store = MemoryIdentityStore::new();
        let mut rx = store.subscribe();
        let token = store.mint("uid-1", None);

        store.reinstate(&token).await.unwrap();

        assert_eq!(store.active(), Some(token));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn push_external_reaches_subscribers() {
        let store = MemoryIdentityStore::new();
        let mut rx = store.subscribe();
        store.push_external(None);
        assert_eq!(rx.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn user_store_lookup() {
        let store = MemoryUserStore::new().with_record(UserRecord {
            id: "uid-1".into(),
            staff_number: "1001".into(),
            name: "Hana".into(),
            role: Role::Staff,
            created_at: Utc::now(),
        });
        assert!(store.find_by_id("uid-1").await.unwrap().is_some());
        assert!(store.find_by_id("uid-2").await.unwrap().is_none());

        store.set_unavailable(true);
        assert!(store.find_by_id("uid-1").await.is_err());
    }
}
