// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity registry: accounts, password logins, login tickets and the web
//! clients bound to each account.
//!
//! A web visitor logs in with a password and receives a ticket. Typing
//! `!login <ticket>` in a platform chat links that platform identity to the
//! visitor's account, after which the voice preference set on the web
//! applies to their chat messages.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use rand::Rng;
use rand::distributions::Alphanumeric;
use sha2::{Digest, Sha256};
use streambot_core::{Account, ClientId, StreambotError, User};
use streambot_storage::{AccountSnapshot, AccountStore};
use tracing::{debug, info};

/// Length of issued login tickets.
pub const TICKET_LEN: usize = 8;

#[derive(Debug, Default)]
struct RegistryState {
    accounts: HashMap<String, Account>,
    /// Identity key to account id.
    by_key: HashMap<String, String>,
    /// Outstanding ticket to account id.
    tickets: HashMap<String, String>,
    /// Password digest to account id.
    passwords: BTreeMap<String, String>,
    clients: HashMap<String, HashSet<ClientId>>,
    client_accounts: HashMap<ClientId, String>,
}

impl RegistryState {
    fn from_snapshot(snapshot: AccountSnapshot) -> Self {
        let mut state = Self {
            passwords: snapshot.passwords,
            ..Self::default()
        };
        for account in snapshot.accounts {
            state.index(&account);
            state.accounts.insert(account.id.clone(), account);
        }
        state
    }

    fn index(&mut self, account: &Account) {
        for key in account.keys() {
            self.by_key.insert(key, account.id.clone());
        }
        if let Some(ticket) = &account.ticket {
            self.tickets.insert(ticket.clone(), account.id.clone());
        }
    }

    fn snapshot(&self) -> AccountSnapshot {
        let mut accounts: Vec<Account> = self.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        AccountSnapshot {
            accounts,
            passwords: self.passwords.clone(),
        }
    }

    fn issue_ticket(&mut self, account_id: &str) -> Option<String> {
        let account = self.accounts.get_mut(account_id)?;
        if let Some(old) = account.ticket.take() {
            self.tickets.remove(&old);
        }
        let ticket = loop {
            let candidate = generate_ticket();
            if !self.tickets.contains_key(&candidate) {
                break candidate;
            }
        };
        account.ticket = Some(ticket.clone());
        self.tickets.insert(ticket.clone(), account_id.to_string());
        Some(ticket)
    }
}

/// Shared registry of accounts. All methods take `&self`.
#[derive(Debug)]
pub struct IdentityRegistry {
    state: Mutex<RegistryState>,
    store: Option<AccountStore>,
    save_lock: tokio::sync::Mutex<()>,
}

impl IdentityRegistry {
    /// A registry that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            store: None,
            save_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Loads the registry from `store`.
    pub async fn load(store: AccountStore) -> Result<Self, StreambotError> {
        let snapshot = store.load().await?;
        info!(accounts = snapshot.accounts.len(), "loaded accounts");
        Ok(Self {
            state: Mutex::new(RegistryState::from_snapshot(snapshot)),
            store: Some(store),
            save_lock: tokio::sync::Mutex::new(()),
        })
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut RegistryState) -> R) -> R {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    /// The account an identity belongs to, if linked.
    pub fn resolve(&self, user: &User) -> Option<Account> {
        self.with_state(|s| {
            let id = s.by_key.get(&user.key())?;
            s.accounts.get(id).cloned()
        })
    }

    pub fn account(&self, account_id: &str) -> Option<Account> {
        self.with_state(|s| s.accounts.get(account_id).cloned())
    }

    /// Logs `client` into the account owning `password`, creating an
    /// anonymous account on first use. The account always has a ticket
    /// afterwards.
    pub fn login_with_password(&self, password: &str, client: ClientId) -> Account {
        let digest = password_digest(password);
        self.with_state(|s| {
            let id = match s.passwords.get(&digest) {
                Some(id) if s.accounts.contains_key(id) => id.clone(),
                _ => {
                    let account = Account::new(uuid::Uuid::new_v4().to_string());
                    let id = account.id.clone();
                    s.index(&account);
                    s.accounts.insert(id.clone(), account);
                    s.passwords.insert(digest, id.clone());
                    info!(account = %id, "created account");
                    id
                }
            };
            let has_ticket = s.accounts.get(&id).is_some_and(|a| a.ticket.is_some());
            if !has_ticket {
                s.issue_ticket(&id);
            }
            s.clients.entry(id.clone()).or_default().insert(client);
            s.client_accounts.insert(client, id.clone());
            s.accounts.get(&id).cloned().unwrap_or_else(|| Account::new(id))
        })
    }

    /// Issues a ticket for `account_id` unless it already has one.
    pub fn ensure_ticket(&self, account_id: &str) -> Option<String> {
        self.with_state(|s| {
            let existing = s.accounts.get(account_id)?.ticket.clone();
            existing.or_else(|| s.issue_ticket(account_id))
        })
    }

    /// Links `user` to the account holding `ticket` and replaces the ticket.
    ///
    /// Returns the updated account, or `None` for an unknown ticket or an
    /// identity that cannot be linked.
    pub fn redeem_ticket(&self, ticket: &str, user: &User) -> Option<Account> {
        if user.platform().is_none() {
            return None;
        }
        self.with_state(|s| {
            let id = s.tickets.get(ticket)?.clone();
            let account = s.accounts.get_mut(&id)?;
            let previous = account
                .platform_users()
                .into_iter()
                .find(|u| u.platform() == user.platform());
            account.link(user);
            if let Some(previous) = previous {
                s.by_key.remove(&previous.key());
            }
            s.by_key.insert(user.key(), id.clone());
            s.issue_ticket(&id);
            debug!(account = %id, identity = %user.key(), "linked identity");
            s.accounts.get(&id).cloned()
        })
    }

    /// Voice preference of the account `user` belongs to.
    pub fn voice_for(&self, user: &User) -> Option<String> {
        self.resolve(user).and_then(|a| a.voice)
    }

    pub fn set_voice(&self, account_id: &str, voice: &str) -> Option<Account> {
        self.with_state(|s| {
            let account = s.accounts.get_mut(account_id)?;
            account.voice = Some(voice.to_string());
            Some(account.clone())
        })
    }

    pub fn account_of_client(&self, client: ClientId) -> Option<Account> {
        self.with_state(|s| {
            let id = s.client_accounts.get(&client)?;
            s.accounts.get(id).cloned()
        })
    }

    pub fn bind_client(&self, account_id: &str, client: ClientId) {
        self.with_state(|s| {
            s.clients
                .entry(account_id.to_string())
                .or_default()
                .insert(client);
            s.client_accounts.insert(client, account_id.to_string());
        });
    }

    pub fn unbind_client(&self, client: ClientId) {
        self.with_state(|s| {
            if let Some(id) = s.client_accounts.remove(&client) {
                if let Some(set) = s.clients.get_mut(&id) {
                    set.remove(&client);
                    if set.is_empty() {
                        s.clients.remove(&id);
                    }
                }
            }
        });
    }

    /// Live web clients logged into `account_id`, in id order.
    pub fn clients_of(&self, account_id: &str) -> Vec<ClientId> {
        let mut clients: Vec<ClientId> = self.with_state(|s| {
            s.clients
                .get(account_id)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default()
        });
        clients.sort();
        clients
    }

    /// Persists the table. A registry created with [`in_memory`](Self::in_memory)
    /// does nothing.
    pub async fn save(&self) -> Result<(), StreambotError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let _guard = self.save_lock.lock().await;
        let snapshot = self.with_state(|s| s.snapshot());
        store.save(&snapshot).await
    }
}

/// SHA-256 hex digest under which a password is stored.
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn generate_ticket() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TICKET_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use streambot_test_utils::{twitch_user, youtube_user};

    #[test]
    fn password_login_creates_then_reuses_account() {
        let registry = IdentityRegistry::in_memory();
        let first = registry.login_with_password("hunter2", ClientId(1));
        let ticket = first.ticket.clone().unwrap();
        assert_eq!(ticket.len(), TICKET_LEN);
        assert!(ticket.chars().all(|c| c.is_ascii_alphanumeric()));

        let again = registry.login_with_password("hunter2", ClientId(2));
        assert_eq!(again.id, first.id);
        assert_eq!(again.ticket, first.ticket);
        assert_eq!(registry.clients_of(&first.id), vec![ClientId(1), ClientId(2)]);

        let other = registry.login_with_password("different", ClientId(3));
        assert_ne!(other.id, first.id);
    }

    #[test]
    fn redeeming_links_identity_and_rotates_ticket() {
        let registry = IdentityRegistry::in_memory();
        let account = registry.login_with_password("pw", ClientId(1));
        let ticket = account.ticket.clone().unwrap();
        let alice = twitch_user("42", "Alice");

        let linked = registry.redeem_ticket(&ticket, &alice).unwrap();
        assert_eq!(linked.id, account.id);
        assert_eq!(linked.twitch.as_ref().map(|u| u.id.as_str()), Some("42"));
        assert_ne!(linked.ticket.as_deref(), Some(ticket.as_str()));

        assert_eq!(registry.resolve(&alice).map(|a| a.id), Some(account.id));
        // The old ticket is spent.
        assert!(registry.redeem_ticket(&ticket, &youtube_user("UC", "A")).is_none());
    }

    #[test]
    fn relinking_a_platform_drops_the_previous_identity() {
        let registry = IdentityRegistry::in_memory();
        let account = registry.login_with_password("pw", ClientId(1));
        let old = twitch_user("1", "Old");
        let new = twitch_user("2", "New");
        let t1 = account.ticket.unwrap();
        let t2 = registry.redeem_ticket(&t1, &old).unwrap().ticket.unwrap();
        registry.redeem_ticket(&t2, &new).unwrap();
        assert!(registry.resolve(&old).is_none());
        assert!(registry.resolve(&new).is_some());
    }

    #[test]
    fn unknown_ticket_and_bot_are_rejected() {
        let registry = IdentityRegistry::in_memory();
        assert!(registry.redeem_ticket("nope", &twitch_user("1", "A")).is_none());
        let account = registry.login_with_password("pw", ClientId(1));
        assert!(
            registry
                .redeem_ticket(account.ticket.as_deref().unwrap(), &User::Bot)
                .is_none()
        );
    }

    #[test]
    fn voice_follows_linked_identity() {
        let registry = IdentityRegistry::in_memory();
        let account = registry.login_with_password("pw", ClientId(1));
        let alice = twitch_user("1", "Alice");
        registry.redeem_ticket(account.ticket.as_deref().unwrap(), &alice);
        assert!(registry.voice_for(&alice).is_none());
        registry.set_voice(&account.id, "female_01.wav");
        assert_eq!(registry.voice_for(&alice).as_deref(), Some("female_01.wav"));
    }

    #[test]
    fn unbinding_removes_client() {
        let registry = IdentityRegistry::in_memory();
        let account = registry.login_with_password("pw", ClientId(7));
        assert!(registry.account_of_client(ClientId(7)).is_some());
        registry.unbind_client(ClientId(7));
        assert!(registry.clients_of(&account.id).is_empty());
        assert!(registry.account_of_client(ClientId(7)).is_none());
    }

    #[tokio::test]
    async fn persisted_registry_reloads_links_and_passwords() {
        let dir = tempfile::tempdir().unwrap();
        let registry = IdentityRegistry::load(AccountStore::in_dir(dir.path()))
            .await
            .unwrap();
        let account = registry.login_with_password("pw", ClientId(1));
        let alice = twitch_user("1", "Alice");
        let linked = registry
            .redeem_ticket(account.ticket.as_deref().unwrap(), &alice)
            .unwrap();
        registry.save().await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("users.json")).unwrap();
        assert!(!raw.contains("\"pw\""));
        assert!(raw.contains(&password_digest("pw")));

        let reloaded = IdentityRegistry::load(AccountStore::in_dir(dir.path()))
            .await
            .unwrap();
        assert_eq!(reloaded.resolve(&alice).map(|a| a.id), Some(account.id.clone()));
        let again = reloaded.login_with_password("pw", ClientId(9));
        assert_eq!(again.id, account.id);
        assert_eq!(again.ticket, linked.ticket);
    }
}
