//! The observable, persisted record of who is signed in.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::account::Account;
use crate::reactive::{CellSlots, Derived, Readable, SlotFactory};
use crate::traits::KeyValueStore;
use crate::types::{Did, PdsUrl};

/// Durable storage key of the persisted account.
pub const DEFAULT_STORAGE_KEY: &str = "user";

/// A fully signed-in user: the account plus its live transport and the
/// application client built on it.
#[derive(Debug, Clone)]
pub struct User<A, C> {
    pub account: Account,
    pub agent: A,
    pub client: C,
}

/// Which of the three session slots are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// No account.
    LoggedOut,
    /// An account is known but no live session has been attached yet.
    AccountOnly,
    /// Account, agent and client are all present.
    LoggedIn,
}

/// Holds the account, agent and client slots and their projections.
///
/// The account slot is seeded from durable storage on construction and
/// written back on every `set`, including `set(None)`, which stores the
/// literal `null`. Agent and client live only as long as the process.
///
/// Slots are written one at a time. A login sets the account, then the
/// agent, then the client, and subscribers of [`SessionStore::user`] observe
/// each step.
///
/// The three writable slots come from `S`, so any primitive implementing
/// [`Writable`](crate::reactive::Writable) can back the store. Projections
/// are read-only [`Derived`] cells fed through the slots' subscriptions.
pub struct SessionStore<A, C, S = CellSlots>
where
    A: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
    S: SlotFactory,
{
    account: S::Slot<Option<Account>>,
    agent: S::Slot<Option<A>>,
    client: S::Slot<Option<C>>,
    user: Derived<Option<User<A, C>>>,
    handle: Derived<Option<String>>,
    did: Derived<Option<Did>>,
    pds: Derived<Option<PdsUrl>>,
}

impl<A, C, S> SessionStore<A, C, S>
where
    A: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
    S: SlotFactory,
{
    /// Create a store persisting the account under [`DEFAULT_STORAGE_KEY`].
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    /// Create a store persisting the account under `key`.
    pub fn with_key(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let account = S::slot(load_account(storage.as_ref(), &key));

        account.subscribe(move |account: &Option<Account>| {
            persist_account(storage.as_ref(), &key, account);
        });

        let agent = S::slot::<Option<A>>(None);
        let client = S::slot::<Option<C>>(None);
        let user = Derived::combine3(
            &account,
            &agent,
            &client,
            |account: &Option<Account>, agent: &Option<A>, client: &Option<C>| match (
                account, agent, client,
            ) {
                (Some(account), Some(agent), Some(client)) => Some(User {
                    account: Account::clone(account),
                    agent: A::clone(agent),
                    client: C::clone(client),
                }),
                _ => None,
            },
        );
        let handle = Derived::map(&account, |a: &Option<Account>| {
            a.as_ref().map(|a| a.handle.clone())
        });
        let did = Derived::map(&account, |a: &Option<Account>| a.as_ref().map(|a| a.did.clone()));
        let pds = Derived::map(&account, |a: &Option<Account>| a.as_ref().map(|a| a.pds.clone()));

        Self {
            account,
            agent,
            client,
            user,
            handle,
            did,
            pds,
        }
    }

    /// The persisted account slot.
    pub fn account(&self) -> &S::Slot<Option<Account>> {
        &self.account
    }

    /// The live transport slot.
    pub fn agent(&self) -> &S::Slot<Option<A>> {
        &self.agent
    }

    /// The application client slot.
    pub fn client(&self) -> &S::Slot<Option<C>> {
        &self.client
    }

    /// Defined only while all three slots are defined.
    pub fn user(&self) -> &Derived<Option<User<A, C>>> {
        &self.user
    }

    pub fn handle(&self) -> &Derived<Option<String>> {
        &self.handle
    }

    pub fn did(&self) -> &Derived<Option<Did>> {
        &self.did
    }

    pub fn pds(&self) -> &Derived<Option<PdsUrl>> {
        &self.pds
    }

    pub fn login_state(&self) -> LoginState {
        if self.user.get().is_some() {
            LoginState::LoggedIn
        } else if self.account.get().is_some() {
            LoginState::AccountOnly
        } else {
            LoginState::LoggedOut
        }
    }
}

fn load_account(storage: &dyn KeyValueStore, key: &str) -> Option<Account> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, error = %err, "failed to read persisted account");
            return None;
        }
    };

    match serde_json::from_str::<Option<Account>>(&raw) {
        Ok(account) => {
            debug!(key, present = account.is_some(), "seeded account from storage");
            account
        }
        Err(err) => {
            warn!(key, error = %err, "ignoring malformed persisted account");
            None
        }
    }
}

fn persist_account(storage: &dyn KeyValueStore, key: &str, account: &Option<Account>) {
    let raw = match serde_json::to_string(account) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(key, error = %err, "failed to serialize account");
            return;
        }
    };
    if let Err(err) = storage.set(key, &raw) {
        warn!(key, error = %err, "failed to persist account");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, StorageError};
    use crate::reactive::{SubscriptionId, Writable};
    use crate::storage::MemoryStore;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Store = SessionStore<&'static str, u32>;

    fn account() -> Account {
        Account::new(
            "a.test",
            Did::new("did:plc:1").unwrap(),
            PdsUrl::new("https://pds.test").unwrap(),
        )
    }

    #[test]
    fn seeds_account_from_storage() {
        let storage = Arc::new(MemoryStore::new());
        storage
            .set(
                DEFAULT_STORAGE_KEY,
                r#"{"handle":"a.test","did":"did:plc:1","pds":"https://pds.test"}"#,
            )
            .unwrap();

        let store = Store::new(storage);
        assert_eq!(store.account().get(), Some(account()));
        assert_eq!(store.handle().get().as_deref(), Some("a.test"));
        assert_eq!(store.did().get(), Some(Did::new("did:plc:1").unwrap()));
        assert_eq!(store.login_state(), LoginState::AccountOnly);
    }

    #[test]
    fn account_round_trips_through_a_fresh_store() {
        let storage = Arc::new(MemoryStore::new());

        let first = Store::new(storage.clone());
        first.account().set(Some(account()));
        let second = Store::new(storage.clone());
        assert_eq!(second.account().get(), Some(account()));

        second.account().set(None);
        assert_eq!(
            storage.get(DEFAULT_STORAGE_KEY).unwrap().as_deref(),
            Some("null")
        );
        assert_eq!(Store::new(storage).account().get(), None);
    }

    #[test]
    fn missing_or_malformed_storage_seeds_nothing() {
        let storage = Arc::new(MemoryStore::new());
        assert_eq!(Store::new(storage.clone()).login_state(), LoginState::LoggedOut);

        storage.set(DEFAULT_STORAGE_KEY, "{not json").unwrap();
        assert_eq!(Store::new(storage).account().get(), None);
    }

    #[test]
    fn custom_key_is_used() {
        let storage = Arc::new(MemoryStore::new());
        let store = Store::with_key(storage.clone(), "session");
        store.account().set(Some(account()));
        assert!(storage.contains("session").unwrap());
        assert!(!storage.contains(DEFAULT_STORAGE_KEY).unwrap());
    }

    #[test]
    fn user_defined_only_when_all_slots_defined() {
        let store = Store::new(Arc::new(MemoryStore::new()));

        for mask in 0u8..8 {
            store.account().set(((mask & 0b001) != 0).then(account));
            store.agent().set(((mask & 0b010) != 0).then_some("agent"));
            store.client().set(((mask & 0b100) != 0).then_some(7));

            let user = store.user().get();
            assert_eq!(user.is_some(), mask == 0b111, "mask {mask:03b}");
        }
    }

    #[test]
    fn clearing_any_slot_clears_user() {
        let store = Store::new(Arc::new(MemoryStore::new()));
        let fill = |store: &Store| {
            store.account().set(Some(account()));
            store.agent().set(Some("agent"));
            store.client().set(Some(7));
            assert_eq!(store.login_state(), LoginState::LoggedIn);
        };

        fill(&store);
        store.agent().set(None);
        assert!(store.user().get().is_none());

        fill(&store);
        store.client().set(None);
        assert!(store.user().get().is_none());

        fill(&store);
        store.account().set(None);
        assert!(store.user().get().is_none());
        assert_eq!(store.login_state(), LoginState::LoggedOut);
    }

    #[test]
    fn sequential_writes_expose_intermediate_states() {
        let store = Store::new(Arc::new(MemoryStore::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store
            .user()
            .subscribe(move |user: &Option<User<&'static str, u32>>| {
                sink.lock().unwrap().push(user.is_some())
            });

        store.account().set(Some(account()));
        store.agent().set(Some("agent"));
        store.client().set(Some(7));

        assert_eq!(*seen.lock().unwrap(), vec![false, false, true]);
    }

    #[test]
    fn persisted_before_other_subscribers_run() {
        let storage = Arc::new(MemoryStore::new());
        let store = Store::new(storage.clone());
        let observed = Arc::new(Mutex::new(None));
        let sink = observed.clone();
        let reader = storage.clone();
        store.account().subscribe(move |_: &Option<Account>| {
            *sink.lock().unwrap() = reader.get(DEFAULT_STORAGE_KEY).unwrap();
        });

        store.account().set(Some(account()));
        let raw = observed.lock().unwrap().clone().unwrap();
        assert_eq!(serde_json::from_str::<Account>(&raw).unwrap(), account());
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> crate::Result<Option<String>> {
            Err(Error::Storage(StorageError::Io {
                message: "disk gone".into(),
            }))
        }

        fn set(&self, _key: &str, _value: &str) -> crate::Result<()> {
            Err(Error::Storage(StorageError::Io {
                message: "disk gone".into(),
            }))
        }
    }

    #[test]
    fn storage_failures_do_not_block_updates() {
        let store = Store::new(Arc::new(BrokenStore));
        assert_eq!(store.account().get(), None);
        store.account().set(Some(account()));
        assert_eq!(store.account().get(), Some(account()));
    }

    type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

    /// A bare observable that counts its writes.
    struct Plain<T> {
        value: Mutex<T>,
        listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
        writes: AtomicUsize,
    }

    impl<T: Clone + Send + Sync + 'static> Readable<T> for Plain<T> {
        fn get(&self) -> T {
            self.value.lock().unwrap().clone()
        }

        fn subscribe<F>(&self, listener: F) -> SubscriptionId
        where
            F: Fn(&T) + Send + Sync + 'static,
        {
            let mut listeners = self.listeners.lock().unwrap();
            let id = SubscriptionId::new(listeners.len() as u64);
            listeners.push((id, Arc::new(listener)));
            id
        }

        fn unsubscribe(&self, id: SubscriptionId) {
            self.listeners.lock().unwrap().retain(|(existing, _)| *existing != id);
        }
    }

    impl<T: Clone + Send + Sync + 'static> Writable<T> for Plain<T> {
        fn set(&self, value: T) {
            *self.value.lock().unwrap() = value.clone();
            self.writes.fetch_add(1, Ordering::SeqCst);
            let listeners: Vec<Listener<T>> = self
                .listeners
                .lock()
                .unwrap()
                .iter()
                .map(|(_, l)| Arc::clone(l))
                .collect();
            for listener in listeners {
                listener(&value);
            }
        }
    }

    struct PlainSlots;

    impl SlotFactory for PlainSlots {
        type Slot<T: Clone + Send + Sync + 'static> = Plain<T>;

        fn slot<T: Clone + Send + Sync + 'static>(value: T) -> Plain<T> {
            Plain {
                value: Mutex::new(value),
                listeners: Mutex::new(Vec::new()),
                writes: AtomicUsize::new(0),
            }
        }
    }

    #[test]
    fn store_runs_on_any_writable_primitive() {
        let storage = Arc::new(MemoryStore::new());
        let store: SessionStore<&'static str, u32, PlainSlots> = SessionStore::new(storage.clone());

        store.account().set(Some(account()));
        store.agent().set(Some("agent"));
        assert!(store.user().get().is_none());
        store.client().set(Some(7));

        assert_eq!(store.user().get().map(|user| user.client), Some(7));
        assert_eq!(store.handle().get().as_deref(), Some("a.test"));
        assert_eq!(store.account().writes.load(Ordering::SeqCst), 1);
        assert!(storage.contains(DEFAULT_STORAGE_KEY).unwrap());

        store.agent().set(None);
        assert_eq!(store.login_state(), LoginState::AccountOnly);
        assert_eq!(
            SessionStore::<&'static str, u32, PlainSlots>::new(storage)
                .account()
                .get(),
            Some(account())
        );
    }
}
