use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::executor::block_on;

use super::*;
use crate::net::test_support::{FakeGateway, user};
use crate::net::types::Role;
use crate::util::persistence::{MemoryTokenStorage, StorageError};

// =============================================================
// Helpers
// =============================================================

fn store_with(storage: &Arc<MemoryTokenStorage>) -> SessionStore {
    SessionStore::new(Arc::clone(storage) as Arc<dyn TokenStorage>)
}

fn settled_store() -> (SessionStore, Arc<MemoryTokenStorage>) {
    let storage = Arc::new(MemoryTokenStorage::default());
    let store = store_with(&storage);
    assert_eq!(store.begin_hydration(), Hydration::Resolved(SessionStatus::Anonymous));
    (store, storage)
}

/// `(user != None) <=> (token != None) <=> (status == Authenticated)`, and
/// persisted storage agrees with memory.
fn assert_consistent(store: &SessionStore, storage: &MemoryTokenStorage) {
    let authenticated = store.status() == SessionStatus::Authenticated;
    assert_eq!(store.user().is_some(), authenticated);
    assert_eq!(store.credential().is_some(), authenticated);
    assert_eq!(store.snapshot().user.is_some(), authenticated);
    if store.status() != SessionStatus::Hydrating {
        assert_eq!(storage.peek(), store.credential().map(|c| c.token().to_owned()));
    }
}

// =============================================================
// Hydration
// =============================================================

#[test]
fn new_store_is_hydrating_and_loading() {
    let storage = Arc::new(MemoryTokenStorage::default());
    let store = store_with(&storage);
    assert_eq!(store.status(), SessionStatus::Hydrating);
    let snapshot = store.snapshot();
    assert!(snapshot.loading);
    assert!(snapshot.user.is_none());
}

#[test]
fn initialize_without_token_is_anonymous_and_skips_gateway() {
    let storage = Arc::new(MemoryTokenStorage::default());
    let store = store_with(&storage);
    let gateway = FakeGateway { me: Some(Ok(user("1", Role::Regular))), ..FakeGateway::default() };

    let status = block_on(store.initialize(&gateway));

    assert_eq!(status, SessionStatus::Anonymous);
    assert!(gateway.calls().is_empty());
    assert!(!store.snapshot().loading);
    assert_consistent(&store, &storage);
}

#[test]
fn initialize_with_token_confirms_user() {
    let storage = Arc::new(MemoryTokenStorage::with_token("abc"));
    let store = store_with(&storage);
    let gateway = FakeGateway { me: Some(Ok(user("1", Role::Regular))), ..FakeGateway::default() };

    let status = block_on(store.initialize(&gateway));

    assert_eq!(status, SessionStatus::Authenticated);
    assert_eq!(gateway.calls(), vec!["me:abc".to_owned()]);
    let snapshot = store.snapshot();
    assert!(!snapshot.loading);
    let confirmed = snapshot.user.unwrap();
    assert_eq!(confirmed.id, "1");
    assert_eq!(confirmed.role, Role::Regular);
    assert_eq!(store.credential().unwrap().token(), "abc");
    assert_consistent(&store, &storage);
}

#[test]
fn initialize_network_failure_resolves_anonymous() {
    let storage = Arc::new(MemoryTokenStorage::with_token("abc"));
    let store = store_with(&storage);
    let gateway = FakeGateway {
        me: Some(Err(ApiError::NetworkFailure("no response within 15000ms".to_owned()))),
        ..FakeGateway::default()
    };

    assert_eq!(block_on(store.initialize(&gateway)), SessionStatus::Anonymous);
    assert!(storage.peek().is_none());
    assert_consistent(&store, &storage);
}

#[test]
fn initialize_rejected_token_resolves_anonymous() {
    let storage = Arc::new(MemoryTokenStorage::with_token("revoked"));
    let store = store_with(&storage);
    let gateway = FakeGateway { me: Some(Err(ApiError::Unauthorized)), ..FakeGateway::default() };

    assert_eq!(block_on(store.initialize(&gateway)), SessionStatus::Anonymous);
    assert!(storage.peek().is_none());
}

#[test]
fn store_stays_hydrating_while_confirmation_is_outstanding() {
    let storage = Arc::new(MemoryTokenStorage::with_token("abc"));
    let store = store_with(&storage);

    let Hydration::Pending(ticket) = store.begin_hydration() else {
        panic!("expected a pending confirmation");
    };
    assert_eq!(ticket.token(), "abc");
    assert_eq!(store.status(), SessionStatus::Hydrating);
    assert!(store.snapshot().loading);

    let status = store.complete_hydration(ticket, Ok(user("1", Role::Regular))).unwrap();
    assert_eq!(status, SessionStatus::Authenticated);
}

#[test]
fn second_hydration_does_not_issue_another_fetch() {
    let storage = Arc::new(MemoryTokenStorage::with_token("abc"));
    let store = store_with(&storage);
    assert!(matches!(store.begin_hydration(), Hydration::Pending(_)));
    assert_eq!(store.begin_hydration(), Hydration::Resolved(SessionStatus::Hydrating));
}

#[test]
fn initialize_after_settling_is_a_noop() {
    let (store, _storage) = settled_store();
    let gateway = FakeGateway::default();
    assert_eq!(block_on(store.initialize(&gateway)), SessionStatus::Anonymous);
    assert!(gateway.calls().is_empty());
}

#[test]
fn confirmation_arriving_after_logout_is_discarded() {
    let storage = Arc::new(MemoryTokenStorage::with_token("abc"));
    let store = store_with(&storage);
    let Hydration::Pending(ticket) = store.begin_hydration() else {
        panic!("expected a pending confirmation");
    };

    assert!(store.logout());
    let result = store.complete_hydration(ticket, Ok(user("1", Role::Admin)));

    assert_eq!(result, Err(SessionError::Superseded));
    assert_eq!(store.status(), SessionStatus::Anonymous);
    assert!(storage.peek().is_none());
}

#[test]
fn confirmation_arriving_after_login_is_discarded() {
    let storage = Arc::new(MemoryTokenStorage::with_token("old"));
    let store = store_with(&storage);
    let Hydration::Pending(ticket) = store.begin_hydration() else {
        panic!("expected a pending confirmation");
    };

    store.login(user("2", Role::Admin), "fresh").unwrap();
    let result = store.complete_hydration(ticket, Err(ApiError::Unauthorized));

    assert_eq!(result, Err(SessionError::Superseded));
    assert_eq!(store.user().unwrap().id, "2");
    assert_eq!(storage.peek().as_deref(), Some("fresh"));
}

// =============================================================
// Login / logout
// =============================================================

#[test]
fn login_persists_token_and_authenticates() {
    let (store, storage) = settled_store();
    store.login(user("2", Role::Admin), "xyz").unwrap();

    assert_eq!(store.status(), SessionStatus::Authenticated);
    assert_eq!(storage.peek().as_deref(), Some("xyz"));
    assert!(store.user().unwrap().is_admin());
    assert_consistent(&store, &storage);
}

#[test]
fn login_rejects_blank_token_without_touching_state() {
    let (store, storage) = settled_store();
    let generation = store.generation();

    assert_eq!(store.login(user("2", Role::Regular), "  "), Err(SessionError::EmptyToken));
    assert_eq!(store.status(), SessionStatus::Anonymous);
    assert_eq!(store.generation(), generation);
    assert!(storage.peek().is_none());
}

#[test]
fn relogin_replaces_session_in_place() {
    let (store, storage) = settled_store();
    store.login(user("1", Role::Regular), "first").unwrap();
    store.login(user("2", Role::Admin), "second").unwrap();

    assert_eq!(store.status(), SessionStatus::Authenticated);
    assert_eq!(store.user().unwrap().id, "2");
    assert_eq!(storage.peek().as_deref(), Some("second"));
}

#[test]
fn login_then_logout_leaves_no_residue() {
    let (store, storage) = settled_store();
    store.login(user("1", Role::Regular), "abc").unwrap();
    assert!(store.logout());

    assert!(storage.peek().is_none());
    assert!(store.user().is_none());
    assert!(store.credential().is_none());
    assert_consistent(&store, &storage);
}

#[test]
fn logout_is_idempotent() {
    let (store, storage) = settled_store();
    store.login(user("1", Role::Regular), "abc").unwrap();

    assert!(store.logout());
    let once = (store.snapshot(), store.generation(), storage.peek());
    assert!(!store.logout());
    let twice = (store.snapshot(), store.generation(), storage.peek());

    assert_eq!(once, twice);
}

#[test]
fn logout_while_hydrating_settles_anonymous() {
    let storage = Arc::new(MemoryTokenStorage::with_token("abc"));
    let store = store_with(&storage);
    assert!(store.logout());
    assert_eq!(store.status(), SessionStatus::Anonymous);
    assert!(!store.snapshot().loading);
    assert!(storage.peek().is_none());
}

#[test]
fn invariant_holds_across_login_logout_sequences() {
    let (store, storage) = settled_store();
    let steps: [Option<(&str, Role, &str)>; 8] = [
        Some(("1", Role::Regular, "t1")),
        None,
        None,
        Some(("2", Role::Admin, "t2")),
        Some(("3", Role::Regular, "t3")),
        None,
        Some(("4", Role::Regular, "t4")),
        None,
    ];
    for step in steps {
        match step {
            Some((id, role, token)) => store.login(user(id, role), token).unwrap(),
            None => {
                store.logout();
            }
        }
        assert_consistent(&store, &storage);
    }
}

#[test]
fn later_login_response_replaces_earlier_commit() {
    let (store, storage) = settled_store();
    let issued_at = store.logout_epoch();

    store.login(user("1", Role::Regular), "first").unwrap();
    store.login_if_current(issued_at, user("9", Role::Admin), "second").unwrap();

    assert_eq!(store.user().unwrap().id, "9");
    assert_eq!(storage.peek().as_deref(), Some("second"));
    assert_consistent(&store, &storage);
}

#[test]
fn login_response_survives_hydration_settling() {
    let storage = Arc::new(MemoryTokenStorage::with_token("old"));
    let store = store_with(&storage);
    let Hydration::Pending(ticket) = store.begin_hydration() else {
        panic!("expected a pending confirmation");
    };
    let issued_at = store.logout_epoch();

    store.complete_hydration(ticket, Err(ApiError::Unauthorized)).unwrap();
    store.login_if_current(issued_at, user("7", Role::Regular), "fresh").unwrap();

    assert_eq!(store.status(), SessionStatus::Authenticated);
    assert_eq!(storage.peek().as_deref(), Some("fresh"));
}

#[test]
fn login_response_after_logout_is_discarded() {
    let (store, storage) = settled_store();
    store.login(user("1", Role::Regular), "abc").unwrap();
    let issued_at = store.logout_epoch();
    store.logout();

    assert_eq!(store.login_if_current(issued_at, user("1", Role::Regular), "stale"), Err(SessionError::Superseded));
    assert!(storage.peek().is_none());
}

#[test]
fn login_response_after_expiry_is_discarded() {
    let (store, _storage) = settled_store();
    store.login(user("1", Role::Regular), "abc").unwrap();
    let issued_at = store.logout_epoch();
    store.expire(&store.credential().unwrap());

    assert_eq!(store.login_if_current(issued_at, user("1", Role::Regular), "late"), Err(SessionError::Superseded));
    assert_eq!(store.status(), SessionStatus::Anonymous);
}

#[test]
fn noop_logout_does_not_advance_logout_epoch() {
    let (store, _storage) = settled_store();
    let epoch = store.logout_epoch();
    assert!(!store.logout());
    assert_eq!(store.logout_epoch(), epoch);
}

// =============================================================
// Storage failures
// =============================================================

/// Memory slot whose `clear` fails while `broken` is set.
#[derive(Default)]
struct FailingClear {
    slot: MemoryTokenStorage,
    broken: AtomicBool,
}

impl TokenStorage for FailingClear {
    fn load(&self) -> Option<String> {
        self.slot.load()
    }

    fn store(&self, token: &str) -> Result<(), StorageError> {
        self.slot.store(token)
    }

    fn clear(&self) -> Result<(), StorageError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StorageError::Write("quota".to_owned()));
        }
        self.slot.clear()
    }
}

fn failing_store() -> (SessionStore, Arc<FailingClear>) {
    let storage = Arc::new(FailingClear::default());
    let store = SessionStore::new(Arc::clone(&storage) as Arc<dyn TokenStorage>);
    store.begin_hydration();
    (store, storage)
}

#[test]
fn failed_erase_is_retried_on_next_logout() {
    let (store, storage) = failing_store();
    store.login(user("1", Role::Regular), "abc").unwrap();

    storage.broken.store(true, Ordering::SeqCst);
    assert!(store.logout());
    assert_eq!(store.status(), SessionStatus::Anonymous);
    assert_eq!(storage.slot.peek().as_deref(), Some("abc"));

    storage.broken.store(false, Ordering::SeqCst);
    assert!(!store.logout());
    assert!(storage.slot.peek().is_none());
}

#[test]
fn login_after_failed_erase_overwrites_slot() {
    let (store, storage) = failing_store();
    store.login(user("1", Role::Regular), "abc").unwrap();
    storage.broken.store(true, Ordering::SeqCst);
    store.logout();

    store.login(user("2", Role::Regular), "def").unwrap();
    store.logout();

    assert_eq!(storage.slot.peek().as_deref(), Some("def"));
    storage.broken.store(false, Ordering::SeqCst);
    store.logout();
    assert!(storage.slot.peek().is_none());
}

// =============================================================
// Expiry
// =============================================================

#[test]
fn expire_logs_out_with_notice() {
    let (store, storage) = settled_store();
    store.login(user("2", Role::Admin), "xyz").unwrap();
    let credential = store.credential().unwrap();

    assert!(store.expire(&credential));

    assert_eq!(store.status(), SessionStatus::Anonymous);
    assert!(storage.peek().is_none());
    assert_eq!(store.snapshot().notice, Some(SessionNotice::Expired));
}

#[test]
fn expire_for_replaced_session_is_ignored() {
    let (store, storage) = settled_store();
    store.login(user("1", Role::Regular), "old").unwrap();
    let stale = store.credential().unwrap();
    store.login(user("1", Role::Regular), "new").unwrap();

    assert!(!store.expire(&stale));
    assert_eq!(store.status(), SessionStatus::Authenticated);
    assert_eq!(storage.peek().as_deref(), Some("new"));
}

#[test]
fn next_login_clears_expiry_notice() {
    let (store, _storage) = settled_store();
    store.login(user("1", Role::Regular), "abc").unwrap();
    store.expire(&store.credential().unwrap());
    store.login(user("1", Role::Regular), "def").unwrap();
    assert_eq!(store.snapshot().notice, None);
}

// =============================================================
// Profile updates
// =============================================================

#[test]
fn update_user_merges_without_touching_token() {
    let (store, storage) = settled_store();
    store.login(user("1", Role::Regular), "abc").unwrap();
    let generation = store.generation();

    let updated = store
        .update_user(UserPatch { location: Some("Pune".to_owned()), profile_complete: Some(true), ..UserPatch::default() })
        .unwrap();

    assert_eq!(updated.location.as_deref(), Some("Pune"));
    assert!(store.user().unwrap().has_complete_profile());
    assert_eq!(store.credential().unwrap().token(), "abc");
    assert_eq!(store.generation(), generation);
    assert_eq!(storage.peek().as_deref(), Some("abc"));
}

#[test]
fn update_user_when_anonymous_fails_cleanly() {
    let (store, storage) = settled_store();
    let result = store.update_user(UserPatch { name: Some("x".to_owned()), ..UserPatch::default() });
    assert_eq!(result, Err(SessionError::NotAuthenticated));
    assert_eq!(store.status(), SessionStatus::Anonymous);
    assert_consistent(&store, &storage);
}

#[test]
fn update_user_while_hydrating_fails_cleanly() {
    let storage = Arc::new(MemoryTokenStorage::with_token("abc"));
    let store = store_with(&storage);
    assert_eq!(store.update_user(UserPatch::default()), Err(SessionError::NotAuthenticated));
    assert_eq!(store.status(), SessionStatus::Hydrating);
}

#[test]
fn update_user_for_stale_credential_is_rejected() {
    let (store, _storage) = settled_store();
    store.login(user("1", Role::Regular), "abc").unwrap();
    let stale = store.credential().unwrap();
    store.login(user("2", Role::Regular), "def").unwrap();

    let result = store.update_user_for(&stale, UserPatch { name: Some("wrong".to_owned()), ..UserPatch::default() });

    assert_eq!(result, Err(SessionError::Superseded));
    assert_eq!(store.user().unwrap().name, "user 2");
}

// =============================================================
// Subscriptions
// =============================================================

#[test]
fn subscribers_see_each_committed_snapshot() {
    let storage = Arc::new(MemoryTokenStorage::default());
    let store = store_with(&storage);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.subscribe(move |s: &AuthState| sink.lock().unwrap().push((s.loading, s.user.as_ref().map(|u| u.id.clone()))));

    store.begin_hydration();
    store.login(user("1", Role::Regular), "abc").unwrap();
    store.logout();
    store.logout();

    assert_eq!(*seen.lock().unwrap(), vec![(false, None), (false, Some("1".to_owned())), (false, None)]);
}

#[test]
fn subscriber_reads_committed_state() {
    let (store, _storage) = settled_store();
    let observed = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&observed);
    let reader = store.clone();
    store.subscribe(move |_| *sink.lock().unwrap() = Some(reader.status()));

    store.login(user("1", Role::Regular), "abc").unwrap();

    assert_eq!(*observed.lock().unwrap(), Some(SessionStatus::Authenticated));
}

#[test]
fn unsubscribed_listener_is_not_called() {
    let (store, _storage) = settled_store();
    let count = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&count);
    let id = store.subscribe(move |_| *sink.lock().unwrap() += 1);

    store.login(user("1", Role::Regular), "abc").unwrap();
    assert!(store.unsubscribe(id));
    assert!(!store.unsubscribe(id));
    store.logout();

    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn debug_output_does_not_leak_token() {
    let (store, _storage) = settled_store();
    store.login(user("1", Role::Regular), "supersecret").unwrap();
    let credential = store.credential().unwrap();
    assert!(!format!("{store:?}").contains("supersecret"));
    assert!(!format!("{credential:?}").contains("supersecret"));
}
