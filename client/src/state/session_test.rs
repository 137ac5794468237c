use std::cell::RefCell;
use std::rc::Rc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use super::*;

const NOW: f64 = 1_700_000_000.0;

#[derive(Clone, Debug, Default, PartialEq)]
struct NavLog {
    notices: Vec<String>,
    redirects: Vec<String>,
}

#[derive(Clone, Debug)]
struct RecordingNavigator {
    path: String,
    log: Rc<RefCell<NavLog>>,
}

impl RecordingNavigator {
    fn at(path: &str) -> (Self, Rc<RefCell<NavLog>>) {
        let log = Rc::new(RefCell::new(NavLog::default()));
        let nav = Self {
            path: path.to_owned(),
            log: Rc::clone(&log),
        };
        (nav, log)
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.path.clone()
    }

    fn notify(&self, notice: &str) {
        self.log.borrow_mut().notices.push(notice.to_owned());
    }

    fn hard_redirect(&self, path: &str) {
        self.log.borrow_mut().redirects.push(path.to_owned());
    }
}

fn token_expiring_at(exp: f64) -> String {
    let payload = serde_json::json!({ "sub": "1", "exp": exp }).to_string();
    format!("eyJhbGciOiJIUzI1NiJ9.{}.c2ln", URL_SAFE_NO_PAD.encode(payload))
}

fn ada() -> User {
    serde_json::from_value(serde_json::json!({
        "id": 1,
        "username": "ada",
        "is_admin": true
    }))
    .unwrap()
}

fn session_with(store: MemoryStore) -> (SessionManager<MemoryStore, RecordingNavigator>, Rc<RefCell<NavLog>>) {
    let (nav, log) = RecordingNavigator::at("/admin");
    (SessionManager::new(store, nav), log)
}

fn stored(user: &User, token: &str) -> MemoryStore {
    MemoryStore::default()
        .with(USER_KEY, &serde_json::to_string(user).unwrap())
        .with(TOKEN_KEY, token)
}

// =============================================================
// Fresh session
// =============================================================

#[test]
fn fresh_session_is_loading_and_invalid() {
    let (session, _) = session_with(MemoryStore::default());
    assert!(session.is_loading());
    assert!(!session.is_valid());
    assert!(session.user().is_none());
    assert!(session.token().is_none());
    assert!(session.authorization_header().is_none());
}

// =============================================================
// restore
// =============================================================

#[test]
fn restore_with_empty_storage_leaves_session_empty() {
    let (mut session, _) = session_with(MemoryStore::default());
    session.restore_at(NOW);
    assert!(!session.is_loading());
    assert!(session.user().is_none());
}

#[test]
fn restore_with_only_token_leaves_storage_untouched() {
    let token = token_expiring_at(NOW + 3600.0);
    let (mut session, _) = session_with(MemoryStore::default().with(TOKEN_KEY, &token));
    session.restore_at(NOW);
    assert!(session.token().is_none());
    assert_eq!(session.store().read(TOKEN_KEY), Some(token));
}

#[test]
fn restore_treats_empty_values_as_absent() {
    let raw_user = serde_json::to_string(&ada()).unwrap();
    let (mut session, _) = session_with(MemoryStore::default().with(USER_KEY, &raw_user).with(TOKEN_KEY, ""));
    session.restore_at(NOW);
    assert!(session.user().is_none());
    assert!(!session.is_loading());
    assert_eq!(session.store().read(TOKEN_KEY).as_deref(), Some(""));
    assert_eq!(session.store().read(USER_KEY), Some(raw_user));

    let token = token_expiring_at(NOW + 3600.0);
    let (mut session, _) = session_with(MemoryStore::default().with(USER_KEY, "").with(TOKEN_KEY, &token));
    session.restore_at(NOW);
    assert!(session.token().is_none());
    assert_eq!(session.store().read(TOKEN_KEY), Some(token));
}

#[test]
fn restore_populates_from_live_token() {
    let token = token_expiring_at(NOW + 3600.0);
    let (mut session, _) = session_with(stored(&ada(), &token));
    session.restore_at(NOW);
    assert!(!session.is_loading());
    assert_eq!(session.user(), Some(&ada()));
    assert_eq!(session.token(), Some(token.as_str()));
    assert!(session.is_valid_at(NOW));
}

#[test]
fn restore_discards_expired_token_and_clears_storage() {
    let (mut session, log) = session_with(stored(&ada(), &token_expiring_at(NOW - 1.0)));
    session.restore_at(NOW);
    assert!(!session.is_loading());
    assert!(session.user().is_none());
    assert!(!session.is_valid_at(NOW));
    assert!(session.store().is_empty());
    assert!(log.borrow().redirects.is_empty());
}

#[test]
fn restore_discards_token_expiring_exactly_now() {
    let (mut session, _) = session_with(stored(&ada(), &token_expiring_at(NOW)));
    session.restore_at(NOW);
    assert!(session.token().is_none());
    assert!(session.store().is_empty());
}

#[test]
fn restore_discards_non_base64_token() {
    let (mut session, _) = session_with(stored(&ada(), "header.%%%%.signature"));
    session.restore_at(NOW);
    assert!(!session.is_loading());
    assert!(session.user().is_none());
    assert!(session.store().is_empty());
}

#[test]
fn restore_discards_token_without_three_segments() {
    let (mut session, _) = session_with(stored(&ada(), "not-a-jwt"));
    session.restore_at(NOW);
    assert!(session.token().is_none());
    assert!(session.store().is_empty());
}

#[test]
fn restore_discards_unreadable_user() {
    let store = MemoryStore::default()
        .with(USER_KEY, "{not json")
        .with(TOKEN_KEY, &token_expiring_at(NOW + 60.0));
    let (mut session, _) = session_with(store);
    session.restore_at(NOW);
    assert!(session.token().is_none());
    assert!(session.store().is_empty());
}

#[test]
fn restore_keeps_token_without_exp_but_it_is_not_valid() {
    let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"1"}"#);
    let token = format!("h.{payload}.s");
    let (mut session, _) = session_with(stored(&ada(), &token));
    session.restore_at(NOW);
    assert_eq!(session.token(), Some(token.as_str()));
    assert!(!session.is_valid_at(NOW));
}

#[test]
fn restore_runs_only_once() {
    let (mut session, _) = session_with(MemoryStore::default());
    session.restore_at(NOW);
    session.login(ada(), token_expiring_at(NOW + 60.0));
    session.restore_at(NOW);
    assert_eq!(session.user(), Some(&ada()));
}

// =============================================================
// login
// =============================================================

#[test]
fn login_persists_exact_user_and_token() {
    let token = token_expiring_at(NOW + 3600.0);
    let (mut session, _) = session_with(MemoryStore::default());
    session.restore_at(NOW);
    session.login(ada(), token.clone());

    let raw_user = session.store().read(USER_KEY).unwrap();
    assert_eq!(raw_user, serde_json::to_string(&ada()).unwrap());
    assert_eq!(serde_json::from_str::<User>(&raw_user).unwrap(), ada());
    assert_eq!(session.store().read(TOKEN_KEY), Some(token));
}

#[test]
fn login_does_not_check_expiry() {
    let token = token_expiring_at(NOW - 3600.0);
    let (mut session, _) = session_with(MemoryStore::default());
    session.login(ada(), token.clone());
    assert_eq!(session.token(), Some(token.as_str()));
    assert!(!session.is_valid_at(NOW));
}

#[test]
fn login_overwrites_previous_session() {
    let (mut session, _) = session_with(MemoryStore::default());
    session.login(ada(), "a.b.c".to_owned());
    session.login(User::named("bob"), "d.e.f".to_owned());
    assert_eq!(session.user().map(|u| u.username.as_str()), Some("bob"));
    assert_eq!(session.store().read(TOKEN_KEY).as_deref(), Some("d.e.f"));
}

#[test]
fn authorization_header_uses_bearer_scheme() {
    let (mut session, _) = session_with(MemoryStore::default());
    session.login(ada(), "a.b.c".to_owned());
    assert_eq!(session.authorization_header().as_deref(), Some("Bearer a.b.c"));
}

// =============================================================
// is_valid
// =============================================================

#[test]
fn is_valid_tracks_exp_relative_to_now() {
    let (mut session, _) = session_with(MemoryStore::default());
    session.login(ada(), token_expiring_at(NOW + 3600.0));
    assert!(session.is_valid_at(NOW));
    assert!(!session.is_valid_at(NOW + 3600.0));
    assert!(!session.is_valid_at(NOW + 7200.0));
}

#[test]
fn is_valid_against_system_clock() {
    let now = now_secs();
    let (mut session, _) = session_with(MemoryStore::default());
    session.login(ada(), token_expiring_at(now - 1.0));
    assert!(!session.is_valid());
    session.login(ada(), token_expiring_at(now + 3600.0));
    assert!(session.is_valid());
}

#[test]
fn is_valid_false_for_malformed_token() {
    let (mut session, _) = session_with(MemoryStore::default());
    session.login(ada(), "garbage".to_owned());
    assert!(!session.is_valid_at(NOW));
}

// =============================================================
// logout / end_session
// =============================================================

#[test]
fn logout_clears_memory_and_storage_and_redirects() {
    let (mut session, log) = session_with(MemoryStore::default());
    session.login(ada(), token_expiring_at(NOW + 60.0));
    session.logout();
    assert!(session.user().is_none());
    assert!(session.token().is_none());
    assert!(session.store().is_empty());
    assert_eq!(log.borrow().redirects, vec![LOGIN_PATH.to_owned()]);
}

#[test]
fn logout_on_login_page_does_not_redirect() {
    let (nav, log) = RecordingNavigator::at(LOGIN_PATH);
    let mut session = SessionManager::new(MemoryStore::default(), nav);
    session.login(ada(), "a.b.c".to_owned());
    session.logout();
    assert!(session.store().is_empty());
    assert!(log.borrow().redirects.is_empty());
}

#[test]
fn end_session_notifies_before_logout() {
    let (mut session, log) = session_with(MemoryStore::default());
    session.login(ada(), "a.b.c".to_owned());
    session.end_session("Your session has expired. Please log in again.");
    let log = log.borrow();
    assert_eq!(log.notices, vec!["Your session has expired. Please log in again.".to_owned()]);
    assert_eq!(log.redirects, vec![LOGIN_PATH.to_owned()]);
    assert!(session.user().is_none());
}

// =============================================================
// Stores
// =============================================================

#[test]
fn memory_store_round_trips_and_removes() {
    let mut store = MemoryStore::default();
    store.write("k", "v");
    assert_eq!(store.read("k").as_deref(), Some("v"));
    store.remove("k");
    assert!(store.read("k").is_none());
    assert!(store.is_empty());
}

#[cfg(not(feature = "hydrate"))]
#[test]
fn browser_store_is_inert_outside_the_browser() {
    let mut store = BrowserStore;
    store.write(TOKEN_KEY, "a.b.c");
    assert!(store.read(TOKEN_KEY).is_none());
    store.remove(TOKEN_KEY);
}

#[cfg(not(feature = "hydrate"))]
#[test]
fn browser_session_restores_to_empty_outside_the_browser() {
    let mut session = BrowserSession::new(BrowserStore, BrowserNavigator);
    session.restore();
    assert!(!session.is_loading());
    assert!(!session.is_valid());
    session.logout();
}
