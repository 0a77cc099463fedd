//! The single authority on "is the user logged in".
//!
//! ## Lifecycle
//! - `Initializing` until [`SessionController::restore_session`] finishes
//! - `Authenticated(user)` after a restore with a stored record or a login
//! - `Unauthenticated` after a restore without a record, a logout, or a
//!   forced logout raised by the HTTP client on 401/403
//!
//! Transitions that touch both storage and memory run under one async lock,
//! so the persisted record and the in-memory user never disagree. When a
//! forced logout and a login race, whichever commits last wins.

use super::state::{AuthState, SessionSnapshot};
use super::SessionError;
use crate::api::{self, ApiClient, AuthFailureListener, ListenerRegistration};
use crate::models::{Credentials, User};
use crate::router::{Navigator, Route};
use crate::storage::SessionStorage;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;

pub struct SessionController {
    api: Arc<ApiClient>,
    storage: SessionStorage,
    navigator: Arc<dyn Navigator>,
    min_loading: Duration,
    state: watch::Sender<SessionSnapshot>,
    /// Serializes storage+memory transitions.
    transition: Mutex<()>,
    /// Set when a forced logout lands while restoration is still running.
    restore_revoked: AtomicBool,
    registration: parking_lot::Mutex<Option<ListenerRegistration>>,
}

/// Bridges the HTTP client's failure signal to `force_logout`.
struct ForcedLogoutListener {
    controller: Weak<SessionController>,
}

#[async_trait]
impl AuthFailureListener for ForcedLogoutListener {
    async fn on_authentication_failed(&self) {
        if let Some(controller) = self.controller.upgrade() {
            controller.force_logout().await;
        }
    }
}

impl SessionController {
    /// Create the controller and register it as the API client's
    /// authentication-failure listener for as long as it lives.
    pub fn new(
        api: Arc<ApiClient>,
        storage: SessionStorage,
        navigator: Arc<dyn Navigator>,
        min_loading: Duration,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Arc::new_cyclic(|weak| {
            let listener = Arc::new(ForcedLogoutListener {
                controller: weak.clone(),
            });
            let registration = api.auth_failure_hook().register(listener);
            Self {
                api,
                storage,
                navigator,
                min_loading,
                state,
                transition: Mutex::new(()),
                restore_revoked: AtomicBool::new(false),
                registration: parking_lot::Mutex::new(Some(registration)),
            }
        })
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().state.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn login_in_progress(&self) -> bool {
        self.state.borrow().login_in_progress
    }

    /// Observe every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Whether the controller still receives the HTTP failure signal.
    pub fn is_listening(&self) -> bool {
        self.registration.lock().is_some()
    }

    /// Stop listening for authentication failures. Dropping the controller
    /// does the same.
    pub fn shutdown(&self) {
        if self.registration.lock().take().is_some() {
            tracing::debug!("Session controller detached from API client");
        }
    }

    // ── Restoration ─────────────────────────────────────────────

    /// Rebuild the session from local storage without contacting the server.
    ///
    /// Holds the `Initializing` state for at least the configured minimum
    /// loading time. Only the first call does any work.
    pub async fn restore_session(&self) -> AuthState {
        if !self.state.borrow().state.is_loading() {
            return self.state();
        }

        let started = Instant::now();
        let restored = match self.storage.get_user_data().await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                self.clear_storage("restore").await;
                None
            }
            Err(e) => {
                tracing::warn!("Failed to read persisted session, starting signed out: {e}");
                self.clear_storage("restore").await;
                None
            }
        };

        let elapsed = started.elapsed();
        if elapsed < self.min_loading {
            tokio::time::sleep(self.min_loading - elapsed).await;
        }

        let _guard = self.transition.lock().await;
        let revoked = self.restore_revoked.swap(false, Ordering::SeqCst);
        let next = match restored {
            Some(user) if !revoked => AuthState::Authenticated(user),
            _ => AuthState::Unauthenticated,
        };

        let applied = self.state.send_if_modified(|snap| {
            if snap.state.is_loading() {
                snap.state = next.clone();
                true
            } else {
                false
            }
        });
        if applied {
            tracing::info!(state = next.name(), revoked, "Session restored");
        }
        self.state()
    }

    // ── Login / logout ──────────────────────────────────────────

    /// Authenticate, persist the returned user and adopt it.
    ///
    /// Failures leave the auth state and storage untouched. The
    /// login-in-progress flag is cleared however this returns.
    pub async fn login(&self, credentials: Credentials) -> Result<User, SessionError> {
        self.set_login_in_progress(true);
        let _reset = scopeguard::guard((), |()| self.set_login_in_progress(false));

        let response = api::auth::login(&self.api, &credentials).await?;
        drop(credentials);
        let user = response.data;

        let _guard = self.transition.lock().await;
        self.storage.set_user_data(&user).await?;
        self.state
            .send_modify(|snap| snap.state = AuthState::Authenticated(user.clone()));

        tracing::info!(user_id = user.id, expires_in = response.expires_in, "Logged in");
        Ok(user)
    }

    /// User-initiated logout. Always ends signed out on the login screen,
    /// even when clearing storage fails.
    pub async fn logout(&self) {
        let _guard = self.transition.lock().await;
        self.clear_storage("logout").await;
        self.state
            .send_modify(|snap| snap.state = AuthState::Unauthenticated);
        self.navigator.replace(Route::Login);
        tracing::info!("Logged out");
    }

    /// Logout raised by the HTTP layer after the server rejected the session.
    ///
    /// No-op when already signed out, so concurrent 401s redirect once.
    /// During restoration it clears storage and makes the pending restore
    /// resolve to `Unauthenticated`.
    pub async fn force_logout(&self) {
        let _guard = self.transition.lock().await;
        let (loading, authenticated) = {
            let snap = self.state.borrow();
            (snap.state.is_loading(), snap.state.is_authenticated())
        };

        if loading {
            self.restore_revoked.store(true, Ordering::SeqCst);
            self.clear_storage("forced logout").await;
            tracing::info!("Session revoked during restoration");
            return;
        }
        if !authenticated {
            tracing::debug!("Forced logout ignored: already signed out");
            return;
        }

        self.clear_storage("forced logout").await;
        self.state
            .send_modify(|snap| snap.state = AuthState::Unauthenticated);
        self.navigator.replace(Route::Login);
        tracing::info!("Session expired, forced logout");
    }

    // ── Profile ─────────────────────────────────────────────────

    /// Replace the signed-in user wholesale (persisted and in memory).
    pub async fn replace_user(&self, user: User) -> Result<(), SessionError> {
        let _guard = self.transition.lock().await;
        if !self.state.borrow().state.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        self.storage.set_user_data(&user).await?;
        self.state
            .send_modify(|snap| snap.state = AuthState::Authenticated(user));
        Ok(())
    }

    /// Re-fetch the signed-in user from the server and adopt the result.
    pub async fn refresh_profile(&self) -> Result<User, SessionError> {
        let id = self.user().ok_or(SessionError::NotAuthenticated)?.id;
        let fresh = api::user::get_user_by_id(&self.api, id).await?.data;
        self.replace_user(fresh.clone()).await?;
        tracing::debug!(user_id = id, "Profile refreshed");
        Ok(fresh)
    }

    // ── Helpers ─────────────────────────────────────────────────

    fn set_login_in_progress(&self, in_progress: bool) {
        self.state.send_if_modified(|snap| {
            let changed = snap.login_in_progress != in_progress;
            snap.login_in_progress = in_progress;
            changed
        });
    }

    /// Clear persisted auth data; failures are logged and swallowed.
    async fn clear_storage(&self, during: &str) {
        if let Err(e) = self.storage.clear_auth_data().await {
            tracing::warn!(during, "Failed to clear persisted session: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::router::HistoryNavigator;
    use crate::storage::{KeyValueStore, MemoryStore, StorageError, USER_DATA_KEY};
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn alice() -> User {
        User {
            id: 1,
            username: "alice".into(),
            email: Some("alice@example.com".into()),
            is_active: true,
            is_admin: false,
            last_login_at: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    fn closed_port_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    fn user_json(user: &User) -> serde_json::Value {
        serde_json::to_value(user).unwrap()
    }

    /// Store whose writes and removals can be made to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
        fail_removes: AtomicBool,
    }

    fn io_error() -> StorageError {
        StorageError::Io(std::io::Error::other("disk unavailable"))
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(io_error());
            }
            self.inner.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(io_error());
            }
            self.inner.set_item(key, value).await
        }

        async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            if self.fail_removes.load(Ordering::SeqCst) {
                return Err(io_error());
            }
            self.inner.remove_item(key).await
        }
    }

    /// Store whose reads take a fixed time.
    struct SlowStore {
        inner: MemoryStore,
        delay: Duration,
    }

    #[async_trait]
    impl KeyValueStore for SlowStore {
        async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            tokio::time::sleep(self.delay).await;
            self.inner.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set_item(key, value).await
        }

        async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove_item(key).await
        }
    }

    struct Harness {
        controller: Arc<SessionController>,
        store: Arc<FlakyStore>,
        navigator: Arc<HistoryNavigator>,
    }

    impl Harness {
        fn new(base_url: &str) -> Self {
            Self::with_min_loading(base_url, Duration::ZERO)
        }

        fn with_min_loading(base_url: &str, min_loading: Duration) -> Self {
            let api = Arc::new(
                ApiClient::new(&ApiConfig {
                    base_url: base_url.to_string(),
                    timeout_secs: 5,
                })
                .unwrap(),
            );
            let store = Arc::new(FlakyStore::default());
            let navigator = Arc::new(HistoryNavigator::default());
            let controller = SessionController::new(
                api,
                SessionStorage::new(store.clone()),
                navigator.clone(),
                min_loading,
            );
            Self {
                controller,
                store,
                navigator,
            }
        }

        async fn persisted(&self) -> Option<String> {
            self.store.inner.get_item(USER_DATA_KEY).await.unwrap()
        }

        async fn seed(&self, user: &User) {
            self.store
                .inner
                .set_item(USER_DATA_KEY, &serde_json::to_string(user).unwrap())
                .await
                .unwrap();
        }
    }

    async fn mount_login_ok(server: &MockServer, user: &User) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": user_json(user),
                "expiresIn": 3600
            })))
            .mount(server)
            .await;
    }

    // ── Restoration ─────────────────────────────────────────────

    #[tokio::test]
    async fn starts_initializing_and_listening() {
        let h = Harness::new(&closed_port_url());
        assert_eq!(h.controller.state(), AuthState::Initializing);
        assert!(h.controller.snapshot().loading());
        assert!(h.controller.is_listening());
        assert!(h.controller.api().auth_failure_hook().is_registered());
    }

    #[tokio::test]
    async fn restore_with_stored_user_authenticates() {
        let h = Harness::new(&closed_port_url());
        h.seed(&alice()).await;

        let state = h.controller.restore_session().await;
        assert_eq!(state, AuthState::Authenticated(alice()));
        assert!(!h.controller.snapshot().loading());
    }

    #[tokio::test]
    async fn restore_without_record_is_unauthenticated() {
        let h = Harness::new(&closed_port_url());
        let state = h.controller.restore_session().await;
        assert_eq!(state, AuthState::Unauthenticated);
        assert!(!h.controller.snapshot().loading());
    }

    #[tokio::test]
    async fn restore_with_unparsable_record_clears_it() {
        let h = Harness::new(&closed_port_url());
        h.store
            .inner
            .set_item(USER_DATA_KEY, "definitely not a user")
            .await
            .unwrap();

        assert_eq!(h.controller.restore_session().await, AuthState::Unauthenticated);
        assert!(h.persisted().await.is_none());
    }

    #[tokio::test]
    async fn restore_read_failure_fails_open() {
        let h = Harness::new(&closed_port_url());
        h.seed(&alice()).await;
        h.store.fail_reads.store(true, Ordering::SeqCst);

        assert_eq!(h.controller.restore_session().await, AuthState::Unauthenticated);
        assert!(h.persisted().await.is_none());
    }

    #[tokio::test]
    async fn restore_runs_once() {
        let h = Harness::new(&closed_port_url());
        h.controller.restore_session().await;
        h.seed(&alice()).await;

        assert_eq!(h.controller.restore_session().await, AuthState::Unauthenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn restore_holds_loading_for_the_floor() {
        let h = Harness::with_min_loading(&closed_port_url(), Duration::from_millis(400));
        h.seed(&alice()).await;
        let mut rx = h.controller.subscribe();

        let started = Instant::now();
        let controller = h.controller.clone();
        let task = tokio::spawn(async move { controller.restore_session().await });

        rx.changed().await.unwrap();
        assert!(!rx.borrow().loading());
        assert!(started.elapsed() >= Duration::from_millis(400));

        task.await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(450));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_check_adds_no_extra_delay() {
        let api = Arc::new(
            ApiClient::new(&ApiConfig {
                base_url: closed_port_url(),
                timeout_secs: 5,
            })
            .unwrap(),
        );
        let store = Arc::new(SlowStore {
            inner: MemoryStore::new(),
            delay: Duration::from_millis(600),
        });
        let controller = SessionController::new(
            api,
            SessionStorage::new(store),
            Arc::new(HistoryNavigator::default()),
            Duration::from_millis(400),
        );

        let started = Instant::now();
        controller.restore_session().await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(600));
        assert!(elapsed < Duration::from_millis(650));
    }

    // ── Login ───────────────────────────────────────────────────

    #[tokio::test]
    async fn login_persists_and_adopts_user() {
        let server = MockServer::start().await;
        mount_login_ok(&server, &alice()).await;
        let h = Harness::new(&server.uri());
        h.controller.restore_session().await;

        let user = h
            .controller
            .login(Credentials::new("alice", "secret"))
            .await
            .unwrap();
        assert_eq!(user, alice());
        assert_eq!(h.controller.state(), AuthState::Authenticated(alice()));
        assert!(!h.controller.login_in_progress());

        let stored: User = serde_json::from_str(&h.persisted().await.unwrap()).unwrap();
        assert_eq!(stored, alice());
    }

    #[tokio::test]
    async fn login_flag_is_set_while_in_flight() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(200))
                    .set_body_json(serde_json::json!({"data": user_json(&alice()), "expiresIn": 60})),
            )
            .mount(&server)
            .await;
        let h = Harness::new(&server.uri());
        h.controller.restore_session().await;
        let mut rx = h.controller.subscribe();

        let controller = h.controller.clone();
        let task =
            tokio::spawn(async move { controller.login(Credentials::new("alice", "pw")).await });

        rx.changed().await.unwrap();
        assert!(rx.borrow().login_in_progress);

        task.await.unwrap().unwrap();
        assert!(!h.controller.login_in_progress());
    }

    #[tokio::test]
    async fn wrong_password_leaves_state_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"message": "Invalid credentials"})),
            )
            .mount(&server)
            .await;
        let h = Harness::new(&server.uri());
        h.controller.restore_session().await;

        let err = h
            .controller
            .login(Credentials::new("alice", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid credentials");
        assert_eq!(h.controller.state(), AuthState::Unauthenticated);
        assert!(!h.controller.login_in_progress());
        assert!(h.persisted().await.is_none());
        // Login 401s are not session expiries.
        assert!(h.navigator.replaced().is_empty());
    }

    #[tokio::test]
    async fn network_failure_on_login_leaves_state_untouched() {
        let h = Harness::new(&closed_port_url());
        h.controller.restore_session().await;

        let err = h
            .controller
            .login(Credentials::new("alice", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Api(_)));
        assert_eq!(h.controller.state(), AuthState::Unauthenticated);
        assert!(!h.controller.login_in_progress());
    }

    #[tokio::test]
    async fn storage_failure_on_login_is_reported() {
        let server = MockServer::start().await;
        mount_login_ok(&server, &alice()).await;
        let h = Harness::new(&server.uri());
        h.controller.restore_session().await;
        h.store.fail_writes.store(true, Ordering::SeqCst);

        let err = h
            .controller
            .login(Credentials::new("alice", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert_eq!(h.controller.state(), AuthState::Unauthenticated);
        assert!(!h.controller.login_in_progress());
    }

    // ── Logout ──────────────────────────────────────────────────

    #[tokio::test]
    async fn logout_clears_everything_and_redirects() {
        let h = Harness::new(&closed_port_url());
        h.seed(&alice()).await;
        h.controller.restore_session().await;

        h.controller.logout().await;
        assert_eq!(h.controller.state(), AuthState::Unauthenticated);
        assert!(h.persisted().await.is_none());
        assert_eq!(h.navigator.current(), Route::Login);
    }

    #[tokio::test]
    async fn logout_survives_storage_failure() {
        let h = Harness::new(&closed_port_url());
        h.seed(&alice()).await;
        h.controller.restore_session().await;
        h.store.fail_removes.store(true, Ordering::SeqCst);

        h.controller.logout().await;
        assert_eq!(h.controller.state(), AuthState::Unauthenticated);
        assert_eq!(h.navigator.current(), Route::Login);
    }

    #[tokio::test]
    async fn force_logout_survives_storage_failure() {
        let h = Harness::new(&closed_port_url());
        h.seed(&alice()).await;
        h.controller.restore_session().await;
        h.store.fail_removes.store(true, Ordering::SeqCst);

        h.controller.force_logout().await;
        assert_eq!(h.controller.state(), AuthState::Unauthenticated);
        assert_eq!(h.navigator.replaced(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn force_logout_is_idempotent() {
        let h = Harness::new(&closed_port_url());
        h.seed(&alice()).await;
        h.controller.restore_session().await;

        h.controller.force_logout().await;
        let after_first = h.controller.snapshot();
        h.controller.force_logout().await;

        assert_eq!(h.controller.snapshot(), after_first);
        assert_eq!(h.navigator.replaced(), vec![Route::Login]);
        assert!(h.persisted().await.is_none());
    }

    #[tokio::test]
    async fn force_logout_when_signed_out_is_noop() {
        let h = Harness::new(&closed_port_url());
        h.controller.restore_session().await;

        h.controller.force_logout().await;
        assert_eq!(h.controller.state(), AuthState::Unauthenticated);
        assert!(h.navigator.replaced().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn force_logout_during_restore_revokes_it() {
        let h = Harness::with_min_loading(&closed_port_url(), Duration::from_millis(400));
        h.seed(&alice()).await;

        let controller = h.controller.clone();
        let task = tokio::spawn(async move { controller.restore_session().await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.controller.force_logout().await;

        assert_eq!(task.await.unwrap(), AuthState::Unauthenticated);
        assert!(h.persisted().await.is_none());
    }

    // ── HTTP failure signal ─────────────────────────────────────

    #[tokio::test]
    async fn unauthorized_request_forces_logout_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(serde_json::json!({"message": "Token expired"})),
            )
            .mount(&server)
            .await;
        let h = Harness::new(&server.uri());
        h.seed(&alice()).await;
        h.controller.restore_session().await;
        assert!(h.controller.state().is_authenticated());

        let api = h.controller.api().clone();
        let first = api::user::get_all_users(&api, Some(1), Some(5)).await;
        let second = api::user::get_all_users(&api, Some(2), Some(5)).await;

        assert_eq!(first.unwrap_err().message(), "Token expired");
        assert!(second.is_err());
        assert_eq!(h.controller.state(), AuthState::Unauthenticated);
        assert!(h.persisted().await.is_none());
        assert_eq!(h.navigator.replaced(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn login_after_forced_logout_wins() {
        let server = MockServer::start().await;
        mount_login_ok(&server, &alice()).await;
        let h = Harness::new(&server.uri());
        h.seed(&alice()).await;
        h.controller.restore_session().await;

        h.controller.force_logout().await;
        h.controller
            .login(Credentials::new("alice", "pw"))
            .await
            .unwrap();

        assert_eq!(h.controller.state(), AuthState::Authenticated(alice()));
        assert!(h.persisted().await.is_some());
    }

    fn bob() -> User {
        User {
            id: 2,
            username: "bob".into(),
            email: None,
            ..alice()
        }
    }

    async fn mount_slow_login(server: &MockServer, user: &User, delay: Duration) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(delay)
                    .set_body_json(serde_json::json!({"data": user_json(user), "expiresIn": 3600})),
            )
            .mount(server)
            .await;
    }

    /// Persisted record and in-memory user must describe the same session.
    async fn assert_storage_matches_memory(h: &Harness) {
        let stored: Option<User> = h
            .persisted()
            .await
            .map(|raw| serde_json::from_str(&raw).unwrap());
        assert_eq!(stored, h.controller.user());
    }

    #[tokio::test]
    async fn forced_logout_during_inflight_login_is_overtaken() {
        let server = MockServer::start().await;
        mount_slow_login(&server, &bob(), Duration::from_millis(300)).await;
        let h = Harness::new(&server.uri());
        h.seed(&alice()).await;
        h.controller.restore_session().await;
        let mut rx = h.controller.subscribe();

        let controller = h.controller.clone();
        let login =
            tokio::spawn(async move { controller.login(Credentials::new("bob", "pw")).await });
        rx.wait_for(|snap| snap.login_in_progress).await.unwrap();

        h.controller.force_logout().await;
        assert_eq!(h.controller.state(), AuthState::Unauthenticated);
        assert_storage_matches_memory(&h).await;

        login.await.unwrap().unwrap();
        assert_eq!(h.controller.state(), AuthState::Authenticated(bob()));
        assert_storage_matches_memory(&h).await;
        assert_eq!(h.navigator.replaced(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn rejection_committing_after_concurrent_login_signs_out() {
        let server = MockServer::start().await;
        mount_slow_login(&server, &bob(), Duration::from_millis(100)).await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_delay(Duration::from_millis(400))
                    .set_body_json(serde_json::json!({"message": "Token expired"})),
            )
            .mount(&server)
            .await;
        let h = Harness::new(&server.uri());
        h.controller.restore_session().await;

        let api = h.controller.api().clone();
        let (login, listing) = tokio::join!(
            h.controller.login(Credentials::new("bob", "pw")),
            api::user::get_all_users(&api, Some(1), Some(5)),
        );

        assert_eq!(login.unwrap(), bob());
        assert!(listing.is_err());
        assert_eq!(h.controller.state(), AuthState::Unauthenticated);
        assert_storage_matches_memory(&h).await;
        assert!(h.persisted().await.is_none());
    }

    #[tokio::test]
    async fn restore_over_corrupt_file_store_clears_it() {
        use crate::storage::FileStore;
        use tempfile::TempDir;

        let tmp = TempDir::new().unwrap();
        let store = Arc::new(FileStore::new(tmp.path()));
        std::fs::write(store.path(), "{\"@base_app_user_data\": \"{\\\"id\\\":1").unwrap();

        let controller = SessionController::new(
            Arc::new(
                ApiClient::new(&ApiConfig {
                    base_url: closed_port_url(),
                    timeout_secs: 5,
                })
                .unwrap(),
            ),
            SessionStorage::new(store.clone()),
            Arc::new(HistoryNavigator::default()),
            Duration::ZERO,
        );

        assert_eq!(controller.restore_session().await, AuthState::Unauthenticated);
        assert!(store.get_item(USER_DATA_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn shutdown_detaches_listener() {
        let h = Harness::new(&closed_port_url());
        h.controller.shutdown();
        assert!(!h.controller.is_listening());
        assert!(!h.controller.api().auth_failure_hook().is_registered());
    }

    #[tokio::test]
    async fn dropping_controller_detaches_listener() {
        let h = Harness::new(&closed_port_url());
        let api = h.controller.api().clone();
        drop(h);
        assert!(!api.auth_failure_hook().is_registered());
    }

    // ── Profile ─────────────────────────────────────────────────

    #[tokio::test]
    async fn refresh_profile_replaces_user() {
        let server = MockServer::start().await;
        let mut updated = alice();
        updated.email = Some("alice@new.example.com".into());
        updated.is_admin = true;
        Mock::given(method("GET"))
            .and(path("/user/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": user_json(&updated)})),
            )
            .mount(&server)
            .await;
        let h = Harness::new(&server.uri());
        h.seed(&alice()).await;
        h.controller.restore_session().await;

        let fresh = h.controller.refresh_profile().await.unwrap();
        assert_eq!(fresh, updated);
        assert_eq!(h.controller.user(), Some(updated.clone()));
        let stored: User = serde_json::from_str(&h.persisted().await.unwrap()).unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn replace_user_requires_session() {
        let h = Harness::new(&closed_port_url());
        h.controller.restore_session().await;
        let err = h.controller.replace_user(alice()).await.unwrap_err();
        assert!(matches!(err, SessionError::NotAuthenticated));
        assert!(h.persisted().await.is_none());
    }
}
