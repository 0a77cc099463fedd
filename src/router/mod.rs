//! Routes, the auth guard and navigation items.
//!
//! Routing is pure derivation from [`AuthState`]: the guard never performs
//! I/O, and `Initializing` always defers the decision.

pub mod nav;

pub use nav::{active_item_key, sidebar_items, tab_items, MatchMode, NavItem};

use crate::session::AuthState;
use parking_lot::Mutex;

/// Screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Home,
    Users,
    Profile,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/(auth)/Login",
            Self::Home => "/",
            Self::Users => "/users",
            Self::Profile => "/profile",
        }
    }

    pub fn requires_auth(self) -> bool {
        !matches!(self, Self::Login)
    }

    /// Resolve a pathname (route groups allowed) to a known route.
    pub fn from_path(path: &str) -> Option<Self> {
        match normalize_route(Some(path)).as_str() {
            "/" => Some(Self::Home),
            "/users" => Some(Self::Users),
            "/profile" => Some(Self::Profile),
            p if p.eq_ignore_ascii_case("/login") => Some(Self::Login),
            _ => None,
        }
    }
}

/// Strip `(group)` segments, collapse repeated slashes and drop a trailing
/// slash. Empty or absent input normalizes to `/`.
pub fn normalize_route(route: Option<&str>) -> String {
    let Some(route) = route.filter(|r| !r.is_empty()) else {
        return "/".to_string();
    };

    let segments: Vec<&str> = route
        .split('/')
        .filter(|s| !s.is_empty())
        .filter(|s| !(s.starts_with('(') && s.ends_with(')')))
        .collect();

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Outcome of guarding a navigation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session restoration still running; show the loading indicator.
    Pending,
    Redirect(Route),
    Render(Route),
}

pub fn guard(state: &AuthState, target: Route) -> GuardDecision {
    match state {
        AuthState::Initializing => GuardDecision::Pending,
        AuthState::Unauthenticated if target.requires_auth() => {
            GuardDecision::Redirect(Route::Login)
        }
        AuthState::Authenticated(_) if target == Route::Login => {
            GuardDecision::Redirect(Route::Home)
        }
        _ => GuardDecision::Render(target),
    }
}

/// Screen navigation side of the UI.
pub trait Navigator: Send + Sync {
    /// Replace the current screen (no back entry).
    fn replace(&self, route: Route);

    fn push(&self, route: Route);

    fn current(&self) -> Route;
}

/// In-memory navigation stack.
pub struct HistoryNavigator {
    stack: Mutex<Vec<Route>>,
    replaces: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    pub fn new(initial: Route) -> Self {
        Self {
            stack: Mutex::new(vec![initial]),
            replaces: Mutex::new(Vec::new()),
        }
    }

    /// Pop back one screen. Returns false at the root.
    pub fn back(&self) -> bool {
        let mut stack = self.stack.lock();
        if stack.len() > 1 {
            stack.pop();
            true
        } else {
            false
        }
    }

    /// Every `replace` target so far, oldest first.
    pub fn replaced(&self) -> Vec<Route> {
        self.replaces.lock().clone()
    }

    pub fn depth(&self) -> usize {
        self.stack.lock().len()
    }
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new(Route::Home)
    }
}

impl Navigator for HistoryNavigator {
    fn replace(&self, route: Route) {
        let mut stack = self.stack.lock();
        stack.clear();
        stack.push(route);
        self.replaces.lock().push(route);
        tracing::debug!(path = route.path(), "Navigation replaced");
    }

    fn push(&self, route: Route) {
        self.stack.lock().push(route);
    }

    fn current(&self) -> Route {
        self.stack.lock().last().copied().unwrap_or(Route::Home)
    }
}
