//! Tab bar and sidebar entries of the authenticated shell.

use super::{normalize_route, Route};
use crate::models::User;

/// How a tab decides it is active for the current pathname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Exact,
    StartsWith,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub key: &'static str,
    pub label: &'static str,
    pub route: Route,
    pub match_mode: MatchMode,
    pub admin_only: bool,
}

impl NavItem {
    const fn new(key: &'static str, label: &'static str, route: Route, match_mode: MatchMode) -> Self {
        Self {
            key,
            label,
            route,
            match_mode,
            admin_only: false,
        }
    }

    /// Admin-only entries are visible to admins alone.
    pub fn visible_to(&self, user: Option<&User>) -> bool {
        !self.admin_only || user.is_some_and(|u| u.is_admin)
    }

    /// Tab-bar rule: exact or prefix match on the raw pathname.
    pub fn matches_tab(&self, pathname: &str) -> bool {
        match self.match_mode {
            MatchMode::StartsWith => pathname.starts_with(self.route.path()),
            MatchMode::Exact => pathname == self.route.path(),
        }
    }

    /// Sidebar rule: home only on `/`, others on their path or any subpath.
    pub fn matches_sidebar(&self, pathname: &str) -> bool {
        let current = normalize_route(Some(pathname));
        let href = normalize_route(Some(self.route.path()));
        if self.route == Route::Home {
            return current == "/";
        }
        current == href || current.starts_with(&format!("{href}/"))
    }
}

/// Bottom tab bar entries (mobile layout).
pub fn tab_items() -> Vec<NavItem> {
    vec![
        NavItem::new("index", "Home", Route::Home, MatchMode::Exact),
        NavItem::new("users", "Users", Route::Users, MatchMode::StartsWith),
        NavItem::new("profile", "Profile", Route::Profile, MatchMode::StartsWith),
    ]
}

/// Sidebar entries (wide layout). Admin-only entries are hidden from
/// non-admins.
pub fn sidebar_items(user: Option<&User>) -> Vec<NavItem> {
    [
        NavItem::new("home", "Home", Route::Home, MatchMode::Exact),
        NavItem::new("users", "Users", Route::Users, MatchMode::StartsWith),
        NavItem::new("profile", "Profile", Route::Profile, MatchMode::StartsWith),
    ]
    .into_iter()
    .filter(|item| item.visible_to(user))
    .collect()
}

/// Key of the first tab matching `pathname`, if any.
pub fn active_item_key(pathname: Option<&str>, items: &[NavItem]) -> Option<&'static str> {
    let pathname = pathname?;
    items
        .iter()
        .find(|item| item.matches_tab(pathname))
        .map(|item| item.key)
}
