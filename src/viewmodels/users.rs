//! Infinite user list: pages are fetched one after another and flattened.

use crate::api::{self, ApiClient, ApiError};
use crate::models::{Pagination, User};
use parking_lot::Mutex;
use std::sync::Arc;

pub const DEFAULT_PER_PAGE: u32 = 5;

/// Page to request after `last_page`, or `None` once the last page is in.
pub fn next_page_param(last_page: u32, pagination: &Pagination) -> Option<u32> {
    (last_page < pagination.total_pages).then(|| last_page + 1)
}

#[derive(Debug, Default)]
struct ListState {
    users: Vec<User>,
    /// Page number and pagination of the most recently loaded page.
    last: Option<(u32, Pagination)>,
    fetching: bool,
    fetching_next: bool,
}

pub struct UsersList {
    api: Arc<ApiClient>,
    per_page: u32,
    state: Mutex<ListState>,
}

impl UsersList {
    pub fn new(api: Arc<ApiClient>, per_page: u32) -> Self {
        Self {
            api,
            per_page: per_page.max(1),
            state: Mutex::new(ListState::default()),
        }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Every loaded user, in page order.
    pub fn users(&self) -> Vec<User> {
        self.state.lock().users.clone()
    }

    pub fn total(&self) -> Option<u64> {
        self.state.lock().last.map(|(_, p)| p.total)
    }

    /// True before the first page, and while more pages remain.
    pub fn has_next_page(&self) -> bool {
        match &self.state.lock().last {
            None => true,
            Some((page, pagination)) => next_page_param(*page, pagination).is_some(),
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.state.lock().fetching
    }

    pub fn is_fetching_next_page(&self) -> bool {
        self.state.lock().fetching_next
    }

    /// Load the next page (page 1 when nothing is loaded yet).
    ///
    /// Returns `Ok(false)` without a request when a fetch is already running
    /// or every page is loaded.
    pub async fn fetch_next_page(&self) -> Result<bool, ApiError> {
        let page = {
            let mut state = self.state.lock();
            if state.fetching {
                return Ok(false);
            }
            let page = match &state.last {
                None => 1,
                Some((last, pagination)) => match next_page_param(*last, pagination) {
                    Some(next) => next,
                    None => return Ok(false),
                },
            };
            state.fetching = true;
            state.fetching_next = page > 1;
            page
        };
        let _reset = scopeguard::guard((), |()| {
            let mut state = self.state.lock();
            state.fetching = false;
            state.fetching_next = false;
        });

        let response =
            api::user::get_all_users(&self.api, Some(page), Some(self.per_page)).await?;
        tracing::debug!(
            page,
            count = response.data.len(),
            total_pages = response.pagination.total_pages,
            "Loaded users page"
        );

        let mut state = self.state.lock();
        state.users.extend(response.data);
        state.last = Some((page, response.pagination));
        Ok(true)
    }

    /// Drop everything loaded and start again from page 1.
    pub async fn refresh(&self) -> Result<bool, ApiError> {
        {
            let mut state = self.state.lock();
            if state.fetching {
                return Ok(false);
            }
            state.users.clear();
            state.last = None;
        }
        self.fetch_next_page().await
    }
}
