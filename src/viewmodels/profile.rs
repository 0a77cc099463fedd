//! Profile screen: the signed-in user's details plus theme and logout
//! actions.

use crate::models::User;
use crate::session::SessionController;
use crate::theme::{ThemeController, ThemeMode};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;
use std::sync::Arc;

pub const NOT_PROVIDED: &str = "Not provided";

/// One labelled line of the details card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
}

impl DetailRow {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// Medium date with short time in `tz`, e.g. `Jan 2, 2024, 3:04 PM`.
pub fn format_date<Tz>(date: Option<&DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match date {
        Some(date) => date
            .with_timezone(tz)
            .format("%b %-d, %Y, %-I:%M %p")
            .to_string(),
        None => NOT_PROVIDED.to_string(),
    }
}

pub fn user_details<Tz>(user: Option<&User>, tz: &Tz) -> Vec<DetailRow>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let active = user.is_some_and(|u| u.is_active);
    let admin = user.is_some_and(|u| u.is_admin);
    vec![
        DetailRow::new(
            "Username",
            user.map_or(NOT_PROVIDED, |u| u.username.as_str()),
        ),
        DetailRow::new(
            "E-mail",
            user.and_then(|u| u.email.as_deref()).unwrap_or(NOT_PROVIDED),
        ),
        DetailRow::new("Status", if active { "Active" } else { "Inactive" }),
        DetailRow::new("Role", if admin { "Administrator" } else { "User" }),
        DetailRow::new(
            "Last access",
            format_date(user.and_then(|u| u.last_login_at.as_ref()), tz),
        ),
        DetailRow::new(
            "Account created",
            format_date(user.map(|u| &u.created_at), tz),
        ),
    ]
}

pub struct ProfileModel {
    session: Arc<SessionController>,
    theme: Arc<ThemeController>,
}

impl ProfileModel {
    pub fn new(session: Arc<SessionController>, theme: Arc<ThemeController>) -> Self {
        Self { session, theme }
    }

    pub fn details<Tz>(&self, tz: &Tz) -> Vec<DetailRow>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        user_details(self.session.user().as_ref(), tz)
    }

    pub fn is_dark(&self) -> bool {
        self.theme.is_dark()
    }

    pub async fn toggle_theme(&self) -> ThemeMode {
        self.theme.toggle().await
    }

    pub async fn logout(&self) {
        self.session.logout().await;
    }
}
