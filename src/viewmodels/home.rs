//! Home screen: greeting and a short summary of the signed-in user.

use super::profile::{DetailRow, NOT_PROVIDED};
use crate::models::User;

pub fn greeting(user: Option<&User>) -> String {
    match user {
        Some(user) => format!("Welcome, {}!", user.username),
        None => "Welcome!".to_string(),
    }
}

pub fn summary(user: &User) -> Vec<DetailRow> {
    let yes_no = |flag: bool| if flag { "Yes" } else { "No" };
    vec![
        DetailRow {
            label: "ID",
            value: user.id.to_string(),
        },
        DetailRow {
            label: "Username",
            value: user.username.clone(),
        },
        DetailRow {
            label: "E-mail",
            value: user.email.clone().unwrap_or_else(|| NOT_PROVIDED.to_string()),
        },
        DetailRow {
            label: "Admin",
            value: yes_no(user.is_admin).to_string(),
        },
        DetailRow {
            label: "Status",
            value: if user.is_active { "Active" } else { "Inactive" }.to_string(),
        },
    ]
}
