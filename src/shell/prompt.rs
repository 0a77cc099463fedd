//! Blocking `dialoguer` prompts moved off the async runtime.

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};

pub async fn select(prompt: &str, items: Vec<String>) -> Result<usize> {
    let prompt = prompt.to_string();
    let picked = tokio::task::spawn_blocking(move || {
        let theme = ColorfulTheme::default();
        let mut select = Select::with_theme(&theme).items(&items).default(0);
        if !prompt.is_empty() {
            select = select.with_prompt(prompt);
        }
        select.interact()
    })
    .await??;
    Ok(picked)
}

pub async fn input(prompt: &str, initial: &str) -> Result<String> {
    let prompt = prompt.to_string();
    let initial = initial.to_string();
    let value = tokio::task::spawn_blocking(move || {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .with_initial_text(initial)
            .allow_empty(true)
            .interact_text()
    })
    .await??;
    Ok(value)
}

pub async fn password(prompt: &str) -> Result<String> {
    let prompt = prompt.to_string();
    let value = tokio::task::spawn_blocking(move || {
        Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
    })
    .await??;
    Ok(value)
}

pub async fn confirm(prompt: &str) -> Result<bool> {
    let prompt = prompt.to_string();
    let yes = tokio::task::spawn_blocking(move || {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
    })
    .await??;
    Ok(yes)
}
