//! Interactive terminal front-end.
//!
//! Every iteration asks the route guard what to show for the navigator's
//! current route, then renders that screen. Screens move around by pushing
//! or replacing routes; logouts (explicit or forced) replace the stack with
//! the login screen from inside the session controller.

mod prompt;

use anyhow::Result;
use baseapp::router::{self, GuardDecision, HistoryNavigator, Navigator, Route};
use baseapp::session::{AuthState, SessionController};
use baseapp::theme::ThemeController;
use baseapp::viewmodels::home;
use baseapp::viewmodels::{
    DetailRow, LoginField, LoginForm, ProfileModel, SubmitError, UsersList,
};
use chrono::Local;
use console::{style, Style, Term};
use std::sync::Arc;

enum Flow {
    Continue,
    Quit,
}

/// Entries of the authenticated menu besides plain navigation.
enum MenuAction {
    Go(Route),
    Logout,
    Quit,
}

pub struct Shell {
    session: Arc<SessionController>,
    theme: Arc<ThemeController>,
    navigator: Arc<HistoryNavigator>,
    per_page: u32,
    users: Option<UsersList>,
    term: Term,
}

impl Shell {
    pub fn new(
        session: Arc<SessionController>,
        theme: Arc<ThemeController>,
        navigator: Arc<HistoryNavigator>,
        per_page: u32,
    ) -> Self {
        Self {
            session,
            theme,
            navigator,
            per_page,
            users: None,
            term: Term::stdout(),
        }
    }

    pub async fn run(mut self) -> Result<()> {
        self.theme.init().await;
        self.term.write_line(&style("Loading...").dim().to_string())?;
        self.session.restore_session().await;

        loop {
            let target = self.navigator.current();
            let flow = match router::guard(&self.session.state(), target) {
                GuardDecision::Pending => {
                    let mut rx = self.session.subscribe();
                    rx.wait_for(|snap| !snap.loading()).await?;
                    Flow::Continue
                }
                GuardDecision::Redirect(route) => {
                    tracing::debug!(from = target.path(), to = route.path(), "Route guard redirect");
                    self.navigator.replace(route);
                    Flow::Continue
                }
                GuardDecision::Render(route) => self.render(route).await?,
            };
            if let Flow::Quit = flow {
                break;
            }
        }

        self.session.shutdown();
        self.term.write_line("Bye.")?;
        Ok(())
    }

    async fn render(&mut self, route: Route) -> Result<Flow> {
        self.term.write_line("")?;
        match route {
            Route::Login => self.login_screen().await,
            Route::Home => self.home_screen().await,
            Route::Users => self.users_screen().await,
            Route::Profile => self.profile_screen().await,
        }
    }

    fn accent(&self) -> Style {
        if self.theme.is_dark() {
            Style::new().cyan().bold()
        } else {
            Style::new().blue().bold()
        }
    }

    fn heading(&self, text: &str) -> Result<()> {
        self.term
            .write_line(&self.accent().apply_to(text).to_string())?;
        Ok(())
    }

    fn print_rows(&self, rows: &[DetailRow]) -> Result<()> {
        let width = rows.iter().map(|r| r.label.len()).max().unwrap_or(0);
        for row in rows {
            self.term.write_line(&format!(
                "  {:<width$}  {}",
                style(row.label).dim(),
                row.value
            ))?;
        }
        Ok(())
    }

    // ── Login ───────────────────────────────────────────────────

    async fn login_screen(&mut self) -> Result<Flow> {
        self.users = None;
        self.heading("Welcome")?;
        self.term
            .write_line("Sign in to your account to continue.")?;

        let mut form = LoginForm::new();
        loop {
            let choice = prompt::select("", vec!["Sign in".into(), "Quit".into()]).await?;
            if choice == 1 {
                return Ok(Flow::Quit);
            }

            let login = prompt::input("Username or e-mail", form.value(LoginField::Login)).await?;
            form.handle_change(LoginField::Login, login);
            let password = prompt::password("Password").await?;
            form.handle_change(LoginField::Password, password);

            match form.submit(&self.session).await {
                Ok(user) => {
                    self.navigator.replace(Route::Home);
                    tracing::debug!(user_id = user.id, "Signed in from shell");
                    return Ok(Flow::Continue);
                }
                Err(SubmitError::Invalid) => {
                    let errors = form.errors();
                    for message in [&errors.login, &errors.password].into_iter().flatten() {
                        self.term.write_line(&style(message).red().to_string())?;
                    }
                }
                Err(e) => {
                    self.term.write_line(&style(e).red().to_string())?;
                }
            }
        }
    }

    // ── Authenticated screens ───────────────────────────────────

    async fn home_screen(&mut self) -> Result<Flow> {
        let user = self.session.user();
        self.heading(&home::greeting(user.as_ref()))?;
        self.term
            .write_line("You are signed in.")?;
        if let Some(user) = &user {
            self.print_rows(&home::summary(user))?;
        }
        self.menu(Vec::new()).await.map(|(flow, _)| flow)
    }

    async fn users_screen(&mut self) -> Result<Flow> {
        let per_page = self.per_page;
        let api = self.session.api().clone();
        let list = self
            .users
            .get_or_insert_with(|| UsersList::new(api, per_page));
        if list.users().is_empty() && list.has_next_page() {
            if let Err(e) = list.fetch_next_page().await {
                self.report_api_error(&e)?;
            }
        }
        if !self.session.state().is_authenticated() {
            return Ok(Flow::Continue);
        }

        let Some(list) = self.users.as_ref() else {
            return Ok(Flow::Continue);
        };
        self.heading("Users")?;
        for user in list.users() {
            let role = if user.is_admin { "Admin" } else { "User" };
            let status = if user.is_active { "Active" } else { "Inactive" };
            self.term.write_line(&format!(
                "  #{:<4} {:<20} {:<30} {:<8} {}",
                user.id,
                user.username,
                user.email.as_deref().unwrap_or("-"),
                status,
                role
            ))?;
        }
        if let Some(total) = list.total() {
            self.term.write_line(&style(format!(
                "  {} of {total} loaded",
                list.users().len()
            ))
            .dim()
            .to_string())?;
        }

        let mut extra = Vec::new();
        if list.has_next_page() {
            extra.push("Load more".to_string());
        }
        extra.push("Refresh".to_string());

        let (flow, picked) = self.menu(extra.clone()).await?;
        let Some(picked) = picked else {
            return Ok(flow);
        };
        let Some(list) = self.users.as_ref() else {
            return Ok(flow);
        };
        let result = match extra[picked].as_str() {
            "Load more" => list.fetch_next_page().await,
            _ => list.refresh().await,
        };
        if let Err(e) = result {
            self.report_api_error(&e)?;
        }
        Ok(flow)
    }

    async fn profile_screen(&mut self) -> Result<Flow> {
        let model = ProfileModel::new(self.session.clone(), self.theme.clone());
        self.heading("Profile")?;
        self.print_rows(&model.details(&Local))?;

        let theme_label = if model.is_dark() {
            "Switch to light theme"
        } else {
            "Switch to dark theme"
        };
        let extra = vec![theme_label.to_string(), "Reload profile".to_string()];
        let (flow, picked) = self.menu(extra).await?;
        match picked {
            Some(0) => {
                let mode = model.toggle_theme().await;
                self.term
                    .write_line(&format!("Theme set to {mode}."))?;
            }
            Some(_) => {
                if let Err(e) = self.session.refresh_profile().await {
                    self.term
                        .write_line(&style(e.user_message()).red().to_string())?;
                    self.notice_forced_logout()?;
                }
            }
            None => {}
        }
        Ok(flow)
    }

    /// Show navigation plus screen-specific `extra` entries. Returns the index
    /// into `extra` when one of those was picked.
    async fn menu(&mut self, extra: Vec<String>) -> Result<(Flow, Option<usize>)> {
        let current = self.navigator.current();
        let user = self.session.user();
        let nav = router::sidebar_items(user.as_ref());

        let mut labels = extra.clone();
        let mut actions = Vec::new();
        for item in &nav {
            let marker = if item.matches_sidebar(current.path()) { "●" } else { " " };
            labels.push(format!("{marker} {}", item.label));
            actions.push(MenuAction::Go(item.route));
        }
        labels.push("Log out".to_string());
        actions.push(MenuAction::Logout);
        labels.push("Quit".to_string());
        actions.push(MenuAction::Quit);

        let picked = prompt::select("", labels).await?;
        if picked < extra.len() {
            return Ok((Flow::Continue, Some(picked)));
        }

        let flow = match actions.get(picked - extra.len()) {
            Some(MenuAction::Go(route)) => {
                if *route != current {
                    self.navigator.push(*route);
                }
                Flow::Continue
            }
            Some(MenuAction::Logout) => {
                if prompt::confirm("End your session? You will need to sign in again.").await? {
                    self.session.logout().await;
                }
                Flow::Continue
            }
            Some(MenuAction::Quit) | None => Flow::Quit,
        };
        Ok((flow, None))
    }

    fn report_api_error(&self, e: &baseapp::api::ApiError) -> Result<()> {
        self.term
            .write_line(&style(e.message()).red().to_string())?;
        self.notice_forced_logout()
    }

    fn notice_forced_logout(&self) -> Result<()> {
        if matches!(self.session.state(), AuthState::Unauthenticated) {
            self.term.write_line(
                &style("Your session has expired. Please sign in again.")
                    .yellow()
                    .to_string(),
            )?;
        }
        Ok(())
    }
}
