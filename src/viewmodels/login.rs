//! Login form: field state, client-side validation and submission.

use crate::models::{Credentials, User};
use crate::session::SessionController;
use validator::{Validate, ValidationErrors};

pub const LOGIN_REQUIRED: &str = "Username or e-mail is required";
pub const PASSWORD_REQUIRED: &str = "Password is required";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Login,
    Password,
}

#[derive(Clone, Default, Validate)]
struct LoginFields {
    #[validate(length(min = 1, message = "Username or e-mail is required"))]
    login: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

/// First validation message per field; `None` means the field is fine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginErrors {
    pub login: Option<String>,
    pub password: Option<String>,
}

impl LoginErrors {
    pub fn is_empty(&self) -> bool {
        self.login.is_none() && self.password.is_none()
    }

    fn from_validation(errors: &ValidationErrors) -> Self {
        let mut out = Self::default();
        for (field, issues) in errors.field_errors() {
            let Some(first) = issues.first() else {
                continue;
            };
            let slot = match &*field {
                "login" => &mut out.login,
                "password" => &mut out.password,
                _ => continue,
            };
            slot.get_or_insert_with(|| first.to_string());
        }
        out
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmitError {
    /// Field errors are available from [`LoginForm::errors`].
    #[error("form has invalid fields")]
    Invalid,
    #[error("a login attempt is already running")]
    InProgress,
    /// The login call failed; carries the one message to show.
    #[error("{0}")]
    Failed(String),
}

#[derive(Default)]
pub struct LoginForm {
    fields: LoginFields,
    errors: LoginErrors,
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, field: LoginField) -> &str {
        match field {
            LoginField::Login => &self.fields.login,
            LoginField::Password => &self.fields.password,
        }
    }

    pub fn errors(&self) -> &LoginErrors {
        &self.errors
    }

    /// Update one field and drop its pending error.
    pub fn handle_change(&mut self, field: LoginField, value: impl Into<String>) {
        let value = value.into();
        match field {
            LoginField::Login => {
                self.fields.login = value;
                self.errors.login = None;
            }
            LoginField::Password => {
                self.fields.password = value;
                self.errors.password = None;
            }
        }
    }

    /// Re-run validation, replacing the error set. Returns whether the form
    /// can be submitted.
    pub fn validate(&mut self) -> bool {
        self.errors = match self.fields.validate() {
            Ok(()) => LoginErrors::default(),
            Err(e) => LoginErrors::from_validation(&e),
        };
        self.errors.is_empty()
    }

    /// Validate, then log in through `session`. The password is cleared
    /// once the attempt has been made.
    pub async fn submit(&mut self, session: &SessionController) -> Result<User, SubmitError> {
        if !self.validate() {
            return Err(SubmitError::Invalid);
        }
        if session.login_in_progress() {
            return Err(SubmitError::InProgress);
        }

        let credentials = Credentials::new(
            self.fields.login.clone(),
            std::mem::take(&mut self.fields.password),
        );
        session.login(credentials).await.map_err(|e| {
            tracing::debug!("Login rejected: {e}");
            SubmitError::Failed(e.user_message())
        })
    }
}
