use crate::models::User;

/// Where the session lifecycle currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Startup restoration has not finished. Routing must wait.
    Initializing,
    Authenticated(User),
    Unauthenticated,
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Initializing)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Authenticated(_) => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        }
    }
}

/// What subscribers observe: the auth state plus the login-in-flight flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: AuthState,
    pub login_in_progress: bool,
}

impl SessionSnapshot {
    pub fn user(&self) -> Option<&User> {
        self.state.user()
    }

    pub fn loading(&self) -> bool {
        self.state.is_loading()
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: AuthState::Initializing,
            login_in_progress: false,
        }
    }
}
