//! Screen state that is independent of how it is drawn.

pub mod home;
pub mod login;
pub mod profile;
pub mod users;

pub use login::{LoginErrors, LoginField, LoginForm, SubmitError};
pub use profile::{DetailRow, ProfileModel};
pub use users::UsersList;
