//! External collaborators: Google authentication and the email sender.

pub mod email;
pub mod google_auth;

pub use email::EmailService;
pub use google_auth::GoogleAuth;
