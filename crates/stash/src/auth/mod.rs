//! Authentication: credential loading, captured sessions, browser bootstrap.

mod bootstrap;
mod credentials;
mod session;

pub use bootstrap::{BootstrapTarget, SessionBootstrapper};
pub use credentials::{Cookie, CredentialStore};
pub use session::CapturedSession;
