pub mod auth;
pub mod flash;

pub use auth::{authenticate, require_auth, CurrentUser, AUTH_COOKIE, LOGIN_PATH};
pub use flash::{Flash, FlashLevel, FlashMessage};
