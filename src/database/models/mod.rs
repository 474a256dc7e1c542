pub mod contact;
pub mod user;

pub use contact::{Contact, ContactInput};
pub use user::User;
