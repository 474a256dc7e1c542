pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod pagination;
pub mod views;

pub use app::{router, AppState};
