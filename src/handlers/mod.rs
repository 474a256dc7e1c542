// handlers/mod.rs - request handlers grouped by area
//
// contacts: owner-scoped list/search and CRUD (behind require_auth)
// accounts: signup, login, logout (public)
// health:   store liveness probe (public)

pub mod accounts;
pub mod contacts;
pub mod health;

/// Fallback for unmatched paths
pub async fn not_found() -> crate::error::AppError {
    crate::error::AppError::not_found("Page not found")
}
