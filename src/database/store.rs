use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{Contact, ContactInput, User};

/// Identity subsystem persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new account. Fails with `Conflict` when the username is taken
    /// (compared case-insensitively).
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    /// Case-insensitive username lookup.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;
}

/// Contact persistence. Every method is scoped to `owner`; rows belonging to
/// other users behave exactly as if they did not exist.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Number of owned contacts matching `query` (all owned contacts when `None`).
    async fn count(&self, owner: i64, query: Option<&str>) -> Result<i64, DatabaseError>;

    /// One window of owned contacts matching `query`, ordered by id.
    async fn search(
        &self,
        owner: i64,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Contact>, DatabaseError>;

    async fn find(&self, owner: i64, id: i64) -> Result<Contact, DatabaseError>;

    async fn insert(&self, owner: i64, input: &ContactInput) -> Result<Contact, DatabaseError>;

    async fn update(&self, owner: i64, id: i64, input: &ContactInput) -> Result<Contact, DatabaseError>;

    async fn delete(&self, owner: i64, id: i64) -> Result<(), DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

pub(crate) fn contact_not_found(id: i64) -> DatabaseError {
    DatabaseError::NotFound(format!("Contact {} not found", id))
}
