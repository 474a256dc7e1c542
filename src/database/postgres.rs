use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::debug;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Contact, ContactInput, User};
use crate::database::repository::Repository;
use crate::database::store::{contact_not_found, ContactStore, UserStore};
use crate::filter::{contains_pattern, FilterData};

const SEARCH_COLUMNS: [&str; 4] = ["name", "phone", "email", "address"];

/// Postgres-backed implementation of both store traits
pub struct PgStore {
    pool: PgPool,
    contacts: Repository<Contact>,
    users: Repository<User>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            contacts: Repository::new("contacts", pool.clone()),
            users: Repository::new("users", pool.clone()),
            pool,
        }
    }

    /// Ownership scope, narrowed by a case-insensitive match on any search column
    fn contact_scope(owner: i64, query: Option<&str>) -> Value {
        match query {
            Some(q) if !q.is_empty() => {
                let pattern = contains_pattern(q);
                let any_column: Vec<Value> = SEARCH_COLUMNS
                    .iter()
                    .map(|column| json!({ (*column): { "$ilike": pattern } }))
                    .collect();
                json!({ "user_id": owner, "$or": any_column })
            }
            _ => json!({ "user_id": owner }),
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING *",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "A user with that username"))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        self.users
            .select_one(FilterData {
                where_clause: Some(json!({ "id": id })),
                ..Default::default()
            })
            .await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(username) = LOWER($1)")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl ContactStore for PgStore {
    async fn count(&self, owner: i64, query: Option<&str>) -> Result<i64, DatabaseError> {
        self.contacts
            .count(FilterData {
                where_clause: Some(Self::contact_scope(owner, query)),
                ..Default::default()
            })
            .await
    }

    async fn search(
        &self,
        owner: i64,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Contact>, DatabaseError> {
        debug!("Searching contacts for user {} (limit={}, offset={})", owner, limit, offset);
        self.contacts
            .select_any(FilterData {
                where_clause: Some(Self::contact_scope(owner, query)),
                order: Some(json!("id asc")),
                limit: Some(limit),
                offset: Some(offset),
                ..Default::default()
            })
            .await
    }

    async fn find(&self, owner: i64, id: i64) -> Result<Contact, DatabaseError> {
        self.contacts
            .select_404(
                FilterData {
                    where_clause: Some(json!({ "id": id, "user_id": owner })),
                    ..Default::default()
                },
                &format!("Contact {} not found", id),
            )
            .await
    }

    async fn insert(&self, owner: i64, input: &ContactInput) -> Result<Contact, DatabaseError> {
        let contact = sqlx::query_as::<_, Contact>(
            "INSERT INTO contacts (user_id, name, phone, email, address) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(owner)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .fetch_one(&self.pool)
        .await?;
        Ok(contact)
    }

    async fn update(&self, owner: i64, id: i64, input: &ContactInput) -> Result<Contact, DatabaseError> {
        sqlx::query_as::<_, Contact>(
            "UPDATE contacts SET name = $3, phone = $4, email = $5, address = $6, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| contact_not_found(id))
    }

    async fn delete(&self, owner: i64, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(contact_not_found(id));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    #[test]
    fn unfiltered_scope_is_owner_only() {
        assert_eq!(PgStore::contact_scope(4, None), json!({ "user_id": 4 }));
        assert_eq!(PgStore::contact_scope(4, Some("")), json!({ "user_id": 4 }));
    }

    #[test]
    fn search_scope_compiles_to_owner_and_any_column() {
        let mut filter = Filter::new("contacts").unwrap();
        filter.where_clause(PgStore::contact_scope(9, Some("Ja"))).unwrap();
        let sql = filter.to_where_sql().unwrap();
        assert_eq!(
            sql.query,
            "((\"name\" ILIKE $1) OR (\"phone\" ILIKE $2) OR (\"email\" ILIKE $3) OR (\"address\" ILIKE $4)) \
             AND \"user_id\" = $5"
        );
        assert_eq!(sql.params.len(), 5);
        assert_eq!(sql.params[0], json!("%Ja%"));
        assert_eq!(sql.params[4], json!(9));
    }
}
