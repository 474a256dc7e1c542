use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{Contact, ContactInput, User};
use crate::database::store::{contact_not_found, ContactStore, UserStore};

/// Process-local store used by `--memory` runs and the test suite.
/// Matches `PgStore` semantics: id ordering, owner scoping and
/// case-insensitive substring search.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    contacts: BTreeMap<i64, Contact>,
    last_user_id: i64,
    last_contact_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(contact: &Contact, owner: i64, needle: Option<&str>) -> bool {
        if contact.user_id != owner {
            return false;
        }
        match needle {
            Some(n) => contact
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(n)),
            None => true,
        }
    }

    fn needle(query: Option<&str>) -> Option<String> {
        query.filter(|q| !q.is_empty()).map(str::to_lowercase)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError> {
        let mut state = self.state.write().await;
        let lowered = username.to_lowercase();
        if state.users.values().any(|u| u.username.to_lowercase() == lowered) {
            return Err(DatabaseError::Conflict(
                "A user with that username already exists".to_string(),
            ));
        }
        state.last_user_id += 1;
        let user = User {
            id: state.last_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let lowered = username.to_lowercase();
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| u.username.to_lowercase() == lowered)
            .cloned())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn count(&self, owner: i64, query: Option<&str>) -> Result<i64, DatabaseError> {
        let needle = Self::needle(query);
        let state = self.state.read().await;
        let count = state
            .contacts
            .values()
            .filter(|c| Self::matches(c, owner, needle.as_deref()))
            .count();
        Ok(count as i64)
    }

    async fn search(
        &self,
        owner: i64,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Contact>, DatabaseError> {
        let needle = Self::needle(query);
        let state = self.state.read().await;
        Ok(state
            .contacts
            .values()
            .filter(|c| Self::matches(c, owner, needle.as_deref()))
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn find(&self, owner: i64, id: i64) -> Result<Contact, DatabaseError> {
        self.state
            .read()
            .await
            .contacts
            .get(&id)
            .filter(|c| c.user_id == owner)
            .cloned()
            .ok_or_else(|| contact_not_found(id))
    }

    async fn insert(&self, owner: i64, input: &ContactInput) -> Result<Contact, DatabaseError> {
        let mut state = self.state.write().await;
        state.last_contact_id += 1;
        let now = Utc::now();
        let contact = Contact {
            id: state.last_contact_id,
            user_id: owner,
            name: input.name.clone(),
            phone: input.phone.clone(),
            email: input.email.clone(),
            address: input.address.clone(),
            created_at: now,
            updated_at: now,
        };
        state.contacts.insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn update(&self, owner: i64, id: i64, input: &ContactInput) -> Result<Contact, DatabaseError> {
        let mut state = self.state.write().await;
        let contact = state
            .contacts
            .get_mut(&id)
            .filter(|c| c.user_id == owner)
            .ok_or_else(|| contact_not_found(id))?;
        contact.name = input.name.clone();
        contact.phone = input.phone.clone();
        contact.email = input.email.clone();
        contact.address = input.address.clone();
        contact.updated_at = Utc::now();
        Ok(contact.clone())
    }

    async fn delete(&self, owner: i64, id: i64) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        let owned = state.contacts.get(&id).is_some_and(|c| c.user_id == owner);
        if !owned {
            return Err(contact_not_found(id));
        }
        state.contacts.remove(&id);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
