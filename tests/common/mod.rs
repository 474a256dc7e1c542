#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Response};

use contact_book::config::AppConfig;
use contact_book::database::models::{Contact, ContactInput, User};
use contact_book::database::{ContactStore, DatabaseError, MemoryStore, UserStore};
use contact_book::{router, AppState};

pub const PASSWORD: &str = "correct-horse-battery";

/// In-process server bound to an ephemeral port. Lives as long as the
/// test's runtime.
pub struct TestServer {
    pub base_url: String,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(store.clone(), store).await
    }

    pub async fn with_stores(
        users: Arc<dyn UserStore>,
        contacts: Arc<dyn ContactStore>,
    ) -> Result<Self> {
        Self::with_config(AppConfig::development(), users, contacts).await
    }

    pub async fn with_config(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        contacts: Arc<dyn ContactStore>,
    ) -> Result<Self> {
        let state = AppState::new(config, users, contacts);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind test listener")?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, router(state)).await;
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
        })
    }

    /// A fresh cookie jar that does not follow redirects
    pub fn browser(&self) -> Browser {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("reqwest client");
        Browser {
            client,
            base_url: self.base_url.clone(),
        }
    }
}

pub struct Browser {
    client: reqwest::Client,
    base_url: String,
}

impl Browser {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    pub async fn get_text(&self, path: &str) -> Result<String> {
        Ok(self.get(path).await?.text().await?)
    }

    /// GET the contact list filtered by `query`
    pub async fn search(&self, query: &str) -> Result<Response> {
        let encoded: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("q", query)
            .finish();
        self.get(&format!("/?{}", encoded)).await
    }

    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> Result<Response> {
        Ok(self.client.post(self.url(path)).form(form).send().await?)
    }

    pub async fn signup(&self, username: &str) -> Result<Response> {
        self.post(
            "/accounts/signup/",
            &[("username", username), ("password1", PASSWORD), ("password2", PASSWORD)],
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Response> {
        self.post("/accounts/login/", &[("username", username), ("password", password)])
            .await
    }

    pub async fn create_contact(&self, name: &str, phone: &str, email: &str, address: &str) -> Result<Response> {
        self.post(
            "/create/",
            &[("name", name), ("phone", phone), ("email", email), ("address", address)],
        )
        .await
    }
}

pub fn location(res: &Response) -> Option<String> {
    res.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Pull `/update/{id}/` ids out of a rendered list, in display order
pub fn contact_ids(html: &str) -> Vec<i64> {
    html.split("data-contact-id=\"")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .filter_map(|id| id.parse().ok())
        .collect()
}

/// Names of the rendered rows, in display order
pub fn contact_names(html: &str) -> Vec<String> {
    html.split("<td class=\"name\">")
        .skip(1)
        .filter_map(|rest| rest.split("</td>").next())
        .map(str::to_string)
        .collect()
}

/// Delegates to a `MemoryStore` while counting contact queries
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    pub contact_calls: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.contact_calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.contact_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for CountingStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError> {
        self.inner.create_user(username, password_hash).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        self.inner.find_by_username(username).await
    }
}

#[async_trait]
impl ContactStore for CountingStore {
    async fn count(&self, owner: i64, query: Option<&str>) -> Result<i64, DatabaseError> {
        self.tick();
        self.inner.count(owner, query).await
    }

    async fn search(&self, owner: i64, query: Option<&str>, limit: i64, offset: i64) -> Result<Vec<Contact>, DatabaseError> {
        self.tick();
        self.inner.search(owner, query, limit, offset).await
    }

    async fn find(&self, owner: i64, id: i64) -> Result<Contact, DatabaseError> {
        self.tick();
        self.inner.find(owner, id).await
    }

    async fn insert(&self, owner: i64, input: &ContactInput) -> Result<Contact, DatabaseError> {
        self.tick();
        self.inner.insert(owner, input).await
    }

    async fn update(&self, owner: i64, id: i64, input: &ContactInput) -> Result<Contact, DatabaseError> {
        self.tick();
        self.inner.update(owner, id, input).await
    }

    async fn delete(&self, owner: i64, id: i64) -> Result<(), DatabaseError> {
        self.tick();
        self.inner.delete(owner, id).await
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.inner.health_check().await
    }
}

/// Contact store whose every operation fails
pub struct BrokenContactStore;

fn broken() -> DatabaseError {
    DatabaseError::QueryError("connection refused".to_string())
}

#[async_trait]
impl ContactStore for BrokenContactStore {
    async fn count(&self, _owner: i64, _query: Option<&str>) -> Result<i64, DatabaseError> {
        Err(broken())
    }

    async fn search(&self, _owner: i64, _query: Option<&str>, _limit: i64, _offset: i64) -> Result<Vec<Contact>, DatabaseError> {
        Err(broken())
    }

    async fn find(&self, _owner: i64, _id: i64) -> Result<Contact, DatabaseError> {
        Err(broken())
    }

    async fn insert(&self, _owner: i64, _input: &ContactInput) -> Result<Contact, DatabaseError> {
        Err(broken())
    }

    async fn update(&self, _owner: i64, _id: i64, _input: &ContactInput) -> Result<Contact, DatabaseError> {
        Err(broken())
    }

    async fn delete(&self, _owner: i64, _id: i64) -> Result<(), DatabaseError> {
        Err(broken())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Err(broken())
    }
}

/// Reads go to a `MemoryStore`; contact updates and deletes fail
#[derive(Default)]
pub struct FailingWritesStore {
    inner: MemoryStore,
}

fn disk_full() -> DatabaseError {
    DatabaseError::QueryError("disk full".to_string())
}

#[async_trait]
impl UserStore for FailingWritesStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError> {
        self.inner.create_user(username, password_hash).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        self.inner.find_by_username(username).await
    }
}

#[async_trait]
impl ContactStore for FailingWritesStore {
    async fn count(&self, owner: i64, query: Option<&str>) -> Result<i64, DatabaseError> {
        self.inner.count(owner, query).await
    }

    async fn search(&self, owner: i64, query: Option<&str>, limit: i64, offset: i64) -> Result<Vec<Contact>, DatabaseError> {
        self.inner.search(owner, query, limit, offset).await
    }

    async fn find(&self, owner: i64, id: i64) -> Result<Contact, DatabaseError> {
        self.inner.find(owner, id).await
    }

    async fn insert(&self, owner: i64, input: &ContactInput) -> Result<Contact, DatabaseError> {
        self.inner.insert(owner, input).await
    }

    async fn update(&self, _owner: i64, _id: i64, _input: &ContactInput) -> Result<Contact, DatabaseError> {
        Err(disk_full())
    }

    async fn delete(&self, _owner: i64, _id: i64) -> Result<(), DatabaseError> {
        Err(disk_full())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.inner.health_check().await
    }
}
